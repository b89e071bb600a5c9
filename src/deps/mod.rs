//! Cross-file dependency analysis
//!
//! One [`DependencyTable`] per asset, aggregated into a run-wide
//! [`DependencyDatabase`] whose finalization resolves bootstrap pointers
//! between files and emits the consolidated [`Report`].

pub mod database;
pub mod table;

pub use database::{DependencyDatabase, Report};
pub use table::{
    BundleExport, BundleManifest, BundlePreloadInfo, DependencyEntry, DependencyTable,
    PreloadSummary,
};
