//! Unity serialized-file type metadata and cross-file dependency analysis
//!
//! This crate covers two subsystems of asset inspection:
//!
//! - **Type metadata (TypeTree) parsing**: reconstructing, from the packed
//!   binary schema section of a serialized file, the field layout of every
//!   object class the file contains, across both wire formats the engine has
//!   shipped.
//! - **Dependency resolution**: building a per-asset table of resolvable
//!   objects and bootstrap data (PreloadData, AssetBundle manifests), then
//!   linking pointers across many files into a referenced/unreferenced
//!   classification with back-reference tracking.
//!
//! Bundle framing, decompression, and payload decoding (textures, meshes,
//! audio) are deliberately out of scope; the [`asset`] module models the
//! already-decoded view this crate consumes.
//!
//! # Example
//!
//! ```rust,no_run
//! use unity_asset_deps::{Asset, DependencyDatabase};
//!
//! # fn load(_: &str) -> Asset { unimplemented!() }
//! let mut db = DependencyDatabase::new();
//! for path in ["cab-ui.unity3d", "cab-shared.unity3d"] {
//!     let asset = load(path);
//!     db.add_asset(path, &asset);
//! }
//! let report = db.into_report();
//! println!("{}", report.to_json().unwrap());
//! ```

pub mod asset;
pub mod constants;
pub mod deps;
pub mod error;
pub mod pptr;
pub mod reader;
pub mod strings;
pub mod typetree;
pub mod value;

pub use asset::{Asset, BundleFile, BundleInfo, CompressionKind, ExternalFileRef, ObjectRecord};
pub use deps::{DependencyDatabase, DependencyEntry, DependencyTable, Report};
pub use error::{AssetError, Result};
pub use pptr::ObjectPointer;
pub use reader::{BinaryReader, ByteOrder};
pub use typetree::{BuildTarget, StructHash, TypeHint, TypeMetadata, TypeTreeNode};
pub use value::Value;
