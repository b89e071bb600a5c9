//! Cross-file dependency database and report assembly
//!
//! Tables are registered one asset at a time; finalization resolves every
//! bootstrap pointer across the whole run, records back-references on the
//! targets, prunes what nothing references, and serializes the result.
//! Resolution needs a globally consistent view of all tables, so it runs
//! exactly once, after the last registration — enforced here by having
//! finalization consume the database.

use crate::asset::{Asset, BundleFile, strip_path};
use crate::deps::table::DependencyTable;
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// Aggregate of all dependency tables in one processing run
#[derive(Debug, Default)]
pub struct DependencyDatabase {
    tables: Vec<DependencyTable>,
    /// Lowercased table name -> index into `tables`
    index_by_name: HashMap<String, usize>,
    duplicates_skipped: usize,
}

impl DependencyDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered tables, in registration order
    pub fn tables(&self) -> &[DependencyTable] {
        &self.tables
    }

    /// Variant bundles dropped so far. Counted only; a duplicate name is
    /// expected input, not a failure.
    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_skipped
    }

    /// Build and register the table for one decoded asset
    pub fn add_asset(&mut self, source_file: &str, asset: &Asset) {
        self.add_table(DependencyTable::from_asset(source_file, asset));
    }

    /// Register every embedded asset of a bundle, in container order
    pub fn build_from_bundle(&mut self, source_file: &str, bundle: &BundleFile) {
        for asset in &bundle.assets {
            self.add_asset(source_file, asset);
        }
    }

    /// Register a prebuilt table.
    ///
    /// A table whose name (case-insensitive) is already registered is a
    /// variant bundle sharing an internal identity with one we kept; it is
    /// dropped silently so the run does not double-count its objects.
    pub fn add_table(&mut self, table: DependencyTable) {
        let key = table.name.to_lowercase();
        if self.index_by_name.contains_key(&key) {
            self.duplicates_skipped += 1;
            tracing::debug!(name = %table.name, source = %table.source_file, "dropping variant bundle");
            return;
        }
        self.index_by_name.insert(key, self.tables.len());
        self.tables.push(table);
    }

    /// Finalize the run: resolve references, clean up, and produce the
    /// report. Consumes the database — the two phases double-apply if run
    /// again, so a second finalization is unrepresentable.
    pub fn into_report(mut self) -> Report {
        let dangling_references = self.resolve_references();
        self.cleanup();
        Report {
            tables: self.tables,
            duplicates_skipped: self.duplicates_skipped,
            dangling_references,
        }
    }

    /// Finalize the run and write the JSON document in one step
    pub fn write_report<W: Write>(self, writer: W) -> Result<Report> {
        let report = self.into_report();
        report.write_json(writer)?;
        Ok(report)
    }

    /// Walk every table's bootstrap pointers and record back-references on
    /// the objects they target. Returns the number of dangling references.
    fn resolve_references(&mut self) -> usize {
        let mut dangling = 0;
        // resolve first, mutate after: back-reference targets live in other
        // tables of the same list
        let mut edges: Vec<(usize, i64, String)> = Vec::new();

        for table in &self.tables {
            for ptr in table.pointer_refs() {
                if ptr.is_null() {
                    continue;
                }
                if ptr.file_id == 0 {
                    // local pointers are not cross-file dependencies
                    continue;
                }
                let Some(ref_name) = table.external_refs.get(ptr.file_id as usize - 1) else {
                    tracing::warn!(
                        table = %table.name,
                        file_id = ptr.file_id,
                        "pointer file_id outside external reference list"
                    );
                    dangling += 1;
                    continue;
                };
                let key = strip_path(ref_name).to_lowercase();
                match self.index_by_name.get(&key) {
                    Some(&target) => edges.push((target, ptr.path_id, table.name.clone())),
                    None => {
                        tracing::warn!(
                            table = %table.name,
                            target = %ref_name,
                            "referenced file not present in this run"
                        );
                        dangling += 1;
                    }
                }
            }
        }

        for (target, path_id, referer) in edges {
            match self.tables[target].objects.get_mut(&path_id) {
                Some(entry) => {
                    entry.referenced_by.insert(referer);
                }
                None => {
                    // version skew: the referenced file exists but was built
                    // without this object
                    tracing::warn!(
                        from = %referer,
                        path_id,
                        "referenced object missing from target table"
                    );
                    dangling += 1;
                }
            }
        }

        dangling
    }

    /// Drop setup-time state and prune what nothing references
    fn cleanup(&mut self) {
        for table in &mut self.tables {
            if let Some(bundle) = &mut table.asset_bundle {
                bundle.export_names_by_id.clear();
                if bundle.is_empty() {
                    table.asset_bundle = None;
                }
            }
            table.objects.retain(|_, entry| !entry.referenced_by.is_empty());
        }
    }
}

/// Consolidated dependency report for one run.
///
/// Diagnostics stay on the log channel; the counters here exist for callers
/// that want run statistics, and are not part of the serialized document.
#[derive(Debug, Serialize)]
pub struct Report {
    pub tables: Vec<DependencyTable>,
    #[serde(skip)]
    pub duplicates_skipped: usize,
    #[serde(skip)]
    pub dangling_references: usize,
}

impl Report {
    /// Serialize the report as a JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON document to a sink
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        let json = self.to_json()?;
        writer.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Look up a surviving table by case-insensitive name
    pub fn table(&self, name: &str) -> Option<&DependencyTable> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}
