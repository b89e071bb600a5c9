//! Per-asset dependency tables
//!
//! A table is the lightweight record of one asset: its bootstrap objects
//! (PreloadData and the AssetBundle manifest, decoded in full), its external
//! file references, and one entry per remaining object carrying just enough
//! to resolve cross-file pointers against it later.

use crate::asset::{Asset, strip_path};
use crate::pptr::ObjectPointer;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Decoded PreloadData bootstrap object
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreloadSummary {
    /// Dependency path strings, as declared
    pub dependencies: Vec<String>,
    /// Objects this asset preloads
    pub assets: Vec<ObjectPointer>,
}

impl PreloadSummary {
    fn from_value(value: &Value) -> PreloadSummary {
        let mut summary = PreloadSummary::default();
        if let Some(deps) = value.field("m_Dependencies").and_then(Value::as_array) {
            summary.dependencies = deps
                .iter()
                .filter_map(|d| d.as_str().map(str::to_string))
                .collect();
        }
        if let Some(assets) = value.field("m_Assets").and_then(Value::as_array) {
            summary.assets = assets.iter().map(ObjectPointer::from_value).collect();
        }
        summary
    }
}

/// One exported path of an AssetBundle container map
#[derive(Debug, Clone, Serialize)]
pub struct BundleExport {
    pub source_path: String,
    pub preload_index: i64,
    pub preload_size: i64,
    pub object_ptr: ObjectPointer,
}

/// The manifest's main-asset slot
#[derive(Debug, Clone, Serialize)]
pub struct BundlePreloadInfo {
    pub preload_index: i64,
    pub preload_size: i64,
    pub object_ptr: ObjectPointer,
}

/// Decoded AssetBundle manifest bootstrap object
#[derive(Debug, Clone, Default, Serialize)]
pub struct BundleManifest {
    pub name: String,
    /// Declared bundle dependencies
    pub dependencies: Vec<String>,
    pub preload_table: Vec<ObjectPointer>,
    pub exports: Vec<BundleExport>,
    /// Export path by local id; setup-time shortcut for naming objects
    /// without decoding them, dropped from the persisted report
    #[serde(skip)]
    pub export_names_by_id: HashMap<i64, String>,
    pub main_asset: Option<BundlePreloadInfo>,
}

impl BundleManifest {
    fn from_value(value: &Value) -> BundleManifest {
        let mut manifest = BundleManifest::default();
        if let Some(name) = value.str_field("m_AssetBundleName") {
            manifest.name = name.to_string();
        }
        if let Some(deps) = value.field("m_Dependencies").and_then(Value::as_array) {
            manifest.dependencies = deps
                .iter()
                .filter_map(|d| d.as_str().map(str::to_string))
                .collect();
        }
        if let Some(table) = value.field("m_PreloadTable").and_then(Value::as_array) {
            manifest.preload_table = table.iter().map(ObjectPointer::from_value).collect();
        }
        if let Some(container) = value.field("m_Container").and_then(Value::as_array) {
            for pair in container {
                let Some(path) = pair.str_field("first") else {
                    continue;
                };
                let Some(info) = pair.field("second") else {
                    continue;
                };
                let export = BundleExport {
                    source_path: path.to_string(),
                    preload_index: info
                        .field("preloadIndex")
                        .and_then(Value::as_i64)
                        .unwrap_or(0),
                    preload_size: info
                        .field("preloadSize")
                        .and_then(Value::as_i64)
                        .unwrap_or(0),
                    object_ptr: info
                        .field("asset")
                        .map(ObjectPointer::from_value)
                        .unwrap_or(ObjectPointer::NULL),
                };
                if export.object_ptr.path_id != -1 {
                    manifest
                        .export_names_by_id
                        .insert(export.object_ptr.path_id, export.source_path.clone());
                }
                manifest.exports.push(export);
            }
        }
        if let Some(main) = value.field("m_MainAsset") {
            manifest.main_asset = Some(BundlePreloadInfo {
                preload_index: main
                    .field("preloadIndex")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
                preload_size: main
                    .field("preloadSize")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
                object_ptr: main
                    .field("asset")
                    .map(ObjectPointer::from_value)
                    .unwrap_or(ObjectPointer::NULL),
            });
        }
        manifest
    }

    /// An empty manifest carries no preload entries and no main asset; the
    /// cleanup pass drops it from the report entirely
    pub(crate) fn is_empty(&self) -> bool {
        self.preload_table.is_empty()
            && self
                .main_asset
                .as_ref()
                .is_none_or(|m| m.object_ptr.is_null())
    }
}

/// One object's lightweight record within a table
#[derive(Debug, Clone, Serialize)]
pub struct DependencyEntry {
    pub path_id: i64,
    pub type_name: String,
    pub byte_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Names of the tables whose bootstrap pointers target this object;
    /// filled during database finalization
    pub referenced_by: BTreeSet<String>,
}

/// Dependency record for one asset file
#[derive(Debug, Clone, Serialize)]
pub struct DependencyTable {
    pub source_file: String,
    /// Asset name with any path prefix stripped
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preload_data: Option<PreloadSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_bundle: Option<BundleManifest>,
    /// Referenced file names, 1-indexed by pointer `file_id`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<String>,
    pub objects: IndexMap<i64, DependencyEntry>,
}

impl DependencyTable {
    /// Build the table for one decoded asset
    pub fn from_asset(source_file: &str, asset: &Asset) -> DependencyTable {
        Self::from_asset_with_progress(source_file, asset, |_, _| {})
    }

    /// Build the table, reporting a monotonic processed/total count.
    ///
    /// The callback is instrumentation for long bulk runs; it observes
    /// progress and must not assume anything about call timing beyond
    /// monotonicity.
    pub fn from_asset_with_progress(
        source_file: &str,
        asset: &Asset,
        mut on_progress: impl FnMut(usize, usize),
    ) -> DependencyTable {
        let mut table = DependencyTable {
            source_file: source_file.to_string(),
            name: strip_path(&asset.name).to_string(),
            preload_data: None,
            asset_bundle: None,
            external_refs: Vec::new(),
            objects: IndexMap::new(),
        };

        for r in &asset.external_refs {
            let file_name = r.file_name();
            if file_name.eq_ignore_ascii_case(&table.name) {
                continue; // self-reference
            }
            table.external_refs.push(file_name.to_string());
        }

        // bootstrap pass: at most one PreloadData and one AssetBundle
        // manifest exist per asset, and both must be decoded before objects
        // can be named from the export map
        for record in asset.objects.values() {
            let Some(schema) = asset.schema_for(record.class_id) else {
                continue;
            };
            match record.type_name().as_str() {
                "PreloadData" => match asset.read_object(record, schema) {
                    Ok(value) => table.preload_data = Some(PreloadSummary::from_value(&value)),
                    Err(e) => tracing::warn!(
                        path_id = record.path_id,
                        error = %e,
                        "skipping undecodable PreloadData"
                    ),
                },
                "AssetBundle" => match asset.read_object(record, schema) {
                    Ok(value) => table.asset_bundle = Some(BundleManifest::from_value(&value)),
                    Err(e) => tracing::warn!(
                        path_id = record.path_id,
                        error = %e,
                        "skipping undecodable AssetBundle manifest"
                    ),
                },
                _ => {}
            }
        }

        let total = asset.objects.len();
        let mut processed = 0;
        on_progress(processed, total);

        for record in asset.objects.values() {
            processed += 1;
            on_progress(processed, total);

            // no schema: the object is unreadable, which is an expected gap
            // for stripped and platform-specific types, not an error
            if asset.schema_for(record.class_id).is_none() {
                continue;
            }
            let type_name = record.type_name();
            if type_name == "PreloadData" || type_name == "AssetBundle" {
                continue;
            }

            let name = table
                .asset_bundle
                .as_ref()
                .and_then(|b| b.export_names_by_id.get(&record.path_id).cloned())
                .or_else(|| asset.read_object_name(record))
                .filter(|n| !n.is_empty());

            table.objects.insert(
                record.path_id,
                DependencyEntry {
                    path_id: record.path_id,
                    type_name,
                    byte_size: record.byte_size,
                    name,
                    referenced_by: BTreeSet::new(),
                },
            );
        }

        table
    }

    /// All bootstrap pointers this table contributes to reference resolution
    pub(crate) fn pointer_refs(&self) -> Vec<ObjectPointer> {
        let mut ptrs = Vec::new();
        if let Some(preload) = &self.preload_data {
            ptrs.extend(preload.assets.iter().copied());
        }
        if let Some(bundle) = &self.asset_bundle {
            ptrs.extend(bundle.preload_table.iter().copied());
        }
        ptrs
    }
}
