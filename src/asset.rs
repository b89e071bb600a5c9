//! Decoded-asset view consumed by the dependency layer
//!
//! The container layer (bundle framing, decompression, object-table parsing)
//! hands the dependency builder a fully buffered view of each asset: its
//! parsed type metadata, its object records with raw payload bytes, and its
//! external file references. The types here are that seam.

use crate::constants;
use crate::error::Result;
use crate::reader::ByteOrder;
use crate::typetree::{TypeMetadata, TypeTreeNode, decode_name, decode_object};
use crate::value::Value;
use indexmap::IndexMap;

/// Block compression used by an owning bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionKind {
    #[default]
    None,
    Lzma,
    Lz4,
    Lz4Hc,
    Lzham,
}

impl CompressionKind {
    pub fn from_raw(raw: u32) -> CompressionKind {
        match raw {
            1 => CompressionKind::Lzma,
            2 => CompressionKind::Lz4,
            3 => CompressionKind::Lz4Hc,
            4 => CompressionKind::Lzham,
            _ => CompressionKind::None,
        }
    }
}

/// Facts about the bundle an asset was embedded in
#[derive(Debug, Clone, Default)]
pub struct BundleInfo {
    pub file_size: u64,
    pub compression: CompressionKind,
    pub generator_version: String,
    /// File offset of the block storage region the object payloads live in
    pub block_storage_offset: u64,
}

/// A bundle with its embedded assets, in container order
#[derive(Debug, Clone, Default)]
pub struct BundleFile {
    pub info: BundleInfo,
    pub assets: Vec<Asset>,
}

/// Reference to another serialized file
#[derive(Debug, Clone)]
pub struct ExternalFileRef {
    pub guid: [u8; 16],
    pub kind: i32,
    /// Path as recorded in the file, possibly with a directory prefix
    pub asset_path: String,
}

impl ExternalFileRef {
    pub fn new(asset_path: impl Into<String>) -> Self {
        Self {
            guid: [0; 16],
            kind: 0,
            asset_path: asset_path.into(),
        }
    }

    /// File name with any path prefix stripped
    pub fn file_name(&self) -> &str {
        strip_path(&self.asset_path)
    }
}

/// One entry of an asset's object table
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub path_id: i64,
    pub class_id: i32,
    /// Offset of the payload within the file's data region
    pub byte_start: u64,
    pub byte_size: u32,
    /// Raw payload bytes
    pub data: Vec<u8>,
}

impl ObjectRecord {
    pub fn new(path_id: i64, class_id: i32, data: Vec<u8>) -> Self {
        let byte_size = data.len() as u32;
        Self {
            path_id,
            class_id,
            byte_start: 0,
            byte_size,
            data,
        }
    }

    /// Stringified type tag for this object's class
    pub fn type_name(&self) -> String {
        constants::class_name(self.class_id)
    }
}

/// One decoded serialized file (or one embedded asset of a bundle)
#[derive(Debug, Clone, Default)]
pub struct Asset {
    /// Asset name; standalone files sometimes carry a full source path here
    pub name: String,
    /// Serialized-file format version, selects type-tree wire format
    pub format: u32,
    pub byte_order: ByteOrder,
    pub metadata: TypeMetadata,
    /// Object table in file order, keyed by path id
    pub objects: IndexMap<i64, ObjectRecord>,
    pub external_refs: Vec<ExternalFileRef>,
    /// Present when the asset came out of a bundle
    pub bundle: Option<BundleInfo>,
}

impl Asset {
    pub fn new(name: impl Into<String>, format: u32) -> Self {
        Self {
            name: name.into(),
            format,
            ..Default::default()
        }
    }

    pub fn insert_object(&mut self, record: ObjectRecord) {
        self.objects.insert(record.path_id, record);
    }

    /// Schema for a class id, falling back to the shared default metadata.
    ///
    /// `None` means the object is unreadable; callers skip it rather than
    /// fail, since stripped and platform-specific types are expected gaps.
    pub fn schema_for(&self, class_id: i32) -> Option<&TypeTreeNode> {
        self.metadata
            .tree_for(class_id)
            .or_else(|| TypeMetadata::shared_default().tree_for(class_id))
    }

    /// Fully decode an object's payload against its schema
    pub fn read_object(&self, record: &ObjectRecord, schema: &TypeTreeNode) -> Result<Value> {
        decode_object(&record.data, self.byte_order, schema)
    }

    /// Best-effort name read without decoding the rest of the payload.
    /// Decode failures count as "no name".
    pub fn read_object_name(&self, record: &ObjectRecord) -> Option<String> {
        let schema = self.schema_for(record.class_id)?;
        decode_name(&record.data, self.byte_order, schema)
            .ok()
            .flatten()
    }
}

/// Strip everything up to and including the last path separator
pub(crate) fn strip_path(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
