//! Type-tree wire-format parsing
//!
//! Two formats exist on disk. The legacy format serializes each node as a
//! self-contained record with inline names and a recursive child count. The
//! blob format serializes a flat array of fixed 24-byte records (parent/child
//! structure implied by a depth column) followed by a single string blob that
//! both name columns index into.

use super::types::{StructHash, TypeHint, TypeMetadata, TypeTreeNode};
use crate::constants::class_ids;
use crate::error::{AssetError, Result};
use crate::reader::BinaryReader;
use crate::strings::{COMMON_STRINGS, cstr_at};
use crate::typetree::types::BuildTarget;

/// Size of one node record in the blob format
const BLOB_NODE_SIZE: usize = 24;

/// Which wire format a file format version uses.
///
/// Format 11 predates the blob cutover despite sitting between two blob
/// versions; the boundary is an engine quirk and is kept as a hard constant.
pub fn uses_blob_format(format: u32) -> bool {
    format == 10 || format >= 12
}

/// Parse one class schema with the format-appropriate decoder
pub fn parse_tree(reader: &mut BinaryReader<'_>, format: u32) -> Result<TypeTreeNode> {
    if uses_blob_format(format) {
        parse_blob(reader)
    } else {
        parse_legacy(reader)
    }
}

fn parse_legacy(reader: &mut BinaryReader<'_>) -> Result<TypeTreeNode> {
    let mut node = TypeTreeNode::new();
    node.type_name = reader.read_cstring()?;
    node.field_name = reader.read_cstring()?;
    node.byte_size = reader.read_i32()?;
    node.index = reader.read_i32()? as i64;
    node.is_array = reader.read_i32()? != 0;
    node.version = reader.read_i32()?;
    node.flags = reader.read_i32()?;
    node.type_hint = TypeHint::from_type_name(&node.type_name);

    let num_fields = reader.read_u32()?;
    for _ in 0..num_fields {
        node.children.push(parse_legacy(reader)?);
    }
    Ok(node)
}

fn parse_blob(reader: &mut BinaryReader<'_>) -> Result<TypeTreeNode> {
    let num_nodes = reader.read_u32()? as usize;
    let buffer_bytes = reader.read_u32()? as usize;
    let records = reader.read_bytes(num_nodes * BLOB_NODE_SIZE)?;
    let names = reader.read_bytes(buffer_bytes)?;

    let mut rec = BinaryReader::new(&records, reader.byte_order());

    // Arena of flat nodes plus child index lists; the tree is assembled after
    // all records are read. Index 0 is the synthetic root that depth-0
    // records write into.
    let mut nodes: Vec<TypeTreeNode> = vec![TypeTreeNode::new()];
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new()];
    let mut ancestors: Vec<usize> = vec![0];

    for _ in 0..num_nodes {
        let version = rec.read_i16()?;
        let depth = rec.read_u8()? as usize;

        let idx = if depth == 0 {
            0
        } else {
            // a node's parent is the most recent node whose depth is depth-1
            while ancestors.len() > depth {
                ancestors.pop();
            }
            let idx = nodes.len();
            nodes.push(TypeTreeNode::new());
            children_of.push(Vec::new());
            let parent = ancestors[ancestors.len() - 1];
            children_of[parent].push(idx);
            ancestors.push(idx);
            idx
        };

        let node = &mut nodes[idx];
        node.version = version as i32;
        node.is_array = rec.read_i8()? != 0;
        node.type_name = resolve_name(rec.read_i32()?, &names)?;
        node.field_name = resolve_name(rec.read_i32()?, &names)?;
        node.byte_size = rec.read_i32()?;
        node.index = rec.read_u32()? as i64;
        node.flags = rec.read_i32()?;
        node.type_hint = TypeHint::from_type_name(&node.type_name);
    }

    assemble(nodes, &children_of)
}

/// Move flat arena nodes into their parents' child lists, deepest-first
fn assemble(nodes: Vec<TypeTreeNode>, children_of: &[Vec<usize>]) -> Result<TypeTreeNode> {
    let mut slots: Vec<Option<TypeTreeNode>> = nodes.into_iter().map(Some).collect();
    for i in (0..slots.len()).rev() {
        let kids: Vec<TypeTreeNode> = children_of[i]
            .iter()
            .filter_map(|&c| slots[c].take())
            .collect();
        if let Some(node) = slots[i].as_mut() {
            node.children = kids;
        }
    }
    slots
        .first_mut()
        .and_then(Option::take)
        .ok_or_else(|| AssetError::invalid_data("type tree has no root node"))
}

/// Resolve a blob-format name offset.
///
/// Negative offsets index the shared built-in table with the sign bit
/// cleared; non-negative offsets below the local blob length index the blob;
/// anything else is the null marker, never an out-of-bounds read.
fn resolve_name(offset: i32, local: &[u8]) -> Result<String> {
    if offset < 0 {
        let masked = (offset as u32 & 0x7fff_ffff) as usize;
        cstr_at(COMMON_STRINGS, masked)
    } else if (offset as usize) < local.len() {
        cstr_at(local, offset as usize)
    } else {
        Ok(super::types::NULL_NAME.to_string())
    }
}

impl TypeMetadata {
    /// Parse the metadata section of a serialized file.
    ///
    /// Any short read here is fatal for the file: without its schemas the
    /// object table cannot be interpreted at all, so failures surface as
    /// `CorruptMetadata` rather than per-object degradation.
    pub fn from_reader(reader: &mut BinaryReader<'_>, format: u32) -> Result<TypeMetadata> {
        load_metadata(reader, format).map_err(|e| {
            AssetError::corrupt_metadata(format!("metadata section, format {}", format), e)
        })
    }
}

fn load_metadata(reader: &mut BinaryReader<'_>, format: u32) -> Result<TypeMetadata> {
    let mut meta = TypeMetadata::new();
    meta.generator_version = reader.read_cstring()?;
    meta.target_platform = BuildTarget::from_raw(reader.read_u32()?);

    if format >= 13 {
        let has_type_trees = reader.read_bool()?;
        let num_types = reader.read_i32()?;

        for _ in 0..num_types {
            let mut class_id = reader.read_i32()?;
            if format >= 17 {
                let _pad = reader.read_i8()?;
                let script_id = reader.read_i16()?;
                if class_id == class_ids::MONO_BEHAVIOUR {
                    // distinct script classes share id 114 on disk; remap to
                    // synthetic negative ids so each keeps its own schema
                    class_id = if script_id >= 0 {
                        -2 - script_id as i32
                    } else {
                        -1
                    };
                }
            }
            meta.class_ids.push(class_id);

            let hash = if class_id < 0 {
                let mut h = [0u8; 32];
                h.copy_from_slice(&reader.read_bytes(32)?);
                StructHash::Script(h)
            } else {
                let mut h = [0u8; 16];
                h.copy_from_slice(&reader.read_bytes(16)?);
                StructHash::Type(h)
            };
            meta.hashes.insert(class_id, hash);

            if has_type_trees {
                meta.type_trees.insert(class_id, parse_tree(reader, format)?);
            }
        }
    } else {
        let num_fields = reader.read_i32()?;
        for _ in 0..num_fields {
            let class_id = reader.read_i32()?;
            meta.class_ids.push(class_id);
            meta.type_trees.insert(class_id, parse_tree(reader, format)?);
        }
    }

    Ok(meta)
}
