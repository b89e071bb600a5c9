//! Schema-driven decoding of serialized object payloads
//!
//! Given a class schema, walks the payload bytes field by field and produces
//! a dynamic [`Value`]. Only the classes the dependency layer bootstraps from
//! are decoded in full; everything else goes through the name-only fast path.

use super::types::{TypeHint, TypeTreeNode};
use crate::error::{AssetError, Result};
use crate::reader::{BinaryReader, ByteOrder};
use crate::value::Value;
use indexmap::IndexMap;

/// Upper bound on decoded array lengths, to keep a corrupt length field from
/// exhausting memory before the element reads fail
const MAX_ARRAY_LEN: usize = 1_000_000;

/// Decode a full object payload against its schema
pub fn decode_object(data: &[u8], byte_order: ByteOrder, schema: &TypeTreeNode) -> Result<Value> {
    let mut reader = BinaryReader::new(data, byte_order);
    decode_node(&mut reader, schema)
}

/// Decode only an object's name field.
///
/// `m_Name` is by convention the first serialized field of every nameable
/// class; a schema whose first field is anything else has no name to read,
/// which is a `None`, not an error.
pub fn decode_name(
    data: &[u8],
    byte_order: ByteOrder,
    schema: &TypeTreeNode,
) -> Result<Option<String>> {
    let Some(first) = schema.children.first() else {
        return Ok(None);
    };
    if first.field_name != "m_Name"
        || TypeHint::from_type_name(&first.type_name) != TypeHint::String
    {
        return Ok(None);
    }
    let mut reader = BinaryReader::new(data, byte_order);
    Ok(Some(reader.read_aligned_string()?))
}

fn decode_node(reader: &mut BinaryReader<'_>, node: &TypeTreeNode) -> Result<Value> {
    let value = if node.is_array {
        decode_sequence(reader, node)?
    } else if let Some(array_child) = node
        .children
        .iter()
        .find(|c| c.is_array && c.type_name == "Array")
    {
        // vector-style wrapper: the single Array child carries the sequence
        let items = decode_sequence(reader, array_child)?;
        if array_child.post_align() {
            reader.align()?;
        }
        items
    } else {
        match TypeHint::from_type_name(&node.type_name) {
            TypeHint::Bool => Value::Bool(reader.read_bool()?),
            TypeHint::Char | TypeHint::SInt8 => Value::Int(reader.read_i8()? as i64),
            TypeHint::UInt8 => Value::Int(reader.read_u8()? as i64),
            TypeHint::SInt16 => Value::Int(reader.read_i16()? as i64),
            TypeHint::UInt16 => Value::Int(reader.read_u16()? as i64),
            TypeHint::SInt32 => Value::Int(reader.read_i32()? as i64),
            TypeHint::UInt32 => Value::Int(reader.read_u32()? as i64),
            TypeHint::SInt64 => Value::Int(reader.read_i64()?),
            TypeHint::UInt64 => Value::Int(reader.read_u64()? as i64),
            TypeHint::Float => Value::Float(reader.read_f32()? as f64),
            TypeHint::String => Value::String(reader.read_aligned_string()?),
            TypeHint::Null | TypeHint::Other => {
                if !node.children.is_empty() {
                    let mut map = IndexMap::new();
                    for child in &node.children {
                        map.insert(child.field_name.clone(), decode_node(reader, child)?);
                    }
                    Value::Object(map)
                } else if node.byte_size > 0 {
                    // opaque leaf: payloads stay byte ranges, skip them
                    reader.read_bytes(node.byte_size as usize)?;
                    Value::Null
                } else {
                    Value::Null
                }
            }
        }
    };

    if node.post_align() {
        reader.align()?;
    }
    Ok(value)
}

fn decode_sequence(reader: &mut BinaryReader<'_>, array_node: &TypeTreeNode) -> Result<Value> {
    let len = reader.read_i32()?;
    if len < 0 {
        return Err(AssetError::invalid_data(format!(
            "negative array length {}",
            len
        )));
    }
    let len = len as usize;
    if len > MAX_ARRAY_LEN {
        return Err(AssetError::invalid_data(format!(
            "array length {} exceeds sanity bound",
            len
        )));
    }
    let element = array_node
        .children
        .get(1)
        .ok_or_else(|| AssetError::invalid_data("array schema missing element type"))?;

    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(decode_node(reader, element)?);
    }
    Ok(Value::Array(items))
}
