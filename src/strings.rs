//! Shared built-in name table for type-tree string references
//!
//! Blob-format type trees reference names by offset. Negative offsets (sign
//! bit set) point into this table, which the engine bakes into every build;
//! non-negative offsets point into the file-local string blob that trails the
//! node records.

use crate::error::Result;

/// The engine's built-in string table, as concatenated null-terminated
/// entries. Offsets into this table are stable across engine versions; new
/// entries are only ever appended.
pub static COMMON_STRINGS: &[u8] = b"AABB\0AnimationClip\0AnimationCurve\0AnimationState\0\
Array\0Base\0BitField\0bitset\0bool\0char\0ColorRGBA\0Component\0data\0deque\0double\0\
dynamic_array\0FastPropertyName\0first\0float\0Font\0GameObject\0Generic Mono\0GradientNEW\0\
GUID\0GUIStyle\0int\0list\0long long\0map\0Matrix4x4f\0MdFour\0MonoBehaviour\0MonoScript\0\
m_ByteSize\0m_Curve\0m_EditorClassIdentifier\0m_EditorHideFlags\0m_Enabled\0m_ExtensionPtr\0\
m_GameObject\0m_Index\0m_IsArray\0m_IsStatic\0m_MetaFlag\0m_Name\0m_ObjectHideFlags\0\
m_PrefabInternal\0m_PrefabParentObject\0m_Script\0m_StaticEditorFlags\0m_Type\0m_Version\0\
Object\0pair\0PPtr<Component>\0PPtr<GameObject>\0PPtr<Material>\0PPtr<MonoBehaviour>\0\
PPtr<MonoScript>\0PPtr<Object>\0PPtr<Prefab>\0PPtr<Sprite>\0PPtr<TextAsset>\0PPtr<Texture>\0\
PPtr<Texture2D>\0PPtr<Transform>\0Prefab\0Quaternionf\0Rectf\0RectInt\0RectOffset\0second\0\
set\0short\0size\0SInt16\0SInt32\0SInt64\0SInt8\0staticvector\0string\0TextAsset\0TextMesh\0\
Texture\0Texture2D\0Transform\0TypelessData\0UInt16\0UInt32\0UInt64\0UInt8\0unsigned int\0\
unsigned long long\0unsigned short\0vector\0Vector2f\0Vector3f\0Vector4f\0\
m_ScriptingClassIdentifier\0Gradient\0Type*\0int2_storage\0int3_storage\0BoundsInt\0\
m_CorrespondingSourceObject\0m_PrefabInstance\0m_PrefabAsset\0FileSize\0Hash128\0";

/// Read the null-terminated run starting at `offset`.
///
/// An offset past the end of the data yields an empty string rather than an
/// error; a run with no terminator extends to the end of the data.
pub(crate) fn cstr_at(data: &[u8], offset: usize) -> Result<String> {
    if offset >= data.len() {
        return Ok(String::new());
    }
    let tail = &data[offset..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Ok(std::str::from_utf8(&tail[..end])?.to_string())
}
