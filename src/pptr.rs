//! Cross-file object pointers

use crate::value::Value;
use serde::Serialize;

/// An indirect reference to a serialized object.
///
/// `file_id == 0` addresses the current file; `file_id > 0` is a 1-based
/// index into the owning file's external-reference list. The canonical null
/// pointer is `(-1, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectPointer {
    pub file_id: i32,
    pub path_id: i64,
}

impl ObjectPointer {
    /// The canonical null pointer
    pub const NULL: ObjectPointer = ObjectPointer {
        file_id: -1,
        path_id: -1,
    };

    pub fn new(file_id: i32, path_id: i64) -> Self {
        Self { file_id, path_id }
    }

    /// Whether this is the null pointer
    pub fn is_null(&self) -> bool {
        self.file_id == -1 && self.path_id == -1
    }

    /// Whether this addresses an object in the owning file itself
    pub fn is_local(&self) -> bool {
        self.file_id == 0 && self.path_id != -1
    }

    /// Whether this addresses an object through the external-reference list
    pub fn is_external(&self) -> bool {
        self.file_id > 0
    }

    /// Build a pointer from a decoded `PPtr<...>` value.
    ///
    /// Anything that is not an object carrying `m_FileID`/`m_PathID` decodes
    /// as the null pointer.
    pub fn from_value(value: &Value) -> ObjectPointer {
        let Some(map) = value.as_object() else {
            return Self::NULL;
        };
        match (
            map.get("m_FileID").and_then(Value::as_i64),
            map.get("m_PathID").and_then(Value::as_i64),
        ) {
            (Some(file_id), Some(path_id)) => Self::new(file_id as i32, path_id),
            _ => Self::NULL,
        }
    }
}

impl Default for ObjectPointer {
    fn default() -> Self {
        Self::NULL
    }
}
