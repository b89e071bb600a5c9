//! Type-tree data structures
//!
//! A type tree is the per-file schema describing the field layout of every
//! serialized object class. One tree exists per class id; nodes are built
//! once when the file's metadata section is parsed and never mutated after.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Marker used when a name offset resolves to nothing
pub const NULL_NAME: &str = "(null)";

/// Post-field alignment flag in [`TypeTreeNode::flags`]
pub const ALIGN_FLAG: i32 = 0x4000;

/// Primitive interpretation of a node's type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TypeHint {
    #[default]
    Null,
    Bool,
    Char,
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    SInt64,
    UInt64,
    Float,
    String,
    Other,
}

impl TypeHint {
    /// Map a resolved type name onto its primitive interpretation.
    ///
    /// The aliases here ("int", "unsigned int") appear in trees emitted by
    /// older generator versions; everything unrecognized is `Other`.
    pub fn from_type_name(type_name: &str) -> TypeHint {
        match type_name {
            "bool" => TypeHint::Bool,
            "char" => TypeHint::Char,
            "SInt8" => TypeHint::SInt8,
            "UInt8" => TypeHint::UInt8,
            "SInt16" => TypeHint::SInt16,
            "UInt16" => TypeHint::UInt16,
            "SInt32" | "int" => TypeHint::SInt32,
            "UInt32" | "unsigned int" => TypeHint::UInt32,
            "SInt64" => TypeHint::SInt64,
            "UInt64" => TypeHint::UInt64,
            "float" => TypeHint::Float,
            "string" => TypeHint::String,
            NULL_NAME => TypeHint::Null,
            _ => TypeHint::Other,
        }
    }
}

/// One node of a class's field schema.
///
/// Child order is field declaration order and defines the read order of the
/// serialized payload. A leaf is a primitive or an opaque blob; an array node
/// (`is_array`) carries its element schema as child index 1.
#[derive(Debug, Clone, Serialize)]
pub struct TypeTreeNode {
    pub type_name: String,
    pub field_name: String,
    /// Serialized size in bytes; -1 for variable-size fields
    pub byte_size: i32,
    /// Declaration index within the tree
    pub index: i64,
    pub is_array: bool,
    pub version: i32,
    pub flags: i32,
    pub type_hint: TypeHint,
    pub children: Vec<TypeTreeNode>,
}

impl TypeTreeNode {
    pub fn new() -> Self {
        Self {
            type_name: NULL_NAME.to_string(),
            field_name: NULL_NAME.to_string(),
            byte_size: 0,
            index: 0,
            is_array: false,
            version: 0,
            flags: 0,
            type_hint: TypeHint::Null,
            children: Vec::new(),
        }
    }

    /// Whether the decoder must realign to 4 bytes after this field
    pub fn post_align(&self) -> bool {
        self.flags & ALIGN_FLAG != 0
    }

    /// Find a direct child by field name
    pub fn find_child(&self, field_name: &str) -> Option<&TypeTreeNode> {
        self.children.iter().find(|c| c.field_name == field_name)
    }
}

impl Default for TypeTreeNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural hash of a class schema. Script-derived classes (negative ids)
/// carry the wide form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StructHash {
    Type([u8; 16]),
    Script([u8; 32]),
}

impl StructHash {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            StructHash::Type(b) => b,
            StructHash::Script(b) => b,
        }
    }
}

/// Build target a file was serialized for. Values outside the known set are
/// preserved raw rather than rejected; new player backends appear regularly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildTarget {
    ValidPlayer,
    StandaloneOsxUniversal,
    StandaloneOsxPpc,
    StandaloneOsxIntel,
    StandaloneWinPlayer,
    WebPlayerLzma,
    WebPlayerLzmaStreamed,
    Iphone,
    Ps3,
    Xbox360,
    Broadcom,
    Android,
    WinGlesEmu,
    WinGles20Emu,
    NaCl,
    StandaloneLinux,
    Flash,
    StandaloneWin64Player,
    WebGl,
    MetroPlayer,
    StandaloneLinux64,
    StandaloneLinuxUniversal,
    Wp8Player,
    StandaloneOsxIntel64,
    Bb10,
    Tizen,
    Psp2,
    Ps4,
    Psm,
    XboxOne,
    SamsungTv,
    N3ds,
    WiiU,
    TvOs,
    Switch,
    Unknown(u32),
}

impl BuildTarget {
    pub fn from_raw(raw: u32) -> BuildTarget {
        match raw {
            1 => BuildTarget::ValidPlayer,
            2 => BuildTarget::StandaloneOsxUniversal,
            3 => BuildTarget::StandaloneOsxPpc,
            4 => BuildTarget::StandaloneOsxIntel,
            5 => BuildTarget::StandaloneWinPlayer,
            6 => BuildTarget::WebPlayerLzma,
            7 => BuildTarget::WebPlayerLzmaStreamed,
            9 => BuildTarget::Iphone,
            10 => BuildTarget::Ps3,
            11 => BuildTarget::Xbox360,
            12 => BuildTarget::Broadcom,
            13 => BuildTarget::Android,
            14 => BuildTarget::WinGlesEmu,
            15 => BuildTarget::WinGles20Emu,
            16 => BuildTarget::NaCl,
            17 => BuildTarget::StandaloneLinux,
            18 => BuildTarget::Flash,
            19 => BuildTarget::StandaloneWin64Player,
            20 => BuildTarget::WebGl,
            21 => BuildTarget::MetroPlayer,
            24 => BuildTarget::StandaloneLinux64,
            25 => BuildTarget::StandaloneLinuxUniversal,
            26 => BuildTarget::Wp8Player,
            27 => BuildTarget::StandaloneOsxIntel64,
            28 => BuildTarget::Bb10,
            29 => BuildTarget::Tizen,
            30 => BuildTarget::Psp2,
            31 => BuildTarget::Ps4,
            32 => BuildTarget::Psm,
            33 => BuildTarget::XboxOne,
            34 => BuildTarget::SamsungTv,
            35 => BuildTarget::N3ds,
            36 => BuildTarget::WiiU,
            37 => BuildTarget::TvOs,
            38 => BuildTarget::Switch,
            other => BuildTarget::Unknown(other),
        }
    }
}

impl Default for BuildTarget {
    fn default() -> Self {
        BuildTarget::Unknown(0)
    }
}

/// Parsed type metadata for one serialized file: per-class schemas, per-class
/// structural hashes, and the generator/platform header.
///
/// Every class id in the file's object table must appear in `type_trees` for
/// its objects to be readable; gaps are tolerated and reported by the layers
/// above as unreadable objects, not as parse failures here.
#[derive(Debug, Clone, Default)]
pub struct TypeMetadata {
    pub generator_version: String,
    pub target_platform: BuildTarget,
    /// Class ids in the order they appeared in the metadata section
    pub class_ids: Vec<i32>,
    pub type_trees: HashMap<i32, TypeTreeNode>,
    pub hashes: HashMap<i32, StructHash>,
}

impl TypeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema for a class id, if the file carried one
    pub fn tree_for(&self, class_id: i32) -> Option<&TypeTreeNode> {
        self.type_trees.get(&class_id)
    }

    /// The shared fallback instance consulted when a file strips its type
    /// trees. The engine bakes a default schema set into its runtime; without
    /// that resource this instance is empty, which downstream layers treat
    /// identically to a file-local schema gap.
    pub fn shared_default() -> &'static TypeMetadata {
        static DEFAULT: Lazy<TypeMetadata> = Lazy::new(TypeMetadata::new);
        &DEFAULT
    }
}
