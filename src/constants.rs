//! Class-id naming for serialized objects

/// Well-known engine class ids
pub mod class_ids {
    pub const GAME_OBJECT: i32 = 1;
    pub const TRANSFORM: i32 = 4;
    pub const MATERIAL: i32 = 21;
    pub const TEXTURE_2D: i32 = 28;
    pub const MESH: i32 = 43;
    pub const SHADER: i32 = 48;
    pub const TEXT_ASSET: i32 = 49;
    pub const ANIMATION_CLIP: i32 = 74;
    pub const AUDIO_CLIP: i32 = 83;
    pub const ANIMATOR_CONTROLLER: i32 = 91;
    pub const MONO_BEHAVIOUR: i32 = 114;
    pub const MONO_SCRIPT: i32 = 115;
    pub const FONT: i32 = 128;
    pub const ASSET_BUNDLE: i32 = 142;
    pub const PRELOAD_DATA: i32 = 150;
    pub const MOVIE_TEXTURE: i32 = 152;
    pub const SPRITE: i32 = 213;
}

/// Stringified type tag for a class id.
///
/// Script-derived ids are negative (the metadata parser remaps class 114 by
/// script index) and all render as MonoBehaviour. Ids outside the known set
/// fall back to `Class_<id>` so that unknown platform types still get a
/// usable tag.
pub fn class_name(class_id: i32) -> String {
    let name = match class_id {
        id if id < 0 => "MonoBehaviour",
        class_ids::GAME_OBJECT => "GameObject",
        class_ids::TRANSFORM => "Transform",
        class_ids::MATERIAL => "Material",
        class_ids::TEXTURE_2D => "Texture2D",
        class_ids::MESH => "Mesh",
        class_ids::SHADER => "Shader",
        class_ids::TEXT_ASSET => "TextAsset",
        class_ids::ANIMATION_CLIP => "AnimationClip",
        class_ids::AUDIO_CLIP => "AudioClip",
        class_ids::ANIMATOR_CONTROLLER => "AnimatorController",
        class_ids::MONO_BEHAVIOUR => "MonoBehaviour",
        class_ids::MONO_SCRIPT => "MonoScript",
        class_ids::FONT => "Font",
        class_ids::ASSET_BUNDLE => "AssetBundle",
        class_ids::PRELOAD_DATA => "PreloadData",
        class_ids::MOVIE_TEXTURE => "MovieTexture",
        class_ids::SPRITE => "Sprite",
        other => return format!("Class_{}", other),
    };
    name.to_string()
}
