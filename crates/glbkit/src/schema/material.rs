use super::{Field, RawJson, Record, field, named_enum_value, record_value};

/// How the base color's alpha channel is interpreted.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    /// Alpha is ignored.
    #[default]
    Opaque,
    /// Fully opaque or fully transparent, split at the cutoff.
    Mask,
    /// Blended with the background.
    Blend,
}

impl AlphaMode {
    /// Parses `OPAQUE`, `MASK` or `BLEND`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "OPAQUE" => Some(Self::Opaque),
            "MASK" => Some(Self::Mask),
            "BLEND" => Some(Self::Blend),
            _ => None,
        }
    }

    /// The JSON spelling.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Opaque => "OPAQUE",
            Self::Mask => "MASK",
            Self::Blend => "BLEND",
        }
    }
}

named_enum_value!(AlphaMode, "alpha mode");

/// Reference to a texture. `scale` applies to normal textures and `strength`
/// to occlusion textures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureInfo {
    /// Index into the pass-through `textures` member.
    pub index: usize,
    /// Which `TEXCOORD_n` attribute to sample with.
    pub tex_coord: Option<u32>,
    /// Normal map scale.
    pub scale: Option<f32>,
    /// Occlusion strength.
    pub strength: Option<f32>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for TextureInfo {
    const FIELDS: &'static [Field<Self>] = &[
        field!("index", index, required),
        field!("texCoord", tex_coord),
        field!("scale", scale),
        field!("strength", strength),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

/// Metallic-roughness shading parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PbrMetallicRoughness {
    /// Linear RGBA multiplier.
    pub base_color_factor: Option<[f32; 4]>,
    /// Base color texture.
    pub base_color_texture: Option<TextureInfo>,
    /// Metalness in `[0, 1]`.
    pub metallic_factor: Option<f32>,
    /// Roughness in `[0, 1]`.
    pub roughness_factor: Option<f32>,
    /// Metalness in blue, roughness in green.
    pub metallic_roughness_texture: Option<TextureInfo>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for PbrMetallicRoughness {
    const FIELDS: &'static [Field<Self>] = &[
        field!("baseColorFactor", base_color_factor),
        field!("baseColorTexture", base_color_texture),
        field!("metallicFactor", metallic_factor),
        field!("roughnessFactor", roughness_factor),
        field!("metallicRoughnessTexture", metallic_roughness_texture),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

/// Surface appearance of a primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    /// Display name.
    pub name: Option<String>,
    /// Shading parameters.
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    /// Tangent-space normal map.
    pub normal_texture: Option<TextureInfo>,
    /// Ambient occlusion map.
    pub occlusion_texture: Option<TextureInfo>,
    /// Emission map.
    pub emissive_texture: Option<TextureInfo>,
    /// Linear RGB emission.
    pub emissive_factor: Option<[f32; 3]>,
    /// `None` reads as opaque.
    pub alpha_mode: Option<AlphaMode>,
    /// Threshold for [`AlphaMode::Mask`].
    pub alpha_cutoff: Option<f32>,
    /// Whether back faces are drawn. Written only when set.
    pub double_sided: bool,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for Material {
    const FIELDS: &'static [Field<Self>] = &[
        field!("name", name),
        field!("pbrMetallicRoughness", pbr_metallic_roughness),
        field!("normalTexture", normal_texture),
        field!("occlusionTexture", occlusion_texture),
        field!("emissiveTexture", emissive_texture),
        field!("emissiveFactor", emissive_factor),
        field!("alphaMode", alpha_mode),
        field!("alphaCutoff", alpha_cutoff),
        field!("doubleSided", double_sided, default),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

record_value!(TextureInfo, PbrMetallicRoughness, Material);
