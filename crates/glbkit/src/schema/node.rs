use super::{Field, RawJson, Record, field, record_value};

/// A scene graph node. Transform members are kept as written; no matrix math
/// is done here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// Display name.
    pub name: Option<String>,
    /// Index into the pass-through `cameras` member.
    pub camera: Option<usize>,
    /// Child node indices.
    pub children: Vec<usize>,
    /// Index into the pass-through `skins` member.
    pub skin: Option<usize>,
    /// Column-major 4x4 matrix.
    pub matrix: Option<[f32; 16]>,
    /// Mesh drawn at this node.
    pub mesh: Option<usize>,
    /// Unit quaternion `(x, y, z, w)`.
    pub rotation: Option<[f32; 4]>,
    /// Per-axis scale.
    pub scale: Option<[f32; 3]>,
    /// Offset from the parent.
    pub translation: Option<[f32; 3]>,
    /// Morph target weights, overriding the mesh's.
    pub weights: Vec<f32>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for Node {
    const FIELDS: &'static [Field<Self>] = &[
        field!("name", name),
        field!("camera", camera),
        field!("children", children),
        field!("skin", skin),
        field!("matrix", matrix),
        field!("mesh", mesh),
        field!("rotation", rotation),
        field!("scale", scale),
        field!("translation", translation),
        field!("weights", weights),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

record_value!(Node);
