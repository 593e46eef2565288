use std::collections::BTreeMap;

use super::{Field, RawJson, Record, coded_enum_value, field, record_value};

/// Topology of a primitive.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// 0
    Points,
    /// 1
    Lines,
    /// 2
    LineLoop,
    /// 3
    LineStrip,
    /// 4, the default.
    #[default]
    Triangles,
    /// 5
    TriangleStrip,
    /// 6
    TriangleFan,
}

impl PrimitiveMode {
    /// Maps a `mode` code.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Points,
            1 => Self::Lines,
            2 => Self::LineLoop,
            3 => Self::LineStrip,
            4 => Self::Triangles,
            5 => Self::TriangleStrip,
            6 => Self::TriangleFan,
            _ => return None,
        })
    }

    /// The `mode` code.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Points => 0,
            Self::Lines => 1,
            Self::LineLoop => 2,
            Self::LineStrip => 3,
            Self::Triangles => 4,
            Self::TriangleStrip => 5,
            Self::TriangleFan => 6,
        }
    }
}

coded_enum_value!(PrimitiveMode, "primitive mode");

/// Geometry to be drawn with one material. `attributes` and `indices` refer to
/// accessors by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Primitive {
    /// Semantic name, such as `POSITION`, to accessor.
    pub attributes: BTreeMap<String, usize>,
    /// Index accessor; `None` draws the vertices in order.
    pub indices: Option<usize>,
    /// Material index.
    pub material: Option<usize>,
    /// `None` means triangles.
    pub mode: Option<PrimitiveMode>,
    /// Morph targets, attribute name to accessor.
    pub targets: Vec<BTreeMap<String, usize>>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Primitive {
    /// The declared mode or triangles.
    #[must_use]
    pub fn mode(&self) -> PrimitiveMode {
        self.mode.unwrap_or_default()
    }
}

impl Record for Primitive {
    const FIELDS: &'static [Field<Self>] = &[
        field!("attributes", attributes, required),
        field!("indices", indices),
        field!("material", material),
        field!("mode", mode),
        field!("targets", targets),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

/// A set of primitives drawn together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// At least one primitive.
    pub primitives: Vec<Primitive>,
    /// Default morph target weights.
    pub weights: Vec<f32>,
    /// Display name.
    pub name: Option<String>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl Record for Mesh {
    const FIELDS: &'static [Field<Self>] = &[
        field!("primitives", primitives, required),
        field!("weights", weights),
        field!("name", name),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

record_value!(Primitive, Mesh);

impl Mesh {
    /// Every accessor index referenced by the mesh's primitives.
    pub fn accessor_refs(&self) -> impl Iterator<Item = usize> + '_ {
        self.primitives.iter().flat_map(|p| {
            p.attributes
                .values()
                .chain(p.targets.iter().flat_map(BTreeMap::values))
                .copied()
                .chain(p.indices)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, options::ParseMode, parser::parse};

    #[test]
    fn primitive_members() {
        let text = r#"{"name": "quad", "primitives": [
            {"attributes": {"POSITION": 0, "NORMAL": 1}, "indices": 2, "mode": 4,
             "targets": [{"POSITION": 3}]}
        ]}"#;
        let mesh = Mesh::from_node(parse(text, ParseMode::Lazy).unwrap()).unwrap();
        let primitive = &mesh.primitives[0];
        assert_eq!(primitive.attributes["POSITION"], 0);
        assert_eq!(primitive.mode(), PrimitiveMode::Triangles);
        let mut refs: Vec<_> = mesh.accessor_refs().collect();
        refs.sort_unstable();
        assert_eq!(refs, vec![0, 1, 2, 3]);
    }

    #[test]
    fn primitives_are_required() {
        let err = Mesh::from_node(parse(r#"{"name": "x"}"#, ParseMode::Lazy).unwrap()).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(k) if k == "primitives"));
        let err = Mesh::from_node(parse(r#"{"primitives": [{"mode": 9, "attributes": {}}]}"#, ParseMode::Lazy).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }
}
