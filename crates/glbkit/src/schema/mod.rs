//! Binding between JSON objects and typed records.
//!
//! Every record type lists its members once, in a `const` table of [`Field`]s.
//! Each entry names the JSON key and carries a reader and a writer function;
//! [`Record::from_node`] walks an object's entries and dispatches on the key,
//! [`Record::write_record`] replays the table in order. Unknown keys are
//! skipped on read. `extensions` and `extras` are kept as [`RawJson`] and
//! written back verbatim.
//!
//! Member values go through [`FieldValue`], which is implemented for the
//! scalar types, strings, arrays, maps, options and every record.

mod animation;
mod asset;
mod binary;
mod material;
mod mesh;
mod node;

use std::collections::BTreeMap;

pub use animation::{Animation, AnimationSampler, Channel, ChannelTarget, Interpolation};
pub use asset::Asset;
pub use material::{AlphaMode, Material, PbrMetallicRoughness, TextureInfo};
pub use mesh::{Mesh, Primitive, PrimitiveMode};
pub use node::Node;
use tracing::trace;

use crate::{
    error::{Error, Result},
    parser::{JsonNode, parse_complete},
    value::Value,
    writer::JsonWriter,
};

/// One member of a record's field table.
pub struct Field<T> {
    /// JSON key.
    pub name: &'static str,
    /// Missing required members fail with [`Error::KeyNotFound`].
    pub required: bool,
    /// Stores the member's value into the record.
    pub read: fn(&mut T, JsonNode<'_>) -> Result<()>,
    /// Writes `"name": value`, or nothing when the member is absent.
    pub write: fn(&T, &'static str, &mut JsonWriter) -> Result<()>,
}

/// Builds a [`Field`] bound to a struct member.
///
/// `field!("key", member)` for optional members, `field!("key", member,
/// required)` for required ones, and `field!("key", member, default)` for
/// members omitted on output while they hold their default value.
macro_rules! field {
    (@build $name:literal, $member:ident, $required:expr, |$record:ident, $key:ident, $w:ident| $write:expr) => {
        $crate::schema::Field {
            name: $name,
            required: $required,
            read: |record, node| {
                record.$member = $crate::schema::FieldValue::read_json(node)?;
                Ok(())
            },
            write: |$record, $key, $w| $write,
        }
    };
    ($name:literal, $member:ident, required) => {
        field!(@build $name, $member, true, |record, key, w| {
            $crate::schema::write_member(w, key, &record.$member)
        })
    };
    ($name:literal, $member:ident, default) => {
        field!(@build $name, $member, false, |record, key, w| {
            if $crate::schema::is_default(&record.$member) {
                Ok(())
            } else {
                $crate::schema::write_member(w, key, &record.$member)
            }
        })
    };
    ($name:literal, $member:ident) => {
        field!(@build $name, $member, false, |record, key, w| {
            $crate::schema::write_member(w, key, &record.$member)
        })
    };
}

/// Implements [`FieldValue`] for record types so they nest inside other
/// records.
macro_rules! record_value {
    ($($t:ty),* $(,)?) => {$(
        impl $crate::schema::FieldValue for $t {
            fn read_json(node: $crate::parser::JsonNode<'_>) -> $crate::error::Result<Self> {
                <$t as $crate::schema::Record>::from_node(node)
            }

            fn write_json(&self, w: &mut $crate::writer::JsonWriter) -> $crate::error::Result<()> {
                $crate::schema::Record::write_record(self, w)
            }
        }
    )*};
}

pub(crate) use {field, record_value};

/// A JSON object with a fixed field table.
pub trait Record: Default + 'static {
    /// Members in output order.
    const FIELDS: &'static [Field<Self>];

    /// Reads an object node. Later duplicates of a key win.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] if `node` is not an object or a member has
    /// the wrong type, [`Error::KeyNotFound`] for a missing required member.
    fn from_node(node: JsonNode<'_>) -> Result<Self> {
        debug_assert!(Self::FIELDS.len() <= 64);
        let mut record = Self::default();
        let mut seen = 0u64;
        for entry in node.entries()? {
            let (key, value) = entry?;
            let key = key.get_str()?;
            match Self::FIELDS.iter().position(|f| f.name == key) {
                Some(i) => {
                    (Self::FIELDS[i].read)(&mut record, value)?;
                    seen |= 1 << i;
                }
                None => trace!(key = %key, "skipping unknown member"),
            }
        }
        for (i, field) in Self::FIELDS.iter().enumerate() {
            if field.required && seen & (1 << i) == 0 {
                return Err(Error::KeyNotFound(field.name.to_owned()));
            }
        }
        Ok(record)
    }

    /// Writes the members, without the surrounding braces.
    ///
    /// # Errors
    ///
    /// Writer errors.
    fn write_fields(&self, w: &mut JsonWriter) -> Result<()> {
        for field in Self::FIELDS {
            (field.write)(self, field.name, w)?;
        }
        Ok(())
    }

    /// Writes the record as an object.
    ///
    /// # Errors
    ///
    /// Writer errors.
    fn write_record(&self, w: &mut JsonWriter) -> Result<()> {
        w.begin_map()?;
        self.write_fields(w)?;
        w.end_map()
    }
}

/// A type that can appear as a member value.
pub trait FieldValue: Sized {
    /// Converts a member node.
    ///
    /// # Errors
    ///
    /// Type mismatches or syntax errors in `node`.
    fn read_json(node: JsonNode<'_>) -> Result<Self>;

    /// Writes the value at the writer's current position.
    ///
    /// # Errors
    ///
    /// Writer errors.
    fn write_json(&self, w: &mut JsonWriter) -> Result<()>;

    /// Absent members are not written at all.
    fn is_absent(&self) -> bool {
        false
    }
}

pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Writes `"key": value` unless `value` is absent.
pub(crate) fn write_member<T: FieldValue>(w: &mut JsonWriter, key: &str, value: &T) -> Result<()> {
    if value.is_absent() {
        return Ok(());
    }
    w.key(key)?;
    value.write_json(w)
}

/// Verbatim JSON text, used for `extensions`, `extras` and top-level members
/// without a typed binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawJson(String);

impl RawJson {
    /// Wraps and validates `text`.
    ///
    /// # Errors
    ///
    /// [`Error::Syntax`] if `text` is not exactly one JSON value.
    pub fn parse(text: &str) -> Result<Self> {
        parse_complete(text)?;
        Ok(Self(text.trim().to_owned()))
    }

    /// Serializes an owned value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self(value.to_string())
    }

    /// The JSON text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the text into an owned value.
    ///
    /// # Errors
    ///
    /// [`Error::Syntax`] if the text was not valid JSON.
    pub fn to_value(&self) -> Result<Value> {
        parse_complete(&self.0)?.to_value()
    }
}

impl FieldValue for RawJson {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        Ok(Self(node.raw()?.to_owned()))
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.dump(&self.0)
    }
}

impl FieldValue for String {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        Ok(node.get_str()?.into_owned())
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.value_str(self)
    }
}

impl FieldValue for bool {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        node.get_bool()
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.value_bool(*self)
    }
}

impl FieldValue for usize {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        node.get_usize()
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.value_u64(*self as u64)
    }
}

impl FieldValue for u32 {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        node.get_u32()
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.value_u64(u64::from(*self))
    }
}

impl FieldValue for f32 {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        node.get_f32()
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.value_f32(*self)
    }
}

impl FieldValue for f64 {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        node.get_f64()
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.value_f64(*self)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        T::read_json(node).map(Some)
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        match self {
            Some(v) => v.write_json(w),
            None => w.value_null(),
        }
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        node.items()?.map(|item| T::read_json(item?)).collect()
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.begin_array()?;
        for v in self {
            v.write_json(w)?;
        }
        w.end_array()
    }

    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<const N: usize> FieldValue for [f32; N] {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        let values = Vec::<f32>::read_json(node)?;
        let found = values.len();
        values
            .try_into()
            .map_err(|_| Error::malformed(format!("expected {N} numbers, found {found}")))
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.begin_array()?;
        for v in self {
            w.value_f32(*v)?;
        }
        w.end_array()
    }
}

impl<T: FieldValue> FieldValue for BTreeMap<String, T> {
    fn read_json(node: JsonNode<'_>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in node.entries()? {
            let (key, value) = entry?;
            map.insert(key.get_str()?.into_owned(), T::read_json(value)?);
        }
        Ok(map)
    }

    fn write_json(&self, w: &mut JsonWriter) -> Result<()> {
        w.begin_map()?;
        for (key, value) in self {
            w.key(key)?;
            value.write_json(w)?;
        }
        w.end_map()
    }

    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

/// Implements [`FieldValue`] for a fieldless enum stored as a JSON string.
macro_rules! named_enum_value {
    ($t:ty, $what:literal) => {
        impl $crate::schema::FieldValue for $t {
            fn read_json(node: $crate::parser::JsonNode<'_>) -> $crate::error::Result<Self> {
                let name = node.get_str()?;
                <$t>::from_name(&name).ok_or_else(|| {
                    $crate::error::Error::malformed(format!(concat!("unknown ", $what, " {:?}"), name))
                })
            }

            fn write_json(&self, w: &mut $crate::writer::JsonWriter) -> $crate::error::Result<()> {
                w.value_str(self.name())
            }
        }
    };
}

/// Implements [`FieldValue`] for a fieldless enum stored as a numeric code.
macro_rules! coded_enum_value {
    ($t:ty, $what:literal) => {
        impl $crate::schema::FieldValue for $t {
            fn read_json(node: $crate::parser::JsonNode<'_>) -> $crate::error::Result<Self> {
                let code = node.get_u32()?;
                <$t>::from_code(code).ok_or_else(|| {
                    $crate::error::Error::malformed(format!(concat!("unknown ", $what, " {}"), code))
                })
            }

            fn write_json(&self, w: &mut $crate::writer::JsonWriter) -> $crate::error::Result<()> {
                w.value_u64(u64::from(self.code()))
            }
        }
    };
}

pub(crate) use {coded_enum_value, named_enum_value};
