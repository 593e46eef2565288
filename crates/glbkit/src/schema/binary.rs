//! Field tables for buffers, buffer views and accessors.

use super::{Field, Record, coded_enum_value, field, named_enum_value, record_value};
use crate::{
    accessor::{Accessor, ComponentType, ElementShape, SparseIndices, SparseOverlay, SparseValues},
    buffer::{Buffer, BufferView, Target},
};

coded_enum_value!(ComponentType, "componentType");
coded_enum_value!(Target, "bufferView target");
named_enum_value!(ElementShape, "accessor type");

impl Record for Buffer {
    const FIELDS: &'static [Field<Self>] = &[
        field!("uri", uri),
        field!("byteLength", byte_length, required),
        field!("name", name),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

impl Record for BufferView {
    const FIELDS: &'static [Field<Self>] = &[
        field!("buffer", buffer, required),
        field!("byteOffset", byte_offset, default),
        field!("byteLength", byte_length, required),
        field!("byteStride", byte_stride),
        field!("target", target),
        field!("name", name),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

impl Record for SparseIndices {
    const FIELDS: &'static [Field<Self>] = &[
        field!("bufferView", buffer_view, required),
        field!("byteOffset", byte_offset, default),
        field!("componentType", component_type, required),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

impl Record for SparseValues {
    const FIELDS: &'static [Field<Self>] = &[
        field!("bufferView", buffer_view, required),
        field!("byteOffset", byte_offset, default),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

impl Record for SparseOverlay {
    const FIELDS: &'static [Field<Self>] = &[
        field!("count", count, required),
        field!("indices", indices, required),
        field!("values", values, required),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

impl Record for Accessor {
    const FIELDS: &'static [Field<Self>] = &[
        field!("bufferView", buffer_view),
        field!("byteOffset", byte_offset, default),
        field!("componentType", component_type, required),
        field!("normalized", normalized, default),
        field!("count", count, required),
        field!("type", shape, required),
        field!("max", max),
        field!("min", min),
        field!("sparse", sparse),
        field!("name", name),
        field!("extensions", extensions),
        field!("extras", extras),
    ];
}

record_value!(Buffer, BufferView, SparseIndices, SparseValues, SparseOverlay, Accessor);
