//! Lazy glTF 2.0 codec.
//!
//! The crate reads and writes the JSON document and the binary GLB container,
//! and turns the buffer → buffer view → accessor indirection into typed
//! arrays.
//!
//! - [`parser`] classifies JSON text into [`JsonNode`]s that hold a span over
//!   the source and walk their children on demand.
//! - [`writer`] emits JSON through a context stack that rejects misplaced
//!   keys and values.
//! - [`glb`] splits and frames the container.
//! - [`buffer`] and [`accessor`] resolve storage and decode strided,
//!   optionally sparse element arrays, always little-endian.
//! - [`schema`] binds JSON objects to typed records through field tables.
//! - [`Document`] ties these together; [`ParseTask`] runs it on a worker
//!   thread.
//!
//! ```rust
//! use glbkit::{Buffer, Document, ReadOptions, Target, WriteOptions};
//!
//! let mut doc = Document::new();
//! let buffer = doc.add_buffer(Buffer::new());
//! let indices = doc
//!     .push_accessor(buffer, &[0u16, 1, 2], Some(Target::ElementArrayBuffer))
//!     .unwrap();
//!
//! let bytes = doc.to_glb(WriteOptions::default()).unwrap();
//! let back = Document::from_glb(&bytes, &ReadOptions::default()).unwrap();
//! assert_eq!(back.get_indices(indices).unwrap(), vec![2, 1, 0]);
//! ```

pub mod accessor;
pub mod buffer;
pub mod document;
pub mod error;
mod escape;
pub mod glb;
mod options;
pub mod parser;
pub mod schema;
pub mod span;
pub mod task;
mod value;
pub mod writer;

#[cfg(test)]
mod tests;

pub use accessor::{
    Accessor, Component, ComponentType, Element, ElementShape, SparseIndices, SparseOverlay,
    SparseValues, flip_winding,
};
pub use buffer::{Buffer, BufferView, Target};
pub use document::{Document, parse_document};
pub use error::{Error, Result};
pub use escape::{escape_string, unescape_string};
pub use glb::{read_glb, write_glb};
pub use options::{ParseMode, ReadOptions, WriteOptions};
pub use parser::{JsonNode, NodeKind, ParseError, SyntaxError, parse, parse_complete};
pub use schema::RawJson;
pub use span::{ByteSpan, Span, StrSpan};
pub use task::ParseTask;
pub use value::{Array, Map, Value};
pub use writer::JsonWriter;
