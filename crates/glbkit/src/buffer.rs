//! Raw byte storage and the views cut from it.
//!
//! A [`Buffer`] is resolved the first time its bytes are needed:
//!
//! - a `data:` URI with a `;base64,` payload is decoded inline,
//! - any other URI is a percent-encoded path relative to the document's base
//!   directory and is read from disk,
//! - a buffer without URI is bound to the binary chunk of a container.
//!
//! The result is cached, so every later access is a plain borrow.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::debug;

use crate::{
    accessor::{Component, Element},
    error::{Error, Result},
    schema::RawJson,
};

/// GPU binding hint of a buffer view.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Vertex attributes (34962).
    ArrayBuffer,
    /// Vertex indices (34963).
    ElementArrayBuffer,
}

impl Target {
    /// Maps a GL target code.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            34962 => Some(Self::ArrayBuffer),
            34963 => Some(Self::ElementArrayBuffer),
            _ => None,
        }
    }

    /// The GL target code.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::ArrayBuffer => 34962,
            Self::ElementArrayBuffer => 34963,
        }
    }
}

/// A block of binary data, stored inline, on disk, or in the container.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    /// A `data:` URI or a percent-encoded relative path. `None` for the
    /// container's binary chunk or a buffer built in memory.
    pub uri: Option<String>,
    /// Declared length; the loaded data must be at least this long.
    pub byte_length: usize,
    /// Display name.
    pub name: Option<String>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
    storage: OnceLock<Vec<u8>>,
}

impl Buffer {
    /// An empty buffer to be filled through [`Buffer::append`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: OnceLock::from(Vec::new()),
            ..Default::default()
        }
    }

    /// A buffer holding `data`, without URI.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            byte_length: data.len(),
            storage: OnceLock::from(data),
            ..Default::default()
        }
    }

    /// A buffer stored at `uri`, loaded on first use.
    #[must_use]
    pub fn with_uri(uri: impl Into<String>, byte_length: usize) -> Self {
        Self {
            uri: Some(uri.into()),
            byte_length,
            ..Default::default()
        }
    }

    /// Binds already loaded bytes, typically the container's binary chunk.
    /// Has no effect if the buffer is already resolved.
    pub(crate) fn bind(&self, data: Vec<u8>) {
        let _ = self.storage.set(data);
    }

    /// The cached bytes, if the buffer has been resolved.
    #[must_use]
    pub fn data(&self) -> Option<&[u8]> {
        self.storage.get().map(Vec::as_slice)
    }

    /// Whether the bytes are loaded or bound.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.storage.get().is_some()
    }

    /// The buffer's bytes, loading them on first use.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] or [`Error::Base64`] if loading fails,
    /// [`Error::MalformedDocument`] for a URI-less buffer with nothing bound,
    /// and [`Error::BoundsViolation`] if fewer than `byte_length` bytes were
    /// loaded.
    pub fn resolve(&self, base_dir: Option<&Path>) -> Result<&[u8]> {
        if let Some(data) = self.storage.get() {
            return Ok(data);
        }
        let data = self.load(base_dir)?;
        if data.len() < self.byte_length {
            return Err(Error::out_of_bounds("buffer byteLength", self.byte_length, data.len()));
        }
        Ok(self.storage.get_or_init(|| data))
    }

    fn load(&self, base_dir: Option<&Path>) -> Result<Vec<u8>> {
        let Some(uri) = self.uri.as_deref() else {
            return Err(Error::malformed("buffer has no uri and no binary chunk"));
        };
        if uri.starts_with("data:") {
            debug!(len = uri.len(), "decoding data uri");
            return decode_data_uri(uri);
        }
        let relative = percent_decode(uri)?;
        let path = base_dir.map_or_else(|| PathBuf::from(&relative), |dir| dir.join(&relative));
        debug!(path = %path.display(), "reading external buffer");
        Ok(std::fs::read(path)?)
    }

    /// Appends raw bytes, first padding the store with zeros to a multiple of
    /// `alignment` when it is not empty, and returns a view over them.
    /// `index` is this buffer's index in the document.
    pub fn append(
        &mut self,
        index: usize,
        bytes: &[u8],
        alignment: usize,
        target: Option<Target>,
    ) -> BufferView {
        let mut store = self.storage.take().unwrap_or_default();
        if !store.is_empty() && alignment > 1 {
            let padded = store.len().next_multiple_of(alignment);
            store.resize(padded, 0);
        }
        let byte_offset = store.len();
        store.extend_from_slice(bytes);
        self.byte_length = store.len();
        self.storage = OnceLock::from(store);
        BufferView {
            buffer: index,
            byte_offset,
            byte_length: bytes.len(),
            target,
            ..Default::default()
        }
    }

    /// Appends `data` encoded little-endian, aligned to its component size.
    pub fn append_elements<T: Element>(
        &mut self,
        index: usize,
        data: &[T],
        target: Option<Target>,
    ) -> BufferView {
        let mut bytes = Vec::with_capacity(data.len() * T::SIZE);
        for element in data {
            element.write_le(&mut bytes);
        }
        self.append(index, &bytes, <T::Component as Component>::SIZE, target)
    }
}

/// A byte range of a buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferView {
    /// Index of the buffer.
    pub buffer: usize,
    /// Start of the range.
    pub byte_offset: usize,
    /// Length of the range.
    pub byte_length: usize,
    /// Distance between the starts of consecutive elements; `None` or zero
    /// means tightly packed.
    pub byte_stride: Option<usize>,
    /// GPU binding hint.
    pub target: Option<Target>,
    /// Display name.
    pub name: Option<String>,
    /// Raw `extensions` object.
    pub extensions: Option<RawJson>,
    /// Raw `extras` value.
    pub extras: Option<RawJson>,
}

impl BufferView {
    /// The view's window into its buffer's bytes.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] if the view does not fit in `data`.
    pub fn window<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        let end = self
            .byte_offset
            .checked_add(self.byte_length)
            .ok_or_else(|| Error::out_of_bounds("buffer view end", usize::MAX, data.len()))?;
        data.get(self.byte_offset..end)
            .ok_or_else(|| Error::out_of_bounds("buffer view end", end, data.len()))
    }
}

/// Decodes a `data:[<mediatype>];base64,<payload>` URI.
///
/// # Errors
///
/// [`Error::MalformedDocument`] if the URI is not base64 encoded,
/// [`Error::Base64`] if the payload does not decode.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    const MARKER: &str = ";base64,";
    let Some(at) = uri.find(MARKER) else {
        return Err(Error::malformed("data uri is not base64 encoded"));
    };
    Ok(STANDARD.decode(&uri[at + MARKER.len()..])?)
}

/// Decodes `%XX` escapes in a URI path.
///
/// # Errors
///
/// [`Error::MalformedDocument`] for a truncated or non-hex escape, or if the
/// decoded bytes are not UTF-8.
pub fn percent_decode(uri: &str) -> Result<String> {
    if !uri.contains('%') {
        return Ok(uri.to_owned());
    }
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| Error::malformed(format!("bad percent escape in uri at byte {i}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| Error::malformed("percent-decoded uri is not UTF-8"))
}
