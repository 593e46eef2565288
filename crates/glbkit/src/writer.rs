//! Streaming JSON emitter.
//!
//! The writer keeps a stack of nesting contexts and checks every token against
//! the innermost one before emitting it, inserting separators as needed. It
//! never pretty-prints: output is compact and deterministic.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    error::{Error, Result},
    escape::write_escaped_string,
};

/// Prefix of the data URIs produced by [`JsonWriter::data_uri`].
pub const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Root,
    Array,
    Object,
}

/// One level of nesting. In an object, an even `element_count` means the next
/// token must be a key and an odd one means it must be a value.
#[derive(Debug, Clone, Copy)]
struct WriterContext {
    kind: ContextKind,
    element_count: usize,
}

impl WriterContext {
    fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            element_count: 0,
        }
    }
}

/// Compact JSON writer with structural validation.
///
/// # Examples
///
/// ```
/// use glbkit::JsonWriter;
///
/// let mut w = JsonWriter::new();
/// w.begin_map()?;
/// w.key("count")?;
/// w.value_u64(3)?;
/// w.end_map()?;
/// assert_eq!(w.finish()?, r#"{"count":3}"#);
/// # Ok::<(), glbkit::Error>(())
/// ```
#[derive(Debug)]
pub struct JsonWriter {
    out: String,
    stack: Vec<WriterContext>,
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWriter {
    /// A writer expecting one root value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            out: String::new(),
            stack: vec![WriterContext::new(ContextKind::Root)],
        }
    }

    /// Validates that a key (`is_key`) or a value may be emitted here, writes
    /// the separating comma if one is due, and counts the token.
    fn comma_check(&mut self, is_key: bool) -> Result<()> {
        let Some(ctx) = self.stack.last_mut() else {
            return Err(Error::JsonFormat("writer has no open context"));
        };
        match ctx.kind {
            ContextKind::Root => {
                if is_key {
                    return Err(Error::JsonFormat("key not expected"));
                }
                if ctx.element_count > 0 {
                    return Err(Error::JsonFormat("multiple root value"));
                }
            }
            ContextKind::Array => {
                if is_key {
                    return Err(Error::JsonFormat("key not expected"));
                }
                if ctx.element_count > 0 {
                    self.out.push(',');
                }
            }
            ContextKind::Object => {
                let expects_key = ctx.element_count % 2 == 0;
                if expects_key && !is_key {
                    return Err(Error::JsonFormat("key expected"));
                }
                if !expects_key && is_key {
                    return Err(Error::JsonFormat("key not expected"));
                }
                if is_key && ctx.element_count > 0 {
                    self.out.push(',');
                }
            }
        }
        ctx.element_count += 1;
        Ok(())
    }

    fn push_quoted(&mut self, s: &str) {
        self.out.push('"');
        // Writing into a String cannot fail.
        let _ = write_escaped_string(s, &mut self.out);
        self.out.push('"');
    }

    /// Nesting depth, zero at the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn begin_array(&mut self) -> Result<()> {
        self.comma_check(false)?;
        self.out.push('[');
        self.stack.push(WriterContext::new(ContextKind::Array));
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if the innermost open container is not an array.
    pub fn end_array(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(ctx) if ctx.kind == ContextKind::Array => {
                self.stack.pop();
                self.out.push(']');
                Ok(())
            }
            _ => Err(Error::JsonFormat("no array to end")),
        }
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn begin_map(&mut self) -> Result<()> {
        self.comma_check(false)?;
        self.out.push('{');
        self.stack.push(WriterContext::new(ContextKind::Object));
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if the innermost open container is not an
    /// object, or if its last key has no value.
    pub fn end_map(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(ctx) if ctx.kind == ContextKind::Object => {
                if ctx.element_count % 2 == 1 {
                    return Err(Error::JsonFormat("value expected"));
                }
                self.stack.pop();
                self.out.push('}');
                Ok(())
            }
            _ => Err(Error::JsonFormat("no object to end")),
        }
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] unless an object expects a key here.
    pub fn key(&mut self, name: &str) -> Result<()> {
        self.comma_check(true)?;
        self.push_quoted(name);
        self.out.push(':');
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn value_null(&mut self) -> Result<()> {
        self.comma_check(false)?;
        self.out.push_str("null");
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn value_bool(&mut self, v: bool) -> Result<()> {
        self.comma_check(false)?;
        self.out.push_str(if v { "true" } else { "false" });
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn value_i64(&mut self, v: i64) -> Result<()> {
        self.comma_check(false)?;
        self.out.push_str(&v.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn value_u64(&mut self, v: u64) -> Result<()> {
        self.comma_check(false)?;
        self.out.push_str(&v.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] for NaN or infinities, or if a value is not
    /// allowed here.
    pub fn value_f64(&mut self, v: f64) -> Result<()> {
        if !v.is_finite() {
            return Err(Error::JsonFormat("non-finite number"));
        }
        self.comma_check(false)?;
        self.out.push_str(&v.to_string());
        Ok(())
    }

    /// Writes the shortest decimal form that reads back as the same `f32`.
    ///
    /// # Errors
    ///
    /// See [`JsonWriter::value_f64`].
    pub fn value_f32(&mut self, v: f32) -> Result<()> {
        if !v.is_finite() {
            return Err(Error::JsonFormat("non-finite number"));
        }
        self.comma_check(false)?;
        self.out.push_str(&v.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn value_str(&mut self, v: &str) -> Result<()> {
        self.comma_check(false)?;
        self.push_quoted(v);
        Ok(())
    }

    /// Writes `data` as a quoted standard base64 string, escaped like any other
    /// string.
    ///
    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn bytes(&mut self, data: &[u8]) -> Result<()> {
        self.value_str(&STANDARD.encode(data))
    }

    /// Writes `data` as a quoted `data:application/octet-stream;base64,` URI.
    ///
    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn data_uri(&mut self, data: &[u8]) -> Result<()> {
        let mut uri = String::from(DATA_URI_PREFIX);
        STANDARD.encode_string(data, &mut uri);
        self.value_str(&uri)
    }

    /// Writes a pre-serialized JSON fragment verbatim. The fragment counts as
    /// one value; its content is not validated.
    ///
    /// # Errors
    ///
    /// [`Error::JsonFormat`] if a value is not allowed here.
    pub fn dump(&mut self, fragment: &str) -> Result<()> {
        self.comma_check(false)?;
        self.out.push_str(fragment);
        Ok(())
    }

    /// Returns the written text.
    ///
    /// # Errors
    ///
    /// [`Error::JsonFormat`] if an array or object is still open.
    pub fn finish(self) -> Result<String> {
        if self.stack.len() > 1 {
            return Err(Error::JsonFormat("unclosed container"));
        }
        Ok(self.out)
    }
}
