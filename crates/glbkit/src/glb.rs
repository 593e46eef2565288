//! GLB container framing.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! header  magic "glTF" | u32 version (2) | u32 total length
//! chunk   u32 payload length | u32 type tag | payload
//! ```
//!
//! A document container holds exactly two chunks: JSON text followed by the
//! binary buffer.

use std::io::{Cursor, Seek, SeekFrom, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use tracing::{debug, trace, warn};

use crate::{
    error::{Error, Result},
    options::{ReadOptions, WriteOptions},
    span::ByteSpan,
};

/// First four bytes of every container.
pub const MAGIC: [u8; 4] = *b"glTF";
/// The only supported container version.
pub const VERSION: u32 = 2;
/// Magic, version and total length.
pub const HEADER_LEN: usize = 12;
/// Chunk length and chunk type.
pub const CHUNK_HEADER_LEN: usize = 8;
/// `JSON` read as a little-endian u32.
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
/// `BIN\0` read as a little-endian u32.
pub const CHUNK_BIN: u32 = 0x004E_4942;

/// One framed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Type tag, [`CHUNK_JSON`] or [`CHUNK_BIN`] in a valid container.
    pub kind: u32,
    /// Payload, padding included.
    pub data: ByteSpan<'a>,
}

/// A split document container.
#[derive(Debug, Clone, Copy)]
pub struct Glb<'a> {
    /// Header version, always [`VERSION`].
    pub version: u32,
    /// Chunk 0 as text, with trailing padding removed.
    pub json: &'a str,
    /// Chunk 1.
    pub bin: ByteSpan<'a>,
}

/// Validates the header and splits the payload into chunks.
///
/// # Errors
///
/// [`Error::MalformedDocument`] for a bad magic or version, a truncated file,
/// a chunk overrunning the declared length, or an unpadded chunk when
/// `require_chunk_padding` is set.
pub fn read_chunks<'a>(bytes: &'a [u8], options: &ReadOptions) -> Result<Vec<Chunk<'a>>> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::malformed(format!(
            "container of {} bytes is shorter than its header",
            bytes.len()
        )));
    }
    if bytes[0..4] != MAGIC {
        return Err(Error::malformed("bad container magic"));
    }
    let version = LittleEndian::read_u32(&bytes[4..8]);
    if version != VERSION {
        return Err(Error::malformed(format!("unsupported container version {version}")));
    }
    let length = LittleEndian::read_u32(&bytes[8..12]) as usize;
    if length < HEADER_LEN || length > bytes.len() {
        return Err(Error::malformed(format!(
            "declared length {length} does not fit {} available bytes",
            bytes.len()
        )));
    }
    debug!(version, length, "reading container");

    let mut chunks = Vec::with_capacity(2);
    let mut pos = HEADER_LEN;
    while pos < length {
        if length - pos < CHUNK_HEADER_LEN {
            return Err(Error::malformed(format!("truncated chunk header at byte {pos}")));
        }
        let chunk_len = LittleEndian::read_u32(&bytes[pos..pos + 4]) as usize;
        let kind = LittleEndian::read_u32(&bytes[pos + 4..pos + 8]);
        let start = pos + CHUNK_HEADER_LEN;
        let end = start
            .checked_add(chunk_len)
            .filter(|&end| end <= length)
            .ok_or_else(|| {
                Error::malformed(format!("chunk {} overruns the container", chunks.len()))
            })?;
        if chunk_len % 4 != 0 {
            if options.require_chunk_padding {
                return Err(Error::malformed(format!(
                    "chunk {} length {chunk_len} is not 4-byte aligned",
                    chunks.len()
                )));
            }
            warn!(chunk = chunks.len(), chunk_len, "accepting unpadded chunk");
        }
        trace!(kind, start, chunk_len, "chunk");
        chunks.push(Chunk {
            kind,
            data: ByteSpan::with_range(bytes, start, chunk_len)?,
        });
        pos = end;
    }
    Ok(chunks)
}

/// Reads a two-chunk document container.
///
/// # Errors
///
/// Everything [`read_chunks`] reports, plus [`Error::MalformedDocument`] when
/// the container does not hold exactly a JSON chunk followed by a BIN chunk, or
/// when the JSON chunk is not UTF-8.
pub fn read_glb<'a>(bytes: &'a [u8], options: &ReadOptions) -> Result<Glb<'a>> {
    let chunks = read_chunks(bytes, options)?;
    let [json, bin] = chunks.as_slice() else {
        return Err(Error::malformed(format!(
            "expected 2 chunks, found {}",
            chunks.len()
        )));
    };
    if json.kind != CHUNK_JSON {
        return Err(Error::malformed(format!("chunk 0 has tag {:#010x}, expected JSON", json.kind)));
    }
    if bin.kind != CHUNK_BIN {
        return Err(Error::malformed(format!("chunk 1 has tag {:#010x}, expected BIN", bin.kind)));
    }
    let text = std::str::from_utf8(json.data.as_slice())
        .map_err(|e| Error::malformed(format!("JSON chunk is not UTF-8: {e}")))?;
    Ok(Glb {
        version: VERSION,
        json: text.trim_end_matches([' ', '\0']),
        bin: bin.data,
    })
}

fn write_chunk<W: Write>(w: &mut W, kind: u32, data: &[u8], fill: u8, pad: bool) -> Result<()> {
    let padded = if pad { data.len().next_multiple_of(4) } else { data.len() };
    let len = u32::try_from(padded)
        .map_err(|_| Error::malformed(format!("chunk of {padded} bytes exceeds u32 range")))?;
    w.write_u32::<LittleEndian>(len)?;
    w.write_u32::<LittleEndian>(kind)?;
    w.write_all(data)?;
    for _ in data.len()..padded {
        w.write_u8(fill)?;
    }
    Ok(())
}

/// Writes a two-chunk container at the current position of `w`, back-patching
/// the total length once both chunks are out. Returns the number of bytes
/// written.
///
/// # Errors
///
/// [`Error::Io`] from the sink, or [`Error::MalformedDocument`] if the
/// container would exceed the 32-bit length field.
pub fn write_glb<W: Write + Seek>(
    w: &mut W,
    json: &str,
    bin: &[u8],
    options: WriteOptions,
) -> Result<u64> {
    let start = w.stream_position()?;
    w.write_all(&MAGIC)?;
    w.write_u32::<LittleEndian>(VERSION)?;
    w.write_u32::<LittleEndian>(0)?;
    write_chunk(w, CHUNK_JSON, json.as_bytes(), b' ', options.pad_chunks)?;
    write_chunk(w, CHUNK_BIN, bin, 0, options.pad_chunks)?;

    let end = w.stream_position()?;
    let total = u32::try_from(end - start)
        .map_err(|_| Error::malformed(format!("container of {} bytes exceeds u32 range", end - start)))?;
    w.seek(SeekFrom::Start(start + 8))?;
    w.write_u32::<LittleEndian>(total)?;
    w.seek(SeekFrom::Start(end))?;
    debug!(total, json_len = json.len(), bin_len = bin.len(), "wrote container");
    Ok(end - start)
}

/// [`write_glb`] into a fresh buffer.
///
/// # Errors
///
/// See [`write_glb`].
pub fn glb_to_vec(json: &str, bin: &[u8], options: WriteOptions) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_glb(&mut cursor, json, bin, options)?;
    Ok(cursor.into_inner())
}
