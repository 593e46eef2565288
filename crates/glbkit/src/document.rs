//! The document: typed collections plus the buffers they index into.
//!
//! Import walks the top-level object once. Members with a typed binding are
//! read into their collections, every other member is kept verbatim and
//! written back unchanged. Buffer bytes are not touched until an accessor is
//! decoded.
//!
//! Export appends element data to URI-less buffers through
//! [`Document::push_accessor`], then serializes either to JSON with the
//! buffers embedded as data URIs or to a container whose binary chunk holds
//! buffer 0.

use std::{
    io::{Cursor, Seek, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    accessor::{
        self, Accessor, Component, ComponentType, Element, SparseIndices, SparseOverlay,
        SparseValues, ViewSource,
    },
    buffer::{Buffer, BufferView, Target},
    error::{Error, Result},
    glb,
    options::{ParseMode, ReadOptions, WriteOptions},
    parser::{NodeKind, parse},
    schema::{Animation, Asset, FieldValue, Material, Mesh, Node, RawJson, Record, write_member},
    span::ByteSpan,
    writer::JsonWriter,
};

/// A parsed or in-construction asset.
#[derive(Debug, Clone)]
pub struct Document {
    /// Version and generator metadata.
    pub asset: Asset,
    /// Default scene, an index into the pass-through `scenes` member.
    pub scene: Option<usize>,
    /// Scene graph nodes.
    pub nodes: Vec<Node>,
    /// Meshes referenced by nodes.
    pub meshes: Vec<Mesh>,
    /// Materials referenced by primitives.
    pub materials: Vec<Material>,
    /// Keyframe animations.
    pub animations: Vec<Animation>,
    /// Binary storage. In a container, buffer 0 without URI is the binary
    /// chunk.
    pub buffers: Vec<Buffer>,
    /// Byte ranges of the buffers.
    pub buffer_views: Vec<BufferView>,
    /// Typed element arrays over the views.
    pub accessors: Vec<Accessor>,
    /// Top-level members without a typed binding, in source order.
    pub extra_members: Vec<(String, RawJson)>,
    base_dir: Option<PathBuf>,
    flip_winding: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a document from JSON text with default options.
///
/// `bin` is bound to buffer 0 when that buffer has no URI.
///
/// # Errors
///
/// See [`Document::from_json`].
pub fn parse_document(json: &str, base_dir: Option<&Path>, bin: Option<&[u8]>) -> Result<Document> {
    let options = ReadOptions {
        base_dir: base_dir.map(Path::to_path_buf),
        ..Default::default()
    };
    Document::from_json(json, &options, bin)
}

fn check_index(what: &'static str, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::out_of_bounds(what, index, len))
    }
}

impl Document {
    /// An empty version 2.0 document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            asset: Asset {
                version: "2.0".to_owned(),
                generator: Some(concat!("glbkit ", env!("CARGO_PKG_VERSION")).to_owned()),
                ..Default::default()
            },
            scene: None,
            nodes: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            animations: Vec::new(),
            buffers: Vec::new(),
            buffer_views: Vec::new(),
            accessors: Vec::new(),
            extra_members: Vec::new(),
            base_dir: None,
            flip_winding: true,
        }
    }

    /// Reads a document from JSON text.
    ///
    /// # Errors
    ///
    /// - [`Error::Syntax`] for invalid JSON.
    /// - [`Error::MalformedDocument`] if the root is not an object or the
    ///   asset version is not `2.0`.
    /// - [`Error::KeyNotFound`] and [`Error::ValueTypeMismatch`] for records
    ///   that do not match their schema.
    /// - [`Error::BoundsViolation`] for cross references that point outside
    ///   their collection, or views that overrun their buffer.
    pub fn from_json(json: &str, options: &ReadOptions, bin: Option<&[u8]>) -> Result<Self> {
        let root = parse(json, ParseMode::ToEnd)?;
        if root.kind() != NodeKind::Object {
            return Err(Error::malformed(format!(
                "document root is {}, expected object",
                root.kind().name()
            )));
        }

        let mut doc = Self {
            base_dir: options.base_dir.clone(),
            flip_winding: options.flip_winding,
            ..Self::new()
        };
        let mut asset = None;
        for entry in root.entries()? {
            let (key, value) = entry?;
            let key = key.get_str()?;
            match key.as_ref() {
                "asset" => asset = Some(Asset::read_json(value)?),
                "scene" => doc.scene = Some(value.get_usize()?),
                "nodes" => doc.nodes = FieldValue::read_json(value)?,
                "meshes" => doc.meshes = FieldValue::read_json(value)?,
                "materials" => doc.materials = FieldValue::read_json(value)?,
                "animations" => doc.animations = FieldValue::read_json(value)?,
                "buffers" => doc.buffers = FieldValue::read_json(value)?,
                "bufferViews" => doc.buffer_views = FieldValue::read_json(value)?,
                "accessors" => doc.accessors = FieldValue::read_json(value)?,
                _ => doc
                    .extra_members
                    .push((key.into_owned(), RawJson::read_json(value)?)),
            }
        }
        doc.asset = asset.ok_or_else(|| Error::KeyNotFound("asset".to_owned()))?;
        match doc.asset.parsed_version() {
            Some((2, 0)) => {}
            _ => {
                return Err(Error::malformed(format!(
                    "unsupported asset version {:?}",
                    doc.asset.version
                )));
            }
        }
        if let Some(bin) = bin {
            doc.bind_binary_chunk(bin)?;
        }
        doc.validate()?;
        debug!(
            buffers = doc.buffers.len(),
            views = doc.buffer_views.len(),
            accessors = doc.accessors.len(),
            passthrough = doc.extra_members.len(),
            "parsed document"
        );
        Ok(doc)
    }

    /// Reads a document from a container.
    ///
    /// # Errors
    ///
    /// Container errors from [`glb::read_glb`], then everything
    /// [`Document::from_json`] reports.
    pub fn from_glb(bytes: &[u8], options: &ReadOptions) -> Result<Self> {
        let container = glb::read_glb(bytes, options)?;
        Self::from_json(container.json, options, Some(container.bin.as_bytes()))
    }

    /// Reads a `.gltf` or `.glb` file, telling them apart by the container
    /// magic. Relative buffer URIs resolve against the file's directory unless
    /// `options.base_dir` is set.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, then everything
    /// [`Document::from_glb`] or [`Document::from_json`] reports.
    pub fn read_path(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut options = options.clone();
        if options.base_dir.is_none() {
            options.base_dir = path.parent().map(Path::to_path_buf);
        }
        if bytes.starts_with(&glb::MAGIC) {
            return Self::from_glb(&bytes, &options);
        }
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| Error::malformed(format!("document is not UTF-8: {e}")))?;
        Self::from_json(text, &options, None)
    }

    /// Directory that relative buffer URIs are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Changes the base directory. Buffers already loaded keep their bytes.
    pub fn set_base_dir(&mut self, dir: Option<PathBuf>) {
        self.base_dir = dir;
    }

    /// Whether [`Document::get_indices`] reverses index triples.
    #[must_use]
    pub fn flip_winding(&self) -> bool {
        self.flip_winding
    }

    /// See [`ReadOptions::flip_winding`].
    pub fn set_flip_winding(&mut self, flip: bool) {
        self.flip_winding = flip;
    }

    fn bind_binary_chunk(&self, bin: &[u8]) -> Result<()> {
        let Some(buffer) = self.buffers.first().filter(|b| b.uri.is_none()) else {
            warn!(len = bin.len(), "binary chunk is not referenced by buffer 0");
            return Ok(());
        };
        if bin.len() < buffer.byte_length {
            return Err(Error::out_of_bounds("buffer byteLength", buffer.byte_length, bin.len()));
        }
        buffer.bind(bin.to_vec());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for view in &self.buffer_views {
            check_index("buffer index", view.buffer, self.buffers.len())?;
            let available = self.buffers[view.buffer].byte_length;
            let end = view.byte_offset.saturating_add(view.byte_length);
            if end > available {
                return Err(Error::out_of_bounds("buffer view end", end, available));
            }
        }

        let views = self.buffer_views.len();
        for accessor in &self.accessors {
            if let Some(view) = accessor.buffer_view {
                check_index("buffer view index", view, views)?;
            }
            if let Some(sparse) = &accessor.sparse {
                check_index("buffer view index", sparse.indices.buffer_view, views)?;
                check_index("buffer view index", sparse.values.buffer_view, views)?;
                if !sparse.indices.component_type.is_index() {
                    return Err(Error::malformed(format!(
                        "sparse indices of type {:?}",
                        sparse.indices.component_type
                    )));
                }
                if sparse.count > accessor.count {
                    return Err(Error::out_of_bounds("sparse count", sparse.count, accessor.count));
                }
            }
        }

        let accessors = self.accessors.len();
        for mesh in &self.meshes {
            for index in mesh.accessor_refs() {
                check_index("accessor index", index, accessors)?;
            }
            for material in mesh.primitives.iter().filter_map(|p| p.material) {
                check_index("material index", material, self.materials.len())?;
            }
        }
        for node in &self.nodes {
            if let Some(mesh) = node.mesh {
                check_index("mesh index", mesh, self.meshes.len())?;
            }
            for &child in &node.children {
                check_index("node index", child, self.nodes.len())?;
            }
        }
        for animation in &self.animations {
            for sampler in &animation.samplers {
                check_index("accessor index", sampler.input, accessors)?;
                check_index("accessor index", sampler.output, accessors)?;
            }
            for channel in &animation.channels {
                check_index("animation sampler index", channel.sampler, animation.samplers.len())?;
                if let Some(node) = channel.target.node {
                    check_index("node index", node, self.nodes.len())?;
                }
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`Error::BoundsViolation`] for an unknown index.
    pub fn accessor(&self, index: usize) -> Result<&Accessor> {
        self.accessors
            .get(index)
            .ok_or_else(|| Error::out_of_bounds("accessor index", index, self.accessors.len()))
    }

    /// The bytes of buffer `index`, loading them on first use.
    ///
    /// # Errors
    ///
    /// See [`Buffer::resolve`].
    pub fn buffer_data(&self, index: usize) -> Result<&[u8]> {
        let buffer = self
            .buffers
            .get(index)
            .ok_or_else(|| Error::out_of_bounds("buffer index", index, self.buffers.len()))?;
        buffer.resolve(self.base_dir.as_deref())
    }

    /// The window of buffer view `index`, positioned within its buffer.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] for an unknown index or a view that overruns
    /// its buffer, or buffer resolution errors.
    pub fn get_view_bytes(&self, index: usize) -> Result<ByteSpan<'_>> {
        let view = self
            .buffer_views
            .get(index)
            .ok_or_else(|| Error::out_of_bounds("buffer view index", index, self.buffer_views.len()))?;
        let data = self.buffer_data(view.buffer)?;
        ByteSpan::with_range(data, view.byte_offset, view.byte_length)
    }

    /// Decodes accessor `index` as `T`, applying its sparse overlay.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedAccessorType`] unless `T` matches the accessor's
    /// component type and shape exactly, [`Error::BoundsViolation`] for reads
    /// outside the view or sparse indices past the end, and buffer resolution
    /// errors.
    pub fn get_typed_array<T: Element>(&self, index: usize) -> Result<Vec<T>> {
        accessor::decode::<T, _>(self.accessor(index)?, self)
    }

    /// Decodes a scalar `U8`, `U16` or `U32` accessor into triangle indices,
    /// reversing the order within each triple unless winding flips are turned
    /// off.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedAccessorType`] for any other layout, otherwise as
    /// [`Document::get_typed_array`].
    pub fn get_indices(&self, index: usize) -> Result<Vec<u32>> {
        let mut indices = accessor::decode_indices(self.accessor(index)?, self)?;
        if self.flip_winding {
            accessor::flip_winding(&mut indices);
        }
        Ok(indices)
    }

    /// Decodes any accessor into a flat list of `f32` components, normalizing
    /// integers when the accessor is flagged `normalized`.
    ///
    /// # Errors
    ///
    /// As [`Document::get_typed_array`].
    pub fn get_f32_components(&self, index: usize) -> Result<Vec<f32>> {
        accessor::decode_f32_components(self.accessor(index)?, self)
    }

    /// Appends a buffer and returns its index.
    pub fn add_buffer(&mut self, buffer: Buffer) -> usize {
        self.buffers.push(buffer);
        self.buffers.len() - 1
    }

    /// Appends a view and returns its index.
    pub fn add_buffer_view(&mut self, view: BufferView) -> usize {
        self.buffer_views.push(view);
        self.buffer_views.len() - 1
    }

    /// Appends an accessor and returns its index.
    pub fn add_accessor(&mut self, accessor: Accessor) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    fn writable_buffer(&mut self, index: usize) -> Result<&mut Buffer> {
        let len = self.buffers.len();
        let buffer = self
            .buffers
            .get_mut(index)
            .ok_or_else(|| Error::out_of_bounds("buffer index", index, len))?;
        if buffer.uri.is_some() {
            return Err(Error::malformed(format!(
                "buffer {index} is backed by a uri and cannot be appended to"
            )));
        }
        Ok(buffer)
    }

    /// Appends `data` to buffer `buffer` and adds a view and an accessor over
    /// it, with component-wise `min` and `max`. Returns the accessor index.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] for an unknown buffer,
    /// [`Error::MalformedDocument`] if the buffer is backed by a URI.
    pub fn push_accessor<T: Element>(
        &mut self,
        buffer: usize,
        data: &[T],
        target: Option<Target>,
    ) -> Result<usize> {
        let view = self
            .writable_buffer(buffer)?
            .append_elements(buffer, data, target);
        let view = self.add_buffer_view(view);
        let (min, max) = accessor::component_bounds(data).unzip();
        Ok(self.add_accessor(Accessor {
            buffer_view: Some(view),
            component_type: <T::Component as Component>::TYPE,
            shape: T::SHAPE,
            count: data.len(),
            min,
            max,
            ..Default::default()
        }))
    }

    /// Adds an accessor of `count` elements that are zero except for the
    /// `(index, value)` pairs in `entries`, stored as a sparse overlay without
    /// a base view. Indices use the narrowest type that holds the largest one.
    /// Returns the accessor index.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedDocument`] if the indices are not strictly ascending
    /// or the buffer is backed by a URI, [`Error::BoundsViolation`] for an
    /// index not below `count` or an unknown buffer.
    pub fn push_sparse_accessor<T: Element>(
        &mut self,
        buffer: usize,
        count: usize,
        entries: &[(u32, T)],
    ) -> Result<usize> {
        if entries.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(Error::malformed("sparse indices must be strictly ascending"));
        }
        let indices: Vec<u32> = entries.iter().map(|&(i, _)| i).collect();
        let values: Vec<T> = entries.iter().map(|&(_, v)| v).collect();
        let mut dense = vec![T::default(); count];
        accessor::apply_sparse(&mut dense, &indices, &values)?;
        let (min, max) = accessor::component_bounds(&dense).unzip();

        let mut accessor = Accessor {
            component_type: <T::Component as Component>::TYPE,
            shape: T::SHAPE,
            count,
            min,
            max,
            ..Default::default()
        };
        if entries.is_empty() {
            return Ok(self.add_accessor(accessor));
        }

        let largest = indices.last().copied().unwrap_or_default();
        let (index_type, index_view, value_view) = {
            let store = self.writable_buffer(buffer)?;
            let (index_type, index_view) = if u8::try_from(largest).is_ok() {
                let narrow: Vec<u8> = indices.iter().filter_map(|&i| u8::try_from(i).ok()).collect();
                (ComponentType::U8, store.append_elements(buffer, &narrow, None))
            } else if u16::try_from(largest).is_ok() {
                let narrow: Vec<u16> = indices.iter().filter_map(|&i| u16::try_from(i).ok()).collect();
                (ComponentType::U16, store.append_elements(buffer, &narrow, None))
            } else {
                (ComponentType::U32, store.append_elements(buffer, &indices, None))
            };
            let value_view = store.append_elements(buffer, &values, None);
            (index_type, index_view, value_view)
        };
        let index_view = self.add_buffer_view(index_view);
        let value_view = self.add_buffer_view(value_view);
        accessor.sparse = Some(SparseOverlay {
            count: entries.len(),
            indices: SparseIndices {
                buffer_view: index_view,
                component_type: index_type,
                ..Default::default()
            },
            values: SparseValues {
                buffer_view: value_view,
                ..Default::default()
            },
            ..Default::default()
        });
        Ok(self.add_accessor(accessor))
    }

    /// Serializes the document. URI-less buffers are embedded as data URIs.
    ///
    /// # Errors
    ///
    /// Buffer resolution errors for embedded buffers, or
    /// [`Error::JsonFormat`] for non-finite numbers.
    pub fn to_json(&self) -> Result<String> {
        self.serialize(None)
    }

    /// Serializes the document into a container. Buffer 0, when it has no URI,
    /// becomes the binary chunk; other URI-less buffers are embedded.
    ///
    /// # Errors
    ///
    /// As [`Document::to_json`], plus container size limits.
    pub fn to_glb(&self, options: WriteOptions) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_glb(&mut cursor, options)?;
        Ok(cursor.into_inner())
    }

    /// [`Document::to_glb`] into `w` at its current position. Returns the
    /// number of bytes written.
    ///
    /// # Errors
    ///
    /// As [`Document::to_glb`], plus [`Error::Io`] from the sink.
    pub fn write_glb<W: Write + Seek>(&self, w: &mut W, options: WriteOptions) -> Result<u64> {
        let bin_buffer = self.buffers.first().filter(|b| b.uri.is_none()).map(|_| 0);
        let bin: &[u8] = match bin_buffer {
            Some(index) => self.buffer_data(index)?,
            None => &[],
        };
        let json = self.serialize(bin_buffer)?;
        glb::write_glb(w, &json, bin, options)
    }

    fn serialize(&self, bin_buffer: Option<usize>) -> Result<String> {
        let mut w = JsonWriter::new();
        w.begin_map()?;
        write_member(&mut w, "asset", &self.asset)?;
        write_member(&mut w, "scene", &self.scene)?;
        write_member(&mut w, "nodes", &self.nodes)?;
        write_member(&mut w, "meshes", &self.meshes)?;
        write_member(&mut w, "materials", &self.materials)?;
        write_member(&mut w, "animations", &self.animations)?;
        if !self.buffers.is_empty() {
            w.key("buffers")?;
            w.begin_array()?;
            for (index, buffer) in self.buffers.iter().enumerate() {
                self.write_buffer(&mut w, buffer, bin_buffer == Some(index))?;
            }
            w.end_array()?;
        }
        write_member(&mut w, "bufferViews", &self.buffer_views)?;
        write_member(&mut w, "accessors", &self.accessors)?;
        for (key, raw) in &self.extra_members {
            w.key(key)?;
            w.dump(raw.as_str())?;
        }
        w.end_map()?;
        w.finish()
    }

    fn write_buffer(&self, w: &mut JsonWriter, buffer: &Buffer, in_bin_chunk: bool) -> Result<()> {
        w.begin_map()?;
        if let Some(uri) = &buffer.uri {
            w.key("uri")?;
            w.value_str(uri)?;
        } else if !in_bin_chunk {
            let data = buffer.resolve(self.base_dir.as_deref())?;
            w.key("uri")?;
            w.data_uri(data.get(..buffer.byte_length).unwrap_or(data))?;
        }
        for field in Buffer::FIELDS.iter().filter(|f| f.name != "uri") {
            (field.write)(buffer, field.name, w)?;
        }
        w.end_map()
    }
}

impl ViewSource for Document {
    fn view(&self, index: usize) -> Result<(&[u8], Option<usize>)> {
        let view = self
            .buffer_views
            .get(index)
            .ok_or_else(|| Error::out_of_bounds("buffer view index", index, self.buffer_views.len()))?;
        let data = self.buffer_data(view.buffer)?;
        Ok((view.window(data)?, view.byte_stride))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use rstest::rstest;

    use super::*;
    use crate::{accessor::ElementShape, parser::SyntaxError, schema::Primitive};

    fn le_bytes<T: Element>(data: &[T]) -> Vec<u8> {
        let mut out = Vec::new();
        for element in data {
            element.write_le(&mut out);
        }
        out
    }

    fn index_document(indices: &[u16]) -> String {
        index_document_with_stride(indices, 2)
    }

    fn index_document_with_stride(indices: &[u16], stride: usize) -> String {
        let bytes = le_bytes(indices);
        format!(
            r#"{{
                "asset": {{"version": "2.0"}},
                "buffers": [{{"byteLength": {len}, "uri": "data:application/octet-stream;base64,{data}"}}],
                "bufferViews": [{{"buffer": 0, "byteLength": {len}, "byteStride": {stride}}}],
                "accessors": [{{"bufferView": 0, "componentType": 5123, "count": {count}, "type": "SCALAR"}}],
                "meshes": [{{"primitives": [{{"attributes": {{}}, "indices": 0}}]}}]
            }}"#,
            len = bytes.len(),
            data = STANDARD.encode(&bytes),
            count = indices.len(),
        )
    }

    #[test]
    fn zero_stride_reads_packed() {
        let json = index_document_with_stride(&[1, 2, 3], 0);
        let doc = parse_document(&json, None, None).unwrap();
        assert_eq!(doc.buffer_views[0].byte_stride, Some(0));
        assert_eq!(doc.get_typed_array::<u16>(0).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn trailing_text_after_the_root_is_rejected() {
        let json = r#"{"asset":{"version":"2.0"}} {"nodes": 42 garbage}"#;
        assert!(matches!(
            parse_document(json, None, None),
            Err(Error::Syntax(e)) if *e.kind() == SyntaxError::TrailingCharacters
        ));
        assert!(parse_document(r#"{"asset":{"version":"2.0"}}"#, None, None).is_ok());
    }

    #[test]
    fn indices_from_data_uri() {
        let json = index_document(&[0, 1, 2, 2, 1, 3]);
        let doc = parse_document(&json, None, None).unwrap();
        assert!(!doc.buffers[0].is_resolved());
        assert_eq!(doc.get_indices(0).unwrap(), vec![2, 1, 0, 3, 1, 2]);
        assert!(doc.buffers[0].is_resolved());

        let raw = Document::from_json(
            &json,
            &ReadOptions {
                flip_winding: false,
                ..Default::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(raw.get_indices(0).unwrap(), vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(raw.get_typed_array::<u16>(0).unwrap(), vec![0, 1, 2, 2, 1, 3]);
        assert!(matches!(
            raw.get_typed_array::<u32>(0),
            Err(Error::UnsupportedAccessorType { .. })
        ));
    }

    #[rstest]
    #[case::old_version(r#"{"asset": {"version": "1.0"}}"#)]
    #[case::newer_minor(r#"{"asset": {"version": "2.1"}}"#)]
    #[case::root_array(r#"[{"asset": {"version": "2.0"}}]"#)]
    fn rejected_documents(#[case] json: &str) {
        assert!(matches!(
            parse_document(json, None, None),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn missing_asset() {
        assert!(matches!(
            parse_document(r#"{"nodes": []}"#, None, None),
            Err(Error::KeyNotFound(k)) if k == "asset"
        ));
    }

    #[rstest]
    #[case::view_past_buffer(
        r#"{"asset": {"version": "2.0"}, "buffers": [{"byteLength": 4}],
            "bufferViews": [{"buffer": 0, "byteOffset": 2, "byteLength": 4}]}"#
    )]
    #[case::unknown_buffer(
        r#"{"asset": {"version": "2.0"}, "bufferViews": [{"buffer": 0, "byteLength": 4}]}"#
    )]
    #[case::unknown_view(
        r#"{"asset": {"version": "2.0"},
            "accessors": [{"bufferView": 3, "componentType": 5126, "count": 1, "type": "SCALAR"}]}"#
    )]
    #[case::unknown_accessor(
        r#"{"asset": {"version": "2.0"},
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}]}"#
    )]
    #[case::unknown_child(r#"{"asset": {"version": "2.0"}, "nodes": [{"children": [1]}]}"#)]
    fn dangling_references(#[case] json: &str) {
        assert!(matches!(
            parse_document(json, None, None),
            Err(Error::BoundsViolation { .. })
        ));
    }

    fn triangle() -> (Document, usize, usize) {
        let mut doc = Document::new();
        let buffer = doc.add_buffer(Buffer::new());
        let positions = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.5]];
        let position = doc
            .push_accessor(buffer, &positions, Some(Target::ArrayBuffer))
            .unwrap();
        let indices = doc
            .push_accessor(buffer, &[0u16, 1, 2], Some(Target::ElementArrayBuffer))
            .unwrap();
        doc.meshes.push(Mesh {
            primitives: vec![Primitive {
                attributes: BTreeMap::from([("POSITION".to_owned(), position)]),
                indices: Some(indices),
                ..Default::default()
            }],
            ..Default::default()
        });
        (doc, position, indices)
    }

    #[test]
    fn push_accessor_records_bounds() {
        let (doc, position, indices) = triangle();
        let accessor = &doc.accessors[position];
        assert_eq!(accessor.shape, ElementShape::Vec3);
        assert_eq!(accessor.min, Some(vec![0.0, 0.0, 0.0]));
        assert_eq!(accessor.max, Some(vec![1.0, 1.0, 0.5]));
        assert_eq!(doc.buffer_views[1].byte_offset, 36);
        assert_eq!(doc.accessors[indices].component_type, ComponentType::U16);
        assert_eq!(doc.buffers[0].byte_length, 42);
    }

    #[test]
    fn container_round_trip() {
        let (doc, position, indices) = triangle();
        let bytes = doc.to_glb(WriteOptions::default()).unwrap();
        assert_eq!(bytes.len() % 4, 0);

        let back = Document::from_glb(&bytes, &ReadOptions::default()).unwrap();
        assert_eq!(back.buffers[0].uri, None);
        assert_eq!(
            back.get_typed_array::<[f32; 3]>(position).unwrap(),
            doc.get_typed_array::<[f32; 3]>(position).unwrap()
        );
        assert_eq!(back.get_indices(indices).unwrap(), vec![2, 1, 0]);
        assert_eq!(back.meshes, doc.meshes);
        assert_eq!(back.accessors, doc.accessors);
        assert_eq!(back.buffer_views, doc.buffer_views);
    }

    #[test]
    fn json_embeds_uri_less_buffers() {
        let (doc, position, _) = triangle();
        let json = doc.to_json().unwrap();
        assert!(json.contains(r#""uri":"data:application\/octet-stream;base64,"#));
        let back = parse_document(&json, None, None).unwrap();
        assert_eq!(
            back.get_f32_components(position).unwrap(),
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.5]
        );
    }

    #[test]
    fn embedded_buffers_survive_a_second_text_pass() {
        let mut doc = Document::new();
        let buffer = doc.add_buffer(Buffer::new());
        doc.push_accessor(buffer, &[0xffu8, 0xff, 0xff, 0xfe], None).unwrap();
        let json = doc.to_json().unwrap();
        assert!(json.contains(r#"base64,\/\/\/\/\/g=="#));
        let back = parse_document(&json, None, None).unwrap();
        assert_eq!(back.buffer_data(0).unwrap(), &[0xff, 0xff, 0xff, 0xfe]);
        assert_eq!(back.to_json().unwrap(), json);
    }

    #[test]
    fn sparse_export_and_decode() {
        let mut doc = Document::new();
        let buffer = doc.add_buffer(Buffer::new());
        let index = doc
            .push_sparse_accessor(buffer, 5, &[(1, 2.0f32), (3, -4.0)])
            .unwrap();
        let accessor = &doc.accessors[index];
        assert_eq!(accessor.buffer_view, None);
        assert_eq!(accessor.min, Some(vec![-4.0]));
        assert_eq!(accessor.max, Some(vec![2.0]));
        assert_eq!(
            accessor.sparse.as_ref().unwrap().indices.component_type,
            ComponentType::U8
        );

        let back = Document::from_glb(&doc.to_glb(WriteOptions::default()).unwrap(), &ReadOptions::default())
            .unwrap();
        assert_eq!(
            back.get_typed_array::<f32>(index).unwrap(),
            vec![0.0, 2.0, 0.0, -4.0, 0.0]
        );
    }

    #[test]
    fn sparse_export_checks_indices() {
        let mut doc = Document::new();
        let buffer = doc.add_buffer(Buffer::new());
        assert!(matches!(
            doc.push_sparse_accessor(buffer, 4, &[(2, 1u16), (1, 1)]),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(
            doc.push_sparse_accessor(buffer, 4, &[(4, 1u16)]),
            Err(Error::BoundsViolation { index: 4, len: 4, .. })
        ));
        let wide = doc.push_sparse_accessor(buffer, 70_000, &[(300, 1u8), (65_600, 2)]).unwrap();
        assert_eq!(
            doc.accessors[wide].sparse.as_ref().unwrap().indices.component_type,
            ComponentType::U32
        );
        let decoded = doc.get_typed_array::<u8>(wide).unwrap();
        assert_eq!((decoded[300], decoded[65_600], decoded[0]), (1, 2, 0));
    }

    #[test]
    fn uri_buffers_are_read_only() {
        let mut doc = Document::new();
        let buffer = doc.add_buffer(Buffer::with_uri("mesh.bin", 4));
        assert!(matches!(
            doc.push_accessor(buffer, &[1u8], None),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(
            doc.push_accessor(7, &[1u8], None),
            Err(Error::BoundsViolation { .. })
        ));
    }

    #[test]
    fn external_buffer_next_to_the_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("geo.bin"), le_bytes(&[0u32, 1, 2])).unwrap();
        let path = dir.path().join("scene.gltf");
        std::fs::write(
            &path,
            r#"{"asset": {"version": "2.0"},
                "buffers": [{"uri": "geo.bin", "byteLength": 12}],
                "bufferViews": [{"buffer": 0, "byteLength": 12, "target": 34963}],
                "accessors": [{"bufferView": 0, "componentType": 5125, "count": 3, "type": "SCALAR"}]}"#,
        )
        .unwrap();

        let options = ReadOptions {
            flip_winding: false,
            ..Default::default()
        };
        let doc = Document::read_path(&path, &options).unwrap();
        assert_eq!(doc.base_dir(), Some(dir.path()));
        assert_eq!(doc.get_indices(0).unwrap(), vec![0, 1, 2]);
        let view = doc.get_view_bytes(0).unwrap();
        assert_eq!((view.offset(), view.len()), (0, 12));
        assert_eq!(&view.as_slice()[4..8], &1u32.to_le_bytes());
    }

    #[test]
    fn unknown_members_pass_through() {
        let json = r#"{"asset":{"version":"2.0"},"scenes":[{"nodes":[0]}],"nodes":[{"name":"a"}],"extensionsUsed":["KHR_x"]}"#;
        let doc = parse_document(json, None, None).unwrap();
        assert_eq!(doc.extra_members.len(), 2);
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"asset":{"version":"2.0"},"nodes":[{"name":"a"}],"scenes":[{"nodes":[0]}],"extensionsUsed":["KHR_x"]}"#
        );
    }

    #[test]
    fn short_binary_chunk_is_rejected() {
        let json = r#"{"asset": {"version": "2.0"}, "buffers": [{"byteLength": 8}]}"#;
        assert!(matches!(
            parse_document(json, None, Some(&[0; 4])),
            Err(Error::BoundsViolation { index: 8, len: 4, .. })
        ));
        let doc = parse_document(json, None, Some(&[7; 8])).unwrap();
        assert_eq!(doc.buffer_data(0).unwrap(), &[7; 8]);
    }
}
