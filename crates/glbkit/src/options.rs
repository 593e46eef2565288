use std::path::PathBuf;

/// How far [`parse`](crate::parser::parse) resolves a container at the root.
///
/// Scalars are always fully scanned; the mode only affects arrays and objects.
///
/// # Default
///
/// [`ParseMode::Lazy`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Leave the container unresolved. Children are parsed when walked.
    #[default]
    Lazy,
    /// Walk and validate the whole container, including all descendants.
    Recursive,
    /// The caller asserts that the value extends to the end of the text. The
    /// container is resolved by checking that the last non-whitespace byte is
    /// the matching closing bracket; the interior is not walked.
    ToEnd,
}

/// Options for reading a document from JSON text or a GLB container.
///
/// # Examples
///
/// ```rust
/// use glbkit::ReadOptions;
///
/// let options = ReadOptions {
///     flip_winding: false,
///     ..Default::default()
/// };
/// assert!(options.base_dir.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Directory that relative buffer URIs are resolved against.
    ///
    /// When `None`, URIs are resolved against the process working directory.
    ///
    /// # Default
    ///
    /// `None`
    pub base_dir: Option<PathBuf>,

    /// Whether [`Document::get_indices`](crate::Document::get_indices)
    /// reverses every index triple, converting counter-clockwise front faces
    /// into clockwise ones.
    ///
    /// # Default
    ///
    /// `true`
    pub flip_winding: bool,

    /// Whether container chunks whose length is not a multiple of four are
    /// rejected. When `false` they are accepted with a warning.
    ///
    /// # Default
    ///
    /// `false`
    pub require_chunk_padding: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            flip_winding: true,
            require_chunk_padding: false,
        }
    }
}

/// Options for writing a GLB container.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Whether chunk payloads are padded to a four byte boundary, the JSON
    /// chunk with spaces and the binary chunk with zeros.
    ///
    /// # Default
    ///
    /// `true`
    pub pad_chunks: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { pad_chunks: true }
    }
}
