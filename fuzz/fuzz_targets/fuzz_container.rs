#![no_main]
use glbkit::{ComponentType, Document, ElementShape, ReadOptions, read_glb};
use libfuzzer_sys::fuzz_target;

/// Decodes every accessor with the element type its layout names. Documents
/// that point at files are skipped.
fn decode_all(doc: &Document) {
    let external = doc
        .buffers
        .iter()
        .filter_map(|b| b.uri.as_deref())
        .any(|uri| !uri.starts_with("data:"));
    if external {
        return;
    }
    for (index, accessor) in doc.accessors.iter().enumerate() {
        let _ = doc.get_f32_components(index);
        if accessor.shape == ElementShape::Scalar
            && matches!(
                accessor.component_type,
                ComponentType::U8 | ComponentType::U16 | ComponentType::U32
            )
        {
            let _ = doc.get_indices(index);
        }
    }
    let _ = doc.to_json();
}

fuzz_target!(|data: &[u8]| {
    let strict = data.first().is_some_and(|b| b & 1 != 0);
    let options = ReadOptions {
        require_chunk_padding: strict,
        ..Default::default()
    };
    if read_glb(data, &options).is_err() {
        return;
    }
    if let Ok(doc) = Document::from_glb(data, &options) {
        decode_all(&doc);
    }
});
