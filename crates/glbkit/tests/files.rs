#![allow(missing_docs)]
use std::fs::File;

use glbkit::{
    Buffer, Document, Error, ParseTask, ReadOptions, Target, WriteOptions, schema::Node,
};

fn quad() -> (Document, usize, usize) {
    let mut doc = Document::new();
    let buffer = doc.add_buffer(Buffer::new());
    let uvs = doc
        .push_accessor(
            buffer,
            &[[0.0f32, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            Some(Target::ArrayBuffer),
        )
        .unwrap();
    let indices = doc
        .push_accessor(buffer, &[0u8, 1, 2, 0, 2, 3], Some(Target::ElementArrayBuffer))
        .unwrap();
    doc.nodes.push(Node {
        name: Some("quad".into()),
        ..Default::default()
    });
    (doc, uvs, indices)
}

#[test]
fn container_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quad.glb");
    let (doc, uvs, indices) = quad();
    let mut file = File::create(&path).unwrap();
    let written = doc.write_glb(&mut file, WriteOptions::default()).unwrap();
    drop(file);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), written);

    let back = Document::read_path(&path, &ReadOptions::default()).unwrap();
    assert_eq!(back.nodes[0].name.as_deref(), Some("quad"));
    assert_eq!(
        back.get_typed_array::<[f32; 2]>(uvs).unwrap()[2],
        [1.0, 1.0]
    );
    assert_eq!(back.get_indices(indices).unwrap(), vec![2, 1, 0, 3, 2, 0]);
}

#[test]
fn text_file_with_external_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let (doc, uvs, _) = quad();
    let data = doc.buffer_data(0).unwrap().to_vec();
    std::fs::create_dir(dir.path().join("bin data")).unwrap();
    std::fs::write(dir.path().join("bin data").join("quad.bin"), &data).unwrap();

    let mut external = doc.clone();
    external.buffers[0] = Buffer::with_uri("bin%20data/quad.bin", data.len());
    let json = external.to_json().unwrap();
    assert!(json.contains(r#""uri":"bin%20data\/quad.bin""#));
    let path = dir.path().join("quad.gltf");
    std::fs::write(&path, json).unwrap();

    let back = Document::read_path(&path, &ReadOptions::default()).unwrap();
    assert!(!back.buffers[0].is_resolved());
    assert_eq!(
        back.get_typed_array::<[f32; 2]>(uvs).unwrap(),
        doc.get_typed_array::<[f32; 2]>(uvs).unwrap()
    );

    std::fs::remove_file(dir.path().join("bin data").join("quad.bin")).unwrap();
    let again = Document::read_path(&path, &ReadOptions::default()).unwrap();
    assert!(matches!(again.get_view_bytes(0), Err(Error::Io(_))));
}

#[test]
fn background_parse_of_a_file() {
    let (doc, _, indices) = quad();
    let bytes = doc.to_glb(WriteOptions::default()).unwrap();
    let task = ParseTask::spawn_glb(
        bytes,
        ReadOptions {
            flip_winding: false,
            ..Default::default()
        },
    )
    .unwrap();
    let back = task.join().unwrap();
    assert_eq!(back.get_indices(indices).unwrap(), vec![0, 1, 2, 0, 2, 3]);
}
