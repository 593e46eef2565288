use std::collections::BTreeMap;

use insta::assert_snapshot;

use crate::{
    Accessor, Buffer, ComponentType, Document, ElementShape, RawJson, ReadOptions, Target,
    WriteOptions,
    schema::{
        AlphaMode, Animation, AnimationSampler, Channel, ChannelTarget, Interpolation, Material,
        Mesh, Node, PbrMetallicRoughness, Primitive,
    },
};

const POSITIONS: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
const COLORS: [[u8; 4]; 3] = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 128]];

/// A triangle with interleaved position and color, indices, a material, a node
/// and a rotation animation.
fn scene() -> Document {
    let mut doc = Document::new();
    let buffer = doc.add_buffer(Buffer::new());

    let mut interleaved = Vec::new();
    for (position, color) in POSITIONS.iter().zip(&COLORS) {
        for c in position {
            interleaved.extend_from_slice(&c.to_le_bytes());
        }
        interleaved.extend_from_slice(color);
    }
    let mut view = doc.buffers[buffer].append(buffer, &interleaved, 4, Some(Target::ArrayBuffer));
    view.byte_stride = Some(16);
    let view = doc.add_buffer_view(view);
    let position = doc.add_accessor(Accessor {
        buffer_view: Some(view),
        shape: ElementShape::Vec3,
        count: 3,
        min: Some(vec![0.0, 0.0, 0.0]),
        max: Some(vec![1.0, 1.0, 0.0]),
        ..Default::default()
    });
    let color = doc.add_accessor(Accessor {
        buffer_view: Some(view),
        byte_offset: 12,
        component_type: ComponentType::U8,
        shape: ElementShape::Vec4,
        count: 3,
        normalized: true,
        ..Default::default()
    });
    let indices = doc
        .push_accessor(buffer, &[0u16, 1, 2], Some(Target::ElementArrayBuffer))
        .unwrap();
    let times = doc.push_accessor(buffer, &[0.0f32, 1.0], None).unwrap();
    let rotations = doc
        .push_accessor(buffer, &[[0.0f32, 0.0, 0.0, 1.0], [0.0, 0.707, 0.0, 0.707]], None)
        .unwrap();

    doc.materials.push(Material {
        name: Some("paint".into()),
        pbr_metallic_roughness: Some(PbrMetallicRoughness {
            base_color_factor: Some([1.0, 1.0, 1.0, 1.0]),
            metallic_factor: Some(0.0),
            ..Default::default()
        }),
        alpha_mode: Some(AlphaMode::Blend),
        double_sided: true,
        ..Default::default()
    });
    doc.meshes.push(Mesh {
        primitives: vec![Primitive {
            attributes: BTreeMap::from([
                ("COLOR_0".to_owned(), color),
                ("POSITION".to_owned(), position),
            ]),
            indices: Some(indices),
            material: Some(0),
            ..Default::default()
        }],
        name: Some("triangle".into()),
        ..Default::default()
    });
    doc.nodes.push(Node {
        name: Some("root".into()),
        mesh: Some(0),
        translation: Some([0.0, 0.0, -2.0]),
        ..Default::default()
    });
    doc.animations.push(Animation {
        channels: vec![Channel {
            sampler: 0,
            target: ChannelTarget {
                node: Some(0),
                path: "rotation".into(),
                ..Default::default()
            },
            ..Default::default()
        }],
        samplers: vec![AnimationSampler {
            input: times,
            output: rotations,
            interpolation: Some(Interpolation::Linear),
            ..Default::default()
        }],
        ..Default::default()
    });
    doc.scene = Some(0);
    doc.extra_members.push((
        "scenes".into(),
        RawJson::parse(r#"[{"nodes": [0]}]"#).unwrap(),
    ));
    doc
}

fn assert_same_scene(back: &Document, doc: &Document) {
    assert_eq!(back.asset, doc.asset);
    assert_eq!(back.scene, Some(0));
    assert_eq!(back.nodes, doc.nodes);
    assert_eq!(back.meshes, doc.meshes);
    assert_eq!(back.materials, doc.materials);
    assert_eq!(back.animations, doc.animations);
    assert_eq!(back.buffer_views, doc.buffer_views);
    assert_eq!(back.accessors, doc.accessors);
    assert_eq!(back.extra_members, doc.extra_members);

    let primitive = &back.meshes[0].primitives[0];
    let position = primitive.attributes["POSITION"];
    let color = primitive.attributes["COLOR_0"];
    assert_eq!(back.get_typed_array::<[f32; 3]>(position).unwrap(), POSITIONS);
    assert_eq!(back.get_typed_array::<[u8; 4]>(color).unwrap(), COLORS);
    let floats = back.get_f32_components(color).unwrap();
    assert_eq!(&floats[..4], &[1.0, 0.0, 0.0, 1.0]);
    assert!((floats[11] - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(back.get_indices(primitive.indices.unwrap()).unwrap(), vec![2, 1, 0]);

    let sampler = &back.animations[0].samplers[0];
    assert_eq!(back.get_typed_array::<f32>(sampler.input).unwrap(), vec![0.0, 1.0]);
    assert_eq!(back.get_typed_array::<[f32; 4]>(sampler.output).unwrap()[1][1], 0.707);
}

#[test]
fn container_round_trip() {
    let doc = scene();
    let bytes = doc.to_glb(WriteOptions::default()).unwrap();
    let back = Document::from_glb(&bytes, &ReadOptions::default()).unwrap();
    assert_same_scene(&back, &doc);

    // A second pass produces identical bytes.
    assert_eq!(back.to_glb(WriteOptions::default()).unwrap(), bytes);
}

#[test]
fn text_round_trip() {
    let doc = scene();
    let json = doc.to_json().unwrap();
    let back = crate::parse_document(&json, None, None).unwrap();
    assert_same_scene(&back, &doc);
    assert_eq!(back.to_json().unwrap(), json);
}

#[test]
fn unpadded_container_reads_with_warning() {
    let doc = scene();
    let bytes = doc.to_glb(WriteOptions { pad_chunks: false }).unwrap();
    let back = Document::from_glb(&bytes, &ReadOptions::default()).unwrap();
    assert_same_scene(&back, &doc);

    let strict = ReadOptions {
        require_chunk_padding: true,
        ..Default::default()
    };
    let json_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    assert_eq!(
        Document::from_glb(&bytes, &strict).is_err(),
        json_len % 4 != 0
    );
}

#[test]
fn small_document_text() {
    let mut doc = Document::new();
    doc.asset.generator = Some("test".into());
    let buffer = doc.add_buffer(Buffer::new());
    doc.push_accessor(buffer, &[1u8, 2, 3, 4], None).unwrap();
    assert_snapshot!(doc.to_json().unwrap(), @r#"{"asset":{"version":"2.0","generator":"test"},"buffers":[{"uri":"data:application\/octet-stream;base64,AQIDBA==","byteLength":4}],"bufferViews":[{"buffer":0,"byteLength":4}],"accessors":[{"bufferView":0,"componentType":5121,"count":4,"type":"SCALAR","max":[4],"min":[1]}]}"#);
}
