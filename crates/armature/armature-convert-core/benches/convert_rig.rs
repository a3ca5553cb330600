use armature_convert::{build, codec, convert, ConvertConfig, Marker, MemoryScene, WorldTransform};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{Rotation3, Vector3};

fn long_chain(len: usize) -> Vec<Marker> {
    (0..len)
        .map(|i| {
            let t = i as f64 * 0.05;
            let world = WorldTransform::new(
                Vector3::new(t.sin(), i as f64 * 0.1, t.cos()),
                Rotation3::from_euler_angles(t, 0.5 * t, -t).into_inner(),
            );
            let marker = Marker::new(format!("bone.{i:03}"), world);
            if i == 0 {
                marker
            } else {
                marker.with_parent(format!("bone.{:03}", i - 1))
            }
        })
        // Children before parents.
        .rev()
        .collect()
}

fn bench_convert(c: &mut Criterion) {
    let markers = long_chain(256);
    let cfg = ConvertConfig::default();

    c.bench_function("decompose", |b| {
        let m = markers[7].world.orientation;
        b.iter(|| codec::decompose(black_box(&m)))
    });

    c.bench_function("build_256", |b| b.iter(|| build(black_box(&markers))));

    c.bench_function("convert_256_memory_scene", |b| {
        b.iter(|| {
            let mut scene = MemoryScene::new();
            for m in &markers {
                scene.insert_marker(m.clone());
            }
            convert(&mut scene, markers.clone(), &cfg).map(|c| c.relationships.len())
        })
    });
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
