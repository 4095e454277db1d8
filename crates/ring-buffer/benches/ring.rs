use criterion::{black_box, criterion_group, criterion_main, Criterion};
use frame_codec::FrameEncoder;
use ring_buffer::DefaultRing;

fn sealed_frame() -> ring_buffer::Frame {
    let mut encoder = FrameEncoder::new();
    loop {
        if let Some(frame) = encoder.push_sample(2048) {
            return frame;
        }
    }
}

fn bench_ring(c: &mut Criterion) {
    let frame = sealed_frame();

    c.bench_function("ring_write", |b| {
        let ring = DefaultRing::new();
        b.iter(|| ring.write(black_box(&frame)));
    });

    c.bench_function("ring_write_read", |b| {
        let ring = DefaultRing::new();
        b.iter(|| {
            ring.write(black_box(&frame));
            black_box(ring.read())
        });
    });

    c.bench_function("encode_frame", |b| {
        let mut encoder = FrameEncoder::new();
        b.iter(|| {
            for sample in 0..31u16 {
                black_box(encoder.push_sample(black_box(sample * 100)));
            }
        });
    });
}

criterion_group!(benches, bench_ring);
criterion_main!(benches);
