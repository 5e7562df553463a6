use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessella_core::{FrameBuffer, MosaicLayout, PixelSize};
use tessella_render::{FrameRequest, TileOffset, TileRenderer};

fn pattern_frame(width: u32, height: u32, seed: u32) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = (x * 5 + y * 11 + seed * 37) % 256;
            fb.set_pixel(x, y, [v as u8, (255 - v) as u8, (v / 2) as u8, 255]);
        }
    }
    fb
}

fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("tessella_tile_renderer");
    group.sample_size(20);

    let input = pattern_frame(480, 270, 0);
    let texture = pattern_frame(480, 270, 7);
    let tiles: Vec<_> = (0..12).map(|i| pattern_frame(24, 24, i)).collect();
    let layout =
        MosaicLayout::compute(25, input.size(), PixelSize::new(24, 24)).expect("bench layout");

    for workers in [1usize, 4, 25] {
        let renderer = TileRenderer::new(layout.clone(), Some(workers)).expect("bench renderer");
        group.bench_with_input(
            BenchmarkId::new("fixed_gradient", workers),
            &workers,
            |b, _| {
                let request = FrameRequest {
                    input: &input,
                    tile_frames: &tiles,
                    offset: TileOffset::FixedGradient,
                    output_offset: 3.0,
                };
                b.iter(|| renderer.render_frame(black_box(&request)).expect("render"));
            },
        );
    }

    let renderer = TileRenderer::new(layout, None).expect("bench renderer");
    group.bench_function("offset_texture", |b| {
        let request = FrameRequest {
            input: &input,
            tile_frames: &tiles,
            offset: TileOffset::Texture {
                texture: &texture,
                strength: 1.0,
            },
            output_offset: 3.0,
        };
        b.iter(|| renderer.render_frame(black_box(&request)).expect("render"));
    });

    group.finish();
}

criterion_group!(benches, bench_render_frame);
criterion_main!(benches);
