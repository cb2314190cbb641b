//! Benchmark suite for sprite decoding
//!
//! Measures the bitstream decoder on its own, the full bitmap pipeline, and
//! the decode cache on hit and miss.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pictkey_benches::{REFERENCE_ID, generate_keyfile, generate_pixel_blob, sizes};
use pictkey_types::file::images::{Archive, LoadOptions, MasterPalette, pixels};

fn load(width: u16, height: u16) -> Archive {
	Archive::from_bytes(&generate_keyfile(width, height), MasterPalette::macintosh(), LoadOptions::lenient())
		.unwrap()
}

/// Benchmark the run-length bitstream decoder
fn bench_bitstream_decode(c: &mut Criterion) {
	let mut group = c.benchmark_group("pixel_decode");

	for (name, (width, height)) in
		[("icon", sizes::ICON), ("character", sizes::CHARACTER), ("large", sizes::LARGE)]
	{
		let blob = generate_pixel_blob(width, height);
		group.throughput(Throughput::Elements(width as u64 * height as u64));
		group.bench_with_input(BenchmarkId::new("decode", name), &blob, |b, blob| {
			b.iter(|| black_box(pixels::decode(black_box(blob), false)));
		});
	}

	group.finish();
}

/// Benchmark decode + palette resolution, bypassing the cache
fn bench_cache_miss(c: &mut Criterion) {
	let mut group = c.benchmark_group("bitmap_miss");

	for (name, (width, height)) in [("character", sizes::CHARACTER), ("large", sizes::LARGE)] {
		let archive = load(width, height);
		group.throughput(Throughput::Elements(width as u64 * height as u64));
		group.bench_function(name, |b| {
			b.iter(|| {
				archive.clear_cache();
				black_box(archive.get_bitmap(REFERENCE_ID, None, false))
			});
		});
	}

	group.finish();
}

/// Benchmark a cached lookup with customization bytes in the key
fn bench_cache_hit(c: &mut Criterion) {
	let archive = load(sizes::LARGE.0, sizes::LARGE.1);
	let custom = [3u8, 7, 11];
	archive.get_bitmap(REFERENCE_ID, Some(&custom), false);

	c.bench_function("bitmap_hit", |b| {
		b.iter(|| black_box(archive.get_bitmap(REFERENCE_ID, Some(black_box(&custom)), false)));
	});
}

criterion_group!(benches, bench_bitstream_decode, bench_cache_miss, bench_cache_hit);
criterion_main!(benches);
