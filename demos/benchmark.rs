//! Micro-benchmark for frame encoding and decoding.
//!
//! Frames are generated with a Linear Congruential Generator seeded with
//! 0xDEADBEEF, so every run processes the same data. Each frame is encoded
//! with `encode_frame`, the frames are concatenated, and the stream is decoded
//! back through `FrameReader`.
//!
//! Run with:
//!
//! ```text
//! cargo run --release --example benchmark
//! ```
//!
//! Set `BENCH_FRAMES` to override the frame count, e.g. `BENCH_FRAMES=20000`.
use std::io::Cursor;
use std::time::Instant;

use qcdm_hdlc::{encode_frame, FrameReader};

fn main() -> qcdm_hdlc::Result<()> {
    const FRAME_COUNT: usize = 1_000_000;
    const FRAME_LEN: usize = 128;

    let frame_count = std::env::var("BENCH_FRAMES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(FRAME_COUNT);

    // Full 0..=255 range, roughly 1 in 128 bytes needs escaping.
    let frames_random = make_frames(frame_count, FRAME_LEN, 0xDEADBEEF, |rng: &mut Lcg| rng.next_u8());

    // Worst case: every byte is reserved and doubles on the wire.
    let frames_reserved = make_frames(frame_count, FRAME_LEN, 0xDEADBEEF, |rng: &mut Lcg| {
        if rng.next_u8() & 1 == 0 {
            0x7E
        } else {
            0x7D
        }
    });

    run_bench("random bytes", &frames_random)?;
    run_bench("reserved bytes only", &frames_reserved)?;

    Ok(())
}

fn ns_per_item(duration: std::time::Duration, count: usize) -> f64 {
    duration.as_nanos() as f64 / count as f64
}

fn mb_per_sec(bytes: usize, duration: std::time::Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 / 1_000_000.0) / secs
    } else {
        0.0
    }
}

fn run_bench(label: &str, frames: &[Vec<u8>]) -> qcdm_hdlc::Result<()> {
    let frame_count = frames.len();

    let start = Instant::now();
    let encoded: Vec<Vec<u8>> = frames.iter().map(|frame| encode_frame(frame)).collect();
    let encode_elapsed = start.elapsed();

    let concatenated = encoded.concat();

    let start = Instant::now();
    let decoded = FrameReader::new(Cursor::new(&concatenated)).read_verified_frames()?;
    let decode_elapsed = start.elapsed();

    assert_eq!(frames, &decoded, "round-trip mismatch for {label}");

    println!("--- Benchmark: {label} ---");
    println!("Frames processed: {frame_count}");
    println!("Encoded bytes: {}", concatenated.len());
    println!(
        "Encoding took: {:?} ({:.2} ns/frame, {:.2} MB/s)",
        encode_elapsed,
        ns_per_item(encode_elapsed, frame_count),
        mb_per_sec(concatenated.len(), encode_elapsed)
    );
    println!(
        "Decoding took: {:?} ({:.2} ns/frame, {:.2} MB/s)",
        decode_elapsed,
        ns_per_item(decode_elapsed, frame_count),
        mb_per_sec(concatenated.len(), decode_elapsed)
    );
    println!();

    Ok(())
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        // Constants from Numerical Recipes LCG.
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    fn next_u8(&mut self) -> u8 {
        (self.next() >> 24) as u8
    }
}

fn make_frames<F>(frame_count: usize, frame_len: usize, seed: u64, mut next_byte: F) -> Vec<Vec<u8>>
where
    F: FnMut(&mut Lcg) -> u8,
{
    let mut rng = Lcg::new(seed);
    (0..frame_count)
        .map(|_| (0..frame_len).map(|_| next_byte(&mut rng)).collect())
        .collect()
}
