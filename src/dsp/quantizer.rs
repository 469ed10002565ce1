//! Output quantizer — dither plus clamp to the legal signal range.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Default dither seed. Fixed, so the same session replays to the same
/// output stream; hosts that want per-session variation pass their own.
const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Clamps samples to [-1, 1] after adding a small uniform dither offset
/// (one LSB of a 16-bit target, ±1/65536) to mask quantization artifacts.
///
/// The random source is a seedable generator injected at construction, not
/// ambient randomness, so tests can pin the exact offset sequence.
#[derive(Debug, Clone)]
pub struct Quantizer {
    rng: SmallRng,
    dither: bool,
}

impl Quantizer {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            dither: true,
        }
    }

    /// Enable or disable the dither offset. Clamping always applies.
    pub fn set_dither(&mut self, enabled: bool) {
        self.dither = enabled;
    }

    /// Quantize one sample. A fresh offset is drawn per call.
    #[inline]
    pub fn quantize(&mut self, v: f32) -> f32 {
        let dithered = if self.dither {
            v + (self.rng.random::<f32>() - 0.5) / 32768.0
        } else {
            v
        };
        dithered.clamp(-1.0, 1.0)
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_stays_in_range() {
        let mut q = Quantizer::new();
        for v in [-100.0, -1.0, -0.999, 0.0, 0.999, 1.0, 3.0, 1e9] {
            let out = q.quantize(v);
            assert!((-1.0..=1.0).contains(&out), "{v} quantized to {out}");
        }
    }

    #[test]
    fn dither_is_at_most_one_lsb() {
        let mut q = Quantizer::new();
        for _ in 0..10_000 {
            let out = q.quantize(0.0);
            assert!(out.abs() <= 1.0 / 65536.0, "offset {out} exceeds one LSB");
        }
    }

    #[test]
    fn same_seed_same_offsets() {
        let mut a = Quantizer::with_seed(7);
        let mut b = Quantizer::with_seed(7);
        for _ in 0..256 {
            assert_eq!(a.quantize(0.5), b.quantize(0.5));
        }
    }

    #[test]
    fn disabled_dither_is_exact() {
        let mut q = Quantizer::new();
        q.set_dither(false);
        assert_eq!(q.quantize(0.25), 0.25);
        assert_eq!(q.quantize(-2.0), -1.0);
        assert_eq!(q.quantize(1.5), 1.0);
    }
}
