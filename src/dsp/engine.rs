//! Output engine — double-buffered, gapless sample scheduling.
//!
//! Two fixed-length stereo buffers alternate between "playing" and
//! "writable". The emulator-rate write path fills the writable side one
//! sample at a time (mix -> effect -> quantize); the host's playback clock
//! reports each buffer completion, which flips the sides. The audible
//! buffer is never written to.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use super::effect::{Effect, EffectSlot};
use super::mixer::{BusMixer, GainOverrides};
use super::quantizer::Quantizer;
use crate::error::EngineError;

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Host playback rate in Hz.
    pub sample_rate: u32,
    /// Length of each buffer in seconds. Shorter lowers latency; longer
    /// rides out host scheduling hiccups.
    pub duration_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            duration_seconds: 0.5,
        }
    }
}

/// Identifies one of the two scheduler buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSide {
    A,
    B,
}

impl BufferSide {
    pub fn other(self) -> BufferSide {
        match self {
            BufferSide::A => BufferSide::B,
            BufferSide::B => BufferSide::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            BufferSide::A => 0,
            BufferSide::B => 1,
        }
    }

    fn from_index(index: u8) -> BufferSide {
        if index == 0 { BufferSide::A } else { BufferSide::B }
    }
}

/// One fixed-length stereo buffer. Channels are planar, matching the
/// channel-data layout of the host's audio graph.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl SampleBuffer {
    fn new(frame_count: usize) -> Self {
        Self {
            left: vec![0.0; frame_count],
            right: vec![0.0; frame_count],
        }
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Interleaved stereo copy (L R L R ...) for hosts that upload a single
    /// array per buffer.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.left.len() * 2);
        for (&l, &r) in self.left.iter().zip(&self.right) {
            out.push(l);
            out.push(r);
        }
        out
    }

    fn fill_silence(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }
}

/// The audio output engine: bus mixer, effect slot, quantizer, and the
/// two-buffer scheduler, owned as one unit and constructed once by the host.
pub struct AudioEngine {
    frame_count: usize,
    write_index: usize,
    /// Which side the playback driver owns: 0 = A, 1 = B. Release-stored by
    /// the playback domain, Acquire-loaded by the write domain — the sole
    /// arbiter between the two clocks.
    active: AtomicU8,
    buffers: [SampleBuffer; 2],
    mixer: BusMixer,
    effect: EffectSlot,
    quantizer: Quantizer,
    frames_written: AtomicU64,
    buffers_completed: AtomicU64,
}

impl AudioEngine {
    /// Allocate both buffers zero-filled and start with side A active.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let frame_count =
            (config.sample_rate as f64 * config.duration_seconds).floor() as usize;
        if config.sample_rate == 0 || frame_count == 0 {
            return Err(EngineError::InvalidConfig {
                sample_rate: config.sample_rate,
                duration_seconds: config.duration_seconds,
            });
        }

        Ok(Self {
            frame_count,
            write_index: 0,
            active: AtomicU8::new(BufferSide::A.index() as u8),
            buffers: [SampleBuffer::new(frame_count), SampleBuffer::new(frame_count)],
            mixer: BusMixer::new(),
            effect: EffectSlot::new(),
            quantizer: Quantizer::new(),
            frames_written: AtomicU64::new(0),
            buffers_completed: AtomicU64::new(0),
        })
    }

    /// Samples per buffer.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Side currently handed to the playback driver.
    pub fn active_side(&self) -> BufferSide {
        BufferSide::from_index(self.active.load(Ordering::Acquire))
    }

    /// Side the write path targets — always the one not playing.
    pub fn write_side(&self) -> BufferSide {
        self.active_side().other()
    }

    pub fn buffer(&self, side: BufferSide) -> &SampleBuffer {
        &self.buffers[side.index()]
    }

    /// Total samples written since creation.
    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Buffers the playback driver has finished. Together with
    /// `frames_written` this makes the write/playback clock drift
    /// observable; the scheduler itself never corrects for it.
    pub fn buffers_completed(&self) -> u64 {
        self.buffers_completed.load(Ordering::Relaxed)
    }

    /// Mix, shape and quantize one emulator-rate sample, store it into the
    /// side not currently playing, then advance the cursor (wrapping at the
    /// buffer end). Bounded time, never blocks.
    pub fn write_sample(&mut self, left: f32, right: f32, overrides: &GainOverrides) {
        let (mixed_l, mixed_r) = self.mixer.mix(left, right, overrides);
        let (fx_l, fx_r) = self.effect.process(mixed_l, mixed_r);
        let out_l = self.quantizer.quantize(fx_l);
        let out_r = self.quantizer.quantize(fx_r);

        let target = self.write_side().index();
        let idx = self.write_index;
        self.buffers[target].left[idx] = out_l;
        self.buffers[target].right[idx] = out_r;

        self.write_index = (idx + 1) % self.frame_count;
        self.frames_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Persist bus gains; fields absent from `update` are unchanged.
    pub fn set_volume(&mut self, update: &GainOverrides) {
        self.mixer.apply(update);
    }

    /// Install a custom per-sample effect; `None` restores the default
    /// reverb.
    pub fn set_effect(&mut self, effect: Option<Box<dyn Effect>>) {
        self.effect.set(effect);
    }

    /// Dither switch, for hosts that need a bit-exact output path.
    pub fn set_dither(&mut self, enabled: bool) {
        self.quantizer.set_dither(enabled);
    }

    /// Playback-completion handoff: flip the active side and return the
    /// side the driver must start next, as one decision. The host calls
    /// this from the completion callback itself and starts the returned
    /// buffer immediately, so scheduling jitter cannot open a gap.
    pub fn on_buffer_complete(&self) -> BufferSide {
        let next = self.active_side().other();
        self.active.store(next.index() as u8, Ordering::Release);
        self.buffers_completed.fetch_add(1, Ordering::Relaxed);
        next
    }

    /// Zero both buffers and the reverb tail immediately. The cursor and
    /// the active side keep their positions.
    pub fn silence(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill_silence();
        }
        self.effect.clear_state();
    }
}
