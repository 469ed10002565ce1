//! Effect stage — single-slot dispatch between the default reverb and a
//! host-installed transform.

use super::reverb::Reverb;

/// A per-sample stereo transform.
///
/// Implementations may carry state (delay lines, filter memories). `process`
/// runs inside the real-time write path and must return in bounded time.
pub trait Effect {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32);
}

impl<F> Effect for F
where
    F: FnMut(f32, f32) -> (f32, f32),
{
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        self(left, right)
    }
}

/// The engine's single effect slot.
///
/// The default reverb is owned permanently; installing a custom effect only
/// redirects dispatch, so uninstalling brings the reverb back with its delay
/// lines intact.
pub struct EffectSlot {
    reverb: Reverb,
    custom: Option<Box<dyn Effect>>,
}

impl EffectSlot {
    pub fn new() -> Self {
        Self {
            reverb: Reverb::new(),
            custom: None,
        }
    }

    /// Install a custom effect; `None` restores the default reverb.
    pub fn set(&mut self, effect: Option<Box<dyn Effect>>) {
        self.custom = effect;
    }

    pub fn has_custom(&self) -> bool {
        self.custom.is_some()
    }

    /// Run the active effect on one stereo pair.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        match self.custom.as_mut() {
            Some(fx) => fx.process(left, right),
            None => self.reverb.process(left, right),
        }
    }

    /// Zero the default reverb's delay lines.
    pub fn clear_state(&mut self) {
        self.reverb.clear();
    }
}

impl Default for EffectSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::reverb::DELAY_SAMPLES;

    #[test]
    fn custom_effect_takes_over_dispatch() {
        let mut slot = EffectSlot::new();
        slot.set(Some(Box::new(|l: f32, r: f32| (l * 2.0, r * 2.0)) as Box<dyn Effect>));
        assert!(slot.has_custom());
        assert_eq!(slot.process(0.25, -0.25), (0.5, -0.5));
    }

    #[test]
    fn unset_restores_default_reverb() {
        let mut slot = EffectSlot::new();
        slot.set(Some(Box::new(|l: f32, r: f32| (l, r)) as Box<dyn Effect>));
        slot.set(None);
        assert!(!slot.has_custom());

        // Empty delay line: the default reverb is a passthrough on the
        // first sample
        let (l, r) = slot.process(0.5, 0.5);
        assert!((l - 0.5).abs() < 1e-6);
        assert!((r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn reverb_state_survives_a_custom_detour() {
        // Load the reverb tail, switch to a custom effect, switch back:
        // the tail must still be there
        let mut slot = EffectSlot::new();
        for _ in 0..64 {
            slot.process(1.0, 1.0);
        }

        slot.set(Some(Box::new(|l: f32, r: f32| (l, r)) as Box<dyn Effect>));
        assert_eq!(slot.process(0.0, 0.0), (0.0, 0.0));
        slot.set(None);

        let mut heard_tail = false;
        for _ in 0..DELAY_SAMPLES {
            let (l, _) = slot.process(0.0, 0.0);
            if l != 0.0 {
                heard_tail = true;
                break;
            }
        }
        assert!(heard_tail, "delay line should still carry the earlier signal");
    }

    #[test]
    fn stateful_closure_is_accepted() {
        let mut gain = 0.0_f32;
        let mut slot = EffectSlot::new();
        slot.set(Some(Box::new(move |l: f32, _r: f32| {
            gain += 0.5;
            (l * gain, 0.0f32)
        }) as Box<dyn Effect>));

        assert_eq!(slot.process(1.0, 0.0), (0.5, 0.0));
        assert_eq!(slot.process(1.0, 0.0), (1.0, 0.0));
    }
}
