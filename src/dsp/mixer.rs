//! Bus mixer — sums the three virtual stereo buses into one pair.
//!
//! The console drives three independent sources over the same physical
//! output: synthesized audio (main), optical-media audio (cd), and the
//! expansion port (ext). One emulator-side stereo sample feeds all three
//! buses; each scales it by its own per-channel gain and the results sum
//! additively.

use serde::{Deserialize, Serialize};

/// Per-bus stereo gain. Unconstrained — negative inverts, above 1.0 boosts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoGain {
    pub left: f32,
    pub right: f32,
}

impl Default for StereoGain {
    fn default() -> Self {
        Self {
            left: 1.0,
            right: 1.0,
        }
    }
}

/// Partial gain set, used two ways: as the `set_volume` patch (present
/// fields overwrite the persisted gain) and as a per-call override (present
/// fields win for that call only).
///
/// Field names mirror the host-side option object (`mainL`, `cdR`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GainOverrides {
    pub main_l: Option<f32>,
    pub main_r: Option<f32>,
    pub cd_l: Option<f32>,
    pub cd_r: Option<f32>,
    pub ext_l: Option<f32>,
    pub ext_r: Option<f32>,
}

impl GainOverrides {
    /// The empty override set: every call falls back to persisted gains.
    pub const NONE: GainOverrides = GainOverrides {
        main_l: None,
        main_r: None,
        cd_l: None,
        cd_r: None,
        ext_l: None,
        ext_r: None,
    };
}

/// Persisted gains for the three buses plus the summing stage.
#[derive(Debug, Clone, Default)]
pub struct BusMixer {
    pub main: StereoGain,
    pub cd: StereoGain,
    pub ext: StereoGain,
}

impl BusMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum the input across all three buses. Override fields apply to this
    /// call only and never persist.
    #[inline]
    pub fn mix(&self, left: f32, right: f32, overrides: &GainOverrides) -> (f32, f32) {
        let mut out_l = left * overrides.main_l.unwrap_or(self.main.left);
        let mut out_r = right * overrides.main_r.unwrap_or(self.main.right);

        out_l += left * overrides.cd_l.unwrap_or(self.cd.left);
        out_r += right * overrides.cd_r.unwrap_or(self.cd.right);

        out_l += left * overrides.ext_l.unwrap_or(self.ext.left);
        out_r += right * overrides.ext_r.unwrap_or(self.ext.right);

        (out_l, out_r)
    }

    /// Persist every gain present in `update`; absent fields stay as-is.
    /// No bounds checking.
    pub fn apply(&mut self, update: &GainOverrides) {
        if let Some(v) = update.main_l {
            self.main.left = v;
        }
        if let Some(v) = update.main_r {
            self.main.right = v;
        }
        if let Some(v) = update.cd_l {
            self.cd.left = v;
        }
        if let Some(v) = update.cd_r {
            self.cd.right = v;
        }
        if let Some(v) = update.ext_l {
            self.ext.left = v;
        }
        if let Some(v) = update.ext_r {
            self.ext.right = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_gains_triple_the_input() {
        let mixer = BusMixer::new();
        let (l, r) = mixer.mix(0.25, -0.25, &GainOverrides::NONE);
        assert!((l - 0.75).abs() < 1e-6);
        assert!((r - (-0.75)).abs() < 1e-6);
    }

    #[test]
    fn override_wins_for_one_call_only() {
        let mixer = BusMixer::new();
        let muted_main = GainOverrides {
            main_l: Some(0.0),
            ..GainOverrides::NONE
        };

        let (l, _) = mixer.mix(0.5, 0.5, &muted_main);
        assert!((l - 1.0).abs() < 1e-6, "only cd + ext remain on the left");

        // Persisted gain untouched
        let (l, _) = mixer.mix(0.5, 0.5, &GainOverrides::NONE);
        assert!((l - 1.5).abs() < 1e-6);
    }

    #[test]
    fn apply_patches_only_present_fields() {
        let mut mixer = BusMixer::new();
        mixer.apply(&GainOverrides {
            cd_l: Some(0.25),
            ext_r: Some(-1.0),
            ..GainOverrides::NONE
        });

        assert_eq!(mixer.cd.left, 0.25);
        assert_eq!(mixer.ext.right, -1.0);
        assert_eq!(mixer.main.left, 1.0);
        assert_eq!(mixer.cd.right, 1.0);
    }

    #[test]
    fn negative_gain_inverts() {
        let mut mixer = BusMixer::new();
        mixer.apply(&GainOverrides {
            main_l: Some(-1.0),
            cd_l: Some(0.0),
            ext_l: Some(0.0),
            ..GainOverrides::NONE
        });

        let (l, _) = mixer.mix(0.5, 0.0, &GainOverrides::NONE);
        assert!((l - (-0.5)).abs() < 1e-6);
    }

    #[test]
    fn overrides_use_host_field_names() {
        let parsed: GainOverrides =
            serde_json::from_str(r#"{"mainL": 0.5, "cdR": 0.0, "extL": 2.0}"#).unwrap();
        assert_eq!(parsed.main_l, Some(0.5));
        assert_eq!(parsed.cd_r, Some(0.0));
        assert_eq!(parsed.ext_l, Some(2.0));
        assert_eq!(parsed.main_r, None);
    }
}
