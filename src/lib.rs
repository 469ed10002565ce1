//! Waveline audio core — the emulator's continuous audio output pipeline.
//!
//! Mixes the console's three audio buses, applies the default console
//! reverb (or a host-installed effect), dithers and clamps every sample,
//! and schedules the result through two alternating fixed-length buffers
//! for gapless browser playback. The browser host owns the actual audio
//! device; this crate owns everything between the emulator's sample clock
//! and the buffers the host plays.

pub mod db;
pub mod dsp;
pub mod error;
pub mod host;
pub mod quality;

use std::collections::HashMap;

use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::db::{Database, Record, Table};
use crate::dsp::effect::Effect;
use crate::dsp::engine::{AudioEngine, BufferSide, EngineConfig};
use crate::dsp::mixer::GainOverrides;
use crate::quality::{QualityControl, QualityLevel, QualityObserver};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the waveline-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Route panics and the `log` facade to the browser console. Runs once per
/// module instantiation.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

// ── Audio pipeline handle ───────────────────────────────────

/// A custom effect backed by a host-side JS function.
///
/// The function receives `(left, right)` and must return a two-element
/// numeric array. A throwing or malformed function degrades to passthrough
/// for the affected samples; the first fault is logged, then silenced —
/// the write path must never spam or unwind.
struct JsEffect {
    func: js_sys::Function,
    fault_logged: bool,
}

impl JsEffect {
    fn new(func: js_sys::Function) -> Self {
        Self {
            func,
            fault_logged: false,
        }
    }

    fn call(&mut self, left: f32, right: f32) -> Option<(f32, f32)> {
        let result = self
            .func
            .call2(
                &JsValue::NULL,
                &JsValue::from_f64(left as f64),
                &JsValue::from_f64(right as f64),
            )
            .ok()?;
        let pair = result.dyn_into::<js_sys::Array>().ok()?;
        let l = pair.get(0).as_f64()?;
        let r = pair.get(1).as_f64()?;
        if !l.is_finite() || !r.is_finite() {
            return None;
        }
        Some((l as f32, r as f32))
    }
}

impl Effect for JsEffect {
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        match self.call(left, right) {
            Some(out) => out,
            None => {
                if !self.fault_logged {
                    warn!("custom effect failed; passing the mixed signal through");
                    self.fault_logged = true;
                }
                (left, right)
            }
        }
    }
}

/// Browser handle for the audio pipeline.
///
/// `init` is idempotent and failure is absorbed: a handle that could not
/// initialize stays permanently unready, and every sample-producing call on
/// an unready handle is a logged no-op. Nothing here throws into the
/// emulator's write loop.
#[wasm_bindgen]
pub struct SoundSystem {
    engine: Option<AudioEngine>,
    init_failed: bool,
    warned_uninit: bool,
    warned_bad_overrides: bool,
}

#[wasm_bindgen]
impl SoundSystem {
    #[wasm_bindgen(constructor)]
    pub fn new() -> SoundSystem {
        SoundSystem {
            engine: None,
            init_failed: false,
            warned_uninit: false,
            warned_bad_overrides: false,
        }
    }

    /// Allocate the double buffers and start the pipeline with side A
    /// active. Defaults: 44100 Hz, 0.5 s per buffer. A second call while
    /// initialized is a no-op; a failed call leaves the handle permanently
    /// unready rather than throwing.
    pub fn init(&mut self, sample_rate: Option<u32>, duration_seconds: Option<f64>) {
        if self.engine.is_some() || self.init_failed {
            return;
        }

        let defaults = EngineConfig::default();
        let config = EngineConfig {
            sample_rate: sample_rate.unwrap_or(defaults.sample_rate),
            duration_seconds: duration_seconds.unwrap_or(defaults.duration_seconds),
        };
        match AudioEngine::new(config) {
            Ok(engine) => {
                info!(
                    "audio init: {} Hz, {} frames per buffer",
                    config.sample_rate,
                    engine.frame_count()
                );
                self.engine = Some(engine);
            }
            Err(e) => {
                warn!("audio init failed: {e}");
                self.init_failed = true;
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    /// Samples per buffer (0 while unready).
    #[wasm_bindgen(getter)]
    pub fn frame_count(&self) -> usize {
        self.engine.as_ref().map_or(0, |e| e.frame_count())
    }

    /// Write one emulator-rate stereo sample. `overrides` is an optional
    /// `{mainL, mainR, cdL, cdR, extL, extR}` object applied to this call
    /// only.
    pub fn write_sample(&mut self, left: f32, right: f32, overrides: JsValue) {
        let overrides = self.parse_overrides(overrides);
        let Some(engine) = self.engine.as_mut() else {
            self.warn_uninit("write_sample");
            return;
        };
        engine.write_sample(left, right, &overrides);
    }

    /// Persist bus gains from a `{mainL?, mainR?, cdL?, cdR?, extL?, extR?}`
    /// patch object; absent fields are left unchanged.
    pub fn set_volume(&mut self, update: JsValue) -> Result<(), JsValue> {
        let update: GainOverrides = serde_wasm_bindgen::from_value(update)
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        let Some(engine) = self.engine.as_mut() else {
            self.warn_uninit("set_volume");
            return Ok(());
        };
        engine.set_volume(&update);
        Ok(())
    }

    /// Install a per-sample effect function `(l, r) => [l', r']`, or pass
    /// `null` to restore the built-in reverb.
    pub fn set_effect(&mut self, effect: Option<js_sys::Function>) {
        let Some(engine) = self.engine.as_mut() else {
            self.warn_uninit("set_effect");
            return;
        };
        engine.set_effect(effect.map(|f| Box::new(JsEffect::new(f)) as Box<dyn Effect>));
    }

    /// Dither switch, for bit-exact capture paths.
    pub fn set_dither(&mut self, enabled: bool) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_dither(enabled);
        }
    }

    /// Zero both buffers immediately (pause/mute/reset). The write cursor
    /// and the active side keep their positions.
    pub fn silence(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            self.warn_uninit("silence");
            return;
        };
        engine.silence();
    }

    /// Buffer currently owned by the playback driver: 0 = A, 1 = B.
    pub fn active_buffer(&self) -> u8 {
        self.engine
            .as_ref()
            .map_or(0, |e| e.active_side().index() as u8)
    }

    /// Report that the active buffer finished playing. Flips sides and
    /// returns the buffer (0/1) the host must start next — schedule it
    /// inside the completion callback itself so no gap opens.
    pub fn on_buffer_complete(&self) -> u8 {
        self.engine
            .as_ref()
            .map_or(0, |e| e.on_buffer_complete().index() as u8)
    }

    /// Interleaved copy (L R L R ...) of one buffer, for upload into the
    /// host's audio graph.
    pub fn buffer_samples(&self, side: u8) -> Vec<f32> {
        let side = if side == 0 { BufferSide::A } else { BufferSide::B };
        self.engine
            .as_ref()
            .map_or_else(Vec::new, |e| e.buffer(side).interleaved())
    }

    /// Samples written since init. With `buffers_completed`, lets the host
    /// watch the write clock drift against the playback clock.
    pub fn frames_written(&self) -> f64 {
        self.engine.as_ref().map_or(0.0, |e| e.frames_written() as f64)
    }

    pub fn buffers_completed(&self) -> f64 {
        self.engine
            .as_ref()
            .map_or(0.0, |e| e.buffers_completed() as f64)
    }
}

impl SoundSystem {
    fn parse_overrides(&mut self, value: JsValue) -> GainOverrides {
        if value.is_undefined() || value.is_null() {
            return GainOverrides::NONE;
        }
        match serde_wasm_bindgen::from_value(value) {
            Ok(overrides) => overrides,
            Err(e) => {
                if !self.warned_bad_overrides {
                    warn!("ignoring malformed gain overrides: {e}");
                    self.warned_bad_overrides = true;
                }
                GainOverrides::NONE
            }
        }
    }

    fn warn_uninit(&mut self, op: &str) {
        if !self.warned_uninit {
            warn!("{op} called before init; ignoring");
            self.warned_uninit = true;
        }
    }
}

impl Default for SoundSystem {
    fn default() -> Self {
        Self::new()
    }
}

// ── Database handle ─────────────────────────────────────────

/// Browser handle for the metadata lookup tables. The host fetches and
/// parses the database files, then hands tables over as JSON strings or
/// plain objects.
#[wasm_bindgen]
pub struct GameDatabase {
    db: Database,
}

#[wasm_bindgen]
impl GameDatabase {
    #[wasm_bindgen(constructor)]
    pub fn new() -> GameDatabase {
        GameDatabase {
            db: Database::new(),
        }
    }

    /// Load the disc table from a JSON string; returns the entry count.
    pub fn load_discs(&mut self, json: &str) -> Result<usize, JsValue> {
        self.load(Table::Discs, json)
    }

    pub fn load_games(&mut self, json: &str) -> Result<usize, JsValue> {
        self.load(Table::Games, json)
    }

    pub fn load_achievements(&mut self, json: &str) -> Result<usize, JsValue> {
        self.load(Table::Achievements, json)
    }

    /// Load the disc table from an already-parsed host object.
    pub fn install_discs(&mut self, table: JsValue) -> Result<usize, JsValue> {
        let entries: HashMap<String, Record> = serde_wasm_bindgen::from_value(table)
            .map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(self.db.install_table(Table::Discs, entries))
    }

    /// Look up a disc by serial; returns the record object or `undefined`.
    pub fn find_disc(&self, serial: &str) -> JsValue {
        record_to_js(self.db.find_disc(serial))
    }

    pub fn find_game(&self, id: &str) -> JsValue {
        record_to_js(self.db.find_game(id))
    }

    pub fn find_achievement(&self, id: &str) -> JsValue {
        record_to_js(self.db.find_achievement(id))
    }

    /// Disc-recognition hook: the drive module calls this with the serial
    /// it just read.
    pub fn recognize_disc(&self, serial: &str) -> JsValue {
        record_to_js(self.db.recognize_disc(serial))
    }
}

impl GameDatabase {
    fn load(&mut self, table: Table, json: &str) -> Result<usize, JsValue> {
        self.db
            .load_table(table, json)
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }
}

impl Default for GameDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn record_to_js(record: Option<&Record>) -> JsValue {
    match record {
        Some(r) => serde_wasm_bindgen::to_value(r).unwrap_or(JsValue::UNDEFINED),
        None => JsValue::UNDEFINED,
    }
}

// ── Quality toggle handle ───────────────────────────────────

/// Browser handle for the render-quality seam.
#[wasm_bindgen]
pub struct QualitySwitch {
    control: QualityControl,
}

#[wasm_bindgen]
impl QualitySwitch {
    #[wasm_bindgen(constructor)]
    pub fn new() -> QualitySwitch {
        QualitySwitch {
            control: QualityControl::new(),
        }
    }

    /// Register the host function called with the new level's label on
    /// every change; replaces any previous observer.
    pub fn set_observer(&mut self, observer: Option<js_sys::Function>) {
        self.control.set_observer(observer.map(|f| {
            Box::new(move |level: QualityLevel| {
                let _ = f.call1(&JsValue::NULL, &JsValue::from_str(level.label()));
            }) as Box<dyn QualityObserver>
        }));
    }

    /// Advance to the next preset; returns its label for the host's button.
    pub fn cycle(&mut self) -> String {
        self.control.cycle().label().to_string()
    }

    /// Current preset label.
    pub fn label(&self) -> String {
        self.control.level().label().to_string()
    }
}

impl Default for QualitySwitch {
    fn default() -> Self {
        Self::new()
    }
}
