//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { pianotiles_init, PianoTilesConfig, WebPiano } from './pianotiles.js';
//!
//! await init();
//! pianotiles_init();
//!
//! const piano = new WebPiano(new PianoTilesConfig());
//! for (const { id } of JSON.parse(piano.keys_json())) { buildTile(id); }
//!
//! tile.addEventListener('pointerdown', e => piano.pointer_down(tile.id, e.buttons, Date.now()));
//! document.addEventListener('pointerup', () => piano.pointer_up(undefined, Date.now()));
//! setInterval(() => piano.tick(Date.now()), 10);
//!
//! // In the AudioWorklet
//! piano.render(frames, output);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::{DEFAULT_MAX_BLOCK, DEFAULT_SAMPLE_RATE, PianoConfig};
use crate::gesture::PointerEvent;
use crate::persist::{CONTENT_TYPE, QueuedTransport};
use crate::piano::{KeyFeedback, Piano};

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn pianotiles_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Audio configuration for a piano.
#[wasm_bindgen]
#[derive(Clone, Copy)]
pub struct PianoTilesConfig {
    /// Sample rate in Hz (e.g., 44100.0, 48000.0).
    pub sample_rate: f64,
    /// Maximum audio block size in frames (e.g., 128, 256, 512).
    pub max_block_size: u32,
}

#[wasm_bindgen]
impl PianoTilesConfig {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(sample_rate: f64, max_block_size: u32) -> Self {
        Self {
            sample_rate,
            max_block_size,
        }
    }
}

impl Default for PianoTilesConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: DEFAULT_MAX_BLOCK as u32,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Feedback queue
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
struct KeyChange {
    key: String,
    sounding: bool,
}

/// Buffers per-key state changes until the page asks for them.
struct FeedbackQueue(Rc<RefCell<Vec<KeyChange>>>);

impl KeyFeedback for FeedbackQueue {
    fn key_changed(&mut self, key: &str, sounding: bool) {
        self.0.borrow_mut().push(KeyChange {
            key: key.to_string(),
            sounding,
        });
    }
}

#[derive(Serialize)]
struct KeyInfo {
    id: &'static str,
    pitch: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadJob {
    id: u32,
    url: String,
    content_type: &'static str,
    body: String,
}

/// `Date.now()` arrives as a double.
#[inline]
fn millis(now: f64) -> u64 {
    now.max(0.0) as u64
}

// ═══════════════════════════════════════════════════════════════════════════
// Piano
// ═══════════════════════════════════════════════════════════════════════════

/// The piano, driven from the page's event handlers and an AudioWorklet.
#[wasm_bindgen]
pub struct WebPiano {
    inner: Piano<QueuedTransport>,
    changes: Rc<RefCell<Vec<KeyChange>>>,
}

#[wasm_bindgen]
impl WebPiano {
    #[wasm_bindgen(constructor)]
    pub fn new(config: PianoTilesConfig) -> WebPiano {
        let config = PianoConfig::new()
            .with_sample_rate(config.sample_rate)
            .with_max_block_size(config.max_block_size as usize);
        let changes = Rc::new(RefCell::new(Vec::new()));

        let mut inner = Piano::new(config, QueuedTransport::new());
        inner.set_feedback(Box::new(FeedbackQueue(Rc::clone(&changes))));

        WebPiano { inner, changes }
    }

    /// Override where recordings are posted (default `http://localhost:5000/saveRecording`).
    pub fn set_save_endpoint(&mut self, base_url: &str, path: &str) {
        self.inner.set_save_endpoint(base_url, path);
    }

    /// Keys in display order: `[{"id": "C4", "pitch": 261.625}, ...]`.
    pub fn keys_json(&self) -> String {
        let keys: Vec<KeyInfo> = self
            .inner
            .keys()
            .map(|k| KeyInfo {
                id: k.id,
                pitch: k.pitch,
            })
            .collect();
        serde_json::to_string(&keys).unwrap_or_else(|_| "[]".to_string())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pointer events
    // ─────────────────────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, key: Option<String>, buttons: u16, now: f64) {
        let event = PointerEvent::Down {
            key: key.as_deref(),
            buttons,
        };
        self.inner.pointer(event, millis(now));
    }

    pub fn pointer_up(&mut self, key: Option<String>, now: f64) {
        let event = PointerEvent::Up { key: key.as_deref() };
        self.inner.pointer(event, millis(now));
    }

    pub fn pointer_over(&mut self, key: &str, now: f64) {
        self.inner.pointer(PointerEvent::Over { key }, millis(now));
    }

    pub fn pointer_leave(&mut self, key: &str, now: f64) {
        self.inner.pointer(PointerEvent::Leave { key }, millis(now));
    }

    /// Run due timers and collect save results. Call from a short interval.
    pub fn tick(&mut self, now: f64) -> u32 {
        self.inner.tick(millis(now)) as u32
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Audio
    // ─────────────────────────────────────────────────────────────────────────

    /// Render audio frames to the provided output buffer (interleaved stereo).
    /// Output format: [L0, R0, L1, R1, L2, R2, ...]
    ///
    /// The output slice must have length >= frames * 2.
    pub fn render(&mut self, frames: u32, output: &mut [f32]) {
        let samples = frames as usize * 2;
        if output.len() < samples {
            output.fill(0.0);
            return;
        }
        self.inner.render_interleaved(&mut output[..samples], 2);
    }

    pub fn active_voices(&self) -> u32 {
        self.inner.voices().active_count() as u32
    }

    /// Pending key state changes as `[{"key": "C4", "sounding": true}, ...]`.
    pub fn drain_feedback(&mut self) -> String {
        let changes = std::mem::take(&mut *self.changes.borrow_mut());
        serde_json::to_string(&changes).unwrap_or_else(|_| "[]".to_string())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recording
    // ─────────────────────────────────────────────────────────────────────────

    /// The record button. Returns whether a session is now active.
    pub fn toggle_recording(&mut self, now: f64) -> bool {
        match self.inner.toggle_recording(millis(now)) {
            Ok(active) => active,
            Err(e) => {
                log::error!("record toggle failed: {}", e);
                self.inner.is_recording()
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.inner.is_recording()
    }

    pub fn recording_status(&self, now: f64) -> Option<String> {
        self.inner.recording_status(millis(now))
    }

    pub fn recording_count(&self) -> u32 {
        self.inner.recordings().len() as u32
    }

    pub fn preview(&self) -> Option<String> {
        match self.inner.preview_json() {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("nothing to preview: {}", e);
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────────

    /// Queue the latest take for saving. Returns the request id.
    pub fn save(&mut self) -> Option<u32> {
        match self.inner.save() {
            Ok(id) => Some(id as u32),
            Err(e) => {
                log::warn!("save skipped: {}", e);
                None
            }
        }
    }

    /// Next queued save for the page to `fetch`:
    /// `{"id", "url", "contentType", "body"}`.
    pub fn next_upload(&mut self) -> Option<String> {
        let (id, request) = self.inner.transport_mut().next_request()?;
        let job = UploadJob {
            id: id as u32,
            url: request.url,
            content_type: CONTENT_TYPE,
            body: request.body,
        };
        serde_json::to_string(&job).ok()
    }

    /// Report the HTTP status of a finished upload.
    pub fn finish_upload(&mut self, id: u32, status: u16) {
        self.inner.transport_mut().complete(id as u64, Ok(status));
    }

    /// Report a network failure for an upload.
    pub fn fail_upload(&mut self, id: u32, message: String) {
        self.inner.transport_mut().complete(id as u64, Err(message));
    }
}
