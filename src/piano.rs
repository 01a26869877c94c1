//! The piano controller.
//!
//! [`Piano`] is the single owner of all mutable state: the active voice
//! table (inside [`VoiceManager`]), the "pointer engaged" flag (inside
//! [`GestureRouter`]), the recorder and the uploader. Every public method
//! runs to completion before the next one, so a start and a stop for the
//! same key are never interleaved.
//!
//! # Usage
//!
//! ```ignore
//! let mut piano = Piano::new(PianoConfig::default(), HttpTransport);
//!
//! // Main loop: pointer callbacks and timers
//! piano.pointer(PointerEvent::Down { key: Some("C4"), buttons: 1 }, now_ms);
//! piano.tick(now_ms);
//!
//! // Audio callback
//! piano.render(&mut block);
//! ```

use log::debug;

use crate::config::PianoConfig;
use crate::error::{PianoError, PianoResult};
use crate::event::Intent;
use crate::gesture::{GestureRouter, PointerEvent};
use crate::keys::{self, Key};
use crate::persist::{SaveOutcome, SaveRequest, Transport, Uploader};
use crate::recording::{Recorder, Recording};
use crate::voice_manager::VoiceManager;

/// Observer for per-key visual state. Purely informational.
pub trait KeyFeedback {
    fn key_changed(&mut self, key: &str, sounding: bool);
}

pub struct Piano<T: Transport> {
    config: PianoConfig,
    voices: VoiceManager,
    router: GestureRouter,
    recorder: Recorder,
    uploader: Uploader<T>,
    feedback: Option<Box<dyn KeyFeedback>>,

    /// Mono scratch for interleaved rendering (one block).
    mono: Vec<f32>,
}

impl<T: Transport> Piano<T> {
    pub fn new(config: PianoConfig, transport: T) -> Self {
        let max_block = config.max_block_size.max(1);
        Self {
            voices: VoiceManager::new(config.sample_rate, max_block),
            router: GestureRouter::new(),
            recorder: Recorder::new(),
            uploader: Uploader::new(transport),
            feedback: None,
            mono: vec![0.0; max_block],
            config,
        }
    }

    pub fn set_feedback(&mut self, feedback: Box<dyn KeyFeedback>) {
        self.feedback = Some(feedback);
    }

    /// Keys in display order, for building the keyboard.
    pub fn keys(&self) -> impl Iterator<Item = &'static Key> {
        keys::iter()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────────────────

    /// Feed one raw pointer event. Returns the intent it produced, if any.
    pub fn pointer<'a>(&mut self, event: PointerEvent<'a>, now_ms: u64) -> Option<Intent<'a>> {
        let intent = self.router.route(event)?;
        self.dispatch(intent, now_ms);
        Some(intent)
    }

    /// Deliver an intent to the voice manager and the recorder, then notify feedback.
    pub fn dispatch(&mut self, intent: Intent<'_>, now_ms: u64) {
        intent.dispatch(&mut self.voices, now_ms);
        intent.dispatch(&mut self.recorder, now_ms);
        self.notify(intent);
    }

    fn notify(&mut self, intent: Intent<'_>) {
        let Some(feedback) = self.feedback.as_mut() else {
            return;
        };
        match intent {
            Intent::Start(key) if self.voices.voice(key).is_some() => {
                feedback.key_changed(key, true)
            }
            Intent::Stop(key) if keys::find(key).is_some() => feedback.key_changed(key, false),
            _ => {}
        }
    }

    /// Run due timers and collect persistence outcomes.
    ///
    /// Returns how many voices were finalized.
    pub fn tick(&mut self, now_ms: u64) -> usize {
        let retired = self.voices.run_timers(now_ms);
        self.poll_uploads();
        retired
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Audio
    // ─────────────────────────────────────────────────────────────────────────

    /// Render mono samples.
    pub fn render(&mut self, out: &mut [f32]) {
        self.voices.render(out);
    }

    /// Render interleaved frames with `channels` identical channels.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let block = self.mono.len();

        for chunk in out.chunks_mut(block * channels) {
            let frames = chunk.len() / channels;
            let mono = &mut self.mono[..frames];
            self.voices.render(mono);
            for (frame, &sample) in chunk.chunks_exact_mut(channels).zip(mono.iter()) {
                frame.fill(sample);
            }
            // Trailing partial frame, if the buffer was not a whole number of frames
            chunk[frames * channels..].fill(0.0);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recording
    // ─────────────────────────────────────────────────────────────────────────

    pub fn start_recording(&mut self, now_ms: u64) -> PianoResult<()> {
        self.recorder.start(now_ms)
    }

    pub fn stop_recording(&mut self, now_ms: u64) -> PianoResult<&Recording> {
        self.recorder.stop(now_ms)
    }

    /// The single record button: start when idle, stop when recording.
    pub fn toggle_recording(&mut self, now_ms: u64) -> PianoResult<bool> {
        self.recorder.toggle(now_ms)
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn recording_status(&self, now_ms: u64) -> Option<String> {
        self.recorder.status(now_ms)
    }

    pub fn preview_json(&self) -> PianoResult<String> {
        self.recorder.preview_json()
    }

    #[inline]
    pub fn recordings(&self) -> &[Recording] {
        self.recorder.takes()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Post the latest take to the configured endpoint. Fire-and-forget:
    /// the outcome is only logged, on a later `tick`.
    pub fn save(&mut self) -> PianoResult<u64> {
        let take = self.recorder.latest().ok_or(PianoError::NoRecording)?;
        let request = SaveRequest::for_recording(self.config.save_url(), take)?;
        let id = self.uploader.submit(request);
        debug!("save #{} submitted", id);
        Ok(id)
    }

    /// Collect (and log) persistence outcomes reported so far.
    pub fn poll_uploads(&mut self) -> Vec<SaveOutcome> {
        self.uploader.drain()
    }

    /// Point later saves at a different service. Requests already submitted keep their URL.
    pub fn set_save_endpoint(&mut self, base_url: &str, path: &str) {
        self.config.save_base_url = base_url.to_string();
        self.config.save_path = path.to_string();
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        self.uploader.transport_mut()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Readback
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &PianoConfig {
        &self.config
    }

    #[inline]
    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    #[inline]
    pub fn is_pointer_engaged(&self) -> bool {
        self.router.is_engaged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::gesture::PRIMARY_BUTTON;
    use crate::persist::QueuedTransport;
    use crate::recording::NoteEvent;

    type Changes = Rc<RefCell<Vec<(String, bool)>>>;

    struct RecordingFeedback(Changes);

    impl KeyFeedback for RecordingFeedback {
        fn key_changed(&mut self, key: &str, sounding: bool) {
            self.0.borrow_mut().push((key.to_string(), sounding));
        }
    }

    fn piano() -> Piano<QueuedTransport> {
        Piano::new(PianoConfig::default(), QueuedTransport::new())
    }

    fn down(key: &str) -> PointerEvent<'_> {
        PointerEvent::Down {
            key: Some(key),
            buttons: PRIMARY_BUTTON,
        }
    }

    #[test]
    fn test_press_and_release_through_pointer() {
        let mut piano = piano();
        assert_eq!(piano.pointer(down("A4"), 0), Some(Intent::Start("A4")));
        assert_eq!(piano.voices().active_count(), 1);
        assert!(piano.is_pointer_engaged());

        piano.pointer(PointerEvent::Up { key: Some("A4") }, 100);
        assert!(piano.voices().voice("A4").unwrap().is_releasing());
        assert!(!piano.is_pointer_engaged());

        assert_eq!(piano.tick(2_099), 0);
        assert_eq!(piano.tick(2_100), 1);
        assert_eq!(piano.voices().active_count(), 0);
    }

    #[test]
    fn test_over_requires_engagement() {
        let mut piano = piano();
        assert_eq!(piano.pointer(PointerEvent::Over { key: "E4" }, 0), None);
        assert_eq!(piano.voices().active_count(), 0);

        piano.pointer(
            PointerEvent::Down {
                key: None,
                buttons: PRIMARY_BUTTON,
            },
            10,
        );
        assert_eq!(
            piano.pointer(PointerEvent::Over { key: "E4" }, 20),
            Some(Intent::Start("E4"))
        );
        assert!(piano.voices().voice("E4").is_some());
    }

    #[test]
    fn test_glissando_leaves_one_voice_per_key() {
        let mut piano = piano();
        piano.pointer(down("C4"), 0);
        piano.pointer(PointerEvent::Leave { key: "C4" }, 30);
        piano.pointer(PointerEvent::Over { key: "D4" }, 31);
        piano.pointer(PointerEvent::Leave { key: "D4" }, 60);
        piano.pointer(PointerEvent::Over { key: "C4" }, 61);

        // C4 was retriggered while releasing: still one voice, sounding again
        assert_eq!(piano.voices().active_count(), 2);
        assert!(!piano.voices().voice("C4").unwrap().is_releasing());
        assert!(piano.voices().voice("D4").unwrap().is_releasing());
        assert_eq!(piano.voices().live_nodes(), 4);

        // C4's first release deadline passes without touching the new voice
        piano.tick(2_030);
        assert!(piano.voices().voice("C4").is_some());
        piano.tick(2_060);
        assert!(piano.voices().voice("D4").is_none());
    }

    #[test]
    fn test_recording_scenario() {
        let t0 = 10_000;
        let mut piano = piano();
        piano.start_recording(t0).unwrap();
        piano.pointer(down("G4"), t0 + 50);
        piano.pointer(PointerEvent::Up { key: Some("G4") }, t0 + 300);
        let take = piano.stop_recording(t0 + 400).unwrap();

        assert_eq!(
            take.events(),
            &[
                NoteEvent {
                    time: 50,
                    key: "G4".into()
                },
                NoteEvent {
                    time: 300,
                    key: "G4".into()
                },
            ]
        );
    }

    #[test]
    fn test_recording_is_independent_of_audio() {
        let mut piano = piano();
        piano.toggle_recording(0).unwrap();
        // Stop without a voice is a no-op for audio but still logged
        piano.dispatch(Intent::Stop("B4"), 5);
        piano.toggle_recording(10).unwrap();
        assert_eq!(piano.recordings()[0].events().len(), 1);
        assert_eq!(piano.voices().active_count(), 0);
    }

    #[test]
    fn test_feedback_reports_sounding_and_silent() {
        let changes = Changes::default();
        let mut piano = piano();
        piano.set_feedback(Box::new(RecordingFeedback(Rc::clone(&changes))));

        piano.dispatch(Intent::Start("C4"), 0);
        piano.dispatch(Intent::Start("X1"), 0);
        piano.dispatch(Intent::Stop("C4"), 10);
        piano.dispatch(Intent::Stop("X1"), 10);

        assert_eq!(
            *changes.borrow(),
            vec![("C4".to_string(), true), ("C4".to_string(), false)]
        );
    }

    #[test]
    fn test_save_posts_latest_take() {
        let mut piano = piano();
        assert!(matches!(piano.save(), Err(PianoError::NoRecording)));

        piano.start_recording(0).unwrap();
        piano.dispatch(Intent::Start("F4"), 1);
        piano.stop_recording(12).unwrap();
        let id = piano.save().unwrap();

        let (taken, request) = piano.transport_mut().next_request().unwrap();
        assert_eq!(taken, id);
        assert_eq!(request.url, "http://localhost:5000/saveRecording");
        assert_eq!(request.body, r#"[{"time":1,"key":"F4"}]"#);

        piano.set_save_endpoint("http://archive:9000", "/takes");
        let second = piano.save().unwrap();
        let (_, request) = piano.transport_mut().next_request().unwrap();
        assert_eq!(request.url, "http://archive:9000/takes");
        piano.transport_mut().complete(second, Ok(201));

        // A failed save is only logged; playing and recording carry on
        piano.transport_mut().complete(id, Err("offline".into()));
        let outcomes = piano.poll_uploads();
        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert_eq!(outcome.is_success(), outcome.id == second);
        }
        piano.start_recording(20).unwrap();
        piano.dispatch(Intent::Start("F4"), 21);
        assert!(piano.is_recording());
        assert!(piano.voices().voice("F4").is_some());
    }

    #[test]
    fn test_render_interleaved_duplicates_channels() {
        let mut piano = Piano::new(
            PianoConfig::default().with_max_block_size(64),
            QueuedTransport::new(),
        );
        piano.dispatch(Intent::Start("A4"), 0);

        let mut out = vec![0.0_f32; 200 * 2 + 1];
        piano.render_interleaved(&mut out, 2);
        for frame in out[..400].chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(out[..400].iter().any(|&s| s != 0.0));
        assert_eq!(out[400], 0.0);
        assert!((piano.voices().current_time() - 200.0 / 48_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_keys_in_display_order() {
        let piano = piano();
        let ids: Vec<_> = piano.keys().map(|k| k.id).collect();
        assert_eq!(&ids[..3], &["C4", "D4", "E4"]);
        assert_eq!(ids.len(), 22);
    }
}
