// src/lib.rs
//
// Library entry point: a playable keyboard with per-key voice lifecycle,
// session recording and fire-and-forget persistence.

pub mod config;
pub mod error;
pub mod event;
pub mod gesture;
pub mod graph;
pub mod keys;
pub mod nodes;
pub mod param;
pub mod persist;
pub mod piano;
pub mod recording;
pub mod timer;
pub mod voice;
pub mod voice_manager;

#[cfg(feature = "web")]
pub mod wasm;

// Re-export key types for Rust consumers
pub use config::PianoConfig;
pub use error::{PianoError, PianoResult};
pub use event::{Intent, IntentHandler};
pub use gesture::{GestureRouter, PointerEvent};
pub use keys::{KEYS, Key};
pub use persist::{HttpTransport, QueuedTransport, SaveOutcome, SaveRequest, Transport};
pub use piano::{KeyFeedback, Piano};
pub use recording::{NoteEvent, Recorder, Recording};
pub use voice::{Voice, VoiceToken};
pub use voice_manager::VoiceManager;
