// src/recording.rs
//
// Recording sessions: a timestamped log of key starts and stops.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::{PianoError, PianoResult};
use crate::event::IntentHandler;

/// One logged key event. Serialises as `{"time": 50, "key": "G4"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Milliseconds since the session started.
    pub time: u64,

    pub key: String,
}

/// A finished take. Read-only once the session stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    started_at: u64,
    duration_ms: u64,
    events: Vec<NoteEvent>,
}

impl Recording {
    /// Main-loop timestamp the session started at.
    #[inline]
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    #[inline]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    #[inline]
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Compact JSON array of the events, as posted to the save endpoint.
    pub fn to_json(&self) -> PianoResult<String> {
        Ok(serde_json::to_string(&self.events)?)
    }
}

#[derive(Debug)]
struct ActiveSession {
    started_at: u64,
    events: Vec<NoteEvent>,
}

/// Records key events while a session is active and keeps every finished take.
#[derive(Debug, Default)]
pub struct Recorder {
    active: Option<ActiveSession>,
    takes: Vec<Recording>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn start(&mut self, now_ms: u64) -> PianoResult<()> {
        if self.active.is_some() {
            return Err(PianoError::AlreadyRecording);
        }
        self.active = Some(ActiveSession {
            started_at: now_ms,
            events: Vec::new(),
        });
        log::info!("recording started");
        Ok(())
    }

    /// Stop the active session and freeze it into a take.
    pub fn stop(&mut self, now_ms: u64) -> PianoResult<&Recording> {
        let session = self.active.take().ok_or(PianoError::NotRecording)?;
        let take = Recording {
            started_at: session.started_at,
            duration_ms: now_ms.saturating_sub(session.started_at),
            events: session.events,
        };
        log::info!(
            "recording saved: {} events over {} ms",
            take.events.len(),
            take.duration_ms
        );
        self.takes.push(take);
        Ok(&self.takes[self.takes.len() - 1])
    }

    /// Start when idle, stop when recording. Returns whether a session is now active.
    pub fn toggle(&mut self, now_ms: u64) -> PianoResult<bool> {
        if self.is_recording() {
            self.stop(now_ms)?;
            Ok(false)
        } else {
            self.start(now_ms)?;
            Ok(true)
        }
    }

    /// Append an event if a session is active.
    pub fn record(&mut self, key: &str, now_ms: u64) {
        if let Some(session) = self.active.as_mut() {
            session.events.push(NoteEvent {
                time: now_ms.saturating_sub(session.started_at),
                key: key.to_string(),
            });
        }
    }

    /// Finished takes, oldest first.
    #[inline]
    pub fn takes(&self) -> &[Recording] {
        &self.takes
    }

    #[inline]
    pub fn latest(&self) -> Option<&Recording> {
        self.takes.last()
    }

    /// Events of the active session, or of the latest take.
    pub fn current_events(&self) -> Option<&[NoteEvent]> {
        match &self.active {
            Some(session) => Some(&session.events),
            None => self.latest().map(Recording::events),
        }
    }

    /// Human-readable status line for the recording control.
    pub fn status(&self, now_ms: u64) -> Option<String> {
        if let Some(session) = &self.active {
            let secs = now_ms.saturating_sub(session.started_at) as f64 / 1000.0;
            return Some(format!("Recording for {:.1} seconds.", secs));
        }
        self.latest().map(|take| {
            format!(
                "Recording saved. Duration - {:.2} seconds.",
                take.duration_ms as f64 / 1000.0
            )
        })
    }

    /// Pretty JSON (one-space indent) of `current_events`.
    pub fn preview_json(&self) -> PianoResult<String> {
        let events = self.current_events().ok_or(PianoError::NoRecording)?;

        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        events.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl IntentHandler for Recorder {
    fn note_start(&mut self, key: &str, now_ms: u64) {
        self.record(key, now_ms);
    }

    fn note_stop(&mut self, key: &str, now_ms: u64) {
        self.record(key, now_ms);
    }
}
