// src/event.rs

/// ===============================
/// Note intents
/// ===============================

/// A semantic request produced by the gesture router (or synthesised
/// directly by a host or a test).
///
/// Intents:
/// - carry only the key id, never pointer details
/// - are handled to completion, in the order they are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent<'a> {
    Start(&'a str),

    Stop(&'a str),
}

impl<'a> Intent<'a> {
    #[inline]
    pub fn key(&self) -> &'a str {
        match *self {
            Intent::Start(key) | Intent::Stop(key) => key,
        }
    }

    /// Deliver this intent to a subscriber.
    #[inline]
    pub fn dispatch(&self, handler: &mut dyn IntentHandler, now_ms: u64) {
        match *self {
            Intent::Start(key) => handler.note_start(key, now_ms),
            Intent::Stop(key) => handler.note_stop(key, now_ms),
        }
    }
}

/// ===============================
/// Subscribers
/// ===============================

/// Anything that reacts to start/stop intents.
///
/// `now_ms` is main-loop time in milliseconds.
pub trait IntentHandler {
    fn note_start(&mut self, key: &str, now_ms: u64);

    fn note_stop(&mut self, key: &str, now_ms: u64);
}
