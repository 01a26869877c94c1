// src/voice_manager.rs

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::error::{PianoError, PianoResult};
use crate::event::IntentHandler;
use crate::graph::AudioGraph;
use crate::keys;
use crate::nodes::{PeriodicWave, RELEASE_MS};
use crate::timer::TimerQueue;
use crate::voice::{Voice, VoiceToken};

/// Deferred cleanup scheduled when a voice starts releasing.
#[derive(Debug, Clone, Copy)]
struct Finalize {
    key: &'static str,
    token: VoiceToken,
}

/// Owns the active voice table and drives each key through
/// `Idle -> Sounding -> Releasing -> Idle`.
///
/// Responsibilities:
/// - at most one voice per key
/// - hard cutover when a key is pressed while its previous voice is still live
/// - deferred finalization guarded by the voice token
/// - rendering every live voice into the destination
///
/// Does NOT:
/// - know about pointers, recording or the network
/// - limit polyphony beyond one voice per key
pub struct VoiceManager {
    wave: Rc<PeriodicWave>,
    graph: AudioGraph,
    voices: HashMap<&'static str, Voice>,
    timers: TimerQueue<Finalize>,
    next_token: u64,

    sample_rate: f64,

    /// Audio clock, advanced only by `render`.
    sample_pos: u64,

    /// Pre-allocated per-voice render buffer (one block).
    scratch: Vec<f32>,
}

impl VoiceManager {
    pub fn new(sample_rate: f64, max_block: usize) -> Self {
        Self {
            wave: Rc::new(PeriodicWave::piano()),
            graph: AudioGraph::new(),
            voices: HashMap::with_capacity(keys::KEYS.len()),
            timers: TimerQueue::new(),
            next_token: 1,
            sample_rate,
            sample_pos: 0,
            scratch: vec![0.0; max_block.max(1)],
        }
    }

    /// Current audio-clock time in seconds.
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.sample_pos as f64 / self.sample_rate
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn issue_token(&mut self) -> VoiceToken {
        let token = VoiceToken(self.next_token);
        self.next_token += 1;
        token
    }

    // ═══════════════════════════════════════════════════════════════════
    // Transitions
    // ═══════════════════════════════════════════════════════════════════

    /// Start a voice for `key`.
    ///
    /// Any voice already installed for the key is stopped and disconnected
    /// first, with no fade. Unknown keys are rejected and leave the table
    /// untouched.
    pub fn start(&mut self, key: &str) -> PianoResult<VoiceToken> {
        let key = keys::find(key).ok_or_else(|| PianoError::UnknownKey(key.to_string()))?;

        if let Some(mut old) = self.voices.remove(key.id) {
            debug!(
                "hard cutover on {} (retiring token {})",
                key.id,
                old.token().value()
            );
            old.retire();
        }

        let token = self.issue_token();
        let at = self.current_time();
        let voice = Voice::new(key, Rc::clone(&self.wave), &self.graph, token, at);
        self.voices.insert(key.id, voice);

        trace!("{} sounding at {:.3}s (token {})", key.id, at, token.value());
        Ok(token)
    }

    /// Begin releasing the voice for `key`.
    ///
    /// Returns `false` when there is nothing to do: no voice for the key,
    /// or the voice is already releasing. Otherwise the release fade starts
    /// now and a finalization is scheduled `RELEASE_MS` after `now_ms`.
    pub fn stop(&mut self, key: &str, now_ms: u64) -> PianoResult<bool> {
        let at = self.current_time();
        let Some(voice) = self.voices.get_mut(key) else {
            return Ok(false);
        };
        if voice.is_releasing() {
            return Ok(false);
        }

        voice.release(at)?;
        let job = Finalize {
            key: voice.key().id,
            token: voice.token(),
        };
        self.timers.schedule(now_ms + RELEASE_MS, job);

        trace!("{} releasing at {:.3}s (token {})", key, at, job.token.value());
        Ok(true)
    }

    /// Tear down the voice for `key` if it still carries `token`.
    ///
    /// A mismatch means a newer voice took the key over; that voice owns its
    /// own cleanup, so this is a silent no-op.
    pub fn finalize(&mut self, key: &str, token: VoiceToken) -> bool {
        match self.voices.get(key) {
            Some(voice) if voice.token() == token => {}
            Some(voice) => {
                trace!(
                    "stale finalization for {} (token {}, live {})",
                    key,
                    token.value(),
                    voice.token().value()
                );
                return false;
            }
            None => return false,
        }

        match self.voices.remove(key) {
            Some(mut voice) => {
                voice.retire();
                trace!("{} idle (token {})", key, token.value());
                true
            }
            None => false,
        }
    }

    /// Fire every finalization due at `now_ms`. Returns how many voices were retired.
    pub fn run_timers(&mut self, now_ms: u64) -> usize {
        let mut retired = 0;
        while let Some(job) = self.timers.pop_due(now_ms) {
            if self.finalize(job.key, job.token) {
                retired += 1;
            }
        }
        retired
    }

    // ═══════════════════════════════════════════════════════════════════
    // Rendering
    // ═══════════════════════════════════════════════════════════════════

    /// Render all live voices (sounding and releasing) into `out` (mono)
    /// and advance the audio clock by `out.len()` frames.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let max_block = self.scratch.len();

        for chunk in out.chunks_mut(max_block) {
            let frames = chunk.len();
            let start_time = self.sample_pos as f64 / self.sample_rate;

            for voice in self.voices.values_mut() {
                let scratch = &mut self.scratch[..frames];
                if voice.render(scratch, start_time, self.sample_rate) {
                    continue;
                }
                for (o, s) in chunk.iter_mut().zip(scratch.iter()) {
                    *o += *s;
                }
            }

            self.sample_pos += frames as u64;
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    #[inline]
    pub fn voice(&self, key: &str) -> Option<&Voice> {
        self.voices.get(key)
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    /// Keys with a live voice, in no particular order.
    pub fn active_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.voices.keys().copied()
    }

    /// Oscillator and gain nodes still connected to the destination.
    #[inline]
    pub fn live_nodes(&self) -> usize {
        self.graph.live_nodes()
    }

    /// Finalizations not yet fired.
    #[inline]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl IntentHandler for VoiceManager {
    fn note_start(&mut self, key: &str, _now_ms: u64) {
        if let Err(e) = self.start(key) {
            debug!("start rejected: {}", e);
        }
    }

    fn note_stop(&mut self, key: &str, now_ms: u64) {
        if let Err(e) = self.stop(key, now_ms) {
            debug!("stop failed for {}: {}", key, e);
        }
    }
}
