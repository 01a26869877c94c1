// Envelope controller.

use crate::error::PianoResult;
use crate::graph::{AudioGraph, Connection, NodeKind};
use crate::param::AudioParam;

// ═══════════════════════════════════════════════════════════════════
// Shape
// ═══════════════════════════════════════════════════════════════════

pub const ATTACK_SECS: f64 = 0.02;
pub const DECAY_SECS: f64 = 0.1;
pub const SUSTAIN_LEVEL: f32 = 0.65;
pub const RELEASE_SECS: f64 = 2.0;

/// Exponential ramps cannot reach zero; release aims here instead.
pub const RELEASE_FLOOR: f32 = 0.001;

/// Release window in main-loop milliseconds.
pub const RELEASE_MS: u64 = 2_000;

// ═══════════════════════════════════════════════════════════════════
// Envelope
// ═══════════════════════════════════════════════════════════════════

/// A gain node shaped attack / decay / sustain / release.
///
/// Sustain has no timer of its own: the gain holds at the last ramp value
/// until `release` is called.
pub struct Envelope {
    gain: AudioParam,
    released_at: Option<f64>,
    output: Option<Connection>,
}

impl Envelope {
    pub fn new(graph: &AudioGraph) -> Self {
        Self {
            gain: AudioParam::new(1.0),
            released_at: None,
            output: Some(graph.connect(NodeKind::Gain)),
        }
    }

    /// Schedule attack and decay starting at `at` (audio-clock seconds).
    pub fn trigger(&mut self, at: f64) {
        self.gain.cancel_scheduled_values(at);
        self.gain.set_value_at_time(0.0, at);
        self.gain.linear_ramp_to_value_at_time(1.0, at + ATTACK_SECS);
        self.gain
            .linear_ramp_to_value_at_time(SUSTAIN_LEVEL, at + ATTACK_SECS + DECAY_SECS);
        self.released_at = None;
    }

    /// Start the release at `at`.
    ///
    /// Pending ramps are cancelled and the instantaneous gain is pinned as
    /// the starting point, so the fade never jumps.
    pub fn release(&mut self, at: f64) -> PianoResult<()> {
        let current = self.gain.value_at(at);
        self.gain.cancel_scheduled_values(at);
        self.gain.set_value_at_time(current, at);
        self.gain
            .exponential_ramp_to_value_at_time(RELEASE_FLOOR, at + RELEASE_SECS)?;
        self.released_at = Some(at);
        Ok(())
    }

    #[inline]
    pub fn is_releasing(&self) -> bool {
        self.released_at.is_some()
    }

    #[inline]
    pub fn released_at(&self) -> Option<f64> {
        self.released_at
    }

    #[inline]
    pub fn gain_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.output.is_some()
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.output.take() {
            conn.close();
        }
    }

    /// Multiply `buf` by the gain curve, sample by sample, starting at `start_time`.
    pub fn apply(&self, buf: &mut [f32], start_time: f64, sample_rate: f64) {
        if self.output.is_none() {
            buf.fill(0.0);
            return;
        }
        for (i, sample) in buf.iter_mut().enumerate() {
            *sample *= self.gain.value_at(start_time + i as f64 / sample_rate);
        }
    }
}
