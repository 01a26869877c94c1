// src/voice.rs

use std::rc::Rc;

use crate::error::PianoResult;
use crate::graph::AudioGraph;
use crate::keys::Key;
use crate::nodes::{Envelope, PeriodicWave, ToneGenerator};

/// Identity stamped on a voice when it is created.
///
/// Tokens from one manager are strictly increasing, so a deferred cleanup
/// can tell whether the voice it was scheduled for is still the one in the
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoiceToken(pub(crate) u64);

impl VoiceToken {
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A voice is one sounding instance of one key.
///
/// Unlike a pooled voice slot, it owns its DSP state outright: the
/// generator and the envelope live and die with it.
pub struct Voice {
    key: &'static Key,
    generator: ToneGenerator,
    envelope: Envelope,
    token: VoiceToken,
}

impl Voice {
    /// Build, trigger and start a voice at audio time `at`.
    pub fn new(
        key: &'static Key,
        wave: Rc<PeriodicWave>,
        graph: &AudioGraph,
        token: VoiceToken,
        at: f64,
    ) -> Self {
        let mut generator = ToneGenerator::new(wave, key.pitch, graph);
        let mut envelope = Envelope::new(graph);
        envelope.trigger(at);
        generator.start();

        Self {
            key,
            generator,
            envelope,
            token,
        }
    }

    #[inline]
    pub fn key(&self) -> &'static Key {
        self.key
    }

    #[inline]
    pub fn token(&self) -> VoiceToken {
        self.token
    }

    #[inline]
    pub fn generator(&self) -> &ToneGenerator {
        &self.generator
    }

    #[inline]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    #[inline]
    pub fn is_releasing(&self) -> bool {
        self.envelope.is_releasing()
    }

    pub(crate) fn release(&mut self, at: f64) -> PianoResult<()> {
        self.envelope.release(at)
    }

    /// Stop and tear down immediately, without a fade.
    pub(crate) fn retire(&mut self) {
        self.generator.stop();
        self.generator.disconnect();
        self.envelope.disconnect();
    }

    /// Render this voice into `scratch`. Returns `true` if silent.
    #[inline]
    pub(crate) fn render(&mut self, scratch: &mut [f32], start_time: f64, sample_rate: f64) -> bool {
        if self.generator.process(scratch, sample_rate) {
            return true;
        }
        self.envelope.apply(scratch, start_time, sample_rate);
        false
    }
}
