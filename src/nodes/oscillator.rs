// Tone generator: a fixed-frequency wavetable oscillator.

use std::rc::Rc;

use crate::graph::{AudioGraph, Connection, NodeKind};

use super::PeriodicWave;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Created,
    Started,
    Stopped,
}

// ═══════════════════════════════════════════════════════════════════
// Tone Generator
// ═══════════════════════════════════════════════════════════════════

pub struct ToneGenerator {
    wave: Rc<PeriodicWave>,
    frequency: f32,
    phase: f32,
    state: GeneratorState,
    output: Option<Connection>,
}

impl ToneGenerator {
    /// Build a generator at `frequency` and connect it to the destination.
    ///
    /// The frequency is fixed for the generator's lifetime.
    pub fn new(wave: Rc<PeriodicWave>, frequency: f32, graph: &AudioGraph) -> Self {
        Self {
            wave,
            frequency,
            phase: 0.0,
            state: GeneratorState::Created,
            output: Some(graph.connect(NodeKind::Oscillator)),
        }
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    #[inline]
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.output.is_some()
    }

    pub fn start(&mut self) {
        if self.state == GeneratorState::Created {
            self.state = GeneratorState::Started;
        }
    }

    /// Stop producing sound. A stopped generator cannot be restarted.
    pub fn stop(&mut self) {
        self.state = GeneratorState::Stopped;
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.output.take() {
            conn.close();
        }
    }

    /// Render into `out`. Returns `true` if the output is silent.
    pub fn process(&mut self, out: &mut [f32], sample_rate: f64) -> bool {
        if self.state != GeneratorState::Started || self.output.is_none() {
            out.fill(0.0);
            return true;
        }

        let inc = (self.frequency as f64 / sample_rate) as f32;
        for sample in out.iter_mut() {
            *sample = self.wave.sample(self.phase);
            self.phase = (self.phase + inc).fract();
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(graph: &AudioGraph, freq: f32) -> ToneGenerator {
        ToneGenerator::new(Rc::new(PeriodicWave::piano()), freq, graph)
    }

    #[test]
    fn test_silent_until_started() {
        let graph = AudioGraph::new();
        let mut osc = generator(&graph, 440.0);
        let mut buf = [1.0_f32; 64];

        assert!(osc.process(&mut buf, 48_000.0));
        assert!(buf.iter().all(|&s| s == 0.0));

        osc.start();
        assert!(!osc.process(&mut buf, 48_000.0));
        assert!(buf.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_stop_is_final() {
        let graph = AudioGraph::new();
        let mut osc = generator(&graph, 440.0);
        osc.start();
        osc.stop();
        osc.start();
        assert_eq!(osc.state(), GeneratorState::Stopped);
    }

    #[test]
    fn test_period_matches_frequency() {
        // 480 Hz at 48 kHz repeats every 100 samples
        let graph = AudioGraph::new();
        let mut osc = generator(&graph, 480.0);
        osc.start();
        let mut buf = vec![0.0_f32; 201];
        osc.process(&mut buf, 48_000.0);

        assert!((buf[0] - buf[100]).abs() < 1e-3);
        assert!((buf[0] - buf[200]).abs() < 1e-3);
    }

    #[test]
    fn test_disconnect_releases_graph_node() {
        let graph = AudioGraph::new();
        let mut osc = generator(&graph, 261.625);
        assert_eq!(graph.live_nodes(), 1);
        assert_eq!(osc.frequency(), 261.625);

        osc.disconnect();
        osc.disconnect();
        assert!(!osc.is_connected());
        assert_eq!(graph.live_nodes(), 0);
    }
}
