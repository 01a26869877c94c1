// Periodic waveform built from a harmonic table.

use std::f32::consts::TAU;

/// Samples in one wavetable cycle.
pub const TABLE_SIZE: usize = 2048;

/// Cosine amplitudes: DC, fundamental, 2nd and 3rd harmonic.
pub const PIANO_REAL: [f32; 4] = [0.0, 1.0, 0.8, 0.6];

/// Sine amplitudes (no phase offsets).
pub const PIANO_IMAG: [f32; 4] = [0.0; 4];

/// A single-cycle wavetable, normalised to a peak of 1.0.
#[derive(Debug, Clone)]
pub struct PeriodicWave {
    table: Vec<f32>,
}

impl PeriodicWave {
    /// Build from cosine (`real`) and sine (`imag`) coefficients.
    ///
    /// Index 0 is the DC term and is ignored.
    pub fn new(real: &[f32], imag: &[f32]) -> Self {
        let harmonics = real.len().min(imag.len());
        let mut table = vec![0.0_f32; TABLE_SIZE];

        for (i, sample) in table.iter_mut().enumerate() {
            let x = TAU * i as f32 / TABLE_SIZE as f32;
            *sample = (1..harmonics)
                .map(|k| {
                    let kx = k as f32 * x;
                    real[k] * kx.cos() + imag[k] * kx.sin()
                })
                .sum();
        }

        let peak = table.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        if peak > 0.0 {
            for s in &mut table {
                *s /= peak;
            }
        }

        Self { table }
    }

    /// The fixed piano timbre.
    pub fn piano() -> Self {
        Self::new(&PIANO_REAL, &PIANO_IMAG)
    }

    /// Read the table at `phase` in [0, 1), linearly interpolated.
    #[inline]
    pub fn sample(&self, phase: f32) -> f32 {
        let pos = phase.rem_euclid(1.0) * TABLE_SIZE as f32;
        let i = pos as usize % TABLE_SIZE;
        let next = (i + 1) % TABLE_SIZE;
        let frac = pos - pos.floor();
        self.table[i] + (self.table[next] - self.table[i]) * frac
    }
}
