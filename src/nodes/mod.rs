// src/nodes/mod.rs
//
// Audio nodes that make up one voice: a wavetable oscillator feeding a
// shaped gain node.

mod envelope;
mod oscillator;
mod wave;

pub use envelope::*;
pub use oscillator::*;
pub use wave::*;
