use std::f32::consts::PI;

use anyhow::Result;

use crate::dsp::utils::clamp;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const INPUT: usize = 0;
const CUTOFF_IN: usize = 1;
const ALPHA: usize = 0;

/// One-pole lowpass, `y += alpha * (x - y)`.
///
/// With CUTOFF patched, the CV (0..10 V) is shaped as (cv/10)^4 of Nyquist
/// so most of the knob travel sits in the audible low end.
#[derive(Default)]
pub struct LowpassFilter {
    y: f32,
}

fn cutoff_alpha(cv: f32, sample_rate: f32) -> f32 {
    let norm = (clamp(0.0, 10.0, cv) / 10.0).powi(4);
    let hz = norm * sample_rate / 2.0;
    let omega = 2.0 * PI * hz / sample_rate;
    omega / (omega + 1.0)
}

impl Processor for LowpassFilter {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let alpha = if frame.is_connected(CUTOFF_IN) {
            cutoff_alpha(frame.input(CUTOFF_IN), frame.sample_rate())
        } else {
            clamp(0.0, 1.0, frame.param(ALPHA))
        };
        self.y = alpha * frame.input(INPUT) + (1.0 - alpha) * self.y;
        frame.set_output(0, self.y);
    }

    fn reset(&mut self) {
        self.y = 0.0;
    }
}

impl Module for LowpassFilter {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("LOWPASS_FILTER", "6dB/octave one-pole lowpass")
            .input("INPUT", "signal input")
            .input("CUTOFF", "cutoff CV (0-10V)")
            .output("OUT", "filtered signal")
            .param("ALPHA", "smoothing coefficient when CUTOFF is unpatched", 0.1)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}
