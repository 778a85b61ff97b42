use anyhow::Result;

use crate::dsp::utils::{clamp, cv_to_cutoff_hz};
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::{Clickless, NodeSchema};

const INPUT: usize = 0;
const CUTOFF_IN: usize = 1;
const RESONANCE_IN: usize = 2;

const CUTOFF: usize = 0;
const RESONANCE: usize = 1;

/// Four cascaded one-pole stages with global feedback (24dB/octave).
/// Resonance near 10 self-oscillates.
#[derive(Default)]
pub struct MoogLowpassFilter {
    stage: [f32; 4],
    delay: [f32; 4],
    cutoff: Clickless,
    resonance: Clickless,
}

impl Processor for MoogLowpassFilter {
    fn process(&mut self, frame: &mut Frame<'_>) {
        self.cutoff.update(frame.input_or_param(CUTOFF_IN, CUTOFF));
        self.resonance
            .update(clamp(0.0, 10.0, frame.input_or_param(RESONANCE_IN, RESONANCE)));

        let sample_rate = frame.sample_rate();
        let fc = (cv_to_cutoff_hz(*self.cutoff) / sample_rate).min(0.45);
        let f = fc * 1.16;
        let feedback = *self.resonance / 2.5 * (1.0 - 0.15 * f * f);

        let mut x = frame.input(INPUT) / 5.0 - self.stage[3] * feedback;
        x *= 0.35013 * f * f * f * f;
        for i in 0..4 {
            let y = x + 0.3 * self.delay[i] + (1.0 - f) * self.stage[i];
            self.delay[i] = x;
            self.stage[i] = y.clamp(-4.0, 4.0);
            x = self.stage[i];
        }

        frame.set_output(0, self.stage[3] * 5.0);
    }

    fn reset(&mut self) {
        self.stage = [0.0; 4];
        self.delay = [0.0; 4];
    }
}

impl Module for MoogLowpassFilter {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("MOOG_LOWPASS_FILTER", "24dB/octave ladder lowpass")
            .input("INPUT", "signal input")
            .input("CUTOFF", "cutoff CV (0-10V)")
            .input("RESONANCE", "resonance CV (0-10V)")
            .output("OUT", "filtered signal")
            .param("CUTOFF", "cutoff when CUTOFF is unpatched", 5.0)
            .param("RESONANCE", "resonance when RESONANCE is unpatched", 0.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            cutoff: Clickless::from(5.0),
            ..Self::default()
        })
    }
}
