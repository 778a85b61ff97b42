use std::f32::consts::PI;

use anyhow::Result;

use crate::dsp::utils::{clamp, cv_to_cutoff_hz};
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::{Clickless, NodeSchema};

const INPUT: usize = 0;
const CUTOFF_IN: usize = 1;
const RESONANCE_IN: usize = 2;
const ENV_MOD_IN: usize = 3;

const CUTOFF: usize = 0;
const RESONANCE: usize = 1;
const ENV_AMOUNT: usize = 2;

/// 24dB/octave lowpass with a saturating feedback path, in the style of the
/// TB-303 diode ladder.
#[derive(Default)]
pub struct Tb303Filter {
    z: [f32; 4],
    cutoff: Clickless,
    resonance: Clickless,
}

impl Processor for Tb303Filter {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let env = frame.input(ENV_MOD_IN) * frame.param(ENV_AMOUNT);
        self.cutoff.update(frame.input_or_param(CUTOFF_IN, CUTOFF) + env);
        self.resonance
            .update(clamp(0.0, 10.0, frame.input_or_param(RESONANCE_IN, RESONANCE)));

        let sample_rate = frame.sample_rate().max(1.0);
        let hz = cv_to_cutoff_hz(*self.cutoff).min(sample_rate * 0.45);
        let fc = (PI * hz / sample_rate).tan();
        let g = fc / (1.0 + fc);
        let feedback = *self.resonance / 10.0 * 4.0 + 0.1;

        let mut x = (frame.input(INPUT) / 5.0 - self.z[3] * feedback).tanh();
        for z in self.z.iter_mut() {
            *z += g * (x - *z);
            x = *z;
        }

        frame.set_output(0, (self.z[3] * 5.0).clamp(-5.0, 5.0));
    }

    fn reset(&mut self) {
        self.z = [0.0; 4];
    }
}

impl Module for Tb303Filter {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("TB303_FILTER", "Saturating 24dB/octave acid lowpass")
            .input("INPUT", "signal input")
            .input("CUTOFF", "cutoff CV (0-10V)")
            .input("RESONANCE", "resonance CV (0-10V)")
            .input("ENV_MOD", "envelope added to the cutoff CV")
            .output("OUT", "filtered signal")
            .param("CUTOFF", "cutoff when CUTOFF is unpatched", 5.0)
            .param("RESONANCE", "resonance when RESONANCE is unpatched", 0.0)
            .param("ENV_AMOUNT", "scale applied to ENV_MOD", 0.5)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            cutoff: Clickless::from(5.0),
            ..Self::default()
        })
    }
}
