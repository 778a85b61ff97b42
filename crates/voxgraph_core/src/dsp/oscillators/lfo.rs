use anyhow::Result;

use crate::dsp::utils::{EdgeDetector, advance_phase, sine, triangle};
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const RATE_IN: usize = 0;
const RESET_IN: usize = 1;
const RATE: usize = 0;

/// Low-frequency oscillator. The RATE input is V/oct relative to the RATE
/// parameter, so +1 V doubles the rate.
#[derive(Default)]
pub struct Lfo {
    phase: f32,
    reset: EdgeDetector,
}

impl Processor for Lfo {
    fn process(&mut self, frame: &mut Frame<'_>) {
        if self.reset.rising(frame.input(RESET_IN)) {
            self.phase = 0.0;
        }
        let phase = self.phase;
        frame.set_output(0, sine(phase) * 5.0);
        frame.set_output(1, triangle(phase) * 5.0);
        frame.set_output(2, (phase * 2.0 - 1.0) * 5.0);
        frame.set_output(3, if phase < 0.5 { 5.0 } else { -5.0 });

        let hz = frame.param(RATE).max(0.0) * frame.input(RATE_IN).exp2();
        advance_phase(&mut self.phase, hz / frame.sample_rate());
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Module for Lfo {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("LFO", "Low-frequency oscillator")
            .input("RATE", "rate modulation in V/oct")
            .input("RESET", "rising edge restarts the cycle")
            .output("SINE", "sine (-5..5V)")
            .output("TRIANGLE", "triangle (-5..5V)")
            .output("SAW", "saw (-5..5V)")
            .output("SQUARE", "square (-5..5V)")
            .param("RATE", "rate in Hz", 1.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}
