use anyhow::Result;

use crate::dsp::utils::{EdgeDetector, advance_phase, voct_to_hz};
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const FREQUENCY_IN: usize = 0;
const RESET_IN: usize = 1;
const FREQUENCY: usize = 0;

/// Naive rising ramp from -5 V to 5 V. No band limiting, so it doubles as a
/// phase source for other modules.
#[derive(Default)]
pub struct RampOscillator {
    phase: f32,
    reset: EdgeDetector,
}

impl Processor for RampOscillator {
    fn process(&mut self, frame: &mut Frame<'_>) {
        if self.reset.rising(frame.input(RESET_IN)) {
            self.phase = 0.0;
        }
        frame.set_output(0, (self.phase * 2.0 - 1.0) * 5.0);

        let hz = voct_to_hz(frame.param(FREQUENCY) + frame.input(FREQUENCY_IN));
        advance_phase(&mut self.phase, hz / frame.sample_rate());
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Module for RampOscillator {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("RAMP_OSCILLATOR", "Rising ramp oscillator")
            .input("FREQUENCY", "pitch in V/oct")
            .input("RESET", "rising edge restarts the ramp")
            .output("OUT", "ramp (-5..5V)")
            .param("FREQUENCY", "base pitch in V/oct (0 = C4)", 0.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}
