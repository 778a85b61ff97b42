use anyhow::Result;

use crate::dsp::utils::{EdgeDetector, advance_phase, clamp, poly_blep, sine, triangle, voct_to_hz};
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const FREQUENCY_IN: usize = 0;
const SYNC_IN: usize = 1;
const PULSE_WIDTH_IN: usize = 2;

const FREQUENCY: usize = 0;
const PULSE_WIDTH: usize = 1;

pub const SINE_OUT: usize = 0;
pub const SQUARE_OUT: usize = 1;
pub const SAW_OUT: usize = 2;
pub const TRIANGLE_OUT: usize = 3;

/// Multi-waveform oscillator. Pitch is the FREQUENCY parameter plus the
/// FREQUENCY input, both V/oct around C4. A rising edge on SYNC restarts
/// the cycle.
#[derive(Default)]
pub struct Vco {
    phase: f32,
    sync: EdgeDetector,
}

impl Processor for Vco {
    fn process(&mut self, frame: &mut Frame<'_>) {
        if self.sync.rising(frame.input(SYNC_IN)) {
            self.phase = 0.0;
        }

        let voct = frame.param(FREQUENCY) + frame.input(FREQUENCY_IN);
        let dt = (voct_to_hz(voct) / frame.sample_rate()).min(0.5);
        let pulse_width = if frame.is_connected(PULSE_WIDTH_IN) {
            frame.input(PULSE_WIDTH_IN) / 10.0
        } else {
            frame.param(PULSE_WIDTH)
        };
        let pulse_width = clamp(0.05, 0.95, pulse_width);

        let phase = self.phase;
        let saw = 2.0 * phase - 1.0 - poly_blep(phase, dt);
        let mut square = if phase < pulse_width { 1.0 } else { -1.0 };
        square += poly_blep(phase, dt);
        square -= poly_blep((phase - pulse_width + 1.0) % 1.0, dt);

        frame.set_output(SINE_OUT, sine(phase) * 5.0);
        frame.set_output(SQUARE_OUT, square * 5.0);
        frame.set_output(SAW_OUT, saw * 5.0);
        frame.set_output(TRIANGLE_OUT, triangle(phase) * 5.0);

        advance_phase(&mut self.phase, dt);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Module for Vco {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("VCO", "Voltage-controlled oscillator with hard sync")
            .input("FREQUENCY", "pitch in V/oct, added to the FREQUENCY parameter")
            .input("SYNC", "rising edge restarts the cycle")
            .input("PULSE_WIDTH", "square pulse width (0-10V)")
            .output("SINE", "sine output")
            .output("SQUARE", "square output")
            .output("SAW", "saw output")
            .output("TRIANGLE", "triangle output")
            .param("FREQUENCY", "base pitch in V/oct (0 = C4)", 0.0)
            .param("PULSE_WIDTH", "square pulse width when PULSE_WIDTH is unpatched", 0.5)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}
