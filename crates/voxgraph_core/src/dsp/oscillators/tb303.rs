use anyhow::Result;

use crate::dsp::utils::{advance_phase, poly_blep, voct_to_hz};
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const FREQUENCY_IN: usize = 0;
const FREQUENCY: usize = 0;
const WAVEFORM: usize = 1;

/// Band-limited saw or square in the style of the TB-303. The square is
/// derived from the saw the way the original circuit does, so it keeps a
/// slight tilt.
#[derive(Default)]
pub struct Tb303Oscillator {
    phase: f32,
    tilt: f32,
}

impl Processor for Tb303Oscillator {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let hz = voct_to_hz(frame.param(FREQUENCY) + frame.input(FREQUENCY_IN));
        let dt = (hz / frame.sample_rate()).min(0.5);
        let phase = self.phase;

        let saw = 1.0 - 2.0 * phase + poly_blep(phase, dt);
        let out = if frame.param(WAVEFORM) < 0.5 {
            saw
        } else {
            let mut square = if phase < 0.5 { 1.0 } else { -1.0 };
            square += poly_blep(phase, dt);
            square -= poly_blep((phase + 0.5) % 1.0, dt);
            self.tilt += (saw - self.tilt) * 0.002;
            square + self.tilt * 0.1
        };
        frame.set_output(0, out * 5.0);

        advance_phase(&mut self.phase, dt);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Module for Tb303Oscillator {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("TB303_OSCILLATOR", "Bass-line oscillator, saw or square")
            .input("FREQUENCY", "pitch in V/oct")
            .output("OUT", "oscillator output")
            .param("FREQUENCY", "base pitch in V/oct (0 = C4)", -2.0)
            .param("WAVEFORM", "below 0.5 saw, otherwise square", 0.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::Port;
    use crate::types::HostInputs;

    fn render(waveform: f32, n: usize) -> Vec<f32> {
        let mut osc = Tb303Oscillator::default();
        let inputs = [Port::new()];
        let host = HostInputs::default();
        (0..n)
            .map(|_| {
                let mut outputs = [Port::new()];
                let params = [-2.0, waveform];
                let mut frame = Frame::new(48000.0, &host, &inputs, &params, &mut outputs);
                osc.process(&mut frame);
                outputs[0].value()
            })
            .collect()
    }

    #[test]
    fn saw_falls() {
        let saw = render(0.0, 100);
        assert!(saw[10] > saw[50], "saw should fall: {} vs {}", saw[10], saw[50]);
    }

    #[test]
    fn square_spends_half_the_time_high() {
        // C2 is ~65.4 Hz, so 48000 samples hold ~65 cycles
        let square = render(1.0, 48000);
        let high = square.iter().filter(|v| **v > 0.0).count() as f32 / 48000.0;
        assert!((high - 0.5).abs() < 0.02, "duty {high}");
    }
}
