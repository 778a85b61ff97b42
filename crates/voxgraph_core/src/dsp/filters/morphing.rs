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
const MORPH_IN: usize = 3;

const CUTOFF: usize = 0;
const RESONANCE: usize = 1;
const MORPH: usize = 2;

/// State-variable filter whose output sweeps lowpass → bandpass → highpass
/// as MORPH goes 0 → 5 → 10 V.
#[derive(Default)]
pub struct MorphingFilter {
    low: f32,
    band: f32,
    cutoff: Clickless,
    resonance: Clickless,
}

impl Processor for MorphingFilter {
    fn process(&mut self, frame: &mut Frame<'_>) {
        self.cutoff.update(frame.input_or_param(CUTOFF_IN, CUTOFF));
        self.resonance
            .update(clamp(0.0, 10.0, frame.input_or_param(RESONANCE_IN, RESONANCE)));
        let morph = clamp(0.0, 10.0, frame.input_or_param(MORPH_IN, MORPH)) / 5.0;

        let sample_rate = frame.sample_rate();
        // Chamberlin topology is only stable up to about sr/6.
        let hz = cv_to_cutoff_hz(*self.cutoff).min(sample_rate / 6.0);
        let f = 2.0 * (PI * hz / sample_rate).sin();
        let q = (1.0 - *self.resonance / 10.0 * 0.95).max(0.05);

        let input = frame.input(INPUT);
        let high = input - self.low - q * self.band;
        self.band += f * high;
        self.low += f * self.band;

        let out = if morph < 1.0 {
            self.low + (self.band - self.low) * morph
        } else {
            self.band + (high - self.band) * (morph - 1.0)
        };
        frame.set_output(0, out.clamp(-10.0, 10.0));
    }

    fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }
}

impl Module for MorphingFilter {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("MORPHING_FILTER", "State-variable filter morphing LP/BP/HP")
            .input("INPUT", "signal input")
            .input("CUTOFF", "cutoff CV (0-10V)")
            .input("RESONANCE", "resonance CV (0-10V)")
            .input("MORPH", "response: 0 lowpass, 5 bandpass, 10 highpass")
            .output("OUT", "filtered signal")
            .param("CUTOFF", "cutoff when CUTOFF is unpatched", 5.0)
            .param("RESONANCE", "resonance when RESONANCE is unpatched", 0.0)
            .param("MORPH", "response when MORPH is unpatched", 0.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            cutoff: Clickless::from(5.0),
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::filters::test_support::*;

    fn render(morph: f32, hz: f32) -> f32 {
        let mut filter =
            MorphingFilter::construct(&NodeConfig::new("f", "MORPHING_FILTER")).unwrap();
        settled_peak(&run_filter(&mut filter, 4, &[], &[5.0, 0.0, morph], sine(hz, 9600)))
    }

    #[test]
    fn lowpass_end_keeps_lows() {
        assert!(render(0.0, 60.0) > 3.5);
        assert!(render(0.0, 7000.0) < 0.5);
    }

    #[test]
    fn highpass_end_keeps_highs() {
        assert!(render(10.0, 60.0) < 0.5);
        assert!(render(10.0, 7000.0) > 3.5);
    }

    #[test]
    fn bandpass_middle_rejects_both_ends() {
        let centre = render(5.0, 632.0);
        assert!(centre > render(5.0, 40.0) * 3.0);
        assert!(centre > render(5.0, 8000.0) * 3.0);
    }
}
