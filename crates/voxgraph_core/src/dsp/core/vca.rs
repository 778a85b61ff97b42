//! Voltage-controlled amplifiers.
//!
//! Both take AUDIO and a GAIN CV. With GAIN unpatched the GAIN parameter
//! sets a static level where 10 is unity.

use anyhow::Result;

use crate::dsp::utils::clamp;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::{Clickless, NodeSchema};

const AUDIO: usize = 0;
const GAIN_CV: usize = 1;
const GAIN: usize = 0;

fn vca_schema(name: &str, description: &str, cv: &str) -> NodeSchema {
    NodeSchema::new(name, description)
        .input("AUDIO", "signal input")
        .input("GAIN", cv)
        .output("OUT", "amplified signal")
        .param("GAIN", "static level when GAIN is unpatched (10 = unity)", 10.0)
}

/// Gain CV 0..10 V maps linearly onto 0..1.
pub struct LinearVca {
    gain: Clickless,
}

impl Processor for LinearVca {
    fn process(&mut self, frame: &mut Frame<'_>) {
        self.gain
            .update(clamp(0.0, 10.0, frame.input_or_param(GAIN_CV, GAIN)) / 10.0);
        let out = frame.input(AUDIO) * *self.gain;
        frame.set_output(0, out);
    }

    fn reset(&mut self) {
        self.gain = Clickless::from(1.0);
    }
}

impl Module for LinearVca {
    fn get_schema() -> NodeSchema {
        vca_schema("LINEAR_VCA", "Linear VCA", "gain CV (0-10V)")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            gain: Clickless::from(1.0),
        })
    }
}

/// Gain CV is read in decibels/2: 10^(cv/20), cv clamped to ±10 V. The
/// unpatched GAIN param is clamped to ±10 and scaled linearly.
#[derive(Default)]
pub struct ExponentialVca;

impl Processor for ExponentialVca {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let gain = if frame.is_connected(GAIN_CV) {
            10.0_f32.powf(clamp(-10.0, 10.0, frame.input(GAIN_CV)) / 20.0)
        } else {
            clamp(-10.0, 10.0, frame.param(GAIN)) / 10.0
        };
        let out = frame.input(AUDIO) * gain;
        frame.set_output(0, out);
    }
}

impl Module for ExponentialVca {
    fn get_schema() -> NodeSchema {
        vca_schema("EXPONENTIAL_VCA", "Exponential VCA", "gain CV (-10..10V)")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}
