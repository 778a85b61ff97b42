use anyhow::Result;

use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

/// `N` inputs, each scaled by its own gain, summed.
#[derive(Default)]
pub struct Mixer<const N: usize>;

impl<const N: usize> Processor for Mixer<N> {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let sum: f32 = (0..N).map(|i| frame.input(i) * frame.param(i)).sum();
        frame.set_output(0, sum);
    }
}

impl<const N: usize> Module for Mixer<N> {
    fn get_schema() -> NodeSchema {
        let mut schema = NodeSchema::new(format!("MIXER{N}"), format!("{N}-input mixer"));
        for i in 1..=N {
            schema = schema.input(format!("IN{i}"), format!("input {i}"));
        }
        for i in 1..=N {
            schema = schema.param(format!("GAIN{i}"), format!("gain for input {i}"), 1.0);
        }
        schema.output("OUT", "mixed signal")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}
