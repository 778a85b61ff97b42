use anyhow::Result;

use crate::dsp::utils::clamp;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

/// Routes one of `N` inputs to the output. The SELECT input (0..10 V) is
/// split into `N` equal bands; with nothing patched into it the SELECT
/// parameter picks the slot directly.
#[derive(Default)]
pub struct Selector<const N: usize>;

impl<const N: usize> Selector<N> {
    fn slot(frame: &Frame<'_>) -> usize {
        if frame.is_connected(N) {
            let position = clamp(0.0, 10.0, frame.input(N)) / 10.0;
            ((position * N as f32) as usize).min(N - 1)
        } else {
            (frame.param(0).round().max(0.0) as usize).min(N - 1)
        }
    }
}

impl<const N: usize> Processor for Selector<N> {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let value = frame.input(Self::slot(frame));
        frame.set_output(0, value);
    }
}

impl<const N: usize> Module for Selector<N> {
    fn get_schema() -> NodeSchema {
        let mut schema = NodeSchema::new(format!("SELECTOR{N}"), format!("{N}-way switch"));
        for i in 1..=N {
            schema = schema.input(format!("IN{i}"), format!("input {i}"));
        }
        schema
            .input("SELECT", "selection CV (0-10V)")
            .output("OUT", "selected input")
            .param("SELECT", "selected slot when SELECT is unpatched", 0.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}
