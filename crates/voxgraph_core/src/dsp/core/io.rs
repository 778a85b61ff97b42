//! Nodes that connect the graph to the host: host inputs in, the terminal
//! output, and the macro boundary adapters.

use anyhow::Result;

use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::{MACRO_INPUT_PORT, MACRO_OUTPUT_PORT, NodeSchema, OUTPUT};

/// The terminal node. Its single input is the graph's output; it has no
/// outputs and does no work.
#[derive(Default)]
pub struct Output;

impl Processor for Output {
    fn process(&mut self, _frame: &mut Frame<'_>) {}
}

impl Module for Output {
    fn get_schema() -> NodeSchema {
        NodeSchema::new(OUTPUT, "Patch output, read by the host every sample")
            .input("IN", "signal to send to the host")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}

#[derive(Default)]
pub struct PitchInput;

impl Processor for PitchInput {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let pitch = frame.host().pitch;
        frame.set_output(0, pitch);
    }
}

impl Module for PitchInput {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("PITCH_INPUT", "Host pitch in V/oct").output("OUT", "pitch")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}

#[derive(Default)]
pub struct GateInput;

impl Processor for GateInput {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let gate = frame.host().gate;
        frame.set_output(0, gate);
    }
}

impl Module for GateInput {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("GATE_INPUT", "Host gate").output("OUT", "gate")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}

/// Host parameter `N` (1-based, `PARAM1`..`PARAM8`).
#[derive(Default)]
pub struct ParamInput<const N: usize>;

impl<const N: usize> Processor for ParamInput<N> {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let value = frame.host().param(N - 1);
        frame.set_output(0, value);
    }
}

impl<const N: usize> Module for ParamInput<N> {
    fn get_schema() -> NodeSchema {
        NodeSchema::new(format!("PARAM{N}"), format!("Host parameter {N}"))
            .output("OUT", "parameter value")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}

/// Copies IN to OUT. Macro boundary adapters are removed while flattening,
/// so these only run when an adapter sits at the top level of a patch.
#[derive(Default)]
pub struct PassThrough;

impl Processor for PassThrough {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let value = frame.input(0);
        frame.set_output(0, value);
    }
}

#[derive(Default)]
pub struct MacroInputPort(PassThrough);

impl Processor for MacroInputPort {
    fn process(&mut self, frame: &mut Frame<'_>) {
        self.0.process(frame);
    }
}

impl Module for MacroInputPort {
    fn get_schema() -> NodeSchema {
        NodeSchema::new(MACRO_INPUT_PORT, "Macro input boundary")
            .input("IN", "signal from outside the macro")
            .output("OUT", "signal inside the macro")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}

#[derive(Default)]
pub struct MacroOutputPort(PassThrough);

impl Processor for MacroOutputPort {
    fn process(&mut self, frame: &mut Frame<'_>) {
        self.0.process(frame);
    }
}

impl Module for MacroOutputPort {
    fn get_schema() -> NodeSchema {
        NodeSchema::new(MACRO_OUTPUT_PORT, "Macro output boundary")
            .input("IN", "signal inside the macro")
            .output("OUT", "signal leaving the macro")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}
