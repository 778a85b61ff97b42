use anyhow::Result;

use super::voltage_list;
use crate::dsp::utils::EdgeDetector;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const STEP_IN: usize = 0;
const RESET_IN: usize = 1;

/// Steps through the voltages listed in `data.voltages`, advancing on each
/// rising STEP and wrapping at the end.
pub struct VoltageSequencer {
    voltages: Vec<f32>,
    position: usize,
    step: EdgeDetector,
    reset: EdgeDetector,
}

impl VoltageSequencer {
    pub fn new(voltages: Vec<f32>) -> Self {
        Self {
            voltages,
            position: 0,
            step: EdgeDetector::new(),
            reset: EdgeDetector::new(),
        }
    }
}

impl Processor for VoltageSequencer {
    fn process(&mut self, frame: &mut Frame<'_>) {
        if self.reset.rising(frame.input(RESET_IN)) {
            self.position = 0;
        } else if self.step.rising(frame.input(STEP_IN)) {
            self.position = (self.position + 1) % self.voltages.len().max(1);
        }
        let voltage = self.voltages.get(self.position).copied().unwrap_or(0.0);
        frame.set_output(0, voltage);
    }

    fn reset(&mut self) {
        self.position = 0;
        self.step = EdgeDetector::new();
        self.reset = EdgeDetector::new();
    }
}

impl Module for VoltageSequencer {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("VOLTAGE_SEQUENCER", "Step sequencer over a list of voltages")
            .input("STEP", "rising edge advances one step")
            .input("RESET", "rising edge returns to the first step")
            .output("VOLTAGE", "current step voltage")
    }

    fn construct(config: &NodeConfig) -> Result<Self> {
        Ok(Self::new(voltage_list(config, "voltages")?))
    }
}
