use anyhow::Result;

use super::voltage_list;
use crate::dsp::utils::lookup_linear;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const INPUT: usize = 0;

/// Transfer function read from `data.table`: INPUT 0..10 V sweeps the table
/// end to end with linear interpolation. Out-of-range input holds the ends.
pub struct TableLookup {
    table: Vec<f32>,
}

impl Processor for TableLookup {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let position = frame.input(INPUT) / 10.0;
        frame.set_output(0, lookup_linear(&self.table, position));
    }
}

impl Module for TableLookup {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("TABLE_LOOKUP", "Interpolated lookup table")
            .input("INPUT", "table position (0-10V)")
            .output("OUT", "interpolated table value")
    }

    fn construct(config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            table: voltage_list(config, "table")?,
        })
    }
}
