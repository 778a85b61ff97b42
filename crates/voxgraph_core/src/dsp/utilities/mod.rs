use anyhow::{Result, anyhow, bail};

use crate::patch::NodeConfig;
use crate::registry::{ConstructorMap, Module};
use crate::types::NodeSchema;

pub mod clock;
pub mod clock_divider;
pub mod quantizer;
pub mod sample_and_hold;
pub mod sequencer;
pub mod table_lookup;

/// Level written while a trigger output is high.
pub const TRIGGER_VOLTAGE: f32 = 5.0;

/// Read a required non-empty array of numbers from the module's data blob.
pub(crate) fn voltage_list(config: &NodeConfig, field: &str) -> Result<Vec<f32>> {
    let values = config
        .data_field(field)
        .ok_or_else(|| anyhow!("data.{field} is required"))?
        .as_array()
        .ok_or_else(|| anyhow!("data.{field} must be an array of numbers"))?;
    if values.is_empty() {
        bail!("data.{field} is empty");
    }
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| anyhow!("data.{field}[{i}] is not a number"))
        })
        .collect()
}

pub fn install_constructors(map: &mut ConstructorMap) {
    clock::Clock::install_constructor(map);
    clock_divider::ClockDivider::install_constructor(map);
    sequencer::VoltageSequencer::install_constructor(map);
    sample_and_hold::SampleAndHold::install_constructor(map);
    quantizer::ScaleQuantizer::install_constructor(map);
    table_lookup::TableLookup::install_constructor(map);
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        clock::Clock::get_schema(),
        clock_divider::ClockDivider::get_schema(),
        sequencer::VoltageSequencer::get_schema(),
        sample_and_hold::SampleAndHold::get_schema(),
        quantizer::ScaleQuantizer::get_schema(),
        table_lookup::TableLookup::get_schema(),
    ]
}
