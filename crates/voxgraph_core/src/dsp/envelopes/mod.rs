use crate::registry::{ConstructorMap, Module};
use crate::types::NodeSchema;

pub mod ad;
pub mod adsr;

/// Envelope output for a fully open envelope.
pub const PEAK_VOLTAGE: f32 = 10.0;

/// Shortest stage time in seconds. Shorter values jump straight to the target.
pub const MIN_STAGE_TIME: f32 = 0.0001;

pub fn install_constructors(map: &mut ConstructorMap) {
    ad::Ad::install_constructor(map);
    adsr::Adsr::install_constructor(map);
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![ad::Ad::get_schema(), adsr::Adsr::get_schema()]
}
