use crate::registry::{ConstructorMap, Module};
use crate::types::NodeSchema;

pub mod lowpass;
pub mod moog;
pub mod morphing;
pub mod tb303;

pub fn install_constructors(map: &mut ConstructorMap) {
    lowpass::LowpassFilter::install_constructor(map);
    moog::MoogLowpassFilter::install_constructor(map);
    morphing::MorphingFilter::install_constructor(map);
    tb303::Tb303Filter::install_constructor(map);
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        lowpass::LowpassFilter::get_schema(),
        moog::MoogLowpassFilter::get_schema(),
        morphing::MorphingFilter::get_schema(),
        tb303::Tb303Filter::get_schema(),
    ]
}
