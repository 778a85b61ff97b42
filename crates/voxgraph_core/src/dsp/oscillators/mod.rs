use crate::registry::{ConstructorMap, Module};
use crate::types::NodeSchema;

pub mod lfo;
pub mod noise;
pub mod ramp;
pub mod tb303;
pub mod vco;
pub mod wavetable;

pub fn install_constructors(map: &mut ConstructorMap) {
    vco::Vco::install_constructor(map);
    ramp::RampOscillator::install_constructor(map);
    wavetable::WavetableOscillator::install_constructor(map);
    tb303::Tb303Oscillator::install_constructor(map);
    lfo::Lfo::install_constructor(map);
    noise::Noise::install_constructor(map);
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        vco::Vco::get_schema(),
        ramp::RampOscillator::get_schema(),
        wavetable::WavetableOscillator::get_schema(),
        tb303::Tb303Oscillator::get_schema(),
        lfo::Lfo::get_schema(),
        noise::Noise::get_schema(),
    ]
}
