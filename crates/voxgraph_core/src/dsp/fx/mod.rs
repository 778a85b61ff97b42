use crate::registry::{ConstructorMap, Module};
use crate::types::NodeSchema;

pub mod delay;
pub mod distortion;
pub mod reverb;

use delay::{Delay, DelayLine};
use distortion::{Distortion, Fuzz, Overdrive, WaveFolder, WaveShaper};
use reverb::SchroederReverb;

pub fn install_constructors(map: &mut ConstructorMap) {
    Overdrive::install_constructor(map);
    Fuzz::install_constructor(map);
    Distortion::install_constructor(map);
    WaveFolder::install_constructor(map);
    WaveShaper::install_constructor(map);
    SchroederReverb::install_constructor(map);
    Delay::install_constructor(map);
    DelayLine::install_constructor(map);
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        Overdrive::get_schema(),
        Fuzz::get_schema(),
        Distortion::get_schema(),
        WaveFolder::get_schema(),
        WaveShaper::get_schema(),
        SchroederReverb::get_schema(),
        Delay::get_schema(),
        DelayLine::get_schema(),
    ]
}
