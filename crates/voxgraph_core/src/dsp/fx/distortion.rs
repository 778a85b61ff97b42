//! Static waveshapers. Each takes AUDIO (±5 V) and one control (0-10 V,
//! the parameter of the same name when unpatched).

use std::f32::consts::{FRAC_PI_2, PI};

use anyhow::Result;

use crate::dsp::utils::clamp;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const AUDIO: usize = 0;
const CONTROL_IN: usize = 1;
const CONTROL: usize = 0;

macro_rules! shaper {
    (
        $name:ident, $tag:literal, $description:literal,
        $control:literal = $default:expr,
        |$x:ident, $amount:ident| $body:expr
    ) => {
        #[derive(Default)]
        pub struct $name;

        impl Processor for $name {
            fn process(&mut self, frame: &mut Frame<'_>) {
                let $x = frame.input(AUDIO) / 5.0;
                let $amount = clamp(0.0, 10.0, frame.input_or_param(CONTROL_IN, CONTROL));
                frame.set_output(0, 5.0 * $body);
            }
        }

        impl Module for $name {
            fn get_schema() -> NodeSchema {
                NodeSchema::new($tag, $description)
                    .input("AUDIO", "signal input")
                    .input($control, "amount CV (0-10V)")
                    .output("OUT", "shaped signal")
                    .param($control, "amount when unpatched (0-10)", $default)
            }

            fn construct(_config: &NodeConfig) -> Result<Self> {
                Ok(Self)
            }
        }
    };
}

shaper!(
    Overdrive, "OVERDRIVE", "tanh soft clipper",
    "DRIVE" = 2.0,
    |x, drive| (x * (1.0 + drive)).tanh()
);

shaper!(
    Fuzz, "FUZZ", "Asymmetric hard clipper",
    "DRIVE" = 5.0,
    |x, drive| clamp(-1.0, 0.6, x * (1.0 + 2.0 * drive))
);

shaper!(
    Distortion, "DISTORTION", "arctangent distortion",
    "DRIVE" = 2.0,
    |x, drive| (x * (1.0 + drive)).atan() / FRAC_PI_2
);

shaper!(
    WaveFolder, "WAVE_FOLDER", "Triangle wavefolder",
    "AMOUNT" = 1.0,
    |x, amount| fold(x * (1.0 + amount))
);

shaper!(
    WaveShaper, "WAVE_SHAPER", "Cubic to sine waveshaper",
    "SHAPE" = 0.0,
    |x, shape| {
        let mix = shape / 10.0;
        (1.0 - mix) * cubic(x) + mix * (1.5 * PI * x).sin()
    }
);

/// Reflect anything beyond ±1 back into range.
fn fold(x: f32) -> f32 {
    let t = (x + 1.0).rem_euclid(4.0);
    if t < 2.0 { t - 1.0 } else { 3.0 - t }
}

fn cubic(x: f32) -> f32 {
    let x = clamp(-1.0, 1.0, x);
    1.5 * x - 0.5 * x * x * x
}
