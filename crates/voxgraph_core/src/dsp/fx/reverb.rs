use anyhow::Result;

use super::delay::DelayBuffer;
use crate::dsp::utils::clamp;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const AUDIO: usize = 0;

const ROOM: usize = 0;
const DAMP: usize = 1;
const MIX: usize = 2;

/// Comb and allpass lengths in samples at 44.1kHz, scaled to the running rate.
const COMB_TUNING: [usize; 4] = [1116, 1188, 1277, 1356];
const ALLPASS_TUNING: [usize; 2] = [556, 441];
const TUNING_RATE: f32 = 44100.0;
const ALLPASS_GAIN: f32 = 0.5;

/// Longest tuning at the highest supported rate, with headroom.
const MAX_TUNING_SECONDS: f32 = 0.05;

#[derive(Default)]
struct Comb {
    buffer: DelayBuffer,
    length: usize,
    filtered: f32,
}

impl Comb {
    fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let out = self.buffer.read(self.length);
        self.filtered = out * (1.0 - damp) + self.filtered * damp;
        self.buffer.push(input + self.filtered * feedback);
        out
    }
}

#[derive(Default)]
struct Allpass {
    buffer: DelayBuffer,
    length: usize,
}

impl Allpass {
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer.read(self.length);
        let out = delayed - input;
        self.buffer.push(input + delayed * ALLPASS_GAIN);
        out
    }
}

/// Schroeder reverberator: four parallel damped combs into two series
/// allpasses.
pub struct SchroederReverb {
    combs: [Comb; 4],
    allpasses: [Allpass; 2],
    sample_rate: f32,
}

impl SchroederReverb {
    fn tune(&mut self, sample_rate: f32) {
        if self.sample_rate == sample_rate {
            return;
        }
        let scale = sample_rate / TUNING_RATE;
        for (comb, tuning) in self.combs.iter_mut().zip(COMB_TUNING) {
            comb.buffer.at_rate(sample_rate);
            comb.length = ((tuning as f32 * scale) as usize).max(1);
        }
        for (allpass, tuning) in self.allpasses.iter_mut().zip(ALLPASS_TUNING) {
            allpass.buffer.at_rate(sample_rate);
            allpass.length = ((tuning as f32 * scale) as usize).max(1);
        }
        self.sample_rate = sample_rate;
    }
}

impl Processor for SchroederReverb {
    fn process(&mut self, frame: &mut Frame<'_>) {
        self.tune(frame.sample_rate());

        let feedback = clamp(0.0, 1.0, frame.param(ROOM)) * 0.28 + 0.7;
        let damp = clamp(0.0, 1.0, frame.param(DAMP)) * 0.4;
        let mix = clamp(0.0, 1.0, frame.param(MIX));

        let dry = frame.input(AUDIO);
        let input = dry * 0.015;
        let mut wet: f32 = self
            .combs
            .iter_mut()
            .map(|comb| comb.process(input, feedback, damp))
            .sum();
        for allpass in self.allpasses.iter_mut() {
            wet = allpass.process(wet);
        }
        // bring the wet level back to roughly unity
        wet *= 3.0 / 0.015 / 4.0;

        frame.set_output(0, clamp(-10.0, 10.0, dry * (1.0 - mix) + wet * mix));
    }

    fn reset(&mut self) {
        for comb in self.combs.iter_mut() {
            comb.buffer.clear();
            comb.filtered = 0.0;
        }
        for allpass in self.allpasses.iter_mut() {
            allpass.buffer.clear();
        }
    }
}

impl Module for SchroederReverb {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("SCHROEDER_REVERB", "Schroeder comb/allpass reverb")
            .input("AUDIO", "signal input")
            .output("OUT", "dry/wet mix")
            .param("ROOM", "room size (0-1)", 0.8)
            .param("DAMP", "high frequency damping (0-1)", 0.2)
            .param("MIX", "0 dry, 1 wet", 0.3)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            combs: std::array::from_fn(|_| Comb {
                buffer: DelayBuffer::new(MAX_TUNING_SECONDS),
                ..Comb::default()
            }),
            allpasses: std::array::from_fn(|_| Allpass {
                buffer: DelayBuffer::new(MAX_TUNING_SECONDS),
                ..Allpass::default()
            }),
            sample_rate: 0.0,
        })
    }
}
