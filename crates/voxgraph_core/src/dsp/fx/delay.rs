use anyhow::Result;

use crate::dsp::utils::clamp;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const AUDIO: usize = 0;

/// Longest delay time in seconds.
pub const MAX_DELAY_SECONDS: f32 = 2.0;

/// Ring buffer of past samples. Storage is sized on first use from the
/// sample rate seen at process time, and resized if the rate changes.
#[derive(Default)]
pub struct DelayBuffer {
    samples: Vec<f32>,
    write: usize,
    sample_rate: f32,
    max_seconds: f32,
}

impl DelayBuffer {
    pub fn new(max_seconds: f32) -> Self {
        Self {
            max_seconds,
            ..Self::default()
        }
    }

    fn prepare(&mut self, sample_rate: f32) {
        if self.sample_rate != sample_rate || self.samples.is_empty() {
            let len = (self.max_seconds * sample_rate).ceil().max(1.0) as usize;
            self.samples = vec![0.0; len];
            self.write = 0;
            self.sample_rate = sample_rate;
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Sample written `delay` ticks ago; `delay` is clamped to the capacity.
    /// A delay of zero reads nothing and returns 0.
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.samples.len();
        if delay == 0 || len == 0 {
            return 0.0;
        }
        let delay = delay.min(len);
        self.samples[(self.write + len - delay) % len]
    }

    pub fn push(&mut self, sample: f32) {
        if self.samples.is_empty() {
            return;
        }
        self.samples[self.write] = sample;
        self.write = (self.write + 1) % self.samples.len();
    }

    /// Delay in whole samples for a time in seconds at the prepared rate.
    pub fn samples_for(&self, seconds: f32) -> usize {
        (clamp(0.0, self.max_seconds, seconds) * self.sample_rate).round() as usize
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.write = 0;
    }

    /// Size the buffer for `sample_rate` and return `self`.
    pub fn at_rate(&mut self, sample_rate: f32) -> &mut Self {
        self.prepare(sample_rate);
        self
    }
}

const TIME: usize = 0;
const FEEDBACK: usize = 1;
const MIX: usize = 2;

/// Feedback echo.
pub struct Delay {
    buffer: DelayBuffer,
}

impl Processor for Delay {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let buffer = self.buffer.at_rate(frame.sample_rate());
        let dry = frame.input(AUDIO);
        let delay = buffer.samples_for(frame.param(TIME));
        let feedback = clamp(0.0, 0.99, frame.param(FEEDBACK));
        let mix = clamp(0.0, 1.0, frame.param(MIX));

        let wet = if delay == 0 { dry } else { buffer.read(delay) };
        buffer.push(clamp(-100.0, 100.0, dry + wet * feedback));

        frame.set_output(0, dry * (1.0 - mix) + wet * mix);
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }
}

impl Module for Delay {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("DELAY", "Feedback delay, up to 2 seconds")
            .input("AUDIO", "signal input")
            .output("OUT", "dry/wet mix")
            .param("TIME", "delay time in seconds", 0.25)
            .param("FEEDBACK", "amount of the echo fed back (0-0.99)", 0.5)
            .param("MIX", "0 dry, 1 wet", 0.5)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            buffer: DelayBuffer::new(MAX_DELAY_SECONDS),
        })
    }
}

/// Plain delay line, wet signal only.
pub struct DelayLine {
    buffer: DelayBuffer,
}

impl Processor for DelayLine {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let buffer = self.buffer.at_rate(frame.sample_rate());
        let input = frame.input(AUDIO);
        let delay = buffer.samples_for(frame.param(TIME));
        let out = if delay == 0 { input } else { buffer.read(delay) };
        buffer.push(input);
        frame.set_output(0, out);
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }
}

impl Module for DelayLine {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("DELAY_LINE", "Delay line without feedback, up to 2 seconds")
            .input("AUDIO", "signal input")
            .output("OUT", "delayed signal")
            .param("TIME", "delay time in seconds", 0.1)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            buffer: DelayBuffer::new(MAX_DELAY_SECONDS),
        })
    }
}
