use anyhow::Result;

use super::TRIGGER_VOLTAGE;
use crate::dsp::utils::EdgeDetector;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const RESET_IN: usize = 0;
const BPM: usize = 0;

/// Trigger length in seconds.
const PULSE_WIDTH: f64 = 0.005;

/// Free-running tempo clock emitting one short trigger per beat. The first
/// beat fires on the first tick.
#[derive(Default)]
pub struct Clock {
    phase: f64,
    /// Seconds since the last beat, `None` before the first one.
    since_beat: Option<f64>,
    reset: EdgeDetector,
}

impl Processor for Clock {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let sample_rate = frame.sample_rate() as f64;
        if self.reset.rising(frame.input(RESET_IN)) {
            self.phase = 0.0;
            self.since_beat = None;
        }

        if self.since_beat.is_none() || self.phase >= 1.0 {
            self.phase -= self.phase.floor();
            self.since_beat = Some(0.0);
        }
        let since_beat = self.since_beat.unwrap_or_default();

        let high = since_beat < PULSE_WIDTH;
        frame.set_output(0, if high { TRIGGER_VOLTAGE } else { 0.0 });

        let beats_per_second = frame.param(BPM).max(0.0) as f64 / 60.0;
        self.phase += beats_per_second / sample_rate;
        self.since_beat = Some(since_beat + 1.0 / sample_rate);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Module for Clock {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("CLOCK", "Tempo clock emitting a trigger per beat")
            .input("RESET", "rising edge restarts on a beat")
            .output("TRIGGER", "5 ms trigger per beat")
            .param("BPM", "tempo in beats per minute", 120.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}
