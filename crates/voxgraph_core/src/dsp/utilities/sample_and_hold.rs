use anyhow::Result;

use crate::dsp::utils::EdgeDetector;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const INPUT: usize = 0;
const TRIGGER_IN: usize = 1;

/// Captures INPUT on each rising TRIGGER. The first tick captures
/// unconditionally.
#[derive(Default)]
pub struct SampleAndHold {
    held: f32,
    initialized: bool,
    trigger: EdgeDetector,
}

impl Processor for SampleAndHold {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let input = frame.input(INPUT);
        let fired = self.trigger.rising(frame.input(TRIGGER_IN));
        if !self.initialized || fired {
            self.held = input;
            self.initialized = true;
        }
        frame.set_output(0, self.held);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Module for SampleAndHold {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("SAMPLE_AND_HOLD", "Sample and hold")
            .input("INPUT", "signal to sample")
            .input("TRIGGER", "rising edge takes a sample")
            .output("OUT", "held value")
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::test_support::*;

    #[test]
    fn holds_between_triggers() {
        let mut sh = SampleAndHold::default();
        let mut rig = Rig::new(&SampleAndHold::get_schema());

        rig.patch(INPUT, 1.0);
        assert_eq!(rig.tick(&mut sh), 1.0);
        rig.patch(INPUT, 2.0);
        assert_eq!(rig.tick(&mut sh), 1.0);

        rig.patch(TRIGGER_IN, 5.0);
        assert_eq!(rig.tick(&mut sh), 2.0);
        rig.patch(INPUT, 3.0);
        assert_eq!(rig.tick(&mut sh), 2.0, "held trigger takes one sample");

        rig.patch(TRIGGER_IN, 0.0);
        rig.tick(&mut sh);
        rig.patch(TRIGGER_IN, 5.0);
        assert_eq!(rig.tick(&mut sh), 3.0);
    }
}
