use anyhow::Result;

use super::TRIGGER_VOLTAGE;
use crate::dsp::utils::EdgeDetector;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const TRIGGER_IN: usize = 0;
const RESET_IN: usize = 1;
const DIVISION: usize = 0;

/// Passes every DIVISION-th incoming pulse, starting with the first.
#[derive(Default)]
pub struct ClockDivider {
    counter: u32,
    open: bool,
    trigger: EdgeDetector,
    reset: EdgeDetector,
}

impl Processor for ClockDivider {
    fn process(&mut self, frame: &mut Frame<'_>) {
        if self.reset.rising(frame.input(RESET_IN)) {
            self.counter = 0;
        }

        let input = frame.input(TRIGGER_IN);
        if self.trigger.rising(input) {
            let division = frame.param(DIVISION).round().max(1.0) as u32;
            self.open = self.counter == 0;
            self.counter = (self.counter + 1) % division;
        }
        if input <= 0.0 {
            self.open = false;
        }

        frame.set_output(0, if self.open { TRIGGER_VOLTAGE } else { 0.0 });
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Module for ClockDivider {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("CLOCK_DIVIDER", "Integer clock divider")
            .input("TRIGGER", "incoming clock")
            .input("RESET", "rising edge restarts the count")
            .output("TRIGGER", "divided clock")
            .param("DIVISION", "pass one pulse out of this many", 2.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::test_support::*;

    /// Drive `pulses` pulses of two ticks high, two low and count the
    /// ones that came through.
    fn count_passed(divider: &mut ClockDivider, rig: &mut Rig, pulses: usize) -> usize {
        let mut passed = 0;
        for _ in 0..pulses {
            rig.patch(TRIGGER_IN, 5.0);
            let a = rig.tick(divider);
            let b = rig.tick(divider);
            assert_eq!(a, b, "output follows the whole pulse");
            if a > 0.0 {
                passed += 1;
            }
            rig.patch(TRIGGER_IN, 0.0);
            assert_eq!(rig.run(divider, 2), vec![0.0, 0.0]);
        }
        passed
    }

    #[test]
    fn divides_by_param() {
        let mut divider = ClockDivider::default();
        let mut rig = Rig::new(&ClockDivider::get_schema());
        assert_eq!(count_passed(&mut divider, &mut rig, 8), 4);

        let mut divider = ClockDivider::default();
        rig.params[DIVISION] = 3.0;
        assert_eq!(count_passed(&mut divider, &mut rig, 9), 3);
    }

    #[test]
    fn first_pulse_passes() {
        let mut divider = ClockDivider::default();
        let mut rig = Rig::new(&ClockDivider::get_schema());
        rig.patch(TRIGGER_IN, 5.0);
        assert_eq!(rig.tick(&mut divider), TRIGGER_VOLTAGE);
    }

    #[test]
    fn reset_restarts_count() {
        let mut divider = ClockDivider::default();
        let mut rig = Rig::new(&ClockDivider::get_schema());
        count_passed(&mut divider, &mut rig, 1);
        rig.patch(RESET_IN, 5.0);
        assert_eq!(count_passed(&mut divider, &mut rig, 1), 1);
    }

    #[test]
    fn zero_division_passes_everything() {
        let mut divider = ClockDivider::default();
        let mut rig = Rig::new(&ClockDivider::get_schema());
        rig.params[DIVISION] = 0.0;
        assert_eq!(count_passed(&mut divider, &mut rig, 5), 5);
    }
}
