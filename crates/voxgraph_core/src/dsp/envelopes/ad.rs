use anyhow::Result;

use super::{MIN_STAGE_TIME, PEAK_VOLTAGE};
use crate::dsp::utils::EdgeDetector;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const TRIGGER_IN: usize = 0;
const ATTACK_IN: usize = 1;
const DECAY_IN: usize = 2;

const ATTACK: usize = 0;
const DECAY: usize = 1;

#[derive(Clone, Copy, PartialEq, Default, Debug)]
enum Stage {
    #[default]
    Idle,
    Attack,
    Decay,
}

/// Attack-decay envelope. A rising TRIGGER ramps linearly from the current
/// level to the peak, then back down to zero. Retriggering mid-decay
/// restarts the attack without jumping.
#[derive(Default)]
pub struct Ad {
    stage: Stage,
    level: f32,
    trigger: EdgeDetector,
}

impl Processor for Ad {
    fn process(&mut self, frame: &mut Frame<'_>) {
        if self.trigger.rising(frame.input(TRIGGER_IN)) {
            self.stage = Stage::Attack;
        }

        let sample_rate = frame.sample_rate();
        match self.stage {
            Stage::Idle => self.level = 0.0,
            Stage::Attack => {
                let attack = frame.input_or_param(ATTACK_IN, ATTACK);
                if attack < MIN_STAGE_TIME {
                    self.level = 1.0;
                } else {
                    self.level += 1.0 / (attack * sample_rate);
                }
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                let decay = frame.input_or_param(DECAY_IN, DECAY);
                if decay < MIN_STAGE_TIME {
                    self.level = 0.0;
                } else {
                    self.level -= 1.0 / (decay * sample_rate);
                }
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }

        frame.set_output(0, self.level * PEAK_VOLTAGE);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Module for Ad {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("AD", "Attack-decay envelope")
            .input("TRIGGER", "rising edge starts the envelope")
            .input("ATTACK", "attack time in seconds")
            .input("DECAY", "decay time in seconds")
            .output("ENVELOPE", "envelope (0-10V)")
            .param("ATTACK", "attack time in seconds", 0.01)
            .param("DECAY", "decay time in seconds", 0.3)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}
