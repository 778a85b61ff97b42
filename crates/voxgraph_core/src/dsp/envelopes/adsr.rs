use anyhow::Result;

use super::{MIN_STAGE_TIME, PEAK_VOLTAGE};
use crate::dsp::utils::clamp;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const GATE_IN: usize = 0;

const ATTACK: usize = 0;
const DECAY: usize = 1;
const SUSTAIN: usize = 2;
const RELEASE: usize = 3;

#[derive(Clone, Copy, PartialEq, Default, Debug)]
enum Stage {
    #[default]
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Gate-driven attack-decay-sustain-release envelope. SUSTAIN is a fraction
/// of the peak (0..1); times are in seconds.
#[derive(Default)]
pub struct Adsr {
    stage: Stage,
    level: f32,
    gate: bool,
}

impl Processor for Adsr {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let gate = frame.input(GATE_IN) > 0.0;
        if gate && !self.gate {
            self.stage = Stage::Attack;
        } else if !gate && self.gate {
            self.stage = Stage::Release;
        }
        self.gate = gate;

        let sample_rate = frame.sample_rate();
        let sustain = clamp(0.0, 1.0, frame.param(SUSTAIN));

        match self.stage {
            Stage::Idle => self.level = 0.0,
            Stage::Attack => {
                let attack = frame.param(ATTACK);
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
                let decay = frame.param(DECAY);
                if decay < MIN_STAGE_TIME {
                    self.level = sustain;
                } else {
                    self.level -= (1.0 - sustain) / (decay * sample_rate);
                }
                if self.level <= sustain {
                    self.level = sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => self.level = sustain,
            Stage::Release => {
                let release = frame.param(RELEASE);
                if release < MIN_STAGE_TIME {
                    self.level = 0.0;
                } else {
                    // linear from wherever the gate dropped
                    self.level -= 1.0 / (release * sample_rate);
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

impl Module for Adsr {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("ADSR", "Attack-decay-sustain-release envelope")
            .input("GATE", "high opens the envelope, low releases it")
            .output("ENVELOPE", "envelope (0-10V)")
            .param("ATTACK", "attack time in seconds", 0.01)
            .param("DECAY", "decay time in seconds", 0.1)
            .param("SUSTAIN", "sustain level (0-1)", 0.7)
            .param("RELEASE", "release time in seconds", 0.3)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::test_support::*;

    fn rig() -> Rig {
        let mut rig = Rig::new(&Adsr::get_schema());
        // 1 ms attack, 1 ms decay, 0.5 sustain, 2 ms release
        rig.params = vec![0.001, 0.001, 0.5, 0.002];
        rig
    }

    #[test]
    fn walks_through_all_stages() {
        let mut adsr = Adsr::default();
        let mut rig = rig();

        rig.patch(GATE_IN, 5.0);
        let held = rig.run(&mut adsr, 500);
        assert!(held.iter().any(|v| *v == PEAK_VOLTAGE), "attack reaches peak");
        assert_eq!(*held.last().unwrap(), 5.0, "sustains at half");

        rig.patch(GATE_IN, 0.0);
        let released = rig.run(&mut adsr, 200);
        assert!(released[0] < 5.0);
        assert_eq!(*released.last().unwrap(), 0.0);
    }

    #[test]
    fn release_during_attack_falls_from_current_level() {
        let mut adsr = Adsr::default();
        let mut rig = rig();
        rig.patch(GATE_IN, 5.0);
        let rising = rig.run(&mut adsr, 10);
        let level = *rising.last().unwrap();
        assert!(level > 0.0 && level < PEAK_VOLTAGE);

        rig.patch(GATE_IN, 0.0);
        assert!(rig.tick(&mut adsr) < level);
    }

    #[test]
    fn regate_restarts_attack() {
        let mut adsr = Adsr::default();
        let mut rig = rig();
        rig.patch(GATE_IN, 5.0);
        rig.run(&mut adsr, 500);
        rig.patch(GATE_IN, 0.0);
        rig.run(&mut adsr, 20);
        rig.patch(GATE_IN, 5.0);
        let out = rig.run(&mut adsr, 100);
        assert!(out.iter().any(|v| *v == PEAK_VOLTAGE));
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut adsr = Adsr::default();
        let mut rig = rig();
        rig.patch(GATE_IN, 5.0);
        rig.run(&mut adsr, 500);
        adsr.reset();
        assert_eq!(adsr.stage, Stage::Idle);
        assert_eq!(adsr.level, 0.0);
    }
}
