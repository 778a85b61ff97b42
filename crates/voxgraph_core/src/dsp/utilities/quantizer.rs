use anyhow::Result;

use crate::dsp::utils::clamp;
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const INPUT: usize = 0;
const SCALE: usize = 0;
const ROOT: usize = 1;

/// Semitone offsets from the root, indexed by the SCALE parameter.
const SCALES: [&[i32]; 6] = [
    &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    &[0, 2, 4, 5, 7, 9, 11],
    &[0, 2, 3, 5, 7, 8, 10],
    &[0, 2, 4, 7, 9],
    &[0, 3, 5, 7, 10],
    &[0, 2, 3, 5, 7, 9, 10],
];

/// Snap a semitone value (relative to the root) to the nearest scale degree.
/// Ties resolve downward.
fn snap(semitone: f32, scale: &[i32]) -> f32 {
    let octave = (semitone / 12.0).floor();
    let within = semitone - octave * 12.0;
    let mut best = 0.0_f32;
    let mut best_distance = f32::MAX;
    // the next octave's root closes the gap above the last degree
    for degree in scale.iter().map(|d| *d as f32).chain(std::iter::once(12.0)) {
        let distance = (within - degree).abs();
        if distance < best_distance {
            best = degree;
            best_distance = distance;
        }
    }
    octave * 12.0 + best
}

/// V/oct quantizer. The input is snapped to the nearest note of the chosen
/// scale, transposed by ROOT semitones.
#[derive(Default)]
pub struct ScaleQuantizer;

impl Processor for ScaleQuantizer {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let index = clamp(0.0, (SCALES.len() - 1) as f32, frame.param(SCALE).round()) as usize;
        let root = frame.param(ROOT).round();
        let semitone = frame.input(INPUT) * 12.0 - root;
        let snapped = snap(semitone, SCALES[index]) + root;
        frame.set_output(0, snapped / 12.0);
    }
}

impl Module for ScaleQuantizer {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("SCALE_QUANTIZER", "Snap V/oct to a musical scale")
            .input("INPUT", "pitch in V/oct")
            .output("OUT", "quantized pitch in V/oct")
            .param(
                "SCALE",
                "0 chromatic, 1 major, 2 minor, 3 pentatonic major, 4 pentatonic minor, 5 dorian",
                0.0,
            )
            .param("ROOT", "root note in semitones above C", 0.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::test_support::*;

    fn quantize(scale: f32, root: f32, voct: f32) -> f32 {
        let mut rig = Rig::new(&ScaleQuantizer::get_schema());
        rig.params = vec![scale, root];
        rig.patch(INPUT, voct);
        rig.tick(&mut ScaleQuantizer)
    }

    fn assert_semitones(actual_voct: f32, semitones: f32) {
        assert!(
            (actual_voct * 12.0 - semitones).abs() < 1e-4,
            "got {} semitones, expected {semitones}",
            actual_voct * 12.0
        );
    }

    #[test]
    fn chromatic_rounds_to_nearest_semitone() {
        assert_semitones(quantize(0.0, 0.0, 1.4 / 12.0), 1.0);
        assert_semitones(quantize(0.0, 0.0, 1.6 / 12.0), 2.0);
        assert_semitones(quantize(0.0, 0.0, -0.3 / 12.0), 0.0);
    }

    #[test]
    fn major_skips_accidentals() {
        // C# -> C, F# -> F (ties go down), B stays B, B+0.6 -> next C
        assert_semitones(quantize(1.0, 0.0, 1.0 / 12.0), 0.0);
        assert_semitones(quantize(1.0, 0.0, 6.0 / 12.0), 5.0);
        assert_semitones(quantize(1.0, 0.0, 11.0 / 12.0), 11.0);
        assert_semitones(quantize(1.0, 0.0, 11.6 / 12.0), 12.0);
    }

    #[test]
    fn root_transposes_the_scale() {
        // D minor pentatonic: D F G A C
        assert_semitones(quantize(4.0, 2.0, 3.0 / 12.0), 2.0);
        assert_semitones(quantize(4.0, 2.0, 4.6 / 12.0), 5.0);
        assert_semitones(quantize(4.0, 2.0, 1.0 / 12.0), 0.0);
    }

    #[test]
    fn negative_octaves() {
        assert_semitones(quantize(1.0, 0.0, -1.0 - 1.0 / 12.0), -13.0);
    }

    #[test]
    fn scale_index_is_clamped() {
        assert_semitones(quantize(99.0, 0.0, 1.0 / 12.0), 0.0);
    }
}
