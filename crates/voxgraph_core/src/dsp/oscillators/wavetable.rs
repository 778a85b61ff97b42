use anyhow::{Result, anyhow, bail};
use serde_json::Value;

use crate::dsp::utils::{advance_phase, clamp, sine, triangle, voct_to_hz};
use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

const FREQUENCY_IN: usize = 0;
const WAVE_IN: usize = 1;
const FREQUENCY: usize = 0;
const WAVE: usize = 1;

const TABLE_SIZE: usize = 256;

/// Scans across a bank of single-cycle tables. WAVE (0..10 V) crossfades
/// between neighbouring tables. Without `data.wavetables` the bank is
/// sine, triangle, saw, square.
pub struct WavetableOscillator {
    tables: Vec<Vec<f32>>,
    phase: f32,
}

fn builtin_tables() -> Vec<Vec<f32>> {
    let shape = |f: fn(f32) -> f32| -> Vec<f32> {
        (0..TABLE_SIZE)
            .map(|i| f(i as f32 / TABLE_SIZE as f32))
            .collect()
    };
    vec![
        shape(sine),
        shape(triangle),
        shape(|p| 2.0 * p - 1.0),
        shape(|p| if p < 0.5 { 1.0 } else { -1.0 }),
    ]
}

fn parse_tables(value: &Value) -> Result<Vec<Vec<f32>>> {
    let tables = value
        .as_array()
        .ok_or_else(|| anyhow!("wavetables must be an array of arrays"))?;
    if tables.is_empty() {
        bail!("wavetables is empty");
    }
    tables
        .iter()
        .enumerate()
        .map(|(t, table)| -> Result<Vec<f32>> {
            let samples = table
                .as_array()
                .ok_or_else(|| anyhow!("wavetable {t} is not an array"))?;
            if samples.is_empty() {
                bail!("wavetable {t} is empty");
            }
            samples
                .iter()
                .map(|v| {
                    v.as_f64()
                        .map(|v| v as f32)
                        .ok_or_else(|| anyhow!("wavetable {t} holds a non-number"))
                })
                .collect()
        })
        .collect()
}

/// Cyclic linear interpolation.
fn read_cyclic(table: &[f32], phase: f32) -> f32 {
    let x = phase * table.len() as f32;
    let i = (x as usize) % table.len();
    let j = (i + 1) % table.len();
    let frac = x - x.floor();
    table[i] + (table[j] - table[i]) * frac
}

impl Processor for WavetableOscillator {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let wave = clamp(0.0, 10.0, frame.input_or_param(WAVE_IN, WAVE)) / 10.0;
        let position = wave * (self.tables.len() - 1) as f32;
        let lower = position as usize;
        let upper = (lower + 1).min(self.tables.len() - 1);
        let blend = position - lower as f32;

        let a = read_cyclic(&self.tables[lower], self.phase);
        let b = read_cyclic(&self.tables[upper], self.phase);
        frame.set_output(0, (a + (b - a) * blend) * 5.0);

        let hz = voct_to_hz(frame.param(FREQUENCY) + frame.input(FREQUENCY_IN));
        advance_phase(&mut self.phase, hz / frame.sample_rate());
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Module for WavetableOscillator {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("WAVETABLE_OSCILLATOR", "Morphing wavetable oscillator")
            .input("FREQUENCY", "pitch in V/oct")
            .input("WAVE", "table position (0-10V)")
            .output("OUT", "oscillator output")
            .param("FREQUENCY", "base pitch in V/oct (0 = C4)", 0.0)
            .param("WAVE", "table position when WAVE is unpatched", 0.0)
    }

    fn construct(config: &NodeConfig) -> Result<Self> {
        let tables = match config.data_field("wavetables") {
            Some(value) => parse_tables(value)?,
            None => builtin_tables(),
        };
        Ok(Self { tables, phase: 0.0 })
    }
}
