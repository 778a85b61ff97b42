use std::ops::Deref;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Type tag of a module that embeds a nested patch.
pub const MACRO: &str = "MACRO";
/// Boundary adapter carrying a macro input into the subgraph.
pub const MACRO_INPUT_PORT: &str = "MACRO_INPUT_PORT";
/// Boundary adapter carrying a subgraph signal out of the macro.
pub const MACRO_OUTPUT_PORT: &str = "MACRO_OUTPUT_PORT";
/// The usual terminal node.
pub const OUTPUT: &str = "OUTPUT";

/// Number of generic host parameters (`PARAM1`..`PARAM8`).
pub const HOST_PARAM_COUNT: usize = 8;

/// Values supplied by the host on every tick. Read-only for the graph.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInputs {
    pub pitch: f32,
    pub gate: f32,
    pub params: [f32; HOST_PARAM_COUNT],
}

impl HostInputs {
    /// Host param by zero-based slot, 0.0 when out of range.
    pub fn param(&self, slot: usize) -> f32 {
        self.params.get(slot).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PortSchema {
    pub name: String,
    pub description: String,
}

impl PortSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParamSchema {
    pub name: String,
    pub description: String,
    pub default: f32,
}

impl ParamSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, default: f32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default,
        }
    }
}

/// Static description of a node type. Port and parameter order is the index
/// order used by connections and positional defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeSchema {
    pub name: String,
    pub description: String,
    pub inputs: Vec<PortSchema>,
    pub outputs: Vec<PortSchema>,
    pub params: Vec<ParamSchema>,
}

impl NodeSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn input(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.inputs.push(PortSchema::new(name, description));
        self
    }

    pub fn output(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.outputs.push(PortSchema::new(name, description));
        self
    }

    pub fn param(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        default: f32,
    ) -> Self {
        self.params.push(ParamSchema::new(name, description, default));
        self
    }

    /// Resolve a parameter key: exact name, then case-insensitive name, then
    /// a non-negative integer string as a positional slot.
    pub fn param_index(&self, key: &str) -> Option<usize> {
        if let Some(i) = self.params.iter().position(|p| p.name == key) {
            return Some(i);
        }
        if let Some(i) = self
            .params
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(key))
        {
            return Some(i);
        }
        key.parse::<usize>().ok().filter(|i| *i < self.params.len())
    }

    pub fn is_terminal(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// One-pole lowpass filter for parameter smoothing to prevent clicking
/// Coefficient of 0.99 gives roughly 5ms smoothing time at 48kHz
const SMOOTHING_COEFF: f32 = 0.99;

pub fn smooth_value(current: f32, target: f32) -> f32 {
    current * SMOOTHING_COEFF + target * (1.0 - SMOOTHING_COEFF)
}

/// A smoothed control value. Starts at its initial value and glides toward
/// each new target.
#[derive(Debug, Default, Clone, Copy)]
pub struct Clickless {
    value: f32,
}

impl Clickless {
    pub fn update(&mut self, input: f32) {
        self.value = smooth_value(self.value, input);
    }
}

impl From<f32> for Clickless {
    fn from(value: f32) -> Self {
        Clickless { value }
    }
}

impl Deref for Clickless {
    type Target = f32;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
