//! Patch graph engine core library
//!
//! This crate parses JSON patch descriptions into a graph of signal-processing
//! nodes, flattens macros, and evaluates the graph one sample at a time.
//! It is a pure library with no audio device or file I/O.

#[macro_use]
extern crate lazy_static;

pub mod builder;
pub mod diagnostics;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod graph;
pub mod node;
pub mod patch;
pub mod port;
pub mod registry;
pub mod types;

// Re-export commonly used items
pub use builder::{BuildOptions, PatchBuilder};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use engine::{Engine, EngineConfig};
pub use error::{BuildError, Result};
pub use graph::Graph;
pub use patch::{Connection, Endpoint, PatchJson, patch_json_schema};
pub use registry::{NodeRegistry, default_registry};
pub use types::{HostInputs, NodeSchema, ParamSchema, PortSchema};
