//! Holds the currently loaded graph on behalf of the host.
//!
//! A failed load leaves the previous graph running. With no graph loaded the
//! engine produces silence.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::{BuildOptions, DEFAULT_SAMPLE_RATE, PatchBuilder};
use crate::diagnostics::{CollectingSink, Diagnostic};
use crate::error::Result;
use crate::graph::Graph;
use crate::registry::{NodeRegistry, default_registry};
use crate::types::HostInputs;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub strict_types: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            strict_types: false,
        }
    }
}

impl EngineConfig {
    /// Rejects a sample rate no patch could be built at.
    pub fn validate(&self) -> Result<()> {
        BuildOptions::from(*self).validate()
    }
}

impl From<EngineConfig> for BuildOptions {
    fn from(config: EngineConfig) -> Self {
        BuildOptions {
            strict_types: config.strict_types,
            sample_rate: config.sample_rate,
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    registry: &'static NodeRegistry,
    graph: Option<Graph>,
    diagnostics: Vec<Diagnostic>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, default_registry())
    }

    pub fn with_registry(config: EngineConfig, registry: &'static NodeRegistry) -> Self {
        Self {
            config,
            registry,
            graph: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn load_patch_str(&mut self, text: &str) -> Result<()> {
        self.load_with(|builder| builder.build_str(text))
    }

    pub fn load_patch(&mut self, root: &Value) -> Result<()> {
        self.load_with(|builder| builder.build(root))
    }

    fn load_with(
        &mut self,
        build: impl FnOnce(&mut PatchBuilder<'_>) -> Result<Graph>,
    ) -> Result<()> {
        let mut sink = CollectingSink::new();
        let result = {
            let mut builder =
                PatchBuilder::new(self.registry, &mut sink).options(self.config.into());
            build(&mut builder)
        };
        self.diagnostics = sink.into_diagnostics();

        match result {
            Ok(graph) => {
                self.graph = Some(graph);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    keeping_previous = self.graph.is_some(),
                    "patch load failed"
                );
                Err(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.graph.is_some()
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.graph.as_mut()
    }

    /// Diagnostics from the most recent load attempt.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn clear(&mut self) {
        self.graph = None;
    }

    /// One tick. 0.0 when no graph is loaded.
    pub fn process(&mut self, host: &HostInputs) -> f32 {
        match self.graph.as_mut() {
            Some(graph) => graph.process(host),
            None => 0.0,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
