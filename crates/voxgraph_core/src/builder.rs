//! Patch JSON → live [`Graph`].
//!
//! Build steps: parse and flatten macros, instantiate every module through the
//! registry, apply `defaults`, wire ports, resolve the single terminal node.
//! Recoverable problems go to the [`DiagnosticSink`]; only connectivity and
//! terminal failures (and unknown types in strict mode) abort the build, in
//! which case no graph is returned at all.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::{BuildError, Result};
use crate::graph::Graph;
use crate::node::Node;
use crate::patch::{Connection, PatchConfig, parse_patch};
use crate::port::PortRef;
use crate::registry::NodeRegistry;

pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
/// Highest accepted rate; delay buffers are sized from it.
pub const MAX_SAMPLE_RATE: f32 = 768_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Fail on an unknown type tag instead of omitting the module.
    pub strict_types: bool,
    pub sample_rate: f32,
}

impl BuildOptions {
    pub fn validate(&self) -> Result<()> {
        let sr = self.sample_rate;
        if sr.is_finite() && sr > 0.0 && sr <= MAX_SAMPLE_RATE {
            Ok(())
        } else {
            Err(BuildError::InvalidSampleRate(sr))
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strict_types: false,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

pub struct PatchBuilder<'a> {
    registry: &'a NodeRegistry,
    sink: &'a mut dyn DiagnosticSink,
    options: BuildOptions,
}

impl<'a> PatchBuilder<'a> {
    pub fn new(registry: &'a NodeRegistry, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            registry,
            sink,
            options: BuildOptions::default(),
        }
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.options.sample_rate = sample_rate;
        self
    }

    pub fn strict_types(mut self, strict: bool) -> Self {
        self.options.strict_types = strict;
        self
    }

    pub fn build_str(&mut self, text: &str) -> Result<Graph> {
        let root: Value = serde_json::from_str(text)?;
        self.build(&root)
    }

    pub fn build(&mut self, root: &Value) -> Result<Graph> {
        let config = parse_patch(root, &mut *self.sink)?;
        self.build_config(&config)
    }

    /// Build from an already parsed and flattened config.
    pub fn build_config(&mut self, config: &PatchConfig) -> Result<Graph> {
        self.options.validate()?;
        let mut nodes: Vec<Node> = Vec::with_capacity(config.nodes.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(config.nodes.len());

        for node_config in &config.nodes {
            let id = node_config.id.as_str();
            let mut node = match self.registry.instantiate(node_config) {
                Some(Ok(node)) => node,
                Some(Err(e)) => {
                    self.sink.report(Diagnostic::parse(
                        Some(id),
                        format!("could not construct {}: {e:#}", node_config.node_type),
                    ));
                    continue;
                }
                None if self.options.strict_types => {
                    return Err(BuildError::UnknownType {
                        id: node_config.id.clone(),
                        type_tag: node_config.node_type.clone(),
                    });
                }
                None => {
                    self.sink.report(Diagnostic::new(
                        DiagnosticKind::UnknownType,
                        Some(id),
                        format!("unknown module type '{}', module omitted", node_config.node_type),
                    ));
                    continue;
                }
            };
            self.apply_defaults(&mut node, &node_config.defaults);
            index.insert(node_config.id.clone(), nodes.len());
            nodes.push(node);
        }
        tracing::debug!(nodes = nodes.len(), "instantiated modules");

        for connection in &config.connections {
            connect(&mut nodes, &index, connection)?;
        }

        let terminal = resolve_terminal(&nodes)?;
        tracing::info!(
            nodes = nodes.len(),
            connections = config.connections.len(),
            terminal = nodes[terminal].id(),
            "built patch"
        );

        Ok(Graph::new(
            nodes,
            index,
            config.connections.clone(),
            terminal,
            self.options.sample_rate,
        ))
    }

    /// Keys are matched by parameter name; an integer key such as `"0"`
    /// addresses the slot positionally.
    fn apply_defaults(&mut self, node: &mut Node, defaults: &Map<String, Value>) {
        for (key, value) in defaults {
            let Some(value) = value.as_f64() else {
                self.sink.report(Diagnostic::warning(
                    Some(node.id()),
                    format!("default '{key}' is not a number, ignored"),
                ));
                continue;
            };
            if !node.set_param(key, value as f32) {
                self.sink.report(Diagnostic::warning(
                    Some(node.id()),
                    format!("{} has no parameter '{key}', ignored", node.node_type()),
                ));
            }
        }
    }
}

fn connect(nodes: &mut [Node], index: &HashMap<String, usize>, c: &Connection) -> Result<()> {
    let fail = |reason: String| BuildError::Connectivity {
        src: c.src.clone(),
        dst: c.dst.clone(),
        reason,
    };

    let src = *index
        .get(&c.src.module_uuid)
        .ok_or_else(|| fail(format!("no module '{}'", c.src.module_uuid)))?;
    let dst = *index
        .get(&c.dst.module_uuid)
        .ok_or_else(|| fail(format!("no module '{}'", c.dst.module_uuid)))?;

    let outputs = nodes[src].outputs.len();
    if c.src.port_id >= outputs {
        return Err(fail(format!(
            "module '{}' has {outputs} output port(s)",
            c.src.module_uuid
        )));
    }
    let inputs = nodes[dst].inputs.len();
    if c.dst.port_id >= inputs {
        return Err(fail(format!(
            "module '{}' has {inputs} input port(s)",
            c.dst.module_uuid
        )));
    }

    nodes[src].outputs[c.src.port_id].link(PortRef::new(dst, c.dst.port_id));
    nodes[dst].inputs[c.dst.port_id].link(PortRef::new(src, c.src.port_id));
    Ok(())
}

/// Exactly one node without outputs.
fn resolve_terminal(nodes: &[Node]) -> Result<usize> {
    let candidates: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.is_terminal())
        .map(|(i, _)| i)
        .collect();

    match candidates.as_slice() {
        [terminal] => Ok(*terminal),
        _ => Err(BuildError::NoTerminal {
            candidates: candidates
                .iter()
                .map(|&i| nodes[i].id().to_string())
                .collect(),
        }),
    }
}
