//! Patch JSON format, lenient parsing and macro flattening.
//!
//! Parsing works on a raw [`serde_json::Value`] one entry at a time so that a
//! single bad module or connection is reported and skipped instead of
//! rejecting the whole patch. Macros are expanded depth-first while parsing and
//! their boundary adapters are spliced out before any node is instantiated, so
//! the builder only ever sees a flat list of real modules and direct
//! connections.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{BuildError, Result};
use crate::types::{MACRO, MACRO_INPUT_PORT, MACRO_OUTPUT_PORT};

/// Data key holding the macro port an input adapter stands for.
pub const MACRO_INPUT_INDEX_KEY: &str = "macro_input_port_index";
/// Data key holding the macro port an output adapter stands for.
pub const MACRO_OUTPUT_INDEX_KEY: &str = "macro_output_port_index";
/// Joins a macro's id and the ids declared inside it.
pub const MACRO_SCOPE_SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Endpoint {
    pub module_uuid: String,
    pub port_id: usize,
}

impl Endpoint {
    pub fn new(module_uuid: impl Into<String>, port_id: usize) -> Self {
        Self {
            module_uuid: module_uuid.into(),
            port_id,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module_uuid, self.port_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Connection {
    pub src: Endpoint,
    pub dst: Endpoint,
}

impl Connection {
    pub fn new(src: Endpoint, dst: Endpoint) -> Self {
        Self { src, dst }
    }

    pub fn touches(&self, module_uuid: &str) -> bool {
        self.src.module_uuid == module_uuid || self.dst.module_uuid == module_uuid
    }
}

/// A patch as it appears on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PatchJson {
    #[serde(default)]
    pub modules: Vec<ModuleJson>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModuleJson {
    /// Node id. Missing, empty or "none" gets a generated id.
    #[serde(default)]
    pub uuid: String,
    #[serde(rename = "type")]
    pub module_type: String,
    /// Type-specific blob, e.g. sequencer voltages or a macro adapter index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Parameter values keyed by name (or by slot index as a string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<BTreeMap<String, f32>>,
    /// Nested patch, only for `MACRO` modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Box<PatchJson>>,
}

/// One module to instantiate.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub id: String,
    pub node_type: String,
    /// Scoped id of the innermost macro this module was declared in.
    pub parent_id: Option<String>,
    pub data: Option<Value>,
    pub defaults: Map<String, Value>,
}

impl NodeConfig {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            parent_id: None,
            data: None,
            defaults: Map::new(),
        }
    }

    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }
}

/// Flat result of parsing: no macros, no in-macro boundary adapters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchConfig {
    pub nodes: Vec<NodeConfig>,
    pub connections: Vec<Connection>,
}

/// Parse a patch and flatten its macros.
///
/// Malformed entries are reported to `sink` and skipped. The only failure is a
/// connection into a macro port that has no boundary adapter behind it.
pub fn parse_patch(root: &Value, sink: &mut dyn DiagnosticSink) -> Result<PatchConfig> {
    let mut parser = Parser {
        sink,
        config: PatchConfig::default(),
        macros: Vec::new(),
        seen: HashSet::new(),
    };
    parser.parse_level(root, None);

    let Parser {
        sink,
        mut config,
        macros,
        ..
    } = parser;
    tracing::debug!(
        modules = config.nodes.len(),
        connections = config.connections.len(),
        macros = macros.len(),
        "parsed patch"
    );
    if !macros.is_empty() {
        config.flatten_macros(&macros, sink)?;
    }
    Ok(config)
}

struct Parser<'s> {
    sink: &'s mut dyn DiagnosticSink,
    config: PatchConfig,
    macros: Vec<String>,
    seen: HashSet<String>,
}

impl Parser<'_> {
    /// `parent` is the scoped id of the enclosing macro. Module ids declared
    /// at this level, and connection endpoints naming them, are scoped under
    /// it so two instances of one macro never collide.
    fn parse_level(&mut self, patch: &Value, parent: Option<&str>) {
        let Some(patch) = patch.as_object() else {
            self.sink
                .report(Diagnostic::parse(parent, "patch is not a JSON object"));
            return;
        };

        let local: HashSet<&str> = match patch.get("modules") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| entry.get("uuid").and_then(Value::as_str))
                .collect(),
            _ => HashSet::new(),
        };

        match patch.get("connections") {
            Some(Value::Array(entries)) => {
                for (i, entry) in entries.iter().enumerate() {
                    match serde_json::from_value::<Connection>(entry.clone()) {
                        Ok(mut connection) => {
                            if parent.is_some() {
                                for end in [&mut connection.src, &mut connection.dst] {
                                    if local.contains(end.module_uuid.as_str()) {
                                        end.module_uuid = scoped(parent, &end.module_uuid);
                                    }
                                }
                            }
                            self.config.connections.push(connection);
                        }
                        Err(e) => self
                            .sink
                            .report(Diagnostic::parse(parent, format!("connection {i}: {e}"))),
                    }
                }
            }
            _ => self
                .sink
                .report(Diagnostic::parse(parent, "connections missing or not an array")),
        }

        match patch.get("modules") {
            Some(Value::Array(entries)) => {
                for (i, entry) in entries.iter().enumerate() {
                    self.parse_module(i, entry, parent);
                }
            }
            _ => self
                .sink
                .report(Diagnostic::parse(parent, "modules missing or not an array")),
        }
    }

    fn parse_module(&mut self, index: usize, entry: &Value, parent: Option<&str>) {
        let Some(entry) = entry.as_object() else {
            self.sink.report(Diagnostic::parse(
                parent,
                format!("module {index} is not a JSON object"),
            ));
            return;
        };

        let id = match entry.get("uuid").and_then(Value::as_str) {
            Some(uuid) if !uuid.is_empty() && uuid != "none" => scoped(parent, uuid),
            _ => {
                let generated = Uuid::new_v4().to_string();
                self.sink.report(Diagnostic::warning(
                    Some(generated.as_str()),
                    format!("module {index} has no uuid, generated one"),
                ));
                generated
            }
        };

        let node_type = match entry.get("type").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                self.sink
                    .report(Diagnostic::parse(Some(id.as_str()), "module has no type"));
                return;
            }
        };

        if !self.seen.insert(id.clone()) {
            self.sink
                .report(Diagnostic::parse(Some(id.as_str()), "duplicate uuid, module skipped"));
            return;
        }

        if node_type == MACRO {
            self.macros.push(id.clone());
            match entry.get("patch") {
                Some(nested) => self.parse_level(nested, Some(id.as_str())),
                None => self
                    .sink
                    .report(Diagnostic::parse(Some(id.as_str()), "macro has no nested patch")),
            }
            return;
        }

        let data = match entry.get("data") {
            None | Some(Value::Null) => None,
            Some(value @ Value::Object(_)) => Some(value.clone()),
            Some(_) => {
                self.sink
                    .report(Diagnostic::parse(Some(id.as_str()), "data is not an object, ignored"));
                None
            }
        };

        let defaults = match entry.get("defaults") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                self.sink.report(Diagnostic::parse(
                    Some(id.as_str()),
                    "defaults is not an object, ignored",
                ));
                Map::new()
            }
        };

        self.config.nodes.push(NodeConfig {
            id,
            node_type,
            parent_id: parent.map(str::to_string),
            data,
            defaults,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AdapterKind {
    Input,
    Output,
}

#[derive(Debug)]
struct Adapter {
    id: String,
    kind: AdapterKind,
    parent: String,
    index: Option<usize>,
}

impl Adapter {
    fn from_config(node: &NodeConfig) -> Option<Self> {
        let parent = node.parent_id.clone()?;
        let (kind, key) = match node.node_type.as_str() {
            MACRO_INPUT_PORT => (AdapterKind::Input, MACRO_INPUT_INDEX_KEY),
            MACRO_OUTPUT_PORT => (AdapterKind::Output, MACRO_OUTPUT_INDEX_KEY),
            _ => return None,
        };
        let index = node
            .data_field(key)
            .and_then(Value::as_u64)
            .map(|i| i as usize);
        Some(Self {
            id: node.id.clone(),
            kind,
            parent,
            index,
        })
    }
}

impl PatchConfig {
    /// Splice every in-macro boundary adapter out of the connection list,
    /// then drop the macros themselves.
    ///
    /// Adapters are handled one at a time against the evolving list, which
    /// lets nested macros and adapter-to-adapter pass-throughs resolve in any
    /// order.
    pub fn flatten_macros(
        &mut self,
        macros: &[String],
        sink: &mut dyn DiagnosticSink,
    ) -> Result<()> {
        let mut adapters = Vec::new();
        self.nodes.retain(|node| match Adapter::from_config(node) {
            Some(adapter) => {
                adapters.push(adapter);
                false
            }
            None => true,
        });

        let mut claimed = HashSet::new();
        for adapter in adapters {
            let Some(index) = adapter.index else {
                sink.report(Diagnostic::parse(
                    Some(adapter.id.as_str()),
                    "macro boundary adapter has no port index, dropped",
                ));
                self.connections.retain(|c| !c.touches(&adapter.id));
                continue;
            };
            if !claimed.insert((adapter.parent.clone(), adapter.kind, index)) {
                sink.report(Diagnostic::warning(
                    Some(adapter.id.as_str()),
                    format!(
                        "macro '{}' already has an adapter for port {index}, dropped",
                        adapter.parent
                    ),
                ));
                self.connections.retain(|c| !c.touches(&adapter.id));
                continue;
            }
            self.bridge(&adapter, Endpoint::new(adapter.parent.clone(), index));
        }

        for macro_id in macros {
            if let Some(c) = self.connections.iter().find(|c| c.touches(macro_id)) {
                let (direction, port) = if c.dst.module_uuid == *macro_id {
                    ("input", c.dst.port_id)
                } else {
                    ("output", c.src.port_id)
                };
                return Err(BuildError::Connectivity {
                    src: c.src.clone(),
                    dst: c.dst.clone(),
                    reason: format!(
                        "macro '{macro_id}' has no boundary adapter for {direction} port {port}"
                    ),
                });
            }
        }

        tracing::debug!(
            modules = self.nodes.len(),
            connections = self.connections.len(),
            "flattened macros"
        );
        Ok(())
    }

    fn bridge(&mut self, adapter: &Adapter, boundary: Endpoint) {
        let id = adapter.id.as_str();
        let (sources, destinations): (Vec<Endpoint>, Vec<Endpoint>) = match adapter.kind {
            AdapterKind::Input => (
                self.sources_into(|c| c.dst == boundary),
                self.destinations_from(|c| c.src.module_uuid == id),
            ),
            AdapterKind::Output => (
                self.sources_into(|c| c.dst.module_uuid == id),
                self.destinations_from(|c| c.src == boundary),
            ),
        };

        self.connections.retain(|c| {
            let consumed = match adapter.kind {
                AdapterKind::Input => c.dst == boundary,
                AdapterKind::Output => c.src == boundary,
            };
            !consumed && !c.touches(id)
        });

        for src in &sources {
            for dst in &destinations {
                self.connections.push(Connection::new(src.clone(), dst.clone()));
            }
        }
    }

    fn sources_into(&self, matches: impl Fn(&Connection) -> bool) -> Vec<Endpoint> {
        self.connections
            .iter()
            .filter(|c| matches(c))
            .map(|c| c.src.clone())
            .collect()
    }

    fn destinations_from(&self, matches: impl Fn(&Connection) -> bool) -> Vec<Endpoint> {
        self.connections
            .iter()
            .filter(|c| matches(c))
            .map(|c| c.dst.clone())
            .collect()
    }
}

/// Id of `uuid` as declared inside the macro `parent`, e.g. `outer/inner/amp`.
fn scoped(parent: Option<&str>, uuid: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}{MACRO_SCOPE_SEPARATOR}{uuid}"),
        None => uuid.to_string(),
    }
}

/// JSON Schema of the patch file format.
pub fn patch_json_schema() -> Value {
    schemars::schema_for!(PatchJson).to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingSink, DiagnosticKind};
    use serde_json::json;

    fn conn(src: &str, sp: usize, dst: &str, dp: usize) -> Connection {
        Connection::new(Endpoint::new(src, sp), Endpoint::new(dst, dp))
    }

    fn parse(root: Value) -> (PatchConfig, CollectingSink) {
        let mut sink = CollectingSink::new();
        let config = parse_patch(&root, &mut sink).expect("parse failed");
        (config, sink)
    }

    #[test]
    fn parses_flat_patch() {
        let (config, sink) = parse(json!({
            "modules": [
                { "uuid": "osc", "type": "VCO", "defaults": { "FREQUENCY": 1.0 } },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [
                { "src": { "module_uuid": "osc", "port_id": 0 }, "dst": { "module_uuid": "out", "port_id": 0 } }
            ]
        }));

        assert!(sink.diagnostics().is_empty(), "{:?}", sink.diagnostics());
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[0].defaults.get("FREQUENCY"), Some(&json!(1.0)));
        assert_eq!(config.connections, vec![conn("osc", 0, "out", 0)]);
    }

    #[test]
    fn missing_collections_are_parse_errors() {
        let (config, sink) = parse(json!({}));
        assert!(config.nodes.is_empty());
        assert!(config.connections.is_empty());
        assert_eq!(sink.count(DiagnosticKind::ParseError), 2);

        let (_, sink) = parse(json!([1, 2]));
        assert_eq!(sink.count(DiagnosticKind::ParseError), 1);
    }

    #[test]
    fn bad_entries_are_skipped_individually() {
        let (config, sink) = parse(json!({
            "modules": [
                { "uuid": "a", "type": "VCO" },
                { "uuid": "b" },
                "not a module",
                { "uuid": "a", "type": "NOISE" },
                { "uuid": "c", "type": "OUTPUT", "data": 5, "defaults": [1] }
            ],
            "connections": [
                { "src": { "module_uuid": "a", "port_id": 0 }, "dst": { "module_uuid": "c", "port_id": 0 } },
                { "src": { "module_uuid": "a" } }
            ]
        }));

        let ids: Vec<&str> = config.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(config.nodes[1].data, None);
        assert!(config.nodes[1].defaults.is_empty());
        assert_eq!(config.connections.len(), 1);
        // missing type, not an object, duplicate uuid, bad data, bad defaults, bad connection
        assert_eq!(sink.count(DiagnosticKind::ParseError), 6);
    }

    #[test]
    fn missing_uuid_gets_generated() {
        let (config, sink) = parse(json!({
            "modules": [ { "type": "OUTPUT" }, { "uuid": "none", "type": "VCO" } ],
            "connections": []
        }));
        assert_eq!(config.nodes.len(), 2);
        assert_ne!(config.nodes[0].id, config.nodes[1].id);
        assert!(Uuid::parse_str(&config.nodes[0].id).is_ok());
        assert_eq!(sink.count(DiagnosticKind::Warning), 2);
    }

    // ─── Macros ──────────────────────────────────────────────────────────────

    fn gain_macro(id: &str, inner: Value) -> Value {
        json!({ "uuid": id, "type": "MACRO", "patch": inner })
    }

    #[test]
    fn macro_adapters_are_spliced_out() {
        let (config, sink) = parse(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                gain_macro("m", json!({
                    "modules": [
                        { "uuid": "in", "type": "MACRO_INPUT_PORT", "data": { "macro_input_port_index": 0 } },
                        { "uuid": "amp", "type": "AMPLIFIER" },
                        { "uuid": "outp", "type": "MACRO_OUTPUT_PORT", "data": { "macro_output_port_index": 0 } }
                    ],
                    "connections": [
                        { "src": { "module_uuid": "in", "port_id": 0 }, "dst": { "module_uuid": "amp", "port_id": 0 } },
                        { "src": { "module_uuid": "amp", "port_id": 0 }, "dst": { "module_uuid": "outp", "port_id": 0 } }
                    ]
                })),
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [
                { "src": { "module_uuid": "p1", "port_id": 0 }, "dst": { "module_uuid": "m", "port_id": 0 } },
                { "src": { "module_uuid": "m", "port_id": 0 }, "dst": { "module_uuid": "out", "port_id": 0 } }
            ]
        }));

        assert!(sink.diagnostics().is_empty(), "{:?}", sink.diagnostics());
        let ids: Vec<&str> = config.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["p1", "m/amp", "out"]);
        assert_eq!(config.nodes[1].parent_id.as_deref(), Some("m"));

        let mut connections = config.connections.clone();
        connections.sort_by(|a, b| a.src.module_uuid.cmp(&b.src.module_uuid));
        assert_eq!(
            connections,
            vec![conn("m/amp", 0, "out", 0), conn("p1", 0, "m/amp", 0)]
        );
    }

    #[test]
    fn nested_macros_and_fan_out() {
        let inner = json!({
            "modules": [
                { "uuid": "n_in", "type": "MACRO_INPUT_PORT", "data": { "macro_input_port_index": 0 } },
                { "uuid": "a1", "type": "AMPLIFIER" },
                { "uuid": "a2", "type": "AMPLIFIER" }
            ],
            "connections": [
                { "src": { "module_uuid": "n_in", "port_id": 0 }, "dst": { "module_uuid": "a1", "port_id": 0 } },
                { "src": { "module_uuid": "n_in", "port_id": 0 }, "dst": { "module_uuid": "a2", "port_id": 0 } }
            ]
        });
        let (config, _) = parse(json!({
            "modules": [
                { "uuid": "src", "type": "PARAM1" },
                gain_macro("outer", json!({
                    "modules": [
                        { "uuid": "o_in", "type": "MACRO_INPUT_PORT", "data": { "macro_input_port_index": 2 } },
                        gain_macro("inner", inner)
                    ],
                    "connections": [
                        { "src": { "module_uuid": "o_in", "port_id": 0 }, "dst": { "module_uuid": "inner", "port_id": 0 } }
                    ]
                }))
            ],
            "connections": [
                { "src": { "module_uuid": "src", "port_id": 0 }, "dst": { "module_uuid": "outer", "port_id": 2 } }
            ]
        }));

        let mut connections = config.connections.clone();
        connections.sort_by(|a, b| a.dst.module_uuid.cmp(&b.dst.module_uuid));
        assert_eq!(
            connections,
            vec![
                conn("src", 0, "outer/inner/a1", 0),
                conn("src", 0, "outer/inner/a2", 0)
            ]
        );
        let a1 = config.nodes.iter().find(|n| n.id == "outer/inner/a1").unwrap();
        assert_eq!(a1.parent_id.as_deref(), Some("outer/inner"));
    }

    #[test]
    fn macro_instances_are_scoped_apart() {
        let body = json!({
            "modules": [
                { "uuid": "in", "type": "MACRO_INPUT_PORT", "data": { "macro_input_port_index": 0 } },
                { "uuid": "amp", "type": "AMPLIFIER" },
                { "uuid": "o", "type": "MACRO_OUTPUT_PORT", "data": { "macro_output_port_index": 0 } }
            ],
            "connections": [
                { "src": { "module_uuid": "in", "port_id": 0 }, "dst": { "module_uuid": "amp", "port_id": 0 } },
                { "src": { "module_uuid": "amp", "port_id": 0 }, "dst": { "module_uuid": "o", "port_id": 0 } }
            ]
        });
        let (config, sink) = parse(json!({
            "modules": [
                { "uuid": "p", "type": "PARAM1" },
                gain_macro("m1", body.clone()),
                gain_macro("m2", body),
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [
                { "src": { "module_uuid": "p", "port_id": 0 }, "dst": { "module_uuid": "m1", "port_id": 0 } },
                { "src": { "module_uuid": "m1", "port_id": 0 }, "dst": { "module_uuid": "m2", "port_id": 0 } },
                { "src": { "module_uuid": "m2", "port_id": 0 }, "dst": { "module_uuid": "out", "port_id": 0 } }
            ]
        }));

        assert!(sink.diagnostics().is_empty(), "{:?}", sink.diagnostics());
        let ids: Vec<&str> = config.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["p", "m1/amp", "m2/amp", "out"]);
        let mut connections = config.connections.clone();
        connections.sort_by(|a, b| a.src.module_uuid.cmp(&b.src.module_uuid));
        assert_eq!(
            connections,
            vec![
                conn("m1/amp", 0, "m2/amp", 0),
                conn("m2/amp", 0, "out", 0),
                conn("p", 0, "m1/amp", 0)
            ]
        );
    }

    #[test]
    fn pass_through_macro() {
        let (config, _) = parse(json!({
            "modules": [
                { "uuid": "src", "type": "PARAM1" },
                gain_macro("m", json!({
                    "modules": [
                        { "uuid": "i", "type": "MACRO_INPUT_PORT", "data": { "macro_input_port_index": 0 } },
                        { "uuid": "o", "type": "MACRO_OUTPUT_PORT", "data": { "macro_output_port_index": 1 } }
                    ],
                    "connections": [
                        { "src": { "module_uuid": "i", "port_id": 0 }, "dst": { "module_uuid": "o", "port_id": 0 } }
                    ]
                })),
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [
                { "src": { "module_uuid": "src", "port_id": 0 }, "dst": { "module_uuid": "m", "port_id": 0 } },
                { "src": { "module_uuid": "m", "port_id": 1 }, "dst": { "module_uuid": "out", "port_id": 0 } }
            ]
        }));
        assert_eq!(config.connections, vec![conn("src", 0, "out", 0)]);
    }

    #[test]
    fn macro_port_without_adapter_is_a_connectivity_error() {
        let root = json!({
            "modules": [
                { "uuid": "src", "type": "PARAM1" },
                gain_macro("m", json!({ "modules": [], "connections": [] }))
            ],
            "connections": [
                { "src": { "module_uuid": "src", "port_id": 0 }, "dst": { "module_uuid": "m", "port_id": 3 } }
            ]
        });
        let mut sink = CollectingSink::new();
        let err = parse_patch(&root, &mut sink).unwrap_err();
        match err {
            BuildError::Connectivity { reason, .. } => {
                assert!(reason.contains("input port 3"), "reason: {reason}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn adapter_without_index_is_dropped() {
        let (config, sink) = parse(json!({
            "modules": [
                gain_macro("m", json!({
                    "modules": [
                        { "uuid": "i", "type": "MACRO_INPUT_PORT" },
                        { "uuid": "amp", "type": "AMPLIFIER" }
                    ],
                    "connections": [
                        { "src": { "module_uuid": "i", "port_id": 0 }, "dst": { "module_uuid": "amp", "port_id": 0 } }
                    ]
                }))
            ],
            "connections": []
        }));
        assert_eq!(config.nodes.len(), 1);
        assert!(config.connections.is_empty());
        assert_eq!(sink.count(DiagnosticKind::ParseError), 1);
    }

    #[test]
    fn top_level_adapter_is_kept() {
        let (config, _) = parse(json!({
            "modules": [ { "uuid": "i", "type": "MACRO_INPUT_PORT" } ],
            "connections": []
        }));
        assert_eq!(config.nodes.len(), 1);
    }

    #[test]
    fn patch_json_round_trips_through_serde() {
        let patch = PatchJson {
            modules: vec![ModuleJson {
                uuid: "a".into(),
                module_type: "VCO".into(),
                data: None,
                defaults: Some(BTreeMap::from([("FREQUENCY".to_string(), 1.0)])),
                patch: None,
            }],
            connections: vec![conn("a", 0, "b", 0)],
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value["modules"][0]["type"], "VCO");
        assert!(value["modules"][0].get("data").is_none());
        let back: PatchJson = serde_json::from_value(value).unwrap();
        assert_eq!(back, patch);
    }

    #[test]
    fn schema_describes_modules_and_connections() {
        let schema = patch_json_schema();
        let properties = &schema["properties"];
        assert!(properties.get("modules").is_some());
        assert!(properties.get("connections").is_some());
    }
}
