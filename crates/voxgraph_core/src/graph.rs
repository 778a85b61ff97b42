//! Arena graph and the per-sample evaluator.
//!
//! Nodes live in a `Vec` and refer to each other only through
//! [`PortRef`](crate::port::PortRef) indices. Evaluation pulls from the
//! terminal node: each input is resolved by evaluating its feeding node first,
//! unless that node is already on the work stack, in which case the
//! value it produced on the previous tick is used. Feedback loops therefore
//! cost exactly one sample of latency and always terminate.

use std::collections::{BTreeMap, HashMap};

use crate::node::{EvalState, Node};
use crate::patch::{Connection, ModuleJson, PatchJson};
use crate::types::HostInputs;

pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    connections: Vec<Connection>,
    terminal: usize,
    sample_rate: f32,
    stack: Vec<Cursor>,
}

/// Position of an in-progress node: which input port and which peer on it
/// is resolved next.
#[derive(Clone, Copy)]
struct Cursor {
    node: usize,
    port: usize,
    peer: usize,
}

impl Cursor {
    fn at(node: usize) -> Self {
        Self { node, port: 0, peer: 0 }
    }
}

impl Graph {
    pub(crate) fn new(
        nodes: Vec<Node>,
        index: HashMap<String, usize>,
        connections: Vec<Connection>,
        terminal: usize,
        sample_rate: f32,
    ) -> Self {
        let stack = Vec::with_capacity(nodes.len());
        Self {
            nodes,
            index,
            connections,
            terminal,
            sample_rate,
            stack,
        }
    }

    /// Run one tick and return the terminal node's input 0.
    pub fn process(&mut self, host: &HostInputs) -> f32 {
        for node in &mut self.nodes {
            node.state = EvalState::Idle;
        }
        self.evaluate(self.terminal, host);
        self.output()
    }

    /// Fill `out` with consecutive ticks under constant host inputs.
    pub fn process_block(&mut self, host: &HostInputs, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.process(host);
        }
    }

    /// Depth-first pull from `root` on an explicit work stack.
    fn evaluate(&mut self, root: usize, host: &HostInputs) {
        let mut stack = std::mem::take(&mut self.stack);
        stack.clear();
        self.nodes[root].state = EvalState::InProgress;
        stack.push(Cursor::at(root));

        while let Some(&Cursor { node, port, peer }) = stack.last() {
            let top = stack.len() - 1;

            if port == self.nodes[node].inputs.len() {
                stack.pop();
                let sample_rate = self.sample_rate;
                let current = &mut self.nodes[node];
                current.run(sample_rate, host);
                current.state = EvalState::Done;
                continue;
            }

            let Some(&feed) = self.nodes[node].inputs[port].peers().get(peer) else {
                stack[top] = Cursor { node, port: port + 1, peer: 0 };
                continue;
            };

            if self.nodes[feed.node].state == EvalState::Idle {
                // Revisit this peer once the feeding node is Done.
                self.nodes[feed.node].state = EvalState::InProgress;
                stack.push(Cursor::at(feed.node));
                continue;
            }

            // InProgress here means a cycle: read last tick's value.
            let value = self.nodes[feed.node].outputs[feed.port].value();
            self.nodes[node].inputs[port].set_value(value);
            stack[top].peer += 1;
        }

        self.stack = stack;
    }

    /// Last value seen on the terminal node's first input.
    pub fn output(&self) -> f32 {
        self.terminal()
            .inputs()
            .first()
            .map(|p| p.value())
            .unwrap_or(0.0)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Zero every port and return all processors to their initial state.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.index.get(id).map(|&i| &mut self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn terminal(&self) -> &Node {
        &self.nodes[self.terminal]
    }

    pub fn terminal_id(&self) -> &str {
        self.terminal().id()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Ids of nodes feeding any input of `id`, in port order, without repeats.
    pub fn upstream(&self, id: &str) -> Vec<&str> {
        self.neighbours(id, |node| node.inputs())
    }

    /// Ids of nodes listening to any output of `id`, without repeats.
    pub fn downstream(&self, id: &str) -> Vec<&str> {
        self.neighbours(id, |node| node.outputs())
    }

    fn neighbours<'a>(
        &'a self,
        id: &str,
        ports: impl Fn(&'a Node) -> &'a [crate::port::Port],
    ) -> Vec<&'a str> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = Vec::new();
        for peer in ports(node).iter().flat_map(|p| p.peers()) {
            let peer_id = self.nodes[peer.node].id();
            if !ids.contains(&peer_id) {
                ids.push(peer_id);
            }
        }
        ids
    }

    /// Nodes declared directly inside the macro `macro_id`.
    pub fn nodes_in_macro<'a>(&'a self, macro_id: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id() == Some(macro_id))
    }

    pub fn parameter(&self, id: &str, key: &str) -> Option<f32> {
        self.node(id)?.param(key)
    }

    pub fn set_parameter(&mut self, id: &str, key: &str, value: f32) -> bool {
        self.node_mut(id)
            .is_some_and(|node| node.set_param(key, value))
    }

    pub fn input_value(&self, id: &str, port: usize) -> Option<f32> {
        self.node(id)?.inputs().get(port).map(|p| p.value())
    }

    pub fn output_value(&self, id: &str, port: usize) -> Option<f32> {
        self.node(id)?.outputs().get(port).map(|p| p.value())
    }

    /// Set an input's local value. Only sticks on unconnected inputs; a
    /// connected input is overwritten on the next tick.
    pub fn set_input_value(&mut self, id: &str, port: usize, value: f32) -> bool {
        match self.node_mut(id).and_then(|n| n.inputs.get_mut(port)) {
            Some(p) => {
                p.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Serialize back to the patch format. Macros are already flattened, so
    /// the result is a flat patch; every parameter is written by name.
    pub fn to_patch_json(&self) -> PatchJson {
        let modules = self
            .nodes
            .iter()
            .map(|node| {
                let defaults: BTreeMap<String, f32> = node
                    .params()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect();
                ModuleJson {
                    uuid: node.id().to_string(),
                    module_type: node.node_type().to_string(),
                    data: node.data().cloned(),
                    defaults: (!defaults.is_empty()).then_some(defaults),
                    patch: None,
                }
            })
            .collect();
        PatchJson {
            modules,
            connections: self.connections.clone(),
        }
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("connections", &self.connections)
            .field("terminal", &self.terminal_id())
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PatchBuilder;
    use crate::diagnostics::CollectingSink;
    use crate::registry::default_registry;
    use serde_json::{Value, json};

    const SAMPLE_RATE: f32 = 48000.0;

    fn build(patch: Value) -> Graph {
        let mut sink = CollectingSink::new();
        PatchBuilder::new(default_registry(), &mut sink)
            .sample_rate(SAMPLE_RATE)
            .build(&patch)
            .unwrap_or_else(|e| panic!("build failed: {e}"))
    }

    fn wire(src: &str, sp: usize, dst: &str, dp: usize) -> Value {
        json!({ "src": { "module_uuid": src, "port_id": sp }, "dst": { "module_uuid": dst, "port_id": dp } })
    }

    fn host(params: &[f32]) -> HostInputs {
        let mut host = HostInputs::default();
        host.params[..params.len()].copy_from_slice(params);
        host
    }

    #[test]
    fn pulls_through_a_chain() {
        let mut graph = build(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "p2", "type": "PARAM2" },
                { "uuid": "add", "type": "ADDITION" },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [ wire("p1", 0, "add", 0), wire("p2", 0, "add", 1), wire("add", 0, "out", 0) ]
        }));

        assert_eq!(graph.process(&host(&[1.5, 2.0])), 3.5);
        assert_eq!(graph.process(&host(&[-1.0, 2.0])), 1.0);
        assert_eq!(graph.output_value("add", 0), Some(1.0));
    }

    #[test]
    fn feedback_loop_uses_previous_tick() {
        // acc = p1 + acc(previous tick): a running sum.
        let mut graph = build(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "acc", "type": "ADDITION" },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [ wire("p1", 0, "acc", 0), wire("acc", 0, "acc", 1), wire("acc", 0, "out", 0) ]
        }));

        let h = host(&[1.0]);
        let outputs: Vec<f32> = (0..4).map(|_| graph.process(&h)).collect();
        assert_eq!(outputs, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn two_node_cycle_terminates() {
        let mut graph = build(json!({
            "modules": [
                { "uuid": "a", "type": "AMPLIFIER", "defaults": { "GAIN": 0.5 } },
                { "uuid": "b", "type": "ADDITION" },
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [
                wire("p1", 0, "b", 0),
                wire("a", 0, "b", 1),
                wire("b", 0, "a", 0),
                wire("b", 0, "out", 0)
            ]
        }));

        // b = 1 + 0.5 * b[n-1] settles at 2.0
        let h = host(&[1.0]);
        let mut last = 0.0;
        for _ in 0..200 {
            last = graph.process(&h);
        }
        assert!((last - 2.0).abs() < 1e-4, "settled at {last}");
    }

    #[test]
    fn long_chain_runs_on_a_small_stack() {
        const LENGTH: usize = 10_000;
        let mut modules = vec![json!({ "uuid": "p1", "type": "PARAM1" })];
        let mut connections = Vec::with_capacity(LENGTH + 1);
        let mut previous = "p1".to_string();
        for i in 0..LENGTH {
            let id = format!("amp{i}");
            modules.push(json!({ "uuid": id, "type": "AMPLIFIER" }));
            connections.push(wire(&previous, 0, &id, 0));
            previous = id;
        }
        modules.push(json!({ "uuid": "out", "type": "OUTPUT" }));
        connections.push(wire(&previous, 0, "out", 0));
        let mut graph = build(json!({ "modules": modules, "connections": connections }));

        let outputs = std::thread::Builder::new()
            .stack_size(64 * 1024)
            .spawn(move || {
                let h = host(&[0.5]);
                [graph.process(&h), graph.process(&h)]
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(outputs, [0.5, 0.5]);
    }

    #[test]
    fn unreached_nodes_are_not_evaluated() {
        let mut graph = build(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "stray", "type": "PARAM2" },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [ wire("p1", 0, "out", 0) ]
        }));
        graph.process(&host(&[1.0, 9.0]));
        assert_eq!(graph.output_value("stray", 0), Some(0.0));
    }

    #[test]
    fn unconnected_input_keeps_local_value() {
        let mut graph = build(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "add", "type": "ADDITION" },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [ wire("p1", 0, "add", 0), wire("add", 0, "out", 0) ]
        }));
        assert!(graph.set_input_value("add", 1, 10.0));
        assert_eq!(graph.process(&host(&[1.0])), 11.0);
        assert!(!graph.set_input_value("add", 2, 1.0));
        assert!(!graph.set_input_value("nope", 0, 1.0));
    }

    #[test]
    fn structural_queries() {
        let graph = build(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "mix", "type": "MIXER2" },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [ wire("p1", 0, "mix", 0), wire("p1", 0, "mix", 1), wire("mix", 0, "out", 0) ]
        }));

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.terminal_id(), "out");
        assert_eq!(graph.upstream("mix"), vec!["p1"]);
        assert_eq!(graph.downstream("p1"), vec!["mix"]);
        assert!(graph.upstream("missing").is_empty());
        assert_eq!(graph.parameter("mix", "GAIN2"), Some(1.0));
        assert_eq!(graph.connections().len(), 3);
    }

    #[test]
    fn set_parameter_changes_output() {
        let mut graph = build(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "amp", "type": "AMPLIFIER" },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [ wire("p1", 0, "amp", 0), wire("amp", 0, "out", 0) ]
        }));
        assert!(graph.set_parameter("amp", "GAIN", 3.0));
        assert!(!graph.set_parameter("amp", "CUTOFF", 3.0));
        assert_eq!(graph.process(&host(&[2.0])), 6.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut graph = build(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "acc", "type": "ADDITION" },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [ wire("p1", 0, "acc", 0), wire("acc", 0, "acc", 1), wire("acc", 0, "out", 0) ]
        }));
        let h = host(&[1.0]);
        graph.process(&h);
        graph.process(&h);
        graph.reset();
        assert_eq!(graph.output(), 0.0);
        assert_eq!(graph.process(&h), 1.0);
    }

    #[test]
    fn to_patch_json_writes_params_by_name() {
        let graph = build(json!({
            "modules": [
                { "uuid": "p1", "type": "PARAM1" },
                { "uuid": "amp", "type": "AMPLIFIER", "defaults": { "GAIN": 2.0 } },
                { "uuid": "out", "type": "OUTPUT" }
            ],
            "connections": [ wire("p1", 0, "amp", 0), wire("amp", 0, "out", 0) ]
        }));
        let patch = graph.to_patch_json();
        let amp = patch.modules.iter().find(|m| m.uuid == "amp").unwrap();
        assert_eq!(amp.defaults.as_ref().unwrap().get("GAIN"), Some(&2.0));
        let p1 = patch.modules.iter().find(|m| m.uuid == "p1").unwrap();
        assert!(p1.defaults.is_none());
        assert_eq!(patch.connections.len(), 2);
    }
}
