//! Arena node and the per-sample processing interface.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::port::Port;
use crate::types::{HostInputs, NodeSchema};

/// Per-variant DSP behavior. `process` runs once per tick after every input
/// has been resolved, and writes only this node's outputs.
pub trait Processor: Send {
    fn process(&mut self, frame: &mut Frame<'_>);

    /// Return internal state (phase, filter history, envelope stage) to its
    /// initial value.
    fn reset(&mut self) {}
}

/// Everything a processor can see during one tick.
pub struct Frame<'a> {
    sample_rate: f32,
    host: &'a HostInputs,
    inputs: &'a [Port],
    params: &'a [f32],
    outputs: &'a mut [Port],
}

impl<'a> Frame<'a> {
    pub fn new(
        sample_rate: f32,
        host: &'a HostInputs,
        inputs: &'a [Port],
        params: &'a [f32],
        outputs: &'a mut [Port],
    ) -> Self {
        Self {
            sample_rate,
            host,
            inputs,
            params,
            outputs,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn host(&self) -> &HostInputs {
        self.host
    }

    pub fn input(&self, index: usize) -> f32 {
        self.inputs.get(index).map(Port::value).unwrap_or(0.0)
    }

    pub fn is_connected(&self, index: usize) -> bool {
        self.inputs.get(index).is_some_and(Port::is_connected)
    }

    pub fn param(&self, index: usize) -> f32 {
        self.params.get(index).copied().unwrap_or(0.0)
    }

    /// The input when something is patched into it, the parameter otherwise.
    pub fn input_or_param(&self, input: usize, param: usize) -> f32 {
        if self.is_connected(input) {
            self.input(input)
        } else {
            self.param(param)
        }
    }

    /// Value written on the previous tick.
    pub fn output(&self, index: usize) -> f32 {
        self.outputs.get(index).map(Port::value).unwrap_or(0.0)
    }

    pub fn set_output(&mut self, index: usize, value: f32) {
        if let Some(port) = self.outputs.get_mut(index) {
            port.set_value(value);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EvalState {
    Idle,
    InProgress,
    Done,
}

pub struct Node {
    pub(crate) id: String,
    pub(crate) parent_id: Option<String>,
    pub(crate) data: Option<Value>,
    pub(crate) schema: Arc<NodeSchema>,
    pub(crate) params: Vec<f32>,
    pub(crate) inputs: Vec<Port>,
    pub(crate) outputs: Vec<Port>,
    pub(crate) processor: Box<dyn Processor>,
    pub(crate) state: EvalState,
}

impl Node {
    /// Ports and parameters are sized from the schema and never change.
    pub fn new(
        id: String,
        schema: Arc<NodeSchema>,
        processor: Box<dyn Processor>,
        parent_id: Option<String>,
        data: Option<Value>,
    ) -> Self {
        let params = schema.params.iter().map(|p| p.default).collect();
        let inputs = vec![Port::new(); schema.inputs.len()];
        let outputs = vec![Port::new(); schema.outputs.len()];
        Self {
            id,
            parent_id,
            data,
            schema,
            params,
            inputs,
            outputs,
            processor,
            state: EvalState::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node_type(&self) -> &str {
        &self.schema.name
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn schema(&self) -> &NodeSchema {
        &self.schema
    }

    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    pub fn is_terminal(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn param(&self, key: &str) -> Option<f32> {
        self.schema.param_index(key).map(|i| self.params[i])
    }

    /// Returns false if the key names no parameter of this node.
    pub fn set_param(&mut self, key: &str, value: f32) -> bool {
        match self.schema.param_index(key) {
            Some(i) => {
                self.params[i] = value;
                true
            }
            None => false,
        }
    }

    /// (name, value) in declared order.
    pub fn params(&self) -> impl Iterator<Item = (&str, f32)> {
        self.schema
            .params
            .iter()
            .zip(self.params.iter())
            .map(|(p, v)| (p.name.as_str(), *v))
    }

    /// Clears port values and processor state.
    pub fn reset(&mut self) {
        for port in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            port.set_value(0.0);
        }
        self.processor.reset();
        self.state = EvalState::Idle;
    }

    pub(crate) fn run(&mut self, sample_rate: f32, host: &HostInputs) {
        let mut frame = Frame::new(
            sample_rate,
            host,
            &self.inputs,
            &self.params,
            &mut self.outputs,
        );
        self.processor.process(&mut frame);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.schema.name)
            .field("parent_id", &self.parent_id)
            .field("params", &self.params)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortRef;

    struct Doubler;

    impl Processor for Doubler {
        fn process(&mut self, frame: &mut Frame<'_>) {
            let v = frame.input_or_param(0, 0) * 2.0;
            frame.set_output(0, v);
        }
    }

    fn doubler() -> Node {
        let schema = NodeSchema::new("DOUBLE", "doubles")
            .input("IN", "in")
            .output("OUT", "out")
            .param("VALUE", "used when IN is unpatched", 1.5);
        Node::new("d".into(), Arc::new(schema), Box::new(Doubler), None, None)
    }

    #[test]
    fn ports_sized_from_schema() {
        let node = doubler();
        assert_eq!(node.inputs().len(), 1);
        assert_eq!(node.outputs().len(), 1);
        assert!(!node.is_terminal());
        assert_eq!(node.param("VALUE"), Some(1.5));
    }

    #[test]
    fn unpatched_input_falls_back_to_param() {
        let mut node = doubler();
        node.run(48000.0, &HostInputs::default());
        assert_eq!(node.outputs()[0].value(), 3.0);

        node.inputs[0].link(PortRef::new(9, 0));
        node.inputs[0].set_value(4.0);
        node.run(48000.0, &HostInputs::default());
        assert_eq!(node.outputs()[0].value(), 8.0);
    }

    #[test]
    fn set_param_rejects_unknown_names() {
        let mut node = doubler();
        assert!(node.set_param("value", 2.0));
        assert_eq!(node.param("VALUE"), Some(2.0));
        assert!(!node.set_param("CUTOFF", 2.0));
    }

    #[test]
    fn out_of_range_access_is_silent() {
        let host = HostInputs::default();
        let inputs = [Port::new()];
        let mut outputs = [Port::new()];
        let mut frame = Frame::new(48000.0, &host, &inputs, &[], &mut outputs);
        assert_eq!(frame.input(5), 0.0);
        assert_eq!(frame.param(0), 0.0);
        frame.set_output(3, 1.0);
        assert_eq!(frame.output(0), 0.0);
    }
}
