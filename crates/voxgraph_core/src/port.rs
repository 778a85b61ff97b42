/// Stable address of a port inside a [`Graph`](crate::graph::Graph) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node: usize,
    pub port: usize,
}

impl PortRef {
    pub fn new(node: usize, port: usize) -> Self {
        Self { node, port }
    }
}

/// A signal endpoint owned by one node.
///
/// On an input port `peers` are the output ports feeding it; on an output
/// port they are the input ports listening to it. An input with no peers
/// keeps whatever value was last set on it directly.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Port {
    value: f32,
    peers: Vec<PortRef>,
}

impl Port {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    pub fn peers(&self) -> &[PortRef] {
        &self.peers
    }

    pub fn is_connected(&self) -> bool {
        !self.peers.is_empty()
    }

    pub(crate) fn link(&mut self, peer: PortRef) {
        if !self.peers.contains(&peer) {
            self.peers.push(peer);
        }
    }
}
