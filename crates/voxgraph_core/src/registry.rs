//! Type tag → node factory.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::dsp;
use crate::node::{Node, Processor};
use crate::patch::NodeConfig;
use crate::types::NodeSchema;

pub type NodeConstructor =
    Box<dyn Fn(&NodeConfig) -> Result<Box<dyn Processor>> + Send + Sync>;

pub struct NodeType {
    pub schema: Arc<NodeSchema>,
    pub constructor: NodeConstructor,
}

pub type ConstructorMap = HashMap<String, NodeType>;

/// Implemented by every concrete node. `get_schema` fixes the type tag, ports
/// and parameters; `construct` builds fresh processing state, reading the
/// config's data blob if the type needs one.
pub trait Module: Processor + Sized + 'static {
    fn get_schema() -> NodeSchema;

    fn construct(config: &NodeConfig) -> Result<Self>;

    fn install_constructor(map: &mut ConstructorMap) {
        let schema = Arc::new(Self::get_schema());
        let constructor: NodeConstructor = Box::new(|config: &NodeConfig| {
            let processor: Box<dyn Processor> = Box::new(Self::construct(config)?);
            Ok(processor)
        });
        map.insert(
            schema.name.clone(),
            NodeType {
                schema,
                constructor,
            },
        );
    }
}

lazy_static! {
    static ref DEFAULT_REGISTRY: NodeRegistry = NodeRegistry::standard();
}

/// The full built-in catalogue, built once per process.
pub fn default_registry() -> &'static NodeRegistry {
    &DEFAULT_REGISTRY
}

#[derive(Default)]
pub struct NodeRegistry {
    types: ConstructorMap,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self {
            types: dsp::get_constructors(),
        }
    }

    pub fn register<M: Module>(&mut self) {
        M::install_constructor(&mut self.types);
    }

    pub fn get(&self, type_tag: &str) -> Option<&NodeType> {
        self.types.get(type_tag)
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.types.contains_key(type_tag)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Schemas sorted by type tag.
    pub fn schemas(&self) -> Vec<&NodeSchema> {
        let mut schemas: Vec<&NodeSchema> = self.types.values().map(|t| &*t.schema).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// `None` when the tag is not registered.
    pub fn instantiate(&self, config: &NodeConfig) -> Option<Result<Node>> {
        let node_type = self.types.get(&config.node_type)?;
        Some((node_type.constructor)(config).map(|processor| {
            Node::new(
                config.id.clone(),
                Arc::clone(&node_type.schema),
                processor,
                config.parent_id.clone(),
                config.data.clone(),
            )
        }))
    }
}
