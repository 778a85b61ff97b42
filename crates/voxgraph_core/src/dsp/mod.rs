use crate::registry::ConstructorMap;
use crate::types::NodeSchema;

pub mod core;
pub mod envelopes;
pub mod filters;
pub mod fx;
pub mod oscillators;
pub mod utilities;
pub mod utils;

pub fn get_constructors() -> ConstructorMap {
    let mut map = ConstructorMap::new();
    core::install_constructors(&mut map);
    oscillators::install_constructors(&mut map);
    filters::install_constructors(&mut map);
    envelopes::install_constructors(&mut map);
    utilities::install_constructors(&mut map);
    fx::install_constructors(&mut map);
    map
}

pub fn schema() -> Vec<NodeSchema> {
    [
        core::schemas(),
        oscillators::schemas(),
        filters::schemas(),
        envelopes::schemas(),
        utilities::schemas(),
        fx::schemas(),
    ]
    .concat()
}
