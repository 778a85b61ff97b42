use anyhow::Result;

use crate::node::{Frame, Processor};
use crate::patch::NodeConfig;
use crate::registry::Module;
use crate::types::NodeSchema;

fn binary_schema(name: &str, description: &str) -> NodeSchema {
    NodeSchema::new(name, description)
        .input("A", "first operand")
        .input("B", "second operand")
        .output("OUT", "result")
}

macro_rules! binary_op {
    ($name:ident, $tag:literal, $description:literal, |$a:ident, $b:ident| $body:expr) => {
        #[derive(Default)]
        pub struct $name;

        impl Processor for $name {
            fn process(&mut self, frame: &mut Frame<'_>) {
                let $a = frame.input(0);
                let $b = frame.input(1);
                frame.set_output(0, $body);
            }
        }

        impl Module for $name {
            fn get_schema() -> NodeSchema {
                binary_schema($tag, $description)
            }

            fn construct(_config: &NodeConfig) -> Result<Self> {
                Ok(Self)
            }
        }
    };
}

binary_op!(Addition, "ADDITION", "A + B", |a, b| a + b);
binary_op!(Subtraction, "SUBTRACTION", "A - B", |a, b| a - b);
binary_op!(Multiplication, "MULTIPLICATION", "A * B", |a, b| a * b);
binary_op!(Division, "DIVISION", "A / B, 0 when B is 0", |a, b| {
    if b == 0.0 { 0.0 } else { a / b }
});

const GAIN: usize = 0;

#[derive(Default)]
pub struct Amplifier;

impl Processor for Amplifier {
    fn process(&mut self, frame: &mut Frame<'_>) {
        let out = frame.input(0) * frame.param(GAIN);
        frame.set_output(0, out);
    }
}

impl Module for Amplifier {
    fn get_schema() -> NodeSchema {
        NodeSchema::new("AMPLIFIER", "Fixed gain stage")
            .input("IN", "signal input")
            .output("OUT", "amplified signal")
            .param("GAIN", "linear gain", 1.0)
    }

    fn construct(_config: &NodeConfig) -> Result<Self> {
        Ok(Self)
    }
}
