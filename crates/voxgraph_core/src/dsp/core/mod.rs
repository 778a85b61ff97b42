use crate::registry::{ConstructorMap, Module};
use crate::types::NodeSchema;

pub mod arithmetic;
pub mod io;
pub mod mixer;
pub mod selector;
pub mod vca;

use arithmetic::{Addition, Amplifier, Division, Multiplication, Subtraction};
use io::{GateInput, MacroInputPort, MacroOutputPort, Output, ParamInput, PitchInput};
use mixer::Mixer;
use selector::Selector;
use vca::{ExponentialVca, LinearVca};

pub fn install_constructors(map: &mut ConstructorMap) {
    Output::install_constructor(map);
    PitchInput::install_constructor(map);
    GateInput::install_constructor(map);
    ParamInput::<1>::install_constructor(map);
    ParamInput::<2>::install_constructor(map);
    ParamInput::<3>::install_constructor(map);
    ParamInput::<4>::install_constructor(map);
    ParamInput::<5>::install_constructor(map);
    ParamInput::<6>::install_constructor(map);
    ParamInput::<7>::install_constructor(map);
    ParamInput::<8>::install_constructor(map);
    MacroInputPort::install_constructor(map);
    MacroOutputPort::install_constructor(map);
    Addition::install_constructor(map);
    Subtraction::install_constructor(map);
    Multiplication::install_constructor(map);
    Division::install_constructor(map);
    Amplifier::install_constructor(map);
    Mixer::<2>::install_constructor(map);
    Mixer::<3>::install_constructor(map);
    Mixer::<4>::install_constructor(map);
    Mixer::<8>::install_constructor(map);
    Selector::<2>::install_constructor(map);
    Selector::<3>::install_constructor(map);
    Selector::<4>::install_constructor(map);
    Selector::<6>::install_constructor(map);
    Selector::<8>::install_constructor(map);
    LinearVca::install_constructor(map);
    ExponentialVca::install_constructor(map);
}

pub fn schemas() -> Vec<NodeSchema> {
    vec![
        Output::get_schema(),
        PitchInput::get_schema(),
        GateInput::get_schema(),
        ParamInput::<1>::get_schema(),
        ParamInput::<2>::get_schema(),
        ParamInput::<3>::get_schema(),
        ParamInput::<4>::get_schema(),
        ParamInput::<5>::get_schema(),
        ParamInput::<6>::get_schema(),
        ParamInput::<7>::get_schema(),
        ParamInput::<8>::get_schema(),
        MacroInputPort::get_schema(),
        MacroOutputPort::get_schema(),
        Addition::get_schema(),
        Subtraction::get_schema(),
        Multiplication::get_schema(),
        Division::get_schema(),
        Amplifier::get_schema(),
        Mixer::<2>::get_schema(),
        Mixer::<3>::get_schema(),
        Mixer::<4>::get_schema(),
        Mixer::<8>::get_schema(),
        Selector::<2>::get_schema(),
        Selector::<3>::get_schema(),
        Selector::<4>::get_schema(),
        Selector::<6>::get_schema(),
        Selector::<8>::get_schema(),
        LinearVca::get_schema(),
        ExponentialVca::get_schema(),
    ]
}
