//! Controller-layer event and command orchestration for the payment GUI.

pub mod events;
pub mod orchestration;
