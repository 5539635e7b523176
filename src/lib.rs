//! The zombie arena: an [`app::Arena`] wiring the engine to a chain and local state.

pub mod app;
pub mod model;
