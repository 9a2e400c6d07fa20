//! Error types for the PanelBridge protocol layer.

mod pipeline;
mod provider;
mod settings;

pub use pipeline::*;
pub use provider::*;
pub use settings::*;
