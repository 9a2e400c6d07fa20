//! # PanelBridge Panel
//!
//! The isolated UI context's side of the pipeline: asks the host for
//! document text, retries whole requests, and turns the text into writing
//! suggestions through the broker.

mod error;
mod panel;
mod prompt;
mod suggestions;

pub use error::PanelError;
pub use panel::{Analysis, Panel};
pub use prompt::{chat_prompt, review_prompt, selection_prompt, truncate_chars};
pub use suggestions::{parse_suggestions, WritingSuggestion};
