//! # PanelBridge Protocols
//!
//! Shared definitions for the four PanelBridge contexts (extractor, relay
//! node, broker, panel). Contains the data model, the closed message enums
//! exchanged across context boundaries, and the traits standing in for
//! host-platform facilities.
//!
//! ## Core Items
//!
//! - [`ExtractionRequest`] / [`ExtractionResult`] - the correlated request pair
//! - [`FrameMessage`] / [`Envelope`] - frame-to-frame messages
//! - [`TabMessage`] / [`BrokerMessage`] / [`BusResponse`] - extension-bus messages
//! - [`HostDocument`] - read access to the host page
//! - [`CompletionProvider`] - AI text generation
//! - [`SettingsStore`] - provider/model settings

pub mod error;
pub mod extraction;
pub mod host;
pub mod ids;
pub mod message;
pub mod provider;
pub mod retry;
pub mod settings;

pub use error::{AiError, PipelineError, SettingsError};
pub use extraction::{
    ExtractionFailure, ExtractionKind, ExtractionOutcome, ExtractionRequest, ExtractionResult,
    FailureKind,
};
pub use host::{DomNode, FrameAccess, HostDocument, HostError, ScriptHandle};
pub use ids::{FrameId, RequestId, TabId};
pub use message::{
    BrokerMessage, BusResponse, ControlCommand, Envelope, FrameMessage, Responder, ResponseBody,
    TabMessage,
};
pub use provider::{AiResponse, CompletionProvider, GenerateRequest, ModelInfo, ModelValidation};
pub use retry::RetryPolicy;
pub use settings::{AiProviderKind, AiSettings, MemorySettingsStore, SettingsStore};
