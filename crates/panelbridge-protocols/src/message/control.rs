//! Control-channel commands.

use serde::{Deserialize, Serialize};

/// Commands pushed to the relay node or panel outside any request/response
/// pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    /// Show the panel if hidden, hide it otherwise.
    ToggleVisibility,
    /// Open the panel and run a document analysis.
    StartAnalysis,
    /// Re-read provider settings.
    ReloadSettings,
    /// The panel frame finished loading.
    PanelReady,
}
