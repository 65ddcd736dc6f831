use thiserror::Error;

use crate::content::PanelId;

/// Failures at the boundary between the host and the core.
///
/// Geometry and gesture code never fail; they skip or ignore bad input.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    #[error("duplicate panel id '{0}'")]
    DuplicatePanel(PanelId),

    #[error("unknown panel '{0}'")]
    UnknownPanel(PanelId),

    #[error("unknown theme '{0}'")]
    UnknownTheme(String),
}
