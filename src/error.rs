//! Error taxonomy surfaced by the explorer.
//!
//! Only [`ExplorerError::AssetLoadFailure`] and
//! [`ExplorerError::ProfileFetchFailed`] ever reach the user; the other two
//! variants are logged and absorbed where they occur.

use crate::models::CountryCode;
use thiserror::Error;

/// Message shown while a profile fetch is outstanding.
pub const LOADING_MESSAGE: &str = "Loading data...";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplorerError {
    /// Map graphic unavailable; interaction is impossible until reload.
    #[error("failed to load map: {0}")]
    AssetLoadFailure(String),
    /// Profile request failed; the user may retry the last selection.
    #[error("failed to load country information for {code}: {reason}")]
    ProfileFetchFailed { code: CountryCode, reason: String },
    /// Indicator request failed; the chart is simply not shown.
    #[error("failed to load indicator data for {code}: {reason}")]
    IndicatorFetchFailed { code: CountryCode, reason: String },
    /// A persisted record could not be decoded and was evicted.
    #[error("corrupt stored record under {key:?}: {reason}")]
    StorageCorruption { key: String, reason: String },
}

/// What the presentation layer should offer next to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Reload the page/application.
    Reload,
    /// Replay the fetch for the last persisted selection.
    RetryLastSelection,
    /// Nothing to offer; the error is never shown.
    None,
}

impl ExplorerError {
    pub fn recovery(&self) -> Recovery {
        match self {
            ExplorerError::AssetLoadFailure(_) => Recovery::Reload,
            ExplorerError::ProfileFetchFailed { .. } => Recovery::RetryLastSelection,
            ExplorerError::IndicatorFetchFailed { .. } | ExplorerError::StorageCorruption { .. } => {
                Recovery::None
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.recovery() == Recovery::RetryLastSelection
    }

    /// Whether the error should be shown to the user at all.
    pub fn is_user_facing(&self) -> bool {
        self.recovery() != Recovery::None
    }

    /// Banner text for user-facing errors.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExplorerError::AssetLoadFailure(_) => "Failed to load map. Please refresh the page.",
            ExplorerError::ProfileFetchFailed { .. } => {
                "Failed to load country information. Please try again."
            }
            _ => "",
        }
    }
}
