use std::io;

use thiserror::Error;

use crate::Axis;

pub type Result<T> = std::result::Result<T, TetraError>;

/// Errors that abort an export. Skipped faces are not errors, they are
/// reported through [`crate::ExportStats::warnings`].
#[derive(Debug, Error)]
pub enum TetraError {
    /// No object could be selected, or the selected object has no faces to
    /// export.
    #[error("invalid selection: {reason}")]
    InvalidSelection { reason: String },

    /// Forward and up lie on the same axis, which leaves the right axis
    /// undefined.
    #[error("forward axis {forward} and up axis {up} are parallel")]
    InvalidAxisConfig { forward: Axis, up: Axis },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TetraError {
    pub fn invalid_selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }
}
