//! Domain error types.

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data: have {have} bars, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("invalid bar at line {line}: {reason}")]
    InvalidBar { line: usize, reason: String },

    #[error("cannot run backtest: {reason}")]
    Configuration { reason: String },

    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("backtest cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub(crate) fn invalid_config(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SigtraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) | SigtraderError::Report { .. } => 1,
            SigtraderError::ConfigParse { .. } | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::DataLoad { .. } | SigtraderError::InvalidBar { .. } => 3,
            SigtraderError::InsufficientData { .. } | SigtraderError::Configuration { .. } => 5,
            SigtraderError::Cancelled => 6,
        };
        std::process::ExitCode::from(code)
    }
}
