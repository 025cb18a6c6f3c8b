//! Domain error types.

/// Top-level error type for marketlab.
#[derive(Debug, thiserror::Error)]
pub enum MarketlabError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("no data for {symbol} in the requested range")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {points} points, need {minimum}")]
    InsufficientData {
        symbol: String,
        points: usize,
        minimum: usize,
    },

    #[error("grid too large: {combinations} combinations, maximum {maximum}")]
    GridTooLarge {
        combinations: usize,
        maximum: usize,
    },

    #[error("optimization exceeded budget of {budget_secs} s")]
    Timeout { budget_secs: u64 },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MarketlabError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        MarketlabError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&MarketlabError> for std::process::ExitCode {
    fn from(err: &MarketlabError) -> Self {
        let code: u8 = match err {
            MarketlabError::Io(_) => 1,
            MarketlabError::ConfigParse { .. } | MarketlabError::ConfigInvalid { .. } => 2,
            MarketlabError::DataSource { .. } => 3,
            MarketlabError::InvalidInput { .. } => 4,
            MarketlabError::NoData { .. } | MarketlabError::InsufficientData { .. } => 5,
            MarketlabError::GridTooLarge { .. } | MarketlabError::Timeout { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
