use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{context}: {source}")]
    Engine {
        context: String,
        #[source]
        source: engine::EngineError,
    },
    #[error("no input file: pass --input or set ledger.input")]
    MissingInput,
}

impl AppError {
    pub fn engine(context: impl Into<String>, source: engine::EngineError) -> Self {
        Self::Engine {
            context: context.into(),
            source,
        }
    }

    /// Defects exit with a different status than rejected input.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Engine { source, .. } if source.is_defect() => 70,
            Self::Engine { .. } => 65,
            Self::Config(_) | Self::MissingInput => 78,
            Self::Io(_) | Self::Json(_) => 66,
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::{EngineError, Money, UserId};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(EngineError::NoParticipants, 65)]
    #[case(EngineError::PayerNotParticipant(UserId::from("ann")), 65)]
    #[case(EngineError::Overflow, 70)]
    #[case(EngineError::UnbalancedInput(Money::new(1, engine::Currency::Eur)), 70)]
    fn engine_errors_map_to_exit_codes(#[case] source: EngineError, #[case] expected: u8) {
        assert_eq!(AppError::engine("expense #1", source).exit_code(), expected);
    }

    #[test]
    fn context_prefixes_message() {
        let err = AppError::engine("expense #4 (Taxi)", EngineError::NoParticipants);
        assert!(err.to_string().starts_with("expense #4 (Taxi): "));
        assert_eq!(AppError::MissingInput.exit_code(), 78);
    }
}
