/// Errors raised by the analysis core (segmentation, fitting, derivatives).
///
/// Every operation either succeeds completely or returns one of these; there
/// are no partial results.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DilError {
    /// A channel the operation depends on is empty.
    #[error("missing channel: {0}")]
    MissingChannel(String),

    /// Malformed numeric parameters (window size, lengths, intervals).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The least-squares problem is under-determined or the solver gave up.
    #[error("fit did not converge: {0}")]
    FitDidNotConverge(String),

    /// A container or list with zero rows/items where at least one is needed.
    #[error("empty input: {0}")]
    EmptyInput(String),
}

impl DilError {
    pub fn missing_channel(msg: impl Into<String>) -> Self {
        Self::MissingChannel(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn fit_did_not_converge(msg: impl Into<String>) -> Self {
        Self::FitDidNotConverge(msg.into())
    }

    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// Process exit code used when the error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            DilError::InvalidArgument(_) => 2,
            DilError::MissingChannel(_) | DilError::EmptyInput(_) => 3,
            DilError::FitDidNotConverge(_) => 4,
        }
    }
}

/// Application-level error: a message plus the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Prefix the message with some context (usually the input file).
    pub fn context(self, ctx: impl std::fmt::Display) -> Self {
        Self {
            exit_code: self.exit_code,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl From<DilError> for AppError {
    fn from(err: DilError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dil_error_maps_to_exit_codes() {
        let e: AppError = DilError::invalid_argument("window must be >= 1").into();
        assert_eq!(e.exit_code(), 2);
        assert_eq!(e.to_string(), "invalid argument: window must be >= 1");

        let e: AppError = DilError::missing_channel("nominal temperature").into();
        assert_eq!(e.exit_code(), 3);

        let e: AppError = DilError::fit_did_not_converge("max iterations").into();
        assert_eq!(e.exit_code(), 4);
    }

    #[test]
    fn context_prefixes_message() {
        let e = AppError::new(2, "bad header").context("run.asc");
        assert_eq!(e.to_string(), "run.asc: bad header");
        assert_eq!(e.exit_code(), 2);
    }
}
