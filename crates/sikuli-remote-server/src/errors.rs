//! Error types for the keyword server
//!
//! `KeywordError` covers failures raised while a keyword runs; `CallError`
//! covers malformed calls that never reach a keyword. Both are translated
//! into the remote error payload by the dispatch server.

use sikuli_remote_engine::EngineError;
use sikuli_remote_protocol::Rect;
use thiserror::Error;

/// Errors raised by keyword implementations
#[derive(Debug, Error)]
pub enum KeywordError {
    /// Malformed locator syntax
    #[error("Invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// A wait state machine reached its deadline
    #[error("Timeout happened after {timeout}s, {locator} did not {goal}")]
    Timeout {
        locator: String,
        timeout: f64,
        goal: &'static str,
    },

    /// The search succeeded but the action itself failed, or a named constant did not resolve
    #[error("{operation} {target} failed: {cause}")]
    ScreenOperation {
        operation: String,
        target: String,
        cause: String,
    },

    /// A disallowed image appeared during a multi-image wait
    #[error("Unexpected image '{image}' appeared on screen")]
    UnexpectedImage { image: String },

    /// Screen id beyond the available monitors
    #[error("Screen {id} does not exist, {count} screen(s) available")]
    NoSuchScreen { id: i64, count: usize },

    /// Unknown direction token for adjacent regions
    #[error("Invalid direction '{0}', expected one of: above, below, left, right, original")]
    InvalidDirection(String),

    /// Negative or non-finite timeout
    #[error("Invalid timeout {0}: must be a non-negative number of seconds")]
    InvalidTimeout(f64),

    /// Region with a non-positive width or height
    #[error("Invalid region {0}: width and height must be positive")]
    InvalidRegion(Rect),

    /// The screen engine could not carry out a request
    #[error("Screen engine error: {0}")]
    Engine(#[from] EngineError),

    /// A bound argument is missing or has the wrong shape
    #[error(transparent)]
    Argument(#[from] CallError),
}

impl KeywordError {
    pub fn invalid_locator(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(locator: impl Into<String>, timeout: f64) -> Self {
        Self::Timeout {
            locator: locator.into(),
            timeout,
            goal: "appear",
        }
    }

    pub fn vanish_timeout(locator: impl Into<String>, timeout: f64) -> Self {
        Self::Timeout {
            locator: locator.into(),
            timeout,
            goal: "vanish",
        }
    }

    pub fn screen_operation(
        operation: impl Into<String>,
        target: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self::ScreenOperation {
            operation: operation.into(),
            target: target.into(),
            cause: cause.into(),
        }
    }

    /// An argument that parsed but lies outside what the keyword accepts
    pub fn invalid_argument(
        keyword: &str,
        param: &str,
        expected: &'static str,
        value: impl std::fmt::Display,
    ) -> Self {
        Self::Argument(CallError::Coercion {
            keyword: keyword.to_string(),
            param: param.to_string(),
            expected,
            value: value.to_string(),
        })
    }

    /// A special key, mouse button or modifier token that names nothing
    pub fn unresolved_constant(kind: &str, token: &str) -> Self {
        Self::screen_operation(
            format!("Resolve {}", kind),
            format!("'{}'", token),
            "no such constant",
        )
    }

    /// Error class name reported to remote callers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidLocator { .. } => "InvalidLocatorError",
            Self::Timeout { .. } => "TimeoutError",
            Self::ScreenOperation { .. } => "ScreenOperationError",
            Self::UnexpectedImage { .. } => "UnexpectedImageError",
            Self::NoSuchScreen { .. } => "NoSuchScreenError",
            Self::InvalidDirection(_) => "InvalidDirectionError",
            Self::InvalidTimeout(_) => "InvalidTimeoutError",
            Self::InvalidRegion(_) => "InvalidRegionError",
            Self::Engine(_) => "ScreenEngineError",
            Self::Argument(e) => e.kind(),
        }
    }

    /// Locator, timeout and argument errors are the caller's fault even though a keyword raised them
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidLocator { .. } | Self::InvalidTimeout(_) | Self::Argument(_)
        )
    }
}

pub type KeywordResult<T> = Result<T, KeywordError>;

/// Errors in the shape of a remote call
#[derive(Debug, Error)]
pub enum CallError {
    #[error("No keyword with name '{0}' found")]
    NoSuchKeyword(String),

    #[error("Keyword '{name}' expected {expected} argument(s), got {given}")]
    NoSuchOverload {
        name: String,
        expected: String,
        given: usize,
    },

    #[error("Argument '{param}' of keyword '{keyword}' expected {expected}, got {value}")]
    Coercion {
        keyword: String,
        param: String,
        expected: &'static str,
        value: String,
    },

    #[error("Keyword '{keyword}' got an unexpected argument '{param}'")]
    UnexpectedArgument { keyword: String, param: String },

    #[error("Keyword '{keyword}' got multiple values for argument '{param}'")]
    DuplicateArgument { keyword: String, param: String },

    #[error("Keyword '{keyword}' is missing a value for argument '{param}'")]
    MissingArgument { keyword: String, param: String },
}

impl CallError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoSuchKeyword(_) => "NoSuchKeywordError",
            Self::NoSuchOverload { .. } => "NoSuchOverloadError",
            Self::Coercion { .. } => "ArgumentCoercionError",
            Self::UnexpectedArgument { .. } => "UnexpectedArgumentError",
            Self::DuplicateArgument { .. } => "DuplicateArgumentError",
            Self::MissingArgument { .. } => "MissingArgumentError",
        }
    }
}
