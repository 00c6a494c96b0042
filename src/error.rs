//! Error types for fleetwatch
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! Network failures while probing peers never show up here; they are
//! absorbed into default values inside a round (see `transport::TransportError`).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for fleetwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Peer validation errors (3xx)
    PeerDuplicateAddress = 300,
    PeerDuplicateId = 301,
    PeerInvalidInput = 302,

    // Query surface errors (4xx)
    ServerBind = 400,
    ServerFailed = 401,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Peer validation errors
            400..=499 => 40, // Query surface errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────
// Validation Errors
// ─────────────────────────────────────────────────────────────────

/// Rejected peer registry mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Another peer already uses this address
    #[error("Address {address} is already registered as peer '{existing_id}'")]
    DuplicateAddress { address: String, existing_id: String },

    /// Another peer already uses this id
    #[error("Peer id '{id}' is already registered")]
    DuplicateId { id: String },

    /// Malformed descriptor field
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: &'static str, message: String },
}

impl ValidationError {
    /// Create an invalid input error
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Whether the rejection is a conflict with an existing peer
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ValidationError::DuplicateAddress { .. } | ValidationError::DuplicateId { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Main Error
// ─────────────────────────────────────────────────────────────────

/// Main error type for fleetwatch
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Peer Registry Errors
    // ─────────────────────────────────────────────────────────────

    /// Rejected peer descriptor
    #[error("Peer rejected: {0}")]
    Validation(#[from] ValidationError),

    // ─────────────────────────────────────────────────────────────
    // Query Surface Errors
    // ─────────────────────────────────────────────────────────────

    /// Could not bind the HTTP listener
    #[error("Failed to bind query API on {addr}")]
    ServerBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP server stopped with an error
    #[error("Query API failed: {0}")]
    Server(String),

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::InternalError,

            Error::Validation(v) => match v {
                ValidationError::DuplicateAddress { .. } => ErrorCode::PeerDuplicateAddress,
                ValidationError::DuplicateId { .. } => ErrorCode::PeerDuplicateId,
                ValidationError::InvalidInput { .. } => ErrorCode::PeerInvalidInput,
            },

            Error::ServerBind { .. } => ErrorCode::ServerBind,
            Error::Server(_) => ErrorCode::ServerFailed,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'fleetwatch config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'fleetwatch config validate' to see details."
            ),
            Error::ConfigValidation { .. } | Error::Config(_) => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::Validation(ValidationError::DuplicateAddress { .. }) => Some(
                "Each peer must have its own address. Remove the existing peer first to replace it."
            ),
            Error::Validation(ValidationError::InvalidInput { .. }) => Some(
                "Peer addresses must be absolute http:// or https:// URLs."
            ),
            Error::ServerBind { .. } => Some(
                "Another process may be using the port. Change [api] listen_addr or set FLEETWATCH_API_ADDR."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            self.code().as_str(),
            self
        );

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        match self {
            Error::ConfigValidation {
                field: Some(field), ..
            } => format!("[{}] {} (field: {})", self.code().as_str(), self, field),
            _ => format!("[{}] {}", self.code().as_str(), self),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
