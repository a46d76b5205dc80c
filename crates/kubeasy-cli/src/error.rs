//! CLI error types with exit code handling

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Bad user input: unknown challenge, invalid slug, broken schema
    #[error("{message}")]
    #[diagnostic(code(kubeasy::cli::input))]
    UserInput {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The cluster said no
    #[error("Cluster error: {message}")]
    #[diagnostic(code(kubeasy::cli::cluster))]
    Cluster { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(kubeasy::cli::io))]
    Io { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::UserInput { .. } => exit_codes::ERROR,
            CliError::Cluster { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error with a help line
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::UserInput {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<kubeasy_core::CoreError> for CliError {
    fn from(err: kubeasy_core::CoreError) -> Self {
        match err {
            kubeasy_core::CoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::UserInput {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

impl From<kubeasy_kube::KubeError> for CliError {
    fn from(err: kubeasy_kube::KubeError) -> Self {
        CliError::Cluster {
            message: err.to_string(),
        }
    }
}

impl From<kube::Error> for CliError {
    fn from(err: kube::Error) -> Self {
        CliError::Cluster {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
