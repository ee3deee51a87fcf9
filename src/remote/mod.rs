pub mod client;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use client::{DEFAULT_API_URL, TaskApiClient};

/// Which remote call failed. The label is part of every error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Add,
    Update,
    Delete,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fetch => "Fetch Task",
            Self::Add => "Add Task",
            Self::Update => "Update Task",
            Self::Delete => "Delete Task",
        }
    }

    pub fn method(&self) -> reqwest::Method {
        match self {
            Self::Fetch => reqwest::Method::GET,
            Self::Add => reqwest::Method::POST,
            Self::Update => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors from the task resource. Cheap to clone so one failed read can be
/// handed to every caller that waited on it.
#[derive(Debug, Clone, Error)]
pub enum TaskApiError {
    /// The server answered with a non-success status.
    #[error("{operation} failed: {status} {status_text}")]
    RequestFailed {
        operation: Operation,
        status: u16,
        status_text: String,
        url: String,
    },
    /// No usable response: connection failure or an undecodable body.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: Operation,
        url: String,
        #[source]
        source: Arc<reqwest::Error>,
    },
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] Arc<reqwest::Error>),
}

impl TaskApiError {
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::RequestFailed { operation, .. } | Self::Transport { operation, .. } => {
                Some(*operation)
            }
            Self::Client(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn transport(operation: Operation, url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            operation,
            url: url.to_string(),
            source: Arc::new(source),
        }
    }
}
