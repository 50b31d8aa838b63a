use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown node: {0}")]
    UnknownNode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{format} export failed: {message}")]
    Export {
        format: &'static str,
        message: String,
    },
    #[error("failed to load {path}: {message}")]
    Import { path: String, message: String },
}

impl NodeError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        NodeError::InvalidInput(message.into())
    }

    pub fn export(format: &'static str, message: impl ToString) -> Self {
        NodeError::Export {
            format,
            message: message.to_string(),
        }
    }

    pub fn import(path: impl Into<String>, message: impl ToString) -> Self {
        NodeError::Import {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
