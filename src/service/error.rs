use thiserror::Error;

use crate::pipeline::PipelineError;

/// Request-level failure, split by who has to fix it
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Bad input: wrong file type, malformed body, missing columns
    #[error("{0}")]
    Client(String),
    /// Anything else, including model failures
    #[error("{0}")]
    Server(String),
}

impl ServiceError {
    /// HTTP-style status code
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Client(_) => 400,
            ServiceError::Server(_) => 500,
        }
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceError::Client(_) => 2,
            ServiceError::Server(_) => 1,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::Client(_))
    }
}

impl From<PipelineError> for ServiceError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MissingColumns { .. } | PipelineError::Transform { .. } => {
                ServiceError::Client(err.to_string())
            }
            PipelineError::Schema(_)
            | PipelineError::UpstreamModel(_)
            | PipelineError::Artifact { .. } => ServiceError::Server(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_is_client_error() {
        let err: ServiceError = PipelineError::missing_columns(["DTI_Ratio"]).into();
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("DTI_Ratio"));
    }

    #[test]
    fn test_model_failure_is_server_error() {
        let err: ServiceError = PipelineError::UpstreamModel("boom".to_string()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "model error: boom");
    }
}
