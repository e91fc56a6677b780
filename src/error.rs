use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to reach the cluster: {reason}")]
    ClusterUnreachable { reason: String },

    #[error("listing {resource} in namespace {namespace} failed: {reason}")]
    ApiRequestFailed {
        resource: &'static str,
        namespace: String,
        reason: String,
    },

    #[error("cannot render diagram to {}: {reason}", path.display())]
    RenderingUnavailable { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot serialize resources: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl Error {
    /// Classify a failed list call: API responses are request failures,
    /// everything else means the server could not be reached.
    pub fn from_list(resource: &'static str, namespace: &str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(_) => Error::ApiRequestFailed {
                resource,
                namespace: namespace.to_string(),
                reason: err.to_string(),
            },
            other => Error::ClusterUnreachable {
                reason: other.to_string(),
            },
        }
    }

    pub fn unreachable(err: impl std::fmt::Display) -> Self {
        Error::ClusterUnreachable {
            reason: err.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    #[test]
    fn test_api_response_is_request_failure() {
        let err = kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "namespaces \"missing\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        });

        match Error::from_list("pods", "missing", err) {
            Error::ApiRequestFailed {
                resource,
                namespace,
                reason,
            } => {
                assert_eq!(resource, "pods");
                assert_eq!(namespace, "missing");
                assert!(reason.contains("not found"));
            }
            other => panic!("expected ApiRequestFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_failure_is_unreachable() {
        let err = kube::Error::ReadEvents(std::io::Error::other("connection reset by peer"));
        let mapped = Error::from_list("pods", "default", err);
        assert!(matches!(mapped, Error::ClusterUnreachable { .. }));
        assert!(mapped.to_string().contains("connection reset by peer"));
    }
}
