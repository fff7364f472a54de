//! Client side of the remote classification service.

pub mod api;
pub mod http_client;

pub use api::{
    BatchAnalysis, BatchSummary, ClassifierService, DatasetRequest, FeatureImportance,
    HttpClassifier, ModelMetrics, ObservationRequest, PresetDescriptor, SingleAnalysis,
};

/// Failure talking to the service. Always recoverable; surfaced as the
/// error message of the flow that issued the request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("Server returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Response exceeded {0} bytes")]
    ResponseTooLarge(usize),
    #[error("Service returned {received} rows for {expected} observations")]
    PartialData { expected: usize, received: usize },
}
