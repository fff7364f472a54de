//! Wire types and client for the classification service.
//!
//! Endpoints:
//! * `GET  /datasets`              → `[PresetDescriptor]`
//! * `GET  /select-dataset/{id}`   → `{ data: [Observation] }`
//! * `POST /analyze-observation`   → [`SingleAnalysis`]
//! * `POST /analyze-dataset`       → [`BatchAnalysis`]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::http_client;
use super::ServiceError;
use crate::config::{Config, MAX_RESPONSE_BYTES};
use crate::data::model::Observation;
use crate::data::schema::ModelId;
use crate::hyperparams::HyperparameterSet;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A preset mission dataset offered by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl PresetDescriptor {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SelectDatasetResponse {
    #[serde(default)]
    data: Vec<Observation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRequest {
    pub observation: Observation,
    pub hyperparameters: HyperparameterSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRequest {
    pub observations: Vec<Observation>,
    pub hyperparameters: HyperparameterSet,
    pub model: ModelId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureImportance {
    pub name: String,
    pub importance: f64,
}

/// Outcome of a single-observation analysis. Every field is optional on
/// the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleAnalysis {
    #[serde(deserialize_with = "lenient_class")]
    pub classification: Option<i64>,
    pub confidence: Option<f64>,
    pub explanation: Option<String>,
    pub feature_importance: Vec<FeatureImportance>,
    pub probabilities: Vec<f64>,
}

/// Server-side class tallies of a batch analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSummary {
    pub total: usize,
    pub planets: usize,
    pub candidates: usize,
    pub ambiguous: usize,
    pub non_planets: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMetrics {
    pub average_confidence: Option<f64>,
    pub low_confidence_count: Option<usize>,
    pub high_confidence_count: Option<usize>,
    pub model_version: Option<String>,
}

/// Outcome of a whole-dataset analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchAnalysis {
    pub analyzed_data: Vec<Observation>,
    pub summary: Option<BatchSummary>,
    pub model_metrics: Option<ModelMetrics>,
}

/// Accept `3`, `3.0` or `"3"`; anything else reads as absent.
fn lenient_class<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

// ---------------------------------------------------------------------------
// Service contract
// ---------------------------------------------------------------------------

/// The request/response boundary of the classification service. Calls are
/// blocking; the orchestrator runs them on worker threads.
pub trait ClassifierService: Send + Sync {
    fn list_datasets(&self) -> Result<Vec<PresetDescriptor>, ServiceError>;

    fn select_dataset(&self, id: &str) -> Result<Vec<Observation>, ServiceError>;

    fn analyze_observation(
        &self,
        request: &ObservationRequest,
    ) -> Result<SingleAnalysis, ServiceError>;

    fn analyze_dataset(&self, request: &DatasetRequest) -> Result<BatchAnalysis, ServiceError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpClassifier {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpClassifier {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.api_url.clone(),
            agent: http_client::agent(config),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = self.url(path);
        log::debug!("GET {url}");
        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()
            .map_err(http_client::map_error)?;
        decode(response)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = self.url(path);
        log::debug!("POST {url}");
        let response = self
            .agent
            .post(&url)
            .set("Accept", "application/json")
            .send_json(body)
            .map_err(http_client::map_error)?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ServiceError> {
    let bytes = http_client::read_response_bytes(response, MAX_RESPONSE_BYTES)?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))
}

impl ClassifierService for HttpClassifier {
    fn list_datasets(&self) -> Result<Vec<PresetDescriptor>, ServiceError> {
        self.get_json("datasets")
    }

    fn select_dataset(&self, id: &str) -> Result<Vec<Observation>, ServiceError> {
        let response: SelectDatasetResponse = self.get_json(&format!("select-dataset/{id}"))?;
        Ok(response.data)
    }

    fn analyze_observation(
        &self,
        request: &ObservationRequest,
    ) -> Result<SingleAnalysis, ServiceError> {
        self.post_json("analyze-observation", request)
    }

    fn analyze_dataset(&self, request: &DatasetRequest) -> Result<BatchAnalysis, ServiceError> {
        self.post_json("analyze-dataset", request)
    }
}
