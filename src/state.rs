use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::data::model::{FieldValue, Observation};
use crate::data::schema::{ModelId, ModelProfile};
use crate::data::store::{AnalysisResult, DatasetStore};
use crate::error::CoreError;
use crate::hyperparams::HyperparameterStore;
use crate::jobs::{JobMessage, Jobs};
use crate::service::{
    ClassifierService, DatasetRequest, HttpClassifier, ObservationRequest, PresetDescriptor,
};

// ---------------------------------------------------------------------------
// Request flows
// ---------------------------------------------------------------------------

/// The independent request flows. Each has its own lifecycle and error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    PresetCatalog,
    LoadPreset,
    CsvImport,
    AnalyzeSingle,
    AnalyzeBatch,
}

impl Flow {
    pub const ALL: [Flow; 5] = [
        Flow::PresetCatalog,
        Flow::LoadPreset,
        Flow::CsvImport,
        Flow::AnalyzeSingle,
        Flow::AnalyzeBatch,
    ];

    fn index(self) -> usize {
        match self {
            Flow::PresetCatalog => 0,
            Flow::LoadPreset => 1,
            Flow::CsvImport => 2,
            Flow::AnalyzeSingle => 3,
            Flow::AnalyzeBatch => 4,
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Flow::PresetCatalog => "Dataset catalog refresh",
            Flow::LoadPreset => "Dataset loading",
            Flow::CsvImport => "CSV import",
            Flow::AnalyzeSingle => "Observation analysis",
            Flow::AnalyzeBatch => "Dataset analysis",
        })
    }
}

/// `Idle → Pending → Resolved | Failed`, re-armed by the next trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowState {
    #[default]
    Idle,
    Pending,
    Resolved,
    Failed(String),
}

impl FlowState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FlowState::Pending)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FlowState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Built-in preset catalog, replaced by the service's list when available.
pub fn default_presets() -> Vec<PresetDescriptor> {
    vec![
        PresetDescriptor::new("kepler", "Kepler", "Kepler mission exoplanet data"),
        PresetDescriptor::new("k2", "K2", "K2 mission extended data"),
        PresetDescriptor::new("tess", "TESS", "TESS mission exoplanet data"),
    ]
}

/// Which model schema a preset's rows are shaped for.
pub fn preset_model(preset_id: &str) -> Result<ModelId, CoreError> {
    match preset_id.trim().to_ascii_lowercase().as_str() {
        "kepler" | "k2" => Ok(ModelId::Kepler),
        "tess" => Ok(ModelId::Tess),
        _ => Err(CoreError::UnknownModel(preset_id.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full client state, independent of rendering.
///
/// All mutation goes through the methods below. Background responses are
/// applied in [`AppState::poll_jobs`], on the same thread that triggers
/// requests, so no caller ever sees a half-applied update.
pub struct AppState {
    active_model: ModelId,
    dataset: DatasetStore,
    hyperparams: HyperparameterStore,

    /// Preset catalog shown in the dataset menu.
    presets: Vec<PresetDescriptor>,
    /// Id of the preset the dataset came from, if any.
    selected_preset: Option<String>,

    /// Manual entry draft for the active model.
    form: Observation,
    form_error: Option<String>,

    flows: [FlowState; 5],
    /// Generation of a preset dataset whose automatic analysis had to wait
    /// for an older batch request to settle.
    deferred_batch: Option<u64>,
    jobs: Jobs,
}

impl AppState {
    /// State talking to the HTTP service described by `config`.
    pub fn new(config: &Config) -> Self {
        log::info!("Using classification service at {}", config.api_url);
        Self::with_service(Arc::new(HttpClassifier::new(config)))
    }

    pub fn with_service(service: Arc<dyn ClassifierService>) -> Self {
        let active_model = ModelId::default();
        Self {
            active_model,
            dataset: DatasetStore::new(),
            hyperparams: HyperparameterStore::new(),
            presets: default_presets(),
            selected_preset: None,
            form: active_model.profile().default_values(),
            form_error: None,
            flows: Default::default(),
            deferred_batch: None,
            jobs: Jobs::new(service),
        }
    }

    // -- Read access --

    pub fn active_model(&self) -> ModelId {
        self.active_model
    }

    pub fn profile(&self) -> &'static ModelProfile {
        self.active_model.profile()
    }

    pub fn dataset(&self) -> &DatasetStore {
        &self.dataset
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.dataset.result()
    }

    pub fn hyperparams(&self) -> &HyperparameterStore {
        &self.hyperparams
    }

    /// Hyperparameter edits never affect requests already in flight.
    pub fn hyperparams_mut(&mut self) -> &mut HyperparameterStore {
        &mut self.hyperparams
    }

    pub fn presets(&self) -> &[PresetDescriptor] {
        &self.presets
    }

    pub fn selected_preset(&self) -> Option<&str> {
        self.selected_preset.as_deref()
    }

    pub fn flow(&self, flow: Flow) -> &FlowState {
        &self.flows[flow.index()]
    }

    fn set_flow(&mut self, flow: Flow, state: FlowState) {
        self.flows[flow.index()] = state;
    }

    pub fn is_busy(&self) -> bool {
        self.flows.iter().any(FlowState::is_pending)
    }

    /// Every non-empty error message, one per flow plus the entry form.
    pub fn errors(&self) -> Vec<(String, &str)> {
        let mut errors: Vec<(String, &str)> = Flow::ALL
            .iter()
            .filter_map(|&flow| self.flow(flow).error().map(|msg| (flow.to_string(), msg)))
            .collect();
        if let Some(msg) = &self.form_error {
            errors.push(("Observation entry".to_string(), msg.as_str()));
        }
        errors
    }

    // -- Model selection --

    /// Switch the active schema. Selection and result are dropped since
    /// neither carries over between models.
    pub fn set_active_model(&mut self, model: ModelId) {
        log::info!("Active model: {} → {}", self.active_model, model);
        self.active_model = model;
        self.dataset.invalidate_schema();
        self.form = model.profile().default_values();
        self.form_error = None;
    }

    // -- Dataset operations --

    pub fn append_observation(&mut self, observation: Observation) -> Result<usize, CoreError> {
        self.dataset.append(observation, self.active_model.profile())
    }

    pub fn remove_observation(&mut self, index: usize) -> Result<Observation, CoreError> {
        self.dataset.remove_at(index)
    }

    pub fn clear_dataset(&mut self) {
        self.dataset.clear();
        self.selected_preset = None;
        log::info!("Dataset cleared");
    }

    /// Choose the observation used by [`AppState::analyze_single`].
    pub fn select_observation(&mut self, index: usize) -> Result<(), CoreError> {
        self.dataset.select(index)
    }

    pub fn deselect_observation(&mut self) {
        self.dataset.deselect();
    }

    // -- Manual entry form --

    pub fn form(&self) -> &Observation {
        &self.form
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn set_form_value(&mut self, key: &str, raw: &str) {
        self.form.insert(key, FieldValue::coerce(raw));
    }

    pub fn reset_form(&mut self) {
        self.form = self.active_model.profile().default_values();
        self.form_error = None;
    }

    /// Append the form draft to the dataset. On failure the draft is kept
    /// and the error lands in the form's error slot.
    pub fn submit_form(&mut self) -> Result<usize, CoreError> {
        match self.append_observation(self.form.clone()) {
            Ok(index) => {
                log::info!("Added observation #{index}");
                self.reset_form();
                Ok(index)
            }
            Err(e) => {
                self.form_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // -- Errors / reset --

    /// Wipe every error message. Pending flows are left alone.
    pub fn clear_errors(&mut self) {
        for state in &mut self.flows {
            if let FlowState::Failed(_) = state {
                *state = FlowState::Idle;
            }
        }
        self.form_error = None;
    }

    pub fn reset_all(&mut self) {
        self.clear_dataset();
        self.clear_errors();
        self.reset_form();
    }

    // -- Request triggers --

    fn begin(&mut self, flow: Flow) -> Result<(), CoreError> {
        if self.flow(flow).is_pending() {
            log::debug!("{flow} rejected: already pending");
            return Err(CoreError::AlreadyInProgress(flow));
        }
        Ok(())
    }

    /// Fetch the preset catalog from the service.
    pub fn refresh_presets(&mut self) -> Result<(), CoreError> {
        self.begin(Flow::PresetCatalog)?;
        self.set_flow(Flow::PresetCatalog, FlowState::Pending);
        self.jobs.list_presets();
        Ok(())
    }

    /// Switch to the preset's model, fetch its rows, replace the dataset and
    /// then run a batch analysis with the hyperparameters current at that
    /// moment.
    pub fn load_preset(&mut self, preset_id: &str) -> Result<(), CoreError> {
        self.begin(Flow::LoadPreset)?;
        let preset_id = preset_id.trim().to_ascii_lowercase();
        let model = preset_model(&preset_id)?;
        self.set_active_model(model);
        self.selected_preset = Some(preset_id.clone());
        self.set_flow(Flow::LoadPreset, FlowState::Pending);
        log::info!("Loading preset dataset {preset_id:?} for the {model} model");
        self.jobs.load_preset(preset_id, self.dataset.generation());
        Ok(())
    }

    /// Read a CSV file in the background and replace the dataset with it.
    /// No analysis is started.
    pub fn import_csv(&mut self, path: PathBuf) -> Result<(), CoreError> {
        self.begin(Flow::CsvImport)?;
        self.set_flow(Flow::CsvImport, FlowState::Pending);
        log::info!("Importing CSV {}", path.display());
        self.jobs
            .import_csv(path, self.active_model, self.dataset.generation());
        Ok(())
    }

    /// Analyse the selected observation.
    pub fn analyze_single(&mut self) -> Result<(), CoreError> {
        self.begin(Flow::AnalyzeSingle)?;
        let index = self.dataset.selection().ok_or(CoreError::NoSelection)?;
        let observation = self
            .dataset
            .get(index)
            .cloned()
            .ok_or(CoreError::NoSelection)?;
        let request = ObservationRequest {
            observation,
            hyperparameters: self.hyperparams.current().clone(),
        };
        self.set_flow(Flow::AnalyzeSingle, FlowState::Pending);
        log::info!("Analysing observation #{index}");
        self.jobs
            .analyze_single(self.dataset.generation(), index, request);
        Ok(())
    }

    /// Analyse the whole dataset with the active model.
    pub fn analyze_batch(&mut self) -> Result<(), CoreError> {
        self.begin(Flow::AnalyzeBatch)?;
        if self.dataset.is_empty() {
            return Err(CoreError::EmptyDataset);
        }
        let request = DatasetRequest {
            observations: self.dataset.observations().to_vec(),
            hyperparameters: self.hyperparams.current().clone(),
            model: self.active_model,
        };
        self.set_flow(Flow::AnalyzeBatch, FlowState::Pending);
        log::info!(
            "Analysing {} observations with the {} model",
            request.observations.len(),
            request.model
        );
        self.jobs.analyze_batch(self.dataset.generation(), request);
        Ok(())
    }

    // -- Completion handling --

    /// Apply every finished background request. Returns how many were
    /// handled.
    pub fn poll_jobs(&mut self) -> usize {
        let mut handled = 0;
        while let Some(message) = self.jobs.try_recv() {
            self.apply(message);
            handled += 1;
        }
        handled
    }

    /// Block until one background request finishes or `timeout` elapses.
    pub fn wait_for_job(&mut self, timeout: Duration) -> bool {
        match self.jobs.recv_timeout(timeout) {
            Some(message) => {
                self.apply(message);
                true
            }
            None => false,
        }
    }

    fn fail(&mut self, flow: Flow, message: String) {
        log::error!("{flow} failed: {message}");
        self.set_flow(flow, FlowState::Failed(message));
    }

    fn discard(&mut self, flow: Flow, why: &str) {
        log::warn!("Discarding {flow} response: {why}");
        self.set_flow(flow, FlowState::Idle);
    }

    /// Analyse a freshly loaded preset. An older batch request still in
    /// flight is stale by now; the analysis waits for it to settle.
    fn start_preset_analysis(&mut self) {
        match self.analyze_batch() {
            Ok(()) => {}
            Err(CoreError::AlreadyInProgress(_)) => {
                log::info!("Preset analysis waits for the running batch request");
                self.deferred_batch = Some(self.dataset.generation());
            }
            Err(e) => self.fail(Flow::AnalyzeBatch, e.to_string()),
        }
    }

    fn run_deferred_batch(&mut self) {
        let Some(generation) = self.deferred_batch.take() else {
            return;
        };
        if generation != self.dataset.generation() {
            log::debug!("Deferred preset analysis dropped: dataset changed");
            return;
        }
        if let Err(e) = self.analyze_batch() {
            self.fail(Flow::AnalyzeBatch, e.to_string());
        }
    }

    fn apply(&mut self, message: JobMessage) {
        match message {
            JobMessage::PresetsListed(result) => match result {
                Ok(presets) => {
                    log::info!("Service offers {} preset datasets", presets.len());
                    self.presets = presets;
                    self.set_flow(Flow::PresetCatalog, FlowState::Resolved);
                }
                Err(e) => self.fail(Flow::PresetCatalog, e.to_string()),
            },
            JobMessage::PresetLoaded {
                preset_id,
                generation,
                result,
            } => {
                if generation != self.dataset.generation() {
                    self.discard(Flow::LoadPreset, "dataset changed while in flight");
                    return;
                }
                match result {
                    Ok(rows) => {
                        log::info!("Preset {preset_id:?} loaded with {} rows", rows.len());
                        self.dataset.replace(rows);
                        self.selected_preset = Some(preset_id);
                        self.set_flow(Flow::LoadPreset, FlowState::Resolved);
                        self.start_preset_analysis();
                    }
                    Err(e) => self.fail(Flow::LoadPreset, e.to_string()),
                }
            }
            JobMessage::CsvImported {
                path,
                generation,
                result,
            } => {
                if generation != self.dataset.generation() {
                    self.discard(Flow::CsvImport, "dataset changed while in flight");
                    return;
                }
                match result {
                    Ok(rows) => {
                        log::info!("CSV {} replaced the dataset", path.display());
                        self.dataset.replace(rows);
                        self.selected_preset = None;
                        self.set_flow(Flow::CsvImport, FlowState::Resolved);
                    }
                    Err(e) => self.fail(Flow::CsvImport, e),
                }
            }
            JobMessage::SingleAnalyzed {
                generation,
                index,
                result,
            } => {
                if generation != self.dataset.generation() {
                    self.discard(Flow::AnalyzeSingle, "dataset changed while in flight");
                    return;
                }
                match result {
                    Ok(analysis) => {
                        self.dataset.merge_single(index, &analysis);
                        self.dataset.set_result(AnalysisResult::Single(analysis));
                        self.set_flow(Flow::AnalyzeSingle, FlowState::Resolved);
                    }
                    Err(e) => self.fail(Flow::AnalyzeSingle, e.to_string()),
                }
            }
            JobMessage::BatchAnalyzed { generation, result } => {
                if generation != self.dataset.generation() {
                    self.discard(Flow::AnalyzeBatch, "dataset changed while in flight");
                    self.run_deferred_batch();
                    return;
                }
                let mut analysis = match result {
                    Ok(analysis) => analysis,
                    Err(e) => return self.fail(Flow::AnalyzeBatch, e.to_string()),
                };
                let rows = std::mem::take(&mut analysis.analyzed_data);
                match self.dataset.annotate_all(rows) {
                    Ok(()) => {
                        self.dataset.set_result(AnalysisResult::Batch(analysis));
                        self.set_flow(Flow::AnalyzeBatch, FlowState::Resolved);
                    }
                    Err(e) => self.fail(Flow::AnalyzeBatch, e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
