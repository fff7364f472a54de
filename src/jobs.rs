//! Background requests. Each request runs on its own worker thread and
//! reports back through a channel that the UI thread drains; state is only
//! ever mutated on the receiving side.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::data::loader;
use crate::data::model::Observation;
use crate::data::schema::ModelId;
use crate::service::{
    BatchAnalysis, ClassifierService, DatasetRequest, ObservationRequest, PresetDescriptor,
    ServiceError, SingleAnalysis,
};

/// Completion of one background request, tagged with what it was issued
/// against so stale outcomes can be recognised.
#[derive(Debug)]
pub enum JobMessage {
    PresetsListed(Result<Vec<PresetDescriptor>, ServiceError>),
    PresetLoaded {
        preset_id: String,
        generation: u64,
        result: Result<Vec<Observation>, ServiceError>,
    },
    CsvImported {
        path: PathBuf,
        generation: u64,
        result: Result<Vec<Observation>, String>,
    },
    SingleAnalyzed {
        generation: u64,
        index: usize,
        result: Result<SingleAnalysis, ServiceError>,
    },
    BatchAnalyzed {
        generation: u64,
        result: Result<BatchAnalysis, ServiceError>,
    },
}

pub struct Jobs {
    service: Arc<dyn ClassifierService>,
    tx: Sender<JobMessage>,
    rx: Receiver<JobMessage>,
}

impl Jobs {
    pub fn new(service: Arc<dyn ClassifierService>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { service, tx, rx }
    }

    fn spawn<F>(&self, work: F)
    where
        F: FnOnce(&dyn ClassifierService) -> JobMessage + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let message = work(service.as_ref());
            // The receiver only goes away when the app shuts down.
            let _ = tx.send(message);
        });
    }

    pub fn list_presets(&self) {
        self.spawn(|service| JobMessage::PresetsListed(service.list_datasets()));
    }

    pub fn load_preset(&self, preset_id: String, generation: u64) {
        self.spawn(move |service| {
            let result = service.select_dataset(&preset_id);
            JobMessage::PresetLoaded {
                preset_id,
                generation,
                result,
            }
        });
    }

    /// File reading never touches the network but still runs off the UI
    /// thread.
    pub fn import_csv(&self, path: PathBuf, model: ModelId, generation: u64) {
        self.spawn(move |_| {
            let result =
                loader::load_csv_file(&path, model.profile()).map_err(|e| format!("{e:#}"));
            JobMessage::CsvImported {
                path,
                generation,
                result,
            }
        });
    }

    pub fn analyze_single(&self, generation: u64, index: usize, request: ObservationRequest) {
        self.spawn(move |service| JobMessage::SingleAnalyzed {
            generation,
            index,
            result: service.analyze_observation(&request),
        });
    }

    pub fn analyze_batch(&self, generation: u64, request: DatasetRequest) {
        self.spawn(move |service| JobMessage::BatchAnalyzed {
            generation,
            result: service.analyze_dataset(&request),
        });
    }

    pub fn try_recv(&self) -> Option<JobMessage> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<JobMessage> {
        self.rx.recv_timeout(timeout).ok()
    }
}
