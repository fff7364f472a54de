//! Core of the exoscope client: observation datasets, model schemas,
//! hyperparameters and the request orchestration against the remote
//! classification service. The egui front-end in `main.rs` only consumes
//! this crate.

pub mod config;
pub mod data;
pub mod error;
pub mod hyperparams;
pub mod jobs;
pub mod projection;
pub mod service;
pub mod state;

pub use error::CoreError;
pub use state::AppState;
