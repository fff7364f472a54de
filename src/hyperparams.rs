//! Grid-search hyperparameters attached to every analysis request.
//!
//! Edits go to a staged copy first; only [`HyperparameterStore::commit`]
//! touches the set that requests read.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One parameter: a fixed value or a list of grid candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Grid(Vec<f64>),
}

impl ParamValue {
    /// Candidates as a list, a scalar being a one-element grid.
    pub fn candidates(&self) -> Vec<f64> {
        match self {
            ParamValue::Scalar(v) => vec![*v],
            ParamValue::Grid(values) => values.clone(),
        }
    }

    /// Parse `"0.01, 0.05"` style input. One number gives a scalar.
    pub fn parse(input: &str) -> Option<ParamValue> {
        let values: Option<Vec<f64>> = input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect();
        match values?.as_slice() {
            [] => None,
            [single] => Some(ParamValue::Scalar(*single)),
            many => Some(ParamValue::Grid(many.to_vec())),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(v) => write!(f, "{v}"),
            ParamValue::Grid(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

/// Parameter name → value, shared by both models.
pub type HyperparameterSet = BTreeMap<String, ParamValue>;

pub fn default_hyperparameters() -> HyperparameterSet {
    [
        ("num_leaves", vec![15.0, 31.0, 63.0]),
        ("max_depth", vec![-1.0, 5.0, 10.0]),
        ("learning_rate", vec![0.01, 0.05, 0.1]),
        ("n_estimators", vec![100.0, 300.0, 500.0]),
        ("min_child_samples", vec![20.0, 50.0]),
    ]
    .into_iter()
    .map(|(name, grid)| (name.to_string(), ParamValue::Grid(grid)))
    .collect()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HyperparameterStore {
    current: HyperparameterSet,
    staged: Option<HyperparameterSet>,
}

impl Default for HyperparameterStore {
    fn default() -> Self {
        Self {
            current: default_hyperparameters(),
            staged: None,
        }
    }
}

impl HyperparameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed set, the one requests are built from.
    pub fn current(&self) -> &HyperparameterSet {
        &self.current
    }

    pub fn staged(&self) -> Option<&HyperparameterSet> {
        self.staged.as_ref()
    }

    /// Start editing from a copy of the committed set.
    pub fn begin_edit(&mut self) -> &mut HyperparameterSet {
        self.staged.insert(self.current.clone())
    }

    /// Record a tentative draft without committing it.
    pub fn stage_edit(&mut self, draft: HyperparameterSet) {
        self.staged = Some(draft);
    }

    /// Drop the staged draft; `current` is untouched.
    pub fn discard(&mut self) {
        self.staged = None;
    }

    /// Replace the committed set with `draft` in one step.
    pub fn commit(&mut self, draft: HyperparameterSet) {
        log::info!("Committed {} hyperparameters", draft.len());
        self.current = draft;
        self.staged = None;
    }

    /// Commit whatever is staged. Returns false if nothing was staged.
    pub fn commit_staged(&mut self) -> bool {
        match self.staged.take() {
            Some(draft) => {
                self.commit(draft);
                true
            }
            None => false,
        }
    }

    pub fn reset_to_defaults(&mut self) {
        self.current = default_hyperparameters();
        self.staged = None;
    }
}
