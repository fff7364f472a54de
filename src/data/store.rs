use super::model::Observation;
use super::schema::ModelProfile;
use crate::error::CoreError;
use crate::service::{BatchAnalysis, ServiceError, SingleAnalysis};

/// Key merged into a row once the service has classified it.
pub const CLASSIFICATION_KEY: &str = "classification";
/// Key merged into a row next to its classification.
pub const CONFIDENCE_KEY: &str = "confidence";

/// The single retained analysis outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Single(SingleAnalysis),
    Batch(BatchAnalysis),
}

// ---------------------------------------------------------------------------
// DatasetStore
// ---------------------------------------------------------------------------

/// Owns the working observations, the selected row and the current result.
///
/// Every structural change (replace, append, remove, clear) bumps
/// `generation`, which in-flight requests compare against before applying
/// their response.
#[derive(Debug, Default)]
pub struct DatasetStore {
    observations: Vec<Observation>,
    selection: Option<usize>,
    result: Option<AnalysisResult>,
    generation: u64,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn get(&self, index: usize) -> Option<&Observation> {
        self.observations.get(index)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn selected(&self) -> Option<&Observation> {
        self.selection.and_then(|i| self.observations.get(i))
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    // -- Mutations --

    /// Swap in a whole new dataset. Selection and result are dropped.
    pub fn replace(&mut self, observations: Vec<Observation>) {
        self.observations = observations;
        self.selection = None;
        self.result = None;
        self.generation += 1;
    }

    /// Append one observation after checking the profile's required fields.
    /// Returns the index of the new row.
    pub fn append(
        &mut self,
        observation: Observation,
        profile: &ModelProfile,
    ) -> Result<usize, CoreError> {
        let missing_fields = profile.missing_required(&observation);
        if !missing_fields.is_empty() {
            return Err(CoreError::ValidationError { missing_fields });
        }
        self.observations.push(observation);
        self.generation += 1;
        Ok(self.observations.len() - 1)
    }

    /// Remove one row, keeping the selection on the same logical row.
    pub fn remove_at(&mut self, index: usize) -> Result<Observation, CoreError> {
        let len = self.observations.len();
        if index >= len {
            return Err(CoreError::IndexOutOfRange { index, len });
        }
        let removed = self.observations.remove(index);
        self.selection = match self.selection {
            Some(sel) if sel == index => None,
            Some(sel) if index < sel => Some(sel - 1),
            other => other,
        };
        self.generation += 1;
        Ok(removed)
    }

    /// Empty the dataset. Calling it on an empty store is fine.
    pub fn clear(&mut self) {
        self.observations.clear();
        self.selection = None;
        self.result = None;
        self.generation += 1;
    }

    pub fn select(&mut self, index: usize) -> Result<(), CoreError> {
        let len = self.observations.len();
        if index >= len {
            return Err(CoreError::IndexOutOfRange { index, len });
        }
        self.selection = Some(index);
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    /// Drop selection and result after the active schema changed. The rows
    /// stay, but in-flight analyses are invalidated.
    pub(crate) fn invalidate_schema(&mut self) {
        self.selection = None;
        self.result = None;
        self.generation += 1;
    }

    pub(crate) fn set_result(&mut self, result: AnalysisResult) {
        self.result = Some(result);
    }

    /// Write a single-analysis outcome back into row `index`.
    pub(crate) fn merge_single(&mut self, index: usize, analysis: &SingleAnalysis) {
        let Some(row) = self.observations.get_mut(index) else {
            return;
        };
        if let Some(class) = analysis.classification {
            row.insert(CLASSIFICATION_KEY, class as f64);
        }
        if let Some(confidence) = analysis.confidence {
            row.insert(CONFIDENCE_KEY, confidence);
        }
    }

    /// Replace every row with its annotated counterpart, in order. The
    /// service must return one row per observation sent.
    pub(crate) fn annotate_all(&mut self, rows: Vec<Observation>) -> Result<(), ServiceError> {
        if rows.len() != self.observations.len() {
            return Err(ServiceError::PartialData {
                expected: self.observations.len(),
                received: rows.len(),
            });
        }
        self.observations = rows;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{FieldSpec, ModelId};

    fn profile() -> ModelProfile {
        ModelProfile::new(
            ModelId::Tess,
            vec![
                FieldSpec::new("mass", "Mass", 0.1, true),
                FieldSpec::new("radius", "Radius", 0.1, true),
                FieldSpec::new("albedo", "Albedo", 0.01, false),
            ],
            Observation::new(),
        )
    }

    fn row(mass: f64) -> Observation {
        [("mass", mass), ("radius", 1.0)].into_iter().collect()
    }

    fn store_with(n: usize) -> DatasetStore {
        let mut store = DatasetStore::new();
        store.replace((0..n).map(|i| row(i as f64)).collect());
        store
    }

    #[test]
    fn append_validates_required_fields() {
        let mut store = DatasetStore::new();
        let partial: Observation = [("mass", 1.0)].into_iter().collect();
        match store.append(partial, &profile()) {
            Err(CoreError::ValidationError { missing_fields }) => {
                assert_eq!(missing_fields, vec!["radius".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(store.len(), 0);

        assert_eq!(store.append(row(2.0), &profile()).unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn removing_selected_row_clears_selection() {
        let mut store = store_with(3);
        store.select(1).unwrap();
        store.remove_at(1).unwrap();
        assert_eq!(store.selection(), None);
    }

    #[test]
    fn removing_earlier_row_shifts_selection() {
        let mut store = store_with(4);
        store.select(2).unwrap();
        store.remove_at(0).unwrap();
        assert_eq!(store.selection(), Some(1));
        assert_eq!(store.selected().and_then(|o| o.number("mass")), Some(2.0));

        store.remove_at(2).unwrap();
        assert_eq!(store.selection(), Some(1));
    }

    #[test]
    fn remove_out_of_range_leaves_state() {
        let mut store = store_with(2);
        let generation = store.generation();
        assert!(matches!(
            store.remove_at(2),
            Err(CoreError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(store.len(), 2);
        assert_eq!(store.generation(), generation);
    }

    #[test]
    fn select_rejects_invalid_index() {
        let mut store = store_with(1);
        assert!(store.select(1).is_err());
        assert_eq!(store.selection(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut store = store_with(3);
        store.select(0).unwrap();
        store.set_result(AnalysisResult::Single(SingleAnalysis::default()));
        for _ in 0..2 {
            store.clear();
            assert!(store.is_empty());
            assert_eq!(store.selection(), None);
            assert!(store.result().is_none());
        }
    }

    #[test]
    fn replace_drops_selection_and_result() {
        let mut store = store_with(3);
        store.select(2).unwrap();
        store.set_result(AnalysisResult::Batch(BatchAnalysis::default()));
        let before = store.generation();
        store.replace(vec![row(9.0)]);
        assert_eq!(store.selection(), None);
        assert!(store.result().is_none());
        assert!(store.generation() > before);
    }

    #[test]
    fn selection_never_dangles() {
        // Deterministic pseudo-random walk over append/remove/select/clear.
        let mut store = DatasetStore::new();
        let profile = profile();
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for step in 0..2_000 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let len = store.len();
            match seed % 7 {
                0 | 1 => {
                    store.append(row(step as f64), &profile).unwrap();
                }
                2 | 3 if len > 0 => {
                    store.remove_at((seed >> 8) as usize % len).unwrap();
                }
                4 | 5 if len > 0 => {
                    store.select((seed >> 16) as usize % len).unwrap();
                }
                6 if seed % 5 == 0 => store.clear(),
                _ => {}
            }
            if let Some(sel) = store.selection() {
                assert!(sel < store.len(), "selection {sel} dangles at step {step}");
            }
        }
    }

    #[test]
    fn merge_single_writes_classification() {
        let mut store = store_with(2);
        let analysis = SingleAnalysis {
            classification: Some(3),
            confidence: Some(0.92),
            ..SingleAnalysis::default()
        };
        store.merge_single(1, &analysis);
        assert_eq!(store.get(1).unwrap().number(CLASSIFICATION_KEY), Some(3.0));
        assert_eq!(store.get(1).unwrap().number(CONFIDENCE_KEY), Some(0.92));
        assert!(store.get(0).unwrap().get(CLASSIFICATION_KEY).is_none());
    }

    #[test]
    fn annotate_all_requires_matching_length() {
        let mut store = store_with(2);
        let err = store.annotate_all(vec![row(1.0)]).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::PartialData {
                expected: 2,
                received: 1
            }
        ));
        assert_eq!(store.get(1).unwrap().number("mass"), Some(1.0));
    }
}
