//! Display-ready views of the stored analysis result. Pure functions, no
//! I/O; malformed or missing response fields degrade to empty values.

use std::collections::BTreeMap;
use std::fmt;

use crate::data::model::{FieldValue, Observation};
use crate::data::store::{AnalysisResult, CLASSIFICATION_KEY, CONFIDENCE_KEY};
use crate::service::{BatchAnalysis, BatchSummary, SingleAnalysis};

/// Confidence at or above this counts as high.
pub const HIGH_CONFIDENCE: f64 = 0.9;
/// Confidence strictly below this counts as low.
pub const LOW_CONFIDENCE: f64 = 0.7;

// ---------------------------------------------------------------------------
// Classification codes
// ---------------------------------------------------------------------------

/// The four classes shared by every model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    NonPlanet = 0,
    Ambiguous = 1,
    Candidate = 2,
    Confirmed = 3,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::NonPlanet,
        Classification::Ambiguous,
        Classification::Candidate,
        Classification::Confirmed,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Classification::NonPlanet),
            1 => Some(Classification::Ambiguous),
            2 => Some(Classification::Candidate),
            3 => Some(Classification::Confirmed),
            _ => None,
        }
    }

    /// Read a row's classification cell. Non-integral or out-of-range
    /// values are treated as absent.
    pub fn from_value(value: &FieldValue) -> Option<Self> {
        let v = value.as_f64()?;
        if v.fract() != 0.0 {
            return None;
        }
        Self::from_code(v as i64)
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::NonPlanet => "Non-Planet",
            Classification::Ambiguous => "Ambiguous",
            Classification::Candidate => "Candidate",
            Classification::Confirmed => "Confirmed Planet",
        }
    }

    /// sRGB display colour.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Classification::NonPlanet => [0x6b, 0x72, 0x80],
            Classification::Ambiguous => [0xf5, 0x9e, 0x0b],
            Classification::Candidate => [0x3b, 0x82, 0xf6],
            Classification::Confirmed => [0x10, 0xb9, 0x81],
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Single observation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub name: String,
    pub importance: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleView {
    pub classification: Option<Classification>,
    pub confidence: Option<f64>,
    pub explanation: String,
    /// Most important first, importances clamped to `[0, 1]`.
    pub feature_importance: Vec<RankedFeature>,
    /// Per-class probability, paired with its class where the index maps
    /// to one.
    pub probabilities: Vec<(Option<Classification>, f64)>,
}

pub fn project_single(analysis: &SingleAnalysis) -> SingleView {
    let mut feature_importance: Vec<RankedFeature> = analysis
        .feature_importance
        .iter()
        .filter(|f| f.importance.is_finite())
        .map(|f| RankedFeature {
            name: f.name.clone(),
            importance: f.importance.clamp(0.0, 1.0),
        })
        .collect();
    feature_importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    SingleView {
        classification: analysis.classification.and_then(Classification::from_code),
        confidence: analysis
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0)),
        explanation: analysis.explanation.clone().unwrap_or_default(),
        feature_importance,
        probabilities: analysis
            .probabilities
            .iter()
            .enumerate()
            .map(|(i, &p)| (Classification::from_code(i as i64), p))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchView {
    pub total: usize,
    /// Classes with no rows are absent.
    pub counts_per_class: BTreeMap<Classification, usize>,
    pub average_confidence: Option<f64>,
    pub high_confidence_count: usize,
    pub low_confidence_count: usize,
    pub model_version: Option<String>,
}

impl BatchView {
    pub fn count(&self, class: Classification) -> usize {
        self.counts_per_class.get(&class).copied().unwrap_or(0)
    }
}

/// Build the batch view from the server summary and metrics, falling back
/// to a scan of `rows` (the annotated dataset) for whatever is missing.
pub fn project_batch(analysis: &BatchAnalysis, rows: &[Observation]) -> BatchView {
    let scanned = scan_rows(rows);

    let (total, counts_per_class) = match &analysis.summary {
        Some(summary) => (summary.total, summary_counts(summary)),
        None => (scanned.total, scanned.counts_per_class),
    };

    let metrics = analysis.model_metrics.clone().unwrap_or_default();
    BatchView {
        total,
        counts_per_class,
        average_confidence: metrics
            .average_confidence
            .filter(|c| c.is_finite())
            .or(scanned.average_confidence),
        high_confidence_count: metrics
            .high_confidence_count
            .unwrap_or(scanned.high_confidence_count),
        low_confidence_count: metrics
            .low_confidence_count
            .unwrap_or(scanned.low_confidence_count),
        model_version: metrics.model_version,
    }
}

fn summary_counts(summary: &BatchSummary) -> BTreeMap<Classification, usize> {
    [
        (Classification::NonPlanet, summary.non_planets),
        (Classification::Ambiguous, summary.ambiguous),
        (Classification::Candidate, summary.candidates),
        (Classification::Confirmed, summary.planets),
    ]
    .into_iter()
    .filter(|&(_, n)| n > 0)
    .collect()
}

/// Tally classifications and confidences straight from the rows. A row
/// without a readable classification is not counted in any class.
pub fn scan_rows(rows: &[Observation]) -> BatchView {
    let mut view = BatchView {
        total: rows.len(),
        ..BatchView::default()
    };

    for class in rows
        .iter()
        .filter_map(|row| row.get(CLASSIFICATION_KEY))
        .filter_map(Classification::from_value)
    {
        *view.counts_per_class.entry(class).or_insert(0) += 1;
    }

    let confidences: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.number(CONFIDENCE_KEY))
        .filter(|c| c.is_finite())
        .collect();
    if !confidences.is_empty() {
        view.average_confidence = Some(confidences.iter().sum::<f64>() / confidences.len() as f64);
    }
    view.high_confidence_count = confidences.iter().filter(|&&c| c >= HIGH_CONFIDENCE).count();
    view.low_confidence_count = confidences.iter().filter(|&&c| c < LOW_CONFIDENCE).count();
    view
}

/// Projection of whatever result is stored.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Single(SingleView),
    Batch(BatchView),
}

pub fn project(result: &AnalysisResult, rows: &[Observation]) -> ResultView {
    match result {
        AnalysisResult::Single(analysis) => ResultView::Single(project_single(analysis)),
        AnalysisResult::Batch(analysis) => ResultView::Batch(project_batch(analysis, rows)),
    }
}
