use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::model::{FieldValue, Observation};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Model identifiers
// ---------------------------------------------------------------------------

/// The closed set of prediction models offered by the service.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    #[default]
    Tess,
    Kepler,
}

impl ModelId {
    pub const ALL: [ModelId; 2] = [ModelId::Tess, ModelId::Kepler];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Tess => "tess",
            ModelId::Kepler => "kepler",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelId::Tess => "TESS",
            ModelId::Kepler => "Kepler",
        }
    }

    pub fn profile(self) -> &'static ModelProfile {
        match self {
            ModelId::Tess => {
                static TESS: OnceLock<ModelProfile> = OnceLock::new();
                TESS.get_or_init(|| ModelProfile::from_table(ModelId::Tess, TESS_FIELDS))
            }
            ModelId::Kepler => {
                static KEPLER: OnceLock<ModelProfile> = OnceLock::new();
                KEPLER.get_or_init(|| ModelProfile::from_table(ModelId::Kepler, KEPLER_FIELDS))
            }
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tess" => Ok(ModelId::Tess),
            "kepler" => Ok(ModelId::Kepler),
            _ => Err(CoreError::UnknownModel(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// One input field of a model's form.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    /// Increment used by numeric editors.
    pub step: f64,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(key: &str, label: &str, step: f64, required: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            step,
            required,
        }
    }
}

/// Field schema and default values of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    pub id: ModelId,
    fields: Vec<FieldSpec>,
    defaults: Observation,
}

impl ModelProfile {
    pub fn new(id: ModelId, fields: Vec<FieldSpec>, defaults: Observation) -> Self {
        Self { id, fields, defaults }
    }

    fn from_table(id: ModelId, table: &[(&str, &str, f64, bool, f64)]) -> Self {
        let fields = table
            .iter()
            .map(|&(key, label, step, required, _)| FieldSpec::new(key, label, step, required))
            .collect();
        let defaults = table
            .iter()
            .map(|&(key, _, _, _, default)| (key, FieldValue::Number(default)))
            .collect();
        Self::new(id, fields, defaults)
    }

    /// Ordered input fields.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|f| f.required).map(|f| f.key.as_str())
    }

    pub fn default_values(&self) -> Observation {
        self.defaults.clone()
    }

    /// Required keys that `obs` lacks or leaves empty, in field order.
    pub fn missing_required(&self, obs: &Observation) -> Vec<String> {
        self.required_keys()
            .filter(|key| !obs.has_value(key))
            .map(str::to_string)
            .collect()
    }
}

/// Look up a profile by its textual id.
pub fn get_profile(model_id: &str) -> Result<&'static ModelProfile, CoreError> {
    Ok(model_id.parse::<ModelId>()?.profile())
}

pub fn list_fields(model_id: &str) -> Result<&'static [FieldSpec], CoreError> {
    Ok(get_profile(model_id)?.fields())
}

pub fn default_values(model_id: &str) -> Result<Observation, CoreError> {
    Ok(get_profile(model_id)?.default_values())
}

// key, label, step, required, default
const TESS_FIELDS: &[(&str, &str, f64, bool, f64)] = &[
    ("pl_radeerr1", "Transit Midpoint", 0.0001, true, 0.0),
    ("st_rad", "Star Radius", 0.01, true, 1.0),
    ("pl_orbper", "Orbital Period", 0.01, true, 10.0),
    ("st_dist", "Star Distance", 0.1, true, 100.0),
    ("st_disterr2", "Star Distance Error Lower", 0.1, false, 0.0),
    ("pl_trandep", "Transit Depth", 0.001, true, 0.01),
    ("pl_rade", "Planet Radius", 0.01, true, 1.0),
    ("st_pmra", "Star Angular Motion", 0.01, false, 0.0),
    ("pl_orbpererr2", "Orbit Period Error Lower", 0.01, false, 0.0),
    ("pl_tranmiderr", "Transit Midpoint Uncertainty Lower", 0.01, false, 0.0),
    ("pl_tranmid", "Transit Midpoint Time", 0.1, true, 2450000.0),
    ("pl_eqt", "Equilibrium Temp", 1.0, true, 300.0),
    ("st_tmag", "Star Brightness", 0.1, true, 10.0),
    ("starTemp", "Star Temp", 1.0, true, 5500.0),
    ("pl_trandeperr1", "Transit Depth Error Upper", 0.1, false, 0.0),
    ("pl_trandeperr2", "Transit Depth Error Lower", 0.1, false, 0.0),
    ("pl_orbpererr1", "Orbit Period Error Upper", 0.01, false, 0.0),
    ("st_logg", "Surface Gravity", 0.1, true, 4.5),
    ("pl_insol", "Stellar Irradiance", 0.1, true, 1.0),
    ("st_tefferr2", "Temp Error Lower", 0.1, false, 0.0),
    ("st_teff", "Effective Star Temp", 0.1, true, 5500.0),
    ("st_disterr1", "Star Distance Error Upper", 0.1, false, 0.0),
    ("pl_trandurh", "Transit Duration", 0.1, true, 3.0),
    ("pl_trandurherr1", "Transit Duration Error", 0.1, false, 0.0),
    ("pl_tranmiderr1", "Transit Midpoint Error Upper", 0.1, false, 0.0),
];

const KEPLER_FIELDS: &[(&str, &str, f64, bool, f64)] = &[
    ("koi_fpflag_nt", "Not Transit-Like Flag", 1.0, true, 0.0),
    ("koi_score", "Disposition Score", 0.01, true, 0.5),
    ("koi_period", "Orbital Period", 0.01, true, 10.0),
    ("koi_dikco_msky", "Diff Image Sky Offset", 0.01, false, 0.0),
    ("koi_fpflag_co", "Centroid Offset Flag", 1.0, false, 0.0),
    ("koi_fpflag_ss", "Stellar Eclipse Flag", 1.0, false, 0.0),
    ("koi_num_transits", "Number of Transits", 1.0, true, 10.0),
    ("koi_count", "KOI Count", 1.0, false, 1.0),
    ("koi_steff_err1", "Stellar Temp Error Upper", 1.0, false, 0.0),
    ("koi_fpflag_ec", "Ephemeris Match Flag", 1.0, false, 0.0),
    ("koi_srho_err2", "Stellar Density Error Lower", 0.01, false, 0.0),
    ("kepid", "Kepler ID", 1.0, true, 10000000.0),
    ("koi_fwm_sdeco", "FW Stat Depth Offset", 0.01, false, 0.0),
    ("koi_depth", "Transit Depth", 0.01, true, 100.0),
    ("koi_dikco_mra_err", "RA Offset Error", 0.01, false, 0.0),
    ("koi_fwm_stat_sig", "FW Stat Significance", 0.01, false, 0.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_is_rejected() {
        let err = get_profile("spitzer").unwrap_err();
        assert!(matches!(err, CoreError::UnknownModel(ref id) if id == "spitzer"));
    }

    #[test]
    fn model_ids_parse_case_insensitively() {
        assert_eq!("TESS".parse::<ModelId>().unwrap(), ModelId::Tess);
        assert_eq!(" kepler ".parse::<ModelId>().unwrap(), ModelId::Kepler);
    }

    #[test]
    fn field_order_follows_the_table() {
        let fields = list_fields("kepler").unwrap();
        assert_eq!(fields.len(), 16);
        assert_eq!(fields[0].key, "koi_fpflag_nt");
        assert_eq!(fields[15].key, "koi_fwm_stat_sig");
        assert_eq!(list_fields("tess").unwrap().len(), 25);
    }

    #[test]
    fn defaults_cover_every_field_and_satisfy_requirements() {
        for id in ModelId::ALL {
            let profile = id.profile();
            let defaults = profile.default_values();
            assert_eq!(defaults.len(), profile.fields().len());
            assert!(profile.missing_required(&defaults).is_empty());
        }
    }

    #[test]
    fn missing_required_reports_in_field_order() {
        let profile = ModelId::Kepler.profile();
        let mut obs = profile.default_values();
        obs.remove("kepid");
        obs.insert("koi_score", "");
        obs.remove("koi_count");
        assert_eq!(profile.missing_required(&obs), vec!["koi_score", "kepid"]);
    }

    #[test]
    fn serde_uses_lowercase_ids() {
        assert_eq!(serde_json::to_string(&ModelId::Kepler).unwrap(), "\"kepler\"");
    }
}
