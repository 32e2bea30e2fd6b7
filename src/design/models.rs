//! Data types for breakwater design requests and results.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{ConfigurationError, DesignError};

/// Label given to the single limit state checked by this front end.
pub const ULTIMATE_LIMIT_STATE: &str = "Ultimate Limit State";

/// Breakwater cross-section family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakwaterType {
    RockRubbleMound,
    ConcreteRubbleMound,
    Caisson,
}

impl BreakwaterType {
    pub const ALL: [BreakwaterType; 3] = [
        BreakwaterType::RockRubbleMound,
        BreakwaterType::ConcreteRubbleMound,
        BreakwaterType::Caisson,
    ];

    /// Identifier used in URLs, form values and JSON.
    pub fn slug(self) -> &'static str {
        match self {
            Self::RockRubbleMound => "rock_rubble_mound",
            Self::ConcreteRubbleMound => "concrete_rubble_mound",
            Self::Caisson => "caisson",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RockRubbleMound => "Rock Rubble Mound (RRM)",
            Self::ConcreteRubbleMound => "Concrete Rubble Mound (CRM)",
            Self::Caisson => "Caisson",
        }
    }

    pub fn is_rubble_mound(self) -> bool {
        matches!(self, Self::RockRubbleMound | Self::ConcreteRubbleMound)
    }
}

impl Default for BreakwaterType {
    fn default() -> Self {
        Self::RockRubbleMound
    }
}

impl fmt::Display for BreakwaterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BreakwaterType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "rock_rubble_mound" | "rrm" => Ok(Self::RockRubbleMound),
            "concrete_rubble_mound" | "crm" => Ok(Self::ConcreteRubbleMound),
            "caisson" => Ok(Self::Caisson),
            _ => Err(ConfigurationError::UnknownBreakwaterType(s.to_string())),
        }
    }
}

/// Interlocking concrete armour unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmourUnit {
    Xbloc,
    XblocPlus,
}

impl ArmourUnit {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Xbloc => "xbloc",
            Self::XblocPlus => "xbloc_plus",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Xbloc => "Xbloc",
            Self::XblocPlus => "Xbloc Plus",
        }
    }
}

impl FromStr for ArmourUnit {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "xbloc" => Ok(Self::Xbloc),
            "xbloc_plus" | "xblocplus" => Ok(Self::XblocPlus),
            _ => Err(ConfigurationError::UnknownArmourUnit(s.to_string())),
        }
    }
}

/// Slope given as a (vertical, horizontal) pair, e.g. 1:100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Slope {
    pub vertical: f64,
    pub horizontal: f64,
}

impl Slope {
    pub fn new(vertical: f64, horizontal: f64) -> Self {
        Self { vertical, horizontal }
    }
}

impl From<(f64, f64)> for Slope {
    fn from((vertical, horizontal): (f64, f64)) -> Self {
        Self::new(vertical, horizontal)
    }
}

impl From<Slope> for (f64, f64) {
    fn from(slope: Slope) -> Self {
        (slope.vertical, slope.horizontal)
    }
}

impl fmt::Display for Slope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vertical, self.horizontal)
    }
}

/// Standard rock grading, parametrised by the armourstone density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RockGrading {
    /// Armourstone density [kg/m³]
    pub rho: f64,
}

impl RockGrading {
    pub fn new(rho: f64) -> Self {
        Self { rho }
    }
}

/// Material of the caisson's protective berm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BermMaterial {
    Rock { grading: RockGrading },
    ArmourUnit { unit: ArmourUnit },
}

/// Significant and maximum wave height in front of a vertical structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveHeights {
    #[serde(rename = "H13")]
    pub h13: f64,
    #[serde(rename = "Hmax")]
    pub hmax: f64,
}

/// Design conditions the structure is checked against.
///
/// Optional members are only serialized when set, so the engineering
/// service sees exactly the parameters that apply to the breakwater type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitState {
    /// Water depth [m]
    pub h: f64,
    pub label: String,
    /// Spectral significant wave height [m]
    #[serde(rename = "Hm0")]
    pub hm0: f64,
    /// Mean overtopping discharge [l/s per m]
    pub q: f64,
    /// Significant wave height [m]
    #[serde(rename = "Hs")]
    pub hs: f64,
    /// Peak wave period [s]
    #[serde(rename = "Tp")]
    pub tp: f64,
    /// Damage number for toe stability
    #[serde(rename = "Nod", default, skip_serializing_if = "Option::is_none")]
    pub nod: Option<f64>,
    /// Damage level parameter (Van der Meer)
    #[serde(rename = "Sd", default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
    #[serde(rename = "H13", default, skip_serializing_if = "Option::is_none")]
    pub h13: Option<f64>,
    #[serde(rename = "Hmax", default, skip_serializing_if = "Option::is_none")]
    pub hmax: Option<f64>,
    /// Multiplier the service applies when deriving the other wave periods
    /// from Tp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_transform: Option<f64>,
}

impl LimitState {
    pub fn new(h: f64, label: impl Into<String>, hm0: f64, q: f64, hs: f64, tp: f64) -> Self {
        Self {
            h,
            label: label.into(),
            hm0,
            q,
            hs,
            tp,
            nod: None,
            sd: None,
            h13: None,
            hmax: None,
            period_transform: None,
        }
    }

    pub fn transform_periods(&mut self, multiplier: f64) {
        self.period_transform = Some(multiplier);
    }
}

/// Rock rubble mound design parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RockRubbleMoundRequest {
    pub slope: Slope,
    pub slope_foreshore: Slope,
    /// Water density [kg/m³]
    pub rho_w: f64,
    /// Crest width [m]
    #[serde(rename = "B")]
    pub b: f64,
    /// Number of incident waves at the toe
    #[serde(rename = "N")]
    pub n: u32,
    #[serde(rename = "LimitState")]
    pub limit_state: LimitState,
    #[serde(rename = "Grading")]
    pub grading: RockGrading,
    /// Nominal core stone diameter [m]
    #[serde(rename = "Dn50_core")]
    pub dn50_core: f64,
    /// Wave height exceeded by 2% of the waves at the toe [m]
    #[serde(rename = "H2_per")]
    pub h2_percent: f64,
}

/// Concrete rubble mound design parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteRubbleMoundRequest {
    pub slope: Slope,
    pub slope_foreshore: Slope,
    pub rho_w: f64,
    #[serde(rename = "B")]
    pub b: f64,
    #[serde(rename = "ArmourUnit")]
    pub armour_unit: ArmourUnit,
    #[serde(rename = "LimitState")]
    pub limit_state: LimitState,
    #[serde(rename = "Grading")]
    pub grading: RockGrading,
    #[serde(rename = "Dn50_core")]
    pub dn50_core: f64,
    #[serde(rename = "H2_per")]
    pub h2_percent: f64,
}

/// Vertical (caisson) breakwater design parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaissonRequest {
    /// Ratio of concrete to the total caisson mass
    #[serde(rename = "Pc")]
    pub pc: f64,
    pub rho_c: f64,
    pub rho_fill: f64,
    pub rho_w: f64,
    /// Berm width [m]
    #[serde(rename = "Bm")]
    pub bm: f64,
    /// Foundation layer height [m]
    pub hb: f64,
    pub layers: u32,
    #[serde(rename = "BermMaterial")]
    pub berm_material: BermMaterial,
    #[serde(rename = "Grading")]
    pub grading: RockGrading,
    #[serde(rename = "LimitState")]
    pub limit_state: LimitState,
    pub slope_foreshore: Slope,
    /// Friction factor between caisson and foundation
    pub mu: f64,
    /// Wave obliquity [degrees]
    pub beta: f64,
    #[serde(rename = "H2_per")]
    pub h2_percent: f64,
}

/// Complete request for one design variant, tagged by breakwater type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DesignRequest {
    RockRubbleMound(RockRubbleMoundRequest),
    ConcreteRubbleMound(ConcreteRubbleMoundRequest),
    Caisson(CaissonRequest),
}

impl DesignRequest {
    pub fn breakwater_type(&self) -> BreakwaterType {
        match self {
            Self::RockRubbleMound(_) => BreakwaterType::RockRubbleMound,
            Self::ConcreteRubbleMound(_) => BreakwaterType::ConcreteRubbleMound,
            Self::Caisson(_) => BreakwaterType::Caisson,
        }
    }

    pub fn limit_state(&self) -> &LimitState {
        match self {
            Self::RockRubbleMound(r) => &r.limit_state,
            Self::ConcreteRubbleMound(r) => &r.limit_state,
            Self::Caisson(r) => &r.limit_state,
        }
    }

    /// SHA256 of the serialized request, used to correlate results and logs.
    pub fn input_hash(&self) -> Result<String, DesignError> {
        let json = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&json);
        Ok(format!("sha256:{}", hex::encode(digest)))
    }
}

/// Cross-section plot returned by the engineering service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotArtifact {
    /// `data:image/png;base64,...` URI, ready for an `<img>` tag
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl PlotArtifact {
    /// Decode the returned image to make sure it can be displayed.
    pub fn from_png(bytes: &[u8]) -> Result<Self, DesignError> {
        let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(|e| DesignError::Presentation(format!("plot is not a valid PNG: {}", e)))?;

        Ok(Self {
            data_uri: format!("data:image/png;base64,{}", STANDARD.encode(bytes)),
            width: image.width(),
            height: image.height(),
        })
    }
}

/// Everything shown in the results area after a successful design.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignResult {
    pub breakwater_type: BreakwaterType,
    pub plot: PlotArtifact,
    /// Full description of the designed variant(s)
    pub variant_report: String,
    /// Warnings logged by the service while designing
    pub warnings_report: String,
    pub input_hash: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit_state() -> LimitState {
        LimitState::new(15.0, ULTIMATE_LIMIT_STATE, 2.0, 20.0, 2.0, 9.4)
    }

    #[test]
    fn test_breakwater_type_parsing() {
        assert_eq!("caisson".parse::<BreakwaterType>().unwrap(), BreakwaterType::Caisson);
        assert_eq!("RRM".parse::<BreakwaterType>().unwrap(), BreakwaterType::RockRubbleMound);
        assert_eq!(
            "concrete-rubble-mound".parse::<BreakwaterType>().unwrap(),
            BreakwaterType::ConcreteRubbleMound
        );
        assert!(matches!(
            "monolith".parse::<BreakwaterType>(),
            Err(ConfigurationError::UnknownBreakwaterType(_))
        ));
    }

    #[test]
    fn test_slug_parses_back() {
        for bt in BreakwaterType::ALL {
            assert_eq!(bt.slug().parse::<BreakwaterType>().unwrap(), bt);
        }
        for unit in [ArmourUnit::Xbloc, ArmourUnit::XblocPlus] {
            assert_eq!(unit.slug().parse::<ArmourUnit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_limit_state_omits_unset_optionals() {
        let json = serde_json::to_value(limit_state()).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["h"], 15.0);
        assert_eq!(obj["label"], "Ultimate Limit State");
        assert_eq!(obj["Tp"], 9.4);
        for key in ["Nod", "Sd", "H13", "Hmax", "period_transform"] {
            assert!(!obj.contains_key(key), "{} should be absent", key);
        }
    }

    #[test]
    fn test_slope_serializes_as_pair() {
        let json = serde_json::to_string(&Slope::new(1.0, 100.0)).unwrap();
        assert_eq!(json, "[1.0,100.0]");
        assert_eq!(Slope::new(2.0, 3.0).to_string(), "2:3");
    }

    #[test]
    fn test_berm_material_tagging() {
        let rock = BermMaterial::Rock { grading: RockGrading::new(2650.0) };
        let json = serde_json::to_value(&rock).unwrap();
        assert_eq!(json["kind"], "rock");
        assert_eq!(json["grading"]["rho"], 2650.0);

        let unit = BermMaterial::ArmourUnit { unit: ArmourUnit::XblocPlus };
        let json = serde_json::to_value(&unit).unwrap();
        assert_eq!(json["unit"], "xbloc_plus");
    }

    #[test]
    fn test_plot_rejects_garbage() {
        let result = PlotArtifact::from_png(b"not an image");
        assert!(matches!(result, Err(DesignError::Presentation(_))));
    }

    #[test]
    fn test_input_hash_tracks_request_content() {
        let request = |b: f64| {
            DesignRequest::RockRubbleMound(RockRubbleMoundRequest {
                slope: Slope::new(2.0, 3.0),
                slope_foreshore: Slope::new(1.0, 100.0),
                rho_w: 1025.0,
                b,
                n: 2100,
                limit_state: limit_state(),
                grading: RockGrading::new(2650.0),
                dn50_core: 1.0,
                h2_percent: 2.8,
            })
        };

        let hash = request(5.5).input_hash().unwrap();
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), "sha256:".len() + 64);
        assert_eq!(hash, request(5.5).input_hash().unwrap());
        assert_ne!(hash, request(6.0).input_hash().unwrap());
    }
}
