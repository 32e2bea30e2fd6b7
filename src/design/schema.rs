//! Static catalogue of every input field of the design form.
//!
//! Catalogue order is display order. Which fields a breakwater type sees,
//! and whether they are mandatory, is declared per field.

use serde::Serialize;

use super::error::ValidationError;
use super::models::BreakwaterType;

use BreakwaterType::{Caisson, ConcreteRubbleMound, RockRubbleMound};
use Presence::{Optional, Required};

/// Field names shared by the form, the assembler and the JSON API.
pub mod names {
    pub const ARMOUR_TYPE: &str = "armour_type";
    pub const HM0: &str = "Hm0";
    pub const H: &str = "h";
    pub const D: &str = "d";
    pub const SLOPE_FORESHORE_V: &str = "slope_foreshore_v";
    pub const SLOPE_FORESHORE_H: &str = "slope_foreshore_h";
    pub const LIMIT_Q: &str = "limit_q";
    pub const LIMIT_HS: &str = "limit_Hs";
    pub const LIMIT_TP: &str = "limit_Tp";
    pub const LIMIT_NOD: &str = "limit_Nod";
    pub const LIMIT_SD: &str = "limit_Sd";
    pub const RHO: &str = "rho";
    pub const SLOPE_V: &str = "slope_v";
    pub const SLOPE_H: &str = "slope_h";
    pub const RHO_W: &str = "rho_w";
    pub const B: &str = "B";
    pub const N: &str = "N";
    pub const DN50_CORE: &str = "Dn50_core";
    pub const PC: &str = "Pc";
    pub const RHO_C: &str = "rho_c";
    pub const RHO_FILL: &str = "rho_fill";
    pub const BM: &str = "Bm";
    pub const HB: &str = "hb";
    pub const LAYERS: &str = "layers";
    pub const BERM_MATERIAL: &str = "berm_material";
    pub const MU: &str = "mu";
    pub const BETA: &str = "beta";
}

/// Form sections, in the order they are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    BreakwaterType,
    Environment,
    LimitState,
    Configuration,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::BreakwaterType,
        Section::Environment,
        Section::LimitState,
        Section::Configuration,
    ];

    pub fn number(self) -> usize {
        match self {
            Self::BreakwaterType => 1,
            Self::Environment => 2,
            Self::LimitState => 3,
            Self::Configuration => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::BreakwaterType => "Select Breakwater type",
            Self::Environment => "Define Environmental Conditions",
            Self::LimitState => "Define Ultimate Limit State",
            Self::Configuration => "Define Breakwater Configuration",
        }
    }
}

/// Whether an applicable field must be filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
}

/// Value rule applied to numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Constraint {
    Positive,
    NonNegative,
    Range { min: f64, max: f64 },
    /// Whole number, at least 1.
    Count,
}

impl Constraint {
    pub fn check(self, field: &'static str, value: f64) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotANumber {
                field,
                raw: value.to_string(),
            });
        }
        match self {
            Self::Positive if value <= 0.0 => Err(ValidationError::NotPositive { field, value }),
            Self::NonNegative if value < 0.0 => Err(ValidationError::Negative { field, value }),
            Self::Range { min, max } if !(min..=max).contains(&value) => {
                Err(ValidationError::OutOfRange { field, value, min, max })
            }
            Self::Count if value < 1.0 || value.fract() != 0.0 => {
                Err(ValidationError::NotACount { field, value })
            }
            _ => Ok(()),
        }
    }
}

/// One selectable option of a choice field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Number {
        default: f64,
        constraint: Constraint,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    Choice {
        default: &'static str,
        options: &'static [Choice],
    },
}

/// Description of one input field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub section: Section,
    pub kind: FieldKind,
    #[serde(skip)]
    pub applies_to: &'static [(BreakwaterType, Presence)],
}

impl FieldSpec {
    /// `None` when the field is not shown for `breakwater_type`.
    pub fn presence(&self, breakwater_type: BreakwaterType) -> Option<Presence> {
        self.applies_to
            .iter()
            .find(|(bt, _)| *bt == breakwater_type)
            .map(|(_, presence)| *presence)
    }

    pub fn applies(&self, breakwater_type: BreakwaterType) -> bool {
        self.presence(breakwater_type).is_some()
    }

    pub fn is_required(&self, breakwater_type: BreakwaterType) -> bool {
        self.presence(breakwater_type) == Some(Required)
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, FieldKind::Choice { .. })
    }
}

const EVERY_TYPE: &[(BreakwaterType, Presence)] = &[
    (RockRubbleMound, Required),
    (ConcreteRubbleMound, Required),
    (Caisson, Required),
];
const RUBBLE_MOUND: &[(BreakwaterType, Presence)] =
    &[(RockRubbleMound, Required), (ConcreteRubbleMound, Required)];
const ROCK_ONLY: &[(BreakwaterType, Presence)] = &[(RockRubbleMound, Required)];
const CONCRETE_ONLY: &[(BreakwaterType, Presence)] = &[(ConcreteRubbleMound, Required)];
const CAISSON_ONLY: &[(BreakwaterType, Presence)] = &[(Caisson, Required)];
const DAMAGE_NUMBER: &[(BreakwaterType, Presence)] =
    &[(RockRubbleMound, Optional), (ConcreteRubbleMound, Required)];
const DAMAGE_LEVEL: &[(BreakwaterType, Presence)] = &[(RockRubbleMound, Optional)];

pub const ARMOUR_UNITS: &[Choice] = &[
    Choice { value: "xbloc", label: "Xbloc" },
    Choice { value: "xbloc_plus", label: "Xbloc Plus" },
];

pub const BERM_MATERIALS: &[Choice] = &[
    Choice { value: "rock", label: "Rock" },
    Choice { value: "xbloc", label: "Xbloc" },
    Choice { value: "xbloc_plus", label: "Xbloc Plus" },
];

const fn number(default: f64, constraint: Constraint) -> FieldKind {
    FieldKind::Number {
        default,
        constraint,
        step: None,
    }
}

const fn positive(default: f64) -> FieldKind {
    number(default, Constraint::Positive)
}

pub static CATALOGUE: &[FieldSpec] = &[
    FieldSpec {
        name: names::ARMOUR_TYPE,
        label: "Select armour type",
        unit: None,
        section: Section::BreakwaterType,
        kind: FieldKind::Choice { default: "xbloc", options: ARMOUR_UNITS },
        applies_to: CONCRETE_ONLY,
    },
    FieldSpec {
        name: names::HM0,
        label: "Hm0 -- Spectral wave height",
        unit: Some("m"),
        section: Section::Environment,
        kind: positive(2.0),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::H,
        label: "h -- Water depth",
        unit: Some("m"),
        section: Section::Environment,
        kind: positive(15.0),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::D,
        label: "d -- Caisson draft",
        unit: Some("m"),
        section: Section::Environment,
        kind: positive(10.0),
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::SLOPE_FORESHORE_V,
        label: "Vertical component of the foreshore slope",
        unit: None,
        section: Section::Environment,
        kind: positive(1.0),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::SLOPE_FORESHORE_H,
        label: "Horizontal component of the foreshore slope",
        unit: None,
        section: Section::Environment,
        kind: positive(100.0),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::LIMIT_Q,
        label: "q -- Mean overtopping discharge per meter structure width",
        unit: Some("l/s per m"),
        section: Section::LimitState,
        kind: number(20.0, Constraint::NonNegative),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::LIMIT_HS,
        label: "Hs -- Significant wave height",
        unit: Some("m"),
        section: Section::LimitState,
        kind: positive(2.0),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::LIMIT_TP,
        label: "Tp -- Peak wave period",
        unit: Some("s"),
        section: Section::LimitState,
        kind: positive(9.4),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::LIMIT_NOD,
        label: "Nod -- Damage number, used in the formula for the toe stability",
        unit: None,
        section: Section::LimitState,
        kind: number(5.0, Constraint::NonNegative),
        applies_to: DAMAGE_NUMBER,
    },
    FieldSpec {
        name: names::LIMIT_SD,
        label: "Sd -- Damage number parameter, used in Van der Meer formula",
        unit: None,
        section: Section::LimitState,
        kind: positive(2.0),
        applies_to: DAMAGE_LEVEL,
    },
    FieldSpec {
        name: names::RHO,
        label: "Density of the armourstone",
        unit: Some("kg/m³"),
        section: Section::Configuration,
        kind: positive(2650.0),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::SLOPE_V,
        label: "V -- Vertical component of the breakwater slope",
        unit: None,
        section: Section::Configuration,
        kind: positive(2.0),
        applies_to: RUBBLE_MOUND,
    },
    FieldSpec {
        name: names::SLOPE_H,
        label: "H -- Horizontal component of the breakwater slope",
        unit: None,
        section: Section::Configuration,
        kind: positive(3.0),
        applies_to: RUBBLE_MOUND,
    },
    FieldSpec {
        name: names::RHO_W,
        label: "Density of water",
        unit: Some("kg/m³"),
        section: Section::Configuration,
        kind: positive(1025.0),
        applies_to: EVERY_TYPE,
    },
    FieldSpec {
        name: names::B,
        label: "B -- Crest width",
        unit: Some("m"),
        section: Section::Configuration,
        kind: positive(5.5),
        applies_to: RUBBLE_MOUND,
    },
    FieldSpec {
        name: names::N,
        label: "N -- Number of incident waves at the toe of the breakwater structure",
        unit: Some("-"),
        section: Section::Configuration,
        kind: number(2100.0, Constraint::Count),
        applies_to: ROCK_ONLY,
    },
    FieldSpec {
        name: names::DN50_CORE,
        label: "Dn50 -- Nominal diameter for the stones in the core of the breakwater",
        unit: Some("m"),
        section: Section::Configuration,
        kind: positive(1.0),
        applies_to: RUBBLE_MOUND,
    },
    FieldSpec {
        name: names::PC,
        label: "Pc -- Ratio of concrete to the total mass of the caisson",
        unit: None,
        section: Section::Configuration,
        kind: FieldKind::Number {
            default: 0.2,
            constraint: Constraint::Range { min: 0.0, max: 1.0 },
            step: Some(0.01),
        },
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::RHO_C,
        label: "Density of concrete",
        unit: Some("kg/m³"),
        section: Section::Configuration,
        kind: positive(2400.0),
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::RHO_FILL,
        label: "Density of fill material",
        unit: Some("kg/m³"),
        section: Section::Configuration,
        kind: positive(1600.0),
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::BM,
        label: "Bm -- Width of the berm",
        unit: Some("m"),
        section: Section::Configuration,
        kind: positive(8.0),
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::HB,
        label: "hb -- Height of the foundation layer",
        unit: Some("m"),
        section: Section::Configuration,
        kind: positive(2.0),
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::LAYERS,
        label: "Number of foundation layers",
        unit: Some("-"),
        section: Section::Configuration,
        kind: number(2.0, Constraint::Count),
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::BERM_MATERIAL,
        label: "Select Berm Material",
        unit: None,
        section: Section::Configuration,
        kind: FieldKind::Choice { default: "rock", options: BERM_MATERIALS },
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::MU,
        label: "Friction factor between the caisson and the foundation layer",
        unit: Some("-"),
        section: Section::Configuration,
        kind: positive(0.5),
        applies_to: CAISSON_ONLY,
    },
    FieldSpec {
        name: names::BETA,
        label: "Angle between direction of wave approach and a line normal to the breakwater",
        unit: Some("degrees"),
        section: Section::Configuration,
        kind: number(15.0, Constraint::Range { min: 0.0, max: 90.0 }),
        applies_to: CAISSON_ONLY,
    },
];

/// Look up a field by name.
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    CATALOGUE.iter().find(|f| f.name == name)
}

/// Explanatory figure shown at the top of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Figure {
    pub url: &'static str,
    pub caption: &'static str,
}

/// Figure for `section`, which differs between rubble mound and caisson
/// cross-sections.
pub fn figure(section: Section, breakwater_type: BreakwaterType) -> Option<Figure> {
    let figure = match (section, breakwater_type.is_rubble_mound()) {
        (Section::BreakwaterType, _) => Figure {
            url: "https://github.com/Sander-w/breakwater/blob/8eeec8626f6a7549682472328658dda82fb69c99/doc/_figures/breakwater-types.png?raw=true",
            caption: "Figure 1.1: Typical cross sections of various types of breakwaters, with the rubble mound types on the left and the monolithic types on the right. (Winkel, 2000. Redrawn from CIRIA, CUR, CETMEF, 2007, p.781).",
        },
        (Section::Environment, true) => Figure {
            url: "https://github.com/Sander-w/breakwater/blob/master/doc/_figures/rubble-mound.png?raw=true",
            caption: "Figure 2.1: Schematisation of a rubble mound breakwater with definitions of variables (Winkel, 2000).",
        },
        (Section::Environment, false) => Figure {
            url: "https://github.com/Sander-w/breakwater/blob/master/doc/_figures/caisson.png?raw=true",
            caption: "Figure 2.2: Schematisation of a vertical or composite vertical wall with definitions of variables (Winkel, 2000).",
        },
        (Section::LimitState, true) => Figure {
            url: "https://github.com/Sander-w/breakwater/blob/master/doc/_figures/RM.png?raw=true",
            caption: "Figure 3.1: Definitions for a rubble mound breakwater (Winkel, 2000).",
        },
        (Section::LimitState, false) => Figure {
            url: "https://github.com/Sander-w/breakwater/blob/master/doc/_figures/C.png?raw=true",
            caption: "Figure 3.2: Definitions for a (composite) vertical breakwater (Winkel, 2000).",
        },
        (Section::Configuration, _) => return None,
    };
    Some(figure)
}
