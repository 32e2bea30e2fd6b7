//! Conditional form building and per-session form state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{ValidationError, ValidationErrors};
use super::models::{BreakwaterType, DesignResult};
use super::schema::{self, names, FieldKind, FieldSpec, Section, CATALOGUE};

/// Fields shown for `breakwater_type`, in display order.
pub fn visible_fields(breakwater_type: BreakwaterType) -> Vec<&'static FieldSpec> {
    CATALOGUE
        .iter()
        .filter(|spec| spec.applies(breakwater_type))
        .collect()
}

/// Visible fields grouped by section. Sections without fields are kept so
/// the page layout stays the same across types.
pub fn sections(breakwater_type: BreakwaterType) -> Vec<(Section, Vec<&'static FieldSpec>)> {
    let visible = visible_fields(breakwater_type);
    Section::ALL
        .iter()
        .map(|section| {
            let fields = visible
                .iter()
                .copied()
                .filter(|spec| spec.section == *section)
                .collect();
            (*section, fields)
        })
        .collect()
}

/// Current value of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Choice(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Choice(_) => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Text shown in the form input.
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Choice(s) => s.clone(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Choice(s.to_string())
    }
}

/// Field name to value. An unset optional field is simply absent; `null`
/// in JSON input means unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<FieldValue>>",
    into = "BTreeMap<String, FieldValue>"
)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
}

impl From<BTreeMap<String, Option<FieldValue>>> for FormState {
    fn from(raw: BTreeMap<String, Option<FieldValue>>) -> Self {
        Self {
            values: raw
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect(),
        }
    }
}

impl From<FormState> for BTreeMap<String, FieldValue> {
    fn from(state: FormState) -> Self {
        state.values
    }
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State pre-filled with every visible field's default.
    pub fn with_defaults(breakwater_type: BreakwaterType) -> Self {
        let mut state = Self::new();
        state.fill_defaults(breakwater_type);
        state
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    pub fn choice(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_choice)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Set defaults for visible fields that have no value yet.
    pub fn fill_defaults(&mut self, breakwater_type: BreakwaterType) {
        for spec in visible_fields(breakwater_type) {
            if self.contains(spec.name) {
                continue;
            }
            let value = match spec.kind {
                FieldKind::Number { default, .. } => FieldValue::Number(default),
                FieldKind::Choice { default, .. } => FieldValue::Choice(default.to_string()),
            };
            self.values.insert(spec.name.to_string(), value);
        }
    }

    /// Drop every value that `breakwater_type` does not show, returning the
    /// removed names.
    pub fn retain_applicable(&mut self, breakwater_type: BreakwaterType) -> Vec<String> {
        let stale: Vec<String> = self
            .values
            .keys()
            .filter(|name| !schema::field(name).is_some_and(|spec| spec.applies(breakwater_type)))
            .cloned()
            .collect();
        for name in &stale {
            self.values.remove(name);
        }
        stale
    }

    /// Build state from raw HTML form text. Only visible fields are read;
    /// blank inputs leave the field unset. Unparseable numbers are reported
    /// and left unset.
    pub fn from_submission(
        breakwater_type: BreakwaterType,
        raw: &HashMap<String, String>,
    ) -> (Self, Vec<ValidationError>) {
        let mut state = Self::new();
        let mut errors = Vec::new();

        for spec in visible_fields(breakwater_type) {
            let Some(text) = raw.get(spec.name).map(|s| s.trim()) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            match spec.kind {
                FieldKind::Number { .. } => match text.parse::<f64>() {
                    Ok(n) => state.set(spec.name, n),
                    Err(_) => errors.push(ValidationError::NotANumber {
                        field: spec.name,
                        raw: text.to_string(),
                    }),
                },
                FieldKind::Choice { .. } => state.set(spec.name, text),
            }
        }

        (state, errors)
    }

    /// Check every field visible for `breakwater_type`. Values of fields
    /// that are not visible are ignored.
    pub fn validate(&self, breakwater_type: BreakwaterType) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        for spec in visible_fields(breakwater_type) {
            if let Err(e) = self.check_field(spec, breakwater_type) {
                errors.push(e);
            }
        }

        if breakwater_type == BreakwaterType::Caisson {
            if let (Some(draft), Some(depth)) = (self.number(names::D), self.number(names::H)) {
                if errors.iter().all(|e| e.field() != names::D) && draft > depth {
                    errors.push(ValidationError::DraftExceedsDepth { draft, depth });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    fn check_field(
        &self,
        spec: &'static FieldSpec,
        breakwater_type: BreakwaterType,
    ) -> Result<(), ValidationError> {
        let field = spec.name;
        let Some(value) = self.get(field) else {
            if !spec.is_required(breakwater_type) {
                return Ok(());
            }
            return Err(if spec.is_choice() {
                ValidationError::UnresolvedSelection { field }
            } else {
                ValidationError::Missing { field }
            });
        };

        match (spec.kind, value) {
            (FieldKind::Number { constraint, .. }, FieldValue::Number(n)) => {
                constraint.check(field, *n)
            }
            (FieldKind::Number { .. }, FieldValue::Choice(raw)) => Err(ValidationError::NotANumber {
                field,
                raw: raw.clone(),
            }),
            (FieldKind::Choice { options, .. }, FieldValue::Choice(choice)) => {
                if options.iter().any(|o| o.value == choice) {
                    Ok(())
                } else {
                    Err(ValidationError::UnknownChoice {
                        field,
                        value: choice.clone(),
                    })
                }
            }
            (FieldKind::Choice { .. }, FieldValue::Number(n)) => Err(ValidationError::UnknownChoice {
                field,
                value: n.to_string(),
            }),
        }
    }
}

/// Everything one user session owns: the selected type, its form values
/// and the last successful result.
#[derive(Debug, Clone)]
pub struct DesignSession {
    breakwater_type: BreakwaterType,
    form: FormState,
    last_result: Option<Arc<DesignResult>>,
}

impl Default for DesignSession {
    fn default() -> Self {
        Self::new(BreakwaterType::default())
    }
}

impl DesignSession {
    pub fn new(breakwater_type: BreakwaterType) -> Self {
        Self {
            breakwater_type,
            form: FormState::with_defaults(breakwater_type),
            last_result: None,
        }
    }

    pub fn breakwater_type(&self) -> BreakwaterType {
        self.breakwater_type
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn last_result(&self) -> Option<&Arc<DesignResult>> {
        self.last_result.as_ref()
    }

    /// Switch the breakwater type. Values that no longer apply are removed,
    /// newly shown fields get their defaults and the previous type's result
    /// is dropped.
    pub fn select_type(&mut self, breakwater_type: BreakwaterType) {
        if breakwater_type == self.breakwater_type {
            return;
        }
        let removed = self.form.retain_applicable(breakwater_type);
        tracing::debug!(
            from = self.breakwater_type.slug(),
            to = breakwater_type.slug(),
            removed = ?removed,
            "breakwater type changed"
        );
        self.breakwater_type = breakwater_type;
        self.form.fill_defaults(breakwater_type);
        self.last_result = None;
    }

    /// Replace the form values with a new submission for the current type.
    pub fn update_form(&mut self, mut form: FormState) {
        form.retain_applicable(self.breakwater_type);
        self.form = form;
    }

    pub fn record_result(&mut self, result: DesignResult) {
        self.last_result = Some(Arc::new(result));
    }
}
