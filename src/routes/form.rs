//! Design form page route handlers

use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use crate::design::schema::{self, Constraint, FieldKind, FieldSpec, Section};
use crate::design::{
    self, facade, BreakwaterType, DesignError, DesignResult, DesignSession, FormState,
    ValidationErrors,
};
use crate::error::Result;
use crate::sessions::{self, session_cookie};
use crate::AppState;

const TYPE_FIELD: &str = "breakwater_type";

#[derive(Debug, Clone)]
struct OptionView {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Debug)]
struct FieldView {
    name: &'static str,
    label: &'static str,
    unit: String,
    is_choice: bool,
    value: String,
    options: Vec<OptionView>,
    min: String,
    max: String,
    step: String,
    required: bool,
    error: String,
}

#[derive(Debug)]
struct SectionView {
    number: usize,
    title: &'static str,
    figure_url: String,
    figure_caption: String,
    fields: Vec<FieldView>,
}

#[derive(Debug)]
struct ResultView {
    breakwater_type: String,
    plot_data_uri: String,
    plot_width: u32,
    plot_height: u32,
    variant_report: String,
    warnings_report: String,
    input_hash: String,
    created_at: String,
}

/// Design form template
#[derive(Template)]
#[template(path = "design/form.html")]
struct DesignTemplate {
    breakwater_types: Vec<OptionView>,
    type_section: SectionView,
    sections: Vec<SectionView>,
    error: String,
    result: Option<ResultView>,
}

/// Form page for the current session
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let (id, session) = state.sessions.load(sessions::session_id(&headers)).await;
    let page = render(&session, &Feedback::default())?;
    Ok(with_cookie(StatusCode::OK, id, page))
}

/// Switch the breakwater type and show the rebuilt form.
///
/// The selector sits inside the design form, so unsaved edits arrive with
/// the new type and carry over to fields both types share.
pub async fn select_type(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(raw): Form<HashMap<String, String>>,
) -> Result<Response> {
    let requested = raw.get(TYPE_FIELD).map(String::as_str).unwrap_or_default();
    let breakwater_type: BreakwaterType = requested.parse()?;

    let (id, mut session) = state.sessions.load(sessions::session_id(&headers)).await;
    if raw.keys().any(|name| name != TYPE_FIELD) {
        let (edits, rejected) = FormState::from_submission(session.breakwater_type(), &raw);
        if !rejected.is_empty() {
            tracing::debug!("dropping {} unparseable values on type switch", rejected.len());
        }
        session.update_form(edits);
    }
    session.select_type(breakwater_type);
    state.sessions.save(id, session).await;

    Ok(([(header::SET_COOKIE, session_cookie(id))], Redirect::to("/")).into_response())
}

/// Handle the "Design" submit
pub async fn design(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(raw): Form<HashMap<String, String>>,
) -> Result<Response> {
    let (id, mut session) = state.sessions.load(sessions::session_id(&headers)).await;
    let breakwater_type = session.breakwater_type();

    let (form, parse_errors) = FormState::from_submission(breakwater_type, &raw);
    session.update_form(form);

    let outcome = if parse_errors.is_empty() {
        facade::design(
            state.engineering.as_ref(),
            breakwater_type,
            session.form(),
            state.config.design_timeout,
        )
        .await
        .map(|(_, result)| result)
    } else {
        Err(DesignError::Validation(ValidationErrors(parse_errors)))
    };

    let (status, feedback) = match outcome {
        Ok(result) => {
            session.record_result(result);
            (StatusCode::OK, Feedback::default())
        }
        Err(error) => {
            let status = design::error_status(&error);
            let feedback = match error {
                DesignError::Validation(errors) => Feedback {
                    message: "Please correct the highlighted fields.".to_string(),
                    field_errors: Some(errors),
                    raw: Some(raw),
                },
                other => Feedback {
                    message: other.to_string(),
                    field_errors: None,
                    raw: Some(raw),
                },
            };
            (status, feedback)
        }
    };

    let page = render(&session, &feedback)?;
    state.sessions.save(id, session).await;
    Ok(with_cookie(status, id, page))
}

/// Messages and submitted text shown alongside the form.
#[derive(Debug, Default)]
struct Feedback {
    message: String,
    field_errors: Option<ValidationErrors>,
    /// Text exactly as submitted, so rejected input is shown back unchanged
    raw: Option<HashMap<String, String>>,
}

fn with_cookie(status: StatusCode, id: uuid::Uuid, page: String) -> Response {
    (status, [(header::SET_COOKIE, session_cookie(id))], Html(page)).into_response()
}

fn render(session: &DesignSession, feedback: &Feedback) -> Result<String> {
    let breakwater_type = session.breakwater_type();

    let mut sections: Vec<SectionView> = design::form::sections(breakwater_type)
        .into_iter()
        .map(|(section, fields)| section_view(section, &fields, session, feedback))
        .collect();
    let type_section = sections.remove(0);

    let breakwater_types = BreakwaterType::ALL
        .iter()
        .map(|bt| OptionView {
            value: bt.slug().to_string(),
            label: bt.label().to_string(),
            selected: *bt == breakwater_type,
        })
        .collect();

    let template = DesignTemplate {
        breakwater_types,
        type_section,
        sections,
        error: feedback.message.clone(),
        result: session.last_result().map(|r| result_view(r)),
    };

    Ok(template.render()?)
}

fn section_view(
    section: Section,
    fields: &[&'static FieldSpec],
    session: &DesignSession,
    feedback: &Feedback,
) -> SectionView {
    let breakwater_type = session.breakwater_type();
    let figure = schema::figure(section, breakwater_type);

    SectionView {
        number: section.number(),
        title: section.title(),
        figure_url: figure.map(|f| f.url.to_string()).unwrap_or_default(),
        figure_caption: figure.map(|f| f.caption.to_string()).unwrap_or_default(),
        fields: fields
            .iter()
            .map(|spec| field_view(spec, breakwater_type, session.form(), feedback))
            .collect(),
    }
}

fn field_view(
    spec: &'static FieldSpec,
    breakwater_type: BreakwaterType,
    form: &FormState,
    feedback: &Feedback,
) -> FieldView {
    let value = feedback
        .raw
        .as_ref()
        .and_then(|raw| raw.get(spec.name).cloned())
        .or_else(|| form.get(spec.name).map(|v| v.display()))
        .unwrap_or_default();

    let error = feedback
        .field_errors
        .as_ref()
        .and_then(|errors| errors.for_field(spec.name))
        .map(|e| e.to_string())
        .unwrap_or_default();

    let (min, max, step) = match spec.kind {
        FieldKind::Number { constraint, step, .. } => {
            let step = step.map(|s| s.to_string());
            match constraint {
                Constraint::Range { min, max } => {
                    (min.to_string(), max.to_string(), step.unwrap_or_else(|| "any".into()))
                }
                Constraint::NonNegative => {
                    ("0".into(), String::new(), step.unwrap_or_else(|| "any".into()))
                }
                Constraint::Count => ("1".into(), String::new(), "1".into()),
                Constraint::Positive => {
                    (String::new(), String::new(), step.unwrap_or_else(|| "any".into()))
                }
            }
        }
        FieldKind::Choice { .. } => (String::new(), String::new(), String::new()),
    };

    let options = match spec.kind {
        FieldKind::Choice { options, .. } => options
            .iter()
            .map(|choice| OptionView {
                value: choice.value.to_string(),
                label: choice.label.to_string(),
                selected: choice.value == value,
            })
            .collect(),
        FieldKind::Number { .. } => Vec::new(),
    };

    FieldView {
        name: spec.name,
        label: spec.label,
        unit: spec.unit.map(|u| format!("[{}]", u)).unwrap_or_default(),
        is_choice: spec.is_choice(),
        value,
        options,
        min,
        max,
        step,
        required: spec.is_required(breakwater_type),
        error,
    }
}

fn result_view(result: &DesignResult) -> ResultView {
    ResultView {
        breakwater_type: result.breakwater_type.label().to_string(),
        plot_data_uri: result.plot.data_uri.clone(),
        plot_width: result.plot.width,
        plot_height: result.plot.height,
        variant_report: result.variant_report.clone(),
        warnings_report: result.warnings_report.clone(),
        input_hash: result.input_hash.clone(),
        created_at: result.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}
