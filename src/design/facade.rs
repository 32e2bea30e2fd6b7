//! Runs an assembled request against the engineering service.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::assembler::assemble;
use super::error::DesignError;
use super::form::FormState;
use super::models::{BreakwaterType, DesignRequest, DesignResult, PlotArtifact};
use super::service::{EngineeringService, LEVEL_WARNINGS, SCOPE_ALL};

/// Design `request` and collect the plot and both reports.
///
/// Either every artifact is returned or none is; there are no retries.
pub async fn execute(
    service: &dyn EngineeringService,
    request: &DesignRequest,
) -> Result<DesignResult, DesignError> {
    let input_hash = request.input_hash()?;
    info!(
        breakwater_type = request.breakwater_type().slug(),
        limit_state = request.limit_state().label.as_str(),
        %input_hash,
        "submitting design"
    );

    let handle = service.design(request).await?;
    let png = service.render_plot(&handle, SCOPE_ALL).await?;
    let variant_report = service.describe_variant(&handle, SCOPE_ALL).await?;
    let warnings_report = service.describe_warnings(&handle, LEVEL_WARNINGS).await?;
    let plot = PlotArtifact::from_png(&png)?;

    info!(
        design = %handle.id,
        width = plot.width,
        height = plot.height,
        "design completed"
    );

    Ok(DesignResult {
        breakwater_type: request.breakwater_type(),
        plot,
        variant_report,
        warnings_report,
        input_hash,
        created_at: Utc::now(),
    })
}

/// Validate and assemble `form` without designing it, giving up after
/// `limit`.
pub async fn assemble_within(
    service: &dyn EngineeringService,
    breakwater_type: BreakwaterType,
    form: &FormState,
    limit: Duration,
) -> Result<DesignRequest, DesignError> {
    form.validate(breakwater_type)?;
    within(limit, breakwater_type, "assembly", assemble(service, breakwater_type, form)).await
}

/// Full "Design" action: validate and assemble `form`, then execute it,
/// giving up after `limit`.
///
/// Local validation is not subject to the limit; only the service calls are.
pub async fn design(
    service: &dyn EngineeringService,
    breakwater_type: BreakwaterType,
    form: &FormState,
    limit: Duration,
) -> Result<(DesignRequest, DesignResult), DesignError> {
    form.validate(breakwater_type)?;

    let run = async {
        let request = assemble(service, breakwater_type, form).await?;
        let result = execute(service, &request).await?;
        Ok::<_, DesignError>((request, result))
    };

    within(limit, breakwater_type, "design", run).await
}

async fn within<T>(
    limit: Duration,
    breakwater_type: BreakwaterType,
    action: &str,
    run: impl Future<Output = Result<T, DesignError>>,
) -> Result<T, DesignError> {
    match tokio::time::timeout(limit, run).await {
        Ok(outcome) => {
            if let Err(e) = &outcome {
                if e.is_local() {
                    debug!(breakwater_type = breakwater_type.slug(), error = %e, "{} rejected", action);
                } else {
                    warn!(breakwater_type = breakwater_type.slug(), error = %e, "{} failed", action);
                }
            }
            outcome
        }
        Err(_) => {
            warn!(
                breakwater_type = breakwater_type.slug(),
                "{} timed out after {:?}", action, limit
            );
            Err(DesignError::Timeout(limit))
        }
    }
}
