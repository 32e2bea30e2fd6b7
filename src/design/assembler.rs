//! Turns a validated form into a typed design request.

use std::str::FromStr;

use super::error::{DesignError, ValidationError};
use super::form::FormState;
use super::models::{
    ArmourUnit, BermMaterial, BreakwaterType, CaissonRequest, ConcreteRubbleMoundRequest,
    DesignRequest, LimitState, RockGrading, RockRubbleMoundRequest, Slope, ULTIMATE_LIMIT_STATE,
};
use super::schema::names;
use super::service::EngineeringService;

/// Multiplier passed to the limit state's period transformation.
const PERIOD_TRANSFORM: f64 = 1.0;

/// Validate `form` for `breakwater_type` and build the design request.
///
/// Validation runs before the engineering service is contacted; the
/// service is only used for the derived wave heights.
pub async fn assemble(
    service: &dyn EngineeringService,
    breakwater_type: BreakwaterType,
    form: &FormState,
) -> Result<DesignRequest, DesignError> {
    form.validate(breakwater_type)?;

    let hm0 = required(form, names::HM0)?;
    let h = required(form, names::H)?;
    let slope_foreshore = Slope::new(
        required(form, names::SLOPE_FORESHORE_V)?,
        required(form, names::SLOPE_FORESHORE_H)?,
    );

    let h2_percent = service.exceedance_height(hm0, h, slope_foreshore).await?;

    let mut limit_state = LimitState::new(
        h,
        ULTIMATE_LIMIT_STATE,
        hm0,
        required(form, names::LIMIT_Q)?,
        required(form, names::LIMIT_HS)?,
        required(form, names::LIMIT_TP)?,
    );

    match breakwater_type {
        BreakwaterType::RockRubbleMound => {
            limit_state.nod = form.number(names::LIMIT_NOD);
            limit_state.sd = form.number(names::LIMIT_SD);
        }
        BreakwaterType::ConcreteRubbleMound => {
            limit_state.nod = Some(required(form, names::LIMIT_NOD)?);
        }
        BreakwaterType::Caisson => {
            let d = required(form, names::D)?;
            let waves = service
                .waves_at_structure(h, d, limit_state.hs, limit_state.tp, slope_foreshore)
                .await?;
            limit_state.h13 = Some(waves.h13);
            limit_state.hmax = Some(waves.hmax);
        }
    }
    limit_state.transform_periods(PERIOD_TRANSFORM);

    let grading = RockGrading::new(required(form, names::RHO)?);
    let rho_w = required(form, names::RHO_W)?;

    let request = match breakwater_type {
        BreakwaterType::RockRubbleMound => DesignRequest::RockRubbleMound(RockRubbleMoundRequest {
            slope: breakwater_slope(form)?,
            slope_foreshore,
            rho_w,
            b: required(form, names::B)?,
            n: count(form, names::N)?,
            limit_state,
            grading,
            dn50_core: required(form, names::DN50_CORE)?,
            h2_percent,
        }),
        BreakwaterType::ConcreteRubbleMound => {
            DesignRequest::ConcreteRubbleMound(ConcreteRubbleMoundRequest {
                slope: breakwater_slope(form)?,
                slope_foreshore,
                rho_w,
                b: required(form, names::B)?,
                armour_unit: armour_unit(form, names::ARMOUR_TYPE)?,
                limit_state,
                grading,
                dn50_core: required(form, names::DN50_CORE)?,
                h2_percent,
            })
        }
        BreakwaterType::Caisson => DesignRequest::Caisson(CaissonRequest {
            pc: required(form, names::PC)?,
            rho_c: required(form, names::RHO_C)?,
            rho_fill: required(form, names::RHO_FILL)?,
            rho_w,
            bm: required(form, names::BM)?,
            hb: required(form, names::HB)?,
            layers: count(form, names::LAYERS)?,
            berm_material: berm_material(form, &grading)?,
            grading,
            limit_state,
            slope_foreshore,
            mu: required(form, names::MU)?,
            beta: required(form, names::BETA)?,
            h2_percent,
        }),
    };

    tracing::debug!(
        breakwater_type = breakwater_type.slug(),
        h2_percent,
        "assembled design request"
    );
    Ok(request)
}

fn required(form: &FormState, field: &'static str) -> Result<f64, ValidationError> {
    form.number(field).ok_or(ValidationError::Missing { field })
}

fn count(form: &FormState, field: &'static str) -> Result<u32, ValidationError> {
    let value = required(form, field)?;
    if value < 1.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(ValidationError::NotACount { field, value });
    }
    Ok(value as u32)
}

fn breakwater_slope(form: &FormState) -> Result<Slope, ValidationError> {
    Ok(Slope::new(
        required(form, names::SLOPE_V)?,
        required(form, names::SLOPE_H)?,
    ))
}

fn armour_unit(form: &FormState, field: &'static str) -> Result<ArmourUnit, ValidationError> {
    let choice = form
        .choice(field)
        .ok_or(ValidationError::UnresolvedSelection { field })?;
    ArmourUnit::from_str(choice).map_err(|_| ValidationError::UnknownChoice {
        field,
        value: choice.to_string(),
    })
}

/// Rock berms reuse the main grading; concrete berms resolve to a unit.
fn berm_material(form: &FormState, grading: &RockGrading) -> Result<BermMaterial, ValidationError> {
    let field = names::BERM_MATERIAL;
    match form.choice(field) {
        Some("rock") => Ok(BermMaterial::Rock {
            grading: grading.clone(),
        }),
        Some(_) => Ok(BermMaterial::ArmourUnit {
            unit: armour_unit(form, field)?,
        }),
        None => Err(ValidationError::UnresolvedSelection { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::service::fake::FakeService;

    fn rrm_form() -> FormState {
        let mut form = FormState::new();
        form.set("Hm0", 2.0);
        form.set("h", 15.0);
        form.set("slope_foreshore_v", 1.0);
        form.set("slope_foreshore_h", 100.0);
        form.set("limit_q", 20.0);
        form.set("limit_Hs", 2.0);
        form.set("limit_Tp", 9.4);
        form.set("slope_v", 2.0);
        form.set("slope_h", 3.0);
        form.set("rho_w", 1025.0);
        form.set("B", 5.5);
        form.set("N", 2100.0);
        form.set("Dn50_core", 1.0);
        form.set("rho", 2650.0);
        form
    }

    fn caisson_form() -> FormState {
        let mut form = rrm_form();
        form.retain_applicable(BreakwaterType::Caisson);
        form.set("d", 10.0);
        form.set("Pc", 0.2);
        form.set("rho_c", 2400.0);
        form.set("rho_fill", 1600.0);
        form.set("Bm", 8.0);
        form.set("hb", 2.0);
        form.set("layers", 2.0);
        form.set("berm_material", "rock");
        form.set("mu", 0.5);
        form.set("beta", 15.0);
        form
    }

    #[tokio::test]
    async fn test_rock_rubble_mound_scenario() {
        let service = FakeService::new();
        let request = assemble(&service, BreakwaterType::RockRubbleMound, &rrm_form())
            .await
            .unwrap();

        let DesignRequest::RockRubbleMound(rrm) = &request else {
            panic!("expected a rock rubble mound request, got {:?}", request);
        };
        assert_eq!(rrm.slope, Slope::new(2.0, 3.0));
        assert_eq!(rrm.n, 2100);
        assert_eq!(rrm.grading, RockGrading::new(2650.0));
        assert!((rrm.h2_percent - 2.8).abs() < 1e-9);

        let limit = serde_json::to_value(request.limit_state()).unwrap();
        assert_eq!(limit["h"], 15.0);
        assert_eq!(limit["label"], "Ultimate Limit State");
        assert_eq!(limit["q"], 20.0);
        assert_eq!(limit["Hs"], 2.0);
        assert_eq!(limit["Tp"], 9.4);
        assert!(limit.get("Nod").is_none());
        assert!(limit.get("Sd").is_none());
        assert_eq!(request.limit_state().period_transform, Some(1.0));

        // exceedance height only
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_rock_rubble_mound_keeps_damage_numbers() {
        let service = FakeService::new();
        let mut form = rrm_form();
        form.set("limit_Nod", 0.5);
        form.set("limit_Sd", 2.0);

        let request = assemble(&service, BreakwaterType::RockRubbleMound, &form)
            .await
            .unwrap();

        assert_eq!(request.limit_state().nod, Some(0.5));
        assert_eq!(request.limit_state().sd, Some(2.0));
    }

    #[tokio::test]
    async fn test_concrete_requires_armour_before_any_call() {
        let service = FakeService::new();
        let mut form = rrm_form();
        form.set("limit_Nod", 5.0);

        let result = assemble(&service, BreakwaterType::ConcreteRubbleMound, &form).await;

        match result {
            Err(DesignError::Validation(errors)) => {
                assert_eq!(
                    errors.for_field("armour_type"),
                    Some(&ValidationError::UnresolvedSelection { field: "armour_type" })
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_concrete_always_carries_nod() {
        let service = FakeService::new();
        let mut form = rrm_form();
        form.set("limit_Nod", 5.0);
        form.set("armour_type", "xbloc_plus");

        let request = assemble(&service, BreakwaterType::ConcreteRubbleMound, &form)
            .await
            .unwrap();

        let DesignRequest::ConcreteRubbleMound(crm) = &request else {
            panic!("expected a concrete rubble mound request");
        };
        assert_eq!(crm.armour_unit, ArmourUnit::XblocPlus);
        assert_eq!(crm.limit_state.nod, Some(5.0));
        assert_eq!(crm.limit_state.sd, None);
        // N is a rock-only field and is not part of the request
        assert!(serde_json::to_value(&request).unwrap().get("N").is_none());
    }

    #[tokio::test]
    async fn test_caisson_scenario() {
        let service = FakeService::new();
        let request = assemble(&service, BreakwaterType::Caisson, &caisson_form())
            .await
            .unwrap();

        let DesignRequest::Caisson(caisson) = &request else {
            panic!("expected a caisson request");
        };
        assert_eq!(
            caisson.berm_material,
            BermMaterial::Rock {
                grading: caisson.grading.clone()
            }
        );
        assert_eq!(caisson.layers, 2);
        assert_eq!(caisson.limit_state.h13, Some(2.0 * 1.1));
        assert_eq!(caisson.limit_state.hmax, Some(4.0));
        assert_eq!(caisson.limit_state.nod, None);
        assert_eq!(caisson.limit_state.sd, None);

        let inputs = service.wave_inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1);
        let (h, d, ho, t, slope) = inputs[0];
        assert_eq!((h, d, ho, t), (15.0, 10.0, 2.0, 9.4));
        assert_eq!(slope, Slope::new(1.0, 100.0));
    }

    #[tokio::test]
    async fn test_caisson_concrete_berm() {
        let service = FakeService::new();
        let mut form = caisson_form();
        form.set("berm_material", "xbloc");

        let request = assemble(&service, BreakwaterType::Caisson, &form).await.unwrap();

        let DesignRequest::Caisson(caisson) = request else {
            panic!("expected a caisson request");
        };
        assert_eq!(
            caisson.berm_material,
            BermMaterial::ArmourUnit {
                unit: ArmourUnit::Xbloc
            }
        );
    }

    #[tokio::test]
    async fn test_assemble_is_idempotent() {
        let service = FakeService::new();
        let form = caisson_form();

        let first = assemble(&service, BreakwaterType::Caisson, &form).await.unwrap();
        let second = assemble(&service, BreakwaterType::Caisson, &form).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.input_hash().unwrap(), second.input_hash().unwrap());
    }

    #[tokio::test]
    async fn test_non_positive_density_fails() {
        let service = FakeService::new();
        let mut form = rrm_form();
        form.set("rho", -2650.0);

        let result = assemble(&service, BreakwaterType::RockRubbleMound, &form).await;

        assert!(matches!(result, Err(DesignError::Validation(_))));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_armour_does_not_leak_into_rock_request() {
        let service = FakeService::new();
        let mut form = rrm_form();
        form.set("armour_type", "xbloc");

        let request = assemble(&service, BreakwaterType::RockRubbleMound, &form)
            .await
            .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("ArmourUnit").is_none());
        assert_eq!(json["type"], "rock_rubble_mound");
    }
}
