//! Stage-transition validation and derived placement terms.
//!
//! `validate` is a pure function: it accepts or rejects a requested stage
//! change against the transition graph and the per-transition field gates,
//! and computes the derived commercial fields for a placement. Persisting
//! the outcome is the caller's job (see [`crate::pipeline::PipelineService`]).

use chrono::{Days, NaiveDate};
use serde_json::Value;

use crate::stage::{self, Stage};

/// The loosely-typed field bag supplied with a transition request.
pub type FieldBag = serde_json::Map<String, Value>;

/// A requested stage change, before validation.
#[derive(Debug, Clone)]
pub struct TransitionRequest<'a> {
    pub current: Stage,
    /// For entries currently `on_hold`: the stage they were paused from.
    pub held_from: Option<Stage>,
    pub target: Stage,
    pub fields: &'a FieldBag,
}

/// Why a requested transition was rejected. Plain data, meant for display.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    IllegalTransition { from: Stage, to: Stage },
    MissingRequiredFields(Vec<String>),
    InvalidField { key: String, reason: String },
}

/// A validated transition, ready to persist.
#[derive(Debug, Clone)]
pub struct AcceptedTransition {
    pub from: Stage,
    pub to: Stage,
    /// Derived commercial terms, present only when `to` is `placed`.
    pub placement: Option<PlacementTerms>,
}

/// Commercial terms derived at the moment of placement.
///
/// `fee_value` and `guarantee_expiry` are always recomputed from the
/// supplied inputs, never taken from the field bag directly.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementTerms {
    pub start_date: NaiveDate,
    pub salary: f64,
    pub fee_percentage: f64,
    pub fee_value: i64,
    pub guarantee_period_days: i64,
    pub guarantee_expiry: NaiveDate,
}

/// Validates a requested stage change against the graph and field gates.
pub fn validate(req: &TransitionRequest<'_>) -> Result<AcceptedTransition, RejectionReason> {
    if !stage::allowed_next(req.current, req.held_from).contains(&req.target) {
        return Err(RejectionReason::IllegalTransition {
            from: req.current,
            to: req.target,
        });
    }

    let missing: Vec<String> = stage::required_fields(req.current, req.target)
        .iter()
        .filter(|key| is_blank(req.fields.get(**key)))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(RejectionReason::MissingRequiredFields(missing));
    }

    let placement = if req.target == Stage::Placed {
        Some(derive_placement_terms(req.fields)?)
    } else {
        None
    };

    Ok(AcceptedTransition {
        from: req.current,
        to: req.target,
        placement,
    })
}

/// A required field counts as missing when absent, null, or blank text.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn derive_placement_terms(fields: &FieldBag) -> Result<PlacementTerms, RejectionReason> {
    let salary = number_field(fields, "salary")?;
    let fee_percentage = number_field(fields, "fee_percentage")?;
    let start_date = date_field(fields, "start_date")?;
    let guarantee_period_days = integer_field(fields, "guarantee_period_days")?;

    if guarantee_period_days < 0 {
        return Err(RejectionReason::InvalidField {
            key: "guarantee_period_days".to_string(),
            reason: "must not be negative".to_string(),
        });
    }

    // Round half-up to the nearest whole currency unit.
    let fee_value = (salary * fee_percentage / 100.0).round() as i64;

    let guarantee_expiry = start_date
        .checked_add_days(Days::new(guarantee_period_days as u64))
        .ok_or_else(|| RejectionReason::InvalidField {
            key: "guarantee_period_days".to_string(),
            reason: "pushes the guarantee expiry out of range".to_string(),
        })?;

    Ok(PlacementTerms {
        start_date,
        salary,
        fee_percentage,
        fee_value,
        guarantee_period_days,
        guarantee_expiry,
    })
}

fn number_field(fields: &FieldBag, key: &str) -> Result<f64, RejectionReason> {
    let value = match fields.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        // Form bags often carry numbers as strings.
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(_) => Err(invalid(key, "must be a non-negative number")),
        None => Err(invalid(key, "must be a number")),
    }
}

fn integer_field(fields: &FieldBag, key: &str) -> Result<i64, RejectionReason> {
    let value = match fields.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    value.ok_or_else(|| invalid(key, "must be a whole number"))
}

fn date_field(fields: &FieldBag, key: &str) -> Result<NaiveDate, RejectionReason> {
    match fields.get(key) {
        Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| invalid(key, "must be a YYYY-MM-DD date")),
        _ => Err(invalid(key, "must be a YYYY-MM-DD date")),
    }
}

fn invalid(key: &str, reason: &str) -> RejectionReason {
    RejectionReason::InvalidField {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
