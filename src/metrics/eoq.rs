//! Economic Order Quantity, `sqrt(2DS / H)`.

use serde::Serialize;
use tracing::{error, info};

use crate::error::{AnalysisError, Result};

const OPERATION: &str = "compute_eoq";

/// Cost breakdown when ordering the economic quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EoqSummary {
    pub order_quantity: f64,
    pub orders_per_period: f64,
    pub ordering_cost_total: f64,
    pub holding_cost_total: f64,
    pub total_cost: f64,
}

fn validate_inputs(demand_rate: f64, ordering_cost: f64, holding_cost: f64) -> Result<()> {
    for (name, value) in [
        ("demand_rate", demand_rate),
        ("ordering_cost", ordering_cost),
        ("holding_cost", holding_cost),
    ] {
        if !value.is_finite() {
            return Err(AnalysisError::validation(
                OPERATION,
                format!("{name} must be finite, got {value}"),
            ));
        }
    }
    if demand_rate < 0.0 {
        return Err(AnalysisError::validation(
            OPERATION,
            format!("demand_rate must be >= 0, got {demand_rate}"),
        ));
    }
    if ordering_cost < 0.0 {
        return Err(AnalysisError::validation(
            OPERATION,
            format!("ordering_cost must be >= 0, got {ordering_cost}"),
        ));
    }
    if holding_cost <= 0.0 {
        return Err(AnalysisError::validation(
            OPERATION,
            format!("holding_cost must be > 0, got {holding_cost}"),
        ));
    }
    Ok(())
}

/// Economic order quantity for the given demand rate, cost per order and
/// holding cost per unit, all over the same period.
///
/// # Errors
///
/// `Validation` if any input is non-finite, a cost or demand is negative, or
/// `holding_cost <= 0`. Inputs are checked before any arithmetic.
/// `Arithmetic` if the quantity overflows.
#[tracing::instrument(level = "debug")]
pub fn compute_eoq(demand_rate: f64, ordering_cost: f64, holding_cost: f64) -> Result<f64> {
    validate_inputs(demand_rate, ordering_cost, holding_cost)
        .inspect_err(|e| error!(operation = OPERATION, error = %e, "EOQ rejected"))?;

    let quantity = ((2.0 * demand_rate * ordering_cost) / holding_cost).sqrt();
    if !quantity.is_finite() {
        let err = AnalysisError::arithmetic(
            OPERATION,
            format!("order quantity is not finite ({quantity})"),
        );
        error!(operation = OPERATION, error = %err, "EOQ overflowed");
        return Err(err);
    }
    info!(
        demand_rate,
        ordering_cost, holding_cost, quantity, "Economic order quantity computed"
    );
    Ok(quantity)
}

/// EOQ together with the per-period ordering and holding costs it implies.
pub fn summarize_eoq(
    demand_rate: f64,
    ordering_cost: f64,
    holding_cost: f64,
) -> Result<EoqSummary> {
    let order_quantity = compute_eoq(demand_rate, ordering_cost, holding_cost)?;

    let orders_per_period = if order_quantity > 0.0 {
        demand_rate / order_quantity
    } else {
        0.0
    };
    let ordering_cost_total = orders_per_period * ordering_cost;
    let holding_cost_total = order_quantity / 2.0 * holding_cost;
    let total_cost = ordering_cost_total + holding_cost_total;
    if !total_cost.is_finite() {
        return Err(AnalysisError::arithmetic(
            OPERATION,
            format!("total cost is not finite ({total_cost})"),
        ));
    }

    Ok(EoqSummary {
        order_quantity,
        orders_per_period,
        ordering_cost_total,
        holding_cost_total,
        total_cost,
    })
}
