use serde::Serialize;

use super::{PROJECTION_YEARS, ScenarioInput, evaluate};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    /// Lowest house-price growth (percent) at which buying catches up with renting.
    BreakEvenHouseGrowth,
    /// Highest monthly rent at which renting still keeps up with buying.
    MaxRent,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub target_year: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub wealth_gap: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_year: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_value: Option<f64>,
    /// Buying wealth minus renting wealth at the target year for the solved value.
    pub achieved_wealth_gap: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

pub fn solve_goal(
    scenario: &ScenarioInput,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, String> {
    validate_config(config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_met = goal_met(config.goal_type, wealth_gap(scenario, config, config.search_min));
    let high_met = goal_met(config.goal_type, wealth_gap(scenario, config, config.search_max));

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    match config.goal_type {
        GoalType::BreakEvenHouseGrowth => {
            if low_met {
                solved_value = Some(config.search_min);
                converged = true;
                feasible = true;
                message = "Buying already breaks even at the lower growth bound.".to_string();
            } else if !high_met {
                feasible = false;
                message = "Buying does not break even within the search bounds.".to_string();
            } else {
                let (value, done) = bisect(scenario, config, &mut iterations, true);
                solved_value = Some(value);
                converged = done;
                feasible = true;
                message = if converged {
                    "Solved break-even house price growth.".to_string()
                } else {
                    "Reached max iterations before tolerance was met; returning best estimate."
                        .to_string()
                };
            }
        }
        GoalType::MaxRent => {
            if !low_met {
                feasible = false;
                message = "Renting falls behind buying even at the lower rent bound.".to_string();
            } else if high_met {
                solved_value = Some(config.search_max);
                converged = true;
                feasible = true;
                message =
                    "Upper rent bound still keeps up with buying; increase search max.".to_string();
            } else {
                let (value, done) = bisect(scenario, config, &mut iterations, false);
                solved_value = Some(value);
                converged = done;
                feasible = true;
                message = if converged {
                    "Solved maximum affordable rent.".to_string()
                } else {
                    "Reached max iterations before tolerance was met; returning best estimate."
                        .to_string()
                };
            }
        }
    }

    let achieved_wealth_gap = solved_value.map(|value| wealth_gap(scenario, config, value));

    tracing::debug!(
        goal = ?config.goal_type,
        target_year = config.target_year,
        ?solved_value,
        feasible,
        converged,
        iterations = iterations.len(),
        "goal solve finished"
    );

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_year: config.target_year,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        achieved_wealth_gap,
        iterations,
        converged,
        feasible,
        message,
    })
}

/// Narrows the bracket until it is within tolerance. With `met_moves_high`
/// the goal is met at the upper end and the smallest meeting value is
/// returned; otherwise it is met at the lower end and the largest is returned.
fn bisect(
    scenario: &ScenarioInput,
    config: GoalSolveConfig,
    iterations: &mut Vec<GoalSolveIteration>,
    met_moves_high: bool,
) -> (f64, bool) {
    let mut lo = config.search_min;
    let mut hi = config.search_max;
    let mut it = 0;
    while it < config.max_iterations {
        it += 1;
        let mid = (lo + hi) * 0.5;
        let gap = wealth_gap(scenario, config, mid);
        iterations.push(GoalSolveIteration {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate_value: mid,
            wealth_gap: gap,
        });

        let met = goal_met(config.goal_type, gap);
        if met == met_moves_high {
            hi = mid;
        } else {
            lo = mid;
        }

        if (hi - lo).abs() <= config.tolerance {
            break;
        }
    }

    let best = if met_moves_high { hi } else { lo };
    (best, (hi - lo).abs() <= config.tolerance)
}

fn goal_met(goal_type: GoalType, gap: f64) -> bool {
    match goal_type {
        GoalType::BreakEvenHouseGrowth => gap >= 0.0,
        GoalType::MaxRent => gap <= 0.0,
    }
}

fn wealth_gap(base: &ScenarioInput, config: GoalSolveConfig, candidate_value: f64) -> f64 {
    let mut scenario = base.clone();
    match config.goal_type {
        GoalType::BreakEvenHouseGrowth => scenario.house_price_growth_pct = candidate_value,
        GoalType::MaxRent => scenario.rent_per_month = candidate_value,
    }

    let evaluation = evaluate(&scenario);
    evaluation
        .projection
        .record(config.target_year)
        .map(|record| record.buying_wealth - record.renting_wealth)
        .unwrap_or(evaluation.projection.wealth_gap())
}

fn validate_config(config: GoalSolveConfig) -> Result<(), String> {
    if !(1..=PROJECTION_YEARS).contains(&config.target_year) {
        return Err(format!("target_year must be between 1 and {PROJECTION_YEARS}"));
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err("search bounds must be finite".to_string());
    }
    if config.search_max <= config.search_min {
        return Err("search_max must be greater than search_min".to_string());
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err("tolerance must be > 0".to_string());
    }
    if config.max_iterations == 0 {
        return Err("max_iterations must be > 0".to_string());
    }
    Ok(())
}
