mod engine;
mod solver;
mod tax;
mod types;

pub use engine::{evaluate, future_value, project};
pub use solver::{GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, solve_goal};
pub use tax::{STAMP_DUTY_BANDS, stamp_duty, stamp_duty_breakdown};
pub use types::{
    BandCharge, ESTATE_AGENT_FEE_RATE, Evaluation, MAINTENANCE_RATE, PROJECTION_YEARS,
    ProjectionResult, ScenarioInput, TaxBand, YearlyRecord, suggested_estate_agent_fee,
    suggested_maintenance_per_year,
};
