use super::tax::stamp_duty;
use super::types::{Evaluation, PROJECTION_YEARS, ProjectionResult, ScenarioInput, YearlyRecord};

/// Runs both calls a recomputation needs: stamp duty on the buying price,
/// then the projection against the scenario's own net proceeds.
pub fn evaluate(scenario: &ScenarioInput) -> Evaluation {
    let transfer_tax = stamp_duty(scenario.buying_price);
    let net_proceeds = scenario.net_proceeds();
    let projection = project(scenario, transfer_tax, net_proceeds);

    tracing::debug!(
        transfer_tax,
        net_proceeds,
        final_buying_wealth = projection.final_buying_wealth,
        final_renting_wealth = projection.final_renting_wealth,
        "evaluated scenario"
    );

    Evaluation {
        transfer_tax,
        net_proceeds,
        projection,
    }
}

/// Year-by-year wealth under buying and under renting, years 1 through 30.
pub fn project(scenario: &ScenarioInput, transfer_tax: f64, net_proceeds: f64) -> ProjectionResult {
    let years: Vec<YearlyRecord> = (1..=PROJECTION_YEARS)
        .map(|year| project_year(scenario, transfer_tax, net_proceeds, year))
        .collect();

    let last = years[years.len() - 1];
    ProjectionResult {
        final_buying_wealth: last.buying_wealth,
        final_renting_wealth: last.renting_wealth,
        years,
    }
}

fn project_year(
    scenario: &ScenarioInput,
    transfer_tax: f64,
    net_proceeds: f64,
    year: u32,
) -> YearlyRecord {
    let house_rate = scenario.house_price_growth_pct / 100.0;
    let savings_rate = scenario.savings_return_pct / 100.0;
    let insurance = scenario.building_insurance_per_year;

    let buying_income = round_whole(cumulative_growth(scenario.buying_price, house_rate, year));
    let running_costs = scenario.maintenance_per_year + insurance;
    let buying_expenditure = if year == 1 {
        round_whole(running_costs + transfer_tax)
    } else {
        round_whole(running_costs)
    };
    // Insurance is counted again on top of the rounded expenditure.
    let buying_wealth = round_whole(future_value(
        house_rate,
        year,
        buying_expenditure + insurance,
        -scenario.buying_price,
    ));

    let annual_rent = scenario.rent_per_month * 12.0;
    let renting_income = round_whole(cumulative_growth(net_proceeds, savings_rate, year));
    let renting_expenditure = round_whole(annual_rent);
    let renting_wealth = round_whole(future_value(
        savings_rate,
        year,
        annual_rent,
        -net_proceeds,
    ));

    YearlyRecord {
        year,
        buying_income,
        buying_expenditure,
        buying_wealth,
        renting_income,
        renting_expenditure,
        renting_wealth,
    }
}

/// Growth on `principal` from year 0 to `year`, not just the latest year's.
fn cumulative_growth(principal: f64, rate: f64, year: u32) -> f64 {
    principal * (1.0 + rate).powf(year as f64) - principal
}

/// Future value of a present value plus a level end-of-period payment, using
/// the usual cash-flow signs: money paid out is negative.
pub fn future_value(rate: f64, periods: u32, payment: f64, present_value: f64) -> f64 {
    let n = periods as f64;
    if rate == 0.0 {
        return -present_value - payment * n;
    }
    let growth = (1.0 + rate).powf(n);
    -present_value * growth - payment * (growth - 1.0) / rate
}

/// Whole currency units, ties to even.
fn round_whole(value: f64) -> f64 {
    value.round_ties_even()
}
