use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    BandCharge, GoalSolveConfig, GoalType, ScenarioInput, YearlyRecord, evaluate,
    solve_goal, stamp_duty, stamp_duty_breakdown, suggested_estate_agent_fee,
    suggested_maintenance_per_year,
};

/// Slider range the UI offers for both growth and return percentages.
const MAX_RATE_PCT: f64 = 10.0;
/// Top of the UI's rent slider, used as the default rent search bound.
const MAX_RENT_PER_MONTH: f64 = 4_000.0;

#[derive(Args, Debug, Clone)]
pub struct ScenarioArgs {
    #[arg(long, default_value_t = 500_000.0, help = "Expected sale price of the current home")]
    sale_price: f64,
    #[arg(long, help = "Estate agent fee; defaults to 1% of the sale price")]
    estate_agent_fee: Option<f64>,
    #[arg(long, default_value_t = 2_000.0)]
    movers_fees: f64,
    #[arg(long, default_value_t = 2_000.0)]
    solicitors_fees: f64,
    #[arg(long, default_value_t = 0.0)]
    storage_cost: f64,
    #[arg(long, default_value_t = 500_000.0, help = "Price of the home being bought")]
    buying_price: f64,
    #[arg(long, help = "Annual maintenance; defaults to 1% of the buying price")]
    maintenance_per_year: Option<f64>,
    #[arg(long, default_value_t = 500.0)]
    building_insurance_per_year: f64,
    #[arg(long, default_value_t = 1_500.0)]
    rent_per_month: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "House price growth per year in percent, 0 to 10"
    )]
    house_price_growth: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Savings return per year in percent, 0 to 10"
    )]
    savings_return: f64,
}

impl Default for ScenarioArgs {
    fn default() -> Self {
        Self {
            sale_price: 500_000.0,
            estate_agent_fee: None,
            movers_fees: 2_000.0,
            solicitors_fees: 2_000.0,
            storage_cost: 0.0,
            buying_price: 500_000.0,
            maintenance_per_year: None,
            building_insurance_per_year: 500.0,
            rent_per_month: 1_500.0,
            house_price_growth: 2.0,
            savings_return: 2.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    sale_price: Option<f64>,
    estate_agent_fee: Option<f64>,
    movers_fees: Option<f64>,
    solicitors_fees: Option<f64>,
    #[serde(alias = "storage")]
    storage_cost: Option<f64>,
    buying_price: Option<f64>,
    #[serde(alias = "maintenance")]
    maintenance_per_year: Option<f64>,
    #[serde(alias = "insurance")]
    building_insurance_per_year: Option<f64>,
    #[serde(alias = "rentPcm")]
    rent_per_month: Option<f64>,
    #[serde(alias = "houseGrowth")]
    house_price_growth: Option<f64>,
    #[serde(alias = "savingsReturns")]
    savings_return: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiGoalType {
    #[serde(alias = "breakEvenGrowth", alias = "break_even_growth")]
    BreakEvenGrowth,
    #[serde(alias = "maxRent", alias = "max_rent")]
    MaxRent,
}

impl From<ApiGoalType> for GoalType {
    fn from(value: ApiGoalType) -> Self {
        match value {
            ApiGoalType::BreakEvenGrowth => GoalType::BreakEvenHouseGrowth,
            ApiGoalType::MaxRent => GoalType::MaxRent,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolvePayload {
    #[serde(flatten)]
    scenario: ProjectPayload,
    goal: Option<ApiGoalType>,
    target_year: Option<u32>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct StampDutyQuery {
    price: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    transfer_tax: f64,
    stamp_duty_due: String,
    selling_costs: f64,
    net_proceeds: f64,
    sale_output: String,
    stamp_duty_bands: Vec<BandCharge>,
    final_buying_wealth: f64,
    final_renting_wealth: f64,
    wealth_gap: f64,
    break_even_year: Option<u32>,
    years: Vec<YearlyRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StampDutyResponse {
    price: f64,
    stamp_duty: f64,
    stamp_duty_due: String,
    bands: Vec<BandCharge>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Resolves derived defaults and checks the ranges the UI enforces.
pub fn build_scenario(args: ScenarioArgs) -> Result<ScenarioInput, String> {
    let estate_agent_fee = args
        .estate_agent_fee
        .unwrap_or_else(|| suggested_estate_agent_fee(args.sale_price));
    let maintenance_per_year = args
        .maintenance_per_year
        .unwrap_or_else(|| suggested_maintenance_per_year(args.buying_price));

    let amounts = [
        ("--sale-price", args.sale_price),
        ("--estate-agent-fee", estate_agent_fee),
        ("--movers-fees", args.movers_fees),
        ("--solicitors-fees", args.solicitors_fees),
        ("--storage-cost", args.storage_cost),
        ("--buying-price", args.buying_price),
        ("--maintenance-per-year", maintenance_per_year),
        ("--building-insurance-per-year", args.building_insurance_per_year),
        ("--rent-per-month", args.rent_per_month),
    ];
    for (flag, value) in amounts {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{flag} must be a non-negative amount"));
        }
    }

    let rates = [
        ("--house-price-growth", args.house_price_growth),
        ("--savings-return", args.savings_return),
    ];
    for (flag, value) in rates {
        if !(0.0..=MAX_RATE_PCT).contains(&value) {
            return Err(format!("{flag} must be between 0 and {MAX_RATE_PCT}"));
        }
    }

    Ok(ScenarioInput {
        sale_price: args.sale_price,
        estate_agent_fee,
        movers_fees: args.movers_fees,
        solicitors_fees: args.solicitors_fees,
        storage_cost: args.storage_cost,
        buying_price: args.buying_price,
        maintenance_per_year,
        building_insurance_per_year: args.building_insurance_per_year,
        rent_per_month: args.rent_per_month,
        house_price_growth_pct: args.house_price_growth,
        savings_return_pct: args.savings_return,
    })
}

pub fn project_command(args: ScenarioArgs) -> Result<String, String> {
    let scenario = build_scenario(args)?;
    let response = build_project_response(&scenario);
    serde_json::to_string_pretty(&response).map_err(|e| format!("Failed to encode projection: {e}"))
}

pub fn stamp_duty_command(price: f64) -> Result<String, String> {
    if !price.is_finite() {
        return Err("price must be a finite amount".to_string());
    }
    serde_json::to_string_pretty(&build_stamp_duty_response(price))
        .map_err(|e| format!("Failed to encode stamp duty: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/stamp-duty", get(stamp_duty_handler))
        .route("/api/solve", post(solve_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "buy-or-rent HTTP API listening");
    tracing::info!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    match scenario_from_payload(payload) {
        Ok(scenario) => json_response(StatusCode::OK, build_project_response(&scenario)),
        Err(msg) => bad_request(&msg),
    }
}

async fn stamp_duty_handler(Query(query): Query<StampDutyQuery>) -> Response {
    match query.price {
        Some(price) if price.is_finite() && price >= 0.0 => {
            json_response(StatusCode::OK, build_stamp_duty_response(price))
        }
        Some(_) => bad_request("price must be a non-negative amount"),
        None => bad_request("price is required"),
    }
}

async fn solve_handler(Json(payload): Json<SolvePayload>) -> Response {
    let solved = solve_request_from_payload(payload)
        .and_then(|(scenario, config)| solve_goal(&scenario, config));
    match solved {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(msg) => bad_request(&msg),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn bad_request(msg: &str) -> Response {
    tracing::warn!(error = msg, "rejected request");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn scenario_from_payload(payload: ProjectPayload) -> Result<ScenarioInput, String> {
    let mut args = ScenarioArgs::default();

    if let Some(v) = payload.sale_price {
        args.sale_price = v;
    }
    if let Some(v) = payload.estate_agent_fee {
        args.estate_agent_fee = Some(v);
    }
    if let Some(v) = payload.movers_fees {
        args.movers_fees = v;
    }
    if let Some(v) = payload.solicitors_fees {
        args.solicitors_fees = v;
    }
    if let Some(v) = payload.storage_cost {
        args.storage_cost = v;
    }
    if let Some(v) = payload.buying_price {
        args.buying_price = v;
    }
    if let Some(v) = payload.maintenance_per_year {
        args.maintenance_per_year = Some(v);
    }
    if let Some(v) = payload.building_insurance_per_year {
        args.building_insurance_per_year = v;
    }
    if let Some(v) = payload.rent_per_month {
        args.rent_per_month = v;
    }
    if let Some(v) = payload.house_price_growth {
        args.house_price_growth = v;
    }
    if let Some(v) = payload.savings_return {
        args.savings_return = v;
    }

    build_scenario(args)
}

fn solve_request_from_payload(
    payload: SolvePayload,
) -> Result<(ScenarioInput, GoalSolveConfig), String> {
    let scenario = scenario_from_payload(payload.scenario)?;
    let goal_type: GoalType = payload.goal.unwrap_or(ApiGoalType::BreakEvenGrowth).into();
    let (default_max, default_tolerance) = match goal_type {
        GoalType::BreakEvenHouseGrowth => (MAX_RATE_PCT, 0.01),
        GoalType::MaxRent => (MAX_RENT_PER_MONTH, 1.0),
    };

    let config = GoalSolveConfig {
        goal_type,
        target_year: payload.target_year.unwrap_or(crate::core::PROJECTION_YEARS),
        search_min: payload.search_min.unwrap_or(0.0),
        search_max: payload.search_max.unwrap_or(default_max),
        tolerance: payload.tolerance.unwrap_or(default_tolerance),
        max_iterations: payload.max_iterations.unwrap_or(60),
    };
    Ok((scenario, config))
}

fn build_project_response(scenario: &ScenarioInput) -> ProjectResponse {
    let evaluation = evaluate(scenario);
    let projection = evaluation.projection;

    ProjectResponse {
        transfer_tax: evaluation.transfer_tax,
        stamp_duty_due: format!("Stamp Duty Due: {}", format_currency(evaluation.transfer_tax)),
        selling_costs: scenario.selling_costs(),
        net_proceeds: evaluation.net_proceeds,
        sale_output: format!(
            "Net proceeds from sale: {}",
            format_currency(evaluation.net_proceeds)
        ),
        stamp_duty_bands: stamp_duty_breakdown(scenario.buying_price),
        final_buying_wealth: projection.final_buying_wealth,
        final_renting_wealth: projection.final_renting_wealth,
        wealth_gap: projection.wealth_gap(),
        break_even_year: projection.break_even_year(),
        years: projection.years,
    }
}

fn build_stamp_duty_response(price: f64) -> StampDutyResponse {
    let tax = stamp_duty(price);
    StampDutyResponse {
        price,
        stamp_duty: tax,
        stamp_duty_due: format!("Stamp Duty Due: {}", format_currency(tax)),
        bands: stamp_duty_breakdown(price),
    }
}

/// Pounds with thousands separators and two decimals, e.g. `£1,234.50`.
pub fn format_currency(value: f64) -> String {
    let pence = (value.abs() * 100.0).round() as u64;
    let whole = (pence / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && pence > 0 { "-" } else { "" };
    format!("{sign}£{grouped}.{:02}", pence % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PROJECTION_YEARS;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn project_payload_from_json(json: &str) -> Result<ScenarioInput, String> {
        let payload = serde_json::from_str::<ProjectPayload>(json)
            .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
        scenario_from_payload(payload)
    }

    #[test]
    fn build_scenario_derives_fee_and_maintenance_from_prices() {
        let args = ScenarioArgs {
            sale_price: 400_000.0,
            buying_price: 300_000.0,
            ..ScenarioArgs::default()
        };

        let scenario = build_scenario(args).expect("valid scenario");
        assert_approx(scenario.estate_agent_fee, 4_000.0);
        assert_approx(scenario.maintenance_per_year, 3_000.0);
        assert_approx(scenario.net_proceeds(), 400_000.0 - 8_000.0);
    }

    #[test]
    fn build_scenario_keeps_explicit_fee_and_maintenance() {
        let args = ScenarioArgs {
            estate_agent_fee: Some(7_500.0),
            maintenance_per_year: Some(1_200.0),
            ..ScenarioArgs::default()
        };

        let scenario = build_scenario(args).expect("valid scenario");
        assert_approx(scenario.estate_agent_fee, 7_500.0);
        assert_approx(scenario.maintenance_per_year, 1_200.0);
    }

    #[test]
    fn build_scenario_rejects_negative_amounts() {
        let args = ScenarioArgs {
            movers_fees: -1.0,
            ..ScenarioArgs::default()
        };
        let err = build_scenario(args).expect_err("must reject negative fees");
        assert!(err.contains("--movers-fees"));

        let args = ScenarioArgs {
            rent_per_month: f64::INFINITY,
            ..ScenarioArgs::default()
        };
        let err = build_scenario(args).expect_err("must reject infinite rent");
        assert!(err.contains("--rent-per-month"));
    }

    #[test]
    fn build_scenario_rejects_rates_outside_slider_range() {
        let args = ScenarioArgs {
            house_price_growth: 10.5,
            ..ScenarioArgs::default()
        };
        let err = build_scenario(args).expect_err("must reject growth above 10");
        assert!(err.contains("--house-price-growth"));

        let args = ScenarioArgs {
            savings_return: -0.1,
            ..ScenarioArgs::default()
        };
        let err = build_scenario(args).expect_err("must reject negative return");
        assert!(err.contains("--savings-return"));

        let args = ScenarioArgs {
            savings_return: f64::NAN,
            ..ScenarioArgs::default()
        };
        assert!(build_scenario(args).is_err());
    }

    #[test]
    fn build_scenario_accepts_rate_bounds() {
        let args = ScenarioArgs {
            house_price_growth: 0.0,
            savings_return: 10.0,
            ..ScenarioArgs::default()
        };
        assert!(build_scenario(args).is_ok());
    }

    #[test]
    fn api_payload_parses_web_keys_and_aliases() {
        let scenario = project_payload_from_json(
            r#"{
                "salePrice": 450000,
                "moversFees": 1500,
                "storage": 250,
                "buyingPrice": 350000,
                "insurance": 400,
                "rentPcm": 1200,
                "houseGrowth": 3.5,
                "savingsReturn": 4
            }"#,
        )
        .expect("valid payload");

        assert_approx(scenario.sale_price, 450_000.0);
        assert_approx(scenario.estate_agent_fee, 4_500.0);
        assert_approx(scenario.movers_fees, 1_500.0);
        assert_approx(scenario.solicitors_fees, 2_000.0);
        assert_approx(scenario.storage_cost, 250.0);
        assert_approx(scenario.buying_price, 350_000.0);
        assert_approx(scenario.maintenance_per_year, 3_500.0);
        assert_approx(scenario.building_insurance_per_year, 400.0);
        assert_approx(scenario.rent_per_month, 1_200.0);
        assert_approx(scenario.house_price_growth_pct, 3.5);
        assert_approx(scenario.savings_return_pct, 4.0);
    }

    #[test]
    fn api_query_string_uses_same_keys() {
        let uri: axum::http::Uri = "http://localhost/api/project?salePrice=400000&rentPerMonth=900"
            .parse()
            .expect("valid uri");
        let Query(payload) = Query::<ProjectPayload>::try_from_uri(&uri).expect("valid query");
        let scenario = scenario_from_payload(payload).expect("valid scenario");
        assert_approx(scenario.sale_price, 400_000.0);
        assert_approx(scenario.rent_per_month, 900.0);
        assert_approx(scenario.buying_price, 500_000.0);
    }

    #[test]
    fn api_payload_rejects_out_of_range_values() {
        let err = project_payload_from_json(r#"{"buyingPrice": -5}"#)
            .expect_err("must reject negative price");
        assert!(err.contains("--buying-price"));

        let err = project_payload_from_json(r#"{"houseGrowth": 12}"#)
            .expect_err("must reject growth above slider range");
        assert!(err.contains("--house-price-growth"));
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let scenario = build_scenario(ScenarioArgs::default()).expect("default scenario");
        let response = build_project_response(&scenario);
        let value = serde_json::to_value(&response).expect("serializable");

        assert_approx(value["transferTax"].as_f64().expect("number"), 15_000.0);
        assert_eq!(value["stampDutyDue"], "Stamp Duty Due: £15,000.00");
        assert_approx(value["sellingCosts"].as_f64().expect("number"), 9_000.0);
        assert_approx(value["netProceeds"].as_f64().expect("number"), 491_000.0);
        assert_eq!(value["saleOutput"], "Net proceeds from sale: £491,000.00");
        assert_eq!(value["stampDutyBands"].as_array().map(Vec::len), Some(3));

        let years = value["years"].as_array().expect("years array");
        assert_eq!(years.len(), PROJECTION_YEARS as usize);
        let first = &years[0];
        for key in [
            "year",
            "buyingIncome",
            "buyingExpenditure",
            "buyingWealth",
            "rentingIncome",
            "rentingExpenditure",
            "rentingWealth",
        ] {
            assert!(first.get(key).is_some(), "missing {key}");
        }
        assert_eq!(first["year"], 1);
        assert_approx(first["buyingExpenditure"].as_f64().expect("number"), 20_500.0);
        assert_approx(first["rentingExpenditure"].as_f64().expect("number"), 18_000.0);
        assert_eq!(
            value["finalBuyingWealth"],
            years[years.len() - 1]["buyingWealth"]
        );
        assert_eq!(
            value["finalRentingWealth"],
            years[years.len() - 1]["rentingWealth"]
        );
    }

    #[test]
    fn stamp_duty_response_lists_bands() {
        let value =
            serde_json::to_value(build_stamp_duty_response(1_000_000.0)).expect("serializable");
        assert_approx(value["stampDuty"].as_f64().expect("number"), 43_750.0);
        assert_eq!(value["stampDutyDue"], "Stamp Duty Due: £43,750.00");
        let bands = value["bands"].as_array().expect("bands");
        assert_eq!(bands.len(), 4);
        assert_eq!(bands[3]["upperLimit"], 1_500_000.0);
    }

    #[test]
    fn stamp_duty_command_rejects_non_finite_price() {
        assert!(stamp_duty_command(f64::NAN).is_err());
        let out = stamp_duty_command(250_000.0).expect("valid price");
        assert!(out.contains("£2,500.00"));
    }

    #[test]
    fn solve_payload_defaults_to_break_even_growth_over_horizon() {
        let payload: SolvePayload =
            serde_json::from_str(r#"{"rentPerMonth": 1000}"#).expect("valid payload");
        let (scenario, config) = solve_request_from_payload(payload).expect("valid request");

        assert_approx(scenario.rent_per_month, 1_000.0);
        assert_eq!(config.goal_type, GoalType::BreakEvenHouseGrowth);
        assert_eq!(config.target_year, PROJECTION_YEARS);
        assert_approx(config.search_min, 0.0);
        assert_approx(config.search_max, 10.0);
        assert_approx(config.tolerance, 0.01);
    }

    #[test]
    fn solve_payload_parses_max_rent_goal() {
        let payload: SolvePayload = serde_json::from_str(
            r#"{"goal": "maxRent", "targetYear": 15, "searchMax": 3000, "maxIterations": 20}"#,
        )
        .expect("valid payload");
        let (_, config) = solve_request_from_payload(payload).expect("valid request");

        assert_eq!(config.goal_type, GoalType::MaxRent);
        assert_eq!(config.target_year, 15);
        assert_approx(config.search_max, 3_000.0);
        assert_approx(config.tolerance, 1.0);
        assert_eq!(config.max_iterations, 20);
    }

    #[test]
    fn format_currency_groups_thousands_and_keeps_pence() {
        assert_eq!(format_currency(0.0), "£0.00");
        assert_eq!(format_currency(999.5), "£999.50");
        assert_eq!(format_currency(1_000.0), "£1,000.00");
        assert_eq!(format_currency(491_000.0), "£491,000.00");
        assert_eq!(format_currency(1_234_567.891), "£1,234,567.89");
        assert_eq!(format_currency(-9_000.0), "-£9,000.00");
        assert_eq!(format_currency(-0.001), "£0.00");
    }
}
