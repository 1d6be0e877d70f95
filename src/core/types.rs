use serde::Serialize;

/// Number of years every projection covers.
pub const PROJECTION_YEARS: u32 = 30;

/// Estate agent fee the UI suggests, as a share of the sale price.
pub const ESTATE_AGENT_FEE_RATE: f64 = 0.01;

/// Annual maintenance the UI suggests, as a share of the buying price.
pub const MAINTENANCE_RATE: f64 = 0.01;

/// One buy-versus-rent scenario. Monetary amounts are whole currency units,
/// percentages are plain percent (2.0 means 2%).
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioInput {
    pub sale_price: f64,
    pub estate_agent_fee: f64,
    pub movers_fees: f64,
    pub solicitors_fees: f64,
    pub storage_cost: f64,
    pub buying_price: f64,
    pub maintenance_per_year: f64,
    pub building_insurance_per_year: f64,
    pub rent_per_month: f64,
    pub house_price_growth_pct: f64,
    pub savings_return_pct: f64,
}

impl ScenarioInput {
    pub fn selling_costs(&self) -> f64 {
        self.estate_agent_fee + self.movers_fees + self.solicitors_fees + self.storage_cost
    }

    /// Sale price less selling costs. Not clamped: a negative value means the
    /// sale does not cover its own costs.
    pub fn net_proceeds(&self) -> f64 {
        self.sale_price - self.selling_costs()
    }
}

pub fn suggested_estate_agent_fee(sale_price: f64) -> f64 {
    sale_price * ESTATE_AGENT_FEE_RATE
}

pub fn suggested_maintenance_per_year(buying_price: f64) -> f64 {
    buying_price * MAINTENANCE_RATE
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRecord {
    pub year: u32,
    pub buying_income: f64,
    pub buying_expenditure: f64,
    pub buying_wealth: f64,
    pub renting_income: f64,
    pub renting_expenditure: f64,
    pub renting_wealth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub years: Vec<YearlyRecord>,
    pub final_buying_wealth: f64,
    pub final_renting_wealth: f64,
}

impl ProjectionResult {
    pub fn record(&self, year: u32) -> Option<&YearlyRecord> {
        let index = year.checked_sub(1)? as usize;
        self.years.get(index)
    }

    /// Buying wealth minus renting wealth at the end of the horizon.
    pub fn wealth_gap(&self) -> f64 {
        self.final_buying_wealth - self.final_renting_wealth
    }

    /// First year in which buying has caught up with renting.
    pub fn break_even_year(&self) -> Option<u32> {
        self.years
            .iter()
            .find(|record| record.buying_wealth >= record.renting_wealth)
            .map(|record| record.year)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub transfer_tax: f64,
    pub net_proceeds: f64,
    pub projection: ProjectionResult,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBand {
    /// Upper price bound of the band; `None` for the open-ended top band.
    pub upper_limit: Option<f64>,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandCharge {
    pub lower_limit: f64,
    pub upper_limit: Option<f64>,
    pub rate: f64,
    pub taxable_amount: f64,
    pub tax: f64,
}
