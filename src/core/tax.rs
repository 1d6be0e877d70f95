use super::types::{BandCharge, TaxBand};

/// Residential stamp duty schedule, lowest band first.
pub const STAMP_DUTY_BANDS: [TaxBand; 5] = [
    TaxBand {
        upper_limit: Some(125_000.0),
        rate: 0.0,
    },
    TaxBand {
        upper_limit: Some(250_000.0),
        rate: 0.02,
    },
    TaxBand {
        upper_limit: Some(925_000.0),
        rate: 0.05,
    },
    TaxBand {
        upper_limit: Some(1_500_000.0),
        rate: 0.10,
    },
    TaxBand {
        upper_limit: None,
        rate: 0.12,
    },
];

pub fn stamp_duty(price: f64) -> f64 {
    stamp_duty_breakdown(price)
        .iter()
        .map(|charge| charge.tax)
        .sum()
}

/// Charges for every band the price reaches. Each band below the one the
/// price falls in is charged over its full width.
pub fn stamp_duty_breakdown(price: f64) -> Vec<BandCharge> {
    let mut charges = Vec::with_capacity(STAMP_DUTY_BANDS.len());
    // Also rejects NaN.
    if !(price > 0.0) {
        return charges;
    }

    let mut lower = 0.0;
    for band in STAMP_DUTY_BANDS {
        if price <= lower {
            break;
        }
        let upper = band.upper_limit.unwrap_or(f64::INFINITY);
        let taxable_amount = price.min(upper) - lower;
        charges.push(BandCharge {
            lower_limit: lower,
            upper_limit: band.upper_limit,
            rate: band.rate,
            taxable_amount,
            tax: taxable_amount * band.rate,
        });
        lower = upper;
    }
    charges
}
