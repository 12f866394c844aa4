use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;

use crate::types::{PriceMap, TotalLevelMap};

/// Listing prices are quoted in 10^-18 of the major unit.
pub const PRICE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub token_id: String,
    pub price: Decimal,
    pub total_level: i64,
    pub url: String,
}

/// Base units to major units, exact, with trailing zeros dropped.
pub fn to_major_units(base_units: u128) -> Result<Decimal> {
    let raw = i128::try_from(base_units)
        .with_context(|| format!("price {} out of range", base_units))?;
    let d = Decimal::try_from_i128_with_scale(raw, PRICE_DECIMALS)
        .with_context(|| format!("price {} out of decimal range", base_units))?;
    Ok(d.normalize())
}

pub fn asset_url(contract_address: &str, token_id: &str) -> String {
    format!(
        "https://opensea.io/assets/ethereum/{}/{}",
        contract_address, token_id
    )
}

/// Rows in ascending price order. Every priced token must have a level.
pub fn build_rows(
    prices: &PriceMap,
    levels: &TotalLevelMap,
    contract_address: &str,
) -> Result<Vec<ReportRow>> {
    let mut out = Vec::with_capacity(prices.len());
    for (token_id, price) in prices.sorted_by_price() {
        let total_level = match levels.get(token_id) {
            Some(l) => *l,
            None => anyhow::bail!("no total level resolved for token {}", token_id),
        };
        out.push(ReportRow {
            token_id: token_id.to_string(),
            price: to_major_units(price)?,
            total_level,
            url: asset_url(contract_address, token_id),
        });
    }
    Ok(out)
}

/// Truncates and rewrites `path`. Fields are written unquoted.
pub fn write_report(path: impl AsRef<Path>, rows: &[ReportRow]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("open report {}", path.display()))?;

    wtr.write_record(["token_id", "price", "total_level", "url"])?;
    for r in rows {
        wtr.write_record([
            r.token_id.as_str(),
            r.price.to_string().as_str(),
            r.total_level.to_string().as_str(),
            r.url.as_str(),
        ])?;
    }
    wtr.flush()
        .with_context(|| format!("flush report {}", path.display()))?;
    Ok(())
}
