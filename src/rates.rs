use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Body of `GET /v1/{date}?base=..&symbols=..`.
#[derive(Debug, Deserialize, PartialEq)]
pub struct RatesResponse {
    /// Day the rate applies to. May differ from the requested day.
    pub date: String,
    pub rates: HashMap<String, Decimal>,
}
