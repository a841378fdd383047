use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One collected rate, written as a single CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    #[serde(rename = "요청시간", serialize_with = "serialize_timestamp")]
    pub requested_at: NaiveDateTime,
    #[serde(rename = "환율 날짜")]
    pub date: NaiveDate,
    #[serde(rename = "환율")]
    pub rate: Decimal,
}

fn serialize_timestamp<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
}
