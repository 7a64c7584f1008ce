use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::io::Read;

/// Lifecycle status of a listing as exported by the MLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    Active,
    Pending,
    Closed,
    Expired,
    Withdrawn,
    Other,
}

impl ListingStatus {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "pending" => Self::Pending,
            "closed" => Self::Closed,
            "expired" => Self::Expired,
            "withdrawn" => Self::Withdrawn,
            _ => Self::Other,
        }
    }
}

/// One immutable listing row. Blank cells stay `None`; they are never
/// coerced to zero so that downstream statistics can distinguish "absent"
/// from "free".
#[derive(Debug, Clone)]
pub struct ListingRecord {
    pub list_date: Option<NaiveDate>,
    pub off_market_date: Option<NaiveDate>,
    pub settled_date: Option<NaiveDate>,
    pub agreement_date: Option<NaiveDate>,
    pub status: ListingStatus,
    pub ownership: Option<String>,
    pub list_price: Option<f64>,
    pub sold_price: Option<f64>,
    pub days_on_market: Option<f64>,
    /// Remaining export columns, keyed by header. Region definitions match
    /// against these (county, school district, zip, ...).
    pub classifications: HashMap<String, String>,
}

impl ListingRecord {
    pub fn classification(&self, key: &str) -> Option<&str> {
        self.classifications
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("failed to read listing export: {0}")]
    Csv(#[from] csv::Error),
}

pub fn read_listings<R: Read>(reader: R) -> Result<Vec<ListingRecord>, ListingError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<ListingRow>() {
        records.push(row?.into_record());
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "ListDate", default, deserialize_with = "empty_string_as_none")]
    list_date: Option<String>,
    #[serde(
        rename = "OffMarketDate",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    off_market_date: Option<String>,
    #[serde(
        rename = "SettledDate",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    settled_date: Option<String>,
    #[serde(
        rename = "Agreement of Sale/Signed Lease Date",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    agreement_date: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(
        rename = "Ownership",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    ownership: Option<String>,
    #[serde(
        rename = "List Price",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    list_price: Option<String>,
    #[serde(rename = "SoldPrice", default, deserialize_with = "empty_string_as_none")]
    sold_price: Option<String>,
    #[serde(rename = "DOM", default, deserialize_with = "empty_string_as_none")]
    days_on_market: Option<String>,
    #[serde(flatten)]
    classifications: HashMap<String, String>,
}

impl ListingRow {
    fn into_record(self) -> ListingRecord {
        ListingRecord {
            list_date: self.list_date.as_deref().and_then(parse_date),
            off_market_date: self.off_market_date.as_deref().and_then(parse_date),
            settled_date: self.settled_date.as_deref().and_then(parse_date),
            agreement_date: self.agreement_date.as_deref().and_then(parse_date),
            status: self
                .status
                .as_deref()
                .map(ListingStatus::parse)
                .unwrap_or(ListingStatus::Other),
            ownership: self.ownership,
            list_price: self.list_price.as_deref().and_then(parse_amount),
            sold_price: self.sold_price.as_deref().and_then(parse_amount),
            days_on_market: self.days_on_market.as_deref().and_then(parse_amount),
            classifications: self.classifications,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
