use crate::catalog::listing::{Category, Gender, Listing};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::warn;

const UNTITLED: &str = "Untitled listing";

/// A listing document as the listing source stores it: camelCase or
/// snake_case keys, loose types, and any field possibly missing. Every field
/// stays a JSON value so one malformed row cannot fail the whole batch.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub gender: Option<Value>,
    #[serde(default)]
    pub size: Option<Value>,
    #[serde(default)]
    pub brand: Option<Value>,
    #[serde(default)]
    pub color: Option<Value>,
    #[serde(default)]
    pub condition: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<Value>,
    #[serde(default, alias = "seller_name")]
    pub seller_name: Option<Value>,
}

/// Top-level shape of seed files and cached snapshots.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCatalog {
    #[serde(default)]
    pub listings: Vec<RawListing>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IngestError {
    #[error("listing has no price")]
    MissingPrice,
    #[error("price `{0}` is not a number")]
    InvalidPrice(String),
    #[error("price {0} is negative")]
    NegativePrice(f64),
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedListing {
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub listings: Vec<Listing>,
    pub rejected: Vec<RejectedListing>,
}

pub fn ingest_listing(raw: RawListing, now: DateTime<Utc>) -> Result<Listing, IngestError> {
    let price = parse_price(raw.price.as_ref())?;
    let id = text(raw.id.as_ref()).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let created_at = match raw.created_at.as_ref() {
        None | Some(Value::Null) => now,
        Some(value) => parse_timestamp(value).unwrap_or_else(|| {
            warn!(target = "trailhead.catalog", listing_id = %id, raw = %value, "created_at_unparsable_defaulted");
            now
        }),
    };

    Ok(Listing {
        title: text(raw.title.as_ref()).unwrap_or_else(|| UNTITLED.to_string()),
        description: match raw.description {
            Some(Value::String(body)) => body,
            other => text(other.as_ref()).unwrap_or_default(),
        },
        category: text(raw.category.as_ref()).and_then(|label| Category::from_label(&label)),
        gender: text(raw.gender.as_ref()).and_then(|label| Gender::parse(&label)),
        size: text(raw.size.as_ref()),
        brand: text(raw.brand.as_ref()),
        color: text(raw.color.as_ref()),
        condition: text(raw.condition.as_ref()),
        price,
        created_at,
        seller_name: text(raw.seller_name.as_ref()),
        id,
    })
}

/// Converts a batch, keeping valid listings in source order and recording the
/// rest as rejections.
pub fn ingest_batch(raws: Vec<RawListing>, now: DateTime<Utc>) -> IngestReport {
    let mut report = IngestReport::default();
    for raw in raws {
        let id = text(raw.id.as_ref());
        match ingest_listing(raw, now) {
            Ok(listing) => report.listings.push(listing),
            Err(err) => {
                warn!(target = "trailhead.catalog", listing_id = ?id, error = %err, "listing_rejected");
                report.rejected.push(RejectedListing {
                    id,
                    reason: err.to_string(),
                });
            }
        }
    }
    report
}

fn parse_price(value: Option<&Value>) -> Result<f64, IngestError> {
    let price = match value {
        None | Some(Value::Null) => return Err(IngestError::MissingPrice),
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| IngestError::InvalidPrice(number.to_string()))?,
        Some(Value::String(text)) => {
            let trimmed = text.trim().trim_start_matches('$');
            if trimmed.is_empty() {
                return Err(IngestError::MissingPrice);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| IngestError::InvalidPrice(text.clone()))?
        }
        Some(other) => return Err(IngestError::InvalidPrice(other.to_string())),
    };
    if !price.is_finite() {
        return Err(IngestError::InvalidPrice(price.to_string()));
    }
    if price < 0.0 {
        return Err(IngestError::NegativePrice(price));
    }
    Ok(price)
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Scalar text of a loose field: trimmed strings, numbers and booleans in
/// their JSON spelling. Blank strings, arrays and objects read as absent.
fn text(value: Option<&Value>) -> Option<String> {
    let rendered = match value? {
        Value::String(raw) => raw.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!rendered.is_empty()).then_some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
            .single()
            .expect("valid date")
    }

    fn raw(value: Value) -> RawListing {
        serde_json::from_value(value).expect("raw listing")
    }

    #[test]
    fn ingests_a_complete_document() {
        let listing = ingest_listing(
            raw(json!({
                "id": "abc",
                "title": "Black Diamond harness",
                "description": "Lightly used",
                "category": "Climbing",
                "gender": "Women",
                "size": "S",
                "brand": "Black Diamond",
                "color": "Blue",
                "condition": "Good",
                "price": 45.5,
                "createdAt": "2024-05-20T10:00:00Z",
                "sellerName": "Alex"
            })),
            now(),
        )
        .expect("ingest");
        assert_eq!(listing.id, "abc");
        assert_eq!(listing.category, Some(Category::Climbing));
        assert_eq!(listing.gender, Some(Gender::Women));
        assert_eq!(listing.price, 45.5);
        assert_eq!(
            listing.created_at,
            Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0)
                .single()
                .expect("valid date")
        );
        assert_eq!(listing.seller_name.as_deref(), Some("Alex"));
    }

    #[test]
    fn fills_defaults_for_missing_fields() {
        let listing = ingest_listing(raw(json!({ "price": "12.00" })), now()).expect("ingest");
        assert!(!listing.id.is_empty());
        assert_eq!(listing.title, UNTITLED);
        assert_eq!(listing.created_at, now());
        assert_eq!(listing.category, None);
        assert_eq!(listing.price, 12.0);
    }

    #[test]
    fn numeric_size_and_epoch_timestamp_are_accepted() {
        let listing = ingest_listing(
            raw(json!({ "price": 80, "size": 10.5, "createdAt": 1_700_000_000_000i64 })),
            now(),
        )
        .expect("ingest");
        assert_eq!(listing.size.as_deref(), Some("10.5"));
        assert_eq!(listing.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn unparsable_timestamp_defaults_to_now() {
        let listing = ingest_listing(
            raw(json!({ "price": 5, "createdAt": "last tuesday" })),
            now(),
        )
        .expect("ingest");
        assert_eq!(listing.created_at, now());
    }

    #[test]
    fn bad_prices_are_rejected() {
        assert_eq!(
            ingest_listing(raw(json!({ "title": "x" })), now()).expect_err("missing"),
            IngestError::MissingPrice
        );
        assert!(matches!(
            ingest_listing(raw(json!({ "price": "free" })), now()).expect_err("invalid"),
            IngestError::InvalidPrice(_)
        ));
        assert_eq!(
            ingest_listing(raw(json!({ "price": -3 })), now()).expect_err("negative"),
            IngestError::NegativePrice(-3.0)
        );
    }

    #[test]
    fn batch_keeps_order_and_reports_rejections() {
        let report = ingest_batch(
            vec![
                raw(json!({ "id": "1", "price": 10 })),
                raw(json!({ "id": "2" })),
                raw(json!({ "id": "3", "price": "7.5" })),
            ],
            now(),
        );
        let ids: Vec<&str> = report.listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].id.as_deref(), Some("2"));
    }

    #[test]
    fn numeric_ids_and_snake_case_keys_are_coerced() {
        let listing = ingest_listing(
            raw(json!({
                "id": 7,
                "title": 1999,
                "price": 3,
                "brand": ["not", "text"],
                "created_at": "2024-05-01T00:00:00Z",
                "seller_name": "Sam"
            })),
            now(),
        )
        .expect("ingest");
        assert_eq!(listing.id, "7");
        assert_eq!(listing.title, "1999");
        assert_eq!(listing.brand, None);
        assert_eq!(listing.seller_name.as_deref(), Some("Sam"));
        assert_eq!(
            listing.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
                .single()
                .expect("valid date")
        );
    }

    #[test]
    fn mistyped_row_does_not_sink_its_neighbours() {
        let catalog: RawCatalog = serde_json::from_value(json!({
            "listings": [
                { "id": 7, "price": "free", "category": 12 },
                { "id": "ok", "price": 4, "gender": false }
            ]
        }))
        .expect("catalog");
        let report = ingest_batch(catalog.listings, now());
        assert_eq!(report.listings.len(), 1);
        assert_eq!(report.listings[0].id, "ok");
        assert_eq!(report.listings[0].gender, None);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].id.as_deref(), Some("7"));
    }

    #[test]
    fn blank_optionals_become_absent() {
        let listing = ingest_listing(
            raw(json!({ "price": 1, "brand": "  ", "color": "", "gender": "n/a" })),
            now(),
        )
        .expect("ingest");
        assert_eq!(listing.brand, None);
        assert_eq!(listing.color, None);
        assert_eq!(listing.gender, None);
    }
}
