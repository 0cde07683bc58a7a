//! Map raw records onto the scoring schema and fill the features statements never carry.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::types::{CanonicalTransaction, Gender, RawTransactionRecord, ScoringFeatures};

pub const DEFAULT_CITY_POP: f64 = 1000.0;
pub const DEFAULT_DISTANCE: f64 = 0.5;
pub const DEFAULT_STATE: &str = "XX";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Best-effort timestamp parse. Date-only values land on midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn normalize_record(raw: RawTransactionRecord) -> CanonicalTransaction {
    // Parsers never build a record with a non-finite amount; seeing one here is a bug upstream.
    assert!(
        raw.amount.is_finite(),
        "raw record dated `{}` reached the normalizer with non-finite amount {}",
        raw.date,
        raw.amount
    );

    let timestamp = parse_timestamp(&raw.date);
    let hour = timestamp.map(|ts| ts.hour()).unwrap_or(0);
    let day_of_week = timestamp
        .map(|ts| ts.weekday().num_days_from_monday())
        .unwrap_or(0);

    CanonicalTransaction {
        trans_date_trans_time: timestamp,
        merchant: raw.merchant,
        category: raw.category,
        amt: raw.amount,
        currency: raw.currency,
        transaction_type: raw.transaction_type,
        hour,
        day_of_week,
        city_pop: DEFAULT_CITY_POP,
        distance: DEFAULT_DISTANCE,
        gender: Gender::Unknown,
        state: DEFAULT_STATE.to_string(),
    }
}

/// Normalize every record, keeping order. Empty in, empty out.
pub fn normalize(records: Vec<RawTransactionRecord>) -> Vec<CanonicalTransaction> {
    records.into_iter().map(normalize_record).collect()
}

impl CanonicalTransaction {
    /// The eight model inputs. Category is folded to `snake_case` the way training data spells it.
    pub fn scoring_features(&self) -> ScoringFeatures {
        ScoringFeatures {
            amt: self.amt,
            category: self.category.to_lowercase().replace(' ', "_"),
            gender: self.gender,
            state: self.state.clone(),
            city_pop: self.city_pop,
            hour: self.hour,
            day_of_week: self.day_of_week,
            distance: self.distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, amount: f64) -> RawTransactionRecord {
        RawTransactionRecord {
            date: date.to_string(),
            merchant: "Kuhic LLC".to_string(),
            category: "Food Dining".to_string(),
            amount,
            currency: "USD".to_string(),
            transaction_type: "Purchase".to_string(),
        }
    }

    #[test]
    fn test_renames_and_defaults() {
        let txn = normalize_record(raw("2019-10-09", 965.55));
        assert_eq!(txn.merchant, "Kuhic LLC");
        assert_eq!(txn.amt, 965.55);
        assert_eq!(txn.transaction_type, "Purchase");
        assert_eq!(txn.city_pop, 1000.0);
        assert_eq!(txn.distance, 0.5);
        assert_eq!(txn.gender, Gender::Unknown);
        assert_eq!(txn.state, "XX");
    }

    #[test]
    fn test_derives_hour_and_weekday() {
        // 2019-10-09 was a Wednesday
        let txn = normalize_record(raw("2019-10-09 14:30:00", 1.0));
        assert_eq!(txn.hour, 14);
        assert_eq!(txn.day_of_week, 2);

        let date_only = normalize_record(raw("2019-10-09", 1.0));
        assert_eq!(date_only.hour, 0);
        assert_eq!(date_only.day_of_week, 2);
    }

    #[test]
    fn test_unparseable_date_defaults_to_zero() {
        let txn = normalize_record(raw("2019-13-45", 1.0));
        assert_eq!(txn.trans_date_trans_time, None);
        assert_eq!(txn.hour, 0);
        assert_eq!(txn.day_of_week, 0);

        let garbage = normalize_record(raw("yesterday", 1.0));
        assert_eq!(garbage.trans_date_trans_time, None);
    }

    #[test]
    fn test_alternate_date_shapes() {
        assert!(parse_timestamp("10/09/2019").is_some());
        assert!(parse_timestamp("2019/10/09").is_some());
        assert!(parse_timestamp("2019-10-09T08:15:00").is_some());
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(Vec::new()).is_empty());
    }

    #[test]
    fn test_scoring_features() {
        let features = normalize_record(raw("2019-10-09", 12.0)).scoring_features();
        assert_eq!(features.category, "food_dining");
        assert_eq!(features.amt, 12.0);
        assert_eq!(features.gender, Gender::Unknown);
        assert_eq!(features.state, "XX");
    }

    #[test]
    #[should_panic(expected = "non-finite amount")]
    fn test_non_finite_amount_is_a_bug() {
        normalize_record(raw("2019-10-09", f64::NAN));
    }
}
