use super::types::Commodity;
use chrono::{DateTime, Local};

/// One commodity's usage and cost figures for a fetch cycle.
///
/// `consumption_kwh` is always in the canonical unit (kWh). When the portal
/// reported a different native unit (gas in therms), the original figure is
/// preserved in `native_value`/`native_unit`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub commodity: Commodity,
    pub consumption_kwh: f64,
    pub cost_usd: f64,
    pub native_value: Option<f64>,
    pub native_unit: Option<String>,
    /// Meter reading date text as displayed by the portal, when present.
    pub read_date: Option<String>,
    pub timestamp: DateTime<Local>,
}

/// Terminal output of one fetch cycle.
///
/// Always well-formed: a cycle that fails entirely still produces a
/// `FetchResult` carrying the failure in `error` rather than panicking
/// past the `run` boundary.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// 0–2 entries, at most one per commodity.
    pub readings: Vec<Reading>,
    pub fetched_at: DateTime<Local>,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn new(readings: Vec<Reading>, fetched_at: DateTime<Local>, error: Option<String>) -> Self {
        Self {
            readings,
            fetched_at,
            error,
        }
    }

    /// A result for a cycle that produced nothing but an error.
    pub fn failed(fetched_at: DateTime<Local>, error: impl Into<String>) -> Self {
        Self {
            readings: Vec::new(),
            fetched_at,
            error: Some(error.into()),
        }
    }

    pub fn reading(&self, commodity: Commodity) -> Option<&Reading> {
        self.readings.iter().find(|r| r.commodity == commodity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn electricity_reading() -> Reading {
        Reading {
            commodity: Commodity::Electricity,
            consumption_kwh: 500.0,
            cost_usd: 120.50,
            native_value: None,
            native_unit: None,
            read_date: Some("Jun 15, 2024".to_string()),
            timestamp: test_timestamp(),
        }
    }

    #[test]
    fn test_reading_lookup_by_commodity() {
        let result = FetchResult::new(vec![electricity_reading()], test_timestamp(), None);
        assert!(result.reading(Commodity::Electricity).is_some());
        assert!(result.reading(Commodity::Gas).is_none());
    }

    #[test]
    fn test_failed_result_is_well_formed() {
        let result = FetchResult::failed(test_timestamp(), "portal rejected credentials");
        assert!(result.readings.is_empty());
        assert_eq!(
            result.error.as_deref(),
            Some("portal rejected credentials")
        );
    }
}
