//! Record table ordering
//!
//! Explicit column and direction states with per-column comparators.
//! Timestamps order by parsed instant, everything else as
//! case-insensitive strings. The sort is stable and descending only flips
//! the comparison sign, so ties keep arrival order either way.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::record::ConnectionRecord;

/// Sortable columns of the record table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Timestamp,
    Protocol,
    HostSet,
    Domain,
    Source,
    IpSet,
    Destination,
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortColumn::Timestamp => "timestamp",
            SortColumn::Protocol => "protocol",
            SortColumn::HostSet => "hostset",
            SortColumn::Domain => "domain",
            SortColumn::Source => "source",
            SortColumn::IpSet => "ipset",
            SortColumn::Destination => "destination",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" => Ok(SortColumn::Timestamp),
            "protocol" => Ok(SortColumn::Protocol),
            "hostset" => Ok(SortColumn::HostSet),
            "domain" => Ok(SortColumn::Domain),
            "source" => Ok(SortColumn::Source),
            "ipset" => Ok(SortColumn::IpSet),
            "destination" => Ok(SortColumn::Destination),
            _ => Err(format!("Unknown sort column: {}", s)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

/// Persisted sort preference
///
/// Either side absent means no sort is applied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            column: Some(column),
            direction: Some(direction),
        }
    }
}

/// Order records by the given state
///
/// Without both a column and a direction the input order comes back
/// unchanged.
pub fn sort_records(records: &[ConnectionRecord], state: &SortState) -> Vec<ConnectionRecord> {
    let mut sorted: Vec<ConnectionRecord> = records.to_vec();

    let (column, direction) = match (state.column, state.direction) {
        (Some(column), Some(direction)) => (column, direction),
        _ => return sorted,
    };

    sorted.sort_by(|a, b| {
        let ordering = compare_column(a, b, column);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    sorted
}

fn compare_column(a: &ConnectionRecord, b: &ConnectionRecord, column: SortColumn) -> Ordering {
    match column {
        // Unparseable timestamps order before parseable ones
        SortColumn::Timestamp => a.parsed_timestamp().cmp(&b.parsed_timestamp()),
        _ => {
            let a_value = column_value(a, column).to_lowercase();
            let b_value = column_value(b, column).to_lowercase();
            a_value.cmp(&b_value)
        }
    }
}

fn column_value(record: &ConnectionRecord, column: SortColumn) -> &str {
    match column {
        SortColumn::Timestamp => &record.timestamp,
        SortColumn::Protocol => record.protocol.as_str(),
        SortColumn::HostSet => &record.host_set,
        SortColumn::Domain => &record.domain,
        SortColumn::Source => &record.source,
        SortColumn::IpSet => &record.ip_set,
        SortColumn::Destination => &record.destination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Protocol;

    fn make_record(timestamp_full: &str, domain: &str, source: &str) -> ConnectionRecord {
        let timestamp = match timestamp_full.find('.') {
            Some(dot) => timestamp_full[..dot].to_string(),
            None => timestamp_full.to_string(),
        };
        ConnectionRecord {
            timestamp,
            timestamp_full: timestamp_full.to_string(),
            protocol: Protocol::Tcp,
            host_set: "gfw".to_string(),
            domain: domain.to_string(),
            source: source.to_string(),
            ip_set: "gfw".to_string(),
            destination: "203.0.113.9:443".to_string(),
            source_alias: "".to_string(),
            device_name: "".to_string(),
            raw: "".to_string(),
        }
    }

    #[test]
    fn test_no_direction_preserves_input_order() {
        let records = vec![
            make_record("2025/10/13 22:41:12", "zebra.com", "b"),
            make_record("2025/10/13 22:41:10", "alpha.com", "a"),
        ];

        let unsorted = sort_records(&records, &SortState::default());
        assert_eq!(unsorted[0].domain, "zebra.com");

        let half = SortState {
            column: Some(SortColumn::Domain),
            direction: None,
        };
        let unsorted = sort_records(&records, &half);
        assert_eq!(unsorted[0].domain, "zebra.com");
    }

    #[test]
    fn test_timestamp_sort_uses_parsed_instant() {
        let records = vec![
            make_record("2025/10/13 22:41:12.900000", "late.com", "a"),
            make_record("2025/10/13 22:41:12.100000", "early.com", "b"),
            make_record("2025/10/12 09:00:00.000000", "yesterday.com", "c"),
        ];

        let state = SortState::new(SortColumn::Timestamp, SortDirection::Ascending);
        let sorted = sort_records(&records, &state);

        assert_eq!(sorted[0].domain, "yesterday.com");
        // Same display second, ordered by the full-precision form
        assert_eq!(sorted[1].domain, "early.com");
        assert_eq!(sorted[2].domain, "late.com");

        // Distinct keys, so descending is the exact reverse
        let state = SortState::new(SortColumn::Timestamp, SortDirection::Descending);
        let reversed = sort_records(&records, &state);
        let mut expected = sorted;
        expected.reverse();
        assert_eq!(reversed, expected);
    }

    #[test]
    fn test_unparseable_timestamp_sorts_first() {
        let records = vec![
            make_record("2025/10/13 22:41:12", "ok.com", "a"),
            make_record("garbage", "bad.com", "b"),
        ];

        let state = SortState::new(SortColumn::Timestamp, SortDirection::Ascending);
        let sorted = sort_records(&records, &state);
        assert_eq!(sorted[0].domain, "bad.com");
    }

    #[test]
    fn test_string_sort_case_insensitive() {
        let records = vec![
            make_record("2025/10/13 22:41:12", "Zebra.com", "a"),
            make_record("2025/10/13 22:41:12", "alpha.com", "b"),
        ];

        let state = SortState::new(SortColumn::Domain, SortDirection::Ascending);
        let sorted = sort_records(&records, &state);
        assert_eq!(sorted[0].domain, "alpha.com");

        let state = SortState::new(SortColumn::Domain, SortDirection::Descending);
        let sorted = sort_records(&records, &state);
        assert_eq!(sorted[0].domain, "Zebra.com");
    }

    #[test]
    fn test_stable_for_equal_keys_both_directions() {
        let records = vec![
            make_record("2025/10/13 22:41:12", "same.com", "first"),
            make_record("2025/10/13 22:41:12", "same.com", "second"),
            make_record("2025/10/13 22:41:12", "same.com", "third"),
        ];

        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let state = SortState::new(SortColumn::Domain, direction);
            let sorted = sort_records(&records, &state);
            let sources: Vec<&str> = sorted.iter().map(|r| r.source.as_str()).collect();
            assert_eq!(sources, vec!["first", "second", "third"]);
        }
    }

    #[test]
    fn test_sort_state_serialization() {
        let state = SortState::new(SortColumn::Timestamp, SortDirection::Ascending);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"column":"timestamp","direction":"asc"}"#);

        let parsed: SortState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);

        let none: SortState = serde_json::from_str(r#"{"column":null,"direction":null}"#).unwrap();
        assert_eq!(none, SortState::default());
    }

    #[test]
    fn test_column_names_round_trip() {
        for column in [
            SortColumn::Timestamp,
            SortColumn::Protocol,
            SortColumn::HostSet,
            SortColumn::Domain,
            SortColumn::Source,
            SortColumn::IpSet,
            SortColumn::Destination,
        ] {
            let name = column.to_string();
            assert_eq!(name.parse::<SortColumn>().unwrap(), column);
        }
        assert!("bogus".parse::<SortColumn>().is_err());
    }
}
