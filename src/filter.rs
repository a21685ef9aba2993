//! Interactive record filtering
//!
//! Multi-term queries over parsed records: `+` separates terms,
//! `field:value` scopes a term to one field, unscoped terms match
//! anywhere in the common fields. Matching is case-insensitive substring
//! containment throughout.

use std::collections::HashMap;

use crate::record::ConnectionRecord;

/// Fields an unscoped term is matched against
const GLOBAL_FIELDS: [&str; 4] = ["domain", "source", "protocol", "destination"];

/// A parsed filter query
///
/// Scoped terms sharing a field OR together; distinct fields AND; every
/// unscoped term must match some global field. An empty query matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterQuery {
    field_terms: HashMap<String, Vec<String>>,
    global_terms: Vec<String>,
}

impl FilterQuery {
    /// Parse a raw query string
    ///
    /// The query is lowercased and split on `+`; blank terms are dropped.
    /// A colon after at least one character scopes the term to the field
    /// named before it; a leading colon keeps the term global.
    pub fn parse(raw: &str) -> Self {
        let mut query = FilterQuery::default();

        for term in raw.trim().to_lowercase().split('+') {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }

            match term.find(':') {
                Some(colon) if colon > 0 => {
                    let field = term[..colon].to_string();
                    let value = term[colon + 1..].to_string();
                    query.field_terms.entry(field).or_default().push(value);
                }
                _ => query.global_terms.push(term.to_string()),
            }
        }

        query
    }

    pub fn is_empty(&self) -> bool {
        self.field_terms.is_empty() && self.global_terms.is_empty()
    }

    /// Test a record against the query
    ///
    /// A term scoped to a field the record does not have excludes every
    /// record.
    pub fn matches(&self, record: &ConnectionRecord) -> bool {
        for (field, values) in &self.field_terms {
            let field_value = match record.field(field) {
                Some(value) => value.to_lowercase(),
                None => return false,
            };
            if !values.iter().any(|term| field_value.contains(term)) {
                return false;
            }
        }

        for term in &self.global_terms {
            let hit = GLOBAL_FIELDS.iter().any(|field| {
                record
                    .field(field)
                    .map(|value| value.to_lowercase().contains(term.as_str()))
                    .unwrap_or(false)
            });
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Filter records by a raw query string
pub fn filter_records(records: &[ConnectionRecord], raw: &str) -> Vec<ConnectionRecord> {
    let query = FilterQuery::parse(raw);
    if query.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| query.matches(record))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Protocol;

    fn make_record(
        domain: &str,
        source: &str,
        protocol: Protocol,
        destination: &str,
    ) -> ConnectionRecord {
        ConnectionRecord {
            timestamp: "2025/10/13 22:41:12".to_string(),
            timestamp_full: "2025/10/13 22:41:12.000001".to_string(),
            protocol,
            host_set: "gfw".to_string(),
            domain: domain.to_string(),
            source: source.to_string(),
            ip_set: "gfw".to_string(),
            destination: destination.to_string(),
            source_alias: "".to_string(),
            device_name: "router".to_string(),
            raw: "".to_string(),
        }
    }

    fn sample_records() -> Vec<ConnectionRecord> {
        vec![
            make_record(
                "www.youtube.com",
                "192.168.1.23:52144",
                Protocol::Tcp,
                "142.250.186.46:443",
            ),
            make_record(
                "www.youtube.com",
                "192.168.1.40:40122",
                Protocol::Udp,
                "142.250.186.78:443",
            ),
            make_record(
                "api.netflix.com",
                "192.168.1.23:52188",
                Protocol::Tcp,
                "198.51.100.4:443",
            ),
        ]
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let records = sample_records();
        assert_eq!(filter_records(&records, "").len(), 3);
        assert_eq!(filter_records(&records, "   ").len(), 3);
        assert_eq!(filter_records(&records, "+ +").len(), 3);
    }

    #[test]
    fn test_scoped_terms_and_across_fields() {
        let records = sample_records();

        let kept = filter_records(&records, "domain:youtube+protocol:tcp");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].domain, "www.youtube.com");
        assert_eq!(kept[0].protocol, Protocol::Tcp);
    }

    #[test]
    fn test_scoped_terms_or_within_field() {
        let records = sample_records();

        let kept = filter_records(&records, "domain:youtube+domain:netflix");
        assert_eq!(kept.len(), 3);

        let kept = filter_records(&records, "domain:netflix");
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_global_terms_match_any_common_field() {
        let records = sample_records();

        // Matches on domain
        assert_eq!(filter_records(&records, "netflix").len(), 1);
        // Matches on source
        assert_eq!(filter_records(&records, "192.168.1.23").len(), 2);
        // Matches on protocol
        assert_eq!(filter_records(&records, "udp").len(), 1);
        // Matches on destination
        assert_eq!(filter_records(&records, "198.51.100").len(), 1);
    }

    #[test]
    fn test_global_terms_all_must_match() {
        let records = sample_records();

        let kept = filter_records(&records, "youtube+tcp");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, "192.168.1.23:52144");
    }

    #[test]
    fn test_global_term_ignores_other_fields() {
        // Device name is not part of the global field set
        let records = sample_records();
        assert!(filter_records(&records, "router").is_empty());
    }

    #[test]
    fn test_unknown_field_matches_nothing() {
        let records = sample_records();
        assert!(filter_records(&records, "bogus:youtube").is_empty());
        assert!(filter_records(&records, "bogus:").is_empty());
    }

    #[test]
    fn test_leading_colon_is_global() {
        let records = sample_records();
        // Every destination ends in ":443"
        assert_eq!(filter_records(&records, ":443").len(), 3);
    }

    #[test]
    fn test_case_insensitive() {
        let records = sample_records();
        assert_eq!(filter_records(&records, "DOMAIN:YouTube").len(), 2);
        assert_eq!(filter_records(&records, "NETFLIX").len(), 1);
    }

    #[test]
    fn test_scoped_term_on_optional_field() {
        let records = sample_records();
        assert_eq!(filter_records(&records, "devicename:router").len(), 3);
        // Present but empty field never contains a non-empty term
        assert!(filter_records(&records, "sourcealias:laptop").is_empty());
    }
}
