use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the capture log lines
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.f";

/// A single parsed connection log line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionRecord {
    /// Display timestamp: severity tag stripped, fractional seconds cut
    pub timestamp: String,
    /// Full-precision timestamp, severity tag stripped only
    pub timestamp_full: String,
    pub protocol: Protocol,
    /// Rule-set label that matched the hostname
    pub host_set: String,
    pub domain: String,
    pub source: String,
    /// Rule-set label that matched the address
    pub ip_set: String,
    pub destination: String,
    pub source_alias: String,
    pub device_name: String,
    /// The original line as received
    pub raw: String,
}

impl ConnectionRecord {
    /// Look up a field value by its lowercase query name
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "timestamp" => Some(&self.timestamp),
            "protocol" => Some(self.protocol.as_str()),
            "hostset" => Some(&self.host_set),
            "domain" => Some(&self.domain),
            "source" => Some(&self.source),
            "ipset" => Some(&self.ip_set),
            "destination" => Some(&self.destination),
            "sourcealias" => Some(&self.source_alias),
            "devicename" => Some(&self.device_name),
            "raw" => Some(&self.raw),
            _ => None,
        }
    }

    /// Parse the timestamp for chronological ordering
    ///
    /// Prefers the full-precision form so lines within the same second
    /// keep their sub-second order; falls back to the display form.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp_full, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT))
            .ok()
    }
}

/// Transport protocol of a connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    /// Unrecognized token, kept verbatim
    Other(String),
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Other(s) => s,
        }
    }
}

impl From<&str> for Protocol {
    fn from(token: &str) -> Self {
        if token.eq_ignore_ascii_case("tcp") {
            Protocol::Tcp
        } else if token.eq_ignore_ascii_case("udp") {
            Protocol::Udp
        } else {
            Protocol::Other(token.to_string())
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record() -> ConnectionRecord {
        ConnectionRecord {
            timestamp: "2025/10/13 22:41:12".to_string(),
            timestamp_full: "2025/10/13 22:41:12.466126".to_string(),
            protocol: Protocol::Tcp,
            host_set: "streaming".to_string(),
            domain: "video.example.com".to_string(),
            source: "192.168.1.50".to_string(),
            ip_set: "cdn".to_string(),
            destination: "203.0.113.9".to_string(),
            source_alias: "laptop".to_string(),
            device_name: "router".to_string(),
            raw: "raw line".to_string(),
        }
    }

    #[test]
    fn test_protocol_normalization() {
        assert_eq!(Protocol::from("tcp"), Protocol::Tcp);
        assert_eq!(Protocol::from("TCP"), Protocol::Tcp);
        assert_eq!(Protocol::from("Udp"), Protocol::Udp);
        assert_eq!(
            Protocol::from("quic"),
            Protocol::Other("quic".to_string())
        );
        assert_eq!(Protocol::from("quic").as_str(), "quic");
    }

    #[test]
    fn test_field_lookup() {
        let record = make_record();
        assert_eq!(record.field("domain"), Some("video.example.com"));
        assert_eq!(record.field("protocol"), Some("TCP"));
        assert_eq!(record.field("hostset"), Some("streaming"));
        assert_eq!(record.field("sourcealias"), Some("laptop"));
        assert_eq!(record.field("bogus"), None);
    }

    #[test]
    fn test_parsed_timestamp_full_precision() {
        let record = make_record();
        let parsed = record.parsed_timestamp().unwrap();
        assert_eq!(parsed.format("%Y/%m/%d %H:%M:%S%.6f").to_string(),
            "2025/10/13 22:41:12.466126");
    }

    #[test]
    fn test_parsed_timestamp_without_fraction() {
        let mut record = make_record();
        record.timestamp_full = "2025/10/13 22:41:12".to_string();
        assert!(record.parsed_timestamp().is_some());
    }

    #[test]
    fn test_parsed_timestamp_garbage() {
        let mut record = make_record();
        record.timestamp_full = "not a time".to_string();
        record.timestamp = "also not".to_string();
        assert!(record.parsed_timestamp().is_none());
    }
}
