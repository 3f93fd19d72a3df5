//! The JSON shape exchanged between a Collector's `/influxdata` endpoint and
//! the Scraper, and the InfluxDB line-protocol it gets rewritten into.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Fields {
    pub value: Option<f64>,
}

/// One TSDB datapoint: a measurement name, its tags, a nanosecond
/// timestamp, and a single `value` field (possibly `null` if the metric
/// has never been written).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TsdbPoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub time: i64,
    pub fields: Fields,
}

impl TsdbPoint {
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        time_ns: i64,
        value: Option<f64>,
    ) -> Self {
        Self {
            measurement: measurement.into(),
            tags,
            time: time_ns,
            fields: Fields { value },
        }
    }

    /// Renders this point as a single InfluxDB line-protocol line.
    ///
    /// A point with a `null` value is dropped from the line-protocol batch
    /// by the caller — there is nothing meaningful to write.
    pub fn to_line_protocol(&self) -> Option<String> {
        let value = self.fields.value?;

        let tags = self
            .tags
            .iter()
            .map(|(k, v)| format!(",{}={}", escape(k), escape(v)))
            .collect::<String>();

        Some(format!(
            "{}{} value={} {}",
            escape(&self.measurement),
            tags,
            value,
            self.time
        ))
    }
}

/// Escapes the characters InfluxDB line protocol treats as structural
/// (space, comma) in measurement/tag names and values.
fn escape(s: &str) -> String {
    s.replace(' ', "\\ ").replace(',', "\\,").replace('=', "\\=")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_line_protocol_with_tags_sorted_by_key() {
        let mut tags = BTreeMap::new();
        tags.insert("metro".to_string(), "iad".to_string());
        tags.insert("role".to_string(), "edge".to_string());

        let point = TsdbPoint::new("rtt", tags, 1_700_000_000_000_000_000, Some(12.5));

        assert_eq!(
            point.to_line_protocol().unwrap(),
            "rtt,metro=iad,role=edge value=12.5 1700000000000000000"
        );
    }

    #[test]
    fn null_value_has_no_line_protocol_representation() {
        let point = TsdbPoint::new("loss", BTreeMap::new(), 0, None);
        assert_eq!(point.to_line_protocol(), None);
    }

    #[test]
    fn round_trips_through_json() {
        let mut tags = BTreeMap::new();
        tags.insert("metro".to_string(), "sjc".to_string());
        let point = TsdbPoint::new("loss", tags, 42, Some(0.0));

        let json = serde_json::to_string(&point).unwrap();
        let back: TsdbPoint = serde_json::from_str(&json).unwrap();

        assert_eq!(point, back);
    }
}
