use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collector::{MeasurementResult, NeighborRecord, RawString, ThroughputProbe};

/// Measurements gathered for one survey point, keyed as in the survey file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<MeasurementResult>,
    #[serde(
        rename = "tcp-reverse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tcp_reverse: Option<MeasurementResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp: Option<MeasurementResult>,
    #[serde(
        rename = "udp-reverse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub udp_reverse: Option<MeasurementResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<RawString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rss: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chan: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chan_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_bitrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iwscan: Option<Vec<NeighborRecord>>,
    /// Keys written by other tools, carried through rewrites untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PointResult {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn throughput(&self, probe: ThroughputProbe) -> Option<&MeasurementResult> {
        match (probe.udp, probe.reverse) {
            (false, false) => self.tcp.as_ref(),
            (false, true) => self.tcp_reverse.as_ref(),
            (true, false) => self.udp.as_ref(),
            (true, true) => self.udp_reverse.as_ref(),
        }
    }

    pub fn set_throughput(&mut self, probe: ThroughputProbe, result: MeasurementResult) {
        let slot = match (probe.udp, probe.reverse) {
            (false, false) => &mut self.tcp,
            (false, true) => &mut self.tcp_reverse,
            (true, false) => &mut self.udp,
            (true, true) => &mut self.udp_reverse,
        };
        *slot = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_populated_keys_are_written() {
        let mut result = PointResult::default();
        assert!(result.is_empty());
        result.set_throughput(
            ThroughputProbe::TCP_DOWNLOAD,
            MeasurementResult::Error("timeout".into()),
        );
        result.rss = Some(-60);

        let value = serde_json::to_value(&result).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"tcp-reverse".to_string()));
        assert!(keys.contains(&"rss".to_string()));
        assert!(result.throughput(ThroughputProbe::TCP_DOWNLOAD).is_some());
        assert!(result.throughput(ThroughputProbe::TCP_UPLOAD).is_none());
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let json = r#"{"rss": -48, "note": "near the window"}"#;
        let result: PointResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.rss, Some(-48));
        assert_eq!(result.extra["note"], "near the window");

        let written = serde_json::to_value(&result).unwrap();
        assert_eq!(written["note"], "near the window");
    }
}
