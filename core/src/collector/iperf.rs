//! Throughput probes and the iperf3 JSON report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::prelude::{CollectorError, CollectorResult};

/// Error prefix iperf3 uses when the server cannot be reached at all.
pub const CONNECTION_REFUSED_PREFIX: &str = "unable to connect to server";

/// One protocol/direction combination. `reverse` means the server sends
/// (a download from the client's point of view).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThroughputProbe {
    pub udp: bool,
    pub reverse: bool,
}

impl ThroughputProbe {
    pub const TCP_UPLOAD: Self = Self::new(false, false);
    pub const TCP_DOWNLOAD: Self = Self::new(false, true);
    pub const UDP_UPLOAD: Self = Self::new(true, false);
    pub const UDP_DOWNLOAD: Self = Self::new(true, true);

    /// Run order within a survey point.
    pub const ALL: [Self; 4] = [
        Self::TCP_UPLOAD,
        Self::TCP_DOWNLOAD,
        Self::UDP_UPLOAD,
        Self::UDP_DOWNLOAD,
    ];

    pub const fn new(udp: bool, reverse: bool) -> Self {
        Self { udp, reverse }
    }

    /// Key of this probe in a point's result mapping.
    pub fn label(&self) -> &'static str {
        match (self.udp, self.reverse) {
            (false, false) => "tcp",
            (false, true) => "tcp-reverse",
            (true, false) => "udp",
            (true, true) => "udp-reverse",
        }
    }

    pub fn protocol(&self) -> &'static str {
        if self.udp {
            "UDP"
        } else {
            "TCP"
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.reverse {
            "Download"
        } else {
            "Upload"
        }
    }
}

impl fmt::Display for ThroughputProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.direction(), self.protocol())
    }
}

/// Metrics extracted from a successful iperf3 run. TCP runs fill the
/// `sent_*`/`received_*` family, UDP runs the unprefixed family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IperfMetrics {
    pub time: Option<String>,
    pub timesecs: Option<i64>,
    pub protocol: Option<String>,
    pub num_streams: Option<u32>,
    pub blksize: Option<u64>,
    pub omit: Option<u32>,
    pub duration: Option<u32>,
    pub sent_bytes: Option<u64>,
    pub sent_bps: Option<f64>,
    pub received_bytes: Option<u64>,
    pub received_bps: Option<f64>,
    pub sent_kbps: Option<f64>,
    #[serde(rename = "sent_Mbps")]
    pub sent_mbps: Option<f64>,
    #[serde(rename = "sent_kB_s")]
    pub sent_kb_s: Option<f64>,
    #[serde(rename = "sent_MB_s")]
    pub sent_mb_s: Option<f64>,
    pub received_kbps: Option<f64>,
    #[serde(rename = "received_Mbps")]
    pub received_mbps: Option<f64>,
    #[serde(rename = "received_kB_s")]
    pub received_kb_s: Option<f64>,
    #[serde(rename = "received_MB_s")]
    pub received_mb_s: Option<f64>,
    pub retransmits: Option<u64>,
    pub bytes: Option<u64>,
    pub bps: Option<f64>,
    pub jitter_ms: Option<f64>,
    pub kbps: Option<f64>,
    #[serde(rename = "Mbps")]
    pub mbps: Option<f64>,
    #[serde(rename = "kB_s")]
    pub kb_s: Option<f64>,
    #[serde(rename = "MB_s")]
    pub mb_s: Option<f64>,
    pub packets: Option<u64>,
    pub lost_packets: Option<u64>,
    pub lost_percent: Option<f64>,
    pub seconds: Option<f64>,
}

/// Rates derived from bits per second the way iperf3 client libraries do.
struct Scaled {
    kbps: f64,
    mbps: f64,
    kb_s: f64,
    mb_s: f64,
}

impl Scaled {
    fn from_bps(bps: f64) -> Self {
        let kbps = bps / 1000.0;
        let kb_s = bps / (8.0 * 1024.0);
        Self {
            kbps,
            mbps: kbps / 1000.0,
            kb_s,
            mb_s: kb_s / 1024.0,
        }
    }
}

/// Outcome of one throughput probe: metrics or the tool's error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MeasurementRecord", into = "MeasurementRecord")]
pub enum MeasurementResult {
    Success(IperfMetrics),
    Error(String),
}

impl MeasurementResult {
    pub fn error(&self) -> Option<&str> {
        match self {
            MeasurementResult::Error(message) => Some(message),
            MeasurementResult::Success(_) => None,
        }
    }

    pub fn metrics(&self) -> Option<&IperfMetrics> {
        match self {
            MeasurementResult::Success(metrics) => Some(metrics),
            MeasurementResult::Error(_) => None,
        }
    }

    /// The server is unreachable; retrying will not help.
    pub fn is_connection_refused(&self) -> bool {
        self.error()
            .is_some_and(|message| message.starts_with(CONNECTION_REFUSED_PREFIX))
    }
}

/// Flat on-disk shape: `error` plus every metric, absent values as null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MeasurementRecord {
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    metrics: IperfMetrics,
}

impl From<MeasurementRecord> for MeasurementResult {
    fn from(record: MeasurementRecord) -> Self {
        match record.error {
            Some(message) => MeasurementResult::Error(message),
            None => MeasurementResult::Success(record.metrics),
        }
    }
}

impl From<MeasurementResult> for MeasurementRecord {
    fn from(result: MeasurementResult) -> Self {
        match result {
            MeasurementResult::Success(metrics) => MeasurementRecord {
                error: None,
                metrics,
            },
            MeasurementResult::Error(message) => MeasurementRecord {
                error: Some(message),
                metrics: IperfMetrics::default(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct IperfReport {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    start: ReportStart,
    #[serde(default)]
    end: ReportEnd,
}

#[derive(Debug, Default, Deserialize)]
struct ReportStart {
    timestamp: Option<ReportTimestamp>,
    test_start: Option<TestStart>,
}

#[derive(Debug, Deserialize)]
struct ReportTimestamp {
    time: String,
    timesecs: i64,
}

#[derive(Debug, Deserialize)]
struct TestStart {
    protocol: String,
    num_streams: u32,
    blksize: u64,
    omit: u32,
    duration: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ReportEnd {
    sum_sent: Option<StreamSum>,
    sum_received: Option<StreamSum>,
    sum: Option<StreamSum>,
}

#[derive(Debug, Deserialize)]
struct StreamSum {
    bytes: u64,
    bits_per_second: f64,
    seconds: Option<f64>,
    retransmits: Option<u64>,
    jitter_ms: Option<f64>,
    packets: Option<u64>,
    lost_packets: Option<u64>,
    lost_percent: Option<f64>,
}

/// Interpret the JSON report written by `iperf3 --json`.
pub fn parse_iperf_report(json: &str) -> CollectorResult<MeasurementResult> {
    let report: IperfReport = serde_json::from_str(json)?;
    if let Some(message) = report.error {
        return Ok(MeasurementResult::Error(message));
    }

    let test_start = report
        .start
        .test_start
        .ok_or(CollectorError::MissingField("start.test_start"))?;
    let mut metrics = IperfMetrics {
        protocol: Some(test_start.protocol.clone()),
        num_streams: Some(test_start.num_streams),
        blksize: Some(test_start.blksize),
        omit: Some(test_start.omit),
        duration: Some(test_start.duration),
        ..Default::default()
    };
    if let Some(timestamp) = report.start.timestamp {
        metrics.time = Some(timestamp.time);
        metrics.timesecs = Some(timestamp.timesecs);
    }

    if test_start.protocol.eq_ignore_ascii_case("UDP") {
        let sum = report.end.sum.ok_or(CollectorError::MissingField("end.sum"))?;
        let scaled = Scaled::from_bps(sum.bits_per_second);
        metrics.bytes = Some(sum.bytes);
        metrics.bps = Some(sum.bits_per_second);
        metrics.jitter_ms = sum.jitter_ms;
        metrics.kbps = Some(scaled.kbps);
        metrics.mbps = Some(scaled.mbps);
        metrics.kb_s = Some(scaled.kb_s);
        metrics.mb_s = Some(scaled.mb_s);
        metrics.packets = sum.packets;
        metrics.lost_packets = sum.lost_packets;
        metrics.lost_percent = sum.lost_percent;
        metrics.seconds = sum.seconds;
    } else {
        let sent = report
            .end
            .sum_sent
            .ok_or(CollectorError::MissingField("end.sum_sent"))?;
        let received = report
            .end
            .sum_received
            .ok_or(CollectorError::MissingField("end.sum_received"))?;
        let sent_scaled = Scaled::from_bps(sent.bits_per_second);
        let received_scaled = Scaled::from_bps(received.bits_per_second);
        metrics.sent_bytes = Some(sent.bytes);
        metrics.sent_bps = Some(sent.bits_per_second);
        metrics.received_bytes = Some(received.bytes);
        metrics.received_bps = Some(received.bits_per_second);
        metrics.sent_kbps = Some(sent_scaled.kbps);
        metrics.sent_mbps = Some(sent_scaled.mbps);
        metrics.sent_kb_s = Some(sent_scaled.kb_s);
        metrics.sent_mb_s = Some(sent_scaled.mb_s);
        metrics.received_kbps = Some(received_scaled.kbps);
        metrics.received_mbps = Some(received_scaled.mbps);
        metrics.received_kb_s = Some(received_scaled.kb_s);
        metrics.received_mb_s = Some(received_scaled.mb_s);
        metrics.retransmits = sent.retransmits;
    }

    Ok(MeasurementResult::Success(metrics))
}

/// Pull the message out of iperf3's plain-text stderr, e.g.
/// `iperf3: error - unable to connect to server: Connection refused`.
pub fn error_from_stderr(stderr: &str) -> Option<String> {
    let line = stderr.lines().map(str::trim).find(|line| !line.is_empty())?;
    let message = line
        .strip_prefix("iperf3: error - ")
        .or_else(|| line.strip_prefix("iperf3: "))
        .unwrap_or(line);
    Some(message.to_string())
}
