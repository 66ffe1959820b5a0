use serde::{Deserialize, Serialize};

use crate::collector::{MeasurementResult, NeighborRecord, RawString};
use crate::sequencer::Phase;

/// Survey-wide settings fixed when a survey session starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyPlan {
    /// Access point every probe must stay associated with, lower-cased.
    pub expected_bssid: Option<String>,
    /// Run a neighbor scan as the last step of each point.
    pub scan: bool,
}

impl SurveyPlan {
    pub fn new(expected_bssid: Option<String>, scan: bool) -> Self {
        Self {
            expected_bssid: expected_bssid.map(|bssid| bssid.trim().to_ascii_lowercase()),
            scan,
        }
    }

    /// True when no target BSSID is set or `observed` names the same radio.
    pub fn accepts_bssid(&self, observed: &str) -> bool {
        match &self.expected_bssid {
            Some(expected) => expected.eq_ignore_ascii_case(observed.trim()),
            None => true,
        }
    }
}

/// Failures raised while querying the wireless utilities or the throughput tool.
#[derive(thiserror::Error, Debug)]
pub enum CollectorError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("{0} is not a usable wireless interface")]
    InvalidInterface(String),
    #[error("unparsable output: {0}")]
    Parse(String),
    #[error("field `{0}` missing from utility output")]
    MissingField(&'static str),
    #[error("frequency {0} MHz does not map to a known channel")]
    UnknownFrequency(u32),
    #[error("malformed JSON report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CollectorResult<T> = Result<T, CollectorError>;

/// Everything that can end or interrupt a survey-point attempt.
#[derive(thiserror::Error, Debug)]
pub enum SurveyError {
    #[error("interface is not associated to an access point")]
    NotAssociated,
    #[error("expected BSSID {expected} but found BSSID {found}")]
    BssidMismatch { expected: String, found: String },
    #[error("{probe}: {message}")]
    ProbeConnectionRefused { probe: String, message: String },
    #[error("{probe} failed: {message}")]
    ProbeTransient { probe: String, message: String },
    #[error("neighbor scan returned no data")]
    ScanFailure,
    #[error("survey data is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("measurement aborted by operator")]
    OperatorAbort,
    #[error("cannot {operation} while the sequencer is {phase:?}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },
    #[error(transparent)]
    Collector(#[from] CollectorError),
    #[error("survey file I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("survey file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

impl SurveyError {
    /// Whether the failure means the point must be thrown away.
    pub fn discards_point(&self) -> bool {
        !matches!(
            self,
            SurveyError::InvalidPhase { .. } | SurveyError::ProbeTransient { .. }
        )
    }
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Source of link metadata and throughput measurements.
///
/// Every call blocks on an external utility. Implementations never retry;
/// the sequencer owns retry policy.
pub trait Collector {
    fn check_associated(&self) -> CollectorResult<bool>;
    fn bssid(&self) -> CollectorResult<String>;
    fn ssid(&self) -> CollectorResult<RawString>;
    fn rss(&self) -> CollectorResult<i32>;
    fn freq(&self) -> CollectorResult<u32>;
    fn channel_width(&self) -> CollectorResult<u32>;
    fn bitrate(&self) -> CollectorResult<f64>;

    /// Scan for neighboring access points. `None` when the scan utility
    /// reported an error such as a busy device or missing privileges.
    fn run_iwscan(&self) -> CollectorResult<Option<Vec<NeighborRecord>>>;

    /// Run one throughput test. Tool-level failures come back as
    /// [`MeasurementResult::Error`]; only catastrophic failures raise.
    fn run_iperf(&self, udp: bool, reverse: bool) -> CollectorResult<MeasurementResult>;

    fn channel(&self, freq: u32) -> CollectorResult<u32> {
        crate::collector::channels::channel_for_frequency(freq)
    }
}
