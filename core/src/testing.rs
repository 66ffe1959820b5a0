//! Scripted collector shared by unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::collector::{IperfMetrics, MeasurementResult, NeighborRecord, RawString};
use crate::prelude::{Collector, CollectorResult};

pub(crate) const LAB_BSSID: &str = "aa:bb:cc:dd:ee:ff";

/// Collector whose answers are fixed up front. Queued BSSIDs and iperf
/// results are consumed one per call; once drained the defaults apply.
pub(crate) struct ScriptedCollector {
    pub associated: bool,
    pub freq: u32,
    pub scan: Option<Vec<NeighborRecord>>,
    pub bssids: RefCell<VecDeque<String>>,
    pub iperf: RefCell<VecDeque<MeasurementResult>>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedCollector {
    pub fn new() -> Self {
        Self {
            associated: true,
            freq: 5180,
            scan: Some(vec![NeighborRecord {
                bssid: LAB_BSSID.into(),
                ssid: RawString::from("Lab"),
                freq: Some(5180),
                channel: Some(36),
                signal_dbm: Some(-48.0),
                associated: true,
            }]),
            bssids: RefCell::default(),
            iperf: RefCell::default(),
            calls: RefCell::default(),
        }
    }

    pub fn with_bssids<'s>(self, bssids: impl IntoIterator<Item = &'s str>) -> Self {
        self.bssids
            .borrow_mut()
            .extend(bssids.into_iter().map(String::from));
        self
    }

    pub fn with_iperf(self, results: impl IntoIterator<Item = MeasurementResult>) -> Self {
        self.iperf.borrow_mut().extend(results);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

pub(crate) fn success(udp: bool) -> MeasurementResult {
    MeasurementResult::Success(IperfMetrics {
        protocol: Some(if udp { "UDP" } else { "TCP" }.into()),
        duration: Some(10),
        ..Default::default()
    })
}

pub(crate) fn failure(message: &str) -> MeasurementResult {
    MeasurementResult::Error(message.into())
}

impl Collector for ScriptedCollector {
    fn check_associated(&self) -> CollectorResult<bool> {
        self.log("associated".into());
        Ok(self.associated)
    }

    fn bssid(&self) -> CollectorResult<String> {
        self.log("bssid".into());
        Ok(self
            .bssids
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| LAB_BSSID.into()))
    }

    fn ssid(&self) -> CollectorResult<RawString> {
        self.log("ssid".into());
        Ok(RawString::from("Lab"))
    }

    fn rss(&self) -> CollectorResult<i32> {
        self.log("rss".into());
        Ok(-55)
    }

    fn freq(&self) -> CollectorResult<u32> {
        self.log("freq".into());
        Ok(self.freq)
    }

    fn channel_width(&self) -> CollectorResult<u32> {
        self.log("chan_width".into());
        Ok(80)
    }

    fn bitrate(&self) -> CollectorResult<f64> {
        self.log("bitrate".into());
        Ok(866.7)
    }

    fn run_iwscan(&self) -> CollectorResult<Option<Vec<NeighborRecord>>> {
        self.log("iwscan".into());
        Ok(self.scan.clone())
    }

    fn run_iperf(&self, udp: bool, reverse: bool) -> CollectorResult<MeasurementResult> {
        self.log(format!("iperf udp={udp} reverse={reverse}"));
        Ok(self
            .iperf
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| success(udp)))
    }
}
