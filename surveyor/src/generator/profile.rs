use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cell::RefCell;
use surveycore::collector::iperf::parse_iperf_report;
use surveycore::collector::{MeasurementResult, NeighborRecord, RawString};
use surveycore::prelude::{Collector, CollectorResult};

/// Link and throughput figures a simulated survey draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationProfile {
    pub seed: u64,
    pub bssid: String,
    pub ssid: String,
    pub freq: u32,
    pub channel_width: u32,
    /// Mean signal strength; each reading varies by `rss_spread` either way.
    pub rss_dbm: i32,
    pub rss_spread: i32,
    pub tcp_mbps: f64,
    pub udp_mbps: f64,
    pub duration_secs: u32,
    /// Chance that a single iperf run fails with a transient error.
    pub failure_rate: f64,
    pub neighbors: usize,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            seed: 0,
            bssid: "02:00:00:00:00:01".into(),
            ssid: "survey-sim".into(),
            freq: 5180,
            channel_width: 80,
            rss_dbm: -55,
            rss_spread: 8,
            tcp_mbps: 420.0,
            udp_mbps: 95.0,
            duration_secs: 10,
            failure_rate: 0.0,
            neighbors: 3,
        }
    }
}

/// Collector that fabricates readings from a [`SimulationProfile`].
pub struct SimulatedCollector {
    profile: SimulationProfile,
    rng: RefCell<StdRng>,
}

impl SimulatedCollector {
    pub fn new(profile: SimulationProfile) -> Self {
        let rng = StdRng::seed_from_u64(profile.seed);
        Self {
            profile,
            rng: RefCell::new(rng),
        }
    }

    fn jitter(&self, mean: f64, fraction: f64) -> f64 {
        let spread = mean.abs() * fraction;
        if spread <= 0.0 {
            return mean;
        }
        mean + self.rng.borrow_mut().gen_range(-spread..spread)
    }

    /// An iperf3 JSON report for one run, fed through the real parser.
    fn report(&self, udp: bool, reverse: bool) -> serde_json::Value {
        let duration = self.profile.duration_secs.max(1);
        let seconds = f64::from(duration);
        let mean = if udp {
            self.profile.udp_mbps
        } else {
            self.profile.tcp_mbps
        };
        // Downloads run a little faster on a typical AP.
        let mean = if reverse { mean * 1.1 } else { mean };
        let bps = self.jitter(mean, 0.15).max(0.1) * 1_000_000.0;
        let bytes = (bps * seconds / 8.0) as u64;
        let test_start = json!({
            "protocol": if udp { "UDP" } else { "TCP" },
            "num_streams": 1,
            "blksize": if udp { 1448 } else { 131072 },
            "omit": 0,
            "duration": duration,
        });
        let start = json!({
            "timestamp": {"time": "simulated", "timesecs": 0},
            "test_start": test_start,
        });

        if udp {
            let packets = bytes / 1448;
            let lost = self.rng.borrow_mut().gen_range(0..=packets / 100);
            let lost_percent = if packets == 0 {
                0.0
            } else {
                100.0 * lost as f64 / packets as f64
            };
            json!({
                "start": start,
                "end": {"sum": {
                    "bytes": bytes,
                    "bits_per_second": bps,
                    "seconds": seconds,
                    "jitter_ms": self.jitter(0.4, 0.5).max(0.0),
                    "packets": packets,
                    "lost_packets": lost,
                    "lost_percent": lost_percent,
                }},
            })
        } else {
            let retransmits = self.rng.borrow_mut().gen_range(0..40u64);
            let received_bps = bps * 0.98;
            json!({
                "start": start,
                "end": {
                    "sum_sent": {
                        "bytes": bytes,
                        "bits_per_second": bps,
                        "seconds": seconds,
                        "retransmits": retransmits,
                    },
                    "sum_received": {
                        "bytes": (received_bps * seconds / 8.0) as u64,
                        "bits_per_second": received_bps,
                        "seconds": seconds,
                    },
                },
            })
        }
    }
}

impl Collector for SimulatedCollector {
    fn check_associated(&self) -> CollectorResult<bool> {
        Ok(true)
    }

    fn bssid(&self) -> CollectorResult<String> {
        Ok(self.profile.bssid.to_ascii_lowercase())
    }

    fn ssid(&self) -> CollectorResult<RawString> {
        Ok(RawString::from(self.profile.ssid.as_str()))
    }

    fn rss(&self) -> CollectorResult<i32> {
        let spread = self.profile.rss_spread.abs();
        let offset = self.rng.borrow_mut().gen_range(-spread..=spread);
        Ok(self.profile.rss_dbm + offset)
    }

    fn freq(&self) -> CollectorResult<u32> {
        Ok(self.profile.freq)
    }

    fn channel_width(&self) -> CollectorResult<u32> {
        Ok(self.profile.channel_width)
    }

    fn bitrate(&self) -> CollectorResult<f64> {
        Ok((self.jitter(self.profile.tcp_mbps * 2.0, 0.1) * 10.0).round() / 10.0)
    }

    fn run_iwscan(&self) -> CollectorResult<Option<Vec<NeighborRecord>>> {
        let channel = self.channel(self.profile.freq)?;
        let mut neighbors = vec![NeighborRecord {
            bssid: self.profile.bssid.to_ascii_lowercase(),
            ssid: RawString::from(self.profile.ssid.as_str()),
            freq: Some(self.profile.freq),
            channel: Some(channel),
            signal_dbm: Some(f64::from(self.rss()?)),
            associated: true,
        }];
        for index in 1..=self.profile.neighbors {
            let signal = self.rng.borrow_mut().gen_range(-90..-45);
            neighbors.push(NeighborRecord {
                bssid: format!("02:00:00:00:01:{index:02x}"),
                ssid: RawString::from(format!("neighbor-{index}")),
                freq: Some(self.profile.freq),
                channel: Some(channel),
                signal_dbm: Some(f64::from(signal)),
                associated: false,
            });
        }
        Ok(Some(neighbors))
    }

    fn run_iperf(&self, udp: bool, reverse: bool) -> CollectorResult<MeasurementResult> {
        let failure_rate = self.profile.failure_rate.clamp(0.0, 1.0);
        if self.rng.borrow_mut().gen_bool(failure_rate) {
            return Ok(MeasurementResult::Error(
                "the server is busy running a test. try again later".into(),
            ));
        }
        parse_iperf_report(&self.report(udp, reverse).to_string())
    }
}
