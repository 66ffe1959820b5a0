use std::fmt;

use crate::collector::ThroughputProbe;

/// Number of progress ticks in a full measurement cycle.
pub const TOTAL_STEPS: u32 = 10;

/// One discrete measurement in the per-point sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Throughput(ThroughputProbe),
    Ssid,
    Rss,
    Freq,
    Channel,
    ChannelWidth,
    Bitrate,
    NeighborScan,
}

/// Fixed run order for every survey point.
pub const SEQUENCE: [Probe; 11] = [
    Probe::Throughput(ThroughputProbe::TCP_UPLOAD),
    Probe::Throughput(ThroughputProbe::TCP_DOWNLOAD),
    Probe::Throughput(ThroughputProbe::UDP_UPLOAD),
    Probe::Throughput(ThroughputProbe::UDP_DOWNLOAD),
    Probe::Ssid,
    Probe::Rss,
    Probe::Freq,
    Probe::Channel,
    Probe::ChannelWidth,
    Probe::Bitrate,
    Probe::NeighborScan,
];

impl Probe {
    /// Progress tick reached once this probe completes. The SSID query
    /// shares tick 4 with the last throughput probe.
    pub fn progress_tick(&self) -> u32 {
        match self {
            Probe::Throughput(probe) => match (probe.udp, probe.reverse) {
                (false, false) => 1,
                (false, true) => 2,
                (true, false) => 3,
                (true, true) => 4,
            },
            Probe::Ssid => 4,
            Probe::Rss => 5,
            Probe::Freq => 6,
            Probe::Channel => 7,
            Probe::ChannelWidth => 8,
            Probe::Bitrate => 9,
            Probe::NeighborScan => 10,
        }
    }

    /// Operator-facing status line shown while the probe runs.
    pub fn status(&self) -> String {
        match self {
            Probe::Throughput(probe) => {
                format!("Running iperf {}/4: {probe}", self.progress_tick())
            }
            Probe::Ssid => "Obtaining AP name...".into(),
            Probe::Rss => "Obtaining signal strength...".into(),
            Probe::Freq => "Getting signal frequency...".into(),
            Probe::Channel => "Getting signal channel...".into(),
            Probe::ChannelWidth => "Getting channel width...".into(),
            Probe::Bitrate => "Getting bitrate...".into(),
            Probe::NeighborScan => "Running iwscan...".into(),
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probe::Throughput(probe) => write!(f, "iperf {probe}"),
            Probe::Ssid => write!(f, "ssid"),
            Probe::Rss => write!(f, "rss"),
            Probe::Freq => write!(f, "freq"),
            Probe::Channel => write!(f, "chan"),
            Probe::ChannelWidth => write!(f, "chan_width"),
            Probe::Bitrate => write!(f, "channel_bitrate"),
            Probe::NeighborScan => write!(f, "iwscan"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_never_decrease_along_the_sequence() {
        let ticks: Vec<u32> = SEQUENCE.iter().map(Probe::progress_tick).collect();
        assert!(ticks.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(ticks.first(), Some(&1));
        assert_eq!(ticks.last(), Some(&TOTAL_STEPS));
    }

    #[test]
    fn throughput_status_names_direction() {
        let probe = Probe::Throughput(ThroughputProbe::TCP_DOWNLOAD);
        assert_eq!(probe.status(), "Running iperf 2/4: Download (TCP)");
    }
}
