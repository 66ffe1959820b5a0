//! Parser for `iw dev <iface> scan` output.

use serde::{Deserialize, Serialize};

use crate::collector::channels::channel_for_frequency;
use crate::collector::link::normalize_mac;
use crate::collector::text::RawString;

/// One access point seen during a neighbor scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborRecord {
    pub bssid: String,
    pub ssid: RawString,
    pub freq: Option<u32>,
    pub channel: Option<u32>,
    pub signal_dbm: Option<f64>,
    #[serde(default)]
    pub associated: bool,
}

/// Fields accumulated for a single `BSS` stanza.
#[derive(Default)]
struct BssStanza {
    bssid: String,
    associated: bool,
    ssid: Option<RawString>,
    freq: Option<u32>,
    channel: Option<u32>,
    signal_dbm: Option<f64>,
}

impl BssStanza {
    fn into_record(self) -> NeighborRecord {
        let channel = self
            .channel
            .or_else(|| self.freq.and_then(|freq| channel_for_frequency(freq).ok()));
        NeighborRecord {
            bssid: self.bssid,
            ssid: self.ssid.unwrap_or_default(),
            freq: self.freq,
            channel,
            signal_dbm: self.signal_dbm,
            associated: self.associated,
        }
    }
}

/// Each stanza starts at column 0 with `BSS aa:bb:cc:dd:ee:ff(on wlan0)`,
/// optionally followed by ` -- associated`; indented lines belong to it.
pub fn parse_iw_scan(output: &str) -> Vec<NeighborRecord> {
    let mut records = Vec::new();
    let mut current: Option<BssStanza> = None;

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("BSS ") {
            if let Some(stanza) = current.take() {
                records.push(stanza.into_record());
            }
            let mac_end = rest
                .find(|c: char| !c.is_ascii_hexdigit() && c != ':')
                .unwrap_or(rest.len());
            current = normalize_mac(&rest[..mac_end])
                .ok()
                .map(|bssid| BssStanza {
                    bssid,
                    associated: rest.contains("-- associated"),
                    ..Default::default()
                });
            continue;
        }

        let Some(stanza) = current.as_mut() else {
            continue;
        };
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("SSID: ") {
            stanza.ssid = Some(RawString::from_iw_escaped(rest));
        } else if let Some(rest) = trimmed.strip_prefix("freq:") {
            stanza.freq = rest
                .split_whitespace()
                .next()
                .and_then(|value| value.parse::<f64>().ok())
                .map(|freq| freq.round() as u32);
        } else if let Some(rest) = trimmed.strip_prefix("signal:") {
            stanza.signal_dbm = rest
                .split_whitespace()
                .next()
                .and_then(|value| value.parse().ok());
        } else if let Some(rest) = trimmed.strip_prefix("DS Parameter set: channel") {
            stanza.channel = rest.trim().parse().ok();
        } else if let Some(rest) = trimmed.strip_prefix("* primary channel:") {
            stanza.channel = stanza.channel.or_else(|| rest.trim().parse().ok());
        }
    }

    if let Some(stanza) = current.take() {
        records.push(stanza.into_record());
    }
    records
}
