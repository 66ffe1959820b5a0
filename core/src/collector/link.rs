//! Parsers for `iw dev <iface> link` and `iw dev <iface> info`.

use crate::collector::text::RawString;
use crate::prelude::{CollectorError, CollectorResult};

/// Current association as reported by `iw dev <iface> link`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkStatus {
    pub bssid: Option<String>,
    pub ssid: Option<RawString>,
    pub freq_mhz: Option<u32>,
    pub signal_dbm: Option<i32>,
    pub rx_bitrate: Option<f64>,
    pub tx_bitrate: Option<f64>,
}

impl LinkStatus {
    pub fn is_associated(&self) -> bool {
        self.bssid.is_some()
    }

    pub fn require_bssid(&self) -> CollectorResult<String> {
        self.bssid.clone().ok_or(CollectorError::MissingField("bssid"))
    }

    pub fn require_ssid(&self) -> CollectorResult<RawString> {
        self.ssid.clone().ok_or(CollectorError::MissingField("ssid"))
    }

    pub fn require_freq(&self) -> CollectorResult<u32> {
        self.freq_mhz.ok_or(CollectorError::MissingField("freq"))
    }

    pub fn require_signal(&self) -> CollectorResult<i32> {
        self.signal_dbm.ok_or(CollectorError::MissingField("signal"))
    }

    /// Negotiated bitrate, preferring the transmit side.
    pub fn require_bitrate(&self) -> CollectorResult<f64> {
        self.tx_bitrate
            .or(self.rx_bitrate)
            .ok_or(CollectorError::MissingField("bitrate"))
    }
}

/// Normalize a MAC address to lower-case, colon-delimited hex.
pub fn normalize_mac(raw: &str) -> CollectorResult<String> {
    let octets: Vec<&str> = raw.trim().split([':', '-']).collect();
    let valid = octets.len() == 6
        && octets
            .iter()
            .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(CollectorError::Parse(format!("bad MAC address {raw:?}")));
    }
    Ok(octets.join(":").to_ascii_lowercase())
}

fn leading_number(text: &str) -> Option<f64> {
    text.split_whitespace().next()?.parse().ok()
}

pub fn parse_iw_link(output: &str) -> CollectorResult<LinkStatus> {
    let mut status = LinkStatus::default();
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("Connected to ") {
            let mac = rest.split_whitespace().next().unwrap_or_default();
            status.bssid = Some(normalize_mac(mac)?);
            continue;
        }

        // SSIDs may legitimately start or end with spaces, which iw escapes.
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("SSID: ") {
            status.ssid = Some(RawString::from_iw_escaped(rest));
        } else if let Some(rest) = trimmed.strip_prefix("freq:") {
            status.freq_mhz = leading_number(rest).map(|freq| freq.round() as u32);
        } else if let Some(rest) = trimmed.strip_prefix("signal:") {
            status.signal_dbm = leading_number(rest).map(|dbm| dbm.round() as i32);
        } else if let Some(rest) = trimmed.strip_prefix("rx bitrate:") {
            status.rx_bitrate = leading_number(rest);
        } else if let Some(rest) = trimmed.strip_prefix("tx bitrate:") {
            status.tx_bitrate = leading_number(rest);
        }
    }
    Ok(status)
}

/// Extract the channel width from `iw dev <iface> info`, e.g.
/// `channel 36 (5180 MHz), width: 80 MHz, center1: 5210 MHz`.
pub fn parse_channel_width(output: &str) -> CollectorResult<u32> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("channel "))
        .find_map(|line| {
            let (_, rest) = line.split_once("width:")?;
            leading_number(rest).map(|width| width as u32)
        })
        .ok_or(CollectorError::MissingField("channel width"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONNECTED: &str = "\
Connected to AA:BB:CC:DD:EE:FF (on wlan0)
\tSSID: HomeNetwork
\tfreq: 5180
\tRX: 81123 bytes (512 packets)
\tTX: 10244 bytes (88 packets)
\tsignal: -52 dBm
\trx bitrate: 433.3 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 1
\ttx bitrate: 866.7 MBit/s VHT-MCS 9 80MHz short GI VHT-NSS 2

\tbss flags:\tshort-slot-time
\tdtim period:\t1
\tbeacon int:\t100
";

    #[test]
    fn parses_connected_link() {
        let status = parse_iw_link(CONNECTED).unwrap();
        assert!(status.is_associated());
        assert_eq!(status.bssid.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(status.ssid.unwrap().to_str().unwrap(), "HomeNetwork");
        assert_eq!(status.freq_mhz, Some(5180));
        assert_eq!(status.signal_dbm, Some(-52));
        assert_eq!(status.rx_bitrate, Some(433.3));
        assert_eq!(status.tx_bitrate, Some(866.7));
    }

    #[test]
    fn not_connected_has_no_bssid() {
        let status = parse_iw_link("Not connected.\n").unwrap();
        assert!(!status.is_associated());
        assert!(matches!(
            status.require_bssid(),
            Err(CollectorError::MissingField("bssid"))
        ));
    }

    #[test]
    fn fractional_frequency_is_rounded() {
        let status = parse_iw_link("Connected to 11:22:33:44:55:66 (on wlp2s0)\n\tfreq: 2437.0\n")
            .unwrap();
        assert_eq!(status.require_freq().unwrap(), 2437);
    }

    #[test]
    fn bitrate_falls_back_to_rx() {
        let status = LinkStatus {
            rx_bitrate: Some(54.0),
            ..Default::default()
        };
        assert_eq!(status.require_bitrate().unwrap(), 54.0);
    }

    #[test]
    fn normalizes_dash_delimited_macs() {
        assert_eq!(
            normalize_mac("AA-BB-CC-00-11-22").unwrap(),
            "aa:bb:cc:00:11:22"
        );
        assert!(normalize_mac("aa:bb:cc").is_err());
    }

    #[test]
    fn parses_channel_width_from_info() {
        let info = "\
Interface wlan0
\tifindex 3
\ttype managed
\tchannel 36 (5180 MHz), width: 80 MHz, center1: 5210 MHz
\ttxpower 22.00 dBm
";
        assert_eq!(parse_channel_width(info).unwrap(), 80);
        let legacy = "\tchannel 6 (2437 MHz), width: 20 MHz (no HT), center1: 2437 MHz\n";
        assert_eq!(parse_channel_width(legacy).unwrap(), 20);
        assert!(parse_channel_width("Interface wlan0\n").is_err());
    }
}
