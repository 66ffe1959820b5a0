use serde::{Deserialize, Serialize};

use crate::collector::command::{CommandRunner, SystemRunner};
use crate::collector::iperf::{error_from_stderr, parse_iperf_report, MeasurementResult};
use crate::collector::link::{parse_channel_width, parse_iw_link, LinkStatus};
use crate::collector::scan::{parse_iw_scan, NeighborRecord};
use crate::collector::text::RawString;
use crate::prelude::{Collector, CollectorError, CollectorResult};
use crate::telemetry::log::LogManager;

/// Where the collector finds its interface, server and utilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub interface: String,
    pub server: String,
    pub port: u16,
    pub duration_secs: u32,
    pub iw_bin: String,
    pub iperf_bin: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interface: "wlan0".into(),
            server: "127.0.0.1".into(),
            port: 5201,
            duration_secs: 10,
            iw_bin: "iw".into(),
            iperf_bin: "iperf3".into(),
        }
    }
}

/// Collector backed by `iw` and `iperf3` child processes.
pub struct SystemCollector<R: CommandRunner = SystemRunner> {
    config: CollectorConfig,
    runner: R,
    logger: LogManager,
}

impl SystemCollector<SystemRunner> {
    pub fn new(config: CollectorConfig, logger: LogManager) -> Self {
        Self::with_runner(config, SystemRunner, logger)
    }
}

impl<R: CommandRunner> SystemCollector<R> {
    pub fn with_runner(config: CollectorConfig, runner: R, logger: LogManager) -> Self {
        logger.debug(&format!(
            "collector for interface {} against iperf server {}:{}",
            config.interface, config.server, config.port
        ));
        Self {
            config,
            runner,
            logger,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn iw(&self, args: &[&str]) -> CollectorResult<String> {
        let mut full = vec!["dev", self.config.interface.as_str()];
        full.extend_from_slice(args);
        let output = self
            .runner
            .run(&self.config.iw_bin, &full)?
            .into_success(&self.config.iw_bin)?;
        Ok(output.stdout)
    }

    /// Confirm the interface exists and is wireless.
    pub fn verify_interface(&self) -> CollectorResult<()> {
        match self.iw(&["info"]) {
            Ok(_) => Ok(()),
            Err(CollectorError::CommandFailed { stderr, .. }) => {
                self.logger.error(&format!(
                    "device {} is not a valid wireless interface: {}",
                    self.config.interface, stderr
                ));
                Err(CollectorError::InvalidInterface(
                    self.config.interface.clone(),
                ))
            }
            Err(err) => Err(err),
        }
    }

    pub fn link(&self) -> CollectorResult<LinkStatus> {
        parse_iw_link(&self.iw(&["link"])?)
    }
}

impl<R: CommandRunner> Collector for SystemCollector<R> {
    fn check_associated(&self) -> CollectorResult<bool> {
        self.logger.debug("checking association with AP");
        let associated = self.link()?.is_associated();
        if !associated {
            self.logger.warn("not associated to an AP");
        }
        Ok(associated)
    }

    fn bssid(&self) -> CollectorResult<String> {
        let bssid = self.link()?.require_bssid()?;
        self.logger.debug(&format!("BSSID is {bssid}"));
        Ok(bssid)
    }

    fn ssid(&self) -> CollectorResult<RawString> {
        let ssid = self.link()?.require_ssid()?;
        self.logger.debug(&format!("SSID is {ssid}"));
        Ok(ssid)
    }

    fn rss(&self) -> CollectorResult<i32> {
        let rss = self.link()?.require_signal()?;
        self.logger.debug(&format!("RSS is {rss} dBm"));
        Ok(rss)
    }

    fn freq(&self) -> CollectorResult<u32> {
        let freq = self.link()?.require_freq()?;
        self.logger.debug(&format!("frequency is {freq} MHz"));
        Ok(freq)
    }

    fn channel_width(&self) -> CollectorResult<u32> {
        let width = parse_channel_width(&self.iw(&["info"])?)?;
        self.logger.debug(&format!("channel width is {width} MHz"));
        Ok(width)
    }

    fn bitrate(&self) -> CollectorResult<f64> {
        let bitrate = self.link()?.require_bitrate()?;
        self.logger.debug(&format!("bitrate is {bitrate:.1} MBit/s"));
        Ok(bitrate)
    }

    fn run_iwscan(&self) -> CollectorResult<Option<Vec<NeighborRecord>>> {
        self.logger.debug("scanning for neighboring access points");
        match self.iw(&["scan"]) {
            Ok(stdout) => {
                let neighbors = parse_iw_scan(&stdout);
                self.logger
                    .debug(&format!("found {} access points", neighbors.len()));
                Ok(Some(neighbors))
            }
            Err(CollectorError::CommandFailed { stderr, .. }) => {
                self.logger.warn(&format!("scan failed: {stderr}"));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn run_iperf(&self, udp: bool, reverse: bool) -> CollectorResult<MeasurementResult> {
        let port = self.config.port.to_string();
        let duration = self.config.duration_secs.to_string();
        let mut args = vec![
            "-c",
            self.config.server.as_str(),
            "-p",
            port.as_str(),
            "-t",
            duration.as_str(),
            "-J",
        ];
        if udp {
            args.push("-u");
        }
        if reverse {
            args.push("-R");
        }
        self.logger.debug(&format!(
            "running iperf to {}; udp={udp} reverse={reverse}",
            self.config.server
        ));

        let output = self.runner.run(&self.config.iperf_bin, &args)?;
        let result = match parse_iperf_report(&output.stdout) {
            Ok(result) => result,
            Err(err) if !output.success => {
                self.logger
                    .debug(&format!("iperf report unreadable after failure: {err}"));
                MeasurementResult::Error(
                    error_from_stderr(&output.stderr)
                        .unwrap_or_else(|| format!("iperf3 exited with {}", output.status)),
                )
            }
            Err(err) => return Err(err),
        };
        if let Some(message) = result.error() {
            self.logger.error(&format!("iperf error: {message}"));
        }
        Ok(result)
    }
}
