use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use surveycore::collector::CollectorConfig;
use surveycore::survey::SurveyFile;
use surveycore::SurveyPlan;

use crate::generator::profile::SimulationProfile;
use crate::Args;

/// Everything one survey session needs, from the command line or a YAML file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub title: String,
    pub scan: bool,
    pub bssid: Option<String>,
    pub ding: Option<PathBuf>,
    pub ding_command: String,
    pub collector: CollectorConfig,
    /// Replace `iw`/`iperf3` with generated values.
    pub simulation: Option<SimulationProfile>,
    /// Bind address of the HTTP status bridge, when enabled.
    pub serve: Option<String>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            title: "survey".into(),
            scan: true,
            bssid: None,
            ding: None,
            ding_command: "/usr/bin/paplay".into(),
            collector: CollectorConfig::default(),
            simulation: None,
            serve: None,
        }
    }
}

impl SurveyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading survey config {}", path_ref.display()))?;
        let config: SurveyConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing survey config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let interface = args.interface.clone().context("INTERFACE is required")?;
        let server = args.server.clone().context("SERVER is required")?;
        let title = args.title.clone().context("TITLE is required")?;

        Ok(Self {
            title,
            scan: !args.no_scan,
            bssid: args.bssid.clone(),
            ding: args.ding.clone(),
            ding_command: args.ding_command.clone(),
            collector: CollectorConfig {
                interface,
                server,
                port: args.port,
                duration_secs: args.duration,
                iw_bin: args.iw_bin.clone(),
                iperf_bin: args.iperf_bin.clone(),
            },
            simulation: args.simulate.then(|| SimulationProfile {
                seed: args.seed,
                ..Default::default()
            }),
            serve: args.serve.clone(),
        })
    }

    pub fn to_plan(&self) -> SurveyPlan {
        SurveyPlan::new(self.bssid.clone(), self.scan)
    }

    pub fn survey_file(&self) -> SurveyFile {
        SurveyFile::for_title(&self.title)
    }
}
