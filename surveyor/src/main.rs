use anyhow::Context;
use clap::{ArgAction, Parser};
use generator::profile::SimulatedCollector;
use log::LevelFilter;
use status::bridge::StatusBridge;
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use surveycore::collector::SystemCollector;
use surveycore::prelude::Collector;
use surveycore::telemetry::LogManager;
use surveycore::SurveyPoint;
use workflow::config::SurveyConfig;
use workflow::console::{Command, Console, HELP};
use workflow::ding::Ding;
use workflow::runner::Runner;

mod generator;
mod status;
mod workflow;

#[derive(Parser, Debug)]
#[command(author, version, about = "WiFi survey data collection console")]
pub struct Args {
    /// Wireless interface name
    #[arg(value_name = "INTERFACE", required_unless_present = "config")]
    pub interface: Option<String>,
    /// iperf3 server IP or hostname
    #[arg(value_name = "SERVER", required_unless_present = "config")]
    pub server: Option<String>,
    /// Title for survey (and data filename)
    #[arg(value_name = "TITLE", required_unless_present = "config")]
    pub title: Option<String>,
    /// Verbose output; specify twice for debug-level output
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Skip access point scan
    #[arg(short = 'S', long = "no-scan", default_value_t = false)]
    pub no_scan: bool,
    /// Restrict survey to this BSSID
    #[arg(short, long)]
    pub bssid: Option<String>,
    /// Duration of each individual iperf3 test run, in seconds
    #[arg(short, long, default_value_t = 10)]
    pub duration: u32,
    /// iperf3 server port
    #[arg(long, default_value_t = 5201)]
    pub port: u16,
    /// Path to audio file to play when measurement finishes
    #[arg(long)]
    pub ding: Option<PathBuf>,
    /// Path to ding command
    #[arg(long, default_value = "/usr/bin/paplay")]
    pub ding_command: String,
    #[arg(long, default_value = "iperf3")]
    pub iperf_bin: String,
    #[arg(long, default_value = "iw")]
    pub iw_bin: String,
    /// Generate readings instead of calling iw and iperf3
    #[arg(long, default_value_t = false)]
    pub simulate: bool,
    /// Seed for --simulate
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Serve survey status over HTTP (GET /points, GET /status)
    #[arg(long, value_name = "ADDR", num_args = 0..=1, default_missing_value = "127.0.0.1:9000")]
    pub serve: Option<String>,
    /// Load the whole survey config from YAML instead of the arguments above
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => SurveyConfig::load(path)?,
        None => SurveyConfig::from_args(&args)?,
    };
    let logger = LogManager::new("surveyor");

    let file = config.survey_file();
    let store = file
        .load_store()
        .with_context(|| format!("loading survey data from {}", file.path().display()))?;
    if !store.is_empty() {
        logger.record(&format!(
            "loaded {} points from {}",
            store.len(),
            file.path().display()
        ));
    }

    let bridge = StatusBridge::new(&config.title, logger);
    if let Some(addr) = &config.serve {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("invalid status bridge address {addr}"))?;
        bridge.serve(addr)?;
    }

    let ding = config
        .ding
        .as_ref()
        .map(|sound| Ding::new(config.ding_command.clone(), sound.clone()));
    let plan = config.to_plan();

    match &config.simulation {
        Some(profile) => {
            logger.warn("simulated collector in use; readings are not real");
            let collector = SimulatedCollector::new(profile.clone());
            let runner = Runner::new(collector, plan, store, file, bridge, logger).with_ding(ding);
            survey(runner, &config.title)
        }
        None => {
            let collector =
                SystemCollector::new(config.collector.clone(), LogManager::new("collector"));
            collector
                .verify_interface()
                .with_context(|| format!("checking interface {}", config.collector.interface))?;
            let runner = Runner::new(collector, plan, store, file, bridge, logger).with_ding(ding);
            survey(runner, &config.title)
        }
    }
}

fn describe(index: usize, point: &SurveyPoint) -> String {
    let result = point.result();
    let show = |value: Option<String>| value.unwrap_or_else(|| "-".into());
    format!(
        "{index:>3}  ({}, {})  rss={} chan={} ssid={}",
        point.x,
        point.y,
        show(result.rss.map(|rss| rss.to_string())),
        show(result.chan.map(|chan| chan.to_string())),
        show(result.ssid.as_ref().map(|ssid| ssid.to_string())),
    )
}

fn survey<C: Collector>(mut runner: Runner<C>, title: &str) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    console.say(&format!("wifi-survey: {title}"));
    console.say(HELP);

    loop {
        let outcome = match console.next_command()? {
            Command::Measure { x, y } => runner.measure(x, y, &mut console).map(|_| ()),
            Command::Remove { x, y } => runner.remove(x, y, &mut console).map(|_| ()),
            Command::Move { x, y, to_x, to_y } => runner
                .relocate((x, y), (to_x, to_y), &mut console)
                .map(|_| ()),
            Command::List => {
                list(&mut console, &runner);
                Ok(())
            }
            Command::Help => {
                console.say(HELP);
                Ok(())
            }
            Command::Quit => break,
        };
        if let Err(err) = outcome {
            console.say(&format!("ERROR: {err:#}"));
        }
    }

    let metrics = runner.metrics();
    println!(
        "survey {title}: {} points stored, {} measured this session, {} aborted, {} retries",
        runner.store().len(),
        metrics.finished,
        metrics.aborted,
        metrics.retries
    );
    Ok(())
}

fn list<C: Collector, R: BufRead, W: Write>(console: &mut Console<R, W>, runner: &Runner<C>) {
    if runner.store().is_empty() {
        console.say("no points surveyed yet");
        return;
    }
    for (index, point) in runner.store().points().iter().enumerate() {
        console.say(&describe(index, point));
    }
}
