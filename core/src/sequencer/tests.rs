use super::*;
use crate::prelude::CollectorError;
use crate::survey::{PointState, SurveyStore};
use crate::testing::{failure, success, ScriptedCollector, LAB_BSSID};

fn plan(bssid: Option<&str>, scan: bool) -> SurveyPlan {
    SurveyPlan::new(bssid.map(String::from), scan)
}

fn sequencer<'a>(collector: &'a ScriptedCollector, plan: SurveyPlan) -> Sequencer<'a, ScriptedCollector> {
    Sequencer::new(collector, plan, SurveyPoint::new(120, 340), LogManager::new("test"))
}

fn result_keys(point: &SurveyPoint) -> Vec<String> {
    let value = serde_json::to_value(point.result()).unwrap();
    value.as_object().unwrap().keys().cloned().collect()
}

/// Step a run to completion, recording progress after every step.
fn progress_trace(seq: &mut Sequencer<'_, ScriptedCollector>) -> Vec<u8> {
    let mut trace = Vec::new();
    loop {
        let outcome = seq.step().unwrap();
        trace.push(seq.point().progress());
        if outcome == StepOutcome::Finished {
            return trace;
        }
    }
}

#[test]
fn not_associated_aborts_before_any_probe() {
    let collector = ScriptedCollector {
        associated: false,
        ..ScriptedCollector::new()
    };
    let mut store = SurveyStore::new();
    let mut seq = sequencer(&collector, plan(None, true));

    assert!(matches!(seq.run(), Err(SurveyError::NotAssociated)));
    assert_eq!(seq.phase(), Phase::Aborted);
    assert_eq!(collector.calls(), vec!["associated"]);
    assert_eq!(seq.point().progress(), 0);
    if let Some(point) = seq.into_point() {
        store.add(point);
    }
    assert!(store.is_empty());
}

#[test]
fn successful_run_without_scan_stores_metadata_and_throughput() {
    let collector = ScriptedCollector::new();
    let mut seq = sequencer(&collector, plan(None, false));

    assert_eq!(seq.run().unwrap(), StepOutcome::Finished);
    let point = seq.into_point().unwrap();
    assert_eq!(point.state(), PointState::Finished);
    assert_eq!(point.progress(), 100);
    assert!(!point.is_failed());

    let keys = result_keys(&point);
    assert_eq!(keys.len(), 10);
    for key in ["tcp", "tcp-reverse", "udp", "udp-reverse"] {
        assert!(keys.contains(&key.to_string()), "missing {key}");
    }
    assert!(!keys.contains(&"iwscan".to_string()));
    assert_eq!(collector.count("iwscan"), 0);
    assert_eq!(point.result().chan, Some(36));
    assert_eq!(point.result().channel_bitrate, Some(866.7));
}

#[test]
fn successful_run_with_scan_adds_iwscan() {
    let collector = ScriptedCollector::new();
    let mut seq = sequencer(&collector, plan(None, true));

    assert_eq!(seq.run().unwrap(), StepOutcome::Finished);
    let point = seq.into_point().unwrap();
    let keys = result_keys(&point);
    assert_eq!(keys.len(), 11);
    assert!(keys.contains(&"iwscan".to_string()));
    assert_eq!(point.result().iwscan.as_ref().unwrap().len(), 1);
}

#[test]
fn progress_climbs_in_ten_steps() {
    let collector = ScriptedCollector::new();
    let mut seq = sequencer(&collector, plan(None, true));

    let trace = progress_trace(&mut seq);
    assert_eq!(
        trace,
        vec![0, 10, 20, 30, 40, 40, 50, 60, 70, 80, 90, 100]
    );
}

#[test]
fn connection_refused_aborts_without_retry() {
    let collector = ScriptedCollector::new().with_iperf([
        success(false),
        failure("unable to connect to server: Connection refused"),
    ]);
    let mut seq = sequencer(&collector, plan(None, false));

    match seq.run() {
        Err(SurveyError::ProbeConnectionRefused { probe, message }) => {
            assert_eq!(probe, "Download (TCP)");
            assert!(message.starts_with("unable to connect to server"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(seq.phase(), Phase::Aborted);
    assert!(seq.pending_retry().is_none());
    assert_eq!(seq.point().progress(), 0);
    assert!(seq.partial().is_empty());
    assert_eq!(collector.count("iperf"), 2);
    assert!(seq.into_point().is_none());
}

#[test]
fn transient_failure_retried_then_completes() {
    let collector = ScriptedCollector::new().with_iperf([
        success(false),
        success(false),
        failure("the server is busy running a test. try again later"),
    ]);
    let mut seq = sequencer(&collector, plan(None, false));

    let pending = match seq.run().unwrap() {
        StepOutcome::RetryDecisionNeeded(pending) => pending,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(pending.probe, ThroughputProbe::UDP_UPLOAD);
    assert_eq!(seq.phase(), Phase::AwaitingRetry);
    assert_eq!(seq.point().progress(), 20);
    assert!(matches!(
        pending.to_error(),
        SurveyError::ProbeTransient { .. }
    ));

    seq.resume(RetryDecision::Retry).unwrap();
    assert_eq!(
        seq.next_probe(),
        Some(Probe::Throughput(ThroughputProbe::UDP_UPLOAD))
    );
    let trace = progress_trace(&mut seq);
    assert_eq!(trace, vec![30, 40, 40, 50, 60, 70, 80, 90, 100]);

    // tcp up, tcp down, failed udp up, retried udp up, udp down
    assert_eq!(collector.count("iperf"), 5);
    assert_eq!(collector.count("iperf udp=false"), 2);
    let point = seq.into_point().unwrap();
    assert!(point
        .result()
        .throughput(ThroughputProbe::UDP_UPLOAD)
        .unwrap()
        .error()
        .is_none());
}

#[test]
fn declined_retry_keeps_error_result() {
    let collector = ScriptedCollector::new().with_iperf([
        success(false),
        success(false),
        success(true),
        failure("interrupt - the client has terminated"),
    ]);
    let mut seq = sequencer(&collector, plan(None, false));

    assert!(matches!(
        seq.run().unwrap(),
        StepOutcome::RetryDecisionNeeded(_)
    ));
    seq.resume(RetryDecision::KeepError).unwrap();
    assert_eq!(seq.point().progress(), 40);
    assert_eq!(seq.run().unwrap(), StepOutcome::Finished);

    let point = seq.into_point().unwrap();
    let udp_down = point
        .result()
        .throughput(ThroughputProbe::UDP_DOWNLOAD)
        .unwrap();
    assert_eq!(udp_down.error(), Some("interrupt - the client has terminated"));
    assert_eq!(collector.count("iperf"), 4);
    assert_eq!(point.progress(), 100);
}

#[test]
fn abort_while_awaiting_retry_discards_point() {
    let collector =
        ScriptedCollector::new().with_iperf([failure("error - control socket has closed unexpectedly")]);
    let mut seq = sequencer(&collector, plan(None, false));

    assert!(matches!(
        seq.run().unwrap(),
        StepOutcome::RetryDecisionNeeded(_)
    ));
    seq.abort().unwrap();
    assert_eq!(seq.phase(), Phase::Aborted);
    assert_eq!(seq.point().progress(), 0);
    assert!(matches!(
        seq.step(),
        Err(SurveyError::InvalidPhase { .. })
    ));
    assert!(seq.into_point().is_none());
}

#[test]
fn resume_without_pending_retry_is_rejected() {
    let collector = ScriptedCollector::new();
    let mut seq = sequencer(&collector, plan(None, false));
    assert!(matches!(
        seq.resume(RetryDecision::Retry),
        Err(SurveyError::InvalidPhase {
            operation: "resume",
            phase: Phase::NotStarted
        })
    ));
    assert_eq!(seq.phase(), Phase::NotStarted);
}

#[test]
fn bssid_mismatch_before_seventh_probe_discards_metadata() {
    let mut script = vec![LAB_BSSID; 6];
    script.push("11:22:33:44:55:66");
    let collector = ScriptedCollector::new().with_bssids(script);
    let mut seq = sequencer(&collector, plan(Some(LAB_BSSID), false));

    let mut outcome = seq.step();
    while let Ok(StepOutcome::Started | StepOutcome::Progressed(_)) = outcome {
        outcome = seq.step();
    }
    match outcome {
        Err(SurveyError::BssidMismatch { expected, found }) => {
            assert_eq!(expected, LAB_BSSID);
            assert_eq!(found, "11:22:33:44:55:66");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(collector.count("bssid"), 7);
    assert_eq!(collector.count("ssid"), 1);
    assert_eq!(collector.count("rss"), 1);
    assert_eq!(collector.count("freq"), 0);
    assert!(seq.partial().is_empty());
    assert_eq!(seq.point().progress(), 0);
    assert!(seq.point().result().is_empty());
    assert!(seq.into_point().is_none());
}

#[test]
fn bssid_comparison_ignores_case() {
    let collector = ScriptedCollector::new();
    let mut seq = sequencer(&collector, plan(Some("AA:BB:CC:DD:EE:FF"), false));

    assert_eq!(seq.run().unwrap(), StepOutcome::Finished);
    assert_eq!(collector.count("bssid"), SEQUENCE.len());
}

#[test]
fn bssid_is_not_queried_without_target() {
    let collector = ScriptedCollector::new();
    let mut seq = sequencer(&collector, plan(None, false));
    seq.run().unwrap();
    assert_eq!(collector.count("bssid"), 0);
}

#[test]
fn failed_scan_discards_completed_point() {
    let collector = ScriptedCollector {
        scan: None,
        ..ScriptedCollector::new()
    };
    let mut seq = sequencer(&collector, plan(None, true));

    assert!(matches!(seq.run(), Err(SurveyError::ScanFailure)));
    assert_eq!(collector.count("bitrate"), 1);
    assert_eq!(seq.point().progress(), 0);
    assert!(seq.into_point().is_none());
}

#[test]
fn unknown_frequency_aborts_run() {
    let collector = ScriptedCollector {
        freq: 5400,
        ..ScriptedCollector::new()
    };
    let mut seq = sequencer(&collector, plan(None, false));

    assert!(matches!(
        seq.run(),
        Err(SurveyError::Collector(CollectorError::UnknownFrequency(5400)))
    ));
    assert_eq!(seq.phase(), Phase::Aborted);
}

#[test]
fn finished_sequencer_stays_finished() {
    let collector = ScriptedCollector::new();
    let mut seq = sequencer(&collector, plan(None, false));
    seq.run().unwrap();
    assert_eq!(seq.step().unwrap(), StepOutcome::Finished);
    assert!(matches!(
        seq.abort(),
        Err(SurveyError::InvalidPhase { .. })
    ));
}
