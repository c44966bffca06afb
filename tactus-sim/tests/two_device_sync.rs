//! End-to-end simulation: a controller and node session over a simulated
//! channel, checked for matching pulse sequences and bounded start skew.

use tactus_core::config::SessionConfig;
use tactus_core::session::{SessionEvent, SessionState};
use tactus_sim::{DriftingClock, LinkConfig, Role, SyncHarness};

const RUN_LIMIT_US: u64 = 20_000_000;

#[test]
fn test_clock_origins_do_not_matter() {
    // Perfect crystals, but the node booted an hour before the
    // controller. Session-relative stamps make the origins irrelevant.
    let controller_clock = DriftingClock::perfect(100_000);
    let node_clock = DriftingClock::perfect(3_600_000_000);
    let mut harness = SyncHarness::with_clocks(
        SessionConfig::default(),
        LinkConfig::ideal(),
        42,
        controller_clock,
        node_clock,
    )
    .unwrap();

    harness.start().unwrap();
    assert!(harness.run_until_finished(RUN_LIMIT_US));

    let report = harness.alignment_report();
    assert_eq!(report.controller_starts, 12);
    assert_eq!(report.node_starts, 12);
    assert_eq!(report.pairs_matched, 12);
    assert_eq!(report.finger_mismatches, 0);
    assert!(
        report.max_skew_us <= 3_000,
        "max skew {} us",
        report.max_skew_us
    );
}

#[test]
fn test_alignment_survives_latency_and_drift() {
    // Drifting clocks from the default harness plus a laggy channel.
    let link = LinkConfig {
        base_latency_us: 2_000,
        jitter_us: 3_000,
        drop_rate: 0.0,
    };
    let mut harness = SyncHarness::new(SessionConfig::default(), link, 7).unwrap();

    harness.start().unwrap();
    assert!(harness.run_until_finished(RUN_LIMIT_US));

    let report = harness.alignment_report();
    assert_eq!(report.controller_starts, 12);
    assert_eq!(report.node_starts, 12);
    assert_eq!(report.finger_mismatches, 0);
    assert!(
        report.max_skew_us <= 12_000,
        "max skew {} us",
        report.max_skew_us
    );
    assert!(
        report.mean_skew_us <= 8_000.0,
        "mean skew {} us",
        report.mean_skew_us
    );

    // The node pulled its session clock, the controller never does.
    assert!(harness.node().stats().samples_accepted > 0);
    assert!(harness.node().applied_offset_us() != 0.0);
}

#[test]
fn test_echo_loss_tolerated() {
    let mut harness = SyncHarness::new(SessionConfig::default(), LinkConfig::ideal(), 99).unwrap();
    harness.start().unwrap();

    // Let the plan and the first exchanges through, then degrade hard.
    harness.run_us(200_000);
    harness.link().set_drop_rate(0.5);

    assert!(harness.run_until_finished(RUN_LIMIT_US));

    let report = harness.alignment_report();
    assert_eq!(report.controller_starts, 12);
    assert_eq!(report.node_starts, 12);
    assert_eq!(report.finger_mismatches, 0);
    assert!(
        report.max_skew_us <= 15_000,
        "max skew {} us",
        report.max_skew_us
    );

    let stats = harness.link().stats();
    assert!(stats.dropped > 0);
    // Neither side starved long enough to declare the link lost.
    assert!(harness.controller().is_link_healthy());
    assert!(harness.node().is_link_healthy());
}

#[test]
fn test_outage_raises_link_lost_on_both_sides() {
    let mut harness = SyncHarness::new(SessionConfig::default(), LinkConfig::ideal(), 3).unwrap();
    harness.start().unwrap();

    // Hand the plan over, then cut the channel completely.
    harness.run_us(200_000);
    harness.link().set_down(true);
    harness.run_us(15_000_000);

    assert!(!harness.controller().is_link_healthy());
    assert!(!harness.node().is_link_healthy());
    assert!(harness
        .events()
        .iter()
        .any(|e| e.role == Role::Controller && e.event == SessionEvent::LinkLost));
    assert!(harness
        .events()
        .iter()
        .any(|e| e.role == Role::Node && e.event == SessionEvent::LinkLost));
    assert!(harness.controller().stats().send_failures > 0);

    // Playback is local; the outage must not stop either sequence.
    assert_eq!(harness.controller().state(), SessionState::Finished);
    assert_eq!(harness.node().state(), SessionState::Finished);
    let report = harness.alignment_report();
    assert_eq!(report.controller_starts, 12);
    assert_eq!(report.node_starts, 12);
}
