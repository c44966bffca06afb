//! Runs one full session over a simulated wireless link and prints the
//! event timeline plus a pulse-alignment summary.

use tactus_core::config::SessionConfig;
use tactus_sim::{LinkConfig, SimError, SyncHarness};

fn main() -> Result<(), SimError> {
    let mut harness = SyncHarness::new(SessionConfig::default(), LinkConfig::wireless(), 0xC0FFEE)?;
    harness.start()?;
    let finished = harness.run_until_finished(20_000_000);

    println!("event timeline:");
    for timed in harness.events() {
        println!(
            "  {:>10} us  {:?}  {:?}",
            timed.sim_us, timed.role, timed.event
        );
    }

    let report = harness.alignment_report();
    let stats = harness.link().stats();
    println!();
    println!("both sessions finished: {finished}");
    println!(
        "pulse starts: controller {} / node {}",
        report.controller_starts, report.node_starts
    );
    println!(
        "start skew over {} pairs: max {} us, mean {:.0} us",
        report.pairs_matched, report.max_skew_us, report.mean_skew_us
    );
    println!(
        "link: {} sent, {} delivered, {} dropped",
        stats.sent, stats.delivered, stats.dropped
    );
    println!(
        "node clock correction: {:.0} us",
        harness.node().applied_offset_us()
    );
    Ok(())
}
