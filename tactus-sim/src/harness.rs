//! Two-device simulation harness
//!
//! [`SyncHarness`] runs one [`ControllerSession`] and one [`NodeSession`]
//! against drifting clocks and a simulated link, stepping both at the
//! firmware loop cadence of 1 kHz. Pulse edges land in per-device
//! [`RecordingBank`]s stamped with shared simulation time, so the harness
//! can measure how far apart the two devices actually fired.

use thiserror::Error;

use tactus_core::config::{ConfigError, SessionConfig};
use tactus_core::session::{ControllerSession, NodeSession, SessionEvent, SessionState};

use crate::actuators::RecordingBank;
use crate::clock::DriftingClock;
use crate::link::{LinkConfig, LinkEndpoint, LinkError, SimLink};

/// Length of one simulation step, matching the firmware control loop
const TICK_INTERVAL_US: u64 = 1_000;

/// Failure starting or configuring a simulation
#[derive(Debug, Error)]
pub enum SimError {
    /// Session configuration failed validation
    #[error("invalid session configuration: {0:?}")]
    Config(#[from] ConfigError),
    /// The simulated link refused a record
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Which device raised an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Controller,
    Node,
}

/// A session event stamped with simulation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    /// Simulation time the event was drained (us)
    pub sim_us: u64,
    /// Device that raised it
    pub role: Role,
    pub event: SessionEvent,
}

/// Cross-device pulse alignment, pairing the i-th start on each device
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlignmentReport {
    /// Pulse starts logged by the controller
    pub controller_starts: usize,
    /// Pulse starts logged by the node
    pub node_starts: usize,
    /// Start pairs compared
    pub pairs_matched: usize,
    /// Pairs that drove different fingers
    pub finger_mismatches: usize,
    /// Largest start-to-start skew seen (us)
    pub max_skew_us: u64,
    /// Mean start-to-start skew (us)
    pub mean_skew_us: f64,
}

/// One controller and one node on a shared simulated channel.
pub struct SyncHarness {
    controller: ControllerSession,
    node: NodeSession,
    controller_clock: DriftingClock,
    node_clock: DriftingClock,
    link: SimLink,
    controller_link: LinkEndpoint,
    node_link: LinkEndpoint,
    controller_bank: RecordingBank,
    node_bank: RecordingBank,
    events: Vec<TimedEvent>,
    seed: u64,
    sim_now_us: u64,
}

impl SyncHarness {
    /// Harness with mildly imperfect hardware: the controller crystal runs
    /// fast, the node crystal slow, and the two clocks power on with
    /// unrelated readings.
    pub fn new(config: SessionConfig, link_config: LinkConfig, seed: u64) -> Result<Self, SimError> {
        let controller_clock = DriftingClock::fast(250_000, seed ^ 0xC1);
        let node_clock = DriftingClock::slow(9_000_000, seed ^ 0x0D);
        Self::with_clocks(config, link_config, seed, controller_clock, node_clock)
    }

    /// Harness with caller-chosen clocks
    pub fn with_clocks(
        config: SessionConfig,
        link_config: LinkConfig,
        seed: u64,
        controller_clock: DriftingClock,
        node_clock: DriftingClock,
    ) -> Result<Self, SimError> {
        let link = SimLink::new(link_config, seed ^ 0x715);
        let controller_link = link.endpoint_a();
        let node_link = link.endpoint_b();
        Ok(Self {
            controller: ControllerSession::new(config)?,
            node: NodeSession::new(config.sync)?,
            controller_clock,
            node_clock,
            link,
            controller_link,
            node_link,
            controller_bank: RecordingBank::new(),
            node_bank: RecordingBank::new(),
            events: Vec::new(),
            seed,
            sim_now_us: 0,
        })
    }

    /// Generate the plan from the harness seed and transmit it
    pub fn start(&mut self) -> Result<(), SimError> {
        self.controller.start_session(
            self.seed,
            self.controller_clock.now_us(),
            &mut self.controller_link,
        )?;
        Ok(())
    }

    /// Run the simulation forward by `duration_us`
    pub fn run_us(&mut self, duration_us: u64) {
        for _ in 0..duration_us / TICK_INTERVAL_US {
            self.step();
        }
    }

    /// Run until both sessions finish or `max_us` of simulation time
    /// passes. Returns whether both finished.
    pub fn run_until_finished(&mut self, max_us: u64) -> bool {
        while self.sim_now_us < max_us {
            self.step();
            if self.controller.state() == SessionState::Finished
                && self.node.state() == SessionState::Finished
            {
                return true;
            }
        }
        false
    }

    fn step(&mut self) {
        self.sim_now_us += TICK_INTERVAL_US;
        self.controller_clock.advance(TICK_INTERVAL_US);
        self.node_clock.advance(TICK_INTERVAL_US);
        self.link.advance_to(self.sim_now_us);

        self.controller_bank.set_now(self.sim_now_us);
        let now = self.controller_clock.now_us();
        self.controller
            .tick(now, &mut self.controller_link, &mut self.controller_bank);

        self.node_bank.set_now(self.sim_now_us);
        let now = self.node_clock.now_us();
        self.node
            .tick(now, &mut self.node_link, &mut self.node_bank);

        while let Some(event) = self.controller.pop_event() {
            self.events.push(TimedEvent {
                sim_us: self.sim_now_us,
                role: Role::Controller,
                event,
            });
        }
        while let Some(event) = self.node.pop_event() {
            self.events.push(TimedEvent {
                sim_us: self.sim_now_us,
                role: Role::Node,
                event,
            });
        }
    }

    /// Pair pulse starts across the two devices and measure their skew on
    /// the simulation timeline.
    pub fn alignment_report(&self) -> AlignmentReport {
        let controller_starts: Vec<_> = self.controller_bank.pulse_starts().collect();
        let node_starts: Vec<_> = self.node_bank.pulse_starts().collect();

        let mut report = AlignmentReport {
            controller_starts: controller_starts.len(),
            node_starts: node_starts.len(),
            ..AlignmentReport::default()
        };

        let mut skew_sum = 0u64;
        for (c, n) in controller_starts.iter().zip(node_starts.iter()) {
            report.pairs_matched += 1;
            if c.finger != n.finger {
                report.finger_mismatches += 1;
            }
            let skew = c.at_us.abs_diff(n.at_us);
            skew_sum += skew;
            if skew > report.max_skew_us {
                report.max_skew_us = skew;
            }
        }
        if report.pairs_matched > 0 {
            report.mean_skew_us = skew_sum as f64 / report.pairs_matched as f64;
        }
        report
    }

    pub fn controller(&self) -> &ControllerSession {
        &self.controller
    }

    pub fn node(&self) -> &NodeSession {
        &self.node
    }

    pub fn controller_bank(&self) -> &RecordingBank {
        &self.controller_bank
    }

    pub fn node_bank(&self) -> &RecordingBank {
        &self.node_bank
    }

    /// Channel handle, for mid-run quality changes and delivery counters
    pub fn link(&self) -> &SimLink {
        &self.link
    }

    /// Every event both devices raised, in drain order
    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn sim_now_us(&self) -> u64 {
        self.sim_now_us
    }
}
