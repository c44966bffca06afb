//! Node-side session driver

use heapless::Deque;
use tactus_protocol::{EchoRecord, PlanRecord, SyncMessage, MAX_RECORD_SIZE};

use super::events::{push_event, SessionEvent, SessionState, EVENT_QUEUE_DEPTH};
use crate::config::{ConfigError, SyncConfig};
use crate::playback::PulsePlayer;
use crate::sequence::SessionPlan;
use crate::sync::{LinkHealth, OffsetEstimator, RoundTripSample, SyncStats};
use crate::traits::{ActuatorBank, Transport};

/// Drives one session from the node side.
///
/// The node is a responder: it waits for a plan record, arms playback
/// from it, and answers every inbound echo immediately. The instant the
/// plan arrives becomes the node's session epoch; the offset estimator
/// then slews the node's session clock onto the controller's, so both
/// devices cross the delayed start together. Playback runs against the
/// corrected clock, never the raw one.
#[derive(Debug)]
pub struct NodeSession {
    /// Validated sync parameters
    config: SyncConfig,
    /// Lifecycle state
    state: SessionState,
    /// Playback engine for the local actuators
    player: Option<PulsePlayer>,
    /// Correction toward the controller's session clock
    estimator: OffsetEstimator,
    /// Raw clock value at the session epoch (plan arrival)
    epoch_raw_us: Option<u64>,
    /// Controller raw clock stamped into the plan, kept for diagnostics
    controller_send_stamp_us: Option<u64>,
    /// Session time playback begins
    start_at_session_us: u64,
    /// Session stamp of the last outbound echo, t1 of the next sample
    last_sent_session_us: Option<u64>,
    /// Echo silence tracking
    health: LinkHealth,
    /// Exchange counters
    stats: SyncStats,
    /// Pending notifications
    events: Deque<SessionEvent, EVENT_QUEUE_DEPTH>,
}

impl NodeSession {
    /// Create a node driver with validated sync parameters
    pub fn new(config: SyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: SessionState::Idle,
            player: None,
            estimator: OffsetEstimator::new(&config),
            epoch_raw_us: None,
            controller_send_stamp_us: None,
            start_at_session_us: 0,
            last_sent_session_us: None,
            health: LinkHealth::new(config.echo_timeout_ms),
            stats: SyncStats::default(),
            events: Deque::new(),
        })
    }

    /// Run one control cycle at raw clock `now_us`.
    ///
    /// Drains the transport (arming a session if a plan arrives), smooths
    /// the clock correction, and advances playback on the corrected
    /// session clock, applying at most one actuator edge per call.
    pub fn tick<L: Transport, A: ActuatorBank>(
        &mut self,
        now_us: u64,
        link: &mut L,
        actuators: &mut A,
    ) {
        self.drain_link(now_us, link);

        let epoch = match self.epoch_raw_us {
            Some(epoch) => epoch,
            None => return,
        };
        let session_now = now_us.saturating_sub(epoch);

        self.update_health(session_now);
        self.estimator.tick();
        self.advance_playback(session_now, actuators);
    }

    /// Stop the session and silence the actuators.
    ///
    /// The node returns to idle and waits for the next plan record.
    pub fn abort<A: ActuatorBank>(&mut self, actuators: &mut A) {
        actuators.all_off();
        self.state = SessionState::Idle;
        self.player = None;
        self.epoch_raw_us = None;
        self.controller_send_stamp_us = None;
        self.last_sent_session_us = None;
        self.estimator.reset();
        self.events.clear();
    }

    /// Lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Exchange counters for the current session
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Correction currently applied to the session clock (us)
    pub fn applied_offset_us(&self) -> f32 {
        self.estimator.applied_us()
    }

    /// Whether the controller has echoed recently enough
    pub fn is_link_healthy(&self) -> bool {
        self.health.is_link_healthy()
    }

    /// Take the oldest pending notification
    pub fn pop_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// Playback engine, present once a plan has been applied
    pub fn player(&self) -> Option<&PulsePlayer> {
        self.player.as_ref()
    }

    /// Controller raw clock at plan transmit, from the plan record
    pub fn controller_send_stamp_us(&self) -> Option<u64> {
        self.controller_send_stamp_us
    }

    fn drain_link<L: Transport>(&mut self, now_us: u64, link: &mut L) {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        while let Some(len) = link.poll_received(&mut buf) {
            match SyncMessage::parse(&buf[..len]) {
                Ok(SyncMessage::Plan(plan)) => self.apply_plan(now_us, &plan, link),
                Ok(SyncMessage::Echo(echo)) => self.handle_echo(now_us, echo, link),
                // Malformed records are wire noise
                Err(_) => {}
            }
        }
    }

    /// Arm a session from a received plan. A plan received mid-session
    /// restarts everything, epoch included.
    fn apply_plan<L: Transport>(&mut self, now_us: u64, record: &PlanRecord, link: &mut L) {
        let plan = SessionPlan::from_record(record);
        let start_at_us = record.start_delay_us as u64;

        self.epoch_raw_us = Some(now_us);
        self.controller_send_stamp_us = Some(record.t_send_us);
        self.start_at_session_us = start_at_us;
        self.player = Some(PulsePlayer::new(plan, start_at_us));
        self.estimator.reset();
        self.health = LinkHealth::new(self.config.echo_timeout_ms);
        self.stats = SyncStats::default();
        self.state = SessionState::Armed;
        self.last_sent_session_us = None;
        self.events.clear();
        push_event(&mut self.events, SessionEvent::PlanApplied { start_at_us });

        // Answer right away so the controller gets its first sample
        self.send_echo(0, link);
    }

    fn handle_echo<L: Transport>(&mut self, now_us: u64, echo: EchoRecord, link: &mut L) {
        // An echo with no session to attach it to is ignored
        let epoch = match self.epoch_raw_us {
            Some(epoch) => epoch,
            None => return,
        };
        let session_now = now_us.saturating_sub(epoch);

        self.health.echo_received(session_now);

        if let Some(t1) = self.last_sent_session_us {
            let sample = RoundTripSample::from_exchange(
                t1,
                echo.recv_session_us,
                echo.send_session_us,
                session_now,
            );
            if sample.is_plausible(self.config.max_rtt_us) {
                self.estimator.push_sample(sample.offset_us);
                self.stats.record_accepted(&sample);
            } else {
                self.stats.record_rejected();
            }
        }

        self.send_echo(session_now, link);
    }

    fn send_echo<L: Transport>(&mut self, session_now: u64, link: &mut L) {
        let echo = EchoRecord {
            recv_session_us: session_now,
            send_session_us: session_now,
        };
        match link.send(&echo.encode_bytes()) {
            Ok(()) => {
                self.stats.record_sent();
                self.last_sent_session_us = Some(session_now);
            }
            Err(_) => self.stats.record_send_failure(),
        }
    }

    fn update_health(&mut self, session_now: u64) {
        let was_healthy = self.health.is_link_healthy();
        self.health.update(session_now);
        if was_healthy && !self.health.is_link_healthy() {
            push_event(&mut self.events, SessionEvent::LinkLost);
        }
    }

    fn advance_playback<A: ActuatorBank>(&mut self, session_now: u64, actuators: &mut A) {
        let corrected_now = self.estimator.corrected_now(session_now);

        if self.state == SessionState::Armed && corrected_now >= self.start_at_session_us {
            self.state = SessionState::Running;
            push_event(&mut self.events, SessionEvent::Started);
        }

        let player = match self.player.as_mut() {
            Some(player) => player,
            None => return,
        };

        if let Some(cmd) = player.update(corrected_now) {
            actuators.set_actuator(cmd.finger, cmd.frequency_hz, cmd.enabled);
            let event = if cmd.enabled {
                SessionEvent::PulseStarted { finger: cmd.finger }
            } else {
                SessionEvent::PulseEnded { finger: cmd.finger }
            };
            push_event(&mut self.events, event);
        }

        if self.state == SessionState::Running && player.is_finished() {
            self.state = SessionState::Finished;
            actuators.all_off();
            push_event(&mut self.events, SessionEvent::SessionFinished);
        }
    }
}
