//! Controller-side session driver

use heapless::Deque;
use tactus_protocol::{EchoRecord, SyncMessage, MAX_RECORD_SIZE};

use super::events::{push_event, SessionEvent, SessionState, EVENT_QUEUE_DEPTH};
use crate::config::{ConfigError, SessionConfig};
use crate::playback::PulsePlayer;
use crate::sequence::SessionPlan;
use crate::sync::{LinkHealth, RoundTripSample, SyncStats};
use crate::traits::{ActuatorBank, Transport};

/// Drives one session from the controller side.
///
/// The controller owns the session: it generates the plan, transmits it
/// with a delayed start, then plays the same plan against its own
/// actuators. While the session runs it sends an echo record at a fixed
/// cadence and folds the node's replies into link statistics. The
/// controller never corrects its own clock; the instant it sent the plan
/// is the session epoch both devices converge on.
#[derive(Debug)]
pub struct ControllerSession {
    /// Validated session parameters
    config: SessionConfig,
    /// Lifecycle state
    state: SessionState,
    /// Playback engine for the local actuators
    player: Option<PulsePlayer>,
    /// Raw clock value at the session epoch (plan transmit)
    epoch_raw_us: Option<u64>,
    /// Session stamp of the last outbound record, t1 of the next sample
    last_sent_session_us: Option<u64>,
    /// Session stamp of the last inbound record, reported back as t2
    last_recv_session_us: u64,
    /// Session time the next periodic echo is due
    next_echo_at_us: u64,
    /// Echo silence tracking
    health: LinkHealth,
    /// Exchange counters
    stats: SyncStats,
    /// Pending notifications
    events: Deque<SessionEvent, EVENT_QUEUE_DEPTH>,
}

impl ControllerSession {
    /// Create a controller driver with a validated configuration
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: SessionState::Idle,
            player: None,
            epoch_raw_us: None,
            last_sent_session_us: None,
            last_recv_session_us: 0,
            next_echo_at_us: 0,
            health: LinkHealth::new(config.sync.echo_timeout_ms),
            stats: SyncStats::default(),
            events: Deque::new(),
        })
    }

    /// Generate a plan from `seed` and send it, arming local playback.
    ///
    /// `now_us` becomes the session epoch; playback begins when the
    /// configured start delay has elapsed on the session clock. On a
    /// transport error nothing is armed and the session stays idle.
    pub fn start_session<L: Transport>(
        &mut self,
        seed: u64,
        now_us: u64,
        link: &mut L,
    ) -> Result<(), L::Error> {
        let plan = SessionPlan::generate(seed, &self.config.sequence);
        let record = plan.to_record(now_us, self.config.start_delay_us);

        self.stats = SyncStats::default();
        if let Err(err) = link.send(&record.encode_bytes()) {
            self.stats.record_send_failure();
            return Err(err);
        }

        self.epoch_raw_us = Some(now_us);
        self.player = Some(PulsePlayer::new(plan, self.config.start_delay_us as u64));
        self.state = SessionState::Armed;
        // The plan doubles as the first outbound sync record
        self.last_sent_session_us = Some(0);
        self.last_recv_session_us = 0;
        self.next_echo_at_us = self.config.sync.echo_interval_ms as u64 * 1000;
        self.health = LinkHealth::new(self.config.sync.echo_timeout_ms);
        self.events.clear();
        push_event(&mut self.events, SessionEvent::PlanSent);
        Ok(())
    }

    /// Run one control cycle at raw clock `now_us`.
    ///
    /// Drains the transport, keeps the echo cadence, and advances
    /// playback, applying at most one actuator edge per call.
    pub fn tick<L: Transport, A: ActuatorBank>(
        &mut self,
        now_us: u64,
        link: &mut L,
        actuators: &mut A,
    ) {
        let epoch = match self.epoch_raw_us {
            Some(epoch) => epoch,
            None => return,
        };
        let session_now = now_us.saturating_sub(epoch);

        self.drain_link(session_now, link);
        self.update_health(session_now);
        self.send_periodic_echo(session_now, link);
        self.advance_playback(session_now, actuators);
    }

    /// Stop the session and silence the actuators
    pub fn abort<A: ActuatorBank>(&mut self, actuators: &mut A) {
        actuators.all_off();
        self.state = SessionState::Idle;
        self.player = None;
        self.epoch_raw_us = None;
        self.last_sent_session_us = None;
        self.last_recv_session_us = 0;
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

    /// Whether the node has echoed recently enough
    pub fn is_link_healthy(&self) -> bool {
        self.health.is_link_healthy()
    }

    /// Take the oldest pending notification
    pub fn pop_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// Playback engine, present once a session has started
    pub fn player(&self) -> Option<&PulsePlayer> {
        self.player.as_ref()
    }

    fn drain_link<L: Transport>(&mut self, session_now: u64, link: &mut L) {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        while let Some(len) = link.poll_received(&mut buf) {
            match SyncMessage::parse(&buf[..len]) {
                Ok(SyncMessage::Echo(echo)) => self.handle_echo(session_now, echo),
                // Only nodes accept plans; malformed records are wire noise
                Ok(SyncMessage::Plan(_)) | Err(_) => {}
            }
        }
    }

    fn handle_echo(&mut self, session_now: u64, echo: EchoRecord) {
        self.health.echo_received(session_now);
        self.last_recv_session_us = session_now;

        if let Some(t1) = self.last_sent_session_us {
            let sample = RoundTripSample::from_exchange(
                t1,
                echo.recv_session_us,
                echo.send_session_us,
                session_now,
            );
            if sample.is_plausible(self.config.sync.max_rtt_us) {
                self.stats.record_accepted(&sample);
            } else {
                self.stats.record_rejected();
            }
        }
    }

    fn update_health(&mut self, session_now: u64) {
        let was_healthy = self.health.is_link_healthy();
        self.health.update(session_now);
        if was_healthy && !self.health.is_link_healthy() {
            push_event(&mut self.events, SessionEvent::LinkLost);
        }
    }

    fn send_periodic_echo<L: Transport>(&mut self, session_now: u64, link: &mut L) {
        if session_now < self.next_echo_at_us {
            return;
        }
        let echo = EchoRecord {
            recv_session_us: self.last_recv_session_us,
            send_session_us: session_now,
        };
        match link.send(&echo.encode_bytes()) {
            Ok(()) => {
                self.stats.record_sent();
                self.last_sent_session_us = Some(session_now);
            }
            Err(_) => self.stats.record_send_failure(),
        }
        self.next_echo_at_us = session_now + self.config.sync.echo_interval_ms as u64 * 1000;
    }

    fn advance_playback<A: ActuatorBank>(&mut self, session_now: u64, actuators: &mut A) {
        if self.state == SessionState::Armed
            && session_now >= self.config.start_delay_us as u64
        {
            self.state = SessionState::Running;
            push_event(&mut self.events, SessionEvent::Started);
        }

        let player = match self.player.as_mut() {
            Some(player) => player,
            None => return,
        };

        if let Some(cmd) = player.update(session_now) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NUM_FINGERS;
    use heapless::Vec;
    use tactus_protocol::PlanRecord;

    struct TestLink {
        rx: Deque<Vec<u8, MAX_RECORD_SIZE>, 16>,
        tx: Deque<Vec<u8, MAX_RECORD_SIZE>, 16>,
        fail_sends: bool,
    }

    #[derive(Debug, PartialEq)]
    struct SendRefused;

    impl TestLink {
        fn new() -> Self {
            Self {
                rx: Deque::new(),
                tx: Deque::new(),
                fail_sends: false,
            }
        }

        fn inject(&mut self, bytes: &[u8]) {
            let mut rec = Vec::new();
            let _ = rec.extend_from_slice(bytes);
            let _ = self.rx.push_back(rec);
        }

        fn take_sent(&mut self) -> Option<Vec<u8, MAX_RECORD_SIZE>> {
            self.tx.pop_front()
        }
    }

    impl Transport for TestLink {
        type Error = SendRefused;

        fn send(&mut self, record: &[u8]) -> Result<(), SendRefused> {
            if self.fail_sends {
                return Err(SendRefused);
            }
            let mut rec = Vec::new();
            let _ = rec.extend_from_slice(record);
            let _ = self.tx.push_back(rec);
            Ok(())
        }

        fn poll_received(&mut self, buf: &mut [u8]) -> Option<usize> {
            let rec = self.rx.pop_front()?;
            buf[..rec.len()].copy_from_slice(&rec);
            Some(rec.len())
        }
    }

    struct TestBank {
        on: [bool; NUM_FINGERS],
        set_calls: u32,
    }

    impl TestBank {
        fn new() -> Self {
            Self {
                on: [false; NUM_FINGERS],
                set_calls: 0,
            }
        }

        fn any_on(&self) -> bool {
            self.on.iter().any(|&on| on)
        }
    }

    impl ActuatorBank for TestBank {
        fn set_actuator(&mut self, finger: u8, _frequency_hz: f32, enabled: bool) {
            self.on[finger as usize] = enabled;
            self.set_calls += 1;
        }
    }

    fn started_controller(link: &mut TestLink) -> ControllerSession {
        let mut session = ControllerSession::new(SessionConfig::default()).unwrap();
        session.start_session(42, 0, link).unwrap();
        session
    }

    #[test]
    fn test_start_sends_plan_and_arms() {
        let mut link = TestLink::new();
        let mut session = ControllerSession::new(SessionConfig::default()).unwrap();
        assert_eq!(session.state(), SessionState::Idle);

        session.start_session(42, 5_000, &mut link).unwrap();
        assert_eq!(session.state(), SessionState::Armed);
        assert_eq!(session.pop_event(), Some(SessionEvent::PlanSent));

        let sent = link.take_sent().unwrap();
        let record = PlanRecord::parse(&sent).unwrap();
        assert_eq!(record.t_send_us, 5_000);
        assert_eq!(record.start_delay_us, 1_000_000);

        // The record carries the same plan the controller will play
        let expected = SessionPlan::generate(42, &SessionConfig::default().sequence);
        assert_eq!(SessionPlan::from_record(&record), expected);
    }

    #[test]
    fn test_idle_tick_is_a_no_op() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = ControllerSession::new(SessionConfig::default()).unwrap();

        session.tick(1_000_000, &mut link, &mut bank);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(bank.set_calls, 0);
        assert!(link.take_sent().is_none());
    }

    #[test]
    fn test_failed_plan_send_stays_idle() {
        let mut link = TestLink::new();
        link.fail_sends = true;
        let mut session = ControllerSession::new(SessionConfig::default()).unwrap();

        assert_eq!(session.start_session(42, 0, &mut link), Err(SendRefused));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.stats().send_failures, 1);
    }

    #[test]
    fn test_playback_waits_for_start_delay() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = started_controller(&mut link);

        session.tick(999_999, &mut link, &mut bank);
        assert_eq!(session.state(), SessionState::Armed);

        session.tick(1_000_000, &mut link, &mut bank);
        assert_eq!(session.state(), SessionState::Running);

        let mut saw_started = false;
        while let Some(event) = session.pop_event() {
            if event == SessionEvent::Started {
                saw_started = true;
            }
        }
        assert!(saw_started);
    }

    #[test]
    fn test_full_session_reaches_finished() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = started_controller(&mut link);

        let mut starts = 0;
        let mut stops = 0;
        let mut now = 0u64;
        while session.state() != SessionState::Finished {
            session.tick(now, &mut link, &mut bank);
            while let Some(event) = session.pop_event() {
                match event {
                    SessionEvent::PulseStarted { .. } => starts += 1,
                    SessionEvent::PulseEnded { .. } => stops += 1,
                    _ => {}
                }
            }
            now += 1_000;
            assert!(now < 10_000_000, "session failed to finish");
        }

        assert_eq!(starts, 12);
        assert_eq!(stops, 12);
        assert!(!bank.any_on());
    }

    #[test]
    fn test_echo_cadence_is_periodic() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = started_controller(&mut link);

        for step in 0..=100u64 {
            session.tick(step * 10_000, &mut link, &mut bank);
        }

        // One echo per 100 ms over one second of session time
        assert_eq!(session.stats().echoes_sent, 10);

        let mut echoes = 0;
        while let Some(sent) = link.take_sent() {
            if let Ok(SyncMessage::Echo(echo)) = SyncMessage::parse(&sent) {
                echoes += 1;
                assert_eq!(echo.send_session_us % 100_000, 0);
            }
        }
        assert_eq!(echoes, 10);
    }

    #[test]
    fn test_node_reply_closes_first_exchange() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = started_controller(&mut link);

        // Node answers the plan immediately with a zero-stamped echo
        link.inject(&EchoRecord {
            recv_session_us: 0,
            send_session_us: 0,
        }
        .encode_bytes());
        session.tick(5_000, &mut link, &mut bank);

        let stats = session.stats();
        assert_eq!(stats.samples_accepted, 1);
        assert_eq!(stats.last_rtt_us, 5_000);
        assert_eq!(stats.last_offset_us, 2_500.0);
        assert!(session.is_link_healthy());
    }

    #[test]
    fn test_incoherent_echo_rejected() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = started_controller(&mut link);

        // Send stamp claims more peer processing than the round trip
        link.inject(&EchoRecord {
            recv_session_us: 0,
            send_session_us: 400_000,
        }
        .encode_bytes());
        session.tick(5_000, &mut link, &mut bank);

        let stats = session.stats();
        assert_eq!(stats.samples_accepted, 0);
        assert_eq!(stats.samples_rejected, 1);
    }

    #[test]
    fn test_silent_link_raises_link_lost() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = started_controller(&mut link);

        // Three timeout windows with no echo
        session.tick(3_000_000, &mut link, &mut bank);
        session.tick(6_000_000, &mut link, &mut bank);
        session.tick(9_000_000, &mut link, &mut bank);
        assert!(!session.is_link_healthy());

        let mut saw_link_lost = false;
        while let Some(event) = session.pop_event() {
            if event == SessionEvent::LinkLost {
                saw_link_lost = true;
            }
        }
        assert!(saw_link_lost);
    }

    #[test]
    fn test_echo_send_failures_counted() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = started_controller(&mut link);

        link.fail_sends = true;
        session.tick(100_000, &mut link, &mut bank);
        assert_eq!(session.stats().send_failures, 1);
        assert_eq!(session.stats().echoes_sent, 0);
    }

    #[test]
    fn test_abort_silences_actuators() {
        let mut link = TestLink::new();
        let mut bank = TestBank::new();
        let mut session = started_controller(&mut link);

        // Run until some pulse is active
        let mut now = 1_000_000u64;
        while !bank.any_on() {
            session.tick(now, &mut link, &mut bank);
            now += 1_000;
            assert!(now < 10_000_000, "no pulse ever started");
        }

        session.abort(&mut bank);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!bank.any_on());
        assert!(session.pop_event().is_none());
    }
}
