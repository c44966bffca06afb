//! Session lifecycle states and notification events

use heapless::Deque;

/// Capacity of each session's pending event queue
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Lifecycle of one stimulation session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No session in progress
    Idle,
    /// Plan exchanged, waiting out the delayed start
    Armed,
    /// Stimulation sequence playing
    Running,
    /// Every period played
    Finished,
}

/// Notification raised by a session for the host or UI layer.
///
/// Events queue up inside the session until drained with `pop_event`;
/// the queue holds [`EVENT_QUEUE_DEPTH`] entries and drops the oldest
/// when it overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEvent {
    /// Plan record handed to the transport
    PlanSent,
    /// Plan record received and playback armed
    PlanApplied {
        /// Session time playback begins (us)
        start_at_us: u64,
    },
    /// Delayed start elapsed, first period underway
    Started,
    /// An actuator was switched on
    PulseStarted { finger: u8 },
    /// An actuator was switched off
    PulseEnded { finger: u8 },
    /// All periods played
    SessionFinished,
    /// Too many echo windows went unanswered
    LinkLost,
}

/// Queue an event, dropping the oldest entry on overflow
pub(crate) fn push_event(
    queue: &mut Deque<SessionEvent, EVENT_QUEUE_DEPTH>,
    event: SessionEvent,
) {
    if queue.is_full() {
        let _ = queue.pop_front();
    }
    let _ = queue.push_back(event);
}
