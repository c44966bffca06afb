//! Simulated record link
//!
//! [`SimLink`] models the wireless channel between a controller and a
//! node: every record crosses with a base latency plus uniform jitter, and
//! a configurable fraction never arrives at all. The two [`LinkEndpoint`]
//! halves implement [`Transport`], so the sessions use the simulated link
//! exactly as firmware uses a radio driver.
//!
//! The link runs on simulation time, not on either device clock. The
//! harness calls [`SimLink::advance_to`] once per step; records become
//! visible to `poll_received` when their delivery deadline passes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use tactus_core::traits::Transport;
use tactus_protocol::MAX_RECORD_SIZE;

/// Send failure reported by a [`LinkEndpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    /// Record exceeds the largest frame the link will carry
    #[error("record of {0} bytes exceeds the link MTU")]
    RecordTooLarge(usize),
    /// The link is administratively down
    #[error("link is down")]
    Down,
}

/// Channel quality knobs for a [`SimLink`]
#[derive(Debug, Clone, Copy)]
pub struct LinkConfig {
    /// Fixed one-way latency in microseconds
    pub base_latency_us: u64,
    /// Extra uniform latency in `0..=jitter_us` per record
    pub jitter_us: u64,
    /// Fraction of records lost in transit, 0.0 to 1.0
    pub drop_rate: f64,
}

impl LinkConfig {
    /// Zero latency, zero jitter, zero loss
    pub fn ideal() -> Self {
        Self {
            base_latency_us: 0,
            jitter_us: 0,
            drop_rate: 0.0,
        }
    }

    /// Typical short-range radio: 2 ms base, up to 3 ms jitter, 2% loss
    pub fn wireless() -> Self {
        Self {
            base_latency_us: 2_000,
            jitter_us: 3_000,
            drop_rate: 0.02,
        }
    }

    /// Congested channel: wireless latency with heavy loss
    pub fn lossy() -> Self {
        Self {
            base_latency_us: 2_000,
            jitter_us: 3_000,
            drop_rate: 0.25,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::ideal()
    }
}

/// Delivery counters for one simulated link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Records accepted for transmission
    pub sent: u64,
    /// Records lost in transit
    pub dropped: u64,
    /// Records handed to a receiver
    pub delivered: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

struct Flight {
    deliver_at_us: u64,
    bytes: Vec<u8>,
}

struct Inner {
    now_us: u64,
    down: bool,
    a_to_b: VecDeque<Flight>,
    b_to_a: VecDeque<Flight>,
    config: LinkConfig,
    rng: StdRng,
    stats: LinkStats,
}

impl Inner {
    fn send_from(&mut self, side: Side, record: &[u8]) {
        self.stats.sent += 1;
        if self.config.drop_rate > 0.0 && self.rng.gen::<f64>() < self.config.drop_rate {
            self.stats.dropped += 1;
            return;
        }
        let mut latency = self.config.base_latency_us;
        if self.config.jitter_us > 0 {
            latency += self.rng.gen_range(0..=self.config.jitter_us);
        }
        let flight = Flight {
            deliver_at_us: self.now_us + latency,
            bytes: record.to_vec(),
        };
        match side {
            Side::A => self.a_to_b.push_back(flight),
            Side::B => self.b_to_a.push_back(flight),
        }
    }

    fn poll_to(&mut self, side: Side, buf: &mut [u8]) -> Option<usize> {
        let queue = match side {
            Side::A => &mut self.b_to_a,
            Side::B => &mut self.a_to_b,
        };
        while queue
            .front()
            .map_or(false, |flight| flight.deliver_at_us <= self.now_us)
        {
            let flight = queue.pop_front()?;
            if flight.bytes.len() > buf.len() {
                // Transport contract: records that do not fit are dropped.
                continue;
            }
            buf[..flight.bytes.len()].copy_from_slice(&flight.bytes);
            self.stats.delivered += 1;
            return Some(flight.bytes.len());
        }
        None
    }
}

/// Harness-side handle to a simulated bidirectional link
pub struct SimLink {
    inner: Rc<RefCell<Inner>>,
}

impl SimLink {
    pub fn new(config: LinkConfig, seed: u64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                now_us: 0,
                down: false,
                a_to_b: VecDeque::new(),
                b_to_a: VecDeque::new(),
                config,
                rng: StdRng::seed_from_u64(seed),
                stats: LinkStats::default(),
            })),
        }
    }

    /// Endpoint handed to the controller session
    pub fn endpoint_a(&self) -> LinkEndpoint {
        LinkEndpoint {
            inner: Rc::clone(&self.inner),
            side: Side::A,
        }
    }

    /// Endpoint handed to the node session
    pub fn endpoint_b(&self) -> LinkEndpoint {
        LinkEndpoint {
            inner: Rc::clone(&self.inner),
            side: Side::B,
        }
    }

    /// Move link time forward; records whose deadline has passed become
    /// receivable.
    pub fn advance_to(&self, now_us: u64) {
        let mut inner = self.inner.borrow_mut();
        if now_us > inner.now_us {
            inner.now_us = now_us;
        }
    }

    /// Take the link up or down. Sends fail while down; records already in
    /// flight still arrive.
    pub fn set_down(&self, down: bool) {
        self.inner.borrow_mut().down = down;
    }

    /// Change the loss rate mid-run
    pub fn set_drop_rate(&self, drop_rate: f64) {
        self.inner.borrow_mut().config.drop_rate = drop_rate;
    }

    pub fn stats(&self) -> LinkStats {
        self.inner.borrow().stats
    }
}

/// One directional half of a [`SimLink`], used by a session as its
/// [`Transport`]
pub struct LinkEndpoint {
    inner: Rc<RefCell<Inner>>,
    side: Side,
}

impl Transport for LinkEndpoint {
    type Error = LinkError;

    fn send(&mut self, record: &[u8]) -> Result<(), LinkError> {
        if record.len() > MAX_RECORD_SIZE {
            return Err(LinkError::RecordTooLarge(record.len()));
        }
        let mut inner = self.inner.borrow_mut();
        if inner.down {
            return Err(LinkError::Down);
        }
        inner.send_from(self.side, record);
        Ok(())
    }

    fn poll_received(&mut self, buf: &mut [u8]) -> Option<usize> {
        self.inner.borrow_mut().poll_to(self.side, buf)
    }
}
