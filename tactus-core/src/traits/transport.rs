//! Record transport trait

/// Best-effort record channel between the controller and node.
///
/// The transport delivers whole records or nothing: a successful
/// `poll_received` yields exactly one complete record as it was sent.
/// Delivery may drop, duplicate, or reorder records; the session layer is
/// built to tolerate that, so implementations do not retry.
pub trait Transport {
    /// Transport-specific send failure
    type Error: core::fmt::Debug;

    /// Queue one record for transmission
    fn send(&mut self, record: &[u8]) -> Result<(), Self::Error>;

    /// Take the next pending received record, if any.
    ///
    /// Copies the record into `buf` and returns its length. Callers size
    /// `buf` to hold the largest protocol record; a record that does not
    /// fit is dropped by the implementation.
    fn poll_received(&mut self, buf: &mut [u8]) -> Option<usize>;
}
