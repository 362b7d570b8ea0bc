//! Environment abstraction for deterministic testing.
//!
//! Decouples engine logic from system resources (wall clock, randomness).
//! Production code plugs in the real clock and OS entropy; tests plug in
//! fixed clocks and counters so identifiers and timestamps are reproducible.

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `wall_clock_millis()` never goes backwards within one process
/// - `random_bytes()` uses cryptographically secure entropy in production
///   (identifiers handed to clients must not be guessable)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    ///
    /// Used for record timestamps (creation, moves, presence). Monotonicity
    /// across processes is not required; records carry whatever the clock
    /// said when they were written.
    fn wall_clock_millis(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for session, invite, and connection identifiers.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
