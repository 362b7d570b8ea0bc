//! Production environment: real clock, OS entropy.

use gridlock_core::Environment;

/// Production environment.
///
/// # Panics
///
/// `random_bytes` panics if the OS RNG fails: identifiers handed to clients
/// must not be guessable, and RNG failure indicates OS-level problems no
/// retry will fix. `wall_clock_millis` panics if the system clock reads
/// before the Unix epoch.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn wall_clock_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after the Unix epoch (1970-01-01)")
            .as_millis() as u64
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - identifiers must be random");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reads_a_plausible_time() {
        let env = SystemEnv::new();
        // 2020-01-01 in Unix milliseconds.
        assert!(env.wall_clock_millis() > 1_577_836_800_000);
    }

    #[test]
    fn random_bytes_differ() {
        let env = SystemEnv::new();

        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        env.random_bytes(&mut a);
        env.random_bytes(&mut b);

        assert_ne!(a, b, "random bytes should differ");
    }

    #[test]
    fn random_u64_is_not_constant() {
        let env = SystemEnv::new();
        let values: Vec<u64> = (0..4).map(|_| env.random_u64()).collect();
        assert!(values.windows(2).any(|w| w[0] != w[1]));
    }
}
