//! Chaotic store wrapper for fault injection testing.
//!
//! Delegates to an underlying store but randomly fails operations at a
//! configured rate, to verify that store failures surface to callers and
//! are never reported as success.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex};

use gridlock_core::{Invite, InviteId, PlayerProfile, Session, SessionId};

use super::{Store, StoreError};

/// Store wrapper that randomly injects failures.
///
/// Uses `Arc<Mutex<_>>` for the RNG state, making it `Clone` and
/// thread-safe. The same seed always produces the same failure pattern, so
/// chaos tests are reproducible.
#[derive(Clone)]
pub struct ChaoticStore<S: Store> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail).
    failure_rate: f64,
    /// RNG state for deterministic chaos.
    rng: Arc<Mutex<ChaoticRng>>,
    /// Operation counter.
    operation_count: Arc<Mutex<usize>>,
}

/// Simple deterministic RNG for chaos injection.
///
/// Linear congruential generator: fast, deterministic, good enough for
/// failure injection.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate next random value in `[0.0, 1.0)`.
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S: Store> ChaoticStore<S> {
    /// Create a chaotic wrapper with a default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in `[0.0, 1.0]`.
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with an explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in `[0.0, 1.0]`.
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying store (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of store operations attempted.
    pub fn operation_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        *self.operation_count.lock().expect("operation_count mutex poisoned")
    }

    fn begin_operation(&self) -> Result<(), StoreError> {
        {
            #[allow(clippy::expect_used)]
            let mut count = self.operation_count.lock().expect("operation_count mutex poisoned");
            *count += 1;
        }

        #[allow(clippy::expect_used)]
        let mut rng = self.rng.lock().expect("ChaoticRng mutex poisoned");
        if rng.should_fail(self.failure_rate) {
            return Err(StoreError::Io("chaotic failure injection".to_owned()));
        }
        Ok(())
    }
}

impl<S: Store> Store for ChaoticStore<S> {
    fn load_session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        self.begin_operation()?;
        self.inner.load_session(id)
    }

    fn put_session(&self, session: &Session) -> Result<(), StoreError> {
        self.begin_operation()?;
        self.inner.put_session(session)
    }

    fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        self.begin_operation()?;
        self.inner.list_sessions()
    }

    fn load_invite(&self, id: InviteId) -> Result<Option<Invite>, StoreError> {
        self.begin_operation()?;
        self.inner.load_invite(id)
    }

    fn put_invite(&self, invite: &Invite) -> Result<(), StoreError> {
        self.begin_operation()?;
        self.inner.put_invite(invite)
    }

    fn list_invites(&self) -> Result<Vec<Invite>, StoreError> {
        self.begin_operation()?;
        self.inner.list_invites()
    }

    fn load_player(&self, id: &str) -> Result<Option<PlayerProfile>, StoreError> {
        self.begin_operation()?;
        self.inner.load_player(id)
    }

    fn put_player(&self, profile: &PlayerProfile) -> Result<(), StoreError> {
        self.begin_operation()?;
        self.inner.put_player(profile)
    }

    fn list_players(&self) -> Result<Vec<PlayerProfile>, StoreError> {
        self.begin_operation()?;
        self.inner.list_players()
    }
}
