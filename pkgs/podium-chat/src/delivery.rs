//! Simulated delivery - stands in for a real-time transport by producing
//! canned replies after a delay, with a configurable probability.
//!
//! Both knobs are injectable so tests can force the outcome: a
//! [`FixedRandom`] sample decides whether a reply happens and a zero delay
//! makes it land on the next scheduler tick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

/// Source of uniform samples in `[0, 1)`
pub trait RandomSource: Send {
    fn sample(&mut self) -> f64;
}

/// Entropy-seeded generator for real use
pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn sample(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Always returns the same sample
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Decides whether a reply happens and runs it after the delay
pub struct SimulatedDelivery {
    probability: f64,
    delay: Duration,
    random: Box<dyn RandomSource>,
}

impl SimulatedDelivery {
    pub fn new(probability: f64, delay: Duration, random: Box<dyn RandomSource>) -> Self {
        Self {
            probability,
            delay,
            random,
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Roll once; `p = 1` always replies and `p = 0` never does
    pub fn should_reply(&mut self) -> bool {
        self.random.sample() < self.probability
    }

    /// Run `deliver` after the delay if the roll succeeds.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, deliver: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.should_reply() {
            debug!("Simulated reply skipped");
            return None;
        }

        let delay = self.delay;
        debug!("Simulated reply due in {:?}", delay);
        Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            deliver();
        }))
    }
}

/// A scheduled reply that has not necessarily landed yet
#[derive(Debug)]
pub struct PendingReply {
    pub id: u64,
    pub conversation_id: String,
    handle: JoinHandle<()>,
}

impl PendingReply {
    pub(crate) fn new(id: u64, conversation_id: String, handle: JoinHandle<()>) -> Self {
        Self {
            id,
            conversation_id,
            handle,
        }
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    /// Abort the reply if it has not landed
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the reply task. Returns false if it was cancelled.
    pub async fn wait(self) -> bool {
        self.handle.await.is_ok()
    }
}
