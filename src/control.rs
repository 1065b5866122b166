// Control plane: admission control for source quotes
//
// Bounds the number of quote calls in flight across all requests and,
// optionally, the number of quote calls started per second.
//
// Numan Thabit 2025 Nov

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

#[derive(Clone)]
pub struct AdmissionControl {
    max_inflight: Arc<Semaphore>,
    // Allows up to rate_per_sec admissions within a 1s sliding window
    limiter: Option<Arc<Mutex<RateLimiter>>>,
}

struct RateLimiter {
    rate_per_sec: u32,
    timestamps: VecDeque<Instant>,
    window: Duration,
}

impl RateLimiter {
    /// Record an admission if the window has room.
    fn try_admit(&mut self, now: Instant) -> bool {
        while let Some(front) = self.timestamps.front() {
            if now.duration_since(*front) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        if (self.timestamps.len() as u32) < self.rate_per_sec {
            self.timestamps.push_back(now);
            true
        } else {
            false
        }
    }
}

impl AdmissionControl {
    pub fn new(max_inflight: usize, rate_per_sec: Option<u32>) -> Self {
        let limiter = rate_per_sec.filter(|r| *r > 0).map(|rate_per_sec| {
            Arc::new(Mutex::new(RateLimiter {
                rate_per_sec,
                timestamps: VecDeque::with_capacity(rate_per_sec.min(4096) as usize),
                window: Duration::from_secs(1),
            }))
        });
        Self {
            max_inflight: Arc::new(Semaphore::new(max_inflight.max(1))),
            limiter,
        }
    }

    /// Number of quote calls that may start right now.
    pub fn available(&self) -> usize {
        self.max_inflight.available_permits()
    }

    /// Acquire an admission permit respecting max inflight and rate limit.
    pub async fn acquire(&self) -> Result<AdmissionPermit> {
        if let Some(limiter) = &self.limiter {
            loop {
                if limiter.lock().await.try_admit(Instant::now()) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
        let permit = self
            .max_inflight
            .clone()
            .acquire_owned()
            .await
            .context("admission semaphore closed")?;
        Ok(AdmissionPermit { _permit: permit })
    }
}

impl Default for AdmissionControl {
    fn default() -> Self {
        Self::new(64, None)
    }
}

pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}
