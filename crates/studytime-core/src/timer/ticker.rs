//! Cancellable periodic tick task.
//!
//! A `Ticker` is started when the timer enters Running and cancelled when it
//! leaves. Each start bumps a generation number carried by every [`Tick`], so
//! ticks already queued when a cancel happens can be told apart and dropped.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            task: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Generation of the most recently started task.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Spawn the periodic task, replacing any running one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, sender: UnboundedSender<Tick>) {
        self.cancel();
        self.generation += 1;
        let tick = Tick {
            generation: self.generation,
        };
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if sender.send(tick).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!(generation = self.generation, "ticker started");
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(generation = self.generation, "ticker cancelled");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
