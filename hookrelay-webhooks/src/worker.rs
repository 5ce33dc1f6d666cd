//! Polling worker feeding queued events to the dispatcher

use crate::{EventSource, RelayDispatcher, RelayError, Result, WebhookEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Poll interval for checking new events
    pub poll_interval: Duration,

    /// Events claimed per poll
    pub batch_size: usize,

    /// Events being dispatched at once
    pub max_in_flight: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 10,
            max_in_flight: 16,
        }
    }
}

/// Pulls events from an [`EventSource`] and relays each on its own task.
pub struct RelayWorker {
    source: Arc<dyn EventSource>,
    dispatcher: RelayDispatcher,
    config: WorkerConfig,
}

impl RelayWorker {
    pub fn new(source: Arc<dyn EventSource>, dispatcher: RelayDispatcher, config: WorkerConfig) -> Self {
        Self {
            source,
            dispatcher,
            config,
        }
    }

    /// Run until `cancel` fires.
    ///
    /// Dispatch failures are logged and never stop the loop. On cancellation
    /// polling stops and in-flight dispatches, which observe the same token,
    /// are awaited before returning.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        self.run_until(cancel.clone(), cancel).await
    }

    /// Run until the source is drained after `stop` fires, or until `cancel` fires.
    ///
    /// After `stop`, polling continues until a poll comes back empty, then
    /// in-flight dispatches are allowed to finish.
    pub async fn run_until(&self, stop: CancellationToken, cancel: CancellationToken) -> Result<()> {
        let permits = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut tasks = JoinSet::new();
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            target: "hookrelay::worker",
            poll_interval_ms = u64::try_from(self.config.poll_interval.as_millis()).unwrap_or(u64::MAX),
            batch_size = self.config.batch_size,
            max_in_flight = self.config.max_in_flight,
            "Relay worker started"
        );

        'poll: loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                Some(joined) = tasks.join_next() => {
                    log_join(joined);
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let draining = stop.is_cancelled();
            let events = match self.source.poll(self.config.batch_size.max(1)).await {
                Ok(events) => events,
                Err(e) => {
                    warn!(target: "hookrelay::worker", error = %e, "Failed to poll events");
                    if draining {
                        break;
                    }
                    continue;
                }
            };
            if events.is_empty() && draining {
                break;
            }
            if !events.is_empty() {
                debug!(target: "hookrelay::worker", count = events.len(), "Polled events");
            }

            let mut events = events.into_iter();
            while let Some(event) = events.next() {
                let permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        let dropped = 1 + events.len();
                        warn!(
                            target: "hookrelay::worker",
                            dropped,
                            "Cancelled with claimed events not yet dispatched"
                        );
                        break 'poll;
                    }
                    permit = permits.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break 'poll,
                    },
                };

                let dispatcher = self.dispatcher.clone();
                let token = cancel.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    dispatch(&dispatcher, &event, &token).await;
                });
            }
        }

        info!(
            target: "hookrelay::worker",
            in_flight = tasks.len(),
            "Relay worker stopping"
        );
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        info!(target: "hookrelay::worker", "Relay worker stopped");

        Ok(())
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

async fn dispatch(dispatcher: &RelayDispatcher, event: &WebhookEvent, cancel: &CancellationToken) {
    match dispatcher.process_with_cancel(event, cancel).await {
        Ok(()) => {}
        Err(RelayError::Cancelled) => {
            debug!(
                target: "hookrelay::worker",
                event_id = %event.id,
                "Event dispatch cancelled"
            );
        }
        Err(e) => {
            warn!(
                target: "hookrelay::worker",
                event_id = %event.id,
                event = %event.event_name,
                error = %e,
                "Event dispatch failed"
            );
        }
    }
}

fn log_join(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        warn!(target: "hookrelay::worker", error = %e, "Dispatch task panicked");
    }
}
