//! Long-polling update loop.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Instrument};

use crate::error::BotResult;
use crate::handlers::BotContext;
use crate::logging::update_span;
use crate::telegram::{TelegramClient, Update};

/// Updates handled, labelled by kind and outcome.
const UPDATES_TOTAL: &str = "clip_updates_total";

/// Pause after a failed poll.
const POLL_BACKOFF: Duration = Duration::from_secs(5);
/// How long in-flight updates may finish after shutdown is requested.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Pulls updates and hands each one to its own task.
///
/// Updates are independent: a slow render or a failed handler never blocks
/// or aborts another update.
pub struct Dispatcher {
    client: Arc<TelegramClient>,
    ctx: Arc<BotContext>,
    poll_timeout: Duration,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl Dispatcher {
    pub fn new(client: Arc<TelegramClient>, ctx: Arc<BotContext>, poll_timeout: Duration) -> Self {
        let (shutdown, _) = tokio::sync::watch::channel(false);
        Self {
            client,
            ctx,
            poll_timeout,
            shutdown,
        }
    }

    /// Poll until shutdown is signalled, then drain in-flight updates.
    pub async fn run(&self) -> BotResult<()> {
        info!("Starting update loop");

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut in_flight = JoinSet::new();
        let mut offset: Option<i64> = None;

        loop {
            tokio::select! {
                _ = shutdown_rx.wait_for(|stop| *stop) => {
                    info!("Shutdown signal received, stopping update loop");
                    break;
                }
                result = self.client.get_updates(offset, self.poll_timeout) => {
                    match result {
                        Ok(updates) => {
                            if let Some(last) = updates.last() {
                                offset = Some(last.update_id + 1);
                            }
                            for update in updates {
                                self.spawn_update(&mut in_flight, update);
                            }
                        }
                        Err(e) => {
                            warn!("Failed to fetch updates: {}", e);
                            tokio::time::sleep(POLL_BACKOFF).await;
                        }
                    }
                }
            }

            // Reap finished tasks so the set does not grow without bound.
            while in_flight.try_join_next().is_some() {}
        }

        info!("Waiting for {} in-flight updates...", in_flight.len());
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("In-flight updates did not finish in time, aborting them");
            in_flight.abort_all();
        }

        info!("Update loop stopped");
        Ok(())
    }

    /// Signal shutdown. Takes effect even if `run` has not started yet.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn spawn_update(&self, in_flight: &mut JoinSet<()>, update: Update) {
        let ctx = Arc::clone(&self.ctx);
        let kind = update.kind();
        let span = update_span(update.update_id, kind);
        in_flight.spawn(
            async move {
                debug!("Handling update");
                let outcome = match ctx.handle_update(update).await {
                    Ok(()) => "ok",
                    Err(e) if e.is_user_facing() => {
                        warn!("Update failed: {}", e);
                        "rejected"
                    }
                    Err(e) => {
                        error!("Update failed: {}", e);
                        "error"
                    }
                };
                counter!(UPDATES_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
            }
            .instrument(span),
        );
    }
}
