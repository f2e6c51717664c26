//! Single-writer actor for distribution updates
//!
//! Every `record_distribution` call is a read-merge-write over the whole
//! record collection. Running all of them on one task makes the sequence
//! atomic with respect to other writers: no write can be computed from a
//! snapshot another write has already replaced.
//!
//! ```text
//!   LedgerHandle (Clone) ──► mpsc (bounded) ──► LedgerActor (one task)
//!                                                  │ load_all
//!                                                  │ merge
//!                                                  ▼ save_all (temp + rename)
//!                                              RecordStore
//! ```
//!
//! Each command carries a deadline that bounds how long a caller waits for
//! the writer. A command that cannot enter the mailbox, or that the actor
//! has not started by its deadline, fails with [`Error::Busy`] without
//! touching the store. The actor acknowledges a command before starting
//! it; a caller that has given up closes that channel, so the actor skips
//! the command instead of applying a write nobody is told about. A command
//! the actor has started always runs to completion and its caller gets
//! the real outcome.

use crate::ledger::apply_distribution;
use crate::metrics::Metrics;
use crate::store::RecordStore;
use crate::types::{DistributionReceipt, DistributionRequest, TicketCode};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Merge a distribution into a record
    RecordDistribution {
        ticket_code: TicketCode,
        request: DistributionRequest,
        deadline: Instant,
        started: oneshot::Sender<()>,
        response: oneshot::Sender<Result<DistributionReceipt>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns all writes to the store
pub struct LedgerActor {
    /// Storage backend
    store: Arc<dyn RecordStore>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    metrics: Metrics,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        store: Arc<dyn RecordStore>,
        mailbox: mpsc::Receiver<LedgerMessage>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::RecordDistribution {
                    ticket_code,
                    request,
                    deadline,
                    started,
                    response,
                } => {
                    if Instant::now() > deadline {
                        tracing::warn!(ticket_code = %ticket_code, "Write expired in mailbox");
                        let _ = response.send(Err(Error::Busy(
                            "write waited longer than the configured timeout".to_string(),
                        )));
                        continue;
                    }

                    if started.send(()).is_err() {
                        tracing::debug!(ticket_code = %ticket_code, "Caller gave up, write skipped");
                        continue;
                    }

                    let result = self.handle_distribution(ticket_code, request);
                    let _ = response.send(result);
                }
                LedgerMessage::Shutdown => {
                    tracing::info!("Ledger actor shutting down");
                    break;
                }
            }
        }
    }

    fn handle_distribution(
        &self,
        ticket_code: TicketCode,
        request: DistributionRequest,
    ) -> Result<DistributionReceipt> {
        let started = std::time::Instant::now();
        let result = apply_distribution(self.store.as_ref(), &ticket_code, &request);

        match &result {
            Ok(receipt) => {
                self.metrics
                    .record_distribution(started.elapsed().as_secs_f64());
                tracing::info!(
                    ticket_code = %ticket_code,
                    applied = ?receipt.applied,
                    "Distribution recorded"
                );
            }
            Err(Error::NoOpUpdate(reason)) => {
                self.metrics.noop_updates.inc();
                tracing::info!(ticket_code = %ticket_code, %reason, "Distribution had no effect");
            }
            Err(e) => {
                tracing::error!(ticket_code = %ticket_code, "Distribution failed: {}", e);
            }
        }

        result
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
    write_timeout: Duration,
    metrics: Metrics,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>, write_timeout: Duration, metrics: Metrics) -> Self {
        Self {
            sender,
            write_timeout,
            metrics,
        }
    }

    /// Queue a distribution and wait for its outcome.
    ///
    /// Returns [`Error::Busy`] once `write_timeout` has passed without the
    /// writer starting the command.
    pub async fn record_distribution(
        &self,
        ticket_code: TicketCode,
        request: DistributionRequest,
    ) -> Result<DistributionReceipt> {
        let result = self.submit(ticket_code, request).await;
        if matches!(result, Err(Error::Busy(_))) {
            self.metrics.busy_rejections.inc();
        }
        result
    }

    async fn submit(
        &self,
        ticket_code: TicketCode,
        request: DistributionRequest,
    ) -> Result<DistributionReceipt> {
        let (started_tx, mut started_rx) = oneshot::channel();
        let (tx, rx) = oneshot::channel();
        let deadline = Instant::now() + self.write_timeout;

        let msg = LedgerMessage::RecordDistribution {
            ticket_code,
            request,
            deadline,
            started: started_tx,
            response: tx,
        };

        match self.sender.send_timeout(msg, self.write_timeout).await {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                return Err(Error::Busy("writer mailbox is full".to_string()));
            }
            Err(SendTimeoutError::Closed(_)) => {
                return Err(Error::Concurrency("Actor mailbox closed".to_string()));
            }
        }

        match tokio::time::timeout_at(deadline, &mut started_rx).await {
            // Started, or declined with the reason on the response channel
            Ok(_) => {}
            Err(_) => {
                // Closing first means the actor either started before this
                // point or will never start
                started_rx.close();
                if started_rx.try_recv().is_err() {
                    return Err(Error::Busy(
                        "write waited longer than the configured timeout".to_string(),
                    ));
                }
            }
        }

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor on the current Tokio runtime
pub fn spawn_ledger_actor(
    store: Arc<dyn RecordStore>,
    mailbox_capacity: usize,
    write_timeout: Duration,
    metrics: Metrics,
) -> Result<LedgerHandle> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| Error::Concurrency(format!("No Tokio runtime for the ledger actor: {}", e)))?;

    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = LedgerActor::new(store, rx, metrics.clone());

    runtime.spawn(async move {
        actor.run().await;
    });

    Ok(LedgerHandle::new(tx, write_timeout, metrics))
}
