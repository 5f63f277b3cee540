//! Bounded-concurrency batch creation.
//!
//! A fixed pool of workers drains a shared queue of `(position, command)`
//! pairs. The deadline is checked before each item is taken: once it passes no
//! new work starts, but items already running are allowed to finish and the
//! call waits for them. Every input yields exactly one result, in input order;
//! anything never started is reported as `BatchTimeout`. Each item runs on its
//! own task so a panicking pipeline fails only that item.

use async_trait::async_trait;
use common::MetricsRecorder;
use domain::{CreateOrderCommand, Order};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::errors::{OrderError, Result};

/// The unit of work run for every batch item
#[async_trait]
pub trait OrderCreator: Send + Sync {
    async fn create_order(&self, cmd: CreateOrderCommand) -> Result<Order>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchItemResult {
    /// Index of the item in the submitted batch
    pub position: usize,
    pub outcome: Result<Order>,
}

impl BatchItemResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub position: usize,
    pub error: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_orders: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_orders: Vec<BatchFailure>,
    pub processing_time_ms: u128,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchItemResult], elapsed: Duration) -> Self {
        let failed_orders: Vec<BatchFailure> = results
            .iter()
            .filter_map(|item| match &item.outcome {
                Ok(_) => None,
                Err(e) => Some(BatchFailure {
                    position: item.position,
                    error: e.to_string(),
                    kind: e.kind(),
                }),
            })
            .collect();

        Self {
            total_orders: results.len(),
            successful: results.len() - failed_orders.len(),
            failed: failed_orders.len(),
            failed_orders,
            processing_time_ms: elapsed.as_millis(),
        }
    }
}

type Queue = Arc<Mutex<VecDeque<(usize, CreateOrderCommand)>>>;

pub struct BatchProcessor {
    creator: Arc<dyn OrderCreator>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl BatchProcessor {
    pub fn new(creator: Arc<dyn OrderCreator>, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self { creator, metrics }
    }

    /// Create every order with at most `concurrency` in flight at once.
    ///
    /// Returns one result per input, positionally aligned with `orders`.
    pub async fn process(
        &self,
        orders: Vec<CreateOrderCommand>,
        concurrency: usize,
        deadline: Duration,
    ) -> Vec<BatchItemResult> {
        let started = Instant::now();
        // an unrepresentable deadline never expires
        let expires_at = started.checked_add(deadline);
        let total = orders.len();
        let workers = concurrency.clamp(1, total.max(1));

        info!(total, workers, deadline_ms = %deadline.as_millis(), "Processing order batch");

        let queue: Queue = Arc::new(Mutex::new(orders.into_iter().enumerate().collect()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut pool = JoinSet::new();

        for worker in 0..workers {
            let queue = queue.clone();
            let tx = tx.clone();
            let creator = self.creator.clone();

            pool.spawn(async move {
                while expires_at.map_or(true, |at| Instant::now() < at) {
                    let next = queue
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    let Some((position, cmd)) = next else {
                        break;
                    };

                    let item_creator = creator.clone();
                    let outcome = tokio::spawn(async move { item_creator.create_order(cmd).await })
                        .await
                        .unwrap_or_else(|e| {
                            error!(position, error = %e, "Batch item aborted");
                            Err(OrderError::Pipeline(e.to_string()))
                        });

                    if tx.send((position, outcome)).is_err() {
                        break;
                    }
                }
                worker
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Result<Order>>> = vec![None; total];
        while let Some((position, outcome)) = rx.recv().await {
            if let Some(slot) = slots.get_mut(position) {
                *slot = Some(outcome);
            }
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Batch worker aborted");
            }
        }

        let results: Vec<BatchItemResult> = slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| BatchItemResult {
                position,
                outcome: slot.unwrap_or(Err(OrderError::BatchTimeout)),
            })
            .collect();

        let failed = results.iter().filter(|r| !r.is_success()).count();
        let skipped = results
            .iter()
            .filter(|r| r.outcome == Err(OrderError::BatchTimeout))
            .count();
        if skipped > 0 {
            warn!(skipped, total, "Batch deadline elapsed before every order was dispatched");
        }

        let elapsed = started.elapsed();
        self.metrics
            .record_batch(total, failed, elapsed.as_secs_f64());
        info!(total, failed, elapsed_ms = %elapsed.as_millis(), "Order batch processed");

        results
    }
}
