use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::catalog::DiscountClass;
use crate::domain::quote::QuoteRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("quote sink unavailable: {0}")]
    Unavailable(String),
}

/// A request that could not be priced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteFailure {
    pub requester_id: Option<String>,
    pub item: String,
    pub quantity: u32,
    pub discount_class: DiscountClass,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Downstream consumer of finished quotes (spreadsheet, notification ...).
#[async_trait]
pub trait QuoteSink: Send + Sync {
    async fn publish(&self, record: &QuoteRecord) -> Result<(), SinkError>;
    async fn publish_failure(&self, failure: &QuoteFailure) -> Result<(), SinkError>;
}

#[derive(Clone, Default)]
pub struct InMemoryQuoteSink {
    records: Arc<Mutex<Vec<QuoteRecord>>>,
    failures: Arc<Mutex<Vec<QuoteFailure>>>,
}

impl InMemoryQuoteSink {
    pub fn records(&self) -> Vec<QuoteRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn failures(&self) -> Vec<QuoteFailure> {
        match self.failures.lock() {
            Ok(failures) => failures.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl QuoteSink for InMemoryQuoteSink {
    async fn publish(&self, record: &QuoteRecord) -> Result<(), SinkError> {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
        Ok(())
    }

    async fn publish_failure(&self, failure: &QuoteFailure) -> Result<(), SinkError> {
        match self.failures.lock() {
            Ok(mut failures) => failures.push(failure.clone()),
            Err(poisoned) => poisoned.into_inner().push(failure.clone()),
        }
        Ok(())
    }
}
