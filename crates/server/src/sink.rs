use async_trait::async_trait;
use printquote_core::domain::quote::QuoteRecord;
use printquote_core::sink::{QuoteFailure, QuoteSink, SinkError};
use tracing::{info, warn};

/// Writes every published quote to the log as one structured event.
#[derive(Clone, Debug, Default)]
pub struct TracingQuoteSink;

#[async_trait]
impl QuoteSink for TracingQuoteSink {
    async fn publish(&self, record: &QuoteRecord) -> Result<(), SinkError> {
        let trace = serde_json::to_string(&record.trace)
            .map_err(|error| SinkError::Unavailable(error.to_string()))?;
        info!(
            event_name = "sink.quote_published",
            quote_id = %record.quote_id,
            requester_id = record.requester_id.as_deref().unwrap_or("unknown"),
            item = %record.item,
            quantity = record.quantity,
            discount_class = %record.discount_class,
            unit_price = record.unit_price,
            total_price = record.total_price,
            within_budget = ?record.within_budget,
            trace = %trace,
            "quote published"
        );
        Ok(())
    }

    async fn publish_failure(&self, failure: &QuoteFailure) -> Result<(), SinkError> {
        warn!(
            event_name = "sink.quote_failed",
            requester_id = failure.requester_id.as_deref().unwrap_or("unknown"),
            item = %failure.item,
            quantity = failure.quantity,
            discount_class = %failure.discount_class,
            reason = %failure.reason,
            "quote failure published"
        );
        Ok(())
    }
}
