//! Pricing a finished request and handing the outcome to the quote sink.

use std::sync::Arc;

use chrono::Utc;

use crate::audit::{AuditContext, AuditSink};
use crate::domain::answers::Budget;
use crate::domain::quote::{QuoteIntake, QuoteRecord, QuoteRequest};
use crate::errors::{ApplicationError, DomainError};
use crate::ids::QuoteIdGenerator;
use crate::intake::WebOrderForm;
use crate::pricing::QuoteEngine;
use crate::sink::{QuoteFailure, QuoteSink};

#[derive(Clone)]
pub struct QuoteService {
    engine: QuoteEngine,
    sink: Arc<dyn QuoteSink>,
    audit: Arc<dyn AuditSink>,
    ids: &'static QuoteIdGenerator,
}

/// Everything known about a request besides what is priced.
#[derive(Clone, Debug)]
pub struct IssueContext {
    pub requester_id: Option<String>,
    pub correlation_id: String,
    pub intake: QuoteIntake,
    pub budget: Budget,
}

impl QuoteService {
    pub fn new(engine: QuoteEngine, sink: Arc<dyn QuoteSink>, audit: Arc<dyn AuditSink>) -> Self {
        Self { engine, sink, audit, ids: QuoteIdGenerator::process() }
    }

    pub fn engine(&self) -> &QuoteEngine {
        &self.engine
    }

    /// Prices `request` and publishes the record. Pricing failures are
    /// published as failures and returned; no record is produced for them.
    pub async fn issue(
        &self,
        request: &QuoteRequest,
        context: IssueContext,
    ) -> Result<QuoteRecord, ApplicationError> {
        let audit = AuditContext::new(
            None,
            context.requester_id.clone(),
            context.correlation_id.clone(),
            "quote-service",
        );

        let priced = match self.engine.quote_with_audit(request, self.audit.as_ref(), &audit) {
            Ok(priced) => priced,
            Err(error) => {
                tracing::warn!(
                    event_name = "quote.failed",
                    correlation_id = %context.correlation_id,
                    requester_id = context.requester_id.as_deref().unwrap_or(""),
                    item = %request.item,
                    quantity = request.quantity,
                    discount_class = %request.discount_class,
                    error = %error,
                    "quote could not be priced"
                );
                let failure = QuoteFailure {
                    requester_id: context.requester_id,
                    item: request.item.clone(),
                    quantity: request.quantity,
                    discount_class: request.discount_class,
                    reason: error.to_string(),
                    occurred_at: Utc::now(),
                };
                self.sink
                    .publish_failure(&failure)
                    .await
                    .map_err(|sink_error| ApplicationError::Integration(sink_error.to_string()))?;
                return Err(ApplicationError::Domain(DomainError::Pricing(error)));
            }
        };

        let created_at = Utc::now();
        let record = QuoteRecord {
            quote_id: self.ids.next_id(created_at),
            requester_id: context.requester_id,
            created_at,
            item: request.item.clone(),
            quantity: request.quantity,
            discount_class: request.discount_class,
            intake: context.intake,
            unit_price: priced.unit_price,
            total_price: priced.total_price,
            trace: priced.trace,
            within_budget: context.budget.admits(priced.unit_price),
        };

        self.sink
            .publish(&record)
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;
        tracing::info!(
            event_name = "quote.issued",
            correlation_id = %context.correlation_id,
            quote_id = %record.quote_id,
            requester_id = record.requester_id.as_deref().unwrap_or(""),
            item = %record.item,
            quantity = record.quantity,
            unit_price = record.unit_price,
            total_price = record.total_price,
            "quote issued"
        );

        Ok(record)
    }

    /// Converts a submitted web-order form and issues its quote.
    pub async fn issue_web_order(
        &self,
        form: WebOrderForm,
        correlation_id: &str,
    ) -> Result<QuoteRecord, ApplicationError> {
        let intake = form.into_intake().map_err(|error| {
            tracing::info!(
                event_name = "intake.web_order_rejected",
                correlation_id,
                error = %error,
                "web order form rejected"
            );
            ApplicationError::Domain(DomainError::Intake(error))
        })?;

        let context = IssueContext {
            requester_id: intake.requester_id,
            correlation_id: correlation_id.to_owned(),
            intake: QuoteIntake::WebOrder(intake.details),
            budget: Budget::Unspecified,
        };
        self.issue(&intake.request, context).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{IssueContext, QuoteService};
    use crate::audit::InMemoryAuditSink;
    use crate::domain::answers::Budget;
    use crate::domain::catalog::DiscountClass;
    use crate::domain::position::PrintPosition;
    use crate::domain::quote::{QuoteIntake, QuoteRequest, SurchargeStrategy, WebOrderDetails};
    use crate::errors::{ApplicationError, DomainError};
    use crate::intake::{IntakeError, WebOrderForm};
    use crate::pricing::{PricingCatalog, PricingError, QuoteEngine};
    use crate::sink::InMemoryQuoteSink;

    fn service(sink: &InMemoryQuoteSink) -> QuoteService {
        let catalog = match PricingCatalog::builtin() {
            Ok(catalog) => catalog,
            Err(error) => panic!("builtin table should load: {error}"),
        };
        QuoteService::new(
            QuoteEngine::new(Arc::new(catalog)),
            Arc::new(sink.clone()),
            Arc::new(InMemoryAuditSink::default()),
        )
    }

    fn request(quantity: u32) -> QuoteRequest {
        QuoteRequest {
            item: "ドライポロシャツ".to_owned(),
            quantity,
            discount_class: DiscountClass::Early,
            surcharge: SurchargeStrategy::PerPositionCount {
                positions: vec![PrintPosition {
                    position_id: 1,
                    placement: "前".to_owned(),
                    colors: vec!["白".to_owned()],
                    ..PrintPosition::default()
                }],
            },
        }
    }

    fn context(budget: Budget) -> IssueContext {
        IssueContext {
            requester_id: Some("U9".to_owned()),
            correlation_id: "req-1".to_owned(),
            intake: QuoteIntake::WebOrder(WebOrderDetails::default()),
            budget,
        }
    }

    #[tokio::test]
    async fn issued_quotes_are_published_with_budget_check() {
        let sink = InMemoryQuoteSink::default();
        let record = service(&sink).issue(&request(40), context(Budget::Cap(1_000))).await;

        let record = match record {
            Ok(record) => record,
            Err(error) => panic!("quote should be issued: {error}"),
        };
        assert_eq!(record.unit_price, 1350);
        assert_eq!(record.total_price, 1350 * 40);
        assert_eq!(record.within_budget, Some(false));
        assert!(record.quote_id.0.starts_with("Q-"));
        assert_eq!(sink.records(), vec![record]);
        assert!(sink.failures().is_empty());
    }

    #[tokio::test]
    async fn unknown_tier_is_published_as_failure() {
        let sink = InMemoryQuoteSink::default();
        let result = service(&sink).issue(&request(700), context(Budget::Unspecified)).await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::Pricing(PricingError::TierNotFound { .. })))
        ));
        assert!(sink.records().is_empty());
        let failures = sink.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].quantity, 700);
        assert_eq!(failures[0].requester_id.as_deref(), Some("U9"));
    }

    #[tokio::test]
    async fn web_order_form_is_converted_and_issued() {
        let sink = InMemoryQuoteSink::default();
        let form = WebOrderForm::from_json(
            r#"{
                "productName": "ドライTシャツ",
                "sizeM": 10,
                "sizeL": "12",
                "discountOption": "早割",
                "positions": [{"position": "前", "colors": ["白"]}]
            }"#,
        );
        let form = match form {
            Ok(form) => form,
            Err(error) => panic!("form should parse: {error}"),
        };

        let record = service(&sink).issue_web_order(form, "req-web").await;

        let record = match record {
            Ok(record) => record,
            Err(error) => panic!("web order should be quoted: {error}"),
        };
        assert_eq!(record.quantity, 22);
        assert_eq!(record.unit_price, 1240);
        assert_eq!(record.within_budget, None);
        assert!(matches!(record.intake, QuoteIntake::WebOrder(_)));
    }

    #[tokio::test]
    async fn web_order_without_positions_is_an_intake_error() {
        let sink = InMemoryQuoteSink::default();
        let form = match WebOrderForm::from_json(r#"{"productName": "ドライTシャツ", "sizeM": 25}"#)
        {
            Ok(form) => form,
            Err(error) => panic!("form should parse: {error}"),
        };

        let result = service(&sink).issue_web_order(form, "req-web").await;

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::Intake(IntakeError::Incomplete(_))))
        ));
        assert!(sink.records().is_empty());
        assert!(sink.failures().is_empty());
    }
}
