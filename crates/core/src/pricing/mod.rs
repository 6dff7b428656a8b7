pub mod surcharge;
pub mod table;

use std::sync::Arc;

use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::catalog::{DiscountClass, PriceTier, SelectionKind};
use crate::domain::quote::{PricingTraceStep, QuoteRequest, QuoteResult};

pub use surcharge::surcharge;
pub use table::{CatalogError, PricingCatalog, WebOrderFees};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("no price tier for `{item}` ({discount_class}) at quantity {quantity}")]
    TierNotFound { item: String, discount_class: DiscountClass, quantity: u32 },
    #[error("incomplete quote request: {0}")]
    IncompleteRequest(String),
    #[error("color selection `{label}` is not offered for {kind} prints")]
    SelectionMismatch { label: String, kind: SelectionKind },
    #[error("{count} print positions given, at most 4 are supported")]
    TooManyPositions { count: usize },
    #[error("print position {position_id} lists {count} colors, at most 3 are supported")]
    TooManyColors { position_id: u8, count: usize },
}

/// Resolves tiers and prices requests against one immutable catalog.
#[derive(Clone, Debug)]
pub struct QuoteEngine {
    catalog: Arc<PricingCatalog>,
}

impl QuoteEngine {
    pub fn new(catalog: Arc<PricingCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<PricingCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn resolve(
        &self,
        item: &str,
        discount_class: DiscountClass,
        quantity: u32,
    ) -> Result<&PriceTier, PricingError> {
        self.catalog.find_tier(item, discount_class, quantity).ok_or_else(|| {
            PricingError::TierNotFound { item: item.to_owned(), discount_class, quantity }
        })
    }

    /// Prices one request. Never returns a zero quote for an unknown tier.
    pub fn quote(&self, request: &QuoteRequest) -> Result<QuoteResult, PricingError> {
        if request.item.trim().is_empty() {
            return Err(PricingError::IncompleteRequest("item is missing".to_owned()));
        }
        if request.quantity == 0 {
            return Err(PricingError::IncompleteRequest("quantity is missing".to_owned()));
        }

        let tier = self.resolve(&request.item, request.discount_class, request.quantity)?;
        let mut trace = vec![PricingTraceStep {
            stage: "base".to_owned(),
            detail: format!(
                "{} {}..={} {}",
                tier.item, tier.min_qty, tier.max_qty, tier.discount_class
            ),
            amount: tier.unit_price,
        }];

        let surcharges = surcharge(&request.surcharge, tier, &self.catalog, &mut trace)?;
        let unit_price = tier.unit_price + surcharges;
        let total_price = unit_price * u64::from(request.quantity);
        trace.push(PricingTraceStep {
            stage: "total".to_owned(),
            detail: format!("{unit_price} x {}", request.quantity),
            amount: total_price,
        });

        Ok(QuoteResult { unit_price, total_price, trace })
    }

    pub fn quote_with_audit<S>(
        &self,
        request: &QuoteRequest,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<QuoteResult, PricingError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.quote(request);
        let event = match &result {
            Ok(priced) => AuditEvent::new(
                audit.quote_id.clone(),
                audit.requester_id.clone(),
                audit.correlation_id.clone(),
                "pricing.quote_computed",
                AuditCategory::Pricing,
                audit.actor.clone(),
                AuditOutcome::Success,
            )
            .with_metadata("unit_price", priced.unit_price.to_string())
            .with_metadata("total_price", priced.total_price.to_string()),
            Err(error) => AuditEvent::new(
                audit.quote_id.clone(),
                audit.requester_id.clone(),
                audit.correlation_id.clone(),
                "pricing.quote_failed",
                AuditCategory::Pricing,
                audit.actor.clone(),
                AuditOutcome::Failed,
            )
            .with_metadata("error", error.to_string()),
        };
        sink.emit(
            event
                .with_metadata("item", request.item.clone())
                .with_metadata("quantity", request.quantity.to_string())
                .with_metadata("strategy", request.surcharge.name()),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{PricingCatalog, PricingError, QuoteEngine};
    use crate::audit::{AuditContext, AuditOutcome, InMemoryAuditSink};
    use crate::domain::answers::PrintPlacement;
    use crate::domain::catalog::DiscountClass;
    use crate::domain::position::PrintPosition;
    use crate::domain::quote::{ChatPrint, QuoteRequest, SurchargeStrategy};

    fn engine() -> QuoteEngine {
        match PricingCatalog::builtin() {
            Ok(catalog) => QuoteEngine::new(Arc::new(catalog)),
            Err(error) => panic!("builtin table should load: {error}"),
        }
    }

    fn chat_request(item: &str, quantity: u32, label: &str) -> QuoteRequest {
        QuoteRequest {
            item: item.to_owned(),
            quantity,
            discount_class: DiscountClass::Early,
            surcharge: SurchargeStrategy::SelectionLookup(ChatPrint {
                placement: PrintPlacement::FrontOnly,
                color_selection: label.to_owned(),
                back_name: None,
            }),
        }
    }

    #[test]
    fn front_only_two_colors_scenario() {
        let result = engine().quote(&chat_request("ゲームシャツ", 20, "前 or 背中 2色"));

        let result = match result {
            Ok(result) => result,
            Err(error) => panic!("quote should succeed: {error}"),
        };
        assert_eq!(result.unit_price, 2100);
        assert_eq!(result.total_price, 42_000);
        assert_eq!(result.trace.first().map(|step| step.amount), Some(1650));
        assert_eq!(result.trace.last().map(|step| step.stage.as_str()), Some("total"));
    }

    #[test]
    fn total_is_unit_price_times_quantity_for_every_bucket_and_item() {
        let engine = engine();
        let catalog = engine.catalog().clone();

        for item in catalog.items() {
            for bucket in catalog.quantity_buckets() {
                for label in ["前 or 背中 1色", "前 or 背中 2色", "前 or 背中 フルカラー"] {
                    let request = chat_request(item, bucket.quantity, label);
                    let result = engine.quote(&request);
                    assert!(
                        result.as_ref().is_ok_and(|priced| priced.total_price
                            == priced.unit_price * u64::from(bucket.quantity)),
                        "{item} {} {label}: {result:?}",
                        bucket.label
                    );
                }
            }
        }
    }

    #[test]
    fn unknown_tier_is_an_error_not_a_zero_quote() {
        let engine = engine();

        assert_eq!(
            engine.quote(&chat_request("ゲームシャツ", 10, "前 or 背中 1色")),
            Err(PricingError::TierNotFound {
                item: "ゲームシャツ".to_owned(),
                discount_class: DiscountClass::Early,
                quantity: 10,
            })
        );
        assert!(matches!(
            engine.quote(&chat_request("マフラータオル", 20, "前 or 背中 1色")),
            Err(PricingError::TierNotFound { .. })
        ));
    }

    #[test]
    fn missing_fields_are_incomplete() {
        let engine = engine();

        assert!(matches!(
            engine.quote(&chat_request("", 20, "前 or 背中 1色")),
            Err(PricingError::IncompleteRequest(_))
        ));
        assert!(matches!(
            engine.quote(&chat_request("ゲームシャツ", 0, "前 or 背中 1色")),
            Err(PricingError::IncompleteRequest(_))
        ));
    }

    #[test]
    fn web_order_prices_positions_on_the_resolved_tier() {
        let request = QuoteRequest {
            item: "ドライTシャツ".to_owned(),
            quantity: 35,
            discount_class: DiscountClass::Standard,
            surcharge: SurchargeStrategy::PerPositionCount {
                positions: vec![
                    PrintPosition {
                        position_id: 1,
                        placement: "前".to_owned(),
                        colors: vec!["白".to_owned(), "黒".to_owned()],
                        ..PrintPosition::default()
                    },
                    PrintPosition {
                        position_id: 2,
                        placement: "背中".to_owned(),
                        colors: vec!["白".to_owned()],
                        ..PrintPosition::default()
                    },
                ],
            },
        };

        let result = engine().quote(&request);
        // 1270 base + 350 position + 350 color
        assert!(matches!(result, Ok(ref priced) if priced.unit_price == 1970));
        assert!(matches!(result, Ok(ref priced) if priced.total_price == 1970 * 35));
    }

    #[test]
    fn quote_with_audit_records_success_and_failure() {
        let engine = engine();
        let sink = InMemoryAuditSink::default();
        let context = AuditContext::new(None, Some("U123".to_owned()), "req-9", "quote-engine");

        let _ = engine.quote_with_audit(
            &chat_request("ゲームシャツ", 20, "前 or 背中 1色"),
            &sink,
            &context,
        );
        let _ = engine.quote_with_audit(
            &chat_request("ゲームシャツ", 5, "前 or 背中 1色"),
            &sink,
            &context,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "pricing.quote_computed");
        assert_eq!(events[0].metadata.get("unit_price").map(String::as_str), Some("1650"));
        assert_eq!(events[1].event_type, "pricing.quote_failed");
        assert_eq!(events[1].outcome, AuditOutcome::Failed);
        assert_eq!(events[1].requester_id.as_deref(), Some("U123"));
    }
}
