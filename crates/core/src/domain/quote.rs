use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::answers::{ChatAnswers, PrintPlacement};
use crate::domain::catalog::{DiscountClass, Yen};
use crate::domain::position::{NameNumberOption, PrintPosition};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Print details of a chat quote: one placement answer plus its color-count label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPrint {
    pub placement: PrintPlacement,
    pub color_selection: String,
    pub back_name: Option<NameNumberOption>,
}

/// How surcharges are derived on top of the tier's base price. Chosen by the
/// intake flow that produced the request; the two rules are never mixed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SurchargeStrategy {
    /// Chat flow: fixed color-selection table, position fee only for front and back.
    SelectionLookup(ChatPrint),
    /// Web-order flow: per-position color counting across 1..=4 positions.
    PerPositionCount { positions: Vec<PrintPosition> },
}

impl SurchargeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectionLookup(_) => "selection_lookup",
            Self::PerPositionCount { .. } => "per_position_count",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub item: String,
    pub quantity: u32,
    pub discount_class: DiscountClass,
    pub surcharge: SurchargeStrategy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Yen,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub unit_price: Yen,
    pub total_price: Yen,
    pub trace: Vec<PricingTraceStep>,
}

/// Order details carried through from a web-order form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebOrderDetails {
    pub product_no: Option<String>,
    pub color_no: Option<String>,
    pub sizes: BTreeMap<String, u32>,
    pub positions: Vec<PrintPosition>,
    pub delivery_date: Option<String>,
    pub use_date: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum QuoteIntake {
    Chat(ChatAnswers),
    WebOrder(WebOrderDetails),
}

/// Structured record handed to the quote sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub quote_id: QuoteId,
    pub requester_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub item: String,
    pub quantity: u32,
    pub discount_class: DiscountClass,
    pub intake: QuoteIntake,
    pub unit_price: Yen,
    pub total_price: Yen,
    pub trace: Vec<PricingTraceStep>,
    pub within_budget: Option<bool>,
}
