pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod ids;
pub mod intake;
pub mod pricing;
pub mod service;
pub mod session;
pub mod sink;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::answers::{Budget, ChatAnswers, PrintPlacement, UsageDate, UserType};
pub use domain::catalog::{format_yen, DiscountClass, PriceTier, Yen};
pub use domain::position::{FullColorSize, NameNumberOption, PrintPosition};
pub use domain::quote::{
    QuoteId, QuoteIntake, QuoteRecord, QuoteRequest, QuoteResult, SurchargeStrategy,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{ConversationStep, FlowEngine, FlowError, QuoteConversationFlow};
pub use ids::QuoteIdGenerator;
pub use intake::{IntakeError, WebOrderForm};
pub use pricing::{CatalogError, PricingCatalog, PricingError, QuoteEngine};
pub use service::{IssueContext, QuoteService};
pub use session::{ConversationSession, InMemorySessionStore, RequesterLocks, SessionStore};
pub use sink::{InMemoryQuoteSink, QuoteFailure, QuoteSink, SinkError};
