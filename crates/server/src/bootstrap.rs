use std::sync::Arc;

use printquote_chat::{default_dispatcher, ConversationService, EventDispatcher, MessageRouter};
use printquote_core::audit::{AuditSink, TracingAuditSink};
use printquote_core::config::{AppConfig, ConfigError, LoadOptions};
use printquote_core::pricing::{CatalogError, PricingCatalog, QuoteEngine};
use printquote_core::service::QuoteService;
use printquote_core::session::{InMemorySessionStore, SessionStore};
use printquote_core::sink::QuoteSink;
use thiserror::Error;
use tracing::info;

use crate::sink::TracingQuoteSink;

pub struct Application {
    pub config: AppConfig,
    pub catalog: Arc<PricingCatalog>,
    pub quotes: QuoteService,
    pub sessions: Arc<dyn SessionStore>,
    pub conversation: Arc<ConversationService>,
    pub dispatcher: Arc<EventDispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("price table could not be loaded: {0}")]
    Catalog(#[from] CatalogError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    bootstrap_with_sink(config, Arc::new(TracingQuoteSink))
}

/// Wires every component around `sink`. Tests pass an in-memory sink here.
pub fn bootstrap_with_sink(
    config: AppConfig,
    sink: Arc<dyn QuoteSink>,
) -> Result<Application, BootstrapError> {
    let catalog = Arc::new(PricingCatalog::load(config.pricing.table_path.as_deref())?);
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        origin = %catalog.origin(),
        tiers = catalog.tiers().len(),
        items = catalog.items().len(),
        "price table loaded"
    );

    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let quotes = QuoteService::new(QuoteEngine::new(Arc::clone(&catalog)), sink, audit.clone());
    let sessions: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::new(config.conversation.session_ttl_secs));
    let conversation = Arc::new(ConversationService::new(
        MessageRouter::new(config.conversation.trigger_phrase.clone()),
        quotes.clone(),
        Arc::clone(&sessions),
        audit,
    ));
    let dispatcher = Arc::new(default_dispatcher(Arc::clone(&conversation)));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        session_ttl_secs = config.conversation.session_ttl_secs,
        trigger_phrase = %config.conversation.trigger_phrase,
        "application components wired"
    );

    Ok(Application { config, catalog, quotes, sessions, conversation, dispatcher })
}
