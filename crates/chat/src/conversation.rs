use std::sync::Arc;

use chrono::Utc;
use printquote_core::audit::{AuditContext, AuditSink};
use printquote_core::domain::quote::QuoteIntake;
use printquote_core::errors::{ApplicationError, DomainError};
use printquote_core::flows::{FlowDirective, FlowEngine, FlowError, QuoteConversationFlow};
use printquote_core::service::{IssueContext, QuoteService};
use printquote_core::session::{
    ConversationSession, RequesterLocks, SessionStore, SessionStoreError,
};
use thiserror::Error;

use crate::events::EventContext;
use crate::replies::Reply;
use crate::routing::{MessageRouter, Route};

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Session(#[from] SessionStoreError),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl From<ConversationError> for ApplicationError {
    fn from(value: ConversationError) -> Self {
        match value {
            ConversationError::Session(error) => Self::Persistence(error.to_string()),
            ConversationError::Application(error) => error,
        }
    }
}

/// Runs one requester's turns through the quoting flow. Turns from the same
/// requester are applied one at a time, in arrival order.
pub struct ConversationService {
    router: MessageRouter,
    engine: FlowEngine<QuoteConversationFlow>,
    quotes: QuoteService,
    sessions: Arc<dyn SessionStore>,
    locks: RequesterLocks,
    audit: Arc<dyn AuditSink>,
}

impl ConversationService {
    pub fn new(
        router: MessageRouter,
        quotes: QuoteService,
        sessions: Arc<dyn SessionStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let engine = FlowEngine::for_catalog(quotes.engine().shared_catalog());
        Self { router, engine, quotes, sessions, locks: RequesterLocks::default(), audit }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn locks(&self) -> &RequesterLocks {
        &self.locks
    }

    /// Handles one inbound text. `None` means the text is not addressed to
    /// the bot and gets no reply.
    pub async fn handle_text(
        &self,
        requester_id: &str,
        text: &str,
        ctx: &EventContext,
    ) -> Result<Option<Reply>, ConversationError> {
        let _turn = self.locks.acquire(requester_id).await;
        let now = Utc::now();
        let session = self.sessions.get(requester_id, now).await?;
        let route = self.router.route(text, session.is_some());

        tracing::debug!(
            event_name = "chat.message_routed",
            correlation_id = %ctx.correlation_id,
            requester_id,
            route = route.as_str(),
            "routed inbound message"
        );

        match (route, session) {
            (Route::Inquiry, _) => Ok(Some(Reply::inquiry())),
            (Route::StaffHandoff, _) => Ok(Some(Reply::staff_handoff())),
            (Route::Catalog, _) => Ok(Some(Reply::catalog())),
            (Route::StartQuote, previous) => {
                let (state, prompt) = self.engine.start();
                self.sessions.put(ConversationSession::new(requester_id, state, now)).await?;
                tracing::info!(
                    event_name = "conversation.started",
                    correlation_id = %ctx.correlation_id,
                    requester_id,
                    restarted = previous.is_some(),
                    "quote conversation started"
                );
                Ok(Some(Reply::prompt(&prompt, None)))
            }
            (Route::Answer, Some(session)) => self.answer(session, text, ctx).await.map(Some),
            (Route::Answer, None) | (Route::Ignore, _) => Ok(None),
        }
    }

    async fn answer(
        &self,
        mut session: ConversationSession,
        text: &str,
        ctx: &EventContext,
    ) -> Result<Reply, ConversationError> {
        let requester_id = session.requester_id.clone();
        let audit = AuditContext::new(
            None,
            Some(requester_id.clone()),
            ctx.correlation_id.clone(),
            "chat",
        );

        let outcome =
            self.engine.apply_with_audit(&mut session.state, text, self.audit.as_ref(), &audit);
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(error) => {
                self.sessions.delete(&requester_id).await?;
                log_abort(&requester_id, ctx, &error);
                return Ok(Reply::aborted());
            }
        };

        match outcome.directive {
            FlowDirective::Ask(prompt) => {
                let single_position = session.is_single_position();
                session.touch(Utc::now());
                self.sessions.put(session).await?;
                Ok(Reply::prompt(&prompt, single_position))
            }
            FlowDirective::Complete(completed) => {
                self.sessions.delete(&requester_id).await?;
                let context = IssueContext {
                    requester_id: Some(requester_id),
                    correlation_id: ctx.correlation_id.clone(),
                    intake: QuoteIntake::Chat(completed.answers.clone()),
                    budget: completed.answers.budget,
                };
                match self.quotes.issue(&completed.request, context).await {
                    Ok(record) => Ok(Reply::completed(&completed.answers, &record)),
                    Err(ApplicationError::Domain(DomainError::Pricing(_))) => {
                        Ok(Reply::quote_failed())
                    }
                    Err(error) => Err(error.into()),
                }
            }
        }
    }
}

fn log_abort(requester_id: &str, ctx: &EventContext, error: &FlowError) {
    match error {
        FlowError::InvalidAnswer { step, .. } => tracing::info!(
            event_name = "conversation.aborted",
            correlation_id = %ctx.correlation_id,
            requester_id,
            step = %step,
            "answer outside the legal set; session discarded"
        ),
        FlowError::IncompleteRequest { missing } => tracing::error!(
            event_name = "conversation.aborted",
            correlation_id = %ctx.correlation_id,
            requester_id,
            missing = ?missing,
            "conversation reached completion with missing answers"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use printquote_core::audit::InMemoryAuditSink;
    use printquote_core::domain::quote::QuoteIntake;
    use printquote_core::flows::{CollectedAnswers, ConversationStep};
    use printquote_core::pricing::{PricingCatalog, QuoteEngine};
    use printquote_core::service::QuoteService;
    use printquote_core::session::{InMemorySessionStore, SessionStore};
    use printquote_core::sink::InMemoryQuoteSink;

    use super::ConversationService;
    use crate::events::EventContext;
    use crate::replies::{Reply, ReplyKind};
    use crate::routing::MessageRouter;

    const SINGLE_PATH: [&str; 7] =
        ["学生", "14日目以降", "特になし", "ゲームシャツ", "20～29枚", "前のみ", "前 or 背中 2色"];

    fn service(sink: &InMemoryQuoteSink, audit: &InMemoryAuditSink) -> ConversationService {
        let catalog = match PricingCatalog::builtin() {
            Ok(catalog) => Arc::new(catalog),
            Err(error) => panic!("builtin table should load: {error}"),
        };
        let audit: Arc<InMemoryAuditSink> = Arc::new(audit.clone());
        ConversationService::new(
            MessageRouter::default(),
            QuoteService::new(QuoteEngine::new(catalog), Arc::new(sink.clone()), audit.clone()),
            Arc::new(InMemorySessionStore::default()),
            audit,
        )
    }

    async fn say(service: &ConversationService, requester: &str, text: &str) -> Option<Reply> {
        match service.handle_text(requester, text, &EventContext::default()).await {
            Ok(reply) => reply,
            Err(error) => panic!("turn should not fail: {error}"),
        }
    }

    async fn session_count(service: &ConversationService) -> usize {
        service.sessions().len().await.unwrap_or(usize::MAX)
    }

    #[tokio::test]
    async fn trigger_then_answers_completes_and_publishes_quote() {
        let sink = InMemoryQuoteSink::default();
        let service = service(&sink, &InMemoryAuditSink::default());

        let first = say(&service, "U1", "カンタン見積り").await;
        assert!(matches!(first, Some(Reply { step: Some(ConversationStep::AwaitUserType), .. })));

        let mut last = None;
        for answer in SINGLE_PATH {
            last = say(&service, "U1", answer).await;
        }

        let Some(reply) = last else { panic!("completion should reply") };
        assert_eq!(reply.kind, ReplyKind::Completed);
        assert!(reply.text.contains("【合計金額】¥42,000"));
        assert!(reply.text.contains("【1枚あたり】¥2,100"));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_price, 42_000);
        assert_eq!(records[0].requester_id.as_deref(), Some("U1"));
        assert!(matches!(records[0].intake, QuoteIntake::Chat(_)));
        assert_eq!(session_count(&service).await, 0);
    }

    #[tokio::test]
    async fn illegal_answer_aborts_and_discards_session() {
        let sink = InMemoryQuoteSink::default();
        let audit = InMemoryAuditSink::default();
        let service = service(&sink, &audit);

        say(&service, "U2", "カンタン見積り").await;
        say(&service, "U2", "学生").await;
        let reply = say(&service, "U2", "来週").await;

        assert!(matches!(reply, Some(Reply { kind: ReplyKind::Aborted, .. })));
        assert_eq!(session_count(&service).await, 0);
        assert!(sink.records().is_empty());
        assert!(audit
            .events()
            .iter()
            .any(|event| event.event_type == "conversation.answer_rejected"));

        // the next text is no longer an answer
        assert_eq!(say(&service, "U2", "特になし").await, None);

        let restarted = say(&service, "U2", "カンタン見積り").await;
        assert!(matches!(
            restarted,
            Some(Reply { step: Some(ConversationStep::AwaitUserType), .. })
        ));
        let session = match service.sessions().get("U2", chrono::Utc::now()).await {
            Ok(Some(session)) => session,
            other => panic!("trigger should open a fresh session: {other:?}"),
        };
        assert_eq!(session.state.step, ConversationStep::AwaitUserType);
        assert_eq!(session.state.answers, CollectedAnswers::default());

        let mut last = None;
        for answer in SINGLE_PATH {
            last = say(&service, "U2", answer).await;
        }
        assert!(matches!(last, Some(Reply { kind: ReplyKind::Completed, .. })));
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].total_price, 42_000);
    }

    #[tokio::test]
    async fn trigger_mid_session_restarts_from_first_question() {
        let service = service(&InMemoryQuoteSink::default(), &InMemoryAuditSink::default());

        say(&service, "U3", "カンタン見積り").await;
        say(&service, "U3", "一般").await;
        let reply = say(&service, "U3", "カンタン見積り").await;

        assert!(matches!(reply, Some(Reply { step: Some(ConversationStep::AwaitUserType), .. })));
        let next = say(&service, "U3", "一般").await;
        assert!(matches!(next, Some(Reply { step: Some(ConversationStep::AwaitUsageDate), .. })));
    }

    #[tokio::test]
    async fn keywords_do_not_disturb_an_in_progress_session() {
        let service = service(&InMemoryQuoteSink::default(), &InMemoryAuditSink::default());

        say(&service, "U4", "カンタン見積り").await;
        let inquiry = say(&service, "U4", "お問い合わせ").await;
        assert!(matches!(inquiry, Some(Reply { kind: ReplyKind::Inquiry, .. })));

        let next = say(&service, "U4", "学生").await;
        assert!(matches!(next, Some(Reply { step: Some(ConversationStep::AwaitUsageDate), .. })));
    }

    #[tokio::test]
    async fn idle_text_without_session_gets_no_reply() {
        let service = service(&InMemoryQuoteSink::default(), &InMemoryAuditSink::default());

        assert_eq!(say(&service, "U5", "こんにちは").await, None);
        assert!(matches!(
            say(&service, "U5", "キャンペーン").await,
            Some(Reply { kind: ReplyKind::Catalog, .. })
        ));
    }

    #[tokio::test]
    async fn sessions_of_different_requesters_are_independent() {
        let service = service(&InMemoryQuoteSink::default(), &InMemoryAuditSink::default());

        say(&service, "A", "カンタン見積り").await;
        say(&service, "B", "カンタン見積り").await;
        say(&service, "A", "学生").await;
        let aborted = say(&service, "B", "学生?").await;

        assert!(matches!(aborted, Some(Reply { kind: ReplyKind::Aborted, .. })));
        let next = say(&service, "A", "14日目以内").await;
        assert!(matches!(next, Some(Reply { step: Some(ConversationStep::AwaitBudget), .. })));
    }

    #[tokio::test]
    async fn color_question_follows_placement() {
        let service = service(&InMemoryQuoteSink::default(), &InMemoryAuditSink::default());

        say(&service, "U6", "カンタン見積り").await;
        for answer in ["一般", "14日目以内", "特になし", "ドライTシャツ", "30～39枚"] {
            say(&service, "U6", answer).await;
        }
        let reply = say(&service, "U6", "前と背中").await;

        let Some(reply) = reply else { panic!("placement should be answered") };
        assert_eq!(reply.step, Some(ConversationStep::AwaitColorCount));
        assert!(reply.text.ends_with("（前と背中）"));
        assert!(reply.options.iter().all(|option| option.label.starts_with("前と背中")));
    }
}
