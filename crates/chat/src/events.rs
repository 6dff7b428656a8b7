use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::{ConversationError, ConversationService};
use crate::replies::Reply;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    pub envelope_id: String,
    pub event: ChatEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    Message(MessageEvent),
    Unsupported { event_type: String },
}

impl ChatEvent {
    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::Message(_) => ChatEventType::Message,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    Message,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub requester_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Reply),
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error("message event is missing a requester id")]
    MissingRequester,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            tracing::debug!(
                event_name = "chat.event_ignored",
                correlation_id = %ctx.correlation_id,
                envelope_id = %envelope.envelope_id,
                "no handler registered for event"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher(conversation: Arc<ConversationService>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(conversation));
    dispatcher
}

#[async_trait]
pub trait MessageService: Send + Sync {
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Option<Reply>, EventHandlerError>;
}

#[async_trait]
impl MessageService for ConversationService {
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Option<Reply>, EventHandlerError> {
        if event.requester_id.trim().is_empty() {
            return Err(EventHandlerError::MissingRequester);
        }
        Ok(self.handle_text(&event.requester_id, &event.text, ctx).await?)
    }
}

#[async_trait]
impl<S> MessageService for Arc<S>
where
    S: MessageService + ?Sized,
{
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Option<Reply>, EventHandlerError> {
        self.as_ref().handle_message(event, ctx).await
    }
}

pub struct MessageHandler<S> {
    service: S,
}

impl<S> MessageHandler<S>
where
    S: MessageService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for MessageHandler<S>
where
    S: MessageService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::Message
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let reply = self.service.handle_message(event, ctx).await?;
        Ok(match reply {
            Some(reply) => HandlerResult::Responded(reply),
            None => HandlerResult::Processed,
        })
    }
}
