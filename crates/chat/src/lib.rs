//! Conversational boundary for the quote engine.
//!
//! - **Events** (`events`) - inbound envelopes, handlers and the dispatcher
//! - **Routing** (`routing`) - which reply an inbound text gets
//! - **Conversation** (`conversation`) - per-requester sessions driven through the flow engine
//! - **Replies** (`replies`) - outbound reply templates
//!
//! ```text
//! ChatEnvelope → EventDispatcher → MessageHandler → ConversationService → QuoteService
//!                                                        ↓
//!                                                  Reply ← prompt / summary
//! ```

pub mod conversation;
pub mod events;
pub mod replies;
pub mod routing;

pub use conversation::{ConversationError, ConversationService};
pub use events::{
    default_dispatcher, ChatEnvelope, ChatEvent, DispatchError, EventContext, EventDispatcher,
    HandlerResult, MessageEvent,
};
pub use replies::{Reply, ReplyKind, ReplyOption};
pub use routing::{MessageRouter, Route};
