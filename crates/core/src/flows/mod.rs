pub mod engine;
pub mod states;

pub use engine::{
    ConversationState, FlowDefinition, FlowEngine, FlowError, QuoteConversationFlow,
};
pub use states::{
    CollectedAnswers, CompletedConversation, ConversationStep, FlowDirective, Prompt,
    TransitionOutcome,
};
