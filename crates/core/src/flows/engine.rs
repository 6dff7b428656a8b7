use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::answers::{
    Budget, ChatAnswers, PrintPlacement, UsageDate, UserType, BACK_NAME_OPTIONS,
    NO_BACK_NAME_LABEL,
};
use crate::domain::catalog::SelectionKind;
use crate::domain::position::NameNumberOption;
use crate::domain::quote::{ChatPrint, QuoteRequest, SurchargeStrategy};
use crate::flows::states::{
    CollectedAnswers, CompletedConversation, ConversationStep, FlowDirective, Prompt,
    TransitionOutcome,
};
use crate::pricing::PricingCatalog;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("answer `{answer}` is not a legal option at {step}")]
    InvalidAnswer { step: ConversationStep, answer: String },
    #[error("conversation completed without {}", .missing.join(", "))]
    IncompleteRequest { missing: Vec<String> },
}

/// Where one requester stands in the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub step: ConversationStep,
    pub answers: CollectedAnswers,
}

pub trait FlowDefinition {
    fn initial_step(&self) -> ConversationStep;
    fn prompt(&self, step: ConversationStep, answers: &CollectedAnswers) -> Prompt;
    fn transition(
        &self,
        state: &mut ConversationState,
        answer: &str,
    ) -> Result<TransitionOutcome, FlowError>;
}

/// The fixed eight-question quoting dialogue. Legal items, quantity buckets
/// and color selections come from the price catalog.
#[derive(Clone, Debug)]
pub struct QuoteConversationFlow {
    catalog: Arc<PricingCatalog>,
}

impl QuoteConversationFlow {
    pub fn new(catalog: Arc<PricingCatalog>) -> Self {
        Self { catalog }
    }

    pub fn legal_options(
        &self,
        step: ConversationStep,
        answers: &CollectedAnswers,
    ) -> Vec<String> {
        match step {
            ConversationStep::AwaitUserType => labels(UserType::ALL.map(UserType::label)),
            ConversationStep::AwaitUsageDate => labels(UsageDate::ALL.map(UsageDate::label)),
            ConversationStep::AwaitBudget => {
                Budget::options().into_iter().map(Budget::label).collect()
            }
            ConversationStep::AwaitItem => self.catalog.items().to_vec(),
            ConversationStep::AwaitQuantity => {
                self.catalog.quantity_buckets().iter().map(|bucket| bucket.label.clone()).collect()
            }
            ConversationStep::AwaitPrintPosition => {
                labels(PrintPlacement::ALL.map(PrintPlacement::label))
            }
            ConversationStep::AwaitColorCount => {
                let kind = answers
                    .placement
                    .map(PrintPlacement::selection_kind)
                    .unwrap_or(SelectionKind::Single);
                self.catalog
                    .selections(kind)
                    .iter()
                    .map(|selection| selection.label.clone())
                    .collect()
            }
            ConversationStep::AwaitBackName => {
                let mut options = labels(BACK_NAME_OPTIONS.map(NameNumberOption::label));
                options.push(NO_BACK_NAME_LABEL.to_owned());
                options
            }
            ConversationStep::Complete => Vec::new(),
        }
    }

    fn accept_user_type(
        &self,
        answer: &str,
        answers: &mut CollectedAnswers,
    ) -> Result<ConversationStep, FlowError> {
        let user_type = UserType::from_label(answer)
            .ok_or_else(|| invalid(ConversationStep::AwaitUserType, answer))?;
        answers.user_type = Some(user_type);
        Ok(ConversationStep::AwaitUsageDate)
    }

    fn accept_usage_date(
        &self,
        answer: &str,
        answers: &mut CollectedAnswers,
    ) -> Result<ConversationStep, FlowError> {
        let usage_date = UsageDate::from_label(answer)
            .ok_or_else(|| invalid(ConversationStep::AwaitUsageDate, answer))?;
        answers.usage_date = Some(usage_date);
        Ok(ConversationStep::AwaitBudget)
    }

    fn accept_budget(
        &self,
        answer: &str,
        answers: &mut CollectedAnswers,
    ) -> Result<ConversationStep, FlowError> {
        let budget = Budget::from_label(answer)
            .ok_or_else(|| invalid(ConversationStep::AwaitBudget, answer))?;
        answers.budget = Some(budget);
        Ok(ConversationStep::AwaitItem)
    }

    fn accept_item(
        &self,
        answer: &str,
        answers: &mut CollectedAnswers,
    ) -> Result<ConversationStep, FlowError> {
        if !self.catalog.has_item(answer) {
            return Err(invalid(ConversationStep::AwaitItem, answer));
        }
        answers.item = Some(answer.to_owned());
        Ok(ConversationStep::AwaitQuantity)
    }

    fn accept_quantity(
        &self,
        answer: &str,
        answers: &mut CollectedAnswers,
    ) -> Result<ConversationStep, FlowError> {
        let bucket = self
            .catalog
            .quantity_bucket(answer)
            .ok_or_else(|| invalid(ConversationStep::AwaitQuantity, answer))?;
        answers.quantity = Some(bucket.clone());
        Ok(ConversationStep::AwaitPrintPosition)
    }

    fn accept_print_position(
        &self,
        answer: &str,
        answers: &mut CollectedAnswers,
    ) -> Result<ConversationStep, FlowError> {
        let placement = PrintPlacement::from_label(answer)
            .ok_or_else(|| invalid(ConversationStep::AwaitPrintPosition, answer))?;
        answers.placement = Some(placement);
        Ok(ConversationStep::AwaitColorCount)
    }

    fn accept_color_count(
        &self,
        answer: &str,
        answers: &mut CollectedAnswers,
    ) -> Result<ConversationStep, FlowError> {
        let placement = answers.placement.ok_or_else(|| FlowError::IncompleteRequest {
            missing: vec!["print_position".to_owned()],
        })?;
        // Only the table for the chosen placement is consulted.
        self.catalog
            .selection(placement.selection_kind(), answer)
            .ok_or_else(|| invalid(ConversationStep::AwaitColorCount, answer))?;
        answers.color_selection = Some(answer.to_owned());

        if placement.is_single_position() {
            answers.back_name = None;
            Ok(ConversationStep::Complete)
        } else {
            Ok(ConversationStep::AwaitBackName)
        }
    }

    fn accept_back_name(
        &self,
        answer: &str,
        answers: &mut CollectedAnswers,
    ) -> Result<ConversationStep, FlowError> {
        answers.back_name = if answer == NO_BACK_NAME_LABEL {
            None
        } else {
            let option = BACK_NAME_OPTIONS
                .into_iter()
                .find(|option| option.label() == answer)
                .ok_or_else(|| invalid(ConversationStep::AwaitBackName, answer))?;
            Some(option)
        };
        Ok(ConversationStep::Complete)
    }

    fn complete(&self, answers: &CollectedAnswers) -> Result<CompletedConversation, FlowError> {
        let missing = answers.missing();
        let (
            Some(user_type),
            Some(usage_date),
            Some(budget),
            Some(item),
            Some(bucket),
            Some(placement),
            Some(color_selection),
        ) = (
            answers.user_type,
            answers.usage_date,
            answers.budget,
            answers.item.clone(),
            answers.quantity.clone(),
            answers.placement,
            answers.color_selection.clone(),
        )
        else {
            return Err(FlowError::IncompleteRequest { missing });
        };

        let back_name = if placement.is_single_position() { None } else { answers.back_name };
        let request = QuoteRequest {
            item: item.clone(),
            quantity: bucket.quantity,
            discount_class: usage_date.discount_class(),
            surcharge: SurchargeStrategy::SelectionLookup(ChatPrint {
                placement,
                color_selection: color_selection.clone(),
                back_name,
            }),
        };
        let answers = ChatAnswers {
            user_type,
            usage_date,
            budget,
            item,
            quantity_label: bucket.label,
            quantity: bucket.quantity,
            placement,
            color_selection,
            back_name,
        };

        Ok(CompletedConversation { answers, request })
    }
}

impl FlowDefinition for QuoteConversationFlow {
    fn initial_step(&self) -> ConversationStep {
        ConversationStep::AwaitUserType
    }

    fn prompt(&self, step: ConversationStep, answers: &CollectedAnswers) -> Prompt {
        Prompt { step, options: self.legal_options(step, answers) }
    }

    fn transition(
        &self,
        state: &mut ConversationState,
        answer: &str,
    ) -> Result<TransitionOutcome, FlowError> {
        let answer = answer.trim();
        let from = state.step;
        let answers = &mut state.answers;

        let to = match from {
            ConversationStep::AwaitUserType => self.accept_user_type(answer, answers)?,
            ConversationStep::AwaitUsageDate => self.accept_usage_date(answer, answers)?,
            ConversationStep::AwaitBudget => self.accept_budget(answer, answers)?,
            ConversationStep::AwaitItem => self.accept_item(answer, answers)?,
            ConversationStep::AwaitQuantity => self.accept_quantity(answer, answers)?,
            ConversationStep::AwaitPrintPosition => self.accept_print_position(answer, answers)?,
            ConversationStep::AwaitColorCount => self.accept_color_count(answer, answers)?,
            ConversationStep::AwaitBackName => self.accept_back_name(answer, answers)?,
            ConversationStep::Complete => return Err(invalid(from, answer)),
        };

        let directive = if to == ConversationStep::Complete {
            FlowDirective::Complete(Box::new(self.complete(answers)?))
        } else {
            FlowDirective::Ask(self.prompt(to, answers))
        };
        state.step = to;

        Ok(TransitionOutcome { from, to, directive })
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    /// A fresh state and the first prompt.
    pub fn start(&self) -> (ConversationState, Prompt) {
        let state = ConversationState {
            step: self.flow.initial_step(),
            answers: CollectedAnswers::default(),
        };
        let prompt = self.flow.prompt(state.step, &state.answers);
        (state, prompt)
    }

    pub fn prompt(&self, state: &ConversationState) -> Prompt {
        self.flow.prompt(state.step, &state.answers)
    }

    /// Applies one answer. An error means the conversation must be abandoned.
    pub fn apply(
        &self,
        state: &mut ConversationState,
        answer: &str,
    ) -> Result<TransitionOutcome, FlowError> {
        self.flow.transition(state, answer)
    }

    pub fn apply_with_audit<S>(
        &self,
        state: &mut ConversationState,
        answer: &str,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowError>
    where
        S: AuditSink + ?Sized,
    {
        let from = state.step;
        let result = self.apply(state, answer);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.quote_id.clone(),
                        audit.requester_id.clone(),
                        audit.correlation_id.clone(),
                        "conversation.answer_accepted",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.quote_id.clone(),
                        audit.requester_id.clone(),
                        audit.correlation_id.clone(),
                        "conversation.answer_rejected",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("from", from.as_str())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl FlowEngine<QuoteConversationFlow> {
    pub fn for_catalog(catalog: Arc<PricingCatalog>) -> Self {
        Self::new(QuoteConversationFlow::new(catalog))
    }
}

fn invalid(step: ConversationStep, answer: &str) -> FlowError {
    FlowError::InvalidAnswer { step, answer: answer.to_owned() }
}

fn labels<const N: usize>(values: [&'static str; N]) -> Vec<String> {
    values.into_iter().map(str::to_owned).collect()
}
