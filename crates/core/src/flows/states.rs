use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::answers::{Budget, ChatAnswers, PrintPlacement, UsageDate, UserType};
use crate::domain::catalog::{DiscountClass, QuantityBucket};
use crate::domain::position::NameNumberOption;
use crate::domain::quote::QuoteRequest;

/// Steps of the quoting conversation, in the only order they can occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    AwaitUserType,
    AwaitUsageDate,
    AwaitBudget,
    AwaitItem,
    AwaitQuantity,
    AwaitPrintPosition,
    AwaitColorCount,
    AwaitBackName,
    Complete,
}

impl ConversationStep {
    /// 1-based position in the conversation.
    pub fn ordinal(self) -> u8 {
        match self {
            Self::AwaitUserType => 1,
            Self::AwaitUsageDate => 2,
            Self::AwaitBudget => 3,
            Self::AwaitItem => 4,
            Self::AwaitQuantity => 5,
            Self::AwaitPrintPosition => 6,
            Self::AwaitColorCount => 7,
            Self::AwaitBackName => 8,
            Self::Complete => 9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitUserType => "await_user_type",
            Self::AwaitUsageDate => "await_usage_date",
            Self::AwaitBudget => "await_budget",
            Self::AwaitItem => "await_item",
            Self::AwaitQuantity => "await_quantity",
            Self::AwaitPrintPosition => "await_print_position",
            Self::AwaitColorCount => "await_color_count",
            Self::AwaitBackName => "await_back_name",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers gathered so far; each field is filled by exactly one step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedAnswers {
    pub user_type: Option<UserType>,
    pub usage_date: Option<UsageDate>,
    pub budget: Option<Budget>,
    pub item: Option<String>,
    pub quantity: Option<QuantityBucket>,
    pub placement: Option<PrintPlacement>,
    pub color_selection: Option<String>,
    pub back_name: Option<NameNumberOption>,
}

impl CollectedAnswers {
    /// Known once the print-position step has been answered.
    pub fn is_single_position(&self) -> Option<bool> {
        self.placement.map(PrintPlacement::is_single_position)
    }

    pub fn discount_class(&self) -> Option<DiscountClass> {
        self.usage_date.map(UsageDate::discount_class)
    }

    /// Names of the answers still missing for a finished quote.
    pub fn missing(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let mut require = |present: bool, name: &str| {
            if !present {
                missing.push(name.to_owned());
            }
        };
        require(self.user_type.is_some(), "user_type");
        require(self.usage_date.is_some(), "usage_date");
        require(self.budget.is_some(), "budget");
        require(self.item.is_some(), "item");
        require(self.quantity.is_some(), "quantity");
        require(self.placement.is_some(), "print_position");
        require(self.color_selection.is_some(), "color_count");
        missing
    }
}

/// What the requester is asked next: the step and its legal answers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub step: ConversationStep,
    pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedConversation {
    pub answers: ChatAnswers,
    pub request: QuoteRequest,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirective {
    Ask(Prompt),
    Complete(Box<CompletedConversation>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: ConversationStep,
    pub to: ConversationStep,
    pub directive: FlowDirective,
}

#[cfg(test)]
mod tests {
    use super::{CollectedAnswers, ConversationStep};
    use crate::domain::answers::PrintPlacement;

    #[test]
    fn ordinals_follow_declaration_order() {
        assert_eq!(ConversationStep::AwaitUserType.ordinal(), 1);
        assert_eq!(ConversationStep::AwaitBackName.ordinal(), 8);
        assert!(ConversationStep::AwaitColorCount < ConversationStep::AwaitBackName);
    }

    #[test]
    fn single_position_flag_is_derived_from_placement() {
        let mut answers = CollectedAnswers::default();
        assert_eq!(answers.is_single_position(), None);

        answers.placement = Some(PrintPlacement::BackOnly);
        assert_eq!(answers.is_single_position(), Some(true));

        answers.placement = Some(PrintPlacement::FrontAndBack);
        assert_eq!(answers.is_single_position(), Some(false));
    }

    #[test]
    fn empty_answers_report_every_required_field() {
        let missing = CollectedAnswers::default().missing();
        assert_eq!(missing.len(), 7);
        assert_eq!(missing.first().map(String::as_str), Some("user_type"));
    }
}
