//! Typed answers collected by the chat quoting flow.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{format_yen, DiscountClass, SelectionKind, Yen};
use crate::domain::position::NameNumberOption;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Student,
    General,
}

impl UserType {
    pub const ALL: [UserType; 2] = [Self::Student, Self::General];

    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "学生",
            Self::General => "一般",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|value| value.label() == label)
    }
}

/// How far ahead of ordering the garments will be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageDate {
    FourteenDaysOrLater,
    WithinFourteenDays,
}

impl UsageDate {
    pub const ALL: [UsageDate; 2] = [Self::FourteenDaysOrLater, Self::WithinFourteenDays];

    pub fn label(self) -> &'static str {
        match self {
            Self::FourteenDaysOrLater => "14日目以降",
            Self::WithinFourteenDays => "14日目以内",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|value| value.label() == label)
    }

    pub fn discount_class(self) -> DiscountClass {
        match self {
            Self::FourteenDaysOrLater => DiscountClass::Early,
            Self::WithinFourteenDays => DiscountClass::Standard,
        }
    }
}

/// Per-garment budget the requester is aiming for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "yen")]
pub enum Budget {
    Unspecified,
    Cap(Yen),
}

const BUDGET_CAPS: [Yen; 6] = [1_000, 1_500, 2_000, 2_500, 3_000, 3_500];

impl Budget {
    pub fn options() -> Vec<Budget> {
        std::iter::once(Self::Unspecified).chain(BUDGET_CAPS.into_iter().map(Self::Cap)).collect()
    }

    pub fn label(self) -> String {
        match self {
            Self::Unspecified => "特になし".to_owned(),
            Self::Cap(yen) => format!("{}円以内", format_yen(yen)),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::options().into_iter().find(|value| value.label() == label)
    }

    /// `None` when no cap was chosen.
    pub fn admits(self, unit_price: Yen) -> Option<bool> {
        match self {
            Self::Unspecified => None,
            Self::Cap(cap) => Some(unit_price <= cap),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintPlacement {
    FrontOnly,
    BackOnly,
    FrontAndBack,
}

impl PrintPlacement {
    pub const ALL: [PrintPlacement; 3] = [Self::FrontOnly, Self::BackOnly, Self::FrontAndBack];

    pub fn label(self) -> &'static str {
        match self {
            Self::FrontOnly => "前のみ",
            Self::BackOnly => "背中のみ",
            Self::FrontAndBack => "前と背中",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|value| value.label() == label)
    }

    pub fn selection_kind(self) -> SelectionKind {
        match self {
            Self::FrontOnly | Self::BackOnly => SelectionKind::Single,
            Self::FrontAndBack => SelectionKind::Dual,
        }
    }

    pub fn is_single_position(self) -> bool {
        self.selection_kind() == SelectionKind::Single
    }
}

/// Back-name answers offered for front-and-back prints.
pub const BACK_NAME_OPTIONS: [NameNumberOption; 3] =
    [NameNumberOption::Set, NameNumberOption::BigName, NameNumberOption::BigNumber];

pub const NO_BACK_NAME_LABEL: &str = "背ネーム・番号を使わない";

pub fn back_name_label(choice: Option<NameNumberOption>) -> &'static str {
    match choice {
        Some(option) => option.label(),
        None => NO_BACK_NAME_LABEL,
    }
}

/// A finished chat answer set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswers {
    pub user_type: UserType,
    pub usage_date: UsageDate,
    pub budget: Budget,
    pub item: String,
    pub quantity_label: String,
    pub quantity: u32,
    pub placement: PrintPlacement,
    pub color_selection: String,
    pub back_name: Option<NameNumberOption>,
}
