use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const MAX_PRINT_POSITIONS: usize = 4;
pub const MAX_COLORS_PER_POSITION: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullColorSize {
    Small,
    Medium,
    Large,
}

impl FullColorSize {
    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "小",
            Self::Medium => "中",
            Self::Large => "大",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "小" => Some(Self::Small),
            "中" => Some(Self::Medium),
            "大" => Some(Self::Large),
            _ => None,
        }
    }
}

/// Name/number addon printed on a garment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameNumberOption {
    Set,
    BigName,
    SmallName,
    BigNumber,
    SmallNumber,
}

impl NameNumberOption {
    pub const ALL: [NameNumberOption; 5] =
        [Self::Set, Self::BigName, Self::SmallName, Self::BigNumber, Self::SmallNumber];

    pub fn label(self) -> &'static str {
        match self {
            Self::Set => "ネーム&背番号セット",
            Self::BigName => "ネーム(大)",
            Self::SmallName => "ネーム(小)",
            Self::BigNumber => "番号(大)",
            Self::SmallNumber => "番号(小)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.label() == label)
    }
}

impl fmt::Display for NameNumberOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One independent print placement of a web order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintPosition {
    /// 1..=4, in the order the form listed the position blocks.
    pub position_id: u8,
    /// Where the print goes (前, 背中, 袖 ...).
    pub placement: String,
    pub colors: Vec<String>,
    pub full_color_size: Option<FullColorSize>,
    pub name_number: Option<NameNumberOption>,
    pub special_single_color: Option<String>,
    pub bordered_text: bool,
}

impl PrintPosition {
    /// Non-empty color slots, deduplicated.
    pub fn distinct_colors(&self) -> BTreeSet<&str> {
        self.colors
            .iter()
            .map(|color| color.trim())
            .filter(|color| !color.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{FullColorSize, NameNumberOption, PrintPosition};

    #[test]
    fn distinct_colors_skip_blank_and_repeated_slots() {
        let position = PrintPosition {
            position_id: 1,
            placement: "前".to_owned(),
            colors: vec!["白".to_owned(), " ".to_owned(), "白".to_owned()],
            ..PrintPosition::default()
        };

        assert_eq!(position.distinct_colors().into_iter().collect::<Vec<_>>(), vec!["白"]);
    }

    #[test]
    fn labels_parse_back_to_their_option() {
        for option in NameNumberOption::ALL {
            assert_eq!(NameNumberOption::from_label(option.label()), Some(option));
        }
        assert_eq!(NameNumberOption::from_label("背ネーム・番号を使わない"), None);
        assert_eq!(FullColorSize::from_label("中"), Some(FullColorSize::Medium));
        assert_eq!(FullColorSize::from_label("特大"), None);
    }
}
