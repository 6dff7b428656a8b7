use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::position::NameNumberOption;

/// Integer amount in the smallest currency unit (yen).
pub type Yen = u64;

/// Renders an amount with thousands separators, e.g. `42,000`.
pub fn format_yen(amount: Yen) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountClass {
    Early,
    Standard,
}

impl DiscountClass {
    pub const ALL: [DiscountClass; 2] = [Self::Early, Self::Standard];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Standard => "standard",
        }
    }

    /// Label shown to requesters (早割 / 通常).
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Early => "早割",
            Self::Standard => "通常",
        }
    }
}

impl fmt::Display for DiscountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One priced bracket of (item, quantity range, discount class).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub item: String,
    pub min_qty: u32,
    pub max_qty: u32,
    pub discount_class: DiscountClass,
    pub unit_price: Yen,
    pub color_add_fee: Yen,
    pub position_add_fee: Yen,
    pub full_color_add_fee: Yen,
    pub set_fee: Yen,
    pub big_name_fee: Yen,
    pub small_name_fee: Yen,
    pub big_number_fee: Yen,
    pub small_number_fee: Yen,
}

impl PriceTier {
    pub fn contains(&self, quantity: u32) -> bool {
        (self.min_qty..=self.max_qty).contains(&quantity)
    }

    pub fn matches(&self, item: &str, discount_class: DiscountClass, quantity: u32) -> bool {
        self.item == item && self.discount_class == discount_class && self.contains(quantity)
    }

    /// Chat-flow back-name fee carried by the tier itself.
    pub fn name_number_fee(&self, option: NameNumberOption) -> Yen {
        match option {
            NameNumberOption::Set => self.set_fee,
            NameNumberOption::BigName => self.big_name_fee,
            NameNumberOption::SmallName => self.small_name_fee,
            NameNumberOption::BigNumber => self.big_number_fee,
            NameNumberOption::SmallNumber => self.small_number_fee,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    /// Front only or back only.
    Single,
    /// Front and back.
    Dual,
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single"),
            Self::Dual => f.write_str("dual"),
        }
    }
}

/// A color-count answer and the surcharge units it stands for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSelection {
    pub label: String,
    pub extra_color_units: u32,
    pub full_color_units: u32,
}

/// Quantity answer offered by the chat flow and the quantity it is priced at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityBucket {
    pub label: String,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::{format_yen, DiscountClass, PriceTier};

    fn tier(min_qty: u32, max_qty: u32) -> PriceTier {
        PriceTier {
            item: "ゲームシャツ".to_owned(),
            min_qty,
            max_qty,
            discount_class: DiscountClass::Early,
            unit_price: 1650,
            color_add_fee: 450,
            position_add_fee: 450,
            full_color_add_fee: 650,
            set_fee: 800,
            big_name_fee: 550,
            small_name_fee: 300,
            big_number_fee: 550,
            small_number_fee: 300,
        }
    }

    #[test]
    fn yen_amounts_are_grouped_by_thousands() {
        assert_eq!(format_yen(0), "0");
        assert_eq!(format_yen(950), "950");
        assert_eq!(format_yen(2100), "2,100");
        assert_eq!(format_yen(1_234_567), "1,234,567");
    }

    #[test]
    fn tier_bounds_are_inclusive() {
        let tier = tier(20, 29);
        assert!(!tier.contains(19));
        assert!(tier.contains(20));
        assert!(tier.contains(29));
        assert!(!tier.contains(30));
    }

    #[test]
    fn tier_match_requires_exact_item_and_discount_class() {
        let tier = tier(20, 29);
        assert!(tier.matches("ゲームシャツ", DiscountClass::Early, 25));
        assert!(!tier.matches("ゲームシャツ", DiscountClass::Standard, 25));
        assert!(!tier.matches("バスケシャツ", DiscountClass::Early, 25));
    }
}
