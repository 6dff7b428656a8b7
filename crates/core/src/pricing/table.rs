//! Price table loading, expansion and validation.
//!
//! The table document lists shared quantity brackets and one price row per
//! item and discount class. Loading expands it into a flat, ordered list of
//! [`PriceTier`] records and checks the coverage rules before anything can
//! be priced against it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::catalog::{
    ColorSelection, DiscountClass, PriceTier, QuantityBucket, SelectionKind, Yen,
};
use crate::domain::position::{FullColorSize, NameNumberOption};

const BUILTIN_TABLE: &str = include_str!("../../data/price_table_2025.toml");
const BUILTIN_ORIGIN: &str = "builtin:price_table_2025";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read price table `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse price table `{origin}`: {source}")]
    Parse { origin: String, source: toml::de::Error },
    #[error(
        "price row for `{item}` ({discount_class}) has {found} entries but {expected} brackets are defined"
    )]
    RowLength { item: String, discount_class: DiscountClass, expected: usize, found: usize },
    #[error("unknown name/number option `{0}` in web order fees")]
    UnknownNameNumberOption(String),
    #[error("price table validation failed: {0}")]
    Validation(String),
}

/// Flat surcharges used by the web-order flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebOrderFees {
    pub option_ink_fee: Yen,
    pub bordered_text_fee: Yen,
    pub option_ink_colors: BTreeSet<String>,
    pub full_color_size_fees: BTreeMap<FullColorSize, Yen>,
    pub name_number_option_fees: BTreeMap<NameNumberOption, Yen>,
    pub special_single_color_fees: BTreeMap<String, Yen>,
}

impl WebOrderFees {
    pub fn full_color_size_fee(&self, size: FullColorSize) -> Yen {
        self.full_color_size_fees.get(&size).copied().unwrap_or_default()
    }

    pub fn name_number_option_fee(&self, option: NameNumberOption) -> Yen {
        self.name_number_option_fees.get(&option).copied().unwrap_or_default()
    }

    pub fn special_single_color_fee(&self, color: &str) -> Option<Yen> {
        self.special_single_color_fees.get(color).copied()
    }

    pub fn is_option_ink(&self, color: &str) -> bool {
        self.option_ink_colors.contains(color)
    }
}

/// Immutable price table plus the option tables the intake flows offer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingCatalog {
    origin: String,
    tiers: Vec<PriceTier>,
    items: Vec<String>,
    quantity_buckets: Vec<QuantityBucket>,
    single_selections: Vec<ColorSelection>,
    dual_selections: Vec<ColorSelection>,
    web_order: WebOrderFees,
}

impl PricingCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_TABLE, BUILTIN_ORIGIN)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw, &path.display().to_string())
    }

    /// Loads the replacement table at `table_path`, or the built-in one.
    pub fn load(table_path: Option<&Path>) -> Result<Self, CatalogError> {
        match table_path {
            Some(path) => Self::from_path(path),
            None => Self::builtin(),
        }
    }

    pub fn from_toml_str(raw: &str, origin: &str) -> Result<Self, CatalogError> {
        let document = toml::from_str::<RawTable>(raw)
            .map_err(|source| CatalogError::Parse { origin: origin.to_owned(), source })?;
        let catalog = expand(document, origin)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn tiers(&self) -> &[PriceTier] {
        &self.tiers
    }

    /// Item names in table order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.items.iter().any(|candidate| candidate == item)
    }

    pub fn quantity_buckets(&self) -> &[QuantityBucket] {
        &self.quantity_buckets
    }

    pub fn quantity_bucket(&self, label: &str) -> Option<&QuantityBucket> {
        self.quantity_buckets.iter().find(|bucket| bucket.label == label)
    }

    pub fn selections(&self, kind: SelectionKind) -> &[ColorSelection] {
        match kind {
            SelectionKind::Single => &self.single_selections,
            SelectionKind::Dual => &self.dual_selections,
        }
    }

    /// Looks `label` up in the table for `kind` only.
    pub fn selection(&self, kind: SelectionKind, label: &str) -> Option<&ColorSelection> {
        self.selections(kind).iter().find(|selection| selection.label == label)
    }

    pub fn web_order_fees(&self) -> &WebOrderFees {
        &self.web_order
    }

    /// First tier matching item, discount class and quantity.
    pub fn find_tier(
        &self,
        item: &str,
        discount_class: DiscountClass,
        quantity: u32,
    ) -> Option<&PriceTier> {
        self.tiers.iter().find(|tier| tier.matches(item, discount_class, quantity))
    }

    /// Lowest and highest quantity any tier accepts.
    pub fn quantity_domain(&self) -> Option<(u32, u32)> {
        let min = self.tiers.iter().map(|tier| tier.min_qty).min()?;
        let max = self.tiers.iter().map(|tier| tier.max_qty).max()?;
        Some((min, max))
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(issues.join("; ")))
        }
    }

    /// Every rule violation found in the table, in a stable order.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let Some((domain_min, domain_max)) = self.quantity_domain() else {
            issues.push("price table defines no tiers".to_owned());
            return issues;
        };

        for item in &self.items {
            for discount_class in DiscountClass::ALL {
                check_coverage(
                    &self.tiers,
                    item,
                    discount_class,
                    (domain_min, domain_max),
                    &mut issues,
                );
            }
        }

        for early in self.tiers.iter().filter(|tier| tier.discount_class == DiscountClass::Early) {
            let standard = self.tiers.iter().find(|tier| {
                tier.item == early.item
                    && tier.discount_class == DiscountClass::Standard
                    && tier.min_qty == early.min_qty
                    && tier.max_qty == early.max_qty
            });
            if let Some(standard) = standard {
                if early.unit_price > standard.unit_price {
                    issues.push(format!(
                        "`{}` {}..={}: early price {} exceeds standard price {}",
                        early.item,
                        early.min_qty,
                        early.max_qty,
                        early.unit_price,
                        standard.unit_price
                    ));
                }
            }
        }

        for bucket in &self.quantity_buckets {
            for item in &self.items {
                for discount_class in DiscountClass::ALL {
                    if self.find_tier(item, discount_class, bucket.quantity).is_none() {
                        issues.push(format!(
                            "quantity bucket `{}` ({}) has no {discount_class} tier for `{item}`",
                            bucket.label, bucket.quantity
                        ));
                    }
                }
            }
        }

        if self.single_selections.is_empty() {
            issues.push("single-position color selections are empty".to_owned());
        }
        if self.dual_selections.is_empty() {
            issues.push("front-and-back color selections are empty".to_owned());
        }
        for single in &self.single_selections {
            if self.dual_selections.iter().any(|dual| dual.label == single.label) {
                issues.push(format!(
                    "color selection `{}` appears in both single and front-and-back tables",
                    single.label
                ));
            }
        }

        issues
    }
}

fn check_coverage(
    tiers: &[PriceTier],
    item: &str,
    discount_class: DiscountClass,
    (domain_min, domain_max): (u32, u32),
    issues: &mut Vec<String>,
) {
    let mut ranges: Vec<(u32, u32)> = tiers
        .iter()
        .filter(|tier| tier.item == item && tier.discount_class == discount_class)
        .map(|tier| (tier.min_qty, tier.max_qty))
        .collect();
    ranges.sort_unstable();

    let Some(&(first_min, _)) = ranges.first() else {
        issues.push(format!("`{item}` has no {discount_class} tiers"));
        return;
    };
    if first_min > domain_min {
        issues.push(format!("`{item}` ({discount_class}) leaves {domain_min}..{first_min} uncovered"));
    }

    let mut covered_to: Option<u32> = None;
    for (min_qty, max_qty) in ranges {
        if min_qty > max_qty {
            issues.push(format!(
                "`{item}` ({discount_class}) has inverted range {min_qty}..={max_qty}"
            ));
            continue;
        }
        if let Some(previous_max) = covered_to {
            if min_qty <= previous_max {
                issues.push(format!(
                    "`{item}` ({discount_class}) range {min_qty}..={max_qty} overlaps a range ending at {previous_max}"
                ));
            } else if min_qty > previous_max.saturating_add(1) {
                issues.push(format!(
                    "`{item}` ({discount_class}) has a gap between {previous_max} and {min_qty}"
                ));
            }
        }
        covered_to = Some(covered_to.map_or(max_qty, |previous| previous.max(max_qty)));
    }

    if let Some(last_max) = covered_to {
        if last_max < domain_max {
            issues.push(format!(
                "`{item}` ({discount_class}) leaves {}..={domain_max} uncovered",
                last_max.saturating_add(1)
            ));
        }
    }
}

fn expand(document: RawTable, origin: &str) -> Result<PricingCatalog, CatalogError> {
    let mut tiers = Vec::with_capacity(document.items.len() * document.brackets.len() * 2);
    let mut items = Vec::with_capacity(document.items.len());
    let fees = &document.name_number_fees;

    for row in &document.items {
        items.push(row.name.clone());
        for (discount_class, prices) in
            [(DiscountClass::Early, &row.early), (DiscountClass::Standard, &row.standard)]
        {
            if prices.len() != document.brackets.len() {
                return Err(CatalogError::RowLength {
                    item: row.name.clone(),
                    discount_class,
                    expected: document.brackets.len(),
                    found: prices.len(),
                });
            }
            for (bracket, unit_price) in document.brackets.iter().zip(prices) {
                tiers.push(PriceTier {
                    item: row.name.clone(),
                    min_qty: bracket.min_qty,
                    max_qty: bracket.max_qty,
                    discount_class,
                    unit_price: *unit_price,
                    color_add_fee: bracket.color_add_fee,
                    position_add_fee: bracket.position_add_fee,
                    full_color_add_fee: bracket.full_color_add_fee,
                    set_fee: fees.set_fee,
                    big_name_fee: fees.big_name_fee,
                    small_name_fee: fees.small_name_fee,
                    big_number_fee: fees.big_number_fee,
                    small_number_fee: fees.small_number_fee,
                });
            }
        }
    }

    let raw_web = document.web_order;
    let mut name_number_option_fees = BTreeMap::new();
    for (label, fee) in raw_web.name_number_option_fees {
        let option = NameNumberOption::from_label(&label)
            .ok_or(CatalogError::UnknownNameNumberOption(label))?;
        name_number_option_fees.insert(option, fee);
    }

    let web_order = WebOrderFees {
        option_ink_fee: raw_web.option_ink_fee,
        bordered_text_fee: raw_web.bordered_text_fee,
        option_ink_colors: raw_web.option_ink_colors.into_iter().collect(),
        full_color_size_fees: BTreeMap::from([
            (FullColorSize::Small, raw_web.full_color_size_fees.small),
            (FullColorSize::Medium, raw_web.full_color_size_fees.medium),
            (FullColorSize::Large, raw_web.full_color_size_fees.large),
        ]),
        name_number_option_fees,
        special_single_color_fees: raw_web.special_single_color_fees,
    };

    Ok(PricingCatalog {
        origin: origin.to_owned(),
        tiers,
        items,
        quantity_buckets: document.quantity_buckets,
        single_selections: document.color_selections.single,
        dual_selections: document.color_selections.dual,
        web_order,
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    brackets: Vec<RawBracket>,
    name_number_fees: RawNameNumberFees,
    items: Vec<RawItem>,
    quantity_buckets: Vec<QuantityBucket>,
    color_selections: RawColorSelections,
    web_order: RawWebOrder,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBracket {
    min_qty: u32,
    max_qty: u32,
    color_add_fee: Yen,
    position_add_fee: Yen,
    full_color_add_fee: Yen,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNameNumberFees {
    set_fee: Yen,
    big_name_fee: Yen,
    small_name_fee: Yen,
    big_number_fee: Yen,
    small_number_fee: Yen,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    name: String,
    early: Vec<Yen>,
    standard: Vec<Yen>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawColorSelections {
    single: Vec<ColorSelection>,
    dual: Vec<ColorSelection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWebOrder {
    option_ink_fee: Yen,
    bordered_text_fee: Yen,
    #[serde(default)]
    option_ink_colors: Vec<String>,
    full_color_size_fees: RawFullColorSizeFees,
    #[serde(default)]
    name_number_option_fees: BTreeMap<String, Yen>,
    #[serde(default)]
    special_single_color_fees: BTreeMap<String, Yen>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFullColorSizeFees {
    small: Yen,
    medium: Yen,
    large: Yen,
}
