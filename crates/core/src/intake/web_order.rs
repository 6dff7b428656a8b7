//! Web-order form payloads and their conversion into quote requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::IntakeError;
use crate::domain::catalog::DiscountClass;
use crate::domain::position::{
    FullColorSize, NameNumberOption, PrintPosition, MAX_COLORS_PER_POSITION, MAX_PRINT_POSITIONS,
};
use crate::domain::quote::{QuoteRequest, SurchargeStrategy, WebOrderDetails};

const EARLY_DISCOUNT_OPTION: &str = "早割";
const NOT_SELECTED: &str = "なし";
const BORDERED_EDGE: &str = "フチ付き";

/// Flat per-position form keys (`<prefix><p>`) and the block field each maps to.
const FLAT_POSITION_FIELDS: [(&str, &str); 9] = [
    ("printPositionNo", "position"),
    ("fullColorSize", "fullColorSize"),
    ("nameNumberOption", "nameNumberOption"),
    ("nameNumberPrintType", "nameNumberPrintType"),
    ("singleColor", "singleColor"),
    ("edgeType", "edgeType"),
    ("fontType", "fontType"),
    ("designCode", "designCode"),
    ("designSize", "designSize"),
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebOrderContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub school_name: Option<String>,
}

/// One print-position block of the form. Blank `position` means unused.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPositionBlock {
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub full_color_size: Option<String>,
    #[serde(default)]
    pub name_number_option: Option<String>,
    #[serde(default)]
    pub name_number_print_type: Option<String>,
    #[serde(default)]
    pub single_color: Option<String>,
    #[serde(default)]
    pub edge_type: Option<String>,
    #[serde(default)]
    pub font_type: Option<String>,
    #[serde(default)]
    pub design_code: Option<String>,
    #[serde(default)]
    pub design_size: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebOrderForm {
    #[serde(default, alias = "lineUserId")]
    pub requester_id: Option<String>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_no: Option<String>,
    #[serde(default)]
    pub color_no: Option<String>,
    #[serde(default, rename = "size150", deserialize_with = "count")]
    pub size_150: u32,
    #[serde(default, rename = "sizeSS", deserialize_with = "count")]
    pub size_ss: u32,
    #[serde(default, rename = "sizeS", deserialize_with = "count")]
    pub size_s: u32,
    #[serde(default, rename = "sizeM", deserialize_with = "count")]
    pub size_m: u32,
    #[serde(default, rename = "sizeL", deserialize_with = "count")]
    pub size_l: u32,
    #[serde(default, rename = "sizeXL", deserialize_with = "count")]
    pub size_xl: u32,
    #[serde(default, rename = "sizeXXL", deserialize_with = "count")]
    pub size_xxl: u32,
    #[serde(default, deserialize_with = "optional_count")]
    pub total_quantity: Option<u32>,
    #[serde(default)]
    pub positions: Vec<WebPositionBlock>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub use_date: Option<String>,
    #[serde(default)]
    pub application_date: Option<String>,
    #[serde(default)]
    pub discount_option: Option<String>,
    #[serde(default)]
    pub contact: WebOrderContact,
}

/// A form turned into a priceable request plus the details kept for the record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebOrderIntake {
    pub requester_id: Option<String>,
    pub request: QuoteRequest,
    pub details: WebOrderDetails,
}

impl WebOrderForm {
    /// Parses a submitted form. Accepts either a nested `positions` array or the
    /// flat `printPositionNo1`, `printColorOption1_1`, ... keys posted by the HTML form.
    pub fn from_json(raw: &str) -> Result<Self, IntakeError> {
        let malformed = |error: serde_json::Error| IntakeError::Malformed(error.to_string());
        let mut document = serde_json::from_str::<Value>(raw).map_err(malformed)?;
        if let Value::Object(fields) = &mut document {
            if !fields.contains_key("positions") {
                let blocks = take_flat_positions(fields);
                if !blocks.is_empty() {
                    fields.insert("positions".to_owned(), Value::Array(blocks));
                }
            }
        }
        serde_json::from_value(document).map_err(malformed)
    }

    pub fn sizes(&self) -> BTreeMap<String, u32> {
        [
            ("150", self.size_150),
            ("SS", self.size_ss),
            ("S", self.size_s),
            ("M", self.size_m),
            ("L", self.size_l),
            ("XL", self.size_xl),
            ("XXL", self.size_xxl),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(size, count)| (size.to_owned(), count))
        .collect()
    }

    /// Sum of the per-size counts, checked against a declared total.
    pub fn quantity(&self) -> Result<u32, IntakeError> {
        let sizes = self.sizes();
        let counted = sizes
            .values()
            .try_fold(0_u32, |total, count| total.checked_add(*count))
            .ok_or_else(|| IntakeError::InvalidAnswer {
                field: "sizes".to_owned(),
                value: sizes
                    .iter()
                    .map(|(size, count)| format!("{size}={count}"))
                    .collect::<Vec<_>>()
                    .join(","),
            })?;
        match (counted, self.total_quantity) {
            (0, Some(declared)) if declared > 0 => Ok(declared),
            (0, _) => Err(IntakeError::Incomplete("garment quantity".to_owned())),
            (counted, Some(declared)) if declared != counted => Err(IntakeError::InvalidAnswer {
                field: "totalQuantity".to_owned(),
                value: declared.to_string(),
            }),
            (counted, _) => Ok(counted),
        }
    }

    pub fn discount_class(&self) -> DiscountClass {
        match self.discount_option.as_deref().map(str::trim) {
            Some(EARLY_DISCOUNT_OPTION) => DiscountClass::Early,
            _ => DiscountClass::Standard,
        }
    }

    /// Active position blocks converted to [`PrintPosition`]s, numbered 1..=4.
    pub fn print_positions(&self) -> Result<Vec<PrintPosition>, IntakeError> {
        let active: Vec<&WebPositionBlock> =
            self.positions.iter().filter(|block| !block.position.trim().is_empty()).collect();
        if active.is_empty() {
            return Err(IntakeError::Incomplete("an active print position".to_owned()));
        }
        if active.len() > MAX_PRINT_POSITIONS {
            return Err(IntakeError::InvalidAnswer {
                field: "positions".to_owned(),
                value: format!("{} active positions", active.len()),
            });
        }

        active
            .into_iter()
            .enumerate()
            .map(|(index, block)| convert_block(index, block))
            .collect()
    }

    pub fn into_intake(self) -> Result<WebOrderIntake, IntakeError> {
        let item = self.product_name.trim().to_owned();
        if item.is_empty() {
            return Err(IntakeError::Incomplete("productName".to_owned()));
        }
        let quantity = self.quantity()?;
        let positions = self.print_positions()?;

        let request = QuoteRequest {
            item,
            quantity,
            discount_class: self.discount_class(),
            surcharge: SurchargeStrategy::PerPositionCount { positions: positions.clone() },
        };
        let details = WebOrderDetails {
            product_no: selected(self.product_no.as_deref()),
            color_no: selected(self.color_no.as_deref()),
            sizes: self.sizes(),
            positions,
            delivery_date: selected(self.delivery_date.as_deref()),
            use_date: selected(self.use_date.as_deref()),
            contact_name: selected(self.contact.name.as_deref()),
            contact_email: selected(self.contact.email.as_deref()),
        };
        let requester_id = selected(self.requester_id.as_deref());

        Ok(WebOrderIntake { requester_id, request, details })
    }
}

fn convert_block(index: usize, block: &WebPositionBlock) -> Result<PrintPosition, IntakeError> {
    let field = |name: &str| format!("positions[{index}].{name}");

    let colors: Vec<String> = block
        .colors
        .iter()
        .map(|color| color.trim())
        .filter(|color| !color.is_empty() && *color != NOT_SELECTED)
        .map(str::to_owned)
        .collect();
    if colors.len() > MAX_COLORS_PER_POSITION {
        return Err(IntakeError::InvalidAnswer {
            field: field("colors"),
            value: colors.join(","),
        });
    }

    let full_color_size = match selected(block.full_color_size.as_deref()) {
        None => None,
        Some(label) => Some(FullColorSize::from_label(&label).ok_or_else(|| {
            IntakeError::InvalidAnswer { field: field("fullColorSize"), value: label.clone() }
        })?),
    };

    let name_number = match selected(block.name_number_option.as_deref()) {
        None => None,
        Some(label) => Some(NameNumberOption::from_label(&label).ok_or_else(|| {
            IntakeError::InvalidAnswer { field: field("nameNumberOption"), value: label.clone() }
        })?),
    };

    let bordered_text = match selected(block.edge_type.as_deref()) {
        None => false,
        Some(label) if label == BORDERED_EDGE => true,
        Some(label) => {
            return Err(IntakeError::InvalidAnswer { field: field("edgeType"), value: label })
        }
    };

    Ok(PrintPosition {
        position_id: u8::try_from(index + 1).unwrap_or(u8::MAX),
        placement: block.position.trim().to_owned(),
        colors,
        full_color_size,
        name_number,
        special_single_color: selected(block.single_color.as_deref()),
        bordered_text,
    })
}

/// Removes the flat per-position keys and regroups them into position blocks,
/// one per position number that carries any key.
fn take_flat_positions(fields: &mut Map<String, Value>) -> Vec<Value> {
    (1..=MAX_PRINT_POSITIONS)
        .filter_map(|number| {
            let mut block = Map::new();
            for (prefix, target) in FLAT_POSITION_FIELDS {
                if let Some(value) = fields.remove(&format!("{prefix}{number}")) {
                    block.insert(target.to_owned(), value);
                }
            }
            let colors: Vec<Value> = (1..=MAX_COLORS_PER_POSITION)
                .filter_map(|slot| fields.remove(&format!("printColorOption{number}_{slot}")))
                .collect();
            if !colors.is_empty() {
                block.insert("colors".to_owned(), Value::Array(colors));
            }
            (!block.is_empty()).then_some(Value::Object(block))
        })
        .collect()
}

/// Trimmed value, or `None` when blank or explicitly not selected.
fn selected(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != NOT_SELECTED)
        .map(str::to_owned)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(u32),
    Text(String),
}

fn parse_count<E: serde::de::Error>(raw: Option<RawCount>) -> Result<Option<u32>, E> {
    match raw {
        None => Ok(None),
        Some(RawCount::Number(value)) => Ok(Some(value)),
        Some(RawCount::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawCount::Text(text)) => text
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| E::custom(format!("`{text}` is not a garment count"))),
    }
}

fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawCount>::deserialize(deserializer)?;
    Ok(parse_count(raw)?.unwrap_or_default())
}

fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    parse_count(Option::<RawCount>::deserialize(deserializer)?)
}
