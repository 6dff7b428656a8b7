//! The two surcharge rules. Each intake flow produces exactly one of them and
//! they are kept apart on purpose: the chat flow charges from a fixed
//! color-selection table, the web-order flow counts color slots per position.

use crate::domain::answers::PrintPlacement;
use crate::domain::catalog::{PriceTier, Yen};
use crate::domain::position::{PrintPosition, MAX_COLORS_PER_POSITION, MAX_PRINT_POSITIONS};
use crate::domain::quote::{ChatPrint, PricingTraceStep, SurchargeStrategy};
use crate::pricing::table::PricingCatalog;
use crate::pricing::PricingError;

/// Sum of surcharges on top of `tier.unit_price`, with one trace step per fee.
pub fn surcharge(
    strategy: &SurchargeStrategy,
    tier: &PriceTier,
    catalog: &PricingCatalog,
    trace: &mut Vec<PricingTraceStep>,
) -> Result<Yen, PricingError> {
    match strategy {
        SurchargeStrategy::SelectionLookup(print) => selection_lookup(print, tier, catalog, trace),
        SurchargeStrategy::PerPositionCount { positions } => {
            per_position_count(positions, tier, catalog, trace)
        }
    }
}

fn selection_lookup(
    print: &ChatPrint,
    tier: &PriceTier,
    catalog: &PricingCatalog,
    trace: &mut Vec<PricingTraceStep>,
) -> Result<Yen, PricingError> {
    let kind = print.placement.selection_kind();
    let selection = catalog.selection(kind, &print.color_selection).ok_or_else(|| {
        PricingError::SelectionMismatch { label: print.color_selection.clone(), kind }
    })?;

    let mut total = 0;
    if print.placement == PrintPlacement::FrontAndBack {
        total += push(trace, "position", "front and back", tier.position_add_fee);
    }

    let colors = Yen::from(selection.extra_color_units) * tier.color_add_fee;
    if colors > 0 {
        let detail = format!("{} x {}", selection.extra_color_units, tier.color_add_fee);
        total += push(trace, "colors", detail, colors);
    }
    let full_color = Yen::from(selection.full_color_units) * tier.full_color_add_fee;
    if full_color > 0 {
        let detail = format!("{} x {}", selection.full_color_units, tier.full_color_add_fee);
        total += push(trace, "full_color", detail, full_color);
    }

    // Back names are only offered for front-and-back prints.
    if !print.placement.is_single_position() {
        if let Some(option) = print.back_name {
            total += push(trace, "back_name", option.label(), tier.name_number_fee(option));
        }
    }

    Ok(total)
}

fn per_position_count(
    positions: &[PrintPosition],
    tier: &PriceTier,
    catalog: &PricingCatalog,
    trace: &mut Vec<PricingTraceStep>,
) -> Result<Yen, PricingError> {
    if positions.is_empty() {
        return Err(PricingError::IncompleteRequest("no active print position".to_owned()));
    }
    if positions.len() > MAX_PRINT_POSITIONS {
        return Err(PricingError::TooManyPositions { count: positions.len() });
    }

    let fees = catalog.web_order_fees();
    let mut total = 0;

    let extra_positions = Yen::try_from(positions.len() - 1).unwrap_or_default();
    if extra_positions > 0 {
        let detail = format!("{extra_positions} x {}", tier.position_add_fee);
        total += push(trace, "position", detail, extra_positions * tier.position_add_fee);
    }

    for position in positions {
        let stage = |name: &str| format!("position_{}.{name}", position.position_id);
        let colors = position.distinct_colors();
        if colors.len() > MAX_COLORS_PER_POSITION {
            return Err(PricingError::TooManyColors {
                position_id: position.position_id,
                count: colors.len(),
            });
        }

        let extra_colors = Yen::try_from(colors.len().saturating_sub(1)).unwrap_or_default();
        if extra_colors > 0 {
            let detail = format!("{} colors", colors.len());
            total += push(trace, stage("colors"), detail, extra_colors * tier.color_add_fee);
        }

        for color in colors.iter().filter(|color| fees.is_option_ink(color)) {
            total += push(trace, stage("option_ink"), *color, fees.option_ink_fee);
        }

        if let Some(size) = position.full_color_size {
            total += push(trace, stage("full_color"), size.label(), fees.full_color_size_fee(size));
        }

        if let Some(option) = position.name_number {
            let fee = fees.name_number_option_fee(option);
            total += push(trace, stage("name_number"), option.label(), fee);
        }

        if let Some(color) = position.special_single_color.as_deref() {
            if let Some(fee) = fees.special_single_color_fee(color) {
                total += push(trace, stage("special_color"), color, fee);
            }
        }

        if position.bordered_text {
            total += push(trace, stage("bordered_text"), "bordered", fees.bordered_text_fee);
        }
    }

    Ok(total)
}

fn push(
    trace: &mut Vec<PricingTraceStep>,
    stage: impl Into<String>,
    detail: impl Into<String>,
    amount: Yen,
) -> Yen {
    trace.push(PricingTraceStep { stage: stage.into(), detail: detail.into(), amount });
    amount
}
