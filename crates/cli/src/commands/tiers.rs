use printquote_core::domain::catalog::{format_yen, PriceTier};

use crate::commands::{load_catalog, CommandResult, EXIT_INVALID_INPUT};

const COMMAND: &str = "tiers";

pub fn run(item: Option<&str>) -> CommandResult {
    let catalog = match load_catalog(COMMAND) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };

    if let Some(item) = item {
        if !catalog.has_item(item) {
            return CommandResult::failure(
                COMMAND,
                "unknown_item",
                format!("`{item}` is not in price table `{}`", catalog.origin()),
                EXIT_INVALID_INPUT,
            );
        }
    }

    let tiers: Vec<&PriceTier> = catalog
        .tiers()
        .iter()
        .filter(|tier| item.map_or(true, |item| tier.item == item))
        .collect();

    let mut lines = vec![format!("price table `{}`: {} tiers", catalog.origin(), tiers.len())];
    lines.extend(tiers.into_iter().map(render_tier));

    CommandResult::success(COMMAND, lines.join("\n"))
}

fn render_tier(tier: &PriceTier) -> String {
    format!(
        "- {} [{}] {}..={}: ¥{} (color +¥{}, position +¥{}, full color +¥{})",
        tier.item,
        tier.discount_class.display_label(),
        tier.min_qty,
        tier.max_qty,
        format_yen(tier.unit_price),
        format_yen(tier.color_add_fee),
        format_yen(tier.position_add_fee),
        format_yen(tier.full_color_add_fee)
    )
}
