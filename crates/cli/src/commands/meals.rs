//! Meal discovery.

use std::io::Write;

use clap::Args;
use feedme_core::discovery::{Discovery, PREFERENCES, Pagination, distinct_providers};

use super::{CommandError, Context, out};

#[derive(Args)]
pub struct MealsArgs {
    /// Match meal name or description
    #[arg(short, long, default_value = "")]
    search: String,

    /// Exact category
    #[arg(short, long)]
    category: Option<String>,

    /// Minimum average rating
    #[arg(short = 'r', long, default_value = "0")]
    min_rating: f64,

    /// Provider name (repeatable)
    #[arg(short, long = "provider")]
    providers: Vec<String>,

    /// Dietary preference, e.g. vegan or gluten-free (repeatable)
    #[arg(long = "preference")]
    preferences: Vec<String>,

    /// Page to show, 1-based
    #[arg(long, default_value = "1")]
    page: usize,

    /// List provider names and preferences instead of meals
    #[arg(long)]
    options: bool,
}

/// Browse meals through the discovery filter.
///
/// # Errors
///
/// Returns `CommandError` if meals cannot be fetched or a preference is
/// unknown.
pub async fn run(ctx: &Context, args: &MealsArgs) -> Result<(), CommandError> {
    let meals = ctx.client.meals().await?;
    let mut out = out();

    if args.options {
        writeln!(out, "Providers:")?;
        for provider in distinct_providers(&meals) {
            writeln!(out, "  {provider}")?;
        }
        writeln!(out, "Preferences:")?;
        for preference in PREFERENCES {
            writeln!(out, "  {preference}")?;
        }
        return Ok(());
    }

    let mut discovery = Discovery::new();
    discovery.set_search(args.search.as_str());
    discovery.set_category(args.category.clone());
    discovery.set_min_rating(args.min_rating);
    for provider in &args.providers {
        discovery.toggle_provider(provider);
    }
    for preference in &args.preferences {
        let known = PREFERENCES
            .iter()
            .find(|p| p.eq_ignore_ascii_case(preference))
            .ok_or_else(|| CommandError::InvalidArgument(format!("unknown preference {preference}")))?;
        discovery.toggle_preference(known);
    }
    discovery.go_to(args.page);

    let page = discovery.page(&meals);
    if page.total == 0 {
        writeln!(out, "No meals match the current filters")?;
        return Ok(());
    }

    for meal in &page.items {
        writeln!(
            out,
            "{:<28} {:>9}  {:<20} {}",
            meal.name,
            meal.price.display(),
            meal.provider_name(),
            meal.ratings.display_text()
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Showing {}-{} of {} meals",
        page.first_index, page.last_index, page.total
    )?;

    let pagination = Pagination::new(page.total, page.current_page);
    if pagination.controls_visible() {
        writeln!(out, "Pages: {}", render_window(&pagination))?;
    }
    Ok(())
}

/// Page links as text, current page in brackets: `1 ... 4 [5] 6 ... 12`.
fn render_window(pagination: &Pagination) -> String {
    let window = pagination.window();
    let mut parts = Vec::new();
    if window.leading_first {
        parts.push("1".to_string());
    }
    if window.leading_ellipsis {
        parts.push("...".to_string());
    }
    for &page in &window.pages {
        if page == pagination.current_page() {
            parts.push(format!("[{page}]"));
        } else {
            parts.push(page.to_string());
        }
    }
    if window.trailing_ellipsis {
        parts.push("...".to_string());
    }
    if window.trailing_last {
        parts.push(pagination.total_pages().to_string());
    }
    parts.join(" ")
}
