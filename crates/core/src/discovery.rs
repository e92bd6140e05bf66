//! Meal discovery: filtering and pagination over the fetched catalogue.
//!
//! Everything here is pure. [`MealFilter::apply`] is a function of the meal
//! list and the filter only, and [`Discovery`] resets to the first page on
//! every filter change.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::meal::Meal;

/// Meals shown per page.
pub const MEALS_PER_PAGE: usize = 8;

/// Page numbers shown around the current page.
const WINDOW_SIZE: usize = 5;

/// Dietary preferences offered by the picker.
pub const PREFERENCES: [&str; 7] = [
    "Vegetarian",
    "Vegan",
    "Gluten-Free",
    "Dairy-Free",
    "Nut-Free",
    "Low-Carb",
    "Keto",
];

// =============================================================================
// Filter
// =============================================================================

/// Active discovery criteria. The default filter matches every meal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealFilter {
    /// Substring matched against name or description.
    pub search: String,
    /// Exact category.
    pub category: Option<String>,
    /// Minimum average rating; `0` disables the criterion.
    pub min_rating: f64,
    /// Accepted provider names.
    pub providers: Vec<String>,
    /// Dietary preferences; any one of them must match.
    pub preferences: Vec<String>,
}

impl MealFilter {
    /// Whether any criterion is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty()
            || self.category.is_some()
            || self.min_rating > 0.0
            || !self.providers.is_empty()
            || !self.preferences.is_empty()
    }

    /// Whether `meal` satisfies every active criterion.
    #[must_use]
    pub fn matches(&self, meal: &Meal) -> bool {
        self.matches_search(meal)
            && self.matches_category(meal)
            && meal.ratings.rating >= self.min_rating
            && self.matches_provider(meal)
            && self.matches_preferences(meal)
    }

    /// Meals matching the filter, in their original order.
    #[must_use]
    pub fn apply<'a>(&self, meals: &'a [Meal]) -> Vec<&'a Meal> {
        meals.iter().filter(|meal| self.matches(meal)).collect()
    }

    fn matches_search(&self, meal: &Meal) -> bool {
        let term = self.search.trim().to_lowercase();
        term.is_empty()
            || meal.name.to_lowercase().contains(&term)
            || meal.description.to_lowercase().contains(&term)
    }

    fn matches_category(&self, meal: &Meal) -> bool {
        self.category
            .as_deref()
            .is_none_or(|category| meal.category == category)
    }

    fn matches_provider(&self, meal: &Meal) -> bool {
        self.providers.is_empty() || self.providers.iter().any(|p| p == meal.provider_name())
    }

    fn matches_preferences(&self, meal: &Meal) -> bool {
        if self.preferences.is_empty() {
            return true;
        }
        let description = meal.description.to_lowercase();
        self.preferences.iter().any(|pref| {
            description.contains(&pref.to_lowercase()) || meal.preferences.contains(pref)
        })
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Page arithmetic over a filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    total_items: usize,
    per_page: usize,
    current_page: usize,
}

/// Page numbers to render, with optional first/last shortcuts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageWindow {
    /// Consecutive page numbers around the current page.
    pub pages: Vec<usize>,
    /// Show a separate link to page 1.
    pub leading_first: bool,
    /// Show "..." between page 1 and the window.
    pub leading_ellipsis: bool,
    /// Show a separate link to the last page.
    pub trailing_last: bool,
    /// Show "..." between the window and the last page.
    pub trailing_ellipsis: bool,
}

impl Pagination {
    /// Pagination with the default page size, clamping `current_page` into
    /// the valid range.
    #[must_use]
    pub fn new(total_items: usize, current_page: usize) -> Self {
        Self::with_per_page(total_items, MEALS_PER_PAGE, current_page)
    }

    /// Pagination with an explicit page size.
    #[must_use]
    pub fn with_per_page(total_items: usize, per_page: usize, current_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_items.div_ceil(per_page);
        Self {
            total_items,
            per_page,
            current_page: current_page.clamp(1, total_pages.max(1)),
        }
    }

    /// Items after filtering.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.total_items
    }

    /// Items per page, at least 1.
    #[must_use]
    pub const fn per_page(&self) -> usize {
        self.per_page
    }

    /// Current page, 1-based.
    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    /// `ceil(total_items / per_page)`; 0 for an empty list.
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.per_page)
    }

    /// Index range of the current page within the filtered list.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        let start = self.current_page.saturating_sub(1) * self.per_page;
        let start = start.min(self.total_items);
        start..(start + self.per_page).min(self.total_items)
    }

    /// Whether pagination controls are shown at all.
    #[must_use]
    pub const fn controls_visible(&self) -> bool {
        self.total_pages() > 1
    }

    /// Page numbers around the current page.
    #[must_use]
    pub fn window(&self) -> PageWindow {
        let total = self.total_pages();
        if total == 0 {
            return PageWindow::default();
        }
        let mut start = self.current_page.saturating_sub(2).max(1);
        let end = total.min(start + WINDOW_SIZE - 1);
        if end == total {
            start = end.saturating_sub(WINDOW_SIZE - 1).max(1);
        }
        PageWindow {
            pages: (start..=end).collect(),
            leading_first: start > 1,
            leading_ellipsis: start > 2,
            trailing_last: end < total,
            trailing_ellipsis: end + 1 < total,
        }
    }
}

/// One page of filtered meals.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<'a> {
    /// Meals on this page.
    pub items: Vec<&'a Meal>,
    /// Current page, 1-based.
    pub current_page: usize,
    /// Total pages.
    pub total_pages: usize,
    /// 1-based position of the first item shown; 0 when empty.
    pub first_index: usize,
    /// 1-based position of the last item shown; 0 when empty.
    pub last_index: usize,
    /// Meals matching the filter.
    pub total: usize,
}

// =============================================================================
// Discovery state
// =============================================================================

/// Filter plus current page, as held by the find-meals view.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    filter: MealFilter,
    current_page: usize,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            filter: MealFilter::default(),
            current_page: 1,
        }
    }
}

impl Discovery {
    /// Fresh state: no criteria, page 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing filter.
    #[must_use]
    pub const fn with_filter(filter: MealFilter) -> Self {
        Self {
            filter,
            current_page: 1,
        }
    }

    /// The active filter.
    #[must_use]
    pub const fn filter(&self) -> &MealFilter {
        &self.filter
    }

    /// The requested page, 1-based.
    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.search = term.into();
        self.current_page = 1;
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.filter.category = category;
        self.current_page = 1;
    }

    pub fn set_min_rating(&mut self, rating: f64) {
        self.filter.min_rating = rating.max(0.0);
        self.current_page = 1;
    }

    pub fn toggle_provider(&mut self, provider: &str) {
        toggle(&mut self.filter.providers, provider);
        self.current_page = 1;
    }

    pub fn toggle_preference(&mut self, preference: &str) {
        toggle(&mut self.filter.preferences, preference);
        self.current_page = 1;
    }

    /// Clear every criterion.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Jump to a page. Out-of-range values are clamped when the page is
    /// rendered.
    pub fn go_to(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Filter `meals` and cut out the current page.
    #[must_use]
    pub fn page<'a>(&self, meals: &'a [Meal]) -> PageSlice<'a> {
        let filtered = self.filter.apply(meals);
        let pagination = Pagination::new(filtered.len(), self.current_page);
        let range = pagination.range();
        let (first_index, last_index) = if range.is_empty() {
            (0, 0)
        } else {
            (range.start + 1, range.end)
        };
        PageSlice {
            items: filtered.get(range).map(<[&Meal]>::to_vec).unwrap_or_default(),
            current_page: pagination.current_page(),
            total_pages: pagination.total_pages(),
            first_index,
            last_index,
            total: filtered.len(),
        }
    }
}

fn toggle(list: &mut Vec<String>, value: &str) {
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
    } else {
        list.push(value.to_owned());
    }
}

// =============================================================================
// Picker helpers
// =============================================================================

/// Provider names present in `meals`, deduplicated and sorted.
#[must_use]
pub fn distinct_providers(meals: &[Meal]) -> Vec<String> {
    meals
        .iter()
        .map(|meal| meal.provider_name().to_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Options containing `term`, case-insensitively.
#[must_use]
pub fn search_options<'a, S: AsRef<str>>(options: &'a [S], term: &str) -> Vec<&'a str> {
    let term = term.to_lowercase();
    options
        .iter()
        .map(S::as_ref)
        .filter(|option| option.to_lowercase().contains(&term))
        .collect()
}
