//! Meal reviews.

use std::io::Write;

use clap::Subcommand;
use feedme_core::{MealId, Reference};

use super::{CommandError, Context, date_or_dash, out};

#[derive(Subcommand)]
pub enum ReviewsAction {
    /// Show the reviews of a meal
    List {
        /// Meal id
        meal: String,
    },

    /// Review a meal
    Add {
        /// Meal id
        meal: String,

        /// Stars, 1 to 5
        #[arg(short, long)]
        rating: u8,

        /// Review text
        #[arg(short, long)]
        comment: String,
    },
}

/// Run a reviews subcommand.
///
/// # Errors
///
/// Returns `CommandError` if the request fails or the review is invalid.
pub async fn run(ctx: &Context, action: ReviewsAction) -> Result<(), CommandError> {
    match action {
        ReviewsAction::List { meal } => {
            let reviews = ctx.client.meal_reviews(&MealId::new(meal)).await?;
            if reviews.reviews.is_empty() {
                writeln!(out(), "No reviews yet")?;
                return Ok(());
            }
            writeln!(
                out(),
                "{:.1} average over {} reviews",
                reviews.average_rating, reviews.total_reviews
            )?;
            for review in &reviews.reviews {
                let author = review
                    .user
                    .as_ref()
                    .and_then(Reference::name)
                    .unwrap_or("Anonymous");
                writeln!(
                    out(),
                    "{:.0}/5  {:<16} {}  {}",
                    review.rating,
                    author,
                    date_or_dash(Some(review.created_at)),
                    review.comment
                )?;
            }
        }
        ReviewsAction::Add {
            meal,
            rating,
            comment,
        } => {
            let review = ctx
                .client
                .submit_review(&MealId::new(meal), rating, &comment)
                .await?;
            writeln!(out(), "Review {} posted", review.id)?;
        }
    }
    Ok(())
}
