//! Newsletter subscriptions.

use std::io::Write;

use clap::Subcommand;
use feedme_core::Email;

use super::{CommandError, Context, date_or_dash, out};

#[derive(Subcommand)]
pub enum NewsletterAction {
    /// List subscribers (admin)
    List,

    /// Subscribe an address
    Subscribe {
        email: String,
    },

    /// Unsubscribe an address
    Unsubscribe {
        email: String,
    },
}

/// Run a newsletter subcommand.
///
/// # Errors
///
/// Returns `CommandError` for invalid emails or failed requests.
pub async fn run(ctx: &Context, action: NewsletterAction) -> Result<(), CommandError> {
    match action {
        NewsletterAction::List => {
            let subscribers = ctx.client.subscribers().await?;
            let active = subscribers.iter().filter(|s| s.is_subscribed).count();
            writeln!(out(), "{active} of {} subscribed", subscribers.len())?;
            for subscriber in subscribers.iter() {
                let state = if subscriber.is_subscribed {
                    "subscribed"
                } else {
                    "unsubscribed"
                };
                writeln!(
                    out(),
                    "{:<40} {:<13} {}",
                    subscriber.email.as_str(),
                    state,
                    date_or_dash(subscriber.created_at)
                )?;
            }
        }
        NewsletterAction::Subscribe { email } => {
            let message = ctx.client.subscribe(&Email::parse(&email)?).await?;
            writeln!(out(), "{message}")?;
        }
        NewsletterAction::Unsubscribe { email } => {
            let message = ctx.client.unsubscribe(&Email::parse(&email)?).await?;
            writeln!(out(), "{message}")?;
        }
    }
    Ok(())
}
