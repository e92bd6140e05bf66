//! Provider order dashboard.
//!
//! # Usage
//!
//! ```bash
//! feedme orders list --search jane --oldest-first
//! feedme orders stage <order-id> processed -m "In the oven"
//! feedme orders delete <order-id>
//! ```

use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use feedme_core::order::Order;
use feedme_core::stats::{StageCounts, sort_by_created};
use feedme_core::{OrderId, OrderStage, ProviderId, SortDirection, UserRole};

use super::{CommandError, Context, date_or_dash, out};

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List orders with per-stage counts
    List {
        /// Match id, customer, email, status or tracking number
        #[arg(short, long, default_value = "")]
        search: String,

        /// Sort oldest first instead of newest first
        #[arg(long)]
        oldest_first: bool,
    },

    /// Move an order to a tracking stage
    Stage {
        /// Order id
        id: String,

        /// Target stage: placed, approved, processed or delivered
        stage: OrderStage,

        /// Message stored with the tracking update
        #[arg(short, long, default_value = "")]
        message: String,
    },

    /// Delete an order
    Delete {
        /// Order id
        id: String,
    },
}

/// Run an orders subcommand.
///
/// # Errors
///
/// Returns `CommandError` if the session is missing or the backend fails.
pub async fn run(ctx: &Context, action: OrdersAction) -> Result<(), CommandError> {
    match action {
        OrdersAction::List {
            search,
            oldest_first,
        } => list(ctx, &search, oldest_first).await,
        OrdersAction::Stage { id, stage, message } => {
            update_stage(ctx, &OrderId::new(id), stage, &message).await
        }
        OrdersAction::Delete { id } => delete(ctx, &OrderId::new(id)).await,
    }
}

/// Orders the logged-in user may manage.
async fn visible_orders(ctx: &Context) -> Result<Arc<Vec<Order>>, CommandError> {
    let auth = ctx.client.session().require_auth()?;
    let orders = if auth.role == UserRole::Provider {
        ctx.client
            .provider_orders(&ProviderId::new(auth.user_id.as_str()))
            .await?
    } else {
        ctx.client.orders().await?
    };
    Ok(orders)
}

async fn list(ctx: &Context, search: &str, oldest_first: bool) -> Result<(), CommandError> {
    let orders = visible_orders(ctx).await?;
    let counts = StageCounts::tally(&orders);

    let mut shown: Vec<Order> = orders
        .iter()
        .filter(|o| o.matches_search(search))
        .cloned()
        .collect();
    let direction = if oldest_first {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    };
    sort_by_created(&mut shown, direction);

    let mut out = out();
    writeln!(
        out,
        "Total {}  |  Placed {}  Approved {}  Processed {}  Delivered {}",
        counts.total, counts.placed, counts.approved, counts.processed, counts.delivered
    )?;
    writeln!(out)?;
    for order in &shown {
        writeln!(
            out,
            "{:<26} {:<10} {:<20} {:>10} {}",
            order.id.as_str(),
            order.current_stage().as_str(),
            order.name,
            order.total_price.display(),
            date_or_dash(order.created_at),
        )?;
    }
    if shown.is_empty() {
        writeln!(out, "No orders found")?;
    }
    Ok(())
}

async fn update_stage(
    ctx: &Context,
    id: &OrderId,
    stage: OrderStage,
    message: &str,
) -> Result<(), CommandError> {
    let orders = visible_orders(ctx).await?;
    let mut order = orders
        .iter()
        .find(|o| &o.id == id)
        .cloned()
        .ok_or_else(|| CommandError::NotFound(format!("order {id}")))?;

    let change = ctx.workflow.update_stage(&mut order, stage, message).await?;

    let mut out = out();
    writeln!(
        out,
        "Order {} is now {} (via {} transport)",
        change.order_id,
        change.stage.label(),
        change.transport
    )?;
    writeln!(out, "  {}", change.update.message)?;
    Ok(())
}

async fn delete(ctx: &Context, id: &OrderId) -> Result<(), CommandError> {
    let outcome = ctx.workflow.delete_order(id).await?;

    let mut out = out();
    if outcome.already_gone {
        writeln!(out, "Order {} was already deleted", outcome.order_id)?;
    } else {
        writeln!(out, "Order {} deleted", outcome.order_id)?;
    }
    if let Some(remaining) = outcome.refreshed {
        writeln!(out, "{} orders remaining", remaining.len())?;
    }
    Ok(())
}
