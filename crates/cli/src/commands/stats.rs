//! Admin overview.

use std::io::Write;

use chrono::Utc;
use feedme_core::UserRole;
use feedme_core::stats::{OrderTotals, StageCounts, UserStats, recent_orders};

use super::{CommandError, Context, date_or_dash, out};

/// Print user statistics, order volume and the `limit` newest orders.
///
/// # Errors
///
/// Returns `CommandError` when the session is not an admin session or a
/// request fails.
pub async fn run(ctx: &Context, limit: usize) -> Result<(), CommandError> {
    ctx.client.session().require_role(UserRole::Admin)?;

    let users = ctx.client.users().await?;
    let orders = ctx.client.orders().await?;

    let user_stats = UserStats::from_users(&users, Utc::now().date_naive());
    let totals = OrderTotals::of(&orders);
    let stages = StageCounts::tally(&orders);

    let mut out = out();
    writeln!(out, "Users")?;
    writeln!(out, "  total      {}", user_stats.total_users)?;
    writeln!(out, "  providers  {}", user_stats.total_providers)?;
    writeln!(out, "  customers  {}", user_stats.total_customers)?;
    writeln!(out, "  active     {}", user_stats.active_users)?;
    writeln!(out, "  new this week:")?;
    for day in &user_stats.new_users_over_time {
        writeln!(out, "    {}  {}", day.date.format("%a %d %b"), day.count)?;
    }

    writeln!(out)?;
    writeln!(out, "Orders")?;
    writeln!(out, "  total      {}", totals.orders)?;
    writeln!(out, "  revenue    {}", totals.revenue.display())?;
    writeln!(
        out,
        "  stages     placed {} / approved {} / processed {} / delivered {}",
        stages.placed, stages.approved, stages.processed, stages.delivered
    )?;

    writeln!(out)?;
    writeln!(out, "Recent orders")?;
    for order in recent_orders(&orders, limit) {
        writeln!(
            out,
            "  {:<26} {:<10} {:>10} {}",
            order.id.as_str(),
            order.current_stage().as_str(),
            order.total_price.display(),
            date_or_dash(order.created_at)
        )?;
    }
    Ok(())
}
