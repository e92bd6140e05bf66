//! Dashboard tallies over orders and users.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::order::Order;
use crate::types::{OrderStage, Price, SortDirection, UserRole};
use crate::user::User;

/// Days covered by the new-registrations series.
pub const NEW_USER_WINDOW_DAYS: u64 = 7;

/// Order counts per stage, as shown on the provider dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StageCounts {
    pub total: usize,
    pub placed: usize,
    pub approved: usize,
    pub processed: usize,
    pub delivered: usize,
}

impl StageCounts {
    /// Count `orders` by their current stage. Orders whose status names no
    /// known stage only count towards `total`.
    #[must_use]
    pub fn tally(orders: &[Order]) -> Self {
        orders.iter().fold(Self::default(), |mut counts, order| {
            counts.total += 1;
            match order.current_stage().stage() {
                Some(OrderStage::Placed) => counts.placed += 1,
                Some(OrderStage::Approved) => counts.approved += 1,
                Some(OrderStage::Processed) => counts.processed += 1,
                Some(OrderStage::Delivered) => counts.delivered += 1,
                None => {}
            }
            counts
        })
    }

    /// Count for one stage.
    #[must_use]
    pub const fn get(&self, stage: OrderStage) -> usize {
        match stage {
            OrderStage::Placed => self.placed,
            OrderStage::Approved => self.approved,
            OrderStage::Processed => self.processed,
            OrderStage::Delivered => self.delivered,
        }
    }
}

/// Sort orders by creation time. Orders without a timestamp sort as oldest.
pub fn sort_by_created(orders: &mut [Order], direction: SortDirection) {
    orders.sort_by(|a, b| match direction {
        SortDirection::Ascending => a.created_at.cmp(&b.created_at),
        SortDirection::Descending => b.created_at.cmp(&a.created_at),
    });
}

/// The `limit` newest orders.
#[must_use]
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<Order> {
    let mut sorted = orders.to_vec();
    sort_by_created(&mut sorted, SortDirection::Descending);
    sorted.truncate(limit);
    sorted
}

/// Order volume for the admin overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OrderTotals {
    /// Number of orders.
    pub orders: usize,
    /// Sum of order totals.
    pub revenue: Price,
}

impl OrderTotals {
    #[must_use]
    pub fn of(orders: &[Order]) -> Self {
        Self {
            orders: orders.len(),
            revenue: orders.iter().map(|o| o.total_price).sum(),
        }
    }
}

/// Registrations on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// User statistics for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UserStats {
    pub total_users: usize,
    pub total_providers: usize,
    pub total_customers: usize,
    /// Users that are not blocked.
    pub active_users: usize,
    /// Registrations per day over the last week, oldest first.
    pub new_users_over_time: Vec<DailyCount>,
}

impl UserStats {
    /// Compute statistics with `today` as the last day of the series.
    #[must_use]
    pub fn from_users(users: &[User], today: NaiveDate) -> Self {
        let count_role = |role: UserRole| users.iter().filter(|u| u.role == role).count();

        let new_users_over_time = (0..NEW_USER_WINDOW_DAYS)
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
            .map(|date| DailyCount {
                date,
                count: users
                    .iter()
                    .filter(|u| u.created_at.is_some_and(|c| c.date_naive() == date))
                    .count(),
            })
            .collect();

        Self {
            total_users: users.len(),
            total_providers: count_role(UserRole::Provider),
            total_customers: count_role(UserRole::Customer),
            active_users: users.iter().filter(|u| !u.is_blocked).count(),
            new_users_over_time,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn order(id: &str, status: &str, created: Option<&str>) -> Order {
        serde_json::from_value(json!({
            "_id": id,
            "status": status,
            "totalPrice": 10,
            "createdAt": created
        }))
        .unwrap()
    }

    #[test]
    fn test_tally_by_current_stage() {
        let mut delivered = order("3", "processed", None);
        delivered.append_tracking_update(
            OrderStage::Delivered,
            "Arrived",
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        );
        let orders = vec![
            order("1", "placed", None),
            order("2", "Approved", None),
            delivered,
            order("4", "Pending", None),
        ];
        let counts = StageCounts::tally(&orders);
        assert_eq!(counts.total, 4);
        assert_eq!(counts.placed, 1);
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.processed, 0);
        assert_eq!(counts.get(OrderStage::Delivered), 1);
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let orders = vec![
            order("old", "placed", Some("2024-01-01T00:00:00Z")),
            order("none", "placed", None),
            order("new", "placed", Some("2024-03-01T00:00:00Z")),
            order("mid", "placed", Some("2024-02-01T00:00:00Z")),
        ];
        let recent = recent_orders(&orders, 2);
        let ids: Vec<_> = recent.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid"]);

        let mut all = orders;
        sort_by_created(&mut all, SortDirection::Ascending);
        assert_eq!(all.first().unwrap().id.as_str(), "none");
    }

    #[test]
    fn test_order_totals() {
        let orders = vec![order("1", "placed", None), order("2", "placed", None)];
        let totals = OrderTotals::of(&orders);
        assert_eq!(totals.orders, 2);
        assert_eq!(totals.revenue.display(), "$20.00");
    }

    #[test]
    fn test_user_stats() {
        let users: Vec<User> = serde_json::from_value(json!([
            {"_id": "a", "role": "admin", "createdAt": "2024-05-10T09:00:00Z"},
            {"_id": "b", "role": "provider", "createdAt": "2024-05-10T18:00:00Z"},
            {"_id": "c", "role": "user", "isBlocked": true, "createdAt": "2024-05-04T12:00:00Z"},
            {"_id": "d", "role": "customer", "createdAt": "2024-04-01T12:00:00Z"}
        ]))
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let stats = UserStats::from_users(&users, today);

        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.total_providers, 1);
        assert_eq!(stats.total_customers, 2);
        assert_eq!(stats.active_users, 3);
        assert_eq!(stats.new_users_over_time.len(), 7);

        let first = stats.new_users_over_time.first().unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(first.count, 1);
        let last = stats.new_users_over_time.last().unwrap();
        assert_eq!(last.date, today);
        assert_eq!(last.count, 2);
    }
}
