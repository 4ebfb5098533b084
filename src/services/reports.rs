use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use tracing::instrument;

use crate::{
    db::DbPool,
    entities::customer_order,
    errors::ServiceError,
};

/// Headline numbers and the most recent orders for the dashboard
#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub total_revenue: Decimal,
    pub total_orders: u64,
    pub recent_orders: Vec<RecentOrder>,
}

#[derive(Debug, Serialize)]
pub struct RecentOrder {
    pub id: i32,
    pub order_date: chrono::DateTime<Utc>,
    pub total_value: Decimal,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RevenuePoint {
    pub label: String,
    pub total: Decimal,
}

/// Revenue per calendar month (last 12) and per calendar day (last 7),
/// zero-filled where no orders fall in a bucket
#[derive(Debug, Serialize)]
pub struct RevenueReport {
    pub monthly: Vec<RevenuePoint>,
    pub daily: Vec<RevenuePoint>,
}

/// Service aggregating order totals for dashboards
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    /// Creates a new report service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Totals across all orders plus the five most recent ones.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardReport, ServiceError> {
        let db = &*self.db_pool;

        let total_revenue: Option<Decimal> = customer_order::Entity::find()
            .select_only()
            .column_as(Expr::col(customer_order::Column::TotalValue).sum(), "total")
            .into_tuple()
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .flatten();

        let total_orders = customer_order::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let recent_orders = customer_order::Entity::find()
            .order_by_desc(customer_order::Column::OrderDate)
            .limit(5)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|o| RecentOrder {
                id: o.id,
                order_date: o.order_date,
                total_value: o.total_value,
                status: o.status,
            })
            .collect();

        Ok(DashboardReport {
            total_revenue: total_revenue.unwrap_or(Decimal::ZERO),
            total_orders,
            recent_orders,
        })
    }

    /// Revenue grouped by calendar month over the last twelve months and by
    /// calendar day over the last seven days.
    #[instrument(skip(self))]
    pub async fn revenue_series(&self) -> Result<RevenueReport, ServiceError> {
        let db = &*self.db_pool;

        let today = Utc::now().date_naive();
        let current_month = month_floor(today);
        let months = month_window(current_month, 12)?;
        let days = day_window(today, 7)?;

        let window_start = months
            .first()
            .copied()
            .ok_or_else(|| ServiceError::InternalError("Empty month window".to_string()))?;
        let window_start_at = window_start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ServiceError::InternalError("Invalid window start".to_string()))?
            .and_utc();

        let orders = customer_order::Entity::find()
            .filter(customer_order::Column::OrderDate.gte(window_start_at))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut by_month: HashMap<NaiveDate, Decimal> = HashMap::new();
        let mut by_day: HashMap<NaiveDate, Decimal> = HashMap::new();
        for order in &orders {
            let date = order.order_date.date_naive();
            *by_month.entry(month_floor(date)).or_default() += order.total_value;
            *by_day.entry(date).or_default() += order.total_value;
        }

        let monthly = months
            .into_iter()
            .map(|month| RevenuePoint {
                label: month.format("%b %Y").to_string(),
                total: by_month
                    .get(&month)
                    .copied()
                    .unwrap_or(Decimal::ZERO)
                    .round_dp(2),
            })
            .collect();

        let daily = days
            .into_iter()
            .map(|day| RevenuePoint {
                label: day.format("%a, %d").to_string(),
                total: by_day
                    .get(&day)
                    .copied()
                    .unwrap_or(Decimal::ZERO)
                    .round_dp(2),
            })
            .collect();

        Ok(RevenueReport { monthly, daily })
    }
}

fn month_floor(date: NaiveDate) -> NaiveDate {
    // day 1 always exists for a valid year/month
    date.with_day(1).unwrap_or(date)
}

/// Month starts from oldest to newest, ending at `current_month`.
fn month_window(current_month: NaiveDate, count: u32) -> Result<Vec<NaiveDate>, ServiceError> {
    (0..count)
        .rev()
        .map(|offset| {
            current_month
                .checked_sub_months(Months::new(offset))
                .ok_or_else(|| ServiceError::InternalError("Month arithmetic overflow".to_string()))
        })
        .collect()
}

/// Days from oldest to newest, ending at `today`.
fn day_window(today: NaiveDate, count: u64) -> Result<Vec<NaiveDate>, ServiceError> {
    (0..count)
        .rev()
        .map(|offset| {
            today
                .checked_sub_days(Days::new(offset))
                .ok_or_else(|| ServiceError::InternalError("Day arithmetic overflow".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_window_spans_a_year_in_order() {
        let current = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let months = month_window(current, 12).expect("window");

        assert_eq!(months.len(), 12);
        assert_eq!(months[0], NaiveDate::from_ymd_opt(2023, 4, 1).expect("valid date"));
        assert_eq!(months[11], current);
        assert!(months.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn day_window_ends_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date");
        let days = day_window(today, 7).expect("window");

        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date"));
        assert_eq!(days[6], today);
    }

    #[test]
    fn month_floor_truncates_to_first_of_month() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid date");
        assert_eq!(
            month_floor(date),
            NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date")
        );
    }
}
