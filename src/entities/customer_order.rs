use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Order lifecycle states. Every transition between any two states is legal;
/// completed orders can be reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum OrderStatus {
    #[strum(serialize = "Not in-process")]
    #[serde(rename = "Not in-process")]
    NotInProcess,
    #[strum(serialize = "Processing")]
    Processing,
    #[strum(serialize = "Completed")]
    Completed,
}

/// Customer order entity
///
/// `total_value` is derived: it always equals the sum over the order's items
/// of price_per_item x quantity, recomputed in full on every create/edit.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub order_date: DateTime<Utc>,

    pub total_value: Decimal,

    /// Owning customer; nullable so orders can outlive a removed customer
    pub customer_id: Option<i32>,

    /// Stored as the display string of [`OrderStatus`]
    pub status: String,

    pub delivery_method: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.order_date {
                active_model.order_date = Set(Utc::now());
            }
            if let ActiveValue::NotSet = active_model.status {
                active_model.status = Set(OrderStatus::NotInProcess.to_string());
            }
            if let ActiveValue::NotSet = active_model.delivery_method {
                active_model.delivery_method = Set("Delivery".to_string());
            }
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_display_strings() {
        for status in [
            OrderStatus::NotInProcess,
            OrderStatus::Processing,
            OrderStatus::Completed,
        ] {
            let parsed = OrderStatus::from_str(&status.to_string()).expect("parse status");
            assert_eq!(parsed, status);
        }
        assert_eq!(OrderStatus::NotInProcess.to_string(), "Not in-process");
    }

    #[test]
    fn unknown_status_does_not_parse() {
        assert!(OrderStatus::from_str("Shipped").is_err());
        assert!(OrderStatus::from_str("not in-process").is_err());
    }
}
