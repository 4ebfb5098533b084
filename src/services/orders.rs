use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    db::DbPool,
    entities::{
        customer, customer_order,
        customer_order::OrderStatus,
        order_item, product, product_image, product_variant,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

const DEFAULT_DELIVERY_METHOD: &str = "Delivery";

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: i32,
    pub delivery_method: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct EditOrderRequest {
    pub customer_id: i32,
    pub status: String,
    pub delivery_method: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Listing row: customer name falls back to "N/A" when the customer is gone
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: i32,
    pub customer_name: String,
    pub order_date: DateTime<Utc>,
    pub total_value: Decimal,
    pub item_count: u64,
    pub status: String,
    pub delivery_method: String,
}

#[derive(Debug, Serialize)]
pub struct VariantOption {
    pub id: i32,
    pub name: String,
}

/// Line detail for the order view, including the variant options the
/// product currently offers so the line can be edited in place.
#[derive(Debug, Serialize)]
pub struct OrderItemDetail {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub thumbnail: Option<String>,
    pub has_variants: bool,
    pub variants: Vec<VariantOption>,
}

#[derive(Debug, Serialize)]
pub struct OrderCustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: i32,
    pub customer_id: Option<i32>,
    pub status: String,
    pub delivery_method: String,
    pub total_value: Decimal,
    pub order_date: DateTime<Utc>,
    pub customer_info: Option<OrderCustomerInfo>,
    pub items: Vec<OrderItemDetail>,
}

/// Service for managing orders and their line items.
///
/// Orders and items are written as one unit. Each item snapshots the
/// product price at write time; the order total is recomputed in full on
/// every create and edit, never patched incrementally.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    /// Creates a new order service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order for a customer. Items whose product no longer
    /// exists are skipped rather than failing the whole order.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<i32, ServiceError> {
        validate_items(&request.items)?;

        let db = &*self.db_pool;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Customer not found.".to_string()))?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order = customer_order::ActiveModel {
            customer_id: Set(Some(customer.id)),
            total_value: Set(Decimal::ZERO),
            status: Set(OrderStatus::NotInProcess.to_string()),
            delivery_method: Set(request
                .delivery_method
                .unwrap_or_else(|| DEFAULT_DELIVERY_METHOD.to_string())),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        let total = write_items(&txn, order.id, &request.items).await?;

        let mut active: customer_order::ActiveModel = order.clone().into();
        active.total_value = Set(total);
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = order.id, "Failed to store order total");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = order.id, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = order.id, total = %total, "Order created");
        self.notify(Event::OrderCreated(order.id)).await;

        Ok(order.id)
    }

    /// Rewrites an order: customer, status, delivery method, and the entire
    /// item set, which is deleted and recreated under the same snapshot
    /// rules as creation. The total is recomputed from scratch.
    #[instrument(skip(self, request), fields(order_id = order_id))]
    pub async fn edit_order(
        &self,
        order_id: i32,
        request: EditOrderRequest,
    ) -> Result<(), ServiceError> {
        // Same enum check as update_status; a raw string assignment here
        // would let unvalidated states into the column.
        let status = parse_status(&request.status)?;
        validate_items(&request.items)?;

        let db = &*self.db_pool;

        let order = customer_order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Customer not found.".to_string()))?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = order_id, "Failed to start transaction for order edit");
            ServiceError::DatabaseError(e)
        })?;

        order_item::Entity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = order_id, "Failed to clear order items");
                ServiceError::DatabaseError(e)
            })?;

        let total = write_items(&txn, order_id, &request.items).await?;

        let mut active: customer_order::ActiveModel = order.into();
        active.customer_id = Set(Some(customer.id));
        active.status = Set(status.to_string());
        active.delivery_method = Set(request
            .delivery_method
            .unwrap_or_else(|| DEFAULT_DELIVERY_METHOD.to_string()));
        active.total_value = Set(total);
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = order_id, "Failed to update order");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = order_id, "Failed to commit order edit");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = order_id, total = %total, "Order updated");
        self.notify(Event::OrderUpdated(order_id)).await;

        Ok(())
    }

    /// Updates only the status. Any transition between the known states is
    /// legal; unknown states fail validation with nothing mutated.
    #[instrument(skip(self), fields(order_id = order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: i32,
        new_status: &str,
    ) -> Result<(), ServiceError> {
        let status = parse_status(new_status)?;

        let db = &*self.db_pool;

        let order = customer_order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status.clone();

        let mut active: customer_order::ActiveModel = order.into();
        active.status = Set(status.to_string());
        active.update(db).await.map_err(|e| {
            error!(error = %e, order_id = order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = order_id, old_status = %old_status, new_status = %status, "Order status updated");
        self.notify(Event::OrderStatusChanged {
            order_id,
            old_status,
            new_status: status.to_string(),
        })
        .await;

        Ok(())
    }

    /// Deletes an order; its items go with it.
    #[instrument(skip(self), fields(order_id = order_id))]
    pub async fn delete_order(&self, order_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let order = customer_order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        customer_order::Entity::delete(customer_order::ActiveModel::from(order))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = order_id, "Failed to delete order");
                ServiceError::DatabaseError(e)
            })?;

        info!(order_id = order_id, "Order deleted");
        self.notify(Event::OrderDeleted(order_id)).await;

        Ok(())
    }

    /// Full order detail for the order view and in-place editing.
    #[instrument(skip(self), fields(order_id = order_id))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;

        let order = customer_order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let customer_info = match order.customer_id {
            Some(customer_id) => customer::Entity::find_by_id(customer_id)
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
                .map(|c| OrderCustomerInfo {
                    name: c.name,
                    phone: c.phone.unwrap_or_else(|| "N/A".to_string()),
                    address: c.address.unwrap_or_else(|| "N/A".to_string()),
                }),
            None => None,
        };

        let rows = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(p) = product::Entity::find_by_id(row.product_id)
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
            else {
                // product_id is FK-restricted; only rows predating the
                // constraint can miss their product
                warn!(order_id = order_id, product_id = row.product_id, "Order item references missing product");
                continue;
            };

            let variant = match row.variant_id {
                Some(variant_id) => product_variant::Entity::find_by_id(variant_id)
                    .one(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?,
                None => None,
            };

            let name = match &variant {
                Some(v) => format!("{} ({})", p.name, v.name),
                None => p.name.clone(),
            };

            let thumbnail = product_image::Entity::find()
                .filter(product_image::Column::ProductId.eq(p.id))
                .order_by_asc(product_image::Column::Id)
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
                .map(|i| i.filename);

            let variants = if p.has_variants {
                product_variant::Entity::find()
                    .filter(product_variant::Column::ProductId.eq(p.id))
                    .order_by_asc(product_variant::Column::Id)
                    .all(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .into_iter()
                    .map(|v| VariantOption {
                        id: v.id,
                        name: v.name,
                    })
                    .collect()
            } else {
                Vec::new()
            };

            items.push(OrderItemDetail {
                product_id: row.product_id,
                variant_id: row.variant_id,
                quantity: row.quantity,
                name,
                price: row.price_per_item,
                thumbnail,
                has_variants: p.has_variants,
                variants,
            });
        }

        Ok(OrderDetail {
            id: order.id,
            customer_id: order.customer_id,
            status: order.status,
            delivery_method: order.delivery_method,
            total_value: order.total_value,
            order_date: order.order_date,
            customer_info,
            items,
        })
    }

    /// Order summaries, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderSummary>, ServiceError> {
        let db = &*self.db_pool;

        let orders = customer_order::Entity::find()
            .order_by_desc(customer_order::Column::OrderDate)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut summaries = Vec::with_capacity(orders.len());
        for order in orders {
            let customer_name = match order.customer_id {
                Some(customer_id) => customer::Entity::find_by_id(customer_id)
                    .one(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .map(|c| c.name),
                None => None,
            }
            .unwrap_or_else(|| "N/A".to_string());

            let item_count = order_item::Entity::find()
                .filter(order_item::Column::OrderId.eq(order.id))
                .count(db)
                .await
                .map_err(ServiceError::DatabaseError)?;

            summaries.push(OrderSummary {
                id: order.id,
                customer_name,
                order_date: order.order_date,
                total_value: order.total_value,
                item_count,
                status: order.status,
                delivery_method: order.delivery_method,
            });
        }

        Ok(summaries)
    }

    async fn notify(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send order event");
            }
        }
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw)
        .map_err(|_| ServiceError::ValidationError("Invalid status provided.".to_string()))
}

fn validate_items(items: &[OrderItemInput]) -> Result<(), ServiceError> {
    if items.iter().any(|item| item.quantity < 1) {
        return Err(ServiceError::ValidationError(
            "Item quantity must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Writes the item set for an order and returns the recomputed total.
///
/// Items whose product no longer exists are skipped. Each written item
/// snapshots the product's current price; a product that tracks variants
/// requires the item to name one of its variants.
async fn write_items(
    txn: &DatabaseTransaction,
    order_id: i32,
    items: &[OrderItemInput],
) -> Result<Decimal, ServiceError> {
    let mut total = Decimal::ZERO;

    for item in items {
        let Some(p) = product::Entity::find_by_id(item.product_id)
            .one(txn)
            .await
            .map_err(ServiceError::DatabaseError)?
        else {
            warn!(order_id = order_id, product_id = item.product_id, "Skipping order item for missing product");
            continue;
        };

        let variant_id = if p.has_variants {
            let variant_id = item.variant_id.ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Product '{}' requires a variant selection",
                    p.name
                ))
            })?;
            let variant = product_variant::Entity::find_by_id(variant_id)
                .one(txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            match variant {
                Some(v) if v.product_id == p.id => Some(v.id),
                _ => {
                    return Err(ServiceError::ValidationError(format!(
                        "Variant {} does not belong to product '{}'",
                        variant_id, p.name
                    )))
                }
            }
        } else {
            None
        };

        order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(p.id),
            variant_id: Set(variant_id),
            quantity: Set(item.quantity),
            price_per_item: Set(p.price),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = order_id, "Failed to insert order item");
            ServiceError::DatabaseError(e)
        })?;

        total += p.price * Decimal::from(item.quantity);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_statuses_are_rejected() {
        assert!(parse_status("Not in-process").is_ok());
        assert!(parse_status("Processing").is_ok());
        assert!(parse_status("Completed").is_ok());
        assert!(matches!(
            parse_status("Shipped"),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn zero_or_negative_quantities_fail_validation() {
        let items = vec![OrderItemInput {
            product_id: 1,
            variant_id: None,
            quantity: 0,
        }];
        assert!(matches!(
            validate_items(&items),
            Err(ServiceError::ValidationError(_))
        ));

        let items = vec![OrderItemInput {
            product_id: 1,
            variant_id: None,
            quantity: 3,
        }];
        assert!(validate_items(&items).is_ok());
    }
}
