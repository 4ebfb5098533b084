use std::sync::Arc;

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{customer, customer_order},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerInput {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Customer name is required"
    ))]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<customer::Model> for CustomerResponse {
    fn from(model: customer::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            address: model.address,
        }
    }
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CustomerService {
    /// Creates a new customer service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new customer
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn add_customer(&self, input: CustomerInput) -> Result<i32, ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;
        let model = customer::ActiveModel {
            name: Set(input.name),
            phone: Set(input.phone),
            address: Set(input.address),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert customer");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = model.id, "Customer created");
        self.notify(Event::CustomerCreated(model.id)).await;

        Ok(model.id)
    }

    /// Replaces a customer's fields
    #[instrument(skip(self, input), fields(customer_id = customer_id))]
    pub async fn edit_customer(
        &self,
        customer_id: i32,
        input: CustomerInput,
    ) -> Result<(), ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;
        let existing = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", customer_id))
            })?;

        let mut active: customer::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.phone = Set(input.phone);
        active.address = Set(input.address);
        active.update(db).await.map_err(|e| {
            error!(error = %e, customer_id = customer_id, "Failed to update customer");
            ServiceError::DatabaseError(e)
        })?;

        info!(customer_id = customer_id, "Customer updated");
        self.notify(Event::CustomerUpdated(customer_id)).await;

        Ok(())
    }

    /// Deletes a customer. Blocked while the customer owns any order.
    #[instrument(skip(self), fields(customer_id = customer_id))]
    pub async fn delete_customer(&self, customer_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let existing = customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", customer_id))
            })?;

        let order_count = customer_order::Entity::find()
            .filter(customer_order::Column::CustomerId.eq(customer_id))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if order_count > 0 {
            return Err(ServiceError::Conflict(
                "Cannot delete customer with existing orders.".to_string(),
            ));
        }

        customer::Entity::delete(customer::ActiveModel::from(existing))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, customer_id = customer_id, "Failed to delete customer");
                ServiceError::DatabaseError(e)
            })?;

        info!(customer_id = customer_id, "Customer deleted");
        self.notify(Event::CustomerDeleted(customer_id)).await;

        Ok(())
    }

    /// Lists customers, optionally filtered by a case-insensitive substring
    /// match on the name.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<CustomerResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = customer::Entity::find().order_by_asc(customer::Column::Name);
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(customer::Column::Name))).like(pattern),
            );
        }

        let customers = query.all(db).await.map_err(ServiceError::DatabaseError)?;

        Ok(customers.into_iter().map(CustomerResponse::from).collect())
    }

    /// Gets a customer by ID
    #[instrument(skip(self), fields(customer_id = customer_id))]
    pub async fn get_customer(&self, customer_id: i32) -> Result<CustomerResponse, ServiceError> {
        let db = &*self.db_pool;

        customer::Entity::find_by_id(customer_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .map(CustomerResponse::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    async fn notify(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send customer event");
            }
        }
    }
}
