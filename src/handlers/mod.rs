pub mod customers;
pub mod orders;
pub mod products;
pub mod reports;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    catalog::CatalogService, customers::CustomerService, orders::OrderService,
    reports::ReportService,
};
use crate::storage::ImageStore;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub customers: Arc<CustomerService>,
    pub orders: Arc<OrderService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        image_store: Arc<dyn ImageStore>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(
            db_pool.clone(),
            image_store,
            event_sender.clone(),
        ));
        let customers = Arc::new(CustomerService::new(db_pool.clone(), event_sender.clone()));
        let orders = Arc::new(OrderService::new(db_pool.clone(), event_sender));
        let reports = Arc::new(ReportService::new(db_pool));

        Self {
            catalog,
            customers,
            orders,
            reports,
        }
    }
}
