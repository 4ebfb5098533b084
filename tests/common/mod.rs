// Shared across test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;

use stockroom_api::db::DbPool;
use stockroom_api::handlers::AppServices;
use stockroom_api::migrator::Migrator;
use stockroom_api::services::catalog::{ProductInput, StockMode, VariantInput};
use stockroom_api::services::customers::CustomerInput;
use stockroom_api::storage::{FsImageStore, ImageStore};

/// Test harness: services over a fresh in-memory SQLite database with the
/// embedded migrations applied and a temporary upload directory.
pub struct TestApp {
    pub db: Arc<DbPool>,
    pub services: AppServices,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        // A single pooled connection keeps the in-memory database alive and
        // isolated to this test.
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .expect("connect to in-memory sqlite");
        Migrator::up(&db, None).await.expect("run migrations");

        let db = Arc::new(db);
        let upload_dir = tempfile::tempdir().expect("create upload tempdir");
        let image_store: Arc<dyn ImageStore> = Arc::new(FsImageStore::new(upload_dir.path()));
        let services = AppServices::new(db.clone(), image_store, None);

        Self {
            db,
            services,
            upload_dir,
        }
    }

    pub async fn seed_customer(&self, name: &str) -> i32 {
        self.services
            .customers
            .add_customer(CustomerInput {
                name: name.to_string(),
                phone: None,
                address: None,
            })
            .await
            .expect("seed customer")
    }

    pub async fn seed_simple_product(&self, name: &str, price: &str, stock: i32) -> i32 {
        self.services
            .catalog
            .add_product(ProductInput {
                name: name.to_string(),
                description: None,
                price: price.parse().expect("parse price"),
                stock: StockMode::Simple { stock },
                images: Vec::new(),
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_varianted_product(
        &self,
        name: &str,
        price: &str,
        variants: &[(&str, i32)],
    ) -> i32 {
        self.services
            .catalog
            .add_product(ProductInput {
                name: name.to_string(),
                description: None,
                price: price.parse().expect("parse price"),
                stock: StockMode::Variants {
                    variants: variants
                        .iter()
                        .map(|(name, stock)| VariantInput {
                            name: name.to_string(),
                            stock: *stock,
                        })
                        .collect(),
                },
                images: Vec::new(),
            })
            .await
            .expect("seed varianted product")
    }
}
