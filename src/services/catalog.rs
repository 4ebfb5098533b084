use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{order_item, product, product_image, product_variant},
    errors::ServiceError,
    events::{Event, EventSender},
    storage::{self, ImageStore},
};

/// How a product tracks stock: a single count, or one count per variant.
///
/// The aggregate stock a product reports is `stock` in simple mode and the
/// sum of variant stocks otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StockMode {
    Simple { stock: i32 },
    Variants { variants: Vec<VariantInput> },
}

impl StockMode {
    pub fn has_variants(&self) -> bool {
        matches!(self, StockMode::Variants { .. })
    }

    /// Aggregate stock across the mode. Variant entries with empty names are
    /// dropped on write and excluded here for consistency.
    pub fn total_stock(&self) -> i64 {
        match self {
            StockMode::Simple { stock } => *stock as i64,
            StockMode::Variants { variants } => variants
                .iter()
                .filter(|v| !v.name.is_empty())
                .map(|v| v.stock as i64)
                .sum(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantInput {
    pub name: String,
    pub stock: i32,
}

/// An image payload submitted with a product: base64 bytes plus the
/// client-reported filename extension.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    pub data: String,
    pub extension: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(flatten)]
    pub stock: StockMode,
    #[serde(default)]
    pub images: Vec<ImageUpload>,
}

#[derive(Debug, Serialize)]
pub struct VariantResponse {
    pub id: i32,
    pub name: String,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: i32,
    pub filename: String,
}

/// Row shape for product listings: computed stock, first image as thumbnail,
/// variant breakdown when the product tracks variants.
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
    pub has_variants: bool,
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<VariantResponse>>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub has_variants: bool,
    pub simple_stock: i32,
    pub stock: i64,
    pub variants: Vec<VariantResponse>,
    pub images: Vec<ImageResponse>,
}

/// Service managing products, their variant sets and their images
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    image_store: Arc<dyn ImageStore>,
    event_sender: Option<Arc<EventSender>>,
}

impl CatalogService {
    /// Creates a new catalog service instance
    pub fn new(
        db_pool: Arc<DbPool>,
        image_store: Arc<dyn ImageStore>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            image_store,
            event_sender,
        }
    }

    /// Creates a product with its variant set and any valid image uploads.
    ///
    /// Image blobs are written to the store before the database transaction
    /// opens; product, variants and image rows then commit as one unit.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn add_product(&self, input: ProductInput) -> Result<i32, ServiceError> {
        self.validate_input(&input)?;
        self.ensure_name_free(&input.name, None).await?;

        let uploads = decode_uploads(&input.images)?;
        let filenames = self.store_uploads(uploads).await?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for product creation");
            ServiceError::DatabaseError(e)
        })?;

        let product_model = product::ActiveModel {
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            price: Set(input.price),
            has_variants: Set(input.stock.has_variants()),
            simple_stock: Set(match input.stock {
                StockMode::Simple { stock } => stock,
                StockMode::Variants { .. } => 0,
            }),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert product");
            ServiceError::DatabaseError(e)
        })?;

        if let StockMode::Variants { variants } = &input.stock {
            insert_variants(&txn, product_model.id, variants).await?;
        }

        insert_images(&txn, product_model.id, &filenames).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit product creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = product_model.id, "Product created");
        self.notify(Event::ProductCreated(product_model.id)).await;

        Ok(product_model.id)
    }

    /// Replaces a product's fields and variant set; newly uploaded images
    /// are appended, never replacing existing ones. The variant set is
    /// deleted and recreated wholesale, no diffing.
    #[instrument(skip(self, input), fields(product_id = product_id))]
    pub async fn edit_product(
        &self,
        product_id: i32,
        input: ProductInput,
    ) -> Result<(), ServiceError> {
        self.validate_input(&input)?;

        let db = &*self.db_pool;
        let existing = product::Entity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        self.ensure_name_free(&input.name, Some(product_id)).await?;

        let uploads = decode_uploads(&input.images)?;
        let filenames = self.store_uploads(uploads).await?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for product edit");
            ServiceError::DatabaseError(e)
        })?;

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(input.name.clone());
        active.description = Set(input.description.clone());
        active.price = Set(input.price);
        active.has_variants = Set(input.stock.has_variants());
        active.simple_stock = Set(match input.stock {
            StockMode::Simple { stock } => stock,
            StockMode::Variants { .. } => 0,
        });
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, product_id = product_id, "Failed to update product");
            ServiceError::DatabaseError(e)
        })?;

        product_variant::Entity::delete_many()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = product_id, "Failed to clear variant set");
                ServiceError::DatabaseError(e)
            })?;

        if let StockMode::Variants { variants } = &input.stock {
            insert_variants(&txn, product_id, variants).await?;
        }

        insert_images(&txn, product_id, &filenames).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, product_id = product_id, "Failed to commit product edit");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = product_id, "Product updated");
        self.notify(Event::ProductUpdated(product_id)).await;

        Ok(())
    }

    /// Deletes a single image: storage artifact first, then the row. The row
    /// survives when artifact removal fails; an artifact that is already
    /// gone is tolerated.
    #[instrument(skip(self), fields(image_id = image_id))]
    pub async fn delete_image(&self, image_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let image = product_image::Entity::find_by_id(image_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))?;

        let removed = self.image_store.delete(&image.filename).await?;
        if !removed {
            debug!(filename = %image.filename, "Image artifact already absent");
        }

        product_image::Entity::delete_by_id(image_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, image_id = image_id, "Failed to delete image row");
                ServiceError::DatabaseError(e)
            })?;

        info!(image_id = image_id, "Image deleted");
        self.notify(Event::ProductImageDeleted(image_id)).await;

        Ok(())
    }

    /// Deletes a product with its variants and images. Blocked while any
    /// order item references the product; artifact removal is best-effort.
    #[instrument(skip(self), fields(product_id = product_id))]
    pub async fn delete_product(&self, product_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let existing = product::Entity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let references = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(product_id))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if references > 0 {
            return Err(ServiceError::Conflict(
                "Cannot delete product associated with an order.".to_string(),
            ));
        }

        let images = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        for image in &images {
            if let Err(e) = self.image_store.delete(&image.filename).await {
                warn!(error = %e, filename = %image.filename, "Ignoring image artifact removal failure");
            }
        }

        product::Entity::delete(product::ActiveModel::from(existing))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = product_id, "Failed to delete product");
                ServiceError::DatabaseError(e)
            })?;

        info!(product_id = product_id, "Product deleted");
        self.notify(Event::ProductDeleted(product_id)).await;

        Ok(())
    }

    /// Lists products, optionally filtered by a case-insensitive substring
    /// match on the name.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<ProductSummary>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = product::Entity::find().order_by_asc(product::Column::Name);
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(product::Column::Name))).like(pattern),
            );
        }

        let products = query.all(db).await.map_err(ServiceError::DatabaseError)?;

        let mut summaries = Vec::with_capacity(products.len());
        for p in products {
            let variants = if p.has_variants {
                Some(self.load_variants(p.id).await?)
            } else {
                None
            };
            let stock = match &variants {
                Some(list) => list.iter().map(|v| v.stock as i64).sum(),
                None => p.simple_stock as i64,
            };
            let thumbnail = self.first_image(p.id).await?.map(|i| i.filename);

            summaries.push(ProductSummary {
                id: p.id,
                name: p.name,
                price: p.price,
                stock,
                has_variants: p.has_variants,
                thumbnail,
                variants,
            });
        }

        Ok(summaries)
    }

    /// Full product detail with all variants and images.
    #[instrument(skip(self), fields(product_id = product_id))]
    pub async fn get_product(&self, product_id: i32) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db_pool;

        let p = product::Entity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let variants = self.load_variants(p.id).await?;
        let images = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(p.id))
            .order_by_asc(product_image::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|i| ImageResponse {
                id: i.id,
                filename: i.filename,
            })
            .collect();

        let stock = if p.has_variants {
            variants.iter().map(|v| v.stock as i64).sum()
        } else {
            p.simple_stock as i64
        };

        Ok(ProductDetail {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            has_variants: p.has_variants,
            simple_stock: p.simple_stock,
            stock,
            variants,
            images,
        })
    }

    fn validate_input(&self, input: &ProductInput) -> Result<(), ServiceError> {
        input.validate()?;

        if input.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must be greater than zero".to_string(),
            ));
        }

        match &input.stock {
            StockMode::Simple { stock } if *stock < 0 => Err(ServiceError::ValidationError(
                "Stock cannot be negative".to_string(),
            )),
            StockMode::Variants { variants }
                if variants.iter().any(|v| !v.name.is_empty() && v.stock < 0) =>
            {
                Err(ServiceError::ValidationError(
                    "Variant stock cannot be negative".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_name_free(
        &self,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let mut query = product::Entity::find().filter(product::Column::Name.eq(name));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        let taken = query
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            > 0;
        if taken {
            return Err(ServiceError::ValidationError(format!(
                "A product named '{}' already exists",
                name
            )));
        }

        Ok(())
    }

    async fn store_uploads(
        &self,
        uploads: Vec<(Vec<u8>, String)>,
    ) -> Result<Vec<String>, ServiceError> {
        let mut filenames = Vec::with_capacity(uploads.len());
        for (bytes, extension) in uploads {
            filenames.push(self.image_store.save(&bytes, &extension).await?);
        }
        Ok(filenames)
    }

    async fn load_variants(&self, product_id: i32) -> Result<Vec<VariantResponse>, ServiceError> {
        let db = &*self.db_pool;
        Ok(product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|v| VariantResponse {
                id: v.id,
                name: v.name,
                stock: v.stock,
            })
            .collect())
    }

    async fn first_image(
        &self,
        product_id: i32,
    ) -> Result<Option<product_image::Model>, ServiceError> {
        let db = &*self.db_pool;
        product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::Id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn notify(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send catalog event");
            }
        }
    }
}

/// Decodes uploads, silently skipping unrecognized file types. Undecodable
/// payloads for recognized types are a validation error.
fn decode_uploads(images: &[ImageUpload]) -> Result<Vec<(Vec<u8>, String)>, ServiceError> {
    let mut uploads = Vec::new();
    for image in images {
        if !storage::is_allowed_extension(&image.extension) {
            debug!(extension = %image.extension, "Skipping upload with unrecognized file type");
            continue;
        }
        let bytes = BASE64.decode(image.data.as_bytes()).map_err(|e| {
            ServiceError::ValidationError(format!("Invalid image payload: {}", e))
        })?;
        uploads.push((bytes, image.extension.clone()));
    }
    Ok(uploads)
}

async fn insert_variants(
    txn: &sea_orm::DatabaseTransaction,
    product_id: i32,
    variants: &[VariantInput],
) -> Result<(), ServiceError> {
    for variant in variants.iter().filter(|v| !v.name.is_empty()) {
        product_variant::ActiveModel {
            product_id: Set(product_id),
            name: Set(variant.name.clone()),
            stock: Set(variant.stock),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| {
            error!(error = %e, product_id = product_id, "Failed to insert variant");
            ServiceError::DatabaseError(e)
        })?;
    }
    Ok(())
}

async fn insert_images(
    txn: &sea_orm::DatabaseTransaction,
    product_id: i32,
    filenames: &[String],
) -> Result<(), ServiceError> {
    for filename in filenames {
        product_image::ActiveModel {
            product_id: Set(product_id),
            filename: Set(filename.clone()),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| {
            error!(error = %e, product_id = product_id, "Failed to insert image row");
            ServiceError::DatabaseError(e)
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stock_mode_reports_aggregate_stock() {
        let simple = StockMode::Simple { stock: 5 };
        assert!(!simple.has_variants());
        assert_eq!(simple.total_stock(), 5);

        let variants = StockMode::Variants {
            variants: vec![
                VariantInput {
                    name: "Red".to_string(),
                    stock: 3,
                },
                VariantInput {
                    name: "Blue".to_string(),
                    stock: 2,
                },
                VariantInput {
                    name: String::new(),
                    stock: 99,
                },
            ],
        };
        assert!(variants.has_variants());
        // unnamed entries are dropped on write, so they don't count
        assert_eq!(variants.total_stock(), 5);
    }

    #[test]
    fn product_input_deserializes_both_stock_modes() {
        let simple: ProductInput = serde_json::from_str(
            r#"{"name": "Widget", "price": "9.99", "mode": "simple", "stock": 5}"#,
        )
        .expect("simple input");
        assert_eq!(simple.price, dec!(9.99));
        assert!(matches!(simple.stock, StockMode::Simple { stock: 5 }));
        assert!(simple.images.is_empty());

        let varianted: ProductInput = serde_json::from_str(
            r#"{
                "name": "Shirt",
                "price": "19.99",
                "mode": "variants",
                "variants": [{"name": "S", "stock": 1}, {"name": "M", "stock": 2}]
            }"#,
        )
        .expect("variant input");
        assert_eq!(varianted.stock.total_stock(), 3);
    }

    #[test]
    fn uploads_with_unknown_extensions_are_skipped() {
        let uploads = decode_uploads(&[
            ImageUpload {
                data: BASE64.encode(b"fake png"),
                extension: "png".to_string(),
            },
            ImageUpload {
                data: BASE64.encode(b"script"),
                extension: "exe".to_string(),
            },
        ])
        .expect("decode");

        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, "png");
    }

    #[test]
    fn malformed_payload_for_recognized_type_is_rejected() {
        let result = decode_uploads(&[ImageUpload {
            data: "not base64 at all!!!".to_string(),
            extension: "png".to_string(),
        }]);
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }
}
