mod common;

use assert_matches::assert_matches;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use stockroom_api::entities::{product_image, product_variant};
use stockroom_api::errors::ServiceError;
use stockroom_api::services::catalog::{ImageUpload, ProductInput, StockMode, VariantInput};
use stockroom_api::services::orders::{CreateOrderRequest, OrderItemInput};

use common::TestApp;

fn simple_input(name: &str, price: &str, stock: i32) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        description: None,
        price: price.parse().expect("parse price"),
        stock: StockMode::Simple { stock },
        images: Vec::new(),
    }
}

#[tokio::test]
async fn add_then_get_simple_product() {
    let app = TestApp::new().await;

    let id = app.seed_simple_product("Widget", "9.99", 5).await;
    let detail = app.services.catalog.get_product(id).await.expect("get");

    assert_eq!(detail.name, "Widget");
    assert_eq!(detail.price, dec!(9.99));
    assert!(!detail.has_variants);
    assert_eq!(detail.simple_stock, 5);
    assert_eq!(detail.stock, 5);
    assert!(detail.variants.is_empty());
}

#[tokio::test]
async fn edit_switches_simple_product_to_variants() {
    let app = TestApp::new().await;
    let id = app.seed_simple_product("Widget", "9.99", 5).await;

    app.services
        .catalog
        .edit_product(
            id,
            ProductInput {
                name: "Widget".to_string(),
                description: None,
                price: dec!(9.99),
                stock: StockMode::Variants {
                    variants: vec![
                        VariantInput {
                            name: "Red".to_string(),
                            stock: 3,
                        },
                        VariantInput {
                            name: "Blue".to_string(),
                            stock: 2,
                        },
                    ],
                },
                images: Vec::new(),
            },
        )
        .await
        .expect("edit");

    let detail = app.services.catalog.get_product(id).await.expect("get");
    assert!(detail.has_variants);
    assert_eq!(detail.simple_stock, 0);
    assert_eq!(detail.stock, 5);
    assert_eq!(detail.variants.len(), 2);
}

#[tokio::test]
async fn edit_replaces_the_variant_set_wholesale() {
    let app = TestApp::new().await;
    let id = app
        .seed_varianted_product("Shirt", "19.99", &[("S", 1), ("M", 2), ("L", 3)])
        .await;

    app.services
        .catalog
        .edit_product(
            id,
            ProductInput {
                name: "Shirt".to_string(),
                description: None,
                price: dec!(19.99),
                stock: StockMode::Variants {
                    variants: vec![VariantInput {
                        name: "XL".to_string(),
                        stock: 7,
                    }],
                },
                images: Vec::new(),
            },
        )
        .await
        .expect("edit");

    let detail = app.services.catalog.get_product(id).await.expect("get");
    assert_eq!(detail.variants.len(), 1);
    assert_eq!(detail.variants[0].name, "XL");
    assert_eq!(detail.stock, 7);

    let rows = product_variant::Entity::find()
        .filter(product_variant::Column::ProductId.eq(id))
        .count(&*app.db)
        .await
        .expect("count variants");
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn variant_entries_with_empty_names_are_ignored() {
    let app = TestApp::new().await;
    let id = app
        .seed_varianted_product("Mug", "4.50", &[("", 4), ("Green", 2)])
        .await;

    let detail = app.services.catalog.get_product(id).await.expect("get");
    assert_eq!(detail.variants.len(), 1);
    assert_eq!(detail.variants[0].name, "Green");
    assert_eq!(detail.stock, 2);
}

#[tokio::test]
async fn duplicate_names_fail_validation() {
    let app = TestApp::new().await;
    app.seed_simple_product("Widget", "9.99", 5).await;

    let err = app
        .services
        .catalog
        .add_product(simple_input("Widget", "1.00", 1))
        .await
        .expect_err("duplicate must fail");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn nonpositive_prices_fail_validation() {
    let app = TestApp::new().await;

    let err = app
        .services
        .catalog
        .add_product(simple_input("Freebie", "0", 1))
        .await
        .expect_err("zero price must fail");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn unrecognized_image_types_are_skipped_and_valid_ones_stored() {
    let app = TestApp::new().await;

    let id = app
        .services
        .catalog
        .add_product(ProductInput {
            name: "Poster".to_string(),
            description: Some("Wall art".to_string()),
            price: dec!(12.00),
            stock: StockMode::Simple { stock: 3 },
            images: vec![
                ImageUpload {
                    data: BASE64.encode(b"png bytes"),
                    extension: "png".to_string(),
                },
                ImageUpload {
                    data: BASE64.encode(b"malware"),
                    extension: "exe".to_string(),
                },
            ],
        })
        .await
        .expect("add with images");

    let detail = app.services.catalog.get_product(id).await.expect("get");
    assert_eq!(detail.images.len(), 1);
    assert!(detail.images[0].filename.ends_with(".png"));
    assert!(app
        .upload_dir
        .path()
        .join(&detail.images[0].filename)
        .exists());
}

#[tokio::test]
async fn edit_appends_images_without_replacing() {
    let app = TestApp::new().await;

    let id = app
        .services
        .catalog
        .add_product(ProductInput {
            name: "Lamp".to_string(),
            description: None,
            price: dec!(30.00),
            stock: StockMode::Simple { stock: 2 },
            images: vec![ImageUpload {
                data: BASE64.encode(b"first"),
                extension: "jpg".to_string(),
            }],
        })
        .await
        .expect("add");

    app.services
        .catalog
        .edit_product(
            id,
            ProductInput {
                name: "Lamp".to_string(),
                description: None,
                price: dec!(30.00),
                stock: StockMode::Simple { stock: 2 },
                images: vec![ImageUpload {
                    data: BASE64.encode(b"second"),
                    extension: "gif".to_string(),
                }],
            },
        )
        .await
        .expect("edit");

    let detail = app.services.catalog.get_product(id).await.expect("get");
    assert_eq!(detail.images.len(), 2);
}

#[tokio::test]
async fn delete_image_removes_row_and_artifact() {
    let app = TestApp::new().await;

    let id = app
        .services
        .catalog
        .add_product(ProductInput {
            name: "Chair".to_string(),
            description: None,
            price: dec!(55.00),
            stock: StockMode::Simple { stock: 1 },
            images: vec![ImageUpload {
                data: BASE64.encode(b"chair photo"),
                extension: "jpeg".to_string(),
            }],
        })
        .await
        .expect("add");

    let detail = app.services.catalog.get_product(id).await.expect("get");
    let image = &detail.images[0];
    let artifact = app.upload_dir.path().join(&image.filename);
    assert!(artifact.exists());

    app.services
        .catalog
        .delete_image(image.id)
        .await
        .expect("delete image");
    assert!(!artifact.exists());

    let detail = app.services.catalog.get_product(id).await.expect("get");
    assert!(detail.images.is_empty());

    let err = app
        .services
        .catalog
        .delete_image(image.id)
        .await
        .expect_err("second delete must fail");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn delete_product_cascades_to_variants_and_images() {
    let app = TestApp::new().await;
    let id = app
        .seed_varianted_product("Hat", "8.00", &[("Small", 1), ("Large", 2)])
        .await;

    app.services
        .catalog
        .delete_product(id)
        .await
        .expect("delete");

    let err = app
        .services
        .catalog
        .get_product(id)
        .await
        .expect_err("gone");
    assert_matches!(err, ServiceError::NotFound(_));

    let variant_rows = product_variant::Entity::find()
        .filter(product_variant::Column::ProductId.eq(id))
        .count(&*app.db)
        .await
        .expect("count variants");
    assert_eq!(variant_rows, 0);

    let image_rows = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(id))
        .count(&*app.db)
        .await
        .expect("count images");
    assert_eq!(image_rows, 0);
}

#[tokio::test]
async fn delete_product_referenced_by_an_order_conflicts() {
    let app = TestApp::new().await;
    let customer_id = app.seed_customer("Ada").await;
    let product_id = app
        .seed_varianted_product("Scarf", "14.00", &[("Wool", 4)])
        .await;
    let variant_id = app
        .services
        .catalog
        .get_product(product_id)
        .await
        .expect("get")
        .variants[0]
        .id;

    app.services
        .orders
        .create_order(CreateOrderRequest {
            customer_id,
            delivery_method: None,
            items: vec![OrderItemInput {
                product_id,
                variant_id: Some(variant_id),
                quantity: 1,
            }],
        })
        .await
        .expect("create order");

    let err = app
        .services
        .catalog
        .delete_product(product_id)
        .await
        .expect_err("delete must conflict");
    assert_matches!(err, ServiceError::Conflict(_));

    // product and its variants are left intact
    let detail = app
        .services
        .catalog
        .get_product(product_id)
        .await
        .expect("still there");
    assert_eq!(detail.variants.len(), 1);
}

#[tokio::test]
async fn list_products_matches_name_case_insensitively() {
    let app = TestApp::new().await;
    app.seed_simple_product("Blue Widget", "9.99", 5).await;
    app.seed_simple_product("Red Widget", "9.99", 2).await;
    app.seed_simple_product("Gadget", "3.00", 1).await;

    let all = app
        .services
        .catalog
        .list_products(None)
        .await
        .expect("list all");
    assert_eq!(all.len(), 3);

    let widgets = app
        .services
        .catalog
        .list_products(Some("wIdGeT"))
        .await
        .expect("list filtered");
    assert_eq!(widgets.len(), 2);
    assert!(widgets.iter().all(|p| p.name.contains("Widget")));
}

#[tokio::test]
async fn listing_reports_summed_stock_and_variant_breakdown() {
    let app = TestApp::new().await;
    app.seed_varianted_product("Tee", "15.00", &[("S", 3), ("M", 2)])
        .await;
    app.seed_simple_product("Cap", "10.00", 7).await;

    let listing = app
        .services
        .catalog
        .list_products(None)
        .await
        .expect("list");

    let tee = listing.iter().find(|p| p.name == "Tee").expect("tee row");
    assert!(tee.has_variants);
    assert_eq!(tee.stock, 5);
    assert_eq!(tee.variants.as_ref().map(|v| v.len()), Some(2));

    let cap = listing.iter().find(|p| p.name == "Cap").expect("cap row");
    assert!(!cap.has_variants);
    assert_eq!(cap.stock, 7);
    assert!(cap.variants.is_none());
}
