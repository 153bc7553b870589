use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    domain::{
        catalog::CatalogSort,
        status::{OrderStatus, PaymentMethodKind, PaymentReferenceStatus},
    },
    dto::{
        admin::{
            InventoryAdjustRequest, LowStockQuery, ReportQuery, ReviewPaymentRequest,
            UpdateOrderStatusRequest,
        },
        auth::RegisterRequest,
        cart::{AddToCartRequest, UpdateCartItemRequest},
        orders::{AddPaymentReferenceRequest, CheckoutRequest, PaymentReferenceInput},
        payments::PaymentMethodQuery,
        products::{CreateCategoryRequest, CreateProductRequest, CreateTagRequest, CreateVariantRequest},
    },
    entity::payment_methods::ActiveModel as PaymentMethodActive,
    error::AppError,
    middleware::auth::AuthUser,
    models::Product,
    routes::params::{OrderListQuery, ProductQuery},
    services::{
        admin_service, auth_service, cart_service, order_service, payment_service,
        product_service,
    },
    state::AppState,
};
use uuid::Uuid;

// Customer browses, fills the cart and checks out; admin reviews payments,
// ships one order and cancels another, which restocks its lines.
#[tokio::test]
async fn checkout_review_and_cancel_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let customer = AuthUser::customer(register(&state, "cliente@example.com", "Cliente").await?);
    let admin = AuthUser::admin(register(&state, "admin@example.com", "Admin").await?);
    let payment_method_id =
        create_payment_method(&state, "pago_movil", "Banco de Venezuela", true).await?;
    let transfer_id = create_payment_method(&state, "transferencia", "Banesco", true).await?;
    let retired_id = create_payment_method(&state, "transferencia", "Mercantil", false).await?;

    // Payment methods
    let methods = payment_service::list_payment_methods(&state, PaymentMethodQuery::default())
        .await?
        .data
        .expect("payment methods");
    let listed: Vec<Uuid> = methods.items.iter().map(|m| m.id).collect();
    assert_eq!(listed, vec![payment_method_id, transfer_id]);

    let transfers = payment_service::list_payment_methods(
        &state,
        PaymentMethodQuery {
            kind: Some(PaymentMethodKind::Transferencia),
        },
    )
    .await?
    .data
    .expect("payment methods");
    assert_eq!(transfers.items.len(), 1);
    assert_eq!(transfers.items[0].id, transfer_id);

    let pago_movil = payment_service::get_payment_method(&state, payment_method_id)
        .await?
        .data
        .expect("payment method");
    assert_eq!(pago_movil.kind, PaymentMethodKind::PagoMovil);
    assert_eq!(pago_movil.phone.as_deref(), Some("555-9876"));
    let missing_method = payment_service::get_payment_method(&state, Uuid::new_v4()).await;
    assert!(matches!(missing_method, Err(AppError::NotFound)));

    // Catalog
    let category = product_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Electrónicos".into(),
            description: None,
            slug: None,
        },
    )
    .await?
    .data
    .expect("category");
    assert_eq!(category.slug, "electronicos");

    let tag = product_service::create_tag(
        &state,
        &admin,
        CreateTagRequest {
            name: "Nuevo".into(),
            slug: None,
        },
    )
    .await?
    .data
    .expect("tag");

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Smartphone XYZ".into(),
            description: "Cámara de alta resolución".into(),
            slug: None,
            category_id: category.id,
            featured_image: None,
            tag_ids: vec![tag.id],
            variants: vec![
                CreateVariantRequest {
                    color: "Negro".into(),
                    price: 59999,
                    stock: 3,
                    images: vec!["/img/negro.png".into()],
                },
                CreateVariantRequest {
                    color: "Blanco".into(),
                    price: 59999,
                    stock: 10,
                    images: vec![],
                },
            ],
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.slug, "smartphone-xyz");
    let black = variant_id(&product, "Negro");
    let white = variant_id(&product, "Blanco");

    let listing = product_service::list_products(
        &state,
        ProductQuery {
            tag: Some("nuevo".into()),
            sort: Some(CatalogSort::PriceAsc),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("listing");
    assert_eq!(listing.title, "Products tagged \"Nuevo\"");
    assert_eq!(listing.items.len(), 1);

    let viewed = product_service::get_product(&state, "smartphone-xyz")
        .await?
        .data
        .expect("product");
    assert_eq!(viewed.views, 1);

    // Cart
    let empty_cart = order_service::checkout(
        &state,
        &customer,
        checkout_request(payment_method_id, "Caracas"),
    )
    .await;
    assert!(matches!(empty_cart, Err(AppError::BadRequest(msg)) if msg == "Cart is empty"));

    cart_service::add_to_cart(&state, &customer, add(product.id, black, 2)).await?;
    let over_stock = cart_service::add_to_cart(&state, &customer, add(product.id, black, 2)).await;
    assert!(matches!(over_stock, Err(AppError::BadRequest(_))));
    let foreign_variant =
        cart_service::add_to_cart(&state, &customer, add(product.id, Uuid::new_v4(), 1)).await;
    assert!(matches!(foreign_variant, Err(AppError::NotFound)));

    let cart = cart_service::get_cart(&state, &customer)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.item_count, 2);
    assert_eq!(cart.total, 2 * 59999);

    // Checkout
    let blank_city = order_service::checkout(
        &state,
        &customer,
        checkout_request(payment_method_id, "   "),
    )
    .await;
    assert!(matches!(blank_city, Err(AppError::BadRequest(_))));

    let retired_method = order_service::checkout(
        &state,
        &customer,
        checkout_request(retired_id, "Caracas"),
    )
    .await;
    assert!(matches!(retired_method, Err(AppError::BadRequest(_))));

    let placed = order_service::checkout(
        &state,
        &customer,
        checkout_request(payment_method_id, "Caracas"),
    )
    .await?
    .data
    .expect("order");
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.total, 2 * 59999);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].subtotal, 2 * 59999);
    let reference = placed.payment_reference.clone().expect("payment reference");
    assert_eq!(reference.status, PaymentReferenceStatus::Pending);

    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(stock_of(&state, product.id, black).await?, 1);

    let duplicate = order_service::add_payment_reference(
        &state,
        &customer,
        placed.order.id,
        reference_request(payment_method_id, "999"),
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    // Admin verifies payment and ships
    let reviewed = admin_service::review_payment_reference(
        &state,
        &admin,
        reference.id,
        ReviewPaymentRequest {
            status: PaymentReferenceStatus::Verified,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(reviewed.order.status, OrderStatus::Processing);

    let skip_shipping = admin_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Delivered,
        },
    )
    .await;
    assert!(matches!(skip_shipping, Err(AppError::BadRequest(_))));

    let shipped = admin_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.order.status, OrderStatus::Shipped);

    let low = product_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            page: Some(1),
            per_page: Some(20),
            threshold: Some(5),
        },
    )
    .await?
    .data
    .expect("low stock");
    assert!(low.items.iter().any(|v| v.variant.id == black));
    assert!(!low.items.iter().any(|v| v.variant.id == white));

    // Second order: rejected payment, resubmission, then cancellation
    cart_service::add_to_cart(&state, &customer, add(product.id, white, 4)).await?;
    cart_service::update_quantity(
        &state,
        &customer,
        white,
        UpdateCartItemRequest { quantity: 3 },
    )
    .await?;
    let second = order_service::checkout(
        &state,
        &customer,
        checkout_request(payment_method_id, "Valencia"),
    )
    .await?
    .data
    .expect("order");
    assert_eq!(stock_of(&state, product.id, white).await?, 7);

    let first_reference = second.payment_reference.clone().expect("payment reference");
    admin_service::review_payment_reference(
        &state,
        &admin,
        first_reference.id,
        ReviewPaymentRequest {
            status: PaymentReferenceStatus::Rejected,
        },
    )
    .await?;
    let resubmitted = order_service::add_payment_reference(
        &state,
        &customer,
        second.order.id,
        reference_request(payment_method_id, "555000"),
    )
    .await?
    .data
    .expect("order");
    let latest = resubmitted.payment_reference.expect("payment reference");
    assert_eq!(latest.reference_number, "555000");
    assert_eq!(latest.status, PaymentReferenceStatus::Pending);
    assert_eq!(resubmitted.order.status, OrderStatus::Pending);

    let cancelled = admin_service::update_order_status(
        &state,
        &admin,
        second.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, product.id, white).await?, 10);

    let cancel_again = admin_service::update_order_status(
        &state,
        &admin,
        second.order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await;
    assert!(matches!(cancel_again, Err(AppError::BadRequest(_))));

    // Stock dropped below a cart line: checkout changes nothing
    cart_service::add_to_cart(&state, &customer, add(product.id, white, 2)).await?;
    product_service::adjust_variant_stock(
        &state,
        &admin,
        white,
        InventoryAdjustRequest { delta: -9 },
    )
    .await?;
    let stale = order_service::checkout(
        &state,
        &customer,
        checkout_request(payment_method_id, "Maracay"),
    )
    .await;
    assert!(matches!(stale, Err(AppError::BadRequest(_))));
    assert_eq!(stock_of(&state, product.id, white).await?, 1);
    let cart = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.item_count, 2);
    let orders = order_service::list_user_orders(&state, &customer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(orders.items.len(), 2);
    cart_service::clear_cart(&state, &customer).await?;

    // Listings and reports
    let mine = order_service::list_user_orders(&state, &customer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(mine.items.len(), 2);
    assert_eq!(mine.items[0].order.id, second.order.id);

    let shipped_only = admin_service::list_all_orders(
        &state,
        &admin,
        OrderListQuery {
            status: Some(OrderStatus::Shipped),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders");
    assert_eq!(shipped_only.items.len(), 1);

    let forbidden = admin_service::dashboard(&state, &customer).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let dashboard = admin_service::dashboard(&state, &admin)
        .await?
        .data
        .expect("dashboard");
    assert_eq!(dashboard.order_count, 2);
    assert_eq!(dashboard.total_sales, 2 * 59999);
    assert_eq!(dashboard.customer_count, 2);
    assert_eq!(dashboard.recent_orders.len(), 2);
    assert_eq!(dashboard.popular_products.len(), 1);
    assert_eq!(dashboard.popular_products[0].quantity, 2);

    let report = admin_service::sales_report(&state, &admin, ReportQuery::default())
        .await?
        .data
        .expect("report");
    assert_eq!(report.period_sales, 2 * 59999);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, payment_references, order_items, orders, cart_items, \
         payment_methods, product_tags, product_variants, products, tags, categories, users CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        jwt_secret: "test-secret".into(),
        host: "127.0.0.1".into(),
        port: 0,
        upload_dir: std::env::temp_dir().join("storefront-api-test-uploads"),
        max_upload_bytes: 1024 * 1024,
        public_base_url: String::new(),
    };
    Ok(AppState::new(orm, config))
}

async fn register(state: &AppState, email: &str, name: &str) -> anyhow::Result<Uuid> {
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            email: email.into(),
            password: "secret123".into(),
            dni: "V-12345678".into(),
            phone: "0414-0000000".into(),
            name: name.into(),
            address: None,
            city: None,
        },
    )
    .await?
    .data
    .expect("user");
    Ok(user.id)
}

async fn create_payment_method(
    state: &AppState,
    kind: &str,
    bank: &str,
    is_active: bool,
) -> anyhow::Result<Uuid> {
    let method = PaymentMethodActive {
        id: Set(Uuid::new_v4()),
        kind: Set(kind.into()),
        bank: Set(bank.into()),
        account_number: Set(None),
        phone: Set(Some("555-9876".into())),
        dni: Set("98765432".into()),
        holder_name: Set(None),
        account_type: Set(None),
        is_active: Set(is_active),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(method.id)
}

async fn stock_of(state: &AppState, product_id: Uuid, variant: Uuid) -> anyhow::Result<i32> {
    let product = product_service::get_product(state, &product_id.to_string())
        .await?
        .data
        .expect("product");
    product
        .variant(variant)
        .map(|v| v.stock)
        .ok_or_else(|| anyhow::anyhow!("variant {variant} missing"))
}

fn variant_id(product: &Product, color: &str) -> Uuid {
    product
        .variants
        .iter()
        .find(|v| v.color == color)
        .map(|v| v.id)
        .expect("variant by color")
}

fn add(product_id: Uuid, variant_id: Uuid, quantity: i32) -> AddToCartRequest {
    AddToCartRequest {
        product_id,
        variant_id,
        quantity,
    }
}

fn payment_reference(number: &str) -> PaymentReferenceInput {
    PaymentReferenceInput {
        reference_number: number.into(),
        bank_origin: "Banesco".into(),
        date: NaiveDate::from_ymd_opt(2024, 5, 2).expect("date"),
        image_url: None,
    }
}

fn checkout_request(payment_method_id: Uuid, city: &str) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: "Av. Principal 123".into(),
        shipping_city: city.into(),
        payment_method_id,
        payment_reference: payment_reference("000123"),
    }
}

fn reference_request(payment_method_id: Uuid, number: &str) -> AddPaymentReferenceRequest {
    AddPaymentReferenceRequest {
        payment_method_id,
        reference: payment_reference(number),
    }
}
