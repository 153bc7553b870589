use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        catalog::{CatalogSort, HomeSections},
        status::{AccountType, OrderStatus, PaymentMethodKind, PaymentReferenceStatus},
    },
    dto::{admin, auth as auth_dto, cart as cart_dto, orders as order_dto, payments, products, uploads as upload_dto},
    models::{
        Cart, CartItem, Category, Order, OrderItem, PaymentMethod, PaymentReference, Product,
        ProductVariant, Tag, User,
    },
    response::Meta,
    routes::{
        admin as admin_routes, auth, cart, health, orders, payments as payment_routes, products as product_routes,
        uploads,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        auth::update_profile,
        product_routes::list_products,
        product_routes::home,
        product_routes::get_product,
        product_routes::create_product,
        product_routes::update_product,
        product_routes::delete_product,
        product_routes::add_variant,
        product_routes::list_categories,
        product_routes::create_category,
        product_routes::list_category_products,
        product_routes::list_tags,
        product_routes::create_tag,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::add_payment_reference,
        payment_routes::list_payment_methods,
        payment_routes::get_payment_method,
        uploads::upload_receipt,
        admin_routes::dashboard,
        admin_routes::sales_report,
        admin_routes::views_report,
        admin_routes::list_all_orders,
        admin_routes::get_order_admin,
        admin_routes::update_order_status,
        admin_routes::review_payment_reference,
        admin_routes::list_low_stock,
        admin_routes::adjust_inventory,
        admin_routes::update_variant,
        admin_routes::get_user
    ),
    components(
        schemas(
            User,
            Category,
            Tag,
            Product,
            ProductVariant,
            CartItem,
            Cart,
            PaymentMethod,
            PaymentReference,
            Order,
            OrderItem,
            OrderStatus,
            PaymentReferenceStatus,
            PaymentMethodKind,
            AccountType,
            CatalogSort,
            HomeSections,
            Meta,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            auth_dto::UpdateProfileRequest,
            products::CreateProductRequest,
            products::CreateVariantRequest,
            products::UpdateProductRequest,
            products::UpdateVariantRequest,
            products::CreateCategoryRequest,
            products::CreateTagRequest,
            products::ProductList,
            products::CategoryList,
            products::TagList,
            products::HomePage,
            products::LowStockVariant,
            products::LowStockList,
            cart_dto::AddToCartRequest,
            cart_dto::UpdateCartItemRequest,
            order_dto::PaymentReferenceInput,
            order_dto::CheckoutRequest,
            order_dto::AddPaymentReferenceRequest,
            order_dto::OrderWithItems,
            order_dto::OrderList,
            payments::PaymentMethodList,
            upload_dto::UploadedFile,
            upload_dto::ReceiptUpload,
            admin::UpdateOrderStatusRequest,
            admin::ReviewPaymentRequest,
            admin::InventoryAdjustRequest,
            admin::TopProduct,
            admin::SalesReport,
            admin::ViewedProduct,
            admin::ViewsReport,
            admin::RecentOrder,
            admin::Dashboard
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Products", description = "Catalog, categories and tags"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Payments", description = "Payment methods and receipt uploads"),
        (name = "Admin", description = "Dashboard, reports, orders and inventory"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
