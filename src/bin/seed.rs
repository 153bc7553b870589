use std::collections::HashMap;

use serde_json::json;
use storefront_api::{
    config::AppConfig,
    db::{DbPool, create_orm_conn, run_migrations},
    services::auth_service::hash_password,
    state::AppState,
};
use uuid::Uuid;

struct SeedUser {
    email: &'static str,
    password: &'static str,
    name: &'static str,
    dni: &'static str,
    phone: &'static str,
    address: &'static str,
    city: &'static str,
    is_admin: bool,
}

struct SeedVariant {
    color: &'static str,
    price: i64,
    stock: i32,
}

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    slug: &'static str,
    category: &'static str,
    tags: &'static [&'static str],
    views: i64,
    variants: &'static [SeedVariant],
}

const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

const CATEGORIES: [(&str, &str, &str); 4] = [
    ("Electrónicos", "Productos electrónicos", "electronicos"),
    ("Ropa", "Ropa y accesorios", "ropa"),
    ("Hogar", "Artículos para el hogar", "hogar"),
    ("Deportes", "Equipamiento deportivo", "deportes"),
];

const TAGS: [(&str, &str); 4] = [
    ("Oferta", "oferta"),
    ("Nuevo", "nuevo"),
    ("Tendencia", "tendencia"),
    ("Popular", "popular"),
];

const PRODUCTS: [SeedProduct; 4] = [
    SeedProduct {
        name: "Smartphone XYZ",
        description: "Smartphone de última generación con cámara de alta resolución",
        slug: "smartphone-xyz",
        category: "electronicos",
        tags: &["nuevo", "popular"],
        views: 120,
        variants: &[
            SeedVariant { color: "Negro", price: 59999, stock: 15 },
            SeedVariant { color: "Blanco", price: 59999, stock: 10 },
        ],
    },
    SeedProduct {
        name: "Camiseta Deportiva",
        description: "Camiseta deportiva de alta calidad",
        slug: "camiseta-deportiva",
        category: "ropa",
        tags: &["oferta"],
        views: 85,
        variants: &[
            SeedVariant { color: "Rojo", price: 2999, stock: 50 },
            SeedVariant { color: "Azul", price: 2999, stock: 45 },
        ],
    },
    SeedProduct {
        name: "Silla Ergonómica",
        description: "Silla de oficina ergonómica para largas jornadas de trabajo",
        slug: "silla-ergonomica",
        category: "hogar",
        tags: &["tendencia"],
        views: 45,
        variants: &[SeedVariant { color: "Negro", price: 19999, stock: 8 }],
    },
    SeedProduct {
        name: "Balón de Fútbol",
        description: "Balón de fútbol profesional",
        slug: "balon-futbol",
        category: "deportes",
        tags: &["popular"],
        views: 60,
        variants: &[SeedVariant { color: "Blanco/Negro", price: 4999, stock: 30 }],
    },
];

const USERS: [SeedUser; 2] = [
    SeedUser {
        email: "usuario@demo.com",
        password: "usuario123",
        name: "Usuario Demo",
        dni: "12345678",
        phone: "555-1234",
        address: "Calle Principal 123",
        city: "Ciudad Demo",
        is_admin: false,
    },
    SeedUser {
        email: "admin@demo.com",
        password: "admin123",
        name: "Admin Demo",
        dni: "87654321",
        phone: "555-4321",
        address: "Av. Central 456",
        city: "Ciudad Admin",
        is_admin: true,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let state = AppState::new(orm, config);
    let pool = &state.pool;

    for user in &USERS {
        let id = ensure_user(pool, user).await?;
        println!("Ensured user {} (admin={}) id={id}", user.email, user.is_admin);
    }

    let categories = seed_categories(pool).await?;
    let tags = seed_tags(pool).await?;
    seed_products(pool, &categories, &tags).await?;
    seed_payment_methods(pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn ensure_user(pool: &DbPool, user: &SeedUser) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(user.password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, dni, phone, name, address, city, is_admin)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (email) DO UPDATE SET is_admin = EXCLUDED.is_admin
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.email)
    .bind(password_hash)
    .bind(user.dni)
    .bind(user.phone)
    .bind(user.name)
    .bind(user.address)
    .bind(user.city)
    .bind(user.is_admin)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_categories(pool: &DbPool) -> anyhow::Result<HashMap<&'static str, Uuid>> {
    let mut ids = HashMap::new();
    for (name, description, slug) in CATEGORIES {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO categories (id, name, description, slug)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(slug)
        .fetch_one(pool)
        .await?;
        ids.insert(slug, id);
    }
    println!("Seeded {} categories", ids.len());
    Ok(ids)
}

async fn seed_tags(pool: &DbPool) -> anyhow::Result<HashMap<&'static str, Uuid>> {
    let mut ids = HashMap::new();
    for (name, slug) in TAGS {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO tags (id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .fetch_one(pool)
        .await?;
        ids.insert(slug, id);
    }
    println!("Seeded {} tags", ids.len());
    Ok(ids)
}

/// Products already present (by slug) are left untouched, variants included.
async fn seed_products(
    pool: &DbPool,
    categories: &HashMap<&'static str, Uuid>,
    tags: &HashMap<&'static str, Uuid>,
) -> anyhow::Result<()> {
    let images = json!([PLACEHOLDER_IMAGE, PLACEHOLDER_IMAGE]);
    let mut created = 0;

    for product in &PRODUCTS {
        let category_id = categories
            .get(product.category)
            .ok_or_else(|| anyhow::anyhow!("unknown category {}", product.category))?;

        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, slug, category_id, featured_image, views)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product.name)
        .bind(product.description)
        .bind(product.slug)
        .bind(category_id)
        .bind(PLACEHOLDER_IMAGE)
        .bind(product.views)
        .fetch_optional(pool)
        .await?;

        let Some((product_id,)) = inserted else {
            continue;
        };

        for variant in product.variants {
            sqlx::query(
                r#"
                INSERT INTO product_variants (id, product_id, color, price, stock, images)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(variant.color)
            .bind(variant.price)
            .bind(variant.stock)
            .bind(&images)
            .execute(pool)
            .await?;
        }

        for slug in product.tags {
            let tag_id = tags
                .get(slug)
                .ok_or_else(|| anyhow::anyhow!("unknown tag {slug}"))?;
            sqlx::query("INSERT INTO product_tags (product_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(product_id)
                .bind(tag_id)
                .execute(pool)
                .await?;
        }
        created += 1;
    }

    println!("Seeded {created} products");
    Ok(())
}

async fn seed_payment_methods(pool: &DbPool) -> anyhow::Result<()> {
    let methods: [(&str, &str, Option<&str>, Option<&str>, &str, Option<&str>, Option<&str>); 3] = [
        ("pago_movil", "Banco de Venezuela", None, Some("555-9876"), "98765432", None, None),
        (
            "transferencia",
            "Banesco",
            Some("1234567890"),
            None,
            "87654321",
            Some("Tienda Demo"),
            Some("corriente"),
        ),
        (
            "transferencia",
            "Mercantil",
            Some("0987654321"),
            None,
            "76543210",
            Some("Tienda Demo"),
            Some("ahorro"),
        ),
    ];

    for (kind, bank, account_number, phone, dni, holder_name, account_type) in methods {
        sqlx::query(
            r#"
            INSERT INTO payment_methods
                (id, kind, bank, account_number, phone, dni, holder_name, account_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (kind, bank, COALESCE(account_number, ''), COALESCE(phone, '')) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(kind)
        .bind(bank)
        .bind(account_number)
        .bind(phone)
        .bind(dni)
        .bind(holder_name)
        .bind(account_type)
        .execute(pool)
        .await?;
    }

    println!("Seeded payment methods");
    Ok(())
}
