use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::catalog,
    dto::admin::{InventoryAdjustRequest, LowStockQuery},
    dto::products::{
        CategoryList, CreateCategoryRequest, CreateProductRequest, CreateTagRequest,
        CreateVariantRequest, HomePage, LowStockList, LowStockVariant, ProductList, TagList,
        UpdateProductRequest, UpdateVariantRequest,
    },
    entity::{
        categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
            Model as CategoryModel,
        },
        product_tags::{ActiveModel as ProductTagActive, Column as ProductTagCol, Entity as ProductTags},
        product_variants::{
            ActiveModel as VariantActive, Column as VariantCol, Entity as ProductVariants,
            Model as VariantModel,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        tags::{ActiveModel as TagActive, Column as TagCol, Entity as Tags, Model as TagModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product, ProductVariant, Tag},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery},
    state::AppState,
};

const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let filter = query.filter();
    let pagination = query.pagination();

    let category = match filter.category_id {
        Some(id) => Categories::find_by_id(id).one(&state.orm).await?,
        None => None,
    };
    let tag = match filter.tag.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(slug) => {
            Tags::find()
                .filter(TagCol::Slug.eq(slug.trim()))
                .one(&state.orm)
                .await?
        }
        None => None,
    };

    // Category narrows in SQL; text search, tags and price ordering need the
    // loaded variants and run in memory.
    let mut finder = Products::find();
    if let Some(category_id) = filter.category_id {
        finder = finder.filter(Column::CategoryId.eq(category_id));
    }
    let models = finder.order_by_desc(Column::CreatedAt).all(&state.orm).await?;
    let products = load_products(&state.orm, models).await?;

    let matched = filter.apply(products);
    let total = matched.len() as i64;
    let (page, limit, _) = pagination.normalize();
    let items = pagination.slice(matched);

    let title = filter.title(
        category.map(category_from_entity).as_ref(),
        tag.map(tag_from_entity).as_ref(),
    );

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { title, items },
        Some(meta),
    ))
}

pub async fn list_products_by_category(
    state: &AppState,
    category_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    if Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    list_products(
        state,
        ProductQuery {
            page: pagination.page,
            per_page: pagination.per_page,
            category: Some(category_id),
            ..Default::default()
        },
    )
    .await
}

/// Looks a product up by id, falling back to slug, and counts the view.
pub async fn get_product(state: &AppState, id_or_slug: &str) -> AppResult<ApiResponse<Product>> {
    let by_id = match Uuid::parse_str(id_or_slug) {
        Ok(id) => Products::find_by_id(id).one(&state.orm).await?,
        Err(_) => None,
    };
    let model = match by_id {
        Some(p) => Some(p),
        None => {
            Products::find()
                .filter(Column::Slug.eq(id_or_slug))
                .one(&state.orm)
                .await?
        }
    };
    let model = match model {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    Products::update_many()
        .col_expr(Column::Views, Expr::col(Column::Views).add(1))
        .filter(Column::Id.eq(model.id))
        .exec(&state.orm)
        .await?;

    let mut product = load_product(&state.orm, model).await?;
    product.views += 1;
    tracing::debug!(product_id = %product.id, views = product.views, "product viewed");

    Ok(ApiResponse::success("Product", product, None))
}

pub async fn home(state: &AppState) -> AppResult<ApiResponse<HomePage>> {
    let models = Products::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;
    let products = load_products(&state.orm, models).await?;
    let categories = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Home",
        HomePage {
            sections: catalog::home_sections(&products),
            categories,
        },
        None,
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn list_tags(state: &AppState) -> AppResult<ApiResponse<TagList>> {
    let items = Tags::find()
        .order_by_asc(TagCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(tag_from_entity)
        .collect();
    Ok(ApiResponse::success("Tags", TagList { items }, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    if payload.variants.is_empty() {
        return Err(AppError::BadRequest(
            "a product needs at least one variant".into(),
        ));
    }
    for variant in &payload.variants {
        validate_variant(variant)?;
    }
    let slug = resolve_slug(payload.slug.as_deref(), &name)?;

    let txn = state.orm.begin().await?;

    if Categories::find_by_id(payload.category_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("category not found".into()));
    }
    ensure_slug_free(&txn, &slug).await?;
    ensure_tags_exist(&txn, &payload.tag_ids).await?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        slug: Set(slug),
        category_id: Set(payload.category_id),
        featured_image: Set(payload.featured_image),
        views: Set(0),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    for variant in payload.variants {
        insert_variant(&txn, product.id, variant).await?;
    }
    replace_tags(&txn, product.id, &payload.tag_ids).await?;

    let created = load_product(&txn, product).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": created.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        created,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let existing = Products::find_by_id(id).one(&txn).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(category_id) = payload.category_id {
        if Categories::find_by_id(category_id).one(&txn).await?.is_none() {
            return Err(AppError::BadRequest("category not found".into()));
        }
        active.category_id = Set(category_id);
    }
    if let Some(featured_image) = payload.featured_image {
        active.featured_image = Set(Some(featured_image));
    }
    if let Some(tag_ids) = payload.tag_ids.as_deref() {
        ensure_tags_exist(&txn, tag_ids).await?;
        replace_tags(&txn, id, tag_ids).await?;
    }

    let product = active.update(&txn).await?;
    let updated = load_product(&txn, product).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", updated, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn add_variant(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateVariantRequest,
) -> AppResult<ApiResponse<ProductVariant>> {
    ensure_admin(user)?;
    validate_variant(&payload)?;
    if Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let variant = insert_variant(&state.orm, product_id, payload).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "variant_create",
        "product_variants",
        serde_json::json!({ "product_id": product_id, "variant_id": variant.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Variant created",
        variant,
        Some(Meta::empty()),
    ))
}

pub async fn update_variant(
    state: &AppState,
    user: &AuthUser,
    variant_id: Uuid,
    payload: UpdateVariantRequest,
) -> AppResult<ApiResponse<ProductVariant>> {
    ensure_admin(user)?;
    let existing = ProductVariants::find_by_id(variant_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: VariantActive = existing.into();
    if let Some(color) = payload.color.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
        active.color = Set(color);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price cannot be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(images) = payload.images {
        active.images = Set(serde_json::json!(images));
    }
    let variant = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "variant_update",
        "product_variants",
        serde_json::json!({ "variant_id": variant.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        variant_from_entity(variant),
        Some(Meta::empty()),
    ))
}

pub async fn adjust_variant_stock(
    state: &AppState,
    user: &AuthUser,
    variant_id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<ProductVariant>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let variant = ProductVariants::find_by_id(variant_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let variant = match variant {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };

    let new_stock = variant
        .stock
        .checked_add(payload.delta)
        .filter(|s| *s >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let mut active: VariantActive = variant.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "inventory_adjust",
        "product_variants",
        serde_json::json!({ "variant_id": updated.id, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        variant_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<LowStockList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = ProductVariants::find()
        .filter(VariantCol::Stock.lte(threshold))
        .order_by_asc(VariantCol::Stock)
        .order_by_asc(VariantCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .find_also_related(Products)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(variant, product)| LowStockVariant {
            product_id: variant.product_id,
            product_name: product.map(|p| p.name).unwrap_or_default(),
            variant: variant_from_entity(variant),
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Low stock",
        LowStockList { items },
        Some(meta),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let slug = resolve_slug(payload.slug.as_deref(), &name)?;
    if Categories::find()
        .filter(CategoryCol::Slug.eq(slug.as_str()))
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!("category slug `{slug}` is taken")));
    }

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        slug: Set(slug),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn create_tag(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTagRequest,
) -> AppResult<ApiResponse<Tag>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let slug = resolve_slug(payload.slug.as_deref(), &name)?;
    if Tags::find()
        .filter(TagCol::Slug.eq(slug.as_str()))
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!("tag slug `{slug}` is taken")));
    }

    let tag = TagActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "tag_create",
        "tags",
        serde_json::json!({ "tag_id": tag.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Tag created",
        tag_from_entity(tag),
        Some(Meta::empty()),
    ))
}

/// Attaches category, tags and variants to each product row, keeping row order.
pub(crate) async fn load_products<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let product_ids: Vec<Uuid> = models.iter().map(|p| p.id).collect();
    let category_ids: Vec<Uuid> = models.iter().map(|p| p.category_id).collect();

    let mut variants: HashMap<Uuid, Vec<ProductVariant>> = HashMap::new();
    for variant in ProductVariants::find()
        .filter(VariantCol::ProductId.is_in(product_ids.clone()))
        .order_by_asc(VariantCol::CreatedAt)
        .order_by_asc(VariantCol::Id)
        .all(conn)
        .await?
    {
        variants
            .entry(variant.product_id)
            .or_default()
            .push(variant_from_entity(variant));
    }

    let categories: HashMap<Uuid, Category> = Categories::find()
        .filter(CategoryCol::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, category_from_entity(c)))
        .collect();

    let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for (link, tag) in ProductTags::find()
        .filter(ProductTagCol::ProductId.is_in(product_ids))
        .find_also_related(Tags)
        .all(conn)
        .await?
    {
        if let Some(tag) = tag {
            tags.entry(link.product_id)
                .or_default()
                .push(tag_from_entity(tag));
        }
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let mut product_tags = tags.remove(&model.id).unwrap_or_default();
            product_tags.sort_by(|a, b| a.name.cmp(&b.name));
            Product {
                category: categories.get(&model.category_id).cloned(),
                tags: product_tags,
                variants: variants.remove(&model.id).unwrap_or_default(),
                id: model.id,
                name: model.name,
                description: model.description,
                slug: model.slug,
                category_id: model.category_id,
                featured_image: model.featured_image,
                views: model.views,
                created_at: model.created_at.with_timezone(&Utc),
            }
        })
        .collect())
}

pub(crate) async fn load_product<C: ConnectionTrait>(
    conn: &C,
    model: ProductModel,
) -> AppResult<Product> {
    load_products(conn, vec![model])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

async fn insert_variant<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    payload: CreateVariantRequest,
) -> AppResult<ProductVariant> {
    let variant = VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        color: Set(payload.color.trim().to_string()),
        price: Set(payload.price),
        stock: Set(payload.stock),
        images: Set(serde_json::json!(payload.images)),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(variant_from_entity(variant))
}

async fn replace_tags<C: ConnectionTrait>(conn: &C, product_id: Uuid, tag_ids: &[Uuid]) -> AppResult<()> {
    ProductTags::delete_many()
        .filter(ProductTagCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;

    let mut seen = Vec::with_capacity(tag_ids.len());
    for tag_id in tag_ids {
        if seen.contains(tag_id) {
            continue;
        }
        seen.push(*tag_id);
        ProductTagActive {
            product_id: Set(product_id),
            tag_id: Set(*tag_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn ensure_tags_exist<C: ConnectionTrait>(conn: &C, tag_ids: &[Uuid]) -> AppResult<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let mut wanted = tag_ids.to_vec();
    wanted.sort();
    wanted.dedup();
    let found = Tags::find()
        .filter(TagCol::Id.is_in(wanted.clone()))
        .count(conn)
        .await?;
    if found as usize != wanted.len() {
        return Err(AppError::BadRequest("unknown tag id".into()));
    }
    Ok(())
}

async fn ensure_slug_free<C: ConnectionTrait>(conn: &C, slug: &str) -> AppResult<()> {
    let taken = Products::find()
        .filter(Column::Slug.eq(slug))
        .one(conn)
        .await?
        .is_some();
    if taken {
        return Err(AppError::Conflict(format!("product slug `{slug}` is taken")));
    }
    Ok(())
}

fn resolve_slug(requested: Option<&str>, name: &str) -> AppResult<String> {
    let slug = catalog::slugify(requested.filter(|s| !s.trim().is_empty()).unwrap_or(name));
    if slug.is_empty() {
        return Err(AppError::BadRequest("could not derive a slug".into()));
    }
    Ok(slug)
}

fn validate_variant(variant: &CreateVariantRequest) -> AppResult<()> {
    if variant.color.trim().is_empty() {
        return Err(AppError::BadRequest("variant color is required".into()));
    }
    if variant.price < 0 {
        return Err(AppError::BadRequest("price cannot be negative".into()));
    }
    if variant.stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }
    Ok(())
}

pub(crate) fn variant_from_entity(model: VariantModel) -> ProductVariant {
    ProductVariant {
        id: model.id,
        product_id: model.product_id,
        color: model.color,
        price: model.price,
        stock: model.stock,
        images: serde_json::from_value(model.images).unwrap_or_default(),
    }
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        slug: model.slug,
    }
}

fn tag_from_entity(model: TagModel) -> Tag {
    Tag {
        id: model.id,
        name: model.name,
        slug: model.slug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_images_decode_from_json() {
        let model = VariantModel {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            color: "Rojo".into(),
            price: 2999,
            stock: 50,
            images: serde_json::json!(["/a.png", "/b.png"]),
            created_at: Utc::now().into(),
        };
        assert_eq!(variant_from_entity(model).images, ["/a.png", "/b.png"]);
    }

    #[test]
    fn malformed_images_fall_back_to_empty() {
        let model = VariantModel {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            color: "Azul".into(),
            price: 2999,
            stock: 45,
            images: serde_json::json!({ "not": "a list" }),
            created_at: Utc::now().into(),
        };
        assert!(variant_from_entity(model).images.is_empty());
    }

    #[test]
    fn slug_comes_from_request_or_name() {
        assert_eq!(resolve_slug(Some("Custom Slug"), "Ignored").unwrap(), "custom-slug");
        assert_eq!(resolve_slug(Some("  "), "Silla Ergonómica").unwrap(), "silla-ergonomica");
        assert!(resolve_slug(None, "¡¡!!").is_err());
    }

    #[test]
    fn variant_validation() {
        let ok = CreateVariantRequest {
            color: "Negro".into(),
            price: 100,
            stock: 0,
            images: vec![],
        };
        assert!(validate_variant(&ok).is_ok());
        let negative = CreateVariantRequest { stock: -1, ..ok };
        assert!(validate_variant(&negative).is_err());
    }
}
