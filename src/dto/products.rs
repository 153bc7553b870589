use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::catalog::HomeSections,
    models::{Category, Product, ProductVariant, Tag},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    pub color: String,
    pub price: i64,
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub slug: Option<String>,
    pub category_id: Uuid,
    pub featured_image: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    pub variants: Vec<CreateVariantRequest>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub featured_image: Option<String>,
    /// Replaces the tag set when present.
    pub tag_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateVariantRequest {
    pub color: Option<String>,
    pub price: Option<i64>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub title: String,
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct TagList {
    #[schema(value_type = Vec<Tag>)]
    pub items: Vec<Tag>,
}

#[derive(Serialize, ToSchema)]
pub struct HomePage {
    #[serde(flatten)]
    pub sections: HomeSections,
    pub categories: Vec<Category>,
}

#[derive(Serialize, ToSchema)]
pub struct LowStockVariant {
    pub product_id: Uuid,
    pub product_name: String,
    pub variant: ProductVariant,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct LowStockList {
    #[schema(value_type = Vec<LowStockVariant>)]
    pub items: Vec<LowStockVariant>,
}
