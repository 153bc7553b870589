use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Product, Tag};

pub const FEATURED_TAG: &str = "tendencia";
pub const NEW_TAG: &str = "nuevo";
pub const POPULAR_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    Popular,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub tag: Option<String>,
    pub sort: CatalogSort,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            let hit = product.name.to_lowercase().contains(&term)
                || product.description.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }

        if let Some(category_id) = self.category_id {
            if product.category_id != category_id {
                return false;
            }
        }

        if let Some(tag) = self.tag_slug() {
            if !product.tags.iter().any(|t| t.slug == tag) {
                return false;
            }
        }

        true
    }

    /// Filters then sorts. The sort is stable so equal keys keep load order.
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut filtered: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        sort_products(&mut filtered, self.sort);
        filtered
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn tag_slug(&self) -> Option<&str> {
        self.tag.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Heading for a listing page; the most specific active filter wins.
    pub fn title(&self, category: Option<&Category>, tag: Option<&Tag>) -> String {
        if let (Some(_), Some(tag)) = (self.tag_slug(), tag) {
            return format!("Products tagged \"{}\"", tag.name);
        }
        if let (Some(_), Some(category)) = (self.category_id, category) {
            return category.name.clone();
        }
        if let Some(term) = self.search_term() {
            return format!("Results for \"{term}\"");
        }
        "All products".to_string()
    }
}

pub fn sort_products(products: &mut [Product], sort: CatalogSort) {
    match sort {
        CatalogSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        CatalogSort::PriceAsc => {
            products.sort_by_key(|p| p.min_price().unwrap_or(i64::MAX));
        }
        CatalogSort::PriceDesc => {
            products.sort_by(|a, b| {
                let a = a.max_price().unwrap_or(i64::MIN);
                let b = b.max_price().unwrap_or(i64::MIN);
                b.cmp(&a)
            });
        }
        CatalogSort::NameAsc => products.sort_by(|a, b| compare_names(&a.name, &b.name)),
        CatalogSort::NameDesc => products.sort_by(|a, b| compare_names(&b.name, &a.name)),
        CatalogSort::Popular => products.sort_by(|a, b| b.views.cmp(&a.views)),
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct HomeSections {
    pub featured: Vec<Product>,
    pub newest: Vec<Product>,
    pub popular: Vec<Product>,
}

pub fn home_sections(products: &[Product]) -> HomeSections {
    let tagged = |slug: &str| -> Vec<Product> {
        products
            .iter()
            .filter(|p| p.tags.iter().any(|t| t.slug == slug))
            .cloned()
            .collect()
    };

    let mut popular = products.to_vec();
    sort_products(&mut popular, CatalogSort::Popular);
    popular.truncate(POPULAR_LIMIT);

    HomeSections {
        featured: tagged(FEATURED_TAG),
        newest: tagged(NEW_TAG),
        popular,
    }
}

/// Lowercase ASCII slug; Spanish accents are folded, anything else becomes `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in fold(input).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn fold(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::ProductVariant;

    fn tag(slug: &str) -> Tag {
        Tag {
            id: Uuid::new_v4(),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
        }
    }

    fn product(name: &str, prices: &[i64], views: i64, tags: &[&str], age_days: i64) -> Product {
        let id = Uuid::new_v4();
        Product {
            id,
            name: name.to_string(),
            description: format!("{name} description"),
            slug: slugify(name),
            category_id: Uuid::nil(),
            category: None,
            tags: tags.iter().map(|t| tag(t)).collect(),
            variants: prices
                .iter()
                .map(|price| ProductVariant {
                    id: Uuid::new_v4(),
                    product_id: id,
                    color: "Black".into(),
                    price: *price,
                    stock: 5,
                    images: vec![],
                })
                .collect(),
            featured_image: None,
            views,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("Smartphone XYZ", &[59999, 64999], 120, &["nuevo", "popular"], 3),
            product("Camiseta Deportiva", &[2999], 85, &["oferta"], 1),
            product("Silla Ergonómica", &[19999], 45, &["tendencia"], 10),
            product("Balón de Fútbol", &[4999], 60, &["popular"], 5),
        ]
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() {
        let filter = ProductFilter {
            search: Some("SILLA".into()),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(catalog())), ["Silla Ergonómica"]);

        let filter = ProductFilter {
            search: Some("balón de fútbol desc".into()),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(catalog())), ["Balón de Fútbol"]);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let filter = ProductFilter {
            search: Some("   ".into()),
            tag: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter.apply(catalog()).len(), 4);
    }

    #[test]
    fn category_and_tag_narrow_results() {
        let mut products = catalog();
        let sports = Uuid::new_v4();
        products[3].category_id = sports;

        let filter = ProductFilter {
            category_id: Some(sports),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(products.clone())), ["Balón de Fútbol"]);

        let filter = ProductFilter {
            tag: Some("popular".into()),
            sort: CatalogSort::Popular,
            ..Default::default()
        };
        assert_eq!(
            names(&filter.apply(products)),
            ["Smartphone XYZ", "Balón de Fútbol"]
        );
    }

    #[test]
    fn price_sorts_use_min_and_max_variant_price() {
        let mut products = catalog();
        products.push(product("Sin variantes", &[], 0, &[], 0));

        sort_products(&mut products, CatalogSort::PriceAsc);
        assert_eq!(
            names(&products),
            [
                "Camiseta Deportiva",
                "Balón de Fútbol",
                "Silla Ergonómica",
                "Smartphone XYZ",
                "Sin variantes"
            ]
        );

        sort_products(&mut products, CatalogSort::PriceDesc);
        assert_eq!(names(&products)[0], "Smartphone XYZ");
        assert_eq!(names(&products)[4], "Sin variantes");
    }

    #[test]
    fn name_sort_ignores_accents_and_case() {
        let mut products = catalog();
        sort_products(&mut products, CatalogSort::NameAsc);
        assert_eq!(
            names(&products),
            [
                "Balón de Fútbol",
                "Camiseta Deportiva",
                "Silla Ergonómica",
                "Smartphone XYZ"
            ]
        );
        sort_products(&mut products, CatalogSort::NameDesc);
        assert_eq!(names(&products)[0], "Smartphone XYZ");
    }

    #[test]
    fn newest_is_the_default_sort() {
        let filtered = ProductFilter::default().apply(catalog());
        assert_eq!(names(&filtered)[0], "Camiseta Deportiva");
        assert_eq!(names(&filtered)[3], "Silla Ergonómica");
    }

    #[test]
    fn home_sections_pick_tagged_and_most_viewed() {
        let mut products = catalog();
        products.push(product("Auriculares", &[7999], 10, &["nuevo"], 2));
        let home = home_sections(&products);

        assert_eq!(names(&home.featured), ["Silla Ergonómica"]);
        assert_eq!(names(&home.newest), ["Smartphone XYZ", "Auriculares"]);
        assert_eq!(
            names(&home.popular),
            [
                "Smartphone XYZ",
                "Camiseta Deportiva",
                "Balón de Fútbol",
                "Silla Ergonómica"
            ]
        );
    }

    #[test]
    fn title_prefers_most_specific_filter() {
        let category = Category {
            id: Uuid::new_v4(),
            name: "Ropa".into(),
            description: None,
            slug: "ropa".into(),
        };
        let oferta = tag("oferta");

        let mut filter = ProductFilter::default();
        assert_eq!(filter.title(None, None), "All products");

        filter.search = Some("camiseta".into());
        assert_eq!(filter.title(None, None), "Results for \"camiseta\"");

        filter.category_id = Some(category.id);
        assert_eq!(filter.title(Some(&category), None), "Ropa");

        filter.tag = Some("oferta".into());
        assert_eq!(
            filter.title(Some(&category), Some(&oferta)),
            "Products tagged \"OFERTA\""
        );
    }

    #[test]
    fn slugify_folds_accents_and_collapses_separators() {
        assert_eq!(slugify("Electrónicos"), "electronicos");
        assert_eq!(slugify("  Balón de Fútbol!! "), "balon-de-futbol");
        assert_eq!(slugify("Smartphone XYZ / 2024"), "smartphone-xyz-2024");
        assert_eq!(slugify("Año Nuevo"), "ano-nuevo");
    }
}
