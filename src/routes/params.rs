use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{
    catalog::{CatalogSort, ProductFilter},
    status::OrderStatus,
};

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }

    /// Slices an in-memory result set the same way `normalize` pages SQL.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let (_, per_page, offset) = self.normalize();
        items
            .into_iter()
            .skip(offset as usize)
            .take(per_page as usize)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

// Query structs repeat `page`/`per_page` instead of flattening `Pagination`:
// serde_urlencoded cannot parse numbers inside flattened structs.

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub category: Option<Uuid>,
    /// Tag slug.
    pub tag: Option<String>,
    pub sort: Option<CatalogSort>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            search: self.search.clone(),
            category_id: self.category,
            tag: self.tag.clone(),
            sort: self.sort.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_page_and_size() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let p = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(p.normalize(), (3, 10, 20));
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        let query = ProductQuery {
            page: Some(i64::MAX),
            per_page: Some(20),
            ..Default::default()
        };
        let (page, per_page, offset) = query.pagination().normalize();
        assert_eq!((page, per_page, offset), (i64::MAX, 20, i64::MAX));
        assert!(query.pagination().slice(vec![1, 2, 3]).is_empty());
    }

    #[test]
    fn slice_pages_in_memory() {
        let p = Pagination {
            page: Some(2),
            per_page: Some(2),
        };
        assert_eq!(p.slice((1..=5).collect()), vec![3, 4]);

        let past_end = Pagination {
            page: Some(9),
            per_page: Some(2),
        };
        assert!(past_end.slice((1..=5).collect::<Vec<i32>>()).is_empty());
    }
}
