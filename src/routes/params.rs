use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` is descending; any other supplied value is ascending.
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Title,
}

impl ProductSortBy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "created_at" => Some(ProductSortBy::CreatedAt),
            "price" => Some(ProductSortBy::Price),
            "title" => Some(ProductSortBy::Title),
            _ => None,
        }
    }
}

/// The two product listings share one query builder and differ in their
/// default ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Newest first.
    Collections,
    /// Alphabetical.
    Catalog,
}

impl Listing {
    pub fn default_sort(self) -> (ProductSortBy, SortOrder) {
        match self {
            Listing::Collections => (ProductSortBy::CreatedAt, SortOrder::Desc),
            Listing::Catalog => (ProductSortBy::Title, SortOrder::Asc),
        }
    }
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Catalog filters as they appear in the query string. `categories` may repeat,
/// which is why this is parsed from the raw query instead of through serde.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogParams {
    pub search: Option<String>,
    pub categories: Vec<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl CatalogParams {
    pub fn from_query_str(query: &str) -> Self {
        let mut params = CatalogParams::default();
        let mut legacy_category = None;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "search" => params.search = non_empty(&value),
                "categories" | "categories[]" => {
                    if let Some(category) = non_empty(&value) {
                        params.categories.push(category);
                    }
                }
                "category" => legacy_category = non_empty(&value),
                "minPrice" => params.min_price = value.trim().parse().ok(),
                "maxPrice" => params.max_price = value.trim().parse().ok(),
                "sortBy" => params.sort_by = non_empty(&value),
                "sortOrder" => params.sort_order = non_empty(&value),
                "limit" => params.limit = value.trim().parse().ok(),
                "offset" => params.offset = value.trim().parse().ok(),
                _ => {}
            }
        }

        if params.categories.is_empty() {
            if let Some(category) = legacy_category.filter(|c| !c.eq_ignore_ascii_case("all")) {
                params.categories.push(category);
            }
        }

        params
    }

    pub fn sort(&self, listing: Listing) -> (ProductSortBy, SortOrder) {
        let (default_by, default_order) = listing.default_sort();
        let by = self
            .sort_by
            .as_deref()
            .and_then(ProductSortBy::parse)
            .unwrap_or(default_by);
        let order = self
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or(default_order);
        (by, order)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Same filters, pinned to the first page.
    pub fn first_page(&self) -> Self {
        CatalogParams {
            limit: Some(DEFAULT_PAGE_SIZE),
            offset: Some(0),
            ..self.clone()
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct ProductSearchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    /// `all` and blank mean no status filter.
    pub fn status_filter(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty() && *status != "all")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_categories_are_collected() {
        let params = CatalogParams::from_query_str(
            "categories=Silk&categories=Cotton%20Sarees&category=Kids&minPrice=1000&maxPrice=5000",
        );
        assert_eq!(params.categories, vec!["Silk", "Cotton Sarees"]);
        assert_eq!(params.min_price, Some(1000));
        assert_eq!(params.max_price, Some(5000));
    }

    #[test]
    fn legacy_category_is_used_alone() {
        let params = CatalogParams::from_query_str("category=Silk");
        assert_eq!(params.categories, vec!["Silk"]);

        let params = CatalogParams::from_query_str("category=all&search=%20");
        assert!(params.categories.is_empty());
        assert_eq!(params.search, None);
    }

    #[test]
    fn sort_falls_back_to_the_listing_default() {
        let params = CatalogParams::from_query_str("sortBy=rating&sortOrder=sideways");
        assert_eq!(
            params.sort(Listing::Collections),
            (ProductSortBy::CreatedAt, SortOrder::Asc)
        );

        let params = CatalogParams::from_query_str("");
        assert_eq!(params.sort(Listing::Collections), (ProductSortBy::CreatedAt, SortOrder::Desc));
        assert_eq!(params.sort(Listing::Catalog), (ProductSortBy::Title, SortOrder::Asc));

        let params = CatalogParams::from_query_str("sortBy=price&sortOrder=desc");
        assert_eq!(params.sort(Listing::Catalog), (ProductSortBy::Price, SortOrder::Desc));
    }

    #[test]
    fn limit_is_clamped_and_bad_numbers_ignored() {
        assert_eq!(CatalogParams::from_query_str("limit=500").limit(), 100);
        assert_eq!(CatalogParams::from_query_str("limit=0").limit(), 1);
        assert_eq!(CatalogParams::from_query_str("limit=abc").limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(CatalogParams::from_query_str("offset=-4").offset(), 0);
        assert_eq!(CatalogParams::from_query_str("minPrice=cheap").min_price, None);
    }

    #[test]
    fn order_status_all_means_unfiltered() {
        let query = OrderListQuery {
            status: Some("all".into()),
            ..Default::default()
        };
        assert_eq!(query.status_filter(), None);
        let query = OrderListQuery {
            status: Some("shipped".into()),
            ..Default::default()
        };
        assert_eq!(query.status_filter(), Some("shipped"));
    }
}
