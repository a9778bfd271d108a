use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{
            AdminOrderList, AdminOrderRow, CategoryCount, Dashboard, MonthlyCount, MonthlyRevenue,
            StatusCount, TopProduct, UpdateOrderStatusRequest,
        },
        auth::{FormPage, LoginRequest, RegisterRequest, SessionInfo},
        cart::{AddToCartRequest, CartLine, CartView, UpdateCartRequest},
        catalog::{
            ActiveCategories, CatalogPage, HomePage, LoadMoreResponse, PriceRange, ProductDetails,
            ProductReview, QrProductPage,
        },
        categories::{CategoryList, CategoryRequest, CategoryWithCount},
        orders::{CheckoutRequest, OrderDetails, OrderLine, OrderList, OrderWithItems, ReviewRequest},
        products::{AdminProductList, AdminProductView},
        profile::{ChangePasswordRequest, ProfileView, UpdateProfileRequest},
    },
    models::{Admin, CartItem, Category, Order, OrderItem, Product, RatedProduct, Review, User},
    response::{ApiResponse, Meta},
    routes::{
        admin, admin_categories, admin_products, auth, cart, catalog, health, orders, params,
        products as product_routes, profile,
    },
    session::SESSION_COOKIE,
};

struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        catalog::home,
        catalog::collections,
        catalog::catalog,
        catalog::more_collections,
        catalog::more_catalog,
        catalog::categories,
        auth::register_form,
        auth::register,
        auth::login_form,
        auth::login,
        auth::logout,
        auth::session_info,
        profile::show_profile,
        profile::update_profile,
        profile::change_password,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        orders::list_order,
        orders::checkout_page,
        orders::checkout,
        orders::get_order,
        product_routes::list_products,
        product_routes::get_product,
        product_routes::product_by_qr_code,
        product_routes::add_review,
        admin::login_form,
        admin::login,
        admin::logout,
        admin::dashboard,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin_products::list_products,
        admin_products::view_product,
        admin_products::create_product,
        admin_products::update_product,
        admin_products::delete_product,
        admin_categories::list_categories,
        admin_categories::get_category,
        admin_categories::create_category,
        admin_categories::update_category,
        admin_categories::delete_category
    ),
    components(
        schemas(
            User,
            Admin,
            Product,
            RatedProduct,
            Category,
            CartItem,
            Order,
            OrderItem,
            Review,
            RegisterRequest,
            LoginRequest,
            SessionInfo,
            FormPage,
            ProfileView,
            UpdateProfileRequest,
            ChangePasswordRequest,
            AddToCartRequest,
            UpdateCartRequest,
            CartLine,
            CartView,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            OrderLine,
            OrderDetails,
            ReviewRequest,
            PriceRange,
            CatalogPage,
            LoadMoreResponse,
            HomePage,
            ProductReview,
            ProductDetails,
            QrProductPage,
            ActiveCategories,
            CategoryRequest,
            CategoryWithCount,
            CategoryList,
            AdminProductView,
            AdminProductList,
            UpdateOrderStatusRequest,
            AdminOrderRow,
            AdminOrderList,
            StatusCount,
            CategoryCount,
            MonthlyCount,
            MonthlyRevenue,
            TopProduct,
            Dashboard,
            params::Pagination,
            params::OrderListQuery,
            params::ProductSearchQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<CatalogPage>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Dashboard>
        )
    ),
    security(
        ("session_cookie" = [])
    ),
    modifiers(&SessionCookieAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Catalog", description = "Storefront listings"),
        (name = "Products", description = "Product pages and reviews"),
        (name = "Auth", description = "Registration, login and session"),
        (name = "Profile", description = "Account settings"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Back office: login, dashboard and orders"),
        (name = "Admin Products", description = "Back office product management"),
        (name = "Admin Categories", description = "Back office category management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
