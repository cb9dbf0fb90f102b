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
    dto::{
        auth::{
            AccountDetails, ConfirmRequest, LoginRequest, LoginResponse, RegisterRequest,
            RegisterResponse, UpdateAccountRequest,
        },
        basket::{AddToBasketRequest, BasketItemRequest, BasketItemView, BasketView},
        catalog::{ParameterValue, ProductInfoList, ProductInfoView, ProductView},
        contacts::{ContactList, CreateContactRequest},
        orders::{CheckoutRequest, OrderList, OrderSummary, OrderWithItems, PartnerOrderList},
        partner::{CatalogGood, CatalogUpload, CatalogUploadResult},
    },
    models::{Category, Contact, Order, OrderItem, OrderState, Product, Shop, User, UserType},
    response::{ApiResponse, Meta},
    routes::{basket, categories, health, orders, params, partner, products, shops, user},
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
        user::register,
        user::confirm,
        user::login,
        user::details,
        user::update_details,
        user::list_contacts,
        user::create_contact,
        user::delete_contact,
        partner::update_catalog,
        partner::partner_state,
        partner::partner_orders,
        products::list_products,
        categories::list_categories,
        categories::get_category,
        shops::list_shops,
        shops::get_shop,
        basket::get_basket,
        basket::add_items,
        basket::remove_item,
        orders::list_orders,
        orders::checkout,
        orders::get_order
    ),
    components(
        schemas(
            User,
            UserType,
            Contact,
            Shop,
            Category,
            Product,
            Order,
            OrderState,
            OrderItem,
            RegisterRequest,
            RegisterResponse,
            ConfirmRequest,
            LoginRequest,
            LoginResponse,
            UpdateAccountRequest,
            AccountDetails,
            CreateContactRequest,
            ContactList,
            CatalogUpload,
            CatalogGood,
            CatalogUploadResult,
            ProductView,
            ParameterValue,
            ProductInfoView,
            ProductInfoList,
            AddToBasketRequest,
            BasketItemRequest,
            BasketItemView,
            BasketView,
            CheckoutRequest,
            OrderSummary,
            OrderWithItems,
            OrderList,
            PartnerOrderList,
            params::Pagination,
            Meta,
            ApiResponse<User>,
            ApiResponse<BasketView>,
            ApiResponse<ProductInfoList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<PartnerOrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "User", description = "Registration, confirmation, login and account endpoints"),
        (name = "Partner", description = "Shop catalog upload and partner views"),
        (name = "Products", description = "Catalog listings"),
        (name = "Catalog", description = "Categories and shops"),
        (name = "Basket", description = "Basket endpoints"),
        (name = "Orders", description = "Order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
