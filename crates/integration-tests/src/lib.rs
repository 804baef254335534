//! Integration tests for Subify.
//!
//! Every test runs the storefront library against in-process mock services
//! bound to ephemeral localhost ports, so no external service is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p subify-integration-tests
//! ```
//!
//! # Mock Services
//!
//! - [`MockApi`] - the Subify REST API (users, auth, cart)
//! - [`MockCatalog`] - the product catalog
//! - [`MockGeocoder`] - reverse geocoding

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use subify_storefront::config::StorefrontConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Cookie every test configuration sends to the mock API.
pub const TEST_SESSION_COOKIE: &str = "connect.sid=s%3Atest-session";

// ============================================================================
// Server
// ============================================================================

/// An axum router served on `127.0.0.1` at an ephemeral port. The server
/// stops when this is dropped.
pub struct MockServer {
    base_url: Url,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Bind and start serving `router`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener
            .local_addr()
            .expect("Failed to read mock server address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        let base_url =
            Url::parse(&format!("http://{addr}/")).expect("Failed to build mock server URL");
        Self { base_url, task }
    }

    /// URL of `path` on this server.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid relative URL.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("Invalid mock server path")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Subify REST API
// ============================================================================

/// How the mock answers `GET /users` and `GET /users/details`.
#[derive(Debug, Clone)]
pub enum UserResponse {
    /// `{ isSuccess: true, data: { user } }`
    SignedIn(Value),
    /// `{ isSuccess: false, message }` with status 200
    Rejected(String),
    /// Status 500 with `{ message }`
    ServerError(String),
}

/// Everything the mock API saw, for assertions.
#[derive(Debug, Default)]
pub struct ApiRecord {
    pub cookies: Vec<String>,
    pub cart: Vec<Value>,
    pub uploads: Vec<Upload>,
    pub logouts: usize,
}

/// One display-picture upload as received.
#[derive(Debug, Clone)]
pub struct Upload {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Upload {
    /// Whether the multipart body carries a part named `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        let needle = format!("name=\"{field}\"");
        self.body
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }
}

/// In-process stand-in for the Subify REST API, mounted at `/api/v1`.
#[derive(Clone)]
pub struct MockApi {
    user: UserResponse,
    logout_ok: bool,
    record: Arc<Mutex<ApiRecord>>,
}

impl MockApi {
    #[must_use]
    pub fn new(user: UserResponse) -> Self {
        Self {
            user,
            logout_ok: true,
            record: Arc::default(),
        }
    }

    /// Make `GET /auth/logout` fail with status 500.
    #[must_use]
    pub const fn failing_logout(mut self) -> Self {
        self.logout_ok = false;
        self
    }

    /// Seed the server-side cart.
    #[must_use]
    pub fn with_cart(self, lines: Vec<Value>) -> Self {
        self.record().cart = lines;
        self
    }

    /// Lock the record of received requests.
    pub fn record(&self) -> std::sync::MutexGuard<'_, ApiRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/v1/users", get(current_user))
            .route("/api/v1/users/details", get(current_user))
            .route("/api/v1/users/display-picture", put(upload_picture))
            .route("/api/v1/auth/logout", get(logout))
            .route("/api/v1/cart/item", get(cart_items))
            .route("/api/v1/cart/add", post(cart_add))
            .route("/api/v1/cart/remove/{product_id}", delete(cart_remove))
            .with_state(self.clone())
    }

    fn note_cookie(&self, headers: &HeaderMap) {
        if let Some(cookie) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
            self.record().cookies.push(cookie.to_string());
        }
    }
}

async fn current_user(State(api): State<MockApi>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    api.note_cookie(&headers);
    match &api.user {
        UserResponse::SignedIn(user) => (
            StatusCode::OK,
            Json(json!({ "isSuccess": true, "data": { "user": user } })),
        ),
        UserResponse::Rejected(message) => (
            StatusCode::OK,
            Json(json!({ "isSuccess": false, "message": message })),
        ),
        UserResponse::ServerError(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "isSuccess": false, "message": message })),
        ),
    }
}

async fn upload_picture(
    State(api): State<MockApi>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("multipart/form-data") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "isSuccess": false, "message": "Expected a multipart upload" })),
        );
    }
    api.record().uploads.push(Upload {
        content_type,
        body: body.to_vec(),
    });
    (StatusCode::OK, Json(json!({ "isSuccess": true })))
}

async fn logout(State(api): State<MockApi>) -> (StatusCode, Json<Value>) {
    if !api.logout_ok {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "isSuccess": false, "message": "Session store unavailable" })),
        );
    }
    api.record().logouts += 1;
    (StatusCode::OK, Json(json!({ "isSuccess": true })))
}

async fn cart_items(State(api): State<MockApi>) -> Json<Value> {
    Json(json!({ "items": api.record().cart.clone() }))
}

async fn cart_add(State(api): State<MockApi>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let Some(Value::Object(item)) = body.get("item").cloned() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "isSuccess": false, "message": "item is required" })),
        );
    };
    let mut record = api.record();
    let mut line = item;
    line.insert(
        "_id".to_string(),
        Value::String(format!("line-{}", record.cart.len() + 1)),
    );
    record.cart.push(Value::Object(line));
    (StatusCode::OK, Json(json!({ "isSuccess": true })))
}

async fn cart_remove(State(api): State<MockApi>, Path(product_id): Path<i64>) -> Json<Value> {
    api.record()
        .cart
        .retain(|line| line.get("productId").and_then(Value::as_i64) != Some(product_id));
    Json(json!({ "isSuccess": true }))
}

// ============================================================================
// Product catalog
// ============================================================================

/// In-process stand-in for the product catalog.
#[derive(Clone)]
pub struct MockCatalog {
    products: Arc<Vec<Value>>,
    hits: Arc<AtomicUsize>,
}

impl MockCatalog {
    #[must_use]
    pub fn new(products: Vec<Value>) -> Self {
        Self {
            products: Arc::new(products),
            hits: Arc::default(),
        }
    }

    /// Requests served so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/products", get(list_products))
            .route("/products/{id}", get(get_product))
            .with_state(self.clone())
    }
}

async fn list_products(
    State(catalog): State<MockCatalog>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    catalog.hits.fetch_add(1, Ordering::SeqCst);
    let param = |name: &str, default: usize| {
        params
            .get(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    };
    let limit = param("limit", 30);
    let skip = param("skip", 0);
    let page: Vec<Value> = catalog.products.iter().skip(skip).take(limit).cloned().collect();
    Json(json!({
        "products": page,
        "total": catalog.products.len(),
        "skip": skip,
        "limit": limit,
    }))
}

async fn get_product(
    State(catalog): State<MockCatalog>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<Value>) {
    catalog.hits.fetch_add(1, Ordering::SeqCst);
    catalog
        .products
        .iter()
        .find(|p| p.get("id").and_then(Value::as_i64) == Some(id))
        .map_or_else(
            || {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "message": format!("Product with id '{id}' not found") })),
                )
            },
            |product| (StatusCode::OK, Json(product.clone())),
        )
}

/// A catalog product record.
#[must_use]
pub fn product(id: i64, title: &str, price: f64) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("{title} description"),
        "category": "smartphones",
        "price": price,
        "discountPercentage": 10.5,
        "rating": 4.2,
        "stock": 12,
        "brand": "Acme",
        "thumbnail": format!("https://cdn.dummyjson.com/products/{id}/thumbnail.png"),
        "images": [],
    })
}

/// A small catalog covering search and pricing cases.
#[must_use]
pub fn sample_products() -> Vec<Value> {
    vec![
        product(1, "iPhone 9", 549.0),
        product(2, "iPhone X", 899.0),
        product(3, "Samsung Universe 9", 1249.0),
        product(4, "OPPOF19", 280.0),
        product(5, "Huawei P30", 499.0),
    ]
}

// ============================================================================
// Reverse geocoder
// ============================================================================

/// In-process stand-in for the reverse geocoder.
#[derive(Clone, Copy)]
pub enum MockGeocoder {
    /// Answers with a `display_name` built from the query.
    Resolving,
    /// Answers every request with status 503.
    Unavailable,
}

impl MockGeocoder {
    #[must_use]
    pub fn router(self) -> Router {
        Router::new()
            .route("/reverse", get(reverse))
            .with_state(self)
    }
}

async fn reverse(
    State(geocoder): State<MockGeocoder>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    match geocoder {
        MockGeocoder::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Service unavailable" })),
        ),
        MockGeocoder::Resolving => {
            if params.get("format").map(String::as_str) != Some("json") {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": "format" })));
            }
            let lat = params.get("lat").cloned().unwrap_or_default();
            let lon = params.get("lon").cloned().unwrap_or_default();
            (
                StatusCode::OK,
                Json(json!({ "display_name": format!("MG Road, Bengaluru ({lat}, {lon})") })),
            )
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Running mock services plus a configuration pointing at them.
pub struct TestServices {
    pub api: MockApi,
    pub catalog: MockCatalog,
    pub api_server: MockServer,
    pub catalog_server: MockServer,
    pub geocoder_server: MockServer,
    pub storage_dir: tempfile::TempDir,
}

impl TestServices {
    /// Start all three mock services with fresh local storage.
    ///
    /// # Panics
    ///
    /// Panics if a server cannot start or a temp dir cannot be created.
    pub async fn start(api: MockApi, catalog: MockCatalog, geocoder: MockGeocoder) -> Self {
        let api_server = MockServer::start(api.router()).await;
        let catalog_server = MockServer::start(catalog.router()).await;
        let geocoder_server = MockServer::start(geocoder.router()).await;
        Self {
            api,
            catalog,
            api_server,
            catalog_server,
            geocoder_server,
            storage_dir: tempfile::tempdir().expect("Failed to create storage dir"),
        }
    }

    /// Path of the local storage file.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.storage_dir.path().join("storage.json")
    }

    /// Configuration for these services, sending [`TEST_SESSION_COOKIE`].
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let mut config = StorefrontConfig::with_base_urls(
            self.api_server.url("api/v1/"),
            self.catalog_server.url(""),
            self.geocoder_server.url(""),
            self.storage_path(),
        );
        config.session_cookie = Some(SecretString::from(TEST_SESSION_COOKIE.to_string()));
        config.http_timeout = Duration::from_secs(5);
        config
    }
}

/// A user record as the user service returns it.
#[must_use]
pub fn sample_user() -> Value {
    json!({
        "_id": "665f1c2e9b1d4a0012345678",
        "email": "asha@example.com",
        "name": "Asha Rao",
        "role": "customer",
        "gender": "female",
        "imageUrl": "https://res.cloudinary.com/subify/image/upload/asha.png",
        "createdAt": "2024-06-04T10:15:00.000Z",
    })
}
