#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod buyer_routes;
mod invite_routes;
mod lot_routes;
mod round_routes;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use axum::{
    Extension, Json,
    http::{StatusCode, header},
};
use headers::{Authorization, authorization::Bearer};
use lotbid_core::ports::{Application, Optimizer, Repository};
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt::Display, sync::Arc};
use tower_http::cors;
use tracing::{Level, event};

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
}

/// Simple health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Log an infrastructure failure and turn it into an opaque 500.
pub(crate) fn internal_error(err: impl Display, message: String) -> (StatusCode, String) {
    event!(Level::ERROR, err = err.to_string(), message);
    (StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub(crate) fn not_authorized() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "not authorized".to_string())
}

fn routes<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route("/health", get(health_check))
        .nest("/lot", lot_routes::router())
        .nest("/round", round_routes::router())
        .nest("/invite", invite_routes::router())
        .nest("/buyer", buyer_routes::router())
}

/// The OpenAPI document for the API, as served at `/docs/api.json`
pub fn openapi<T: ApiApplication>() -> OpenApi {
    let mut api = OpenApi::default();
    let _ = routes::<T>().finish_api_with(&mut api, api_docs);
    api
}

/// Construct a full API router with the given state and config
pub fn router<T: ApiApplication>(state: T, config: AxumConfig) -> axum::Router {
    // Browser clients may call the API directly; credentials travel only in
    // the Authorization header.
    let policy = cors::CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let mut api = OpenApi::default();
    routes::<T>()
        .nest_api_service("/docs", docs_routes())
        .finish_api_with(&mut api, api_docs)
        .layer(Extension(Arc::new(api))) // one shared OpenAPI document
        .layer(Extension(Arc::new(config)))
        .layer(policy)
        .with_state(state)
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<T: ApiApplication>(
    config: AxumConfig,
    app: T,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    tracing::info!("Listening for requests on {}", listener.local_addr()?);

    let service = router(app, config);
    axum::serve(listener, service).await
}

/// Axum imposes all sorts of constraints on what can pass for state. This
/// trait, coupled with a blanket implementation, specifies them once. Any
/// handler generic over `T: ApiApplication` can extract, serialize and
/// document every identifier and record the backend produces.
pub trait ApiApplication:
    Clone
    + Send
    + Sync
    + 'static
    + Application<
        Context = Authorization<Bearer>,
        Repository: Clone
                        + Send
                        + Sync
                        + 'static
                        + Repository<
            DateTime: Copy + Display + Serialize + DeserializeOwned + JsonSchema,
            LotId: Copy + Serialize + DeserializeOwned + JsonSchema,
            LineItemId: Copy + Serialize + DeserializeOwned + JsonSchema,
            RoundId: Copy + Serialize + DeserializeOwned + JsonSchema,
            BuyerId: Copy + Serialize + DeserializeOwned + JsonSchema,
            OfferId: Copy + Serialize + DeserializeOwned + JsonSchema,
        >,
        Optimizer: Optimizer<
            <Self::Repository as Repository>::BuyerId,
            <Self::Repository as Repository>::LineItemId,
            <Self::Repository as Repository>::DateTime,
        >,
    >
{
}

// this is the blanket implementation
impl<T: Clone + Send + Sync + 'static> ApiApplication for T where
    T: Application<
            Context = Authorization<Bearer>,
            Repository: Clone
                            + Send
                            + Sync
                            + 'static
                            + Repository<
                DateTime: Copy + Display + Serialize + DeserializeOwned + JsonSchema,
                LotId: Copy + Serialize + DeserializeOwned + JsonSchema,
                LineItemId: Copy + Serialize + DeserializeOwned + JsonSchema,
                RoundId: Copy + Serialize + DeserializeOwned + JsonSchema,
                BuyerId: Copy + Serialize + DeserializeOwned + JsonSchema,
                OfferId: Copy + Serialize + DeserializeOwned + JsonSchema,
            >,
            Optimizer: Optimizer<
                <T::Repository as Repository>::BuyerId,
                <T::Repository as Repository>::LineItemId,
                <T::Repository as Repository>::DateTime,
            >,
        >
{
}
