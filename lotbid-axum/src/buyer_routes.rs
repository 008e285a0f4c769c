//! REST API endpoints for the buyer directory.
//!
//! Besides plain CRUD, the directory ranks buyers against a lot's tokens so
//! that the most relevant ones can be invited first.

use crate::{ApiApplication, config::AxumConfig, internal_error, not_authorized};
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use lotbid_core::{
    models::{BuyerData, RankedBuyer, Set},
    ports::{BuyerRecordOf, BuyerRepository as _, Repository},
};
use std::sync::Arc;
use tracing::{Level, event};

/// Path parameter for buyer-specific endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Id<T> {
    /// The unique identifier of the buyer
    buyer_id: T,
}

/// Paging parameters. The limit is capped by the server's page limit.
#[derive(Default, serde::Deserialize, schemars::JsonSchema)]
#[serde(default)]
struct PageQuery {
    /// How many entries to skip
    offset: usize,
    /// The largest number of entries to return
    limit: Option<usize>,
}

/// Parameters for ranking buyers.
#[derive(serde::Deserialize, schemars::JsonSchema)]
struct RankQuery<DateTime> {
    /// Comma- or space-separated lot tokens, e.g. `dell,r740,server`
    tokens: String,
    /// The instant recency is measured from. Pass the same value when
    /// paging to keep the order fixed; defaults to now.
    as_of: Option<DateTime>,
    /// How many entries to skip
    #[serde(default)]
    offset: usize,
    /// The largest number of entries to return
    #[serde(default)]
    limit: Option<usize>,
}

/// Lower-cased, deduplicated tokens in first-seen order.
fn parse_tokens(raw: &str) -> Set<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Creates a router with buyer-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/",
            get(list_buyers::<T>).post(create_buyer::<T>),
            |route| route.security_requirement("jwt").tag("buyer"),
        )
        .api_route_with("/rank", get(rank_buyers::<T>), |route| {
            route.security_requirement("jwt").tag("buyer")
        })
        .api_route_with(
            "/{buyer_id}",
            get(get_buyer::<T>).put(update_buyer::<T>),
            |route| route.security_requirement("jwt").tag("buyer"),
        )
}

/// Browse the whole directory, ordered by buyer id.
///
/// # Returns
///
/// - `200 OK`: A page of buyers
/// - `401 Unauthorized`: Missing `can_view_buyers` permission
/// - `500 Internal Server Error`: Database query failed
async fn list_buyers<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<BuyerRecordOf<T::Repository>>>, (StatusCode, String)> {
    if !app.can_view_buyers(&auth).await {
        return Err(not_authorized());
    }

    let limit = page.limit.unwrap_or(config.page_limit).min(config.page_limit);
    app.database()
        .list_buyers(page.offset, limit)
        .await
        .map(Json)
        .map_err(|err| internal_error(err, "failed to list buyers".to_string()))
}

/// Rank buyers by relevance to a lot.
///
/// Buyers sharing no tag with the tokens are left out. The rest are ordered
/// by descending score, ties broken by buyer id, so pages are stable for a
/// fixed `as_of`.
///
/// # Returns
///
/// - `200 OK`: A page of ranked buyers with their score breakdowns
/// - `401 Unauthorized`: Missing `can_view_buyers` permission
/// - `500 Internal Server Error`: Database query failed
async fn rank_buyers<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Query(query): Query<RankQuery<<T::Repository as Repository>::DateTime>>,
) -> Result<
    Json<
        Vec<
            RankedBuyer<
                <T::Repository as Repository>::BuyerId,
                <T::Repository as Repository>::DateTime,
            >,
        >,
    >,
    (StatusCode, String),
> {
    if !app.can_view_buyers(&auth).await {
        return Err(not_authorized());
    }

    let tokens = parse_tokens(&query.tokens);
    let limit = query.limit.unwrap_or(config.page_limit).min(config.page_limit);
    app.database()
        .rank_buyers(
            &tokens,
            query.as_of.unwrap_or_else(|| app.now()),
            query.offset,
            limit,
        )
        .await
        .map(Json)
        .map_err(|err| internal_error(err, "failed to rank buyers".to_string()))
}

/// Retrieve a buyer's profile.
///
/// # Returns
///
/// - `200 OK`: The buyer
/// - `401 Unauthorized`: Missing `can_view_buyers` permission
/// - `404 Not Found`: Buyer does not exist
/// - `500 Internal Server Error`: Database query failed
async fn get_buyer<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { buyer_id }): Path<Id<<T::Repository as Repository>::BuyerId>>,
) -> Result<Json<BuyerRecordOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_view_buyers(&auth).await {
        return Err(not_authorized());
    }

    app.database()
        .get_buyer(buyer_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get buyer {}", buyer_id)))?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("unknown buyer {}", buyer_id)))
}

/// Add a buyer to the directory.
///
/// # Returns
///
/// - `201 Created`: The new buyer
/// - `401 Unauthorized`: Missing management permission
/// - `500 Internal Server Error`: Database operation failed
async fn create_buyer<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(data): Json<BuyerData<<T::Repository as Repository>::DateTime>>,
) -> Result<(StatusCode, Json<BuyerRecordOf<T::Repository>>), (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let buyer_id = app.generate_buyer_id();
    let buyer = app
        .database()
        .upsert_buyer(buyer_id.clone(), data)
        .await
        .map_err(|err| internal_error(err, "failed to create buyer".to_string()))?;

    event!(Level::INFO, buyer_id = %buyer_id, "created buyer");
    Ok((StatusCode::CREATED, Json(buyer)))
}

/// Create or replace a buyer's profile under a known id.
///
/// # Returns
///
/// - `200 OK`: The stored buyer
/// - `401 Unauthorized`: Missing management permission
/// - `500 Internal Server Error`: Database operation failed
async fn update_buyer<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { buyer_id }): Path<Id<<T::Repository as Repository>::BuyerId>>,
    Json(data): Json<BuyerData<<T::Repository as Repository>::DateTime>>,
) -> Result<Json<BuyerRecordOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    app.database()
        .upsert_buyer(buyer_id.clone(), data)
        .await
        .map(Json)
        .map_err(|err| internal_error(err, format!("failed to store buyer {}", buyer_id)))
}
