//! REST API endpoints for rounds.
//!
//! Rounds are opened through their lot (see the lot routes); these endpoints
//! adjust an existing round and manage who is invited to bid in it.

use crate::{ApiApplication, internal_error, not_authorized};
use aide::axum::{
    ApiRouter,
    routing::{get, put},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use lotbid_core::{
    models::RoundUpdate,
    ports::{InviteRecordOf, InviteRepository as _, Repository, RoundRecordOf, RoundRepository as _},
};
use tracing::{Level, event};

/// Path parameter for round-specific endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Id<T> {
    /// The unique identifier of the round
    round_id: T,
}

/// Request body for inviting buyers to a round.
#[derive(serde::Deserialize, schemars::JsonSchema)]
struct InviteDto<BuyerId> {
    /// The buyers to invite; already-invited and unknown buyers are skipped
    buyer_ids: Vec<BuyerId>,
}

/// Creates a router with round-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with(
            "/{round_id}",
            get(get_round::<T>).patch(update_round::<T>),
            |route| route.security_requirement("jwt").tag("round"),
        )
        .api_route_with("/{round_id}/lines", put(set_round_lines::<T>), |route| {
            route.security_requirement("jwt").tag("round")
        })
        .api_route_with(
            "/{round_id}/invites",
            get(list_invites::<T>).post(invite_buyers::<T>),
            |route| route.security_requirement("jwt").tag("round").tag("invite"),
        )
}

async fn require_round<T: ApiApplication>(
    app: &T,
    round_id: &<T::Repository as Repository>::RoundId,
) -> Result<RoundRecordOf<T::Repository>, (StatusCode, String)> {
    app.database()
        .get_round(round_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get round {}", round_id)))?
        .ok_or((StatusCode::NOT_FOUND, format!("unknown round {}", round_id)))
}

/// Retrieve a round.
///
/// # Returns
///
/// - `200 OK`: The round
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Round does not exist
/// - `500 Internal Server Error`: Database query failed
async fn get_round<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { round_id }): Path<Id<<T::Repository as Repository>::RoundId>>,
) -> Result<Json<RoundRecordOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }
    require_round(&app, &round_id).await.map(Json)
}

/// Change a round's scope or status.
///
/// Closing a round stamps its closing time. Making a round live while
/// another round of the same lot is live is refused.
///
/// # Returns
///
/// - `200 OK`: The updated round
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Round does not exist
/// - `409 Conflict`: The lot already has a live round
/// - `500 Internal Server Error`: Database operation failed
async fn update_round<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { round_id }): Path<Id<<T::Repository as Repository>::RoundId>>,
    Json(update): Json<RoundUpdate>,
) -> Result<Json<RoundRecordOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let round = app
        .database()
        .update_round(round_id.clone(), update, app.now())
        .await
        .map_err(|err| internal_error(err, format!("failed to update round {}", round_id)))?
        .map_err(|conflict| (StatusCode::CONFLICT, conflict.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, format!("unknown round {}", round_id)))?;

    event!(
        Level::INFO,
        round_id = %round_id,
        scope = %round.scope,
        status = %round.status,
        "round updated"
    );
    Ok(Json(round))
}

/// Replace the explicit line list of a `custom`-scope round.
///
/// Lines from other lots are ignored. An empty list makes a custom round
/// offer every line of its lot.
///
/// # Returns
///
/// - `200 OK`: The round
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Round does not exist
/// - `500 Internal Server Error`: Database operation failed
async fn set_round_lines<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { round_id }): Path<Id<<T::Repository as Repository>::RoundId>>,
    Json(line_item_ids): Json<Vec<<T::Repository as Repository>::LineItemId>>,
) -> Result<Json<RoundRecordOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let found = app
        .database()
        .set_round_lines(round_id.clone(), line_item_ids)
        .await
        .map_err(|err| internal_error(err, format!("failed to set lines of round {}", round_id)))?;
    if !found {
        return Err((StatusCode::NOT_FOUND, format!("unknown round {}", round_id)));
    }

    require_round(&app, &round_id).await.map(Json)
}

/// List the invitations issued for a round.
///
/// # Returns
///
/// - `200 OK`: Invitations, oldest first
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Round does not exist
/// - `500 Internal Server Error`: Database query failed
async fn list_invites<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { round_id }): Path<Id<<T::Repository as Repository>::RoundId>>,
) -> Result<Json<Vec<InviteRecordOf<T::Repository>>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }
    require_round(&app, &round_id).await?;

    app.database()
        .list_invites(round_id.clone())
        .await
        .map(Json)
        .map_err(|err| internal_error(err, format!("failed to list invites of round {}", round_id)))
}

/// Invite buyers to bid in a round.
///
/// Each buyer is invited at most once per round; repeating an invitation is
/// not an error, it simply creates nothing.
///
/// # Returns
///
/// - `201 Created`: The invitations created by this call
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Round does not exist
/// - `500 Internal Server Error`: Database operation failed
async fn invite_buyers<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { round_id }): Path<Id<<T::Repository as Repository>::RoundId>>,
    Json(InviteDto { buyer_ids }): Json<InviteDto<<T::Repository as Repository>::BuyerId>>,
) -> Result<(StatusCode, Json<Vec<InviteRecordOf<T::Repository>>>), (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }
    require_round(&app, &round_id).await?;

    let invites = app
        .database()
        .invite_buyers(round_id.clone(), buyer_ids, app.now())
        .await
        .map_err(|err| internal_error(err, format!("failed to invite buyers to round {}", round_id)))?;

    event!(Level::INFO, round_id = %round_id, invited = invites.len(), "invited buyers");
    Ok((StatusCode::CREATED, Json(invites)))
}
