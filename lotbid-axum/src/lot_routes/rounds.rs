use super::Id;
use crate::{ApiApplication, internal_error, not_authorized};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use lotbid_core::{
    models::RoundScope,
    ports::{LotRepository as _, Repository, RoundRecordOf, RoundRepository as _},
};

/// Request body for starting the next round.
#[derive(Default, serde::Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub(crate) struct NextRoundDto {
    /// Overrides the default scope (`all` for round 1, `unsold` after)
    scope: Option<RoundScope>,
}

/// Fail with 404 unless the lot exists.
async fn require_lot<T: ApiApplication>(
    app: &T,
    lot_id: &<T::Repository as Repository>::LotId,
) -> Result<(), (StatusCode, String)> {
    app.database()
        .get_lot(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get lot {}", lot_id)))?
        .map(|_| ())
        .ok_or((StatusCode::NOT_FOUND, format!("unknown lot {}", lot_id)))
}

/// List every round of a lot, by ascending round number.
///
/// # Returns
///
/// - `200 OK`: The lot's rounds
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `500 Internal Server Error`: Database query failed
pub(crate) async fn list_rounds<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
) -> Result<Json<Vec<RoundRecordOf<T::Repository>>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }
    require_lot(&app, &lot_id).await?;

    app.database()
        .list_rounds(lot_id.clone())
        .await
        .map(Json)
        .map_err(|err| internal_error(err, format!("failed to list rounds of lot {}", lot_id)))
}

/// Retrieve the lot's live round without creating one.
///
/// # Returns
///
/// - `200 OK`: The live round
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist or has no live round
/// - `500 Internal Server Error`: Database query failed
pub(crate) async fn get_current_round<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
) -> Result<Json<RoundRecordOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }
    require_lot(&app, &lot_id).await?;

    app.database()
        .get_live_round(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get round of lot {}", lot_id)))?
        .map(Json)
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("lot {} has no live round", lot_id),
        ))
}

/// Return the lot's live round, opening one if there is none.
///
/// Safe to call concurrently: every caller gets the same round. A new round
/// is numbered one past the highest so far and scoped to `all` when it is the
/// first, `unsold` otherwise.
///
/// # Returns
///
/// - `200 OK`: The live round
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `409 Conflict`: A competing writer could not be resolved
/// - `500 Internal Server Error`: Database operation failed
pub(crate) async fn ensure_current_round<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
) -> Result<Json<RoundRecordOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }
    require_lot(&app, &lot_id).await?;

    app.database()
        .ensure_current_round(lot_id.clone(), app.now())
        .await
        .map_err(|err| internal_error(err, format!("failed to open round of lot {}", lot_id)))?
        .map(Json)
        .map_err(|conflict| (StatusCode::CONFLICT, conflict.to_string()))
}

/// Close the live round, if any, and open the next one.
///
/// # Returns
///
/// - `201 Created`: The new round
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `409 Conflict`: Another writer advanced the lot concurrently
/// - `500 Internal Server Error`: Database operation failed
pub(crate) async fn next_round<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
    Json(NextRoundDto { scope }): Json<NextRoundDto>,
) -> Result<(StatusCode, Json<RoundRecordOf<T::Repository>>), (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }
    require_lot(&app, &lot_id).await?;

    app.database()
        .open_next_round(lot_id.clone(), scope, app.now())
        .await
        .map_err(|err| internal_error(err, format!("failed to advance lot {}", lot_id)))?
        .map(|round| (StatusCode::CREATED, Json(round)))
        .map_err(|conflict| (StatusCode::CONFLICT, conflict.to_string()))
}
