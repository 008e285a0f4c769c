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
    models::{LineItemData, LotData, LotStatus},
    ports::{Application, LineItemRecordOf, LotRecordOf, LotRepository as _, Repository},
};
use tracing::{Level, event};

/// Request body for creating a lot.
#[derive(serde::Deserialize, schemars::JsonSchema)]
pub(crate) struct CreateLotDto {
    /// Title and currency
    #[serde(flatten)]
    lot: LotData,
    /// Line items to create with the lot
    #[serde(default)]
    lines: Vec<LineItemData>,
}

/// Request body for changing a lot's status.
#[derive(serde::Deserialize, schemars::JsonSchema)]
pub(crate) struct StatusDto {
    /// The new status
    status: LotStatus,
}

/// A lot together with its line items.
#[derive(serde::Serialize, schemars::JsonSchema)]
pub(crate) struct LotDetail<Lot, Line> {
    #[serde(flatten)]
    lot: Lot,
    lines: Vec<Line>,
}

type LotDetailOf<T> = LotDetail<
    LotRecordOf<<T as Application>::Repository>,
    LineItemRecordOf<<T as Application>::Repository>,
>;

/// Create a lot, optionally with its line items.
///
/// The lot starts out as a `draft`.
///
/// # Returns
///
/// - `201 Created`: The lot and its line items
/// - `401 Unauthorized`: Missing management permission
/// - `500 Internal Server Error`: Database operation failed
pub(crate) async fn create_lot<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(body): Json<CreateLotDto>,
) -> Result<(StatusCode, Json<LotDetailOf<T>>), (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let db = app.database();
    let lot_id = app.generate_lot_id();
    let lot = db
        .create_lot(lot_id.clone(), body.lot, app.now())
        .await
        .map_err(|err| internal_error(err, "failed to create lot".to_string()))?;

    let items = body
        .lines
        .into_iter()
        .map(|data| (app.generate_line_item_id(), data))
        .collect::<Vec<_>>();
    let lines = db
        .add_line_items(lot_id.clone(), items)
        .await
        .map_err(|err| internal_error(err, format!("failed to add lines to lot {}", lot_id)))?;

    event!(Level::INFO, lot_id = %lot_id, lines = lines.len(), "created lot");
    Ok((StatusCode::CREATED, Json(LotDetail { lot, lines })))
}

/// Retrieve a lot and its line items.
///
/// # Returns
///
/// - `200 OK`: The lot and its line items, in creation order
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `500 Internal Server Error`: Database query failed
pub(crate) async fn get_lot<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
) -> Result<Json<LotDetailOf<T>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let db = app.database();
    let lot = db
        .get_lot(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get lot {}", lot_id)))?
        .ok_or((StatusCode::NOT_FOUND, format!("unknown lot {}", lot_id)))?;
    let lines = db
        .list_line_items(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to list lines of lot {}", lot_id)))?;

    Ok(Json(LotDetail { lot, lines }))
}

/// List a lot's line items.
///
/// # Returns
///
/// - `200 OK`: Line items in creation order
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `500 Internal Server Error`: Database query failed
pub(crate) async fn list_lines<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
) -> Result<Json<Vec<LineItemRecordOf<T::Repository>>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let db = app.database();
    db.get_lot(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get lot {}", lot_id)))?
        .ok_or((StatusCode::NOT_FOUND, format!("unknown lot {}", lot_id)))?;

    db.list_line_items(lot_id.clone())
        .await
        .map(Json)
        .map_err(|err| internal_error(err, format!("failed to list lines of lot {}", lot_id)))
}

/// Append line items to a lot.
///
/// Line items are immutable once created; this only ever adds.
///
/// # Returns
///
/// - `201 Created`: The new line items
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `500 Internal Server Error`: Database operation failed
pub(crate) async fn add_lines<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
    Json(lines): Json<Vec<LineItemData>>,
) -> Result<(StatusCode, Json<Vec<LineItemRecordOf<T::Repository>>>), (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let db = app.database();
    db.get_lot(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get lot {}", lot_id)))?
        .ok_or((StatusCode::NOT_FOUND, format!("unknown lot {}", lot_id)))?;

    let items = lines
        .into_iter()
        .map(|data| (app.generate_line_item_id(), data))
        .collect::<Vec<_>>();
    let created = db
        .add_line_items(lot_id.clone(), items)
        .await
        .map_err(|err| internal_error(err, format!("failed to add lines to lot {}", lot_id)))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Move a lot to a new status.
///
/// # Returns
///
/// - `200 OK`: The updated lot
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `500 Internal Server Error`: Database operation failed
pub(crate) async fn set_status<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
    Json(StatusDto { status }): Json<StatusDto>,
) -> Result<Json<LotRecordOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let lot = app
        .database()
        .set_lot_status(lot_id.clone(), status)
        .await
        .map_err(|err| internal_error(err, format!("failed to update lot {}", lot_id)))?
        .ok_or((StatusCode::NOT_FOUND, format!("unknown lot {}", lot_id)))?;

    event!(Level::INFO, lot_id = %lot_id, %status, "lot status changed");
    Ok(Json(lot))
}
