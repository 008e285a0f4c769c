use super::Id;
use crate::{ApiApplication, config::AxumConfig, internal_error, not_authorized};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use lotbid_core::{
    models::AllocationFilter,
    ports::{
        AllocationOf, AllocationRepository as _, AwardRecordOf, OfferRecordOf,
        OfferRepository as _, Optimizer as _, Repository, RoundRepository as _,
    },
};
use std::sync::Arc;
use tracing::{Level, event};

/// Query parameters shaping the allocation view.
#[derive(Default, serde::Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub(crate) struct AllocationQuery {
    /// Leave out lines with no units
    exclude_zero_quantity: bool,
    /// Leave out lines nobody has bid on
    exclude_unpriced: bool,
    /// How many ranked offers to report per line
    depth: Option<usize>,
}

/// List every offer on a lot.
///
/// # Returns
///
/// - `200 OK`: The lot's offers, oldest first
/// - `401 Unauthorized`: Missing management permission
/// - `500 Internal Server Error`: Database query failed
pub(crate) async fn list_offers<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
) -> Result<Json<Vec<OfferRecordOf<T::Repository>>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    app.database()
        .list_offers(lot_id.clone())
        .await
        .map(Json)
        .map_err(|err| internal_error(err, format!("failed to list offers on lot {}", lot_id)))
}

/// Compute the best-offer allocation of a lot's current scope.
///
/// Nothing is stored: the allocation is recomputed from the offers on every
/// call, and identical offers always produce an identical allocation.
///
/// # Returns
///
/// - `200 OK`: Per-line winners, per-buyer award packs, coverage and the
///   best take-all offer
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `500 Internal Server Error`: Database query or optimizer failed
pub(crate) async fn get_allocation<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Query(query): Query<AllocationQuery>,
) -> Result<Json<AllocationOf<T::Repository>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let input = app
        .database()
        .allocation_input(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to load offers on lot {}", lot_id)))?
        .ok_or((StatusCode::NOT_FOUND, format!("unknown lot {}", lot_id)))?
        .filtered(AllocationFilter {
            exclude_zero_quantity: query.exclude_zero_quantity,
            exclude_unpriced: query.exclude_unpriced,
        });

    let depth = query.depth.unwrap_or(config.allocation_depth);
    app.optimizer()
        .allocate(&input, depth)
        .map(Json)
        .map_err(|err| internal_error(err, format!("failed to allocate lot {}", lot_id)))
}

/// Accept the current allocation, awarding every priced line to its winner.
///
/// Lines awarded by an earlier acceptance keep their award, so accepting
/// twice is harmless. The lot moves to `awarded`, and its later `unsold`
/// rounds offer only what is left.
///
/// # Returns
///
/// - `200 OK`: The awards created by this call
/// - `401 Unauthorized`: Missing management permission
/// - `404 Not Found`: Lot does not exist
/// - `500 Internal Server Error`: Database operation or optimizer failed
pub(crate) async fn accept_allocation<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
) -> Result<Json<Vec<AwardRecordOf<T::Repository>>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    let db = app.database();
    let input = db
        .allocation_input(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to load offers on lot {}", lot_id)))?
        .ok_or((StatusCode::NOT_FOUND, format!("unknown lot {}", lot_id)))?;

    let winners = app
        .optimizer()
        .allocate(&input, 0)
        .map_err(|err| internal_error(err, format!("failed to allocate lot {}", lot_id)))?
        .winners()
        .map(|(line_item_id, offer)| {
            (
                line_item_id.clone(),
                offer.buyer_id.clone(),
                offer.unit_price,
                offer.quantity,
            )
        })
        .collect::<Vec<_>>();

    let round_id = db
        .get_live_round(lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get round of lot {}", lot_id)))?
        .map(|round| round.id);

    let awards = db
        .record_awards(lot_id.clone(), round_id, winners, app.now())
        .await
        .map_err(|err| internal_error(err, format!("failed to record awards on lot {}", lot_id)))?;

    event!(Level::INFO, lot_id = %lot_id, awarded = awards.len(), "accepted allocation");
    Ok(Json(awards))
}

/// List the awards recorded against a lot.
///
/// # Returns
///
/// - `200 OK`: Awards in line order
/// - `401 Unauthorized`: Missing management permission
/// - `500 Internal Server Error`: Database query failed
pub(crate) async fn list_awards<T: ApiApplication>(
    State(app): State<T>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(Id { lot_id }): Path<Id<<T::Repository as Repository>::LotId>>,
) -> Result<Json<Vec<AwardRecordOf<T::Repository>>>, (StatusCode, String)> {
    if !app.can_manage(&auth).await {
        return Err(not_authorized());
    }

    app.database()
        .list_awards(lot_id.clone())
        .await
        .map(Json)
        .map_err(|err| internal_error(err, format!("failed to list awards on lot {}", lot_id)))
}
