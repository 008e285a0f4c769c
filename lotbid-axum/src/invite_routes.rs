//! REST API endpoints used by invited buyers.
//!
//! The invite token in the path is the only credential these routes accept:
//! whoever holds it may view the round and place one offer on the lot.

use crate::{ApiApplication, internal_error};
use aide::axum::{
    ApiRouter,
    routing::{get, post},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lotbid_core::{
    models::{InviteStatus, Map, RawOffer, RoundStatus, normalize},
    ports::{
        InviteRecordOf, InviteRepository as _, LineItemRecordOf, LotRecordOf,
        LotRepository as _, OfferRecordOf, OfferRepository as _, Repository, RoundRecordOf,
        RoundRepository as _,
    },
};
use tracing::{Level, event};

/// Path parameter for invite endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Token {
    /// The invite token
    token: String,
}

/// What an invited buyer sees.
#[derive(serde::Serialize, schemars::JsonSchema)]
struct InviteView<Invite, Lot, Round, Line> {
    invite: Invite,
    lot: Lot,
    round: Round,
    /// The lines open for bidding, empty once the round has closed
    lines: Vec<Line>,
}

type InviteViewOf<R> =
    InviteView<InviteRecordOf<R>, LotRecordOf<R>, RoundRecordOf<R>, LineItemRecordOf<R>>;

/// Creates a router with invite endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with("/{token}", get(view_invite::<T>), |route| {
            route.tag("invite")
        })
        .api_route_with("/{token}/offer", post(submit_offer::<T>), |route| {
            route.tag("invite")
        })
        .api_route_with("/{token}/decline", post(decline_invite::<T>), |route| {
            route.tag("invite")
        })
}

async fn require_invite<T: ApiApplication>(
    app: &T,
    token: &str,
) -> Result<InviteRecordOf<T::Repository>, (StatusCode, String)> {
    app.database()
        .get_invite(token)
        .await
        .map_err(|err| internal_error(err, "failed to get invite".to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "unknown invite".to_string()))
}

/// Open an invitation.
///
/// The first view moves a pending invite to `viewed`.
///
/// # Returns
///
/// - `200 OK`: The invite, its lot and round, and the lines open for bidding
/// - `404 Not Found`: No invite has this token
/// - `500 Internal Server Error`: Database operation failed
async fn view_invite<T: ApiApplication>(
    State(app): State<T>,
    Path(Token { token }): Path<Token>,
) -> Result<Json<InviteViewOf<T::Repository>>, (StatusCode, String)> {
    let db = app.database();
    let mut invite = require_invite(&app, &token).await?;

    if invite.status == InviteStatus::Pending {
        db.set_invite_status(&token, InviteStatus::Viewed)
            .await
            .map_err(|err| internal_error(err, "failed to update invite".to_string()))?;
        invite.status = InviteStatus::Viewed;
    }

    let round = db
        .get_round(invite.round_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get round {}", invite.round_id)))?
        .ok_or_else(|| internal_error("dangling invite", format!("missing round {}", invite.round_id)))?;
    let lot = db
        .get_lot(invite.lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get lot {}", invite.lot_id)))?
        .ok_or_else(|| internal_error("dangling invite", format!("missing lot {}", invite.lot_id)))?;

    let lines = if round.status == RoundStatus::Live {
        db.current_scope(invite.lot_id.clone())
            .await
            .map_err(|err| internal_error(err, format!("failed to get scope of lot {}", invite.lot_id)))?
    } else {
        Vec::new()
    };

    Ok(Json(InviteView {
        invite,
        lot,
        round,
        lines,
    }))
}

/// Submit the invited buyer's offer on the lot.
///
/// The offer may price lines directly, price them by component, or name a
/// single total for the whole lot. It is normalized against the lines
/// currently open for bidding before it is stored. A buyer places at most one
/// offer per lot.
///
/// # Returns
///
/// - `201 Created`: The stored, normalized offer
/// - `404 Not Found`: No invite has this token
/// - `409 Conflict`: The round is not live, the invite was declined, or the
///   buyer already made an offer on this lot
/// - `422 Unprocessable Entity`: The offer is malformed or prices a line
///   that is not open for bidding
/// - `500 Internal Server Error`: Database operation failed
async fn submit_offer<T: ApiApplication>(
    State(app): State<T>,
    Path(Token { token }): Path<Token>,
    Json(raw): Json<RawOffer<<T::Repository as Repository>::LineItemId>>,
) -> Result<(StatusCode, Json<OfferRecordOf<T::Repository>>), (StatusCode, String)> {
    let db = app.database();
    let invite = require_invite(&app, &token).await?;

    if invite.status == InviteStatus::Declined {
        return Err((StatusCode::CONFLICT, "invite was declined".to_string()));
    }

    let round = db
        .get_round(invite.round_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get round {}", invite.round_id)))?
        .ok_or_else(|| internal_error("dangling invite", format!("missing round {}", invite.round_id)))?;
    if round.status != RoundStatus::Live {
        return Err((
            StatusCode::CONFLICT,
            format!("round {} is not accepting offers", round.round_number),
        ));
    }

    let lot = db
        .get_lot(invite.lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get lot {}", invite.lot_id)))?
        .ok_or_else(|| internal_error("dangling invite", format!("missing lot {}", invite.lot_id)))?;
    let quantities = db
        .current_scope(invite.lot_id.clone())
        .await
        .map_err(|err| internal_error(err, format!("failed to get scope of lot {}", invite.lot_id)))?
        .into_iter()
        .map(|line| (line.id, line.data.quantity))
        .collect::<Map<_, _>>();

    let offer = normalize(raw, &quantities, &lot.data.currency)
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?;

    let record = db
        .submit_offer(
            invite.lot_id.clone(),
            invite.round_id.clone(),
            invite.buyer_id.clone(),
            offer,
            app.now(),
        )
        .await
        .map_err(|err| internal_error(err, format!("failed to store offer on lot {}", invite.lot_id)))?
        .map_err(|conflict| (StatusCode::CONFLICT, conflict.to_string()))?;

    event!(
        Level::INFO,
        lot_id = %record.lot_id,
        buyer_id = %record.buyer_id,
        offer_total = record.offer.offer_total,
        "offer submitted"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// Decline an invitation.
///
/// # Returns
///
/// - `200 OK`: The declined invite
/// - `404 Not Found`: No invite has this token
/// - `409 Conflict`: An offer was already submitted through this invite
/// - `500 Internal Server Error`: Database operation failed
async fn decline_invite<T: ApiApplication>(
    State(app): State<T>,
    Path(Token { token }): Path<Token>,
) -> Result<Json<InviteRecordOf<T::Repository>>, (StatusCode, String)> {
    let mut invite = require_invite(&app, &token).await?;

    if invite.status == InviteStatus::Submitted {
        return Err((StatusCode::CONFLICT, "an offer was already submitted".to_string()));
    }

    app.database()
        .set_invite_status(&token, InviteStatus::Declined)
        .await
        .map_err(|err| internal_error(err, "failed to update invite".to_string()))?;
    invite.status = InviteStatus::Declined;

    Ok(Json(invite))
}
