//! Identifier and timestamp types, and the row shapes queries decode into.
//!
//! Rows mirror the schema one to one. Labelled enums (statuses, scopes) are
//! stored as their text labels and parsed on the way out, so a corrupt label
//! surfaces as [`sqlx::Error::Decode`].

use lotbid_core::models::{
    AwardRecord, BuyerData, BuyerRecord, InviteRecord, LineBid, LineItemData, LineItemRecord,
    LotData, LotRecord, NormalizedOffer, OfferLine, OfferRecord, ParseError, RoundRecord, Set,
    TakeAllBid,
};
use std::str::FromStr;

mod datetime;
pub use datetime::DateTime;

mod ids;
pub use ids::{BuyerId, LineItemId, LotId, OfferId, RoundId};

/// Parse a stored label, reporting failure as a decode error.
pub(crate) fn label<T: FromStr<Err = ParseError>>(value: &str) -> Result<T, sqlx::Error> {
    value.parse().map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

#[derive(sqlx::FromRow)]
pub(crate) struct LotRow {
    pub id: LotId,
    pub title: String,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime,
}

impl TryFrom<LotRow> for LotRecord<LotId, DateTime> {
    type Error = sqlx::Error;

    fn try_from(row: LotRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            data: LotData {
                title: row.title,
                currency: row.currency,
            },
            status: label(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct LineItemRow {
    pub id: LineItemId,
    pub lot_id: LotId,
    pub quantity: u32,
    pub model: Option<String>,
    pub description: Option<String>,
}

impl From<LineItemRow> for LineItemRecord<LineItemId, LotId> {
    fn from(row: LineItemRow) -> Self {
        Self {
            id: row.id,
            lot_id: row.lot_id,
            data: LineItemData {
                quantity: row.quantity,
                model: row.model,
                description: row.description,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RoundRow {
    pub id: RoundId,
    pub lot_id: LotId,
    pub round_number: u32,
    pub scope: String,
    pub status: String,
    pub created_at: DateTime,
    pub closed_at: Option<DateTime>,
}

impl TryFrom<RoundRow> for RoundRecord<RoundId, LotId, DateTime> {
    type Error = sqlx::Error;

    fn try_from(row: RoundRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            lot_id: row.lot_id,
            round_number: row.round_number,
            scope: label(&row.scope)?,
            status: label(&row.status)?,
            created_at: row.created_at,
            closed_at: row.closed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BuyerRow {
    pub id: BuyerId,
    pub name: String,
    pub tags: sqlx::types::Json<Set<String>>,
    pub credit_ok: bool,
    pub reliability_score: Option<f64>,
    pub lots_won_count: u32,
    pub po_lots_count: u32,
    pub pos_received_count: u32,
    pub avg_hours_to_po: Option<f64>,
    pub last_win_at: Option<DateTime>,
    pub last_po_at: Option<DateTime>,
    pub award_conversion_rate: Option<f64>,
}

impl From<BuyerRow> for BuyerRecord<BuyerId, DateTime> {
    fn from(row: BuyerRow) -> Self {
        Self {
            id: row.id,
            data: BuyerData {
                name: row.name,
                tags: row.tags.0,
                credit_ok: row.credit_ok,
                reliability_score: row.reliability_score,
                lots_won_count: row.lots_won_count,
                po_lots_count: row.po_lots_count,
                pos_received_count: row.pos_received_count,
                avg_hours_to_po: row.avg_hours_to_po,
                last_win_at: row.last_win_at,
                last_po_at: row.last_po_at,
                award_conversion_rate: row.award_conversion_rate,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct InviteRow {
    pub token: String,
    pub round_id: RoundId,
    pub lot_id: LotId,
    pub buyer_id: BuyerId,
    pub status: String,
    pub created_at: DateTime,
}

impl TryFrom<InviteRow> for InviteRecord<RoundId, LotId, BuyerId, DateTime> {
    type Error = sqlx::Error;

    fn try_from(row: InviteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            token: row.token,
            round_id: row.round_id,
            lot_id: row.lot_id,
            buyer_id: row.buyer_id,
            status: label(&row.status)?,
            created_at: row.created_at,
        })
    }
}

/// An offer with its lines folded into a JSON array by the query
#[derive(sqlx::FromRow)]
pub(crate) struct OfferRow {
    pub id: OfferId,
    pub lot_id: LotId,
    pub round_id: RoundId,
    pub buyer_id: BuyerId,
    pub take_all_total: Option<f64>,
    pub offer_total: f64,
    pub submitted_at: DateTime,
    pub lines: sqlx::types::Json<Vec<OfferLine<LineItemId>>>,
}

impl From<OfferRow> for OfferRecord<OfferId, LotId, RoundId, BuyerId, LineItemId, DateTime> {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.id,
            lot_id: row.lot_id,
            round_id: row.round_id,
            buyer_id: row.buyer_id,
            offer: NormalizedOffer {
                lines: row.lines.0,
                take_all_total: row.take_all_total,
                offer_total: row.offer_total,
            },
            submitted_at: row.submitted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct LineBidRow {
    pub buyer_id: BuyerId,
    pub line_item_id: LineItemId,
    pub unit_price: f64,
    pub quantity: u32,
    pub submitted_at: DateTime,
}

impl From<LineBidRow> for LineBid<BuyerId, LineItemId, DateTime> {
    fn from(row: LineBidRow) -> Self {
        Self {
            buyer_id: row.buyer_id,
            line_item_id: row.line_item_id,
            unit_price: row.unit_price,
            quantity: row.quantity,
            submitted_at: row.submitted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TakeAllRow {
    pub buyer_id: BuyerId,
    pub total: f64,
    pub submitted_at: DateTime,
}

impl From<TakeAllRow> for TakeAllBid<BuyerId, DateTime> {
    fn from(row: TakeAllRow) -> Self {
        Self {
            buyer_id: row.buyer_id,
            total: row.total,
            submitted_at: row.submitted_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AwardRow {
    pub lot_id: LotId,
    pub line_item_id: LineItemId,
    pub round_id: Option<RoundId>,
    pub buyer_id: BuyerId,
    pub unit_price: f64,
    pub quantity: u32,
    pub awarded_at: DateTime,
}

impl From<AwardRow> for AwardRecord<LotId, LineItemId, RoundId, BuyerId, DateTime> {
    fn from(row: AwardRow) -> Self {
        Self {
            lot_id: row.lot_id,
            line_item_id: row.line_item_id,
            round_id: row.round_id,
            buyer_id: row.buyer_id,
            unit_price: row.unit_price,
            quantity: row.quantity,
            awarded_at: row.awarded_at,
        }
    }
}
