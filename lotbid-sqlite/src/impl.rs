//! Repository trait implementations for [`Db`].

use crate::{
    Db,
    types::{BuyerId, DateTime, LineItemId, LotId, OfferId, RoundId},
};
use lotbid_core::ports::Repository;

mod allocation;
mod buyer;
mod invite;
mod lot;
mod offer;
mod round;

impl Repository for Db {
    type Error = sqlx::Error;
    type DateTime = DateTime;
    type LotId = LotId;
    type LineItemId = LineItemId;
    type RoundId = RoundId;
    type BuyerId = BuyerId;
    type OfferId = OfferId;
}
