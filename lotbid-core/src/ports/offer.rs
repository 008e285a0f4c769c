use super::OfferRecordOf;
use crate::models::{NormalizedOffer, OfferConflict};

/// Repository interface for offers.
///
/// The backend enforces at most one offer per (lot, buyer) and reports a
/// duplicate as [`OfferConflict`]. A conflict is a user-facing outcome, not a
/// fault to retry.
pub trait OfferRepository: super::Repository {
    /// Store a normalized offer with its lines, and mark the buyer's invite
    /// for the round as submitted, in one transaction.
    ///
    /// # Returns
    ///
    /// - Ok(Ok(record)) if stored
    /// - Ok(Err(OfferConflict)) if the buyer already has an offer on the lot
    /// - Err otherwise
    fn submit_offer(
        &self,
        lot_id: Self::LotId,
        round_id: Self::RoundId,
        buyer_id: Self::BuyerId,
        offer: NormalizedOffer<Self::LineItemId>,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Result<OfferRecordOf<Self>, OfferConflict>, Self::Error>> + Send;

    /// The buyer's offer on a lot, if any.
    fn get_offer(
        &self,
        lot_id: Self::LotId,
        buyer_id: Self::BuyerId,
    ) -> impl Future<Output = Result<Option<OfferRecordOf<Self>>, Self::Error>> + Send;

    /// Every offer on a lot, oldest first.
    fn list_offers(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<Vec<OfferRecordOf<Self>>, Self::Error>> + Send;
}
