use super::BuyerRecordOf;
use crate::models::{BuyerData, RankedBuyer, Set};

/// Repository interface for the buyer directory.
///
/// The bidding engine only reads buyer profiles; they are written by whatever
/// maintains the directory (imports, the fulfilment flow).
pub trait BuyerRepository: super::Repository {
    /// Create or replace a buyer profile.
    fn upsert_buyer(
        &self,
        buyer_id: Self::BuyerId,
        data: BuyerData<Self::DateTime>,
    ) -> impl Future<Output = Result<BuyerRecordOf<Self>, Self::Error>> + Send;

    /// A buyer by id.
    fn get_buyer(
        &self,
        buyer_id: Self::BuyerId,
    ) -> impl Future<Output = Result<Option<BuyerRecordOf<Self>>, Self::Error>> + Send;

    /// The unfiltered "browse all" view, ordered by id.
    fn list_buyers(
        &self,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<BuyerRecordOf<Self>>, Self::Error>> + Send;

    /// Buyers ranked against a lot's token set as of `now`, excluding those
    /// with no matching tag, then paginated.
    ///
    /// Ranking is a pure function of the profiles and the arguments, so equal
    /// arguments page through the same order.
    fn rank_buyers(
        &self,
        tokens: &Set<String>,
        now: Self::DateTime,
        offset: usize,
        limit: usize,
    ) -> impl Future<
        Output = Result<Vec<RankedBuyer<Self::BuyerId, Self::DateTime>>, Self::Error>,
    > + Send;
}
