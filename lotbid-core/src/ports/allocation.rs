use super::{AllocationInputOf, AwardRecordOf};

/// Repository interface for gathering allocation inputs and recording awards.
///
/// Reading the input never writes, so an allocation can be recomputed as
/// often as needed; only accepting it (`record_awards`) mutates state.
pub trait AllocationRepository: super::Repository {
    /// Snapshot everything an optimizer needs for a lot: the lines of the
    /// current scope with their quantities, every offer line on those lines,
    /// and every take-all price.
    ///
    /// Returns `None` if the lot does not exist.
    fn allocation_input(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<Option<AllocationInputOf<Self>>, Self::Error>> + Send;

    /// Record winning lines as awards and move the lot to `awarded`.
    ///
    /// Each entry is `(line, buyer, unit price, quantity)`. Lines that already
    /// carry an award are skipped, so re-accepting the same allocation is a
    /// no-op. Returns the awards actually created.
    fn record_awards(
        &self,
        lot_id: Self::LotId,
        round_id: Option<Self::RoundId>,
        awards: Vec<(Self::LineItemId, Self::BuyerId, f64, u32)>,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Vec<AwardRecordOf<Self>>, Self::Error>> + Send;

    /// Every award on a lot, in line order.
    fn list_awards(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<Vec<AwardRecordOf<Self>>, Self::Error>> + Send;
}
