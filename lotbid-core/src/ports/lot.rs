use super::{LineItemRecordOf, LotRecordOf};
use crate::models::{LineItemData, LotData, LotStatus};

/// Repository interface for lots and their line items.
///
/// Line items are immutable once created; the only mutable part of a lot is
/// its status.
pub trait LotRepository: super::Repository {
    /// Create a new lot in `draft` status.
    fn create_lot(
        &self,
        lot_id: Self::LotId,
        data: LotData,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<LotRecordOf<Self>, Self::Error>> + Send;

    /// Retrieve a lot, or `None` if it does not exist.
    fn get_lot(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<Option<LotRecordOf<Self>>, Self::Error>> + Send;

    /// Move a lot to a new status.
    ///
    /// # Returns
    ///
    /// - Ok(Some(record)) if successful
    /// - Ok(None) if no such lot exists
    /// - Err otherwise
    fn set_lot_status(
        &self,
        lot_id: Self::LotId,
        status: LotStatus,
    ) -> impl Future<Output = Result<Option<LotRecordOf<Self>>, Self::Error>> + Send;

    /// Add line items to a lot.
    ///
    /// The caller is expected to have checked that the lot exists.
    fn add_line_items<T: Send + IntoIterator<Item = (Self::LineItemId, LineItemData)>>(
        &self,
        lot_id: Self::LotId,
        items: T,
    ) -> impl Future<Output = Result<Vec<LineItemRecordOf<Self>>, Self::Error>> + Send
    where
        T::IntoIter: Send;

    /// List a lot's line items in creation order.
    fn list_line_items(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<Vec<LineItemRecordOf<Self>>, Self::Error>> + Send;
}
