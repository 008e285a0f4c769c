use crate::models::{Allocation, AllocationInput};
use std::hash::Hash;

/// Interface for allocation strategies.
///
/// An optimizer turns the normalized bids on a lot into an allocation. It must
/// be a pure function of its input: no storage access, no hidden state, and
/// the same input always gives the same output. Missing bids are not an
/// error; an unpriced lot yields an empty allocation.
pub trait Optimizer<BuyerId, LineItemId: Eq + Hash, DateTime> {
    /// Error type for inputs the strategy cannot handle
    type Error: std::error::Error + Send + Sync + 'static;

    /// Allocate the lot.
    ///
    /// `depth` is how many ranked bids to report per line for "what-if"
    /// inspection. It never affects who wins.
    fn allocate(
        &self,
        input: &AllocationInput<BuyerId, LineItemId, DateTime>,
        depth: usize,
    ) -> Result<Allocation<BuyerId, LineItemId>, Self::Error>;
}
