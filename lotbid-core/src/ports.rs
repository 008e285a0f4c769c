mod allocation;
mod buyer;
mod invite;
mod lot;
mod offer;
mod optimizer;
mod round;

pub use allocation::AllocationRepository;
pub use buyer::BuyerRepository;
pub use invite::InviteRepository;
pub use lot::LotRepository;
pub use offer::OfferRepository;
pub use optimizer::Optimizer;
pub use round::RoundRepository;

use std::{fmt::Debug, fmt::Display, hash::Hash};

/// The base trait of every repository: the error type and the concrete
/// identifier and timestamp types a backend works with.
///
/// The engine never inspects identifiers beyond equality, hashing and
/// ordering, so backends are free to use whatever keys their storage favours.
pub trait Repository: Send + Sync + Sized {
    /// The error for infrastructure failures. Domain outcomes (not found,
    /// conflicts) are reported through return values instead.
    type Error: std::error::Error + Send + Sync + 'static;

    /// A point in time, convertible to UTC for recency scoring
    type DateTime: Clone + Ord + Debug + Send + Sync + Into<time::OffsetDateTime>;

    /// Identifies a lot
    type LotId: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync;

    /// Identifies a line item
    type LineItemId: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync;

    /// Identifies a round
    type RoundId: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync;

    /// Identifies a buyer
    type BuyerId: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync;

    /// Identifies an offer
    type OfferId: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync;
}

/// The record types of a repository, spelled out once.
pub type LotRecordOf<R> = crate::models::LotRecord<<R as Repository>::LotId, <R as Repository>::DateTime>;

/// See [`LotRecordOf`].
pub type LineItemRecordOf<R> =
    crate::models::LineItemRecord<<R as Repository>::LineItemId, <R as Repository>::LotId>;

/// See [`LotRecordOf`].
pub type RoundRecordOf<R> = crate::models::RoundRecord<
    <R as Repository>::RoundId,
    <R as Repository>::LotId,
    <R as Repository>::DateTime,
>;

/// See [`LotRecordOf`].
pub type BuyerRecordOf<R> =
    crate::models::BuyerRecord<<R as Repository>::BuyerId, <R as Repository>::DateTime>;

/// See [`LotRecordOf`].
pub type InviteRecordOf<R> = crate::models::InviteRecord<
    <R as Repository>::RoundId,
    <R as Repository>::LotId,
    <R as Repository>::BuyerId,
    <R as Repository>::DateTime,
>;

/// See [`LotRecordOf`].
pub type OfferRecordOf<R> = crate::models::OfferRecord<
    <R as Repository>::OfferId,
    <R as Repository>::LotId,
    <R as Repository>::RoundId,
    <R as Repository>::BuyerId,
    <R as Repository>::LineItemId,
    <R as Repository>::DateTime,
>;

/// See [`LotRecordOf`].
pub type AwardRecordOf<R> = crate::models::AwardRecord<
    <R as Repository>::LotId,
    <R as Repository>::LineItemId,
    <R as Repository>::RoundId,
    <R as Repository>::BuyerId,
    <R as Repository>::DateTime,
>;

/// See [`LotRecordOf`].
pub type AllocationInputOf<R> = crate::models::AllocationInput<
    <R as Repository>::BuyerId,
    <R as Repository>::LineItemId,
    <R as Repository>::DateTime,
>;

/// See [`LotRecordOf`].
pub type AllocationOf<R> =
    crate::models::Allocation<<R as Repository>::BuyerId, <R as Repository>::LineItemId>;

/// A marker trait for a backend implementing every repository.
pub trait MarketRepository:
    LotRepository
    + RoundRepository
    + BuyerRepository
    + InviteRepository
    + OfferRepository
    + AllocationRepository
{
}

impl<T> MarketRepository for T where
    T: LotRepository
        + RoundRepository
        + BuyerRepository
        + InviteRepository
        + OfferRepository
        + AllocationRepository
{
}

/// The host application: a backend, an allocation strategy, a clock, an id
/// generator and an authorization scheme.
///
/// The request boundary (HTTP or otherwise) is written against this trait,
/// so that swapping the database or the permission model does not touch it.
pub trait Application {
    /// Whatever the request boundary extracts to authorize a caller
    type Context;

    /// The storage backend
    type Repository: MarketRepository;

    /// The allocation strategy
    type Optimizer: Optimizer<
            <Self::Repository as Repository>::BuyerId,
            <Self::Repository as Repository>::LineItemId,
            <Self::Repository as Repository>::DateTime,
        >;

    /// A reference to the backend
    fn database(&self) -> &Self::Repository;

    /// The allocation strategy to use for this request
    fn optimizer(&self) -> Self::Optimizer;

    /// The current time
    fn now(&self) -> <Self::Repository as Repository>::DateTime;

    /// A fresh id for a new lot
    fn generate_lot_id(&self) -> <Self::Repository as Repository>::LotId;

    /// A fresh id for a new line item
    fn generate_line_item_id(&self) -> <Self::Repository as Repository>::LineItemId;

    /// A fresh id for a new buyer
    fn generate_buyer_id(&self) -> <Self::Repository as Repository>::BuyerId;

    /// Whether the caller may create lots, run rounds, invite buyers and
    /// accept allocations
    fn can_manage(&self, context: &Self::Context) -> impl Future<Output = bool> + Send;

    /// Whether the caller may browse and rank the buyer directory
    fn can_view_buyers(&self, context: &Self::Context) -> impl Future<Output = bool> + Send;
}
