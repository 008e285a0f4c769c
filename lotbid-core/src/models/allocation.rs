use super::{Map, Set};
use std::hash::Hash;

/// A buyer's unit price for one line, as fed to the optimizer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineBid<BuyerId, LineItemId, DateTime> {
    /// The bidder
    pub buyer_id: BuyerId,
    /// The line bid on
    pub line_item_id: LineItemId,
    /// Price per unit
    pub unit_price: f64,
    /// The quantity snapshotted with the offer
    pub quantity: u32,
    /// When the offer was stored, used to break price ties
    pub submitted_at: DateTime,
}

impl<BuyerId, LineItemId, DateTime> LineBid<BuyerId, LineItemId, DateTime> {
    /// The value of winning this line at this price
    pub fn value(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// A buyer's lot-wide price.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TakeAllBid<BuyerId, DateTime> {
    /// The bidder
    pub buyer_id: BuyerId,
    /// The offered total
    pub total: f64,
    /// When the offer was stored, used to break ties
    pub submitted_at: DateTime,
}

/// Presentation filters applied to the line set before allocating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationFilter {
    /// Drop lines whose quantity is zero
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude_zero_quantity: bool,
    /// Drop lines nobody has bid on
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude_unpriced: bool,
}

/// Everything an optimizer needs for one lot: the in-scope lines with their
/// quantities, and the normalized bids against them.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationInput<BuyerId, LineItemId: Eq + Hash, DateTime> {
    /// In-scope line items and their current quantities
    pub lines: Map<LineItemId, u32>,
    /// Per-line bids
    pub bids: Vec<LineBid<BuyerId, LineItemId, DateTime>>,
    /// Lot-wide bids
    pub take_all: Vec<TakeAllBid<BuyerId, DateTime>>,
}

impl<BuyerId, LineItemId: Clone + Eq + Hash, DateTime> AllocationInput<BuyerId, LineItemId, DateTime> {
    /// Apply `filter` to the line set, then discard bids on lines that are no
    /// longer in it. Line order is preserved.
    pub fn filtered(mut self, filter: AllocationFilter) -> Self {
        if filter.exclude_zero_quantity {
            self.lines.retain(|_, quantity| *quantity > 0);
        }
        if filter.exclude_unpriced {
            let priced = self
                .bids
                .iter()
                .map(|bid| bid.line_item_id.clone())
                .collect::<Set<_>>();
            self.lines.retain(|line, _| priced.contains(line));
        }
        self.bids
            .retain(|bid| self.lines.contains_key(&bid.line_item_id));
        self
    }
}

/// One bid on a line, as shown in the allocation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedOffer<BuyerId> {
    /// The bidder
    pub buyer_id: BuyerId,
    /// Price per unit
    pub unit_price: f64,
    /// Quantity the price applies to
    pub quantity: u32,
    /// `unit_price × quantity`
    pub value: f64,
}

/// The result for a single line.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineOutcome<BuyerId> {
    /// The line's current quantity
    pub quantity: u32,
    /// The best bid, if any
    pub winner: Option<RankedOffer<BuyerId>>,
    /// How many bids the line received
    pub offer_count: usize,
    /// The best bids in rank order, up to the requested depth
    pub top_offers: Vec<RankedOffer<BuyerId>>,
}

/// Everything one buyer wins: their share of a split award.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuyerAward<BuyerId, LineItemId> {
    /// The winning buyer
    pub buyer_id: BuyerId,
    /// The lines won, in line order
    pub lines: Vec<LineItemId>,
    /// `lines.len()`
    pub line_count: usize,
    /// Sum of `unit_price × quantity` over the lines won
    pub total: f64,
}

/// How much of the lot has any price signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coverage {
    /// Lines with at least one bid
    pub priced_lines: usize,
    /// All lines considered
    pub total_lines: usize,
}

/// The best lot-wide bid.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TakeAllWinner<BuyerId> {
    /// The bidder
    pub buyer_id: BuyerId,
    /// The offered total
    pub total: f64,
}

/// A line-by-line allocation of a lot.
///
/// This is derived data: it is computed on demand from the offers and never
/// stored as such. Accepting it stores the winning lines as awards.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Allocation<BuyerId, LineItemId: Eq + Hash> {
    /// Per-line results, in line order
    pub lines: Map<LineItemId, LineOutcome<BuyerId>>,
    /// Per-buyer award packs, by descending total
    pub awards: Vec<BuyerAward<BuyerId, LineItemId>>,
    /// Priced vs. total lines
    pub coverage: Coverage,
    /// Sum of all winning line values
    pub split_total: f64,
    /// The highest take-all bid, for comparison against `split_total`
    pub best_take_all: Option<TakeAllWinner<BuyerId>>,
}

impl<BuyerId, LineItemId: Eq + Hash> Allocation<BuyerId, LineItemId> {
    /// The winning bid of every line that has one, in line order
    pub fn winners(&self) -> impl Iterator<Item = (&LineItemId, &RankedOffer<BuyerId>)> {
        self.lines
            .iter()
            .filter_map(|(line, outcome)| outcome.winner.as_ref().map(|winner| (line, winner)))
    }
}

/// A line item awarded to a buyer when an allocation was accepted.
///
/// A line is awarded at most once; awarded lines fall out of later `unsold`
/// rounds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AwardRecord<LotId, LineItemId, RoundId, BuyerId, DateTime> {
    /// The lot
    pub lot_id: LotId,
    /// The awarded line
    pub line_item_id: LineItemId,
    /// The round that was live when the award was accepted, if any
    pub round_id: Option<RoundId>,
    /// The winning buyer
    pub buyer_id: BuyerId,
    /// The winning unit price
    pub unit_price: f64,
    /// The quantity awarded
    pub quantity: u32,
    /// When the award was accepted
    pub awarded_at: DateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(buyer_id: char, line_item_id: u32) -> LineBid<char, u32, u32> {
        LineBid {
            buyer_id,
            line_item_id,
            unit_price: 10.0,
            quantity: 1,
            submitted_at: 0,
        }
    }

    fn input() -> AllocationInput<char, u32, u32> {
        AllocationInput {
            lines: [(1, 1), (2, 0), (3, 5), (4, 2)].into_iter().collect(),
            bids: vec![bid('a', 1), bid('b', 2), bid('a', 4), bid('c', 7)],
            take_all: Vec::new(),
        }
    }

    #[test]
    fn no_filter_still_drops_bids_outside_the_scope() {
        let filtered = input().filtered(AllocationFilter::default());
        assert_eq!(filtered.lines.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(filtered.bids.len(), 3);
    }

    #[test]
    fn zero_quantity_lines_can_be_excluded() {
        let filtered = input().filtered(AllocationFilter {
            exclude_zero_quantity: true,
            exclude_unpriced: false,
        });
        assert_eq!(filtered.lines.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4]);
        assert!(filtered.bids.iter().all(|bid| bid.line_item_id != 2));
    }

    #[test]
    fn unpriced_lines_can_be_excluded() {
        let filtered = input().filtered(AllocationFilter {
            exclude_zero_quantity: false,
            exclude_unpriced: true,
        });
        assert_eq!(filtered.lines.keys().copied().collect::<Vec<_>>(), vec![1, 2, 4]);
    }
}
