use indexmap::IndexMap;
use lotbid_core::{
    models::{
        Allocation, AllocationInput, BuyerAward, Coverage, LineBid, LineOutcome, Map, RankedOffer,
        TakeAllBid, TakeAllWinner,
    },
    ports::Optimizer,
};
use rustc_hash::FxBuildHasher;
use std::{cmp::Ordering, convert::Infallible, hash::Hash};
use tracing::{Level, event};

/// Awards every line to its best bid and packs the winners per buyer.
///
/// Bids are ranked by descending unit price, then by ascending submission
/// time, then by ascending buyer id. The ranking is total, so the result
/// never depends on the order the bids arrive in.
#[derive(Clone, Copy, Debug, Default)]
pub struct BestOfferOptimizer;

/// Total order on line bids, best first.
fn line_rank<B: Ord, L, D: Ord>(a: &LineBid<B, L, D>, b: &LineBid<B, L, D>) -> Ordering {
    b.unit_price
        .total_cmp(&a.unit_price)
        .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        .then_with(|| a.buyer_id.cmp(&b.buyer_id))
}

/// Total order on take-all bids, best first.
fn take_all_rank<B: Ord, D: Ord>(a: &TakeAllBid<B, D>, b: &TakeAllBid<B, D>) -> Ordering {
    b.total
        .total_cmp(&a.total)
        .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        .then_with(|| a.buyer_id.cmp(&b.buyer_id))
}

fn ranked<B: Clone, L, D>(bid: &LineBid<B, L, D>) -> RankedOffer<B> {
    RankedOffer {
        buyer_id: bid.buyer_id.clone(),
        unit_price: bid.unit_price,
        quantity: bid.quantity,
        value: bid.value(),
    }
}

impl<BuyerId, LineItemId, DateTime> Optimizer<BuyerId, LineItemId, DateTime> for BestOfferOptimizer
where
    BuyerId: Clone + Ord + Hash,
    LineItemId: Clone + Eq + Hash,
    DateTime: Ord,
{
    type Error = Infallible;

    fn allocate(
        &self,
        input: &AllocationInput<BuyerId, LineItemId, DateTime>,
        depth: usize,
    ) -> Result<Allocation<BuyerId, LineItemId>, Self::Error> {
        // Bucket the usable bids by line, keeping the lines in scope order
        let mut buckets = input
            .lines
            .keys()
            .map(|line| (line.clone(), Vec::new()))
            .collect::<IndexMap<_, Vec<&LineBid<_, _, _>>, FxBuildHasher>>();

        for bid in input.bids.iter() {
            if !(bid.unit_price.is_finite() && bid.unit_price >= 0.0) {
                continue;
            }
            if let Some(bucket) = buckets.get_mut(&bid.line_item_id) {
                bucket.push(bid);
            }
        }

        let mut lines = Map::default();
        let mut packs = IndexMap::<BuyerId, BuyerAward<BuyerId, LineItemId>, FxBuildHasher>::default();
        let mut priced_lines = 0;

        for (line, mut bids) in buckets {
            bids.sort_by(|a, b| line_rank(a, b));

            let winner = bids.first().map(|bid| ranked(bid));
            if let Some(best) = &winner {
                priced_lines += 1;
                let pack = packs
                    .entry(best.buyer_id.clone())
                    .or_insert_with(|| BuyerAward {
                        buyer_id: best.buyer_id.clone(),
                        lines: Vec::new(),
                        line_count: 0,
                        total: 0.0,
                    });
                pack.lines.push(line.clone());
                pack.line_count += 1;
                pack.total += best.value;
            }

            let quantity = input.lines.get(&line).copied().unwrap_or_default();
            lines.insert(
                line,
                LineOutcome {
                    quantity,
                    winner,
                    offer_count: bids.len(),
                    top_offers: bids.iter().take(depth).map(|bid| ranked(bid)).collect(),
                },
            );
        }

        let mut awards = packs.into_values().collect::<Vec<_>>();
        awards.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.buyer_id.cmp(&b.buyer_id))
        });

        let split_total = awards.iter().map(|award| award.total).sum();

        let best_take_all = input
            .take_all
            .iter()
            .filter(|bid| bid.total.is_finite() && bid.total >= 0.0)
            .min_by(|a, b| take_all_rank(a, b))
            .map(|bid| TakeAllWinner {
                buyer_id: bid.buyer_id.clone(),
                total: bid.total,
            });

        let coverage = Coverage {
            priced_lines,
            total_lines: input.lines.len(),
        };

        event!(
            Level::DEBUG,
            priced_lines = coverage.priced_lines,
            total_lines = coverage.total_lines,
            buyers = awards.len(),
            split_total,
            "allocated lot"
        );

        Ok(Allocation {
            lines,
            awards,
            coverage,
            split_total,
            best_take_all,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(buyer_id: u32, unit_price: f64, submitted_at: u32) -> LineBid<u32, u32, u32> {
        LineBid {
            buyer_id,
            line_item_id: 1,
            unit_price,
            quantity: 1,
            submitted_at,
        }
    }

    #[test]
    fn higher_price_ranks_first() {
        assert_eq!(line_rank(&bid(1, 10.0, 0), &bid(2, 9.0, 0)), Ordering::Less);
    }

    #[test]
    fn earlier_submission_breaks_price_ties() {
        assert_eq!(line_rank(&bid(9, 10.0, 1), &bid(1, 10.0, 2)), Ordering::Less);
    }

    #[test]
    fn buyer_id_breaks_remaining_ties() {
        assert_eq!(line_rank(&bid(1, 10.0, 1), &bid(2, 10.0, 1)), Ordering::Less);
        assert_eq!(line_rank(&bid(2, 10.0, 1), &bid(2, 10.0, 1)), Ordering::Equal);
    }
}
