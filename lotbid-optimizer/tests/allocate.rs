use approx::assert_relative_eq;
use lotbid_core::{
    models::{AllocationFilter, AllocationInput, LineBid, TakeAllBid},
    ports::Optimizer,
};
use lotbid_optimizer::BestOfferOptimizer;
use rstest::*;

// Buyers are single characters and timestamps are plain integers; the
// optimizer only needs them to be ordered.
type Input = AllocationInput<char, u32, u32>;

fn line_bid(buyer_id: char, line_item_id: u32, unit_price: f64, submitted_at: u32) -> LineBid<char, u32, u32> {
    LineBid {
        buyer_id,
        line_item_id,
        unit_price,
        quantity: 1,
        submitted_at,
    }
}

/// Two single-unit lines; A wins line 1, B wins line 2.
#[fixture]
fn two_buyers() -> Input {
    AllocationInput {
        lines: [(1, 1), (2, 1)].into_iter().collect(),
        bids: vec![
            line_bid('A', 1, 100.0, 1),
            line_bid('A', 2, 50.0, 1),
            line_bid('B', 1, 90.0, 2),
            line_bid('B', 2, 60.0, 2),
        ],
        take_all: Vec::new(),
    }
}

#[rstest]
fn best_offer_wins_each_line(two_buyers: Input) {
    let allocation = BestOfferOptimizer.allocate(&two_buyers, 3).unwrap();

    let winners = allocation
        .winners()
        .map(|(line, offer)| (*line, offer.buyer_id))
        .collect::<Vec<_>>();
    assert_eq!(winners, vec![(1, 'A'), (2, 'B')]);

    assert_eq!(allocation.awards.len(), 2);
    assert_eq!(allocation.awards[0].buyer_id, 'A');
    assert_relative_eq!(allocation.awards[0].total, 100.0);
    assert_eq!(allocation.awards[0].lines, vec![1]);
    assert_eq!(allocation.awards[1].buyer_id, 'B');
    assert_relative_eq!(allocation.awards[1].total, 60.0);
    assert_eq!(allocation.awards[1].line_count, 1);

    assert_eq!(allocation.coverage.priced_lines, 2);
    assert_eq!(allocation.coverage.total_lines, 2);
    assert_relative_eq!(allocation.split_total, 160.0);
    assert!(allocation.best_take_all.is_none());
}

#[rstest]
fn allocation_is_idempotent(two_buyers: Input) {
    let first = BestOfferOptimizer.allocate(&two_buyers, 5).unwrap();
    let second = BestOfferOptimizer.allocate(&two_buyers, 5).unwrap();
    assert_eq!(first, second);
}

#[rstest]
fn bid_order_does_not_matter(two_buyers: Input) {
    let mut reversed = two_buyers.clone();
    reversed.bids.reverse();

    let forward = BestOfferOptimizer.allocate(&two_buyers, 5).unwrap();
    let backward = BestOfferOptimizer.allocate(&reversed, 5).unwrap();
    assert_eq!(forward, backward);
}

#[rstest]
fn a_higher_bid_changes_only_its_line(two_buyers: Input) {
    let before = BestOfferOptimizer.allocate(&two_buyers, 1).unwrap();

    let mut outbid = two_buyers;
    outbid.bids.push(line_bid('C', 2, 75.0, 3));
    let after = BestOfferOptimizer.allocate(&outbid, 1).unwrap();

    assert_eq!(after.lines[&1].winner, before.lines[&1].winner);
    let winner = after.lines[&2].winner.as_ref().unwrap();
    assert_eq!(winner.buyer_id, 'C');
    assert_relative_eq!(winner.unit_price, 75.0);
    assert_eq!(after.lines[&2].offer_count, 3);
}

#[rstest]
#[case::earlier_offer_wins(2, 1, 'B')]
#[case::lower_buyer_wins(1, 1, 'A')]
fn equal_prices_are_broken_deterministically(
    #[case] a_at: u32,
    #[case] b_at: u32,
    #[case] expected: char,
) {
    let input = AllocationInput {
        lines: [(1, 1)].into_iter().collect(),
        bids: vec![line_bid('A', 1, 10.0, a_at), line_bid('B', 1, 10.0, b_at)],
        take_all: Vec::new(),
    };

    let allocation = BestOfferOptimizer.allocate(&input, 2).unwrap();
    assert_eq!(allocation.lines[&1].winner.as_ref().unwrap().buyer_id, expected);
}

#[rstest]
fn depth_limits_the_what_if_view(two_buyers: Input) {
    let shallow = BestOfferOptimizer.allocate(&two_buyers, 1).unwrap();
    let deep = BestOfferOptimizer.allocate(&two_buyers, 10).unwrap();

    assert_eq!(shallow.lines[&1].top_offers.len(), 1);
    assert_eq!(deep.lines[&1].top_offers.len(), 2);
    assert_eq!(deep.lines[&1].top_offers[1].buyer_id, 'B');
    assert_eq!(shallow.awards, deep.awards);
}

#[test]
fn empty_lot_yields_empty_allocation() {
    let input: Input = AllocationInput {
        lines: Default::default(),
        bids: Vec::new(),
        take_all: Vec::new(),
    };

    let allocation = BestOfferOptimizer.allocate(&input, 3).unwrap();
    assert!(allocation.lines.is_empty());
    assert!(allocation.awards.is_empty());
    assert_eq!(allocation.coverage.total_lines, 0);
    assert_relative_eq!(allocation.split_total, 0.0);
}

#[test]
fn unpriced_lines_count_toward_coverage_only() {
    let input: Input = AllocationInput {
        lines: [(1, 2), (2, 4), (3, 0)].into_iter().collect(),
        bids: vec![LineBid {
            buyer_id: 'A',
            line_item_id: 2,
            unit_price: 25.0,
            quantity: 4,
            submitted_at: 0,
        }],
        take_all: Vec::new(),
    };

    let allocation = BestOfferOptimizer.allocate(&input, 3).unwrap();
    assert_eq!(allocation.coverage.priced_lines, 1);
    assert_eq!(allocation.coverage.total_lines, 3);
    assert!(allocation.lines[&1].winner.is_none());
    assert_eq!(allocation.lines[&1].quantity, 2);
    assert_relative_eq!(allocation.awards[0].total, 100.0);

    let filtered = input.filtered(AllocationFilter {
        exclude_zero_quantity: true,
        exclude_unpriced: true,
    });
    let allocation = BestOfferOptimizer.allocate(&filtered, 3).unwrap();
    assert_eq!(allocation.coverage.total_lines, 1);
    assert_eq!(allocation.coverage.priced_lines, 1);
}

#[test]
fn bids_outside_the_scope_are_ignored() {
    let input: Input = AllocationInput {
        lines: [(1, 1)].into_iter().collect(),
        bids: vec![line_bid('A', 1, 5.0, 0), line_bid('B', 9, 500.0, 0)],
        take_all: Vec::new(),
    };

    let allocation = BestOfferOptimizer.allocate(&input, 3).unwrap();
    assert_eq!(allocation.awards.len(), 1);
    assert_eq!(allocation.awards[0].buyer_id, 'A');
}

#[rstest]
fn best_take_all_is_reported_next_to_the_split(mut two_buyers: Input) {
    two_buyers.take_all = vec![
        TakeAllBid {
            buyer_id: 'C',
            total: 150.0,
            submitted_at: 5,
        },
        TakeAllBid {
            buyer_id: 'D',
            total: 150.0,
            submitted_at: 4,
        },
        TakeAllBid {
            buyer_id: 'E',
            total: 120.0,
            submitted_at: 1,
        },
    ];

    let allocation = BestOfferOptimizer.allocate(&two_buyers, 0).unwrap();
    let best = allocation.best_take_all.unwrap();
    assert_eq!(best.buyer_id, 'D');
    assert_relative_eq!(best.total, 150.0);
    assert_relative_eq!(allocation.split_total, 160.0);
}

#[rstest]
fn allocation_serializes_lines_in_scope_order(two_buyers: Input) {
    let allocation = BestOfferOptimizer.allocate(&two_buyers, 0).unwrap();
    let json = serde_json::to_value(&allocation).unwrap();

    let lines = json["lines"].as_object().unwrap();
    assert_eq!(lines.keys().collect::<Vec<_>>(), vec!["1", "2"]);
    assert_eq!(json["coverage"]["priced_lines"], 2);
    assert_eq!(json["awards"][0]["buyer_id"], "A");
}
