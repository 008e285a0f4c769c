use super::Set;
use std::cmp::Ordering;
use time::OffsetDateTime;

/// The profile of a buyer who may be invited to bid.
///
/// The historical counters are maintained by the fulfilment flow; the bidding
/// engine only reads them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuyerData<DateTime> {
    /// Display name
    pub name: String,
    /// Interest tags, matched against a lot's tokens
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Set<String>,
    /// Whether the buyer has cleared a credit check
    #[cfg_attr(feature = "serde", serde(default))]
    pub credit_ok: bool,
    /// A 0-5 reliability rating, if one has been assigned
    #[cfg_attr(feature = "serde", serde(default))]
    pub reliability_score: Option<f64>,
    /// Lots this buyer has won
    #[cfg_attr(feature = "serde", serde(default))]
    pub lots_won_count: u32,
    /// Won lots that converted into a purchase order
    #[cfg_attr(feature = "serde", serde(default))]
    pub po_lots_count: u32,
    /// Purchase orders received from this buyer
    #[cfg_attr(feature = "serde", serde(default))]
    pub pos_received_count: u32,
    /// Mean hours between award and purchase order
    #[cfg_attr(feature = "serde", serde(default))]
    pub avg_hours_to_po: Option<f64>,
    /// Most recent win
    pub last_win_at: Option<DateTime>,
    /// Most recent purchase order
    pub last_po_at: Option<DateTime>,
    /// Explicit award-to-PO conversion rate, overriding the derived one
    #[cfg_attr(feature = "serde", serde(default))]
    pub award_conversion_rate: Option<f64>,
}

/// A stored buyer profile.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuyerRecord<BuyerId, DateTime> {
    /// The buyer's id
    pub id: BuyerId,
    /// The profile
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: BuyerData<DateTime>,
}

/// The individual terms that add up to a buyer's score.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreBreakdown {
    /// 100 per matching tag
    pub tags: f64,
    /// +50 when credit is ok, -30 otherwise
    pub credit: f64,
    /// Reliability rating (0-5) times 8
    pub reliability: f64,
    /// Lots won (capped at 200) times 2
    pub wins: f64,
    /// PO lots (capped) times 4 plus POs received (capped)
    pub purchase_orders: f64,
    /// Up to 50 for a short award-to-PO time
    pub time_to_po: f64,
    /// Up to 30 for a recent win or PO
    pub recency: f64,
    /// Conversion reward net of low-conversion penalties
    pub conversion: f64,
}

impl ScoreBreakdown {
    /// The sum of all terms
    pub fn total(&self) -> f64 {
        self.tags
            + self.credit
            + self.reliability
            + self.wins
            + self.purchase_orders
            + self.time_to_po
            + self.recency
            + self.conversion
    }
}

/// A buyer's relevance to a lot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuyerScore {
    /// The additive score
    pub total: f64,
    /// How many of the buyer's tags appear among the lot tokens
    pub match_count: usize,
    /// The terms making up `total`
    pub breakdown: ScoreBreakdown,
}

/// A buyer together with its score against some lot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedBuyer<BuyerId, DateTime> {
    /// The buyer
    pub buyer: BuyerRecord<BuyerId, DateTime>,
    /// Its score
    pub score: BuyerScore,
}

const COUNTER_CAP: u32 = 200;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Clamp, mapping NaN to the lower bound.
fn bounded(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() { lo } else { value.clamp(lo, hi) }
}

fn capped(count: u32) -> f64 {
    count.min(COUNTER_CAP) as f64
}

fn days_since<D: Clone + Into<OffsetDateTime>>(then: &Option<D>, now: OffsetDateTime) -> f64 {
    then.as_ref()
        .map(|then| (now - then.clone().into()).as_seconds_f64() / SECONDS_PER_DAY)
        .unwrap_or(f64::INFINITY)
}

/// Score a buyer against a lot's token set.
///
/// `tokens` is the lower-cased, deduplicated, synonym-expanded token set of
/// the lot. Tags are compared case-insensitively. The result depends only on
/// the arguments.
pub fn score<D: Clone + Into<OffsetDateTime>>(
    buyer: &BuyerData<D>,
    tokens: &Set<String>,
    now: OffsetDateTime,
) -> BuyerScore {
    let match_count = buyer
        .tags
        .iter()
        .map(|tag| tag.trim().to_lowercase())
        .collect::<Set<String>>()
        .iter()
        .filter(|tag| tokens.contains(*tag))
        .count();

    let wins = buyer.lots_won_count;
    let conversion_rate = buyer.award_conversion_rate.unwrap_or_else(|| {
        if wins == 0 {
            0.0
        } else {
            buyer.po_lots_count as f64 / wins as f64
        }
    });
    let c = bounded(conversion_rate, 0.0, 1.0);
    let mut conversion = if wins >= 3 { c * 220.0 } else { c * 90.0 };
    if wins >= 5 && c < 0.4 {
        conversion -= 60.0;
    }
    if wins >= 5 && c < 0.2 {
        conversion -= 80.0;
    }

    let age = days_since(&buyer.last_po_at, now).min(days_since(&buyer.last_win_at, now));

    let breakdown = ScoreBreakdown {
        tags: match_count as f64 * 100.0,
        credit: if buyer.credit_ok { 50.0 } else { -30.0 },
        reliability: buyer
            .reliability_score
            .map(|r| bounded(r, 0.0, 5.0) * 8.0)
            .unwrap_or(0.0),
        wins: capped(wins) * 2.0,
        purchase_orders: capped(buyer.po_lots_count) * 4.0 + capped(buyer.pos_received_count),
        time_to_po: buyer
            .avg_hours_to_po
            .map(|hours| bounded(50.0 - hours, 0.0, 50.0))
            .unwrap_or(0.0),
        recency: bounded(30.0 - age, 0.0, 30.0),
        conversion,
    };

    BuyerScore {
        total: breakdown.total(),
        match_count,
        breakdown,
    }
}

/// Rank buyers for a lot.
///
/// Buyers sharing no tag with the lot are dropped entirely. The rest are
/// ordered by descending score, ties broken by ascending buyer id, so that
/// paging through the result is reproducible.
pub fn rank<B: Ord, D: Clone + Into<OffsetDateTime>>(
    buyers: impl IntoIterator<Item = BuyerRecord<B, D>>,
    tokens: &Set<String>,
    now: OffsetDateTime,
) -> Vec<RankedBuyer<B, D>> {
    let mut ranked = buyers
        .into_iter()
        .filter_map(|buyer| {
            let score = score(&buyer.data, tokens, now);
            (score.match_count > 0).then_some(RankedBuyer { buyer, score })
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| match b.score.total.total_cmp(&a.score.total) {
        Ordering::Equal => a.buyer.id.cmp(&b.buyer.id),
        other => other,
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    fn tokens(words: &[&str]) -> Set<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[fixture]
    fn blank() -> BuyerData<OffsetDateTime> {
        BuyerData {
            name: "blank".to_string(),
            tags: Set::default(),
            credit_ok: false,
            reliability_score: None,
            lots_won_count: 0,
            po_lots_count: 0,
            pos_received_count: 0,
            avg_hours_to_po: None,
            last_win_at: None,
            last_po_at: None,
            award_conversion_rate: None,
        }
    }

    #[rstest]
    fn tag_overlap_counts_each_matching_tag(mut blank: BuyerData<OffsetDateTime>) {
        blank.tags = tokens(&["Dell", "server"]);
        blank.credit_ok = true;
        let score = score(&blank, &tokens(&["dell", "r740", "server"]), NOW);

        assert_eq!(score.match_count, 2);
        assert_relative_eq!(score.breakdown.tags, 200.0);
        assert_relative_eq!(score.total, 250.0);
    }

    #[rstest]
    fn missing_history_contributes_nothing(blank: BuyerData<OffsetDateTime>) {
        let score = score(&blank, &tokens(&["dell"]), NOW);
        assert_eq!(score.match_count, 0);
        assert_relative_eq!(score.total, -30.0);
        assert_relative_eq!(score.breakdown.recency, 0.0);
        assert_relative_eq!(score.breakdown.time_to_po, 0.0);
    }

    #[rstest]
    fn counters_and_ratings_are_clamped(mut blank: BuyerData<OffsetDateTime>) {
        blank.reliability_score = Some(9.0);
        blank.lots_won_count = 500;
        blank.po_lots_count = 500;
        blank.pos_received_count = 1000;
        blank.avg_hours_to_po = Some(-10.0);
        let score = score(&blank, &Set::default(), NOW);

        assert_relative_eq!(score.breakdown.reliability, 40.0);
        assert_relative_eq!(score.breakdown.wins, 400.0);
        assert_relative_eq!(score.breakdown.purchase_orders, 1000.0);
        assert_relative_eq!(score.breakdown.time_to_po, 50.0);
        // conversion 500/500 = 1.0 with >= 3 wins
        assert_relative_eq!(score.breakdown.conversion, 220.0);
    }

    #[rstest]
    #[case(2, 2, 90.0)]
    #[case(3, 3, 220.0)]
    #[case(10, 3, 0.3 * 220.0 - 60.0)]
    #[case(10, 1, 0.1 * 220.0 - 60.0 - 80.0)]
    #[case(4, 0, 0.0)]
    fn conversion_rewards_and_penalties(
        mut blank: BuyerData<OffsetDateTime>,
        #[case] wins: u32,
        #[case] pos: u32,
        #[case] expected: f64,
    ) {
        blank.lots_won_count = wins;
        blank.po_lots_count = pos;
        let score = score(&blank, &Set::default(), NOW);
        assert_relative_eq!(score.breakdown.conversion, expected, epsilon = 1e-9);
    }

    #[rstest]
    fn explicit_conversion_rate_overrides_derived(mut blank: BuyerData<OffsetDateTime>) {
        blank.lots_won_count = 6;
        blank.po_lots_count = 6;
        blank.award_conversion_rate = Some(0.1);
        let score = score(&blank, &Set::default(), NOW);
        assert_relative_eq!(score.breakdown.conversion, 22.0 - 140.0, epsilon = 1e-9);
    }

    #[rstest]
    fn recency_uses_the_most_recent_event(mut blank: BuyerData<OffsetDateTime>) {
        blank.last_win_at = Some(datetime!(2024-05-22 12:00 UTC)); // 10 days
        blank.last_po_at = Some(datetime!(2024-04-01 12:00 UTC)); // 61 days
        let score = score(&blank, &Set::default(), NOW);
        assert_relative_eq!(score.breakdown.recency, 20.0, epsilon = 1e-9);

        blank.last_win_at = Some(datetime!(2024-07-01 12:00 UTC)); // in the future
        let score = super::score(&blank, &Set::default(), NOW);
        assert_relative_eq!(score.breakdown.recency, 30.0);
    }

    #[rstest]
    fn scoring_is_deterministic(mut blank: BuyerData<OffsetDateTime>) {
        blank.tags = tokens(&["hp", "storage"]);
        blank.reliability_score = Some(3.5);
        blank.lots_won_count = 7;
        blank.po_lots_count = 2;
        blank.last_po_at = Some(datetime!(2024-05-30 00:00 UTC));
        let lot = tokens(&["hp", "storage", "msa"]);
        assert_eq!(score(&blank, &lot, NOW), score(&blank, &lot, NOW));
    }

    #[rstest]
    fn ranking_excludes_non_matching_and_orders_ties_by_id(blank: BuyerData<OffsetDateTime>) {
        let with_tags = |id: u32, tags: &[&str]| BuyerRecord {
            id,
            data: BuyerData {
                tags: tokens(tags),
                ..blank.clone()
            },
        };

        let buyers = vec![
            with_tags(3, &["server"]),
            with_tags(1, &["cisco"]),
            with_tags(2, &["server"]),
            with_tags(4, &["dell", "server"]),
        ];
        let ranked = rank(buyers, &tokens(&["dell", "r740", "server"]), NOW);
        let ids = ranked.iter().map(|r| r.buyer.id).collect::<Vec<_>>();

        assert_eq!(ids, vec![4, 2, 3]);
        assert_eq!(ranked[0].score.match_count, 2);
    }

    /// A timestamp with no `Default`, like the ones storage backends supply.
    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Stamp(i64);

    #[test]
    fn profiles_deserialize_without_history() {
        let data: BuyerData<Stamp> =
            serde_json::from_str(r#"{ "name": "Acme Resale", "tags": ["server"] }"#).unwrap();
        assert_eq!(data.last_win_at, None);
        assert_eq!(data.last_po_at, None);
        assert_eq!(data.lots_won_count, 0);

        let data: BuyerData<Stamp> =
            serde_json::from_str(r#"{ "name": "Acme Resale", "last_win_at": 1700000000 }"#).unwrap();
        assert_eq!(data.last_win_at, Some(Stamp(1_700_000_000)));
    }
}
