mod normalize;
pub use normalize::{NormalizeError, normalize};

/// A hardware component that can be priced separately within a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Component {
    /// Processors
    Cpu,
    /// Memory modules
    Memory,
    /// Network adapters
    Network,
    /// Expansion cards
    ExpansionCard,
    /// Graphics cards
    Gpu,
    /// Storage drives
    Drives,
}

/// A buyer's price for one component of a line.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentPrice {
    /// Which component
    pub component: Component,
    /// Whether the buyer wants this component at all
    #[cfg_attr(feature = "serde", serde(default))]
    pub selected: bool,
    /// Price per component unit
    #[cfg_attr(feature = "serde", serde(default))]
    pub unit_price: Option<f64>,
    /// Component units per line unit (e.g. CPU count, DIMM count). Defaults to 1.
    #[cfg_attr(feature = "serde", serde(default))]
    pub quantity: Option<f64>,
}

/// A flat price for a whole line unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinePrice<LineItemId> {
    /// The priced line
    pub line_item_id: LineItemId,
    /// Price per unit
    #[cfg_attr(feature = "serde", serde(default))]
    pub unit_price: Option<f64>,
    /// Overrides the lot's currency for this line
    #[cfg_attr(feature = "serde", serde(default))]
    pub currency: Option<String>,
}

/// A line priced by its components, with an optional manual fallback.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentLine<LineItemId> {
    /// The priced line
    pub line_item_id: LineItemId,
    /// Per-component prices
    #[cfg_attr(feature = "serde", serde(default))]
    pub components: Vec<ComponentPrice>,
    /// A whole-unit price used when the components do not add up to anything
    #[cfg_attr(feature = "serde", serde(default))]
    pub manual_price: Option<f64>,
    /// Overrides the lot's currency for this line
    #[cfg_attr(feature = "serde", serde(default))]
    pub currency: Option<String>,
}

/// An offer as submitted by a buyer, before normalization.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum RawOffer<LineItemId> {
    /// A single price for everything in scope
    TakeAll {
        /// The lot-wide total
        total: f64,
    },
    /// A flat unit price per line
    PerLine {
        /// The line prices
        lines: Vec<LinePrice<LineItemId>>,
        /// An optional lot-wide total offered alongside the line prices
        #[cfg_attr(feature = "serde", serde(default))]
        take_all_total: Option<f64>,
    },
    /// Unit prices built up from component prices
    PerComponent {
        /// The component-priced lines
        lines: Vec<ComponentLine<LineItemId>>,
        /// An optional lot-wide total offered alongside the line prices
        #[cfg_attr(feature = "serde", serde(default))]
        take_all_total: Option<f64>,
    },
}

/// A priced line in canonical form.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OfferLine<LineItemId> {
    /// The priced line
    pub line_item_id: LineItemId,
    /// Price per unit, never negative
    pub unit_price: f64,
    /// The line's quantity when the offer was made
    pub quantity: u32,
    /// The currency of `unit_price`
    pub currency: String,
}

impl<LineItemId> OfferLine<LineItemId> {
    /// The line's contribution to the offer total
    pub fn value(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// An offer in canonical form: unit economics per line plus an optional
/// take-all price.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedOffer<LineItemId> {
    /// Priced lines. Unpriced lines are absent rather than zero.
    pub lines: Vec<OfferLine<LineItemId>>,
    /// A lot-wide price, if the buyer gave one
    pub take_all_total: Option<f64>,
    /// The sum of all line contributions
    pub offer_total: f64,
}

impl<LineItemId> NormalizedOffer<LineItemId> {
    /// What the offer is worth as a whole: the take-all price if present,
    /// otherwise the sum of its lines.
    pub fn value(&self) -> f64 {
        self.take_all_total.unwrap_or(self.offer_total)
    }
}

/// A stored offer. There is at most one per (lot, buyer).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OfferRecord<OfferId, LotId, RoundId, BuyerId, LineItemId, DateTime> {
    /// The offer's id
    pub id: OfferId,
    /// The lot bid on
    pub lot_id: LotId,
    /// The round the offer was made in
    pub round_id: RoundId,
    /// The bidder
    pub buyer_id: BuyerId,
    /// The normalized prices
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub offer: NormalizedOffer<LineItemId>,
    /// When the offer was stored
    pub submitted_at: DateTime,
}

/// The buyer already has an offer on this lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("an offer already exists for this buyer on this lot")]
pub struct OfferConflict;
