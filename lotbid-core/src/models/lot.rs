/// The lifecycle of a lot.
///
/// Only the round manager and the fulfilment flow move a lot between states;
/// the bidding engine itself only ever moves a lot to `Awarded`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum LotStatus {
    /// Being assembled, not yet visible to buyers
    #[default]
    Draft,
    /// Accepting offers
    Open,
    /// An allocation has been accepted
    Awarded,
    /// Awaiting purchase orders from the winners
    SaleInProgress,
    /// Purchase orders received and being fulfilled
    OrderProcessing,
    /// Fully sold
    Sold,
    /// Withdrawn
    Closed,
}

labelled_enum!(LotStatus, "lot status", {
    Draft => "draft",
    Open => "open",
    Awarded => "awarded",
    SaleInProgress => "sale_in_progress",
    OrderProcessing => "order_processing",
    Sold => "sold",
    Closed => "closed",
});

/// The write-once description of a lot
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LotData {
    /// A human-readable title, also the primary source of ranking tokens
    pub title: String,
    /// ISO currency code offers are priced in unless a line overrides it
    pub currency: String,
}

/// A batch of equipment for sale.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LotRecord<LotId, DateTime> {
    /// The lot's id
    pub id: LotId,
    /// Title and currency
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: LotData,
    /// The lot's current status
    pub status: LotStatus,
    /// When the lot was created
    pub created_at: DateTime,
}

/// The descriptive part of a line item. The engine treats everything but the
/// quantity as opaque.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineItemData {
    /// How many units this line sells
    pub quantity: u32,
    /// Manufacturer model, if known
    #[cfg_attr(feature = "serde", serde(default))]
    pub model: Option<String>,
    /// Free-form specification text
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

/// One sellable unit or group within a lot. Immutable once created.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineItemRecord<LineItemId, LotId> {
    /// The line item's id
    pub id: LineItemId,
    /// The owning lot
    pub lot_id: LotId,
    /// Quantity and descriptive fields
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: LineItemData,
}
