/// Which of a lot's line items a round considers biddable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum RoundScope {
    /// Every line item in the lot
    All,
    /// Only line items not already awarded in a prior round
    Unsold,
    /// An explicit list of line items attached to the round
    Custom,
}

labelled_enum!(RoundScope, "round scope", {
    All => "all",
    Unsold => "unsold",
    Custom => "custom",
});

impl RoundScope {
    /// The scope a freshly numbered round starts with: the first round offers
    /// everything, later rounds offer what is left.
    pub fn default_for(round_number: u32) -> Self {
        if round_number <= 1 {
            Self::All
        } else {
            Self::Unsold
        }
    }
}

/// The state of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum RoundStatus {
    /// Prepared but not accepting offers
    Draft,
    /// Accepting offers. At most one round per lot is live.
    Live,
    /// No longer accepting offers
    Closed,
}

labelled_enum!(RoundStatus, "round status", {
    Draft => "draft",
    Live => "live",
    Closed => "closed",
});

/// A bidding window scoped to a lot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundRecord<RoundId, LotId, DateTime> {
    /// The round's id
    pub id: RoundId,
    /// The lot being bid on
    pub lot_id: LotId,
    /// 1-based, strictly increasing per lot
    pub round_number: u32,
    /// Which line items are biddable
    pub scope: RoundScope,
    /// Draft, live or closed
    pub status: RoundStatus,
    /// When the round was created
    pub created_at: DateTime,
    /// Set exactly when `status` is closed
    pub closed_at: Option<DateTime>,
}

/// A partial update to a round. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundUpdate {
    /// A new scope
    #[cfg_attr(feature = "serde", serde(default))]
    pub scope: Option<RoundScope>,
    /// A new status. Closing stamps `closed_at`; anything else clears it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: Option<RoundStatus>,
}

/// A round could not be written because a uniqueness constraint on the
/// lot's rounds was violated by another writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoundConflict {
    /// Another round already holds this number for the lot
    #[error("round number {0} is already taken for this lot")]
    NumberTaken(u32),
    /// Another round for the lot is already live
    #[error("the lot already has a live round")]
    LiveRoundExists,
}
