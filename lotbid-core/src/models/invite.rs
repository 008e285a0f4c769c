/// Where a buyer stands with respect to an invitation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum InviteStatus {
    /// Sent, not yet opened
    #[default]
    Pending,
    /// The buyer has opened the invite
    Viewed,
    /// The buyer has submitted an offer
    Submitted,
    /// The buyer declined to bid
    Declined,
}

labelled_enum!(InviteStatus, "invite status", {
    Pending => "pending",
    Viewed => "viewed",
    Submitted => "submitted",
    Declined => "declined",
});

/// A token granting one buyer access to bid in one round.
///
/// There is at most one invite per (round, buyer).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InviteRecord<RoundId, LotId, BuyerId, DateTime> {
    /// The opaque access token
    pub token: String,
    /// The round the invite belongs to
    pub round_id: RoundId,
    /// The round's lot
    pub lot_id: LotId,
    /// The invited buyer
    pub buyer_id: BuyerId,
    /// Current status
    pub status: InviteStatus,
    /// When the invite was issued
    pub created_at: DateTime,
}
