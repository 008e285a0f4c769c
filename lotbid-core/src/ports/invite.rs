use super::InviteRecordOf;
use crate::models::InviteStatus;

/// Repository interface for invitations to bid.
pub trait InviteRepository: super::Repository {
    /// Invite buyers to a round, issuing each a fresh opaque token.
    ///
    /// Buyers who already hold an invite for the round are skipped without
    /// error; only newly created invites are returned.
    fn invite_buyers(
        &self,
        round_id: Self::RoundId,
        buyer_ids: Vec<Self::BuyerId>,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Vec<InviteRecordOf<Self>>, Self::Error>> + Send;

    /// An invite by its token.
    fn get_invite(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<InviteRecordOf<Self>>, Self::Error>> + Send;

    /// Every invite of a round, oldest first.
    fn list_invites(
        &self,
        round_id: Self::RoundId,
    ) -> impl Future<Output = Result<Vec<InviteRecordOf<Self>>, Self::Error>> + Send;

    /// Update an invite's status. Returns false if the token is unknown.
    fn set_invite_status(
        &self,
        token: &str,
        status: InviteStatus,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
