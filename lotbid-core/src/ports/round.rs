use super::{LineItemRecordOf, RoundRecordOf};
use crate::models::{RoundConflict, RoundScope, RoundUpdate};
use tracing::{Level, event};

/// Repository interface for the per-lot round state machine.
///
/// Rounds move `draft → live → closed`. The backend must enforce two
/// uniqueness constraints and report their violation as [`RoundConflict`]
/// rather than as an error:
///
/// - no two rounds of a lot share a `round_number`
/// - at most one round of a lot is `live`
///
/// Those constraints are the only coordination primitive. Nothing caches the
/// current round; every caller re-derives it from storage.
pub trait RoundRepository: super::Repository {
    /// The live round of a lot, highest number first, if there is one.
    fn get_live_round(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<Option<RoundRecordOf<Self>>, Self::Error>> + Send;

    /// The round of a lot holding `round_number`, if there is one.
    fn get_round_by_number(
        &self,
        lot_id: Self::LotId,
        round_number: u32,
    ) -> impl Future<Output = Result<Option<RoundRecordOf<Self>>, Self::Error>> + Send;

    /// A round by id.
    fn get_round(
        &self,
        round_id: Self::RoundId,
    ) -> impl Future<Output = Result<Option<RoundRecordOf<Self>>, Self::Error>> + Send;

    /// All rounds of a lot, by ascending number.
    fn list_rounds(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<Vec<RoundRecordOf<Self>>, Self::Error>> + Send;

    /// The highest round number used for a lot, or 0 if it has none.
    fn max_round_number(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<u32, Self::Error>> + Send;

    /// Insert a live round with the given number and scope.
    ///
    /// # Returns
    ///
    /// - Ok(Ok(record)) if the round was inserted
    /// - Ok(Err(conflict)) if a uniqueness constraint rejected it
    /// - Err otherwise
    fn insert_round(
        &self,
        lot_id: Self::LotId,
        round_number: u32,
        scope: RoundScope,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Result<RoundRecordOf<Self>, RoundConflict>, Self::Error>> + Send;

    /// Close the lot's live round (if any) and open the next numbered round,
    /// atomically.
    ///
    /// `scope` defaults to [`RoundScope::default_for`] the new number. A
    /// concurrent writer taking the same number is reported as a conflict;
    /// unlike [`ensure_current_round`](Self::ensure_current_round), starting a
    /// new round is an explicit request, so the race is not healed silently.
    fn open_next_round(
        &self,
        lot_id: Self::LotId,
        scope: Option<RoundScope>,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Result<RoundRecordOf<Self>, RoundConflict>, Self::Error>> + Send;

    /// Patch a round's scope and/or status.
    ///
    /// Closing stamps `closed_at = as_of`; any other status clears it.
    ///
    /// # Returns
    ///
    /// - Ok(Ok(Some(record))) if successful
    /// - Ok(Ok(None)) if no such round exists
    /// - Ok(Err(conflict)) if making the round live would give the lot two live rounds
    /// - Err otherwise
    fn update_round(
        &self,
        round_id: Self::RoundId,
        update: RoundUpdate,
        as_of: Self::DateTime,
    ) -> impl Future<
        Output = Result<Result<Option<RoundRecordOf<Self>>, RoundConflict>, Self::Error>,
    > + Send;

    /// Replace the explicit line list of a `custom`-scope round.
    ///
    /// Returns false if no such round exists.
    fn set_round_lines(
        &self,
        round_id: Self::RoundId,
        line_item_ids: Vec<Self::LineItemId>,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// The line items biddable right now.
    ///
    /// This resolves the live round's scope: every line for `all`, lines
    /// without an award for `unsold`, and the round's explicit list for
    /// `custom` (every line if the list is empty). A lot without a live round
    /// is treated as scope `all`.
    fn current_scope(
        &self,
        lot_id: Self::LotId,
    ) -> impl Future<Output = Result<Vec<LineItemRecordOf<Self>>, Self::Error>> + Send;

    /// Return the lot's live round, creating round `max + 1` if there is none.
    ///
    /// Safe to call from any number of concurrent requests without external
    /// locking: if another caller inserts first, the uniqueness violation is
    /// resolved by [`resolve_round_race`](Self::resolve_round_race) and the
    /// winner's round is returned.
    ///
    /// The nested error is only returned if the conflicting round cannot be
    /// read back, which means it was removed in the meantime.
    fn ensure_current_round(
        &self,
        lot_id: Self::LotId,
        as_of: Self::DateTime,
    ) -> impl Future<Output = Result<Result<RoundRecordOf<Self>, RoundConflict>, Self::Error>> + Send
    {
        async move {
            if let Some(round) = self.get_live_round(lot_id.clone()).await? {
                return Ok(Ok(round));
            }

            let round_number = self.max_round_number(lot_id.clone()).await? + 1;
            let scope = RoundScope::default_for(round_number);

            match self
                .insert_round(lot_id.clone(), round_number, scope, as_of)
                .await?
            {
                Ok(round) => {
                    event!(Level::INFO, lot_id = %lot_id, round_number, "opened round");
                    Ok(Ok(round))
                }
                Err(conflict) => self.resolve_round_race(lot_id, conflict).await,
            }
        }
    }

    /// Re-read the round that won a creation race, by the key that conflicted.
    ///
    /// This runs exactly once per lost race and never retries the insert.
    fn resolve_round_race(
        &self,
        lot_id: Self::LotId,
        conflict: RoundConflict,
    ) -> impl Future<Output = Result<Result<RoundRecordOf<Self>, RoundConflict>, Self::Error>> + Send
    {
        async move {
            event!(Level::DEBUG, lot_id = %lot_id, %conflict, "lost round creation race");
            let winner = match conflict {
                RoundConflict::NumberTaken(round_number) => {
                    self.get_round_by_number(lot_id, round_number).await?
                }
                RoundConflict::LiveRoundExists => self.get_live_round(lot_id).await?,
            };
            Ok(winner.ok_or(conflict))
        }
    }
}
