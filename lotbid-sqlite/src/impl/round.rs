use crate::{
    Db,
    types::{LineItemRow, RoundId, RoundRow},
    unique_violation,
};
use lotbid_core::{
    models::{RoundConflict, RoundScope, RoundStatus, RoundUpdate},
    ports::{LineItemRecordOf, RoundRecordOf, RoundRepository},
};
use tracing::{Level, event};

/// Which uniqueness constraint rejected a round write. The number constraint
/// names `round_number` in its message; the live-round index does not.
fn round_conflict(message: &str, round_number: u32) -> RoundConflict {
    if message.contains("round_number") {
        RoundConflict::NumberTaken(round_number)
    } else {
        RoundConflict::LiveRoundExists
    }
}

// Lookups that decide a creation race read through the writer, so they
// observe whatever the losing insert collided with.
impl RoundRepository for Db {
    async fn get_live_round(
        &self,
        lot_id: Self::LotId,
    ) -> Result<Option<RoundRecordOf<Self>>, Self::Error> {
        sqlx::query_as::<_, RoundRow>(
            r#"
            select
                id, lot_id, round_number, scope, status, created_at, closed_at
            from
                round
            where
                lot_id = $1
            and
                status = 'live'
            order by
                round_number desc
            limit 1
            "#,
        )
        .bind(lot_id)
        .fetch_optional(&self.writer)
        .await?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn get_round_by_number(
        &self,
        lot_id: Self::LotId,
        round_number: u32,
    ) -> Result<Option<RoundRecordOf<Self>>, Self::Error> {
        sqlx::query_as::<_, RoundRow>(
            r#"
            select
                id, lot_id, round_number, scope, status, created_at, closed_at
            from
                round
            where
                lot_id = $1
            and
                round_number = $2
            "#,
        )
        .bind(lot_id)
        .bind(round_number)
        .fetch_optional(&self.writer)
        .await?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn get_round(
        &self,
        round_id: Self::RoundId,
    ) -> Result<Option<RoundRecordOf<Self>>, Self::Error> {
        sqlx::query_as::<_, RoundRow>(
            r#"
            select
                id, lot_id, round_number, scope, status, created_at, closed_at
            from
                round
            where
                id = $1
            "#,
        )
        .bind(round_id)
        .fetch_optional(&self.reader)
        .await?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn list_rounds(
        &self,
        lot_id: Self::LotId,
    ) -> Result<Vec<RoundRecordOf<Self>>, Self::Error> {
        sqlx::query_as::<_, RoundRow>(
            r#"
            select
                id, lot_id, round_number, scope, status, created_at, closed_at
            from
                round
            where
                lot_id = $1
            order by
                round_number
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
    }

    async fn max_round_number(&self, lot_id: Self::LotId) -> Result<u32, Self::Error> {
        sqlx::query_scalar::<_, u32>(
            r#"
            select
                coalesce(max(round_number), 0)
            from
                round
            where
                lot_id = $1
            "#,
        )
        .bind(lot_id)
        .fetch_one(&self.writer)
        .await
    }

    async fn insert_round(
        &self,
        lot_id: Self::LotId,
        round_number: u32,
        scope: RoundScope,
        as_of: Self::DateTime,
    ) -> Result<Result<RoundRecordOf<Self>, RoundConflict>, Self::Error> {
        let inserted = sqlx::query_as::<_, RoundRow>(
            r#"
            insert into
                round (id, lot_id, round_number, scope, status, created_at)
            values
                ($1, $2, $3, $4, 'live', $5)
            returning
                id, lot_id, round_number, scope, status, created_at, closed_at
            "#,
        )
        .bind(RoundId::random())
        .bind(lot_id)
        .bind(round_number)
        .bind(scope.as_str())
        .bind(as_of)
        .fetch_one(&self.writer)
        .await;

        match inserted {
            Ok(row) => Ok(Ok(row.try_into()?)),
            Err(err) => match unique_violation(&err) {
                Some(db_err) => Ok(Err(round_conflict(db_err.message(), round_number))),
                None => Err(err),
            },
        }
    }

    async fn open_next_round(
        &self,
        lot_id: Self::LotId,
        scope: Option<RoundScope>,
        as_of: Self::DateTime,
    ) -> Result<Result<RoundRecordOf<Self>, RoundConflict>, Self::Error> {
        let mut tx = self.writer.begin().await?;

        let closed = sqlx::query(
            r#"
            update
                round
            set
                status = 'closed',
                closed_at = $2
            where
                lot_id = $1
            and
                status = 'live'
            "#,
        )
        .bind(lot_id)
        .bind(as_of)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let round_number = sqlx::query_scalar::<_, u32>(
            r#"
            select
                coalesce(max(round_number), 0) + 1
            from
                round
            where
                lot_id = $1
            "#,
        )
        .bind(lot_id)
        .fetch_one(&mut *tx)
        .await?;
        let scope = scope.unwrap_or(RoundScope::default_for(round_number));

        let inserted = sqlx::query_as::<_, RoundRow>(
            r#"
            insert into
                round (id, lot_id, round_number, scope, status, created_at)
            values
                ($1, $2, $3, $4, 'live', $5)
            returning
                id, lot_id, round_number, scope, status, created_at, closed_at
            "#,
        )
        .bind(RoundId::random())
        .bind(lot_id)
        .bind(round_number)
        .bind(scope.as_str())
        .bind(as_of)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(err) => {
                return match unique_violation(&err) {
                    Some(db_err) => Ok(Err(round_conflict(db_err.message(), round_number))),
                    None => Err(err),
                };
            }
        };

        tx.commit().await?;
        event!(Level::INFO, lot_id = %lot_id, round_number, closed, "started next round");
        Ok(Ok(row.try_into()?))
    }

    async fn update_round(
        &self,
        round_id: Self::RoundId,
        update: RoundUpdate,
        as_of: Self::DateTime,
    ) -> Result<Result<Option<RoundRecordOf<Self>>, RoundConflict>, Self::Error> {
        let updated = sqlx::query_as::<_, RoundRow>(
            r#"
            update
                round
            set
                scope = coalesce($2, scope),
                status = coalesce($3, status),
                closed_at = case
                    when $3 is null then closed_at
                    when $3 = 'closed' then $4
                    else null
                end
            where
                id = $1
            returning
                id, lot_id, round_number, scope, status, created_at, closed_at
            "#,
        )
        .bind(round_id)
        .bind(update.scope.map(|scope| scope.as_str()))
        .bind(update.status.map(|status| status.as_str()))
        .bind(as_of)
        .fetch_optional(&self.writer)
        .await;

        match updated {
            Ok(row) => Ok(Ok(row.map(TryInto::try_into).transpose()?)),
            // Only the live-round index can reject an update
            Err(err) if unique_violation(&err).is_some() => Ok(Err(RoundConflict::LiveRoundExists)),
            Err(err) => Err(err),
        }
    }

    async fn set_round_lines(
        &self,
        round_id: Self::RoundId,
        line_item_ids: Vec<Self::LineItemId>,
    ) -> Result<bool, Self::Error> {
        let mut tx = self.writer.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>("select exists (select 1 from round where id = $1)")
            .bind(round_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Ok(false);
        }

        sqlx::query("delete from round_line where round_id = $1")
            .bind(round_id)
            .execute(&mut *tx)
            .await?;

        // Lines from other lots are skipped, as are repeats
        for (position, line_item_id) in line_item_ids.into_iter().enumerate() {
            sqlx::query(
                r#"
                insert into
                    round_line (round_id, line_item_id, position)
                select
                    $1, line_item.id, $3
                from
                    line_item
                where
                    line_item.id = $2
                and
                    line_item.lot_id = (select lot_id from round where id = $1)
                on conflict
                    do nothing
                "#,
            )
            .bind(round_id)
            .bind(line_item_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn current_scope(
        &self,
        lot_id: Self::LotId,
    ) -> Result<Vec<LineItemRecordOf<Self>>, Self::Error> {
        let rows = sqlx::query_as::<_, LineItemRow>(
            r#"
            with live as (
                select
                    id, scope
                from
                    round
                where
                    lot_id = $1
                and
                    status = $2
            )
            select
                line_item.id, line_item.lot_id, line_item.quantity, line_item.model, line_item.description
            from
                line_item
            where
                line_item.lot_id = $1
            and
                case coalesce((select scope from live), 'all')
                    when 'unsold' then not exists (
                        select 1 from award where award.line_item_id = line_item.id
                    )
                    when 'custom' then (
                        not exists (
                            select 1 from round_line where round_id = (select id from live)
                        )
                        or exists (
                            select 1 from round_line
                            where round_id = (select id from live)
                            and line_item_id = line_item.id
                        )
                    )
                    else 1
                end
            order by
                line_item.rowid
            "#,
        )
        .bind(lot_id)
        .bind(RoundStatus::Live.as_str())
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
