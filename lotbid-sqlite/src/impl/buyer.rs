use crate::{Db, types::BuyerRow};
use lotbid_core::{
    models::{BuyerData, RankedBuyer, Set, rank},
    ports::{BuyerRecordOf, BuyerRepository},
};
use tracing::{Level, event};

impl BuyerRepository for Db {
    async fn upsert_buyer(
        &self,
        buyer_id: Self::BuyerId,
        data: BuyerData<Self::DateTime>,
    ) -> Result<BuyerRecordOf<Self>, Self::Error> {
        let row = sqlx::query_as::<_, BuyerRow>(
            r#"
            insert into
                buyer (
                    id, name, tags, credit_ok, reliability_score,
                    lots_won_count, po_lots_count, pos_received_count,
                    avg_hours_to_po, last_win_at, last_po_at, award_conversion_rate
                )
            values
                ($1, $2, json($3), $4, $5, $6, $7, $8, $9, $10, $11, $12)
            on conflict (id) do update set
                name = excluded.name,
                tags = excluded.tags,
                credit_ok = excluded.credit_ok,
                reliability_score = excluded.reliability_score,
                lots_won_count = excluded.lots_won_count,
                po_lots_count = excluded.po_lots_count,
                pos_received_count = excluded.pos_received_count,
                avg_hours_to_po = excluded.avg_hours_to_po,
                last_win_at = excluded.last_win_at,
                last_po_at = excluded.last_po_at,
                award_conversion_rate = excluded.award_conversion_rate
            returning
                id, name, tags, credit_ok, reliability_score,
                lots_won_count, po_lots_count, pos_received_count,
                avg_hours_to_po, last_win_at, last_po_at, award_conversion_rate
            "#,
        )
        .bind(buyer_id)
        .bind(data.name)
        .bind(sqlx::types::Json(data.tags))
        .bind(data.credit_ok)
        .bind(data.reliability_score)
        .bind(data.lots_won_count)
        .bind(data.po_lots_count)
        .bind(data.pos_received_count)
        .bind(data.avg_hours_to_po)
        .bind(data.last_win_at)
        .bind(data.last_po_at)
        .bind(data.award_conversion_rate)
        .fetch_one(&self.writer)
        .await?;
        Ok(row.into())
    }

    async fn get_buyer(
        &self,
        buyer_id: Self::BuyerId,
    ) -> Result<Option<BuyerRecordOf<Self>>, Self::Error> {
        let row = sqlx::query_as::<_, BuyerRow>(
            r#"
            select
                id, name, tags, credit_ok, reliability_score,
                lots_won_count, po_lots_count, pos_received_count,
                avg_hours_to_po, last_win_at, last_po_at, award_conversion_rate
            from
                buyer
            where
                id = $1
            "#,
        )
        .bind(buyer_id)
        .fetch_optional(&self.reader)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_buyers(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<BuyerRecordOf<Self>>, Self::Error> {
        let rows = sqlx::query_as::<_, BuyerRow>(
            r#"
            select
                id, name, tags, credit_ok, reliability_score,
                lots_won_count, po_lots_count, pos_received_count,
                avg_hours_to_po, last_win_at, last_po_at, award_conversion_rate
            from
                buyer
            order by
                id
            limit $1 offset $2
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn rank_buyers(
        &self,
        tokens: &Set<String>,
        now: Self::DateTime,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RankedBuyer<Self::BuyerId, Self::DateTime>>, Self::Error> {
        // Scoring needs every profile, so the whole directory is read and
        // ranked in memory before paginating.
        let rows = sqlx::query_as::<_, BuyerRow>(
            r#"
            select
                id, name, tags, credit_ok, reliability_score,
                lots_won_count, po_lots_count, pos_received_count,
                avg_hours_to_po, last_win_at, last_po_at, award_conversion_rate
            from
                buyer
            "#,
        )
        .fetch_all(&self.reader)
        .await?;

        let candidates = rows.len();
        let ranked = rank(rows.into_iter().map(Into::into), tokens, now.into());
        event!(
            Level::DEBUG,
            candidates,
            matched = ranked.len(),
            tokens = tokens.len(),
            "ranked buyers"
        );

        Ok(ranked.into_iter().skip(offset).take(limit).collect())
    }
}
