use crate::{Db, types::InviteRow};
use lotbid_core::{
    models::InviteStatus,
    ports::{InviteRecordOf, InviteRepository},
};

impl InviteRepository for Db {
    async fn invite_buyers(
        &self,
        round_id: Self::RoundId,
        buyer_ids: Vec<Self::BuyerId>,
        as_of: Self::DateTime,
    ) -> Result<Vec<InviteRecordOf<Self>>, Self::Error> {
        let mut tx = self.writer.begin().await?;
        let mut created = Vec::new();

        // Unknown buyers and buyers already invited to the round produce no row
        for buyer_id in buyer_ids {
            let row = sqlx::query_as::<_, InviteRow>(
                r#"
                insert into
                    invite (token, round_id, lot_id, buyer_id, status, created_at)
                select
                    $1, round.id, round.lot_id, $3, 'pending', $4
                from
                    round
                where
                    round.id = $2
                and
                    exists (select 1 from buyer where buyer.id = $3)
                on conflict
                    (round_id, buyer_id) do nothing
                returning
                    token, round_id, lot_id, buyer_id, status, created_at
                "#,
            )
            .bind(uuid::Uuid::new_v4().simple().to_string())
            .bind(round_id)
            .bind(buyer_id)
            .bind(as_of)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(row) = row {
                created.push(row.try_into()?);
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn get_invite(&self, token: &str) -> Result<Option<InviteRecordOf<Self>>, Self::Error> {
        sqlx::query_as::<_, InviteRow>(
            r#"
            select
                token, round_id, lot_id, buyer_id, status, created_at
            from
                invite
            where
                token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.reader)
        .await?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn list_invites(
        &self,
        round_id: Self::RoundId,
    ) -> Result<Vec<InviteRecordOf<Self>>, Self::Error> {
        sqlx::query_as::<_, InviteRow>(
            r#"
            select
                token, round_id, lot_id, buyer_id, status, created_at
            from
                invite
            where
                round_id = $1
            order by
                rowid
            "#,
        )
        .bind(round_id)
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
    }

    async fn set_invite_status(&self, token: &str, status: InviteStatus) -> Result<bool, Self::Error> {
        let result = sqlx::query("update invite set status = $2 where token = $1")
            .bind(token)
            .bind(status.as_str())
            .execute(&self.writer)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
