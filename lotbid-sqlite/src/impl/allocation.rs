use crate::{
    Db,
    types::{AwardRow, LineBidRow, TakeAllRow},
};
use lotbid_core::{
    models::{AllocationFilter, AllocationInput},
    ports::{
        AllocationInputOf, AllocationRepository, AwardRecordOf, LotRepository as _,
        RoundRepository as _,
    },
};
use tracing::{Level, event};

impl AllocationRepository for Db {
    async fn allocation_input(
        &self,
        lot_id: Self::LotId,
    ) -> Result<Option<AllocationInputOf<Self>>, Self::Error> {
        if self.get_lot(lot_id).await?.is_none() {
            return Ok(None);
        }

        let lines = self
            .current_scope(lot_id)
            .await?
            .into_iter()
            .map(|line| (line.id, line.data.quantity))
            .collect();

        let bids = sqlx::query_as::<_, LineBidRow>(
            r#"
            select
                offer.buyer_id, offer_line.line_item_id, offer_line.unit_price,
                offer_line.quantity, offer.submitted_at
            from
                offer_line
            join
                offer
            on
                offer.id = offer_line.offer_id
            where
                offer.lot_id = $1
            order by
                offer.rowid, offer_line.position
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        let take_all = sqlx::query_as::<_, TakeAllRow>(
            r#"
            select
                buyer_id, take_all_total as total, submitted_at
            from
                offer
            where
                lot_id = $1
            and
                take_all_total is not null
            order by
                rowid
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        let input = AllocationInput {
            lines,
            bids,
            take_all,
        };
        Ok(Some(input.filtered(AllocationFilter::default())))
    }

    async fn record_awards(
        &self,
        lot_id: Self::LotId,
        round_id: Option<Self::RoundId>,
        awards: Vec<(Self::LineItemId, Self::BuyerId, f64, u32)>,
        as_of: Self::DateTime,
    ) -> Result<Vec<AwardRecordOf<Self>>, Self::Error> {
        if awards.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.writer.begin().await?;
        let mut created = Vec::new();

        for (line_item_id, buyer_id, unit_price, quantity) in awards {
            let row = sqlx::query_as::<_, AwardRow>(
                r#"
                insert into
                    award (line_item_id, lot_id, round_id, buyer_id, unit_price, quantity, awarded_at)
                values
                    ($1, $2, $3, $4, $5, $6, $7)
                on conflict
                    (line_item_id) do nothing
                returning
                    lot_id, line_item_id, round_id, buyer_id, unit_price, quantity, awarded_at
                "#,
            )
            .bind(line_item_id)
            .bind(lot_id)
            .bind(round_id)
            .bind(buyer_id)
            .bind(unit_price)
            .bind(quantity)
            .bind(as_of)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(row) = row {
                created.push(row.into());
            }
        }

        // A repeat acceptance must not pull a lot back from fulfilment
        if !created.is_empty() {
            sqlx::query("update lot set status = 'awarded' where id = $1")
                .bind(lot_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        event!(Level::INFO, lot_id = %lot_id, awarded = created.len(), "recorded awards");
        Ok(created)
    }

    async fn list_awards(&self, lot_id: Self::LotId) -> Result<Vec<AwardRecordOf<Self>>, Self::Error> {
        let rows = sqlx::query_as::<_, AwardRow>(
            r#"
            select
                award.lot_id, award.line_item_id, award.round_id, award.buyer_id,
                award.unit_price, award.quantity, award.awarded_at
            from
                award
            join
                line_item
            on
                line_item.id = award.line_item_id
            where
                award.lot_id = $1
            order by
                line_item.rowid
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
