use crate::{
    Db,
    types::{OfferId, OfferRow},
    unique_violation,
};
use lotbid_core::{
    models::{NormalizedOffer, OfferConflict, OfferRecord},
    ports::{OfferRecordOf, OfferRepository},
};
use tracing::{Level, event};

impl OfferRepository for Db {
    async fn submit_offer(
        &self,
        lot_id: Self::LotId,
        round_id: Self::RoundId,
        buyer_id: Self::BuyerId,
        offer: NormalizedOffer<Self::LineItemId>,
        as_of: Self::DateTime,
    ) -> Result<Result<OfferRecordOf<Self>, OfferConflict>, Self::Error> {
        let offer_id = OfferId::random();
        let mut tx = self.writer.begin().await?;

        let inserted = sqlx::query(
            r#"
            insert into
                offer (id, lot_id, round_id, buyer_id, take_all_total, offer_total, submitted_at)
            values
                ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(offer_id)
        .bind(lot_id)
        .bind(round_id)
        .bind(buyer_id)
        .bind(offer.take_all_total)
        .bind(offer.offer_total)
        .bind(as_of)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            return match unique_violation(&err) {
                Some(_) => {
                    event!(Level::DEBUG, lot_id = %lot_id, buyer_id = %buyer_id, "duplicate offer rejected");
                    Ok(Err(OfferConflict))
                }
                None => Err(err),
            };
        }

        for (position, line) in offer.lines.iter().enumerate() {
            sqlx::query(
                r#"
                insert into
                    offer_line (offer_id, line_item_id, position, unit_price, quantity, currency)
                values
                    ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(offer_id)
            .bind(line.line_item_id)
            .bind(position as i64)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(&line.currency)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            update
                invite
            set
                status = 'submitted'
            where
                round_id = $1
            and
                buyer_id = $2
            "#,
        )
        .bind(round_id)
        .bind(buyer_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Ok(OfferRecord {
            id: offer_id,
            lot_id,
            round_id,
            buyer_id,
            offer,
            submitted_at: as_of,
        }))
    }

    async fn get_offer(
        &self,
        lot_id: Self::LotId,
        buyer_id: Self::BuyerId,
    ) -> Result<Option<OfferRecordOf<Self>>, Self::Error> {
        let row = sqlx::query_as::<_, OfferRow>(
            r#"
            select
                offer.id, offer.lot_id, offer.round_id, offer.buyer_id,
                offer.take_all_total, offer.offer_total, offer.submitted_at,
                (
                    select
                        json_group_array(
                            json_object(
                                'line_item_id', line_item_id,
                                'unit_price', unit_price,
                                'quantity', quantity,
                                'currency', currency
                            )
                        )
                    from
                        (select * from offer_line where offer_id = offer.id order by position)
                ) as lines
            from
                offer
            where
                offer.lot_id = $1
            and
                offer.buyer_id = $2
            "#,
        )
        .bind(lot_id)
        .bind(buyer_id)
        .fetch_optional(&self.reader)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_offers(
        &self,
        lot_id: Self::LotId,
    ) -> Result<Vec<OfferRecordOf<Self>>, Self::Error> {
        let rows = sqlx::query_as::<_, OfferRow>(
            r#"
            select
                offer.id, offer.lot_id, offer.round_id, offer.buyer_id,
                offer.take_all_total, offer.offer_total, offer.submitted_at,
                (
                    select
                        json_group_array(
                            json_object(
                                'line_item_id', line_item_id,
                                'unit_price', unit_price,
                                'quantity', quantity,
                                'currency', currency
                            )
                        )
                    from
                        (select * from offer_line where offer_id = offer.id order by position)
                ) as lines
            from
                offer
            where
                offer.lot_id = $1
            order by
                offer.submitted_at, offer.rowid
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
