use crate::{
    Db,
    types::{LineItemRow, LotRow},
};
use lotbid_core::{
    models::{LineItemData, LotData, LotStatus},
    ports::{LineItemRecordOf, LotRecordOf, LotRepository},
};

impl LotRepository for Db {
    async fn create_lot(
        &self,
        lot_id: Self::LotId,
        data: LotData,
        as_of: Self::DateTime,
    ) -> Result<LotRecordOf<Self>, Self::Error> {
        sqlx::query_as::<_, LotRow>(
            r#"
            insert into
                lot (id, title, currency, status, created_at)
            values
                ($1, $2, $3, 'draft', $4)
            returning
                id, title, currency, status, created_at
            "#,
        )
        .bind(lot_id)
        .bind(data.title)
        .bind(data.currency)
        .bind(as_of)
        .fetch_one(&self.writer)
        .await?
        .try_into()
    }

    async fn get_lot(&self, lot_id: Self::LotId) -> Result<Option<LotRecordOf<Self>>, Self::Error> {
        sqlx::query_as::<_, LotRow>(
            r#"
            select
                id, title, currency, status, created_at
            from
                lot
            where
                id = $1
            "#,
        )
        .bind(lot_id)
        .fetch_optional(&self.reader)
        .await?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn set_lot_status(
        &self,
        lot_id: Self::LotId,
        status: LotStatus,
    ) -> Result<Option<LotRecordOf<Self>>, Self::Error> {
        sqlx::query_as::<_, LotRow>(
            r#"
            update
                lot
            set
                status = $2
            where
                id = $1
            returning
                id, title, currency, status, created_at
            "#,
        )
        .bind(lot_id)
        .bind(status.as_str())
        .fetch_optional(&self.writer)
        .await?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn add_line_items<T: Send + IntoIterator<Item = (Self::LineItemId, LineItemData)>>(
        &self,
        lot_id: Self::LotId,
        items: T,
    ) -> Result<Vec<LineItemRecordOf<Self>>, Self::Error>
    where
        T::IntoIter: Send,
    {
        let mut tx = self.writer.begin().await?;
        let mut created = Vec::new();
        for (line_item_id, data) in items {
            let row = sqlx::query_as::<_, LineItemRow>(
                r#"
                insert into
                    line_item (id, lot_id, quantity, model, description)
                values
                    ($1, $2, $3, $4, $5)
                returning
                    id, lot_id, quantity, model, description
                "#,
            )
            .bind(line_item_id)
            .bind(lot_id)
            .bind(data.quantity)
            .bind(data.model)
            .bind(data.description)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row.into());
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_line_items(
        &self,
        lot_id: Self::LotId,
    ) -> Result<Vec<LineItemRecordOf<Self>>, Self::Error> {
        let rows = sqlx::query_as::<_, LineItemRow>(
            r#"
            select
                id, lot_id, quantity, model, description
            from
                line_item
            where
                lot_id = $1
            order by
                rowid
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
