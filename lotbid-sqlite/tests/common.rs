#![allow(dead_code)]

use lotbid_core::{
    models::{BuyerData, LineItemData, LotData},
    ports::{Application, BuyerRepository as _, LotRepository as _},
};
use lotbid_optimizer::BestOfferOptimizer;
use lotbid_sqlite::{
    Db,
    config::SqliteConfig,
    types::{BuyerId, DateTime, LineItemId, LotId},
};

pub struct TestApp(pub Db);

impl TestApp {
    pub async fn in_memory() -> anyhow::Result<Self> {
        Ok(Self(Db::open(&SqliteConfig::default()).await?))
    }

    /// A draft lot titled `title` with one line per quantity
    pub async fn lot(&self, title: &str, quantities: &[u32]) -> anyhow::Result<(LotId, Vec<LineItemId>)> {
        let db = self.database();
        let lot = db
            .create_lot(
                self.generate_lot_id(),
                LotData {
                    title: title.to_string(),
                    currency: "USD".to_string(),
                },
                self.now(),
            )
            .await?;

        let items = quantities
            .iter()
            .map(|&quantity| {
                (
                    self.generate_line_item_id(),
                    LineItemData {
                        quantity,
                        model: None,
                        description: None,
                    },
                )
            })
            .collect::<Vec<_>>();
        let lines = db.add_line_items(lot.id, items).await?;

        Ok((lot.id, lines.into_iter().map(|line| line.id).collect()))
    }

    /// A buyer with the given tags and no history
    pub async fn buyer(&self, name: &str, tags: &[&str]) -> anyhow::Result<BuyerId> {
        let buyer_id = self.generate_buyer_id();
        self.database()
            .upsert_buyer(
                buyer_id,
                BuyerData {
                    name: name.to_string(),
                    tags: tags.iter().map(|tag| tag.to_string()).collect(),
                    credit_ok: false,
                    reliability_score: None,
                    lots_won_count: 0,
                    po_lots_count: 0,
                    pos_received_count: 0,
                    avg_hours_to_po: None,
                    last_win_at: None,
                    last_po_at: None,
                    award_conversion_rate: None,
                },
            )
            .await?;
        Ok(buyer_id)
    }
}

impl Application for TestApp {
    type Context = ();
    type Repository = Db;
    type Optimizer = BestOfferOptimizer;

    fn database(&self) -> &Self::Repository {
        &self.0
    }

    fn optimizer(&self) -> Self::Optimizer {
        BestOfferOptimizer
    }

    fn now(&self) -> DateTime {
        time::OffsetDateTime::now_utc().into()
    }

    fn generate_lot_id(&self) -> LotId {
        LotId::random()
    }

    fn generate_line_item_id(&self) -> LineItemId {
        LineItemId::random()
    }

    fn generate_buyer_id(&self) -> BuyerId {
        BuyerId::random()
    }

    async fn can_manage(&self, _context: &Self::Context) -> bool {
        true
    }

    async fn can_view_buyers(&self, _context: &Self::Context) -> bool {
        true
    }
}
