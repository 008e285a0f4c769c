use super::Role;
use headers::{Authorization, authorization::Bearer};
use lotbid_core::ports::Application;
use lotbid_optimizer::BestOfferOptimizer;
use lotbid_sqlite::{
    Db,
    types::{BuyerId, DateTime, LineItemId, LotId},
};

#[derive(Clone)]
pub struct TestApp(pub Db);

impl TestApp {
    fn role(&self, context: &Authorization<Bearer>) -> Option<Role> {
        context.0.token().parse().ok()
    }
}

impl Application for TestApp {
    type Context = Authorization<Bearer>;
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

    async fn can_manage(&self, context: &Self::Context) -> bool {
        self.role(context).is_some_and(Role::can_manage)
    }

    async fn can_view_buyers(&self, context: &Self::Context) -> bool {
        self.role(context).is_some_and(Role::can_view_buyers)
    }
}
