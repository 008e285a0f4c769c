mod common;

use common::TestApp;
use lotbid_core::{
    models::{LotStatus, NormalizedOffer, OfferLine, RoundScope},
    ports::{
        AllocationRepository, Application, LotRepository as _, OfferRepository as _,
        Optimizer as _, RoundRepository as _,
    },
};
use lotbid_sqlite::types::LineItemId;

fn line(line_item_id: LineItemId, unit_price: f64) -> OfferLine<LineItemId> {
    OfferLine {
        line_item_id,
        unit_price,
        quantity: 1,
        currency: "USD".to_string(),
    }
}

#[tokio::test]
async fn accepted_allocation_feeds_the_unsold_scope() -> anyhow::Result<()> {
    let app = TestApp::in_memory().await?;
    let db = app.database();
    let (lot_id, lines) = app.lot("Two servers and a switch", &[1, 1, 1]).await?;
    let round = db.ensure_current_round(lot_id, app.now()).await?.unwrap();

    let a = app.buyer("Acme Resale", &["server"]).await?;
    let b = app.buyer("Byte Brokers", &["server"]).await?;

    for (buyer, prices) in [(a, [100.0, 50.0]), (b, [90.0, 60.0])] {
        let offer_lines = vec![line(lines[0], prices[0]), line(lines[1], prices[1])];
        let offer_total = offer_lines.iter().map(OfferLine::value).sum();
        db.submit_offer(
            lot_id,
            round.id,
            buyer,
            NormalizedOffer {
                lines: offer_lines,
                take_all_total: None,
                offer_total,
            },
            app.now(),
        )
        .await?
        .unwrap();
    }

    let input = db.allocation_input(lot_id).await?.unwrap();
    assert_eq!(input.lines.len(), 3);
    assert_eq!(input.bids.len(), 4);

    let allocation = app.optimizer().allocate(&input, 3)?;
    assert_eq!(allocation.coverage.priced_lines, 2);
    assert_eq!(allocation.coverage.total_lines, 3);
    assert_eq!(allocation.lines[&lines[0]].winner.as_ref().unwrap().buyer_id, a);
    assert_eq!(allocation.lines[&lines[1]].winner.as_ref().unwrap().buyer_id, b);

    let winners = allocation
        .winners()
        .map(|(line_item_id, offer)| (*line_item_id, offer.buyer_id, offer.unit_price, offer.quantity))
        .collect::<Vec<_>>();

    let awards = db
        .record_awards(lot_id, Some(round.id), winners.clone(), app.now())
        .await?;
    assert_eq!(awards.len(), 2);
    assert_eq!(
        db.get_lot(lot_id).await?.map(|lot| lot.status),
        Some(LotStatus::Awarded)
    );

    // Accepting again after fulfilment has moved on changes nothing
    db.set_lot_status(lot_id, LotStatus::Sold).await?;
    let again = db
        .record_awards(lot_id, Some(round.id), winners, app.now())
        .await?;
    assert!(again.is_empty());
    assert_eq!(db.list_awards(lot_id).await?.len(), 2);
    assert_eq!(
        db.get_lot(lot_id).await?.map(|lot| lot.status),
        Some(LotStatus::Sold)
    );

    // Round two only offers the line nobody won
    let next = db.open_next_round(lot_id, None, app.now()).await?.unwrap();
    assert_eq!(next.scope, RoundScope::Unsold);
    let scope = db.current_scope(lot_id).await?;
    assert_eq!(scope.len(), 1);
    assert_eq!(scope[0].id, lines[2]);

    let input = db.allocation_input(lot_id).await?.unwrap();
    assert_eq!(input.lines.len(), 1);
    assert!(input.bids.is_empty());

    Ok(())
}

#[tokio::test]
async fn unknown_lot_has_no_allocation_input() -> anyhow::Result<()> {
    let app = TestApp::in_memory().await?;
    let missing = app.generate_lot_id();
    assert!(app.database().allocation_input(missing).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn take_all_prices_reach_the_optimizer() -> anyhow::Result<()> {
    let app = TestApp::in_memory().await?;
    let db = app.database();
    let (lot_id, _) = app.lot("Pallet of drives", &[40]).await?;
    let round = db.ensure_current_round(lot_id, app.now()).await?.unwrap();
    let buyer = app.buyer("Acme Resale", &["drives"]).await?;

    db.submit_offer(
        lot_id,
        round.id,
        buyer,
        NormalizedOffer {
            lines: Vec::new(),
            take_all_total: Some(1200.0),
            offer_total: 0.0,
        },
        app.now(),
    )
    .await?
    .unwrap();

    let input = db.allocation_input(lot_id).await?.unwrap();
    let allocation = app.optimizer().allocate(&input, 0)?;
    assert!(allocation.awards.is_empty());
    let best = allocation.best_take_all.unwrap();
    assert_eq!(best.buyer_id, buyer);
    assert_eq!(best.total, 1200.0);

    Ok(())
}
