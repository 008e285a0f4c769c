mod common;

use common::TestApp;
use lotbid_core::{
    models::{InviteStatus, NormalizedOffer, OfferConflict, OfferLine},
    ports::{Application, InviteRepository, OfferRepository, RoundRepository as _},
};
use lotbid_sqlite::types::{BuyerId, LineItemId};

fn offer(lines: &[(LineItemId, f64, u32)], take_all_total: Option<f64>) -> NormalizedOffer<LineItemId> {
    let lines = lines
        .iter()
        .map(|&(line_item_id, unit_price, quantity)| OfferLine {
            line_item_id,
            unit_price,
            quantity,
            currency: "USD".to_string(),
        })
        .collect::<Vec<_>>();
    let offer_total = lines.iter().map(OfferLine::value).sum();
    NormalizedOffer {
        lines,
        take_all_total,
        offer_total,
    }
}

#[tokio::test]
async fn invites_are_issued_once_per_buyer_and_round() -> anyhow::Result<()> {
    let app = TestApp::in_memory().await?;
    let db = app.database();
    let (lot_id, _) = app.lot("Dell servers", &[1]).await?;
    let round = db.ensure_current_round(lot_id, app.now()).await?.unwrap();

    let a = app.buyer("Acme Resale", &["dell"]).await?;
    let b = app.buyer("Byte Brokers", &["hp"]).await?;
    let stranger = BuyerId::random();

    let invites = db
        .invite_buyers(round.id, vec![a, b, a, stranger], app.now())
        .await?;
    assert_eq!(invites.len(), 2);
    assert!(invites.iter().all(|invite| invite.status == InviteStatus::Pending));
    assert!(invites.iter().all(|invite| invite.lot_id == lot_id));
    assert_ne!(invites[0].token, invites[1].token);

    let again = db.invite_buyers(round.id, vec![a, b], app.now()).await?;
    assert!(again.is_empty());
    assert_eq!(db.list_invites(round.id).await?.len(), 2);

    let token = &invites[0].token;
    assert!(db.set_invite_status(token, InviteStatus::Viewed).await?);
    assert_eq!(
        db.get_invite(token).await?.map(|invite| invite.status),
        Some(InviteStatus::Viewed)
    );
    assert!(!db.set_invite_status("no-such-token", InviteStatus::Declined).await?);
    assert!(db.get_invite("no-such-token").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn one_offer_per_buyer_per_lot() -> anyhow::Result<()> {
    let app = TestApp::in_memory().await?;
    let db = app.database();
    let (lot_id, lines) = app.lot("HP blades", &[2, 3]).await?;
    let round = db.ensure_current_round(lot_id, app.now()).await?.unwrap();
    let buyer = app.buyer("Acme Resale", &["hp"]).await?;
    let invite = db
        .invite_buyers(round.id, vec![buyer], app.now())
        .await?
        .remove(0);

    let stored = db
        .submit_offer(
            lot_id,
            round.id,
            buyer,
            offer(&[(lines[1], 40.0, 3), (lines[0], 25.5, 2)], Some(150.0)),
            app.now(),
        )
        .await?
        .unwrap();
    assert_eq!(stored.offer.offer_total, 171.0);

    let duplicate = db
        .submit_offer(
            lot_id,
            round.id,
            buyer,
            offer(&[(lines[0], 99.0, 2)], None),
            app.now(),
        )
        .await?;
    assert_eq!(duplicate.map(|record| record.id), Err(OfferConflict));

    // The stored offer is untouched and its line order preserved
    let fetched = db.get_offer(lot_id, buyer).await?.unwrap();
    assert_eq!(fetched.id, stored.id);
    assert_eq!(fetched.offer.take_all_total, Some(150.0));
    let fetched_lines = fetched
        .offer
        .lines
        .iter()
        .map(|line| (line.line_item_id, line.unit_price, line.quantity))
        .collect::<Vec<_>>();
    assert_eq!(fetched_lines, vec![(lines[1], 40.0, 3), (lines[0], 25.5, 2)]);

    assert_eq!(
        db.get_invite(&invite.token).await?.map(|invite| invite.status),
        Some(InviteStatus::Submitted)
    );
    assert_eq!(db.list_offers(lot_id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn take_all_only_offer_has_no_lines() -> anyhow::Result<()> {
    let app = TestApp::in_memory().await?;
    let db = app.database();
    let (lot_id, _) = app.lot("Mixed pallet", &[5]).await?;
    let round = db.ensure_current_round(lot_id, app.now()).await?.unwrap();
    let buyer = app.buyer("Acme Resale", &["pallet"]).await?;

    db.submit_offer(lot_id, round.id, buyer, offer(&[], Some(900.0)), app.now())
        .await?
        .unwrap();

    let fetched = db.get_offer(lot_id, buyer).await?.unwrap();
    assert!(fetched.offer.lines.is_empty());
    assert_eq!(fetched.offer.value(), 900.0);

    Ok(())
}
