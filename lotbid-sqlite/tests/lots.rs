mod common;

use common::TestApp;
use lotbid_core::{
    models::LotStatus,
    ports::{Application, LotRepository},
};

#[tokio::test]
async fn lots_start_as_drafts_with_ordered_lines() -> anyhow::Result<()> {
    let app = TestApp::in_memory().await?;
    let db = app.database();
    let (lot_id, lines) = app.lot("Dell R740 x 12", &[4, 0, 8]).await?;

    let lot = db.get_lot(lot_id).await?.unwrap();
    assert_eq!(lot.status, LotStatus::Draft);
    assert_eq!(lot.data.currency, "USD");

    let stored = db.list_line_items(lot_id).await?;
    assert_eq!(stored.iter().map(|line| line.id).collect::<Vec<_>>(), lines);
    assert_eq!(
        stored.iter().map(|line| line.data.quantity).collect::<Vec<_>>(),
        vec![4, 0, 8]
    );

    let opened = db.set_lot_status(lot_id, LotStatus::Open).await?.unwrap();
    assert_eq!(opened.status, LotStatus::Open);
    assert!(
        db.set_lot_status(app.generate_lot_id(), LotStatus::Open)
            .await?
            .is_none()
    );

    Ok(())
}
