//! Application implementation with JWT-based authorization.

use headers::{Authorization, authorization::Bearer};
use jwt_simple::{
    claims::JWTClaims,
    prelude::{HS256Key, MACLike},
};
use lotbid_core::ports::Application;
use lotbid_optimizer::BestOfferOptimizer;
use lotbid_sqlite::{
    Db,
    types::{BuyerId, DateTime, LineItemId, LotId},
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace nibbles distinguishing the entity an id was minted for. Each
/// starts with the `10` variant bits.
const LOT_TAG: u64 = 0x9;
const LINE_ITEM_TAG: u64 = 0xa;
const BUYER_TAG: u64 = 0xb;

/// A version 8 UUID whose high bits are the current unix time, so ids sort
/// by creation, followed by an entity tag and 56 random bits.
fn time_ordered_id(now: time::OffsetDateTime, tag: u64) -> Uuid {
    let rng56 = rand::rng().next_u64() >> 8;

    // The timestamp is split (48, 12, 4) around the version and variant bits
    let now = now.unix_timestamp() as u64;
    let now48 = 0xffff_ffff_ffff_0000 & now;
    let now12 = (0xfff0 & now) >> 4;
    let now04 = (0x000f & now) << 56;

    let hi = 0x0000_0000_0000_8000 | now48 | now12;
    let lo = (tag << 60) | now04 | rng56;
    Uuid::from_u64_pair(hi, lo)
}

/// HS256 signing refuses keys shorter than 96 bits.
pub const MIN_SECRET_BYTES: usize = 12;

/// Build the JWT key from the shared secret, rejecting secrets too short to
/// sign or verify anything.
pub fn signing_key(secret: &str) -> anyhow::Result<HS256Key> {
    anyhow::ensure!(
        secret.len() >= MIN_SECRET_BYTES,
        "the JWT secret must be at least {MIN_SECRET_BYTES} bytes, got {}",
        secret.len()
    );
    Ok(HS256Key::from_bytes(secret.as_bytes()))
}

/// The demo application: SQLite storage, the best-offer optimizer and
/// HS256-signed JWTs for authorization.
#[derive(Clone)]
pub struct DemoApp {
    /// Database connection for persistent storage
    pub db: Db,
    /// HMAC key for JWT token verification
    pub key: HS256Key,
}

impl DemoApp {
    /// Extract and verify JWT claims from the authorization header.
    fn claims(&self, context: &Authorization<Bearer>) -> Option<JWTClaims<CustomJWTClaims>> {
        let token = context.0.token();
        self.key.verify_token::<CustomJWTClaims>(token, None).ok()
    }
}

impl Application for DemoApp {
    type Context = Authorization<Bearer>;
    type Repository = Db;
    type Optimizer = BestOfferOptimizer;

    fn database(&self) -> &Self::Repository {
        &self.db
    }

    fn optimizer(&self) -> Self::Optimizer {
        BestOfferOptimizer
    }

    fn now(&self) -> DateTime {
        time::OffsetDateTime::now_utc().into()
    }

    fn generate_lot_id(&self) -> LotId {
        time_ordered_id(time::OffsetDateTime::now_utc(), LOT_TAG).into()
    }

    fn generate_line_item_id(&self) -> LineItemId {
        time_ordered_id(time::OffsetDateTime::now_utc(), LINE_ITEM_TAG).into()
    }

    fn generate_buyer_id(&self) -> BuyerId {
        time_ordered_id(time::OffsetDateTime::now_utc(), BUYER_TAG).into()
    }

    async fn can_manage(&self, context: &Self::Context) -> bool {
        // managing requires an `admin: true` custom claim
        self.claims(context)
            .map(|claims| claims.custom.admin)
            .unwrap_or(false)
    }

    async fn can_view_buyers(&self, context: &Self::Context) -> bool {
        // anybody with a valid JWT can browse the directory
        self.claims(context).is_some()
    }
}

/// Custom claims structure for JWT tokens.
#[derive(Serialize, Deserialize)]
pub struct CustomJWTClaims {
    /// Indicates whether the token holder has admin privileges.
    #[serde(default)]
    pub admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jwt_simple::prelude::{Claims, Duration};
    use lotbid_sqlite::config::SqliteConfig;

    async fn app() -> DemoApp {
        DemoApp {
            db: Db::open(&SqliteConfig::default()).await.unwrap(),
            key: signing_key("a sufficiently long test secret").unwrap(),
        }
    }

    fn bearer(app: &DemoApp, admin: bool) -> Authorization<Bearer> {
        let claims = Claims::with_custom_claims(CustomJWTClaims { admin }, Duration::from_hours(1));
        let token = app.key.authenticate(claims).unwrap();
        Authorization::bearer(&token).unwrap()
    }

    #[test]
    fn ids_carry_version_variant_and_tag() {
        let now = time::OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let id = time_ordered_id(now, BUYER_TAG);

        assert_eq!(id.get_version_num(), 8);
        assert_eq!(id.get_variant(), uuid::Variant::RFC4122);

        let (hi, lo) = id.as_u64_pair();
        let secs = (hi & 0xffff_ffff_ffff_0000) | ((hi & 0x0fff) << 4) | ((lo >> 56) & 0xf);
        assert_eq!(secs, 1_700_000_000);
        assert_eq!(lo >> 60, BUYER_TAG);
    }

    #[test]
    fn later_ids_sort_after_earlier_ones() {
        let earlier = time::OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let later = earlier + time::Duration::seconds(20);
        assert!(time_ordered_id(earlier, LOT_TAG) < time_ordered_id(later, LOT_TAG));
    }

    #[tokio::test]
    async fn admin_claim_grants_management() {
        let app = app().await;

        assert!(app.can_manage(&bearer(&app, true)).await);
        assert!(!app.can_manage(&bearer(&app, false)).await);
        assert!(app.can_view_buyers(&bearer(&app, false)).await);
    }

    #[tokio::test]
    async fn tokens_signed_with_another_key_are_rejected() {
        let app = app().await;
        let other = DemoApp {
            db: app.db.clone(),
            key: signing_key("an entirely different test secret").unwrap(),
        };

        let forged = bearer(&other, true);
        assert!(other.can_manage(&forged).await);
        assert!(!app.can_manage(&forged).await);
        assert!(!app.can_view_buyers(&forged).await);
    }

    #[test]
    fn short_secrets_are_refused() {
        assert!(signing_key("test secret").is_err());
        assert!(signing_key("twelve bytes").is_ok());
    }

    #[tokio::test]
    async fn tokens_need_a_valid_signature() {
        let app = app().await;
        let token = bearer(&app, true);
        assert!(app.can_manage(&token).await);

        // Change the first character of the signature segment
        let raw = token.0.token();
        let (signed, signature) = raw.split_at(raw.rfind('.').unwrap() + 1);
        let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
        let tampered =
            Authorization::bearer(&format!("{signed}{flipped}{}", &signature[1..])).unwrap();
        assert!(!app.can_manage(&tampered).await);
        assert!(!app.can_view_buyers(&tampered).await);
    }
}
