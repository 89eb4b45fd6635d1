//! End-to-end command flows against an in-memory store and a fake back office.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use tally_core::{
    Customer, DiscountDescriptor, DiscountMode, DiscountValue, ManualDiscount, Money,
    PaymentMethod, TaxRate, Variant, WALK_IN_PLACEHOLDER_ID,
};
use tally_db::repository::draft::DRAFTS_KEY;
use tally_db::{Database, DbConfig};

use crate::commands::{cart, catalog, checkout, config, customer, discount, draft, scan};
use crate::error::ErrorCode;
use crate::state::{CartState, CatalogState, ConfigState, CustomerState, DbState, TaxState};
use crate::upstream::{
    BackOffice, CheckoutPayload, CheckoutReceipt, PaymentEntry, ProductDiscount, UpstreamError,
};

const BARCODE: &str = "5901234123457";
const LINE_ID: &str = "p-1:v-1";

#[derive(Default)]
struct FakeBackOffice {
    catalog_down: AtomicBool,
    customers_down: AtomicBool,
    sales_down: AtomicBool,
    submitted: Mutex<Vec<CheckoutPayload>>,
}

impl FakeBackOffice {
    fn down(flag: &AtomicBool) -> Result<(), UpstreamError> {
        if flag.load(Ordering::SeqCst) {
            return Err(UpstreamError::UnexpectedResponse(
                "503 Service Unavailable".into(),
            ));
        }
        Ok(())
    }

    fn submitted(&self) -> Vec<CheckoutPayload> {
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl BackOffice for FakeBackOffice {
    async fn fetch_variants(&self) -> Result<Vec<Variant>, UpstreamError> {
        Self::down(&self.catalog_down)?;
        Ok(vec![widget()])
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, UpstreamError> {
        Self::down(&self.customers_down)?;
        Ok(vec![
            person("c-1", "Ada Obi", false),
            person("c-walk", "Walk-in", true),
        ])
    }

    async fn fetch_discount_links(&self) -> Result<Vec<ProductDiscount>, UpstreamError> {
        Self::down(&self.catalog_down)?;
        Ok(vec![ProductDiscount {
            product_id: "p-1".into(),
            discount: DiscountDescriptor {
                id: "d-10".into(),
                name: "Ten off".into(),
                value: DiscountValue::percentage_bps(1000),
                starts_at: Utc::now() - Duration::days(1),
                ends_at: Utc::now() + Duration::days(1),
            },
        }])
    }

    async fn submit_checkout(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<CheckoutReceipt, UpstreamError> {
        Self::down(&self.sales_down)?;
        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());
        Ok(CheckoutReceipt {
            sale_id: "sale-1".into(),
            receipt_number: Some("R-0001".into()),
        })
    }
}

fn widget() -> Variant {
    Variant {
        variant_id: "v-1".into(),
        sku: "WID-1".into(),
        barcode: Some(BARCODE.into()),
        product_id: "p-1".into(),
        product_name: "Widget".into(),
        brand: None,
        category: None,
        selling_price_cents: 1000,
        cost_price_cents: None,
        quantity: 5,
        threshold: 2,
        taxable: true,
        images: vec![],
    }
}

fn person(id: &str, name: &str, is_walk_in: bool) -> Customer {
    Customer {
        id: id.into(),
        name: name.into(),
        email: None,
        phone: None,
        is_walk_in,
    }
}

struct Session {
    config: ConfigState,
    db: DbState,
    cart: CartState,
    catalog: CatalogState,
    customers: CustomerState,
    tax: TaxState,
}

async fn session(back_office: &FakeBackOffice) -> Session {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let session = Session {
        config: ConfigState::default(),
        db: DbState::new(db),
        cart: CartState::new(),
        catalog: CatalogState::new(),
        customers: CustomerState::new(),
        tax: TaxState::new(TaxRate::from_bps(750)),
    };
    catalog::refresh_catalog(back_office, &session.catalog).await;
    session
}

fn scan_widget(s: &Session) -> Result<scan::ScanResponse, crate::error::ApiError> {
    scan::scan_code(&s.catalog, &s.cart, &s.tax, BARCODE)
}

#[tokio::test]
async fn test_scan_discount_and_stock_ceiling() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;

    scan_widget(&s).unwrap();
    let toggled = discount::toggle_line_discount(&s.cart, &s.tax, LINE_ID).unwrap();
    assert!(toggled.enabled);

    let totals = toggled.cart.totals;
    assert_eq!(totals.subtotal, Money::from_cents(1000));
    assert_eq!(totals.tax, Money::from_cents(75));
    assert_eq!(totals.discount, Money::from_cents(100));
    assert_eq!(totals.final_total, Money::from_cents(975));

    for _ in 0..3 {
        scan_widget(&s).unwrap();
    }
    assert_eq!(cart::get_cart(&s.cart, &s.tax).lines[0].quantity, 4);

    let err = cart::update_quantity(&s.cart, &s.tax, LINE_ID, 6).unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert_eq!(cart::get_cart(&s.cart, &s.tax).lines[0].quantity, 4);

    let ok = cart::update_quantity(&s.cart, &s.tax, LINE_ID, 5).unwrap();
    assert_eq!(ok.cart.totals.total_quantity, 5);

    let err = scan_widget(&s).unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);
}

#[tokio::test]
async fn test_unknown_code_and_manual_entry() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;

    let err = scan::scan_code(&s.catalog, &s.cart, &s.tax, "0000000").unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let entry = scan::submit_manual_entry(
        &s.config,
        &s.catalog,
        &s.cart,
        &s.tax,
        "5901234123457, 12 0000000 wid-1",
    )
    .unwrap();
    assert_eq!(entry.summary.added, 2);
    assert_eq!(entry.summary.failed, 1);
    assert_eq!(entry.summary.rejected_tokens, vec!["12".to_string()]);
    assert_eq!(entry.cart.lines[0].quantity, 2);

    let err =
        scan::submit_manual_entry(&s.config, &s.catalog, &s.cart, &s.tax, "   ").unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_manual_discount_replaces_auto() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;
    scan_widget(&s).unwrap();
    discount::toggle_line_discount(&s.cart, &s.tax, LINE_ID).unwrap();

    let manual =
        discount::set_manual_discount(&s.cart, &s.tax, DiscountValue::fixed_cents(250)).unwrap();
    assert_eq!(manual.totals.discount, Money::from_cents(250));
    assert_eq!(manual.discount_toggles, vec![LINE_ID.to_string()]);

    let auto = discount::use_auto_discounts(&s.cart, &s.tax);
    assert_eq!(auto.totals.discount, Money::from_cents(100));
}

#[tokio::test]
async fn test_draft_round_trip() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;
    customer::refresh_customers(&bo, &s.customers).await;

    scan_widget(&s).unwrap();
    scan_widget(&s).unwrap();
    discount::toggle_line_discount(&s.cart, &s.tax, LINE_ID).unwrap();
    customer::select_customer(&s.customers, "c-1").unwrap();

    let saved = draft::save_draft(&s.db, &s.cart, &s.customers, &s.tax)
        .await
        .unwrap();
    assert_eq!(saved.customer.id, "c-1");
    assert!(cart::get_cart(&s.cart, &s.tax).lines.is_empty());
    assert_eq!(customer::list_customers(&s.customers).selected.id, "c-walk");
    assert_eq!(draft::list_drafts(&s.db).await.unwrap().len(), 1);

    let restored = draft::restore_draft(&s.db, &s.cart, &s.customers, &s.tax, &saved.id)
        .await
        .unwrap();
    assert_eq!(restored.customer.id, "c-1");
    assert_eq!(restored.cart.lines[0].quantity, 2);
    assert_eq!(restored.cart.discount_toggles, vec![LINE_ID.to_string()]);
    assert!(draft::list_drafts(&s.db).await.unwrap().is_empty());

    let err = draft::restore_draft(&s.db, &s.cart, &s.customers, &s.tax, &saved.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_draft_keeps_manual_discount() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;
    scan_widget(&s).unwrap();

    let priced =
        discount::set_manual_discount(&s.cart, &s.tax, DiscountValue::fixed_cents(500)).unwrap();
    assert_eq!(priced.totals.final_total, Money::from_cents(575));

    let saved = draft::save_draft(&s.db, &s.cart, &s.customers, &s.tax)
        .await
        .unwrap();
    assert_eq!(saved.total_cents, 575);
    assert_eq!(
        cart::get_cart(&s.cart, &s.tax).discount.mode,
        DiscountMode::Auto
    );

    let restored = draft::restore_draft(&s.db, &s.cart, &s.customers, &s.tax, &saved.id)
        .await
        .unwrap();
    assert_eq!(restored.cart.totals.discount, Money::from_cents(500));
    assert_eq!(restored.cart.totals.final_total, Money::from_cents(575));
    assert_eq!(
        restored.cart.discount.mode,
        DiscountMode::Manual {
            discount: ManualDiscount::new(DiscountValue::fixed_cents(500))
        }
    );
}

#[tokio::test]
async fn test_empty_draft_restore_changes_nothing() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;
    customer::refresh_customers(&bo, &s.customers).await;

    let id = "550e8400-e29b-41d4-a716-446655440000";
    let stored = format!(
        r#"[{{"id":"{id}","customer":{{"id":"c-1","name":"Ada Obi","email":null,"phone":null}},"lines":[],"subtotalCents":0,"taxCents":0,"totalCents":0,"createdAt":"2026-01-05T10:00:00Z"}}]"#
    );
    s.db.inner().kv().put(DRAFTS_KEY, &stored).await.unwrap();

    scan_widget(&s).unwrap();
    customer::select_customer(&s.customers, "c-walk").unwrap();

    let err = draft::restore_draft(&s.db, &s.cart, &s.customers, &s.tax, id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DraftError);

    let drafts = draft::list_drafts(&s.db).await.unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, id);

    let live = cart::get_cart(&s.cart, &s.tax);
    assert_eq!(live.lines.len(), 1);
    assert_eq!(live.lines[0].line_id, LINE_ID);
    assert_eq!(customer::list_customers(&s.customers).selected.id, "c-walk");
}

#[tokio::test]
async fn test_empty_cart_cannot_be_parked() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;

    let err = draft::save_draft(&s.db, &s.cart, &s.customers, &s.tax)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CartError);
    assert!(!draft::delete_draft(&s.db, "550e8400-e29b-41d4-a716-446655440000")
        .await
        .unwrap());

    let err = draft::restore_draft(&s.db, &s.cart, &s.customers, &s.tax, "not-a-draft")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_walk_in_fallback_then_directory() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;

    bo.customers_down.store(true, Ordering::SeqCst);
    let down = customer::refresh_customers(&bo, &s.customers).await;
    assert!(down.notice.is_some());
    assert!(down.placeholder);
    assert_eq!(down.selected.id, WALK_IN_PLACEHOLDER_ID);

    let err = customer::select_customer(&s.customers, "c-1").unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    bo.customers_down.store(false, Ordering::SeqCst);
    let up = customer::refresh_customers(&bo, &s.customers).await;
    assert!(up.notice.is_none());
    assert!(!up.placeholder);
    assert_eq!(up.selected.id, "c-walk");
    assert_eq!(up.count, 2);

    let listed = customer::list_customers(&s.customers);
    assert_eq!(listed.customers[0].id, "c-walk");
}

#[tokio::test]
async fn test_checkout_success_resets_session() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;
    scan_widget(&s).unwrap();
    discount::toggle_line_discount(&s.cart, &s.tax, LINE_ID).unwrap();

    let payments = vec![PaymentEntry {
        method: PaymentMethod::Cash,
        amount: Money::from_cents(1000),
    }];
    let done = checkout::checkout(&bo, &s.cart, &s.customers, &s.tax, payments)
        .await
        .unwrap();

    assert_eq!(done.receipt.sale_id, "sale-1");
    assert_eq!(done.final_total, Money::from_cents(975));
    assert_eq!(done.change_due, Money::from_cents(25));
    assert!(cart::get_cart(&s.cart, &s.tax).lines.is_empty());

    let sent = bo.submitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].customer_id, None);
    assert!(sent[0].is_walk_in);
    assert_eq!(sent[0].lines[0].quantity, 1);
    assert_eq!(sent[0].discount.total, Money::from_cents(100));
}

#[tokio::test]
async fn test_checkout_failures_leave_cart() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;

    let cash = |cents| {
        vec![PaymentEntry {
            method: PaymentMethod::Cash,
            amount: Money::from_cents(cents),
        }]
    };

    let err = checkout::checkout(&bo, &s.cart, &s.customers, &s.tax, cash(100))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CartError);

    scan_widget(&s).unwrap();

    let err = checkout::checkout(&bo, &s.cart, &s.customers, &s.tax, cash(500))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentError);

    let err = checkout::checkout(&bo, &s.cart, &s.customers, &s.tax, vec![])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    bo.sales_down.store(true, Ordering::SeqCst);
    let err = checkout::checkout(&bo, &s.cart, &s.customers, &s.tax, cash(2000))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UpstreamError);
    assert_eq!(cart::get_cart(&s.cart, &s.tax).lines.len(), 1);
    assert!(bo.submitted().is_empty());
}

#[tokio::test]
async fn test_failed_catalog_refresh_keeps_snapshot() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;

    bo.catalog_down.store(true, Ordering::SeqCst);
    let refreshed = catalog::refresh_catalog(&bo, &s.catalog).await;
    assert!(refreshed.notice.is_some());
    assert!(refreshed.loaded);
    assert_eq!(refreshed.variants, 1);

    let found = catalog::search_catalog(&s.catalog, "widg");
    assert_eq!(found.len(), 1);
    assert!(found[0].discount.is_some());
    assert!(catalog::search_catalog(&s.catalog, "gadget").is_empty());
}

#[tokio::test]
async fn test_tax_rate_is_validated_and_persisted() {
    let bo = FakeBackOffice::default();
    let s = session(&bo).await;

    let set = config::set_tax_rate(&s.db, &s.tax, 5.0).await.unwrap();
    assert_eq!(set.bps, 500);
    assert_eq!(config::get_tax_rate(&s.tax).bps, 500);
    assert_eq!(
        s.db.inner().settings().tax_rate().await.unwrap(),
        Some(TaxRate::from_bps(500))
    );

    for bad in [-1.0, 150.0, f64::NAN] {
        let err = config::set_tax_rate(&s.db, &s.tax, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
    assert_eq!(config::get_tax_rate(&s.tax).bps, 500);
}
