mod common;

use bfx_rest::core::errors::{ErrorKind, ExchangeError};
use bfx_rest::core::types::Instrument;
use bfx_rest::exchanges::bitfinex::params::*;
use bfx_rest::exchanges::bitfinex::types::*;
use common::{client, MockRest};
use reqwest::Method;
use serde_json::{json, Value};

fn order_payload(id: i64) -> Value {
    json!([
        id, null, 1_612_873_117_123_i64, "tBTCUSD", 1_612_873_117_000_i64, 1_612_873_117_000_i64,
        0.5, 0.5, "EXCHANGE LIMIT", null, null, null, 0, "ACTIVE", null, null, 45000, 0, 0, 0,
        null, null, null, 0, 0, null, null, null, "API>BFX", null, null, null
    ])
}

fn funding_offer_payload() -> Value {
    json!([
        41_238_747_i64, "fUSD", 1_575_026_670_000_i64, 1_575_026_670_000_i64, 1000, 1000,
        "LIMIT", null, null, 0, "ACTIVE", null, null, null, 0.0002, 2, false, 0, null, false
    ])
}

#[tokio::test]
async fn wallets_are_posted_to_the_authenticated_host() {
    let client = client(MockRest::new().respond(json!([
        ["exchange", "BTC", 1.5, 0, 1.2, "Exchange 0.1 BTC for USD", {"reason": "TRADE"}],
        ["margin", "USD", 100, 0.01]
    ])));

    let wallets = client.wallets().await.unwrap();
    assert_eq!(wallets.len(), 2);
    assert_eq!(wallets[0].available_balance, Some(1.2));
    assert_eq!(wallets[0].last_change_details, Some(json!({"reason": "TRADE"})));
    assert_eq!(wallets[1].available_balance, None);

    let call = &client.rest().calls()[0];
    assert_eq!(call.method, Method::POST);
    assert_eq!(call.path, "/v2/auth/r/wallets");
    assert!(call.authenticated);
}

#[tokio::test]
async fn auto_renew_status_is_optional() {
    let client = client(
        MockRest::new()
            .respond(json!(null))
            .respond(json!(["USD", 2, 0.0002, 1000])),
    );
    let params = AutoRenewStatusParams::default();

    assert_eq!(client.auto_renew_status(&params).await.unwrap(), None);

    let status = client.auto_renew_status(&params).await.unwrap().unwrap();
    assert_eq!(status.currency.as_deref(), Some("USD"));
    assert_eq!(status.period, Some(2));

    let calls = client.rest().calls();
    assert_eq!(calls[0].path, "/v2/auth/r/funding/auto/status");
    assert_eq!(calls[0].body, Some(json!({"currency": "USD"})));
}

#[tokio::test]
async fn submit_order_carries_affiliate_code_and_decodes_notification() {
    let rest = MockRest::new().respond(json!([
        1_612_873_117_200_i64, "on-req", null, null, [order_payload(1), order_payload(2)],
        null, "SUCCESS", "Submitting 2 orders."
    ]));
    let client = client(rest).with_affiliate_code("ref-code");

    let params = SubmitOrderParams::limit(Instrument::pair("BTCUSD"), 0.5, 45000.0).cid(7);
    let notification = client.submit_order(&params).await.unwrap();

    assert!(notification.is_success());
    assert_eq!(notification.notification_type.as_deref(), Some("on-req"));
    let orders = notification.data.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[1].id, Some(2));
    assert_eq!(orders[0].is_buy(), Some(true));

    let body = client.rest().calls()[0].body.clone().unwrap();
    assert_eq!(body["symbol"], "tBTCUSD");
    assert_eq!(body["amount"], "0.5");
    assert_eq!(body["meta"]["aff_code"], "ref-code");
}

#[tokio::test]
async fn cancel_order_identifiers_are_mutually_exclusive() {
    let client = client(MockRest::new());

    let params: CancelOrderParams = serde_json::from_value(json!({
        "id": 1,
        "cid": 7,
        "cid_date": "2024-01-31"
    }))
    .unwrap();

    let err = client.cancel_order(&params).await.unwrap_err();
    assert!(err.is_input_validation());
    assert_eq!(err.call(), Some("cancel_order"));
    assert_eq!(err.input().unwrap()["cid"], 7);
    assert!(client.rest().calls().is_empty());
}

#[tokio::test]
async fn funding_offer_round_trip() {
    let client = client(
        MockRest::new()
            .respond(json!([
                1_575_026_670_100_i64, "fon-req", null, null, funding_offer_payload(), null,
                "SUCCESS", "Submitting funding offer."
            ]))
            .respond(json!([funding_offer_payload()])),
    );

    let params = SubmitFundingOfferParams::limit(Instrument::currency("USD"), 1000.0, 0.0002, 2);
    let notification = client.submit_funding_offer(&params).await.unwrap();
    let offer = notification.data.unwrap();
    assert_eq!(offer.currency(), Some("USD"));
    assert_eq!(offer.daily_percent(), Some(0.02));
    assert_eq!(offer.annual_percent(), Some(7.3));

    let offers = client
        .funding_offers(&FundingOffersParams::active().instrument(Instrument::currency("USD")))
        .await
        .unwrap();
    assert_eq!(offers[0].id, Some(41_238_747));

    let calls = client.rest().calls();
    assert_eq!(calls[0].path, "/v2/auth/w/funding/offer/submit");
    assert_eq!(calls[1].path, "/v2/auth/r/funding/offers/fUSD");
}

#[tokio::test]
async fn upstream_errors_keep_call_context() {
    let raw = json!(["error", 10100, "apikey: invalid"]);
    let client = client(MockRest::new().fail(ExchangeError::ApiError {
        code: 10100,
        message: "apikey: invalid".to_string(),
        raw: raw.clone(),
    }));

    let err = client
        .ledgers(&LedgersParams::currency("USD").category(28))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(err.call(), Some("ledgers"));
    assert_eq!(err.raw_response(), Some(&raw));

    let input = err.input().unwrap();
    assert_eq!(input["method"], "POST");
    assert_eq!(input["path"], "/v2/auth/r/ledgers/USD/hist");
    assert_eq!(input["body"]["category"], 28);
    assert!(matches!(err.root(), ExchangeError::ApiError { code: 10100, .. }));
}

#[tokio::test]
async fn key_permissions_map_by_scope() {
    let client = client(MockRest::new().respond(json!([
        ["account", 1, 0],
        ["orders", 1, 1],
        ["wallets", 1, 0]
    ])));

    let permissions = client.key_permissions().await.unwrap();
    assert!(permissions.can_read("orders"));
    assert!(permissions.can_write("orders"));
    assert!(!permissions.can_write("wallets"));
    assert_eq!(permissions.get("withdraw"), None);
}

#[tokio::test]
async fn history_limit_over_max_never_reaches_transport() {
    let client = client(MockRest::new());
    let params = FundingCreditsParams::history(QueryWindow::new().limit(501));

    let err = client.funding_credits(&params).await.unwrap_err();
    assert!(err.is_input_validation());
    assert_eq!(err.call(), Some("funding_credits"));
    assert_eq!(err.input().unwrap()["history"]["limit"], 501);
    assert!(client.rest().calls().is_empty());
}
