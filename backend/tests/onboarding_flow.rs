//! The onboarding wizard driven over HTTP against the fake ads platform.

mod support;

use std::sync::Arc;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use mockable::{Clock, DefaultClock};
use pixel_onboarding::Trace;
use pixel_onboarding::domain::AdsGateway;
use pixel_onboarding::domain::ports::{AccessGate, AdsApi, CredentialStorage};
use pixel_onboarding::domain::workflow::{
    OnboardingWorkflow, StageName, WorkflowOptions, WorkflowPorts,
};
use pixel_onboarding::inbound::http::json_config;
use pixel_onboarding::inbound::http::oauth_callback::oauth_callback;
use pixel_onboarding::inbound::http::onboarding::{
    acknowledge, authorize, create_pixel, dismiss_notice, get_onboarding, reload_advertisers, reset,
    select_advertiser, select_pixel, send_test_event, verify_access,
};
use pixel_onboarding::inbound::http::state::HttpState;
use pixel_onboarding::inbound::http::track_event::track_event;
use pixel_onboarding::inbound::http::verify_email::verify_email;
use pixel_onboarding::middleware::TRACE_ID_HEADER;
use pixel_onboarding::outbound::access_gate::AllowlistAccessGate;
use pixel_onboarding::outbound::tiktok::TikTokHttpApi;
use pixel_onboarding::test_support::temp_credential_storage;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use support::fake_tiktok::{
    ADVERTISERS_PATH, FakeTikTok, PIXEL_CREATE_PATH, TOKEN_PATH, TRACK_PATH, ok, rejected,
};

const POST_LOGIN_PATH: &str = "/onboarding";

fn workflow(
    fake: &FakeTikTok,
    storage: Arc<dyn CredentialStorage>,
    options: WorkflowOptions,
) -> (Arc<OnboardingWorkflow>, HttpState) {
    let api: Arc<dyn AdsApi> = Arc::new(TikTokHttpApi::new(&fake.config()).expect("client"));
    let gate: Arc<dyn AccessGate> =
        Arc::new(AllowlistAccessGate::new(["@shop.example"]).expect("allowlist"));
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let workflow = Arc::new(OnboardingWorkflow::new(
        WorkflowPorts {
            ads_api: api.clone(),
            credential_storage: storage,
            access_gate: gate.clone(),
        },
        clock.clone(),
        options,
    ));
    let state = HttpState::new(
        workflow.clone(),
        AdsGateway::new(api, clock),
        gate,
        POST_LOGIN_PATH,
    );
    (workflow, state)
}

async fn app(
    state: HttpState,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .app_data(json_config())
            .wrap(Trace)
            .service(
                web::scope("/api")
                    .service(verify_email)
                    .service(track_event)
                    .service(
                        web::scope("/onboarding")
                            .service(get_onboarding)
                            .service(verify_access)
                            .service(authorize)
                            .service(reload_advertisers)
                            .service(select_advertiser)
                            .service(create_pixel)
                            .service(select_pixel)
                            .service(send_test_event)
                            .service(acknowledge)
                            .service(reset)
                            .service(dismiss_notice),
                    ),
            )
            .service(oauth_callback),
    )
    .await
}

async fn json_call(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    req: test::TestRequest,
) -> (StatusCode, Value) {
    let res = test::call_service(app, req.to_request()).await;
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
    let status = res.status();
    (status, test::read_body_json(res).await)
}

fn post(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(body)
}

async fn log_in(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
) -> StatusCode {
    let (_, body) = json_call(
        app,
        post("/api/onboarding/access", json!({ "email": "owner@shop.example" })),
    )
    .await;
    assert_eq!(body["success"], true);
    let (_, body) = json_call(app, test::TestRequest::get().uri("/api/onboarding/authorize")).await;
    let url = url::Url::parse(body["data"]["url"].as_str().expect("url")).expect("parse url");
    let state = url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("state");
    let res = test::call_service(
        app,
        test::TestRequest::get()
            .uri(&format!(
                "/oauth/callback?auth_code=code-1&ttclid=click-1&state={state}"
            ))
            .to_request(),
    )
    .await;
    assert_eq!(
        res.headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some(POST_LOGIN_PATH)
    );
    res.status()
}

#[actix_web::test]
async fn checkout_integration_completes_against_the_platform() {
    let fake = FakeTikTok::with_defaults();
    let (_dir, storage) = temp_credential_storage();
    let (_, state) = workflow(
        &fake,
        Arc::new(storage),
        WorkflowOptions::checkout_integration(),
    );
    let app = app(state).await;

    assert_eq!(log_in(&app).await, StatusCode::SEE_OTHER);
    assert_eq!(fake.requests_to(TOKEN_PATH).len(), 1);

    let (_, body) = json_call(&app, test::TestRequest::get().uri("/api/onboarding")).await;
    assert_eq!(body["data"]["stage"], "selecting_pixel");
    assert_eq!(body["data"]["advertisers"][0]["advertiserId"], "7001234567");
    let external_id = body["data"]["externalId"].as_str().expect("external id").to_owned();

    let (status, body) = json_call(
        &app,
        post(
            "/api/onboarding/advertiser",
            json!({ "advertiserId": "7001234567" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pixels"][0]["pixelCode"], "C1FAKEPIXEL");

    let (status, body) = json_call(
        &app,
        post("/api/onboarding/pixel", json!({ "pixelName": "Loja pixel" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stage"], "pixel_ready");
    assert_eq!(body["data"]["pixel"]["pixelName"], "Loja pixel");
    assert_eq!(fake.requests_to(PIXEL_CREATE_PATH)[0].body["pixel_name"], "Loja pixel");

    let (status, body) = json_call(
        &app,
        post(
            "/api/onboarding/event",
            json!({
                "email": "buyer@example.com",
                "productName": "Online course",
                "productPrice": 97.0,
                "currency": "BRL"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["eventSent"], true);
    let event = &fake.requests_to(TRACK_PATH)[0].body["data"][0];
    assert_eq!(event["ad"]["callback"], "click-1");
    assert_eq!(
        event["user"]["external_id"],
        hex::encode(Sha256::digest(external_id.as_bytes()))
    );

    let (status, body) = json_call(
        &app,
        test::TestRequest::post().uri("/api/onboarding/acknowledge"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["step"], 5);
    fake.stop().await;
}

#[actix_web::test]
async fn stored_credential_resumes_after_restart() {
    let fake = FakeTikTok::with_defaults();
    let (dir, storage) = temp_credential_storage();
    let (_, state) = workflow(&fake, Arc::new(storage), WorkflowOptions::pixel_generator());
    let app = app(state).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/oauth/callback?auth_code=code-1")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let reopened = pixel_onboarding::outbound::credential_storage::FileCredentialStorage::open(
        dir.path(),
    )
    .expect("reopen storage");
    let (restarted, _) = workflow(&fake, Arc::new(reopened), WorkflowOptions::pixel_generator());
    let view = restarted.initialize().await.expect("initialize");

    assert_eq!(view.stage, StageName::SelectingPixel);
    assert_eq!(view.advertisers.len(), 1);
    assert_eq!(fake.requests_to(TOKEN_PATH).len(), 1);
    fake.stop().await;
}

#[actix_web::test]
async fn rejected_pixel_creation_is_reported_and_retryable() {
    let fake = FakeTikTok::with_defaults();
    fake.respond(PIXEL_CREATE_PATH, rejected(40002, "Pixel name already exists"));
    let (_dir, storage) = temp_credential_storage();
    let (_, state) = workflow(&fake, Arc::new(storage), WorkflowOptions::pixel_generator());
    let app = app(state).await;
    test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/oauth/callback?auth_code=code-1")
            .to_request(),
    )
    .await;
    json_call(
        &app,
        post(
            "/api/onboarding/advertiser",
            json!({ "advertiserId": "7001234567" }),
        ),
    )
    .await;

    let (status, body) = json_call(&app, post("/api/onboarding/pixel", json!({}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "upstream_failure");
    assert_eq!(body["error"], "Pixel name already exists");
    let (_, body) = json_call(&app, test::TestRequest::get().uri("/api/onboarding")).await;
    assert_eq!(body["data"]["stage"], "selecting_pixel");
    assert_eq!(body["data"]["controls"]["canCreatePixel"], true);
    fake.stop().await;
}

#[actix_web::test]
async fn failed_advertiser_listing_is_recovered_by_a_reload() {
    let fake = FakeTikTok::with_defaults();
    fake.respond_with(ADVERTISERS_PATH, 502, json!({ "error": "bad gateway" }), None);
    let (_dir, storage) = temp_credential_storage();
    let (_, state) = workflow(&fake, Arc::new(storage), WorkflowOptions::pixel_generator());
    let app = app(state).await;
    test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/oauth/callback?auth_code=code-1")
            .to_request(),
    )
    .await;
    let (_, body) = json_call(&app, test::TestRequest::get().uri("/api/onboarding")).await;
    assert_eq!(body["data"]["stage"], "selecting_pixel");
    assert_eq!(body["data"]["notice"]["level"], "error");

    fake.respond(
        ADVERTISERS_PATH,
        ok(json!({ "list": [{ "advertiser_id": "7001234567", "advertiser_name": "Loja Exemplo" }] })),
    );
    let (status, body) = json_call(
        &app,
        test::TestRequest::post().uri("/api/onboarding/advertisers/reload"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["advertisers"][0]["advertiserId"], "7001234567");
    assert!(body["data"]["notice"].is_null());
    assert_eq!(fake.requests_to(ADVERTISERS_PATH).len(), 2);
    fake.stop().await;
}

#[actix_web::test]
async fn stateless_endpoints_share_the_platform_client() {
    let fake = FakeTikTok::with_defaults();
    let (_dir, storage) = temp_credential_storage();
    let (_, state) = workflow(&fake, Arc::new(storage), WorkflowOptions::default());
    let app = app(state).await;

    let (status, body) = json_call(
        &app,
        post("/api/verify-email", json!({ "email": "guest@other.example" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = json_call(
        &app,
        post(
            "/api/track-event",
            json!({
                "accessToken": "act.manual",
                "pixelCode": "C1FAKEPIXEL",
                "externalId": "4b0c6b6e-64f5-4d9e-9d3e-0c5f5cbb8c11",
                "productName": "Online course",
                "productPrice": 10.5,
                "currency": "usd"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["requestId"], "req-fake");
    let recorded = &fake.requests_to(TRACK_PATH)[0];
    assert_eq!(recorded.access_token.as_deref(), Some("act.manual"));
    assert_eq!(recorded.body["data"][0]["properties"]["currency"], "USD");
    fake.stop().await;
}
