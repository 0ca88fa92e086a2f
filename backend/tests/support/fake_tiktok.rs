//! In-process stand-in for the TikTok Business API.
//!
//! Every request is recorded. Responses are looked up by path; unknown paths
//! answer `404`.

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use pixel_onboarding::settings::TikTokConfig;
use serde_json::{Value, json};
use url::Url;
use zeroize::Zeroizing;

pub const APP_ID: &str = "app-fake";
pub const SECRET: &str = "secret-fake";
pub const REQUEST_ID: &str = "req-fake";
pub const TOKEN_PATH: &str = "/open_api/v1.3/oauth2/access_token/";
pub const ADVERTISERS_PATH: &str = "/open_api/v1.3/oauth2/advertiser/get/";
pub const PIXEL_CREATE_PATH: &str = "/open_api/v1.3/pixel/create/";
pub const PIXEL_LIST_PATH: &str = "/open_api/v1.3/pixel/list/";
pub const TRACK_PATH: &str = "/open_api/v1.3/event/track/";

/// One request as seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub access_token: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: Value,
    delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct Shared {
    responses: Arc<Mutex<HashMap<String, Canned>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Running fake server.
pub struct FakeTikTok {
    base_url: Url,
    shared: Shared,
    handle: ServerHandle,
}

/// Success envelope around `data`.
pub fn ok(data: Value) -> Value {
    json!({ "code": 0, "message": "OK", "request_id": REQUEST_ID, "data": data })
}

/// Rejection envelope.
pub fn rejected(code: i64, message: &str) -> Value {
    json!({ "code": code, "message": message, "request_id": REQUEST_ID, "data": {} })
}

impl FakeTikTok {
    /// Bind to an ephemeral port and serve on the current runtime.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake tiktok");
        let addr = listener.local_addr().expect("fake tiktok addr");
        let shared = Shared::default();
        let data = web::Data::new(shared.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(respond))
        })
        .workers(1)
        .listen(listener)
        .expect("listen")
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Self {
            base_url: Url::parse(&format!("http://{addr}")).expect("base url"),
            shared,
            handle,
        }
    }

    /// Start with a happy-path answer for every endpoint.
    pub fn with_defaults() -> Self {
        let fake = Self::start();
        fake.respond(
            TOKEN_PATH,
            ok(json!({ "access_token": "act.fake", "expires_in": 86_400 })),
        );
        fake.respond(
            ADVERTISERS_PATH,
            ok(json!({ "list": [
                { "advertiser_id": 7_001_234_567_u64, "advertiser_name": "Loja Exemplo" }
            ] })),
        );
        fake.respond(
            PIXEL_CREATE_PATH,
            ok(json!({ "pixel_id": 7_300_000_001_u64, "pixel_code": "C1FAKEPIXEL" })),
        );
        fake.respond(
            PIXEL_LIST_PATH,
            ok(json!({ "pixels": [
                { "pixel_id": "7300000001", "pixel_code": "C1FAKEPIXEL", "pixel_name": "Store pixel" }
            ] })),
        );
        fake.respond(TRACK_PATH, ok(json!({})));
        fake
    }

    /// Answer `path` with `200` and `body`.
    pub fn respond(&self, path: &str, body: Value) {
        self.respond_with(path, 200, body, None);
    }

    /// Answer `path` with an explicit status and optional delay.
    pub fn respond_with(&self, path: &str, status: u16, body: Value, delay: Option<Duration>) {
        self.shared
            .responses
            .lock()
            .expect("responses lock")
            .insert(
                path.to_owned(),
                Canned {
                    status,
                    body,
                    delay,
                },
            );
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().expect("requests lock").clone()
    }

    /// Requests received for `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Adapter configuration pointing at this fake.
    pub fn config(&self) -> TikTokConfig {
        TikTokConfig {
            app_id: APP_ID.to_owned(),
            secret: Zeroizing::new(SECRET.to_owned()),
            redirect_uri: Url::parse("https://shop.example/oauth/callback").expect("redirect"),
            api_base_url: self.base_url.clone(),
            auth_base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(5),
            test_event_code: Some("TEST123".to_owned()),
        }
    }

    /// Stop accepting connections.
    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn respond(req: HttpRequest, body: web::Bytes, shared: web::Data<Shared>) -> HttpResponse {
    shared
        .requests
        .lock()
        .expect("requests lock")
        .push(RecordedRequest {
            method: req.method().to_string(),
            path: req.path().to_owned(),
            query: req.query_string().to_owned(),
            access_token: req
                .headers()
                .get("Access-Token")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        });
    let canned = shared
        .responses
        .lock()
        .expect("responses lock")
        .get(req.path())
        .cloned();
    let Some(canned) = canned else {
        return HttpResponse::NotFound().finish();
    };
    if let Some(delay) = canned.delay {
        actix_web::rt::time::sleep(delay).await;
    }
    HttpResponse::build(StatusCode::from_u16(canned.status).expect("status")).json(canned.body)
}
