//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use pixel_onboarding::Trace;
#[cfg(debug_assertions)]
use pixel_onboarding::doc::ApiDoc;
use pixel_onboarding::inbound::http::health::{HealthState, live, ready};
use pixel_onboarding::inbound::http::json_config;
use pixel_onboarding::inbound::http::oauth_callback::oauth_callback;
use pixel_onboarding::inbound::http::onboarding::{
    acknowledge, authorize, create_pixel, dismiss_notice, get_onboarding, reload_advertisers, reset,
    select_advertiser, select_pixel, send_test_event, verify_access,
};
use pixel_onboarding::inbound::http::state::HttpState;
use pixel_onboarding::inbound::http::track_event::track_event;
use pixel_onboarding::inbound::http::verify_email::verify_email;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    let onboarding = web::scope("/onboarding")
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
        .service(dismiss_notice);

    let api = web::scope("/api")
        .service(verify_email)
        .service(track_event)
        .service(onboarding);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .wrap(Trace)
        .service(api)
        .service(oauth_callback)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        bind_addr,
        http_state,
    } = config;
    let http_state = web::Data::new(http_state);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
