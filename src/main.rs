mod config;
mod error;
mod feed;
mod geo;
mod serde_helpers;
mod tracking;

#[cfg(test)]
mod test_utils;

use std::{env, sync::Arc};

use actix_web::{get, middleware::Logger, web, App, HttpResponse, HttpServer, Responder};
use serde_json::json;
use tokio::select;

use crate::{
    config::Settings,
    error::{TrackerError, TrackerResult},
    feed::client::FeedClient,
    tracking::{scheduler::Scheduler, store::StateStore},
};

#[derive(Clone)]
pub struct ContextData {
    route_id: String,
    store: Arc<StateStore>,
    scheduler: Arc<Scheduler<FeedClient>>,
}

#[get("/ok")]
async fn ok() -> TrackerResult<impl Responder> {
    Ok(HttpResponse::Ok().finish())
}

#[get("/vehicles")]
async fn get_vehicles(ctx: web::Data<ContextData>) -> TrackerResult<impl Responder> {
    let vehicles = ctx.store.read();
    Ok(HttpResponse::Ok().json(&*vehicles))
}

#[get("/vehicles/{vehicle_id}")]
async fn get_vehicle(
    params: web::Path<(String,)>,
    ctx: web::Data<ContextData>,
) -> TrackerResult<impl Responder> {
    let (vehicle_id,) = params.into_inner();

    let vehicles = ctx.store.read();
    let vehicle = vehicles
        .get(&vehicle_id)
        .ok_or_else(|| TrackerError::NotFound(format!("Vehicle {} is not active", vehicle_id)))?;

    Ok(HttpResponse::Ok().json(vehicle))
}

#[get("/status")]
async fn get_status(ctx: web::Data<ContextData>) -> TrackerResult<impl Responder> {
    let response = web::Json(json!({
        "routeId": ctx.route_id,
        "vehicles": ctx.store.read().len(),
        "committedAt": ctx.store.committed_at(),
        "scheduler": ctx.scheduler.stats(),
    }));
    Ok(response)
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(ok)
        .service(get_vehicles)
        .service(get_vehicle)
        .service(get_status);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::try_init().ok();

    log::debug!("Debug logging enabled");

    dotenvy::from_filename(".env").ok();

    let settings = Settings::from_env().map_err(TrackerError::from)?;

    let feed = FeedClient::from_settings(&settings).map_err(TrackerError::from)?;
    log::info!("Tracking route {} from {}", settings.route_id, feed.url());

    let store = Arc::new(match &settings.state_path {
        Some(path) => StateStore::open(path),
        None => {
            log::info!("STATE_PATH not set, state is kept in memory only");
            StateStore::in_memory()
        }
    });

    let scheduler = Arc::new(Scheduler::new(
        feed,
        store.clone(),
        settings.poll_interval,
        settings.max_trajectory_points,
    ));

    let ctx = ContextData {
        route_id: settings.route_id.clone(),
        store,
        scheduler: scheduler.clone(),
    };

    let reconciler = scheduler.run();

    let allow_origin = settings.allow_origin.clone();

    log::info!("Starting server at {}", settings.listen_address);

    let server = HttpServer::new(move || {
        let logger = Logger::default();

        let mut cors = actix_cors::Cors::default()
            .allowed_methods(vec!["GET"])
            .allowed_headers(vec!["accept"]);

        if let Some(allowed_origin) = &allow_origin {
            if allowed_origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(allowed_origin);
            }
        }

        App::new()
            .wrap(logger)
            .wrap(cors)
            .app_data(web::Data::new(ctx.clone()))
            .configure(routes)
    })
    .bind(&settings.listen_address)?
    .run();

    select! {
        res = server => {
            log::info!("Server stopped");
            res
        },
        _ = reconciler => {
            log::info!("Reconciliation loop stopped");
            Ok(())
        }
    }
}
