mod collection;

use actix_cors::Cors;
use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;

use crate::model::{Ingredient, Recipe};
use crate::AppState;

pub async fn run_server(state: AppState) -> crate::Result<()> {
    let state = web::Data::new(state);

    HttpServer::new({
        let state = state.clone();
        move || {
            App::new()
                .wrap(Logger::default())
                .wrap(Cors::permissive())
                .app_data(state.clone())
                .app_data(json_config())
                .app_data(path_config())
                .app_data(query_config())
                .configure(config_routes)
        }
    })
    .bind(state.config.api.listen)?
    .run()
    .await
    .map_err(From::from)
}

pub(crate) fn config_routes(conf: &mut web::ServiceConfig) {
    conf.service(web::resource("/").route(web::get().to(status)));
    collection::config_routes::<Recipe>(conf);
    collection::config_routes::<Ingredient>(conf);
}

pub(crate) fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}

pub(crate) fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(path_error_handler)
}

pub(crate) fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    crate::error::invalid_request(err).into()
}

fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    crate::error::invalid_request(err).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    crate::error::invalid_request(err).into()
}

async fn status(state: web::Data<AppState>) -> crate::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "recipes": state.recipes.len()?,
        "ingredients": state.ingredients.len()?,
        "tagline": "Everything in its place.",
    })))
}
