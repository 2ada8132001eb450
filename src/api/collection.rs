use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::model::{Entity, EntityId, Ingredient, Recipe};
use crate::store::FileStore;
use crate::AppState;

/// An entity exposed over HTTP under its own path.
pub trait Collection: Entity {
    const PATH: &'static str;

    fn store(state: &AppState) -> &FileStore<Self>;
}

impl Collection for Recipe {
    const PATH: &'static str = "/recipes";

    fn store(state: &AppState) -> &FileStore<Self> {
        &state.recipes
    }
}

impl Collection for Ingredient {
    const PATH: &'static str = "/ingredients";

    fn store(state: &AppState) -> &FileStore<Self> {
        &state.ingredients
    }
}

pub fn config_routes<E: Collection>(conf: &mut web::ServiceConfig) {
    conf.service(
        web::scope(E::PATH)
            .service(
                web::resource("")
                    .route(web::get().to(list_entities::<E>))
                    .route(web::post().to(create_entity::<E>))
                    .route(web::put().to(update_entity::<E>)),
            )
            .service(web::resource("/").route(web::get().to(search_entities::<E>)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_entity::<E>))
                    .route(web::delete().to(delete_entity::<E>)),
            ),
    );
}

#[derive(Deserialize)]
pub struct SearchQuery {
    name: String,
}

pub async fn get_entity<E: Collection>(
    state: web::Data<AppState>,
    web::Path((id,)): web::Path<(EntityId,)>,
) -> crate::Result<HttpResponse> {
    log::info!("GET {}/{}", E::PATH, id);
    match E::store(&state).get(id)? {
        Some(entity) => Ok(HttpResponse::Ok().json(entity)),
        None => Err(crate::error::entity_not_found(E::KIND, id)),
    }
}

pub async fn list_entities<E: Collection>(
    state: web::Data<AppState>,
) -> crate::Result<HttpResponse> {
    log::info!("GET {}", E::PATH);
    let entities = E::store(&state).list()?;
    Ok(HttpResponse::Ok().json(entities))
}

pub async fn search_entities<E: Collection>(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> crate::Result<HttpResponse> {
    log::info!("GET {}/?name={}", E::PATH, query.name);
    let entities = E::store(&state).search(&query.name)?;
    Ok(HttpResponse::Ok().json(entities))
}

pub async fn create_entity<E: Collection>(
    state: web::Data<AppState>,
    web::Json(draft): web::Json<E>,
) -> crate::Result<HttpResponse> {
    log::info!("POST {} {}", E::PATH, draft);
    let store = E::store(&state);

    if state.config.api.reject_duplicates {
        if let Some(existing) = store.find_duplicate(&draft)? {
            return Err(crate::error::duplicate_entity(E::KIND, existing.id()));
        }
    }

    let created = store.create(draft)?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn update_entity<E: Collection>(
    state: web::Data<AppState>,
    web::Json(entity): web::Json<E>,
) -> crate::Result<HttpResponse> {
    log::info!("PUT {} {}", E::PATH, entity);
    let id = entity.id();
    match E::store(&state).update(entity)? {
        Some(updated) => Ok(HttpResponse::Ok().json(updated)),
        None => Err(crate::error::entity_not_found(E::KIND, id)),
    }
}

pub async fn delete_entity<E: Collection>(
    state: web::Data<AppState>,
    web::Path((id,)): web::Path<(EntityId,)>,
) -> crate::Result<HttpResponse> {
    log::info!("DELETE {}/{}", E::PATH, id);
    if E::store(&state).delete(id)? {
        Ok(HttpResponse::Ok().finish())
    } else {
        Err(crate::error::entity_not_found(E::KIND, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{config_routes, json_config, path_config, query_config};
    use crate::config::AppConfig;
    use crate::test::{sample_recipes, pantry, read_json, write_json};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    macro_rules! init_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .app_data(json_config())
                    .app_data(path_config())
                    .app_data(query_config())
                    .configure(config_routes),
            )
            .await
        };
    }

    fn test_state(reject_duplicates: bool) -> (TempDir, web::Data<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let recipes_file = dir.path().join("recipes.json");
        let ingredients_file = dir.path().join("ingredients.json");
        write_json(&recipes_file, &sample_recipes());
        write_json(&ingredients_file, &pantry());

        let config = AppConfig {
            api: crate::config::Api {
                listen: "127.0.0.1:0".parse().unwrap(),
                reject_duplicates,
            },
            storage: crate::config::Storage {
                recipes_file,
                ingredients_file,
                create_missing: false,
            },
        };
        let state = AppState::from_config(config).unwrap();
        (dir, web::Data::new(state))
    }

    #[actix_rt::test]
    async fn get_found_and_missing() {
        let (_dir, state) = test_state(false);
        let mut app = init_app!(state);

        let req = test::TestRequest::get().uri("/recipes/99").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Recipe = test::read_body_json(resp).await;
        assert_eq!(body, Recipe::new(99, "Wi-Fire"));

        let req = test::TestRequest::get().uri("/recipes/98").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Recipe 98 not found");
    }

    #[actix_rt::test]
    async fn malformed_id_is_bad_request() {
        let (_dir, state) = test_state(false);
        let mut app = init_app!(state);

        let req = test::TestRequest::get().uri("/ingredients/abc").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn list_and_search() {
        let (_dir, state) = test_state(false);
        let mut app = init_app!(state);

        let req = test::TestRequest::get().uri("/recipes").to_request();
        let all: Vec<Recipe> = test::read_response_json(&mut app, req).await;
        assert_eq!(all, sample_recipes());

        let req = test::TestRequest::get().uri("/recipes/?name=la").to_request();
        let found: Vec<Recipe> = test::read_response_json(&mut app, req).await;
        assert_eq!(found, sample_recipes()[1..].to_vec());

        let req = test::TestRequest::get().uri("/ingredients/?name=zzz").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let found: Vec<Ingredient> = test::read_body_json(resp).await;
        assert!(found.is_empty());
    }

    #[actix_rt::test]
    async fn create_assigns_server_id() {
        let (dir, state) = test_state(false);
        let mut app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/ingredients")
            .set_json(&json!({"id": 40, "name": "Butter", "quantity": 1.5, "unit": "tbsp"}))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Ingredient = test::read_body_json(resp).await;
        assert_eq!(created, Ingredient::new(3, "Butter", 1.5, "tbsp"));

        let on_disk: Vec<Ingredient> = read_json(&dir.path().join("ingredients.json"));
        assert_eq!(on_disk.len(), 3);
    }

    #[actix_rt::test]
    async fn duplicates_allowed_unless_configured() {
        let (_dir, state) = test_state(false);
        let mut app = init_app!(state);
        let req = test::TestRequest::post()
            .uri("/recipes")
            .set_json(&json!({"name": "Wi-Fire"}))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let (_dir, state) = test_state(true);
        let mut app = init_app!(state);
        let req = test::TestRequest::post()
            .uri("/recipes")
            .set_json(&json!({"name": "Wi-Fire"}))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(state.recipes.len().unwrap(), 3);
    }

    #[actix_rt::test]
    async fn update_found_and_missing() {
        let (_dir, state) = test_state(false);
        let mut app = init_app!(state);

        let req = test::TestRequest::put()
            .uri("/recipes")
            .set_json(&json!({"id": 100, "name": "Bolt", "ingredients": [
                {"id": 1, "name": "Flour", "quantity": 500.0, "unit": "g"}
            ]}))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.recipes.get(100).unwrap().unwrap().ingredients, pantry()[..1].to_vec());

        let req = test::TestRequest::put()
            .uri("/recipes")
            .set_json(&json!({"id": 98, "name": "Bolt"}))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn delete_found_and_missing() {
        let (_dir, state) = test_state(false);
        let mut app = init_app!(state);

        let req = test::TestRequest::delete().uri("/ingredients/1").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::delete().uri("/ingredients/1").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn invalid_body_is_bad_request() {
        let (_dir, state) = test_state(false);
        let mut app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/recipes")
            .set_json(&json!({"title": "no name"}))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn storage_failure_is_internal_error() {
        let (dir, state) = test_state(false);
        let mut app = init_app!(state);
        fs::remove_file(dir.path().join("recipes.json")).unwrap();
        fs::create_dir(dir.path().join("recipes.json")).unwrap();

        let req = test::TestRequest::post()
            .uri("/recipes")
            .set_json(&json!({"name": "Wonder-Person"}))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_rt::test]
    async fn exhausted_ids_fail_without_breaking_the_store() {
        let (dir, state) = test_state(false);
        write_json(
            &dir.path().join("recipes.json"),
            &vec![Recipe::new(EntityId::MAX - 1, "Last")],
        );
        let state = web::Data::new(
            AppState::from_config(state.config.clone()).unwrap(),
        );
        let mut app = init_app!(state);

        let req = test::TestRequest::post()
            .uri("/recipes")
            .set_json(&json!({"name": "One too many"}))
            .to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let req = test::TestRequest::get().uri("/recipes").to_request();
        let all: Vec<Recipe> = test::read_response_json(&mut app, req).await;
        assert_eq!(all, vec![Recipe::new(EntityId::MAX - 1, "Last")]);
    }

    #[actix_rt::test]
    async fn status_reports_counts() {
        let (_dir, state) = test_state(false);
        let mut app = init_app!(state);

        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::read_response_json(&mut app, req).await;
        assert_eq!(body["recipes"], 3);
        assert_eq!(body["ingredients"], 2);
    }
}
