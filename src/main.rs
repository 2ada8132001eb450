mod api;
mod config;
mod error;
mod model;
mod store;
mod utils;


use std::fs;
use std::path::Path;

use crate::config::AppConfig;
use crate::model::{Entity, Ingredient, Recipe};
use crate::store::FileStore;

pub use crate::error::Error;
pub type Result<T, E = crate::error::Error> = std::result::Result<T, E>;

pub struct AppState {
    pub config: AppConfig,
    pub recipes: FileStore<Recipe>,
    pub ingredients: FileStore<Ingredient>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> crate::Result<Self> {
        let storage = &config.storage;
        if storage.create_missing {
            bootstrap::<Recipe>(&storage.recipes_file)?;
            bootstrap::<Ingredient>(&storage.ingredients_file)?;
        }
        let recipes = FileStore::open(storage.recipes_file.clone())?;
        let ingredients = FileStore::open(storage.ingredients_file.clone())?;
        Ok(Self {
            config,
            recipes,
            ingredients,
        })
    }
}

fn bootstrap<E: Entity>(path: &Path) -> crate::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    FileStore::<E>::bootstrap(path)?;
    Ok(())
}

#[actix_web::main]
async fn main() -> crate::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let config = AppConfig::new()?;
    log::debug!("App config:\n{:#?}", &config);
    log::info!("API server at http://{}", config.api.listen);

    let state = AppState::from_config(config)?;
    api::run_server(state).await?;
    Ok(())
}
