#[macro_use]
extern crate diesel;

use std::io;

use actix_web::{middleware, web, App, HttpServer};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use failsafe::Config;

mod cache;
mod composition;
mod config;
mod error;
mod membership;
mod models;
mod nutrients;
mod prices;
mod query;
mod ratios;
mod recipe_nutrition;
mod routes;
mod schema;

use crate::cache::ListingCache;
use crate::config::Settings;
use crate::routes::{CircuitBreakerType, DbPool};

fn startup_error(error: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let settings = Settings::from_env().map_err(startup_error)?;

    // set up database connection pool
    let manager = ConnectionManager::<MysqlConnection>::new(settings.database_url.as_str());
    let pool: DbPool = r2d2::Pool::builder()
        .build(manager)
        .map_err(startup_error)?;

    let cache = match &settings.redis_url {
        Some(url) => ListingCache::connect(url, settings.cache_ttl_seconds).map_err(startup_error)?,
        None => ListingCache::disabled(),
    };

    let circuit_breaker: CircuitBreakerType = Config::new().build();

    let bind = (settings.bind_host.clone(), settings.bind_port);
    log::info!("starting HTTP server at http://{}:{}", bind.0, bind.1);

    let settings = web::Data::new(settings);
    let pool = web::Data::new(pool);
    let cache = web::Data::new(cache);
    let circuit_breaker = web::Data::new(circuit_breaker);

    HttpServer::new(move || {
        App::new()
            .app_data(settings.clone())
            .app_data(pool.clone())
            .app_data(cache.clone())
            .app_data(circuit_breaker.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
