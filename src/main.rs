use actix_cors::Cors;
use actix_web::{self, http::header, middleware::Logger, web, App, HttpServer};
use std::sync::{Arc, LazyLock};
use tracing_subscriber::EnvFilter;

use crate::{
    configs::connect_database,
    modules::{
        events::GraphEvents,
        graph::{repository_pg::GraphRepositoryPg, service::GraphService},
        relationship::{repository_pg::RelationshipRepositoryPg, service::RelationshipService},
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // try_init: a second subscriber (tests) is not an error
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    tracing::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool = connect_database().await.map_err(|e| {
        tracing::error!("Database connection error: {}", e);
        std::io::Error::other("Database connection error")
    })?;

    let events = GraphEvents::new();

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let relationship_repo = Arc::new(RelationshipRepositoryPg::new(db_pool.clone()));
    let graph_repo = Arc::new(GraphRepositoryPg::new(db_pool.clone()));

    let user_service = UserService::with_dependencies(user_repo.clone(), events.clone());
    let relationship_service =
        RelationshipService::with_dependencies(relationship_repo, user_repo, events.clone());
    let graph_service = GraphService::with_dependencies(
        graph_repo,
        events,
        ENV.sync_config(),
        ENV.long_poll_config(),
    );

    tracing::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&ENV.frontend_url)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::IF_NONE_MATCH])
            .expose_headers(vec![header::ETAG, header::HeaderName::from_static("x-long-poll-timeout")])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(relationship_service.clone()))
            .app_data(web::Data::new(graph_service.clone()))
            .service(health_check)
            .configure(modules::user::route::configure)
            .configure(modules::relationship::route::configure)
            .configure(modules::graph::route::configure)
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
