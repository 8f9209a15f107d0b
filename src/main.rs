mod api;
mod config;
mod database;
mod graphql;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, RunMode};
use crate::utils::AppError;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Invalid configuration");

    log::info!("🚀 Starting Program Admin Service...");
    log::info!("📊 Database: {}", config.mongodb_uri);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.mongodb_uri)
        .await
        .expect("Failed to connect to MongoDB");

    log::info!("✅ MongoDB connected successfully");

    let schema = graphql::build_schema(db.clone());

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config.clone());
    let schema_data = web::Data::new(schema);

    let host = config.host.clone();
    let port = config.port;
    let serve_playground = config.run_mode != RunMode::Production;

    log::info!("🌐 Server starting on {}:{} ({:?} mode)", host, port, config.run_mode);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("🔮 GraphQL endpoint at: http://{}:{}/graphql", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:3001")
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_origin("http://127.0.0.1:5173")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Malformed JSON bodies go through the same error envelope as
        // everything else.
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            actix_web::Error::from(AppError::Validation(format!("Invalid request body: {}", err)))
        });

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(schema_data.clone())
            .app_data(json_config)
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Auth endpoints
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/me", web::get().to(api::auth::get_me)),
            )
            // Programs: reads are public, writes are guarded in-handler
            .service(
                web::scope("/api/programs")
                    .service(api::programs::list_programs)
                    .service(api::programs::create_program)
                    .service(api::programs::get_program)
                    .service(api::programs::update_program)
                    .service(api::programs::delete_program),
            )
            // Users: every route resolves the acting user first
            .service(
                web::scope("/api/users")
                    .service(api::users::list_users)
                    .service(api::users::create_user)
                    .service(api::users::get_user)
                    .service(api::users::update_user),
            )
            // GraphQL surface (program subset)
            .route("/graphql", web::post().to(graphql::graphql_handler))
            .configure(|srv| {
                if serve_playground {
                    srv.route("/graphql", web::get().to(graphql::graphql_playground));
                }
            })
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
