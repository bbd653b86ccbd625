use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::JwtSettings;
use crate::middleware::{AuthGate, LoggerMiddleware};
use crate::routes::{
    get_current_user, health_check, login, logout, refresh_token, revoke_user_session, signup,
};
use crate::store::UserRepository;

/// Credentialed CORS so a browser front end on another origin can send the
/// refresh cookie. With no configured origins only same-origin calls pass.
fn cors(allowed_origins: &[String]) -> Cors {
    allowed_origins.iter().fold(
        Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600),
        |cors, origin| cors.allowed_origin(origin),
    )
}

pub fn run(
    listener: TcpListener,
    users: Arc<dyn UserRepository>,
    jwt_config: JwtSettings,
    allowed_origins: Vec<String>,
) -> Result<Server, std::io::Error> {
    let users = web::Data::from(users);
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(cors(&allowed_origins))
            .wrap(LoggerMiddleware)
            .wrap(Logger::default())

            // Shared state
            .app_data(users.clone())
            .app_data(jwt_config_data.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/refresh-token", web::post().to(refresh_token))
            .route("/auth/signup", web::post().to(signup))
            .route("/auth/login", web::post().to(login))
            .route("/auth/logout", web::post().to(logout))

            // Protected routes: auth gate -> handler
            .service(
                web::resource("/auth/revoke")
                    .wrap(AuthGate::new(jwt_config.clone()))
                    .route(web::post().to(revoke_user_session)),
            )
            .service(
                web::scope("/api")
                    .wrap(AuthGate::new(jwt_config.clone()))
                    .route("/me", web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
