//! HTTP handlers and route configuration.

mod health;
mod history;
mod limiters;
mod sends;

#[cfg(test)]
mod tests;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/sends", web::post().to(sends::send_batch))
            .route("/history", web::get().to(history::recent_sends))
            .service(
                web::scope("/limiters/{provider}")
                    .route("", web::get().to(limiters::status))
                    .route("/abort", web::post().to(limiters::abort))
                    .route("/reset", web::post().to(limiters::reset)),
            ),
    );
}
