//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod health;
mod posts;
mod render;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, HttpResponse, web};

use yatube_shared::ErrorResponse;

/// Configure all application routes.
///
/// Paths end with a slash; the app is wrapped in `NormalizePath` so
/// `/group/x` and `/group/x/` reach the same view.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/profile/{username}/", web::get().to(posts::profile))
        .service(
            web::resource("/create/")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create_post)),
        )
        .route("/posts/{id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{id}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit_post)),
        )
        // Auth routes
        .service(
            web::scope("/auth")
                .route("/signup/", web::post().to(auth::signup))
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .route("/logout/", web::post().to(auth::logout)),
        )
        // Admin routes
        .service(
            web::scope("/admin")
                .route("/groups/", web::post().to(admin::create_group))
                .route("/groups/{slug}/", web::delete().to(admin::delete_group)),
        )
        .route("/api/health/", web::get().to(health::health_check));
}

/// Fallback for unknown paths.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::not_found(format!("no route for {}", req.path()))
            .with_instance(req.path()),
    )
}
