use actix_web::web;

pub mod app;
pub mod proxy;

/// Register the local app API under `/app`. Everything else should fall
/// through to [`proxy::forward`] via `App::default_service`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/app")
            .service(app::get_feed)
            .service(app::create_story)
            .service(app::login)
            .service(app::list_bookmarks)
            .service(app::toggle_bookmark)
            .service(app::bookmark_status)
            .service(app::storage_info)
            .service(app::clear_storage)
            .service(app::cache_info)
            .service(app::sync_now)
            .service(app::skip_waiting)
            .service(app::push),
    )
    .route("/health", web::get().to(|| async { "OK" }));
}
