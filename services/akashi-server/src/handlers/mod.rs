pub mod auth;
pub mod export;
pub mod health;
pub mod query;
pub mod runs;
pub mod subscribe;
pub mod trace;

use actix_web::web;

/// Route table for the single service process (§5, §6). Mirrors the
/// teacher's `handlers::configure` entry point.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health))
        .route("/auth/token", web::post().to(auth::issue_token))
        .service(
            web::scope("/v1")
                .route("/trace", web::post().to(trace::trace))
                .route("/query", web::post().to(query::query))
                .route("/query/temporal", web::post().to(query::temporal))
                .route("/search", web::post().to(query::search))
                .route("/check", web::post().to(query::check))
                .route("/runs", web::post().to(runs::create_run))
                .route("/runs/{run_id}/events", web::post().to(runs::append_events))
                .route("/runs/{run_id}/complete", web::post().to(runs::complete_run))
                .route("/decisions/recent", web::get().to(query::recent))
                .route("/conflicts", web::get().to(query::list_conflicts))
                .route("/conflicts/{id}", web::patch().to(query::patch_conflict))
                .route("/export/decisions", web::get().to(export::export_decisions))
                .route("/subscribe", web::get().to(subscribe::subscribe)),
        );
}
