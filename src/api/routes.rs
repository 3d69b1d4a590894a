use actix_web::web;

use super::handlers;

/// Configures the API routes
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/chain", web::get().to(handlers::get_chain))
            .route("/transactions/pending", web::get().to(handlers::get_pending_transactions))
            .route("/transactions/new", web::post().to(handlers::new_transaction))
            .route("/mine", web::get().to(handlers::mine_block))
            .route("/blocks", web::post().to(handlers::seal_block))
            .route("/proof/validate", web::post().to(handlers::validate_proof))
            .route("/validate", web::get().to(handlers::check_chain))
    );
}
