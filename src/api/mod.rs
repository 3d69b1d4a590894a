// API module
//
// HTTP adapter over the ledger node

pub mod handlers;
pub mod routes;

pub use routes::configure_routes;
