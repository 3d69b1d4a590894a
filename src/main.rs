use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use pow_ledger::blockchain::{self, Node};
use pow_ledger::config::Config;
use pow_ledger::api;

// Build the node and seal the first block if configured to
fn initialize_node(config: &Config) -> anyhow::Result<Node> {
    let identifier = Uuid::new_v4().simple().to_string();
    let node = Node::new(identifier, config.mining.reward, config.mining.timeout());
    info!("Node identifier: {}", node.identifier());

    if config.ledger.seed_genesis {
        node.seed_genesis(config.ledger.genesis_proof, &config.ledger.genesis_previous_hash)
            .context("Failed to seed genesis block")?;
    } else {
        info!("Starting with an empty chain; seal the first block with an explicit previous hash");
    }

    Ok(node)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_chain,
        api::handlers::get_pending_transactions,
        api::handlers::new_transaction,
        api::handlers::mine_block,
        api::handlers::seal_block,
        api::handlers::validate_proof,
        api::handlers::check_chain
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::Transaction,
            api::handlers::ChainResponse,
            api::handlers::TransactionRequest,
            api::handlers::TransactionResponse,
            api::handlers::BlockResponse,
            api::handlers::SealRequest,
            api::handlers::ProofRequest,
            api::handlers::ProofResponse
        )
    ),
    tags(
        (name = "ledger", description = "Proof-of-work ledger API endpoints")
    ),
    info(
        title = "Ledger API",
        version = "0.1.0",
        description = "A minimal proof-of-work ledger API",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().context("Failed to load configuration")?;
    let node = web::Data::new(initialize_node(&config)?);

    info!(
        "Starting HTTP server at http://{}:{}",
        config.server.host, config.server.port
    );

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(node.clone())
            .configure(api::configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi())
            )
    })
    .bind((config.server.host.clone(), config.server.port))
    .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?
    .run()
    .await?;

    Ok(())
}
