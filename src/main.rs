use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use log::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod blockchain;
mod config;
mod network;
mod node;

use config::NodeConfig;
use network::{HttpPeerClient, Network, PeerRegistry};
use node::Node;

// Wire the ledger to the peer network described by the configuration
fn initialize_node(config: &NodeConfig) -> anyhow::Result<Node> {
    let client = HttpPeerClient::new(Duration::from_secs(config.peer_timeout_secs))
        .context("failed to build peer client")?;

    let registry = PeerRegistry::new(config.node_url());
    let added = registry.register_bulk(&config.peers);
    info!("Registered {} startup peers", added);

    let ledger = blockchain::Blockchain::new(config.node_id());
    info!("Mining rewards are credited to {}", ledger.node_id());

    Ok(Node::new(ledger, Network::new(registry, Arc::new(client))))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_blockchain,
        api::handlers::get_pending_transactions,
        api::handlers::receive_transaction,
        api::handlers::broadcast_transaction,
        api::handlers::mine_block,
        api::handlers::receive_new_block,
        api::handlers::register_and_broadcast_node,
        api::handlers::register_node,
        api::handlers::register_nodes_bulk,
        api::handlers::consensus,
        api::handlers::get_block,
        api::handlers::get_transaction,
        api::handlers::get_address,
        api::handlers::validate_chain
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::Transaction,
            blockchain::LedgerSnapshot,
            blockchain::TransactionLookup,
            blockchain::AddressSummary,
            network::message::NewBlockMessage,
            network::message::BlockReceipt,
            network::message::RegisterNodeMessage,
            network::message::RegisterNodesBulkMessage,
            api::handlers::BlockchainResponse,
            api::handlers::TransactionRequest,
            api::handlers::TransactionResponse,
            api::handlers::MineRequest,
            api::handlers::MineResponse,
            api::handlers::ConsensusResponse,
            api::handlers::NoteResponse
        )
    ),
    tags(
        (name = "ledger", description = "Ledger node API endpoints")
    ),
    info(
        title = "Ledger Node API",
        version = "1.0.0",
        description = "A peer-replicated proof-of-work ledger",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = NodeConfig::parse();
    let node = web::Data::new(initialize_node(&config)?);

    info!(
        "Starting ledger node {} on {}:{}",
        config.node_url(),
        config.host,
        config.port
    );

    // Start HTTP server
    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(node.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
