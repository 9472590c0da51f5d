use clap::Parser;

use crate::blockchain::transaction::new_identifier;

/// Command line and environment configuration for a ledger node
#[derive(Debug, Clone, Parser)]
#[command(name = "ledger-node", version, about = "Peer-replicated proof-of-work ledger node")]
pub struct NodeConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "LEDGER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "LEDGER_PORT", default_value_t = 3001)]
    pub port: u16,

    /// URL peers use to reach this node (defaults to http://{host}:{port})
    #[arg(long, env = "LEDGER_NODE_URL")]
    pub node_url: Option<String>,

    /// Identity credited with mining rewards (defaults to a random id)
    #[arg(long, env = "LEDGER_NODE_ID")]
    pub node_id: Option<String>,

    /// Peer node URLs to register on startup
    #[arg(long = "peer", env = "LEDGER_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Timeout for each request sent to a peer
    #[arg(long, env = "LEDGER_PEER_TIMEOUT_SECS", default_value_t = 5)]
    pub peer_timeout_secs: u64,
}

impl NodeConfig {
    /// Gets the URL peers use to reach this node
    pub fn node_url(&self) -> String {
        let url = match &self.node_url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.host, self.port),
        };
        url.trim_end_matches('/').to_string()
    }

    /// Gets the reward identity, generating one when none was configured
    pub fn node_id(&self) -> String {
        self.node_id.clone().unwrap_or_else(new_identifier)
    }
}
