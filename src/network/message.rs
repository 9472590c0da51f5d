use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::Block;

/// Body of a block delivered by a peer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBlockMessage {
    pub new_block: Block,
}

/// Peer's answer to a delivered block
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockReceipt {
    pub note: String,
    pub accepted: bool,
}

/// Body announcing a single node URL
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodeMessage {
    pub new_node_url: String,
}

/// Body handing a new node every URL of the network
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNodesBulkMessage {
    pub all_network_nodes: Vec<String>,
}
