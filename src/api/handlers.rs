use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::blockchain::{AddressSummary, Block, LedgerError, Transaction};
use crate::network::message::{
    BlockReceipt, NewBlockMessage, RegisterNodeMessage, RegisterNodesBulkMessage,
};
use crate::node::Node;

/// Data structure for the node state
pub type NodeData = web::Data<Node>;

/// Response for the blockchain endpoint, also read by peers during consensus
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainResponse {
    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Transactions waiting for the next block
    pub pending_transactions: Vec<Transaction>,

    /// The URL peers use to reach this node
    pub current_node_url: String,

    /// Every known peer URL
    pub network_nodes: Vec<String>,
}

/// Request for the transaction broadcast endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The amount to transfer
    pub amount: f64,

    /// The sender's account
    pub sender: String,

    /// The recipient's account
    pub recipient: String,
}

/// Response for the transaction endpoints
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// The message
    pub note: String,

    /// The index of the block expected to include this transaction
    pub block_index: u64,
}

/// Request for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct MineRequest {
    /// Optional application payload sealed into the block
    #[schema(value_type = Object)]
    pub metadata: Option<Value>,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub note: String,

    /// The newly mined block
    pub block: Block,
}

/// Response for the consensus endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ConsensusResponse {
    /// The message
    pub note: String,

    /// The chain held after consensus
    pub chain: Vec<Block>,
}

/// Plain acknowledgement
#[derive(Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub note: String,
}

/// Maps a ledger error to an HTTP response
fn ledger_error_response(err: &LedgerError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });

    match err {
        LedgerError::NotFound(_) => HttpResponse::NotFound().json(body),
        LedgerError::StaleMiningTarget => HttpResponse::Conflict().json(body),
        LedgerError::SystemError(_) => {
            error!("Ledger failure: {}", err);
            HttpResponse::InternalServerError().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Get the full blockchain
///
/// Returns the chain, the pending transactions and the known peers
#[utoipa::path(
    get,
    path = "/api/v1/blockchain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully", body = BlockchainResponse)
    )
)]
pub async fn get_blockchain(node: NodeData) -> impl Responder {
    let snapshot = node.blockchain.snapshot().await;
    let registry = node.network.registry();

    HttpResponse::Ok().json(BlockchainResponse {
        chain: snapshot.chain,
        pending_transactions: snapshot.pending_transactions,
        current_node_url: registry.current_node_url().to_string(),
        network_nodes: registry.peers(),
    })
}

/// Get all pending transactions
///
/// Returns all transactions waiting to be included in a block
#[utoipa::path(
    get,
    path = "/api/v1/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = Vec<Transaction>)
    )
)]
pub async fn get_pending_transactions(node: NodeData) -> impl Responder {
    HttpResponse::Ok().json(node.blockchain.pending_transactions().await)
}

/// Receive a transaction from a peer
///
/// Adds an already created transaction to the pending transactions
#[utoipa::path(
    post,
    path = "/api/v1/transaction",
    request_body = Transaction,
    responses(
        (status = 201, description = "Transaction queued", body = TransactionResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn receive_transaction(node: NodeData, transaction: web::Json<Transaction>) -> impl Responder {
    match node.blockchain.submit_transaction(transaction.into_inner()).await {
        Ok(block_index) => HttpResponse::Created().json(TransactionResponse {
            note: format!("Transaction will be added in block {}.", block_index),
            block_index,
        }),
        Err(err) => ledger_error_response(&err),
    }
}

/// Create a new transaction
///
/// Creates a transaction, queues it locally and hands it to every peer
#[utoipa::path(
    post,
    path = "/api/v1/transaction/broadcast",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction created and broadcast", body = TransactionResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn broadcast_transaction(
    node: NodeData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    let request = transaction_req.into_inner();
    let transaction = Transaction::new(request.amount, request.sender, request.recipient);

    match node.submit_and_broadcast(transaction).await {
        Ok((block_index, report)) => HttpResponse::Created().json(TransactionResponse {
            note: format!(
                "Transaction created and broadcast to {} peers ({} failed).",
                report.succeeded, report.failed
            ),
            block_index,
        }),
        Err(err) => ledger_error_response(&err),
    }
}

/// Reads the optional mine request body
///
/// An empty body means no metadata. Anything else must be JSON.
fn parse_mine_request(req: &HttpRequest, body: &[u8]) -> Result<MineRequest, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(MineRequest::default());
    }

    if req.content_type() != "application/json" {
        return Err(format!(
            "Expected application/json body, got '{}'",
            req.content_type()
        ));
    }

    serde_json::from_slice(body).map_err(|e| format!("Invalid mine request: {}", e))
}

/// Mine a new block
///
/// Mines the pending transactions into a block and delivers it to peers
#[utoipa::path(
    post,
    path = "/api/v1/mine",
    request_body = MineRequest,
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 400, description = "Malformed request or application record already in the chain"),
        (status = 409, description = "Chain tip changed while mining"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mine_block(node: NodeData, req: HttpRequest, body: web::Bytes) -> impl Responder {
    let metadata = match parse_mine_request(&req, &body) {
        Ok(mine_req) => mine_req.metadata,
        Err(message) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": message }));
        }
    };

    match node.mine_and_broadcast(metadata).await {
        Ok(mined) => HttpResponse::Ok().json(MineResponse {
            note: "New block mined & broadcast successfully".to_string(),
            block: mined.block,
        }),
        Err(err) => ledger_error_response(&err),
    }
}

/// Receive a block mined by a peer
///
/// Appends the block if it extends the current tip
#[utoipa::path(
    post,
    path = "/api/v1/receive-new-block",
    request_body = NewBlockMessage,
    responses(
        (status = 200, description = "Block processed", body = BlockReceipt)
    )
)]
pub async fn receive_new_block(node: NodeData, message: web::Json<NewBlockMessage>) -> impl Responder {
    let receipt = match node.receive_block(message.into_inner().new_block).await {
        Ok(()) => BlockReceipt {
            note: "New block received and accepted.".to_string(),
            accepted: true,
        },
        Err(err) => BlockReceipt {
            note: format!("New block rejected: {}", err),
            accepted: false,
        },
    };

    HttpResponse::Ok().json(receipt)
}

/// Register a node and broadcast it to the network
#[utoipa::path(
    post,
    path = "/api/v1/register-and-broadcast-node",
    request_body = RegisterNodeMessage,
    responses(
        (status = 200, description = "Node registered", body = NoteResponse)
    )
)]
pub async fn register_and_broadcast_node(
    node: NodeData,
    message: web::Json<RegisterNodeMessage>,
) -> impl Responder {
    let report = node.network.register_and_broadcast(&message.new_node_url).await;

    HttpResponse::Ok().json(NoteResponse {
        note: format!(
            "New node registered with network: {} peers reached, {} failed.",
            report.succeeded, report.failed
        ),
    })
}

/// Register a node announced by a peer
#[utoipa::path(
    post,
    path = "/api/v1/register-node",
    request_body = RegisterNodeMessage,
    responses(
        (status = 200, description = "Node registered", body = NoteResponse)
    )
)]
pub async fn register_node(node: NodeData, message: web::Json<RegisterNodeMessage>) -> impl Responder {
    node.network.registry().register(&message.new_node_url);

    HttpResponse::Ok().json(NoteResponse {
        note: "New node registered successfully.".to_string(),
    })
}

/// Register every node of the network at once
#[utoipa::path(
    post,
    path = "/api/v1/register-nodes-bulk",
    request_body = RegisterNodesBulkMessage,
    responses(
        (status = 200, description = "Nodes registered", body = NoteResponse)
    )
)]
pub async fn register_nodes_bulk(
    node: NodeData,
    message: web::Json<RegisterNodesBulkMessage>,
) -> impl Responder {
    let added = node.network.registry().register_bulk(&message.all_network_nodes);

    HttpResponse::Ok().json(NoteResponse {
        note: format!("Bulk registration successful, {} new nodes.", added),
    })
}

/// Run consensus
///
/// Polls every peer and adopts the longest valid chain
#[utoipa::path(
    get,
    path = "/api/v1/consensus",
    responses(
        (status = 200, description = "Consensus finished", body = ConsensusResponse)
    )
)]
pub async fn consensus(node: NodeData) -> impl Responder {
    let replaced = node.consensus().await;
    let note = if replaced {
        "This chain has been replaced."
    } else {
        "Current chain has not been replaced."
    };

    HttpResponse::Ok().json(ConsensusResponse {
        note: note.to_string(),
        chain: node.blockchain.chain().await,
    })
}

/// Get a block by hash
#[utoipa::path(
    get,
    path = "/api/v1/block/{hash}",
    params(("hash" = String, Path, description = "Block hash")),
    responses(
        (status = 200, description = "Block found", body = Block),
        (status = 404, description = "No block with this hash")
    )
)]
pub async fn get_block(node: NodeData, hash: web::Path<String>) -> impl Responder {
    match node.blockchain.block(&hash).await {
        Ok(block) => HttpResponse::Ok().json(block),
        Err(err) => ledger_error_response(&err),
    }
}

/// Get a confirmed transaction by id
///
/// Pending transactions are not searched
#[utoipa::path(
    get,
    path = "/api/v1/transaction/{id}",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction found", body = TransactionLookup),
        (status = 404, description = "No confirmed transaction with this id")
    )
)]
pub async fn get_transaction(node: NodeData, id: web::Path<String>) -> impl Responder {
    match node.blockchain.transaction(&id).await {
        Ok(lookup) => HttpResponse::Ok().json(lookup),
        Err(err) => ledger_error_response(&err),
    }
}

/// Get an address summary
///
/// Returns every confirmed transaction touching the address and its balance
#[utoipa::path(
    get,
    path = "/api/v1/address/{address}",
    params(("address" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Address summary", body = AddressSummary)
    )
)]
pub async fn get_address(node: NodeData, address: web::Path<String>) -> impl Responder {
    HttpResponse::Ok().json(node.blockchain.address_summary(&address).await)
}

/// Check if the blockchain is valid
///
/// Validates the entire blockchain
#[utoipa::path(
    get,
    path = "/api/v1/validate",
    responses(
        (status = 200, description = "Blockchain validation status", body = bool)
    )
)]
pub async fn validate_chain(node: NodeData) -> impl Responder {
    HttpResponse::Ok().json(node.blockchain.is_valid().await)
}
