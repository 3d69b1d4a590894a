use actix_web::{web, HttpResponse, Responder};
use log::warn;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{validate_chain, Amount, Block, LedgerError, Node, NodeError, Transaction};

/// Data structure for the node state
pub type NodeData = web::Data<Node>;

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// Whether the chain is valid
    pub is_valid: bool,
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's address
    pub sender: String,

    /// The recipient's address
    pub recipient: String,

    /// The amount to transfer
    #[schema(value_type = f64, example = 5)]
    pub amount: Amount,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// The message
    pub message: String,

    /// The index of the block that will include this transaction
    pub block_index: u64,
}

/// Response for the mine and seal endpoints
#[derive(Serialize, Deserialize, ToSchema)]
pub struct BlockResponse {
    /// The message
    pub message: String,

    /// The newly sealed block
    pub block: Block,
}

/// Request for the seal endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SealRequest {
    /// Proof of work against the last block's proof
    pub proof: u64,

    /// Hash of the previous block; required only for the first block
    #[serde(default)]
    pub previous_hash: Option<String>,
}

/// Request for the proof validation endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ProofRequest {
    /// The previous proof
    pub last_proof: u64,

    /// The candidate proof
    pub proof: u64,
}

/// Response for the proof validation endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ProofResponse {
    /// Whether the proof is valid
    pub valid: bool,
}

fn error_response(err: NodeError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });

    match err {
        NodeError::LedgerError(LedgerError::EmptyChain(_)) => HttpResponse::Conflict().json(body),
        NodeError::LedgerError(LedgerError::TransactionError(_)) => HttpResponse::BadRequest().json(body),
        NodeError::InvalidProof { .. } | NodeError::PreviousHashMismatch { .. } => {
            HttpResponse::UnprocessableEntity().json(body)
        }
        NodeError::MiningTimeout(_) | NodeError::MiningCancelled => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Get the full blockchain
///
/// Returns the entire blockchain and its validity status
#[utoipa::path(
    get,
    path = "/api/v1/chain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully", body = ChainResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_chain(node: NodeData) -> impl Responder {
    let chain = match node.get_chain() {
        Ok(chain) => chain,
        Err(err) => return error_response(err),
    };
    let is_valid = validate_chain(&chain).is_ok();

    let response = ChainResponse {
        length: chain.len(),
        chain,
        is_valid,
    };

    HttpResponse::Ok().json(response)
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
    match node.get_pending_transactions() {
        Ok(transactions) => HttpResponse::Ok().json(transactions),
        Err(err) => error_response(err),
    }
}

/// Create a new transaction
///
/// Adds a new transaction to the pending transactions
#[utoipa::path(
    post,
    path = "/api/v1/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = TransactionResponse),
        (status = 400, description = "Invalid transaction data"),
        (status = 409, description = "No block has been sealed yet")
    )
)]
pub async fn new_transaction(
    node: NodeData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    match node.submit_transaction(
        &transaction_req.sender,
        &transaction_req.recipient,
        transaction_req.amount,
    ) {
        Ok(block_index) => {
            let response = TransactionResponse {
                message: format!("Transaction will be added to Block {}", block_index),
                block_index,
            };

            HttpResponse::Created().json(response)
        }
        Err(err) => error_response(err),
    }
}

/// Mine a new block
///
/// Searches for a proof against the last block, rewards this node and seals
/// all pending transactions into a new block
#[utoipa::path(
    get,
    path = "/api/v1/mine",
    responses(
        (status = 200, description = "Block mined successfully", body = BlockResponse),
        (status = 409, description = "No block has been sealed yet"),
        (status = 503, description = "Proof search timed out")
    )
)]
pub async fn mine_block(node: NodeData) -> impl Responder {
    match node.mine().await {
        Ok(block) => {
            let response = BlockResponse {
                message: "New Block Forged".to_string(),
                block,
            };

            HttpResponse::Ok().json(response)
        }
        Err(err) => {
            warn!("Mining failed: {}", err);
            error_response(err)
        }
    }
}

/// Seal a new block with an externally found proof
///
/// The proof is checked against the last block's proof, and a given previous
/// hash against the last block's hash, before sealing
#[utoipa::path(
    post,
    path = "/api/v1/blocks",
    request_body = SealRequest,
    responses(
        (status = 201, description = "Block sealed successfully", body = BlockResponse),
        (status = 409, description = "No block has been sealed yet and no previous hash was given"),
        (status = 422, description = "Invalid proof or previous hash")
    )
)]
pub async fn seal_block(node: NodeData, seal_req: web::Json<SealRequest>) -> impl Responder {
    let seal_req = seal_req.into_inner();

    match node.submit_block(seal_req.proof, seal_req.previous_hash) {
        Ok(block) => {
            let response = BlockResponse {
                message: "New Block Sealed".to_string(),
                block,
            };

            HttpResponse::Created().json(response)
        }
        Err(err) => error_response(err),
    }
}

/// Check a proof
///
/// Returns whether `proof` is a valid proof of work against `last_proof`
#[utoipa::path(
    post,
    path = "/api/v1/proof/validate",
    request_body = ProofRequest,
    responses(
        (status = 200, description = "Proof checked", body = ProofResponse)
    )
)]
pub async fn validate_proof(proof_req: web::Json<ProofRequest>) -> impl Responder {
    let valid = Node::check_proof(proof_req.last_proof, proof_req.proof);
    HttpResponse::Ok().json(ProofResponse { valid })
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
pub async fn check_chain(node: NodeData) -> impl Responder {
    match node.is_valid() {
        Ok(is_valid) => HttpResponse::Ok().json(is_valid),
        Err(err) => error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::configure_routes;
    use actix_web::{http::StatusCode, test, App};
    use std::time::Duration;

    fn seeded_node() -> NodeData {
        let node = Node::new("node-1", 1.0, Duration::from_secs(30));
        node.seed_genesis(100, "1").unwrap();
        web::Data::new(node)
    }

    #[actix_web::test]
    async fn test_get_chain() {
        let app = test::init_service(App::new().app_data(seeded_node()).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/chain").to_request();
        let resp: ChainResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.length, 1);
        assert_eq!(resp.chain[0].index, 1);
        assert_eq!(resp.chain[0].previous_hash, "1");
        assert!(resp.is_valid);
    }

    #[actix_web::test]
    async fn test_new_transaction() {
        let node = seeded_node();
        let app = test::init_service(App::new().app_data(node.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/new")
            .set_json(serde_json::json!({"sender": "A", "recipient": "B", "amount": 5}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: TransactionResponse = test::read_body_json(resp).await;
        assert_eq!(body.block_index, 2);
        assert_eq!(body.message, "Transaction will be added to Block 2");
        assert_eq!(
            node.get_pending_transactions().unwrap(),
            vec![Transaction::new("A", "B", Amount::Integer(5)).unwrap()]
        );
    }

    #[actix_web::test]
    async fn test_new_transaction_missing_field() {
        let app = test::init_service(App::new().app_data(seeded_node()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/new")
            .set_json(serde_json::json!({"sender": "A", "amount": 5}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_new_transaction_on_empty_chain() {
        let node = web::Data::new(Node::new("node-1", 1.0, Duration::from_secs(30)));
        let app = test::init_service(App::new().app_data(node).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/new")
            .set_json(serde_json::json!({"sender": "A", "recipient": "B", "amount": 5}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_mine_block() {
        let node = seeded_node();
        node.submit_transaction("A", "B", 5.0).unwrap();
        let app = test::init_service(App::new().app_data(node.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/mine").to_request();
        let resp: BlockResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.message, "New Block Forged");
        assert_eq!(resp.block.index, 2);
        assert_eq!(resp.block.proof, 35293);
        assert_eq!(resp.block.transactions.len(), 2);
        assert_eq!(node.chain_length().unwrap(), 2);
        assert!(node.get_pending_transactions().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_seal_block_rejects_invalid_proof() {
        let node = seeded_node();
        let app = test::init_service(App::new().app_data(node.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/blocks")
            .set_json(serde_json::json!({"proof": 1}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::post()
            .uri("/api/v1/blocks")
            .set_json(serde_json::json!({"proof": 35293}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(node.chain_length().unwrap(), 2);
    }

    #[actix_web::test]
    async fn test_seal_block_rejects_forged_previous_hash() {
        let node = seeded_node();
        let app = test::init_service(App::new().app_data(node.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/blocks")
            .set_json(serde_json::json!({"proof": 35293, "previous_hash": "forged"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(node.chain_length().unwrap(), 1);
        assert!(node.is_valid().unwrap());
    }

    #[actix_web::test]
    async fn test_seal_first_block() {
        let node = web::Data::new(Node::new("node-1", 1.0, Duration::from_secs(30)));
        let app = test::init_service(App::new().app_data(node.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/blocks")
            .set_json(serde_json::json!({"proof": 100}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/api/v1/blocks")
            .set_json(serde_json::json!({"proof": 100, "previous_hash": "genesis"}))
            .to_request();
        let resp: BlockResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.block.index, 1);
        assert_eq!(resp.block.previous_hash, "genesis");
    }

    #[actix_web::test]
    async fn test_validate_proof() {
        let app = test::init_service(App::new().configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/proof/validate")
            .set_json(serde_json::json!({"last_proof": 100, "proof": 35293}))
            .to_request();
        let resp: ProofResponse = test::call_and_read_body_json(&app, req).await;
        assert!(resp.valid);

        let req = test::TestRequest::post()
            .uri("/api/v1/proof/validate")
            .set_json(serde_json::json!({"last_proof": 100, "proof": 0}))
            .to_request();
        let resp: ProofResponse = test::call_and_read_body_json(&app, req).await;
        assert!(!resp.valid);
    }

    #[actix_web::test]
    async fn test_validate_chain() {
        let app = test::init_service(App::new().app_data(seeded_node()).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/validate").to_request();
        let valid: bool = test::call_and_read_body_json(&app, req).await;

        assert!(valid);
    }
}
