use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::engine::ReplicationEngine;
use super::protocol::{
    DeleteRequest, GetResponse, KeyQuery, PutRequest, PutResponse, StatsResponse, Update,
    UpdateResponse,
};

pub async fn handle_put(
    Extension(engine): Extension<Arc<ReplicationEngine>>,
    payload: Result<Json<PutRequest>, JsonRejection>,
) -> (StatusCode, Json<PutResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::error!("Rejected put request: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(PutResponse { success: false }),
            );
        }
    };

    engine.put(&req.key, req.value);
    (StatusCode::OK, Json(PutResponse { success: true }))
}

pub async fn handle_delete(
    Extension(engine): Extension<Arc<ReplicationEngine>>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> (StatusCode, Json<PutResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(e) => {
            tracing::error!("Rejected delete request: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(PutResponse { success: false }),
            );
        }
    };

    engine.delete(&req.key);
    (StatusCode::OK, Json(PutResponse { success: true }))
}

pub async fn handle_get(
    Extension(engine): Extension<Arc<ReplicationEngine>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<GetResponse>) {
    read_key(&engine, &key)
}

/// `GET /get?key=...`; the only form that can address the empty key.
pub async fn handle_get_query(
    Extension(engine): Extension<Arc<ReplicationEngine>>,
    Query(query): Query<KeyQuery>,
) -> (StatusCode, Json<GetResponse>) {
    read_key(&engine, &query.key)
}

fn read_key(engine: &ReplicationEngine, key: &str) -> (StatusCode, Json<GetResponse>) {
    let response = engine.read(key);
    let status = if response.found {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    (status, Json(response))
}

/// Peer-facing endpoint. Applies the update without re-propagating it.
pub async fn handle_update(
    Extension(engine): Extension<Arc<ReplicationEngine>>,
    payload: Result<Json<Update>, JsonRejection>,
) -> (StatusCode, Json<UpdateResponse>) {
    let update = match payload {
        Ok(Json(update)) => update,
        Err(e) => {
            tracing::error!("Rejected remote update: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(UpdateResponse {
                    success: false,
                    applied: false,
                }),
            );
        }
    };

    let applied = engine.remote_update(update);
    (
        StatusCode::OK,
        Json(UpdateResponse {
            success: true,
            applied,
        }),
    )
}

pub async fn handle_stats(
    Extension(engine): Extension<Arc<ReplicationEngine>>,
) -> (StatusCode, Json<StatsResponse>) {
    let store = engine.store();
    (
        StatusCode::OK,
        Json(StatsResponse {
            node_id: engine.node_id().clone(),
            is_leader: engine.is_leader(),
            peers: engine.peers().to_vec(),
            entries: store.len(),
            ttl_ms: store.ttl().as_millis() as u64,
        }),
    )
}
