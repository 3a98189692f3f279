//! Router tier endpoints: one path per strategy, any of GET/POST/PUT/DELETE,
//! statement passed as the `query` parameter.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    handler::Handler,
    routing::{get, MethodRouter},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ProxyError;
use crate::query::Strategy;
use crate::routing::QueryRouter;

#[derive(Debug, Clone)]
pub struct RouterState {
    pub router: Arc<QueryRouter>,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    query: Option<String>,
}

pub fn routes(state: RouterState) -> Router {
    Router::new()
        .route(Strategy::Direct.path(), any_verb(direct))
        .route(Strategy::Random.path(), any_verb(random))
        .route(Strategy::Customized.path(), any_verb(customized))
        .with_state(state)
}

fn any_verb<H, T>(handler: H) -> MethodRouter<RouterState>
where
    H: Handler<T, RouterState>,
    T: 'static,
{
    get(handler.clone())
        .post(handler.clone())
        .put(handler.clone())
        .delete(handler)
}

async fn direct(
    state: State<RouterState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    dispatch(state, Strategy::Direct, params).await
}

async fn random(
    state: State<RouterState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    dispatch(state, Strategy::Random, params).await
}

async fn customized(
    state: State<RouterState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    dispatch(state, Strategy::Customized, params).await
}

async fn dispatch(
    State(state): State<RouterState>,
    strategy: Strategy,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let query = params
        .ok()
        .and_then(|Query(p)| p.query)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ProxyError::validation("Query parameter is missing"))?;

    let output = state.router.route(strategy, &query).await?;
    Ok(Json(output.to_json()))
}
