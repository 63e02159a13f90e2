use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    entities::inventario::Categoria,
    errors::ServiceError,
    handlers::AppState,
    services::inventario::{ActualizarInventario, CrearInventario, FiltrosInventario, MovimientoStock},
};

#[derive(Debug, Deserialize)]
pub struct CategoriaQuery {
    pub categoria: Option<Categoria>,
}

#[derive(Debug, Deserialize)]
pub struct BusquedaQuery {
    pub q: Option<String>,
}

pub async fn list_inventario(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosInventario>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.inventario.list(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_inventario(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.inventario.get(id).await?))
}

pub async fn create_inventario(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearInventario>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.inventario.create(&caller, payload).await?,
    ))
}

pub async fn update_inventario(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarInventario>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.inventario.update(&caller, id, payload).await?,
    ))
}

pub async fn delete_inventario(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.inventario.delete(&caller, id).await?;
    Ok(message_response("Producto desactivado correctamente"))
}

pub async fn update_stock(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<MovimientoStock>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.inventario.update_stock(&caller, id, payload).await?,
    ))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.inventario.stats().await?))
}

pub async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.inventario.low_stock().await?))
}

pub async fn expiring_soon(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.inventario.expiring_soon().await?))
}

pub async fn expired(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.inventario.expired().await?))
}

pub async fn by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoriaQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let categoria = query
        .categoria
        .ok_or_else(|| ServiceError::BadRequest("El parámetro categoria es requerido".to_string()))?;
    Ok(success_response(
        state.services.inventario.by_category(categoria).await?,
    ))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<BusquedaQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let q = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ServiceError::BadRequest("El parámetro q es requerido".to_string()))?;
    Ok(success_response(state.services.inventario.search(&q).await?))
}
