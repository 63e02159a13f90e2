use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    errors::ServiceError,
    handlers::AppState,
    services::ordenes_compra::{
        ActualizarOrden, CrearOrden, EliminarItem, FiltrosOrden, NuevoItem, Recepcion,
    },
};

#[derive(Debug, Deserialize)]
pub struct ProveedorQuery {
    pub proveedor_id: Option<i32>,
}

pub async fn list_ordenes(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosOrden>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.ordenes_compra.list(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_orden(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.ordenes_compra.get(id).await?))
}

pub async fn create_orden(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearOrden>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.ordenes_compra.create(&caller, payload).await?,
    ))
}

pub async fn update_orden(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarOrden>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.ordenes_compra.update(&caller, id, payload).await?,
    ))
}

pub async fn delete_orden(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.ordenes_compra.delete(&caller, id).await?;
    Ok(message_response("Orden de compra eliminada correctamente"))
}

pub async fn aprobar_orden(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.ordenes_compra.aprobar(&caller, id).await?,
    ))
}

pub async fn recibir_orden(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<Recepcion>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.ordenes_compra.recibir(&caller, id, payload).await?,
    ))
}

pub async fn agregar_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<NuevoItem>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.ordenes_compra.agregar_item(&caller, id, payload).await?,
    ))
}

pub async fn eliminar_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<EliminarItem>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .ordenes_compra
        .eliminar_item(&caller, id, payload.item_id)
        .await?;
    Ok(message_response("Item eliminado correctamente"))
}

pub async fn por_proveedor(
    State(state): State<AppState>,
    Query(query): Query<ProveedorQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let proveedor_id = query.proveedor_id.ok_or_else(|| {
        ServiceError::BadRequest("El parámetro proveedor_id es requerido".to_string())
    })?;
    Ok(success_response(
        state.services.ordenes_compra.por_proveedor(proveedor_id).await?,
    ))
}

pub async fn estadisticas(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.ordenes_compra.estadisticas().await?))
}
