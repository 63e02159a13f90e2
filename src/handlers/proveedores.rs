use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    errors::ServiceError,
    handlers::AppState,
    services::proveedores::{ActualizarProveedor, CrearProveedor, FiltrosProveedor},
};

pub async fn list_proveedores(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosProveedor>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.proveedores.list(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_proveedor(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.proveedores.get(id).await?))
}

pub async fn create_proveedor(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearProveedor>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.proveedores.create(&caller, payload).await?,
    ))
}

pub async fn update_proveedor(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarProveedor>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.proveedores.update(&caller, id, payload).await?,
    ))
}

pub async fn delete_proveedor(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.proveedores.delete(&caller, id).await?;
    Ok(message_response("Proveedor desactivado correctamente"))
}

pub async fn activos(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.proveedores.list_activos().await?))
}

pub async fn historial_compras(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.proveedores.historial_compras(id).await?,
    ))
}
