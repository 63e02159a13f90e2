use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    errors::ServiceError,
    handlers::AppState,
    services::solicitudes::{
        ActualizarSolicitud, ActualizarTipoSolicitud, CrearSolicitud, CrearTipoSolicitud, Decision,
        FiltrosSolicitud, FiltrosTipo,
    },
};

// Tipos de solicitud

pub async fn list_tipos(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosTipo>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.solicitudes.list_tipos(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_tipo(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.solicitudes.get_tipo(id).await?))
}

pub async fn create_tipo(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearTipoSolicitud>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.solicitudes.create_tipo(&caller, payload).await?,
    ))
}

pub async fn update_tipo(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarTipoSolicitud>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.solicitudes.update_tipo(&caller, id, payload).await?,
    ))
}

pub async fn delete_tipo(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.solicitudes.delete_tipo(&caller, id).await?;
    Ok(message_response("Tipo de solicitud desactivado correctamente"))
}

// Solicitudes

pub async fn list_solicitudes(
    State(state): State<AppState>,
    caller: Caller,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosSolicitud>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state
        .services
        .solicitudes
        .list(&caller, filtros, page, per_page)
        .await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_solicitud(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.solicitudes.get(&caller, id).await?))
}

pub async fn create_solicitud(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearSolicitud>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.solicitudes.create(&caller, payload).await?,
    ))
}

pub async fn update_solicitud(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarSolicitud>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.solicitudes.update(&caller, id, payload).await?,
    ))
}

pub async fn delete_solicitud(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.solicitudes.delete(&caller, id).await?;
    Ok(message_response("Solicitud eliminada correctamente"))
}

/// The decision body is optional.
pub async fn aprobar_solicitud(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    payload: Option<Json<Decision>>,
) -> Result<impl IntoResponse, ServiceError> {
    let decision = payload.map(|Json(d)| d).unwrap_or_default();
    Ok(success_response(
        state.services.solicitudes.aprobar(&caller, id, decision).await?,
    ))
}

pub async fn rechazar_solicitud(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    payload: Option<Json<Decision>>,
) -> Result<impl IntoResponse, ServiceError> {
    let decision = payload.map(|Json(d)| d).unwrap_or_default();
    Ok(success_response(
        state.services.solicitudes.rechazar(&caller, id, decision).await?,
    ))
}

pub async fn cancelar_solicitud(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.solicitudes.cancelar(&caller, id).await?,
    ))
}
