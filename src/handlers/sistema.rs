use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    errors::ServiceError,
    handlers::AppState,
    services::{
        auditoria::FiltrosLog,
        sistema::{ActualizarConfiguracion, CrearConfiguracion, FiltrosConfiguracion, SolicitudReporte},
    },
};

// Configuración

pub async fn list_configuracion(
    State(state): State<AppState>,
    Query(filtros): Query<FiltrosConfiguracion>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.configuracion.list(filtros).await?))
}

pub async fn get_configuracion(
    State(state): State<AppState>,
    Path(clave): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.configuracion.get(&clave).await?))
}

pub async fn create_configuracion(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearConfiguracion>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.configuracion.create(&caller, payload).await?,
    ))
}

pub async fn update_configuracion(
    State(state): State<AppState>,
    caller: Caller,
    Path(clave): Path<String>,
    Json(payload): Json<ActualizarConfiguracion>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.configuracion.update(&caller, &clave, payload).await?,
    ))
}

pub async fn delete_configuracion(
    State(state): State<AppState>,
    caller: Caller,
    Path(clave): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.configuracion.delete(&caller, &clave).await?;
    Ok(message_response("Configuración eliminada correctamente"))
}

// Reportes

pub async fn generar_reporte(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<SolicitudReporte>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.reportes.generar(&caller, payload).await?,
    ))
}

pub async fn list_reportes(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.reportes.list(page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_reporte(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.reportes.get(id).await?))
}

// Audit log and dashboard

pub async fn list_logs(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosLog>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.auditoria.list(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.dashboard.resumen().await?))
}
