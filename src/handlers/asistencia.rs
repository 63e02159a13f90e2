use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    errors::ServiceError,
    handlers::AppState,
    services::asistencia::{ActualizarAsistencia, CrearAsistencia, FiltrosAsistencia},
};

#[derive(Debug, Deserialize)]
pub struct FechaQuery {
    pub fecha: Option<NaiveDate>,
}

pub async fn list_asistencias(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosAsistencia>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.asistencia.list(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_asistencia(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.asistencia.get(id).await?))
}

pub async fn create_asistencia(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearAsistencia>,
) -> Result<impl IntoResponse, ServiceError> {
    let registro = state.services.asistencia.create(&caller, payload).await?;
    Ok(created_response(registro))
}

pub async fn update_asistencia(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarAsistencia>,
) -> Result<impl IntoResponse, ServiceError> {
    let registro = state.services.asistencia.update(&caller, id, payload).await?;
    Ok(success_response(registro))
}

pub async fn delete_asistencia(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.asistencia.delete(&caller, id).await?;
    Ok(message_response("Asistencia eliminada correctamente"))
}

pub async fn validar_asistencia(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.asistencia.validar(&caller, id).await?))
}

pub async fn estadisticas(
    State(state): State<AppState>,
    Query(query): Query<FechaQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let fecha = query.fecha.unwrap_or_else(|| chrono::Utc::now().date_naive());
    Ok(success_response(state.services.asistencia.estadisticas(fecha).await?))
}
