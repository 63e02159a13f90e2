use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    errors::ServiceError,
    handlers::AppState,
    services::turnos::{
        ActualizarHorario, ActualizarTurno, CrearAsignacion, CrearHorario, CrearTurno, FiltrosTurno,
    },
};

pub async fn list_turnos(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosTurno>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.turnos.list(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_turno(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.turnos.get(id).await?))
}

pub async fn create_turno(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearTurno>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.services.turnos.create(&caller, payload).await?))
}

pub async fn update_turno(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarTurno>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.turnos.update(&caller, id, payload).await?))
}

pub async fn delete_turno(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.turnos.delete(&caller, id).await?;
    Ok(message_response("Turno desactivado correctamente"))
}

pub async fn list_asignaciones(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosTurno>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.turnos.list_asignaciones(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_asignacion(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.turnos.get_asignacion(id).await?))
}

pub async fn create_asignacion(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearAsignacion>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.services.turnos.asignar(&caller, payload).await?))
}

pub async fn delete_asignacion(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.turnos.delete_asignacion(&caller, id).await?;
    Ok(message_response("Asignación desactivada correctamente"))
}

pub async fn list_horarios(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosTurno>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.turnos.list_horarios(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_horario(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.turnos.get_horario(id).await?))
}

pub async fn create_horario(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearHorario>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.services.turnos.crear_horario(&caller, payload).await?))
}

pub async fn update_horario(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarHorario>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.turnos.actualizar_horario(&caller, id, payload).await?,
    ))
}

pub async fn delete_horario(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.turnos.delete_horario(&caller, id).await?;
    Ok(message_response("Horario desactivado correctamente"))
}
