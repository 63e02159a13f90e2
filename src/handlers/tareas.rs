use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    errors::ServiceError,
    handlers::AppState,
    services::tareas::{ActualizarTarea, CrearTarea, FiltrosTarea, NuevoComentario, Progreso},
};

pub async fn list_tareas(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosTarea>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.tareas.list(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_tarea(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.tareas.get(id).await?))
}

pub async fn create_tarea(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearTarea>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.services.tareas.create(&caller, payload).await?))
}

pub async fn update_tarea(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<ActualizarTarea>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.tareas.update(&caller, id, payload).await?,
    ))
}

pub async fn delete_tarea(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.tareas.delete(&caller, id).await?;
    Ok(message_response("Tarea eliminada correctamente"))
}

pub async fn completar_tarea(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.tareas.completar(&caller, id).await?))
}

pub async fn actualizar_progreso(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<Progreso>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state
            .services
            .tareas
            .actualizar_progreso(&caller, id, payload)
            .await?,
    ))
}

pub async fn list_comentarios(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.tareas.comentarios(id).await?))
}

pub async fn create_comentario(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(payload): Json<NuevoComentario>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(
        state.services.tareas.comentar(&caller, id, payload).await?,
    ))
}

pub async fn historial(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.services.tareas.historial(id).await?))
}
