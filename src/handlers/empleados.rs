use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};

use super::common::{created_response, message_response, paginated, success_response, PaginationParams};
use crate::{
    auth::Caller,
    errors::ServiceError,
    handlers::AppState,
    services::empleados::{ActualizarEmpleado, CrearEmpleado, FiltrosEmpleado},
};

pub async fn list_empleados(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosEmpleado>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state.services.empleados.list(filtros, page, per_page).await?;
    Ok(paginated(result, page, per_page))
}

pub async fn get_empleado(
    State(state): State<AppState>,
    Path(rut): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let empleado = state.services.empleados.get(&rut).await?;
    Ok(success_response(empleado))
}

pub async fn create_empleado(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CrearEmpleado>,
) -> Result<impl IntoResponse, ServiceError> {
    let empleado = state.services.empleados.create(&caller, payload).await?;
    Ok(created_response(empleado))
}

pub async fn update_empleado(
    State(state): State<AppState>,
    caller: Caller,
    Path(rut): Path<String>,
    Json(payload): Json<ActualizarEmpleado>,
) -> Result<impl IntoResponse, ServiceError> {
    let empleado = state.services.empleados.update(&caller, &rut, payload).await?;
    Ok(success_response(empleado))
}

pub async fn delete_empleado(
    State(state): State<AppState>,
    caller: Caller,
    Path(rut): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.empleados.delete(&caller, &rut).await?;
    Ok(message_response("Empleado desactivado correctamente"))
}
