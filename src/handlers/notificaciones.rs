use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use super::common::{paginated, success_response, PaginationParams};
use crate::{
    auth::Caller, errors::ServiceError, handlers::AppState,
    services::notificaciones::FiltrosNotificacion,
};

pub async fn list_notificaciones(
    State(state): State<AppState>,
    caller: Caller,
    Query(pagination): Query<PaginationParams>,
    Query(filtros): Query<FiltrosNotificacion>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.normalized();
    let result = state
        .services
        .notificaciones
        .list(&caller, filtros, page, per_page)
        .await?;
    Ok(paginated(result, page, per_page))
}

pub async fn marcar_leida(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.services.notificaciones.marcar_leida(&caller, id).await?,
    ))
}

pub async fn marcar_todas(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, ServiceError> {
    let actualizadas = state.services.notificaciones.marcar_todas(&caller).await?;
    Ok(success_response(json!({
        "message": "Notificaciones marcadas como leídas",
        "actualizadas": actualizadas,
    })))
}
