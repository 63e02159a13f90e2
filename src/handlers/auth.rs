use axum::{
    extract::{Json, State},
    http::HeaderMap,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::warn;

use crate::{
    auth::{AuthError, AuthService, Caller, LoginCredentials},
    entities::empleado::{self, Rol},
    handlers::AppState,
    services::auditoria::{registrar, Actividad},
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub empleado: empleado::Model,
    pub rol: Rol,
}

/// Password login. Returns the employee profile and role.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(credentials): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AuthError> {
    let empleado = AuthService::new(state.db.clone()).login(&credentials).await?;

    let caller = Caller {
        empleado_id: empleado.id,
        rut: empleado.rut.clone(),
        nombre: empleado.nombre_completo(),
        rol: empleado.rol,
        ip: None,
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    if let Err(e) = registrar(
        &*state.db,
        Some(&caller),
        Actividad::new("auth", "login", "empleados").registro(empleado.id),
    )
    .await
    {
        warn!(error = %e, rut = %empleado.rut, "could not record login");
    }

    Ok(Json(LoginResponse {
        rol: empleado.rol,
        empleado,
    }))
}
