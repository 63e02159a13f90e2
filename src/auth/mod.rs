/*!
 * # Authentication and Authorization Module
 *
 * Callers identify themselves with the `X-Empleado-Rut` header (or the
 * `empleado_rut` query parameter). The RUT is resolved to an active employee
 * on every request and the stored role decides what the caller may do; a
 * role asserted by the client is only cross-checked, never trusted.
 *
 * Password login lives here as well; see [`password`] for the accepted
 * hash formats.
 */

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Query, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    db::DbPool,
    entities::empleado::{self, Rol},
    rut,
};

pub mod password;
pub mod rbac;

pub use rbac::{check_permission, consts, role_has_permission};

pub const EMPLEADO_RUT_HEADER: &str = "x-empleado-rut";
pub const EMPLEADO_ROL_HEADER: &str = "x-empleado-rol";

/// The authenticated employee behind a request.
#[derive(Debug, Clone, Serialize)]
pub struct Caller {
    pub empleado_id: i32,
    pub rut: String,
    pub nombre: String,
    pub rol: Rol,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl Caller {
    pub fn has_permission(&self, permission: &str) -> bool {
        role_has_permission(self.rol, permission)
    }

    /// Gerente or administrador.
    pub fn is_manager(&self) -> bool {
        matches!(self.rol, Rol::Gerente | Rol::Administrador)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Unknown or inactive employee")]
    UnknownCaller,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password must be reset")]
    PasswordResetRequired,

    #[error("Declared role does not match the employee record")]
    RoleMismatch,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, &str) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required",
            ),
            Self::UnknownCaller => (
                StatusCode::UNAUTHORIZED,
                "AUTH_UNKNOWN_EMPLEADO",
                "Unknown or inactive employee",
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials",
            ),
            Self::PasswordResetRequired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_PASSWORD_RESET_REQUIRED",
                "Password must be reset before logging in",
            ),
            Self::RoleMismatch => (
                StatusCode::FORBIDDEN,
                "AUTH_ROLE_MISMATCH",
                "Declared role does not match the employee record",
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions",
            ),
            Self::DatabaseError(detail) | Self::InternalError(detail) => {
                tracing::error!(error = %detail, "authentication failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AUTH_INTERNAL_ERROR",
                    "Internal server error",
                )
            }
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CallerQuery {
    empleado_rut: Option<String>,
    // `rol` is a list filter on some routes, so the declared role uses its own key
    empleado_rol: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginCredentials {
    pub rut: String,
    pub password: String,
}

/// Resolves callers and checks passwords against the employee table.
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    async fn find_by_rut(&self, raw_rut: &str) -> Result<Option<empleado::Model>, AuthError> {
        let canonical = rut::canonical(raw_rut);
        if canonical.is_empty() {
            return Ok(None);
        }
        Ok(empleado::Entity::find()
            .filter(empleado::Column::Rut.eq(canonical))
            .one(&*self.db)
            .await?)
    }

    /// Resolves a header-supplied RUT (and optional declared role) to an active employee.
    pub async fn resolve_caller(
        &self,
        raw_rut: &str,
        declared_rol: Option<&str>,
    ) -> Result<empleado::Model, AuthError> {
        let empleado = self
            .find_by_rut(raw_rut)
            .await?
            .filter(|e| e.puede_operar())
            .ok_or(AuthError::UnknownCaller)?;

        if let Some(declared) = declared_rol.map(str::trim).filter(|d| !d.is_empty()) {
            if Rol::from_header(declared) != Some(empleado.rol) {
                warn!(rut = %empleado.rut, declared, stored = %empleado.rol, "role mismatch");
                return Err(AuthError::RoleMismatch);
            }
        }

        Ok(empleado)
    }

    /// Verifies a password login. Legacy plaintext passwords are upgraded to
    /// Argon2 on success.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<empleado::Model, AuthError> {
        let result = self.login_inner(credentials).await;
        match &result {
            Ok(empleado) => {
                counter!("negocio.auth.login.success", 1);
                info!(rut = %empleado.rut, "login succeeded");
            }
            Err(e) => {
                counter!("negocio.auth.login.failure", 1);
                warn!(error = %e, "login rejected");
            }
        }
        result
    }

    async fn login_inner(&self, credentials: &LoginCredentials) -> Result<empleado::Model, AuthError> {
        let empleado = self
            .find_by_rut(&credentials.rut)
            .await?
            .filter(|e| e.puede_operar())
            .ok_or(AuthError::InvalidCredentials)?;

        match password::verify_password(empleado.password.as_deref(), &credentials.password) {
            password::PasswordCheck::Valid => Ok(empleado),
            password::PasswordCheck::ValidNeedsRehash => {
                let hash = password::hash_password(&credentials.password)
                    .map_err(|e| AuthError::InternalError(e.to_string()))?;
                let mut active: empleado::ActiveModel = empleado.into();
                active.password = Set(Some(hash));
                let updated = active.update(&*self.db).await?;
                info!(rut = %updated.rut, "legacy password upgraded to argon2");
                Ok(updated)
            }
            password::PasswordCheck::ResetRequired => Err(AuthError::PasswordResetRequired),
            password::PasswordCheck::Invalid => Err(AuthError::InvalidCredentials),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn client_ip(request: &Request) -> Option<String> {
    let headers = request.headers();
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| header_str(headers, "x-real-ip").map(str::to_string))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

/// Authentication middleware: resolves the caller and stores it in the request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("authentication service not available".into())
                .into_response();
        }
    };

    let query = Query::<CallerQuery>::try_from_uri(request.uri())
        .map(|Query(q)| q)
        .unwrap_or(CallerQuery {
            empleado_rut: None,
            empleado_rol: None,
        });

    let raw_rut = header_str(request.headers(), EMPLEADO_RUT_HEADER)
        .map(str::to_string)
        .or(query.empleado_rut);
    let raw_rut = match raw_rut {
        Some(r) => r,
        None => return AuthError::MissingAuth.into_response(),
    };
    let declared_rol = header_str(request.headers(), EMPLEADO_ROL_HEADER)
        .map(str::to_string)
        .or(query.empleado_rol);

    match auth_service
        .resolve_caller(&raw_rut, declared_rol.as_deref())
        .await
    {
        Ok(empleado) => {
            let caller = Caller {
                empleado_id: empleado.id,
                nombre: empleado.nombre_completo(),
                rut: empleado.rut,
                rol: empleado.rol,
                ip: client_ip(&request),
                user_agent: header_str(request.headers(), "user-agent").map(str::to_string),
            };
            debug!(rut = %caller.rut, rol = %caller.rol, "caller resolved");
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Permission middleware to check if the caller's role grants the required permission
pub async fn permission_middleware(
    State(required_permission): State<&'static str>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let caller = request
        .extensions()
        .get::<Caller>()
        .ok_or(AuthError::MissingAuth)?;

    if !caller.has_permission(required_permission) {
        warn!(rut = %caller.rut, rol = %caller.rol, permission = required_permission, "permission denied");
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &'static str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &'static str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission,
            permission_middleware,
        ))
        .with_auth()
    }
}
