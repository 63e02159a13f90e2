//! Negocio API library
//!
//! HTTP backend for a small business: staff, attendance, shifts, leave
//! requests, tasks, inventory, suppliers and purchase orders.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod rut;
pub mod services;
pub mod tracing;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Extension, Router,
};

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: Option<Arc<events::EventSender>>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<db::DbPool>,
        config: config::AppConfig,
        event_sender: Option<Arc<events::EventSender>>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

fn empleado_routes() -> Router<AppState> {
    use handlers::empleados::*;

    let read = Router::new()
        .route("/empleados", get(list_empleados))
        .route("/empleados/:rut", get(get_empleado))
        .with_permission(perm::EMPLEADOS_READ);

    let manage = Router::new()
        .route("/empleados", post(create_empleado))
        .route(
            "/empleados/:rut",
            put(update_empleado)
                .patch(update_empleado)
                .delete(delete_empleado),
        )
        .with_permission(perm::EMPLEADOS_MANAGE);

    read.merge(manage)
}

fn asistencia_routes() -> Router<AppState> {
    use handlers::asistencia::*;

    let read = Router::new()
        .route("/", get(list_asistencias))
        .route("/estadisticas", get(estadisticas))
        .route("/:id", get(get_asistencia))
        .with_permission(perm::ASISTENCIA_READ);

    let write = Router::new()
        .route("/", post(create_asistencia))
        .route(
            "/:id",
            put(update_asistencia)
                .patch(update_asistencia)
                .delete(delete_asistencia),
        )
        .with_permission(perm::ASISTENCIA_WRITE);

    let validate = Router::new()
        .route("/:id/validar", post(validar_asistencia))
        .with_permission(perm::ASISTENCIA_VALIDATE);

    read.merge(write).merge(validate)
}

fn turno_routes() -> Router<AppState> {
    use handlers::turnos::*;

    let read = Router::new()
        .route("/", get(list_turnos))
        .route("/asignaciones", get(list_asignaciones))
        .route("/asignaciones/:id", get(get_asignacion))
        .route("/horarios", get(list_horarios))
        .route("/horarios/:id", get(get_horario))
        .route("/:id", get(get_turno))
        .with_permission(perm::TURNOS_READ);

    let manage = Router::new()
        .route("/", post(create_turno))
        .route("/asignaciones", post(create_asignacion))
        .route("/asignaciones/:id", delete(delete_asignacion))
        .route("/horarios", post(create_horario))
        .route(
            "/horarios/:id",
            put(update_horario).patch(update_horario).delete(delete_horario),
        )
        .route(
            "/:id",
            put(update_turno).patch(update_turno).delete(delete_turno),
        )
        .with_permission(perm::TURNOS_MANAGE);

    read.merge(manage)
}

fn solicitud_routes() -> Router<AppState> {
    use handlers::solicitudes::*;

    let read = Router::new()
        .route("/tipos-solicitudes", get(list_tipos))
        .route("/tipos-solicitudes/:id", get(get_tipo))
        .route("/solicitudes", get(list_solicitudes))
        .route("/solicitudes/:id", get(get_solicitud))
        .with_permission(perm::SOLICITUDES_READ);

    let tipos = Router::new()
        .route("/tipos-solicitudes", post(create_tipo))
        .route(
            "/tipos-solicitudes/:id",
            put(update_tipo).patch(update_tipo).delete(delete_tipo),
        )
        .with_permission(perm::TIPOS_SOLICITUD_MANAGE);

    // Ownership of the request is checked by the service.
    let create = Router::new()
        .route("/solicitudes", post(create_solicitud))
        .route(
            "/solicitudes/:id",
            put(update_solicitud)
                .patch(update_solicitud)
                .delete(delete_solicitud),
        )
        .route("/solicitudes/:id/cancelar", post(cancelar_solicitud))
        .with_permission(perm::SOLICITUDES_CREATE);

    let approve = Router::new()
        .route("/solicitudes/:id/aprobar", post(aprobar_solicitud))
        .route("/solicitudes/:id/rechazar", post(rechazar_solicitud))
        .with_permission(perm::SOLICITUDES_APPROVE);

    read.merge(tipos).merge(create).merge(approve)
}

fn notificacion_routes() -> Router<AppState> {
    use handlers::notificaciones::*;

    Router::new()
        .route("/notificaciones", get(list_notificaciones))
        .route("/notificaciones/leer-todas", post(marcar_todas))
        .route("/notificaciones/:id/leer", post(marcar_leida))
        .with_permission(perm::NOTIFICACIONES_READ)
}

fn tarea_routes() -> Router<AppState> {
    use handlers::tareas::*;

    let read = Router::new()
        .route("/tareas", get(list_tareas))
        .route("/tareas/:id", get(get_tarea))
        .route("/tareas/:id/comentarios", get(list_comentarios))
        .route("/tareas/:id/historial", get(historial))
        .with_permission(perm::TAREAS_READ);

    let write = Router::new()
        .route("/tareas", post(create_tarea))
        .route(
            "/tareas/:id",
            put(update_tarea).patch(update_tarea).delete(delete_tarea),
        )
        .route("/tareas/:id/completar", post(completar_tarea))
        .route("/tareas/:id/actualizar_progreso", post(actualizar_progreso))
        .route("/tareas/:id/comentarios", post(create_comentario))
        .with_permission(perm::TAREAS_WRITE);

    read.merge(write)
}

fn inventario_routes() -> Router<AppState> {
    use handlers::inventario::*;

    let read = Router::new()
        .route("/", get(list_inventario))
        .route("/stats", get(stats))
        .route("/low_stock", get(low_stock))
        .route("/expiring_soon", get(expiring_soon))
        .route("/expired", get(expired))
        .route("/by_category", get(by_category))
        .route("/search", get(search))
        .route("/:id", get(get_inventario))
        .with_permission(perm::INVENTARIO_READ);

    let write = Router::new()
        .route("/", post(create_inventario))
        .route(
            "/:id",
            put(update_inventario)
                .patch(update_inventario)
                .delete(delete_inventario),
        )
        .route("/:id/update_stock", post(update_stock))
        .with_permission(perm::INVENTARIO_WRITE);

    read.merge(write)
}

fn proveedor_routes() -> Router<AppState> {
    use handlers::proveedores::*;

    let read = Router::new()
        .route("/", get(list_proveedores))
        .route("/activos", get(activos))
        .route("/:id", get(get_proveedor))
        .route("/:id/historial_compras", get(historial_compras))
        .with_permission(perm::PROVEEDORES_READ);

    let write = Router::new()
        .route("/", post(create_proveedor))
        .route(
            "/:id",
            put(update_proveedor)
                .patch(update_proveedor)
                .delete(delete_proveedor),
        )
        .with_permission(perm::PROVEEDORES_WRITE);

    read.merge(write)
}

fn orden_compra_routes() -> Router<AppState> {
    use handlers::ordenes_compra::*;

    let read = Router::new()
        .route("/", get(list_ordenes))
        .route("/por_proveedor", get(por_proveedor))
        .route("/estadisticas", get(estadisticas))
        .route("/:id", get(get_orden))
        .with_permission(perm::ORDENES_READ);

    let write = Router::new()
        .route("/", post(create_orden))
        .route(
            "/:id",
            put(update_orden).patch(update_orden).delete(delete_orden),
        )
        .route("/:id/recibir", post(recibir_orden))
        .route("/:id/agregar_item", post(agregar_item))
        .route("/:id/eliminar_item", delete(eliminar_item))
        .with_permission(perm::ORDENES_WRITE);

    let approve = Router::new()
        .route("/:id/aprobar", post(aprobar_orden))
        .with_permission(perm::ORDENES_APPROVE);

    read.merge(write).merge(approve)
}

fn sistema_routes() -> Router<AppState> {
    use handlers::sistema::*;

    let configuracion_read = Router::new()
        .route("/configuracion", get(list_configuracion))
        .route("/configuracion/:clave", get(get_configuracion))
        .with_permission(perm::CONFIGURACION_READ);

    let configuracion_manage = Router::new()
        .route("/configuracion", post(create_configuracion))
        .route(
            "/configuracion/:clave",
            put(update_configuracion)
                .patch(update_configuracion)
                .delete(delete_configuracion),
        )
        .with_permission(perm::CONFIGURACION_MANAGE);

    let reportes_read = Router::new()
        .route("/reportes", get(list_reportes))
        .route("/reportes/:id", get(get_reporte))
        .with_permission(perm::REPORTES_READ);

    let reportes_generate = Router::new()
        .route("/reportes", post(generar_reporte))
        .with_permission(perm::REPORTES_GENERATE);

    let logs = Router::new()
        .route("/logs", get(list_logs))
        .with_permission(perm::AUDITORIA_READ);

    configuracion_read
        .merge(configuracion_manage)
        .merge(reportes_read)
        .merge(reportes_generate)
        .merge(logs)
}

/// Every `/api` route. All but the login route resolve a caller and check a permission.
pub fn api_routes() -> Router<AppState> {
    let dashboard = Router::new()
        .route("/dashboard", get(handlers::sistema::dashboard))
        .with_permission(perm::DASHBOARD_READ);

    Router::new()
        .route("/status", get(handlers::health::api_status))
        .route("/auth/login", post(handlers::auth::login))
        .nest(
            "/empleado",
            empleado_routes()
                .merge(solicitud_routes())
                .merge(notificacion_routes())
                .merge(tarea_routes()),
        )
        .nest("/asistencia", asistencia_routes())
        .nest("/turno", turno_routes())
        .nest("/inventario", inventario_routes())
        .nest("/proveedores", proveedor_routes())
        .nest("/ordenes-compra", orden_compra_routes())
        .nest("/sistema", sistema_routes())
        .merge(dashboard)
}

/// Full application router with state applied. The auth middleware finds the
/// `AuthService` in the request extensions.
pub fn app_router(state: AppState) -> Router {
    let auth_service = Arc::new(AuthService::new(state.db.clone()));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_routes())
        .layer(Extension(auth_service))
        .with_state(state)
}
