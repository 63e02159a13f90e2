pub mod asistencia;
pub mod auth;
pub mod common;
pub mod empleados;
pub mod health;
pub mod inventario;
pub mod notificaciones;
pub mod ordenes_compra;
pub mod proveedores;
pub mod sistema;
pub mod solicitudes;
pub mod tareas;
pub mod turnos;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        asistencia::AsistenciaService,
        auditoria::AuditoriaService,
        empleados::EmpleadoService,
        inventario::InventarioService,
        notificaciones::NotificacionService,
        ordenes_compra::OrdenCompraService,
        proveedores::ProveedorService,
        sistema::{ConfiguracionService, DashboardService, ReporteService},
        solicitudes::SolicitudService,
        tareas::TareaService,
        turnos::TurnoService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub empleados: Arc<EmpleadoService>,
    pub asistencia: Arc<AsistenciaService>,
    pub turnos: Arc<TurnoService>,
    pub solicitudes: Arc<SolicitudService>,
    pub notificaciones: Arc<NotificacionService>,
    pub tareas: Arc<TareaService>,
    pub inventario: Arc<InventarioService>,
    pub proveedores: Arc<ProveedorService>,
    pub ordenes_compra: Arc<OrdenCompraService>,
    pub configuracion: Arc<ConfiguracionService>,
    pub reportes: Arc<ReporteService>,
    pub dashboard: Arc<DashboardService>,
    pub auditoria: Arc<AuditoriaService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            empleados: Arc::new(EmpleadoService::new(db_pool.clone())),
            asistencia: Arc::new(AsistenciaService::new(db_pool.clone())),
            turnos: Arc::new(TurnoService::new(db_pool.clone())),
            solicitudes: Arc::new(SolicitudService::new(db_pool.clone(), event_sender.clone())),
            notificaciones: Arc::new(NotificacionService::new(db_pool.clone())),
            tareas: Arc::new(TareaService::new(db_pool.clone(), event_sender.clone())),
            inventario: Arc::new(InventarioService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.stock_alert_days,
            )),
            proveedores: Arc::new(ProveedorService::new(db_pool.clone())),
            ordenes_compra: Arc::new(OrdenCompraService::new(db_pool.clone(), event_sender)),
            configuracion: Arc::new(ConfiguracionService::new(db_pool.clone())),
            reportes: Arc::new(ReporteService::new(db_pool.clone())),
            dashboard: Arc::new(DashboardService::new(db_pool.clone())),
            auditoria: Arc::new(AuditoriaService::new(db_pool)),
        }
    }
}
