//! Domain events and the background processor that turns them into
//! notifications.
//!
//! Services publish on an [`EventSender`] after their transaction commits.
//! Delivery is best effort: a full or closed channel is logged and the
//! originating request still succeeds.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::{
    db::DbPool,
    entities::{
        empleado::{self, EstadoEmpleado, Rol},
        notificacion::TipoNotificacion,
        solicitud::EstadoSolicitud,
    },
    errors::ServiceError,
    services::notificaciones::{crear_notificacion, NuevaNotificacion},
};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Publishes `event` if a sender is configured, logging instead of failing.
pub async fn publish(sender: &Option<Arc<EventSender>>, event: Event) {
    if let Some(sender) = sender {
        if let Err(e) = sender.send(event).await {
            warn!(error = %e, "event dropped");
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    SolicitudCreada {
        solicitud_id: i32,
        empleado_id: i32,
        empleado_nombre: String,
        tipo: String,
    },
    SolicitudResuelta {
        solicitud_id: i32,
        empleado_id: i32,
        estado: EstadoSolicitud,
        comentario: Option<String>,
    },
    TareaAsignada {
        tarea_id: i32,
        asignada_a_rut: String,
        titulo: String,
    },
    StockBajo {
        producto_id: i32,
        codigo_producto: String,
        nombre_producto: String,
        cantidad_actual: Decimal,
        cantidad_minima: Decimal,
    },
    OrdenCompraRecibida {
        orden_id: i32,
        numero_orden: String,
        completa: bool,
        creado_por: Option<i32>,
    },
}

/// Consumes events until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, db: Arc<DbPool>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!(?event, "Received event");
        if let Err(e) = handle_event(&db, event).await {
            error!(error = %e, "Failed to handle event");
        }
    }

    warn!("Event processing loop has ended");
}

async fn managers(db: &DbPool, roles: &[Rol]) -> Result<Vec<empleado::Model>, ServiceError> {
    let mut by_role = Condition::any();
    for rol in roles {
        by_role = by_role.add(empleado::Column::Rol.eq(*rol));
    }
    Ok(empleado::Entity::find()
        .filter(empleado::Column::Activo.eq(true))
        .filter(empleado::Column::Estado.ne(EstadoEmpleado::Inactivo))
        .filter(empleado::Column::Estado.ne(EstadoEmpleado::Desvinculado))
        .filter(by_role)
        .all(db)
        .await?)
}

async fn handle_event(db: &DbPool, event: Event) -> Result<(), ServiceError> {
    match event {
        Event::SolicitudCreada {
            solicitud_id,
            empleado_id,
            empleado_nombre,
            tipo,
        } => {
            for manager in managers(db, &[Rol::Gerente, Rol::Administrador]).await? {
                if manager.id == empleado_id {
                    continue;
                }
                crear_notificacion(
                    db,
                    NuevaNotificacion {
                        empleado_id: manager.id,
                        tipo: TipoNotificacion::Aprobacion,
                        titulo: "Nueva solicitud pendiente".to_string(),
                        mensaje: format!("{} envió una solicitud de {}", empleado_nombre, tipo),
                        modulo: Some("solicitudes".to_string()),
                        referencia_id: Some(solicitud_id),
                        requiere_accion: true,
                        url_accion: Some(format!("/api/empleado/solicitudes/{}", solicitud_id)),
                    },
                )
                .await?;
            }
        }
        Event::SolicitudResuelta {
            solicitud_id,
            empleado_id,
            estado,
            comentario,
        } => {
            let tipo = match estado {
                EstadoSolicitud::Aprobada => TipoNotificacion::Info,
                _ => TipoNotificacion::Alerta,
            };
            let mut mensaje = format!("Tu solicitud #{} fue {}", solicitud_id, estado);
            if let Some(c) = comentario.filter(|c| !c.trim().is_empty()) {
                mensaje.push_str(&format!(": {}", c));
            }
            crear_notificacion(
                db,
                NuevaNotificacion {
                    empleado_id,
                    tipo,
                    titulo: format!("Solicitud {}", estado),
                    mensaje,
                    modulo: Some("solicitudes".to_string()),
                    referencia_id: Some(solicitud_id),
                    requiere_accion: false,
                    url_accion: None,
                },
            )
            .await?;
        }
        Event::TareaAsignada {
            tarea_id,
            asignada_a_rut,
            titulo,
        } => {
            let asignado = empleado::Entity::find()
                .filter(empleado::Column::Rut.eq(asignada_a_rut.as_str()))
                .one(db)
                .await?;
            match asignado {
                Some(asignado) => {
                    crear_notificacion(
                        db,
                        NuevaNotificacion {
                            empleado_id: asignado.id,
                            tipo: TipoNotificacion::Recordatorio,
                            titulo: "Nueva tarea asignada".to_string(),
                            mensaje: titulo,
                            modulo: Some("tareas".to_string()),
                            referencia_id: Some(tarea_id),
                            requiere_accion: true,
                            url_accion: Some(format!("/api/empleado/tareas/{}", tarea_id)),
                        },
                    )
                    .await?;
                }
                None => warn!(rut = %asignada_a_rut, tarea_id, "assignee vanished before notification"),
            }
        }
        Event::StockBajo {
            producto_id,
            codigo_producto,
            nombre_producto,
            cantidad_actual,
            cantidad_minima,
        } => {
            for gerente in managers(db, &[Rol::Gerente, Rol::Administrador]).await? {
                crear_notificacion(
                    db,
                    NuevaNotificacion {
                        empleado_id: gerente.id,
                        tipo: TipoNotificacion::Alerta,
                        titulo: format!("Stock bajo: {}", nombre_producto),
                        mensaje: format!(
                            "{} ({}) tiene {} unidades; mínimo {}",
                            nombre_producto, codigo_producto, cantidad_actual, cantidad_minima
                        ),
                        modulo: Some("inventario".to_string()),
                        referencia_id: Some(producto_id),
                        requiere_accion: true,
                        url_accion: Some(format!("/api/inventario/{}", producto_id)),
                    },
                )
                .await?;
            }
        }
        Event::OrdenCompraRecibida {
            orden_id,
            numero_orden,
            completa,
            creado_por,
        } => {
            let destinatarios = match creado_por {
                Some(id) => vec![id],
                None => managers(db, &[Rol::Gerente])
                    .await?
                    .into_iter()
                    .map(|m| m.id)
                    .collect(),
            };
            let estado = if completa { "recibida" } else { "recibida parcialmente" };
            for empleado_id in destinatarios {
                crear_notificacion(
                    db,
                    NuevaNotificacion {
                        empleado_id,
                        tipo: TipoNotificacion::Info,
                        titulo: format!("Orden {} {}", numero_orden, estado),
                        mensaje: format!("La orden de compra {} fue {}", numero_orden, estado),
                        modulo: Some("ordenes_compra".to_string()),
                        referencia_id: Some(orden_id),
                        requiere_accion: false,
                        url_accion: Some(format!("/api/ordenes-compra/{}", orden_id)),
                    },
                )
                .await?;
            }
        }
    }
    Ok(())
}
