use chrono::{NaiveDate, Utc};
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{consts as perm, Caller},
    db::DbPool,
    entities::{
        empleado::Rol,
        solicitud::{self, EstadoSolicitud},
        tipo_solicitud,
    },
    errors::ServiceError,
    events::{publish, Event, EventSender},
    services::{
        auditoria::{registrar, Actividad},
        empleados::require_empleado,
        is_blank,
    },
};

static COLOR_HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

const COLOR_POR_DEFECTO: &str = "#007bff";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrearTipoSolicitud {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: String,
    pub descripcion: Option<String>,
    pub requiere_aprobacion: Option<bool>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub dias_anticipacion: Option<i32>,
    #[validate(regex(path = "COLOR_HEX", message = "Debe tener formato #RRGGBB"))]
    pub color_hex: Option<String>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ActualizarTipoSolicitud {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub requiere_aprobacion: Option<bool>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub dias_anticipacion: Option<i32>,
    #[validate(regex(path = "COLOR_HEX", message = "Debe tener formato #RRGGBB"))]
    pub color_hex: Option<String>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrearSolicitud {
    /// Defaults to the caller.
    pub empleado_rut: Option<String>,
    pub tipo_solicitud_id: i32,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    pub motivo: String,
    pub documento_adjunto: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActualizarSolicitud {
    pub tipo_solicitud_id: Option<i32>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub motivo: Option<String>,
    pub documento_adjunto: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Decision {
    pub comentario_aprobacion: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosSolicitud {
    pub estado: Option<EstadoSolicitud>,
    pub tipo_solicitud_id: Option<i32>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosTipo {
    pub incluir_inactivos: Option<bool>,
}

fn check_periodo(inicio: NaiveDate, fin: NaiveDate) -> Result<(), ServiceError> {
    if fin < inicio {
        return Err(ServiceError::field(
            "fecha_fin",
            "La fecha de fin no puede ser anterior a la fecha de inicio",
        ));
    }
    Ok(())
}

fn check_motivo(motivo: &str) -> Result<(), ServiceError> {
    if is_blank(motivo) {
        return Err(ServiceError::field("motivo", "El motivo es obligatorio"));
    }
    Ok(())
}

fn es_propia(caller: &Caller, solicitud: &solicitud::Model) -> bool {
    solicitud.empleado_id == caller.empleado_id
}

/// Leave-request workflow and its catalog of request types.
#[derive(Clone)]
pub struct SolicitudService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl SolicitudService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn list_tipos(
        &self,
        filtros: FiltrosTipo,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<tipo_solicitud::Model>, u64), ServiceError> {
        let mut query = tipo_solicitud::Entity::find();
        if !filtros.incluir_inactivos.unwrap_or(false) {
            query = query.filter(tipo_solicitud::Column::Activo.eq(true));
        }
        let query = query.order_by_asc(tipo_solicitud::Column::Nombre);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    pub async fn get_tipo(&self, id: i32) -> Result<tipo_solicitud::Model, ServiceError> {
        tipo_solicitud::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tipo de solicitud {} no encontrado", id)))
    }

    #[instrument(skip(self, caller, input), fields(nombre = %input.nombre))]
    pub async fn create_tipo(
        &self,
        caller: &Caller,
        input: CrearTipoSolicitud,
    ) -> Result<tipo_solicitud::Model, ServiceError> {
        input.validate()?;
        let txn = self.db_pool.begin().await?;
        let created = tipo_solicitud::ActiveModel {
            nombre: Set(input.nombre.trim().to_string()),
            descripcion: Set(input.descripcion),
            requiere_aprobacion: Set(input.requiere_aprobacion.unwrap_or(true)),
            dias_anticipacion: Set(input.dias_anticipacion.unwrap_or(1)),
            color_hex: Set(input.color_hex.unwrap_or_else(|| COLOR_POR_DEFECTO.to_string())),
            activo: Set(input.activo.unwrap_or(true)),
            fecha_creacion: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("solicitudes", "crear", "tipos_solicitudes")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update_tipo(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarTipoSolicitud,
    ) -> Result<tipo_solicitud::Model, ServiceError> {
        input.validate()?;
        let actual = self.get_tipo(id).await?;
        let mut active: tipo_solicitud::ActiveModel = actual.clone().into();
        if let Some(v) = input.nombre {
            active.nombre = Set(v.trim().to_string());
        }
        if let Some(v) = input.descripcion {
            active.descripcion = Set(Some(v));
        }
        if let Some(v) = input.requiere_aprobacion {
            active.requiere_aprobacion = Set(v);
        }
        if let Some(v) = input.dias_anticipacion {
            active.dias_anticipacion = Set(v);
        }
        if let Some(v) = input.color_hex {
            active.color_hex = Set(v);
        }
        if let Some(v) = input.activo {
            active.activo = Set(v);
        }

        let txn = self.db_pool.begin().await?;
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("solicitudes", "actualizar", "tipos_solicitudes")
                .registro(id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete_tipo(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.get_tipo(id).await?;
        let txn = self.db_pool.begin().await?;
        let mut active: tipo_solicitud::ActiveModel = actual.into();
        active.activo = Set(false);
        active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("solicitudes", "eliminar", "tipos_solicitudes").registro(id),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    async fn tipo_activo(&self, id: i32) -> Result<tipo_solicitud::Model, ServiceError> {
        tipo_solicitud::Entity::find_by_id(id)
            .filter(tipo_solicitud::Column::Activo.eq(true))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::field(
                    "tipo_solicitud_id",
                    format!("El tipo de solicitud {} no existe o no está activo", id),
                )
            })
    }

    /// Employees only see their own requests.
    #[instrument(skip(self, caller), fields(rut = %caller.rut))]
    pub async fn list(
        &self,
        caller: &Caller,
        filtros: FiltrosSolicitud,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<solicitud::Model>, u64), ServiceError> {
        let mut query = solicitud::Entity::find();
        if caller.rol == Rol::Empleado {
            query = query.filter(solicitud::Column::EmpleadoId.eq(caller.empleado_id));
        }
        if let Some(estado) = filtros.estado {
            query = query.filter(solicitud::Column::Estado.eq(estado));
        }
        if let Some(tipo) = filtros.tipo_solicitud_id {
            query = query.filter(solicitud::Column::TipoSolicitudId.eq(tipo));
        }
        if let Some(search) = filtros.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(solicitud::Column::Motivo.contains(search))
                    .add(solicitud::Column::EmpleadoRut.contains(search)),
            );
        }
        let query = query
            .order_by_desc(solicitud::Column::FechaCreacion)
            .order_by_desc(solicitud::Column::Id);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    async fn find(&self, id: i32) -> Result<solicitud::Model, ServiceError> {
        solicitud::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Solicitud {} no encontrada", id)))
    }

    pub async fn get(&self, caller: &Caller, id: i32) -> Result<solicitud::Model, ServiceError> {
        let solicitud = self.find(id).await?;
        if caller.rol == Rol::Empleado && !es_propia(caller, &solicitud) {
            return Err(ServiceError::Forbidden(
                "No puede ver solicitudes de otros empleados".to_string(),
            ));
        }
        Ok(solicitud)
    }

    #[instrument(skip(self, caller, input), fields(rut = %caller.rut, tipo = input.tipo_solicitud_id))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: CrearSolicitud,
    ) -> Result<solicitud::Model, ServiceError> {
        check_periodo(input.fecha_inicio, input.fecha_fin)?;
        check_motivo(&input.motivo)?;
        let tipo = self.tipo_activo(input.tipo_solicitud_id).await?;

        let db = &*self.db_pool;
        let solicitante = match input.empleado_rut.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            Some(raw) => {
                let empleado = require_empleado(db, "empleado_rut", raw).await?;
                if caller.rol == Rol::Empleado && empleado.id != caller.empleado_id {
                    return Err(ServiceError::Forbidden(
                        "Solo puede crear solicitudes para usted mismo".to_string(),
                    ));
                }
                empleado
            }
            None => require_empleado(db, "empleado_rut", &caller.rut).await?,
        };

        let now = Utc::now();
        let automatica = !tipo.requiere_aprobacion;
        let txn = db.begin().await?;
        let created = solicitud::ActiveModel {
            empleado_rut: Set(Some(solicitante.rut.clone())),
            empleado_id: Set(solicitante.id),
            tipo_solicitud_id: Set(tipo.id),
            fecha_inicio: Set(input.fecha_inicio),
            fecha_fin: Set(input.fecha_fin),
            motivo: Set(input.motivo.trim().to_string()),
            estado: Set(if automatica {
                EstadoSolicitud::Aprobada
            } else {
                EstadoSolicitud::Pendiente
            }),
            aprobado_por: Set(None),
            fecha_aprobacion: Set(automatica.then_some(now)),
            comentario_aprobacion: Set(None),
            documento_adjunto: Set(input.documento_adjunto),
            fecha_creacion: Set(now),
            fecha_actualizacion: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("solicitudes", "crear", "solicitudes")
                .registro(created.id)
                .descripcion(format!("Solicitud de {} para {}", tipo.nombre, solicitante.rut))
                .despues(&created),
        )
        .await?;
        txn.commit().await?;

        info!(id = created.id, estado = %created.estado, "solicitud created");
        if created.estado == EstadoSolicitud::Pendiente {
            publish(
                &self.event_sender,
                Event::SolicitudCreada {
                    solicitud_id: created.id,
                    empleado_id: solicitante.id,
                    empleado_nombre: solicitante.nombre_completo(),
                    tipo: tipo.nombre,
                },
            )
            .await;
        }
        Ok(created)
    }

    /// Edits a pending request. Employees may only touch their own.
    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarSolicitud,
    ) -> Result<solicitud::Model, ServiceError> {
        let actual = self.get(caller, id).await?;
        if actual.estado != EstadoSolicitud::Pendiente {
            return Err(ServiceError::InvalidOperation(format!(
                "Solo se pueden modificar solicitudes pendientes (estado actual: {})",
                actual.estado
            )));
        }
        check_periodo(
            input.fecha_inicio.unwrap_or(actual.fecha_inicio),
            input.fecha_fin.unwrap_or(actual.fecha_fin),
        )?;
        if let Some(motivo) = &input.motivo {
            check_motivo(motivo)?;
        }

        let mut active: solicitud::ActiveModel = actual.clone().into();
        if let Some(tipo_id) = input.tipo_solicitud_id {
            active.tipo_solicitud_id = Set(self.tipo_activo(tipo_id).await?.id);
        }
        if let Some(v) = input.fecha_inicio {
            active.fecha_inicio = Set(v);
        }
        if let Some(v) = input.fecha_fin {
            active.fecha_fin = Set(v);
        }
        if let Some(v) = input.motivo {
            active.motivo = Set(v.trim().to_string());
        }
        if let Some(v) = input.documento_adjunto {
            active.documento_adjunto = Set(Some(v));
        }
        active.fecha_actualizacion = Set(Utc::now());

        let txn = self.db_pool.begin().await?;
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("solicitudes", "actualizar", "solicitudes")
                .registro(id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Removes a pending request. Owner or manager only.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.find(id).await?;
        if !es_propia(caller, &actual) && !caller.is_manager() {
            return Err(ServiceError::Forbidden(
                "Solo el solicitante o un gerente puede eliminar la solicitud".to_string(),
            ));
        }
        if actual.estado != EstadoSolicitud::Pendiente {
            return Err(ServiceError::InvalidOperation(
                "Solo se pueden eliminar solicitudes pendientes".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        solicitud::Entity::delete_by_id(id).exec(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("solicitudes", "eliminar", "solicitudes")
                .registro(id)
                .antes(&actual),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn aprobar(
        &self,
        caller: &Caller,
        id: i32,
        decision: Decision,
    ) -> Result<solicitud::Model, ServiceError> {
        self.resolver(caller, id, EstadoSolicitud::Aprobada, decision.comentario_aprobacion)
            .await
    }

    pub async fn rechazar(
        &self,
        caller: &Caller,
        id: i32,
        decision: Decision,
    ) -> Result<solicitud::Model, ServiceError> {
        self.resolver(caller, id, EstadoSolicitud::Rechazada, decision.comentario_aprobacion)
            .await
    }

    /// The requester, or anyone allowed to approve, can withdraw a pending request.
    pub async fn cancelar(&self, caller: &Caller, id: i32) -> Result<solicitud::Model, ServiceError> {
        let actual = self.find(id).await?;
        if !es_propia(caller, &actual) && !caller.has_permission(perm::SOLICITUDES_APPROVE) {
            return Err(ServiceError::Forbidden(
                "Solo el solicitante puede cancelar la solicitud".to_string(),
            ));
        }
        self.resolver(caller, id, EstadoSolicitud::Cancelada, None).await
    }

    #[instrument(skip(self, caller, comentario), fields(rut = %caller.rut))]
    async fn resolver(
        &self,
        caller: &Caller,
        id: i32,
        nuevo: EstadoSolicitud,
        comentario: Option<String>,
    ) -> Result<solicitud::Model, ServiceError> {
        let actual = self.find(id).await?;
        if !actual.estado.can_transition_to(nuevo) {
            warn!(id, actual = %actual.estado, nuevo = %nuevo, "solicitud transition rejected");
            return Err(ServiceError::InvalidOperation(format!(
                "No se puede pasar de {} a {}",
                actual.estado, nuevo
            )));
        }

        let now = Utc::now();
        let mut cambios = solicitud::Entity::update_many()
            .col_expr(solicitud::Column::Estado, Expr::value(nuevo))
            .col_expr(solicitud::Column::FechaActualizacion, Expr::value(now));
        if nuevo != EstadoSolicitud::Cancelada {
            cambios = cambios
                .col_expr(solicitud::Column::AprobadoPor, Expr::value(Some(caller.empleado_id)))
                .col_expr(solicitud::Column::FechaAprobacion, Expr::value(Some(now)))
                .col_expr(
                    solicitud::Column::ComentarioAprobacion,
                    Expr::value(comentario.clone()),
                );
        }

        // only one resolution wins when two arrive for the same pending row
        let txn = self.db_pool.begin().await?;
        let resultado = cambios
            .filter(solicitud::Column::Id.eq(id))
            .filter(solicitud::Column::Estado.eq(actual.estado))
            .exec(&txn)
            .await?;
        if resultado.rows_affected == 0 {
            warn!(id, nuevo = %nuevo, "solicitud resolved concurrently");
            return Err(ServiceError::InvalidOperation(
                "La solicitud ya fue resuelta".to_string(),
            ));
        }
        let updated = solicitud::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Solicitud {} no encontrada", id)))?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("solicitudes", "resolver", "solicitudes")
                .registro(id)
                .descripcion(format!("Solicitud {} {}", id, nuevo))
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;

        counter!("negocio.solicitudes.decision", 1, "estado" => nuevo.to_string());
        info!(id, estado = %nuevo, "solicitud resolved");

        if nuevo != EstadoSolicitud::Cancelada || !es_propia(caller, &updated) {
            publish(
                &self.event_sender,
                Event::SolicitudResuelta {
                    solicitud_id: updated.id,
                    empleado_id: updated.empleado_id,
                    estado: nuevo,
                    comentario,
                },
            )
            .await;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("#1a2B3c"), true)]
    #[case(Some("#007bff"), true)]
    #[case(Some("007bff"), false)]
    #[case(Some("#07bff"), false)]
    #[case(None, true)]
    fn color_must_be_hex(#[case] color: Option<&str>, #[case] ok: bool) {
        let input = CrearTipoSolicitud {
            nombre: "Vacaciones".into(),
            descripcion: None,
            requiere_aprobacion: None,
            dias_anticipacion: None,
            color_hex: color.map(str::to_string),
            activo: None,
        };
        assert_eq!(input.validate().is_ok(), ok);
    }

    #[test]
    fn period_and_reason_checks() {
        let d = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(check_periodo(d, d).is_ok());
        assert!(check_periodo(d, d.pred_opt().unwrap()).is_err());
        assert!(check_motivo("  ").is_err());
        assert!(check_motivo("Viaje familiar").is_ok());
    }
}
