use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::Caller,
    db::DbPool,
    entities::{
        tarea::{self, EstadoTarea, Frecuencia, Prioridad, TipoTarea},
        tarea_comentario, tarea_historial,
    },
    errors::ServiceError,
    events::{publish, Event, EventSender},
    rut,
    services::{
        auditoria::{registrar, Actividad},
        empleados::require_empleado,
        is_blank,
    },
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrearTarea {
    #[validate(length(max = 200, message = "Máximo 200 caracteres"))]
    pub titulo: String,
    pub descripcion: Option<String>,
    pub tipo_tarea: Option<TipoTarea>,
    pub prioridad: Option<Prioridad>,
    pub estado: Option<EstadoTarea>,
    pub asignada_a_rut: Option<String>,
    pub fecha_inicio: Option<DateTime<Utc>>,
    pub fecha_vencimiento: Option<DateTime<Utc>>,
    pub es_recurrente: Option<bool>,
    pub frecuencia_recurrencia: Option<Frecuencia>,
    pub dias_recurrencia: Option<Value>,
    pub ubicacion: Option<String>,
    pub modulo_relacionado: Option<String>,
    pub registro_relacionado_id: Option<i32>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub tiempo_estimado_minutos: Option<i32>,
    #[validate(range(min = 0, max = 100, message = "Debe estar entre 0 y 100"))]
    pub porcentaje_completado: Option<i32>,
    pub notas: Option<String>,
    pub archivo_adjunto: Option<String>,
    pub requiere_aprobacion: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ActualizarTarea {
    #[validate(length(max = 200, message = "Máximo 200 caracteres"))]
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    pub tipo_tarea: Option<TipoTarea>,
    pub prioridad: Option<Prioridad>,
    pub estado: Option<EstadoTarea>,
    pub asignada_a_rut: Option<String>,
    pub fecha_inicio: Option<DateTime<Utc>>,
    pub fecha_vencimiento: Option<DateTime<Utc>>,
    pub es_recurrente: Option<bool>,
    pub frecuencia_recurrencia: Option<Frecuencia>,
    pub dias_recurrencia: Option<Value>,
    pub ubicacion: Option<String>,
    pub modulo_relacionado: Option<String>,
    pub registro_relacionado_id: Option<i32>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub tiempo_estimado_minutos: Option<i32>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub tiempo_real_minutos: Option<i32>,
    #[validate(range(min = 0, max = 100, message = "Debe estar entre 0 y 100"))]
    pub porcentaje_completado: Option<i32>,
    pub notas: Option<String>,
    pub archivo_adjunto: Option<String>,
    pub requiere_aprobacion: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Progreso {
    pub porcentaje_completado: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NuevoComentario {
    pub comentario: String,
    pub archivo_adjunto: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosTarea {
    pub estado: Option<EstadoTarea>,
    pub prioridad: Option<Prioridad>,
    pub asignada_a_rut: Option<String>,
    pub search: Option<String>,
}

/// Cross-field rules shared by create and update.
fn check_reglas(
    titulo: &str,
    fecha_inicio: Option<DateTime<Utc>>,
    fecha_vencimiento: Option<DateTime<Utc>>,
    es_recurrente: bool,
    frecuencia: Option<Frecuencia>,
) -> Result<(), ServiceError> {
    if is_blank(titulo) {
        return Err(ServiceError::field("titulo", "El título es obligatorio"));
    }
    if let (Some(inicio), Some(vencimiento)) = (fecha_inicio, fecha_vencimiento) {
        if vencimiento < inicio {
            return Err(ServiceError::field(
                "fecha_vencimiento",
                "La fecha de vencimiento no puede ser anterior a la de inicio",
            ));
        }
    }
    if es_recurrente && frecuencia.is_none() {
        return Err(ServiceError::field(
            "frecuencia_recurrencia",
            "Una tarea recurrente necesita frecuencia",
        ));
    }
    Ok(())
}

fn texto<T: ToString>(valor: Option<T>) -> Option<String> {
    valor.map(|v| v.to_string())
}

/// One history row. `campo` is `None` for whole-task events.
struct Cambio {
    accion: &'static str,
    campo: Option<&'static str>,
    anterior: Option<String>,
    nuevo: Option<String>,
    descripcion: Option<String>,
}

impl Cambio {
    fn evento(accion: &'static str, descripcion: impl Into<String>) -> Self {
        Self {
            accion,
            campo: None,
            anterior: None,
            nuevo: None,
            descripcion: Some(descripcion.into()),
        }
    }

    fn campo(campo: &'static str, anterior: Option<String>, nuevo: Option<String>) -> Self {
        Self {
            accion: "actualizar",
            campo: Some(campo),
            anterior,
            nuevo,
            descripcion: None,
        }
    }
}

async fn anotar<C: ConnectionTrait>(
    db: &C,
    tarea_id: i32,
    rut: &str,
    cambio: Cambio,
) -> Result<(), ServiceError> {
    tarea_historial::ActiveModel {
        tarea_id: Set(tarea_id),
        empleado_rut: Set(rut.to_string()),
        accion: Set(cambio.accion.to_string()),
        campo_modificado: Set(cambio.campo.map(str::to_string)),
        valor_anterior: Set(cambio.anterior),
        valor_nuevo: Set(cambio.nuevo),
        descripcion: Set(cambio.descripcion),
        fecha_registro: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Field-level differences tracked in the task history.
fn diferencias(antes: &tarea::Model, despues: &tarea::Model) -> Vec<Cambio> {
    let mut cambios = Vec::new();
    if antes.estado != despues.estado {
        cambios.push(Cambio::campo(
            "estado",
            Some(antes.estado.to_string()),
            Some(despues.estado.to_string()),
        ));
    }
    if antes.prioridad != despues.prioridad {
        cambios.push(Cambio::campo(
            "prioridad",
            Some(antes.prioridad.to_string()),
            Some(despues.prioridad.to_string()),
        ));
    }
    if antes.asignada_a_rut != despues.asignada_a_rut {
        cambios.push(Cambio::campo(
            "asignada_a_rut",
            antes.asignada_a_rut.clone(),
            despues.asignada_a_rut.clone(),
        ));
    }
    if antes.porcentaje_completado != despues.porcentaje_completado {
        cambios.push(Cambio::campo(
            "porcentaje_completado",
            Some(antes.porcentaje_completado.to_string()),
            Some(despues.porcentaje_completado.to_string()),
        ));
    }
    if antes.titulo != despues.titulo {
        cambios.push(Cambio::campo(
            "titulo",
            Some(antes.titulo.clone()),
            Some(despues.titulo.clone()),
        ));
    }
    if antes.fecha_vencimiento != despues.fecha_vencimiento {
        cambios.push(Cambio::campo(
            "fecha_vencimiento",
            texto(antes.fecha_vencimiento.map(|f| f.to_rfc3339())),
            texto(despues.fecha_vencimiento.map(|f| f.to_rfc3339())),
        ));
    }
    cambios
}

fn marcar_completada(active: &mut tarea::ActiveModel, now: DateTime<Utc>) {
    active.estado = Set(EstadoTarea::Completada);
    active.porcentaje_completado = Set(100);
    active.fecha_completada = Set(Some(now));
}

#[derive(Clone)]
pub struct TareaService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl TareaService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn notificar_asignacion(&self, tarea: &tarea::Model) {
        if let Some(rut) = &tarea.asignada_a_rut {
            publish(
                &self.event_sender,
                Event::TareaAsignada {
                    tarea_id: tarea.id,
                    asignada_a_rut: rut.clone(),
                    titulo: tarea.titulo.clone(),
                },
            )
            .await;
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filtros: FiltrosTarea,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<tarea::Model>, u64), ServiceError> {
        let mut query = tarea::Entity::find().filter(tarea::Column::Activo.eq(true));
        if let Some(estado) = filtros.estado {
            query = query.filter(tarea::Column::Estado.eq(estado));
        }
        if let Some(prioridad) = filtros.prioridad {
            query = query.filter(tarea::Column::Prioridad.eq(prioridad));
        }
        if let Some(raw) = filtros.asignada_a_rut.as_deref() {
            query = query.filter(tarea::Column::AsignadaARut.eq(rut::canonical(raw)));
        }
        if let Some(search) = filtros.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(tarea::Column::Titulo.contains(search))
                    .add(tarea::Column::Descripcion.contains(search)),
            );
        }
        let query = query
            .order_by_desc(tarea::Column::FechaCreacion)
            .order_by_desc(tarea::Column::Id);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    pub async fn get(&self, id: i32) -> Result<tarea::Model, ServiceError> {
        tarea::Entity::find_by_id(id)
            .filter(tarea::Column::Activo.eq(true))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tarea {} no encontrada", id)))
    }

    #[instrument(skip(self, caller, input), fields(rut = %caller.rut))]
    pub async fn create(&self, caller: &Caller, input: CrearTarea) -> Result<tarea::Model, ServiceError> {
        input.validate()?;
        let es_recurrente = input.es_recurrente.unwrap_or(false);
        check_reglas(
            &input.titulo,
            input.fecha_inicio,
            input.fecha_vencimiento,
            es_recurrente,
            input.frecuencia_recurrencia,
        )?;
        let db = &*self.db_pool;
        let asignada = match input.asignada_a_rut.as_deref() {
            Some(raw) => Some(require_empleado(db, "asignada_a_rut", raw).await?.rut),
            None => None,
        };

        let now = Utc::now();
        let porcentaje = input.porcentaje_completado.unwrap_or(0);
        let estado = match input.estado {
            Some(estado) => estado,
            None if porcentaje >= 100 => EstadoTarea::Completada,
            None => EstadoTarea::Pendiente,
        };
        let mut active = tarea::ActiveModel {
            titulo: Set(input.titulo.trim().to_string()),
            descripcion: Set(input.descripcion),
            tipo_tarea: Set(input.tipo_tarea.unwrap_or(TipoTarea::General)),
            prioridad: Set(input.prioridad.unwrap_or(Prioridad::Media)),
            estado: Set(estado),
            asignada_a_rut: Set(asignada),
            creada_por_rut: Set(caller.rut.clone()),
            fecha_inicio: Set(input.fecha_inicio),
            fecha_vencimiento: Set(input.fecha_vencimiento),
            fecha_completada: Set(None),
            es_recurrente: Set(es_recurrente),
            frecuencia_recurrencia: Set(input.frecuencia_recurrencia),
            dias_recurrencia: Set(input.dias_recurrencia),
            ubicacion: Set(input.ubicacion),
            modulo_relacionado: Set(input.modulo_relacionado),
            registro_relacionado_id: Set(input.registro_relacionado_id),
            tiempo_estimado_minutos: Set(input.tiempo_estimado_minutos),
            tiempo_real_minutos: Set(None),
            porcentaje_completado: Set(porcentaje),
            notas: Set(input.notas),
            archivo_adjunto: Set(input.archivo_adjunto),
            requiere_aprobacion: Set(input.requiere_aprobacion.unwrap_or(false)),
            aprobada_por_rut: Set(None),
            fecha_aprobacion: Set(None),
            fecha_creacion: Set(now),
            fecha_actualizacion: Set(now),
            activo: Set(true),
            ..Default::default()
        };
        if estado == EstadoTarea::Completada {
            marcar_completada(&mut active, now);
        }

        let txn = db.begin().await?;
        let created = active.insert(&txn).await?;

        anotar(&txn, created.id, &caller.rut, Cambio::evento("crear", "Tarea creada")).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("tareas", "crear", "tareas")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;

        info!(id = created.id, asignada = ?created.asignada_a_rut, "tarea created");
        self.notificar_asignacion(&created).await;
        Ok(created)
    }

    #[instrument(skip(self, caller, input), fields(rut = %caller.rut))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarTarea,
    ) -> Result<tarea::Model, ServiceError> {
        input.validate()?;
        let actual = self.get(id).await?;
        let db = &*self.db_pool;

        check_reglas(
            input.titulo.as_deref().unwrap_or(&actual.titulo),
            input.fecha_inicio.or(actual.fecha_inicio),
            input.fecha_vencimiento.or(actual.fecha_vencimiento),
            input.es_recurrente.unwrap_or(actual.es_recurrente),
            input.frecuencia_recurrencia.or(actual.frecuencia_recurrencia),
        )?;

        let now = Utc::now();
        let mut active: tarea::ActiveModel = actual.clone().into();
        if let Some(raw) = input.asignada_a_rut.as_deref() {
            active.asignada_a_rut = Set(Some(require_empleado(db, "asignada_a_rut", raw).await?.rut));
        }
        if let Some(v) = input.titulo {
            active.titulo = Set(v.trim().to_string());
        }
        if let Some(v) = input.descripcion {
            active.descripcion = Set(Some(v));
        }
        if let Some(v) = input.tipo_tarea {
            active.tipo_tarea = Set(v);
        }
        if let Some(v) = input.prioridad {
            active.prioridad = Set(v);
        }
        if let Some(v) = input.fecha_inicio {
            active.fecha_inicio = Set(Some(v));
        }
        if let Some(v) = input.fecha_vencimiento {
            active.fecha_vencimiento = Set(Some(v));
        }
        if let Some(v) = input.es_recurrente {
            active.es_recurrente = Set(v);
        }
        if let Some(v) = input.frecuencia_recurrencia {
            active.frecuencia_recurrencia = Set(Some(v));
        }
        if let Some(v) = input.dias_recurrencia {
            active.dias_recurrencia = Set(Some(v));
        }
        if let Some(v) = input.ubicacion {
            active.ubicacion = Set(Some(v));
        }
        if let Some(v) = input.modulo_relacionado {
            active.modulo_relacionado = Set(Some(v));
        }
        if let Some(v) = input.registro_relacionado_id {
            active.registro_relacionado_id = Set(Some(v));
        }
        if let Some(v) = input.tiempo_estimado_minutos {
            active.tiempo_estimado_minutos = Set(Some(v));
        }
        if let Some(v) = input.tiempo_real_minutos {
            active.tiempo_real_minutos = Set(Some(v));
        }
        if let Some(v) = input.notas {
            active.notas = Set(Some(v));
        }
        if let Some(v) = input.archivo_adjunto {
            active.archivo_adjunto = Set(Some(v));
        }
        if let Some(v) = input.requiere_aprobacion {
            active.requiere_aprobacion = Set(v);
        }
        if let Some(v) = input.porcentaje_completado {
            active.porcentaje_completado = Set(v);
        }
        match input.estado {
            Some(EstadoTarea::Completada) => marcar_completada(&mut active, now),
            Some(estado) => {
                active.estado = Set(estado);
                active.fecha_completada = Set(None);
            }
            None if input.porcentaje_completado == Some(100) => marcar_completada(&mut active, now),
            None => {}
        }
        active.fecha_actualizacion = Set(now);

        let txn = db.begin().await?;
        let updated = active.update(&txn).await?;
        for cambio in diferencias(&actual, &updated) {
            anotar(&txn, id, &caller.rut, cambio).await?;
        }
        registrar(
            &txn,
            Some(caller),
            Actividad::new("tareas", "actualizar", "tareas")
                .registro(id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;

        if updated.asignada_a_rut != actual.asignada_a_rut {
            self.notificar_asignacion(&updated).await;
        }
        Ok(updated)
    }

    /// Soft delete.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.get(id).await?;
        let txn = self.db_pool.begin().await?;
        let mut active: tarea::ActiveModel = actual.into();
        active.activo = Set(false);
        active.fecha_actualizacion = Set(Utc::now());
        active.update(&txn).await?;
        anotar(&txn, id, &caller.rut, Cambio::evento("eliminar", "Tarea eliminada")).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("tareas", "eliminar", "tareas").registro(id),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, caller))]
    pub async fn completar(&self, caller: &Caller, id: i32) -> Result<tarea::Model, ServiceError> {
        let actual = self.get(id).await?;
        if actual.estado == EstadoTarea::Cancelada {
            warn!(id, "attempt to complete a cancelled tarea");
            return Err(ServiceError::InvalidOperation(
                "No se puede completar una tarea cancelada".to_string(),
            ));
        }

        let now = Utc::now();
        let txn = self.db_pool.begin().await?;
        let mut active: tarea::ActiveModel = actual.clone().into();
        marcar_completada(&mut active, now);
        active.fecha_actualizacion = Set(now);
        let updated = active.update(&txn).await?;
        anotar(
            &txn,
            id,
            &caller.rut,
            Cambio {
                accion: "completar",
                campo: Some("estado"),
                anterior: Some(actual.estado.to_string()),
                nuevo: Some(updated.estado.to_string()),
                descripcion: Some("Tarea completada".to_string()),
            },
        )
        .await?;
        txn.commit().await?;

        info!(id, "tarea completed");
        Ok(updated)
    }

    /// 100 behaves like [`TareaService::completar`]; any progress moves a
    /// pending task to en_proceso.
    #[instrument(skip(self, caller))]
    pub async fn actualizar_progreso(
        &self,
        caller: &Caller,
        id: i32,
        progreso: Progreso,
    ) -> Result<tarea::Model, ServiceError> {
        let porcentaje = progreso.porcentaje_completado;
        if !(0..=100).contains(&porcentaje) {
            return Err(ServiceError::field(
                "porcentaje_completado",
                "Debe estar entre 0 y 100",
            ));
        }
        if porcentaje == 100 {
            return self.completar(caller, id).await;
        }

        let actual = self.get(id).await?;
        let now = Utc::now();
        let txn = self.db_pool.begin().await?;
        let mut active: tarea::ActiveModel = actual.clone().into();
        active.porcentaje_completado = Set(porcentaje);
        if porcentaje > 0 && actual.estado == EstadoTarea::Pendiente {
            active.estado = Set(EstadoTarea::EnProceso);
        }
        active.fecha_actualizacion = Set(now);
        let updated = active.update(&txn).await?;
        anotar(
            &txn,
            id,
            &caller.rut,
            Cambio {
                accion: "progreso",
                campo: Some("porcentaje_completado"),
                anterior: Some(actual.porcentaje_completado.to_string()),
                nuevo: Some(porcentaje.to_string()),
                descripcion: None,
            },
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    pub async fn comentarios(&self, id: i32) -> Result<Vec<tarea_comentario::Model>, ServiceError> {
        self.get(id).await?;
        Ok(tarea_comentario::Entity::find()
            .filter(tarea_comentario::Column::TareaId.eq(id))
            .order_by_asc(tarea_comentario::Column::FechaCreacion)
            .order_by_asc(tarea_comentario::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, caller, input), fields(rut = %caller.rut))]
    pub async fn comentar(
        &self,
        caller: &Caller,
        id: i32,
        input: NuevoComentario,
    ) -> Result<tarea_comentario::Model, ServiceError> {
        if is_blank(&input.comentario) {
            return Err(ServiceError::field("comentario", "El comentario no puede estar vacío"));
        }
        self.get(id).await?;

        let txn = self.db_pool.begin().await?;
        let created = tarea_comentario::ActiveModel {
            tarea_id: Set(id),
            empleado_rut: Set(caller.rut.clone()),
            comentario: Set(input.comentario.trim().to_string()),
            archivo_adjunto: Set(input.archivo_adjunto),
            fecha_creacion: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        anotar(&txn, id, &caller.rut, Cambio::evento("comentar", "Comentario agregado")).await?;
        txn.commit().await?;
        Ok(created)
    }

    /// Oldest first.
    pub async fn historial(&self, id: i32) -> Result<Vec<tarea_historial::Model>, ServiceError> {
        self.get(id).await?;
        Ok(tarea_historial::Entity::find()
            .filter(tarea_historial::Column::TareaId.eq(id))
            .order_by_asc(tarea_historial::Column::FechaRegistro)
            .order_by_asc(tarea_historial::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn model() -> tarea::Model {
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        tarea::Model {
            id: 1,
            titulo: "Inventario semanal".into(),
            descripcion: None,
            tipo_tarea: TipoTarea::Inventario,
            prioridad: Prioridad::Media,
            estado: EstadoTarea::Pendiente,
            asignada_a_rut: None,
            creada_por_rut: "12345678-5".into(),
            fecha_inicio: None,
            fecha_vencimiento: None,
            fecha_completada: None,
            es_recurrente: false,
            frecuencia_recurrencia: None,
            dias_recurrencia: None,
            ubicacion: None,
            modulo_relacionado: None,
            registro_relacionado_id: None,
            tiempo_estimado_minutos: None,
            tiempo_real_minutos: None,
            porcentaje_completado: 0,
            notas: None,
            archivo_adjunto: None,
            requiere_aprobacion: false,
            aprobada_por_rut: None,
            fecha_aprobacion: None,
            fecha_creacion: now,
            fecha_actualizacion: now,
            activo: true,
        }
    }

    #[test]
    fn tracked_fields_produce_history_rows() {
        let antes = model();
        let mut despues = antes.clone();
        despues.estado = EstadoTarea::EnProceso;
        despues.asignada_a_rut = Some("11111111-1".into());
        despues.notas = Some("no se rastrea".into());

        let cambios = diferencias(&antes, &despues);
        let campos: Vec<_> = cambios.iter().filter_map(|c| c.campo).collect();
        assert_eq!(campos, vec!["estado", "asignada_a_rut"]);
        assert_eq!(cambios[0].anterior.as_deref(), Some("pendiente"));
        assert_eq!(cambios[0].nuevo.as_deref(), Some("en_proceso"));
    }

    #[test]
    fn unchanged_task_has_no_history() {
        assert!(diferencias(&model(), &model()).is_empty());
    }

    #[test]
    fn recurring_tasks_need_a_frequency() {
        assert!(check_reglas("x", None, None, true, None).is_err());
        assert!(check_reglas("x", None, None, true, Some(Frecuencia::Semanal)).is_ok());
        assert!(check_reglas("  ", None, None, false, None).is_err());
    }

    #[test]
    fn due_date_must_follow_start() {
        let inicio = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        let antes = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        match check_reglas("x", Some(inicio), Some(antes), false, None) {
            Err(ServiceError::InvalidFields(f)) => assert!(f.contains_key("fecha_vencimiento")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
