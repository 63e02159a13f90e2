use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    auth::Caller,
    db::DbPool,
    entities::{
        asistencia::{self, EstadoAsistencia, TipoMarcaje},
        empleado,
    },
    errors::{is_unique_violation, ServiceError},
    rut,
    services::{
        auditoria::{registrar, Actividad},
        empleados::{activos_query, require_empleado},
    },
};

/// Attendance record as sent by clients. Any `horas_trabajadas` in the body
/// is ignored; it is always derived from the two timestamps.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrearAsistencia {
    pub empleado_rut: String,
    pub fecha: Option<NaiveDate>,
    pub hora_entrada: Option<DateTime<Utc>>,
    pub hora_salida: Option<DateTime<Utc>>,
    pub tipo_entrada: Option<TipoMarcaje>,
    pub tipo_salida: Option<TipoMarcaje>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub minutos_tarde: Option<i32>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub minutos_extras: Option<i32>,
    pub estado: Option<EstadoAsistencia>,
    pub observaciones: Option<String>,
    pub ubicacion_entrada: Option<String>,
    pub ubicacion_salida: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ActualizarAsistencia {
    pub empleado_rut: Option<String>,
    pub fecha: Option<NaiveDate>,
    pub hora_entrada: Option<DateTime<Utc>>,
    pub hora_salida: Option<DateTime<Utc>>,
    pub tipo_entrada: Option<TipoMarcaje>,
    pub tipo_salida: Option<TipoMarcaje>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub minutos_tarde: Option<i32>,
    #[validate(range(min = 0, message = "No puede ser negativo"))]
    pub minutos_extras: Option<i32>,
    pub estado: Option<EstadoAsistencia>,
    pub observaciones: Option<String>,
    pub ubicacion_entrada: Option<String>,
    pub ubicacion_salida: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosAsistencia {
    pub empleado_rut: Option<String>,
    pub fecha: Option<NaiveDate>,
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
    pub estado: Option<EstadoAsistencia>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstadisticasAsistencia {
    pub fecha: NaiveDate,
    pub presentes: u64,
    pub ausentes: u64,
    pub tardes: u64,
    pub justificados: u64,
    pub total_empleados: u64,
}

/// Hours between entry and exit, rounded to two decimals.
pub fn horas_trabajadas(
    entrada: Option<DateTime<Utc>>,
    salida: Option<DateTime<Utc>>,
) -> Result<Option<Decimal>, ServiceError> {
    match (entrada, salida) {
        (Some(entrada), Some(salida)) => {
            if salida <= entrada {
                return Err(ServiceError::field(
                    "hora_salida",
                    "La hora de salida debe ser posterior a la hora de entrada",
                ));
            }
            let minutos = (salida - entrada).num_minutes();
            Ok(Some((Decimal::from(minutos) / Decimal::from(60)).round_dp(2)))
        }
        _ => Ok(None),
    }
}

async fn ensure_unico<C: ConnectionTrait>(
    db: &C,
    empleado_rut: &str,
    fecha: NaiveDate,
    excluir: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query = asistencia::Entity::find()
        .filter(asistencia::Column::EmpleadoRut.eq(empleado_rut))
        .filter(asistencia::Column::Fecha.eq(fecha));
    if let Some(id) = excluir {
        query = query.filter(asistencia::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(ServiceError::Conflict(format!(
            "Ya existe un registro de asistencia para {} el {}",
            empleado_rut, fecha
        )));
    }
    Ok(())
}

fn map_duplicate(e: sea_orm::DbErr) -> ServiceError {
    if is_unique_violation(&e) {
        ServiceError::Conflict("Ya existe un registro de asistencia para ese día".to_string())
    } else {
        ServiceError::DatabaseError(e)
    }
}

#[derive(Clone)]
pub struct AsistenciaService {
    db_pool: Arc<DbPool>,
}

impl AsistenciaService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filtros: FiltrosAsistencia,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<asistencia::Model>, u64), ServiceError> {
        let mut query = asistencia::Entity::find();
        if let Some(raw) = filtros.empleado_rut.as_deref() {
            query = query.filter(asistencia::Column::EmpleadoRut.eq(rut::canonical(raw)));
        }
        if let Some(fecha) = filtros.fecha {
            query = query.filter(asistencia::Column::Fecha.eq(fecha));
        }
        if let Some(desde) = filtros.fecha_desde {
            query = query.filter(asistencia::Column::Fecha.gte(desde));
        }
        if let Some(hasta) = filtros.fecha_hasta {
            query = query.filter(asistencia::Column::Fecha.lte(hasta));
        }
        if let Some(estado) = filtros.estado {
            query = query.filter(asistencia::Column::Estado.eq(estado));
        }
        let query = query
            .order_by_desc(asistencia::Column::Fecha)
            .order_by_asc(asistencia::Column::EmpleadoRut);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    pub async fn get(&self, id: i32) -> Result<asistencia::Model, ServiceError> {
        asistencia::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Asistencia {} no encontrada", id)))
    }

    #[instrument(skip(self, caller, input), fields(empleado_rut = %input.empleado_rut))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: CrearAsistencia,
    ) -> Result<asistencia::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let empleado = require_empleado(db, "empleado_rut", &input.empleado_rut).await?;
        let fecha = input.fecha.unwrap_or_else(super::today);
        let horas = horas_trabajadas(input.hora_entrada, input.hora_salida)?;
        ensure_unico(db, &empleado.rut, fecha, None).await?;

        let now = Utc::now();
        let txn = db.begin().await?;
        let created = asistencia::ActiveModel {
            empleado_rut: Set(empleado.rut.clone()),
            fecha: Set(fecha),
            hora_entrada: Set(input.hora_entrada),
            hora_salida: Set(input.hora_salida),
            tipo_entrada: Set(input.tipo_entrada.unwrap_or(TipoMarcaje::Manual)),
            tipo_salida: Set(input.tipo_salida.unwrap_or(TipoMarcaje::Manual)),
            minutos_tarde: Set(input.minutos_tarde.unwrap_or(0)),
            minutos_extras: Set(input.minutos_extras.unwrap_or(0)),
            horas_trabajadas: Set(horas),
            estado: Set(input.estado.unwrap_or(EstadoAsistencia::Presente)),
            observaciones: Set(input.observaciones),
            ubicacion_entrada: Set(input.ubicacion_entrada),
            ubicacion_salida: Set(input.ubicacion_salida),
            ip_entrada: Set(input.hora_entrada.and(caller.ip.clone())),
            ip_salida: Set(input.hora_salida.and(caller.ip.clone())),
            validado_por: Set(None),
            fecha_validacion: Set(None),
            fecha_creacion: Set(now),
            fecha_actualizacion: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_duplicate)?;

        registrar(
            &txn,
            Some(caller),
            Actividad::new("asistencia", "crear", "asistencias")
                .registro(created.id)
                .descripcion(format!("Marcaje de {} para {}", created.empleado_rut, created.fecha))
                .despues(&created),
        )
        .await?;
        txn.commit().await?;

        info!(id = created.id, rut = %created.empleado_rut, fecha = %created.fecha, "asistencia created");
        Ok(created)
    }

    /// Partial update; hours are recomputed from the merged timestamps.
    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarAsistencia,
    ) -> Result<asistencia::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let actual = self.get(id).await?;

        let empleado_rut = match input.empleado_rut.as_deref() {
            Some(raw) => require_empleado(db, "empleado_rut", raw).await?.rut,
            None => actual.empleado_rut.clone(),
        };
        let fecha = input.fecha.unwrap_or(actual.fecha);
        if empleado_rut != actual.empleado_rut || fecha != actual.fecha {
            ensure_unico(db, &empleado_rut, fecha, Some(id)).await?;
        }

        let entrada = input.hora_entrada.or(actual.hora_entrada);
        let salida = input.hora_salida.or(actual.hora_salida);
        let horas = horas_trabajadas(entrada, salida)?;

        let txn = db.begin().await?;
        let mut active: asistencia::ActiveModel = actual.clone().into();
        active.empleado_rut = Set(empleado_rut);
        active.fecha = Set(fecha);
        if input.hora_entrada.is_some() {
            active.hora_entrada = Set(entrada);
            active.ip_entrada = Set(caller.ip.clone());
        }
        if input.hora_salida.is_some() {
            active.hora_salida = Set(salida);
            active.ip_salida = Set(caller.ip.clone());
        }
        if let Some(v) = input.tipo_entrada {
            active.tipo_entrada = Set(v);
        }
        if let Some(v) = input.tipo_salida {
            active.tipo_salida = Set(v);
        }
        if let Some(v) = input.minutos_tarde {
            active.minutos_tarde = Set(v);
        }
        if let Some(v) = input.minutos_extras {
            active.minutos_extras = Set(v);
        }
        if let Some(v) = input.estado {
            active.estado = Set(v);
        }
        if let Some(v) = input.observaciones {
            active.observaciones = Set(Some(v));
        }
        if let Some(v) = input.ubicacion_entrada {
            active.ubicacion_entrada = Set(Some(v));
        }
        if let Some(v) = input.ubicacion_salida {
            active.ubicacion_salida = Set(Some(v));
        }
        active.horas_trabajadas = Set(horas);
        active.fecha_actualizacion = Set(Utc::now());
        let updated = active.update(&txn).await.map_err(map_duplicate)?;

        registrar(
            &txn,
            Some(caller),
            Actividad::new("asistencia", "actualizar", "asistencias")
                .registro(updated.id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Hard delete; attendance rows have no active flag.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.get(id).await?;
        let txn = self.db_pool.begin().await?;
        asistencia::Entity::delete_by_id(id).exec(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("asistencia", "eliminar", "asistencias")
                .registro(id)
                .antes(&actual),
        )
        .await?;
        txn.commit().await?;
        info!(id, "asistencia deleted");
        Ok(())
    }

    /// Marks a record as validated by the caller.
    #[instrument(skip(self, caller))]
    pub async fn validar(&self, caller: &Caller, id: i32) -> Result<asistencia::Model, ServiceError> {
        let actual = self.get(id).await?;
        let txn = self.db_pool.begin().await?;
        let mut active: asistencia::ActiveModel = actual.into();
        active.validado_por = Set(Some(caller.empleado_id));
        active.fecha_validacion = Set(Some(Utc::now()));
        active.fecha_actualizacion = Set(Utc::now());
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("asistencia", "validar", "asistencias").registro(updated.id),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Daily counters. Active employees without a record count as absent.
    #[instrument(skip(self))]
    pub async fn estadisticas(&self, fecha: NaiveDate) -> Result<EstadisticasAsistencia, ServiceError> {
        let db = &*self.db_pool;
        let registros = asistencia::Entity::find()
            .filter(asistencia::Column::Fecha.eq(fecha))
            .all(db)
            .await?;

        let contar = |estado: EstadoAsistencia| {
            registros.iter().filter(|r| r.estado == estado).count() as u64
        };
        let con_registro: HashSet<&str> =
            registros.iter().map(|r| r.empleado_rut.as_str()).collect();

        let activos: Vec<String> = activos_query()
            .select_only()
            .column(empleado::Column::Rut)
            .into_tuple()
            .all(db)
            .await?;
        let sin_registro = activos
            .iter()
            .filter(|rut| !con_registro.contains(rut.as_str()))
            .count() as u64;

        Ok(EstadisticasAsistencia {
            fecha,
            presentes: contar(EstadoAsistencia::Presente),
            ausentes: contar(EstadoAsistencia::Ausente) + sin_registro,
            tardes: contar(EstadoAsistencia::Tarde),
            justificados: contar(EstadoAsistencia::Justificado),
            total_empleados: activos.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    #[test]
    fn hours_are_derived_and_rounded() {
        assert_eq!(horas_trabajadas(Some(at(9, 0)), Some(at(17, 30))).unwrap(), Some(dec!(8.50)));
        assert_eq!(horas_trabajadas(Some(at(9, 0)), Some(at(9, 20))).unwrap(), Some(dec!(0.33)));
    }

    #[test]
    fn missing_timestamp_leaves_hours_empty() {
        assert_eq!(horas_trabajadas(Some(at(9, 0)), None).unwrap(), None);
        assert_eq!(horas_trabajadas(None, None).unwrap(), None);
    }

    #[test]
    fn exit_not_after_entry_is_a_field_error() {
        for salida in [at(9, 0), at(8, 59)] {
            match horas_trabajadas(Some(at(9, 0)), Some(salida)) {
                Err(ServiceError::InvalidFields(fields)) => {
                    assert!(fields.contains_key("hora_salida"))
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
    }
}
