use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    auth::Caller,
    db::DbPool,
    entities::{empleado_turno, horario, turno},
    errors::ServiceError,
    rut,
    services::{
        auditoria::{registrar, Actividad},
        empleados::require_empleado,
    },
};

const DIAS: [&str; 7] = [
    "lunes", "martes", "miercoles", "jueves", "viernes", "sabado", "domingo",
];

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrearTurno {
    pub empleados_rut: String,
    #[validate(length(min = 1, max = 100, message = "El nombre del turno es obligatorio"))]
    pub nombre_turno: String,
    pub hora_entrada: NaiveTime,
    pub hora_salida: NaiveTime,
    #[validate(range(min = 0, max = 120, message = "La tolerancia debe estar entre 0 y 120 minutos"))]
    pub tolerancia_minutos: Option<i32>,
    pub descripcion: Option<String>,
    pub dias_semana: Option<Value>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ActualizarTurno {
    pub empleados_rut: Option<String>,
    #[validate(length(min = 1, max = 100, message = "El nombre del turno es obligatorio"))]
    pub nombre_turno: Option<String>,
    pub hora_entrada: Option<NaiveTime>,
    pub hora_salida: Option<NaiveTime>,
    #[validate(range(min = 0, max = 120, message = "La tolerancia debe estar entre 0 y 120 minutos"))]
    pub tolerancia_minutos: Option<i32>,
    pub descripcion: Option<String>,
    pub dias_semana: Option<Value>,
    pub activo: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosTurno {
    pub empleados_rut: Option<String>,
    pub turno_id: Option<i32>,
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrearAsignacion {
    pub empleados_rut: String,
    pub turno_id: i32,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrearHorario {
    pub empleado_rut: String,
    pub turno_id: i32,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: Option<NaiveDate>,
    pub dias_semana: Option<Value>,
    pub observaciones: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActualizarHorario {
    pub turno_id: Option<i32>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub dias_semana: Option<Value>,
    pub observaciones: Option<String>,
    pub activo: Option<bool>,
}

/// Shift length in hours. An exit earlier than the entry crosses midnight.
pub fn horas_trabajo(entrada: NaiveTime, salida: NaiveTime) -> Result<Decimal, ServiceError> {
    if entrada == salida {
        return Err(ServiceError::field(
            "hora_salida",
            "La hora de salida no puede ser igual a la de entrada",
        ));
    }
    let mut minutos = (salida - entrada).num_minutes();
    if minutos < 0 {
        minutos += 24 * 60;
    }
    Ok((Decimal::from(minutos) / Decimal::from(60)).round_dp(2))
}

/// Accepts a JSON list of weekday numbers (0 = lunes) or Spanish weekday names.
pub fn validar_dias_semana(dias: &Value) -> Result<(), ServiceError> {
    let invalid = || {
        ServiceError::field(
            "dias_semana",
            "Debe ser una lista de días (0-6 o nombres como \"lunes\")",
        )
    };
    let lista = dias.as_array().ok_or_else(invalid)?;
    for dia in lista {
        let ok = match dia {
            Value::Number(n) => n.as_u64().map_or(false, |n| n <= 6),
            Value::String(s) => DIAS.contains(&s.trim().to_lowercase().as_str()),
            _ => false,
        };
        if !ok {
            return Err(invalid());
        }
    }
    Ok(())
}

fn check_rango(inicio: NaiveDate, fin: Option<NaiveDate>) -> Result<(), ServiceError> {
    match fin {
        Some(fin) if fin < inicio => Err(ServiceError::field(
            "fecha_fin",
            "La fecha de fin no puede ser anterior a la fecha de inicio",
        )),
        _ => Ok(()),
    }
}

async fn require_turno<C: ConnectionTrait>(db: &C, id: i32) -> Result<turno::Model, ServiceError> {
    turno::Entity::find_by_id(id)
        .filter(turno::Column::Activo.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::field("turno_id", format!("El turno {} no existe", id)))
}

/// Shifts, shift assignments and schedules.
#[derive(Clone)]
pub struct TurnoService {
    db_pool: Arc<DbPool>,
}

impl TurnoService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filtros: FiltrosTurno,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<turno::Model>, u64), ServiceError> {
        let mut query = turno::Entity::find()
            .filter(turno::Column::Activo.eq(filtros.activo.unwrap_or(true)));
        if let Some(raw) = filtros.empleados_rut.as_deref() {
            query = query.filter(turno::Column::EmpleadosRut.eq(rut::canonical(raw)));
        }
        let query = query
            .order_by_asc(turno::Column::HoraEntrada)
            .order_by_asc(turno::Column::Id);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    pub async fn get(&self, id: i32) -> Result<turno::Model, ServiceError> {
        turno::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Turno {} no encontrado", id)))
    }

    #[instrument(skip(self, caller, input), fields(nombre = %input.nombre_turno))]
    pub async fn create(&self, caller: &Caller, input: CrearTurno) -> Result<turno::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let empleado = require_empleado(db, "empleados_rut", &input.empleados_rut).await?;
        let horas = horas_trabajo(input.hora_entrada, input.hora_salida)?;
        if let Some(dias) = &input.dias_semana {
            validar_dias_semana(dias)?;
        }

        let txn = db.begin().await?;
        let created = turno::ActiveModel {
            empleados_rut: Set(empleado.rut),
            nombre_turno: Set(input.nombre_turno.trim().to_string()),
            hora_entrada: Set(input.hora_entrada),
            hora_salida: Set(input.hora_salida),
            tolerancia_minutos: Set(input.tolerancia_minutos.unwrap_or(15)),
            horas_trabajo: Set(horas),
            descripcion: Set(input.descripcion),
            dias_semana: Set(input.dias_semana),
            activo: Set(input.activo.unwrap_or(true)),
            fecha_creacion: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("turnos", "crear", "turnos")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;

        info!(id = created.id, horas = %created.horas_trabajo, "turno created");
        Ok(created)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarTurno,
    ) -> Result<turno::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let actual = self.get(id).await?;

        let entrada = input.hora_entrada.unwrap_or(actual.hora_entrada);
        let salida = input.hora_salida.unwrap_or(actual.hora_salida);
        let horas = horas_trabajo(entrada, salida)?;
        if let Some(dias) = &input.dias_semana {
            validar_dias_semana(dias)?;
        }

        let mut active: turno::ActiveModel = actual.clone().into();
        if let Some(raw) = input.empleados_rut.as_deref() {
            active.empleados_rut = Set(require_empleado(db, "empleados_rut", raw).await?.rut);
        }
        if let Some(v) = input.nombre_turno {
            active.nombre_turno = Set(v.trim().to_string());
        }
        active.hora_entrada = Set(entrada);
        active.hora_salida = Set(salida);
        active.horas_trabajo = Set(horas);
        if let Some(v) = input.tolerancia_minutos {
            active.tolerancia_minutos = Set(v);
        }
        if let Some(v) = input.descripcion {
            active.descripcion = Set(Some(v));
        }
        if let Some(v) = input.dias_semana {
            active.dias_semana = Set(Some(v));
        }
        if let Some(v) = input.activo {
            active.activo = Set(v);
        }

        let txn = db.begin().await?;
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("turnos", "actualizar", "turnos")
                .registro(id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.get(id).await?;
        let txn = self.db_pool.begin().await?;
        let mut active: turno::ActiveModel = actual.into();
        active.activo = Set(false);
        active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("turnos", "eliminar", "turnos").registro(id),
        )
        .await?;
        txn.commit().await?;
        info!(id, "turno deactivated");
        Ok(())
    }

    pub async fn list_asignaciones(
        &self,
        filtros: FiltrosTurno,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<empleado_turno::Model>, u64), ServiceError> {
        let mut query = empleado_turno::Entity::find()
            .filter(empleado_turno::Column::Activo.eq(filtros.activo.unwrap_or(true)));
        if let Some(raw) = filtros.empleados_rut.as_deref() {
            query = query.filter(empleado_turno::Column::EmpleadosRut.eq(rut::canonical(raw)));
        }
        if let Some(turno_id) = filtros.turno_id {
            query = query.filter(empleado_turno::Column::TurnoId.eq(turno_id));
        }
        let query = query.order_by_desc(empleado_turno::Column::FechaInicio);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    pub async fn get_asignacion(&self, id: i32) -> Result<empleado_turno::Model, ServiceError> {
        empleado_turno::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Asignación {} no encontrada", id)))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn asignar(
        &self,
        caller: &Caller,
        input: CrearAsignacion,
    ) -> Result<empleado_turno::Model, ServiceError> {
        let db = &*self.db_pool;
        check_rango(input.fecha_inicio, input.fecha_fin)?;
        let empleado = require_empleado(db, "empleados_rut", &input.empleados_rut).await?;
        require_turno(db, input.turno_id).await?;

        let now = Utc::now();
        let txn = db.begin().await?;
        let created = empleado_turno::ActiveModel {
            empleados_rut: Set(empleado.rut),
            turno_id: Set(input.turno_id),
            fecha_inicio: Set(input.fecha_inicio),
            fecha_fin: Set(input.fecha_fin),
            activo: Set(true),
            fecha_creacion: Set(now),
            fecha_actualizacion: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("turnos", "asignar", "empleados_turnos")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;

        info!(id = created.id, rut = %created.empleados_rut, turno_id = created.turno_id, "turno assigned");
        Ok(created)
    }

    pub async fn delete_asignacion(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.get_asignacion(id).await?;
        let txn = self.db_pool.begin().await?;
        let mut active: empleado_turno::ActiveModel = actual.into();
        active.activo = Set(false);
        active.fecha_actualizacion = Set(Utc::now());
        active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("turnos", "desasignar", "empleados_turnos").registro(id),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn list_horarios(
        &self,
        filtros: FiltrosTurno,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<horario::Model>, u64), ServiceError> {
        let mut query = horario::Entity::find()
            .filter(horario::Column::Activo.eq(filtros.activo.unwrap_or(true)));
        if let Some(raw) = filtros.empleados_rut.as_deref() {
            query = query.filter(horario::Column::EmpleadoRut.eq(rut::canonical(raw)));
        }
        if let Some(turno_id) = filtros.turno_id {
            query = query.filter(horario::Column::TurnoId.eq(turno_id));
        }
        let query = query.order_by_desc(horario::Column::FechaInicio);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    pub async fn get_horario(&self, id: i32) -> Result<horario::Model, ServiceError> {
        horario::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Horario {} no encontrado", id)))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn crear_horario(
        &self,
        caller: &Caller,
        input: CrearHorario,
    ) -> Result<horario::Model, ServiceError> {
        let db = &*self.db_pool;
        check_rango(input.fecha_inicio, input.fecha_fin)?;
        if let Some(dias) = &input.dias_semana {
            validar_dias_semana(dias)?;
        }
        let empleado = require_empleado(db, "empleado_rut", &input.empleado_rut).await?;
        require_turno(db, input.turno_id).await?;

        let txn = db.begin().await?;
        let created = horario::ActiveModel {
            empleado_rut: Set(empleado.rut),
            turno_id: Set(input.turno_id),
            fecha_inicio: Set(input.fecha_inicio),
            fecha_fin: Set(input.fecha_fin),
            dias_semana: Set(input.dias_semana),
            observaciones: Set(input.observaciones),
            activo: Set(true),
            fecha_creacion: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("turnos", "crear", "horarios")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn actualizar_horario(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarHorario,
    ) -> Result<horario::Model, ServiceError> {
        let db = &*self.db_pool;
        let actual = self.get_horario(id).await?;
        check_rango(
            input.fecha_inicio.unwrap_or(actual.fecha_inicio),
            input.fecha_fin.or(actual.fecha_fin),
        )?;
        if let Some(dias) = &input.dias_semana {
            validar_dias_semana(dias)?;
        }

        let mut active: horario::ActiveModel = actual.clone().into();
        if let Some(turno_id) = input.turno_id {
            require_turno(db, turno_id).await?;
            active.turno_id = Set(turno_id);
        }
        if let Some(v) = input.fecha_inicio {
            active.fecha_inicio = Set(v);
        }
        if let Some(v) = input.fecha_fin {
            active.fecha_fin = Set(Some(v));
        }
        if let Some(v) = input.dias_semana {
            active.dias_semana = Set(Some(v));
        }
        if let Some(v) = input.observaciones {
            active.observaciones = Set(Some(v));
        }
        if let Some(v) = input.activo {
            active.activo = Set(v);
        }

        let txn = db.begin().await?;
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("turnos", "actualizar", "horarios")
                .registro(id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete_horario(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.get_horario(id).await?;
        let txn = self.db_pool.begin().await?;
        let mut active: horario::ActiveModel = actual.into();
        active.activo = Set(false);
        active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("turnos", "eliminar", "horarios").registro(id),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }
}
