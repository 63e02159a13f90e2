use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{password::hash_password, Caller},
    db::{DatabaseAccess, DbPool},
    entities::{
        asistencia,
        empleado::{self, EstadoEmpleado, Rol, TipoContrato},
        empleado_turno, horario, solicitud, tarea, tarea_comentario, tarea_historial, turno,
    },
    errors::{is_unique_violation, ServiceError},
    rut::{self, validate_rut, Rut},
    services::auditoria::{registrar, Actividad},
};

/// Body for creating an employee.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrearEmpleado {
    #[validate(custom = "validate_rut")]
    pub rut: String,
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[validate(length(min = 1, max = 100, message = "El apellido es obligatorio"))]
    pub apellido: String,
    #[validate(email(message = "Correo electrónico inválido"))]
    pub correo: Option<String>,
    pub celular: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub direccion: Option<String>,
    #[validate(length(min = 1, max = 100, message = "El cargo es obligatorio"))]
    pub cargo: String,
    pub departamento: Option<String>,
    pub fecha_contratacion: Option<NaiveDate>,
    pub fecha_termino: Option<NaiveDate>,
    #[validate(range(min = 0, message = "El salario no puede ser negativo"))]
    pub salario: Option<i64>,
    pub tipo_contrato: Option<TipoContrato>,
    pub estado: Option<EstadoEmpleado>,
    pub rol: Option<Rol>,
    pub password: Option<String>,
    pub foto_perfil: Option<String>,
    pub observaciones: Option<String>,
}

impl CrearEmpleado {
    /// Minimal record for the first manager of a fresh installation.
    pub fn gerente(
        rut: String,
        nombre: String,
        apellido: String,
        cargo: String,
        password: String,
    ) -> Self {
        Self {
            rut,
            nombre,
            apellido,
            correo: None,
            celular: None,
            fecha_nacimiento: None,
            direccion: None,
            cargo,
            departamento: None,
            fecha_contratacion: None,
            fecha_termino: None,
            salario: None,
            tipo_contrato: Some(TipoContrato::Indefinido),
            estado: Some(EstadoEmpleado::Activo),
            rol: Some(Rol::Gerente),
            password: Some(password),
            foto_perfil: None,
            observaciones: None,
        }
    }
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ActualizarEmpleado {
    #[validate(custom = "validate_rut")]
    pub rut: Option<String>,
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: Option<String>,
    #[validate(length(min = 1, max = 100, message = "El apellido es obligatorio"))]
    pub apellido: Option<String>,
    #[validate(email(message = "Correo electrónico inválido"))]
    pub correo: Option<String>,
    pub celular: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub direccion: Option<String>,
    #[validate(length(min = 1, max = 100, message = "El cargo es obligatorio"))]
    pub cargo: Option<String>,
    pub departamento: Option<String>,
    pub fecha_contratacion: Option<NaiveDate>,
    pub fecha_termino: Option<NaiveDate>,
    #[validate(range(min = 0, message = "El salario no puede ser negativo"))]
    pub salario: Option<i64>,
    pub tipo_contrato: Option<TipoContrato>,
    pub estado: Option<EstadoEmpleado>,
    pub rol: Option<Rol>,
    pub password: Option<String>,
    pub foto_perfil: Option<String>,
    pub observaciones: Option<String>,
    pub activo: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosEmpleado {
    pub estado: Option<EstadoEmpleado>,
    pub cargo: Option<String>,
    pub departamento: Option<String>,
    pub rol: Option<Rol>,
    pub search: Option<String>,
    pub incluir_inactivos: Option<bool>,
}

fn check_fechas(
    contratacion: NaiveDate,
    termino: Option<NaiveDate>,
) -> Result<(), ServiceError> {
    match termino {
        Some(termino) if termino < contratacion => Err(ServiceError::field(
            "fecha_termino",
            "La fecha de término no puede ser anterior a la fecha de contratación",
        )),
        _ => Ok(()),
    }
}

/// Only a gerente grants roles above `empleado` or changes an existing role.
fn check_asignacion_rol(caller: &Caller, anterior: Option<Rol>, nuevo: Option<Rol>) -> Result<(), ServiceError> {
    let Some(nuevo) = nuevo else { return Ok(()) };
    let cambia = match anterior {
        Some(anterior) => anterior != nuevo,
        None => nuevo != Rol::Empleado,
    };
    if cambia && caller.rol != Rol::Gerente {
        return Err(ServiceError::Forbidden(
            "Solo un gerente puede asignar o cambiar roles".to_string(),
        ));
    }
    Ok(())
}

fn non_blank_password(password: Option<&str>) -> Option<&str> {
    password.map(str::trim).filter(|p| !p.is_empty())
}

/// Rewrites every RUT-bearing column from `anterior` to `nuevo`.
async fn cascade_rut<C: ConnectionTrait>(
    db: &C,
    anterior: &str,
    nuevo: &str,
) -> Result<(), ServiceError> {
    asistencia::Entity::update_many()
        .col_expr(asistencia::Column::EmpleadoRut, Expr::value(nuevo))
        .filter(asistencia::Column::EmpleadoRut.eq(anterior))
        .exec(db)
        .await?;
    turno::Entity::update_many()
        .col_expr(turno::Column::EmpleadosRut, Expr::value(nuevo))
        .filter(turno::Column::EmpleadosRut.eq(anterior))
        .exec(db)
        .await?;
    empleado_turno::Entity::update_many()
        .col_expr(empleado_turno::Column::EmpleadosRut, Expr::value(nuevo))
        .filter(empleado_turno::Column::EmpleadosRut.eq(anterior))
        .exec(db)
        .await?;
    horario::Entity::update_many()
        .col_expr(horario::Column::EmpleadoRut, Expr::value(nuevo))
        .filter(horario::Column::EmpleadoRut.eq(anterior))
        .exec(db)
        .await?;
    solicitud::Entity::update_many()
        .col_expr(solicitud::Column::EmpleadoRut, Expr::value(nuevo))
        .filter(solicitud::Column::EmpleadoRut.eq(anterior))
        .exec(db)
        .await?;
    for column in [
        tarea::Column::AsignadaARut,
        tarea::Column::CreadaPorRut,
        tarea::Column::AprobadaPorRut,
    ] {
        tarea::Entity::update_many()
            .col_expr(column, Expr::value(nuevo))
            .filter(column.eq(anterior))
            .exec(db)
            .await?;
    }
    tarea_comentario::Entity::update_many()
        .col_expr(tarea_comentario::Column::EmpleadoRut, Expr::value(nuevo))
        .filter(tarea_comentario::Column::EmpleadoRut.eq(anterior))
        .exec(db)
        .await?;
    tarea_historial::Entity::update_many()
        .col_expr(tarea_historial::Column::EmpleadoRut, Expr::value(nuevo))
        .filter(tarea_historial::Column::EmpleadoRut.eq(anterior))
        .exec(db)
        .await?;
    Ok(())
}

/// Employee registry keyed by RUT.
#[derive(Clone)]
pub struct EmpleadoService {
    db_pool: Arc<DbPool>,
}

impl EmpleadoService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filtros: FiltrosEmpleado,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<empleado::Model>, u64), ServiceError> {
        let mut query = empleado::Entity::find();
        if !filtros.incluir_inactivos.unwrap_or(false) {
            query = query.filter(empleado::Column::Activo.eq(true));
        }
        if let Some(estado) = filtros.estado {
            query = query.filter(empleado::Column::Estado.eq(estado));
        }
        if let Some(cargo) = filtros.cargo {
            query = query.filter(empleado::Column::Cargo.eq(cargo));
        }
        if let Some(departamento) = filtros.departamento {
            query = query.filter(empleado::Column::Departamento.eq(departamento));
        }
        if let Some(rol) = filtros.rol {
            query = query.filter(empleado::Column::Rol.eq(rol));
        }
        if let Some(search) = filtros.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(empleado::Column::Nombre.contains(search))
                    .add(empleado::Column::Apellido.contains(search))
                    .add(empleado::Column::Rut.contains(search)),
            );
        }
        let query = query
            .order_by_asc(empleado::Column::Apellido)
            .order_by_asc(empleado::Column::Nombre);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    /// Looks up by RUT in any accepted spelling.
    pub async fn get(&self, raw_rut: &str) -> Result<empleado::Model, ServiceError> {
        find_by_rut(&*self.db_pool, raw_rut)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Empleado {} no encontrado", raw_rut)))
    }

    #[instrument(skip(self, caller, input), fields(rut = %input.rut))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: CrearEmpleado,
    ) -> Result<empleado::Model, ServiceError> {
        self.insert(Some(caller), input).await
    }

    /// Creates the first gerente outside any request. Used by the migration CLI.
    #[instrument(skip(self, input), fields(rut = %input.rut))]
    pub async fn bootstrap_gerente(
        &self,
        mut input: CrearEmpleado,
    ) -> Result<empleado::Model, ServiceError> {
        input.rol = Some(Rol::Gerente);
        if non_blank_password(input.password.as_deref()).is_none() {
            return Err(ServiceError::field("password", "El gerente inicial necesita contraseña"));
        }
        self.insert(None, input).await
    }

    async fn insert(
        &self,
        caller: Option<&Caller>,
        input: CrearEmpleado,
    ) -> Result<empleado::Model, ServiceError> {
        input.validate()?;
        if let Some(caller) = caller {
            check_asignacion_rol(caller, None, input.rol)?;
        }
        let rut = Rut::parse(&input.rut).map_err(|e| ServiceError::field("rut", e.to_string()))?;
        let fecha_contratacion = input.fecha_contratacion.unwrap_or_else(super::today);
        check_fechas(fecha_contratacion, input.fecha_termino)?;

        let db = &*self.db_pool;
        if find_by_rut(db, rut.as_str()).await?.is_some() {
            return Err(ServiceError::Conflict(format!("El RUT {} ya está registrado", rut)));
        }

        let password = match non_blank_password(input.password.as_deref()) {
            Some(plain) => Some(hash_password(plain)?),
            None => None,
        };

        let now = Utc::now();
        let txn = db.begin().await?;
        let created = empleado::ActiveModel {
            rut: Set(rut.into_inner()),
            nombre: Set(input.nombre.trim().to_string()),
            apellido: Set(input.apellido.trim().to_string()),
            correo: Set(input.correo),
            celular: Set(input.celular),
            fecha_nacimiento: Set(input.fecha_nacimiento),
            direccion: Set(input.direccion),
            cargo: Set(input.cargo.trim().to_string()),
            departamento: Set(input.departamento),
            fecha_contratacion: Set(fecha_contratacion),
            fecha_termino: Set(input.fecha_termino),
            salario: Set(input.salario),
            tipo_contrato: Set(input.tipo_contrato.unwrap_or(TipoContrato::Indefinido)),
            estado: Set(input.estado.unwrap_or(EstadoEmpleado::Activo)),
            rol: Set(input.rol.unwrap_or(Rol::Empleado)),
            password: Set(password),
            foto_perfil: Set(input.foto_perfil),
            observaciones: Set(input.observaciones),
            activo: Set(true),
            fecha_creacion: Set(now),
            fecha_actualizacion: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("El RUT ya está registrado".to_string())
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        registrar(
            &txn,
            caller,
            Actividad::new("empleados", "crear", "empleados")
                .registro(created.id)
                .descripcion(format!("Alta de {} ({})", created.nombre_completo(), created.rut))
                .despues(&created),
        )
        .await?;
        txn.commit().await?;

        info!(rut = %created.rut, id = created.id, rol = %created.rol, "empleado created");
        Ok(created)
    }

    /// Partial update. A changed RUT is propagated to every dependent table
    /// inside the same transaction.
    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        raw_rut: &str,
        input: ActualizarEmpleado,
    ) -> Result<empleado::Model, ServiceError> {
        input.validate()?;
        let actual = self.get(raw_rut).await?;
        check_asignacion_rol(caller, Some(actual.rol), input.rol)?;

        let nuevo_rut = match input.rut.as_deref() {
            Some(raw) => {
                let parsed =
                    Rut::parse(raw).map_err(|e| ServiceError::field("rut", e.to_string()))?;
                (parsed.as_str() != actual.rut).then(|| parsed.into_inner())
            }
            None => None,
        };
        if let Some(nuevo) = &nuevo_rut {
            if find_by_rut(&*self.db_pool, nuevo).await?.is_some() {
                return Err(ServiceError::Conflict(format!("El RUT {} ya está registrado", nuevo)));
            }
        }

        check_fechas(
            input.fecha_contratacion.unwrap_or(actual.fecha_contratacion),
            input.fecha_termino.or(actual.fecha_termino),
        )?;

        let password = match non_blank_password(input.password.as_deref()) {
            Some(plain) => Some(hash_password(plain)?),
            None => None,
        };

        let caller = caller.clone();
        let updated = DatabaseAccess::new(self.db_pool.clone())
            .transaction(move |txn| {
                Box::pin(async move {
                    let anterior_rut = actual.rut.clone();
                    let mut active: empleado::ActiveModel = actual.clone().into();

                    if let Some(nuevo) = &nuevo_rut {
                        cascade_rut(txn, &anterior_rut, nuevo).await?;
                        active.rut = Set(nuevo.clone());
                        warn!(anterior = %anterior_rut, nuevo = %nuevo, "empleado RUT renamed");
                    }
                    if let Some(v) = input.nombre {
                        active.nombre = Set(v.trim().to_string());
                    }
                    if let Some(v) = input.apellido {
                        active.apellido = Set(v.trim().to_string());
                    }
                    if let Some(v) = input.correo {
                        active.correo = Set(Some(v));
                    }
                    if let Some(v) = input.celular {
                        active.celular = Set(Some(v));
                    }
                    if let Some(v) = input.fecha_nacimiento {
                        active.fecha_nacimiento = Set(Some(v));
                    }
                    if let Some(v) = input.direccion {
                        active.direccion = Set(Some(v));
                    }
                    if let Some(v) = input.cargo {
                        active.cargo = Set(v.trim().to_string());
                    }
                    if let Some(v) = input.departamento {
                        active.departamento = Set(Some(v));
                    }
                    if let Some(v) = input.fecha_contratacion {
                        active.fecha_contratacion = Set(v);
                    }
                    if let Some(v) = input.fecha_termino {
                        active.fecha_termino = Set(Some(v));
                    }
                    if let Some(v) = input.salario {
                        active.salario = Set(Some(v));
                    }
                    if let Some(v) = input.tipo_contrato {
                        active.tipo_contrato = Set(v);
                    }
                    if let Some(v) = input.estado {
                        active.estado = Set(v);
                    }
                    if let Some(v) = input.rol {
                        active.rol = Set(v);
                    }
                    if let Some(v) = input.foto_perfil {
                        active.foto_perfil = Set(Some(v));
                    }
                    if let Some(v) = input.observaciones {
                        active.observaciones = Set(Some(v));
                    }
                    if let Some(v) = input.activo {
                        active.activo = Set(v);
                    }
                    if let Some(hash) = password {
                        active.password = Set(Some(hash));
                    }
                    active.fecha_actualizacion = Set(Utc::now());

                    let updated = active.update(txn).await?;
                    registrar(
                        txn,
                        Some(&caller),
                        Actividad::new("empleados", "actualizar", "empleados")
                            .registro(updated.id)
                            .descripcion(format!("Actualización de {}", updated.rut))
                            .antes(&actual)
                            .despues(&updated),
                    )
                    .await?;
                    Ok::<_, ServiceError>(updated)
                })
            })
            .await?;

        info!(rut = %updated.rut, id = updated.id, "empleado updated");
        Ok(updated)
    }

    /// Soft delete: the row stays, flagged inactive.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, raw_rut: &str) -> Result<(), ServiceError> {
        let actual = self.get(raw_rut).await?;
        if actual.id == caller.empleado_id {
            return Err(ServiceError::InvalidOperation(
                "No puede desactivar su propio registro".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await?;
        let mut active: empleado::ActiveModel = actual.clone().into();
        active.activo = Set(false);
        active.estado = Set(EstadoEmpleado::Inactivo);
        active.fecha_actualizacion = Set(Utc::now());
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("empleados", "eliminar", "empleados")
                .registro(updated.id)
                .descripcion(format!("Baja de {}", updated.rut))
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;

        info!(rut = %updated.rut, "empleado deactivated");
        Ok(())
    }
}

/// Employees that are flagged active and not in a terminal state.
pub(crate) fn activos_query() -> sea_orm::Select<empleado::Entity> {
    empleado::Entity::find()
        .filter(empleado::Column::Activo.eq(true))
        .filter(empleado::Column::Estado.ne(EstadoEmpleado::Inactivo))
        .filter(empleado::Column::Estado.ne(EstadoEmpleado::Desvinculado))
}

pub(crate) async fn find_by_rut<C: ConnectionTrait>(
    db: &C,
    raw_rut: &str,
) -> Result<Option<empleado::Model>, ServiceError> {
    let canonical = rut::canonical(raw_rut);
    if canonical.is_empty() {
        return Ok(None);
    }
    Ok(empleado::Entity::find()
        .filter(empleado::Column::Rut.eq(canonical))
        .one(db)
        .await?)
}

/// Resolves a RUT that must belong to an existing employee, failing on `field`.
pub(crate) async fn require_empleado<C: ConnectionTrait>(
    db: &C,
    field: &str,
    raw_rut: &str,
) -> Result<empleado::Model, ServiceError> {
    find_by_rut(db, raw_rut)
        .await?
        .ok_or_else(|| ServiceError::field(field, format!("No existe un empleado con RUT {}", raw_rut)))
}
