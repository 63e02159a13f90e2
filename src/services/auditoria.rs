//! Append-only activity log.
//!
//! Mutating services call [`registrar`] with the same connection they wrote
//! through, so the entry commits or rolls back together with the change.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    auth::Caller,
    db::DbPool,
    entities::log_actividad,
    errors::ServiceError,
};

/// One audit entry before it is stamped with caller and time.
#[derive(Debug, Clone)]
pub struct Actividad {
    pub modulo: &'static str,
    pub accion: &'static str,
    pub tabla: &'static str,
    pub registro_id: Option<i32>,
    pub descripcion: Option<String>,
    pub antes: Option<serde_json::Value>,
    pub despues: Option<serde_json::Value>,
}

impl Actividad {
    pub fn new(modulo: &'static str, accion: &'static str, tabla: &'static str) -> Self {
        Self {
            modulo,
            accion,
            tabla,
            registro_id: None,
            descripcion: None,
            antes: None,
            despues: None,
        }
    }

    pub fn registro(mut self, id: i32) -> Self {
        self.registro_id = Some(id);
        self
    }

    pub fn descripcion(mut self, descripcion: impl Into<String>) -> Self {
        self.descripcion = Some(descripcion.into());
        self
    }

    pub fn antes<T: Serialize>(mut self, datos: &T) -> Self {
        self.antes = serde_json::to_value(datos).ok();
        self
    }

    pub fn despues<T: Serialize>(mut self, datos: &T) -> Self {
        self.despues = serde_json::to_value(datos).ok();
        self
    }
}

/// Writes an audit entry through `db`.
pub async fn registrar<C: ConnectionTrait>(
    db: &C,
    caller: Option<&Caller>,
    actividad: Actividad,
) -> Result<log_actividad::Model, ServiceError> {
    debug!(
        modulo = actividad.modulo,
        accion = actividad.accion,
        registro_id = ?actividad.registro_id,
        "recording activity"
    );
    let entry = log_actividad::ActiveModel {
        empleado_id: Set(caller.map(|c| c.empleado_id)),
        modulo: Set(actividad.modulo.to_string()),
        accion: Set(actividad.accion.to_string()),
        tabla_afectada: Set(Some(actividad.tabla.to_string())),
        registro_id: Set(actividad.registro_id),
        descripcion: Set(actividad.descripcion),
        datos_anteriores: Set(actividad.antes),
        datos_nuevos: Set(actividad.despues),
        ip_address: Set(caller.and_then(|c| c.ip.clone())),
        user_agent: Set(caller.and_then(|c| c.user_agent.clone())),
        fecha_registro: Set(Utc::now()),
        ..Default::default()
    };
    Ok(entry.insert(db).await?)
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosLog {
    pub modulo: Option<String>,
    pub empleado_id: Option<i32>,
    pub tabla_afectada: Option<String>,
    pub registro_id: Option<i32>,
}

#[derive(Clone)]
pub struct AuditoriaService {
    db_pool: Arc<DbPool>,
}

impl AuditoriaService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Newest entries first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filtros: FiltrosLog,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<log_actividad::Model>, u64), ServiceError> {
        let mut query = log_actividad::Entity::find();
        if let Some(modulo) = filtros.modulo {
            query = query.filter(log_actividad::Column::Modulo.eq(modulo));
        }
        if let Some(empleado_id) = filtros.empleado_id {
            query = query.filter(log_actividad::Column::EmpleadoId.eq(empleado_id));
        }
        if let Some(tabla) = filtros.tabla_afectada {
            query = query.filter(log_actividad::Column::TablaAfectada.eq(tabla));
        }
        if let Some(registro_id) = filtros.registro_id {
            query = query.filter(log_actividad::Column::RegistroId.eq(registro_id));
        }
        let query = query
            .order_by_desc(log_actividad::Column::FechaRegistro)
            .order_by_desc(log_actividad::Column::Id);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }
}
