use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    auth::Caller,
    db::DbPool,
    entities::notificacion::{self, TipoNotificacion},
    errors::ServiceError,
};

/// A notification as produced by the event processor.
#[derive(Debug, Clone)]
pub struct NuevaNotificacion {
    pub empleado_id: i32,
    pub tipo: TipoNotificacion,
    pub titulo: String,
    pub mensaje: String,
    pub modulo: Option<String>,
    pub referencia_id: Option<i32>,
    pub requiere_accion: bool,
    pub url_accion: Option<String>,
}

pub async fn crear_notificacion<C: ConnectionTrait>(
    db: &C,
    nueva: NuevaNotificacion,
) -> Result<notificacion::Model, ServiceError> {
    let model = notificacion::ActiveModel {
        empleado_id: Set(nueva.empleado_id),
        tipo: Set(nueva.tipo),
        titulo: Set(nueva.titulo),
        mensaje: Set(nueva.mensaje),
        modulo: Set(nueva.modulo),
        referencia_id: Set(nueva.referencia_id),
        leida: Set(false),
        fecha_lectura: Set(None),
        requiere_accion: Set(nueva.requiere_accion),
        url_accion: Set(nueva.url_accion),
        fecha_creacion: Set(Utc::now()),
        fecha_expiracion: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!(id = model.id, empleado_id = model.empleado_id, "notificacion created");
    Ok(model)
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosNotificacion {
    pub leida: Option<bool>,
}

/// Read side of the caller's inbox.
#[derive(Clone)]
pub struct NotificacionService {
    db_pool: Arc<DbPool>,
}

impl NotificacionService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, caller), fields(empleado_id = caller.empleado_id))]
    pub async fn list(
        &self,
        caller: &Caller,
        filtros: FiltrosNotificacion,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<notificacion::Model>, u64), ServiceError> {
        let mut query = notificacion::Entity::find()
            .filter(notificacion::Column::EmpleadoId.eq(caller.empleado_id));
        if let Some(leida) = filtros.leida {
            query = query.filter(notificacion::Column::Leida.eq(leida));
        }
        let query = query
            .order_by_desc(notificacion::Column::FechaCreacion)
            .order_by_desc(notificacion::Column::Id);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    /// Marks one of the caller's notifications as read. Someone else's id is a 404.
    #[instrument(skip(self, caller), fields(empleado_id = caller.empleado_id))]
    pub async fn marcar_leida(
        &self,
        caller: &Caller,
        id: i32,
    ) -> Result<notificacion::Model, ServiceError> {
        let db = &*self.db_pool;
        let actual = notificacion::Entity::find_by_id(id)
            .filter(notificacion::Column::EmpleadoId.eq(caller.empleado_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Notificación {} no encontrada", id)))?;

        if actual.leida {
            return Ok(actual);
        }
        let mut active: notificacion::ActiveModel = actual.into();
        active.leida = Set(true);
        active.fecha_lectura = Set(Some(Utc::now()));
        Ok(active.update(db).await?)
    }

    /// Marks every unread notification of the caller; returns how many changed.
    #[instrument(skip(self, caller), fields(empleado_id = caller.empleado_id))]
    pub async fn marcar_todas(&self, caller: &Caller) -> Result<u64, ServiceError> {
        let result = notificacion::Entity::update_many()
            .col_expr(notificacion::Column::Leida, Expr::value(true))
            .col_expr(notificacion::Column::FechaLectura, Expr::value(Utc::now()))
            .filter(notificacion::Column::EmpleadoId.eq(caller.empleado_id))
            .filter(notificacion::Column::Leida.eq(false))
            .exec(&*self.db_pool)
            .await?;
        info!(updated = result.rows_affected, "notificaciones marked as read");
        Ok(result.rows_affected)
    }
}
