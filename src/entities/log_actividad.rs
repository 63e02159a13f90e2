use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit trail entry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "logs_actividad")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub empleado_id: Option<i32>,
    pub modulo: String,
    pub accion: String,
    pub tabla_afectada: Option<String>,
    pub registro_id: Option<i32>,
    pub descripcion: Option<String>,
    pub datos_anteriores: Option<Json>,
    pub datos_nuevos: Option<Json>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub fecha_registro: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
