use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TipoNotificacion {
    #[sea_orm(string_value = "info")]
    Info,
    #[sea_orm(string_value = "alerta")]
    Alerta,
    #[sea_orm(string_value = "urgente")]
    Urgente,
    #[sea_orm(string_value = "recordatorio")]
    Recordatorio,
    #[sea_orm(string_value = "aprobacion")]
    Aprobacion,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notificaciones")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub empleado_id: i32,
    pub tipo: TipoNotificacion,
    pub titulo: String,
    pub mensaje: String,
    pub modulo: Option<String>,
    pub referencia_id: Option<i32>,
    pub leida: bool,
    pub fecha_lectura: Option<DateTime<Utc>>,
    pub requiere_accion: bool,
    pub url_accion: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_expiracion: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::empleado::Entity",
        from = "Column::EmpleadoId",
        to = "super::empleado::Column::Id"
    )]
    Empleado,
}

impl Related<super::empleado::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Empleado.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
