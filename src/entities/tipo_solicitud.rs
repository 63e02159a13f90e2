use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tipos_solicitudes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub requiere_aprobacion: bool,
    pub dias_anticipacion: i32,
    pub color_hex: String,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::solicitud::Entity")]
    Solicitudes,
}

impl Related<super::solicitud::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Solicitudes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
