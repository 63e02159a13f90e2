use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tareas_comentarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tarea_id: i32,
    pub empleado_rut: String,
    pub comentario: String,
    pub archivo_adjunto: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tarea::Entity",
        from = "Column::TareaId",
        to = "super::tarea::Column::Id"
    )]
    Tarea,
}

impl Related<super::tarea::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tarea.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
