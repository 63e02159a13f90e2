use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "horarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub empleado_rut: String,
    pub turno_id: i32,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: Option<NaiveDate>,
    pub dias_semana: Option<Json>,
    pub observaciones: Option<String>,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::turno::Entity",
        from = "Column::TurnoId",
        to = "super::turno::Column::Id"
    )]
    Turno,
}

impl Related<super::turno::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Turno.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
