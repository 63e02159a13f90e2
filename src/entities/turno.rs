use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "turnos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub empleados_rut: String,
    pub nombre_turno: String,
    pub hora_entrada: NaiveTime,
    pub hora_salida: NaiveTime,
    pub tolerancia_minutos: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub horas_trabajo: Decimal,
    pub descripcion: Option<String>,
    pub dias_semana: Option<Json>,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::empleado_turno::Entity")]
    Asignaciones,
    #[sea_orm(has_many = "super::horario::Entity")]
    Horarios,
}

impl Related<super::empleado_turno::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asignaciones.def()
    }
}

impl Related<super::horario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Horarios.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
