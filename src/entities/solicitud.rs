use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstadoSolicitud {
    #[sea_orm(string_value = "pendiente")]
    Pendiente,
    #[sea_orm(string_value = "aprobada")]
    Aprobada,
    #[sea_orm(string_value = "rechazada")]
    Rechazada,
    #[sea_orm(string_value = "cancelada")]
    Cancelada,
}

impl EstadoSolicitud {
    /// Only pending requests can move, and only to a terminal state.
    pub fn can_transition_to(self, next: EstadoSolicitud) -> bool {
        matches!(
            (self, next),
            (
                EstadoSolicitud::Pendiente,
                EstadoSolicitud::Aprobada | EstadoSolicitud::Rechazada | EstadoSolicitud::Cancelada
            )
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "solicitudes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub empleado_rut: Option<String>,
    pub empleado_id: i32,
    pub tipo_solicitud_id: i32,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    pub motivo: String,
    pub estado: EstadoSolicitud,
    pub aprobado_por: Option<i32>,
    pub fecha_aprobacion: Option<DateTime<Utc>>,
    pub comentario_aprobacion: Option<String>,
    pub documento_adjunto: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::empleado::Entity",
        from = "Column::EmpleadoId",
        to = "super::empleado::Column::Id"
    )]
    Empleado,
    #[sea_orm(
        belongs_to = "super::tipo_solicitud::Entity",
        from = "Column::TipoSolicitudId",
        to = "super::tipo_solicitud::Column::Id"
    )]
    TipoSolicitud,
}

impl Related<super::empleado::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Empleado.def()
    }
}

impl Related<super::tipo_solicitud::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TipoSolicitud.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::EstadoSolicitud::*;
    use rstest::rstest;

    #[rstest]
    #[case(Pendiente, Aprobada, true)]
    #[case(Pendiente, Rechazada, true)]
    #[case(Pendiente, Cancelada, true)]
    #[case(Pendiente, Pendiente, false)]
    #[case(Aprobada, Rechazada, false)]
    #[case(Rechazada, Aprobada, false)]
    #[case(Cancelada, Pendiente, false)]
    #[case(Aprobada, Cancelada, false)]
    fn transitions(
        #[case] from: super::EstadoSolicitud,
        #[case] to: super::EstadoSolicitud,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }
}
