use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TipoTarea {
    #[sea_orm(string_value = "general")]
    General,
    #[sea_orm(string_value = "inventario")]
    Inventario,
    #[sea_orm(string_value = "mantenimiento")]
    Mantenimiento,
    #[sea_orm(string_value = "limpieza")]
    Limpieza,
    #[sea_orm(string_value = "atencion_cliente")]
    AtencionCliente,
    #[sea_orm(string_value = "administrativa")]
    Administrativa,
    #[sea_orm(string_value = "urgente")]
    Urgente,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Prioridad {
    #[sea_orm(string_value = "baja")]
    Baja,
    #[sea_orm(string_value = "media")]
    Media,
    #[sea_orm(string_value = "alta")]
    Alta,
    #[sea_orm(string_value = "critica")]
    Critica,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstadoTarea {
    #[sea_orm(string_value = "pendiente")]
    Pendiente,
    #[sea_orm(string_value = "en_proceso")]
    EnProceso,
    #[sea_orm(string_value = "completada")]
    Completada,
    #[sea_orm(string_value = "cancelada")]
    Cancelada,
    #[sea_orm(string_value = "pausada")]
    Pausada,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Frecuencia {
    #[sea_orm(string_value = "diaria")]
    Diaria,
    #[sea_orm(string_value = "semanal")]
    Semanal,
    #[sea_orm(string_value = "mensual")]
    Mensual,
    #[sea_orm(string_value = "anual")]
    Anual,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tareas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub titulo: String,
    pub descripcion: Option<String>,
    pub tipo_tarea: TipoTarea,
    pub prioridad: Prioridad,
    pub estado: EstadoTarea,
    pub asignada_a_rut: Option<String>,
    pub creada_por_rut: String,
    pub fecha_inicio: Option<DateTime<Utc>>,
    pub fecha_vencimiento: Option<DateTime<Utc>>,
    pub fecha_completada: Option<DateTime<Utc>>,
    pub es_recurrente: bool,
    pub frecuencia_recurrencia: Option<Frecuencia>,
    pub dias_recurrencia: Option<Json>,
    pub ubicacion: Option<String>,
    pub modulo_relacionado: Option<String>,
    pub registro_relacionado_id: Option<i32>,
    pub tiempo_estimado_minutos: Option<i32>,
    pub tiempo_real_minutos: Option<i32>,
    pub porcentaje_completado: i32,
    pub notas: Option<String>,
    pub archivo_adjunto: Option<String>,
    pub requiere_aprobacion: bool,
    pub aprobada_por_rut: Option<String>,
    pub fecha_aprobacion: Option<DateTime<Utc>>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub activo: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tarea_comentario::Entity")]
    Comentarios,
    #[sea_orm(has_many = "super::tarea_historial::Entity")]
    Historial,
}

impl Related<super::tarea_comentario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comentarios.def()
    }
}

impl Related<super::tarea_historial::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Historial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
