use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TipoMarcaje {
    #[sea_orm(string_value = "biometrico")]
    Biometrico,
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "app_movil")]
    AppMovil,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstadoAsistencia {
    #[sea_orm(string_value = "presente")]
    Presente,
    #[sea_orm(string_value = "tarde")]
    Tarde,
    #[sea_orm(string_value = "ausente")]
    Ausente,
    #[sea_orm(string_value = "justificado")]
    Justificado,
    #[sea_orm(string_value = "permiso")]
    Permiso,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asistencias")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub empleado_rut: String,
    pub fecha: NaiveDate,
    pub hora_entrada: Option<DateTime<Utc>>,
    pub hora_salida: Option<DateTime<Utc>>,
    pub tipo_entrada: TipoMarcaje,
    pub tipo_salida: TipoMarcaje,
    pub minutos_tarde: i32,
    pub minutos_extras: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub horas_trabajadas: Option<Decimal>,
    pub estado: EstadoAsistencia,
    pub observaciones: Option<String>,
    pub ubicacion_entrada: Option<String>,
    pub ubicacion_salida: Option<String>,
    pub ip_entrada: Option<String>,
    pub ip_salida: Option<String>,
    pub validado_por: Option<i32>,
    pub fecha_validacion: Option<DateTime<Utc>>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
