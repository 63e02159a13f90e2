use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TipoReporte {
    #[sea_orm(string_value = "asistencia")]
    Asistencia,
    #[sea_orm(string_value = "inventario")]
    Inventario,
    #[sea_orm(string_value = "personal")]
    Personal,
    #[sea_orm(string_value = "financiero")]
    Financiero,
    #[sea_orm(string_value = "personalizado")]
    Personalizado,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FormatoReporte {
    #[sea_orm(string_value = "pdf")]
    Pdf,
    #[sea_orm(string_value = "excel")]
    Excel,
    #[sea_orm(string_value = "csv")]
    Csv,
    #[sea_orm(string_value = "json")]
    Json,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reportes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub nombre_reporte: String,
    pub tipo_reporte: TipoReporte,
    pub periodo_inicio: Option<NaiveDate>,
    pub periodo_fin: Option<NaiveDate>,
    pub parametros: Option<Json>,
    pub archivo_generado: Option<String>,
    pub formato: FormatoReporte,
    pub generado_por: Option<i32>,
    pub fecha_generacion: DateTime<Utc>,
    pub tiempo_generacion: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
