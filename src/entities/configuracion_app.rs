use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TipoValor {
    #[sea_orm(string_value = "string")]
    String,
    #[sea_orm(string_value = "number")]
    Number,
    #[sea_orm(string_value = "boolean")]
    Boolean,
    #[sea_orm(string_value = "json")]
    Json,
}

impl TipoValor {
    /// Whether `valor` is a well-formed literal of this type.
    pub fn acepta(self, valor: &str) -> bool {
        match self {
            TipoValor::String => true,
            TipoValor::Number => valor.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false),
            TipoValor::Boolean => matches!(valor.trim(), "true" | "false"),
            TipoValor::Json => serde_json::from_str::<serde_json::Value>(valor).is_ok(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "configuracion_app")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub clave: String,
    pub valor: String,
    pub tipo: TipoValor,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
    pub fecha_actualizacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::TipoValor;
    use test_case::test_case;

    #[test_case(TipoValor::Number, "12.5", true)]
    #[test_case(TipoValor::Number, "doce", false)]
    #[test_case(TipoValor::Boolean, "true", true)]
    #[test_case(TipoValor::Boolean, "si", false)]
    #[test_case(TipoValor::Json, r#"{"a": 1}"#, true)]
    #[test_case(TipoValor::Json, "{a:1", false)]
    #[test_case(TipoValor::String, "", true)]
    fn literal_matches_declared_type(tipo: TipoValor, valor: &str, expected: bool) {
        assert_eq!(tipo.acepta(valor), expected);
    }
}
