use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TipoContrato {
    #[sea_orm(string_value = "indefinido")]
    Indefinido,
    #[sea_orm(string_value = "plazo_fijo")]
    PlazoFijo,
    #[sea_orm(string_value = "full_time")]
    FullTime,
    #[sea_orm(string_value = "part_time")]
    PartTime,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstadoEmpleado {
    #[sea_orm(string_value = "activo")]
    Activo,
    #[sea_orm(string_value = "inactivo")]
    Inactivo,
    #[sea_orm(string_value = "vacaciones")]
    Vacaciones,
    #[sea_orm(string_value = "licencia")]
    Licencia,
    #[sea_orm(string_value = "desvinculado")]
    Desvinculado,
}

/// Access role. Stored on the employee row and resolved on every request.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rol {
    #[sea_orm(string_value = "gerente")]
    Gerente,
    #[sea_orm(string_value = "administrador")]
    Administrador,
    #[sea_orm(string_value = "empleado")]
    Empleado,
}

impl Rol {
    /// Parses a caller-supplied role string, lowercased and trimmed.
    pub fn from_header(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "gerente" => Some(Rol::Gerente),
            "administrador" => Some(Rol::Administrador),
            "empleado" => Some(Rol::Empleado),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "empleados")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub rut: String,
    pub nombre: String,
    pub apellido: String,
    pub correo: Option<String>,
    pub celular: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub direccion: Option<String>,
    pub cargo: String,
    pub departamento: Option<String>,
    pub fecha_contratacion: NaiveDate,
    pub fecha_termino: Option<NaiveDate>,
    pub salario: Option<i64>,
    pub tipo_contrato: TipoContrato,
    pub estado: EstadoEmpleado,
    pub rol: Rol,
    /// Argon2 PHC string, or a legacy value awaiting rehash on next login.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub foto_perfil: Option<String>,
    pub observaciones: Option<String>,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

impl Model {
    /// Active flag set and not in a terminal employment state.
    pub fn puede_operar(&self) -> bool {
        self.activo
            && !matches!(
                self.estado,
                EstadoEmpleado::Inactivo | EstadoEmpleado::Desvinculado
            )
    }

    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::solicitud::Entity")]
    Solicitudes,
    #[sea_orm(has_many = "super::notificacion::Entity")]
    Notificaciones,
}

impl Related<super::solicitud::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Solicitudes.def()
    }
}

impl Related<super::notificacion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notificaciones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
