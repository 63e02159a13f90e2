use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstadoProveedor {
    #[sea_orm(string_value = "activo")]
    Activo,
    #[sea_orm(string_value = "inactivo")]
    Inactivo,
    #[sea_orm(string_value = "suspendido")]
    Suspendido,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proveedores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub nombre: String,
    pub razon_social: Option<String>,
    #[sea_orm(unique)]
    pub rut: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub celular: Option<String>,
    pub sitio_web: Option<String>,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub region: Option<String>,
    pub codigo_postal: Option<String>,
    pub pais: String,
    pub contacto_principal: Option<String>,
    pub cargo_contacto: Option<String>,
    pub email_contacto: Option<String>,
    pub telefono_contacto: Option<String>,
    pub estado: EstadoProveedor,
    pub categoria: Option<String>,
    pub tipo_proveedor: Option<String>,
    pub condiciones_pago: Option<String>,
    pub plazo_entrega: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub descuento: Decimal,
    pub notas: Option<String>,
    pub activo: bool,
    pub creado_por: Option<i32>,
    pub actualizado_por: Option<i32>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::orden_compra::Entity")]
    OrdenesCompra,
}

impl Related<super::orden_compra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrdenesCompra.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
