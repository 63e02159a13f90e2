use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Categoria {
    #[sea_orm(string_value = "cafe")]
    Cafe,
    #[sea_orm(string_value = "insumos")]
    Insumos,
    #[sea_orm(string_value = "equipamiento")]
    Equipamiento,
    #[sea_orm(string_value = "desechables")]
    Desechables,
    #[sea_orm(string_value = "alimentos")]
    Alimentos,
    #[sea_orm(string_value = "bebidas")]
    Bebidas,
    #[sea_orm(string_value = "limpieza")]
    Limpieza,
    #[sea_orm(string_value = "otros")]
    Otros,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnidadMedida {
    #[sea_orm(string_value = "unidad")]
    Unidad,
    #[sea_orm(string_value = "kilogramo")]
    Kilogramo,
    #[sea_orm(string_value = "litro")]
    Litro,
    #[sea_orm(string_value = "gramo")]
    Gramo,
    #[sea_orm(string_value = "mililitro")]
    Mililitro,
    #[sea_orm(string_value = "paquete")]
    Paquete,
    #[sea_orm(string_value = "caja")]
    Caja,
    #[sea_orm(string_value = "bolsa")]
    Bolsa,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstadoInventario {
    #[sea_orm(string_value = "disponible")]
    Disponible,
    #[sea_orm(string_value = "agotado")]
    Agotado,
    #[sea_orm(string_value = "por_vencer")]
    PorVencer,
    #[sea_orm(string_value = "vencido")]
    Vencido,
    #[sea_orm(string_value = "en_pedido")]
    EnPedido,
    #[sea_orm(string_value = "descontinuado")]
    Descontinuado,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventario")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub codigo_producto: String,
    pub nombre_producto: String,
    pub descripcion: Option<String>,
    pub categoria: Categoria,
    pub unidad_medida: UnidadMedida,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub cantidad_actual: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub cantidad_minima: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub cantidad_maxima: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub precio_unitario: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub precio_venta: Option<Decimal>,
    pub codigo_qr: Option<String>,
    pub codigo_barra: Option<String>,
    pub ubicacion: Option<String>,
    pub proveedor: Option<String>,
    pub contacto_proveedor: Option<String>,
    pub fecha_ultimo_ingreso: Option<DateTime<Utc>>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub lote: Option<String>,
    pub estado: EstadoInventario,
    pub requiere_alerta: bool,
    pub imagen_producto: Option<String>,
    pub notas: Option<String>,
    pub creado_por: Option<i32>,
    pub actualizado_por: Option<i32>,
    pub activo: bool,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item_orden_compra::Entity")]
    ItemsOrdenCompra,
}

impl Related<super::item_orden_compra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ItemsOrdenCompra.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
