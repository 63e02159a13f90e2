use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items_orden_compra")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub orden_compra_id: i32,
    pub producto_id: Option<i32>,
    pub codigo_producto: Option<String>,
    pub nombre_producto: String,
    pub descripcion: Option<String>,
    pub cantidad: i32,
    pub cantidad_recibida: i32,
    pub unidad_medida: String,
    pub precio_unitario: i64,
    pub descuento: i64,
    pub precio_total: i64,
    pub notas: Option<String>,
}

/// `precio_unitario × cantidad − descuento`, or `None` on overflow.
pub fn precio_total(precio_unitario: i64, cantidad: i32, descuento: i64) -> Option<i64> {
    precio_unitario
        .checked_mul(i64::from(cantidad))?
        .checked_sub(descuento)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orden_compra::Entity",
        from = "Column::OrdenCompraId",
        to = "super::orden_compra::Column::Id",
        on_delete = "Cascade"
    )]
    OrdenCompra,
    #[sea_orm(
        belongs_to = "super::inventario::Entity",
        from = "Column::ProductoId",
        to = "super::inventario::Column::Id",
        on_delete = "SetNull"
    )]
    Producto,
}

impl Related<super::orden_compra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrdenCompra.def()
    }
}

impl Related<super::inventario::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Producto.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
