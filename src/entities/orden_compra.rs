use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EstadoOrden {
    #[sea_orm(string_value = "borrador")]
    Borrador,
    #[sea_orm(string_value = "pendiente")]
    Pendiente,
    #[sea_orm(string_value = "enviada")]
    Enviada,
    #[sea_orm(string_value = "confirmada")]
    Confirmada,
    #[sea_orm(string_value = "en_transito")]
    EnTransito,
    #[sea_orm(string_value = "recibida")]
    Recibida,
    #[sea_orm(string_value = "parcialmente_recibida")]
    ParcialmenteRecibida,
    #[sea_orm(string_value = "cancelada")]
    Cancelada,
    #[sea_orm(string_value = "facturada")]
    Facturada,
}

impl EstadoOrden {
    /// States in which goods may still arrive.
    pub fn puede_recibir(self) -> bool {
        matches!(
            self,
            EstadoOrden::Pendiente
                | EstadoOrden::Enviada
                | EstadoOrden::Confirmada
                | EstadoOrden::EnTransito
                | EstadoOrden::ParcialmenteRecibida
        )
    }

    /// Line items are frozen once goods are in or the order is closed.
    pub fn items_editables(self) -> bool {
        !matches!(
            self,
            EstadoOrden::Recibida | EstadoOrden::Cancelada | EstadoOrden::Facturada
        )
    }

    /// Orders whose total counts as money spent.
    pub fn cuenta_como_compra(self) -> bool {
        matches!(
            self,
            EstadoOrden::Recibida | EstadoOrden::ParcialmenteRecibida | EstadoOrden::Facturada
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ordenes_compra")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub numero_orden: String,
    pub proveedor_id: i32,
    pub fecha_orden: NaiveDate,
    pub fecha_entrega_esperada: Option<NaiveDate>,
    pub fecha_entrega_real: Option<NaiveDate>,
    pub estado: EstadoOrden,
    pub subtotal: i64,
    pub descuento: i64,
    pub impuestos: i64,
    pub total: i64,
    pub moneda: String,
    pub condiciones_pago: Option<String>,
    pub metodo_envio: Option<String>,
    pub direccion_entrega: Option<String>,
    pub notas: Option<String>,
    pub numero_factura: Option<String>,
    pub creado_por: Option<i32>,
    pub aprobado_por: Option<i32>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub fecha_aprobacion: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::proveedor::Entity",
        from = "Column::ProveedorId",
        to = "super::proveedor::Column::Id"
    )]
    Proveedor,
    #[sea_orm(has_many = "super::item_orden_compra::Entity")]
    Items,
}

impl Related<super::proveedor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proveedor.def()
    }
}

impl Related<super::item_orden_compra::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
