use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    auth::Caller,
    db::DbPool,
    entities::{
        orden_compra,
        proveedor::{self, EstadoProveedor},
    },
    errors::ServiceError,
    rut::{validate_rut, Rut},
    services::auditoria::{registrar, Actividad},
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrearProveedor {
    #[validate(length(min = 1, max = 200, message = "El nombre es obligatorio"))]
    pub nombre: String,
    pub razon_social: Option<String>,
    #[validate(custom = "validate_rut")]
    pub rut: Option<String>,
    #[validate(email(message = "Correo inválido"))]
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub celular: Option<String>,
    pub sitio_web: Option<String>,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub region: Option<String>,
    pub codigo_postal: Option<String>,
    pub pais: Option<String>,
    pub contacto_principal: Option<String>,
    pub cargo_contacto: Option<String>,
    #[validate(email(message = "Correo inválido"))]
    pub email_contacto: Option<String>,
    pub telefono_contacto: Option<String>,
    pub estado: Option<EstadoProveedor>,
    pub categoria: Option<String>,
    pub tipo_proveedor: Option<String>,
    pub condiciones_pago: Option<String>,
    pub plazo_entrega: Option<String>,
    pub descuento: Option<Decimal>,
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ActualizarProveedor {
    #[validate(length(min = 1, max = 200, message = "El nombre es obligatorio"))]
    pub nombre: Option<String>,
    pub razon_social: Option<String>,
    #[validate(custom = "validate_rut")]
    pub rut: Option<String>,
    #[validate(email(message = "Correo inválido"))]
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub celular: Option<String>,
    pub sitio_web: Option<String>,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub region: Option<String>,
    pub codigo_postal: Option<String>,
    pub pais: Option<String>,
    pub contacto_principal: Option<String>,
    pub cargo_contacto: Option<String>,
    #[validate(email(message = "Correo inválido"))]
    pub email_contacto: Option<String>,
    pub telefono_contacto: Option<String>,
    pub estado: Option<EstadoProveedor>,
    pub categoria: Option<String>,
    pub tipo_proveedor: Option<String>,
    pub condiciones_pago: Option<String>,
    pub plazo_entrega: Option<String>,
    pub descuento: Option<Decimal>,
    pub notas: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosProveedor {
    pub estado: Option<EstadoProveedor>,
    pub categoria: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorialCompras {
    pub proveedor_id: i32,
    pub proveedor_nombre: String,
    pub total_ordenes: u64,
    pub total_compras: i64,
    pub ultima_compra: Option<DateTime<Utc>>,
    pub ordenes: Vec<orden_compra::Model>,
}

fn check_descuento(descuento: Option<Decimal>) -> Result<(), ServiceError> {
    match descuento {
        Some(d) if d < Decimal::ZERO || d > Decimal::ONE_HUNDRED => Err(ServiceError::field(
            "descuento",
            "El descuento debe estar entre 0 y 100",
        )),
        _ => Ok(()),
    }
}

fn canonical_rut(raw: Option<&str>) -> Result<Option<String>, ServiceError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => Rut::parse(raw)
            .map(|r| Some(r.into_inner()))
            .map_err(|e| ServiceError::field("rut", e.to_string())),
        None => Ok(None),
    }
}

/// Purchases that count toward the supplier's spend.
pub fn total_compras(ordenes: &[orden_compra::Model]) -> i64 {
    ordenes
        .iter()
        .filter(|o| o.estado.cuenta_como_compra())
        .fold(0i64, |acc, o| acc.saturating_add(o.total))
}

#[derive(Clone)]
pub struct ProveedorService {
    db_pool: Arc<DbPool>,
}

impl ProveedorService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn activos() -> sea_orm::Select<proveedor::Entity> {
        proveedor::Entity::find().filter(proveedor::Column::Activo.eq(true))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filtros: FiltrosProveedor,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<proveedor::Model>, u64), ServiceError> {
        let mut query = Self::activos();
        if let Some(estado) = filtros.estado {
            query = query.filter(proveedor::Column::Estado.eq(estado));
        }
        if let Some(categoria) = filtros.categoria.as_deref().filter(|c| !c.is_empty()) {
            query = query.filter(proveedor::Column::Categoria.eq(categoria));
        }
        if let Some(search) = filtros.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(proveedor::Column::Nombre.contains(search))
                    .add(proveedor::Column::RazonSocial.contains(search))
                    .add(proveedor::Column::Rut.contains(search))
                    .add(proveedor::Column::Email.contains(search))
                    .add(proveedor::Column::ContactoPrincipal.contains(search)),
            );
        }
        let query = query.order_by_desc(proveedor::Column::FechaCreacion);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    pub async fn get(&self, id: i32) -> Result<proveedor::Model, ServiceError> {
        Self::activos()
            .filter(proveedor::Column::Id.eq(id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Proveedor {} no encontrado", id)))
    }

    async fn ensure_unico(
        &self,
        nombre: Option<&str>,
        rut: Option<&str>,
        excluir: Option<i32>,
    ) -> Result<(), ServiceError> {
        let checks = [
            ("nombre", nombre.map(|n| proveedor::Column::Nombre.eq(n))),
            ("rut", rut.map(|r| proveedor::Column::Rut.eq(r))),
        ];
        for (campo, condicion) in checks {
            let Some(condicion) = condicion else { continue };
            let mut query = proveedor::Entity::find().filter(condicion);
            if let Some(id) = excluir {
                query = query.filter(proveedor::Column::Id.ne(id));
            }
            if query.count(&*self.db_pool).await? > 0 {
                return Err(ServiceError::Conflict(format!(
                    "Ya existe un proveedor con ese {}",
                    campo
                )));
            }
        }
        Ok(())
    }

    #[instrument(skip(self, caller, input), fields(nombre = %input.nombre))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: CrearProveedor,
    ) -> Result<proveedor::Model, ServiceError> {
        input.validate()?;
        check_descuento(input.descuento)?;
        let nombre = input.nombre.trim().to_string();
        let rut = canonical_rut(input.rut.as_deref())?;
        self.ensure_unico(Some(&nombre), rut.as_deref(), None).await?;

        let now = Utc::now();
        let txn = self.db_pool.begin().await?;
        let created = proveedor::ActiveModel {
            nombre: Set(nombre),
            razon_social: Set(input.razon_social),
            rut: Set(rut),
            email: Set(input.email),
            telefono: Set(input.telefono),
            celular: Set(input.celular),
            sitio_web: Set(input.sitio_web),
            direccion: Set(input.direccion),
            ciudad: Set(input.ciudad),
            region: Set(input.region),
            codigo_postal: Set(input.codigo_postal),
            pais: Set(input.pais.unwrap_or_else(|| "Chile".to_string())),
            contacto_principal: Set(input.contacto_principal),
            cargo_contacto: Set(input.cargo_contacto),
            email_contacto: Set(input.email_contacto),
            telefono_contacto: Set(input.telefono_contacto),
            estado: Set(input.estado.unwrap_or(EstadoProveedor::Activo)),
            categoria: Set(input.categoria),
            tipo_proveedor: Set(input.tipo_proveedor),
            condiciones_pago: Set(input.condiciones_pago),
            plazo_entrega: Set(input.plazo_entrega),
            descuento: Set(input.descuento.unwrap_or(Decimal::ZERO)),
            notas: Set(input.notas),
            activo: Set(true),
            creado_por: Set(Some(caller.empleado_id)),
            actualizado_por: Set(None),
            fecha_creacion: Set(now),
            fecha_actualizacion: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("proveedores", "crear", "proveedores")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;

        info!(id = created.id, nombre = %created.nombre, "proveedor created");
        Ok(created)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarProveedor,
    ) -> Result<proveedor::Model, ServiceError> {
        input.validate()?;
        check_descuento(input.descuento)?;
        let actual = self.get(id).await?;

        let nombre = input
            .nombre
            .as_deref()
            .map(str::trim)
            .filter(|n| *n != actual.nombre)
            .map(str::to_string);
        let rut = canonical_rut(input.rut.as_deref())?.filter(|r| Some(r) != actual.rut.as_ref());
        self.ensure_unico(nombre.as_deref(), rut.as_deref(), Some(id)).await?;

        let mut active: proveedor::ActiveModel = actual.clone().into();
        if let Some(v) = nombre {
            active.nombre = Set(v);
        }
        if let Some(v) = rut {
            active.rut = Set(Some(v));
        }
        macro_rules! opcional {
            ($($campo:ident),* $(,)?) => {
                $(if let Some(v) = input.$campo {
                    active.$campo = Set(Some(v));
                })*
            };
        }
        opcional!(
            razon_social,
            email,
            telefono,
            celular,
            sitio_web,
            direccion,
            ciudad,
            region,
            codigo_postal,
            contacto_principal,
            cargo_contacto,
            email_contacto,
            telefono_contacto,
            categoria,
            tipo_proveedor,
            condiciones_pago,
            plazo_entrega,
            notas,
        );
        if let Some(v) = input.pais {
            active.pais = Set(v);
        }
        if let Some(v) = input.estado {
            active.estado = Set(v);
        }
        if let Some(v) = input.descuento {
            active.descuento = Set(v);
        }
        active.actualizado_por = Set(Some(caller.empleado_id));
        active.fecha_actualizacion = Set(Utc::now());

        let txn = self.db_pool.begin().await?;
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("proveedores", "actualizar", "proveedores")
                .registro(id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.get(id).await?;
        let txn = self.db_pool.begin().await?;
        let mut active: proveedor::ActiveModel = actual.into();
        active.activo = Set(false);
        active.actualizado_por = Set(Some(caller.empleado_id));
        active.fecha_actualizacion = Set(Utc::now());
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("proveedores", "eliminar", "proveedores")
                .registro(id)
                .descripcion(format!("Proveedor {} desactivado", updated.nombre)),
        )
        .await?;
        txn.commit().await?;
        info!(id, "proveedor deactivated");
        Ok(())
    }

    pub async fn list_activos(&self) -> Result<Vec<proveedor::Model>, ServiceError> {
        Ok(Self::activos()
            .filter(proveedor::Column::Estado.eq(EstadoProveedor::Activo))
            .order_by_asc(proveedor::Column::Nombre)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn historial_compras(&self, id: i32) -> Result<HistorialCompras, ServiceError> {
        let proveedor = self.get(id).await?;
        let ordenes = orden_compra::Entity::find()
            .filter(orden_compra::Column::ProveedorId.eq(id))
            .order_by_desc(orden_compra::Column::FechaOrden)
            .order_by_desc(orden_compra::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let ultima_compra = ordenes
            .iter()
            .find(|o| o.estado.cuenta_como_compra())
            .map(|o| o.fecha_creacion);
        Ok(HistorialCompras {
            proveedor_id: proveedor.id,
            proveedor_nombre: proveedor.nombre,
            total_ordenes: ordenes.len() as u64,
            total_compras: total_compras(&ordenes),
            ultima_compra,
            ordenes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::orden_compra::EstadoOrden;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn orden(estado: EstadoOrden, total: i64) -> orden_compra::Model {
        let now = Utc::now();
        orden_compra::Model {
            id: 1,
            numero_orden: "OC-20240101-0001".into(),
            proveedor_id: 1,
            fecha_orden: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            fecha_entrega_esperada: None,
            fecha_entrega_real: None,
            estado,
            subtotal: total,
            descuento: 0,
            impuestos: 0,
            total,
            moneda: "CLP".into(),
            condiciones_pago: None,
            metodo_envio: None,
            direccion_entrega: None,
            notas: None,
            numero_factura: None,
            creado_por: None,
            aprobado_por: None,
            fecha_creacion: now,
            fecha_actualizacion: now,
            fecha_aprobacion: None,
        }
    }

    #[test]
    fn spend_counts_only_received_or_invoiced() {
        let ordenes = vec![
            orden(EstadoOrden::Recibida, 1000),
            orden(EstadoOrden::ParcialmenteRecibida, 500),
            orden(EstadoOrden::Facturada, 250),
            orden(EstadoOrden::Pendiente, 9999),
            orden(EstadoOrden::Cancelada, 9999),
        ];
        assert_eq!(total_compras(&ordenes), 1750);
    }

    #[test]
    fn discount_bounds() {
        assert!(check_descuento(Some(dec!(0))).is_ok());
        assert!(check_descuento(Some(dec!(100))).is_ok());
        assert!(check_descuento(None).is_ok());
        assert!(check_descuento(Some(dec!(100.01))).is_err());
        assert!(check_descuento(Some(dec!(-1))).is_err());
    }

    #[test]
    fn supplier_rut_is_canonicalized() {
        assert_eq!(
            canonical_rut(Some("76.543.210-3")).unwrap(),
            Some("76543210-3".to_string())
        );
        assert_eq!(canonical_rut(Some("  ")).unwrap(), None);
        assert!(canonical_rut(Some("76543210-9")).is_err());
    }
}
