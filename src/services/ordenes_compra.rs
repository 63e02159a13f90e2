use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};

use crate::{
    auth::Caller,
    db::DbPool,
    entities::{
        inventario,
        item_orden_compra::{self, precio_total},
        orden_compra::{self, EstadoOrden},
        proveedor::{self, EstadoProveedor},
    },
    errors::{is_unique_violation, FieldErrors, ServiceError},
    events::{publish, Event, EventSender},
    services::{
        auditoria::{registrar, Actividad},
        inventario::{aplicar_movimiento, MovimientoStock, TipoMovimiento},
    },
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NuevoItem {
    pub producto_id: Option<i32>,
    pub codigo_producto: Option<String>,
    /// Taken from the linked product when omitted.
    pub nombre_producto: Option<String>,
    pub descripcion: Option<String>,
    pub cantidad: i32,
    pub unidad_medida: Option<String>,
    pub precio_unitario: i64,
    #[serde(default)]
    pub descuento: i64,
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrearOrden {
    pub numero_orden: Option<String>,
    pub proveedor_id: i32,
    pub fecha_orden: Option<NaiveDate>,
    pub fecha_entrega_esperada: Option<NaiveDate>,
    pub estado: Option<EstadoOrden>,
    #[serde(default)]
    pub descuento: i64,
    #[serde(default)]
    pub impuestos: i64,
    pub moneda: Option<String>,
    pub condiciones_pago: Option<String>,
    pub metodo_envio: Option<String>,
    pub direccion_entrega: Option<String>,
    pub notas: Option<String>,
    pub numero_factura: Option<String>,
    #[serde(default)]
    pub items: Vec<NuevoItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActualizarOrden {
    pub proveedor_id: Option<i32>,
    pub fecha_orden: Option<NaiveDate>,
    pub fecha_entrega_esperada: Option<NaiveDate>,
    pub fecha_entrega_real: Option<NaiveDate>,
    pub estado: Option<EstadoOrden>,
    pub descuento: Option<i64>,
    pub impuestos: Option<i64>,
    pub moneda: Option<String>,
    pub condiciones_pago: Option<String>,
    pub metodo_envio: Option<String>,
    pub direccion_entrega: Option<String>,
    pub notas: Option<String>,
    pub numero_factura: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemRecibido {
    pub id: i32,
    pub cantidad_recibida: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recepcion {
    pub items: Vec<ItemRecibido>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EliminarItem {
    pub item_id: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosOrden {
    pub proveedor_id: Option<i32>,
    pub estado: Option<EstadoOrden>,
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrdenDetalle {
    #[serde(flatten)]
    pub orden: orden_compra::Model,
    pub proveedor_nombre: Option<String>,
    pub items: Vec<item_orden_compra::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstadisticasOrdenes {
    pub total_ordenes: u64,
    pub ordenes_pendientes: u64,
    pub ordenes_enviadas: u64,
    pub ordenes_recibidas: u64,
    pub ordenes_canceladas: u64,
    pub total_compras: i64,
}

/// `OC-YYYYMMDD-NNNN`, with `NNNN` the 1-based sequence of the day.
pub fn formato_numero(fecha: NaiveDate, secuencia: u64) -> String {
    format!("OC-{}-{:04}", fecha.format("%Y%m%d"), secuencia)
}

/// Next sequence for `prefijo`: one past the highest numeric suffix in use.
pub fn siguiente_secuencia<S: AsRef<str>>(prefijo: &str, numeros: &[S]) -> u64 {
    numeros
        .iter()
        .filter_map(|n| n.as_ref().strip_prefix(prefijo)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

/// `(subtotal, total)` from line totals and the header adjustments.
/// `None` when the sums leave the `i64` range.
pub fn totales(
    lineas: impl IntoIterator<Item = i64>,
    descuento: i64,
    impuestos: i64,
) -> Option<(i64, i64)> {
    let subtotal = lineas
        .into_iter()
        .try_fold(0i64, |acc, linea| acc.checked_add(linea))?;
    let total = subtotal.checked_sub(descuento)?.checked_add(impuestos)?;
    Some((subtotal, total))
}

const MONTO_EXCEDIDO: &str = "El monto excede el máximo permitido";

fn push(errores: &mut FieldErrors, campo: String, mensaje: &str) {
    errores.entry(campo).or_default().push(mensaje.to_string());
}

fn validar_item(item: &NuevoItem, prefijo: &str, errores: &mut FieldErrors) {
    if item.cantidad <= 0 {
        push(errores, format!("{prefijo}cantidad"), "La cantidad debe ser mayor a 0");
    }
    if item.precio_unitario < 0 {
        push(errores, format!("{prefijo}precio_unitario"), "No puede ser negativo");
    }
    if item.descuento < 0 {
        push(errores, format!("{prefijo}descuento"), "No puede ser negativo");
    }
    if item.cantidad > 0 && item.precio_unitario >= 0 && item.descuento >= 0 {
        match precio_total(item.precio_unitario, item.cantidad, item.descuento) {
            None => push(errores, format!("{prefijo}precio_unitario"), MONTO_EXCEDIDO),
            Some(total) if total < 0 => push(
                errores,
                format!("{prefijo}descuento"),
                "El descuento no puede superar el precio total",
            ),
            Some(_) => {}
        }
    }
}

fn validar_montos_cabecera(descuento: i64, impuestos: i64, errores: &mut FieldErrors) {
    if descuento < 0 {
        push(errores, "descuento".to_string(), "No puede ser negativo");
    }
    if impuestos < 0 {
        push(errores, "impuestos".to_string(), "No puede ser negativo");
    }
}

fn into_result(errores: FieldErrors) -> Result<(), ServiceError> {
    if errores.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::InvalidFields(errores))
    }
}

/// Checks requested receipts against the order lines and returns the new
/// received amount per line id.
pub fn planificar_recepcion(
    items: &[item_orden_compra::Model],
    recepcion: &[ItemRecibido],
) -> Result<HashMap<i32, i32>, ServiceError> {
    let mut plan: HashMap<i32, i32> = items.iter().map(|i| (i.id, i.cantidad_recibida)).collect();
    let mut errores = FieldErrors::new();
    for recibido in recepcion {
        match items.iter().find(|i| i.id == recibido.id) {
            None => push(
                &mut errores,
                "items".to_string(),
                &format!("El item {} no pertenece a la orden", recibido.id),
            ),
            Some(item) if recibido.cantidad_recibida < 0 || recibido.cantidad_recibida > item.cantidad => {
                push(
                    &mut errores,
                    format!("items.{}.cantidad_recibida", recibido.id),
                    &format!("Debe estar entre 0 y {}", item.cantidad),
                )
            }
            Some(item) => {
                plan.insert(item.id, recibido.cantidad_recibida);
            }
        }
    }
    into_result(errores)?;

    if plan.values().all(|recibida| *recibida == 0) {
        return Err(ServiceError::BadRequest(
            "No se puede marcar como recibida sin items recibidos".to_string(),
        ));
    }
    Ok(plan)
}

async fn recalcular<C: ConnectionTrait>(
    db: &C,
    orden: orden_compra::Model,
) -> Result<orden_compra::Model, ServiceError> {
    let lineas = item_orden_compra::Entity::find()
        .filter(item_orden_compra::Column::OrdenCompraId.eq(orden.id))
        .all(db)
        .await?;
    let (subtotal, total) = totales(lineas.iter().map(|i| i.precio_total), orden.descuento, orden.impuestos)
        .ok_or_else(|| ServiceError::field("total", MONTO_EXCEDIDO))?;
    let mut active: orden_compra::ActiveModel = orden.into();
    active.subtotal = Set(subtotal);
    active.total = Set(total);
    active.fecha_actualizacion = Set(Utc::now());
    Ok(active.update(db).await?)
}

async fn insertar_item<C: ConnectionTrait>(
    db: &C,
    orden_id: i32,
    item: NuevoItem,
) -> Result<item_orden_compra::Model, ServiceError> {
    let producto = match item.producto_id {
        Some(id) => Some(
            inventario::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::field("producto_id", format!("Producto {} no existe", id)))?,
        ),
        None => None,
    };
    let nombre = item
        .nombre_producto
        .filter(|n| !n.trim().is_empty())
        .or_else(|| producto.as_ref().map(|p| p.nombre_producto.clone()))
        .ok_or_else(|| ServiceError::field("nombre_producto", "El nombre del producto es obligatorio"))?;
    let codigo = item
        .codigo_producto
        .or_else(|| producto.as_ref().map(|p| p.codigo_producto.clone()));
    let unidad = item
        .unidad_medida
        .or_else(|| producto.as_ref().map(|p| p.unidad_medida.to_string()))
        .unwrap_or_else(|| "unidad".to_string());
    let total = precio_total(item.precio_unitario, item.cantidad, item.descuento)
        .ok_or_else(|| ServiceError::field("precio_unitario", MONTO_EXCEDIDO))?;

    Ok(item_orden_compra::ActiveModel {
        orden_compra_id: Set(orden_id),
        producto_id: Set(item.producto_id),
        codigo_producto: Set(codigo),
        nombre_producto: Set(nombre),
        descripcion: Set(item.descripcion),
        cantidad: Set(item.cantidad),
        cantidad_recibida: Set(0),
        unidad_medida: Set(unidad),
        precio_unitario: Set(item.precio_unitario),
        descuento: Set(item.descuento),
        precio_total: Set(total),
        notas: Set(item.notas),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

#[derive(Clone)]
pub struct OrdenCompraService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrdenCompraService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filtros: FiltrosOrden,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<orden_compra::Model>, u64), ServiceError> {
        let mut query = orden_compra::Entity::find();
        if let Some(proveedor_id) = filtros.proveedor_id {
            query = query.filter(orden_compra::Column::ProveedorId.eq(proveedor_id));
        }
        if let Some(estado) = filtros.estado {
            query = query.filter(orden_compra::Column::Estado.eq(estado));
        }
        if let Some(desde) = filtros.fecha_desde {
            query = query.filter(orden_compra::Column::FechaOrden.gte(desde));
        }
        if let Some(hasta) = filtros.fecha_hasta {
            query = query.filter(orden_compra::Column::FechaOrden.lte(hasta));
        }
        let query = query
            .order_by_desc(orden_compra::Column::FechaCreacion)
            .order_by_desc(orden_compra::Column::Id);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    async fn find(&self, id: i32) -> Result<orden_compra::Model, ServiceError> {
        orden_compra::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Orden de compra {} no encontrada", id)))
    }

    async fn detalle<C: ConnectionTrait>(
        db: &C,
        orden: orden_compra::Model,
    ) -> Result<OrdenDetalle, ServiceError> {
        let items = orden
            .find_related(item_orden_compra::Entity)
            .order_by_asc(item_orden_compra::Column::Id)
            .all(db)
            .await?;
        let proveedor_nombre = orden
            .find_related(proveedor::Entity)
            .one(db)
            .await?
            .map(|p| p.nombre);
        Ok(OrdenDetalle {
            orden,
            proveedor_nombre,
            items,
        })
    }

    pub async fn get(&self, id: i32) -> Result<OrdenDetalle, ServiceError> {
        let orden = self.find(id).await?;
        Self::detalle(&*self.db_pool, orden).await
    }

    async fn require_proveedor_activo(&self, id: i32) -> Result<proveedor::Model, ServiceError> {
        proveedor::Entity::find_by_id(id)
            .filter(proveedor::Column::Activo.eq(true))
            .filter(proveedor::Column::Estado.eq(EstadoProveedor::Activo))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::field("proveedor_id", "El proveedor no existe o no está activo")
            })
    }

    async fn generar_numero<C: ConnectionTrait>(db: &C, fecha: NaiveDate) -> Result<String, ServiceError> {
        let prefijo = format!("OC-{}-", fecha.format("%Y%m%d"));
        let del_dia: Vec<String> = orden_compra::Entity::find()
            .select_only()
            .column(orden_compra::Column::NumeroOrden)
            .filter(orden_compra::Column::NumeroOrden.starts_with(&prefijo))
            .into_tuple()
            .all(db)
            .await?;
        Ok(formato_numero(fecha, siguiente_secuencia(&prefijo, del_dia.as_slice())))
    }

    #[instrument(skip(self, caller, input), fields(proveedor_id = input.proveedor_id))]
    pub async fn create(&self, caller: &Caller, input: CrearOrden) -> Result<OrdenDetalle, ServiceError> {
        let mut errores = FieldErrors::new();
        validar_montos_cabecera(input.descuento, input.impuestos, &mut errores);
        for (i, item) in input.items.iter().enumerate() {
            validar_item(item, &format!("items.{i}."), &mut errores);
        }
        into_result(errores)?;
        self.require_proveedor_activo(input.proveedor_id).await?;

        let now = Utc::now();
        let fecha_orden = input.fecha_orden.unwrap_or_else(super::today);
        let txn = self.db_pool.begin().await?;
        let numero = match input.numero_orden.filter(|n| !n.trim().is_empty()) {
            Some(numero) => numero.trim().to_string(),
            None => Self::generar_numero(&txn, fecha_orden).await?,
        };

        let orden = orden_compra::ActiveModel {
            numero_orden: Set(numero),
            proveedor_id: Set(input.proveedor_id),
            fecha_orden: Set(fecha_orden),
            fecha_entrega_esperada: Set(input.fecha_entrega_esperada),
            fecha_entrega_real: Set(None),
            estado: Set(input.estado.unwrap_or(EstadoOrden::Borrador)),
            subtotal: Set(0),
            descuento: Set(input.descuento),
            impuestos: Set(input.impuestos),
            total: Set(0),
            moneda: Set(input.moneda.unwrap_or_else(|| "CLP".to_string())),
            condiciones_pago: Set(input.condiciones_pago),
            metodo_envio: Set(input.metodo_envio),
            direccion_entrega: Set(input.direccion_entrega),
            notas: Set(input.notas),
            numero_factura: Set(input.numero_factura),
            creado_por: Set(Some(caller.empleado_id)),
            aprobado_por: Set(None),
            fecha_creacion: Set(now),
            fecha_actualizacion: Set(now),
            fecha_aprobacion: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("Ya existe una orden con ese número".to_string())
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;

        for item in input.items {
            insertar_item(&txn, orden.id, item).await?;
        }
        let orden = recalcular(&txn, orden).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("ordenes_compra", "crear", "ordenes_compra")
                .registro(orden.id)
                .descripcion(format!("Orden {} creada", orden.numero_orden))
                .despues(&orden),
        )
        .await?;
        let detalle = Self::detalle(&txn, orden).await?;
        txn.commit().await?;

        counter!("negocio.ordenes.creadas", 1);
        info!(id = detalle.orden.id, numero = %detalle.orden.numero_orden, total = detalle.orden.total, "orden de compra created");
        Ok(detalle)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarOrden,
    ) -> Result<OrdenDetalle, ServiceError> {
        let actual = self.find(id).await?;
        let mut errores = FieldErrors::new();
        validar_montos_cabecera(
            input.descuento.unwrap_or(actual.descuento),
            input.impuestos.unwrap_or(actual.impuestos),
            &mut errores,
        );
        into_result(errores)?;
        if let Some(proveedor_id) = input.proveedor_id.filter(|p| *p != actual.proveedor_id) {
            self.require_proveedor_activo(proveedor_id).await?;
        }

        let mut active: orden_compra::ActiveModel = actual.clone().into();
        if let Some(v) = input.proveedor_id {
            active.proveedor_id = Set(v);
        }
        if let Some(v) = input.fecha_orden {
            active.fecha_orden = Set(v);
        }
        if let Some(v) = input.fecha_entrega_esperada {
            active.fecha_entrega_esperada = Set(Some(v));
        }
        if let Some(v) = input.fecha_entrega_real {
            active.fecha_entrega_real = Set(Some(v));
        }
        if let Some(v) = input.estado {
            active.estado = Set(v);
        }
        if let Some(v) = input.descuento {
            active.descuento = Set(v);
        }
        if let Some(v) = input.impuestos {
            active.impuestos = Set(v);
        }
        if let Some(v) = input.moneda {
            active.moneda = Set(v);
        }
        if let Some(v) = input.condiciones_pago {
            active.condiciones_pago = Set(Some(v));
        }
        if let Some(v) = input.metodo_envio {
            active.metodo_envio = Set(Some(v));
        }
        if let Some(v) = input.direccion_entrega {
            active.direccion_entrega = Set(Some(v));
        }
        if let Some(v) = input.notas {
            active.notas = Set(Some(v));
        }
        if let Some(v) = input.numero_factura {
            active.numero_factura = Set(Some(v));
        }

        let txn = self.db_pool.begin().await?;
        let updated = active.update(&txn).await?;
        let updated = recalcular(&txn, updated).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("ordenes_compra", "actualizar", "ordenes_compra")
                .registro(id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        let detalle = Self::detalle(&txn, updated).await?;
        txn.commit().await?;
        Ok(detalle)
    }

    /// Hard delete with its lines. Only drafts and cancelled orders.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<(), ServiceError> {
        let actual = self.find(id).await?;
        if !matches!(actual.estado, EstadoOrden::Borrador | EstadoOrden::Cancelada) {
            return Err(ServiceError::BadRequest(
                "Solo se pueden eliminar órdenes en estado borrador o cancelada".to_string(),
            ));
        }
        let txn = self.db_pool.begin().await?;
        item_orden_compra::Entity::delete_many()
            .filter(item_orden_compra::Column::OrdenCompraId.eq(id))
            .exec(&txn)
            .await?;
        orden_compra::Entity::delete_by_id(id).exec(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("ordenes_compra", "eliminar", "ordenes_compra")
                .registro(id)
                .antes(&actual),
        )
        .await?;
        txn.commit().await?;
        info!(id, numero = %actual.numero_orden, "orden de compra deleted");
        Ok(())
    }

    #[instrument(skip(self, caller))]
    pub async fn aprobar(&self, caller: &Caller, id: i32) -> Result<OrdenDetalle, ServiceError> {
        let actual = self.find(id).await?;
        if actual.estado != EstadoOrden::Borrador {
            return Err(ServiceError::BadRequest(
                "Solo se pueden aprobar órdenes en estado borrador".to_string(),
            ));
        }
        let now = Utc::now();
        let mut active: orden_compra::ActiveModel = actual.into();
        active.estado = Set(EstadoOrden::Pendiente);
        active.aprobado_por = Set(Some(caller.empleado_id));
        active.fecha_aprobacion = Set(Some(now));
        active.fecha_actualizacion = Set(now);

        let txn = self.db_pool.begin().await?;
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("ordenes_compra", "aprobar", "ordenes_compra")
                .registro(id)
                .descripcion(format!("Orden {} aprobada", updated.numero_orden)),
        )
        .await?;
        let detalle = Self::detalle(&txn, updated).await?;
        txn.commit().await?;
        counter!("negocio.ordenes.aprobadas", 1);
        Ok(detalle)
    }

    /// Records received quantities and moves the received delta into stock.
    #[instrument(skip(self, caller, recepcion))]
    pub async fn recibir(
        &self,
        caller: &Caller,
        id: i32,
        recepcion: Recepcion,
    ) -> Result<OrdenDetalle, ServiceError> {
        let actual = self.find(id).await?;
        if !actual.estado.puede_recibir() {
            return Err(ServiceError::BadRequest(format!(
                "No se puede recibir una orden en estado {}",
                actual.estado
            )));
        }

        let txn = self.db_pool.begin().await?;
        // locks the header so concurrent receipts of one order run one after the other
        let vigente = orden_compra::Entity::update_many()
            .col_expr(orden_compra::Column::FechaActualizacion, Expr::value(Utc::now()))
            .filter(orden_compra::Column::Id.eq(id))
            .filter(orden_compra::Column::Estado.eq(actual.estado))
            .exec(&txn)
            .await?;
        if vigente.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "La orden cambió de estado durante la recepción".to_string(),
            ));
        }
        let actual = orden_compra::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Orden de compra {} no encontrada", id)))?;
        let items = item_orden_compra::Entity::find()
            .filter(item_orden_compra::Column::OrdenCompraId.eq(id))
            .all(&txn)
            .await?;
        let plan = planificar_recepcion(&items, &recepcion.items)?;

        let mut completa = true;
        for item in items {
            let nueva = plan.get(&item.id).copied().unwrap_or(item.cantidad_recibida);
            completa &= nueva >= item.cantidad;
            let delta = nueva - item.cantidad_recibida;
            if delta == 0 {
                continue;
            }

            let marcado = item_orden_compra::Entity::update_many()
                .col_expr(item_orden_compra::Column::CantidadRecibida, Expr::value(nueva))
                .filter(item_orden_compra::Column::Id.eq(item.id))
                .filter(item_orden_compra::Column::CantidadRecibida.eq(item.cantidad_recibida))
                .exec(&txn)
                .await?;
            if marcado.rows_affected == 0 {
                warn!(id, item = item.id, "order line received concurrently");
                return Err(ServiceError::Conflict(
                    "La orden fue recibida por otra operación".to_string(),
                ));
            }

            if let Some(producto_id) = item.producto_id {
                if let Some(producto) = inventario::Entity::find_by_id(producto_id).one(&txn).await? {
                    let movimiento = MovimientoStock {
                        cantidad: Decimal::from(delta.abs()),
                        tipo: if delta > 0 {
                            TipoMovimiento::Ingreso
                        } else {
                            TipoMovimiento::Egreso
                        },
                        notas: Some(format!("Recepción orden {}", actual.numero_orden)),
                    };
                    aplicar_movimiento(&txn, producto, &movimiento, Some(caller.empleado_id)).await?;
                }
            }
        }

        let hoy = super::today();
        let mut active: orden_compra::ActiveModel = actual.clone().into();
        if completa {
            active.estado = Set(EstadoOrden::Recibida);
            active.fecha_entrega_real = Set(Some(hoy));
        } else {
            active.estado = Set(EstadoOrden::ParcialmenteRecibida);
            if actual.fecha_entrega_real.is_none() {
                active.fecha_entrega_real = Set(Some(hoy));
            }
        }
        active.fecha_actualizacion = Set(Utc::now());
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("ordenes_compra", "recibir", "ordenes_compra")
                .registro(id)
                .descripcion(format!("Orden {} {}", updated.numero_orden, updated.estado)),
        )
        .await?;
        let detalle = Self::detalle(&txn, updated).await?;
        txn.commit().await?;

        counter!("negocio.ordenes.recepciones", 1, "estado" => detalle.orden.estado.to_string());
        info!(id, numero = %detalle.orden.numero_orden, completa, "orden de compra received");
        publish(
            &self.event_sender,
            Event::OrdenCompraRecibida {
                orden_id: detalle.orden.id,
                numero_orden: detalle.orden.numero_orden.clone(),
                completa,
                creado_por: detalle.orden.creado_por,
            },
        )
        .await;
        Ok(detalle)
    }

    #[instrument(skip(self, caller, item))]
    pub async fn agregar_item(
        &self,
        caller: &Caller,
        id: i32,
        item: NuevoItem,
    ) -> Result<item_orden_compra::Model, ServiceError> {
        let orden = self.find(id).await?;
        if !orden.estado.items_editables() {
            return Err(ServiceError::BadRequest(format!(
                "No se pueden agregar items a una orden en estado {}",
                orden.estado
            )));
        }
        let mut errores = FieldErrors::new();
        validar_item(&item, "", &mut errores);
        into_result(errores)?;

        let txn = self.db_pool.begin().await?;
        let created = insertar_item(&txn, id, item).await?;
        recalcular(&txn, orden).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("ordenes_compra", "agregar_item", "items_orden_compra")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self, caller))]
    pub async fn eliminar_item(&self, caller: &Caller, id: i32, item_id: i32) -> Result<(), ServiceError> {
        let orden = self.find(id).await?;
        let item = item_orden_compra::Entity::find_by_id(item_id)
            .filter(item_orden_compra::Column::OrdenCompraId.eq(id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Item no encontrado".to_string()))?;

        let txn = self.db_pool.begin().await?;
        item_orden_compra::Entity::delete_by_id(item_id).exec(&txn).await?;
        recalcular(&txn, orden).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("ordenes_compra", "eliminar_item", "items_orden_compra")
                .registro(item_id)
                .antes(&item),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn por_proveedor(&self, proveedor_id: i32) -> Result<Vec<orden_compra::Model>, ServiceError> {
        Ok(orden_compra::Entity::find()
            .filter(orden_compra::Column::ProveedorId.eq(proveedor_id))
            .order_by_desc(orden_compra::Column::FechaCreacion)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn estadisticas(&self) -> Result<EstadisticasOrdenes, ServiceError> {
        let ordenes = orden_compra::Entity::find().all(&*self.db_pool).await?;
        let contar = |estado: EstadoOrden| ordenes.iter().filter(|o| o.estado == estado).count() as u64;
        Ok(EstadisticasOrdenes {
            total_ordenes: ordenes.len() as u64,
            ordenes_pendientes: contar(EstadoOrden::Pendiente),
            ordenes_enviadas: contar(EstadoOrden::Enviada),
            ordenes_recibidas: contar(EstadoOrden::Recibida),
            ordenes_canceladas: contar(EstadoOrden::Cancelada),
            total_compras: super::proveedores::total_compras(&ordenes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn linea(id: i32, cantidad: i32, recibida: i32) -> item_orden_compra::Model {
        item_orden_compra::Model {
            id,
            orden_compra_id: 1,
            producto_id: None,
            codigo_producto: None,
            nombre_producto: format!("Producto {id}"),
            descripcion: None,
            cantidad,
            cantidad_recibida: recibida,
            unidad_medida: "unidad".into(),
            precio_unitario: 1000,
            descuento: 0,
            precio_total: 1000 * i64::from(cantidad),
            notas: None,
        }
    }

    fn nuevo(cantidad: i32, precio: i64, descuento: i64) -> NuevoItem {
        NuevoItem {
            producto_id: None,
            codigo_producto: None,
            nombre_producto: Some("Leche".into()),
            descripcion: None,
            cantidad,
            unidad_medida: None,
            precio_unitario: precio,
            descuento,
            notas: None,
        }
    }

    #[test]
    fn order_number_format() {
        let fecha = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(formato_numero(fecha, 1), "OC-20240307-0001");
        assert_eq!(formato_numero(fecha, 123), "OC-20240307-0123");
    }

    #[test]
    fn header_totals() {
        assert_eq!(totales([10_000, 5_000], 1_000, 2_850), Some((15_000, 16_850)));
        assert_eq!(totales(Vec::<i64>::new(), 0, 0), Some((0, 0)));
        assert_eq!(totales([i64::MAX, 1], 0, 0), None);
        assert_eq!(totales([i64::MAX], 0, 1), None);
    }

    #[test]
    fn sequence_continues_after_the_highest_suffix() {
        let prefijo = "OC-20240307-";
        assert_eq!(siguiente_secuencia::<&str>(prefijo, &[]), 1);
        assert_eq!(
            siguiente_secuencia(prefijo, &["OC-20240307-0002", "OC-20240307-0007"]),
            8
        );
        assert_eq!(
            siguiente_secuencia(prefijo, &["OC-20240307-0003", "OC-20240307-manual"]),
            4
        );
    }

    #[test]
    fn overflowing_line_total_is_a_field_error() {
        let mut errores = FieldErrors::new();
        validar_item(&nuevo(2, 5_000_000_000_000_000_000, 0), "items.0.", &mut errores);
        assert!(errores.contains_key("items.0.precio_unitario"));
    }

    #[test]
    fn item_rules() {
        let mut errores = FieldErrors::new();
        validar_item(&nuevo(0, 100, 0), "items.0.", &mut errores);
        validar_item(&nuevo(2, 100, 500), "items.1.", &mut errores);
        validar_item(&nuevo(3, 100, 50), "items.2.", &mut errores);
        assert!(errores.contains_key("items.0.cantidad"));
        assert!(errores.contains_key("items.1.descuento"));
        assert!(!errores.keys().any(|k| k.starts_with("items.2.")));
    }

    #[test]
    fn receipt_plan_keeps_untouched_lines() {
        let items = vec![linea(1, 10, 0), linea(2, 5, 2)];
        let plan = planificar_recepcion(&items, &[ItemRecibido { id: 1, cantidad_recibida: 10 }]).unwrap();
        assert_eq!(plan[&1], 10);
        assert_eq!(plan[&2], 2);
    }

    #[test]
    fn receipt_over_ordered_amount_is_rejected() {
        let items = vec![linea(1, 10, 0)];
        let err = planificar_recepcion(&items, &[ItemRecibido { id: 1, cantidad_recibida: 11 }]).unwrap_err();
        assert_matches!(err, ServiceError::InvalidFields(f) if f.contains_key("items.1.cantidad_recibida"));
    }

    #[test]
    fn receipt_of_nothing_is_rejected() {
        let items = vec![linea(1, 10, 0)];
        let err = planificar_recepcion(&items, &[ItemRecibido { id: 1, cantidad_recibida: 0 }]).unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(_));
    }

    #[test]
    fn receipt_of_foreign_line_is_rejected() {
        let items = vec![linea(1, 10, 0)];
        let err = planificar_recepcion(&items, &[ItemRecibido { id: 99, cantidad_recibida: 1 }]).unwrap_err();
        assert_matches!(err, ServiceError::InvalidFields(f) if f.contains_key("items"));
    }
}
