use chrono::{Duration, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use strum::IntoEnumIterator;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::Caller,
    db::DbPool,
    entities::inventario::{self, Categoria, EstadoInventario, UnidadMedida},
    errors::{is_unique_violation, FieldErrors, ServiceError},
    events::{publish, Event, EventSender},
    services::auditoria::{registrar, Actividad},
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrearInventario {
    #[validate(length(min = 1, max = 50, message = "El código es obligatorio"))]
    pub codigo_producto: String,
    #[validate(length(min = 1, max = 200, message = "El nombre es obligatorio"))]
    pub nombre_producto: String,
    pub descripcion: Option<String>,
    pub categoria: Option<Categoria>,
    pub unidad_medida: Option<UnidadMedida>,
    pub cantidad_actual: Option<Decimal>,
    pub cantidad_minima: Option<Decimal>,
    pub cantidad_maxima: Option<Decimal>,
    pub precio_unitario: Option<Decimal>,
    pub precio_venta: Option<Decimal>,
    /// Used to derive `precio_venta` when it is omitted.
    pub margen_porcentaje: Option<Decimal>,
    pub codigo_qr: Option<String>,
    pub codigo_barra: Option<String>,
    pub ubicacion: Option<String>,
    pub proveedor: Option<String>,
    pub contacto_proveedor: Option<String>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub lote: Option<String>,
    pub estado: Option<EstadoInventario>,
    pub requiere_alerta: Option<bool>,
    pub imagen_producto: Option<String>,
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ActualizarInventario {
    #[validate(length(min = 1, max = 50, message = "El código es obligatorio"))]
    pub codigo_producto: Option<String>,
    #[validate(length(min = 1, max = 200, message = "El nombre es obligatorio"))]
    pub nombre_producto: Option<String>,
    pub descripcion: Option<String>,
    pub categoria: Option<Categoria>,
    pub unidad_medida: Option<UnidadMedida>,
    pub cantidad_actual: Option<Decimal>,
    pub cantidad_minima: Option<Decimal>,
    pub cantidad_maxima: Option<Decimal>,
    pub precio_unitario: Option<Decimal>,
    pub precio_venta: Option<Decimal>,
    pub margen_porcentaje: Option<Decimal>,
    pub codigo_qr: Option<String>,
    pub codigo_barra: Option<String>,
    pub ubicacion: Option<String>,
    pub proveedor: Option<String>,
    pub contacto_proveedor: Option<String>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub lote: Option<String>,
    pub estado: Option<EstadoInventario>,
    pub requiere_alerta: Option<bool>,
    pub imagen_producto: Option<String>,
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TipoMovimiento {
    Ingreso,
    Egreso,
    #[default]
    Ajuste,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovimientoStock {
    pub cantidad: Decimal,
    #[serde(default)]
    pub tipo: TipoMovimiento,
    pub notas: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosInventario {
    pub categoria: Option<Categoria>,
    pub estado: Option<EstadoInventario>,
    pub proveedor: Option<String>,
    pub search: Option<String>,
    pub low_stock: Option<bool>,
    pub expiring_soon: Option<bool>,
    pub expired: Option<bool>,
    pub ordering: Option<String>,
}

/// An item plus the figures computed on every read.
#[derive(Debug, Clone, Serialize)]
pub struct InventarioView {
    #[serde(flatten)]
    pub item: inventario::Model,
    pub stock_bajo: bool,
    pub por_vencer: bool,
    pub valor_total: Decimal,
    pub margen_porcentaje: Option<Decimal>,
}

impl InventarioView {
    pub fn new(item: inventario::Model, hoy: NaiveDate, dias_alerta: i64) -> Self {
        let limite = hoy + Duration::days(dias_alerta);
        Self {
            stock_bajo: item.cantidad_actual <= item.cantidad_minima,
            por_vencer: item.fecha_vencimiento.map_or(false, |f| f <= limite),
            valor_total: valor_total(&item),
            margen_porcentaje: margen(item.precio_unitario, item.precio_venta),
            item,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstadisticasInventario {
    pub total_productos: u64,
    pub productos_disponibles: u64,
    pub productos_agotados: u64,
    pub productos_por_vencer: u64,
    pub productos_vencidos: u64,
    pub stock_bajo: u64,
    pub valor_total_inventario: Decimal,
    pub categorias_distribucion: BTreeMap<String, u64>,
}

/// Largest value a `DECIMAL(12,2)` inventory column holds: 9_999_999_999.99.
pub const MONTO_MAXIMO: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

const MONTO_FUERA_DE_RANGO: &str = "Debe ser como máximo 9999999999.99 con hasta 2 decimales";

/// Whether `valor` fits a `DECIMAL(12,2)` column.
pub fn monto_representable(valor: Decimal) -> bool {
    valor.abs() <= MONTO_MAXIMO && valor.normalize().scale() <= 2
}

fn valor_total(item: &inventario::Model) -> Decimal {
    item.precio_unitario
        .and_then(|p| p.checked_mul(item.cantidad_actual))
        .map(|v| v.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

/// `(venta - unitario) / unitario * 100`, when both prices exist and unitario > 0.
pub fn margen(precio_unitario: Option<Decimal>, precio_venta: Option<Decimal>) -> Option<Decimal> {
    match (precio_unitario, precio_venta) {
        (Some(unitario), Some(venta)) if unitario > Decimal::ZERO => {
            Some(((venta - unitario) / unitario * Decimal::ONE_HUNDRED).round_dp(2))
        }
        _ => None,
    }
}

/// Sale price from cost and a margin percentage, `None` on overflow.
pub fn precio_con_margen(precio_unitario: Decimal, margen: Decimal) -> Option<Decimal> {
    let factor = Decimal::ONE.checked_add(margen.checked_div(Decimal::ONE_HUNDRED)?)?;
    Some(precio_unitario.checked_mul(factor)?.round_dp(2))
}

/// Stock-driven state. `por_vencer` doubles as the low-stock marker.
pub fn estado_por_stock(cantidad: Decimal, minima: Decimal) -> EstadoInventario {
    if cantidad <= Decimal::ZERO {
        EstadoInventario::Agotado
    } else if cantidad <= minima {
        EstadoInventario::PorVencer
    } else {
        EstadoInventario::Disponible
    }
}

struct Montos {
    cantidad_actual: Decimal,
    cantidad_minima: Decimal,
    cantidad_maxima: Option<Decimal>,
    precio_unitario: Option<Decimal>,
    precio_venta: Option<Decimal>,
}

fn validar_montos(m: &Montos) -> Result<(), ServiceError> {
    let mut errores = FieldErrors::new();
    let mut negativo = |campo: &str, valor: Option<Decimal>| {
        let Some(v) = valor else { return };
        if v < Decimal::ZERO {
            errores
                .entry(campo.to_string())
                .or_default()
                .push("No puede ser negativo".to_string());
        }
        if !monto_representable(v) {
            errores
                .entry(campo.to_string())
                .or_default()
                .push(MONTO_FUERA_DE_RANGO.to_string());
        }
    };
    negativo("cantidad_actual", Some(m.cantidad_actual));
    negativo("cantidad_minima", Some(m.cantidad_minima));
    negativo("cantidad_maxima", m.cantidad_maxima);
    negativo("precio_unitario", m.precio_unitario);
    negativo("precio_venta", m.precio_venta);

    if let Some(maxima) = m.cantidad_maxima {
        if maxima <= m.cantidad_minima {
            errores
                .entry("cantidad_maxima".to_string())
                .or_default()
                .push("Debe ser mayor que la cantidad mínima".to_string());
        }
    }

    if errores.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::InvalidFields(errores))
    }
}

fn validar_vencimiento(fecha: Option<NaiveDate>, hoy: NaiveDate) -> Result<(), ServiceError> {
    match fecha {
        Some(fecha) if fecha < hoy => Err(ServiceError::field(
            "fecha_vencimiento",
            "La fecha de vencimiento no puede estar en el pasado",
        )),
        _ => Ok(()),
    }
}

fn precio_venta_final(
    precio_unitario: Option<Decimal>,
    precio_venta: Option<Decimal>,
    margen: Option<Decimal>,
) -> Result<Option<Decimal>, ServiceError> {
    match (precio_venta, margen) {
        (Some(venta), _) => Ok(Some(venta)),
        (None, Some(margen)) => match precio_unitario {
            Some(unitario) => precio_con_margen(unitario, margen)
                .map(Some)
                .ok_or_else(|| ServiceError::field("margen_porcentaje", MONTO_FUERA_DE_RANGO)),
            None => Err(ServiceError::field(
                "margen_porcentaje",
                "Se necesita precio_unitario para calcular el precio de venta",
            )),
        },
        (None, None) => Ok(None),
    }
}

fn nota_con_fecha(existentes: Option<&str>, nota: &str) -> String {
    let linea = format!("[{}] {}", Utc::now().format("%Y-%m-%d %H:%M"), nota.trim());
    match existentes.filter(|n| !n.is_empty()) {
        Some(previas) => format!("{}\n{}", previas, linea),
        None => linea,
    }
}

/// Applies a stock movement through `db`. Shared with purchase-order receiving.
pub(crate) async fn aplicar_movimiento<C: ConnectionTrait>(
    db: &C,
    item: inventario::Model,
    movimiento: &MovimientoStock,
    actor: Option<i32>,
) -> Result<inventario::Model, ServiceError> {
    if movimiento.cantidad < Decimal::ZERO {
        return Err(ServiceError::field("cantidad", "La cantidad no puede ser negativa"));
    }
    if !monto_representable(movimiento.cantidad) {
        return Err(ServiceError::field("cantidad", MONTO_FUERA_DE_RANGO));
    }

    let now = Utc::now();
    let nueva = match movimiento.tipo {
        TipoMovimiento::Ingreso => item.cantidad_actual + movimiento.cantidad,
        TipoMovimiento::Egreso => item.cantidad_actual - movimiento.cantidad,
        TipoMovimiento::Ajuste => movimiento.cantidad,
    };
    if nueva > MONTO_MAXIMO {
        return Err(ServiceError::field("cantidad", "El stock resultante excede el máximo permitido"));
    }
    if nueva < Decimal::ZERO {
        return Err(ServiceError::BadRequest(
            "No se puede tener stock negativo".to_string(),
        ));
    }

    let notas = movimiento
        .notas
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .map(|n| nota_con_fecha(item.notas.as_deref(), n));

    let minima = item.cantidad_minima;
    let mut active: inventario::ActiveModel = item.into();
    active.cantidad_actual = Set(nueva);
    active.estado = Set(estado_por_stock(nueva, minima));
    if movimiento.tipo == TipoMovimiento::Ingreso {
        active.fecha_ultimo_ingreso = Set(Some(now));
    }
    if let Some(notas) = notas {
        active.notas = Set(Some(notas));
    }
    if actor.is_some() {
        active.actualizado_por = Set(actor);
    }
    active.fecha_actualizacion = Set(now);

    let updated = active.update(db).await?;
    counter!("negocio.inventario.movimientos", 1, "tipo" => movimiento.tipo.to_string());
    Ok(updated)
}

pub(crate) fn stock_bajo_event(item: &inventario::Model) -> Option<Event> {
    (item.cantidad_actual <= item.cantidad_minima).then(|| Event::StockBajo {
        producto_id: item.id,
        codigo_producto: item.codigo_producto.clone(),
        nombre_producto: item.nombre_producto.clone(),
        cantidad_actual: item.cantidad_actual,
        cantidad_minima: item.cantidad_minima,
    })
}

#[derive(Clone)]
pub struct InventarioService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    dias_alerta: i64,
}

impl InventarioService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        dias_alerta: i64,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            dias_alerta,
        }
    }

    fn view(&self, item: inventario::Model) -> InventarioView {
        InventarioView::new(item, super::today(), self.dias_alerta)
    }

    fn views(&self, items: Vec<inventario::Model>) -> Vec<InventarioView> {
        let hoy = super::today();
        items
            .into_iter()
            .map(|i| InventarioView::new(i, hoy, self.dias_alerta))
            .collect()
    }

    fn activos() -> Select<inventario::Entity> {
        inventario::Entity::find().filter(inventario::Column::Activo.eq(true))
    }

    fn limite_alerta(&self) -> NaiveDate {
        super::today() + Duration::days(self.dias_alerta)
    }

    fn ordenar(query: Select<inventario::Entity>, ordering: Option<&str>) -> Select<inventario::Entity> {
        let ordering = ordering.map(str::trim).unwrap_or("-fecha_creacion");
        let (desc, campo) = match ordering.strip_prefix('-') {
            Some(campo) => (true, campo),
            None => (false, ordering),
        };
        let column = match campo {
            "nombre_producto" => inventario::Column::NombreProducto,
            "cantidad_actual" => inventario::Column::CantidadActual,
            "fecha_vencimiento" => inventario::Column::FechaVencimiento,
            "fecha_creacion" => inventario::Column::FechaCreacion,
            _ => return query.order_by_desc(inventario::Column::FechaCreacion),
        };
        if desc {
            query.order_by_desc(column)
        } else {
            query.order_by_asc(column)
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filtros: FiltrosInventario,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<InventarioView>, u64), ServiceError> {
        let hoy = super::today();
        let mut query = Self::activos();
        if let Some(categoria) = filtros.categoria {
            query = query.filter(inventario::Column::Categoria.eq(categoria));
        }
        if let Some(estado) = filtros.estado {
            query = query.filter(inventario::Column::Estado.eq(estado));
        }
        if let Some(proveedor) = filtros.proveedor.as_deref().filter(|p| !p.is_empty()) {
            query = query.filter(inventario::Column::Proveedor.eq(proveedor));
        }
        if let Some(search) = filtros.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(Self::busqueda(search));
        }
        if filtros.low_stock.unwrap_or(false) {
            query = query.filter(
                Expr::col(inventario::Column::CantidadActual)
                    .lte(Expr::col(inventario::Column::CantidadMinima)),
            );
        }
        if filtros.expiring_soon.unwrap_or(false) {
            query = query.filter(inventario::Column::FechaVencimiento.lte(self.limite_alerta()));
        }
        if filtros.expired.unwrap_or(false) {
            query = query.filter(inventario::Column::FechaVencimiento.lt(hoy));
        }
        let query = Self::ordenar(query, filtros.ordering.as_deref());
        let (items, total) = super::fetch_page(query, &self.db_pool, page, per_page).await?;
        Ok((self.views(items), total))
    }

    fn busqueda(search: &str) -> Condition {
        Condition::any()
            .add(inventario::Column::CodigoProducto.contains(search))
            .add(inventario::Column::NombreProducto.contains(search))
            .add(inventario::Column::Descripcion.contains(search))
            .add(inventario::Column::Proveedor.contains(search))
    }

    async fn find(&self, id: i32) -> Result<inventario::Model, ServiceError> {
        Self::activos()
            .filter(inventario::Column::Id.eq(id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Producto {} no encontrado", id)))
    }

    pub async fn get(&self, id: i32) -> Result<InventarioView, ServiceError> {
        Ok(self.view(self.find(id).await?))
    }

    async fn ensure_codigo_libre(&self, codigo: &str, excluir: Option<i32>) -> Result<(), ServiceError> {
        let mut query = inventario::Entity::find()
            .filter(inventario::Column::CodigoProducto.eq(codigo));
        if let Some(id) = excluir {
            query = query.filter(inventario::Column::Id.ne(id));
        }
        if query.count(&*self.db_pool).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Ya existe un producto con código {}",
                codigo
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, caller, input), fields(codigo = %input.codigo_producto))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: CrearInventario,
    ) -> Result<InventarioView, ServiceError> {
        input.validate()?;
        let cantidad_actual = input.cantidad_actual.unwrap_or(Decimal::ZERO);
        let cantidad_minima = input.cantidad_minima.unwrap_or(Decimal::ZERO);
        let precio_venta =
            precio_venta_final(input.precio_unitario, input.precio_venta, input.margen_porcentaje)?;
        validar_montos(&Montos {
            cantidad_actual,
            cantidad_minima,
            cantidad_maxima: input.cantidad_maxima,
            precio_unitario: input.precio_unitario,
            precio_venta,
        })?;
        validar_vencimiento(input.fecha_vencimiento, super::today())?;
        let codigo = input.codigo_producto.trim().to_string();
        self.ensure_codigo_libre(&codigo, None).await?;

        let now = Utc::now();
        let txn = self.db_pool.begin().await?;
        let created = inventario::ActiveModel {
            codigo_producto: Set(codigo),
            nombre_producto: Set(input.nombre_producto.trim().to_string()),
            descripcion: Set(input.descripcion),
            categoria: Set(input.categoria.unwrap_or(Categoria::Otros)),
            unidad_medida: Set(input.unidad_medida.unwrap_or(UnidadMedida::Unidad)),
            cantidad_actual: Set(cantidad_actual),
            cantidad_minima: Set(cantidad_minima),
            cantidad_maxima: Set(input.cantidad_maxima),
            precio_unitario: Set(input.precio_unitario),
            precio_venta: Set(precio_venta),
            codigo_qr: Set(input.codigo_qr),
            codigo_barra: Set(input.codigo_barra),
            ubicacion: Set(input.ubicacion),
            proveedor: Set(input.proveedor),
            contacto_proveedor: Set(input.contacto_proveedor),
            fecha_ultimo_ingreso: Set(None),
            fecha_vencimiento: Set(input.fecha_vencimiento),
            lote: Set(input.lote),
            estado: Set(input
                .estado
                .unwrap_or_else(|| estado_por_stock(cantidad_actual, cantidad_minima))),
            requiere_alerta: Set(input.requiere_alerta.unwrap_or(true)),
            imagen_producto: Set(input.imagen_producto),
            notas: Set(input.notas),
            creado_por: Set(Some(caller.empleado_id)),
            actualizado_por: Set(None),
            activo: Set(true),
            fecha_creacion: Set(now),
            fecha_actualizacion: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("Ya existe un producto con ese código".to_string())
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("inventario", "crear", "inventario")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;

        info!(id = created.id, codigo = %created.codigo_producto, "producto created");
        Ok(self.view(created))
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        input: ActualizarInventario,
    ) -> Result<InventarioView, ServiceError> {
        input.validate()?;
        let actual = self.find(id).await?;

        let precio_unitario = input.precio_unitario.or(actual.precio_unitario);
        let precio_venta = match (input.precio_venta, input.margen_porcentaje) {
            (None, None) => actual.precio_venta,
            (venta, margen) => precio_venta_final(precio_unitario, venta, margen)?,
        };
        validar_montos(&Montos {
            cantidad_actual: input.cantidad_actual.unwrap_or(actual.cantidad_actual),
            cantidad_minima: input.cantidad_minima.unwrap_or(actual.cantidad_minima),
            cantidad_maxima: input.cantidad_maxima.or(actual.cantidad_maxima),
            precio_unitario,
            precio_venta,
        })?;
        if input.fecha_vencimiento.is_some() && input.fecha_vencimiento != actual.fecha_vencimiento {
            validar_vencimiento(input.fecha_vencimiento, super::today())?;
        }
        if let Some(codigo) = input.codigo_producto.as_deref().map(str::trim) {
            if codigo != actual.codigo_producto {
                self.ensure_codigo_libre(codigo, Some(id)).await?;
            }
        }

        let mut active: inventario::ActiveModel = actual.clone().into();
        if let Some(v) = input.codigo_producto {
            active.codigo_producto = Set(v.trim().to_string());
        }
        if let Some(v) = input.nombre_producto {
            active.nombre_producto = Set(v.trim().to_string());
        }
        if let Some(v) = input.descripcion {
            active.descripcion = Set(Some(v));
        }
        if let Some(v) = input.categoria {
            active.categoria = Set(v);
        }
        if let Some(v) = input.unidad_medida {
            active.unidad_medida = Set(v);
        }
        if let Some(v) = input.cantidad_actual {
            active.cantidad_actual = Set(v);
        }
        if let Some(v) = input.cantidad_minima {
            active.cantidad_minima = Set(v);
        }
        if let Some(v) = input.cantidad_maxima {
            active.cantidad_maxima = Set(Some(v));
        }
        active.precio_unitario = Set(precio_unitario);
        active.precio_venta = Set(precio_venta);
        if let Some(v) = input.codigo_qr {
            active.codigo_qr = Set(Some(v));
        }
        if let Some(v) = input.codigo_barra {
            active.codigo_barra = Set(Some(v));
        }
        if let Some(v) = input.ubicacion {
            active.ubicacion = Set(Some(v));
        }
        if let Some(v) = input.proveedor {
            active.proveedor = Set(Some(v));
        }
        if let Some(v) = input.contacto_proveedor {
            active.contacto_proveedor = Set(Some(v));
        }
        if let Some(v) = input.fecha_vencimiento {
            active.fecha_vencimiento = Set(Some(v));
        }
        if let Some(v) = input.lote {
            active.lote = Set(Some(v));
        }
        if let Some(v) = input.estado {
            active.estado = Set(v);
        }
        if let Some(v) = input.requiere_alerta {
            active.requiere_alerta = Set(v);
        }
        if let Some(v) = input.imagen_producto {
            active.imagen_producto = Set(Some(v));
        }
        if let Some(v) = input.notas {
            active.notas = Set(Some(v));
        }
        active.actualizado_por = Set(Some(caller.empleado_id));
        active.fecha_actualizacion = Set(Utc::now());

        let txn = self.db_pool.begin().await?;
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("inventario", "actualizar", "inventario")
                .registro(id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;
        Ok(self.view(updated))
    }

    /// Soft delete.
    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<inventario::Model, ServiceError> {
        let actual = self.find(id).await?;
        let txn = self.db_pool.begin().await?;
        let mut active: inventario::ActiveModel = actual.into();
        active.activo = Set(false);
        active.actualizado_por = Set(Some(caller.empleado_id));
        active.fecha_actualizacion = Set(Utc::now());
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("inventario", "eliminar", "inventario")
                .registro(id)
                .descripcion(format!("Producto {} desactivado", updated.codigo_producto)),
        )
        .await?;
        txn.commit().await?;
        info!(id, codigo = %updated.codigo_producto, "producto deactivated");
        Ok(updated)
    }

    #[instrument(skip(self, caller))]
    pub async fn update_stock(
        &self,
        caller: &Caller,
        id: i32,
        movimiento: MovimientoStock,
    ) -> Result<InventarioView, ServiceError> {
        let actual = self.find(id).await?;
        let txn = self.db_pool.begin().await?;
        let updated =
            aplicar_movimiento(&txn, actual.clone(), &movimiento, Some(caller.empleado_id)).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("inventario", "stock", "inventario")
                .registro(id)
                .descripcion(format!(
                    "{} de {} ({} -> {})",
                    movimiento.tipo, movimiento.cantidad, actual.cantidad_actual, updated.cantidad_actual
                )),
        )
        .await?;
        txn.commit().await?;

        info!(id, tipo = %movimiento.tipo, cantidad = %updated.cantidad_actual, "stock updated");
        if let Some(event) = stock_bajo_event(&updated) {
            warn!(id, codigo = %updated.codigo_producto, "stock below minimum");
            publish(&self.event_sender, event).await;
        }
        Ok(self.view(updated))
    }

    pub async fn low_stock(&self) -> Result<Vec<InventarioView>, ServiceError> {
        let items = Self::activos()
            .filter(
                Expr::col(inventario::Column::CantidadActual)
                    .lte(Expr::col(inventario::Column::CantidadMinima)),
            )
            .order_by_asc(inventario::Column::NombreProducto)
            .all(&*self.db_pool)
            .await?;
        Ok(self.views(items))
    }

    /// Expiring after today and within the alert horizon.
    pub async fn expiring_soon(&self) -> Result<Vec<InventarioView>, ServiceError> {
        let items = Self::activos()
            .filter(inventario::Column::FechaVencimiento.gt(super::today()))
            .filter(inventario::Column::FechaVencimiento.lte(self.limite_alerta()))
            .order_by_asc(inventario::Column::FechaVencimiento)
            .all(&*self.db_pool)
            .await?;
        Ok(self.views(items))
    }

    pub async fn expired(&self) -> Result<Vec<InventarioView>, ServiceError> {
        let items = Self::activos()
            .filter(inventario::Column::FechaVencimiento.lt(super::today()))
            .order_by_asc(inventario::Column::FechaVencimiento)
            .all(&*self.db_pool)
            .await?;
        Ok(self.views(items))
    }

    pub async fn by_category(&self, categoria: Categoria) -> Result<Vec<InventarioView>, ServiceError> {
        let items = Self::activos()
            .filter(inventario::Column::Categoria.eq(categoria))
            .order_by_asc(inventario::Column::NombreProducto)
            .all(&*self.db_pool)
            .await?;
        Ok(self.views(items))
    }

    pub async fn search(&self, q: &str) -> Result<Vec<InventarioView>, ServiceError> {
        let items = Self::activos()
            .filter(Self::busqueda(q.trim()))
            .order_by_asc(inventario::Column::NombreProducto)
            .all(&*self.db_pool)
            .await?;
        Ok(self.views(items))
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<EstadisticasInventario, ServiceError> {
        let items = Self::activos().all(&*self.db_pool).await?;
        Ok(estadisticas(&items))
    }
}

/// Counts by stored estado, as the legacy dashboard expects.
pub fn estadisticas(items: &[inventario::Model]) -> EstadisticasInventario {
    let contar = |estado: EstadoInventario| items.iter().filter(|i| i.estado == estado).count() as u64;
    let mut categorias_distribucion: BTreeMap<String, u64> =
        Categoria::iter().map(|c| (c.to_string(), 0)).collect();
    for item in items {
        *categorias_distribucion
            .entry(item.categoria.to_string())
            .or_default() += 1;
    }

    EstadisticasInventario {
        total_productos: items.len() as u64,
        productos_disponibles: contar(EstadoInventario::Disponible),
        productos_agotados: contar(EstadoInventario::Agotado),
        productos_por_vencer: contar(EstadoInventario::PorVencer),
        productos_vencidos: contar(EstadoInventario::Vencido),
        stock_bajo: items
            .iter()
            .filter(|i| i.cantidad_actual <= i.cantidad_minima)
            .count() as u64,
        valor_total_inventario: items
            .iter()
            .map(valor_total)
            .fold(Decimal::ZERO, Decimal::saturating_add),
        categorias_distribucion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn item(cantidad: Decimal, minima: Decimal) -> inventario::Model {
        let now = Utc::now();
        inventario::Model {
            id: 1,
            codigo_producto: "CAF-001".into(),
            nombre_producto: "Café en grano".into(),
            descripcion: None,
            categoria: Categoria::Cafe,
            unidad_medida: UnidadMedida::Kilogramo,
            cantidad_actual: cantidad,
            cantidad_minima: minima,
            cantidad_maxima: None,
            precio_unitario: Some(dec!(12000)),
            precio_venta: Some(dec!(15000)),
            codigo_qr: None,
            codigo_barra: None,
            ubicacion: None,
            proveedor: None,
            contacto_proveedor: None,
            fecha_ultimo_ingreso: None,
            fecha_vencimiento: None,
            lote: None,
            estado: estado_por_stock(cantidad, minima),
            requiere_alerta: true,
            imagen_producto: None,
            notas: None,
            creado_por: None,
            actualizado_por: None,
            activo: true,
            fecha_creacion: now,
            fecha_actualizacion: now,
        }
    }

    #[test_case(dec!(0), dec!(5), EstadoInventario::Agotado ; "empty")]
    #[test_case(dec!(5), dec!(5), EstadoInventario::PorVencer ; "at minimum")]
    #[test_case(dec!(5.5), dec!(5), EstadoInventario::Disponible ; "above minimum")]
    fn state_follows_stock(cantidad: Decimal, minima: Decimal, expected: EstadoInventario) {
        assert_eq!(estado_por_stock(cantidad, minima), expected);
    }

    #[test]
    fn sale_price_from_margin() {
        assert_eq!(precio_con_margen(dec!(1000), dec!(25)), Some(dec!(1250.00)));
        assert_eq!(precio_con_margen(dec!(3.33), dec!(10)), Some(dec!(3.66)));
        assert_eq!(precio_con_margen(Decimal::MAX, dec!(50)), None);
        assert_matches!(
            precio_venta_final(Some(dec!(1000)), None, Some(Decimal::MAX)),
            Err(ServiceError::InvalidFields(f)) if f.contains_key("margen_porcentaje")
        );
        assert_eq!(
            precio_venta_final(Some(dec!(100)), None, Some(dec!(50))).unwrap(),
            Some(dec!(150))
        );
        assert_eq!(
            precio_venta_final(Some(dec!(100)), Some(dec!(120)), Some(dec!(50))).unwrap(),
            Some(dec!(120))
        );
        assert!(precio_venta_final(None, None, Some(dec!(10))).is_err());
    }

    #[test]
    fn margin_needs_positive_cost() {
        assert_eq!(margen(Some(dec!(12000)), Some(dec!(15000))), Some(dec!(25)));
        assert_eq!(margen(Some(dec!(0)), Some(dec!(10))), None);
        assert_eq!(margen(None, Some(dec!(10))), None);
    }

    #[test]
    fn derived_view_fields() {
        let hoy = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut producto = item(dec!(3), dec!(5));
        producto.fecha_vencimiento = NaiveDate::from_ymd_opt(2024, 6, 20);
        let view = InventarioView::new(producto, hoy, 30);
        assert!(view.stock_bajo);
        assert!(view.por_vencer);
        assert_eq!(view.valor_total, dec!(36000));
        assert_eq!(view.margen_porcentaje, Some(dec!(25)));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["codigo_producto"], "CAF-001");
        assert_eq!(json["stock_bajo"], true);
    }

    #[test]
    fn column_bounds() {
        assert_eq!(MONTO_MAXIMO, Decimal::new(999_999_999_999, 2));
        assert!(monto_representable(MONTO_MAXIMO));
        assert!(monto_representable(dec!(1.500)));
        assert!(!monto_representable(MONTO_MAXIMO + dec!(0.01)));
        assert!(!monto_representable(dec!(1.005)));
    }

    #[test]
    fn oversized_amounts_are_field_errors() {
        let err = validar_montos(&Montos {
            cantidad_actual: dec!(1000000000000000),
            cantidad_minima: dec!(0),
            cantidad_maxima: None,
            precio_unitario: Some(dec!(1000000000000000)),
            precio_venta: Some(dec!(0.001)),
        })
        .unwrap_err();
        match err {
            ServiceError::InvalidFields(fields) => {
                assert!(fields.contains_key("cantidad_actual"));
                assert!(fields.contains_key("precio_unitario"));
                assert!(fields.contains_key("precio_venta"));
                assert!(!fields.contains_key("cantidad_minima"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn amounts_collect_every_field_error() {
        let err = validar_montos(&Montos {
            cantidad_actual: dec!(-1),
            cantidad_minima: dec!(10),
            cantidad_maxima: Some(dec!(5)),
            precio_unitario: Some(dec!(-2)),
            precio_venta: None,
        })
        .unwrap_err();
        match err {
            ServiceError::InvalidFields(fields) => {
                assert!(fields.contains_key("cantidad_actual"));
                assert!(fields.contains_key("cantidad_maxima"));
                assert!(fields.contains_key("precio_unitario"));
                assert!(!fields.contains_key("precio_venta"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn past_expiry_is_rejected() {
        let hoy = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(validar_vencimiento(hoy.pred_opt(), hoy).is_err());
        assert!(validar_vencimiento(Some(hoy), hoy).is_ok());
    }

    #[test]
    fn stats_list_every_category() {
        let items = vec![item(dec!(0), dec!(1)), item(dec!(10), dec!(1))];
        let stats = estadisticas(&items);
        assert_eq!(stats.total_productos, 2);
        assert_eq!(stats.productos_agotados, 1);
        assert_eq!(stats.productos_disponibles, 1);
        assert_eq!(stats.stock_bajo, 1);
        assert_eq!(stats.categorias_distribucion.len(), 8);
        assert_eq!(stats.categorias_distribucion["cafe"], 2);
        assert_eq!(stats.categorias_distribucion["otros"], 0);
        assert_eq!(stats.valor_total_inventario, dec!(120000));
    }

    #[test]
    fn notes_are_stamped_and_appended() {
        let primera = nota_con_fecha(None, "ingreso proveedor");
        assert!(primera.starts_with('['));
        assert!(primera.ends_with("] ingreso proveedor"));
        let segunda = nota_con_fecha(Some(&primera), "conteo");
        assert_eq!(segunda.lines().count(), 2);
    }
}
