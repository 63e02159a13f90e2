//! Business logic. Handlers stay thin and every rule lives here.

use chrono::{NaiveDate, Utc};
use sea_orm::{EntityTrait, PaginatorTrait, Select};

use crate::{db::DbPool, errors::ServiceError};

// People
pub mod asistencia;
pub mod empleados;
pub mod solicitudes;
pub mod turnos;

// Work tracking
pub mod notificaciones;
pub mod tareas;

// Stock and purchasing
pub mod inventario;
pub mod ordenes_compra;
pub mod proveedores;

// System tables
pub mod auditoria;
pub mod sistema;

/// Runs `query` through the paginator and returns one page plus the total row count.
pub(crate) async fn fetch_page<E>(
    query: Select<E>,
    db: &DbPool,
    page: u64,
    per_page: u64,
) -> Result<(Vec<E::Model>, u64), ServiceError>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = query.paginate(db, per_page.max(1));
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok((items, total))
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Blank or whitespace-only text.
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
