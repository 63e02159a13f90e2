//! sea-orm entities, one module per table.

pub mod asistencia;
pub mod configuracion_app;
pub mod empleado;
pub mod empleado_turno;
pub mod horario;
pub mod inventario;
pub mod item_orden_compra;
pub mod log_actividad;
pub mod notificacion;
pub mod orden_compra;
pub mod proveedor;
pub mod reporte;
pub mod solicitud;
pub mod tarea;
pub mod tarea_comentario;
pub mod tarea_historial;
pub mod tipo_solicitud;
pub mod turno;
