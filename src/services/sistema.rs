//! Settings, on-demand reports and the dashboard summary.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    auth::Caller,
    db::DbPool,
    entities::{
        asistencia::{self, EstadoAsistencia},
        configuracion_app::{self, TipoValor},
        empleado, inventario,
        orden_compra::{self, EstadoOrden},
        reporte::{self, FormatoReporte, TipoReporte},
        solicitud::{self, EstadoSolicitud},
        tarea::{self, EstadoTarea},
    },
    errors::{is_unique_violation, ServiceError},
    services::{
        asistencia::{AsistenciaService, EstadisticasAsistencia},
        auditoria::{registrar, Actividad},
        empleados::activos_query,
    },
    tracing::timed,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CrearConfiguracion {
    #[validate(length(min = 1, max = 100, message = "La clave es obligatoria"))]
    pub clave: String,
    pub valor: String,
    pub tipo: Option<TipoValor>,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActualizarConfiguracion {
    pub valor: Option<String>,
    pub tipo: Option<TipoValor>,
    pub descripcion: Option<String>,
    pub categoria: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltrosConfiguracion {
    pub categoria: Option<String>,
}

fn check_valor(tipo: TipoValor, valor: &str) -> Result<(), ServiceError> {
    if tipo.acepta(valor) {
        Ok(())
    } else {
        Err(ServiceError::field(
            "valor",
            format!("El valor no es un {} válido", tipo),
        ))
    }
}

#[derive(Clone)]
pub struct ConfiguracionService {
    db_pool: Arc<DbPool>,
}

impl ConfiguracionService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(
        &self,
        filtros: FiltrosConfiguracion,
    ) -> Result<Vec<configuracion_app::Model>, ServiceError> {
        let mut query = configuracion_app::Entity::find();
        if let Some(categoria) = filtros.categoria.as_deref().filter(|c| !c.is_empty()) {
            query = query.filter(configuracion_app::Column::Categoria.eq(categoria));
        }
        Ok(query
            .order_by_asc(configuracion_app::Column::Clave)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn get(&self, clave: &str) -> Result<configuracion_app::Model, ServiceError> {
        configuracion_app::Entity::find()
            .filter(configuracion_app::Column::Clave.eq(clave))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Configuración {} no encontrada", clave)))
    }

    #[instrument(skip(self, caller, input), fields(clave = %input.clave))]
    pub async fn create(
        &self,
        caller: &Caller,
        input: CrearConfiguracion,
    ) -> Result<configuracion_app::Model, ServiceError> {
        input.validate()?;
        let tipo = input.tipo.unwrap_or(TipoValor::String);
        check_valor(tipo, &input.valor)?;

        let txn = self.db_pool.begin().await?;
        let created = configuracion_app::ActiveModel {
            clave: Set(input.clave.trim().to_string()),
            valor: Set(input.valor),
            tipo: Set(tipo),
            descripcion: Set(input.descripcion),
            categoria: Set(input.categoria),
            fecha_actualizacion: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::Conflict("Ya existe una configuración con esa clave".to_string())
            } else {
                ServiceError::DatabaseError(e)
            }
        })?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("sistema", "crear", "configuracion_app")
                .registro(created.id)
                .despues(&created),
        )
        .await?;
        txn.commit().await?;
        Ok(created)
    }

    #[instrument(skip(self, caller, input))]
    pub async fn update(
        &self,
        caller: &Caller,
        clave: &str,
        input: ActualizarConfiguracion,
    ) -> Result<configuracion_app::Model, ServiceError> {
        let actual = self.get(clave).await?;
        let tipo = input.tipo.unwrap_or(actual.tipo);
        let valor = input.valor.clone().unwrap_or_else(|| actual.valor.clone());
        check_valor(tipo, &valor)?;

        let mut active: configuracion_app::ActiveModel = actual.clone().into();
        active.valor = Set(valor);
        active.tipo = Set(tipo);
        if let Some(v) = input.descripcion {
            active.descripcion = Set(Some(v));
        }
        if let Some(v) = input.categoria {
            active.categoria = Set(Some(v));
        }
        active.fecha_actualizacion = Set(Utc::now());

        let txn = self.db_pool.begin().await?;
        let updated = active.update(&txn).await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("sistema", "actualizar", "configuracion_app")
                .registro(updated.id)
                .antes(&actual)
                .despues(&updated),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete(&self, caller: &Caller, clave: &str) -> Result<(), ServiceError> {
        let actual = self.get(clave).await?;
        let txn = self.db_pool.begin().await?;
        configuracion_app::Entity::delete_by_id(actual.id)
            .exec(&txn)
            .await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("sistema", "eliminar", "configuracion_app")
                .registro(actual.id)
                .antes(&actual),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolicitudReporte {
    pub tipo_reporte: TipoReporte,
    pub nombre_reporte: Option<String>,
    pub periodo_inicio: Option<NaiveDate>,
    pub periodo_fin: Option<NaiveDate>,
    pub formato: Option<FormatoReporte>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReporteGenerado {
    #[serde(flatten)]
    pub reporte: reporte::Model,
    pub datos: Value,
}

/// Optional inclusive date range.
#[derive(Debug, Clone, Copy, Default)]
pub struct Periodo {
    pub inicio: Option<NaiveDate>,
    pub fin: Option<NaiveDate>,
}

impl Periodo {
    pub fn new(inicio: Option<NaiveDate>, fin: Option<NaiveDate>) -> Result<Self, ServiceError> {
        if let (Some(i), Some(f)) = (inicio, fin) {
            if f < i {
                return Err(ServiceError::field(
                    "periodo_fin",
                    "La fecha de fin debe ser posterior a la de inicio",
                ));
            }
        }
        Ok(Self { inicio, fin })
    }

    pub fn contiene(&self, fecha: NaiveDate) -> bool {
        self.inicio.map_or(true, |i| fecha >= i) && self.fin.map_or(true, |f| fecha <= f)
    }
}

fn contar_por<T, K: ToString>(items: &[T], clave: impl Fn(&T) -> K) -> BTreeMap<String, u64> {
    let mut mapa = BTreeMap::new();
    for item in items {
        *mapa.entry(clave(item).to_string()).or_insert(0) += 1;
    }
    mapa
}

pub fn resumen_personal(empleados: &[empleado::Model]) -> Value {
    let activos = empleados.iter().filter(|e| e.activo).count();
    json!({
        "total": empleados.len(),
        "activos": activos,
        "inactivos": empleados.len() - activos,
        "por_cargo": contar_por(empleados, |e| e.cargo.clone()),
        "por_estado": contar_por(empleados, |e| e.estado),
        "por_tipo_contrato": contar_por(empleados, |e| e.tipo_contrato),
    })
}

pub fn resumen_inventario(items: &[inventario::Model]) -> Value {
    let activos = items.iter().filter(|i| i.activo).count();
    let stock_total = items
        .iter()
        .fold(Decimal::ZERO, |acc, i| acc.saturating_add(i.cantidad_actual));
    let valor_total = items
        .iter()
        .filter_map(|i| i.precio_unitario?.checked_mul(i.cantidad_actual))
        .fold(Decimal::ZERO, Decimal::saturating_add);
    json!({
        "total": items.len(),
        "activos": activos,
        "inactivos": items.len() - activos,
        "por_categoria": contar_por(items, |i| i.categoria),
        "por_estado": contar_por(items, |i| i.estado),
        "stock_bajo": items.iter().filter(|i| i.cantidad_actual <= i.cantidad_minima).count(),
        "stock_total": stock_total.round_dp(2),
        "valor_total": valor_total.round_dp(2),
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilaAsistencia {
    pub rut: String,
    pub nombre: String,
    pub dias_trabajados: u64,
    pub horas_trabajadas: Decimal,
    pub ausencias: u64,
    pub tardanzas: u64,
}

pub fn resumen_asistencia(
    empleados: &[empleado::Model],
    registros: &[asistencia::Model],
) -> Vec<FilaAsistencia> {
    empleados
        .iter()
        .map(|e| {
            let propios: Vec<_> = registros.iter().filter(|r| r.empleado_rut == e.rut).collect();
            let con_estado =
                |estado: EstadoAsistencia| propios.iter().filter(|r| r.estado == estado).count() as u64;
            FilaAsistencia {
                rut: e.rut.clone(),
                nombre: e.nombre_completo(),
                dias_trabajados: con_estado(EstadoAsistencia::Presente)
                    + con_estado(EstadoAsistencia::Tarde),
                horas_trabajadas: propios.iter().filter_map(|r| r.horas_trabajadas).sum(),
                ausencias: con_estado(EstadoAsistencia::Ausente),
                tardanzas: con_estado(EstadoAsistencia::Tarde),
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct ReporteService {
    db_pool: Arc<DbPool>,
}

impl ReporteService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(&self, page: u64, per_page: u64) -> Result<(Vec<reporte::Model>, u64), ServiceError> {
        let query = reporte::Entity::find()
            .order_by_desc(reporte::Column::FechaGeneracion)
            .order_by_desc(reporte::Column::Id);
        super::fetch_page(query, &self.db_pool, page, per_page).await
    }

    pub async fn get(&self, id: i32) -> Result<reporte::Model, ServiceError> {
        reporte::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Reporte {} no encontrado", id)))
    }

    async fn datos(&self, tipo: TipoReporte, periodo: Periodo) -> Result<Value, ServiceError> {
        let db = &*self.db_pool;
        match tipo {
            TipoReporte::Personal => {
                let empleados: Vec<_> = empleado::Entity::find()
                    .all(db)
                    .await?
                    .into_iter()
                    .filter(|e| periodo.contiene(e.fecha_contratacion))
                    .collect();
                Ok(resumen_personal(&empleados))
            }
            TipoReporte::Inventario => {
                let items: Vec<_> = inventario::Entity::find()
                    .all(db)
                    .await?
                    .into_iter()
                    .filter(|i| periodo.contiene(i.fecha_creacion.date_naive()))
                    .collect();
                Ok(resumen_inventario(&items))
            }
            TipoReporte::Asistencia => {
                let empleados = activos_query()
                    .order_by_asc(empleado::Column::Apellido)
                    .all(db)
                    .await?;
                let mut query = asistencia::Entity::find();
                if let Some(inicio) = periodo.inicio {
                    query = query.filter(asistencia::Column::Fecha.gte(inicio));
                }
                if let Some(fin) = periodo.fin {
                    query = query.filter(asistencia::Column::Fecha.lte(fin));
                }
                let registros = query.all(db).await?;
                Ok(json!({ "empleados": resumen_asistencia(&empleados, &registros) }))
            }
            TipoReporte::Financiero | TipoReporte::Personalizado => Err(ServiceError::BadRequest(
                format!("Tipo de reporte {} no soportado", tipo),
            )),
        }
    }

    #[instrument(skip(self, caller, solicitud), fields(tipo = %solicitud.tipo_reporte))]
    pub async fn generar(
        &self,
        caller: &Caller,
        solicitud: SolicitudReporte,
    ) -> Result<ReporteGenerado, ServiceError> {
        let formato = solicitud.formato.unwrap_or(FormatoReporte::Json);
        if formato != FormatoReporte::Json {
            return Err(ServiceError::field("formato", "Solo se admite el formato json"));
        }
        let periodo = Periodo::new(solicitud.periodo_inicio, solicitud.periodo_fin)?;
        let tipo = solicitud.tipo_reporte;

        let (datos, elapsed) = timed("reporte.generar", || self.datos(tipo, periodo)).await;
        let datos = datos?;

        let nombre = solicitud
            .nombre_reporte
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Reporte de {} {}", tipo, Utc::now().format("%Y-%m-%d %H:%M")));
        let parametros = json!({
            "tipo_reporte": tipo,
            "periodo_inicio": periodo.inicio,
            "periodo_fin": periodo.fin,
            "formato": formato,
        });

        let txn = self.db_pool.begin().await?;
        let reporte = reporte::ActiveModel {
            nombre_reporte: Set(nombre),
            tipo_reporte: Set(tipo),
            periodo_inicio: Set(periodo.inicio),
            periodo_fin: Set(periodo.fin),
            parametros: Set(Some(parametros)),
            archivo_generado: Set(None),
            formato: Set(formato),
            generado_por: Set(Some(caller.empleado_id)),
            fecha_generacion: Set(Utc::now()),
            tiempo_generacion: Set(Some(i32::try_from(elapsed).unwrap_or(i32::MAX))),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        registrar(
            &txn,
            Some(caller),
            Actividad::new("sistema", "generar_reporte", "reportes")
                .registro(reporte.id)
                .descripcion(reporte.nombre_reporte.clone()),
        )
        .await?;
        txn.commit().await?;

        info!(id = reporte.id, tipo = %tipo, duration_ms = %elapsed, "reporte generated");
        Ok(ReporteGenerado { reporte, datos })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub empleados_activos: u64,
    pub asistencia_hoy: EstadisticasAsistencia,
    pub solicitudes_pendientes: u64,
    pub tareas_abiertas: u64,
    pub productos_stock_bajo: u64,
    pub ordenes_pendientes: u64,
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn resumen(&self) -> Result<Dashboard, ServiceError> {
        let db = &*self.db_pool;
        let asistencia_hoy = AsistenciaService::new(self.db_pool.clone())
            .estadisticas(super::today())
            .await?;

        Ok(Dashboard {
            empleados_activos: activos_query().count(db).await?,
            asistencia_hoy,
            solicitudes_pendientes: solicitud::Entity::find()
                .filter(solicitud::Column::Estado.eq(EstadoSolicitud::Pendiente))
                .count(db)
                .await?,
            tareas_abiertas: tarea::Entity::find()
                .filter(tarea::Column::Activo.eq(true))
                .filter(tarea::Column::Estado.is_in([
                    EstadoTarea::Pendiente,
                    EstadoTarea::EnProceso,
                    EstadoTarea::Pausada,
                ]))
                .count(db)
                .await?,
            productos_stock_bajo: inventario::Entity::find()
                .filter(inventario::Column::Activo.eq(true))
                .filter(
                    Expr::col(inventario::Column::CantidadActual)
                        .lte(Expr::col(inventario::Column::CantidadMinima)),
                )
                .count(db)
                .await?,
            ordenes_pendientes: orden_compra::Entity::find()
                .filter(orden_compra::Column::Estado.eq(EstadoOrden::Pendiente))
                .count(db)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        empleado::{EstadoEmpleado, Rol, TipoContrato},
        asistencia::TipoMarcaje,
    };
    use rust_decimal_macros::dec;

    fn fecha(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn empleado(rut: &str, cargo: &str, activo: bool) -> empleado::Model {
        let now = Utc::now();
        empleado::Model {
            id: 1,
            rut: rut.into(),
            nombre: "Ana".into(),
            apellido: "Rojas".into(),
            correo: None,
            celular: None,
            fecha_nacimiento: None,
            direccion: None,
            cargo: cargo.into(),
            departamento: None,
            fecha_contratacion: fecha(2023, 1, 1),
            fecha_termino: None,
            salario: None,
            tipo_contrato: TipoContrato::Indefinido,
            estado: if activo { EstadoEmpleado::Activo } else { EstadoEmpleado::Inactivo },
            rol: Rol::Empleado,
            password: None,
            foto_perfil: None,
            observaciones: None,
            activo,
            fecha_creacion: now,
            fecha_actualizacion: now,
        }
    }

    fn marca(rut: &str, estado: EstadoAsistencia, horas: Option<Decimal>) -> asistencia::Model {
        let now = Utc::now();
        asistencia::Model {
            id: 1,
            empleado_rut: rut.into(),
            fecha: fecha(2024, 5, 2),
            hora_entrada: None,
            hora_salida: None,
            tipo_entrada: TipoMarcaje::Manual,
            tipo_salida: TipoMarcaje::Manual,
            minutos_tarde: 0,
            minutos_extras: 0,
            horas_trabajadas: horas,
            estado,
            observaciones: None,
            ubicacion_entrada: None,
            ubicacion_salida: None,
            ip_entrada: None,
            ip_salida: None,
            validado_por: None,
            fecha_validacion: None,
            fecha_creacion: now,
            fecha_actualizacion: now,
        }
    }

    #[test]
    fn inverted_period_is_rejected() {
        assert!(Periodo::new(Some(fecha(2024, 2, 1)), Some(fecha(2024, 1, 1))).is_err());
        let periodo = Periodo::new(Some(fecha(2024, 1, 1)), None).unwrap();
        assert!(periodo.contiene(fecha(2030, 1, 1)));
        assert!(!periodo.contiene(fecha(2023, 12, 31)));
    }

    #[test]
    fn staff_summary_groups_by_role_and_state() {
        let empleados = vec![
            empleado("1-9", "Barista", true),
            empleado("2-7", "Barista", true),
            empleado("3-5", "Cajero", false),
        ];
        let resumen = resumen_personal(&empleados);
        assert_eq!(resumen["total"], 3);
        assert_eq!(resumen["activos"], 2);
        assert_eq!(resumen["inactivos"], 1);
        assert_eq!(resumen["por_cargo"]["Barista"], 2);
        assert_eq!(resumen["por_estado"]["inactivo"], 1);
        assert_eq!(resumen["por_tipo_contrato"]["indefinido"], 3);
    }

    #[test]
    fn attendance_summary_per_employee() {
        let empleados = vec![empleado("1-9", "Barista", true), empleado("2-7", "Cajero", true)];
        let registros = vec![
            marca("1-9", EstadoAsistencia::Presente, Some(dec!(8))),
            marca("1-9", EstadoAsistencia::Tarde, Some(dec!(7.5))),
            marca("1-9", EstadoAsistencia::Ausente, None),
        ];
        let filas = resumen_asistencia(&empleados, &registros);
        assert_eq!(filas.len(), 2);
        assert_eq!(filas[0].dias_trabajados, 2);
        assert_eq!(filas[0].horas_trabajadas, dec!(15.5));
        assert_eq!(filas[0].ausencias, 1);
        assert_eq!(filas[0].tardanzas, 1);
        assert_eq!(filas[1].dias_trabajados, 0);
        assert_eq!(filas[1].horas_trabajadas, Decimal::ZERO);
    }

    #[test]
    fn setting_value_must_match_type() {
        assert!(check_valor(TipoValor::Number, "15").is_ok());
        assert!(check_valor(TipoValor::Boolean, "quizas").is_err());
    }
}
