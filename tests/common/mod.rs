#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use negocio_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    services::empleados::{CrearEmpleado, EmpleadoService},
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const GERENTE: &str = "12345678-5";
pub const ADMIN: &str = "11111111-1";
pub const EMPLEADO: &str = "7654321-6";
pub const PASSWORD: &str = "clave-segura-123";

/// Router plus state over a throwaway SQLite file, with one employee per role.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("negocio.db").display());

        let mut cfg = AppConfig::new(url, "127.0.0.1".into(), 18_080, "test".into());
        cfg.db_max_connections = 4;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        EmpleadoService::new(db_arc.clone())
            .bootstrap_gerente(CrearEmpleado::gerente(
                GERENTE.into(),
                "Ana".into(),
                "Rojas".into(),
                "Gerente General".into(),
                PASSWORD.into(),
            ))
            .await
            .expect("seed gerente");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx, db_arc.clone()));
        let state = AppState::new(
            db_arc,
            cfg,
            Some(Arc::new(EventSender::new(event_tx))),
        );

        let app = Self {
            router: negocio_api::app_router(state.clone()),
            state,
            _dir: dir,
            _event_task: event_task,
        };

        app.seed_empleado(ADMIN, "Bruno", "Soto", "administrador").await;
        app.seed_empleado(EMPLEADO, "Carla", "Muñoz", "empleado").await;
        app
    }

    async fn seed_empleado(&self, rut: &str, nombre: &str, apellido: &str, rol: &str) {
        let response = self
            .request(
                Method::POST,
                "/api/empleado/empleados",
                Some(json!({
                    "rut": rut,
                    "nombre": nombre,
                    "apellido": apellido,
                    "cargo": "Vendedor",
                    "rol": rol,
                    "password": PASSWORD,
                })),
                Some(GERENTE),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "seeding {rut}");
    }

    /// Sends a request as the employee with RUT `as_rut`, if any.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        as_rut: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(rut) = as_rut {
            builder = builder.header("x-empleado-rut", rut);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Like `request`, asserting the status and returning the JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        as_rut: &str,
        expected: StatusCode,
    ) -> Value {
        let response = self.request(method.clone(), uri, body, Some(as_rut)).await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, expected, "{method} {uri} -> {json}");
        json
    }

    pub async fn get(&self, uri: &str, as_rut: &str) -> Value {
        self.call(Method::GET, uri, None, as_rut, StatusCode::OK).await
    }

    pub async fn post(&self, uri: &str, body: Value, as_rut: &str) -> Value {
        self.call(Method::POST, uri, Some(body), as_rut, StatusCode::CREATED)
            .await
    }

    /// Polls `uri` until `check` accepts the body. Notifications are written by
    /// the background event processor, so they show up shortly after the request.
    pub async fn eventually<F>(&self, uri: &str, as_rut: &str, check: F) -> Value
    where
        F: Fn(&Value) -> bool,
    {
        let mut last = Value::Null;
        for _ in 0..50 {
            last = self.get(uri, as_rut).await;
            if check(&last) {
                return last;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not met for {uri}: {last}");
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
}
