//! Caller resolution, role checks and the login endpoint.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{response_json, TestApp, ADMIN, EMPLEADO, GERENTE, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn health_and_status_are_open() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");

    let response = app.request(Method::GET, "/api/status", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["service"], "negocio-api");
}

#[tokio::test]
async fn missing_caller_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/empleado/empleados", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_MISSING");
}

#[tokio::test]
async fn unknown_rut_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/inventario", None, Some("22222222-2"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_UNKNOWN_EMPLEADO");
}

#[tokio::test]
async fn caller_rut_is_accepted_in_any_spelling() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/dashboard", None, Some("12.345.678-5"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn declared_role_must_match_the_record() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .uri("/api/inventario")
        .header("x-empleado-rut", EMPLEADO)
        .header("x-empleado-rol", "gerente")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_ROLE_MISMATCH");

    let request = Request::builder()
        .uri("/api/inventario")
        .header("x-empleado-rut", EMPLEADO)
        .header("x-empleado-rol", "Empleado")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn caller_can_be_passed_as_query_parameter() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/inventario?empleado_rut={}", EMPLEADO),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn permissions_follow_the_role() {
    let app = TestApp::new().await;

    // empleado: no access to the staff registry or the system tables
    for uri in [
        "/api/empleado/empleados",
        "/api/sistema/configuracion",
        "/api/sistema/logs",
        "/api/dashboard",
    ] {
        let response = app.request(Method::GET, uri, None, Some(EMPLEADO)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    // administrador: operations and audit log, but no reports or dashboard
    for uri in ["/api/empleado/empleados", "/api/sistema/logs", "/api/proveedores"] {
        let response = app.request(Method::GET, uri, None, Some(ADMIN)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
    for uri in ["/api/dashboard", "/api/sistema/reportes"] {
        let response = app.request(Method::GET, uri, None, Some(ADMIN)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    // gerente: everything
    for uri in ["/api/dashboard", "/api/sistema/reportes", "/api/empleado/empleados"] {
        let response = app.request(Method::GET, uri, None, Some(GERENTE)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn empleado_cannot_approve_purchase_orders_or_write_suppliers() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/proveedores",
            Some(json!({ "nombre": "Café del Sur" })),
            Some(EMPLEADO),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(Method::POST, "/api/ordenes-compra/1/aprobar", None, Some(EMPLEADO))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_checks_the_password() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "rut": "7.654.321-6", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["empleado"]["rut"], EMPLEADO);
    assert_eq!(body["rol"], "empleado");
    assert!(body["empleado"].get("password").is_none());

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "rut": EMPLEADO, "password": "otra-clave" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_INVALID_CREDENTIALS");
}

#[tokio::test]
async fn login_of_inactive_employee_is_rejected() {
    let app = TestApp::new().await;

    app.call(
        Method::DELETE,
        &format!("/api/empleado/empleados/{}", EMPLEADO),
        None,
        GERENTE,
        StatusCode::OK,
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "rut": EMPLEADO, "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/inventario", None, Some(EMPLEADO))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
