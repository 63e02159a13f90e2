mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN, EMPLEADO, GERENTE};
use serde_json::{json, Value};

async fn crear_tipo(app: &TestApp, nombre: &str, requiere_aprobacion: Option<bool>) -> i64 {
    let mut body = json!({ "nombre": nombre, "color_hex": "#1E88E5" });
    if let Some(flag) = requiere_aprobacion {
        body["requiere_aprobacion"] = json!(flag);
    }
    let tipo = app.post("/api/empleado/tipos-solicitudes", body, ADMIN).await;
    tipo["id"].as_i64().unwrap()
}

fn titulos(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["titulo"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn tipo_defaults_require_approval() {
    let app = TestApp::new().await;

    let tipo = app
        .post(
            "/api/empleado/tipos-solicitudes",
            json!({ "nombre": "Vacaciones" }),
            GERENTE,
        )
        .await;
    assert_eq!(tipo["requiere_aprobacion"], true);
    assert_eq!(tipo["dias_anticipacion"], 1);
    assert_eq!(tipo["activo"], true);

    app.call(
        Method::POST,
        "/api/empleado/tipos-solicitudes",
        Some(json!({ "nombre": "Permiso" })),
        EMPLEADO,
        StatusCode::FORBIDDEN,
    )
    .await;

    let tipos = app.get("/api/empleado/tipos-solicitudes", EMPLEADO).await;
    assert_eq!(tipos["pagination"]["total"], 1);
}

#[tokio::test]
async fn solicitud_approval_notifies_managers_then_owner() {
    let app = TestApp::new().await;
    let tipo_id = crear_tipo(&app, "Vacaciones", None).await;

    let solicitud = app
        .post(
            "/api/empleado/solicitudes",
            json!({
                "tipo_solicitud_id": tipo_id,
                "fecha_inicio": "2024-07-01",
                "fecha_fin": "2024-07-05",
                "motivo": "Viaje familiar",
            }),
            EMPLEADO,
        )
        .await;
    assert_eq!(solicitud["estado"], "pendiente");
    assert_eq!(solicitud["empleado_rut"], EMPLEADO);
    let id = solicitud["id"].as_i64().unwrap();

    for manager in [GERENTE, ADMIN] {
        let inbox = app
            .eventually("/api/empleado/notificaciones", manager, |body| {
                body["pagination"]["total"] == 1
            })
            .await;
        assert_eq!(inbox["items"][0]["titulo"], "Nueva solicitud pendiente");
        assert_eq!(inbox["items"][0]["referencia_id"], id);
    }
    let propia = app.get("/api/empleado/notificaciones", EMPLEADO).await;
    assert_eq!(propia["pagination"]["total"], 0);

    app.call(
        Method::POST,
        &format!("/api/empleado/solicitudes/{id}/aprobar"),
        None,
        EMPLEADO,
        StatusCode::FORBIDDEN,
    )
    .await;

    let aprobada = app
        .call(
            Method::POST,
            &format!("/api/empleado/solicitudes/{id}/aprobar"),
            Some(json!({ "comentario_aprobacion": "Que lo disfrutes" })),
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(aprobada["estado"], "aprobada");
    assert_eq!(aprobada["comentario_aprobacion"], "Que lo disfrutes");
    assert!(aprobada["aprobado_por"].is_number());

    let inbox = app
        .eventually("/api/empleado/notificaciones", EMPLEADO, |body| {
            body["pagination"]["total"] == 1
        })
        .await;
    assert_eq!(titulos(&inbox), vec!["Solicitud aprobada".to_string()]);
    assert!(inbox["items"][0]["mensaje"]
        .as_str()
        .unwrap()
        .contains("Que lo disfrutes"));

    // a resolved request cannot be decided again or edited
    app.call(
        Method::POST,
        &format!("/api/empleado/solicitudes/{id}/rechazar"),
        None,
        GERENTE,
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.call(
        Method::PATCH,
        &format!("/api/empleado/solicitudes/{id}"),
        Some(json!({ "motivo": "Otro motivo" })),
        EMPLEADO,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn concurrent_decisions_resolve_a_request_once() {
    let app = TestApp::new().await;
    let tipo_id = crear_tipo(&app, "Permiso", None).await;
    let solicitud = app
        .post(
            "/api/empleado/solicitudes",
            json!({
                "tipo_solicitud_id": tipo_id,
                "fecha_inicio": "2024-08-01",
                "fecha_fin": "2024-08-01",
                "motivo": "Trámite notarial",
            }),
            EMPLEADO,
        )
        .await;
    let id = solicitud["id"].as_i64().unwrap();

    let aprobar = format!("/api/empleado/solicitudes/{id}/aprobar");
    let rechazar = format!("/api/empleado/solicitudes/{id}/rechazar");
    let (a, b) = tokio::join!(
        app.request(Method::POST, &aprobar, None, Some(GERENTE)),
        app.request(Method::POST, &rechazar, None, Some(ADMIN)),
    );
    let ganadores = [a.status(), b.status()]
        .into_iter()
        .filter(|s| *s == StatusCode::OK)
        .count();
    assert_eq!(ganadores, 1);

    let inbox = app
        .eventually("/api/empleado/notificaciones", EMPLEADO, |body| {
            body["pagination"]["total"] == 1
        })
        .await;
    let final_estado = app
        .get(&format!("/api/empleado/solicitudes/{id}"), GERENTE)
        .await["estado"]
        .clone();
    let esperado = if final_estado == "aprobada" {
        "Solicitud aprobada"
    } else {
        "Solicitud rechazada"
    };
    assert_eq!(titulos(&inbox), vec![esperado.to_string()]);

    // a later decision is still refused
    app.call(Method::POST, &aprobar, None, GERENTE, StatusCode::BAD_REQUEST)
        .await;
}

#[tokio::test]
async fn solicitud_without_approval_is_auto_approved() {
    let app = TestApp::new().await;
    let tipo_id = crear_tipo(&app, "Trámite", Some(false)).await;

    let solicitud = app
        .post(
            "/api/empleado/solicitudes",
            json!({
                "tipo_solicitud_id": tipo_id,
                "fecha_inicio": "2024-07-01",
                "fecha_fin": "2024-07-01",
                "motivo": "Notaría",
            }),
            EMPLEADO,
        )
        .await;
    assert_eq!(solicitud["estado"], "aprobada");
    assert!(solicitud["aprobado_por"].is_null());
    assert!(solicitud["fecha_aprobacion"].is_string());
}

#[tokio::test]
async fn solicitud_input_is_validated() {
    let app = TestApp::new().await;
    let tipo_id = crear_tipo(&app, "Vacaciones", None).await;

    let body = app
        .call(
            Method::POST,
            "/api/empleado/solicitudes",
            Some(json!({
                "tipo_solicitud_id": tipo_id,
                "fecha_inicio": "2024-07-05",
                "fecha_fin": "2024-07-01",
                "motivo": "Viaje",
            })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["fecha_fin"].is_array(), "{body}");

    let body = app
        .call(
            Method::POST,
            "/api/empleado/solicitudes",
            Some(json!({
                "tipo_solicitud_id": tipo_id,
                "fecha_inicio": "2024-07-01",
                "fecha_fin": "2024-07-01",
                "motivo": "   ",
            })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["motivo"].is_array(), "{body}");

    let body = app
        .call(
            Method::POST,
            "/api/empleado/solicitudes",
            Some(json!({
                "tipo_solicitud_id": 999,
                "fecha_inicio": "2024-07-01",
                "fecha_fin": "2024-07-01",
                "motivo": "Viaje",
            })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["tipo_solicitud_id"].is_array(), "{body}");

    app.call(
        Method::POST,
        "/api/empleado/solicitudes",
        Some(json!({
            "empleado_rut": ADMIN,
            "tipo_solicitud_id": tipo_id,
            "fecha_inicio": "2024-07-01",
            "fecha_fin": "2024-07-01",
            "motivo": "En nombre de otro",
        })),
        EMPLEADO,
        StatusCode::FORBIDDEN,
    )
    .await;
}

#[tokio::test]
async fn empleados_only_see_their_own_requests() {
    let app = TestApp::new().await;
    let tipo_id = crear_tipo(&app, "Vacaciones", None).await;

    let ajena = app
        .post(
            "/api/empleado/solicitudes",
            json!({
                "tipo_solicitud_id": tipo_id,
                "fecha_inicio": "2024-08-01",
                "fecha_fin": "2024-08-02",
                "motivo": "Descanso",
            }),
            ADMIN,
        )
        .await;
    let propia = app
        .post(
            "/api/empleado/solicitudes",
            json!({
                "tipo_solicitud_id": tipo_id,
                "fecha_inicio": "2024-09-01",
                "fecha_fin": "2024-09-02",
                "motivo": "Mudanza",
            }),
            EMPLEADO,
        )
        .await;

    let listed = app.get("/api/empleado/solicitudes", EMPLEADO).await;
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["items"][0]["id"], propia["id"]);

    let listed = app.get("/api/empleado/solicitudes", GERENTE).await;
    assert_eq!(listed["pagination"]["total"], 2);

    app.call(
        Method::GET,
        &format!("/api/empleado/solicitudes/{}", ajena["id"]),
        None,
        EMPLEADO,
        StatusCode::FORBIDDEN,
    )
    .await;
}

#[tokio::test]
async fn owner_can_cancel_and_delete_pending_requests() {
    let app = TestApp::new().await;
    let tipo_id = crear_tipo(&app, "Vacaciones", None).await;

    let crear = |motivo: &'static str| {
        json!({
            "tipo_solicitud_id": tipo_id,
            "fecha_inicio": "2024-10-01",
            "fecha_fin": "2024-10-03",
            "motivo": motivo,
        })
    };

    let primera = app
        .post("/api/empleado/solicitudes", crear("Trámite"), EMPLEADO)
        .await;
    let id = primera["id"].as_i64().unwrap();
    let cancelada = app
        .call(
            Method::POST,
            &format!("/api/empleado/solicitudes/{id}/cancelar"),
            None,
            EMPLEADO,
            StatusCode::OK,
        )
        .await;
    assert_eq!(cancelada["estado"], "cancelada");
    assert!(cancelada["aprobado_por"].is_null());

    // cancelled requests can no longer be removed
    app.call(
        Method::DELETE,
        &format!("/api/empleado/solicitudes/{id}"),
        None,
        EMPLEADO,
        StatusCode::BAD_REQUEST,
    )
    .await;

    let segunda = app
        .post("/api/empleado/solicitudes", crear("Médico"), EMPLEADO)
        .await;
    let body = app
        .call(
            Method::DELETE,
            &format!("/api/empleado/solicitudes/{}", segunda["id"]),
            None,
            EMPLEADO,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], "Solicitud eliminada correctamente");

    let listed = app.get("/api/empleado/solicitudes", EMPLEADO).await;
    assert_eq!(listed["pagination"]["total"], 1);

    // the owner cancelling their own request produces no notification
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let inbox = app
        .get("/api/empleado/notificaciones?leida=false", EMPLEADO)
        .await;
    assert_eq!(inbox["pagination"]["total"], 0);
}

#[tokio::test]
async fn notifications_can_be_marked_read() {
    let app = TestApp::new().await;
    let tipo_id = crear_tipo(&app, "Vacaciones", None).await;

    for motivo in ["Uno", "Dos"] {
        app.post(
            "/api/empleado/solicitudes",
            json!({
                "tipo_solicitud_id": tipo_id,
                "fecha_inicio": "2024-11-01",
                "fecha_fin": "2024-11-01",
                "motivo": motivo,
            }),
            EMPLEADO,
        )
        .await;
    }

    let inbox = app
        .eventually("/api/empleado/notificaciones", GERENTE, |body| {
            body["pagination"]["total"] == 2
        })
        .await;
    let first = inbox["items"][0]["id"].as_i64().unwrap();

    let leida = app
        .call(
            Method::POST,
            &format!("/api/empleado/notificaciones/{first}/leer"),
            None,
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(leida["leida"], true);

    // someone else's notification is not found
    app.call(
        Method::POST,
        &format!("/api/empleado/notificaciones/{first}/leer"),
        None,
        ADMIN,
        StatusCode::NOT_FOUND,
    )
    .await;

    let body = app
        .call(
            Method::POST,
            "/api/empleado/notificaciones/leer-todas",
            None,
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["actualizadas"], 1);

    let unread = app
        .get("/api/empleado/notificaciones?leida=false", GERENTE)
        .await;
    assert_eq!(unread["pagination"]["total"], 0);
}
