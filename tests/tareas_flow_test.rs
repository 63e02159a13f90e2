mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN, EMPLEADO, GERENTE};
use serde_json::{json, Value};

fn acciones(historial: &Value) -> Vec<String> {
    historial
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["accion"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn assigned_task_notifies_and_progresses_to_completion() {
    let app = TestApp::new().await;

    let tarea = app
        .post(
            "/api/empleado/tareas",
            json!({
                "titulo": "Reponer góndola de lácteos",
                "prioridad": "alta",
                "asignada_a_rut": "7.654.321-6",
            }),
            ADMIN,
        )
        .await;
    assert_eq!(tarea["estado"], "pendiente");
    assert_eq!(tarea["asignada_a_rut"], EMPLEADO);
    assert_eq!(tarea["creada_por_rut"], ADMIN);
    assert_eq!(tarea["porcentaje_completado"], 0);
    let id = tarea["id"].as_i64().unwrap();

    let inbox = app
        .eventually("/api/empleado/notificaciones", EMPLEADO, |body| {
            body["pagination"]["total"] == 1
        })
        .await;
    assert_eq!(inbox["items"][0]["titulo"], "Nueva tarea asignada");
    assert_eq!(inbox["items"][0]["mensaje"], "Reponer góndola de lácteos");
    assert_eq!(inbox["items"][0]["referencia_id"], id);

    let en_proceso = app
        .call(
            Method::POST,
            &format!("/api/empleado/tareas/{id}/actualizar_progreso"),
            Some(json!({ "porcentaje_completado": 40 })),
            EMPLEADO,
            StatusCode::OK,
        )
        .await;
    assert_eq!(en_proceso["estado"], "en_proceso");
    assert_eq!(en_proceso["porcentaje_completado"], 40);

    let body = app
        .call(
            Method::POST,
            &format!("/api/empleado/tareas/{id}/actualizar_progreso"),
            Some(json!({ "porcentaje_completado": 140 })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["porcentaje_completado"].is_array(), "{body}");

    let comentario = app
        .post(
            &format!("/api/empleado/tareas/{id}/comentarios"),
            json!({ "comentario": "Faltan yogures de frutilla" }),
            EMPLEADO,
        )
        .await;
    assert_eq!(comentario["empleado_rut"], EMPLEADO);

    let completada = app
        .call(
            Method::POST,
            &format!("/api/empleado/tareas/{id}/actualizar_progreso"),
            Some(json!({ "porcentaje_completado": 100 })),
            EMPLEADO,
            StatusCode::OK,
        )
        .await;
    assert_eq!(completada["estado"], "completada");
    assert_eq!(completada["porcentaje_completado"], 100);
    assert!(completada["fecha_completada"].is_string());

    let comentarios = app
        .get(&format!("/api/empleado/tareas/{id}/comentarios"), GERENTE)
        .await;
    assert_eq!(comentarios.as_array().unwrap().len(), 1);

    let historial = app
        .get(&format!("/api/empleado/tareas/{id}/historial"), GERENTE)
        .await;
    assert_eq!(
        acciones(&historial),
        vec!["crear", "progreso", "comentar", "completar"]
    );
}

#[tokio::test]
async fn task_input_is_validated() {
    let app = TestApp::new().await;

    let body = app
        .call(
            Method::POST,
            "/api/empleado/tareas",
            Some(json!({ "titulo": "   " })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["titulo"].is_array(), "{body}");

    let body = app
        .call(
            Method::POST,
            "/api/empleado/tareas",
            Some(json!({
                "titulo": "Cierre de caja",
                "fecha_inicio": "2024-05-10T18:00:00Z",
                "fecha_vencimiento": "2024-05-10T09:00:00Z",
            })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["fecha_vencimiento"].is_array(), "{body}");

    let body = app
        .call(
            Method::POST,
            "/api/empleado/tareas",
            Some(json!({ "titulo": "Limpieza", "es_recurrente": true })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["frecuencia_recurrencia"].is_array(), "{body}");

    let body = app
        .call(
            Method::POST,
            "/api/empleado/tareas",
            Some(json!({ "titulo": "Limpieza", "asignada_a_rut": "22222222-2" })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["asignada_a_rut"].is_array(), "{body}");
}

#[tokio::test]
async fn task_created_as_completed_is_fully_done() {
    let app = TestApp::new().await;

    let tarea = app
        .post(
            "/api/empleado/tareas",
            json!({ "titulo": "Cierre de caja", "estado": "completada" }),
            EMPLEADO,
        )
        .await;
    assert_eq!(tarea["estado"], "completada");
    assert_eq!(tarea["porcentaje_completado"], 100);
    assert!(tarea["fecha_completada"].is_string());

    let tarea = app
        .post(
            "/api/empleado/tareas",
            json!({ "titulo": "Arqueo", "porcentaje_completado": 100 }),
            EMPLEADO,
        )
        .await;
    assert_eq!(tarea["estado"], "completada");
    assert!(tarea["fecha_completada"].is_string());

    let tarea = app
        .post(
            "/api/empleado/tareas",
            json!({ "titulo": "Pedido semanal", "estado": "en_proceso", "porcentaje_completado": 20 }),
            EMPLEADO,
        )
        .await;
    assert_eq!(tarea["porcentaje_completado"], 20);
    assert!(tarea["fecha_completada"].is_null());
}

#[tokio::test]
async fn cancelled_task_cannot_be_completed() {
    let app = TestApp::new().await;

    let tarea = app
        .post("/api/empleado/tareas", json!({ "titulo": "Pedido especial" }), EMPLEADO)
        .await;
    let id = tarea["id"].as_i64().unwrap();

    let cancelada = app
        .call(
            Method::PATCH,
            &format!("/api/empleado/tareas/{id}"),
            Some(json!({ "estado": "cancelada" })),
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(cancelada["estado"], "cancelada");

    app.call(
        Method::POST,
        &format!("/api/empleado/tareas/{id}/completar"),
        None,
        EMPLEADO,
        StatusCode::BAD_REQUEST,
    )
    .await;

    let body = app
        .call(
            Method::POST,
            &format!("/api/empleado/tareas/{id}/comentarios"),
            Some(json!({ "comentario": " " })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["comentario"].is_array(), "{body}");
}

#[tokio::test]
async fn tasks_are_filtered_and_soft_deleted() {
    let app = TestApp::new().await;

    let mia = app
        .post(
            "/api/empleado/tareas",
            json!({ "titulo": "Etiquetar precios", "asignada_a_rut": EMPLEADO }),
            GERENTE,
        )
        .await;
    app.post(
        "/api/empleado/tareas",
        json!({ "titulo": "Revisar facturas", "asignada_a_rut": ADMIN, "prioridad": "critica" }),
        GERENTE,
    )
    .await;

    let listed = app
        .get(&format!("/api/empleado/tareas?asignada_a_rut={}", EMPLEADO), EMPLEADO)
        .await;
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["items"][0]["id"], mia["id"]);

    let listed = app.get("/api/empleado/tareas?prioridad=critica", EMPLEADO).await;
    assert_eq!(listed["pagination"]["total"], 1);

    let body = app
        .call(
            Method::DELETE,
            &format!("/api/empleado/tareas/{}", mia["id"]),
            None,
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], "Tarea eliminada correctamente");

    app.call(
        Method::GET,
        &format!("/api/empleado/tareas/{}", mia["id"]),
        None,
        EMPLEADO,
        StatusCode::NOT_FOUND,
    )
    .await;
    let listed = app.get("/api/empleado/tareas", EMPLEADO).await;
    assert_eq!(listed["pagination"]["total"], 1);
}
