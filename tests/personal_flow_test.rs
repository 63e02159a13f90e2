mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{TestApp, ADMIN, EMPLEADO, GERENTE};
use serde_json::{json, Value};

fn decimal(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        other => other.as_f64().expect("decimal number"),
    }
}

#[tokio::test]
async fn empleado_rut_is_normalized_and_unique() {
    let app = TestApp::new().await;

    let created = app
        .post(
            "/api/empleado/empleados",
            json!({
                "rut": "22.222.222-2",
                "nombre": "Diego",
                "apellido": "Pérez",
                "cargo": "Bodeguero",
                "departamento": "Bodega",
            }),
            GERENTE,
        )
        .await;
    assert_eq!(created["rut"], "22222222-2");
    assert_eq!(created["rol"], "empleado");
    assert_eq!(created["estado"], "activo");
    assert!(created.get("password").is_none());

    let fetched = app.get("/api/empleado/empleados/22.222.222-2", ADMIN).await;
    assert_eq!(fetched["id"], created["id"]);
    let padded = app.get("/api/empleado/empleados/022.222.222-2", ADMIN).await;
    assert_eq!(padded["id"], created["id"]);

    let body = app
        .call(
            Method::POST,
            "/api/empleado/empleados",
            Some(json!({
                "rut": "22222222-2",
                "nombre": "Otro",
                "apellido": "Nombre",
                "cargo": "Cajero",
            })),
            GERENTE,
            StatusCode::CONFLICT,
        )
        .await;
    assert!(body["message"].as_str().unwrap().contains("22222222-2"));
}

#[tokio::test]
async fn invalid_rut_is_a_field_error() {
    let app = TestApp::new().await;

    let body = app
        .call(
            Method::POST,
            "/api/empleado/empleados",
            Some(json!({
                "rut": "12345678-9",
                "nombre": "Diego",
                "apellido": "Pérez",
                "cargo": "Bodeguero",
            })),
            GERENTE,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["rut"].is_array(), "{body}");
}

#[tokio::test]
async fn empleado_update_and_soft_delete() {
    let app = TestApp::new().await;
    let uri = format!("/api/empleado/empleados/{}", EMPLEADO);

    let updated = app
        .call(
            Method::PATCH,
            &uri,
            Some(json!({ "cargo": "Jefa de tienda", "salario": 850000 })),
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["cargo"], "Jefa de tienda");
    assert_eq!(updated["salario"], 850000);

    let listed = app.get("/api/empleado/empleados", GERENTE).await;
    assert_eq!(listed["pagination"]["total"], 3);

    let body = app
        .call(Method::DELETE, &uri, None, ADMIN, StatusCode::OK)
        .await;
    assert_eq!(body["message"], "Empleado desactivado correctamente");

    let listed = app.get("/api/empleado/empleados", GERENTE).await;
    assert_eq!(listed["pagination"]["total"], 2);
    let ruts: Vec<&str> = listed["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["rut"].as_str().unwrap())
        .collect();
    assert!(!ruts.contains(&EMPLEADO));

    let listed = app
        .get("/api/empleado/empleados?incluir_inactivos=true", GERENTE)
        .await;
    assert_eq!(listed["pagination"]["total"], 3);

    let fetched = app.get(&uri, GERENTE).await;
    assert_eq!(fetched["activo"], false);
    assert_eq!(fetched["estado"], "inactivo");
}

#[tokio::test]
async fn rol_query_filters_the_list_without_touching_auth() {
    let app = TestApp::new().await;

    let listed = app.get("/api/empleado/empleados?rol=empleado", GERENTE).await;
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["items"][0]["rut"], EMPLEADO);

    let listed = app.get("/api/empleado/empleados?rol=administrador", GERENTE).await;
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["items"][0]["rut"], ADMIN);

    let body = app
        .call(
            Method::GET,
            "/api/empleado/empleados?empleado_rol=administrador",
            None,
            GERENTE,
            StatusCode::FORBIDDEN,
        )
        .await;
    assert_eq!(body["error"]["code"], "AUTH_ROLE_MISMATCH");
}

#[tokio::test]
async fn only_a_gerente_assigns_roles() {
    let app = TestApp::new().await;

    app.call(
        Method::PATCH,
        &format!("/api/empleado/empleados/{}", ADMIN),
        Some(json!({ "rol": "gerente" })),
        ADMIN,
        StatusCode::FORBIDDEN,
    )
    .await;
    app.call(
        Method::PATCH,
        &format!("/api/empleado/empleados/{}", EMPLEADO),
        Some(json!({ "rol": "administrador" })),
        ADMIN,
        StatusCode::FORBIDDEN,
    )
    .await;
    app.call(
        Method::POST,
        "/api/empleado/empleados",
        Some(json!({
            "rut": "22222222-2",
            "nombre": "Diego",
            "apellido": "Pérez",
            "cargo": "Bodeguero",
            "rol": "gerente",
        })),
        ADMIN,
        StatusCode::FORBIDDEN,
    )
    .await;

    let fetched = app.get(&format!("/api/empleado/empleados/{}", ADMIN), ADMIN).await;
    assert_eq!(fetched["rol"], "administrador");

    // unchanged role in the payload is not an assignment
    app.call(
        Method::PATCH,
        &format!("/api/empleado/empleados/{}", EMPLEADO),
        Some(json!({ "rol": "empleado", "cargo": "Cajero" })),
        ADMIN,
        StatusCode::OK,
    )
    .await;

    let promoted = app
        .call(
            Method::PATCH,
            &format!("/api/empleado/empleados/{}", EMPLEADO),
            Some(json!({ "rol": "administrador" })),
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(promoted["rol"], "administrador");
}

#[tokio::test]
async fn rut_change_follows_every_dependent_row() {
    let app = TestApp::new().await;
    const NUEVO: &str = "15555555-6";

    let asistencia = app
        .post(
            "/api/asistencia",
            json!({
                "empleado_rut": EMPLEADO,
                "fecha": "2024-05-06",
                "hora_entrada": "2024-05-06T09:00:00Z",
                "hora_salida": "2024-05-06T17:00:00Z",
            }),
            EMPLEADO,
        )
        .await;
    let turno = app
        .post(
            "/api/turno",
            json!({
                "empleados_rut": EMPLEADO,
                "nombre_turno": "Mañana",
                "hora_entrada": "09:00:00",
                "hora_salida": "17:00:00",
            }),
            ADMIN,
        )
        .await;
    let horario = app
        .post(
            "/api/turno/horarios",
            json!({
                "empleado_rut": EMPLEADO,
                "turno_id": turno["id"],
                "fecha_inicio": "2024-05-01",
            }),
            ADMIN,
        )
        .await;
    let tipo = app
        .post("/api/empleado/tipos-solicitudes", json!({ "nombre": "Permiso" }), ADMIN)
        .await;
    let solicitud = app
        .post(
            "/api/empleado/solicitudes",
            json!({
                "tipo_solicitud_id": tipo["id"],
                "fecha_inicio": "2024-07-01",
                "fecha_fin": "2024-07-02",
                "motivo": "Mudanza",
            }),
            EMPLEADO,
        )
        .await;
    let tarea = app
        .post(
            "/api/empleado/tareas",
            json!({ "titulo": "Inventario de bodega", "asignada_a_rut": EMPLEADO }),
            ADMIN,
        )
        .await;
    let tarea_id = tarea["id"].as_i64().unwrap();
    app.post(
        &format!("/api/empleado/tareas/{tarea_id}/comentarios"),
        json!({ "comentario": "Comienzo mañana" }),
        EMPLEADO,
    )
    .await;
    app.call(
        Method::POST,
        &format!("/api/empleado/tareas/{tarea_id}/actualizar_progreso"),
        Some(json!({ "porcentaje_completado": 30 })),
        EMPLEADO,
        StatusCode::OK,
    )
    .await;

    let renamed = app
        .call(
            Method::PATCH,
            &format!("/api/empleado/empleados/{}", EMPLEADO),
            Some(json!({ "rut": "15.555.555-6" })),
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(renamed["rut"], NUEVO);

    app.call(
        Method::GET,
        &format!("/api/empleado/empleados/{}", EMPLEADO),
        None,
        GERENTE,
        StatusCode::NOT_FOUND,
    )
    .await;
    let fetched = app.get(&format!("/api/empleado/empleados/{NUEVO}"), GERENTE).await;
    assert_eq!(fetched["id"], renamed["id"]);

    let asistencia = app
        .get(&format!("/api/asistencia/{}", asistencia["id"]), GERENTE)
        .await;
    assert_eq!(asistencia["empleado_rut"], NUEVO);
    let turno = app.get(&format!("/api/turno/{}", turno["id"]), GERENTE).await;
    assert_eq!(turno["empleados_rut"], NUEVO);
    let horario = app
        .get(&format!("/api/turno/horarios/{}", horario["id"]), GERENTE)
        .await;
    assert_eq!(horario["empleado_rut"], NUEVO);
    let solicitud = app
        .get(&format!("/api/empleado/solicitudes/{}", solicitud["id"]), GERENTE)
        .await;
    assert_eq!(solicitud["empleado_rut"], NUEVO);
    let tarea = app.get(&format!("/api/empleado/tareas/{tarea_id}"), NUEVO).await;
    assert_eq!(tarea["asignada_a_rut"], NUEVO);
    assert_eq!(tarea["creada_por_rut"], ADMIN);

    let comentarios = app
        .get(&format!("/api/empleado/tareas/{tarea_id}/comentarios"), GERENTE)
        .await;
    assert_eq!(comentarios[0]["empleado_rut"], NUEVO);
    let historial = app
        .get(&format!("/api/empleado/tareas/{tarea_id}/historial"), GERENTE)
        .await;
    let ruts: Vec<&str> = historial
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|h| h["empleado_rut"].as_str())
        .collect();
    assert!(ruts.contains(&NUEVO), "{historial}");
    assert!(!ruts.contains(&EMPLEADO), "{historial}");
}

#[tokio::test]
async fn caller_cannot_deactivate_themselves() {
    let app = TestApp::new().await;

    app.call(
        Method::DELETE,
        &format!("/api/empleado/empleados/{}", GERENTE),
        None,
        GERENTE,
        StatusCode::BAD_REQUEST,
    )
    .await;

    let fetched = app
        .get(&format!("/api/empleado/empleados/{}", GERENTE), GERENTE)
        .await;
    assert_eq!(fetched["activo"], true);
}

#[tokio::test]
async fn asistencia_derives_hours_and_rejects_duplicates() {
    let app = TestApp::new().await;

    let created = app
        .post(
            "/api/asistencia",
            json!({
                "empleado_rut": "7.654.321-6",
                "fecha": "2024-05-06",
                "hora_entrada": "2024-05-06T09:00:00Z",
                "hora_salida": "2024-05-06T17:30:00Z",
            }),
            EMPLEADO,
        )
        .await;
    assert_eq!(created["empleado_rut"], EMPLEADO);
    assert_eq!(created["estado"], "presente");
    assert_eq!(decimal(&created["horas_trabajadas"]), 8.5);

    app.call(
        Method::POST,
        "/api/asistencia",
        Some(json!({ "empleado_rut": EMPLEADO, "fecha": "2024-05-06" })),
        EMPLEADO,
        StatusCode::CONFLICT,
    )
    .await;

    let body = app
        .call(
            Method::POST,
            "/api/asistencia",
            Some(json!({
                "empleado_rut": GERENTE,
                "fecha": "2024-05-06",
                "hora_entrada": "2024-05-06T09:00:00Z",
                "hora_salida": "2024-05-06T08:00:00Z",
            })),
            GERENTE,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["hora_salida"].is_array(), "{body}");

    let body = app
        .call(
            Method::POST,
            "/api/asistencia",
            Some(json!({ "empleado_rut": "22222222-2" })),
            GERENTE,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["empleado_rut"].is_array(), "{body}");
}

#[tokio::test]
async fn asistencia_defaults_to_today_and_is_validated_by_admin() {
    let app = TestApp::new().await;

    let created = app
        .post("/api/asistencia", json!({ "empleado_rut": EMPLEADO }), EMPLEADO)
        .await;
    let today = Utc::now().date_naive().to_string();
    assert_eq!(created["fecha"], today.as_str());
    assert!(created["validado_por"].is_null());

    let id = created["id"].as_i64().unwrap();
    app.call(
        Method::POST,
        &format!("/api/asistencia/{id}/validar"),
        None,
        EMPLEADO,
        StatusCode::FORBIDDEN,
    )
    .await;

    let validated = app
        .call(
            Method::POST,
            &format!("/api/asistencia/{id}/validar"),
            None,
            ADMIN,
            StatusCode::OK,
        )
        .await;
    assert!(validated["validado_por"].is_number());
    assert!(validated["fecha_validacion"].is_string());
}

#[tokio::test]
async fn asistencia_statistics_count_missing_records_as_absent() {
    let app = TestApp::new().await;

    app.post(
        "/api/asistencia",
        json!({ "empleado_rut": EMPLEADO, "fecha": "2024-05-06" }),
        EMPLEADO,
    )
    .await;
    app.post(
        "/api/asistencia",
        json!({ "empleado_rut": ADMIN, "fecha": "2024-05-06", "estado": "tarde", "minutos_tarde": 12 }),
        ADMIN,
    )
    .await;

    let stats = app
        .get("/api/asistencia/estadisticas?fecha=2024-05-06", ADMIN)
        .await;
    assert_eq!(stats["fecha"], "2024-05-06");
    assert_eq!(stats["total_empleados"], 3);
    assert_eq!(stats["presentes"], 1);
    assert_eq!(stats["tardes"], 1);
    assert_eq!(stats["ausentes"], 1);

    let listed = app
        .get(&format!("/api/asistencia?empleado_rut={}", ADMIN), ADMIN)
        .await;
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["items"][0]["minutos_tarde"], 12);
}

#[tokio::test]
async fn turnos_compute_hours_and_schedules_reference_them() {
    let app = TestApp::new().await;

    let turno = app
        .post(
            "/api/turno",
            json!({
                "empleados_rut": EMPLEADO,
                "nombre_turno": "Noche",
                "hora_entrada": "22:00:00",
                "hora_salida": "06:00:00",
                "dias_semana": ["lunes", "martes", 2],
            }),
            ADMIN,
        )
        .await;
    assert_eq!(decimal(&turno["horas_trabajo"]), 8.0);
    assert_eq!(turno["tolerancia_minutos"], 15);

    let body = app
        .call(
            Method::POST,
            "/api/turno",
            Some(json!({
                "empleados_rut": EMPLEADO,
                "nombre_turno": "Roto",
                "hora_entrada": "09:00:00",
                "hora_salida": "18:00:00",
                "dias_semana": ["feriado"],
            })),
            ADMIN,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["dias_semana"].is_array(), "{body}");

    app.call(
        Method::POST,
        "/api/turno",
        Some(json!({
            "empleados_rut": EMPLEADO,
            "nombre_turno": "Mañana",
            "hora_entrada": "09:00:00",
            "hora_salida": "18:00:00",
        })),
        EMPLEADO,
        StatusCode::FORBIDDEN,
    )
    .await;

    let listed = app.get("/api/turno", EMPLEADO).await;
    assert_eq!(listed["pagination"]["total"], 1);

    let turno_id = turno["id"].as_i64().unwrap();
    let horario = app
        .post(
            "/api/turno/horarios",
            json!({
                "empleado_rut": EMPLEADO,
                "turno_id": turno_id,
                "fecha_inicio": "2024-05-01",
                "fecha_fin": "2024-05-31",
            }),
            ADMIN,
        )
        .await;
    assert_eq!(horario["turno_id"], turno_id);

    let body = app
        .call(
            Method::DELETE,
            &format!("/api/turno/{turno_id}"),
            None,
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], "Turno desactivado correctamente");

    let listed = app.get("/api/turno", EMPLEADO).await;
    assert_eq!(listed["pagination"]["total"], 0);
}
