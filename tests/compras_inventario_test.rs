mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN, EMPLEADO, GERENTE};
use serde_json::{json, Value};

fn decimal(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        other => other.as_f64().expect("decimal number"),
    }
}

async fn crear_producto(app: &TestApp, codigo: &str, actual: u32, minima: u32) -> Value {
    app.post(
        "/api/inventario",
        json!({
            "codigo_producto": codigo,
            "nombre_producto": format!("Producto {codigo}"),
            "categoria": "cafe",
            "cantidad_actual": actual,
            "cantidad_minima": minima,
            "precio_unitario": 1000,
            "precio_venta": 1500,
        }),
        EMPLEADO,
    )
    .await
}

async fn crear_proveedor(app: &TestApp, nombre: &str) -> i64 {
    let proveedor = app
        .post(
            "/api/proveedores",
            json!({ "nombre": nombre, "email": "ventas@tostaduria.cl", "ciudad": "Valparaíso" }),
            ADMIN,
        )
        .await;
    assert_eq!(proveedor["estado"], "activo");
    proveedor["id"].as_i64().unwrap()
}

#[tokio::test]
async fn stock_movements_follow_the_estado_rule() {
    let app = TestApp::new().await;

    let producto = crear_producto(&app, "CAF-001", 5, 3).await;
    assert_eq!(producto["estado"], "disponible");
    assert_eq!(producto["stock_bajo"], false);
    assert_eq!(decimal(&producto["valor_total"]), 5000.0);
    let id = producto["id"].as_i64().unwrap();
    let uri = format!("/api/inventario/{id}/update_stock");

    let body = app
        .call(
            Method::POST,
            &uri,
            Some(json!({ "cantidad": 10, "tipo": "egreso" })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["message"], "No se puede tener stock negativo");

    let bajo = app
        .call(
            Method::POST,
            &uri,
            Some(json!({ "cantidad": 3, "tipo": "egreso", "notas": "Venta mesón" })),
            EMPLEADO,
            StatusCode::OK,
        )
        .await;
    assert_eq!(decimal(&bajo["cantidad_actual"]), 2.0);
    assert_eq!(bajo["estado"], "por_vencer");
    assert_eq!(bajo["stock_bajo"], true);
    assert!(bajo["notas"].as_str().unwrap().contains("Venta mesón"));

    for manager in [GERENTE, ADMIN] {
        let inbox = app
            .eventually("/api/empleado/notificaciones", manager, |body| {
                body["pagination"]["total"] == 1
            })
            .await;
        assert_eq!(inbox["items"][0]["titulo"], "Stock bajo: Producto CAF-001");
    }

    // without a tipo the movement is an absolute adjustment
    let agotado = app
        .call(
            Method::POST,
            &uri,
            Some(json!({ "cantidad": 0 })),
            EMPLEADO,
            StatusCode::OK,
        )
        .await;
    assert_eq!(agotado["estado"], "agotado");

    let low = app.get("/api/inventario/low_stock", EMPLEADO).await;
    assert_eq!(low.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn product_codes_are_unique_and_delete_is_soft() {
    let app = TestApp::new().await;

    let producto = crear_producto(&app, "CAF-002", 10, 2).await;
    app.call(
        Method::POST,
        "/api/inventario",
        Some(json!({ "codigo_producto": "CAF-002", "nombre_producto": "Duplicado" })),
        EMPLEADO,
        StatusCode::CONFLICT,
    )
    .await;

    let body = app
        .call(
            Method::POST,
            "/api/inventario",
            Some(json!({
                "codigo_producto": "CAF-003",
                "nombre_producto": "Vencido",
                "fecha_vencimiento": "2001-01-01",
            })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["fecha_vencimiento"].is_array(), "{body}");

    let body = app
        .call(
            Method::DELETE,
            &format!("/api/inventario/{}", producto["id"]),
            None,
            EMPLEADO,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], "Producto desactivado correctamente");

    let listed = app.get("/api/inventario", EMPLEADO).await;
    assert_eq!(listed["pagination"]["total"], 0);
}

#[tokio::test]
async fn inventory_statistics_and_search() {
    let app = TestApp::new().await;

    crear_producto(&app, "CAF-010", 10, 2).await;
    crear_producto(&app, "CAF-011", 1, 2).await;
    crear_producto(&app, "CAF-012", 0, 2).await;

    let stats = app.get("/api/inventario/stats", EMPLEADO).await;
    assert_eq!(stats["total_productos"], 3);
    assert_eq!(stats["productos_disponibles"], 1);
    assert_eq!(stats["productos_agotados"], 1);
    assert_eq!(stats["stock_bajo"], 2);
    assert_eq!(decimal(&stats["valor_total_inventario"]), 11000.0);
    assert_eq!(stats["categorias_distribucion"]["cafe"], 3);

    let found = app.get("/api/inventario/search?q=CAF-011", EMPLEADO).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn purchase_order_lifecycle_moves_stock() {
    let app = TestApp::new().await;

    let producto = crear_producto(&app, "CAF-100", 2, 1).await;
    let producto_id = producto["id"].as_i64().unwrap();
    let proveedor_id = crear_proveedor(&app, "Tostaduría Puerto").await;

    let orden = app
        .post(
            "/api/ordenes-compra",
            json!({
                "proveedor_id": proveedor_id,
                "fecha_orden": "2024-05-06",
                "impuestos": 3800,
                "items": [
                    { "producto_id": producto_id, "cantidad": 10, "precio_unitario": 1000 },
                    { "nombre_producto": "Filtros de papel", "cantidad": 5, "precio_unitario": 2000 },
                ],
            }),
            ADMIN,
        )
        .await;
    assert_eq!(orden["numero_orden"], "OC-20240506-0001");
    assert_eq!(orden["estado"], "borrador");
    assert_eq!(orden["subtotal"], 20000);
    assert_eq!(orden["total"], 23800);
    assert_eq!(orden["proveedor_nombre"], "Tostaduría Puerto");
    let items = orden["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["nombre_producto"], "Producto CAF-100");
    let linea_producto = items[0]["id"].as_i64().unwrap();
    let linea_filtros = items[1]["id"].as_i64().unwrap();
    let id = orden["id"].as_i64().unwrap();

    // draft orders cannot be received yet
    app.call(
        Method::POST,
        &format!("/api/ordenes-compra/{id}/recibir"),
        Some(json!({ "items": [{ "id": linea_producto, "cantidad_recibida": 1 }] })),
        ADMIN,
        StatusCode::BAD_REQUEST,
    )
    .await;

    let aprobada = app
        .call(
            Method::POST,
            &format!("/api/ordenes-compra/{id}/aprobar"),
            None,
            GERENTE,
            StatusCode::OK,
        )
        .await;
    assert_eq!(aprobada["estado"], "pendiente");
    assert!(aprobada["aprobado_por"].is_number());

    app.call(
        Method::POST,
        &format!("/api/ordenes-compra/{id}/aprobar"),
        None,
        GERENTE,
        StatusCode::BAD_REQUEST,
    )
    .await;

    let parcial = app
        .call(
            Method::POST,
            &format!("/api/ordenes-compra/{id}/recibir"),
            Some(json!({ "items": [{ "id": linea_producto, "cantidad_recibida": 4 }] })),
            ADMIN,
            StatusCode::OK,
        )
        .await;
    assert_eq!(parcial["estado"], "parcialmente_recibida");
    let stock = app.get(&format!("/api/inventario/{producto_id}"), EMPLEADO).await;
    assert_eq!(decimal(&stock["cantidad_actual"]), 6.0);

    let body = app
        .call(
            Method::POST,
            &format!("/api/ordenes-compra/{id}/recibir"),
            Some(json!({ "items": [{ "id": linea_filtros, "cantidad_recibida": 9 }] })),
            ADMIN,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(
        body["details"][format!("items.{linea_filtros}.cantidad_recibida")].is_array(),
        "{body}"
    );

    let recibida = app
        .call(
            Method::POST,
            &format!("/api/ordenes-compra/{id}/recibir"),
            Some(json!({ "items": [
                { "id": linea_producto, "cantidad_recibida": 10 },
                { "id": linea_filtros, "cantidad_recibida": 5 },
            ] })),
            ADMIN,
            StatusCode::OK,
        )
        .await;
    assert_eq!(recibida["estado"], "recibida");
    assert!(recibida["fecha_entrega_real"].is_string());
    let stock = app.get(&format!("/api/inventario/{producto_id}"), EMPLEADO).await;
    assert_eq!(decimal(&stock["cantidad_actual"]), 12.0);
    assert_eq!(stock["estado"], "disponible");

    // the creator hears about both receipts
    app.eventually("/api/empleado/notificaciones", ADMIN, |body| {
        body["items"]
            .as_array()
            .map_or(false, |items| {
                items.iter().any(|n| n["titulo"] == "Orden OC-20240506-0001 recibida")
            })
    })
    .await;

    // received orders are frozen
    app.call(
        Method::POST,
        &format!("/api/ordenes-compra/{id}/agregar_item"),
        Some(json!({ "nombre_producto": "Azúcar", "cantidad": 1, "precio_unitario": 900 })),
        ADMIN,
        StatusCode::BAD_REQUEST,
    )
    .await;

    let stats = app.get("/api/ordenes-compra/estadisticas", EMPLEADO).await;
    assert_eq!(stats["total_ordenes"], 1);
    assert_eq!(stats["ordenes_recibidas"], 1);
    assert_eq!(stats["total_compras"], 23800);

    let historial = app
        .get(&format!("/api/proveedores/{proveedor_id}/historial_compras"), EMPLEADO)
        .await;
    assert_eq!(historial["total_ordenes"], 1);
    assert_eq!(historial["total_compras"], 23800);

    let por_proveedor = app
        .get(
            &format!("/api/ordenes-compra/por_proveedor?proveedor_id={proveedor_id}"),
            EMPLEADO,
        )
        .await;
    assert_eq!(por_proveedor.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn order_items_can_be_edited_while_open() {
    let app = TestApp::new().await;
    let proveedor_id = crear_proveedor(&app, "Envases del Sur").await;

    let orden = app
        .post(
            "/api/ordenes-compra",
            json!({ "proveedor_id": proveedor_id, "fecha_orden": "2024-05-06" }),
            ADMIN,
        )
        .await;
    let id = orden["id"].as_i64().unwrap();
    assert_eq!(orden["total"], 0);

    let segunda = app
        .post(
            "/api/ordenes-compra",
            json!({ "proveedor_id": proveedor_id, "fecha_orden": "2024-05-06" }),
            ADMIN,
        )
        .await;
    assert_eq!(segunda["numero_orden"], "OC-20240506-0002");

    let item = app
        .post(
            &format!("/api/ordenes-compra/{id}/agregar_item"),
            json!({ "nombre_producto": "Vasos 12oz", "cantidad": 100, "precio_unitario": 50, "descuento": 500 }),
            ADMIN,
        )
        .await;
    assert_eq!(item["precio_total"], 4500);

    let detalle = app.get(&format!("/api/ordenes-compra/{id}"), EMPLEADO).await;
    assert_eq!(detalle["total"], 4500);

    let body = app
        .call(
            Method::DELETE,
            &format!("/api/ordenes-compra/{id}/eliminar_item"),
            Some(json!({ "item_id": item["id"] })),
            ADMIN,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], "Item eliminado correctamente");

    let detalle = app.get(&format!("/api/ordenes-compra/{id}"), EMPLEADO).await;
    assert_eq!(detalle["total"], 0);
    assert!(detalle["items"].as_array().unwrap().is_empty());

    app.call(
        Method::GET,
        "/api/ordenes-compra/por_proveedor",
        None,
        EMPLEADO,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn order_numbers_continue_after_a_deleted_draft() {
    let app = TestApp::new().await;
    let proveedor_id = crear_proveedor(&app, "Panadería Cerro Alegre").await;
    let nueva = json!({ "proveedor_id": proveedor_id, "fecha_orden": "2024-05-06" });

    let primera = app.post("/api/ordenes-compra", nueva.clone(), ADMIN).await;
    let segunda = app.post("/api/ordenes-compra", nueva.clone(), ADMIN).await;
    assert_eq!(primera["numero_orden"], "OC-20240506-0001");
    assert_eq!(segunda["numero_orden"], "OC-20240506-0002");

    app.call(
        Method::DELETE,
        &format!("/api/ordenes-compra/{}", primera["id"]),
        None,
        ADMIN,
        StatusCode::OK,
    )
    .await;

    let tercera = app.post("/api/ordenes-compra", nueva, ADMIN).await;
    assert_eq!(tercera["numero_orden"], "OC-20240506-0003");
}

#[tokio::test]
async fn concurrent_receipts_move_stock_once() {
    let app = TestApp::new().await;
    let producto = crear_producto(&app, "CAF-200", 0, 1).await;
    let producto_id = producto["id"].as_i64().unwrap();
    let proveedor_id = crear_proveedor(&app, "Molienda Austral").await;

    let orden = app
        .post(
            "/api/ordenes-compra",
            json!({
                "proveedor_id": proveedor_id,
                "estado": "pendiente",
                "items": [{ "producto_id": producto_id, "cantidad": 8, "precio_unitario": 1000 }],
            }),
            ADMIN,
        )
        .await;
    let id = orden["id"].as_i64().unwrap();
    let linea = orden["items"][0]["id"].as_i64().unwrap();

    let uri = format!("/api/ordenes-compra/{id}/recibir");
    let recepcion = json!({ "items": [{ "id": linea, "cantidad_recibida": 8 }] });
    let (a, b) = tokio::join!(
        app.request(Method::POST, &uri, Some(recepcion.clone()), Some(ADMIN)),
        app.request(Method::POST, &uri, Some(recepcion), Some(GERENTE)),
    );
    let ganadores = [a.status(), b.status()]
        .into_iter()
        .filter(|s| *s == StatusCode::OK)
        .count();
    assert_eq!(ganadores, 1);

    let stock = app.get(&format!("/api/inventario/{producto_id}"), EMPLEADO).await;
    assert_eq!(decimal(&stock["cantidad_actual"]), 8.0);
    let detalle = app.get(&format!("/api/ordenes-compra/{id}"), EMPLEADO).await;
    assert_eq!(detalle["estado"], "recibida");
    assert_eq!(detalle["items"][0]["cantidad_recibida"], 8);
}

#[tokio::test]
async fn oversized_amounts_are_rejected_as_field_errors() {
    let app = TestApp::new().await;

    let body = app
        .call(
            Method::POST,
            "/api/inventario",
            Some(json!({
                "codigo_producto": "CAF-900",
                "nombre_producto": "Grano de exportación",
                "cantidad_actual": 1_000_000_000_000_000u64,
                "precio_unitario": 1_000_000_000_000_000u64,
            })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["cantidad_actual"].is_array(), "{body}");
    assert!(body["details"]["precio_unitario"].is_array(), "{body}");

    let producto = crear_producto(&app, "CAF-901", 5, 1).await;
    let body = app
        .call(
            Method::POST,
            &format!("/api/inventario/{}/update_stock", producto["id"]),
            Some(json!({ "cantidad": 1_000_000_000_000_000u64, "tipo": "ingreso" })),
            EMPLEADO,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["cantidad"].is_array(), "{body}");
    let stock = app.get(&format!("/api/inventario/{}", producto["id"]), EMPLEADO).await;
    assert_eq!(decimal(&stock["cantidad_actual"]), 5.0);

    let proveedor_id = crear_proveedor(&app, "Importadora Norte").await;
    let body = app
        .call(
            Method::POST,
            "/api/ordenes-compra",
            Some(json!({
                "proveedor_id": proveedor_id,
                "items": [{
                    "nombre_producto": "Contenedor",
                    "cantidad": 2,
                    "precio_unitario": 5_000_000_000_000_000_000i64,
                }],
            })),
            ADMIN,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["items.0.precio_unitario"].is_array(), "{body}");
    let listed = app.get("/api/ordenes-compra", EMPLEADO).await;
    assert_eq!(listed["pagination"]["total"], 0);
}

#[tokio::test]
async fn inactive_supplier_cannot_receive_orders() {
    let app = TestApp::new().await;
    let proveedor_id = crear_proveedor(&app, "Lácteos Andinos").await;

    let body = app
        .call(
            Method::DELETE,
            &format!("/api/proveedores/{proveedor_id}"),
            None,
            ADMIN,
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["message"], "Proveedor desactivado correctamente");

    let activos = app.get("/api/proveedores/activos", EMPLEADO).await;
    assert!(activos.as_array().unwrap().is_empty());

    let body = app
        .call(
            Method::POST,
            "/api/ordenes-compra",
            Some(json!({ "proveedor_id": proveedor_id })),
            ADMIN,
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert!(body["details"]["proveedor_id"].is_array(), "{body}");
}
