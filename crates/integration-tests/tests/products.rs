//! Integration tests for the product routes.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use vitrine_integration_tests::TestServer;

async fn create_product(server: &TestServer, body: &Value) -> Value {
    let resp = server
        .client
        .post(server.url("/products"))
        .json(body)
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse product")
}

fn caneca() -> Value {
    json!({
        "name": "Caneca",
        "price": 19.9,
        "description": "Caneca de cerâmica esmaltada"
    })
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_product_returns_stored_record() {
    let server = TestServer::start().await;

    let product = create_product(&server, &caneca()).await;

    assert_eq!(product["id"], 1);
    assert_eq!(product["name"], "Caneca");
    assert_eq!(product["price"], 19.9);
    assert!(product["createdAt"].is_string());
    assert_eq!(server.document()["products"][0], product);
}

#[tokio::test]
async fn test_create_product_assigns_increasing_ids() {
    let server = TestServer::start().await;

    let first = create_product(&server, &caneca()).await;
    let second = create_product(&server, &caneca()).await;

    assert_eq!(first["id"], 1);
    assert_eq!(second["id"], 2);
}

#[tokio::test]
async fn test_create_product_accepts_urlencoded() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/products"))
        .form(&[
            ("name", "Caneca"),
            ("price", "19.90"),
            ("description", "Caneca de cerâmica esmaltada"),
        ])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.expect("Failed to parse product");
    assert_eq!(product["price"], 19.9);
}

#[tokio::test]
async fn test_create_product_short_description_rejected() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/products"))
        .json(&json!({"name": "Caneca", "price": 10, "description": "curta"}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(
        body,
        json!({"description": "A descrição precisa ter mais que 10 caracteres"})
    );
    assert_eq!(server.document()["products"], json!([]));
}

#[tokio::test]
async fn test_create_product_reports_every_field() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/products"))
        .json(&json!({"name": "C", "price": "abc"}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(
        body,
        json!({
            "name": "O nome do produto precisa ter mais que 2 caracteres",
            "price": "Preço inválido",
            "description": "A descrição precisa ter mais que 10 caracteres"
        })
    );
}

#[tokio::test]
async fn test_create_product_rejects_non_positive_price() {
    let server = TestServer::start().await;

    for price in [json!(0), json!(-5), json!("0.00")] {
        let mut body = caneca();
        body["price"] = price;
        let resp = server
            .client
            .post(server.url("/products"))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Uploads
// ============================================================================

fn caneca_form(image: &'static [u8]) -> Form {
    Form::new()
        .text("name", "Caneca")
        .text("price", "19.9")
        .text("description", "Caneca de cerâmica esmaltada")
        .part("image", Part::bytes(image).file_name("foto.png"))
}

#[tokio::test]
async fn test_create_product_with_image_stores_file() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .post(server.url("/products"))
        .multipart(caneca_form(b"png bytes"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.expect("Failed to parse product");
    let image = product["image"].as_str().expect("image is a string");
    assert!(image.ends_with("_foto.png"), "unexpected name {image}");
    assert_eq!(server.uploaded_files(), vec![image.to_owned()]);

    let served = server
        .client
        .get(server.url(&format!("/images/{image}")))
        .send()
        .await
        .expect("Failed to fetch image");
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.bytes().await.expect("body").as_ref(), b"png bytes");
}

#[tokio::test]
async fn test_invalid_product_upload_is_deleted() {
    let server = TestServer::start().await;
    let form = Form::new()
        .text("name", "C")
        .text("price", "19.9")
        .text("description", "Caneca de cerâmica esmaltada")
        .part("image", Part::bytes(&b"png"[..]).file_name("foto.png"));

    let resp = server
        .client
        .post(server.url("/products"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(server.wait_for_empty_upload_dir().await);
    assert_eq!(server.document()["products"], json!([]));
}

#[tokio::test]
async fn test_second_file_rejected() {
    let server = TestServer::start().await;
    let form = caneca_form(b"one").part("image", Part::bytes(&b"two"[..]).file_name("b.png"));

    let resp = server
        .client
        .post(server.url("/products"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(server.wait_for_empty_upload_dir().await);
}

// ============================================================================
// Replace
// ============================================================================

#[tokio::test]
async fn test_put_product_merges_and_stamps() {
    let server = TestServer::start().await;
    let created = create_product(&server, &caneca()).await;

    let resp = server
        .client
        .put(server.url("/products/1"))
        .json(&json!({
            "name": "Caneca grande",
            "price": "29.90",
            "description": "Caneca de cerâmica de 500ml"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::OK);
    let product: Value = resp.json().await.expect("Failed to parse product");
    assert_eq!(product["id"], 1);
    assert_eq!(product["name"], "Caneca grande");
    assert_eq!(product["price"], 29.9);
    assert_eq!(product["createdAt"], created["createdAt"]);
    assert!(product["updatedAt"].is_string());
    assert_eq!(server.document()["products"][0], product);
}

#[tokio::test]
async fn test_put_product_requires_full_payload() {
    let server = TestServer::start().await;
    create_product(&server, &caneca()).await;

    let resp = server
        .client
        .put(server.url("/products/1"))
        .json(&json!({"name": "Caneca grande"}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert!(body.get("price").is_some());
    assert!(body.get("description").is_some());
    assert_eq!(server.document()["products"][0]["name"], "Caneca");
}

#[tokio::test]
async fn test_put_missing_product_not_found() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .put(server.url("/products/99"))
        .json(&caneca())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body, json!({"error": "Produto não encontrado"}));
    assert_eq!(server.document()["products"], json!([]));
}

#[tokio::test]
async fn test_put_missing_product_discards_upload() {
    let server = TestServer::start().await;

    let resp = server
        .client
        .put(server.url("/products/99"))
        .multipart(caneca_form(b"png"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(server.wait_for_empty_upload_dir().await);
}

// ============================================================================
// Read & delete
// ============================================================================

#[tokio::test]
async fn test_list_and_show_products() {
    let server = TestServer::start().await;
    let created = create_product(&server, &caneca()).await;

    let list: Value = server
        .client
        .get(server.url("/products"))
        .send()
        .await
        .expect("Failed to list")
        .json()
        .await
        .expect("Failed to parse list");
    assert_eq!(list, json!([created.clone()]));

    let shown: Value = server
        .client
        .get(server.url("/products/1"))
        .send()
        .await
        .expect("Failed to show")
        .json()
        .await
        .expect("Failed to parse product");
    assert_eq!(shown, created);

    let missing = server
        .client
        .get(server.url("/products/abc"))
        .send()
        .await
        .expect("Failed to show");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_product() {
    let server = TestServer::start().await;
    create_product(&server, &caneca()).await;

    let resp = server
        .client
        .delete(server.url("/products/1"))
        .send()
        .await
        .expect("Failed to delete");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(server.document()["products"], json!([]));

    let again = server
        .client
        .delete(server.url("/products/1"))
        .send()
        .await
        .expect("Failed to delete");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_collections_survive_writes() {
    let server = TestServer::start_with_document(Some(&json!({
        "products": [],
        "users": [],
        "orders": [{"id": 7, "productId": 1}]
    })))
    .await;

    create_product(&server, &caneca()).await;

    assert_eq!(
        server.document()["orders"],
        json!([{"id": 7, "productId": 1}])
    );
}
