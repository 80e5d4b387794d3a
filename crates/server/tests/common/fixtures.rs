//! Request helpers and domain fixtures for integration tests.

#![allow(dead_code)] // each test file compiles common/ separately

use super::server::TestServer;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use darkroom_metadata::models::CameraRow;
use darkroom_metadata::repos::CameraRepo;
use serde_json::{Value, json};
use std::io::Cursor;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

const MULTIPART_BOUNDARY: &str = "darkroom-test-boundary-x7pQ9";

/// Make a JSON request and return status plus parsed body.
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Make a request and return status plus raw body bytes.
pub async fn raw_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    auth_token: Option<&str>,
) -> (StatusCode, bytes::Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

/// POST a single-part multipart body, the way a camera posts an image.
pub async fn multipart_upload(
    router: &axum::Router,
    uri: &str,
    field_name: &str,
    content_type: &str,
    data: &[u8],
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"capture.jpg\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder().method("POST").uri(uri).header(
        "Content-Type",
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
    );
    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = router
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Register an account and log in, returning the user bearer token.
pub async fn register_and_login(server: &TestServer, email: &str) -> String {
    let (status, _) = json_request(
        &server.router,
        "POST",
        "/register",
        Some(json!({
            "first_name": "Test",
            "last_name": "User",
            "email": email,
            "password": "hunter2hunter2",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed");

    let (status, body) = json_request(
        &server.router,
        "POST",
        "/login",
        Some(json!({ "email": email, "password": "hunter2hunter2" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed");

    body.get("access_token")
        .and_then(|v| v.as_str())
        .expect("login response missing access_token")
        .to_string()
}

/// Insert an unowned camera row, as startup provisioning would.
pub async fn provision_camera(server: &TestServer, pairing_token: &str) -> Uuid {
    let camera = CameraRow {
        camera_id: Uuid::new_v4(),
        pairing_token: pairing_token.to_string(),
        owner_user_id: None,
        name: None,
        description: None,
        created_at: OffsetDateTime::now_utc(),
        paired_at: None,
    };
    server
        .metadata()
        .create_camera(&camera)
        .await
        .expect("failed to provision camera");
    camera.camera_id
}

/// Pair a provisioned camera to the user behind `user_token`.
pub async fn pair_camera(
    server: &TestServer,
    user_token: &str,
    pairing_token: &str,
    name: &str,
) -> Uuid {
    let (status, body) = json_request(
        &server.router,
        "POST",
        "/cameras",
        Some(json!({ "token": pairing_token, "name": name, "description": "test camera" })),
        Some(user_token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "pairing failed: {body}");

    body.get("camera_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("pair response missing camera_id")
}

/// Fetch a device bearer token for a paired camera via check_pair.
pub async fn device_token(server: &TestServer, pairing_token: &str) -> String {
    let (status, body) = json_request(
        &server.router,
        "GET",
        &format!("/cameras/{pairing_token}/check_pair"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "check_pair failed: {body}");

    body.get("access_token")
        .and_then(|v| v.as_str())
        .expect("check_pair response missing access_token")
        .to_string()
}

/// Produce real encoded JPEG bytes of the given dimensions.
pub fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}
