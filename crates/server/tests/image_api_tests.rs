//! Integration tests for image ingestion, retrieval, and deletion.

mod common;

use axum::http::StatusCode;
use common::fixtures::{
    device_token, json_request, multipart_upload, pair_camera, provision_camera, raw_request,
    register_and_login, test_jpeg,
};
use common::server::TestServer;
use darkroom_core::artifact::ImageVariant;
use darkroom_metadata::repos::{CameraRepo, ImageRepo, OwnershipRepo};
use darkroom_storage::ObjectStore;
use uuid::Uuid;

/// Register a user, provision and pair a camera, and mint its device token.
async fn paired_setup(server: &TestServer, email: &str, pairing_token: &str) -> (String, String) {
    provision_camera(server, pairing_token).await;
    let user = register_and_login(server, email).await;
    pair_camera(server, &user, pairing_token, "Test Cam").await;
    let device = device_token(server, pairing_token).await;
    (user, device)
}

/// Upload a JPEG and return the new image id.
async fn upload_jpeg(server: &TestServer, device: &str, data: &[u8]) -> Uuid {
    let (status, body) = multipart_upload(
        &server.router,
        "/images",
        "image",
        "image/jpeg",
        data,
        Some(device),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {body}");
    body.get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("upload response missing id")
}

#[tokio::test]
async fn test_upload_creates_row_and_both_artifacts() {
    let server = TestServer::new().await;
    let (user, device) = paired_setup(&server, "alice@example.com", "pt-up").await;

    let original = test_jpeg(320, 240);
    let image_id = upload_jpeg(&server, &device, &original).await;

    // The row is there with the placeholder classification.
    let row = server
        .metadata()
        .get_image(image_id)
        .await
        .unwrap()
        .expect("image row missing");
    assert_eq!(row.classification, "placeholder");

    // Both artifacts exist under the derived name.
    for variant in [ImageVariant::Full, ImageVariant::Thumbnail] {
        assert!(
            server
                .storage()
                .exists(&variant.key(&row.file_name))
                .await
                .unwrap(),
            "{variant} artifact missing"
        );
    }

    // The full artifact round-trips byte-for-byte.
    let (status, body) = raw_request(
        &server.router,
        "GET",
        &format!("/images/{image_id}/full"),
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), original.as_slice());

    // The thumbnail decodes as a bounded JPEG.
    let (status, thumb) = raw_request(
        &server.router,
        "GET",
        &format!("/images/{image_id}/thumbnail"),
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let decoded = image::load_from_memory(&thumb).expect("thumbnail must decode");
    assert!(decoded.width() <= 128 && decoded.height() <= 128);
}

#[tokio::test]
async fn test_rapid_uploads_get_distinct_names() {
    let server = TestServer::new().await;
    let (user, device) = paired_setup(&server, "alice@example.com", "pt-rapid").await;

    // Several uploads land within the same second; the per-second name gets
    // its disambiguator suffix and nothing is overwritten.
    let data = test_jpeg(64, 64);
    for _ in 0..3 {
        upload_jpeg(&server, &device, &data).await;
    }

    let (status, body) = json_request(&server.router, "GET", "/images/data", None, Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.get("images").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(3)
    );
}

#[tokio::test]
async fn test_upload_rejects_wrong_kind_and_missing_tokens() {
    let server = TestServer::new().await;
    let (user, _device) = paired_setup(&server, "alice@example.com", "pt-kinds").await;
    let data = test_jpeg(32, 32);

    let (status, _) =
        multipart_upload(&server.router, "/images", "image", "image/jpeg", &data, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A user token on the device-only endpoint fails closed.
    let (status, _) = multipart_upload(
        &server.router,
        "/images",
        "image",
        "image/jpeg",
        &data,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let server = TestServer::new().await;
    let (_user, device) = paired_setup(&server, "alice@example.com", "pt-notimg").await;

    // Wrong declared media type.
    let (status, _) = multipart_upload(
        &server.router,
        "/images",
        "image",
        "text/plain",
        b"hello",
        Some(&device),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Right media type, bytes that do not decode.
    let (status, _) = multipart_upload(
        &server.router,
        "/images",
        "image",
        "image/jpeg",
        b"not actually a jpeg",
        Some(&device),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No image part at all.
    let (status, _) = multipart_upload(
        &server.router,
        "/images",
        "attachment",
        "image/jpeg",
        &test_jpeg(16, 16),
        Some(&device),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was recorded for the device's camera.
    let camera_id = server
        .metadata()
        .get_camera_by_pairing_token("pt-notimg")
        .await
        .unwrap()
        .unwrap()
        .camera_id;
    assert!(
        server
            .metadata()
            .images_for_camera(camera_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_listing_contract() {
    let server = TestServer::new().await;
    let user = register_and_login(&server, "alice@example.com").await;

    // Zero paired cameras: 404.
    let (status, _) = json_request(&server.router, "GET", "/images/data", None, Some(&user)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Cameras but no images: 204.
    provision_camera(&server, "pt-list").await;
    pair_camera(&server, &user, "pt-list", "Cam").await;
    let (status, _) = json_request(&server.router, "GET", "/images/data", None, Some(&user)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // At least one image: 200 with a non-empty list carrying the camera name.
    let device = device_token(&server, "pt-list").await;
    upload_jpeg(&server, &device, &test_jpeg(48, 48)).await;

    let (status, body) = json_request(&server.router, "GET", "/images/data", None, Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    let images = body.get("images").and_then(|v| v.as_array()).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(
        images[0].get("camera_name").and_then(|v| v.as_str()),
        Some("Cam")
    );
    assert_eq!(
        images[0].get("classification").and_then(|v| v.as_str()),
        Some("placeholder")
    );
}

#[tokio::test]
async fn test_camera_scoped_listing() {
    let server = TestServer::new().await;
    let (user, device) = paired_setup(&server, "alice@example.com", "pt-cam-list").await;
    let camera_id = server
        .metadata()
        .get_camera_by_pairing_token("pt-cam-list")
        .await
        .unwrap()
        .unwrap()
        .camera_id;

    let (status, _) = json_request(
        &server.router,
        "GET",
        &format!("/cameras/{camera_id}/images/data"),
        None,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    upload_jpeg(&server, &device, &test_jpeg(48, 48)).await;
    let (status, body) = json_request(
        &server.router,
        "GET",
        &format!("/cameras/{camera_id}/images/data"),
        None,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.get("images").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(1)
    );

    // Someone else's camera answers like a missing one.
    let outsider = register_and_login(&server, "outsider@example.com").await;
    let (status, _) = json_request(
        &server.router,
        "GET",
        &format!("/cameras/{camera_id}/images/data"),
        None,
        Some(&outsider),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(
        &server.router,
        "GET",
        &format!("/cameras/{}/images/data", Uuid::new_v4()),
        None,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_classification_listing() {
    let server = TestServer::new().await;
    let (user, device) = paired_setup(&server, "alice@example.com", "pt-class").await;
    upload_jpeg(&server, &device, &test_jpeg(48, 48)).await;

    let (status, body) = json_request(
        &server.router,
        "GET",
        "/class/placeholder/images/data",
        None,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.get("images").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(1)
    );

    // A label with no matches is an empty success, not an error.
    let (status, _) = json_request(
        &server.router,
        "GET",
        "/class/bird/images/data",
        None,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // No cameras at all stays a 404.
    let lurker = register_and_login(&server, "lurker@example.com").await;
    let (status, _) = json_request(
        &server.router,
        "GET",
        "/class/placeholder/images/data",
        None,
        Some(&lurker),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cross_user_isolation() {
    let server = TestServer::new().await;
    let (_owner, device) = paired_setup(&server, "alice@example.com", "pt-iso-a").await;
    let image_id = upload_jpeg(&server, &device, &test_jpeg(64, 64)).await;

    // User B has their own paired camera; still sees nothing of A's image.
    provision_camera(&server, "pt-iso-b").await;
    let intruder = register_and_login(&server, "mallory@example.com").await;
    pair_camera(&server, &intruder, "pt-iso-b", "Their Cam").await;

    for uri in [
        format!("/images/{image_id}/full"),
        format!("/images/{image_id}/thumbnail"),
    ] {
        let (status, _) = raw_request(&server.router, "GET", &uri, Some(&intruder)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "leaked via {uri}");
    }

    let (status, _) = json_request(
        &server.router,
        "DELETE",
        &format!("/images/{image_id}"),
        None,
        Some(&intruder),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The image is untouched.
    assert!(server.metadata().get_image(image_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_removes_row_and_artifacts() {
    let server = TestServer::new().await;
    let (user, device) = paired_setup(&server, "alice@example.com", "pt-del").await;
    let image_id = upload_jpeg(&server, &device, &test_jpeg(64, 64)).await;

    let file_name = server
        .metadata()
        .get_image(image_id)
        .await
        .unwrap()
        .unwrap()
        .file_name;

    let (status, _) = json_request(
        &server.router,
        "DELETE",
        &format!("/images/{image_id}"),
        None,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Row gone, both artifacts gone, listings empty, re-delete is a 404.
    assert!(server.metadata().get_image(image_id).await.unwrap().is_none());
    for variant in [ImageVariant::Full, ImageVariant::Thumbnail] {
        assert!(!server.storage().exists(&variant.key(&file_name)).await.unwrap());
    }

    let (status, _) = json_request(&server.router, "GET", "/images/data", None, Some(&user)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = json_request(
        &server.router,
        "DELETE",
        &format!("/images/{image_id}"),
        None,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_recovers_dangling_row() {
    let server = TestServer::new().await;
    let (user, device) = paired_setup(&server, "alice@example.com", "pt-dangle").await;
    let image_id = upload_jpeg(&server, &device, &test_jpeg(64, 64)).await;

    // Simulate a crash after file deletion but before the row went: the
    // artifacts vanish out from under the row.
    let file_name = server
        .metadata()
        .get_image(image_id)
        .await
        .unwrap()
        .unwrap()
        .file_name;
    for variant in [ImageVariant::Full, ImageVariant::Thumbnail] {
        server.storage().delete(&variant.key(&file_name)).await.unwrap();
    }

    // The dangling row is still deletable.
    let (status, _) = json_request(
        &server.router,
        "DELETE",
        &format!("/images/{image_id}"),
        None,
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(server.metadata().get_image(image_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_artifact_is_surfaced_not_hidden() {
    let server = TestServer::new().await;
    let (user, device) = paired_setup(&server, "alice@example.com", "pt-fault").await;
    let image_id = upload_jpeg(&server, &device, &test_jpeg(64, 64)).await;

    let file_name = server
        .metadata()
        .get_image(image_id)
        .await
        .unwrap()
        .unwrap()
        .file_name;
    server
        .storage()
        .delete(&ImageVariant::Full.key(&file_name))
        .await
        .unwrap();

    // An owned row whose artifact is gone is an integrity fault (500), not a
    // not-found.
    let (status, _) = raw_request(
        &server.router,
        "GET",
        &format!("/images/{image_id}/full"),
        Some(&user),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_device_token_rejected_on_retrieval_endpoints() {
    let server = TestServer::new().await;
    let (_user, device) = paired_setup(&server, "alice@example.com", "pt-total").await;
    let image_id = upload_jpeg(&server, &device, &test_jpeg(32, 32)).await;

    // Wrong-kind rejection is total: the uploading device itself cannot read
    // or delete through user endpoints.
    let endpoints = [
        ("GET", format!("/images/{image_id}/full")),
        ("GET", format!("/images/{image_id}/thumbnail")),
        ("GET", "/images/data".to_string()),
        ("DELETE", format!("/images/{image_id}")),
    ];
    for (method, uri) in endpoints {
        let (status, _) = json_request(&server.router, method, &uri, None, Some(&device)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}
