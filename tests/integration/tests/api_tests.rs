//! API Integration Tests
//!
//! Run the full router against the in-memory like store and a stub image
//! service. No external services are needed.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use std::collections::HashMap;

use integration_tests::{
    assert_json, assert_status, fixtures::*, TestServer, FAILING_DESCRIPTION,
};
use reqwest::StatusCode;

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert!(response.headers().contains_key("x-request-id"));
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["checks"]["backend"], "memory");
}

// ============================================================================
// Toggle Tests
// ============================================================================

#[tokio::test]
async fn test_like_seen_by_other_user() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    let alice = unique_user("alice");
    let bob = unique_user("bob");

    let liked = server.toggle(&image, &alice).await.unwrap();
    assert!(liked.success);
    assert!(liked.liked);
    assert_eq!(liked.count, 1);

    let statuses = server.poll(&[&image], &bob).await.unwrap();
    assert_eq!(statuses[&image], StatusReply::new(false, 1));

    let statuses = server.poll(&[&image], &alice).await.unwrap();
    assert_eq!(statuses[&image], StatusReply::new(true, 1));
}

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    let carol = unique_user("carol");

    server.toggle(&image, &unique_user("dave")).await.unwrap();
    let before = server.poll(&[&image], &carol).await.unwrap()[&image];

    let first = server.toggle(&image, &carol).await.unwrap();
    assert_eq!((first.liked, first.count), (true, before.count + 1));

    let second = server.toggle(&image, &carol).await.unwrap();
    assert_eq!(StatusReply::new(second.liked, second.count), before);
}

#[tokio::test]
async fn test_toggle_missing_fields() {
    let server = TestServer::start().await.unwrap();

    for body in [
        ToggleRequest {
            image_id: Some(unique_image()),
            user_name: None,
        },
        ToggleRequest {
            image_id: None,
            user_name: Some("alice".to_string()),
        },
        ToggleRequest::new("img1", "   "),
    ] {
        let response = server.post("/likes", &body).await.unwrap();
        let error: ErrorReply = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
        assert!(!error.success);
        assert_eq!(error.error, "Missing required fields");
        assert_eq!(error.code, "MISSING_FIELDS");
    }
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .client
        .post(format!("{}/likes", server.base_url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    let error: ErrorReply = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error.code, "INVALID_BODY");
}

#[tokio::test]
async fn test_concurrent_likes_from_different_users() {
    let server = std::sync::Arc::new(TestServer::start().await.unwrap());
    let image = unique_image();

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let server = server.clone();
            let image = image.clone();
            tokio::spawn(async move { server.toggle(&image, &format!("user{i}")).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().unwrap().liked);
    }

    let statuses = server.poll(&[&image], "observer").await.unwrap();
    assert_eq!(statuses[&image], StatusReply::new(false, 20));
}

#[tokio::test]
async fn test_concurrent_toggles_same_user_never_negative() {
    let server = std::sync::Arc::new(TestServer::start().await.unwrap());
    let image = unique_image();
    let user = unique_user("eve");

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let server = server.clone();
            let image = image.clone();
            let user = user.clone();
            tokio::spawn(async move { server.toggle(&image, &user).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // An even number of toggles leaves the like removed
    let statuses = server.poll(&[&image], &user).await.unwrap();
    assert_eq!(statuses[&image], StatusReply::new(false, 0));
}

// ============================================================================
// Batch Status Tests
// ============================================================================

#[tokio::test]
async fn test_empty_batch_returns_empty_map() {
    let server = TestServer::start().await.unwrap();

    for path in ["/likes?ids=&userName=bob", "/likes?userName=bob", "/likes?ids=,,"] {
        let response = server.get(path).await.unwrap();
        let body: HashMap<String, StatusReply> = assert_json(response, StatusCode::OK).await.unwrap();
        assert!(body.is_empty(), "{path} returned {body:?}");
    }
}

#[tokio::test]
async fn test_batch_is_idempotent_and_complete() {
    let server = TestServer::start().await.unwrap();
    let liked = unique_image();
    let untouched = unique_image();
    server.toggle(&liked, "frank").await.unwrap();

    let path = format!("/likes?ids={liked},%20{untouched},{liked}&userName=frank");
    let first: HashMap<String, StatusReply> =
        assert_json(server.get(&path).await.unwrap(), StatusCode::OK).await.unwrap();
    let second: HashMap<String, StatusReply> =
        assert_json(server.get(&path).await.unwrap(), StatusCode::OK).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[&liked], StatusReply::new(true, 1));
    assert_eq!(first[&untouched], StatusReply::new(false, 0));
}

#[tokio::test]
async fn test_anonymous_batch_serves_counts() {
    let server = TestServer::start().await.unwrap();
    let liked = unique_image();
    let untouched = unique_image();
    server.toggle(&liked, "grace").await.unwrap();
    server.toggle(&liked, "heidi").await.unwrap();

    for path in [
        format!("/likes?ids={liked},{untouched}"),
        format!("/likes/poll?ids={liked},{untouched}&userName="),
    ] {
        let body: HashMap<String, StatusReply> =
            assert_json(server.get(&path).await.unwrap(), StatusCode::OK).await.unwrap();
        assert_eq!(body[&liked], StatusReply::new(false, 2), "{path}");
        assert_eq!(body[&untouched], StatusReply::new(false, 0), "{path}");
    }
}

#[tokio::test]
async fn test_batch_rejects_too_many_ids() {
    let server = TestServer::start().await.unwrap();
    let ids: Vec<String> = (0..101).map(|i| format!("img{i}")).collect();
    let response = server
        .get(&format!("/likes?ids={}&userName=bob", ids.join(",")))
        .await
        .unwrap();
    let error: ErrorReply = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error.code, "TOO_MANY_IDS");
}

#[tokio::test]
async fn test_poll_is_not_cached() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .get(&format!("/likes/poll?ids={}&userName=bob", unique_image()))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_like_users_lists_likers() {
    let server = TestServer::start().await.unwrap();
    let image = unique_image();
    server.toggle(&image, "gina").await.unwrap();
    server.toggle(&image, "hank").await.unwrap();

    let response = server
        .get(&format!("/likes/{image}/users?userName=gina"))
        .await
        .unwrap();
    let state: LikeStateReply = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(state.image_id, image);
    assert_eq!(state.count, 2);
    assert_eq!(state.liked, Some(true));

    let mut likers = state.liked_by;
    likers.sort();
    assert_eq!(likers, vec!["gina".to_string(), "hank".to_string()]);
}

// ============================================================================
// Image Tests
// ============================================================================

#[tokio::test]
async fn test_list_images_proxies_image_service() {
    let seed = (0..8).map(|i| sample_image(&format!("seed{i}"), "ivy")).collect();
    let server = TestServer::start_with_images(seed).await.unwrap();

    let response = server.get("/images?page=2&limit=3").await.unwrap();
    let page: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    let ids: Vec<&str> = page["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["seed3", "seed4", "seed5"]);
    assert_eq!(page["pagination"]["total_items"], 8);
}

#[tokio::test]
async fn test_gallery_merges_like_status() {
    let seed = vec![sample_image("g1", "ivy"), sample_image("g2", "ivy")];
    let server = TestServer::start_with_images(seed).await.unwrap();
    server.toggle("g2", "jack").await.unwrap();
    server.toggle("g2", "kate").await.unwrap();

    let response = server.get("/gallery?userName=jack").await.unwrap();
    let gallery: GalleryReply = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(gallery.images.len(), 2);
    assert_eq!(gallery.images[0].id, "g1");
    assert_eq!(gallery.images[0].likes, StatusReply::new(false, 0));
    assert_eq!(gallery.images[1].likes, StatusReply::new(true, 2));

    // Anonymous viewers still see counts
    let response = server.get("/gallery").await.unwrap();
    let gallery: GalleryReply = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(gallery.images[1].likes, StatusReply::new(false, 2));
}

#[tokio::test]
async fn test_upload_defaults_description_to_file_stem() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .upload(
            "sunset.beach.png",
            "image/png",
            png_bytes(),
            &serde_json::json!({"uploadedBy": "liam"}),
        )
        .await
        .unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["success"], true);

    let newest = server.images.newest().unwrap();
    assert_eq!(newest.description, "sunset");
    assert_eq!(newest.uploaded_by, "liam");
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .upload(
            "notes.txt",
            "text/plain",
            b"hello".to_vec(),
            &serde_json::json!({"uploadedBy": "mia"}),
        )
        .await
        .unwrap();
    let error: ErrorReply = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error.error, "Only image files are allowed");
    assert!(server.images.is_empty());
}

#[tokio::test]
async fn test_upload_requires_uploader() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .upload("cat.png", "image/png", png_bytes(), &serde_json::json!({}))
        .await
        .unwrap();
    let error: ErrorReply = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error.code, "MISSING_FIELDS");
}

#[tokio::test]
async fn test_upstream_upload_failure_is_surfaced() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .upload(
            "cat.png",
            "image/png",
            png_bytes(),
            &serde_json::json!({"uploadedBy": "noah", "description": FAILING_DESCRIPTION}),
        )
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 546);
    let error: ErrorReply = response.json().await.unwrap();
    assert_eq!(error.error, "Image processing failed");
    assert_eq!(error.code, "UPLOAD_REJECTED");
}

#[tokio::test]
async fn test_delete_image_cascades_likes() {
    let server = TestServer::start_with_images(vec![sample_image("doomed", "olga")])
        .await
        .unwrap();
    server.toggle("doomed", "olga").await.unwrap();
    server.toggle("doomed", "pete").await.unwrap();

    let response = server.delete("/images/doomed").await.unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["removedLikes"], 2);
    assert!(!server.images.contains("doomed"));

    let statuses = server.poll(&["doomed"], "olga").await.unwrap();
    assert_eq!(statuses["doomed"], StatusReply::new(false, 0));
}

#[tokio::test]
async fn test_delete_unknown_image() {
    let server = TestServer::start().await.unwrap();
    let response = server.delete("/images/ghost").await.unwrap();
    let error: ErrorReply = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();
    assert_eq!(error.code, "UNKNOWN_IMAGE");
}
