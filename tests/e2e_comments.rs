//! E2E tests for comments and comment likes

mod common;

use common::TestServer;
use serde_json::json;

async fn setup_post(server: &TestServer, token: &str) -> String {
    let response = server
        .client
        .post(server.url("/api/post/"))
        .bearer_auth(token)
        .json(&json!({ "description": "commentable" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let post: serde_json::Value = response.json().await.unwrap();
    post["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn comment_create_and_list() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let (_bob_id, bob_token) = server.register_and_activate("bob").await;
    let post_id = setup_post(&server, &alice_token).await;

    let response = server
        .client
        .post(server.url(&format!("/api/post/{}/comment/", post_id)))
        .bearer_auth(&bob_token)
        .json(&json!({ "body": "nice one" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let comment: serde_json::Value = response.json().await.unwrap();
    assert_eq!(comment["body"], "nice one");
    assert_eq!(comment["post_id"], post_id.as_str());

    let response = server
        .client
        .get(server.url(&format!("/api/post/{}/comment/", post_id)))
        .send()
        .await
        .unwrap();
    let comments: serde_json::Value = response.json().await.unwrap();
    assert_eq!(comments.as_array().unwrap().len(), 1);
    assert_eq!(comments[0]["username"], "bob");
}

#[tokio::test]
async fn commenting_on_unknown_post_fails() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;

    let response = server
        .client
        .post(server.url("/api/post/01UNKNOWNPOSTID0000000000X/comment/"))
        .bearer_auth(&alice_token)
        .json(&json!({ "body": "into the void" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn anonymous_comment_is_unauthorized() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let post_id = setup_post(&server, &alice_token).await;

    let response = server
        .client
        .post(server.url(&format!("/api/post/{}/comment/", post_id)))
        .json(&json!({ "body": "drive-by" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn comment_search_across_posts() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let post_id = setup_post(&server, &alice_token).await;

    for body in ["loved the lighting", "where was this taken?"] {
        server
            .client
            .post(server.url(&format!("/api/post/{}/comment/", post_id)))
            .bearer_auth(&alice_token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .unwrap();
    }

    let response = server
        .client
        .get(server.url("/api/post/comment/?q=lighting"))
        .send()
        .await
        .unwrap();
    let comments: serde_json::Value = response.json().await.unwrap();
    assert_eq!(comments.as_array().unwrap().len(), 1);
    assert_eq!(comments[0]["body"], "loved the lighting");
}

#[tokio::test]
async fn comment_edits_are_author_only() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let (_bob_id, bob_token) = server.register_and_activate("bob").await;
    let post_id = setup_post(&server, &alice_token).await;

    let response = server
        .client
        .post(server.url(&format!("/api/post/{}/comment/", post_id)))
        .bearer_auth(&bob_token)
        .json(&json!({ "body": "original" }))
        .send()
        .await
        .unwrap();
    let comment: serde_json::Value = response.json().await.unwrap();
    let comment_id = comment["id"].as_str().unwrap();

    // The post owner is not the comment author.
    let response = server
        .client
        .put(server.url(&format!("/api/post/comment/{}/", comment_id)))
        .bearer_auth(&alice_token)
        .json(&json!({ "body": "overwritten" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .put(server.url(&format!("/api/post/comment/{}/", comment_id)))
        .bearer_auth(&bob_token)
        .json(&json!({ "body": "edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["body"], "edited");
}

#[tokio::test]
async fn deleted_comment_disappears_from_listings() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let post_id = setup_post(&server, &alice_token).await;

    let response = server
        .client
        .post(server.url(&format!("/api/post/{}/comment/", post_id)))
        .bearer_auth(&alice_token)
        .json(&json!({ "body": "fleeting" }))
        .send()
        .await
        .unwrap();
    let comment: serde_json::Value = response.json().await.unwrap();
    let comment_id = comment["id"].as_str().unwrap();

    let response = server
        .client
        .delete(server.url(&format!("/api/post/comment/{}/", comment_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = server
        .client
        .get(server.url(&format!("/api/post/{}/comment/", post_id)))
        .send()
        .await
        .unwrap();
    let comments: serde_json::Value = response.json().await.unwrap();
    assert!(comments.as_array().unwrap().is_empty());

    let response = server
        .client
        .get(server.url(&format!("/api/post/comment/{}/", comment_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn comment_like_toggle() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let (_bob_id, bob_token) = server.register_and_activate("bob").await;
    let post_id = setup_post(&server, &alice_token).await;

    let response = server
        .client
        .post(server.url(&format!("/api/post/{}/comment/", post_id)))
        .bearer_auth(&alice_token)
        .json(&json!({ "body": "likeable comment" }))
        .send()
        .await
        .unwrap();
    let comment: serde_json::Value = response.json().await.unwrap();
    let comment_id = comment["id"].as_str().unwrap();

    let response = server
        .client
        .post(server.url(&format!("/api/post/comment/{}/like/", comment_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = server
        .client
        .get(server.url(&format!("/api/post/comment/{}/", comment_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["is_liked"], true);
    assert_eq!(body["likes"]["total"], 1);

    let response = server
        .client
        .post(server.url(&format!("/api/post/comment/{}/like/", comment_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unliked");
}
