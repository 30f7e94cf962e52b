//! E2E tests for posts, extraction, views and privacy gating

mod common;

use common::TestServer;
use serde_json::json;

async fn create_post(server: &TestServer, token: &str, description: &str) -> serde_json::Value {
    let response = server
        .client
        .post(server.url("/api/post/"))
        .bearer_auth(token)
        .json(&json!({ "description": description }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201, "post creation should succeed");
    response.json().await.unwrap()
}

#[tokio::test]
async fn create_post_extracts_tags_and_mentions() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let (bob_id, _bob_token) = server.register_and_activate("bob").await;

    let post = create_post(
        &server,
        &alice_token,
        "hello #world shoutout to @bob and @nosuchuser #rust",
    )
    .await;

    let tags = post["tags"]["items"].as_array().unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags.contains(&json!("world")));
    assert!(tags.contains(&json!("rust")));

    // Only mentions of existing accounts become marks.
    let marks = post["marks"]["items"].as_array().unwrap();
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0]["user_id"], bob_id.as_str());
    assert_eq!(marks[0]["username"], "bob");
}

#[tokio::test]
async fn repeated_tags_reuse_one_row() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;

    create_post(&server, &alice_token, "first #shared").await;
    let second = create_post(&server, &alice_token, "second #shared").await;

    let tags = second["tags"]["items"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0], "shared");
}

#[tokio::test]
async fn detail_fetch_increments_views() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let post = create_post(&server, &alice_token, "counted").await;
    let post_id = post["id"].as_str().unwrap();

    let mut last_views = 0;
    for _ in 0..3 {
        let response = server
            .client
            .get(server.url(&format!("/api/post/{}/", post_id)))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        last_views = body["views"].as_i64().unwrap();
    }
    assert_eq!(last_views, 3);
}

#[tokio::test]
async fn post_updates_are_owner_only() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let (_bob_id, bob_token) = server.register_and_activate("bob").await;
    let post = create_post(&server, &alice_token, "original").await;
    let post_id = post["id"].as_str().unwrap();

    let response = server
        .client
        .put(server.url(&format!("/api/post/{}/", post_id)))
        .bearer_auth(&bob_token)
        .json(&json!({ "description": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .put(server.url(&format!("/api/post/{}/", post_id)))
        .bearer_auth(&alice_token)
        .json(&json!({ "description": "edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["description"], "edited");
}

#[tokio::test]
async fn deleted_post_is_hidden_everywhere() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register_and_activate("alice").await;
    let post = create_post(&server, &alice_token, "ephemeral").await;
    let post_id = post["id"].as_str().unwrap();

    let response = server
        .client
        .delete(server.url(&format!("/api/post/{}/", post_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = server
        .client
        .get(server.url(&format!("/api/post/{}/", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = server
        .client
        .get(server.url(&format!("/api/post/user/{}/", alice_id)))
        .send()
        .await
        .unwrap();
    let posts: serde_json::Value = response.json().await.unwrap();
    assert!(posts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn like_toggle_roundtrip() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let (_bob_id, bob_token) = server.register_and_activate("bob").await;
    let post = create_post(&server, &alice_token, "likeable").await;
    let post_id = post["id"].as_str().unwrap();

    let response = server
        .client
        .post(server.url(&format!("/api/post/{}/like/", post_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["like"]["username"], "bob");

    // Detail reflects the like for the liker.
    let response = server
        .client
        .get(server.url(&format!("/api/post/{}/", post_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["is_liked"], true);
    assert_eq!(body["likes"]["total"], 1);

    // Second toggle removes the like.
    let response = server
        .client
        .post(server.url(&format!("/api/post/{}/like/", post_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unliked");

    let response = server
        .client
        .get(server.url(&format!("/api/post/{}/", post_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["is_liked"], false);
    assert_eq!(body["likes"]["total"], 0);
}

#[tokio::test]
async fn owners_may_like_their_own_posts() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    let post = create_post(&server, &alice_token, "self-five").await;
    let post_id = post["id"].as_str().unwrap();

    let response = server
        .client
        .post(server.url(&format!("/api/post/{}/like/", post_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn search_filters_descriptions() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;
    create_post(&server, &alice_token, "rust is great").await;
    create_post(&server, &alice_token, "python is fine").await;

    let response = server
        .client
        .get(server.url("/api/post/?q=rust"))
        .send()
        .await
        .unwrap();
    let posts: serde_json::Value = response.json().await.unwrap();
    assert_eq!(posts.as_array().unwrap().len(), 1);
    assert_eq!(posts[0]["description"], "rust is great");
}

#[tokio::test]
async fn private_account_hides_engagement_from_others() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register_and_activate("alice").await;
    let (_bob_id, bob_token) = server.register_and_activate("bob").await;

    let post = create_post(&server, &alice_token, "secret life #hidden").await;
    let post_id = post["id"].as_str().unwrap();

    // Bob likes the post while the account is still public.
    server
        .client
        .post(server.url(&format!("/api/post/{}/like/", post_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();

    // Alice goes private.
    server
        .client
        .patch(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&alice_token)
        .json(&json!({ "is_private": true }))
        .send()
        .await
        .unwrap();

    // Other viewers get the placeholder instead of engagement blocks.
    let response = server
        .client
        .get(server.url(&format!("/api/post/{}/", post_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["likes"]["message"], "This account is private");
    assert_eq!(body["tags"]["message"], "This account is private");
    assert_eq!(body["comments"]["message"], "This account is private");
    assert!(body["likes"]["total"].is_null());

    // Anonymous viewers too.
    let response = server
        .client
        .get(server.url(&format!("/api/post/{}/", post_id)))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["likes"]["message"], "This account is private");

    // The owner still sees the full blocks.
    let response = server
        .client
        .get(server.url(&format!("/api/post/{}/", post_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["likes"]["total"], 1);
    assert_eq!(body["tags"]["items"][0], "hidden");
}

#[tokio::test]
async fn long_descriptions_are_truncated_in_profile_summaries() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register_and_activate("alice").await;

    let long = "x".repeat(80);
    create_post(&server, &alice_token, &long).await;

    let response = server
        .client
        .get(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .send()
        .await
        .unwrap();
    let profile: serde_json::Value = response.json().await.unwrap();
    let summary = profile["posts"][0]["description"].as_str().unwrap();
    assert_eq!(summary.len(), 33);
}
