//! E2E tests for profiles and the follow toggle

mod common;

use common::TestServer;
use serde_json::json;

#[tokio::test]
async fn profile_shows_counts_and_content() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register_and_activate("alice").await;
    let (_bob_id, bob_token) = server.register_and_activate("bob").await;

    // Alice posts, Bob follows Alice.
    let response = server
        .client
        .post(server.url("/api/post/"))
        .bearer_auth(&alice_token)
        .json(&json!({ "description": "first post #intro" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = server
        .client
        .post(server.url(&format!("/api/auth/{}/follow/", alice_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = server
        .client
        .get(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let profile: serde_json::Value = response.json().await.unwrap();
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["followers_count"], 1);
    assert_eq!(profile["following_count"], 0);
    assert_eq!(profile["posts"].as_array().unwrap().len(), 1);
    // Anonymous viewers get neither the follow flag nor personal counters.
    assert!(profile.get("is_following").is_none());
    assert!(profile.get("likes_given").is_none());

    // Bob sees whether he follows Alice.
    let response = server
        .client
        .get(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let profile: serde_json::Value = response.json().await.unwrap();
    assert_eq!(profile["is_following"], true);

    // Alice sees her own like counters instead of the follow flag.
    let response = server
        .client
        .get(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    let profile: serde_json::Value = response.json().await.unwrap();
    assert!(profile.get("is_following").is_none());
    assert_eq!(profile["likes_given"]["posts"], 0);
}

#[tokio::test]
async fn profile_updates_are_owner_only() {
    let server = TestServer::new().await;
    let (alice_id, _alice_token) = server.register_and_activate("alice").await;
    let (_bob_id, bob_token) = server.register_and_activate("bob").await;

    let response = server
        .client
        .put(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&bob_token)
        .json(&json!({ "first_name": "Intruder" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = server
        .client
        .delete(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn patch_updates_selected_fields() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register_and_activate("alice").await;

    let response = server
        .client
        .patch(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&alice_token)
        .json(&json!({ "first_name": "Alice", "is_private": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["first_name"], "Alice");
    assert_eq!(body["is_private"], true);
    // Untouched fields survive the patch.
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn updated_username_must_stay_unique() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register_and_activate("alice").await;
    server.register_and_activate("bob").await;

    let response = server
        .client
        .patch(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&alice_token)
        .json(&json!({ "username": "bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Re-submitting your own current username is not a conflict.
    let response = server
        .client
        .patch(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&alice_token)
        .json(&json!({ "username": "alice", "last_name": "A" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn deleted_profile_disappears_but_reserves_identifiers() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register_and_activate("alice").await;

    let response = server
        .client
        .delete(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // Profile and login are gone.
    let response = server
        .client
        .get(server.url(&format!("/api/auth/profile/{}/", alice_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = server
        .client
        .post(server.url("/api/auth/login/"))
        .json(&json!({ "identifier": "alice", "password": "s3cret-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // The username stays reserved by the soft-deleted row.
    let response = server
        .client
        .post(server.url("/api/auth/register/"))
        .json(&json!({
            "username": "alice",
            "email": "alice2@example.com",
            "phone_number": "+998199999999",
            "password": "s3cret-pass",
            "confirm_password": "s3cret-pass",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn follow_toggle_roundtrip() {
    let server = TestServer::new().await;
    let (alice_id, _alice_token) = server.register_and_activate("alice").await;
    let (bob_id, bob_token) = server.register_and_activate("bob").await;

    // First toggle creates the edge.
    let response = server
        .client
        .post(server.url(&format!("/api/auth/{}/follow/", alice_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["follow"]["follower_id"], bob_id.as_str());
    assert_eq!(body["follow"]["followed_username"], "alice");

    // Second toggle removes it.
    let response = server
        .client
        .post(server.url(&format!("/api/auth/{}/follow/", alice_id)))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unfollowed");

    // The pair of toggles leaves no edge behind.
    let response = server
        .client
        .get(server.url(&format!("/api/auth/followers/{}/", alice_id)))
        .send()
        .await
        .unwrap();
    let followers: serde_json::Value = response.json().await.unwrap();
    assert!(followers.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn self_follow_is_forbidden() {
    let server = TestServer::new().await;
    let (alice_id, alice_token) = server.register_and_activate("alice").await;

    let response = server
        .client
        .post(server.url(&format!("/api/auth/{}/follow/", alice_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn following_unknown_user_is_not_found() {
    let server = TestServer::new().await;
    let (_alice_id, alice_token) = server.register_and_activate("alice").await;

    let response = server
        .client
        .post(server.url("/api/auth/01UNKNOWNUSERID0000000000X/follow/"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn followers_and_following_listings() {
    let server = TestServer::new().await;
    let (alice_id, _alice_token) = server.register_and_activate("alice").await;
    let (bob_id, bob_token) = server.register_and_activate("bob").await;
    let (_carol_id, carol_token) = server.register_and_activate("carol").await;

    for token in [&bob_token, &carol_token] {
        server
            .client
            .post(server.url(&format!("/api/auth/{}/follow/", alice_id)))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
    }

    let response = server
        .client
        .get(server.url(&format!("/api/auth/followers/{}/", alice_id)))
        .send()
        .await
        .unwrap();
    let followers: serde_json::Value = response.json().await.unwrap();
    assert_eq!(followers.as_array().unwrap().len(), 2);

    let response = server
        .client
        .get(server.url(&format!("/api/auth/following/{}/", bob_id)))
        .send()
        .await
        .unwrap();
    let following: serde_json::Value = response.json().await.unwrap();
    assert_eq!(following.as_array().unwrap().len(), 1);
    assert_eq!(following[0]["followed_username"], "alice");
}
