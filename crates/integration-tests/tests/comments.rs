//! Integration tests for comment procedures: cursor pagination and
//! validation round-trips.
//!
//! Run with: cargo test -p summit-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use summit_integration_tests::{base_url, client, member_credential};

/// Create `count` comments on a fresh post slug and return the slug.
async fn seed_comments(http: &Client, credential: &str, count: usize) -> String {
    let slug = format!("pagination-test-{}", Uuid::new_v4());
    for i in 0..count {
        let resp = http
            .post(format!("{}/api/comments", base_url()))
            .bearer_auth(credential)
            .json(&serde_json::json!({ "post": slug, "content": format!("comment {i}") }))
            .send()
            .await
            .expect("Failed to create comment");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
    slug
}

#[tokio::test]
#[ignore = "Requires running server and test credentials"]
async fn test_cursor_pagination_boundary() {
    let http = client();
    let credential = member_credential();
    let slug = seed_comments(&http, &credential, 25).await;

    // First page: 20 items plus a cursor naming the 21st item.
    let first: Value = http
        .get(format!("{}/api/comments?post={slug}&limit=20", base_url()))
        .send()
        .await
        .expect("Failed to list comments")
        .json()
        .await
        .expect("listing should be JSON");

    let items = first["items"].as_array().expect("items array");
    assert_eq!(items.len(), 20);
    let cursor = first["nextCursor"].as_str().expect("first page needs a cursor");
    assert!(
        !items.iter().any(|item| item["id"] == cursor),
        "cursor item must not be on the first page"
    );

    // Second page: the remaining 5, no cursor, starting at the cursor item.
    let second: Value = http
        .get(format!(
            "{}/api/comments?post={slug}&limit=20&cursor={cursor}",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to list second page")
        .json()
        .await
        .expect("listing should be JSON");

    let items = second["items"].as_array().expect("items array");
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["id"], cursor);
    assert!(second.get("nextCursor").is_none());
}

#[tokio::test]
#[ignore = "Requires running server and test credentials"]
async fn test_oversized_update_is_rejected_without_mutation() {
    let http = client();
    let credential = member_credential();
    let slug = seed_comments(&http, &credential, 1).await;

    let listing: Value = http
        .get(format!("{}/api/comments?post={slug}", base_url()))
        .send()
        .await
        .expect("Failed to list comments")
        .json()
        .await
        .expect("listing should be JSON");
    let comment = &listing["items"][0];
    let id = comment["id"].as_str().expect("comment id");
    let original_content = comment["content"].clone();

    // Over the 2000-character bound: rejected with a field-level error.
    let resp = http
        .patch(format!("{}/api/comments/{id}", base_url()))
        .bearer_auth(&credential)
        .json(&serde_json::json!({ "content": "x".repeat(2001) }))
        .send()
        .await
        .expect("Failed to call update");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("rejection should be JSON");
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["fields"][0]["field"], "content");

    // Round-trip: the stored comment is unchanged.
    let after: Value = http
        .get(format!("{}/api/comments?post={slug}", base_url()))
        .send()
        .await
        .expect("Failed to re-list comments")
        .json()
        .await
        .expect("listing should be JSON");
    assert_eq!(after["items"][0]["content"], original_content);
}
