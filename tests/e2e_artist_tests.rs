//! End-to-end tests for artist endpoints
//!
//! Tests listing, search, pagination, slugs, admin writes and cascading deletes.

mod common;

use common::{
    data_of, TestClient, TestServer, ADMIN_ID, ARTIST_1_ID, ARTIST_1_NAME, ARTIST_1_SLUG,
    ARTIST_2_ID, ARTIST_2_NAME, ARTIST_2_SLUG, ARTIST_3_ID, SONG_2_ID, SONG_3_ID,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_list_artists_unpaged() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.list_artists("").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["meta"], json!({ "unpaged": true, "totalCount": 3 }));
}

#[tokio::test]
async fn test_list_artists_paged() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client
        .list_artists("page=1&pageSize=2")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["meta"],
        json!({
            "unpaged": false,
            "page": 1,
            "pageSize": 2,
            "totalCount": 3,
            "totalPages": 2
        })
    );

    let body: Value = client
        .list_artists("page=2&pageSize=2")
        .await
        .json()
        .await
        .unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], ARTIST_3_ID);
}

#[tokio::test]
async fn test_list_artists_rejects_bad_page_size() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.list_artists("page=1&pageSize=1000").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.list_artists("page=zero").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_ignores_case_and_diacritics() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client.list_artists("name=DEN").await.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], ARTIST_2_NAME);

    let body: Value = client
        .list_artists("name=s%C6%A1n%20t%C3%B9ng")
        .await
        .json()
        .await
        .unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], ARTIST_1_ID);
}

#[tokio::test]
async fn test_get_artist_by_id_and_slug() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let artist = data_of(client.get_artist(ARTIST_1_ID).await).await;
    assert_eq!(artist["name"], ARTIST_1_NAME);
    assert_eq!(artist["slug"], ARTIST_1_SLUG);
    assert_eq!(artist["normalizedName"], "son tung m tp");
    assert_eq!(artist["createdBy"], ADMIN_ID);

    let artist = data_of(client.get_artist_by_slug(ARTIST_2_SLUG).await).await;
    assert_eq!(artist["id"], ARTIST_2_ID);

    let response = client.get_artist(999).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "code": 404, "message": "Artist not found" }));
}

#[tokio::test]
async fn test_admin_creates_artist_with_unique_slug() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(server.base_url.clone()).await;

    let response = admin
        .create_artist(json!({ "name": "Đen  Vâu!", "bio": "Rapper" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let artist = data_of(response).await;

    let slug = artist["slug"].as_str().unwrap();
    let suffix = slug.strip_prefix("den-vau-").expect("slug is suffixed");
    assert_eq!(suffix.len(), 6);
    assert_eq!(artist["name"], "Đen  Vâu!");
    assert_eq!(artist["bio"], "Rapper");

    let fetched = data_of(admin.get_artist_by_slug(slug).await).await;
    assert_eq!(fetched["id"], artist["id"]);
}

#[tokio::test]
async fn test_artist_writes_require_admin() {
    let server = TestServer::spawn().await;
    let anonymous = TestClient::new(server.base_url.clone());
    let user = TestClient::authenticated(server.base_url.clone()).await;

    let response = anonymous.create_artist(json!({ "name": "Nobody" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = user.create_artist(json!({ "name": "Nobody" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = user
        .update_artist(ARTIST_1_ID, json!({ "bio": "x" }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = user.delete_artist(ARTIST_1_ID).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_artist_rejects_blank_name() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(server.base_url.clone()).await;

    let response = admin.create_artist(json!({ "name": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_regenerates_slug() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(server.base_url.clone()).await;

    let response = admin
        .update_artist(ARTIST_1_ID, json!({ "name": "Sếp Tùng" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let artist = data_of(response).await;
    assert_eq!(artist["slug"], "sep-tung");
    assert_eq!(artist["normalizedName"], "sep tung");

    let response = admin.get_artist_by_slug(ARTIST_1_SLUG).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = admin
        .update_artist(999, json!({ "bio": "ghost" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_artist_removes_its_credits() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(server.base_url.clone()).await;

    let credits = server.catalog_store.get_artist_songs(ARTIST_2_ID).unwrap();
    assert_eq!(credits.len(), 2);

    let response = admin.delete_artist(ARTIST_2_ID).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = admin.get_artist(ARTIST_2_ID).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    for credit in credits {
        assert!(server
            .catalog_store
            .get_song_artist(credit.id)
            .unwrap()
            .is_none());
    }

    // Songs survive, without the deleted artist
    let song = data_of(admin.get_song(SONG_2_ID).await).await;
    assert_eq!(song["artistId"], Value::Null);
    let artists = song["artists"].as_array().unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0]["artistId"], ARTIST_3_ID);

    let song = data_of(admin.get_song(SONG_3_ID).await).await;
    assert!(song["artists"].as_array().unwrap().is_empty());

    let response = admin.delete_artist(ARTIST_2_ID).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_delete_artists() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(server.base_url.clone()).await;

    let response = admin.delete_artists("1,3,999").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(data_of(response).await, json!({ "deleted": 2 }));

    let body: Value = admin.list_artists("").await.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], ARTIST_2_ID);
}

#[tokio::test]
async fn test_bulk_delete_rejects_malformed_ids() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(server.base_url.clone()).await;

    let response = admin.delete_artists("1,abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = admin.delete_artists("").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was deleted
    let body: Value = admin.list_artists("").await.json().await.unwrap();
    assert_eq!(body["meta"]["totalCount"], 3);
}

#[tokio::test]
async fn test_search_without_letters_or_digits_finds_nothing() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body: Value = client
        .list_artists("name=%21%21%21")
        .await
        .json()
        .await
        .unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"], json!({ "unpaged": true, "totalCount": 0 }));

    let body: Value = client.list_artists("name=%20%20").await.json().await.unwrap();
    assert_eq!(body["meta"]["totalCount"], 3);
}
