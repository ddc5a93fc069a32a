//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for the songbook-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows and public routes.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Keeps the access_token cookie set on login
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as the regular test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(TEST_USER_EMAIL, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    /// Creates a client logged in as the administrator
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated_admin(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(ADMIN_EMAIL, ADMIN_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Admin authentication failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    /// POST /login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /register
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/register"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /refresh
    pub async fn refresh(&self, refresh_token: &str) -> Response {
        self.client
            .post(self.url("/refresh"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .expect("Refresh request failed")
    }

    /// GET /logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(self.url("/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /api/user/{id} with an explicit bearer token
    pub async fn get_user_with_token(&self, id: i64, token: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/user/{}", id)))
            .bearer_auth(token)
            .send()
            .await
            .expect("Get user request failed")
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// GET /api/user
    pub async fn list_users(&self) -> Response {
        self.client
            .get(self.url("/api/user"))
            .send()
            .await
            .expect("List users request failed")
    }

    /// GET /api/user/{id}
    pub async fn get_user(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/api/user/{}", id)))
            .send()
            .await
            .expect("Get user request failed")
    }

    /// POST /api/user
    pub async fn create_user(&self, body: Value) -> Response {
        self.client
            .post(self.url("/api/user"))
            .json(&body)
            .send()
            .await
            .expect("Create user request failed")
    }

    /// PATCH /api/user/{id}
    pub async fn update_user(&self, id: i64, body: Value) -> Response {
        self.client
            .patch(self.url(&format!("/api/user/{}", id)))
            .json(&body)
            .send()
            .await
            .expect("Update user request failed")
    }

    /// DELETE /api/user/{id}
    pub async fn delete_user(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/api/user/{}", id)))
            .send()
            .await
            .expect("Delete user request failed")
    }

    // ========================================================================
    // Artist Endpoints
    // ========================================================================

    /// GET /api/artist?{query}
    pub async fn list_artists(&self, query: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/artist?{}", query)))
            .send()
            .await
            .expect("List artists request failed")
    }

    /// GET /api/artist/{id}
    pub async fn get_artist(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/api/artist/{}", id)))
            .send()
            .await
            .expect("Get artist request failed")
    }

    /// GET /api/artist/slug/{slug}
    pub async fn get_artist_by_slug(&self, slug: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/artist/slug/{}", slug)))
            .send()
            .await
            .expect("Get artist by slug request failed")
    }

    /// POST /api/artist
    pub async fn create_artist(&self, body: Value) -> Response {
        self.client
            .post(self.url("/api/artist"))
            .json(&body)
            .send()
            .await
            .expect("Create artist request failed")
    }

    /// PATCH /api/artist/{id}
    pub async fn update_artist(&self, id: i64, body: Value) -> Response {
        self.client
            .patch(self.url(&format!("/api/artist/{}", id)))
            .json(&body)
            .send()
            .await
            .expect("Update artist request failed")
    }

    /// DELETE /api/artist/{id}
    pub async fn delete_artist(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/api/artist/{}", id)))
            .send()
            .await
            .expect("Delete artist request failed")
    }

    /// DELETE /api/artist?ids={ids}
    pub async fn delete_artists(&self, ids: &str) -> Response {
        self.client
            .delete(self.url(&format!("/api/artist?ids={}", ids)))
            .send()
            .await
            .expect("Bulk delete artists request failed")
    }

    // ========================================================================
    // Song Endpoints
    // ========================================================================

    /// GET /api/song?{query}
    pub async fn list_songs(&self, query: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/song?{}", query)))
            .send()
            .await
            .expect("List songs request failed")
    }

    /// GET /api/song/{id}
    pub async fn get_song(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/api/song/{}", id)))
            .send()
            .await
            .expect("Get song request failed")
    }

    /// GET /api/song/slug/{slug}
    pub async fn get_song_by_slug(&self, slug: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/song/slug/{}", slug)))
            .send()
            .await
            .expect("Get song by slug request failed")
    }

    /// POST /api/song
    pub async fn create_song(&self, body: Value) -> Response {
        self.client
            .post(self.url("/api/song"))
            .json(&body)
            .send()
            .await
            .expect("Create song request failed")
    }

    /// PATCH /api/song/{id}
    pub async fn update_song(&self, id: i64, body: Value) -> Response {
        self.client
            .patch(self.url(&format!("/api/song/{}", id)))
            .json(&body)
            .send()
            .await
            .expect("Update song request failed")
    }

    /// DELETE /api/song/{id}
    pub async fn delete_song(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/api/song/{}", id)))
            .send()
            .await
            .expect("Delete song request failed")
    }

    /// DELETE /api/song?ids={ids}
    pub async fn delete_songs(&self, ids: &str) -> Response {
        self.client
            .delete(self.url(&format!("/api/song?ids={}", ids)))
            .send()
            .await
            .expect("Bulk delete songs request failed")
    }

    /// POST /api/song/{id}/view
    pub async fn view_song(&self, id: i64) -> Response {
        self.client
            .post(self.url(&format!("/api/song/{}/view", id)))
            .send()
            .await
            .expect("View song request failed")
    }

    /// POST /api/song/{id}/react
    pub async fn react_to_song(&self, id: i64, kind: &str) -> Response {
        self.client
            .post(self.url(&format!("/api/song/{}/react", id)))
            .json(&json!({ "kind": kind }))
            .send()
            .await
            .expect("React request failed")
    }
}

/// Reads the `data` field of a success envelope.
pub async fn data_of(response: Response) -> Value {
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(body["code"], 200, "Unexpected envelope: {}", body);
    body["data"].clone()
}
