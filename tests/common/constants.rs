//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When fixture data changes (user credentials, catalog ids, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user, registered through the public flow (user id 2)
pub const TEST_USER_NAME: &str = "Test User";
pub const TEST_USER_EMAIL: &str = "user@songbook.test";
pub const TEST_PASS: &str = "testpass123";
pub const TEST_USER_ID: i64 = 2;

/// Administrator created at startup (user id 1)
pub const ADMIN_NAME: &str = "Test Admin";
pub const ADMIN_EMAIL: &str = "admin@songbook.test";
pub const ADMIN_PASS: &str = "adminpass123";
pub const ADMIN_ID: i64 = 1;

/// Secret used to sign tokens in tests
pub const TEST_JWT_SECRET: &str = "e2e-test-secret";

// ============================================================================
// Test Catalog
// ============================================================================

pub const ARTIST_1_ID: i64 = 1;
pub const ARTIST_1_NAME: &str = "Sơn Tùng M-TP";
pub const ARTIST_1_SLUG: &str = "son-tung-m-tp";

pub const ARTIST_2_ID: i64 = 2;
pub const ARTIST_2_NAME: &str = "Đen Vâu";
pub const ARTIST_2_SLUG: &str = "den-vau";

pub const ARTIST_3_ID: i64 = 3;
pub const ARTIST_3_NAME: &str = "Hà Anh Tuấn";

/// Credited to artist 1 as singer_composer
pub const SONG_1_ID: i64 = 1;
pub const SONG_1_TITLE: &str = "Nơi Này Có Anh";
pub const SONG_1_SLUG: &str = "noi-nay-co-anh";

/// Credited to artist 2 as singer and artist 3 as composer
pub const SONG_2_ID: i64 = 2;
pub const SONG_2_TITLE: &str = "Mang Tiền Về Cho Mẹ";

/// Credited to artist 2 as singer
pub const SONG_3_ID: i64 = 3;
pub const SONG_3_TITLE: &str = "Đi Về Nhà";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
