//! HTTP service — authenticated blog generation over axum.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, ServerConfig)          │
//! └──────────┘ <─────── │    └─ api.rs  (route handlers, AppState)         │
//!                       │         │                                        │
//!                       │         ├─ auth.rs        bearer tokens, argon2  │
//!                       │         ├─ rate_limit.rs  sliding windows        │
//!                       │         │                                        │
//!                       │         │ BlogGenerator::generate()              │
//!                       │         v                                        │
//!                       │  crate::pipeline  (transcriber → writer)         │
//!                       │         │                                        │
//!                       │         v                                        │
//!                       │  db.rs  (SQLite: users, posts, generation_runs)  │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Typical Request Flow (`POST /api/generate`)
//!
//! 1. `auth::CurrentUser` resolves the bearer token to a user row.
//! 2. The per-user rate limit is checked (429 when a window trips).
//! 3. The URL is validated and the video ID extracted.
//! 4. A `generation_runs` row is inserted with status `running`.
//! 5. The pipeline runs transcriber then writer; failure marks the run
//!    `failed` and maps to an HTTP error, success persists the post and
//!    marks the run `completed`.

pub mod api;
pub mod auth;
pub mod db;
pub mod models;
pub mod rate_limit;
pub mod server;
