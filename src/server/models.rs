use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Public user view. The password hash never leaves the db layer in this
/// shape; `BlogDb` maps rows into it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Internal row including credentials, for authentication only.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub user_id: i64,
    pub youtube_url: String,
    pub video_id: String,
    pub title: String,
    pub content: String,
    pub word_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid run status: {}", s)),
        }
    }
}

/// One pipeline execution. Kept even when generation fails so the history of
/// attempts per user is inspectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRun {
    pub id: i64,
    pub user_id: i64,
    pub post_id: Option<i64>,
    pub video_id: String,
    pub language: String,
    pub status: RunStatus,
    pub error: Option<String>,
    pub transcript_chars: Option<i64>,
    pub article_chars: Option<i64>,
    pub started_at: String,
    pub completed_at: Option<String>,
}

// API view types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostList {
    pub posts: Vec<BlogPost>,
    pub total: i64,
}
