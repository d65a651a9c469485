//! # Stoa Journal: Request/Response DTOs
//!
//! API contract types for the local HTTP surface.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - All validation is expressed via `validator` derive macros
//! - Serde defaults are used for optional fields with known defaults

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::chat::ChatMessage;
use crate::models::journal::{JournalEntry, Mood};

// ============================================================================
// Common
// ============================================================================

/// Standard success message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/signup
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
}

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// ============================================================================
// Journal
// ============================================================================

/// POST /api/entries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 20000, message = "Content must be 1-20000 characters"))]
    pub content: String,

    /// Default: "neutral"
    #[serde(default)]
    pub mood: Mood,

    /// Short title of a catalog prompt, or free text used as both titles.
    #[validate(length(min = 1, max = 500))]
    pub prompt: Option<String>,

    /// Upload to remote storage after the local insert. Default: true
    #[serde(default = "default_true")]
    pub sync: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CreateEntryResponse {
    pub entry: JournalEntry,
    /// Whether the remote upload succeeded. Always false when `sync` was off.
    pub synced: bool,
}

/// POST /api/entries/sync?limit=
#[derive(Debug, Deserialize, Validate)]
pub struct SyncQuery {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub count: usize,
    pub entries: Vec<JournalEntry>,
}

// ============================================================================
// Chat
// ============================================================================

/// POST /api/chat
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub philosopher: String,
    pub reply: ChatMessage,
}

// ============================================================================
// Catalogs & onboarding
// ============================================================================

/// GET /api/philosophers/quote?name=
#[derive(Debug, Deserialize)]
pub struct PhilosopherQuoteQuery {
    /// Default: the selected philosopher from preferences
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhilosopherQuoteResponse {
    pub philosopher: String,
    pub quote: String,
}

/// POST /api/onboarding
#[derive(Debug, Deserialize, Validate)]
pub struct OnboardingRequest {
    /// "stoic", "analytical", or anything else
    #[serde(rename = "trait")]
    #[validate(length(min = 1, max = 50))]
    pub personality: String,
}
