//! Wire types for the HTTP boundary.

use serde::{Deserialize, Serialize};

use crate::bot::SendStatus;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ── Bot lifecycle ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CreateBotRequest {
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub min_delay_ms: Option<u64>,
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
    #[serde(default)]
    pub headless: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBotResponse {
    pub bot_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BotStatusResponse {
    pub bot_id: String,
    pub login_state: String,
    pub is_logged_in: bool,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub send: SendStatus,
}

// ── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// One of: `already_logged_in`, `waiting_for_code`,
    /// `login_successful`, `login_not_verified`.
    pub status: String,
}

// ── Bulk send ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SendRequest {
    /// Message text; falls back to the persisted template when omitted.
    #[serde(default)]
    pub message: Option<String>,
    /// Explicit target handles.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Raw CSV content to harvest handles from.
    #[serde(default)]
    pub contacts_csv: Option<String>,
    /// Group to scan for a mention list…
    #[serde(default)]
    pub group_name: Option<String>,
    /// …keyed by this message prefix.
    #[serde(default)]
    pub message_prefix: Option<String>,
    /// Also include the persisted contact book.
    #[serde(default)]
    pub include_saved_contacts: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendStartResponse {
    pub status: String,
    pub total: usize,
}

// ── Contacts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AddContactsRequest {
    pub handles: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub total: usize,
}
