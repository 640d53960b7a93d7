use std::collections::VecDeque;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use uuid::Uuid;

use crate::optimization::focus::OptimizationFocus;

// ────────────────────────────────────────────────────────────────────────────
// Credentials
// ────────────────────────────────────────────────────────────────────────────

/// The two per-session secrets. Never serialized; `Debug` is redacted by `secrecy`.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    groq_api_key: Option<SecretString>,
    hf_token: Option<SecretString>,
}

impl SessionCredentials {
    pub fn set_groq_api_key(&mut self, key: SecretString) {
        self.groq_api_key = non_blank(key);
    }

    pub fn set_hf_token(&mut self, token: SecretString) {
        self.hf_token = non_blank(token);
    }

    pub fn has_groq_api_key(&self) -> bool {
        self.groq_api_key.is_some()
    }

    pub fn has_hf_token(&self) -> bool {
        self.hf_token.is_some()
    }

    /// Both secrets, only when both are present.
    pub fn ready(&self) -> Option<(&SecretString, &SecretString)> {
        match (&self.groq_api_key, &self.hf_token) {
            (Some(groq), Some(hf)) => Some((groq, hf)),
            _ => None,
        }
    }
}

fn non_blank(secret: SecretString) -> Option<SecretString> {
    if secret.expose_secret().trim().is_empty() {
        None
    } else {
        Some(secret)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Uploaded resume
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UploadedResume {
    pub file_name: String,
    pub bytes: Bytes,
    pub uploaded_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// History
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub focus: OptimizationFocus,
    pub job_title: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn assistant(content: String, focus: OptimizationFocus, job_title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content,
            focus,
            job_title,
            created_at: Utc::now(),
        }
    }
}

/// Append-only history capped at `limit` entries; the oldest entry is
/// evicted once the cap is reached.
#[derive(Debug)]
pub struct SessionHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl SessionHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Appends `entry`, returning the evicted entry if the cap was hit.
    pub fn push(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        let evicted = if self.entries.len() >= self.limit {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session state machine
// ────────────────────────────────────────────────────────────────────────────

/// idle → awaiting_inputs → processing → displaying_result → idle,
/// with `failed` as the error state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    AwaitingInputs,
    Processing,
    DisplayingResult,
    Failed { message: String },
}

/// Everything the single user of this instance has supplied. Lives only in memory.
#[derive(Debug)]
pub struct Session {
    pub phase: SessionPhase,
    pub credentials: SessionCredentials,
    pub resume: Option<UploadedResume>,
    pub history: SessionHistory,
    /// Bumped on every reset, so a run can tell the session it started in has ended.
    epoch: u64,
}

impl Session {
    pub fn new(history_limit: usize) -> Self {
        Self {
            phase: SessionPhase::Idle,
            credentials: SessionCredentials::default(),
            resume: None,
            history: SessionHistory::new(history_limit),
            epoch: 0,
        }
    }

    /// Credentials or the resume changed.
    pub fn inputs_changed(&mut self) {
        self.phase = SessionPhase::AwaitingInputs;
    }

    /// The user has seen the latest result.
    pub fn acknowledge_result(&mut self) {
        if self.phase == SessionPhase::DisplayingResult {
            self.phase = SessionPhase::Idle;
        }
    }

    pub fn fail(&mut self, message: String) {
        self.phase = SessionPhase::Failed { message };
    }

    /// Ends the session: secrets, resume, and history are dropped.
    pub fn reset(&mut self) {
        self.credentials = SessionCredentials::default();
        self.resume = None;
        self.history.clear();
        self.phase = SessionPhase::Idle;
        self.epoch += 1;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
