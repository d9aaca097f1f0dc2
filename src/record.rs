//! The persisted conversation record and its content fingerprint

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// Bytes of the SHA-256 digest kept in a record id (hex doubles it).
const ID_BYTES: usize = 16;

/// One classified message event, as stored in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_line: Option<u64>,
}

impl Record {
    /// Build a record, deriving its id from the identity fields.
    pub fn new(session_id: &str, timestamp: &str, role: &str, text: &str) -> Self {
        Self {
            id: make_record_id(session_id, timestamp, role, text),
            session_id: session_id.to_string(),
            timestamp: timestamp.to_string(),
            role: role.to_string(),
            text: text.to_string(),
            source_file: None,
            source_line: None,
        }
    }

    pub fn with_source(mut self, file: impl Into<String>, line: u64) -> Self {
        self.source_file = Some(file.into());
        self.source_line = Some(line);
        self
    }

    /// The id a persisted line stands for.
    ///
    /// Lines written before ids were stored carry only the identity fields;
    /// for those the id is recomputed when all four are present.
    pub fn effective_id(&self) -> Option<String> {
        let id = self.id.trim();
        if !id.is_empty() {
            return Some(id.to_string());
        }

        let complete = !self.session_id.is_empty()
            && !self.timestamp.is_empty()
            && !self.role.is_empty()
            && !self.text.is_empty();
        complete.then(|| make_record_id(&self.session_id, &self.timestamp, &self.role, &self.text))
    }

    pub fn role_bucket(&self) -> RoleBucket {
        RoleBucket::classify(&self.role)
    }
}

/// Content-addressed id: first 16 bytes of SHA-256 over the identity fields.
pub fn make_record_id(session_id: &str, timestamp: &str, role: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(timestamp.as_bytes());
    hasher.update(b"\n");
    hasher.update(role.as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..ID_BYTES])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleBucket {
    User,
    Assistant,
    Other,
}

impl RoleBucket {
    pub fn classify(role: &str) -> Self {
        let role = role.trim();
        if role.eq_ignore_ascii_case(ROLE_USER) {
            RoleBucket::User
        } else if role.eq_ignore_ascii_case(ROLE_ASSISTANT) {
            RoleBucket::Assistant
        } else {
            RoleBucket::Other
        }
    }
}

/// Role-bucketed message counts, shared by global and per-session stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCounts {
    pub total: usize,
    pub user: usize,
    pub assistant: usize,
    pub other: usize,
}

impl RoleCounts {
    pub fn add(&mut self, bucket: RoleBucket) {
        self.total += 1;
        match bucket {
            RoleBucket::User => self.user += 1,
            RoleBucket::Assistant => self.assistant += 1,
            RoleBucket::Other => self.other += 1,
        }
    }
}
