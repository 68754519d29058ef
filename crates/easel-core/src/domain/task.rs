use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::EngineError;
use super::ids::TaskId;
use super::state::TaskStatus;

/// Bounds on the request payload, in characters.
pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 4..=32;
pub const PROMPT_LEN: std::ops::RangeInclusive<usize> = 8..=256;

/// A generation task: the persisted document.
///
/// Field names and status strings are the storage contract. `status` and
/// `info` have no setters; they only change through
/// [`TaskStore::compare_and_update_status`](crate::ports::TaskStore::compare_and_update_status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    task_id: TaskId,
    username: String,
    prompt: String,
    status: TaskStatus,
    #[serde(default)]
    info: String,
    created_at: DateTime<Utc>,
}

impl Task {
    /// A freshly created task in `waiting` with empty `info`.
    pub fn new(task_id: TaskId, request: GenerateRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            task_id,
            username: request.username,
            prompt: request.prompt,
            status: TaskStatus::Waiting,
            info: String::new(),
            created_at,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Store-side write of a guarded transition.
    ///
    /// Callers mirror a status write that already succeeded: store
    /// implementations under their own atomicity guarantee, and the worker
    /// after a winning claim.
    pub(crate) fn apply_status(&mut self, status: TaskStatus, info: impl Into<String>) {
        self.status = status;
        self.info = info.into();
    }
}

/// Intake payload for a new task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub username: String,
    pub prompt: String,
}

impl GenerateRequest {
    pub fn new(username: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            prompt: prompt.into(),
        }
    }

    /// Check length bounds; nothing is trimmed or rewritten.
    pub fn validate(&self) -> Result<(), EngineError> {
        check_len("username", &self.username, &USERNAME_LEN)?;
        check_len("prompt", &self.prompt, &PROMPT_LEN)?;
        Ok(())
    }
}

fn check_len(
    field: &str,
    value: &str,
    bounds: &std::ops::RangeInclusive<usize>,
) -> Result<(), EngineError> {
    let len = value.chars().count();
    if bounds.contains(&len) {
        Ok(())
    } else {
        Err(EngineError::InvalidRequest(format!(
            "{field} must be {}..={} characters, got {len}",
            bounds.start(),
            bounds.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use ulid::Ulid;

    fn sample() -> Task {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Task::new(
            TaskId::from_ulid(Ulid::new()),
            GenerateRequest::new("alice123", "a sunset over mountains"),
            created_at,
        )
    }

    #[test]
    fn test_new_task_is_waiting_with_empty_info() {
        let task = sample();
        assert_eq!(task.status(), TaskStatus::Waiting);
        assert_eq!(task.info(), "");
        assert_eq!(task.username(), "alice123");
        assert_eq!(task.prompt(), "a sunset over mountains");
    }

    #[test]
    fn test_document_uses_storage_field_names() {
        let task = sample();
        let v = serde_json::to_value(&task).unwrap();
        let obj = v.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["created_at", "info", "prompt", "status", "task_id", "username"]
        );
        assert_eq!(v["status"], "waiting");
        assert_eq!(v["task_id"], task.task_id().to_string());
    }

    #[test]
    fn test_document_without_info_loads_with_empty_info() {
        let task = sample();
        let mut v = serde_json::to_value(&task).unwrap();
        v.as_object_mut().unwrap().remove("info");
        let back: Task = serde_json::from_value(v).unwrap();
        assert_eq!(back.info(), "");
    }

    #[rstest]
    #[case::minimal("abcd", "12345678")]
    #[case::maximal(&"u".repeat(32), &"p".repeat(256))]
    #[case::multibyte("ユーザー名", "夕焼けの山々と湖の風景")]
    fn test_accepts_requests_within_bounds(#[case] username: &str, #[case] prompt: &str) {
        assert!(GenerateRequest::new(username, prompt).validate().is_ok());
    }

    #[rstest]
    #[case::short_username("abc", "a sunset over mountains", "username")]
    #[case::long_username(&"u".repeat(33), "a sunset over mountains", "username")]
    #[case::short_prompt("alice123", "sunset", "prompt")]
    #[case::long_prompt("alice123", &"p".repeat(257), "prompt")]
    fn test_rejects_requests_out_of_bounds(
        #[case] username: &str,
        #[case] prompt: &str,
        #[case] field: &str,
    ) {
        let err = GenerateRequest::new(username, prompt).validate().unwrap_err();
        assert!(matches!(&err, EngineError::InvalidRequest(msg) if msg.starts_with(field)));
    }
}
