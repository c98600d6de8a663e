use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 512;
pub const MAX_VALUE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvOperation {
    Get { key: String },
    GetMany { keys: Vec<String> },
    Set { key: String, value: String },
    Delete { key: String },
    Clear,
}

impl KvOperation {
    fn keys(&self) -> Vec<&str> {
        match self {
            KvOperation::Get { key } | KvOperation::Set { key, .. } | KvOperation::Delete { key } => {
                vec![key.as_str()]
            }
            KvOperation::GetMany { keys } => keys.iter().map(String::as_str).collect(),
            KvOperation::Clear => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvOutput {
    Value(Option<String>),
    Values(Vec<Option<String>>),
    Written,
    Deleted { existed: bool },
    Cleared,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("storage error: {message} (code: {code:?})")]
    Storage {
        code: StorageErrorCode,
        message: String,
    },

    #[error("unexpected output for {operation}")]
    UnexpectedOutput { operation: String },
}

impl KvError {
    pub fn storage(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageErrorCode {
    Unknown,
    Corrupted,
    DiskFull,
    PermissionDenied,
    Busy,
    IoError,
}

pub type KvResult = Result<KvOutput, KvError>;

impl Operation for KvOperation {
    type Output = KvResult;
}

/// Key-value capability. Every operation resolves to a [`KvResult`] that the
/// caller maps into an event.
pub struct KeyValue<Ev> {
    context: CapabilityContext<KvOperation, Ev>,
}

impl<Ev> Capability<Ev> for KeyValue<Ev> {
    type Operation = KvOperation;
    type MappedSelf<MappedEv> = KeyValue<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        KeyValue::new(self.context.map_event(f))
    }
}

impl<Ev> KeyValue<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<KvOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.request(KvOperation::Get { key: key.into() }, make_event);
    }

    /// Values come back in key order.
    pub fn get_many<F>(&self, keys: Vec<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.request(KvOperation::GetMany { keys }, make_event);
    }

    pub fn set<F>(&self, key: impl Into<String>, value: String, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let operation = KvOperation::Set {
            key: key.into(),
            value,
        };
        self.request(operation, make_event);
    }

    pub fn delete<F>(&self, key: impl Into<String>, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.request(KvOperation::Delete { key: key.into() }, make_event);
    }

    /// Wipes every key, not just ours.
    pub fn clear<F>(&self, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        self.request(KvOperation::Clear, make_event);
    }

    fn request<F>(&self, operation: KvOperation, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(operation).await;
            ctx.update_app(make_event(result));
        });
    }
}

pub(crate) fn validate_key(key: &str) -> Result<(), KvError> {
    let invalid = |reason: &str| KvError::InvalidKey {
        key: key.chars().take(50).collect(),
        reason: reason.to_string(),
    };

    if key.trim().is_empty() {
        return Err(invalid("key cannot be empty"));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(invalid("key exceeds maximum length"));
    }
    if key.chars().any(char::is_control) {
        return Err(invalid("key contains control characters"));
    }
    Ok(())
}

/// String-to-string persistence, shaped like browser `localStorage`.
pub trait KvStorage {
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError>;
    /// Returns whether the key existed.
    fn delete(&mut self, key: &str) -> Result<bool, KvError>;
    fn clear(&mut self) -> Result<(), KvError>;
}

/// Runs one operation against a backend.
pub fn execute<S: KvStorage + ?Sized>(storage: &mut S, operation: &KvOperation) -> KvResult {
    for key in operation.keys() {
        validate_key(key)?;
    }

    match operation {
        KvOperation::Get { key } => storage.get(key).map(KvOutput::Value),
        KvOperation::GetMany { keys } => keys
            .iter()
            .map(|key| storage.get(key))
            .collect::<Result<Vec<_>, _>>()
            .map(KvOutput::Values),
        KvOperation::Set { key, value } => {
            if value.len() > MAX_VALUE_SIZE {
                return Err(KvError::ValueTooLarge {
                    size: value.len(),
                    max: MAX_VALUE_SIZE,
                });
            }
            storage.set(key, value).map(|()| KvOutput::Written)
        }
        KvOperation::Delete { key } => storage
            .delete(key)
            .map(|existed| KvOutput::Deleted { existed }),
        KvOperation::Clear => storage.clear().map(|()| KvOutput::Cleared),
    }
}

/// In-process backend. Used by tests and by shells without durable storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Makes every write fail, for exercising the error path.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn check_writable(&self) -> Result<(), KvError> {
        if self.fail_writes {
            return Err(KvError::storage(StorageErrorCode::DiskFull, "injected write failure"));
        }
        Ok(())
    }
}

impl KvStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.check_writable()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, KvError> {
        self.check_writable()?;
        Ok(self.entries.remove(key).is_some())
    }

    fn clear(&mut self) -> Result<(), KvError> {
        self.check_writable()?;
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation_empty() {
        let result = validate_key("");
        assert!(matches!(result, Err(KvError::InvalidKey { .. })));
        assert!(validate_key("   ").is_err());
    }

    #[test]
    fn test_key_validation_control_chars() {
        assert!(validate_key("key\x01value").is_err());
        assert!(validate_key("key\0value").is_err());
    }

    #[test]
    fn test_key_validation_too_long() {
        assert!(validate_key(&"a".repeat(MAX_KEY_LENGTH + 1)).is_err());
        assert!(validate_key("prodigyAppState").is_ok());
    }

    #[test]
    fn test_set_overwrites_unconditionally() {
        let mut storage = MemoryStorage::new();
        execute(&mut storage, &KvOperation::Set { key: "k".into(), value: "1".into() }).unwrap();
        execute(&mut storage, &KvOperation::Set { key: "k".into(), value: "2".into() }).unwrap();
        assert_eq!(
            execute(&mut storage, &KvOperation::Get { key: "k".into() }),
            Ok(KvOutput::Value(Some("2".into())))
        );
    }

    #[test]
    fn test_get_many_preserves_order() {
        let mut storage = MemoryStorage::new().with_entry("b", "B");
        let out = execute(
            &mut storage,
            &KvOperation::GetMany {
                keys: vec!["a".into(), "b".into()],
            },
        );
        assert_eq!(out, Ok(KvOutput::Values(vec![None, Some("B".into())])));
    }

    #[test]
    fn test_delete_reports_existence() {
        let mut storage = MemoryStorage::new().with_entry("k", "v");
        let op = KvOperation::Delete { key: "k".into() };
        assert_eq!(execute(&mut storage, &op), Ok(KvOutput::Deleted { existed: true }));
        assert_eq!(execute(&mut storage, &op), Ok(KvOutput::Deleted { existed: false }));
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut storage = MemoryStorage::new().with_entry("a", "1").with_entry("b", "2");
        assert_eq!(execute(&mut storage, &KvOperation::Clear), Ok(KvOutput::Cleared));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_value_size_limit() {
        let mut storage = MemoryStorage::new();
        let op = KvOperation::Set {
            key: "k".into(),
            value: "x".repeat(MAX_VALUE_SIZE + 1),
        };
        assert!(matches!(execute(&mut storage, &op), Err(KvError::ValueTooLarge { .. })));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_injected_write_failure() {
        let mut storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let op = KvOperation::Set { key: "k".into(), value: "v".into() };
        assert!(matches!(
            execute(&mut storage, &op),
            Err(KvError::Storage { code: StorageErrorCode::DiskFull, .. })
        ));
    }
}
