use std::sync::Mutex;

/// An opaque bearer value issued by the backend.
///
/// The value is never logged; `Debug` redacts it and only exposes the length.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value suitable for the Authorization header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(len={})", self.0.len())
    }
}

/// Holds the current credential across requests.
///
/// The coordinator only ever writes from within a single-flight gate's owning
/// execution or the terminal clearing step, so implementations need interior
/// mutability but no coordination beyond it.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Credential);
    fn clear(&self);
}

/// Process-local store; persistence across launches belongs to the embedder.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.slot.lock().expect("credential slot poisoned").clone()
    }

    fn set(&self, credential: Credential) {
        *self.slot.lock().expect("credential slot poisoned") = Some(credential);
    }

    fn clear(&self) {
        *self.slot.lock().expect("credential slot poisoned") = None;
    }
}
