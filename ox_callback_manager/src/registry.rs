use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

/// Identifier a schema uses to reference a callback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallbackId(pub String);

impl CallbackId {
    pub fn new(name: &str) -> Self {
        CallbackId(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallbackId {
    fn from(s: &str) -> Self {
        CallbackId::new(s)
    }
}

/// Represents an error returned by a callback.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback failed: {}", self.message)
    }
}

impl std::error::Error for CallbackError {}

/// The result type for a custom callback.
/// On success, it can optionally return a message (`Ok(Some(String))`).
pub type CallbackResult = Result<Option<String>, CallbackError>;

/// Write access to a form, handed to custom callbacks.
pub trait FormHandle {
    fn get_value(&self, name: &str) -> Option<Value>;
    fn set_value(&mut self, name: &str, value: Value);
    fn set_error(&mut self, name: &str, message: String);
}

/// Computes a value from the current form values.
pub type CalculateFn = Arc<dyn Fn(&Map<String, Value>) -> Result<Value, CallbackError> + Send + Sync>;

/// Computes a value asynchronously (remote lookups, option loading).
pub type AsyncCalculateFn =
    Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value, CallbackError>> + Send + Sync>;

/// Arbitrary side effect: `(form, values, field_name)`.
pub type CustomFn =
    Arc<dyn Fn(&mut dyn FormHandle, &Map<String, Value>, &str) -> CallbackResult + Send + Sync>;

#[derive(Clone)]
pub enum Callback {
    Calculate(CalculateFn),
    AsyncCalculate(AsyncCalculateFn),
    Custom(CustomFn),
}

impl Callback {
    pub fn kind(&self) -> &'static str {
        match self {
            Callback::Calculate(_) => "calculate",
            Callback::AsyncCalculate(_) => "async_calculate",
            Callback::Custom(_) => "custom",
        }
    }

    /// Run a value-producing callback, awaiting it when asynchronous.
    /// Custom callbacks produce no value and are rejected.
    pub async fn compute(&self, values: &Map<String, Value>) -> Result<Value, CallbackError> {
        match self {
            Callback::Calculate(f) => f(values),
            Callback::AsyncCalculate(f) => f(values.clone()).await,
            Callback::Custom(_) => Err(CallbackError::new("custom callbacks do not produce a value")),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback::{}", self.kind())
    }
}

/// Registry of callbacks, scoped to whoever builds it (one per app or per container).
#[derive(Default, Clone)]
pub struct CallbackRegistry {
    callbacks: HashMap<CallbackId, Callback>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    /// Registers a callback, replacing any previous one with the same id.
    pub fn register(&mut self, id: CallbackId, callback: Callback) {
        if self.callbacks.insert(id.clone(), callback).is_some() {
            log::debug!("Replaced callback '{}'", id.as_str());
        }
    }

    pub fn register_calculation<F>(&mut self, id: &str, f: F)
    where
        F: Fn(&Map<String, Value>) -> Result<Value, CallbackError> + Send + Sync + 'static,
    {
        self.register(CallbackId::new(id), Callback::Calculate(Arc::new(f)));
    }

    pub fn register_async_calculation<F>(&mut self, id: &str, f: F)
    where
        F: Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value, CallbackError>> + Send + Sync + 'static,
    {
        self.register(CallbackId::new(id), Callback::AsyncCalculate(Arc::new(f)));
    }

    pub fn register_custom<F>(&mut self, id: &str, f: F)
    where
        F: Fn(&mut dyn FormHandle, &Map<String, Value>, &str) -> CallbackResult + Send + Sync + 'static,
    {
        self.register(CallbackId::new(id), Callback::Custom(Arc::new(f)));
    }

    pub fn get(&self, id: &str) -> Option<&Callback> {
        self.callbacks.get(&CallbackId::new(id))
    }

    /// Checks if a callback is registered under the given id.
    pub fn has_callback(&self, id: &str) -> bool {
        self.callbacks.contains_key(&CallbackId::new(id))
    }

    /// Returns all registered ids, sorted.
    pub fn registered_ids(&self) -> Vec<CallbackId> {
        let mut ids: Vec<CallbackId> = self.callbacks.keys().cloned().collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids
    }
}
