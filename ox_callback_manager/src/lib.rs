//! ox_callback_manager - named callbacks referenced from form schema data
//!
//! Schemas stay plain data: a rule names a callback by id and the host
//! registers the implementation here before mounting a form.

pub mod registry;

pub use registry::{
    AsyncCalculateFn, CalculateFn, Callback, CallbackError, CallbackId, CallbackRegistry, CallbackResult,
    CustomFn, FormHandle,
};
