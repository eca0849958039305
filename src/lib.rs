pub use ox_callback_manager::{Callback, CallbackError, CallbackRegistry, FormHandle};
pub use ox_crud::{CrudConfig, CrudContainer, CrudProvider, FetchRequest, History, MemoryHistory, Notifier, Permissions, SyncOutcome};
pub use ox_forms::{FormEngine, FormError, FormSchema, FormSession, RenderNode, TypeRegistry};
pub use ox_forms_std_renderers::{register_standard_renderers, standard_registry};
pub use ox_type_converter::{ValueType, TypeConverter, ConversionRegistry, CONVERSION_REGISTRY};

pub mod forms {
    pub use ox_forms::*;
}

pub mod crud {
    pub use ox_crud::*;
}
