pub mod autosave;
pub mod binding;
pub mod condition;
pub mod error;
pub mod evaluator;
pub mod list;
pub mod loader;
pub mod path;
pub mod registry;
pub mod render;
pub mod schema;
pub mod session;
pub mod state;
pub mod traits;
pub mod validation;
pub mod wizard;

pub use autosave::{AutoSave, AutoSaveSink};
pub use binding::{initial_values, template_item, typed_values, Binder, RecordBinder};
pub use condition::{evaluate_condition, evaluate_conditions};
pub use error::FormError;
pub use evaluator::{DependencyEvaluator, FieldOutcome};
pub use loader::{load_from_path, load_schema_from_path, load_type_mappings_from_path};
pub use registry::*;
pub use render::*;
pub use schema::*;
pub use session::FormSession;
pub use state::*;
pub use traits::*;
pub use validation::{ValidationError, Validator};
pub use wizard::WizardState;
