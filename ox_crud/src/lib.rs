//! Headless CRUD table container built on `ox_forms`.

pub mod columns;
pub mod config;
pub mod container;
pub mod error;
pub mod history;
pub mod notify;
pub mod permissions;
pub mod provider;
pub mod query;
pub mod response;

pub use columns::{columns_from_schema, RowAction, TableColumn, ACTIONS_COLUMN};
pub use config::{CrudConfig, CrudMessages, CrudMode};
pub use container::{CrudContainer, CrudViewState, Editor, EditorMode, MountFlag, SyncOutcome};
pub use error::CrudError;
pub use history::{History, MemoryHistory};
pub use notify::{LogNotifier, Notifier, ToastLevel};
pub use permissions::{CrudAction, PermissionCheck, Permissions};
pub use provider::{CrudProvider, FetchRequest, Navigator};
pub use query::{build_query, decode_filter_value, encode_filter_value, parse_query, Pagination, PaginationParse, ParsedQuery};
pub use response::{normalize_response, NormalizedResponse, PageMeta};
