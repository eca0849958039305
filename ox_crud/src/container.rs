//! CRUD table container: URL-driven list state plus the create/edit/delete
//! workflow around a form session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use ox_callback_manager::CallbackRegistry;
use ox_forms::{FormSchema, FormSession};
use ox_type_converter::to_display_string;

use crate::columns::{columns_from_schema, RowAction, TableColumn};
use crate::config::{CrudConfig, CrudMode};
use crate::error::CrudError;
use crate::history::History;
use crate::notify::{LogNotifier, Notifier};
use crate::permissions::{CrudAction, Permissions};
use crate::provider::{CrudProvider, FetchRequest, Navigator};
use crate::query::{build_query, parse_query, Pagination, PaginationParse};
use crate::response::{normalize_response, PageMeta};

/// Shared liveness flag. The host keeps a clone and flips it on unmount so a
/// fetch that is still pending drops its result.
#[derive(Clone, Debug)]
pub struct MountFlag(Arc<AtomicBool>);

impl MountFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for MountFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Pagination was missing or malformed; the URL was rewritten instead.
    Redirected,
    Fetched,
    Failed,
    Unmounted,
}

/// What the table displays. Filters mirror the URL and are never read back.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CrudViewState {
    pub list: Vec<Value>,
    pub meta: PageMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
    pub filters: Map<String, Value>,
    pub selected_row_keys: Vec<Value>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorMode {
    Create,
    Edit { key: Value },
}

pub struct Editor {
    pub mode: EditorMode,
    pub session: FormSession,
}

pub struct CrudContainer {
    config: CrudConfig,
    schema: Arc<FormSchema>,
    callbacks: Arc<CallbackRegistry>,
    provider: Arc<dyn CrudProvider>,
    history: Box<dyn History>,
    notifier: Arc<dyn Notifier>,
    permissions: Permissions,
    navigator: Option<Arc<dyn Navigator>>,
    state: CrudViewState,
    editor: Option<Editor>,
    mounted: MountFlag,
}

impl CrudContainer {
    pub fn new(
        config: CrudConfig,
        schema: Arc<FormSchema>,
        provider: Arc<dyn CrudProvider>,
        history: Box<dyn History>,
    ) -> Self {
        let pagination = Pagination::defaults(&config);
        Self {
            config,
            schema,
            callbacks: Arc::new(CallbackRegistry::new()),
            provider,
            history,
            notifier: Arc::new(LogNotifier),
            permissions: Permissions::allow_all(),
            navigator: None,
            state: CrudViewState {
                list: Vec::new(),
                meta: PageMeta {
                    total_items: 0,
                    items_per_page: pagination.page_size,
                    current_page: pagination.page,
                },
                links: None,
                filters: Map::new(),
                selected_row_keys: Vec::new(),
                loading: false,
            },
            editor: None,
            mounted: MountFlag::new(),
        }
    }

    pub fn with_callbacks(mut self, callbacks: Arc<CallbackRegistry>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn state(&self) -> &CrudViewState {
        &self.state
    }

    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    pub fn history(&self) -> &dyn History {
        self.history.as_ref()
    }

    pub fn mount_flag(&self) -> MountFlag {
        self.mounted.clone()
    }

    /// Bring the table in line with the URL. This is the only path that
    /// writes `list` and `meta`.
    pub async fn sync(&mut self) -> SyncOutcome {
        if !self.mounted.is_mounted() {
            return SyncOutcome::Unmounted;
        }
        let parsed = parse_query(&self.history.query(), &self.config);
        let pagination = match parsed.pagination {
            PaginationParse::Valid(pagination) => pagination,
            PaginationParse::Missing | PaginationParse::Malformed => {
                let query = build_query(&parsed.filters, Some(Pagination::defaults(&self.config)), &self.config);
                log::debug!("Rewriting list query to defaults: {}", query);
                self.history.replace(query);
                return SyncOutcome::Redirected;
            }
        };

        self.state.filters = parsed.filters.clone();
        self.state.loading = true;
        let request = FetchRequest {
            filters: parsed.filters,
            pagination,
            current_list: self.state.list.clone(),
        };
        log::debug!("Fetching page {} (size {})", pagination.page, pagination.page_size);
        let mounted = self.mounted.clone();
        let result = self.provider.fetch(request).await;
        if !mounted.is_mounted() {
            log::debug!("Dropping list response for an unmounted container");
            return SyncOutcome::Unmounted;
        }
        self.state.loading = false;

        match result.map_err(CrudError::provider).and_then(|raw| normalize_response(raw, &pagination)) {
            Ok(response) => {
                self.state.list = response.list;
                self.state.meta = response.meta;
                self.state.links = response.links;
                SyncOutcome::Fetched
            }
            Err(e) => {
                log::error!("Failed to load list: {}", e);
                self.notifier.error(&self.config.messages.load_failed);
                SyncOutcome::Failed
            }
        }
    }

    fn current_pagination(&self) -> Pagination {
        match parse_query(&self.history.query(), &self.config).pagination {
            PaginationParse::Valid(pagination) => pagination,
            _ => Pagination::defaults(&self.config),
        }
    }

    /// Push a new URL with `filters`; empty values are dropped and the page
    /// resets to the first.
    pub fn apply_filters(&mut self, filters: Map<String, Value>) {
        let kept: Map<String, Value> = filters
            .into_iter()
            .filter(|(_, v)| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                Value::Array(items) => !items.is_empty(),
                _ => true,
            })
            .collect();
        let pagination = Pagination {
            page: self.config.default_page.max(1),
            ..self.current_pagination()
        };
        self.history.push(build_query(&kept, Some(pagination), &self.config));
    }

    pub fn clear_filters(&mut self) {
        self.apply_filters(Map::new());
    }

    pub fn change_page(&mut self, page: u64, page_size: u64) {
        let filters = parse_query(&self.history.query(), &self.config).filters;
        let pagination = Pagination {
            page: page.max(1),
            page_size: page_size.max(1),
        };
        self.history.push(build_query(&filters, Some(pagination), &self.config));
    }

    pub fn select_rows(&mut self, keys: Vec<Value>) {
        self.state.selected_row_keys = keys;
    }

    pub fn columns(&self) -> Vec<TableColumn> {
        columns_from_schema(&self.schema)
    }

    /// Actions the permission check allows on `record`.
    pub fn row_actions(&self, record: &Value) -> Vec<RowAction> {
        [CrudAction::View, CrudAction::Edit, CrudAction::Delete]
            .into_iter()
            .filter(|action| self.permissions.allows(*action, Some(record)))
            .map(RowAction::new)
            .collect()
    }

    fn ensure_mounted(&self) -> Result<(), CrudError> {
        if self.mounted.is_mounted() {
            Ok(())
        } else {
            Err(CrudError::Unmounted)
        }
    }

    fn authorize(&self, action: CrudAction, record: Option<&Value>) -> Result<(), CrudError> {
        self.ensure_mounted()?;
        if self.permissions.allows(action, record) {
            return Ok(());
        }
        log::warn!("Permission denied for {}", action);
        self.notifier.warning(&self.config.messages.permission_denied);
        Err(CrudError::PermissionDenied(action))
    }

    fn row_key(&self, record: &Value) -> Value {
        record.get(&self.config.row_key).cloned().unwrap_or(Value::Null)
    }

    /// Navigate in route mode; returns false in modal mode.
    fn route(&self, suffix: &str) -> Result<bool, CrudError> {
        let CrudMode::Route { base_path } = &self.config.mode else {
            return Ok(false);
        };
        let navigator = self.navigator.as_ref().ok_or(CrudError::NoNavigator)?;
        let path = format!("{}/{}", base_path.trim_end_matches('/'), suffix);
        let params = parse_query(&self.history.query(), &self.config).filters;
        navigator.navigate(&path, &params);
        Ok(true)
    }

    pub fn view(&self, record: &Value) -> Result<(), CrudError> {
        self.authorize(CrudAction::View, Some(record))?;
        let key = to_display_string(&self.row_key(record));
        if !self.route(&key)? {
            self.provider.view(record);
        }
        Ok(())
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut Editor> {
        self.editor.as_mut()
    }

    pub async fn open_create(&mut self) -> Result<(), CrudError> {
        self.authorize(CrudAction::Create, None)?;
        if self.route("new")? {
            return Ok(());
        }
        let session = FormSession::mount(self.schema.clone(), self.callbacks.clone(), None).await?;
        self.editor = Some(Editor {
            mode: EditorMode::Create,
            session,
        });
        Ok(())
    }

    pub async fn open_edit(&mut self, record: &Value) -> Result<(), CrudError> {
        self.authorize(CrudAction::Edit, Some(record))?;
        let key = self.row_key(record);
        if self.route(&format!("{}/edit", to_display_string(&key)))? {
            return Ok(());
        }
        let session = FormSession::mount(self.schema.clone(), self.callbacks.clone(), record.as_object()).await?;
        self.editor = Some(Editor {
            mode: EditorMode::Edit { key },
            session,
        });
        Ok(())
    }

    pub fn close_editor(&mut self) {
        if let Some(mut editor) = self.editor.take() {
            editor.session.unmount();
        }
    }

    /// Validate and save the open editor. On failure the editor stays open
    /// with the entered values.
    pub async fn submit_editor(&mut self) -> Result<Value, CrudError> {
        self.ensure_mounted()?;
        let editor = self.editor.as_mut().ok_or(CrudError::NoEditor)?;
        let submitted = editor.session.submit()?;
        let values = ox_forms::typed_values(editor.session.schema(), &submitted);
        let mode = editor.mode.clone();
        let (result, success) = match mode {
            EditorMode::Create => (self.provider.create(values).await, &self.config.messages.create_success),
            EditorMode::Edit { .. } => (self.provider.update(values).await, &self.config.messages.update_success),
        };
        if !self.mounted.is_mounted() {
            log::debug!("Dropping save result after unmount");
            return result.map_err(CrudError::provider);
        }
        match result {
            Ok(saved) => {
                self.notifier.success(success);
                self.close_editor();
                Ok(saved)
            }
            Err(e) => {
                log::error!("Failed to save record: {:#}", e);
                self.notifier.error(&self.config.messages.save_failed);
                Err(CrudError::provider(e))
            }
        }
    }

    /// Delete through the provider. The row stays until the next sync.
    pub async fn delete(&mut self, record: &Value) -> Result<Value, CrudError> {
        self.authorize(CrudAction::Delete, Some(record))?;
        let result = self.provider.delete(record).await;
        if !self.mounted.is_mounted() {
            log::debug!("Dropping delete result after unmount");
            return result.map_err(CrudError::provider);
        }
        match result {
            Ok(result) => {
                self.notifier.success(&self.config.messages.delete_success);
                Ok(result)
            }
            Err(e) => {
                log::error!("Failed to delete record: {:#}", e);
                self.notifier.error(&self.config.messages.delete_failed);
                Err(CrudError::provider(e))
            }
        }
    }

    pub fn unmount(&mut self) {
        self.mounted.unmount();
        self.close_editor();
    }
}
