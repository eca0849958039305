use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use ox_crud::*;
use ox_forms::{FieldDescriptor, FieldType, FormError, FormLayout, FormSchema};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct FakeProvider {
    fetches: Mutex<Vec<FetchRequest>>,
    response: Mutex<Option<Value>>,
    saved: Mutex<Vec<Map<String, Value>>>,
    deleted: Mutex<Vec<Value>>,
    fail_saves: bool,
    delay: Option<Duration>,
}

impl FakeProvider {
    fn answering(response: Value) -> Self {
        Self {
            response: Mutex::new(Some(response)),
            ..Default::default()
        }
    }

    fn set_response(&self, response: Option<Value>) {
        *self.response.lock().unwrap() = response;
    }

    fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl CrudProvider for FakeProvider {
    async fn fetch(&self, request: FetchRequest) -> anyhow::Result<Value> {
        self.fetches.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.response.lock().unwrap().clone();
        response.ok_or_else(|| anyhow::anyhow!("backend unavailable"))
    }

    async fn create(&self, record: Map<String, Value>) -> anyhow::Result<Value> {
        if self.fail_saves {
            anyhow::bail!("insert rejected");
        }
        self.saved.lock().unwrap().push(record.clone());
        Ok(Value::Object(record))
    }

    async fn update(&self, record: Map<String, Value>) -> anyhow::Result<Value> {
        self.create(record).await
    }

    async fn delete(&self, record: &Value) -> anyhow::Result<Value> {
        self.deleted.lock().unwrap().push(record.clone());
        Ok(json!({"deleted": true}))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    toasts: Mutex<Vec<(ToastLevel, String)>>,
}

impl RecordingNotifier {
    fn toasts(&self) -> Vec<(ToastLevel, String)> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: ToastLevel, message: &str) {
        self.toasts.lock().unwrap().push((level, message.to_string()));
    }
}

#[derive(Default)]
struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str, _params: &Map<String, Value>) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

fn users_schema() -> Arc<FormSchema> {
    let mut name = FieldDescriptor::new("name", FieldType::Text);
    name.required = true;
    Arc::new(FormSchema::new(
        "users",
        FormLayout::Fields(vec![
            name,
            FieldDescriptor::new("status", FieldType::Select),
            FieldDescriptor::new("password", FieldType::Password),
        ]),
    ))
}

fn rows(n: usize) -> Vec<Value> {
    (0..n).map(|i| json!({"id": i, "name": format!("user {}", i)})).collect()
}

fn container(
    query: &str,
    provider: Arc<FakeProvider>,
    notifier: Arc<RecordingNotifier>,
) -> CrudContainer {
    CrudContainer::new(
        CrudConfig::default(),
        users_schema(),
        provider,
        Box::new(MemoryHistory::new(query)),
    )
    .with_notifier(notifier)
}

#[tokio::test]
async fn test_url_drives_a_single_fetch() {
    init_logger();
    let provider = Arc::new(FakeProvider::answering(json!({
        "list": rows(5),
        "meta": {"totalItems": 45}
    })));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("?page=2&pageSize=10&status=active", provider.clone(), notifier.clone());

    assert_eq!(crud.sync().await, SyncOutcome::Fetched);

    let fetches = provider.fetches.lock().unwrap().clone();
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].filters, json!({"status": "active"}).as_object().cloned().unwrap());
    assert_eq!(fetches[0].pagination, Pagination { page: 2, page_size: 10 });
    assert_eq!(
        fetches[0].to_filter_object()["_pagination"],
        json!({"page": 2, "pageSize": 10})
    );

    let state = crud.state();
    assert_eq!(state.list.len(), 5);
    assert_eq!(state.meta.current_page, 2);
    assert_eq!(state.meta.total_pages(), 5);
    assert!(!state.loading);
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_missing_pagination_redirects_before_fetching() {
    let provider = Arc::new(FakeProvider::answering(json!(rows(2))));
    let mut crud = container("status=active", provider.clone(), Arc::new(RecordingNotifier::default()));

    assert_eq!(crud.sync().await, SyncOutcome::Redirected);
    assert_eq!(provider.fetch_count(), 0);
    assert_eq!(crud.history().query(), "page=1&pageSize=5&status=active");

    assert_eq!(crud.sync().await, SyncOutcome::Fetched);
    assert_eq!(provider.fetch_count(), 1);
}

#[tokio::test]
async fn test_malformed_pagination_resets_to_defaults() {
    let provider = Arc::new(FakeProvider::answering(json!([])));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("page=two&pageSize=10", provider.clone(), notifier.clone());

    assert_eq!(crud.sync().await, SyncOutcome::Redirected);
    assert_eq!(crud.history().query(), "page=1&pageSize=5");
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_failed_fetch_toasts_once_and_keeps_list() {
    let provider = Arc::new(FakeProvider::answering(json!({"data": {"list": rows(3)}})));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("page=1&pageSize=5", provider.clone(), notifier.clone());
    assert_eq!(crud.sync().await, SyncOutcome::Fetched);

    provider.set_response(None);
    crud.change_page(2, 5);
    assert_eq!(crud.sync().await, SyncOutcome::Failed);

    assert_eq!(notifier.toasts(), vec![(ToastLevel::Error, "Failed to load data".to_string())]);
    assert_eq!(crud.state().list, rows(3));
    assert!(!crud.state().loading);
}

#[tokio::test]
async fn test_filters_rewrite_the_url() {
    let provider = Arc::new(FakeProvider::answering(json!([])));
    let mut crud = container("page=3&pageSize=10", provider.clone(), Arc::new(RecordingNotifier::default()));

    let filters = json!({"status": "active", "q": "", "role": null, "tags": ["a"]});
    crud.apply_filters(filters.as_object().cloned().unwrap());
    assert_eq!(crud.history().query(), "page=1&pageSize=10&status=active&tags=%5B%22a%22%5D");

    crud.sync().await;
    assert_eq!(crud.state().filters["tags"], json!(["a"]));

    crud.clear_filters();
    assert_eq!(crud.history().query(), "page=1&pageSize=10");
    crud.sync().await;
    assert!(crud.state().filters.is_empty());
    assert_eq!(provider.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unmount_during_fetch_drops_result() {
    let provider = Arc::new(FakeProvider {
        response: Mutex::new(Some(json!(rows(4)))),
        delay: Some(Duration::from_millis(100)),
        ..Default::default()
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("page=1&pageSize=5", provider.clone(), notifier.clone());
    let flag = crud.mount_flag();

    let (outcome, _) = tokio::join!(crud.sync(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        flag.unmount();
    });
    assert_eq!(outcome, SyncOutcome::Unmounted);
    assert!(crud.state().list.is_empty());
    assert_eq!(crud.sync().await, SyncOutcome::Unmounted);
    assert_eq!(provider.fetch_count(), 1);
}

#[tokio::test]
async fn test_create_success_closes_editor() {
    let provider = Arc::new(FakeProvider::answering(json!([])));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("page=1&pageSize=5", provider.clone(), notifier.clone());

    crud.open_create().await.unwrap();
    let editor = crud.editor_mut().unwrap();
    assert_eq!(editor.mode, EditorMode::Create);
    editor.session.set_value("name", json!("Ada")).await.unwrap();

    let saved = crud.submit_editor().await.unwrap();
    assert_eq!(saved["name"], json!("Ada"));
    assert!(crud.editor().is_none());
    assert_eq!(notifier.toasts(), vec![(ToastLevel::Success, "Created successfully".to_string())]);
}

#[tokio::test]
async fn test_invalid_or_failed_save_keeps_editor_open() {
    let provider = Arc::new(FakeProvider {
        fail_saves: true,
        ..Default::default()
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("page=1&pageSize=5", provider.clone(), notifier.clone());

    crud.open_edit(&json!({"id": 7, "name": ""})).await.unwrap();
    let err = crud.submit_editor().await.unwrap_err();
    assert!(matches!(err, CrudError::Form(FormError::Validation(_))));
    assert!(notifier.toasts().is_empty());

    let editor = crud.editor_mut().unwrap();
    assert_eq!(editor.mode, EditorMode::Edit { key: json!(7) });
    editor.session.set_value("name", json!("Grace")).await.unwrap();
    let err = crud.submit_editor().await.unwrap_err();
    assert!(matches!(err, CrudError::Provider(_)));
    assert_eq!(notifier.toasts(), vec![(ToastLevel::Error, "Failed to save".to_string())]);

    let editor = crud.editor().unwrap();
    assert_eq!(editor.session.value("name"), Some(&json!("Grace")));
    assert!(provider.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_does_not_touch_rows() {
    let provider = Arc::new(FakeProvider::answering(json!(rows(2))));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("page=1&pageSize=5", provider.clone(), notifier.clone());
    crud.sync().await;

    let first = crud.state().list[0].clone();
    crud.delete(&first).await.unwrap();
    assert_eq!(crud.state().list.len(), 2);
    assert_eq!(provider.deleted.lock().unwrap().len(), 1);
    assert_eq!(notifier.toasts(), vec![(ToastLevel::Success, "Deleted successfully".to_string())]);
}

#[tokio::test]
async fn test_actions_after_unmount_are_refused() {
    let provider = Arc::new(FakeProvider::answering(json!(rows(2))));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("page=1&pageSize=5", provider.clone(), notifier.clone());
    crud.sync().await;
    let first = crud.state().list[0].clone();
    crud.unmount();

    assert!(matches!(crud.delete(&first).await, Err(CrudError::Unmounted)));
    assert!(matches!(crud.open_create().await, Err(CrudError::Unmounted)));
    assert!(matches!(crud.open_edit(&first).await, Err(CrudError::Unmounted)));
    assert!(matches!(crud.view(&first), Err(CrudError::Unmounted)));
    assert!(matches!(crud.submit_editor().await, Err(CrudError::Unmounted)));
    assert!(crud.editor().is_none());
    assert!(provider.deleted.lock().unwrap().is_empty());
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_permission_denial_warns_and_aborts() {
    let provider = Arc::new(FakeProvider::answering(json!([])));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut crud = container("page=1&pageSize=5", provider.clone(), notifier.clone())
        .with_permissions(Permissions::with_check(|action, _| action != CrudAction::Delete));

    let record = json!({"id": 1});
    let actions: Vec<CrudAction> = crud.row_actions(&record).into_iter().map(|a| a.action).collect();
    assert_eq!(actions, vec![CrudAction::View, CrudAction::Edit]);

    let err = crud.delete(&record).await.unwrap_err();
    assert!(matches!(err, CrudError::PermissionDenied(CrudAction::Delete)));
    assert!(provider.deleted.lock().unwrap().is_empty());
    assert_eq!(notifier.toasts()[0].0, ToastLevel::Warning);
}

#[tokio::test]
async fn test_route_mode_navigates_instead_of_opening_editor() {
    let navigator = Arc::new(RecordingNavigator::default());
    let config = CrudConfig {
        mode: CrudMode::Route {
            base_path: "/users/".to_string(),
        },
        ..Default::default()
    };
    let mut crud = CrudContainer::new(
        config,
        users_schema(),
        Arc::new(FakeProvider::default()),
        Box::new(MemoryHistory::new("page=1&pageSize=5")),
    )
    .with_navigator(navigator.clone());

    crud.open_edit(&json!({"id": 7})).await.unwrap();
    crud.open_create().await.unwrap();
    crud.view(&json!({"id": 8})).unwrap();
    assert!(crud.editor().is_none());
    assert_eq!(
        *navigator.paths.lock().unwrap(),
        vec!["/users/7/edit".to_string(), "/users/new".to_string(), "/users/8".to_string()]
    );
}

#[test]
fn test_columns_skip_unlisted_types() {
    let crud = CrudContainer::new(
        CrudConfig::default(),
        users_schema(),
        Arc::new(FakeProvider::default()),
        Box::new(MemoryHistory::default()),
    );
    let keys: Vec<String> = crud.columns().into_iter().map(|c| c.key).collect();
    assert_eq!(keys, vec!["name", "status", ACTIONS_COLUMN]);
}

#[test]
fn test_config_loads_from_yaml() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(
        b"default_page_size: 20\nrow_key: uuid\nmode:\n  type: route\n  base_path: /admin/users\nmessages:\n  load_failed: Could not load\n",
    )
    .unwrap();
    let config = CrudConfig::from_path(file.path()).unwrap();
    assert_eq!(config.default_page_size, 20);
    assert_eq!(config.default_page, 1);
    assert_eq!(config.row_key, "uuid");
    assert_eq!(config.messages.load_failed, "Could not load");
    assert_eq!(config.messages.delete_success, "Deleted successfully");
    assert_eq!(
        config.mode,
        CrudMode::Route {
            base_path: "/admin/users".to_string()
        }
    );
}
