use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use serde_json::{json, Map, Value};

use ox_callback_manager::{CallbackError, CallbackRegistry};
use ox_forms::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn profile_schema(delay_ms: Option<u64>) -> FormSchema {
    let mut schema = FormSchema::new(
        "profile",
        FormLayout::Fields(vec![
            FieldDescriptor::new("name", FieldType::Text),
            FieldDescriptor::new("country", FieldType::Select),
            FieldDescriptor::new("city", FieldType::Select)
                .with_dependency(
                    DependencyRule::new(
                        RuleType::SetOptions,
                        vec![Condition::new("country", Operator::IsNotEmpty, Value::Null)],
                    )
                    .with_callback("cities")
                    .asynchronous(),
                )
                .with_dependency(DependencyRule::new(
                    RuleType::Disable,
                    vec![Condition::new("country", Operator::IsEmpty, Value::Null)],
                )),
        ]),
    );
    schema.config.auto_save_delay_ms = delay_ms;
    schema
}

fn callbacks() -> Arc<CallbackRegistry> {
    let mut registry = CallbackRegistry::new();
    registry.register_async_calculation("cities", |values| {
        async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let cities = match values.get("country").and_then(Value::as_str) {
                Some("NO") => json!(["Oslo", "Bergen"]),
                Some(_) => json!(["Elsewhere"]),
                None => json!([]),
            };
            Ok::<_, CallbackError>(cities)
        }
        .boxed()
    });
    Arc::new(registry)
}

#[tokio::test]
async fn test_async_options_are_awaited_in_order() {
    init_logger();
    let mut session = FormSession::mount(Arc::new(profile_schema(None)), callbacks(), None)
        .await
        .unwrap();
    let city = session.field_state("city").unwrap();
    assert!(city.disabled);
    assert!(city.options.is_empty());

    let changes = session.set_value("country", json!("NO")).await.unwrap();
    assert!(changes.state_changed("city"));
    let city = session.field_state("city").unwrap();
    assert!(!city.disabled);
    let labels: Vec<&str> = city.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Oslo", "Bergen"]);
}

#[tokio::test(start_paused = true)]
async fn test_auto_save_debounces_and_stops_on_submit() {
    init_logger();
    let saved: Arc<Mutex<Vec<Map<String, Value>>>> = Arc::new(Mutex::new(Vec::new()));
    let target = saved.clone();
    let sink: AutoSaveSink = Arc::new(move |values: Map<String, Value>| {
        target.lock().unwrap().push(values);
        async {}.boxed()
    });

    let mut session = FormSession::mount(Arc::new(profile_schema(Some(300))), callbacks(), None)
        .await
        .unwrap()
        .with_auto_save(sink);

    session.set_value("name", json!("A")).await.unwrap();
    session.set_value("name", json!("Ad")).await.unwrap();
    session.set_value("name", json!("Ada")).await.unwrap();
    assert!(session.auto_save_pending());
    tokio::time::sleep(Duration::from_millis(400)).await;
    {
        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0]["name"], json!("Ada"));
    }

    session.set_value("name", json!("Ada L")).await.unwrap();
    session.submit().unwrap();
    assert!(!session.auto_save_pending());
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(saved.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_pending_save() {
    let saved = Arc::new(Mutex::new(0usize));
    let target = saved.clone();
    let sink: AutoSaveSink = Arc::new(move |_values: Map<String, Value>| {
        *target.lock().unwrap() += 1;
        async {}.boxed()
    });
    let mut session = FormSession::mount(Arc::new(profile_schema(Some(100))), callbacks(), None)
        .await
        .unwrap()
        .with_auto_save(sink);

    session.set_value("name", json!("x")).await.unwrap();
    session.unmount();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(*saved.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_custom_rule_sets_errors_and_values() {
    init_logger();
    let mut registry = CallbackRegistry::new();
    registry.register_custom("check_domain", |form, values, field| {
        let email = values.get(field).and_then(Value::as_str).unwrap_or_default();
        if email.ends_with("@example.com") {
            form.set_error(field, "example.com addresses are not accepted".to_string());
        } else {
            form.set_value("domain", json!(email.split('@').nth(1).unwrap_or_default()));
        }
        Ok(None)
    });
    let schema = FormSchema::new(
        "signup",
        FormLayout::Fields(vec![
            FieldDescriptor::new("email", FieldType::Email).with_dependency(
                DependencyRule::new(RuleType::Custom, vec![Condition::new("email", Operator::IsNotEmpty, Value::Null)])
                    .with_callback("check_domain"),
            ),
            FieldDescriptor::new("domain", FieldType::Hidden),
        ]),
    );
    let mut session = FormSession::mount(Arc::new(schema), Arc::new(registry), None).await.unwrap();

    session.set_value("email", json!("joe@example.com")).await.unwrap();
    assert_eq!(session.errors()[0].field, "email");

    session.set_value("email", json!("ada@lovelace.org")).await.unwrap();
    assert!(session.errors().is_empty());
    assert_eq!(session.value("domain"), Some(&json!("lovelace.org")));
}

#[tokio::test]
async fn test_mount_binds_existing_record() {
    let record = json!({"id": 42, "name": "Ada", "country": "NO"});
    let session = FormSession::mount(Arc::new(profile_schema(None)), callbacks(), record.as_object())
        .await
        .unwrap();
    assert_eq!(session.value("id"), Some(&json!(42)));
    assert_eq!(session.value("name"), Some(&json!("Ada")));
    assert_eq!(session.field_state("city").unwrap().options.len(), 2);
}
