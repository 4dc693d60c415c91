use anyhow::anyhow;
use refpicker::{
    binder::{CancelToken, DevHost, FieldState, PickerOptions, Startup, initialize},
    domain::ReferenceValue,
    error::ReferenceError,
    notify::{NotificationLevel, NotificationLog},
    query::MemorySource,
    window::{HeadlessPlatform, HostDocument, ScreenGeometry},
};
use serde_json::{Value, json};

fn config() -> Value {
    json!({
        "api_key": "blt-key",
        "delivery_token": "cs-token",
        "environment": "production",
        "content_type": "blog_article",
        "content_type_columns": [
            {"id": "title", "name": "Title"},
            {"id": "date", "name": "Date"}
        ]
    })
}

fn ready(host: &DevHost) -> refpicker::binder::FieldSession<DevHost> {
    match initialize(|| Ok(host.clone()), &CancelToken::new()) {
        Startup::Ready(session) => session,
        other => panic!("expected a ready session, got {other:?}"),
    }
}

#[test]
fn picked_value_is_written_to_the_host() {
    let host = DevHost::new(config(), json!({}));
    let session = ready(&host);
    assert_eq!(host.write_count(), 0);

    let platform = HeadlessPlatform::new(ScreenGeometry::plain(1280, 800), HostDocument::default());
    let notes = NotificationLog::new();
    let mut binder = session.into_binder(platform, PickerOptions::default(), notes.clone());
    let source = MemorySource::new(vec![
        json!({"uid": "x1", "title": "Why Cats", "date": "2023-07-25"}),
        json!({"uid": "x2", "title": "Why Dogs", "date": "2023-07-20"}),
    ]);

    let ticket = binder.choose().unwrap();
    assert!(binder.fetch(&ticket, &source));
    // Newest date first.
    assert!(binder.pick_highlighted());

    assert_eq!(binder.state(), FieldState::Populated);
    assert_eq!(host.write_count(), 1);
    assert_eq!(host.stored()["uid"], "x1");
    assert_eq!(host.stored()["content_type"], "blog_article");
    assert!(notes.is_empty());

    assert!(binder.remove());
    assert_eq!(host.stored(), json!({}));
    assert_eq!(host.write_count(), 2);
}

#[test]
fn cancelled_startup_discards_the_connection() {
    let host = DevHost::new(config(), json!({"uid": 7}));
    let cancel = CancelToken::new();
    let startup = initialize(
        || {
            cancel.cancel();
            Ok(host.clone())
        },
        &cancel,
    );
    assert!(matches!(startup, Startup::Cancelled));
    assert_eq!(host.write_count(), 0);
}

#[test]
fn unreachable_host_is_fatal() {
    let startup =
        initialize::<DevHost>(|| Err(anyhow!("handshake timed out")), &CancelToken::new());
    let Startup::Failed(err) = startup else {
        panic!("expected failure");
    };
    assert!(matches!(err, ReferenceError::HostUnavailable { .. }));
    assert!(err.is_fatal());
    assert!(err.to_string().contains("handshake timed out"));
}

#[test]
fn invalid_configuration_prevents_startup() {
    let host = DevHost::new(json!({"api_key": "k"}), json!({}));
    let Startup::Failed(err) = initialize(|| Ok(host.clone()), &CancelToken::new()) else {
        panic!("expected failure");
    };
    assert!(matches!(err, ReferenceError::ConfigInvalid(_)));
    assert!(err.report().is_some_and(|report| !report.is_empty()));
}

#[test]
fn invalid_stored_value_is_reset_and_reported() {
    let host = DevHost::new(config(), json!({"uid": 42, "fields": "nope"}));
    let session = ready(&host);
    assert_eq!(session.value, ReferenceValue::Empty);
    assert_eq!(host.stored(), json!({}));
    assert_eq!(host.write_count(), 1);

    let notes = NotificationLog::new();
    let platform = HeadlessPlatform::new(ScreenGeometry::plain(1280, 800), HostDocument::default());
    let binder = session.into_binder(platform, PickerOptions::default(), notes.clone());
    assert_eq!(binder.state(), FieldState::Empty);
    let note = notes.last().expect("warning delivered");
    assert_eq!(note.level, NotificationLevel::Warning);
}

#[test]
fn legacy_content_type_key_is_rewritten_once() {
    let host = DevHost::new(
        config(),
        json!({"uid": "x1", "fields": {"title": "Why Cats"}, "contentType": "blog_article"}),
    );
    let session = ready(&host);
    assert_eq!(session.value.uid(), Some("x1"));
    assert_eq!(host.write_count(), 1);
    assert_eq!(host.stored()["content_type"], "blog_article");
    assert!(host.stored().get("contentType").is_none());

    let again = ready(&host);
    assert!(again.warning.is_none());
    assert_eq!(host.write_count(), 1);
}

#[test]
fn read_only_hosts_cannot_choose() {
    let host = DevHost::new(config(), json!({})).with_editable(false);
    let session = ready(&host);
    let platform = HeadlessPlatform::new(ScreenGeometry::plain(1280, 800), HostDocument::default());
    let mut binder =
        session.into_binder(platform.clone(), PickerOptions::default(), NotificationLog::new());
    assert!(binder.choose().is_none());
    assert_eq!(platform.surface_count(), 0);
}
