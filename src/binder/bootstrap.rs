use std::{
    cell::RefCell,
    path::Path,
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::{
    domain::{FieldConfig, ReferenceValue, load_value, validate_config},
    error::ReferenceError,
    io::load_document,
    notify::{Notification, Notifier},
    window::WindowPlatform,
};

use super::{PickerOptions, ReferenceFieldBinder, ValueSink};

/// The only extension type a reference field may be mounted as.
pub const FIELD_EXTENSION: &str = "FIELD";

/// The host platform's extension SDK, as seen by one field instance.
pub trait ExtensionHost {
    fn extension_type(&self) -> String;
    fn field_config(&self) -> Value;
    fn field_data(&self) -> Value;
    fn set_field_data(&mut self, value: Value) -> Result<()>;

    fn is_editable(&self) -> bool {
        true
    }

    fn enable_auto_resizing(&mut self) {}
}

/// Forwards emitted values to the host's field setter.
#[derive(Debug)]
pub struct HostSink<H> {
    host: H,
}

impl<H: ExtensionHost> HostSink<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: ExtensionHost> ValueSink for HostSink<H> {
    fn emit(&mut self, value: &ReferenceValue) {
        if let Err(err) = self.host.set_field_data(value.to_stored()) {
            let reason = format!("{err:#}");
            error!(error = %reason, "failed to store the field value");
        }
    }
}

/// Trips once; startup results arriving afterwards are dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A field that started successfully.
#[derive(Debug)]
pub struct FieldSession<H> {
    pub host: H,
    pub config: FieldConfig,
    pub value: ReferenceValue,
    pub editable: bool,
    /// Set when the stored value was invalid and replaced by `Empty`.
    pub warning: Option<ReferenceError>,
}

impl<H: ExtensionHost + 'static> FieldSession<H> {
    /// Build the binder, routing emitted values to the host. A pending
    /// stored-value warning is delivered to `notifier` first.
    pub fn into_binder<P: WindowPlatform>(
        self,
        platform: P,
        options: PickerOptions,
        mut notifier: impl Notifier + 'static,
    ) -> ReferenceFieldBinder<P> {
        if let Some(warning) = &self.warning {
            notifier.notify(Notification::from(warning));
        }
        ReferenceFieldBinder::new(self.config, self.value, platform)
            .with_options(options)
            .with_editable(self.editable)
            .with_sink(HostSink::new(self.host))
            .with_notifier(notifier)
    }
}

#[derive(Debug)]
pub enum Startup<H> {
    Ready(FieldSession<H>),
    Failed(ReferenceError),
    /// The field was torn down before the host answered.
    Cancelled,
}

/// Connect to the host and validate what it hands over.
///
/// An invalid stored value is not fatal: it degrades to `Empty`, and the
/// normalized form is written back once whenever it differs from what the
/// host stored.
pub fn initialize<H: ExtensionHost>(
    connect: impl FnOnce() -> Result<H>,
    cancel: &CancelToken,
) -> Startup<H> {
    let connected = connect();
    if cancel.is_cancelled() {
        debug!("startup cancelled; discarding host connection");
        return Startup::Cancelled;
    }
    let mut host = match connected {
        Ok(host) => host,
        Err(err) => {
            return Startup::Failed(ReferenceError::HostUnavailable {
                reason: format!("{err:#}"),
            });
        }
    };

    let extension_type = host.extension_type();
    if extension_type != FIELD_EXTENSION {
        return Startup::Failed(ReferenceError::UnexpectedHostType(extension_type));
    }
    host.enable_auto_resizing();

    let config = match validate_config(&host.field_config()) {
        Ok(config) => config,
        Err(err) => return Startup::Failed(err),
    };

    let stored = host.field_data();
    let load = load_value(&stored);
    if load.needs_write {
        info!("writing back normalized field data");
        if let Err(err) = host.set_field_data(load.value.to_stored()) {
            let reason = format!("{err:#}");
            warn!(error = %reason, "failed to write back normalized field data");
        }
    }

    let editable = host.is_editable();
    Startup::Ready(FieldSession {
        host,
        config,
        value: load.value,
        editable,
        warning: load.warning,
    })
}

/// Log a startup failure and surface it to the user.
pub fn report_failure(err: &ReferenceError, notifier: &mut dyn Notifier) {
    error!(error = %err, fatal = err.is_fatal(), "reference field failed to start");
    notifier.notify(Notification::from(err));
}

const CONFIG_DOCUMENT_VAR: &str = "REFPICKER_CONFIG";
const FIELD_DATA_VAR: &str = "REFPICKER_FIELD_DATA";
const CONFIG_VARS: [(&str, &str); 6] = [
    ("REFPICKER_API_KEY", "api_key"),
    ("REFPICKER_DELIVERY_TOKEN", "delivery_token"),
    ("REFPICKER_ENVIRONMENT", "environment"),
    ("REFPICKER_BRANCH", "branch"),
    ("REFPICKER_CONTENT_TYPE", "content_type"),
    ("REFPICKER_HOST", "host"),
];
const COLUMNS_VAR: &str = "REFPICKER_CONTENT_TYPE_COLUMNS";

/// Development host that takes its configuration from the environment and
/// keeps the field value in memory. Clones share the stored value.
#[derive(Debug, Clone)]
pub struct DevHost {
    config: Value,
    stored: Rc<RefCell<Value>>,
    writes: Rc<RefCell<usize>>,
    editable: bool,
}

impl DevHost {
    pub fn new(config: Value, stored: Value) -> Self {
        Self {
            config,
            stored: Rc::new(RefCell::new(stored)),
            writes: Rc::new(RefCell::new(0)),
            editable: true,
        }
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `REFPICKER_CONFIG` (a JSON/YAML/TOML document) when set, else
    /// one variable per config key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = match lookup(CONFIG_DOCUMENT_VAR) {
            Some(path) => load_document(Path::new(&path))
                .with_context(|| format!("failed to load {CONFIG_DOCUMENT_VAR}"))?,
            None => {
                let mut map = Map::new();
                for (var, key) in CONFIG_VARS {
                    if let Some(value) = lookup(var) {
                        map.insert(key.to_string(), Value::String(value));
                    }
                }
                if let Some(columns) = lookup(COLUMNS_VAR) {
                    let columns: Value = serde_json::from_str(&columns)
                        .with_context(|| format!("{COLUMNS_VAR} must be a JSON array"))?;
                    map.insert("content_type_columns".to_string(), columns);
                }
                Value::Object(map)
            }
        };
        let stored = match lookup(FIELD_DATA_VAR) {
            Some(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("{FIELD_DATA_VAR} must be JSON"))?,
            None => Value::Object(Map::new()),
        };
        Ok(Self::new(config, stored))
    }

    pub fn stored(&self) -> Value {
        self.stored.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl ExtensionHost for DevHost {
    fn extension_type(&self) -> String {
        FIELD_EXTENSION.to_string()
    }

    fn field_config(&self) -> Value {
        self.config.clone()
    }

    fn field_data(&self) -> Value {
        self.stored()
    }

    fn set_field_data(&mut self, value: Value) -> Result<()> {
        *self.stored.borrow_mut() = value;
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn is_editable(&self) -> bool {
        self.editable
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::notify::{NotificationLevel, NotificationLog};
    use serde_json::json;

    fn config() -> Value {
        json!({
            "api_key": "k",
            "delivery_token": "t",
            "environment": "e",
            "content_type": "blog_article",
            "content_type_columns": [{"id": "title", "name": "Title"}]
        })
    }

    struct OtherHost;

    impl ExtensionHost for OtherHost {
        fn extension_type(&self) -> String {
            "SIDEBAR".into()
        }
        fn field_config(&self) -> Value {
            config()
        }
        fn field_data(&self) -> Value {
            json!({})
        }
        fn set_field_data(&mut self, _: Value) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn valid_host_starts_without_writes() {
        let host = DevHost::new(config(), json!({}));
        let Startup::Ready(session) = initialize(|| Ok(host.clone()), &CancelToken::new()) else {
            panic!("expected a ready session");
        };
        assert_eq!(session.value, ReferenceValue::Empty);
        assert_eq!(session.config.branch, "main");
        assert!(session.warning.is_none());
        assert_eq!(host.write_count(), 0);
    }

    #[test]
    fn cancelled_startup_is_silent() {
        let host = DevHost::new(config(), json!("garbage"));
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
    fn wrong_extension_type_is_fatal() {
        let startup = initialize(|| Ok(OtherHost), &CancelToken::new());
        let Startup::Failed(err) = startup else {
            panic!("expected failure");
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("got: SIDEBAR"));
    }

    #[test]
    fn connection_errors_are_reported() {
        let startup = initialize::<DevHost>(
            || Err(anyhow::anyhow!("sdk unavailable")),
            &CancelToken::new(),
        );
        assert!(matches!(
            startup,
            Startup::Failed(ReferenceError::HostUnavailable { .. })
        ));
    }

    #[test]
    fn invalid_config_is_fatal_and_notified() {
        let host = DevHost::new(json!({"content_type": "x"}), json!({}));
        let Startup::Failed(err) = initialize(|| Ok(host), &CancelToken::new()) else {
            panic!("expected failure");
        };
        let mut log = NotificationLog::new();
        report_failure(&err, &mut log);
        let note = log.last().unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert!(note.description.contains("api_key"));
    }

    #[test]
    fn invalid_stored_value_is_normalized_once() {
        let host = DevHost::new(config(), json!({"uid": 12}));
        let Startup::Ready(session) = initialize(|| Ok(host.clone()), &CancelToken::new()) else {
            panic!("expected a ready session");
        };
        assert!(session.warning.is_some());
        assert_eq!(host.write_count(), 1);
        assert_eq!(host.stored(), json!({}));
    }

    #[test]
    fn env_lookup_builds_the_config() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("REFPICKER_API_KEY", "k"),
            ("REFPICKER_DELIVERY_TOKEN", "t"),
            ("REFPICKER_ENVIRONMENT", "e"),
            ("REFPICKER_CONTENT_TYPE", "blog_article"),
            (
                "REFPICKER_CONTENT_TYPE_COLUMNS",
                r#"[{"id": "title", "name": "Title"}]"#,
            ),
        ]);
        let host = DevHost::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        let config = validate_config(&host.field_config()).expect("config");
        assert_eq!(config.content_type, "blog_article");
        assert_eq!(host.field_data(), json!({}));
    }

    #[test]
    fn malformed_columns_variable_is_an_error() {
        let err = DevHost::from_lookup(|key| {
            (key == "REFPICKER_CONTENT_TYPE_COLUMNS").then(|| "[{".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("REFPICKER_CONTENT_TYPE_COLUMNS"));
    }
}
