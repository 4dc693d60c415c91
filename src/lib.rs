#![deny(rust_2018_idioms)]

pub mod app;
pub mod binder;
pub mod domain;
pub mod error;
pub mod io;
pub mod notify;
pub mod query;
pub mod selector;
pub mod window;

pub use app::{ReferencePicker, UiOptions};
pub use binder::{FieldState, PickerOptions, ReferenceFieldBinder, Startup, ValueSink, initialize};
pub use domain::{FieldConfig, RawRecord, ReferenceValue, validate_config, validate_value};
pub use error::ReferenceError;

pub mod prelude {
    pub use super::{
        FieldConfig, FieldState, PickerOptions, RawRecord, ReferenceError, ReferenceFieldBinder,
        ReferencePicker, ReferenceValue, Startup, UiOptions, ValueSink, initialize,
    };
    pub use crate::{
        binder::{CancelToken, DevHost, ExtensionHost},
        notify::{Notification, Notifier},
        query::{ListingSource, MemorySource},
        window::{PopupContent, Surface, WindowPlatform},
    };
}
