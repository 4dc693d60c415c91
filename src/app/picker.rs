use std::sync::Arc;

use anyhow::Result;

use crate::{
    binder::{ExtensionHost, FieldSession},
    domain::ReferenceValue,
    notify::NotificationLog,
    query::ListingSource,
};

use super::{
    options::UiOptions,
    platform::TerminalPlatform,
    runtime::{App, SharedSource},
};

/// Runs a started field session as a terminal application.
pub struct ReferencePicker<H> {
    session: FieldSession<H>,
    source: SharedSource,
    options: UiOptions,
}

impl<H: ExtensionHost + 'static> ReferencePicker<H> {
    pub fn new(
        session: FieldSession<H>,
        source: impl ListingSource + Send + Sync + 'static,
    ) -> Self {
        Self {
            session,
            source: Arc::new(source),
            options: UiOptions::default(),
        }
    }

    pub fn with_options(mut self, options: UiOptions) -> Self {
        self.options = options;
        self
    }

    /// Blocks until the user quits and returns the final field value.
    pub fn run(self) -> Result<ReferenceValue> {
        let ReferencePicker {
            session,
            source,
            options,
        } = self;

        let platform = TerminalPlatform::default();
        let notes = NotificationLog::new();
        let binder = session.into_binder(platform.clone(), options.picker_options(), notes.clone());
        let mut app = App::new(binder, platform, source, notes, options);
        app.run()
    }
}
