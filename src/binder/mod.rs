//! The reference field state machine and its startup against the host platform.

mod bootstrap;
mod options;

pub use bootstrap::{
    CancelToken, DevHost, ExtensionHost, FIELD_EXTENSION, FieldSession, HostSink, Startup,
    initialize, report_failure,
};
pub use options::PickerOptions;

use std::{cell::RefCell, rc::Rc};

use tracing::{debug, error, warn};

use crate::{
    domain::{FieldConfig, RawRecord, ReferenceValue, extract},
    notify::{Notification, Notifier},
    query::{ListingSource, ListingTicket, QueryBuilder, RemotePage},
    selector::{SelectorState, SelectorView},
    window::{PopupController, PopupEvent, SurfaceEvent, TimerId, WindowPlatform},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Empty,
    Selecting,
    Populated,
}

/// Receives every value the field hands back to the host.
pub trait ValueSink {
    fn emit(&mut self, value: &ReferenceValue);
}

impl<F> ValueSink for F
where
    F: FnMut(&ReferenceValue),
{
    fn emit(&mut self, value: &ReferenceValue) {
        self(value)
    }
}

/// Keeps every emitted value in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct ValueLog {
    values: Rc<RefCell<Vec<ReferenceValue>>>,
}

impl ValueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<ReferenceValue> {
        self.values.borrow().clone()
    }

    pub fn last(&self) -> Option<ReferenceValue> {
        self.values.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl ValueSink for ValueLog {
    fn emit(&mut self, value: &ReferenceValue) {
        self.values.borrow_mut().push(value.clone());
    }
}

/// Owns the field value and the selector popup; the single writer of both.
pub struct ReferenceFieldBinder<P: WindowPlatform> {
    config: FieldConfig,
    value: ReferenceValue,
    editable: bool,
    options: PickerOptions,
    popup: PopupController<P>,
    queries: QueryBuilder,
    selector: Option<SelectorState>,
    popup_focused: bool,
    sink: Box<dyn ValueSink>,
    notifier: Box<dyn Notifier>,
}

impl<P: WindowPlatform> ReferenceFieldBinder<P> {
    pub fn new(config: FieldConfig, value: ReferenceValue, platform: P) -> Self {
        let queries = QueryBuilder::new(&config);
        Self {
            config,
            value,
            editable: true,
            options: PickerOptions::default(),
            popup: PopupController::new(platform),
            queries,
            selector: None,
            popup_focused: false,
            sink: Box::new(|_: &ReferenceValue| {}),
            notifier: Box::new(|notification: Notification| {
                warn!(title = %notification.title, "{}", notification.description);
            }),
        }
    }

    pub fn with_options(mut self, options: PickerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_sink(mut self, sink: impl ValueSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn state(&self) -> FieldState {
        if self.selector.is_some() && self.popup.is_open() {
            FieldState::Selecting
        } else if self.value.is_empty() {
            FieldState::Empty
        } else {
            FieldState::Populated
        }
    }

    pub fn value(&self) -> &ReferenceValue {
        &self.value
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn options(&self) -> &PickerOptions {
        &self.options
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn selector(&self) -> Option<&SelectorState> {
        self.selector.as_ref()
    }

    pub fn popup(&self) -> &PopupController<P> {
        &self.popup
    }

    pub fn platform(&self) -> &P {
        self.popup.platform()
    }

    pub fn platform_mut(&mut self) -> &mut P {
        self.popup.platform_mut()
    }

    /// Open the selector popup from an empty field. Returns the ticket for
    /// the first page, or `None` when the field is read-only, not empty, or
    /// the popup could not be opened. A populated field must be removed first.
    pub fn choose(&mut self) -> Option<ListingTicket> {
        if !self.editable {
            debug!("choose ignored on a read-only field");
            return None;
        }
        if self.state() != FieldState::Empty {
            debug!(state = ?self.state(), "choose ignored outside the empty state");
            return None;
        }

        let mut selector = SelectorState::new(&self.config, self.options.page_size);
        selector.mark_loading();
        let opened = self.popup.open(
            &SelectorView::new(&selector).focused(false),
            &self.options.popup_options(),
        );
        if let Err(err) = opened {
            self.notifier.notify(Notification::from(&err));
            return None;
        }
        let ticket = self.queries.issue(&selector.request());
        self.selector = Some(selector);
        self.drain_popup_events();
        Some(ticket)
    }

    pub fn search(&mut self, text: impl Into<String>) -> Option<ListingTicket> {
        let text = text.into();
        self.requery(|selector| selector.set_search(text))
    }

    pub fn sort_by(&mut self, column_id: &str) -> Option<ListingTicket> {
        self.requery(|selector| selector.toggle_sort(column_id))
    }

    /// Sort by the next configured column.
    pub fn cycle_sort(&mut self) -> Option<ListingTicket> {
        self.requery(SelectorState::cycle_sort_column)
    }

    pub fn go_to_page(&mut self, page: usize) -> Option<ListingTicket> {
        self.requery(|selector| selector.go_to_page(page))
    }

    pub fn next_page(&mut self) -> Option<ListingTicket> {
        self.requery(SelectorState::next_page)
    }

    pub fn previous_page(&mut self) -> Option<ListingTicket> {
        self.requery(SelectorState::previous_page)
    }

    pub fn set_page_size(&mut self, size: usize) -> Option<ListingTicket> {
        self.requery(|selector| selector.set_page_size(size))
    }

    pub fn refresh(&mut self) -> Option<ListingTicket> {
        self.requery(|_| true)
    }

    pub fn move_highlight(&mut self, delta: isize) {
        if let Some(selector) = self.selector.as_mut() {
            selector.move_highlight(delta);
            self.render();
        }
    }

    /// Apply the outcome of `ticket`. Returns `false` when it was discarded
    /// because a newer ticket was issued or the selector is gone.
    pub fn complete_listing(
        &mut self,
        ticket: &ListingTicket,
        outcome: anyhow::Result<RemotePage>,
    ) -> bool {
        let Some(resolved) = self.queries.resolve(ticket, outcome) else {
            return false;
        };
        let Some(selector) = self.selector.as_mut() else {
            debug!(seq = ticket.seq, "listing finished after the selector closed");
            return false;
        };
        match resolved {
            Ok(result) => selector.apply_result(result),
            Err(err) => {
                error!(seq = ticket.seq, error = %err, "listing request failed");
                selector.mark_failed();
                self.notifier.notify(Notification::from(&err));
            }
        }
        self.render();
        true
    }

    /// Run `ticket` against `source` on the calling thread and apply the outcome.
    pub fn fetch(&mut self, ticket: &ListingTicket, source: &impl ListingSource) -> bool {
        let outcome = ticket.run(source);
        self.complete_listing(ticket, outcome)
    }

    /// Turn `record` into the field value, close the popup and emit.
    pub fn select(&mut self, record: &RawRecord) -> bool {
        if !self.editable || self.state() != FieldState::Selecting {
            return false;
        }
        let Some(uid) = record.uid() else {
            warn!("ignoring selection of a record without uid");
            return false;
        };
        let fields = extract(record, self.config.columns());
        let value = ReferenceValue::populated(uid, self.config.content_type.clone(), fields);
        self.selector = None;
        self.popup.close();
        self.drain_popup_events();
        self.set_value(value);
        true
    }

    pub fn pick_highlighted(&mut self) -> bool {
        let Some(record) = self
            .selector
            .as_ref()
            .and_then(SelectorState::highlighted_record)
            .cloned()
        else {
            return false;
        };
        self.select(&record)
    }

    /// Clear a populated value.
    pub fn remove(&mut self) -> bool {
        if !self.editable || self.value.is_empty() {
            return false;
        }
        self.set_value(ReferenceValue::Empty);
        true
    }

    /// Close the selector without changing the value.
    pub fn cancel(&mut self) {
        self.popup.close();
        self.drain_popup_events();
    }

    /// Bring the open popup back to the front.
    pub fn toggle_focus(&mut self) -> bool {
        if !self.popup.is_open() {
            return false;
        }
        self.popup.set_focus(true);
        true
    }

    pub fn is_popup_focused(&self) -> bool {
        self.popup_focused
    }

    pub fn on_timer(&mut self, timer: TimerId) {
        self.popup.on_timer(timer);
        self.drain_popup_events();
    }

    pub fn on_surface_event(&mut self, event: SurfaceEvent) {
        self.popup.on_surface_event(event);
        self.drain_popup_events();
    }

    pub fn on_host_unload(&mut self) {
        self.popup.on_host_unload();
        self.drain_popup_events();
    }

    fn requery(
        &mut self,
        change: impl FnOnce(&mut SelectorState) -> bool,
    ) -> Option<ListingTicket> {
        let selector = self.selector.as_mut()?;
        if !change(selector) {
            return None;
        }
        selector.mark_loading();
        let ticket = self.queries.issue(&selector.request());
        self.render();
        Some(ticket)
    }

    fn render(&mut self) {
        if let Some(selector) = &self.selector {
            let view = SelectorView::new(selector).focused(self.popup_focused);
            self.popup.render(&view);
        }
    }

    fn drain_popup_events(&mut self) {
        while let Some(event) = self.popup.next_event() {
            match event {
                PopupEvent::Closed { reason, .. } => {
                    debug!(?reason, "selector closed");
                    self.selector = None;
                    self.popup_focused = false;
                }
                PopupEvent::FocusChanged { focused, .. } => {
                    self.popup_focused = focused;
                    self.render();
                }
            }
        }
    }

    fn set_value(&mut self, value: ReferenceValue) {
        self.value = value;
        self.sink.emit(&self.value);
    }
}
