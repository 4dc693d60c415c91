use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    thread,
    time::Instant,
};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::layout::Rect;
use tracing::debug;

use crate::{
    binder::{FieldState, ReferenceFieldBinder},
    domain::ReferenceValue,
    notify::NotificationLog,
    query::{ListingSource, ListingTicket, RemotePage},
};

use super::{
    input::{
        HOST_HELP, HostCommand, POPUP_HELP, PopupCommand, classify_host, classify_popup,
        next_page_size,
    },
    options::UiOptions,
    platform::TerminalPlatform,
    status::StatusLine,
    terminal::TerminalGuard,
    view::{HostView, draw_host},
};

type ListingOutcome = (ListingTicket, Result<RemotePage>);

pub(crate) type SharedSource = Arc<dyn ListingSource + Send + Sync>;

pub(crate) struct App {
    binder: ReferenceFieldBinder<TerminalPlatform>,
    platform: TerminalPlatform,
    source: SharedSource,
    results_tx: Sender<ListingOutcome>,
    results_rx: Receiver<ListingOutcome>,
    notes: NotificationLog,
    notes_seen: usize,
    options: UiOptions,
    status: StatusLine,
    last_state: FieldState,
    should_quit: bool,
}

impl App {
    pub fn new(
        binder: ReferenceFieldBinder<TerminalPlatform>,
        platform: TerminalPlatform,
        source: SharedSource,
        notes: NotificationLog,
        options: UiOptions,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::channel();
        let last_state = binder.state();
        Self {
            binder,
            platform,
            source,
            results_tx,
            results_rx,
            notes,
            notes_seen: 0,
            options,
            status: StatusLine::new(),
            last_state,
            should_quit: false,
        }
    }

    pub fn run(&mut self) -> Result<ReferenceValue> {
        let mut terminal = TerminalGuard::enter()?;
        let (width, height) = terminal.cells()?;
        self.platform.resize(width, height);

        while !self.should_quit {
            self.pump();
            terminal.draw(|frame| {
                let help = self
                    .options
                    .show_help
                    .then_some(if self.platform.popup_focused() {
                        POPUP_HELP
                    } else {
                        HOST_HELP
                    });
                draw_host(
                    frame,
                    &self.binder,
                    HostView {
                        status: self.status.message(),
                        help,
                        host_focused: !self.platform.popup_focused(),
                    },
                );
                self.platform.render_overlays(frame);
            })?;

            let timeout = self
                .platform
                .next_deadline(Instant::now())
                .map_or(self.options.tick_rate, |due| due.min(self.options.tick_rate));
            if !event::poll(timeout)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize(width, height) => {
                    self.platform.resize(width, height);
                    terminal.resize(Rect::new(0, 0, width, height))?;
                }
                Event::Mouse(_) | Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
            }
        }

        self.binder.on_host_unload();
        Ok(self.binder.value().clone())
    }

    /// Feed everything that happened outside of key handling into the binder.
    fn pump(&mut self) {
        while let Ok((ticket, outcome)) = self.results_rx.try_recv() {
            if !self.binder.complete_listing(&ticket, outcome) {
                debug!(seq = ticket.seq, "listing result dropped");
            }
        }
        for timer in self.platform.due_timers(Instant::now()) {
            self.binder.on_timer(timer);
        }
        for event in self.platform.take_events() {
            self.binder.on_surface_event(event);
        }

        let entries = self.notes.entries();
        if let Some(note) = entries.get(self.notes_seen..).and_then(<[_]>::last) {
            self.status.set_raw(format!("{}: {}", note.title, note.description));
        }
        self.notes_seen = entries.len();

        let state = self.binder.state();
        if self.last_state == FieldState::Selecting && state != FieldState::Selecting {
            self.status.ready();
        }
        self.last_state = state;
    }

    fn dispatch(&self, ticket: Option<ListingTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let source = Arc::clone(&self.source);
        let results = self.results_tx.clone();
        thread::spawn(move || {
            let outcome = ticket.run(&source);
            let _ = results.send((ticket, outcome));
        });
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.platform.popup_focused() {
            self.handle_popup_key(&key);
        } else {
            self.handle_host_key(&key);
        }
    }

    fn handle_host_key(&mut self, key: &KeyEvent) {
        match classify_host(key) {
            HostCommand::Choose => {
                if !self.binder.is_editable() {
                    self.status.read_only();
                } else if self.binder.state() == FieldState::Selecting {
                    self.binder.toggle_focus();
                } else if self.binder.state() == FieldState::Populated {
                    self.status.remove_first();
                } else if let Some(ticket) = self.binder.choose() {
                    self.status.selecting();
                    self.dispatch(Some(ticket));
                }
            }
            HostCommand::Remove => {
                if !self.binder.is_editable() {
                    self.status.read_only();
                } else if self.binder.remove() {
                    self.status.value_updated(None);
                }
            }
            HostCommand::FocusPopup => {
                self.binder.toggle_focus();
            }
            HostCommand::Quit => self.should_quit = true,
            HostCommand::None => {}
        }
    }

    fn handle_popup_key(&mut self, key: &KeyEvent) {
        let search = self
            .binder
            .selector()
            .map(|selector| selector.search_text().to_string())
            .unwrap_or_default();
        let ticket = match classify_popup(key) {
            PopupCommand::Type(ch) => {
                let mut text = search;
                text.push(ch);
                self.binder.search(text)
            }
            PopupCommand::Erase => {
                let mut text = search;
                if text.pop().is_none() {
                    return;
                }
                self.binder.search(text)
            }
            PopupCommand::Highlight(delta) => {
                self.binder.move_highlight(delta);
                None
            }
            PopupCommand::NextPage => self.binder.next_page(),
            PopupCommand::PreviousPage => self.binder.previous_page(),
            PopupCommand::CycleSort => self.binder.cycle_sort(),
            PopupCommand::CyclePageSize => {
                let Some(current) = self.binder.selector().map(|selector| selector.page_size())
                else {
                    return;
                };
                self.binder.set_page_size(next_page_size(current))
            }
            PopupCommand::Refresh => self.binder.refresh(),
            PopupCommand::Pick => {
                if self.binder.pick_highlighted() {
                    self.status.value_updated(self.binder.value().uid());
                    self.last_state = self.binder.state();
                }
                None
            }
            PopupCommand::Dismiss => {
                self.platform.dismiss_active();
                None
            }
            PopupCommand::Blur => {
                self.platform.blur_active();
                None
            }
            PopupCommand::Quit => {
                self.should_quit = true;
                None
            }
            PopupCommand::None => None,
        };
        self.dispatch(ticket);
    }
}
