//! Window platform backed by the terminal: popups are bordered overlays
//! composited over the host pane, timers are fired by the event loop.

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
    time::{Duration, Instant},
};

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear},
};
use tracing::debug;

use crate::window::{
    ContainerNode, HostDocument, ScreenGeometry, StyleImport, Surface, SurfaceEvent,
    SurfaceFeatures, TimerId, WindowPlatform,
};

#[derive(Debug)]
struct Overlay {
    features: SurfaceFeatures,
    title: String,
    closed: bool,
    focused: bool,
    listening: bool,
    frame: Option<Buffer>,
}

#[derive(Debug)]
struct Timer {
    id: TimerId,
    period: Duration,
    next_due: Instant,
}

#[derive(Debug, Default)]
struct TerminalState {
    width: u16,
    height: u16,
    overlays: Vec<Overlay>,
    timers: Vec<Timer>,
    issued_timers: u64,
    pending: VecDeque<SurfaceEvent>,
}

impl TerminalState {
    fn active_mut(&mut self) -> Option<&mut Overlay> {
        self.overlays.iter_mut().rev().find(|overlay| !overlay.closed)
    }

    fn push_event(&mut self, index: usize, event: SurfaceEvent) {
        if self.overlays.get(index).is_some_and(|overlay| overlay.listening) {
            self.pending.push_back(event);
        }
    }
}

/// Clones share the same overlays and timers.
#[derive(Debug, Clone, Default)]
pub struct TerminalPlatform {
    state: Rc<RefCell<TerminalState>>,
}

impl TerminalPlatform {
    pub fn new(width: u16, height: u16) -> Self {
        let platform = Self::default();
        platform.resize(width, height);
        platform
    }

    pub fn resize(&self, width: u16, height: u16) {
        let mut state = self.state.borrow_mut();
        state.width = width;
        state.height = height;
    }

    /// Timers whose period elapsed by `now`; each is rescheduled.
    pub fn due_timers(&self, now: Instant) -> Vec<TimerId> {
        let mut state = self.state.borrow_mut();
        state
            .timers
            .iter_mut()
            .filter(|timer| timer.next_due <= now)
            .map(|timer| {
                timer.next_due = now + timer.period;
                timer.id
            })
            .collect()
    }

    /// Time until the next timer is due, if any is running.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.state
            .borrow()
            .timers
            .iter()
            .map(|timer| timer.next_due.saturating_duration_since(now))
            .min()
    }

    pub fn take_events(&self) -> Vec<SurfaceEvent> {
        self.state.borrow_mut().pending.drain(..).collect()
    }

    pub fn popup_focused(&self) -> bool {
        self.state
            .borrow()
            .overlays
            .iter()
            .any(|overlay| !overlay.closed && overlay.focused)
    }

    /// The user dismissed the popup. No event is pushed; the liveness poll notices.
    pub fn dismiss_active(&self) {
        if let Some(overlay) = self.state.borrow_mut().active_mut() {
            overlay.closed = true;
            overlay.focused = false;
        }
    }

    /// Hand keyboard focus back to the host pane.
    pub fn blur_active(&self) {
        let mut state = self.state.borrow_mut();
        let Some(index) = state
            .overlays
            .iter()
            .rposition(|overlay| !overlay.closed && overlay.focused)
        else {
            return;
        };
        state.overlays[index].focused = false;
        state.push_event(index, SurfaceEvent::Blur);
    }

    pub fn render_overlays(&self, frame: &mut Frame<'_>) {
        let bounds = frame.area();
        let state = self.state.borrow();
        for overlay in state.overlays.iter().filter(|overlay| !overlay.closed) {
            let area = overlay_area(&overlay.features).intersection(bounds);
            if area.is_empty() {
                continue;
            }
            frame.render_widget(Clear, area);
            let border = if overlay.focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let block = Block::default()
                .title(overlay.title.as_str())
                .borders(Borders::ALL)
                .border_style(border);
            let inner = block.inner(area);
            frame.render_widget(block, area);
            if let Some(content) = &overlay.frame {
                blit(content, inner, frame.buffer_mut());
            }
        }
    }
}

fn overlay_area(features: &SurfaceFeatures) -> Rect {
    let clamp = |value: i64| u16::try_from(value.max(0)).unwrap_or(u16::MAX);
    Rect::new(
        clamp(i64::from(features.left)),
        clamp(i64::from(features.top)),
        clamp(i64::from(features.width)),
        clamp(i64::from(features.height)),
    )
}

fn blit(source: &Buffer, target: Rect, buf: &mut Buffer) {
    let width = target.width.min(source.area.width);
    let height = target.height.min(source.area.height);
    for y in 0..height {
        for x in 0..width {
            let Some(cell) = source.cell((source.area.x + x, source.area.y + y)) else {
                continue;
            };
            if let Some(slot) = buf.cell_mut((target.x + x, target.y + y)) {
                *slot = cell.clone();
            }
        }
    }
}

impl WindowPlatform for TerminalPlatform {
    type Surface = TerminalSurface;

    fn screen(&self) -> ScreenGeometry {
        let state = self.state.borrow();
        ScreenGeometry::plain(u32::from(state.width), u32::from(state.height))
    }

    fn host_document(&self) -> HostDocument {
        HostDocument {
            origin: "terminal://refpicker".to_string(),
            pathname: "/".to_string(),
            stylesheets: Vec::new(),
        }
    }

    fn open_surface(&mut self, features: &SurfaceFeatures, title: &str) -> Option<TerminalSurface> {
        let mut state = self.state.borrow_mut();
        if features.width < 3 || features.height < 3 {
            return None;
        }
        state.overlays.push(Overlay {
            features: *features,
            title: title.to_string(),
            closed: false,
            focused: false,
            listening: false,
            frame: None,
        });
        Some(TerminalSurface {
            index: state.overlays.len() - 1,
            state: Rc::clone(&self.state),
        })
    }

    fn set_interval(&mut self, period: Duration) -> TimerId {
        let mut state = self.state.borrow_mut();
        state.issued_timers += 1;
        let id = TimerId(state.issued_timers);
        state.timers.push(Timer {
            id,
            period,
            next_due: Instant::now() + period,
        });
        id
    }

    fn clear_interval(&mut self, timer: TimerId) {
        self.state
            .borrow_mut()
            .timers
            .retain(|record| record.id != timer);
    }
}

#[derive(Debug)]
pub struct TerminalSurface {
    index: usize,
    state: Rc<RefCell<TerminalState>>,
}

impl TerminalSurface {
    fn with<R>(&self, f: impl FnOnce(&mut Overlay) -> R) -> Option<R> {
        self.state.borrow_mut().overlays.get_mut(self.index).map(f)
    }
}

impl Surface for TerminalSurface {
    fn is_closed(&self) -> bool {
        self.with(|overlay| overlay.closed).unwrap_or(true)
    }

    fn close(&mut self) {
        self.with(|overlay| {
            overlay.closed = true;
            overlay.focused = false;
        });
    }

    fn focus(&mut self) {
        let mut state = self.state.borrow_mut();
        let Some(overlay) = state.overlays.get_mut(self.index) else {
            return;
        };
        if overlay.closed || overlay.focused {
            return;
        }
        overlay.focused = true;
        state.push_event(self.index, SurfaceEvent::Focus);
    }

    fn import_styles(&mut self, styles: &[StyleImport]) {
        debug!(count = styles.len(), "terminal overlays ignore host stylesheets");
    }

    fn listen(&mut self, _events: &[SurfaceEvent]) {
        self.with(|overlay| overlay.listening = true);
    }

    fn unlisten_all(&mut self) {
        self.with(|overlay| overlay.listening = false);
    }

    fn body_area(&self) -> Rect {
        self.with(|overlay| {
            let area = overlay_area(&overlay.features);
            Rect::new(
                0,
                0,
                area.width.saturating_sub(2),
                area.height.saturating_sub(2),
            )
        })
        .unwrap_or_default()
    }

    fn attach(&mut self, _container: &ContainerNode) {}

    fn present(&mut self, container: &ContainerNode) {
        self.with(|overlay| overlay.frame = Some(container.buffer().clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(platform: &mut TerminalPlatform) -> TerminalSurface {
        let features = SurfaceFeatures {
            left: 10,
            top: 5,
            width: 40,
            height: 12,
        };
        platform.open_surface(&features, "Pick").expect("surface")
    }

    #[test]
    fn body_excludes_the_border() {
        let mut platform = TerminalPlatform::new(80, 24);
        let surface = open(&mut platform);
        assert_eq!(surface.body_area(), Rect::new(0, 0, 38, 10));
    }

    #[test]
    fn focus_and_blur_are_pushed_to_listeners() {
        let mut platform = TerminalPlatform::new(80, 24);
        let mut surface = open(&mut platform);
        surface.focus();
        platform.blur_active();
        assert!(platform.take_events().is_empty());
        surface.listen(&SurfaceEvent::ALL);
        surface.focus();
        platform.blur_active();
        assert_eq!(
            platform.take_events(),
            vec![SurfaceEvent::Focus, SurfaceEvent::Blur]
        );
        assert!(!platform.popup_focused());
    }

    #[test]
    fn dismissal_is_silent() {
        let mut platform = TerminalPlatform::new(80, 24);
        let mut surface = open(&mut platform);
        surface.listen(&SurfaceEvent::ALL);
        platform.dismiss_active();
        assert!(surface.is_closed());
        assert!(platform.take_events().is_empty());
    }

    #[test]
    fn timers_fire_after_their_period() {
        let mut platform = TerminalPlatform::new(80, 24);
        let timer = platform.set_interval(Duration::from_millis(100));
        let now = Instant::now();
        assert!(platform.due_timers(now).is_empty());
        assert_eq!(platform.due_timers(now + Duration::from_millis(150)), vec![timer]);
        platform.clear_interval(timer);
        assert!(platform.next_deadline(now).is_none());
    }
}
