//! In-memory window platform for embedding without a display, and for tests.

use std::{cell::RefCell, rc::Rc, time::Duration};

use ratatui::{buffer::Buffer, layout::Rect};

use super::{
    geometry::{ScreenGeometry, SurfaceFeatures},
    platform::{ContainerId, ContainerNode, Surface, SurfaceEvent, TimerId, WindowPlatform},
    styles::{HostDocument, StyleImport},
};

/// Everything the headless platform recorded about one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRecord {
    pub features: SurfaceFeatures,
    pub title: String,
    pub closed: bool,
    pub close_requests: usize,
    pub focus_requests: usize,
    pub styles: Vec<StyleImport>,
    pub listening: Vec<SurfaceEvent>,
    pub attached: Vec<ContainerId>,
    pub presented: usize,
    pub frame: Option<Buffer>,
}

impl SurfaceRecord {
    /// The last presented frame as text, one line per row, trailing blanks trimmed.
    pub fn text(&self) -> String {
        let Some(frame) = &self.frame else {
            return String::new();
        };
        let area = frame.area;
        (area.top()..area.bottom())
            .map(|y| {
                let line: String = (area.left()..area.right())
                    .filter_map(|x| frame.cell((x, y)).map(|cell| cell.symbol().to_string()))
                    .collect();
                line.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerRecord {
    id: TimerId,
    period: Duration,
    clears: usize,
}

#[derive(Debug, Default)]
struct HeadlessState {
    screen: Option<ScreenGeometry>,
    document: HostDocument,
    blocked: bool,
    surfaces: Vec<SurfaceRecord>,
    timers: Vec<TimerRecord>,
}

/// A window platform whose surfaces live in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPlatform {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessPlatform {
    pub fn new(screen: ScreenGeometry, document: HostDocument) -> Self {
        Self {
            state: Rc::new(RefCell::new(HeadlessState {
                screen: Some(screen),
                document,
                ..HeadlessState::default()
            })),
        }
    }

    /// Refuse new surfaces, like a popup blocker.
    pub fn block_popups(&self, blocked: bool) {
        self.state.borrow_mut().blocked = blocked;
    }

    pub fn surface_count(&self) -> usize {
        self.state.borrow().surfaces.len()
    }

    pub fn surface(&self, index: usize) -> Option<SurfaceRecord> {
        self.state.borrow().surfaces.get(index).cloned()
    }

    /// Close a surface the way a user would: no close request, no event.
    pub fn user_close(&self, index: usize) {
        if let Some(surface) = self.state.borrow_mut().surfaces.get_mut(index) {
            surface.closed = true;
        }
    }

    /// Timers that have been set and not cleared yet.
    pub fn active_timers(&self) -> Vec<TimerId> {
        self.state
            .borrow()
            .timers
            .iter()
            .filter(|timer| timer.clears == 0)
            .map(|timer| timer.id)
            .collect()
    }

    pub fn timer_period(&self, timer: TimerId) -> Option<Duration> {
        self.state
            .borrow()
            .timers
            .iter()
            .find(|record| record.id == timer)
            .map(|record| record.period)
    }

    pub fn clear_count(&self, timer: TimerId) -> usize {
        self.state
            .borrow()
            .timers
            .iter()
            .find(|record| record.id == timer)
            .map_or(0, |record| record.clears)
    }
}

impl WindowPlatform for HeadlessPlatform {
    type Surface = HeadlessSurface;

    fn screen(&self) -> ScreenGeometry {
        self.state
            .borrow()
            .screen
            .unwrap_or_else(|| ScreenGeometry::plain(1280, 800))
    }

    fn host_document(&self) -> HostDocument {
        self.state.borrow().document.clone()
    }

    fn open_surface(&mut self, features: &SurfaceFeatures, title: &str) -> Option<HeadlessSurface> {
        let mut state = self.state.borrow_mut();
        if state.blocked {
            return None;
        }
        state.surfaces.push(SurfaceRecord {
            features: *features,
            title: title.to_string(),
            closed: false,
            close_requests: 0,
            focus_requests: 0,
            styles: Vec::new(),
            listening: Vec::new(),
            attached: Vec::new(),
            presented: 0,
            frame: None,
        });
        Some(HeadlessSurface {
            index: state.surfaces.len() - 1,
            state: Rc::clone(&self.state),
        })
    }

    fn set_interval(&mut self, period: Duration) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.timers.len() as u64 + 1);
        state.timers.push(TimerRecord {
            id,
            period,
            clears: 0,
        });
        id
    }

    fn clear_interval(&mut self, timer: TimerId) {
        if let Some(record) = self
            .state
            .borrow_mut()
            .timers
            .iter_mut()
            .find(|record| record.id == timer)
        {
            record.clears += 1;
        }
    }
}

#[derive(Debug)]
pub struct HeadlessSurface {
    index: usize,
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessSurface {
    fn with<R>(&self, f: impl FnOnce(&mut SurfaceRecord) -> R) -> Option<R> {
        self.state.borrow_mut().surfaces.get_mut(self.index).map(f)
    }
}

impl Surface for HeadlessSurface {
    fn is_closed(&self) -> bool {
        self.with(|surface| surface.closed).unwrap_or(true)
    }

    fn close(&mut self) {
        self.with(|surface| {
            surface.close_requests += 1;
            surface.closed = true;
        });
    }

    fn focus(&mut self) {
        self.with(|surface| surface.focus_requests += 1);
    }

    fn import_styles(&mut self, styles: &[StyleImport]) {
        self.with(|surface| surface.styles.extend_from_slice(styles));
    }

    fn listen(&mut self, events: &[SurfaceEvent]) {
        self.with(|surface| surface.listening.extend_from_slice(events));
    }

    fn unlisten_all(&mut self) {
        self.with(|surface| surface.listening.clear());
    }

    fn body_area(&self) -> Rect {
        self.with(|surface| {
            Rect::new(
                0,
                0,
                u16::try_from(surface.features.width).unwrap_or(u16::MAX),
                u16::try_from(surface.features.height).unwrap_or(u16::MAX),
            )
        })
        .unwrap_or_default()
    }

    fn attach(&mut self, container: &ContainerNode) {
        self.with(|surface| surface.attached.push(container.id()));
    }

    fn present(&mut self, container: &ContainerNode) {
        self.with(|surface| {
            surface.presented += 1;
            surface.frame = Some(container.buffer().clone());
        });
    }
}
