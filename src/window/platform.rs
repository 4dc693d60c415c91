use std::time::Duration;

use ratatui::{buffer::Buffer, layout::Rect};

use super::{
    geometry::{ScreenGeometry, SurfaceFeatures},
    styles::{HostDocument, StyleImport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

/// Events a popup surface pushes to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceEvent {
    Focus,
    Blur,
    /// The surface's document is being discarded.
    Unloading,
}

impl SurfaceEvent {
    pub const ALL: [SurfaceEvent; 3] = [
        SurfaceEvent::Focus,
        SurfaceEvent::Blur,
        SurfaceEvent::Unloading,
    ];
}

/// The node in the popup's body that host content is projected into.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerNode {
    id: ContainerId,
    buffer: Buffer,
}

impl ContainerNode {
    pub fn new(id: ContainerId, area: Rect) -> Self {
        Self {
            id,
            buffer: Buffer::empty(area),
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn area(&self) -> Rect {
        self.buffer.area
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Clear the children, resizing to `area` first when the body changed size.
    pub(crate) fn clear(&mut self, area: Rect) {
        if self.buffer.area != area {
            self.buffer.resize(area);
        }
        self.buffer.reset();
    }

    pub(crate) fn project(&mut self, content: &dyn PopupContent) {
        let area = self.buffer.area;
        content.project(area, &mut self.buffer);
    }
}

/// Anything that can render itself into a popup container.
pub trait PopupContent {
    fn project(&self, area: Rect, buf: &mut Buffer);
}

impl<F> PopupContent for F
where
    F: Fn(Rect, &mut Buffer),
{
    fn project(&self, area: Rect, buf: &mut Buffer) {
        self(area, buf)
    }
}

/// A secondary top-level surface created by the platform.
pub trait Surface {
    fn is_closed(&self) -> bool;
    fn close(&mut self);
    fn focus(&mut self);
    fn import_styles(&mut self, styles: &[StyleImport]);
    fn listen(&mut self, events: &[SurfaceEvent]);
    fn unlisten_all(&mut self);
    /// Drawable area of the surface's body.
    fn body_area(&self) -> Rect;
    fn attach(&mut self, container: &ContainerNode);
    fn present(&mut self, container: &ContainerNode);
}

/// The windowing environment hosting the field.
pub trait WindowPlatform {
    type Surface: Surface;

    fn screen(&self) -> ScreenGeometry;
    fn host_document(&self) -> HostDocument;
    /// `None` when the platform refuses to open a new surface.
    fn open_surface(&mut self, features: &SurfaceFeatures, title: &str) -> Option<Self::Surface>;
    fn set_interval(&mut self, period: Duration) -> TimerId;
    fn clear_interval(&mut self, timer: TimerId);
}
