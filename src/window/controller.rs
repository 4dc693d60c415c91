use std::{collections::VecDeque, time::Duration};

use tracing::{debug, warn};

use crate::error::ReferenceError;

use super::{
    geometry::{SurfaceFeatures, centered_features},
    platform::{
        ContainerId, ContainerNode, PopupContent, Surface, SurfaceEvent, TimerId, WindowPlatform,
    },
    styles::export_styles,
};

/// Closure is not always pushed by the platform; liveness is polled at this rate.
pub const LIVENESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupOptions {
    pub width: u32,
    pub height: u32,
    pub wants_focus: bool,
    pub title: String,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            wants_focus: true,
            title: "Choose existing entry".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Requested,
    UserClosed,
    HostUnloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupEvent {
    Closed {
        session: SessionId,
        reason: CloseReason,
    },
    FocusChanged {
        session: SessionId,
        focused: bool,
    },
}

#[derive(Debug)]
pub struct PopupSession {
    id: SessionId,
    features: SurfaceFeatures,
    focused: bool,
    container: ContainerNode,
}

impl PopupSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn features(&self) -> SurfaceFeatures {
        self.features
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn container(&self) -> &ContainerNode {
        &self.container
    }
}

struct LiveSession<S> {
    session: PopupSession,
    surface: S,
    poll: TimerId,
}

/// Owns at most one popup surface and bridges its lifecycle to the host.
pub struct PopupController<P: WindowPlatform> {
    platform: P,
    live: Option<LiveSession<P::Surface>>,
    sessions_opened: u64,
    events: VecDeque<PopupEvent>,
}

impl<P: WindowPlatform> PopupController<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            live: None,
            sessions_opened: 0,
            events: VecDeque::new(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn session(&self) -> Option<&PopupSession> {
        self.live.as_ref().map(|live| &live.session)
    }

    pub fn is_open(&self) -> bool {
        self.live.is_some()
    }

    /// Open the popup and project `content` into it. Returns the live session
    /// unchanged when one is already open.
    pub fn open(
        &mut self,
        content: &dyn PopupContent,
        options: &PopupOptions,
    ) -> Result<SessionId, ReferenceError> {
        if let Some(live) = &self.live {
            return Ok(live.session.id);
        }

        let features = centered_features(&self.platform.screen(), options.width, options.height);
        let Some(mut surface) = self.platform.open_surface(&features, &options.title) else {
            warn!(%features, "platform refused to open the popup surface");
            return Err(ReferenceError::PopupBlocked);
        };

        surface.import_styles(&export_styles(&self.platform.host_document()));
        surface.listen(&SurfaceEvent::ALL);
        let poll = self.platform.set_interval(LIVENESS_POLL_INTERVAL);

        self.sessions_opened += 1;
        let id = SessionId(self.sessions_opened);
        let mut container = ContainerNode::new(ContainerId(id.0), surface.body_area());
        surface.attach(&container);
        container.project(content);
        surface.present(&container);

        debug!(session = id.0, %features, "popup opened");
        self.live = Some(LiveSession {
            session: PopupSession {
                id,
                features,
                focused: false,
                container,
            },
            surface,
            poll,
        });
        if options.wants_focus {
            self.set_focus(true);
        }
        Ok(id)
    }

    /// Re-render into the existing container. `false` when no popup is live.
    pub fn render(&mut self, content: &dyn PopupContent) -> bool {
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        if live.surface.is_closed() {
            return false;
        }
        let area = live.surface.body_area();
        live.session.container.clear(area);
        live.session.container.project(content);
        live.surface.present(&live.session.container);
        true
    }

    pub fn set_focus(&mut self, want_focus: bool) {
        if !want_focus {
            return;
        }
        if let Some(live) = self.live.as_mut()
            && !live.surface.is_closed()
        {
            live.surface.focus();
        }
    }

    pub fn close(&mut self) {
        self.teardown(CloseReason::Requested);
    }

    /// Liveness poll; fires `Closed` the first time the surface is seen dead.
    pub fn on_timer(&mut self, timer: TimerId) {
        let dead = match &self.live {
            Some(live) if live.poll == timer => live.surface.is_closed(),
            _ => false,
        };
        if dead {
            self.teardown(CloseReason::UserClosed);
        }
    }

    pub fn on_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Focus | SurfaceEvent::Blur => {
                let focused = event == SurfaceEvent::Focus;
                if let Some(live) = self.live.as_mut()
                    && live.session.focused != focused
                {
                    live.session.focused = focused;
                    self.events.push_back(PopupEvent::FocusChanged {
                        session: live.session.id,
                        focused,
                    });
                }
            }
            SurfaceEvent::Unloading => self.teardown(CloseReason::UserClosed),
        }
    }

    /// The host document is going away; do not leave the popup orphaned.
    pub fn on_host_unload(&mut self) {
        self.teardown(CloseReason::HostUnloaded);
    }

    pub fn next_event(&mut self) -> Option<PopupEvent> {
        self.events.pop_front()
    }

    fn teardown(&mut self, reason: CloseReason) {
        let Some(mut live) = self.live.take() else {
            return;
        };
        self.platform.clear_interval(live.poll);
        live.surface.unlisten_all();
        if !live.surface.is_closed() {
            live.surface.close();
        }
        debug!(session = live.session.id.0, ?reason, "popup closed");
        self.events.push_back(PopupEvent::Closed {
            session: live.session.id,
            reason,
        });
    }
}

impl<P: WindowPlatform> Drop for PopupController<P> {
    fn drop(&mut self) {
        self.teardown(CloseReason::Requested);
    }
}
