//! Popup window lifecycle: geometry, style replication, content projection
//! and closure detection for one secondary top-level surface.

mod controller;
mod geometry;
mod headless;
mod platform;
mod styles;

pub use controller::{
    CloseReason, LIVENESS_POLL_INTERVAL, PopupController, PopupEvent, PopupOptions, PopupSession,
    SessionId,
};
pub use geometry::{ScreenGeometry, SurfaceFeatures, centered_features};
pub use headless::{HeadlessPlatform, HeadlessSurface, SurfaceRecord};
pub use platform::{
    ContainerId, ContainerNode, PopupContent, Surface, SurfaceEvent, TimerId, WindowPlatform,
};
pub use styles::{HostDocument, StyleImport, StyleSheet, absolutize_urls, export_styles};
