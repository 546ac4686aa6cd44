//! Drawing, snapping, and measurement engine for geo-referenced areas.
//!
//! The engine sits between a host map surface and the persisted area store.
//! It turns raw pointer events into polygons and radius markers, snaps
//! clicks to nearby building outlines, and keeps a live distance or area
//! measurement for the shape being drawn. The host only forwards events,
//! paints the [`render::RenderModel`], and persists the resulting
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`] facade routing host events |
//! | [`draw`] | Drawing state machine and session |
//! | [`snap`] | Snap-to-building engine |
//! | [`features`] | Building-outline index and the source trait |
//! | [`refresh`] | Last-request-wins background outline refresh |
//! | [`measure`] | Distance, area, and perimeter formatting |
//! | [`areas`] | Drawn-area records and their repository |
//! | [`geo`] | Geodesic distance, polygon area, segment projection |
//! | [`viewport`] | Bounds, zoom, and pixel/meter scale |
//! | [`input`] | Host event types |
//! | [`render`] | Render model handed to the host |
//! | [`config`] | Engine configuration from the environment |
//! | [`consts`] | Shared numeric constants |

pub mod areas;
pub mod config;
pub mod consts;
pub mod draw;
pub mod engine;
pub mod features;
pub mod geo;
pub mod input;
pub mod measure;
pub mod refresh;
pub mod render;
pub mod snap;
pub mod viewport;
