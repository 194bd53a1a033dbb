//! Canvas interaction engine for the collaborative whiteboard.
//!
//! This crate owns everything a client needs to interpret input on a shared
//! board: translating pointer and keyboard events into board mutations,
//! maintaining camera state for pan/zoom, hit-testing entities, tracking the
//! selection, and deriving a render-ready scene. It performs no I/O. The host
//! is responsible for wiring input events to the engine and persisting the
//! resulting [`engine::Action`]s to the remote store.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Interaction controller ([`engine::EngineCore`]) and its [`engine::Action`]s |
//! | [`doc`] | Entity records, sparse patches, and the in-memory [`doc::DocStore`] |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`selection`] | Normalized single/multi selection |
//! | [`hit`] | Hit-testing and marquee geometry |
//! | [`render`] | Scene derivation and connector geometry |
//! | [`consts`] | Shared constants (zoom limits, minimum sizes, defaults) |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod render;
pub mod selection;
