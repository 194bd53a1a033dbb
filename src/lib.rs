//! Remote sync host for the collaborative whiteboard.
//!
//! Binds a [`canvas`] engine to a remote record store with a per-board
//! change feed. Local edits are applied optimistically and written through;
//! remote changes are merged idempotently, so every client's view converges.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Remote sync adapter ([`session::BoardSession`]) |
//! | [`store`] | Record-store and change-feed contracts, records and patches |
//! | [`feed`] | Typed change events decoded from raw feed payloads |
//! | [`memory`] | In-memory store and feed for tests and local runs |
//! | [`presence`] | Throttled cursor publishing and cursor colors |
//! | [`text_save`] | When a text edit gets committed remotely |
//! | [`config`] | Environment-driven tuning knobs |
//! | [`error`] | Error enums and their stable codes |
//! | [`logging`] | `tracing` subscriber bootstrap |

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod memory;
pub mod presence;
pub mod session;
pub mod store;
pub mod text_save;

pub use config::SyncConfig;
pub use error::{ErrorCode, FeedError, StoreError, SyncError};
pub use memory::MemoryStore;
pub use session::{BoardSession, SyncStats};
pub use store::{AuthUser, Backend, Board, ChangeFeed, Collection, RecordStore, Role};
