//! Board session: the bridge between one open board and the remote backend.
//!
//! DESIGN
//! ======
//! A session owns the canvas engine for a single board. Every handler runs
//! the engine first, so the optimistic local mutation is in place before the
//! matching remote write is issued, then writes the returned actions through
//! to the record store in order.
//!
//! Remote changes arrive on the board's change feed and are decoded into
//! typed events and merged with the engine's idempotent mutators, so the
//! echo of our own writes is a no-op.
//!
//! Opening a board subscribes before the bulk fetch. Anything written in
//! between shows up both in the snapshot and on the feed, and the second
//! copy merges away.
//!
//! ERROR HANDLING
//! ==============
//! Remote write failures are logged and counted, never retried or rolled
//! back: local state may diverge from the store until the next reload.
//! When the feed closes, the session resubscribes with exponential back-off
//! and re-seeds from a fresh fetch to recover anything it missed.
//!
//! LIFECYCLE
//! =========
//! [`BoardSession::close`] flushes pending text, unsubscribes, and marks
//! local presence inactive. Dropping a session without closing it makes the
//! same cleanup a best-effort background task.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use canvas::camera::Point;
use canvas::doc::{Cursor, EntityId, EntityKind, EntityRef, NotePatch, Stroke};
use canvas::engine::{Action, EngineCore};
use canvas::input::{Key, Modifiers, PointerEvent, Tool, WheelDelta};
use canvas::render::Scene;
use rand::Rng;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::error::{ErrorCode, StoreError, SyncError};
use crate::feed::ChangeEvent;
use crate::presence::PresenceBroadcaster;
use crate::store::{AuthUser, Backend, Board, Collection, Patch, RawChange, Record, RecordStore, Subscription, into_snapshot};
use crate::text_save::TextSavePolicy;

/// Counters for what a session has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Feed events that changed local state.
    pub applied: u64,
    /// Feed events that were already reflected locally.
    pub duplicates: u64,
    /// Feed payloads that could not be decoded.
    pub decode_failures: u64,
    /// Remote writes that failed. Local state was kept.
    pub write_failures: u64,
    /// Successful feed resubscriptions.
    pub reconnects: u64,
    /// Cursor records written.
    pub presence_writes: u64,
}

pub struct BoardSession {
    backend: Backend,
    config: SyncConfig,
    user: AuthUser,
    board: Board,
    engine: EngineCore,
    subscription: Option<Subscription>,
    presence: PresenceBroadcaster,
    text: TextSavePolicy,
    stats: SyncStats,
    closed: bool,
}

impl BoardSession {
    /// Authorize `user` for the board, subscribe to its feed, and seed the
    /// engine from a bulk fetch.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unauthorized`] if the user is neither owner nor
    /// collaborator, [`SyncError::BoardNotFound`] for an unknown board, or
    /// [`SyncError::Store`] if the subscription or fetch fails.
    pub async fn open(backend: Backend, user: AuthUser, board_id: Uuid, config: SyncConfig) -> Result<Self, SyncError> {
        let access = match backend.store.load_board(board_id).await {
            Ok(access) => access,
            Err(StoreError::NotFound { .. }) => return Err(SyncError::BoardNotFound(board_id)),
            Err(StoreError::Unauthorized) => return Err(SyncError::Unauthorized { board_id }),
            Err(e) => return Err(e.into()),
        };
        if !access.permits(user.id) {
            warn!(%board_id, user_id = %user.id, "board open refused");
            return Err(SyncError::Unauthorized { board_id });
        }

        let subscription = backend.feed.subscribe(board_id).await?;
        let snapshot = match fetch_snapshot(backend.store.as_ref(), board_id).await {
            Ok(records) => into_snapshot(records),
            Err(e) => {
                backend.feed.unsubscribe(board_id, subscription.id).await;
                return Err(e.into());
            }
        };

        let mut engine = EngineCore::new(board_id, user.id);
        engine.load_snapshot(snapshot);
        info!(
            %board_id,
            user_id = %user.id,
            notes = engine.doc.notes().len(),
            connectors = engine.doc.connectors().len(),
            strokes = engine.doc.strokes().len(),
            "board session opened"
        );

        Ok(Self {
            presence: PresenceBroadcaster::new(board_id, &user, config.cursor_throttle),
            text: TextSavePolicy::new(config.text_save_debounce),
            backend,
            config,
            user,
            board: access.board,
            engine,
            subscription: Some(subscription),
            stats: SyncStats::default(),
            closed: false,
        })
    }

    // =============================================================================
    // INPUT
    // =============================================================================

    pub async fn pointer_down(&mut self, ev: PointerEvent) -> Vec<Action> {
        let actions = self.engine.on_pointer_down(ev);
        self.dispatch(actions).await
    }

    pub async fn pointer_move(&mut self, ev: PointerEvent) -> Vec<Action> {
        let actions = self.engine.on_pointer_move(ev);
        self.dispatch(actions).await
    }

    pub async fn pointer_up(&mut self, ev: PointerEvent) -> Vec<Action> {
        let actions = self.engine.on_pointer_up(ev);
        self.dispatch(actions).await
    }

    /// Pointer left the canvas. Finishes the active gesture as a release would.
    pub async fn pointer_leave(&mut self) -> Vec<Action> {
        let actions = self.engine.on_pointer_leave();
        self.dispatch(actions).await
    }

    pub async fn wheel(&mut self, screen: Point, delta: WheelDelta) -> Vec<Action> {
        let actions = self.engine.on_wheel(screen, delta);
        self.dispatch(actions).await
    }

    pub async fn key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let actions = self.engine.on_key_down(key, modifiers);
        self.dispatch(actions).await
    }

    pub async fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let actions = self.engine.set_tool(tool);
        self.dispatch(actions).await
    }

    pub fn set_stroke_color(&mut self, color: impl Into<String>) {
        self.engine.set_stroke_color(color);
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.engine.set_stroke_width(width);
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.engine.zoom_in()
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.engine.zoom_out()
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.engine.reset_view()
    }

    // =============================================================================
    // COMMANDS
    // =============================================================================

    pub async fn create_connector_between(&mut self, from: EntityId, to: EntityId) -> Vec<Action> {
        let actions = self.engine.create_connector_between(from, to);
        self.dispatch(actions).await
    }

    pub async fn delete_selection(&mut self) -> Vec<Action> {
        let actions = self.engine.delete_selection();
        self.dispatch(actions).await
    }

    pub async fn delete_item(&mut self, id: EntityId) -> Vec<Action> {
        let actions = self.engine.delete_item(&id);
        self.dispatch(actions).await
    }

    pub fn select_all(&mut self) -> Vec<Action> {
        self.engine.select_all()
    }

    /// Replace a note's text. The local note changes now; the remote write
    /// follows the text-save policy.
    pub async fn set_text(&mut self, id: EntityId, content: impl Into<String>) -> Vec<Action> {
        let actions = self.engine.set_text(&id, content);
        if actions.is_empty() {
            return actions;
        }
        let content = self.engine.note(&id).map(|n| n.content.clone()).unwrap_or_default();
        for due in self.text.on_edit(id, &content, Instant::now()) {
            self.commit_text(due).await;
        }
        actions
    }

    /// Commit any deferred text edit now (the editor lost focus).
    pub async fn flush_text(&mut self) {
        if let Some(id) = self.text.flush() {
            self.commit_text(id).await;
        }
    }

    // =============================================================================
    // TIMERS
    // =============================================================================

    /// Publish throttled presence and debounced text whose time has come.
    pub async fn tick(&mut self) {
        let now = Instant::now();
        if let Some(cursor) = self.presence.flush_due(now) {
            self.write_cursor(cursor).await;
        }
        if let Some(id) = self.text.take_due(now) {
            self.commit_text(id).await;
        }
    }

    /// Earliest instant at which [`Self::tick`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.presence.next_deadline(), self.text.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // =============================================================================
    // CHANGE FEED
    // =============================================================================

    /// Apply every change already buffered on the feed without waiting.
    /// Returns how many changed local state; a re-seed after reconnect counts as one.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::FeedClosed`] if the feed closed and every
    /// resubscribe attempt failed.
    pub async fn sync_pending(&mut self) -> Result<usize, SyncError> {
        let mut changed = 0;
        loop {
            let polled = match self.subscription.as_mut() {
                Some(sub) => sub.events.try_recv(),
                None => Err(TryRecvError::Disconnected),
            };
            match polled {
                Ok(raw) => {
                    if self.apply_raw(raw) {
                        changed += 1;
                    }
                }
                Err(TryRecvError::Empty) => return Ok(changed),
                Err(TryRecvError::Disconnected) => {
                    self.reconnect().await?;
                    changed += 1;
                }
            }
        }
    }

    /// Wait for the next change and apply it. Returns whether local state changed.
    ///
    /// Cancel-safe, so it can sit in a `select!` next to input and [`Self::next_deadline`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::FeedClosed`] if the feed closed and every
    /// resubscribe attempt failed.
    pub async fn next_change(&mut self) -> Result<bool, SyncError> {
        let received = match self.subscription.as_mut() {
            Some(sub) => sub.events.recv().await,
            None => None,
        };
        match received {
            Some(raw) => Ok(self.apply_raw(raw)),
            None => {
                self.reconnect().await?;
                Ok(true)
            }
        }
    }

    fn apply_raw(&mut self, raw: RawChange) -> bool {
        let mut event = match ChangeEvent::from_raw(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), board_id = %self.board.id, "undecodable change skipped");
                self.stats.decode_failures += 1;
                return false;
            }
        };
        match &mut event {
            ChangeEvent::NoteDeleted(id) => {
                self.text.discard(*id);
            }
            // An echo of an earlier write must not roll back content still waiting on the debounce.
            ChangeEvent::NoteInserted(note) | ChangeEvent::NoteUpdated(note) if self.text.is_pending(note.id) => {
                if let Some(local) = self.engine.note(&note.id) {
                    note.content.clone_from(&local.content);
                }
            }
            _ => {}
        }
        let table = event.collection().table();
        let changed = event.apply(&mut self.engine);
        if changed {
            self.stats.applied += 1;
        } else {
            self.stats.duplicates += 1;
        }
        debug!(table, changed, "change applied");
        changed
    }

    async fn reconnect(&mut self) -> Result<(), SyncError> {
        self.subscription = None;
        let board_id = self.board.id;
        warn!(%board_id, "change feed closed; resubscribing");
        self.flush_text().await;

        for attempt in 0..self.config.feed_reconnect_attempts {
            tokio::time::sleep(self.backoff(attempt)).await;
            match self.resubscribe().await {
                Ok(()) => {
                    self.stats.reconnects += 1;
                    info!(%board_id, attempt, "change feed resubscribed");
                    return Ok(());
                }
                Err(e) => warn!(error = %e, code = e.error_code(), %board_id, attempt, "resubscribe failed"),
            }
        }
        error!(%board_id, attempts = self.config.feed_reconnect_attempts, "change feed reconnect exhausted");
        Err(SyncError::FeedClosed)
    }

    async fn resubscribe(&mut self) -> Result<(), StoreError> {
        let board_id = self.board.id;
        let subscription = self.backend.feed.subscribe(board_id).await?;
        let records = match fetch_snapshot(self.backend.store.as_ref(), board_id).await {
            Ok(records) => records,
            Err(e) => {
                self.backend.feed.unsubscribe(board_id, subscription.id).await;
                return Err(e);
            }
        };
        self.engine.load_snapshot(into_snapshot(records));
        self.subscription = Some(subscription);
        Ok(())
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.reconnect_delay(attempt);
        let spread = u64::try_from(base.as_millis() / 4).unwrap_or(0);
        base + Duration::from_millis(rand::rng().random_range(0..=spread))
    }

    // =============================================================================
    // WRITE-THROUGH
    // =============================================================================

    /// Persist each action in order, then hand all of them back to the caller.
    async fn dispatch(&mut self, actions: Vec<Action>) -> Vec<Action> {
        for action in &actions {
            self.persist(action).await;
        }
        actions
    }

    async fn persist(&mut self, action: &Action) {
        let board_id = self.board.id;
        let store = self.backend.store.clone();
        let (op, result) = match action {
            Action::NoteCreated(note) => ("note insert", store.insert(Record::Note(note.clone())).await.map(|_| ())),
            Action::NoteUpdated { id, fields } => {
                if fields.content.is_some() {
                    self.text.discard(*id);
                }
                ("note update", store.update(board_id, *id, Patch::Note(fields.clone())).await.map(|_| ()))
            }
            Action::ConnectorCreated(connector) => {
                ("connector insert", store.insert(Record::Connector(connector.clone())).await.map(|_| ()))
            }
            Action::ConnectorUpdated { id, fields } => {
                ("connector update", store.update(board_id, *id, Patch::Connector(fields.clone())).await.map(|_| ()))
            }
            Action::StrokeCreated(stroke) => {
                let stroke = self.stamp_stroke(stroke.clone());
                ("stroke insert", store.insert(Record::Stroke(stroke)).await.map(|_| ()))
            }
            Action::StrokeUpdated { id, fields } => {
                ("stroke update", store.update(board_id, *id, Patch::Stroke(fields.clone())).await.map(|_| ()))
            }
            Action::Deleted(entity) => {
                self.text.discard(entity.id);
                ("delete", store.delete(Collection::for_kind(entity.kind), board_id, entity.id).await)
            }
            Action::DeletedMany(entities) => {
                self.delete_batch(store.as_ref(), entities).await;
                return;
            }
            Action::CursorMoved(position) => {
                if let Some(cursor) = self.presence.on_move(*position, Instant::now()) {
                    self.write_cursor(cursor).await;
                }
                return;
            }
            Action::ToolChanged(_) | Action::SetCursor(_) | Action::RenderNeeded => return,
        };
        if let Err(e) = result {
            self.write_failed(op, &e);
        }
    }

    /// One batch delete per collection.
    async fn delete_batch(&mut self, store: &dyn RecordStore, entities: &[EntityRef]) {
        for kind in [EntityKind::Note, EntityKind::Connector, EntityKind::Stroke] {
            let ids: Vec<Uuid> = entities.iter().filter(|e| e.kind == kind).map(|e| e.id).collect();
            if ids.is_empty() {
                continue;
            }
            for id in &ids {
                self.text.discard(*id);
            }
            if let Err(e) = store.delete_many(Collection::for_kind(kind), self.board.id, &ids).await {
                self.write_failed("batch delete", &e);
            }
        }
    }

    /// Give a finished stroke its creation time, locally and in the store.
    fn stamp_stroke(&mut self, mut stroke: Stroke) -> Stroke {
        if stroke.created_at.is_none() {
            stroke.created_at = Some(now_ms());
            self.engine.doc.replace_stroke(stroke.clone());
        }
        stroke
    }

    async fn commit_text(&mut self, id: EntityId) {
        let Some(note) = self.engine.note(&id) else {
            return;
        };
        let patch = Patch::Note(NotePatch::content(note.content.clone()));
        if let Err(e) = self.backend.store.update(self.board.id, id, patch).await {
            self.write_failed("text update", &e);
        }
    }

    async fn write_cursor(&mut self, cursor: Cursor) {
        match self.backend.store.insert(Record::Cursor(cursor)).await {
            Ok(_) => {
                self.stats.presence_writes += 1;
                debug!(board_id = %self.board.id, "presence published");
            }
            Err(e) => self.write_failed("cursor upsert", &e),
        }
    }

    fn write_failed(&mut self, op: &'static str, e: &StoreError) {
        self.stats.write_failures += 1;
        error!(error = %e, code = e.error_code(), board_id = %self.board.id, op, "remote write failed; keeping local state");
    }

    // =============================================================================
    // TEARDOWN
    // =============================================================================

    /// Flush pending text, leave the feed, and mark local presence inactive.
    pub async fn close(mut self) {
        self.closed = true;
        self.flush_text().await;
        if let Some(subscription) = self.subscription.take() {
            self.backend.feed.unsubscribe(self.board.id, subscription.id).await;
        }
        if let Some(cursor) = self.presence.leave() {
            self.write_cursor(cursor).await;
        }
        info!(
            board_id = %self.board.id,
            user_id = %self.user.id,
            applied = self.stats.applied,
            write_failures = self.stats.write_failures,
            "board session closed"
        );
    }

    // =============================================================================
    // QUERIES
    // =============================================================================

    #[must_use]
    pub fn engine(&self) -> &EngineCore {
        &self.engine
    }

    #[must_use]
    pub fn scene(&self) -> Scene {
        self.engine.scene()
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for BoardSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let board_id = self.board.id;
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(%board_id, "session dropped outside a runtime; presence cleanup skipped");
            return;
        };
        let backend = self.backend.clone();
        let subscription_id = self.subscription.take().map(|s| s.id);
        let cursor = self.presence.leave();
        drop(handle.spawn(async move {
            if let Some(id) = subscription_id {
                backend.feed.unsubscribe(board_id, id).await;
            }
            if let Some(cursor) = cursor {
                if let Err(e) = backend.store.insert(Record::Cursor(cursor)).await {
                    warn!(error = %e, %board_id, "best-effort presence cleanup failed");
                }
            }
        }));
    }
}

/// Every row of every collection on the board.
async fn fetch_snapshot(store: &dyn RecordStore, board_id: Uuid) -> Result<Vec<Record>, StoreError> {
    let mut records = Vec::new();
    for collection in Collection::ALL {
        records.extend(store.select(collection, board_id).await?);
    }
    Ok(records)
}

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
