//! The progression actor.
//!
//! One tokio task owns the [`ProgressionEngine`] and processes a single
//! mailbox, so gameplay calls, sync results and timer ticks are applied one
//! at a time. Remote fetches and pushes run in their own tasks and report
//! back through the same mailbox; gameplay is never blocked on the network.
//!
//! # Sync round
//!
//! 1. `RequestSync` (or a local change, see below) starts a round unless one
//!    is already in flight, in which case the request is coalesced.
//! 2. A spawned task fetches the remote document and sends `FetchFinished`.
//! 3. The actor merges it and re-runs the unlock rules.
//! 4. If the remote copy is behind or local changes are pending, a spawned
//!    task pushes the merged state and sends `PushFinished`.
//!
//! After a failed round, the next state-changing command starts a new one.
//! With `push_on_change`, every local change to stars or planets does too.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use cosmolex_store::{RemoteDocumentStore, RemoteError};
use cosmolex_types::{
    GameType, LessonState, PlanetRef, ProgressSnapshot, RemoteProgressDocument, SceneId,
    StarSource, SyncStatus,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::engine::{Outcome, ProgressionEngine};
use crate::error::ProgressError;
use crate::listener::ProgressListener;

/// Errors returned by [`ProgressionHandle`] calls.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// The actor task has stopped.
    #[error("progression actor is not running")]
    Closed,

    /// The operation itself failed.
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Actor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorSettings {
    /// Start a sync round after every local change to stars or planets.
    pub push_on_change: bool,
    /// Mailbox capacity.
    pub mailbox: usize,
}

impl Default for ActorSettings {
    fn default() -> Self {
        Self {
            push_on_change: true,
            mailbox: 64,
        }
    }
}

/// Whether a sync request started a new round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRequest {
    /// A new round was started.
    Started,
    /// A round was already in flight; the request was folded into it.
    Coalesced,
}

type Reply<T> = oneshot::Sender<Result<T, ProgressError>>;

enum Message {
    CompleteLesson {
        planet: PlanetRef,
        scene: SceneId,
        stars: u32,
        reply: Reply<Outcome>,
    },
    AddStars {
        amount: u32,
        source: StarSource,
        reply: Reply<Outcome>,
    },
    RecordWordLearned {
        reply: Reply<Outcome>,
    },
    RecordGameCompleted {
        game_type: GameType,
        stars: u32,
        reply: Reply<Outcome>,
    },
    RecordDailyLogin {
        today: NaiveDate,
        reply: Reply<Outcome>,
    },
    CheckForNewUnlocks {
        reply: Reply<Outcome>,
    },
    ResetForTesting {
        reply: Reply<Outcome>,
    },
    LessonState {
        planet: PlanetRef,
        scene: SceneId,
        reply: Reply<LessonState>,
    },
    Snapshot {
        reply: oneshot::Sender<ProgressSnapshot>,
    },
    SyncStatus {
        reply: oneshot::Sender<SyncStatus>,
    },
    RequestSync {
        reply: oneshot::Sender<SyncRequest>,
    },
    RegisterListener {
        listener: Box<dyn ProgressListener>,
    },
    FetchFinished(Result<Option<RemoteProgressDocument>, RemoteError>),
    PushFinished(Result<(), RemoteError>),
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable client of the progression actor.
#[derive(Clone)]
pub struct ProgressionHandle {
    tx: mpsc::Sender<Message>,
}

impl core::fmt::Debug for ProgressionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressionHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl ProgressionHandle {
    async fn call<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> Result<T, ActorError> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(message(reply)).await.is_err() {
            return Err(ActorError::Closed);
        }
        rx.await.ok().ok_or(ActorError::Closed)
    }

    async fn operation<T>(
        &self,
        message: impl FnOnce(Reply<T>) -> Message,
    ) -> Result<T, ActorError> {
        Ok(self.call(message).await??)
    }

    /// Complete a lesson. See [`ProgressionEngine::complete_lesson`].
    pub async fn complete_lesson(
        &self,
        planet: PlanetRef,
        scene: SceneId,
        stars: u32,
    ) -> Result<Outcome, ActorError> {
        self.operation(|reply| Message::CompleteLesson {
            planet,
            scene,
            stars,
            reply,
        })
        .await
    }

    /// Earn stars. See [`ProgressionEngine::add_stars`].
    pub async fn add_stars(&self, amount: u32, source: StarSource) -> Result<Outcome, ActorError> {
        self.operation(|reply| Message::AddStars {
            amount,
            source,
            reply,
        })
        .await
    }

    /// Count a learned word.
    pub async fn record_word_learned(&self) -> Result<Outcome, ActorError> {
        self.operation(|reply| Message::RecordWordLearned { reply })
            .await
    }

    /// Count a finished game and earn its stars.
    pub async fn record_game_completed(
        &self,
        game_type: GameType,
        stars: u32,
    ) -> Result<Outcome, ActorError> {
        self.operation(|reply| Message::RecordGameCompleted {
            game_type,
            stars,
            reply,
        })
        .await
    }

    /// Record a login on `today`.
    pub async fn record_daily_login(&self, today: NaiveDate) -> Result<Outcome, ActorError> {
        self.operation(|reply| Message::RecordDailyLogin { today, reply })
            .await
    }

    /// Re-run the unlock rules.
    pub async fn check_for_new_unlocks(&self) -> Result<Outcome, ActorError> {
        self.operation(|reply| Message::CheckForNewUnlocks { reply })
            .await
    }

    /// Clear all local progress and re-seed.
    pub async fn reset_for_testing(&self) -> Result<Outcome, ActorError> {
        self.operation(|reply| Message::ResetForTesting { reply })
            .await
    }

    /// Gating state of a lesson.
    pub async fn lesson_state(
        &self,
        planet: PlanetRef,
        scene: SceneId,
    ) -> Result<LessonState, ActorError> {
        self.operation(|reply| Message::LessonState {
            planet,
            scene,
            reply,
        })
        .await
    }

    /// Read model of the whole state.
    pub async fn snapshot(&self) -> Result<ProgressSnapshot, ActorError> {
        self.call(|reply| Message::Snapshot { reply }).await
    }

    /// Outcome of the most recent sync round.
    pub async fn sync_status(&self) -> Result<SyncStatus, ActorError> {
        self.call(|reply| Message::SyncStatus { reply }).await
    }

    /// Start a sync round, or fold into the one in flight.
    pub async fn request_sync(&self) -> Result<SyncRequest, ActorError> {
        self.call(|reply| Message::RequestSync { reply }).await
    }

    /// Register a listener on the engine.
    pub async fn register_listener(
        &self,
        listener: Box<dyn ProgressListener>,
    ) -> Result<(), ActorError> {
        self.tx
            .send(Message::RegisterListener { listener })
            .await
            .or(Err(ActorError::Closed))
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Owner of the engine, driven by the mailbox.
pub struct ProgressionActor<R> {
    engine: ProgressionEngine,
    remote: Arc<R>,
    settings: ActorSettings,
    inbox: mpsc::Receiver<Message>,
    outbox: mpsc::WeakSender<Message>,
}

impl<R: RemoteDocumentStore> ProgressionActor<R> {
    /// Spawn the actor on the current tokio runtime.
    ///
    /// The actor stops once every [`ProgressionHandle`] is dropped and no
    /// remote call is outstanding.
    pub fn spawn(
        engine: ProgressionEngine,
        remote: Arc<R>,
        settings: ActorSettings,
    ) -> (ProgressionHandle, JoinHandle<()>) {
        let (tx, inbox) = mpsc::channel(settings.mailbox.max(1));
        let actor = Self {
            engine,
            remote,
            settings,
            inbox,
            outbox: tx.downgrade(),
        };
        let task = tokio::spawn(actor.run());
        (ProgressionHandle { tx }, task)
    }

    async fn run(mut self) {
        tracing::info!(install = %self.engine.install(), "Progression actor started");
        while let Some(message) = self.inbox.recv().await {
            self.handle(message);
        }
        tracing::info!(install = %self.engine.install(), "Progression actor stopped");
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::CompleteLesson {
                planet,
                scene,
                stars,
                reply,
            } => {
                let result = self.engine.complete_lesson(&planet, scene, stars);
                self.finish_command(reply, result);
            }
            Message::AddStars {
                amount,
                source,
                reply,
            } => {
                let result = self.engine.add_stars(amount, source);
                self.finish_command(reply, result);
            }
            Message::RecordWordLearned { reply } => {
                let result = self.engine.record_word_learned();
                self.finish_command(reply, result);
            }
            Message::RecordGameCompleted {
                game_type,
                stars,
                reply,
            } => {
                let result = self.engine.record_game_completed(game_type, stars);
                self.finish_command(reply, result);
            }
            Message::RecordDailyLogin { today, reply } => {
                let result = self.engine.record_daily_login(today);
                self.finish_command(reply, result);
            }
            Message::CheckForNewUnlocks { reply } => {
                let result = self.engine.check_for_new_unlocks();
                self.finish_command(reply, result);
            }
            Message::ResetForTesting { reply } => {
                let result = self.engine.reset_for_testing();
                let _ = reply.send(result);
            }
            Message::LessonState {
                planet,
                scene,
                reply,
            } => {
                let _ = reply.send(self.engine.lesson_state(&planet, scene));
            }
            Message::Snapshot { reply } => {
                let _ = reply.send(self.engine.snapshot());
            }
            Message::SyncStatus { reply } => {
                let _ = reply.send(self.engine.sync().status().clone());
            }
            Message::RequestSync { reply } => {
                let _ = reply.send(self.start_sync());
            }
            Message::RegisterListener { listener } => {
                self.engine.register_listener(listener);
            }
            Message::FetchFinished(result) => self.on_fetch_finished(result),
            Message::PushFinished(result) => self.on_push_finished(result),
        }
    }

    /// Reply to a state-changing command, then retry or push if needed.
    fn finish_command(&mut self, reply: Reply<Outcome>, result: Result<Outcome, ProgressError>) {
        let _ = reply.send(result);
        let sync = self.engine.sync();
        if sync.needs_retry() || (self.settings.push_on_change && sync.is_push_pending()) {
            self.start_sync();
        }
    }

    fn start_sync(&mut self) -> SyncRequest {
        if !self.engine.sync_mut().try_begin(Utc::now()) {
            return SyncRequest::Coalesced;
        }
        let Some(outbox) = self.outbox.upgrade() else {
            self.engine.sync_mut().fail(Utc::now(), "progression actor shutting down");
            return SyncRequest::Started;
        };

        let remote = Arc::clone(&self.remote);
        let install = self.engine.install();
        tracing::debug!(install = %install, "Fetching remote progress");
        tokio::spawn(async move {
            let result = remote.fetch(install).await;
            let _ = outbox.send(Message::FetchFinished(result)).await;
        });
        SyncRequest::Started
    }

    fn on_fetch_finished(&mut self, result: Result<Option<RemoteProgressDocument>, RemoteError>) {
        let document = match result {
            Ok(document) => document,
            Err(RemoteError::NotConfigured) => {
                tracing::debug!("No remote configured, sync skipped");
                self.engine
                    .sync_mut()
                    .fail(Utc::now(), RemoteError::NotConfigured.to_string());
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Remote fetch failed, continuing offline");
                self.engine.sync_mut().fail(Utc::now(), e.to_string());
                return;
            }
        };

        match self.engine.apply_remote_snapshot(document.as_ref()) {
            Ok(merge) => {
                tracing::info!(
                    found = document.is_some(),
                    events = merge.outcome.events.len(),
                    push = merge.push_needed,
                    "Remote progress merged"
                );
                if merge.push_needed {
                    self.start_push();
                } else {
                    self.engine.sync_mut().complete(Utc::now(), false);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not apply remote progress locally");
                self.engine
                    .sync_mut()
                    .fail(Utc::now(), format!("local merge failed: {e}"));
            }
        }
    }

    fn start_push(&mut self) {
        let Some(outbox) = self.outbox.upgrade() else {
            self.engine.sync_mut().fail(Utc::now(), "progression actor shutting down");
            return;
        };
        let document = self.engine.remote_document(Utc::now());
        self.engine.sync_mut().begin_push();

        let remote = Arc::clone(&self.remote);
        let install = self.engine.install();
        tracing::debug!(install = %install, stars = document.total_stars, "Pushing progress");
        tokio::spawn(async move {
            let result = remote.push(install, document).await;
            let _ = outbox.send(Message::PushFinished(result)).await;
        });
    }

    fn on_push_finished(&mut self, result: Result<(), RemoteError>) {
        match result {
            Ok(()) => {
                tracing::info!(install = %self.engine.install(), "Remote progress updated");
                self.engine.sync_mut().complete(Utc::now(), true);
                // Changes made while the push was in flight go out next.
                if self.settings.push_on_change && self.engine.sync().is_push_pending() {
                    self.start_sync();
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Remote push failed, will retry on next change");
                self.engine.sync_mut().fail(Utc::now(), e.to_string());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use cosmolex_catalog::starter_catalog;
    use cosmolex_store::{MemoryKvStore, MemoryRemoteStore};
    use cosmolex_types::{InstallId, PlanetKey, ProgressEvent};

    use super::*;
    use crate::engine::CatalogMode;
    use crate::listener::EventLog;

    fn engine(install: InstallId) -> ProgressionEngine {
        ProgressionEngine::open(
            Arc::new(starter_catalog().unwrap()),
            Arc::new(MemoryKvStore::new()),
            install,
            CatalogMode::Strict,
        )
        .unwrap()
    }

    fn spawn(
        remote: MemoryRemoteStore,
        settings: ActorSettings,
    ) -> (ProgressionHandle, InstallId) {
        let install = InstallId::new();
        let (handle, _task) = ProgressionActor::spawn(engine(install), Arc::new(remote), settings);
        (handle, install)
    }

    /// Poll until no round is in flight.
    async fn settled(handle: &ProgressionHandle) -> SyncStatus {
        for _ in 0..200 {
            let status = handle.sync_status().await.unwrap();
            if !matches!(status, SyncStatus::InFlight { .. }) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.sync_status().await.unwrap()
    }

    const MANUAL: ActorSettings = ActorSettings {
        push_on_change: false,
        mailbox: 16,
    };

    #[tokio::test]
    async fn gameplay_calls_are_serialized() {
        let (handle, _install) = spawn(MemoryRemoteStore::new(), MANUAL);
        let mut calls = Vec::new();
        for _ in 0..20 {
            let handle = handle.clone();
            calls.push(tokio::spawn(async move {
                handle.add_stars(5, StarSource::Bonus).await.unwrap()
            }));
        }
        for call in calls {
            call.await.unwrap();
        }
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.ledger.total_stars, 100);
        assert_eq!(snapshot.level, 3);
    }

    #[tokio::test]
    async fn session_sync_merges_and_pushes_back() {
        let remote = MemoryRemoteStore::new();
        let (handle, install) = spawn(remote.clone(), MANUAL);
        handle.add_stars(40, StarSource::Bonus).await.unwrap();
        remote.seed(
            install,
            RemoteProgressDocument {
                total_stars: 55,
                unlocked_planets: BTreeSet::from([
                    PlanetKey::from("coloria_prime"),
                    PlanetKey::from("toytopia_orbit"),
                    PlanetKey::from("animania_wild"),
                ]),
                updated_at: Utc::now(),
            },
        );

        assert_eq!(handle.request_sync().await.unwrap(), SyncRequest::Started);
        let status = settled(&handle).await;
        assert!(matches!(status, SyncStatus::Synced { pushed: true, .. }));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.ledger.total_stars, 55);
        assert!(snapshot
            .unlocked_planets
            .contains(&PlanetKey::from("animania_wild")));

        let pushed = remote.document(install).unwrap();
        assert_eq!(pushed.total_stars, 55);
        assert_eq!(pushed.unlocked_planets, snapshot.unlocked_planets);
    }

    #[tokio::test]
    async fn concurrent_sync_requests_are_coalesced() {
        let remote = MemoryRemoteStore::new().with_latency(Duration::from_millis(50));
        let (handle, _install) = spawn(remote.clone(), MANUAL);

        assert_eq!(handle.request_sync().await.unwrap(), SyncRequest::Started);
        assert_eq!(handle.request_sync().await.unwrap(), SyncRequest::Coalesced);
        assert_eq!(handle.request_sync().await.unwrap(), SyncRequest::Coalesced);
        settled(&handle).await;
        assert_eq!(remote.fetch_count(), 1);
    }

    #[tokio::test]
    async fn gameplay_continues_while_fetch_is_slow() {
        let remote = MemoryRemoteStore::new().with_latency(Duration::from_millis(200));
        let (handle, _install) = spawn(remote, MANUAL);
        handle.request_sync().await.unwrap();

        let outcome = tokio::time::timeout(
            Duration::from_millis(100),
            handle.complete_lesson("coloria_prime".into(), 1, 3),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(outcome.count("lesson_completed"), 1);
    }

    #[tokio::test]
    async fn outage_is_non_fatal_and_retried_on_next_change() {
        let remote = MemoryRemoteStore::new();
        remote.set_available(false);
        let (handle, install) = spawn(remote.clone(), MANUAL);

        handle.request_sync().await.unwrap();
        assert!(matches!(settled(&handle).await, SyncStatus::Failed { .. }));

        // Offline play keeps working.
        handle.complete_lesson("coloria_prime".into(), 1, 3).await.unwrap();
        settled(&handle).await;
        assert_eq!(handle.snapshot().await.unwrap().ledger.total_stars, 3);

        remote.set_available(true);
        handle.add_stars(2, StarSource::Bonus).await.unwrap();
        assert!(matches!(
            settled(&handle).await,
            SyncStatus::Synced { pushed: true, .. }
        ));
        assert_eq!(remote.document(install).unwrap().total_stars, 5);
    }

    #[tokio::test]
    async fn push_on_change_keeps_remote_current() {
        let remote = MemoryRemoteStore::new();
        let (handle, install) = spawn(remote.clone(), ActorSettings::default());
        handle.add_stars(31, StarSource::Bonus).await.unwrap();
        settled(&handle).await;

        let document = remote.document(install).unwrap();
        assert_eq!(document.total_stars, 31);
        assert!(document
            .unlocked_planets
            .contains(&PlanetKey::from("toytopia_orbit")));
    }

    #[tokio::test]
    async fn listeners_see_merge_events() {
        let remote = MemoryRemoteStore::new();
        let (handle, install) = spawn(remote.clone(), MANUAL);
        let log = EventLog::new();
        handle.register_listener(Box::new(log.clone())).await.unwrap();

        remote.seed(
            install,
            RemoteProgressDocument {
                total_stars: 30,
                unlocked_planets: BTreeSet::new(),
                updated_at: Utc::now(),
            },
        );
        handle.request_sync().await.unwrap();
        settled(&handle).await;

        assert!(log.events().contains(&ProgressEvent::PlanetUnlocked {
            key: PlanetKey::from("toytopia_orbit"),
            display_name: "Toytopia Orbit".to_owned(),
        }));
    }

    #[tokio::test]
    async fn handle_reports_operation_errors() {
        let (handle, _install) = spawn(MemoryRemoteStore::new(), MANUAL);
        let result = handle.complete_lesson("atlantis".into(), 1, 1).await;
        assert!(matches!(
            result,
            Err(ActorError::Progress(ProgressError::NotFound { .. }))
        ));
    }
}
