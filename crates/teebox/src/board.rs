//! Occupancy board actor: an isolated Tokio task that owns one store's
//! live room view.
//!
//! The board runs in its own task, communicating with the outside world
//! through an mpsc channel. Its cached profile is fed by the store's
//! live subscription, so a write from anywhere (this board, another
//! operator, an admin tool) shows up on the next snapshot. The refresh
//! scheduler lives inside the actor's `select!` loop and dies with it.

use chrono::{DateTime, Utc};
use teebox_billing::{fee, BillingEngine, ElapsedClock};
use teebox_model::{BillingConfig, GameRecord, Room, RoomId, StoreKey, StoreProfile};
use teebox_store::DocumentStore;
use teebox_tick::{RefreshConfig, RefreshScheduler};
use tokio::sync::{mpsc, oneshot, watch};

use crate::ConsoleError;

/// Command channel depth. Fills only if a caller issues commands faster
/// than the store can service them, at which point senders wait.
const COMMAND_CHANNEL_SIZE: usize = 32;

/// One room's row on the occupancy board: the stored room plus the
/// elapsed time and accrued fee projected at the snapshot instant.
#[derive(Debug, Clone)]
pub struct RoomView {
    pub room: Room,
    pub elapsed: ElapsedClock,
    /// Accrued fee, or `None` when the projection failed (unusable
    /// billing settings in the stored document). A failed projection
    /// is never rendered as a zero charge.
    pub fee: Option<u64>,
}

/// A full board snapshot, published on every refresh and after every
/// command.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub rooms: Vec<RoomView>,
    pub config: BillingConfig,
    /// The instant the elapsed times and fees were projected at.
    pub at: DateTime<Utc>,
}

impl BoardSnapshot {
    /// Finds a room's view by id.
    pub fn room(&self, id: &RoomId) -> Option<&RoomView> {
        self.rooms.iter().find(|view| &view.room.id == id)
    }

    /// Sum of the fees currently accruing across all rooms. Rooms
    /// whose projection failed contribute nothing.
    pub fn accruing_total(&self) -> u64 {
        self.rooms.iter().filter_map(|view| view.fee).sum()
    }
}

/// Commands sent to a board actor through its channel.
///
/// Each variant carries a `oneshot::Sender` reply channel where the
/// caller waits for the outcome, except the fire-and-forget ones.
enum BoardCommand {
    StartSession {
        room_id: RoomId,
        reply: oneshot::Sender<Result<Room, ConsoleError>>,
    },
    Checkout {
        room_id: RoomId,
        reply: oneshot::Sender<Result<GameRecord, ConsoleError>>,
    },
    SetRoomCount {
        count: u32,
        reply: oneshot::Sender<Result<Vec<Room>, ConsoleError>>,
    },
    SetRates {
        rate_per_interval: u64,
        time_interval: u32,
        reply: oneshot::Sender<Result<Vec<Room>, ConsoleError>>,
    },
    /// Force a snapshot right now, outside the periodic refresh.
    Refresh {
        reply: oneshot::Sender<BoardSnapshot>,
    },
    PauseRefresh,
    ResumeRefresh,
    Shutdown,
}

/// Handle to a running occupancy board. Cheap to clone.
#[derive(Clone)]
pub struct BoardHandle {
    key: StoreKey,
    sender: mpsc::Sender<BoardCommand>,
    snapshots: watch::Receiver<BoardSnapshot>,
}

impl BoardHandle {
    /// The store this board serves.
    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    /// Starts a session in an available room.
    pub async fn start_session(&self, room_id: RoomId) -> Result<Room, ConsoleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(BoardCommand::StartSession {
                room_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ConsoleError::BoardClosed)?;
        reply_rx.await.map_err(|_| ConsoleError::BoardClosed)?
    }

    /// Settles the active session in a room and returns the ledger
    /// record that was written.
    pub async fn checkout(&self, room_id: RoomId) -> Result<GameRecord, ConsoleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(BoardCommand::Checkout {
                room_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ConsoleError::BoardClosed)?;
        reply_rx.await.map_err(|_| ConsoleError::BoardClosed)?
    }

    /// Resizes the store's room list.
    pub async fn set_room_count(&self, count: u32) -> Result<Vec<Room>, ConsoleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(BoardCommand::SetRoomCount {
                count,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ConsoleError::BoardClosed)?;
        reply_rx.await.map_err(|_| ConsoleError::BoardClosed)?
    }

    /// Applies new billing settings to the store and every room.
    pub async fn set_rates(
        &self,
        rate_per_interval: u64,
        time_interval: u32,
    ) -> Result<Vec<Room>, ConsoleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(BoardCommand::SetRates {
                rate_per_interval,
                time_interval,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ConsoleError::BoardClosed)?;
        reply_rx.await.map_err(|_| ConsoleError::BoardClosed)?
    }

    /// Forces a snapshot recomputation right now and returns it.
    pub async fn refresh(&self) -> Result<BoardSnapshot, ConsoleError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(BoardCommand::Refresh { reply: reply_tx })
            .await
            .map_err(|_| ConsoleError::BoardClosed)?;
        reply_rx.await.map_err(|_| ConsoleError::BoardClosed)
    }

    /// The most recently published snapshot, without waiting.
    pub fn latest(&self) -> BoardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    pub fn watch_snapshots(&self) -> watch::Receiver<BoardSnapshot> {
        self.snapshots.clone()
    }

    /// Pauses the periodic refresh. Commands still publish snapshots.
    pub async fn pause_refresh(&self) -> Result<(), ConsoleError> {
        self.sender
            .send(BoardCommand::PauseRefresh)
            .await
            .map_err(|_| ConsoleError::BoardClosed)
    }

    /// Resumes the periodic refresh after a pause.
    pub async fn resume_refresh(&self) -> Result<(), ConsoleError> {
        self.sender
            .send(BoardCommand::ResumeRefresh)
            .await
            .map_err(|_| ConsoleError::BoardClosed)
    }

    /// Tells the board to shut down. The refresh scheduler and the
    /// store subscription are dropped with the actor.
    pub async fn shutdown(&self) -> Result<(), ConsoleError> {
        self.sender
            .send(BoardCommand::Shutdown)
            .await
            .map_err(|_| ConsoleError::BoardClosed)
    }
}

/// The internal board actor state. Runs inside a Tokio task.
struct BoardActor<S: DocumentStore> {
    engine: BillingEngine<S>,
    /// Latest profile delivered by the store subscription. `None` only
    /// if the document disappears after spawn.
    profile: Option<StoreProfile>,
    updates: watch::Receiver<Option<StoreProfile>>,
    scheduler: RefreshScheduler,
    snapshots: watch::Sender<BoardSnapshot>,
    receiver: mpsc::Receiver<BoardCommand>,
}

impl<S: DocumentStore> BoardActor<S> {
    /// Runs the actor loop until shutdown or until the store
    /// subscription is gone.
    async fn run(mut self) {
        tracing::info!(store = %self.engine.key(), "occupancy board started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(BoardCommand::Shutdown) | None => {
                            tracing::info!(store = %self.engine.key(), "board shutting down");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }
                info = self.scheduler.wait_for_refresh() => {
                    let _ = info;
                    self.publish(Utc::now());
                }
                changed = self.updates.changed() => {
                    match changed {
                        Ok(()) => {
                            self.sync_profile();
                            self.publish(Utc::now());
                        }
                        Err(_) => {
                            tracing::warn!(
                                store = %self.engine.key(),
                                "store subscription closed, stopping board"
                            );
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!(store = %self.engine.key(), "occupancy board stopped");
    }

    async fn handle_command(&mut self, cmd: BoardCommand) {
        match cmd {
            BoardCommand::StartSession { room_id, reply } => {
                let result = self
                    .engine
                    .start_session(&room_id)
                    .await
                    .map_err(ConsoleError::from);
                self.sync_profile();
                self.publish(Utc::now());
                let _ = reply.send(result);
            }
            BoardCommand::Checkout { room_id, reply } => {
                let result = self
                    .engine
                    .end_session(&room_id)
                    .await
                    .map_err(ConsoleError::from);
                self.sync_profile();
                self.publish(Utc::now());
                let _ = reply.send(result);
            }
            BoardCommand::SetRoomCount { count, reply } => {
                let result = self
                    .engine
                    .adjust_room_count(count)
                    .await
                    .map_err(ConsoleError::from);
                self.sync_profile();
                self.publish(Utc::now());
                let _ = reply.send(result);
            }
            BoardCommand::SetRates {
                rate_per_interval,
                time_interval,
                reply,
            } => {
                let result = self
                    .engine
                    .apply_rate_change(rate_per_interval, time_interval)
                    .await
                    .map_err(ConsoleError::from);
                self.sync_profile();
                self.publish(Utc::now());
                let _ = reply.send(result);
            }
            BoardCommand::Refresh { reply } => {
                self.sync_profile();
                let snapshot = self.publish(Utc::now());
                let _ = reply.send(snapshot);
            }
            BoardCommand::PauseRefresh => self.scheduler.pause(),
            BoardCommand::ResumeRefresh => self.scheduler.resume(),
            // Handled in the select loop.
            BoardCommand::Shutdown => {}
        }
    }

    /// Pulls the latest subscribed profile into the cache and marks it
    /// seen, so the subscription branch doesn't republish the same
    /// document.
    fn sync_profile(&mut self) {
        self.profile = self.updates.borrow_and_update().clone();
    }

    /// Projects and publishes a snapshot at `now`.
    fn publish(&self, now: DateTime<Utc>) -> BoardSnapshot {
        let snapshot = self.project(now);
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn project(&self, now: DateTime<Utc>) -> BoardSnapshot {
        let Some(profile) = &self.profile else {
            return BoardSnapshot {
                rooms: Vec::new(),
                config: BillingConfig::default(),
                at: now,
            };
        };

        let rooms = profile
            .rooms
            .iter()
            .map(|room| {
                let elapsed = room
                    .game_start_time
                    .filter(|_| room.status.is_occupied())
                    .map(|start| ElapsedClock::since(start, now))
                    .unwrap_or(ElapsedClock::ZERO);
                let fee = match fee::accrued_fee(room, &profile.config, now) {
                    Ok(fee) => Some(fee),
                    Err(err) => {
                        tracing::warn!(
                            room = %room.id,
                            error = %err,
                            "fee projection failed"
                        );
                        None
                    }
                };
                RoomView {
                    room: room.clone(),
                    elapsed,
                    fee,
                }
            })
            .collect();

        BoardSnapshot {
            rooms,
            config: profile.config.clone(),
            at: now,
        }
    }
}

/// Spawns an occupancy board for one store and returns a handle to it.
///
/// Fails if the store has no profile document or if the subscription
/// cannot be established; a board never runs against a store it cannot
/// observe.
pub async fn spawn_board<S: DocumentStore>(
    store: S,
    key: StoreKey,
    refresh: RefreshConfig,
) -> Result<BoardHandle, ConsoleError> {
    let engine = BillingEngine::new(store, key.clone());
    let profile = engine.profile().await?;
    let updates = engine.store().subscribe(&key).await?;

    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let (snapshot_tx, snapshot_rx) = watch::channel(BoardSnapshot {
        rooms: Vec::new(),
        config: profile.config.clone(),
        at: Utc::now(),
    });

    let actor = BoardActor {
        engine,
        profile: Some(profile),
        updates,
        scheduler: RefreshScheduler::new(refresh),
        snapshots: snapshot_tx,
        receiver: cmd_rx,
    };
    actor.publish(Utc::now());

    tokio::spawn(actor.run());

    Ok(BoardHandle {
        key,
        sender: cmd_tx,
        snapshots: snapshot_rx,
    })
}
