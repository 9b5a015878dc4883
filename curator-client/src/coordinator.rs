//! The sync coordinator: the single path between local mutations and
//! the backing store.
//!
//! Mutations are queued per entity id and applied in submission order
//! (FIFO per entity); mutations targeting different entities run
//! concurrently, each on its own worker task. There are no automatic
//! retries: a rejection is returned to the originating call site for
//! local rollback, so non-idempotent operations never run twice behind
//! the caller's back.
//!
//! Cancellation is epoch-based. `detach(entity_id)` bumps the entity's
//! epoch; any response that comes back carrying a stale epoch is
//! discarded without touching the model, so a late reply to a
//! superseded operation can never resurrect it.

use crate::error::StoreError;
use crate::store::{EntityStore, Mutation, MutationOp, MutationOutcome};
use curator_core::arena::EntityArena;
use curator_core::{PrefixOp, TagOp};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

/// The arena is shared between the coordinator's workers and the
/// rendering side; critical sections are short (apply one mutation).
pub type SharedArena = Arc<Mutex<EntityArena>>;

/// Events pushed toward the rendering surface whenever the model
/// changes underneath it.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Loaded {
        entity_id: String,
    },
    Applied {
        entity_id: String,
        op: MutationOp,
    },
    Rejected {
        entity_id: String,
        op: MutationOp,
        reason: String,
        retryable: bool,
    },
}

struct Job {
    ticket: Uuid,
    mutation: Mutation,
    epoch: u64,
    done: oneshot::Sender<MutationOutcome>,
}

struct EntityLane {
    tx: mpsc::UnboundedSender<Job>,
    epoch: Arc<AtomicU64>,
}

/// Awaitable result of a `submit` call.
pub struct SubmitHandle {
    pub ticket: Uuid,
    rx: oneshot::Receiver<MutationOutcome>,
}

impl SubmitHandle {
    /// Wait for the store's verdict. A handle whose operation was
    /// superseded (entity detached before the reply arrived) resolves
    /// to a non-retryable rejection.
    pub async fn outcome(self) -> MutationOutcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => MutationOutcome::Rejected {
                reason: "operation superseded or cancelled".to_string(),
                retryable: false,
            },
        }
    }
}

pub struct SyncCoordinator {
    store: Arc<dyn EntityStore>,
    arena: SharedArena,
    lanes: Mutex<HashMap<String, EntityLane>>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl SyncCoordinator {
    /// Returns the coordinator and the event stream the rendering
    /// surface should drain.
    pub fn new(
        store: Arc<dyn EntityStore>,
        arena: SharedArena,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                store,
                arena,
                lanes: Mutex::new(HashMap::new()),
                events,
            }),
            rx,
        )
    }

    pub fn arena(&self) -> &SharedArena {
        &self.arena
    }

    /// Fetch an entity from the store into the arena. Used for the
    /// initial page load and for lazy child fetches from the tree.
    pub async fn load(&self, id: &str) -> Result<(), StoreError> {
        let entity = self.store.load(id).await?;
        {
            let mut arena = self.arena.lock().unwrap();
            arena.insert(entity);
        }
        let _ = self.events.send(SyncEvent::Loaded {
            entity_id: id.to_string(),
        });
        Ok(())
    }

    /// Fetch the external status vocabulary and install it in the
    /// arena. Falls back to the canonical set on failure.
    pub async fn load_vocabulary(&self) -> Vec<String> {
        match self.store.status_vocabulary().await {
            Ok(vocabulary) if !vocabulary.is_empty() => {
                self.arena.lock().unwrap().set_vocabulary(vocabulary.clone());
                vocabulary
            }
            Ok(_) | Err(_) => {
                let fallback = curator_core::entity::default_status_vocabulary();
                debug!("store published no status vocabulary, using fallback");
                fallback
            }
        }
    }

    /// Queue a mutation. FIFO per entity: jobs for one entity id are
    /// processed by a single worker in submission order.
    pub fn submit(self: &Arc<Self>, mutation: Mutation) -> SubmitHandle {
        let ticket = Uuid::new_v4();
        let (done, rx) = oneshot::channel();

        let mut lanes = self.lanes.lock().unwrap();
        let lane = lanes
            .entry(mutation.entity_id.clone())
            .or_insert_with(|| self.spawn_lane(&mutation.entity_id));
        let job = Job {
            ticket,
            epoch: lane.epoch.load(Ordering::SeqCst),
            mutation,
            done,
        };
        // Send fails only if the worker is gone; the handle then
        // resolves as cancelled.
        let _ = lane.tx.send(job);

        SubmitHandle { ticket, rx }
    }

    /// Discard everything in flight for an entity: queued jobs and
    /// not-yet-arrived responses are ignored from this point on. The
    /// model is left exactly as the last applied mutation put it.
    pub fn detach(&self, entity_id: &str) {
        let lanes = self.lanes.lock().unwrap();
        if let Some(lane) = lanes.get(entity_id) {
            lane.epoch.fetch_add(1, Ordering::SeqCst);
            debug!(entity = entity_id, "detached; in-flight operations discarded");
        }
    }

    fn spawn_lane(self: &Arc<Self>, entity_id: &str) -> EntityLane {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let epoch = Arc::new(AtomicU64::new(0));

        let worker_epoch = epoch.clone();
        let store = self.store.clone();
        let arena = self.arena.clone();
        let events = self.events.clone();
        let lane_id = entity_id.to_string();

        tokio::spawn(async move {
            debug!(entity = %lane_id, "sync lane started");
            while let Some(job) = rx.recv().await {
                // Superseded before we even sent it.
                if worker_epoch.load(Ordering::SeqCst) != job.epoch {
                    debug!(ticket = %job.ticket, "job discarded before send");
                    continue;
                }

                let outcome = match store.submit(&job.mutation).await {
                    Ok(outcome) => outcome,
                    Err(e) => MutationOutcome::Rejected {
                        reason: e.to_string(),
                        retryable: e.is_retryable(),
                    },
                };

                // The response may be late: if the entity was detached
                // while the request was in flight, drop it on the floor.
                if worker_epoch.load(Ordering::SeqCst) != job.epoch {
                    debug!(ticket = %job.ticket, "late response discarded");
                    continue;
                }

                match &outcome {
                    MutationOutcome::Accepted {
                        normalized_value,
                        last_modified,
                    } => {
                        apply_accepted(
                            &arena,
                            &job.mutation,
                            normalized_value.as_deref(),
                            *last_modified,
                        );
                        let _ = events.send(SyncEvent::Applied {
                            entity_id: job.mutation.entity_id.clone(),
                            op: job.mutation.op.clone(),
                        });
                    }
                    MutationOutcome::Rejected { reason, retryable } => {
                        let _ = events.send(SyncEvent::Rejected {
                            entity_id: job.mutation.entity_id.clone(),
                            op: job.mutation.op.clone(),
                            reason: reason.clone(),
                            retryable: *retryable,
                        });
                    }
                }

                let _ = job.done.send(outcome);
            }
            debug!(entity = %lane_id, "sync lane finished");
        });

        EntityLane { tx, epoch }
    }
}

/// Fold an accepted mutation into the model. The store has already
/// validated it; a local failure here (e.g. the entity was evicted
/// meanwhile) is logged, not fatal.
fn apply_accepted(
    arena: &SharedArena,
    mutation: &Mutation,
    normalized: Option<&str>,
    last_modified: Option<chrono::DateTime<chrono::Utc>>,
) {
    let mut arena = arena.lock().unwrap();
    let id = &mutation.entity_id;

    let result = match &mutation.op {
        MutationOp::SetField { field, value } => arena
            .apply_server_confirmation(
                id,
                Some(*field),
                Some(normalized.unwrap_or(value)),
                last_modified,
            ),
        MutationOp::AddTag { category, value } => arena
            .apply_tag_update(id, category, TagOp::Add, normalized.unwrap_or(value))
            .map(|_| ())
            .and_then(|_| arena.apply_server_confirmation(id, None, None, last_modified)),
        MutationOp::RemoveTag { category, value } => arena
            .apply_tag_update(id, category, TagOp::Remove, normalized.unwrap_or(value))
            .map(|_| ())
            .and_then(|_| arena.apply_server_confirmation(id, None, None, last_modified)),
        MutationOp::AddPrefix { lru } => arena
            .apply_prefix_update(id, PrefixOp::Add, normalized.unwrap_or(lru))
            .and_then(|_| arena.apply_server_confirmation(id, None, None, last_modified)),
        MutationOp::RemovePrefix { lru } => arena
            .apply_prefix_update(id, PrefixOp::Remove, normalized.unwrap_or(lru))
            .and_then(|_| arena.apply_server_confirmation(id, None, None, last_modified)),
    };

    if let Err(e) = result {
        warn!(entity = %id, error = %e, "accepted mutation could not be applied locally");
    }
}
