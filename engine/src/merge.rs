//! Merge resolution.
//!
//! # Protocol
//!
//! 1. Both inputs leave the surface before anything else happens, so no later
//!    detection pass or concurrent merge can pick them up again.
//! 2. A recipe hit places the result at the midpoint immediately.
//! 3. A miss spawns the oracle call and records a [`PendingMerge`]. The
//!    engine keeps accepting surface mutations while it runs.
//! 4. [`Engine::poll_merges`] (or [`Engine::settle`]) applies finished calls:
//!    a discovery writes the recipe and catalog entry if absent and places the
//!    result; anything else respawns both inputs beside the midpoint.
//!
//! Oracle errors, panics and timeouts all collapse into a rejected merge.
//! Nothing is retried here and negative answers are never cached.

use std::fmt;
use std::sync::Arc;

use aether_providers::{OracleError, OracleVerdict};
use aether_types::{InstanceId, KindId, Position, RecipeKey, TokenKind};
use tokio::task::{JoinError, JoinHandle};

use crate::Engine;
use crate::notifications::Cue;

/// Identifies one merge that went to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeTicket(u64);

impl fmt::Display for MergeTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "merge-{}", self.0)
    }
}

/// What happened synchronously when a merge was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStart {
    /// Known recipe; the result is already on the surface.
    Combined { instance: InstanceId, kind: KindId },
    /// Waiting on the oracle.
    Pending { ticket: MergeTicket, key: RecipeKey },
    /// An input referenced a kind missing from the catalog. Both inputs were
    /// consumed and nothing was placed.
    Abandoned { key: RecipeKey },
}

/// Result of a merge that went to the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Combined {
        ticket: MergeTicket,
        key: RecipeKey,
        kind: KindId,
        instance: InstanceId,
        /// The kind was new to the catalog and has been announced.
        discovered: bool,
    },
    Rejected {
        ticket: MergeTicket,
        key: RecipeKey,
        /// Fresh instances of the two input kinds, left then right.
        respawned: [InstanceId; 2],
    },
}

impl MergeOutcome {
    #[must_use]
    pub fn ticket(&self) -> MergeTicket {
        match self {
            Self::Combined { ticket, .. } | Self::Rejected { ticket, .. } => *ticket,
        }
    }
}

type OracleTask = JoinHandle<Result<OracleVerdict, OracleError>>;

/// A merge whose inputs are gone from the surface and whose oracle call is in flight.
pub(crate) struct PendingMerge {
    ticket: MergeTicket,
    key: RecipeKey,
    /// Input kinds in resolve order; the first respawns on the left.
    inputs: [KindId; 2],
    midpoint: Position,
    handle: OracleTask,
}

impl Engine {
    /// Merge two surface instances.
    ///
    /// Returns `None` without touching anything when either instance is no
    /// longer on the surface or both ids name the same instance.
    ///
    /// Must be called from within a Tokio runtime; cache misses spawn a task.
    pub fn resolve(&mut self, a: InstanceId, b: InstanceId) -> Option<MergeStart> {
        let (first, second) = self.surface.take_pair(a, b)?;
        let midpoint = first.position.midpoint(second.position);
        let key = RecipeKey::new(first.kind.clone(), second.kind.clone());

        let cached = self
            .recipes
            .get(&key)
            .filter(|result| self.catalog.contains(result))
            .cloned();
        if let Some(kind) = cached {
            tracing::debug!(pair = %key, result = %kind, "Recipe hit");
            let instance = self.place_result(&kind, midpoint);
            return Some(MergeStart::Combined { instance, kind });
        }

        let (Some(first_kind), Some(second_kind)) = (
            self.catalog.get(&first.kind).cloned(),
            self.catalog.get(&second.kind).cloned(),
        ) else {
            tracing::warn!(pair = %key, "Merge input has no catalog entry; dropping both");
            return Some(MergeStart::Abandoned { key });
        };

        let ticket = self.next_ticket();
        tracing::debug!(pair = %key, %ticket, oracle = self.oracle.name(), "Asking oracle");
        let handle = self.spawn_oracle(first_kind, second_kind);
        self.pending.push(PendingMerge {
            ticket,
            key: key.clone(),
            inputs: [first.kind, second.kind],
            midpoint,
            handle,
        });
        self.announcer.dismiss();

        Some(MergeStart::Pending { ticket, key })
    }

    /// Apply every oracle call that has finished, without waiting.
    pub fn poll_merges(&mut self) -> Vec<MergeOutcome> {
        use futures_util::future::FutureExt;

        let mut outcomes = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if !self.pending[index].handle.is_finished() {
                index += 1;
                continue;
            }
            let mut merge = self.pending.remove(index);
            match (&mut merge.handle).now_or_never() {
                Some(joined) => outcomes.push(self.complete(merge, joined)),
                None => {
                    // Finished but not yet observable; try again next poll.
                    self.pending.insert(index, merge);
                    index += 1;
                }
            }
        }
        outcomes
    }

    /// Wait for every pending merge and apply it, oldest first.
    ///
    /// Cancel-safe: merges not yet applied stay pending.
    pub async fn settle(&mut self) -> Vec<MergeOutcome> {
        let mut outcomes = Vec::new();
        while let Some(next) = self.pending.first_mut() {
            // Stays queued until joined, so dropping this future loses nothing.
            let joined = (&mut next.handle).await;
            let merge = self.pending.remove(0);
            outcomes.push(self.complete(merge, joined));
        }
        outcomes
    }

    fn spawn_oracle(&self, a: TokenKind, b: TokenKind) -> OracleTask {
        let oracle = Arc::clone(&self.oracle);
        let timeout = self.settings.oracle_timeout;
        tokio::spawn(async move {
            let call = oracle.combine(&a, &b);
            match timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .unwrap_or_else(|_| Err(OracleError::Timeout(limit))),
                None => call.await,
            }
        })
    }

    fn complete(
        &mut self,
        merge: PendingMerge,
        joined: Result<Result<OracleVerdict, OracleError>, JoinError>,
    ) -> MergeOutcome {
        let PendingMerge {
            ticket,
            key,
            inputs,
            midpoint,
            handle: _,
        } = merge;

        let kind = match joined {
            Ok(Ok(OracleVerdict::Discovered(kind))) => Some(kind),
            Ok(Ok(OracleVerdict::NoCombination)) => {
                tracing::debug!(pair = %key, %ticket, "Oracle found no combination");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(pair = %key, %ticket, "Oracle call failed: {e}");
                None
            }
            Err(e) => {
                tracing::warn!(pair = %key, %ticket, "Oracle task did not complete: {e}");
                None
            }
        };

        match kind {
            Some(kind) => self.accept(ticket, key, kind, midpoint),
            None => self.reject(ticket, key, inputs, midpoint),
        }
    }

    fn accept(
        &mut self,
        ticket: MergeTicket,
        key: RecipeKey,
        kind: TokenKind,
        midpoint: Position,
    ) -> MergeOutcome {
        let result = self
            .recipes
            .put_if_absent(key.clone(), kind.id.clone())
            .clone();

        let mut discovered = false;
        if result == kind.id {
            let name = kind.name.clone();
            discovered = self.catalog.insert_if_absent(kind);
            if discovered {
                tracing::info!(pair = %key, kind = %result, "New discovery: {name}");
                self.announcer.announce(name);
            } else {
                tracing::debug!(pair = %key, kind = %result, "Oracle returned a known kind");
            }
        } else {
            tracing::debug!(
                pair = %key,
                stored = %result,
                returned = %kind.id,
                "Recipe was written while pending; keeping stored result"
            );
        }

        let instance = self.place_result(&result, midpoint);
        MergeOutcome::Combined {
            ticket,
            key,
            kind: result,
            instance,
            discovered,
        }
    }

    fn reject(
        &mut self,
        ticket: MergeTicket,
        key: RecipeKey,
        inputs: [KindId; 2],
        midpoint: Position,
    ) -> MergeOutcome {
        let offset = self.settings.reject_offset;
        let [left, right] = inputs;
        let respawned = [
            self.spawn_instance(left, midpoint.offset_x(-offset)),
            self.spawn_instance(right, midpoint.offset_x(offset)),
        ];
        self.cues.push(Cue::Fail);
        tracing::debug!(pair = %key, %ticket, "Merge rejected; inputs respawned");
        MergeOutcome::Rejected {
            ticket,
            key,
            respawned,
        }
    }

    fn place_result(&mut self, kind: &KindId, at: Position) -> InstanceId {
        if self.catalog.add_to_library(kind) {
            tracing::debug!(kind = %kind, "Kind joined the library");
        }
        if let Some(color) = self.catalog.get(kind).map(|k| k.color.clone()) {
            self.colors.push(color);
        }
        self.cues.push(Cue::Success);
        self.spawn_instance(kind.clone(), at)
    }

    fn next_ticket(&mut self) -> MergeTicket {
        self.next_ticket += 1;
        MergeTicket(self.next_ticket)
    }
}
