//! Core engine for Aether.
//!
//! [`Engine`] owns the surface, the token catalog and the recipe store. Every
//! mutation happens through `&mut Engine` on one thread of control; the only
//! asynchronous work is the oracle call behind a recipe miss, which runs as a
//! spawned task and is applied back by [`Engine::poll_merges`] or
//! [`Engine::settle`].
//!
//! # Driving the engine
//!
//! ```no_run
//! # async fn demo() -> Result<(), aether_engine::PlaceError> {
//! use std::sync::Arc;
//! use aether_engine::{Engine, EngineSettings};
//! use aether_providers::Unconfigured;
//! use aether_types::{KindId, Position};
//!
//! let mut engine = Engine::new(Arc::new(Unconfigured), EngineSettings::default());
//! let fire = engine.place(&KindId::known("fire"), Position::new(100.0, 100.0))?;
//! engine.place(&KindId::known("water"), Position::new(200.0, 100.0))?;
//! engine.release(fire, Position::new(180.0, 100.0));
//! engine.tick();
//! # Ok(())
//! # }
//! ```

mod catalog;
mod init;
mod merge;
mod notifications;
mod proximity;
mod recipes;
mod seed;
mod surface;

use std::sync::Arc;

use aether_providers::Oracle;
use aether_types::{InstanceId, KindId, Position, TokenInstance, TokenKind};
use thiserror::Error;
use tokio::time::Instant;

pub use aether_providers;
pub use aether_types;
pub use catalog::TokenCatalog;
pub use init::{DEFAULT_REJECT_OFFSET, EngineSettings, oracle_from_config};
pub use merge::{MergeOutcome, MergeStart, MergeTicket};
pub use notifications::{
    ANALYZING_SUBTITLE, ANALYZING_TITLE, Cue, DEFAULT_DISCOVERY_DURATION, DISCOVERY_TITLE,
    Notice, Status,
};
pub use proximity::{DEFAULT_MERGE_THRESHOLD, detect};
pub use recipes::RecipeStore;
pub use seed::{DERIVED, PRIMITIVES, RECIPES, SeedKind};
pub use surface::Surface;

use merge::PendingMerge;
use notifications::{Announcer, ColorTrail, CueQueue};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceError {
    #[error("unknown kind '{0}'")]
    UnknownKind(KindId),
    #[error("'{0}' has not been discovered yet")]
    NotDiscovered(KindId),
}

/// The combination sandbox.
pub struct Engine {
    catalog: TokenCatalog,
    recipes: RecipeStore,
    surface: Surface,
    oracle: Arc<dyn Oracle>,
    settings: EngineSettings,
    pending: Vec<PendingMerge>,
    next_ticket: u64,
    announcer: Announcer,
    cues: CueQueue,
    colors: ColorTrail,
}

impl Engine {
    /// Engine seeded with the built-in kinds and recipes.
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, settings: EngineSettings) -> Self {
        Self::with_stores(
            oracle,
            settings,
            TokenCatalog::seeded(),
            RecipeStore::seeded(),
        )
    }

    #[must_use]
    pub fn with_stores(
        oracle: Arc<dyn Oracle>,
        settings: EngineSettings,
        catalog: TokenCatalog,
        recipes: RecipeStore,
    ) -> Self {
        Self {
            catalog,
            recipes,
            surface: Surface::new(),
            oracle,
            announcer: Announcer::new(settings.discovery_duration),
            settings,
            pending: Vec::new(),
            next_ticket: 0,
            cues: CueQueue::new(),
            colors: ColorTrail::seeded(),
        }
    }

    // ------------------------------------------------------------------
    // Surface operations
    // ------------------------------------------------------------------

    /// Drop a library kind onto the surface.
    pub fn place(&mut self, kind: &KindId, position: Position) -> Result<InstanceId, PlaceError> {
        if !self.catalog.contains(kind) {
            return Err(PlaceError::UnknownKind(kind.clone()));
        }
        if !self.catalog.in_library(kind) {
            return Err(PlaceError::NotDiscovered(kind.clone()));
        }
        Ok(self.spawn_instance(kind.clone(), position))
    }

    /// Drag update. No detection happens until [`Engine::release`].
    ///
    /// Returns `false` when the instance is gone, which is not an error: it
    /// may have been consumed by a merge or a clear mid-drag.
    pub fn move_instance(&mut self, id: InstanceId, position: Position) -> bool {
        self.surface.move_to(id, position)
    }

    /// End of a drag: move to the final position, then look for a merge
    /// partner exactly once.
    pub fn release(&mut self, id: InstanceId, position: Position) -> Option<MergeStart> {
        if !self.surface.move_to(id, position) {
            return None;
        }
        let partner = detect(
            id,
            position,
            self.surface.instances(),
            self.settings.merge_threshold,
        )?;
        self.resolve(id, partner)
    }

    /// Look for a merge partner for `id` at its current position.
    #[must_use]
    pub fn detect_for(&self, id: InstanceId) -> Option<InstanceId> {
        let instance = self.surface.get(id)?;
        detect(
            id,
            instance.position,
            self.surface.instances(),
            self.settings.merge_threshold,
        )
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<TokenInstance> {
        self.surface.remove(id)
    }

    /// Remove everything currently on the surface.
    ///
    /// Pending merges are unaffected and still place their results later.
    pub fn clear(&mut self) -> usize {
        let removed = self.surface.clear();
        self.cues.push(Cue::Fail);
        tracing::debug!(removed, pending = self.pending.len(), "Surface cleared");
        removed
    }

    /// Surface snapshot in iteration order.
    #[must_use]
    pub fn instances(&self) -> &[TokenInstance] {
        self.surface.instances()
    }

    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&TokenInstance> {
        self.surface.get(id)
    }

    // ------------------------------------------------------------------
    // Reference data
    // ------------------------------------------------------------------

    #[must_use]
    pub fn catalog(&self) -> &TokenCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn recipes(&self) -> &RecipeStore {
        &self.recipes
    }

    /// Kinds the player may place, in discovery order.
    pub fn library(&self) -> impl Iterator<Item = &TokenKind> {
        self.catalog.library()
    }

    /// The "Discovered" counter.
    #[must_use]
    pub fn discovered_count(&self) -> usize {
        self.catalog.library_len()
    }

    /// Kind ids referenced by the surface or the recipe store that the
    /// catalog cannot resolve. Empty whenever the engine is consistent.
    #[must_use]
    pub fn unresolved_kinds(&self) -> Vec<KindId> {
        let mut missing: Vec<KindId> = self
            .surface
            .instances()
            .iter()
            .map(|instance| &instance.kind)
            .chain(
                self.recipes
                    .sorted()
                    .into_iter()
                    .flat_map(|(key, result)| [key.first(), key.second(), result]),
            )
            .filter(|id| !self.catalog.contains(id))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    // ------------------------------------------------------------------
    // Status and presentation
    // ------------------------------------------------------------------

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.announcer.status(self.pending.len(), Instant::now())
    }

    /// Drain queued sound cues.
    pub fn take_cues(&mut self) -> Vec<Cue> {
        self.cues.take()
    }

    /// Colors of recent merge results, oldest first.
    pub fn recent_colors(&self) -> impl Iterator<Item = &str> {
        self.colors.iter()
    }

    /// Per-frame housekeeping: apply finished merges and expire announcements.
    pub fn tick(&mut self) -> Vec<MergeOutcome> {
        let outcomes = self.poll_merges();
        self.announcer.expire(Instant::now());
        outcomes
    }

    pub(crate) fn spawn_instance(&mut self, kind: KindId, at: Position) -> InstanceId {
        let id = self.surface.place(kind, at);
        self.cues.push(Cue::Pop);
        id
    }
}
