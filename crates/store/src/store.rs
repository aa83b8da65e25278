//! Owning collection of containers for one world.
//!
//! Constructs containers on first access, evicts the ones nobody is
//! viewing, and force-flushes everything on shutdown. Uses BTreeMap for
//! deterministic iteration order.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};

use crate::config::StoreConfig;
use crate::container::Container;
use crate::layout::SlotLayout;
use crate::pos::BlockPos;
use crate::view::WorldSink;

/// World-level container registry rooted at one storage directory.
pub struct ContainerStore {
    dir: PathBuf,
    sink: Arc<dyn WorldSink>,
    containers: Mutex<BTreeMap<BlockPos, Arc<Container>>>,
}

impl ContainerStore {
    /// Create a store rooted at `config.root/config.subdir`. Failure to
    /// create the directory is fatal.
    pub fn new(config: &StoreConfig, sink: Arc<dyn WorldSink>) -> Result<Self> {
        let dir = config.container_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create storage root {}", dir.display()))?;
        Ok(Self {
            dir,
            sink,
            containers: Mutex::new(BTreeMap::new()),
        })
    }

    /// Fetch the resident container at `pos`, constructing and loading
    /// it with `layout` if this is the first access.
    pub fn open(&self, pos: BlockPos, layout: Box<dyn SlotLayout>) -> Result<Arc<Container>> {
        let mut containers = self.lock();
        if let Some(container) = containers.get(&pos) {
            return Ok(Arc::clone(container));
        }
        let container = Arc::new(Container::open(
            &self.dir,
            pos,
            layout,
            Arc::clone(&self.sink),
        )?);
        containers.insert(pos, Arc::clone(&container));
        Ok(container)
    }

    /// Fetch the container at `pos` without constructing one.
    pub fn get(&self, pos: BlockPos) -> Option<Arc<Container>> {
        self.lock().get(&pos).cloned()
    }

    /// Save and drop every resident container that reports unused.
    /// On-disk state survives; an evicted container is reconstructed on
    /// the next open. Returns the number evicted.
    pub fn evict_unused(&self) -> usize {
        let evicted: Vec<Arc<Container>> = {
            let mut containers = self.lock();
            let unused: Vec<BlockPos> = containers
                .iter()
                .filter(|(_, c)| c.is_unused())
                .map(|(pos, _)| *pos)
                .collect();
            unused
                .iter()
                .filter_map(|pos| containers.remove(pos))
                .collect()
        };

        for container in &evicted {
            container.save();
            tracing::info!(pos = %container.pos(), "evicted idle container");
        }
        evicted.len()
    }

    /// Remove the container at `pos` from the world: views are
    /// force-closed, contents ejected into the drop sink, and the
    /// backing file deleted.
    pub fn destroy(&self, pos: BlockPos) {
        let container = self.lock().remove(&pos);
        if let Some(container) = container {
            container.destroy();
            tracing::info!(pos = %pos, "destroyed container");
        }
    }

    /// Force-save every resident container (shutdown path).
    pub fn flush_all(&self) {
        let containers: Vec<Arc<Container>> = self.lock().values().cloned().collect();
        for container in &containers {
            container.save();
        }
        tracing::info!(count = containers.len(), "flushed resident containers");
    }

    /// Number of resident containers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no containers are resident.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True if a container is resident at `pos`.
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.lock().contains_key(&pos)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<BlockPos, Arc<Container>>> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
