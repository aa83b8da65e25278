//! The persistent, concurrently-shared slot container.
//!
//! One container owns the canonical entry array for a single world
//! position, the set of live views mirroring it, and the backing file
//! the array persists to. Mutations may arrive from multiple request
//! threads; persistence runs on the calling thread under a single-flight
//! admission flag.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use chestworks_core::{codec, Entry};

use crate::fileio;
use crate::layout::SlotLayout;
use crate::pos::BlockPos;
use crate::view::{ContainerView, ViewHandle, WorldSink};

/// Canonical array plus attached views, guarded by one mutation lock.
struct ContainerState {
    slots: Vec<Entry>,
    views: Vec<Arc<dyn ContainerView>>,
}

impl ContainerState {
    /// Store `value` (sentinel for `None`) and stamp its slot index.
    /// Returns the stored entry, or `None` for an out-of-range slot.
    fn set(&mut self, slot: usize, value: Option<Entry>) -> Option<Entry> {
        if slot >= self.slots.len() {
            return None;
        }
        let stored = value.unwrap_or_else(|| Entry::empty(0)).at_slot(slot as u8);
        self.slots[slot] = stored;
        Some(stored)
    }
}

/// RAII guard for the save-admission flag. Construction test-and-sets
/// the flag; drop clears it on every exit path, including panics.
struct SaveAdmission<'a>(&'a AtomicBool);

impl<'a> SaveAdmission<'a> {
    fn try_begin(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for SaveAdmission<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A location-keyed slot container with file persistence and view fan-out.
pub struct Container {
    pos: BlockPos,
    path: PathBuf,
    layout: Box<dyn SlotLayout>,
    sink: Arc<dyn WorldSink>,
    state: RwLock<ContainerState>,
    saving: AtomicBool,
}

impl Container {
    /// Construct the container for `pos` under `dir` and load it from
    /// disk synchronously.
    ///
    /// Failure to create `dir` is fatal. Load failures are logged and
    /// leave the container empty or partially populated; construction
    /// still succeeds.
    pub fn open(
        dir: &Path,
        pos: BlockPos,
        layout: Box<dyn SlotLayout>,
        sink: Arc<dyn WorldSink>,
    ) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create container directory {}", dir.display()))?;

        let slots = (0..layout.slot_count())
            .map(|i| Entry::empty(i as u8))
            .collect();
        let container = Self {
            pos,
            path: dir.join(pos.file_name()),
            layout,
            sink,
            state: RwLock::new(ContainerState {
                slots,
                views: Vec::new(),
            }),
            saving: AtomicBool::new(false),
        };

        if let Err(err) = container.load() {
            tracing::warn!(pos = %container.pos, error = %err, "container load failed, starting empty");
        }

        Ok(container)
    }

    /// World position this container is bound to.
    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// Backing file path derived from the position.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of slots, fixed at construction.
    pub fn slot_count(&self) -> usize {
        self.layout.slot_count()
    }

    /// Read one slot. Returns the sentinel for never-set or
    /// out-of-range slots. Reads share the lock; they never exclude
    /// each other.
    pub fn entry(&self, slot: usize) -> Entry {
        let state = self.read_state();
        state
            .slots
            .get(slot)
            .copied()
            .unwrap_or_else(|| Entry::empty(slot as u8))
    }

    /// Write one slot under the mutation lock, substituting the
    /// sentinel for `None` and stamping the entry's slot index.
    /// Returns false for an out-of-range slot.
    pub fn set_entry(&self, slot: usize, value: Option<Entry>) -> bool {
        self.write_state().set(slot, value).is_some()
    }

    /// Canonical mutation entry point: set the slot, push the stored
    /// value to every attached view except the originator, then save.
    pub fn change_slot(&self, originator: ViewHandle, slot: usize, value: Option<Entry>) {
        let (stored, listeners) = {
            let mut state = self.write_state();
            let Some(stored) = state.set(slot, value) else {
                tracing::warn!(pos = %self.pos, slot, "ignoring change to out-of-range slot");
                return;
            };
            // Snapshot the view list so a view detaching during
            // fan-out cannot corrupt iteration.
            let listeners: Vec<Arc<dyn ContainerView>> = state
                .views
                .iter()
                .filter(|view| view.handle() != originator)
                .cloned()
                .collect();
            (stored, listeners)
        };

        for view in listeners {
            view.set_slot(slot, stored);
        }

        self.save();
    }

    /// True iff every slot holds the sentinel.
    pub fn is_empty(&self) -> bool {
        self.read_state().slots.iter().all(Entry::is_empty)
    }

    /// Persist the container, single-flight.
    ///
    /// If another save is already in progress the call returns
    /// immediately; the state it would have written is covered by the
    /// save triggered by the next mutation. An empty container deletes
    /// its backing file instead of writing one. I/O failures are logged
    /// and never roll back in-memory state.
    pub fn save(&self) {
        let Some(_admission) = SaveAdmission::try_begin(&self.saving) else {
            return;
        };
        if let Err(err) = self.write_backing_file() {
            tracing::warn!(pos = %self.pos, error = %err, "container save failed");
        }
    }

    /// Eject every non-empty entry into the world drop sink, reset the
    /// slots to the sentinel, and save (which deletes the file).
    pub fn drop_content(&self) {
        let dropped: Vec<Entry> = {
            let mut state = self.write_state();
            state
                .slots
                .iter_mut()
                .filter(|entry| !entry.is_empty())
                .map(|entry| {
                    let slot = entry.slot;
                    std::mem::replace(entry, Entry::empty(slot))
                })
                .collect()
        };

        for entry in dropped {
            self.sink.drop_item(self.pos, entry);
        }

        self.save();
    }

    /// Terminal transition: force-close every attached view so it
    /// detaches without writing back, then eject the contents. The
    /// container must not be used afterward.
    pub fn destroy(&self) {
        let views = std::mem::take(&mut self.write_state().views);
        for view in views {
            view.close(true);
        }
        self.drop_content();
    }

    /// Attach a view. Idempotent: attaching a handle already present
    /// leaves the list unchanged. List order is attachment order.
    pub fn add_view(&self, view: Arc<dyn ContainerView>) {
        let mut state = self.write_state();
        let handle = view.handle();
        if !state.views.iter().any(|v| v.handle() == handle) {
            state.views.push(view);
        }
    }

    /// Detach a view, persisting final state first so the last viewer
    /// closing leaves the file current before a potential eviction.
    pub fn remove_view(&self, handle: ViewHandle) {
        self.save();
        self.write_state().views.retain(|v| v.handle() != handle);
    }

    /// True if at least one view is attached.
    pub fn has_views(&self) -> bool {
        !self.read_state().views.is_empty()
    }

    /// Advisory eviction eligibility: no attached views, unless the
    /// layout keeps idle containers resident.
    pub fn is_unused(&self) -> bool {
        !self.has_views() && !self.layout.retain_while_idle()
    }

    /// Synchronous load under the mutation lock.
    ///
    /// A missing file yields an all-empty container. A file shorter
    /// than the layout leaves the remaining slots empty. A malformed
    /// record surfaces as an error after the records before it have
    /// been applied; the caller logs it.
    fn load(&self) -> Result<()> {
        let mut state = self.write_state();

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        let mut cursor = bytes.as_slice();
        for index in self.layout.persisted_slots() {
            if cursor.is_empty() {
                break;
            }
            let entry = codec::read_entry(&mut cursor)
                .with_context(|| format!("bad entry record for slot {index}"))?;
            state.slots[index] = entry.at_slot(index as u8);
        }
        Ok(())
    }

    /// Serialize under a shared lock, then write or delete the backing
    /// file outside any lock.
    fn write_backing_file(&self) -> Result<()> {
        let records: Option<Vec<u8>> = {
            let state = self.read_state();
            if state.slots.iter().all(Entry::is_empty) {
                None
            } else {
                let range = self.layout.persisted_slots();
                let mut buf = Vec::with_capacity(range.len() * codec::ENTRY_RECORD_LEN);
                for index in range {
                    codec::write_entry(&state.slots[index], &mut buf)?;
                }
                Some(buf)
            }
        };

        match records {
            Some(bytes) => fileio::replace_file(&self.path, &bytes),
            None => fileio::remove_if_exists(&self.path).map(|_| ()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ContainerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ContainerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
