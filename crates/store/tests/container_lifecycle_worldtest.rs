//! End-to-end container lifecycle coverage: mutation fan-out, view
//! attach/detach, content ejection, and persistence across instances.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use chestworks_core::Entry;
use chestworks_store::{
    BlockPos, ChestLayout, Container, ContainerView, SlotLayout, ViewHandle, WorldSink,
};

fn temp_dir(tag: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    env::temp_dir().join(format!("chestworks_lifecycle_{}_{}", tag, timestamp))
}

#[derive(Default)]
struct RecordingSink {
    drops: Mutex<Vec<(BlockPos, Entry)>>,
}

impl WorldSink for RecordingSink {
    fn drop_item(&self, pos: BlockPos, entry: Entry) {
        self.drops.lock().unwrap().push((pos, entry));
    }
}

struct RecordingView {
    handle: ViewHandle,
    updates: Mutex<Vec<(usize, Entry)>>,
    closed: Mutex<Option<bool>>,
}

impl RecordingView {
    fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            handle: ViewHandle(id),
            updates: Mutex::new(Vec::new()),
            closed: Mutex::new(None),
        })
    }

    fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

impl ContainerView for RecordingView {
    fn handle(&self) -> ViewHandle {
        self.handle
    }

    fn set_slot(&self, slot: usize, entry: Entry) {
        self.updates.lock().unwrap().push((slot, entry));
    }

    fn close(&self, forced: bool) {
        *self.closed.lock().unwrap() = Some(forced);
    }
}

/// Nine-slot layout used by the reload scenario.
struct NineSlots;

impl SlotLayout for NineSlots {
    fn slot_count(&self) -> usize {
        9
    }
}

fn open(dir: &PathBuf, layout: Box<dyn SlotLayout>) -> Container {
    Container::open(
        dir,
        BlockPos::new(10, 64, -7),
        layout,
        Arc::new(RecordingSink::default()),
    )
    .unwrap()
}

#[test]
fn nine_slot_change_survives_reload() {
    let dir = temp_dir("nine_slot");

    let container = open(&dir, Box::new(NineSlots));
    container.change_slot(ViewHandle(1), 3, Some(Entry::new(5, 2)));
    container.save();
    drop(container);

    let reloaded = open(&dir, Box::new(NineSlots));
    for slot in 0..9 {
        let entry = reloaded.entry(slot);
        if slot == 3 {
            assert_eq!(entry.item, 5);
            assert_eq!(entry.count, 2);
            assert_eq!(entry.slot, 3);
        } else {
            assert!(entry.is_empty(), "slot {slot} should be empty");
        }
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn fanout_skips_the_originator() {
    let dir = temp_dir("fanout");
    let container = open(&dir, Box::new(ChestLayout));

    let actor = RecordingView::new(1);
    let other_a = RecordingView::new(2);
    let other_b = RecordingView::new(3);
    container.add_view(actor.clone());
    container.add_view(other_a.clone());
    container.add_view(other_b.clone());

    container.change_slot(actor.handle(), 5, Some(Entry::new(9, 1)));

    assert_eq!(actor.update_count(), 0);
    assert_eq!(other_a.update_count(), 1);
    assert_eq!(other_b.update_count(), 1);

    let (slot, entry) = other_a.updates.lock().unwrap()[0];
    assert_eq!(slot, 5);
    assert_eq!(entry.item, 9);
    assert_eq!(entry.slot, 5);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn add_view_is_idempotent() {
    let dir = temp_dir("idempotent");
    let container = open(&dir, Box::new(ChestLayout));

    let view = RecordingView::new(7);
    container.add_view(view.clone());
    container.add_view(view.clone());

    // A mutation from another handle reaches the view exactly once.
    container.change_slot(ViewHandle(99), 0, Some(Entry::new(1, 1)));
    assert_eq!(view.update_count(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn removing_last_view_persists_and_reports_unused() {
    let dir = temp_dir("remove_view");
    let container = open(&dir, Box::new(ChestLayout));

    let view = RecordingView::new(1);
    container.add_view(view.clone());
    container.set_entry(0, Some(Entry::new(4, 8)));
    assert!(container.has_views());
    assert!(!container.is_unused());

    container.remove_view(view.handle());

    assert!(!container.has_views());
    assert!(container.is_unused());
    // Detach forced a save; the container is non-empty so the file stays.
    assert!(container.path().exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn drop_content_ejects_entries_and_deletes_file() {
    let dir = temp_dir("drop_content");
    let sink = Arc::new(RecordingSink::default());
    let pos = BlockPos::new(2, 60, 2);
    let container = Container::open(&dir, pos, Box::new(ChestLayout), sink.clone()).unwrap();

    container.set_entry(1, Some(Entry::new(5, 2)));
    container.set_entry(20, Some(Entry::with_aux(8, 1, 30)));
    container.save();
    assert!(container.path().exists());

    container.drop_content();

    let drops = sink.drops.lock().unwrap();
    assert_eq!(drops.len(), 2);
    assert_eq!(drops[0].0, pos);
    assert_eq!(drops[0].1.item, 5);
    assert_eq!(drops[1].1.item, 8);
    assert_eq!(drops[1].1.aux, 30);
    drop(drops);

    assert!(container.is_empty());
    assert!(!container.path().exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn destroy_force_closes_views_before_ejecting() {
    let dir = temp_dir("destroy");
    let container = open(&dir, Box::new(ChestLayout));

    let view = RecordingView::new(1);
    container.add_view(view.clone());
    container.set_entry(0, Some(Entry::new(2, 2)));

    container.destroy();

    assert_eq!(*view.closed.lock().unwrap(), Some(true));
    assert!(!container.has_views());
    assert!(container.is_empty());
    assert!(!container.path().exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn view_detaching_during_fanout_is_safe() {
    // A view whose set_slot callback detaches itself must not corrupt
    // the fan-out iteration or deadlock the container.
    struct SelfDetachingView {
        handle: ViewHandle,
        container: Mutex<Option<Arc<Container>>>,
    }

    impl ContainerView for SelfDetachingView {
        fn handle(&self) -> ViewHandle {
            self.handle
        }

        fn set_slot(&self, _slot: usize, _entry: Entry) {
            if let Some(container) = self.container.lock().unwrap().take() {
                container.remove_view(self.handle);
            }
        }

        fn close(&self, _forced: bool) {}
    }

    let dir = temp_dir("self_detach");
    let container = Arc::new(open(&dir, Box::new(ChestLayout)));

    let detacher = Arc::new(SelfDetachingView {
        handle: ViewHandle(2),
        container: Mutex::new(Some(container.clone())),
    });
    let witness = RecordingView::new(3);
    container.add_view(detacher);
    container.add_view(witness.clone());

    container.change_slot(ViewHandle(1), 0, Some(Entry::new(1, 1)));
    assert_eq!(witness.update_count(), 1);
    assert!(container.has_views());

    // The detacher is gone; only the witness sees the next change.
    container.change_slot(ViewHandle(1), 1, Some(Entry::new(2, 1)));
    assert_eq!(witness.update_count(), 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn concurrent_mutations_keep_every_write() {
    let dir = temp_dir("concurrent");
    let container = Arc::new(open(&dir, Box::new(ChestLayout)));

    let mut handles = Vec::new();
    for thread_id in 0..8u64 {
        let container = Arc::clone(&container);
        handles.push(std::thread::spawn(move || {
            for round in 0..4usize {
                let slot = (thread_id as usize * 3 + round) % 27;
                container.change_slot(
                    ViewHandle(thread_id),
                    slot,
                    Some(Entry::new(thread_id as u16 + 1, 1)),
                );
                // Saves race on purpose; losers skip without blocking.
                container.save();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(!container.is_empty());
    container.save();
    drop(container);

    // Whatever interleaving happened, the file reloads cleanly and
    // every occupied slot carries its own index.
    let reloaded = open(&dir, Box::new(ChestLayout));
    for slot in 0..reloaded.slot_count() {
        let entry = reloaded.entry(slot);
        if !entry.is_empty() {
            assert_eq!(entry.slot as usize, slot);
        }
    }

    fs::remove_dir_all(&dir).ok();
}
