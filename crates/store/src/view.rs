//! Live views attached to a container.

use chestworks_core::Entry;

use crate::pos::BlockPos;

/// Stable identity of one attached view, used to exclude the mutation
/// originator from fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewHandle(pub u64);

/// A live client-facing view of one container.
///
/// Views own no entries; they mirror the canonical array. Updates flow
/// one way, container to view, via [`ContainerView::set_slot`]. A view
/// never mutates container internals from inside a callback.
pub trait ContainerView: Send + Sync {
    /// Handle distinguishing this view from other views of the same
    /// container.
    fn handle(&self) -> ViewHandle;

    /// Mirror a slot update pushed by the container.
    fn set_slot(&self, slot: usize, entry: Entry);

    /// Close this view. `forced` is true when the container itself is
    /// going away and the view must detach without writing back.
    fn close(&self, forced: bool);
}

/// World-side sink consumed when a container ejects its contents.
pub trait WorldSink: Send + Sync {
    /// Spawn a dropped item for `entry` at the container's position.
    fn drop_item(&self, pos: BlockPos, entry: Entry);
}
