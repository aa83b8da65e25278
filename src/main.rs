//! chestworks - persistent slot containers for a voxel world
//!
//! Smoke binary: opens a container store, applies a few mutations
//! through the canonical path, and prints the resulting slots.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chestworks_core::Entry;
use chestworks_store::{
    BlockPos, ChestLayout, ContainerStore, ContainerView, StoreConfig, ViewHandle, WorldSink,
};
use tracing::{info, Level};
use tracing_subscriber::fmt;

struct CliConfig {
    store: StoreConfig,
    pos: BlockPos,
}

/// Drop sink that only reports; the real world spawns item entities.
struct LogSink;

impl WorldSink for LogSink {
    fn drop_item(&self, pos: BlockPos, entry: Entry) {
        info!(pos = %pos, item = entry.item, count = entry.count, "dropped item");
    }
}

/// View that mirrors pushed updates to the log.
struct LogView(ViewHandle);

impl ContainerView for LogView {
    fn handle(&self) -> ViewHandle {
        self.0
    }

    fn set_slot(&self, slot: usize, entry: Entry) {
        info!(view = self.0 .0, slot, item = entry.item, "view updated");
    }

    fn close(&self, forced: bool) {
        info!(view = self.0 .0, forced, "view closed");
    }
}

fn main() -> Result<()> {
    let _ = fmt().with_max_level(Level::INFO).try_init();
    info!("booting container store smoke run");

    let config = config_from_args()?;
    let store = ContainerStore::new(&config.store, Arc::new(LogSink))?;
    let container = store.open(config.pos, Box::new(ChestLayout))?;

    let actor = ViewHandle(1);
    let mirror = ViewHandle(2);
    container.add_view(Arc::new(LogView(actor)));
    container.add_view(Arc::new(LogView(mirror)));

    container.change_slot(actor, 0, Some(Entry::new(5, 2)));
    container.change_slot(actor, 3, Some(Entry::with_aux(17, 1, 250)));
    container.change_slot(mirror, 3, None);

    for slot in 0..container.slot_count() {
        let entry = container.entry(slot);
        if !entry.is_empty() {
            info!(slot, item = entry.item, count = entry.count, aux = entry.aux, "occupied");
        }
    }

    container.remove_view(actor);
    container.remove_view(mirror);
    drop(container);

    store.flush_all();
    let evicted = store.evict_unused();
    info!(evicted, "done");
    Ok(())
}

fn config_from_args() -> Result<CliConfig> {
    config_from_iter(env::args().skip(1))
}

fn config_from_iter<I>(mut args: I) -> Result<CliConfig>
where
    I: Iterator<Item = String>,
{
    let mut config_path: Option<PathBuf> = None;
    let mut root: Option<PathBuf> = None;
    let mut pos = BlockPos::new(0, 64, 0);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next().map(PathBuf::from),
            "--root" => root = args.next().map(PathBuf::from),
            "--pos" => {
                if let Some(spec) = args.next() {
                    pos = parse_pos(&spec)?;
                }
            }
            _ => {}
        }
    }
    let mut store = match config_path {
        Some(path) => StoreConfig::from_file(&path)?,
        None => StoreConfig::default(),
    };
    if let Some(root) = root {
        store.root = root;
    }
    Ok(CliConfig { store, pos })
}

fn parse_pos(spec: &str) -> Result<BlockPos> {
    let parts: Vec<&str> = spec.split(',').collect();
    if parts.len() != 3 {
        anyhow::bail!("expected --pos x,y,z, got {spec}");
    }
    let coord = |i: usize| -> Result<i32> {
        parts[i]
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("bad coordinate {:?} in {spec}", parts[i]))
    };
    Ok(BlockPos::new(coord(0)?, coord(1)?, coord(2)?))
}
