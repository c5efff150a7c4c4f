// src/tilemap/editor.rs
//! Edit session: the single active builder, held by the app instead of a global.

use bevy::prelude::*;

use super::builder::TilemapBuilder;
use super::core::FootprintLookup;
use super::error::Result;
use super::state::Tilemap;

/// Fired once per successful edit of the tilemap on `.0`.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilesChanged(pub Entity);

pub struct EditSession {
    target: Entity,
    builder: TilemapBuilder,
    synced_revision: u64,
}

/// At most one open tilemap at a time.
#[derive(Resource, Default)]
pub struct TilemapEditor {
    session: Option<EditSession>,
}

impl TilemapEditor {
    /// Opens `tilemap` (the current state of `target`) for editing. Any previous
    /// session is closed; its edits already live in its entity's `Tilemap`.
    pub fn open(&mut self, target: Entity, tilemap: Tilemap, lookup: &impl FootprintLookup) -> Result<()> {
        let builder = TilemapBuilder::new(tilemap, lookup)?;
        info!(
            "Tilemap editor: opened {:?} ({} tiles)",
            target,
            builder.instance_count()
        );
        if let Some(prev) = self.session.replace(EditSession { target, builder, synced_revision: 0 }) {
            debug!("Tilemap editor: closed {:?}", prev.target);
        }
        Ok(())
    }

    /// Ends the session and hands back the edited map.
    pub fn close(&mut self) -> Option<(Entity, Tilemap)> {
        let session = self.session.take()?;
        info!("Tilemap editor: closed {:?}", session.target);
        Some((session.target, session.builder.into_tilemap()))
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn target(&self) -> Option<Entity> {
        self.session.as_ref().map(|s| s.target)
    }

    pub fn builder(&self) -> Option<&TilemapBuilder> {
        self.session.as_ref().map(|s| &s.builder)
    }

    pub fn builder_mut(&mut self) -> Option<&mut TilemapBuilder> {
        self.session.as_mut().map(|s| &mut s.builder)
    }
}

/// Copies the builder's list into the target's `Tilemap` after each edit and
/// fires [`TilesChanged`] once for it.
pub fn sync_edited_tilemap(
    mut editor: ResMut<TilemapEditor>,
    mut q: Query<&mut Tilemap>,
    mut writer: EventWriter<TilesChanged>,
) {
    let Some(session) = editor.session.as_mut() else { return };
    let revision = session.builder.revision();
    if revision == session.synced_revision { return; }
    session.synced_revision = revision;

    match q.get_mut(session.target) {
        Ok(mut tilemap) => *tilemap = session.builder.tilemap().clone(),
        Err(_) => warn!("Tilemap editor: target {:?} has no Tilemap component", session.target),
    }
    writer.write(TilesChanged(session.target));
}
