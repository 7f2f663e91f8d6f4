use aloft_chunk::Chunk;
use aloft_world::ChunkCoord;

/// Receives residency changes. `chunk_added` borrows the chunk for the
/// duration of the call; the store keeps ownership.
pub trait ChunkSink {
    fn chunk_added(&mut self, chunk: &Chunk);
    fn chunk_removed(&mut self, coord: ChunkCoord);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    Added {
        coord: ChunkCoord,
        tick: u64,
        vertices: usize,
        features: usize,
    },
    Removed {
        coord: ChunkCoord,
    },
}

impl ChunkEvent {
    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        match self {
            ChunkEvent::Added { coord, .. } | ChunkEvent::Removed { coord } => *coord,
        }
    }
}

/// Sink that records every event in order.
#[derive(Default, Debug)]
pub struct EventLog {
    events: Vec<ChunkEvent>,
}

impl EventLog {
    #[inline]
    pub fn events(&self) -> &[ChunkEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn added(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.events.iter().filter_map(|e| match e {
            ChunkEvent::Added { coord, .. } => Some(*coord),
            ChunkEvent::Removed { .. } => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.events.iter().filter_map(|e| match e {
            ChunkEvent::Removed { coord } => Some(*coord),
            ChunkEvent::Added { .. } => None,
        })
    }
}

impl ChunkSink for EventLog {
    fn chunk_added(&mut self, chunk: &Chunk) {
        self.events.push(ChunkEvent::Added {
            coord: chunk.coord,
            tick: chunk.created_tick,
            vertices: chunk.surface.vertex_count(),
            features: chunk.features.len(),
        });
    }

    fn chunk_removed(&mut self, coord: ChunkCoord) {
        self.events.push(ChunkEvent::Removed { coord });
    }
}
