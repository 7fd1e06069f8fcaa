//! Board session management.

use parlor_core::{
    award_longest_road, longest_road, standard_board, standard_board_with_rng, AdjacencyTable,
    AwardChange, BoardConfig, BoardError, BoardGraph, BuildingKind, ChessError, Corner, Edge,
    HexTopology, PlayerId, SerializedBoard, Tile, Topology,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::protocol::RoadLength;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Board not found")]
    BoardNotFound,

    #[error("Not the board owner")]
    NotOwner,

    #[error("Invalid board: {0}")]
    Board(#[from] BoardError),

    #[error("Invalid position: {0}")]
    Chess(#[from] ChessError),
}

/// The adjacency a session walks its board with.
#[derive(Debug, Clone)]
pub enum SessionTopology {
    Hex(HexTopology),
    Table(AdjacencyTable),
}

impl Topology for SessionTopology {
    fn tile_corner_ids(&self, tile: &Tile) -> Vec<String> {
        match self {
            SessionTopology::Hex(hex) => hex.tile_corner_ids(tile),
            SessionTopology::Table(table) => table.tile_corner_ids(tile),
        }
    }

    fn corner_tile_ids(&self, corner: &Corner) -> Vec<String> {
        match self {
            SessionTopology::Hex(hex) => hex.corner_tile_ids(corner),
            SessionTopology::Table(table) => table.corner_tile_ids(corner),
        }
    }

    fn corner_edge_ids(&self, corner: &Corner) -> Vec<String> {
        match self {
            SessionTopology::Hex(hex) => hex.corner_edge_ids(corner),
            SessionTopology::Table(table) => table.corner_edge_ids(corner),
        }
    }

    fn edge_corner_ids(&self, edge: &Edge) -> Vec<String> {
        match self {
            SessionTopology::Hex(hex) => hex.edge_corner_ids(edge),
            SessionTopology::Table(table) => table.edge_corner_ids(edge),
        }
    }

    fn corner_corner_ids(&self, corner: &Corner) -> Vec<String> {
        match self {
            SessionTopology::Hex(hex) => hex.corner_corner_ids(corner),
            SessionTopology::Table(table) => table.corner_corner_ids(corner),
        }
    }
}

/// Result of a longest road check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadReport {
    pub lengths: Vec<RoadLength>,
    pub holder: Option<PlayerId>,
    pub change: Option<AwardChange>,
}

/// A board held by the server on behalf of one connection.
pub struct BoardSession {
    pub id: Uuid,
    /// Connection that created the session
    pub owner: Uuid,
    graph: BoardGraph,
    topology: SessionTopology,
    /// Current longest road holder
    award_holder: Option<PlayerId>,
}

impl BoardSession {
    fn new(id: Uuid, owner: Uuid, graph: BoardGraph, topology: SessionTopology) -> Self {
        debug!(
            board_id = %id,
            %owner,
            tiles = graph.tiles().len(),
            "opened board session"
        );
        Self {
            id,
            owner,
            graph,
            topology,
            award_holder: None,
        }
    }

    /// Standard hex board, reproducible when `seed` is given
    pub fn standard(id: Uuid, owner: Uuid, seed: Option<u64>) -> Result<Self, SessionError> {
        let config = match seed {
            Some(seed) => standard_board_with_rng(&mut StdRng::seed_from_u64(seed)),
            None => standard_board(),
        };
        let graph = BoardGraph::create(config)?;
        Ok(Self::new(id, owner, graph, SessionTopology::Hex(HexTopology)))
    }

    pub fn custom(
        id: Uuid,
        owner: Uuid,
        config: BoardConfig,
        adjacency: AdjacencyTable,
    ) -> Result<Self, SessionError> {
        let graph = BoardGraph::create(config)?;
        Ok(Self::new(id, owner, graph, SessionTopology::Table(adjacency)))
    }

    /// Restore a saved board. Without a table the ids are read as hex ids.
    pub fn load(
        id: Uuid,
        owner: Uuid,
        board: SerializedBoard,
        adjacency: Option<AdjacencyTable>,
    ) -> Result<Self, SessionError> {
        let graph = BoardGraph::deserialize(board)?;
        let topology = match adjacency {
            Some(table) => SessionTopology::Table(table),
            None => SessionTopology::Hex(HexTopology),
        };
        Ok(Self::new(id, owner, graph, topology))
    }

    pub fn check_owner(&self, connection: Uuid) -> Result<(), SessionError> {
        if self.owner == connection {
            Ok(())
        } else {
            Err(SessionError::NotOwner)
        }
    }

    pub fn place_building(&mut self, corner_id: &str, kind: BuildingKind, player: &str) -> bool {
        self.graph.place_building(corner_id, kind, player)
    }

    pub fn place_road(&mut self, edge_id: &str, player: &str) -> bool {
        self.graph.place_road(edge_id, player)
    }

    /// Measure every player's road and move the award if it changed hands.
    pub fn longest_roads(&mut self, players: &[PlayerId]) -> RoadReport {
        let lengths = players
            .iter()
            .map(|player| RoadLength {
                player: player.clone(),
                length: longest_road(&self.graph, player, &self.topology),
            })
            .collect();

        let change = award_longest_road(
            &self.graph,
            &self.topology,
            players,
            self.award_holder.as_deref(),
        );
        if let Some(change) = &change {
            debug!(
                board_id = %self.id,
                previous = ?change.previous,
                current = ?change.current,
                "longest road changed hands"
            );
            self.award_holder = change.current.clone();
        }

        RoadReport {
            lengths,
            holder: self.award_holder.clone(),
            change,
        }
    }

    pub fn snapshot(&self) -> SerializedBoard {
        self.graph.serialize()
    }
}
