//! Generic board graph shared by settlement-building games.
//!
//! This module contains:
//! - Tile, corner and edge records (identity plus opaque per-game attributes)
//! - Building kinds and the placement state carried by corners and edges
//! - The [`BoardGraph`] store with lookups, placement and adjacency queries
//! - The pure-data construction and serialization forms
//!
//! Entities refer to each other only by string id. Neighbor relations come
//! from a caller-supplied [`Topology`] on every query.

use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Player identifier as handed out by the room layer
pub type PlayerId = String;

/// Per-game fields the graph carries but never interprets (terrain, number, ...)
pub type Attributes = Map<String, Value>;

/// What can stand on a corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    Settlement,
    City,
}

/// A tile (hex, square, ...) of the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Tile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Attach a game-specific attribute
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// A corner where buildings are placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corner {
    pub id: String,
    #[serde(default)]
    pub building: Option<BuildingKind>,
    #[serde(default)]
    pub owner_id: Option<PlayerId>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Corner {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            building: None,
            owner_id: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// True when a building of another player stands here
    pub fn is_blocked_for(&self, player: &str) -> bool {
        self.building.is_some() && self.owner_id.as_deref() != Some(player)
    }
}

/// An edge where roads are placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    #[serde(default)]
    pub has_road: bool,
    #[serde(default)]
    pub owner_id: Option<PlayerId>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Edge {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            has_road: false,
            owner_id: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// True when this edge carries a road owned by `player`
    pub fn is_road_of(&self, player: &str) -> bool {
        self.has_road && self.owner_id.as_deref() == Some(player)
    }
}

/// Anything stored in a collection is addressed by its id
pub trait Entity {
    fn id(&self) -> &str;
}

impl Entity for Tile {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Corner {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Edge {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The three collections of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Tiles,
    Corners,
    Edges,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionKind::Tiles => "tile",
            CollectionKind::Corners => "corner",
            CollectionKind::Edges => "edge",
        };
        f.write_str(name)
    }
}

/// Borrowed view of an entity from any collection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Tile(&'a Tile),
    Corner(&'a Corner),
    Edge(&'a Edge),
}

impl EntityRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Tile(t) => &t.id,
            EntityRef::Corner(c) => &c.id,
            EntityRef::Edge(e) => &e.id,
        }
    }
}

/// Errors raised while building a graph from outside data
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("duplicate {collection} id: {id}")]
    DuplicateId {
        collection: CollectionKind,
        id: String,
    },

    #[error("malformed board data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Declarative input for [`BoardGraph::create`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub corners: Vec<Corner>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Pure-data form of a graph, placement state included
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedBoard {
    pub tiles: Vec<Tile>,
    pub corners: Vec<Corner>,
    pub edges: Vec<Edge>,
}

/// Insertion-ordered arena with an id index
#[derive(Debug, Clone, PartialEq)]
struct Collection<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Entity> Collection<T> {
    fn build(kind: CollectionKind, items: Vec<T>) -> Result<Self, BoardError> {
        let mut index = HashMap::with_capacity(items.len());
        for (slot, item) in items.iter().enumerate() {
            if index.insert(item.id().to_string(), slot).is_some() {
                return Err(BoardError::DuplicateId {
                    collection: kind,
                    id: item.id().to_string(),
                });
            }
        }
        Ok(Self { items, index })
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&slot| &self.items[slot])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        match self.index.get(id) {
            Some(&slot) => self.items.get_mut(slot),
            None => None,
        }
    }

    /// Resolve ids in order, dropping the ones that are not here
    fn resolve(&self, ids: Vec<String>) -> Vec<&T> {
        ids.iter().filter_map(|id| self.get(id)).collect()
    }
}

/// A board: tiles, corners and edges with their placement state
#[derive(Debug, Clone, PartialEq)]
pub struct BoardGraph {
    tiles: Collection<Tile>,
    corners: Collection<Corner>,
    edges: Collection<Edge>,
}

impl BoardGraph {
    /// Build a fresh board. Ownership on corners and edges is cleared no
    /// matter what the config carries; every other field is kept verbatim.
    pub fn create(config: BoardConfig) -> Result<Self, BoardError> {
        let corners = config
            .corners
            .into_iter()
            .map(|mut corner| {
                corner.building = None;
                corner.owner_id = None;
                corner
            })
            .collect();
        let edges = config
            .edges
            .into_iter()
            .map(|mut edge| {
                edge.has_road = false;
                edge.owner_id = None;
                edge
            })
            .collect();

        let graph = Self {
            tiles: Collection::build(CollectionKind::Tiles, config.tiles)?,
            corners: Collection::build(CollectionKind::Corners, corners)?,
            edges: Collection::build(CollectionKind::Edges, edges)?,
        };
        debug!(
            tiles = graph.tiles.items.len(),
            corners = graph.corners.items.len(),
            edges = graph.edges.items.len(),
            "created board graph"
        );
        Ok(graph)
    }

    // ==================== Lookups ====================

    /// Look up any entity by collection and id
    pub fn get(&self, collection: CollectionKind, id: &str) -> Option<EntityRef<'_>> {
        match collection {
            CollectionKind::Tiles => self.tile(id).map(EntityRef::Tile),
            CollectionKind::Corners => self.corner(id).map(EntityRef::Corner),
            CollectionKind::Edges => self.edge(id).map(EntityRef::Edge),
        }
    }

    /// All entities of a collection in insertion order
    pub fn get_all(&self, collection: CollectionKind) -> Vec<EntityRef<'_>> {
        match collection {
            CollectionKind::Tiles => self.tiles().iter().map(EntityRef::Tile).collect(),
            CollectionKind::Corners => self.corners().iter().map(EntityRef::Corner).collect(),
            CollectionKind::Edges => self.edges().iter().map(EntityRef::Edge).collect(),
        }
    }

    pub fn tile(&self, id: &str) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn corner(&self, id: &str) -> Option<&Corner> {
        self.corners.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles.items
    }

    pub fn corners(&self) -> &[Corner] {
        &self.corners.items
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges.items
    }

    // ==================== Adjacency ====================

    /// Corners around a tile
    pub fn tile_corners<T: Topology>(&self, tile_id: &str, topology: &T) -> Vec<&Corner> {
        match self.tile(tile_id) {
            Some(tile) => self.corners.resolve(topology.tile_corner_ids(tile)),
            None => Vec::new(),
        }
    }

    /// Tiles touching a corner
    pub fn corner_tiles<T: Topology>(&self, corner_id: &str, topology: &T) -> Vec<&Tile> {
        match self.corner(corner_id) {
            Some(corner) => self.tiles.resolve(topology.corner_tile_ids(corner)),
            None => Vec::new(),
        }
    }

    /// Edges meeting at a corner
    pub fn corner_adjacent_edges<T: Topology>(&self, corner_id: &str, topology: &T) -> Vec<&Edge> {
        match self.corner(corner_id) {
            Some(corner) => self.edges.resolve(topology.corner_edge_ids(corner)),
            None => Vec::new(),
        }
    }

    /// Corners one edge away from a corner
    pub fn adjacent_corners<T: Topology>(&self, corner_id: &str, topology: &T) -> Vec<&Corner> {
        match self.corner(corner_id) {
            Some(corner) => self.corners.resolve(topology.corner_corner_ids(corner)),
            None => Vec::new(),
        }
    }

    /// Endpoints of an edge
    pub fn edge_corners<T: Topology>(&self, edge_id: &str, topology: &T) -> Vec<&Corner> {
        match self.edge(edge_id) {
            Some(edge) => self.corners.resolve(topology.edge_corner_ids(edge)),
            None => Vec::new(),
        }
    }

    // ==================== Placement ====================

    /// Put a building on a corner, overwriting whatever stood there.
    /// Returns false for an unknown corner.
    pub fn place_building(&mut self, corner_id: &str, kind: BuildingKind, player: &str) -> bool {
        match self.corners.get_mut(corner_id) {
            Some(corner) => {
                corner.building = Some(kind);
                corner.owner_id = Some(player.to_string());
                debug!(corner = corner_id, ?kind, player, "placed building");
                true
            }
            None => false,
        }
    }

    /// Put a road on an edge. Returns false for an unknown edge.
    pub fn place_road(&mut self, edge_id: &str, player: &str) -> bool {
        match self.edges.get_mut(edge_id) {
            Some(edge) => {
                edge.has_road = true;
                edge.owner_id = Some(player.to_string());
                debug!(edge = edge_id, player, "placed road");
                true
            }
            None => false,
        }
    }

    pub fn is_corner_occupied(&self, corner_id: &str) -> bool {
        self.corner(corner_id).is_some_and(|c| c.building.is_some())
    }

    pub fn is_edge_occupied(&self, edge_id: &str) -> bool {
        self.edge(edge_id).is_some_and(|e| e.has_road)
    }

    /// Corners holding a building owned by `player`
    pub fn player_buildings(&self, player: &str) -> Vec<&Corner> {
        self.corners()
            .iter()
            .filter(|c| c.building.is_some() && c.owner_id.as_deref() == Some(player))
            .collect()
    }

    /// Edges holding a road owned by `player`
    pub fn player_roads(&self, player: &str) -> Vec<&Edge> {
        self.edges().iter().filter(|e| e.is_road_of(player)).collect()
    }

    // ==================== Serialization ====================

    /// Snapshot every record, placement state included
    pub fn serialize(&self) -> SerializedBoard {
        SerializedBoard {
            tiles: self.tiles.items.clone(),
            corners: self.corners.items.clone(),
            edges: self.edges.items.clone(),
        }
    }

    /// Rebuild a board from a snapshot. Unlike [`BoardGraph::create`], the
    /// placement state is restored as-is.
    pub fn deserialize(data: SerializedBoard) -> Result<Self, BoardError> {
        Ok(Self {
            tiles: Collection::build(CollectionKind::Tiles, data.tiles)?,
            corners: Collection::build(CollectionKind::Corners, data.corners)?,
            edges: Collection::build(CollectionKind::Edges, data.edges)?,
        })
    }

    pub fn to_json(&self) -> Result<String, BoardError> {
        Ok(serde_json::to_string(&self.serialize())?)
    }

    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let data: SerializedBoard = serde_json::from_str(json)?;
        Self::deserialize(data)
    }
}
