//! Parlor - shared engine for a hub of turn-based board games
//!
//! This crate provides:
//! - A keyed board graph of tiles, corners and edges with free-form attributes
//! - Longest-road search over that graph through an injected topology
//! - A generic alpha-beta game-tree search with material evaluation
//! - Chess as the first searchable game, plus a computer opponent
//!
//! # Architecture
//!
//! Like the game rules it serves, the engine is platform-agnostic. It can be
//! compiled to:
//! - Native Rust for the WebSocket server
//! - WebAssembly for in-browser analysis (`wasm` feature)
//!
//! # Modules
//!
//! - [`graph`]: Board graph storage, placement and serialization
//! - [`topology`]: The adjacency capability and an explicit table form
//! - [`hex`]: Hex coordinates and the hex-id topology
//! - [`layout`]: Standard settlement board generation
//! - [`paths`]: Longest road and the longest-road award
//! - [`search`]: Minimax with alpha-beta pruning
//! - [`chess`] / [`movegen`]: Chess positions and legal moves
//! - [`bot`]: Computer opponent by difficulty

pub mod bot;
pub mod chess;
pub mod graph;
pub mod hex;
pub mod layout;
pub mod movegen;
pub mod paths;
pub mod search;
pub mod topology;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use bot::{ComputerOpponent, Difficulty};
pub use chess::{
    ChessError, ChessMove, ChessPosition, MaterialTable, MoveDescriptor, Piece, PieceKind,
    START_FEN,
};
pub use graph::{
    Attributes, BoardConfig, BoardError, BoardGraph, BuildingKind, CollectionKind, Corner, Edge,
    Entity, EntityRef, PlayerId, SerializedBoard, Tile,
};
pub use hex::{EdgeCoord, EdgeDirection, HexCoord, HexIdError, HexTopology, VertexCoord, VertexDirection};
pub use layout::{standard_board, standard_board_with_rng, Terrain};
pub use paths::{award_longest_road, longest_road, AwardChange, MIN_LONGEST_ROAD};
pub use search::{
    evaluate, pick_best_move, GameTreeSearch, MaterialEvaluator, Position, SearchReport, Side,
    MATE_SCORE,
};
pub use topology::{AdjacencyTable, Topology};
