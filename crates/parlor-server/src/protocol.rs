//! WebSocket protocol messages for the Parlor server.

use parlor_core::{
    AdjacencyTable, AwardChange, BoardConfig, BuildingKind, MoveDescriptor, PlayerId,
    SerializedBoard,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a fresh board session
    CreateBoard { layout: BoardLayout },

    /// Open a session from a saved board, placement state included
    LoadBoard {
        board: SerializedBoard,
        /// Walk the board through this table instead of hex ids
        #[serde(default)]
        adjacency: Option<AdjacencyTable>,
    },

    PlaceBuilding {
        board_id: Uuid,
        corner_id: String,
        kind: BuildingKind,
        player: PlayerId,
    },

    PlaceRoad {
        board_id: Uuid,
        edge_id: String,
        player: PlayerId,
    },

    /// Measure roads and settle the longest road award
    LongestRoad { board_id: Uuid, players: Vec<PlayerId> },

    GetBoard { board_id: Uuid },

    CloseBoard { board_id: Uuid },

    /// Ask the computer opponent for a chess move
    BestMove {
        /// Start position when absent
        #[serde(default)]
        fen: Option<String>,
        /// Moves in long algebraic form played from `fen`
        #[serde(default)]
        moves: Vec<String>,
        #[serde(default)]
        depth: Option<u32>,
    },

    /// Ping for keepalive
    Ping,
}

/// How a new board is laid out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BoardLayout {
    /// The 19-tile settlement board on hex ids
    Standard {
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Caller-defined entities and adjacency
    Custom {
        config: BoardConfig,
        adjacency: AdjacencyTable,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with the connection's id
    Welcome { connection_id: Uuid },

    /// Session opened by CreateBoard or LoadBoard
    BoardCreated { board_id: Uuid, board: SerializedBoard },

    /// Outcome of PlaceBuilding or PlaceRoad; `placed` is false for unknown ids
    Placement { board_id: Uuid, target_id: String, placed: bool },

    LongestRoad {
        board_id: Uuid,
        lengths: Vec<RoadLength>,
        holder: Option<PlayerId>,
        change: Option<AwardChange>,
    },

    Board { board_id: Uuid, board: SerializedBoard },

    BoardClosed { board_id: Uuid },

    /// Chosen move, `None` when the side to move has no legal move
    BestMove {
        best: Option<MoveDescriptor>,
        score: Option<i32>,
        depth: u32,
        nodes: u64,
    },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// One player's longest road.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadLength {
    pub player: PlayerId,
    pub length: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_shape() {
        let text = json!({
            "type": "PlaceRoad",
            "payload": {
                "board_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                "edge_id": "e:0,0,E",
                "player": "ana"
            }
        })
        .to_string();
        let msg: ClientMessage = serde_json::from_str(&text).unwrap();
        assert!(matches!(msg, ClientMessage::PlaceRoad { ref edge_id, .. } if edge_id == "e:0,0,E"));
    }

    #[test]
    fn test_best_move_defaults() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"BestMove","payload":{}}"#).unwrap();
        match msg {
            ClientMessage::BestMove { fen, moves, depth } => {
                assert_eq!(fen, None);
                assert!(moves.is_empty());
                assert_eq!(depth, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_standard_layout_tag() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"CreateBoard","payload":{"layout":{"kind":"standard","seed":4}}}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::CreateBoard {
                layout: BoardLayout::Standard { seed: Some(4) }
            }
        ));
    }

    #[test]
    fn test_unit_variants_serialize_without_payload() {
        assert_eq!(serde_json::to_string(&ServerMessage::Pong).unwrap(), r#"{"type":"Pong"}"#);
        let ping: ClientMessage = serde_json::from_str(r#"{"type":"Ping"}"#).unwrap();
        assert!(matches!(ping, ClientMessage::Ping));
    }
}
