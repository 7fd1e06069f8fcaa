//! WebAssembly bindings for the Parlor engine.
//!
//! Exposes board analysis and the computer opponent to JavaScript through
//! wasm-bindgen. Boards cross the boundary as JSON.

use wasm_bindgen::prelude::*;

use crate::bot::{ComputerOpponent, Difficulty};
use crate::graph::{BoardGraph, BuildingKind};
use crate::hex::HexTopology;
use crate::layout;
use crate::paths;
use crate::topology::AdjacencyTable;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Board graph plus the topology used to walk it
#[wasm_bindgen]
pub struct WasmBoard {
    graph: BoardGraph,
    table: Option<AdjacencyTable>,
}

#[wasm_bindgen]
impl WasmBoard {
    /// A freshly shuffled standard board on hex ids
    #[wasm_bindgen(js_name = standard)]
    pub fn standard() -> Result<WasmBoard, JsValue> {
        let graph = BoardGraph::create(layout::standard_board()).map_err(js_error)?;
        Ok(WasmBoard { graph, table: None })
    }

    /// Load a serialized board. With `adjacency_json` the board is walked
    /// through that table, otherwise through hex ids.
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(board_json: &str, adjacency_json: Option<String>) -> Result<WasmBoard, JsValue> {
        let graph = BoardGraph::from_json(board_json).map_err(js_error)?;
        let table = match adjacency_json {
            Some(text) => Some(serde_json::from_str(&text).map_err(js_error)?),
            None => None,
        };
        Ok(WasmBoard { graph, table })
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        self.graph.to_json().map_err(js_error)
    }

    /// `kind` is "settlement" or "city"
    #[wasm_bindgen(js_name = placeBuilding)]
    pub fn place_building(&mut self, corner_id: &str, kind: &str, player: &str) -> bool {
        let kind = match kind {
            "settlement" => BuildingKind::Settlement,
            "city" => BuildingKind::City,
            _ => return false,
        };
        self.graph.place_building(corner_id, kind, player)
    }

    #[wasm_bindgen(js_name = placeRoad)]
    pub fn place_road(&mut self, edge_id: &str, player: &str) -> bool {
        self.graph.place_road(edge_id, player)
    }

    #[wasm_bindgen(js_name = longestRoad)]
    pub fn longest_road(&self, player: &str) -> usize {
        match &self.table {
            Some(table) => paths::longest_road(&self.graph, player, table),
            None => paths::longest_road(&self.graph, player, &HexTopology),
        }
    }
}

/// Pick a move for a FEN position. Returns the move as JSON, or `null` when
/// there is no legal move. `difficulty` is "easy", "medium" or "hard".
#[wasm_bindgen(js_name = bestMove)]
pub fn best_move(fen: &str, difficulty: &str) -> Result<String, JsValue> {
    let difficulty = match difficulty {
        "easy" => Difficulty::Easy,
        "hard" => Difficulty::Hard,
        _ => Difficulty::Medium,
    };
    let choice = ComputerOpponent::new(difficulty)
        .choose_move(fen)
        .map_err(js_error)?;
    serde_json::to_string(&choice).map_err(js_error)
}
