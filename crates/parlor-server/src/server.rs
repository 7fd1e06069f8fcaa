//! WebSocket server and connection handling.

use crate::config::ServerConfig;
use crate::protocol::{BoardLayout, ClientMessage, ServerMessage};
use crate::session::{BoardSession, SessionError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use parlor_core::{ChessPosition, GameTreeSearch, MaterialTable};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    pub config: ServerConfig,
    /// All open board sessions
    pub sessions: DashMap<Uuid, BoardSession>,
    /// Mapping from connection ID to its message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            senders: DashMap::new(),
        }
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, connection: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&connection) {
            let _ = sender.send(msg);
        }
    }

    fn send_error(&self, connection: Uuid, message: impl ToString) {
        self.send_to(
            connection,
            ServerMessage::Error {
                message: message.to_string(),
            },
        );
    }

    /// Run `f` against a session the connection owns.
    fn with_session<R>(
        &self,
        connection: Uuid,
        board_id: Uuid,
        f: impl FnOnce(&mut BoardSession) -> R,
    ) -> Result<R, SessionError> {
        let mut session = self
            .sessions
            .get_mut(&board_id)
            .ok_or(SessionError::BoardNotFound)?;
        session.check_owner(connection)?;
        Ok(f(&mut session))
    }

    fn open_session(&self, connection: Uuid, opened: Result<BoardSession, SessionError>) {
        match opened {
            Ok(session) => {
                let board_id = session.id;
                let board = session.snapshot();
                self.sessions.insert(board_id, session);
                self.send_to(connection, ServerMessage::BoardCreated { board_id, board });
            }
            Err(e) => self.send_error(connection, e),
        }
    }
}

/// Run the WebSocket server.
pub async fn run_server(state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr = state.config.addr;
    let listener = TcpListener::bind(addr).await?;
    info!("Parlor server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let connection_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(connection_id, tx);

    let welcome = ServerMessage::Welcome { connection_id };
    ws_sender
        .send(Message::Text(serde_json::to_string(&welcome)?))
        .await?;

    // Forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(connection_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", connection_id, e);
                    state.send_error(connection_id, format!("Invalid message: {e}"));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", connection_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(connection_id, &state);
    state.senders.remove(&connection_id);
    send_task.abort();

    info!("Connection closed for {}", connection_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(connection: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateBoard { layout } => {
            let board_id = Uuid::new_v4();
            let opened = match layout {
                BoardLayout::Standard { seed } => BoardSession::standard(board_id, connection, seed),
                BoardLayout::Custom { config, adjacency } => {
                    BoardSession::custom(board_id, connection, config, adjacency)
                }
            };
            state.open_session(connection, opened);
        }

        ClientMessage::LoadBoard { board, adjacency } => {
            let opened = BoardSession::load(Uuid::new_v4(), connection, board, adjacency);
            state.open_session(connection, opened);
        }

        ClientMessage::PlaceBuilding {
            board_id,
            corner_id,
            kind,
            player,
        } => {
            match state.with_session(connection, board_id, |s| {
                s.place_building(&corner_id, kind, &player)
            }) {
                Ok(placed) => state.send_to(
                    connection,
                    ServerMessage::Placement {
                        board_id,
                        target_id: corner_id,
                        placed,
                    },
                ),
                Err(e) => state.send_error(connection, e),
            }
        }

        ClientMessage::PlaceRoad {
            board_id,
            edge_id,
            player,
        } => match state.with_session(connection, board_id, |s| s.place_road(&edge_id, &player)) {
            Ok(placed) => state.send_to(
                connection,
                ServerMessage::Placement {
                    board_id,
                    target_id: edge_id,
                    placed,
                },
            ),
            Err(e) => state.send_error(connection, e),
        },

        ClientMessage::LongestRoad { board_id, players } => {
            match state.with_session(connection, board_id, |s| s.longest_roads(&players)) {
                Ok(report) => state.send_to(
                    connection,
                    ServerMessage::LongestRoad {
                        board_id,
                        lengths: report.lengths,
                        holder: report.holder,
                        change: report.change,
                    },
                ),
                Err(e) => state.send_error(connection, e),
            }
        }

        ClientMessage::GetBoard { board_id } => {
            match state.with_session(connection, board_id, |s| s.snapshot()) {
                Ok(board) => state.send_to(connection, ServerMessage::Board { board_id, board }),
                Err(e) => state.send_error(connection, e),
            }
        }

        ClientMessage::CloseBoard { board_id } => {
            match state.with_session(connection, board_id, |_| ()) {
                Ok(()) => {
                    state.sessions.remove(&board_id);
                    state.send_to(connection, ServerMessage::BoardClosed { board_id });
                }
                Err(e) => state.send_error(connection, e),
            }
        }

        ClientMessage::BestMove { fen, moves, depth } => {
            let depth = state.config.search_depth(depth);
            spawn_search(connection, state, move || best_move(fen.as_deref(), &moves, depth));
        }

        ClientMessage::Ping => {
            state.send_to(connection, ServerMessage::Pong);
        }
    }
}

/// Search a chess position for the side to move.
fn best_move(fen: Option<&str>, moves: &[String], depth: u32) -> Result<ServerMessage, SessionError> {
    let mut position = match fen {
        Some(fen) => ChessPosition::from_fen(fen)?,
        None => ChessPosition::startpos(),
    };
    for text in moves {
        let mv = position.parse_uci_move(text)?;
        position.apply_move(&mv);
    }

    let report = GameTreeSearch::new(MaterialTable::default()).search(&mut position, depth);
    debug!(depth, nodes = report.nodes, "answered best move request");
    let (best, score) = match report.best {
        Some((mv, score)) => (Some(mv.descriptor()), Some(score)),
        None => (None, None),
    };
    Ok(ServerMessage::BestMove {
        best,
        score,
        depth,
        nodes: report.nodes,
    })
}

/// Run a search off the async workers and send its reply to `connection`.
/// A worker that dies still gets the client an error.
fn spawn_search<F>(connection: Uuid, state: &Arc<ServerState>, search: F)
where
    F: FnOnce() -> Result<ServerMessage, SessionError> + Send + 'static,
{
    let state = Arc::clone(state);
    let worker = tokio::task::spawn_blocking(search);
    tokio::spawn(async move {
        let reply = match worker.await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => ServerMessage::Error {
                message: e.to_string(),
            },
            Err(e) => {
                error!("Search for {} failed: {}", connection, e);
                ServerMessage::Error {
                    message: "Search failed".into(),
                }
            }
        };
        state.send_to(connection, reply);
    });
}

/// Close every board the connection owned.
fn handle_disconnect(connection: Uuid, state: &Arc<ServerState>) {
    let before = state.sessions.len();
    state.sessions.retain(|_, session| session.owner != connection);
    let closed = before - state.sessions.len();
    if closed > 0 {
        info!("Closed {} board(s) owned by {}", closed, connection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_core::BuildingKind;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn connect(state: &ServerState) -> (Uuid, UnboundedReceiver<ServerMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        state.senders.insert(id, tx);
        (id, rx)
    }

    fn create_standard(
        state: &Arc<ServerState>,
        conn: Uuid,
        rx: &mut UnboundedReceiver<ServerMessage>,
    ) -> Uuid {
        handle_message(
            conn,
            ClientMessage::CreateBoard {
                layout: BoardLayout::Standard { seed: Some(1) },
            },
            state,
        );
        match rx.try_recv().unwrap() {
            ServerMessage::BoardCreated { board_id, board } => {
                assert_eq!(board.corners.len(), 54);
                board_id
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_board_lifecycle() {
        let state = Arc::new(ServerState::new(ServerConfig::default()));
        let (conn, mut rx) = connect(&state);
        let board_id = create_standard(&state, conn, &mut rx);

        handle_message(
            conn,
            ClientMessage::PlaceBuilding {
                board_id,
                corner_id: "c:0,0,N".into(),
                kind: BuildingKind::Settlement,
                player: "ana".into(),
            },
            &state,
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::Placement { placed: true, .. }
        ));

        handle_message(
            conn,
            ClientMessage::PlaceRoad {
                board_id,
                edge_id: "e:9,9,E".into(),
                player: "ana".into(),
            },
            &state,
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::Placement { placed: false, .. }
        ));

        handle_message(conn, ClientMessage::CloseBoard { board_id }, &state);
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::BoardClosed { .. }));
        assert!(state.sessions.is_empty());

        handle_message(conn, ClientMessage::GetBoard { board_id }, &state);
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::Error { .. }));
    }

    #[test]
    fn test_other_connections_cannot_touch_a_board() {
        let state = Arc::new(ServerState::new(ServerConfig::default()));
        let (owner, mut owner_rx) = connect(&state);
        let (other, mut other_rx) = connect(&state);
        let board_id = create_standard(&state, owner, &mut owner_rx);

        handle_message(other, ClientMessage::CloseBoard { board_id }, &state);
        match other_rx.try_recv().unwrap() {
            ServerMessage::Error { message } => assert_eq!(message, "Not the board owner"),
            msg => panic!("unexpected {msg:?}"),
        }
        assert_eq!(state.sessions.len(), 1);
    }

    #[test]
    fn test_disconnect_closes_owned_boards() {
        let state = Arc::new(ServerState::new(ServerConfig::default()));
        let (a, mut a_rx) = connect(&state);
        let (b, mut b_rx) = connect(&state);
        create_standard(&state, a, &mut a_rx);
        create_standard(&state, a, &mut a_rx);
        let kept = create_standard(&state, b, &mut b_rx);

        handle_disconnect(a, &state);
        assert_eq!(state.sessions.len(), 1);
        assert!(state.sessions.contains_key(&kept));
    }

    #[test]
    fn test_best_move_from_moves() {
        let reply = best_move(None, &["e2e4".into(), "d7d5".into()], 1).unwrap();
        match reply {
            ServerMessage::BestMove { best, score, .. } => {
                let best = best.unwrap();
                assert_eq!((best.from.as_str(), best.to.as_str()), ("e4", "d5"));
                assert_eq!(score, Some(100));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_best_move_rejects_bad_input() {
        assert!(best_move(Some("garbage"), &[], 1).is_err());
        assert!(best_move(None, &["e2e5".into()], 1).is_err());
    }

    #[tokio::test]
    async fn test_best_move_request_is_answered() {
        let config = ServerConfig {
            max_search_depth: 2,
            ..ServerConfig::default()
        };
        let state = Arc::new(ServerState::new(config));
        let (conn, mut rx) = connect(&state);
        handle_message(
            conn,
            ClientMessage::BestMove {
                fen: None,
                moves: vec![],
                depth: Some(99),
            },
            &state,
        );
        match rx.recv().await.unwrap() {
            ServerMessage::BestMove { best, depth, .. } => {
                assert!(best.is_some());
                assert_eq!(depth, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_best_move_with_saturated_clocks_is_answered() {
        let state = Arc::new(ServerState::new(ServerConfig::default()));
        let (connection, mut rx) = connect(&state);

        handle_message(
            connection,
            ClientMessage::BestMove {
                fen: Some("4k3/8/8/8/8/8/8/R3K3 w - - 4294967295 4294967295".into()),
                moves: vec!["a1a2".into(), "e8d8".into()],
                depth: Some(1),
            },
            &state,
        );
        match rx.recv().await.unwrap() {
            ServerMessage::BestMove { best, score, .. } => {
                // Every reply is a fifty-move draw
                assert!(best.is_some());
                assert_eq!(score, Some(0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_crashed_search_reports_an_error() {
        let state = Arc::new(ServerState::new(ServerConfig::default()));
        let (connection, mut rx) = connect(&state);

        spawn_search(connection, &state, || panic!("search blew up"));
        match rx.recv().await.unwrap() {
            ServerMessage::Error { message } => assert_eq!(message, "Search failed"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
