//! Game session: the turn state machine over one board.

use std::time::Duration;

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{BoardError, Cell, Color, Move, MoveList, MoveRecord, SessionConfig, SessionError};
use crate::rules::{Board, GameResult, RulesEngine};

use super::selection::{SelectOutcome, Selection};
use super::state::{TurnOutcome, TurnState};

/// One game from the standard setup to game over.
///
/// Every state change goes through one of four entry points:
/// - `apply_move`: a move chosen locally or received from a peer
/// - `timeout`: the turn timer of `round` ran out
/// - `finish`: a peer announced the result
/// - `terminate`: a participant left
///
/// `round` counts turn passes. It does not change during a continuation
/// capture, and it keys the once-only timeout guard.
///
/// Sessions serialize as a whole, so a replica can be snapshotted and
/// compared or restored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    config: SessionConfig,
    board: Board,
    state: TurnState,
    round: u32,
    timer: Duration,
    selection: Option<Selection>,
    history: Vector<MoveRecord>,
}

impl GameSession {
    /// Start a game on the standard board.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let board = Board::standard(config.rules);
        Self::with_board(config, board)
    }

    /// Start a game from a custom position.
    #[must_use]
    pub fn with_board(config: SessionConfig, board: Board) -> Self {
        Self {
            state: TurnState::Active {
                turn: config.first_color,
            },
            timer: config.turn_duration,
            round: 0,
            selection: None,
            history: Vector::new(),
            board,
            config,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Side to move, or `None` once the game is over.
    #[must_use]
    pub fn turn(&self) -> Option<Color> {
        self.state.turn()
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    /// Board result, if the game was decided on the board or announced.
    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        match self.state {
            TurnState::GameOver { result } => result,
            _ => None,
        }
    }

    /// Every move applied so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<MoveRecord> {
        &self.history
    }

    /// Current selection, if a piece is picked.
    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    // === Timer ===

    #[must_use]
    pub fn timer(&self) -> Duration {
        self.timer
    }

    /// Whole seconds left, rounded up.
    #[must_use]
    pub fn seconds_left(&self) -> u64 {
        let secs = self.timer.as_secs();
        if self.timer.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// True when the remaining time is at or below the warning threshold.
    #[must_use]
    pub fn timer_warning(&self) -> bool {
        !self.is_over() && self.seconds_left() <= self.config.warning_threshold.as_secs()
    }

    /// Count the timer down. Returns true once it has run out.
    ///
    /// Expiry does not change the turn: the owner of the turn raises a
    /// timeout event and every peer applies it through `timeout`.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.is_over() {
            return false;
        }
        self.timer = self.timer.saturating_sub(elapsed);
        self.timer.is_zero()
    }

    // === Moves ===

    /// The moves currently selectable for the side to move.
    ///
    /// During a continuation this is only the pinned piece's captures.
    #[must_use]
    pub fn selectable_moves(&self) -> MoveList {
        match self.state {
            TurnState::Active { turn } => self.board.legal_moves(turn),
            TurnState::Continuation { pinned, .. } => self.board.capture_continuations(pinned),
            TurnState::GameOver { .. } => MoveList::new(),
        }
    }

    /// Handle a click on `cell` by the player of `actor`.
    pub fn select(&mut self, cell: Cell, actor: Color) -> SelectOutcome {
        if !cell.in_bounds() || self.turn() != Some(actor) {
            return SelectOutcome::Ignored;
        }

        if let TurnState::Continuation { pinned, .. } = self.state {
            let moves = self.board.capture_continuations(pinned);
            if let Some(mv) = moves.iter().copied().find(|mv| mv.to == cell) {
                return SelectOutcome::Chosen(mv);
            }
            self.selection = Some(Selection {
                from: pinned,
                moves: moves.clone(),
            });
            return SelectOutcome::Rejected { pinned, moves };
        }

        if let Some(mv) = self.selection.as_ref().and_then(|s| s.find(cell)) {
            return SelectOutcome::Chosen(mv);
        }
        self.selection = None;

        match self.board.piece_at(cell) {
            Some(piece) if piece.color == actor => {}
            _ => return SelectOutcome::Ignored,
        }

        let mut moves = self.board.legal_moves(actor);
        moves.retain(|mv| mv.from == cell);
        if moves.is_empty() {
            return SelectOutcome::Ignored;
        }

        self.selection = Some(Selection {
            from: cell,
            moves: moves.clone(),
        });
        SelectOutcome::Selected { from: cell, moves }
    }

    /// Apply a move and decide continuation, turn pass or game end.
    ///
    /// Legality is not re-derived: local moves come from `select`, remote
    /// moves from the peer's identical engine. The mover must still be the
    /// side to move (and the pinned piece during a continuation), otherwise
    /// the peers have diverged and the move is refused.
    pub fn apply_move(&mut self, mv: &Move) -> Result<TurnOutcome, SessionError> {
        let turn = match self.state {
            TurnState::GameOver { .. } => return Err(SessionError::GameOver),
            TurnState::Continuation { pinned, .. } if pinned != mv.from => {
                return Err(SessionError::PinnedPiece { pinned })
            }
            TurnState::Active { turn } | TurnState::Continuation { turn, .. } => turn,
        };
        match self.board.piece_at(mv.from) {
            Some(piece) if piece.color == turn => {}
            Some(_) => return Err(SessionError::NotYourTurn { expected: turn }),
            None => return Err(BoardError::EmptyOrigin(mv.from).into()),
        }

        let promoted = self.board.apply_move(mv)?;
        self.history.push_back(MoveRecord {
            color: turn,
            mv: *mv,
            round: self.round,
            promoted,
        });
        debug!(%mv, %turn, round = self.round, promoted, "move applied");

        if mv.is_capture() {
            let moves = self.board.capture_continuations(mv.to);
            if !moves.is_empty() {
                self.state = TurnState::Continuation {
                    turn,
                    pinned: mv.to,
                };
                self.timer = self.config.turn_duration;
                self.selection = Some(Selection {
                    from: mv.to,
                    moves: moves.clone(),
                });
                debug!(pinned = %mv.to, count = moves.len(), "continuation capture");
                return Ok(TurnOutcome::Continue {
                    pinned: mv.to,
                    moves,
                });
            }
        }

        let next = self.pass_turn(turn);
        if let Some(result) = self.board.is_terminal(next) {
            info!(loser = %next, ?result, "no moves left");
            self.state = TurnState::GameOver {
                result: Some(result),
            };
            return Ok(TurnOutcome::Finished(result));
        }
        Ok(TurnOutcome::Passed { to: next })
    }

    /// Unconditional turn pass for the timer of `round`.
    ///
    /// Returns `None` (and changes nothing) when the game is over or the
    /// round has already moved on, so a duplicate expiry is absorbed.
    pub fn timeout(&mut self, round: u32) -> Option<TurnOutcome> {
        let turn = self.turn()?;
        if round != self.round {
            debug!(round, current = self.round, "stale timeout ignored");
            return None;
        }
        let next = self.pass_turn(turn);
        info!(from = %turn, to = %next, round, "turn timed out");
        Some(TurnOutcome::Passed { to: next })
    }

    /// Record a result announced by a peer. Returns false if the game had
    /// already ended.
    pub fn finish(&mut self, result: GameResult) -> bool {
        if self.is_over() {
            return false;
        }
        info!(?result, "game finished by announcement");
        self.end(Some(result));
        true
    }

    /// End the game because a participant left. Returns false if the game
    /// had already ended.
    pub fn terminate(&mut self) -> bool {
        if self.is_over() {
            return false;
        }
        info!(round = self.round, "game terminated");
        self.end(None);
        true
    }

    fn end(&mut self, result: Option<GameResult>) {
        self.state = TurnState::GameOver { result };
        self.selection = None;
    }

    fn pass_turn(&mut self, turn: Color) -> Color {
        let next = turn.opponent();
        self.state = TurnState::Active { turn: next };
        self.round += 1;
        self.timer = self.config.turn_duration;
        self.selection = None;
        next
    }
}
