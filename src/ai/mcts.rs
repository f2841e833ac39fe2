use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::game::{Board, Cell, Color, Grid};

/// Search parameters for an [`MctsSession`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Simulations run per move request.
    pub simulations: usize,
    /// UCT exploration constant.
    pub exploration: f64,
    /// Taken from the search seed rather than the `[mcts]` table.
    #[serde(skip)]
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            simulations: 1000,
            exploration: std::f64::consts::SQRT_2,
            seed: None,
        }
    }
}

/// Persistent position made of one stack of pieces per column, oldest first.
///
/// [`StackState::play`] returns a new state and leaves `self` untouched, so
/// tree nodes can own their positions without undo bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackState {
    stacks: Vec<Vec<Color>>,
    height: usize,
    connect: usize,
    plies: usize,
    to_move: Color,
    winner: Option<Color>,
}

impl StackState {
    /// Empty position with Red to move.
    pub fn new(height: usize, width: usize, connect: usize) -> Self {
        StackState {
            stacks: vec![Vec::with_capacity(height); width],
            height,
            connect,
            plies: 0,
            to_move: Color::Red,
            winner: None,
        }
    }

    /// Snapshot of a real board's position with `to_move` about to play.
    pub fn from_board(board: &Board, to_move: Color) -> Self {
        let stacks = (0..board.width())
            .map(|col| board.column(col).iter().filter_map(|c| c.color()).collect())
            .collect();
        StackState {
            stacks,
            height: board.height(),
            connect: board.connect(),
            plies: board.num_moves(),
            to_move,
            winner: board.contains_k_in_a_row(),
        }
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn plies(&self) -> usize {
        self.plies
    }

    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.plies == self.stacks.len() * self.height
    }

    /// Open columns, ascending. Empty once the game is decided.
    pub fn legal_moves(&self) -> Vec<usize> {
        if self.winner.is_some() {
            return Vec::new();
        }
        (0..self.stacks.len())
            .filter(|&col| self.stacks[col].len() < self.height)
            .collect()
    }

    /// Position after the side to move plays `col`, or `None` if the move is
    /// illegal or the game is already over.
    pub fn play(&self, col: usize) -> Option<StackState> {
        let mut next = self.clone();
        next.apply(col).then_some(next)
    }

    fn apply(&mut self, col: usize) -> bool {
        if self.winner.is_some() || self.stacks.get(col).map_or(true, |s| s.len() >= self.height) {
            return false;
        }
        let color = self.to_move;
        self.stacks[col].push(color);
        self.plies += 1;
        self.to_move = color.other();
        if self.completes_line(self.stacks[col].len() - 1, col) {
            self.winner = Some(color);
        }
        true
    }
}

impl Grid for StackState {
    fn width(&self) -> usize {
        self.stacks.len()
    }

    fn height(&self) -> usize {
        self.height
    }

    fn connect(&self) -> usize {
        self.connect
    }

    fn cell(&self, row: usize, col: usize) -> Cell {
        self.stacks[col].get(row).map_or(Cell::Empty, |c| c.to_cell())
    }
}

#[derive(Debug)]
struct MctsNode {
    state: StackState,
    parent: Option<usize>,
    /// Column played from the parent to reach this node.
    col: Option<usize>,
    children: Vec<usize>,
    untried: Vec<usize>,
    visits: u32,
    /// Reward summed from the view of the player who moved into this node.
    reward: f64,
}

impl MctsNode {
    fn new(state: StackState, parent: Option<usize>, col: Option<usize>) -> Self {
        let untried = state.legal_moves();
        MctsNode {
            state,
            parent,
            col,
            children: Vec::new(),
            untried,
            visits: 0,
            reward: 0.0,
        }
    }

    fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.reward / self.visits as f64
        }
    }
}

/// Arena-allocated UCT tree. The root is always node 0.
#[derive(Debug)]
struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl MctsTree {
    fn new(root: StackState) -> Self {
        MctsTree {
            nodes: vec![MctsNode::new(root, None, None)],
        }
    }

    fn root(&self) -> &MctsNode {
        &self.nodes[0]
    }

    fn child_for(&self, idx: usize, col: usize) -> Option<usize> {
        self.nodes[idx]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].col == Some(col))
    }

    /// Run one selection, expansion, rollout and backup pass.
    fn simulate<R: Rng>(&mut self, rng: &mut R, exploration: f64) {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.state.is_terminal() {
                break;
            }
            if !node.untried.is_empty() {
                idx = self.expand(idx, rng);
                break;
            }
            idx = self.select_child(idx, exploration);
        }

        let winner = rollout(&self.nodes[idx].state, rng);
        self.backup(idx, winner);
    }

    /// UCT: mean reward plus `exploration * sqrt(ln N / n)`.
    fn select_child(&self, idx: usize, exploration: f64) -> usize {
        let node = &self.nodes[idx];
        let ln_parent = (node.visits.max(1) as f64).ln();

        let uct = |c: usize| {
            let child = &self.nodes[c];
            if child.visits == 0 {
                return f64::INFINITY;
            }
            child.mean() + exploration * (ln_parent / child.visits as f64).sqrt()
        };

        node.children
            .iter()
            .copied()
            .max_by(|&a, &b| uct(a).total_cmp(&uct(b)))
            .unwrap_or(idx)
    }

    /// Add a child for one randomly chosen untried move.
    fn expand<R: Rng>(&mut self, idx: usize, rng: &mut R) -> usize {
        let node = &mut self.nodes[idx];
        let pick = rng.random_range(0..node.untried.len());
        let col = node.untried.swap_remove(pick);
        let Some(state) = node.state.play(col) else {
            return idx;
        };

        let child = self.nodes.len();
        self.nodes.push(MctsNode::new(state, Some(idx), Some(col)));
        self.nodes[idx].children.push(child);
        child
    }

    fn backup(&mut self, leaf: usize, winner: Option<Color>) {
        let mut current = Some(leaf);
        while let Some(idx) = current {
            let node = &mut self.nodes[idx];
            let mover = node.state.to_move().other();
            node.visits += 1;
            node.reward += match winner {
                None => 0.5,
                Some(w) if w == mover => 1.0,
                Some(_) => 0.0,
            };
            current = node.parent;
        }
    }

    /// Most-visited root move, ties broken by mean reward.
    fn best_move(&self) -> Option<usize> {
        self.root()
            .children
            .iter()
            .map(|&c| &self.nodes[c])
            .max_by(|a, b| a.visits.cmp(&b.visits).then(a.mean().total_cmp(&b.mean())))
            .and_then(|node| node.col)
    }

    /// Tree rooted at the position after `col`, keeping the statistics of
    /// that subtree when it has already been explored.
    fn advance(self, col: usize) -> Option<MctsTree> {
        match self.child_for(0, col) {
            Some(child) => Some(self.reroot(child)),
            None => self.root().state.play(col).map(MctsTree::new),
        }
    }

    /// Compact the subtree under `new_root` into a fresh arena.
    fn reroot(self, new_root: usize) -> MctsTree {
        let mut remap: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut order = vec![new_root];
        let mut i = 0;
        while i < order.len() {
            let idx = order[i];
            remap[idx] = Some(i);
            order.extend(self.nodes[idx].children.iter().copied());
            i += 1;
        }

        let mut slots: Vec<Option<MctsNode>> = self.nodes.into_iter().map(Some).collect();
        let nodes = order
            .iter()
            .filter_map(|&old| slots[old].take())
            .map(|mut node| {
                node.parent = node.parent.and_then(|p| remap[p]);
                node.children = node.children.iter().filter_map(|&c| remap[c]).collect();
                node
            })
            .collect::<Vec<_>>();

        let mut tree = MctsTree { nodes };
        tree.nodes[0].col = None;
        tree
    }
}

/// Play uniformly random moves to the end of the game.
fn rollout<R: Rng>(state: &StackState, rng: &mut R) -> Option<Color> {
    let mut state = state.clone();
    while !state.is_terminal() {
        let moves = state.legal_moves();
        let Some(&col) = moves.choose(rng) else {
            break;
        };
        state.apply(col);
    }
    state.winner()
}

/// Monte-Carlo tree search player state that lives for one game.
///
/// The tree follows the real game: [`MctsSession::sync`] walks it down the
/// moves played since the last request, so statistics gathered for those
/// positions carry over. [`MctsSession::reset`] drops everything between games.
pub struct MctsSession {
    config: MctsConfig,
    tree: Option<MctsTree>,
    /// Real moves the current tree root corresponds to.
    history: Vec<usize>,
    rng: StdRng,
}

impl MctsSession {
    pub fn new(config: MctsConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        MctsSession {
            config,
            tree: None,
            history: Vec::new(),
            rng,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Forget the tree and the recorded moves.
    pub fn reset(&mut self) {
        self.tree = None;
        self.history.clear();
    }

    /// Bring the tree up to date with `board`, with `color` to move.
    ///
    /// When the board continues the recorded moves the tree is advanced one
    /// move at a time; otherwise it is rebuilt from the board.
    pub fn sync(&mut self, board: &Board, color: Color) {
        let continues = self.tree.as_ref().is_some_and(|tree| {
            let root = &tree.root().state;
            root.width() == board.width()
                && root.height() == board.height()
                && root.connect() == board.connect()
        }) && board.moves().starts_with(&self.history);

        if continues {
            let pending = board.moves()[self.history.len()..].to_vec();
            for col in pending {
                self.advance(col);
            }
        }

        let in_step = self.tree.as_ref().is_some_and(|tree| {
            let root = &tree.root().state;
            root.plies() == board.num_moves() && root.to_move() == color
        });
        if !in_step {
            debug!(moves = board.num_moves(), %color, "rebuilding search tree from board");
            self.tree = Some(MctsTree::new(StackState::from_board(board, color)));
            self.history = board.moves().to_vec();
        }
    }

    /// Follow a real move. An illegal move clears the session.
    pub fn advance(&mut self, col: usize) {
        let Some(tree) = self.tree.take() else {
            self.history.push(col);
            return;
        };
        match tree.advance(col) {
            Some(next) => {
                debug!(
                    col,
                    kept_nodes = next.nodes.len(),
                    visits = next.root().visits,
                    "re-rooted search tree"
                );
                self.tree = Some(next);
                self.history.push(col);
            }
            None => self.reset(),
        }
    }

    /// Run the simulation budget from `board` for `color` and return the
    /// chosen column, or `None` when the game is already over. The chosen move
    /// is applied to the session's own tree.
    pub fn choose_move(&mut self, board: &Board, color: Color) -> Option<usize> {
        self.sync(board, color);
        let tree = self.tree.as_mut()?;
        if tree.root().state.is_terminal() {
            return None;
        }

        let exploration = self.config.exploration;
        let batch = (self.config.simulations / 10).max(1);
        for i in 0..self.config.simulations.max(1) {
            tree.simulate(&mut self.rng, exploration);
            if (i + 1) % batch == 0 {
                trace!(simulations = i + 1, nodes = tree.nodes.len(), "mcts progress");
            }
        }

        let col = tree.best_move()?;
        if let Some(child) = tree.child_for(0, col) {
            let node = &tree.nodes[child];
            debug!(col, visits = node.visits, mean = node.mean(), "mcts move chosen");
        }
        self.advance(col);
        Some(col)
    }

    /// Visits recorded at the current root.
    pub fn root_visits(&self) -> u32 {
        self.tree.as_ref().map_or(0, |tree| tree.root().visits)
    }

    /// Visits recorded for the root move `col`, if it has been expanded.
    pub fn child_visits(&self, col: usize) -> Option<u32> {
        let tree = self.tree.as_ref()?;
        tree.child_for(0, col).map(|c| tree.nodes[c].visits)
    }

    pub fn tree_size(&self) -> usize {
        self.tree.as_ref().map_or(0, |tree| tree.nodes.len())
    }

    /// Moves played since the session last started from scratch.
    pub fn history(&self) -> &[usize] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(moves: &[usize]) -> Board {
        let mut board = Board::standard();
        for &col in moves {
            board.add_piece(col, board.next_color()).unwrap();
        }
        board
    }

    fn session(simulations: usize, seed: u64) -> MctsSession {
        MctsSession::new(MctsConfig {
            simulations,
            seed: Some(seed),
            ..MctsConfig::default()
        })
    }

    #[test]
    fn stack_state_mirrors_board() {
        let moves = [3, 3, 4, 2, 5, 5];
        let board = board_from(&moves);
        let mut state = StackState::new(6, 7, 4);
        for col in moves {
            state = state.play(col).unwrap();
        }

        assert_eq!(state, StackState::from_board(&board, board.next_color()));
        assert_eq!(state.to_move(), board.next_color());
        for row in 0..6 {
            for col in 0..7 {
                assert_eq!(state.cell(row, col), board.get(row, col));
            }
        }
    }

    #[test]
    fn stack_state_play_is_persistent() {
        let state = StackState::new(6, 7, 4);
        let next = state.play(3).unwrap();
        assert_eq!(state.plies(), 0);
        assert_eq!(next.plies(), 1);
        assert_eq!(next.cell(0, 3), Cell::Red);
        assert_eq!(state.cell(0, 3), Cell::Empty);
    }

    #[test]
    fn stack_state_detects_wins() {
        // Rising diagonal for Red
        let mut state = StackState::new(6, 7, 4);
        for col in [0, 1, 1, 2, 2, 3, 2, 3, 3, 5] {
            state = state.play(col).unwrap();
        }
        assert_eq!(state.winner(), None);
        state = state.play(3).unwrap();
        assert_eq!(state.winner(), Some(Color::Red));
        assert!(state.is_terminal());
        assert!(state.legal_moves().is_empty());
        assert!(state.play(6).is_none());
    }

    #[test]
    fn stack_state_rejects_full_column() {
        let mut state = StackState::new(2, 3, 3);
        state = state.play(0).unwrap().play(0).unwrap();
        assert!(state.play(0).is_none());
        assert!(state.play(5).is_none());
        assert_eq!(state.legal_moves(), vec![1, 2]);
    }

    #[test]
    fn takes_immediate_win_with_small_budget() {
        // Red has 0,1,2 on the bottom row
        let board = board_from(&[0, 0, 1, 1, 2, 2]);
        let trials = 20;
        let hits = (0..trials)
            .filter(|&seed| session(50, seed).choose_move(&board, Color::Red) == Some(3))
            .count();
        assert!(hits >= 16, "winning move chosen {hits}/{trials} times");
    }

    #[test]
    fn searches_for_the_requested_color() {
        // Black moved first: Black wins at column 3, Red would win at column 6
        let mut board = Board::standard();
        let (red, black) = (Color::Red, Color::Black);
        for (col, color) in [(0, black), (6, red), (1, black), (6, red), (2, black), (6, red)] {
            board.add_piece(col, color).unwrap();
        }
        assert_eq!(board.next_color(), Color::Red);

        let trials = 20;
        let hits = (0..trials)
            .filter(|&seed| session(50, seed).choose_move(&board, Color::Black) == Some(3))
            .count();
        assert!(hits >= 16, "Black's winning move chosen {hits}/{trials} times");
    }

    #[test]
    fn wrong_side_to_move_rebuilds_tree() {
        let mut board = board_from(&[3, 4]);
        let mut s = session(100, 6);
        let own = s.choose_move(&board, Color::Red).unwrap();
        board.add_piece(own, Color::Red).unwrap();

        s.sync(&board, Color::Black);
        assert!(s.root_visits() > 0);

        s.sync(&board, Color::Red);
        assert_eq!(s.root_visits(), 0);
        assert_eq!(s.tree_size(), 1);
        assert_eq!(s.history(), board.moves());
    }

    #[test]
    fn chooses_legal_moves() {
        let board = board_from(&[3, 3, 3, 3, 3, 3, 0]);
        let mut s = session(100, 4);
        let col = s.choose_move(&board, board.next_color()).unwrap();
        assert!(board.is_legal_move(col));
        assert_ne!(col, 3);
    }

    #[test]
    fn no_move_when_game_is_over() {
        let mut full = Board::new(1, 2, 2);
        full.add_piece(0, Color::Red).unwrap();
        full.add_piece(1, Color::Black).unwrap();
        assert_eq!(session(10, 0).choose_move(&full, full.next_color()), None);

        let won = board_from(&[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(session(10, 0).choose_move(&won, won.next_color()), None);
    }

    #[test]
    fn equal_seeds_choose_equal_moves() {
        let board = board_from(&[3, 2]);
        let a = session(200, 9).choose_move(&board, board.next_color());
        let b = session(200, 9).choose_move(&board, board.next_color());
        assert_eq!(a, b);
    }

    #[test]
    fn real_moves_keep_subtree_statistics() {
        let mut board = Board::standard();
        let mut s = session(300, 1);

        let own = s.choose_move(&board, board.next_color()).unwrap();
        board.add_piece(own, Color::Red).unwrap();
        assert_eq!(s.history(), &[own]);

        // Opponent reply the tree has already explored
        let reply = (0..7)
            .filter(|&col| s.child_visits(col).unwrap_or(0) > 0)
            .max_by_key(|&col| s.child_visits(col))
            .unwrap();
        let expected = s.child_visits(reply).unwrap();
        board.add_piece(reply, Color::Black).unwrap();

        s.sync(&board, board.next_color());
        assert_eq!(s.history(), &[own, reply]);
        assert_eq!(s.root_visits(), expected);
    }

    #[test]
    fn unexplored_reply_starts_fresh_root() {
        let mut board = Board::standard();
        let mut s = session(3, 2);
        let own = s.choose_move(&board, board.next_color()).unwrap();
        board.add_piece(own, Color::Red).unwrap();

        let reply = (0..7).find(|&col| s.child_visits(col).is_none()).unwrap();
        board.add_piece(reply, Color::Black).unwrap();
        s.sync(&board, board.next_color());
        assert_eq!(s.root_visits(), 0);
        assert_eq!(s.tree_size(), 1);
        assert_eq!(s.history(), board.moves());
    }

    #[test]
    fn divergent_board_rebuilds_tree() {
        let mut s = session(50, 3);
        let board = board_from(&[3, 4]);
        s.choose_move(&board, board.next_color()).unwrap();

        let other = board_from(&[0, 6, 1]);
        s.sync(&other, other.next_color());
        assert_eq!(s.history(), other.moves());
        assert_eq!(s.root_visits(), 0);
    }

    #[test]
    fn reset_clears_session() {
        let mut s = session(50, 5);
        s.choose_move(&Board::standard(), Color::Red).unwrap();
        assert!(s.tree_size() > 1);

        s.reset();
        assert_eq!(s.tree_size(), 0);
        assert!(s.history().is_empty());
        assert!(s.choose_move(&Board::standard(), Color::Red).is_some());
    }

    #[test]
    fn backup_credits_the_mover() {
        let mut tree = MctsTree::new(StackState::new(6, 7, 4));
        let mut rng = StdRng::seed_from_u64(0);
        let child = tree.expand(0, &mut rng);
        let mover = tree.nodes[child].state.to_move().other();
        assert_eq!(mover, Color::Red);

        tree.backup(child, Some(Color::Red));
        tree.backup(child, None);
        assert_eq!(tree.nodes[child].visits, 2);
        assert!((tree.nodes[child].reward - 1.5).abs() < 1e-12);
        assert_eq!(tree.root().visits, 2);
    }
}
