use std::time::Instant;

use log::debug;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};

use super::greedy::greedy_move;
use super::random::random_move;
use super::{seeded_rng, BotPlayer, SearchStats};
use crate::clock::{Clock, Deadline};
use crate::config::SearchConfig;
use crate::enums::{Move, Player};
use crate::errors::{SearchError, SearchResult};
use crate::evaluation::{win_probability, Evaluator};
use crate::state::GameState;

/// Move policy used to finish a playout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayoutPolicy {
    /// One-ply greedy with occasional random moves.
    #[default]
    Greedy,
    Random,
}

/// Index of a node in its `SearchTree` arena.
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct SearchNode {
    state: GameState,
    /// Move that produced this node; `None` for a fresh root.
    last_move: Option<Move>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    visits: u32,
    /// Sum of playout outcomes for the player who moved into this node.
    score: f64,
}

impl SearchNode {
    fn new(state: GameState, last_move: Option<Move>, parent: Option<NodeId>) -> Self {
        SearchNode {
            state,
            last_move,
            parent,
            children: Vec::new(),
            visits: 0,
            score: 0.0,
        }
    }
}

/// Arena-backed UCT tree.
///
/// Nodes own their children through `children`; `parent` is a plain index
/// used to walk back up. The frontier holds the leaves still open for
/// expansion, in the order they were created.
#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    root: NodeId,
    frontier: Vec<NodeId>,
}

impl SearchTree {
    pub fn new(state: GameState) -> Self {
        SearchTree {
            nodes: vec![SearchNode::new(state, None, None)],
            root: 0,
            frontier: vec![0],
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn frontier(&self) -> &[NodeId] {
        &self.frontier
    }

    pub fn state(&self, id: NodeId) -> &GameState {
        &self.nodes[id].state
    }

    pub fn last_move(&self, id: NodeId) -> Option<Move> {
        self.nodes[id].last_move
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn visits(&self, id: NodeId) -> u32 {
        self.nodes[id].visits
    }

    pub fn score(&self, id: NodeId) -> f64 {
        self.nodes[id].score
    }

    /// True when `ancestor` lies on the parent chain of `id` (or is `id`).
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node].parent;
        }
        false
    }

    /// UCT priority of a node. Unvisited nodes come first; a visited node
    /// whose mover is stuck has nothing left to explore.
    pub fn uct(&self, id: NodeId, exploration: f64) -> f64 {
        let node = &self.nodes[id];
        if node.visits == 0 {
            return f64::INFINITY;
        }
        if !node.state.has_legal_moves(node.state.active_player()) {
            return 0.0;
        }
        let visits = node.visits as f64;
        let root_visits = self.nodes[self.root].visits as f64;
        node.score / visits + exploration * (root_visits.ln() / visits).sqrt()
    }

    /// Frontier node with the highest UCT priority, earliest on ties.
    pub fn select(&self, exploration: f64) -> Option<NodeId> {
        let mut best = None;
        let mut best_priority = -1.0;
        for &id in &self.frontier {
            let priority = self.uct(id, exploration);
            if priority > best_priority {
                best_priority = priority;
                best = Some(id);
            }
        }
        best
    }

    /// Adds one child per legal move of `id` and swaps `id` for them in the
    /// frontier. Returns the new children, empty for a terminal node.
    pub fn expand(&mut self, id: NodeId) -> Vec<NodeId> {
        if let Some(pos) = self.frontier.iter().position(|&node| node == id) {
            self.frontier.remove(pos);
        }

        let state = self.nodes[id].state.clone();
        let mut created = Vec::new();
        for mv in state.legal_moves() {
            let child = self.nodes.len();
            self.nodes
                .push(SearchNode::new(state.forecast_move(mv), Some(mv), Some(id)));
            created.push(child);
        }
        self.nodes[id].children.extend_from_slice(&created);
        self.frontier.extend_from_slice(&created);
        created
    }

    /// Credits `outcome` to `id` and flips it at every step towards the root.
    pub fn backpropagate(&mut self, id: NodeId, mut outcome: f64) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &mut self.nodes[node_id];
            node.visits += 1;
            node.score += outcome;
            outcome = 1.0 - outcome;
            current = node.parent;
        }
    }

    /// Root child with the best average outcome among those simulated.
    pub fn best_child(&self) -> SearchResult<NodeId> {
        let mut best = None;
        let mut best_value = -1.0;
        for &child in self.children(self.root) {
            let node = &self.nodes[child];
            if node.visits == 0 {
                continue;
            }
            let value = node.score / node.visits as f64;
            if value > best_value {
                best_value = value;
                best = Some(child);
            }
        }
        best.ok_or_else(|| {
            SearchError::invariant(format!(
                "no simulated child under a root with {} children and {} visits",
                self.children(self.root).len(),
                self.visits(self.root)
            ))
        })
    }

    /// Child of `id` holding the same position as `state`: same ply and both
    /// players on the same cells.
    pub fn find_child(&self, id: NodeId, state: &GameState) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&child| {
            let candidate = &self.nodes[child].state;
            candidate.move_count() == state.move_count()
                && candidate.player_location(Player::One) == state.player_location(Player::One)
                && candidate.player_location(Player::Two) == state.player_location(Player::Two)
        })
    }

    /// Makes `new_root` the root and drops every node outside its subtree,
    /// frontier entries included. Surviving ids are renumbered.
    pub fn reroot(&mut self, new_root: NodeId) {
        let mut order = vec![new_root];
        let mut next = 0;
        while next < order.len() {
            order.extend_from_slice(&self.nodes[order[next]].children);
            next += 1;
        }

        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for (new_id, &old_id) in order.iter().enumerate() {
            remap[old_id] = Some(new_id);
        }

        let mut old_nodes: Vec<Option<SearchNode>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        for &old_id in &order {
            if let Some(mut node) = old_nodes[old_id].take() {
                node.parent = node.parent.and_then(|parent| remap[parent]);
                node.children = node.children.iter().filter_map(|&c| remap[c]).collect();
                self.nodes.push(node);
            }
        }

        self.root = 0;
        self.frontier = self.frontier.iter().filter_map(|&id| remap[id]).collect();
        if self.frontier.is_empty() && self.nodes[0].children.is_empty() {
            self.frontier.push(0);
        }
    }
}

/// UCT Monte Carlo tree search player.
///
/// The tree survives between turns: the subtree of the move played is kept,
/// and on the next call the child matching the opponent's reply becomes the
/// root.
pub struct MonteCarloPlayer {
    config: SearchConfig,
    playout_evaluator: Box<dyn Evaluator>,
    rng: XorShiftRng,
    tree: Option<SearchTree>,
    stats: SearchStats,
}

impl MonteCarloPlayer {
    pub fn new(config: SearchConfig) -> Self {
        MonteCarloPlayer {
            playout_evaluator: config.heuristic.build(),
            rng: seeded_rng(config.seed),
            tree: None,
            stats: SearchStats::default(),
            config,
        }
    }

    /// Tree kept from the previous turn, rooted at the position after the
    /// move that was played.
    pub fn tree(&self) -> Option<&SearchTree> {
        self.tree.as_ref()
    }

    /// Reuses the stored tree when `state` is its root or one of the root's
    /// children, and starts a fresh tree otherwise.
    fn relocate_root(&mut self, state: &GameState) -> SearchTree {
        let Some(mut tree) = self.tree.take() else {
            return SearchTree::new(state.clone());
        };
        if tree.state(tree.root()) == state {
            return tree;
        }
        match tree.find_child(tree.root(), state) {
            Some(child) => {
                tree.reroot(child);
                debug!(
                    "reusing subtree with {} nodes and {} visits",
                    tree.len(),
                    tree.visits(tree.root())
                );
                tree
            }
            None => {
                debug!("no matching child, starting a fresh tree");
                SearchTree::new(state.clone())
            }
        }
    }

    /// Runs select/expand/simulate/backpropagate cycles until the deadline
    /// fires or the frontier runs dry.
    fn search(&mut self, tree: &mut SearchTree, deadline: &Deadline) -> SearchResult<()> {
        let exploration = self.config.mcts.exploration;
        loop {
            deadline.check()?;
            let Some(leaf) = tree.select(exploration) else {
                return Ok(());
            };
            deadline.check()?;
            let children = tree.expand(leaf);
            self.stats.nodes += children.len() as u64;
            for child in children {
                deadline.check()?;
                let outcome = self.simulate(tree.state(child));
                deadline.check()?;
                tree.backpropagate(child, outcome);
                self.stats.iterations += 1;
            }
        }
    }

    /// Plays `state` out on a private copy. Returns 1 when the player who
    /// moved into `state` wins, 0 when it loses, or its win probability if
    /// the ply budget runs out first.
    fn simulate(&mut self, state: &GameState) -> f64 {
        let perspective = state.inactive_player();
        let mut board = state.clone();
        let mut plies = 0;
        loop {
            if self.config.mcts.playout_max_plies.is_some_and(|max| plies >= max) {
                self.stats.leaf_evaluations += 1;
                return win_probability(&board, perspective);
            }
            let next = match self.config.mcts.playout_policy {
                PlayoutPolicy::Greedy => greedy_move(
                    &board,
                    self.playout_evaluator.as_ref(),
                    self.config.mcts.greedy_epsilon,
                    &mut self.rng,
                ),
                PlayoutPolicy::Random => random_move(&board, &mut self.rng),
            };
            let Some(mv) = next else {
                break;
            };
            board.apply_move(mv);
            plies += 1;
        }
        if board.winner() == Some(perspective) {
            1.0
        } else {
            0.0
        }
    }
}

impl Default for MonteCarloPlayer {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl BotPlayer for MonteCarloPlayer {
    fn name(&self) -> &str {
        "mcts"
    }

    fn choose_move(
        &mut self,
        state: &GameState,
        clock: &dyn Clock,
    ) -> SearchResult<Option<Move>> {
        self.stats = SearchStats::default();
        if !state.has_legal_moves(state.active_player()) {
            return Ok(None);
        }

        let start = Instant::now();
        let deadline = Deadline::new(clock, self.config.mcts.timer_threshold_ms);
        let mut tree = self.relocate_root(state);
        if let Err(err) = self.search(&mut tree, &deadline) {
            if !err.is_timeout() {
                return Err(err);
            }
        }

        let best = tree.best_child()?;
        let mv = tree
            .last_move(best)
            .ok_or_else(|| SearchError::invariant("root child without a move"))?;
        debug!(
            "mcts picked {} after {} playouts ({} nodes, frontier {}) in {:?}",
            mv,
            self.stats.iterations,
            tree.len(),
            tree.frontier().len(),
            start.elapsed()
        );
        tree.reroot(best);
        self.tree = Some(tree);
        Ok(Some(mv))
    }

    fn last_stats(&self) -> SearchStats {
        self.stats
    }
}
