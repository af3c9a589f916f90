//! Mine districts: branching tunnel graphs spanning several chunk columns.
//!
//! A district is a square of `cluster_chunks` x `cluster_chunks` columns.
//! Its structure is a sparse graph of nodes on a 3D grid with one node per
//! chunk column per layer; each node expands into a box template when a
//! chunk that overlaps it is filled.
//!
//! The graph is built by a depth-first walk over an explicit work stack
//! starting from an `Enter` node. Undersized graphs are discarded and the
//! walk restarts on the same random stream, up to a retry cap.

mod template;

use std::fmt;
use std::sync::Arc;

use glam::IVec3;
use rustc_hash::FxHashMap;
use strata_config::MineConfig;
use strata_voxel::{BlockId, Chunk, ChunkSize, ColumnAddress};
use tracing::{debug, warn};

use crate::cache::BoundedCache;
use crate::seed::{RandomSource, SeededRandom};

pub use template::{BoxFill, BoxOp, node_template, template_blocks};

/// Cardinal direction a node faces, in clockwise order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    const CLOCKWISE: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    fn index(self) -> i32 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Turns clockwise by `turns` quarter turns (negative turns go
    /// counter-clockwise).
    pub fn rotate(self, turns: i32) -> Self {
        Self::CLOCKWISE[(self.index() + turns).rem_euclid(4) as usize]
    }

    pub fn right(self) -> Self {
        self.rotate(1)
    }

    pub fn left(self) -> Self {
        self.rotate(-1)
    }

    pub fn opposite(self) -> Self {
        self.rotate(2)
    }

    /// Grid step towards this direction. South is `+z`, east is `+x`.
    pub fn step(self) -> IVec3 {
        match self {
            Self::North => IVec3::new(0, 0, -1),
            Self::East => IVec3::new(1, 0, 0),
            Self::South => IVec3::new(0, 0, 1),
            Self::West => IVec3::new(-1, 0, 0),
        }
    }
}

/// Template a node expands into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Entrance hall with a lit floor.
    Enter,
    /// Junction; the walk continues in three directions.
    Cross,
    /// Straight corridor; the walk continues forward.
    Hal,
    /// Dead-end side room.
    Room,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enter => "enter",
            Self::Cross => "cross",
            Self::Hal => "hal",
            Self::Room => "room",
        };
        f.write_str(name)
    }
}

/// One cell of a mine graph.
#[derive(Clone, Debug)]
pub struct MineNode {
    /// Position in the district node grid.
    pub grid: IVec3,
    pub direction: Direction,
    pub kind: NodeKind,
    /// World height of the node's floor.
    pub vertical_offset: i32,
    random: SeededRandom,
}

impl MineNode {
    /// A fresh copy of the node's template random stream.
    ///
    /// Every fill starts from the same point of the stream, so a node that
    /// spans several chunks draws identical chances in each of them.
    pub fn random(&self) -> SeededRandom {
        self.random.clone()
    }
}

/// Grid geometry shared by every district.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MineLayout {
    /// Node grid dimensions.
    pub count: IVec3,
    /// Edge length of a node's square footprint (one chunk column).
    pub footprint: i32,
    /// Height of one node layer in voxels.
    pub node_height: i32,
    /// District edge length in chunk columns.
    pub cluster: i32,
}

impl MineLayout {
    pub fn new(config: &MineConfig, size: ChunkSize) -> Self {
        let cluster = config.cluster_chunks as i32;
        Self {
            count: IVec3::new(cluster, (config.height / config.node_height) as i32, cluster),
            footprint: size.x as i32,
            node_height: config.node_height as i32,
            cluster,
        }
    }

    /// Whether `grid` lies inside the district node grid.
    pub fn contains(&self, grid: IVec3) -> bool {
        grid.cmpge(IVec3::ZERO).all() && grid.cmplt(self.count).all()
    }

    /// District holding a chunk column.
    pub fn district_of(&self, column: ColumnAddress) -> ColumnAddress {
        ColumnAddress::new(column.x.div_euclid(self.cluster), column.z.div_euclid(self.cluster))
    }
}

/// Pending work of the graph walk.
#[derive(Clone, Copy, Debug)]
enum Step {
    /// Try to grow a node next to `from` towards `dir`.
    Branch { from: IVec3, dir: Direction },
    /// Place the junction above the entrance.
    Upper { at: IVec3, dir: Direction },
}

/// Arena of nodes indexed by grid position.
#[derive(Default)]
struct Graph {
    nodes: Vec<MineNode>,
    index: FxHashMap<IVec3, usize>,
}

/// A generated mine district.
pub struct MineStructure {
    district: ColumnAddress,
    layout: MineLayout,
    nodes: Vec<MineNode>,
    index: FxHashMap<IVec3, usize>,
    attempts: u32,
}

impl MineStructure {
    /// Builds the graph for `district`.
    ///
    /// Each attempt draws the entrance layer and walks the grid; the first
    /// attempt with at least `min_nodes` nodes is accepted. If none is, the
    /// largest attempt (earliest on ties) is kept.
    pub fn generate(
        seed: &str,
        district: ColumnAddress,
        layout: MineLayout,
        config: &MineConfig,
        rnd: &mut impl RandomSource,
    ) -> Self {
        let mut best: Option<Graph> = None;
        let mut attempts = 0;

        for _ in 0..config.max_attempts.max(1) {
            attempts += 1;
            let graph = walk(seed, district, &layout, config, rnd);
            if graph.nodes.len() >= config.min_nodes {
                best = Some(graph);
                break;
            }
            if best.as_ref().is_none_or(|b| graph.nodes.len() > b.nodes.len()) {
                best = Some(graph);
            }
        }

        let graph = best.unwrap_or_default();
        if graph.nodes.len() < config.min_nodes {
            warn!(
                %district,
                nodes = graph.nodes.len(),
                attempts,
                "Mine retry cap reached, keeping the largest attempt"
            );
        } else {
            debug!(%district, nodes = graph.nodes.len(), attempts, "Mine generated");
        }

        Self {
            district,
            layout,
            nodes: graph.nodes,
            index: graph.index,
            attempts,
        }
    }

    pub fn district(&self) -> ColumnAddress {
        self.district
    }

    pub fn nodes(&self) -> &[MineNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of walks it took to produce this structure.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Node at a grid position.
    pub fn node(&self, grid: IVec3) -> Option<&MineNode> {
        self.index.get(&grid).map(|&i| &self.nodes[i])
    }

    /// World position of the node's footprint corner at its floor.
    pub fn node_origin(&self, node: &MineNode) -> IVec3 {
        let span = self.layout.cluster * self.layout.footprint;
        IVec3::new(
            self.district.x * span + node.grid.x * self.layout.footprint,
            node.vertical_offset,
            self.district.z * span + node.grid.z * self.layout.footprint,
        )
    }

    /// Inclusive world bounds of a node.
    pub fn node_bounds(&self, node: &MineNode) -> (IVec3, IVec3) {
        let min = self.node_origin(node);
        let e = self.layout.footprint - 1;
        (min, min + IVec3::new(e, self.layout.node_height, e))
    }

    /// Nodes whose bounds intersect `chunk`, lowest layer first.
    pub fn nodes_for_chunk(&self, chunk: &Chunk) -> Vec<&MineNode> {
        let column = chunk.address().column();
        let local = IVec3::new(
            column.x - self.district.x * self.layout.cluster,
            0,
            column.z - self.district.z * self.layout.cluster,
        );
        let bottom = chunk.coord().y;
        let top = bottom + chunk.size().y as i32 - 1;
        (0..self.layout.count.y)
            .filter_map(|y| self.node(IVec3::new(local.x, y, local.z)))
            .filter(|node| {
                let (min, max) = self.node_bounds(node);
                min.y <= top && max.y >= bottom
            })
            .collect()
    }

    /// Writes every node overlapping `chunk`.
    pub fn fill(&self, chunk: &mut Chunk) {
        for node in self.nodes_for_chunk(chunk) {
            template::apply_node(chunk, node, self.node_origin(node), self.layout.footprint);
        }
    }
}

/// One graph walk. See [`MineStructure::generate`] for the draw order.
fn walk(
    seed: &str,
    district: ColumnAddress,
    layout: &MineLayout,
    config: &MineConfig,
    rnd: &mut impl RandomSource,
) -> Graph {
    let mut graph = Graph::default();
    let add = |graph: &mut Graph, grid: IVec3, direction: Direction, kind: NodeKind| {
        graph.index.insert(grid, graph.nodes.len());
        graph.nodes.push(MineNode {
            grid,
            direction,
            kind,
            vertical_offset: grid.y * layout.node_height,
            random: SeededRandom::new(seed, format!("node_mine{district}{grid}")),
        });
    };

    let bottom_y = (rnd.next_double() * (layout.count.y - 2) as f64).floor() as i32;
    let start = IVec3::new(0, bottom_y, 0);
    let facing = Direction::South;
    add(&mut graph, start, facing, NodeKind::Enter);

    let mut stack = vec![Step::Upper {
        at: start + IVec3::Y,
        dir: facing,
    }];
    push_branches(&mut stack, start, facing);

    while let Some(step) = stack.pop() {
        match step {
            Step::Upper { at, dir } => {
                if layout.contains(at) && !graph.index.contains_key(&at) {
                    add(&mut graph, at, dir, NodeKind::Cross);
                    push_branches(&mut stack, at, dir);
                }
            }
            Step::Branch { from, dir } => {
                let next = from + dir.step();
                if !layout.contains(next) || graph.index.contains_key(&next) {
                    continue;
                }
                if rnd.next_double() < config.chance_cross {
                    add(&mut graph, next, dir, NodeKind::Cross);
                    push_branches(&mut stack, next, dir);
                } else if rnd.next_double() < config.chance_hal {
                    add(&mut graph, next, dir, NodeKind::Hal);
                    stack.push(Step::Branch { from: next, dir });
                } else if rnd.next_double() < config.chance_room {
                    add(&mut graph, next, dir, NodeKind::Room);
                }
            }
        }
    }
    graph
}

/// Queues forward, right and left branches so that forward runs first.
fn push_branches(stack: &mut Vec<Step>, from: IVec3, dir: Direction) {
    stack.push(Step::Branch { from, dir: dir.left() });
    stack.push(Step::Branch { from, dir: dir.right() });
    stack.push(Step::Branch { from, dir });
}

/// Lazily generated mine districts.
pub struct MineIndex {
    seed: String,
    layout: MineLayout,
    config: MineConfig,
    mines: BoundedCache<ColumnAddress, MineStructure>,
}

impl MineIndex {
    pub fn new(seed: &str, size: ChunkSize, config: MineConfig, capacity: usize) -> Self {
        Self {
            seed: seed.to_string(),
            layout: MineLayout::new(&config, size),
            config,
            mines: BoundedCache::new("mine", capacity),
        }
    }

    pub fn layout(&self) -> &MineLayout {
        &self.layout
    }

    /// Structure of `district`, generated on first access.
    pub fn get(&self, district: ColumnAddress) -> Arc<MineStructure> {
        self.mines.get_or_insert_with(district, || {
            let mut rnd = SeededRandom::new(&self.seed, format!("mine{district}"));
            MineStructure::generate(&self.seed, district, self.layout, &self.config, &mut rnd)
        })
    }

    /// Structure covering a chunk column.
    pub fn for_column(&self, column: ColumnAddress) -> Arc<MineStructure> {
        self.get(self.layout.district_of(column))
    }

    /// Every block the templates can place.
    pub fn referenced_blocks(&self) -> Vec<BlockId> {
        template_blocks(self.layout.footprint)
    }

    pub fn len(&self) -> usize {
        self.mines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mines.is_empty()
    }
}
