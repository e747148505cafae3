//! Shortest paths through the visibility graph.

use crate::visibility::VisibilityGraph;
use fairway_geo::{GeoLine, GeoPoint};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// The routing algorithms on offer. A* uses the straight-line geodesic
/// distance to the target, which never overestimates and so stays
/// admissible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathAlgorithm {
    Dijkstra,
    AStar,
}

/// An ordered route: `points.len() == lines.len() + 1` when non-empty, and
/// consecutive lines share an endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortestPathResult {
    pub points: Vec<GeoPoint>,
    pub lines: Vec<GeoLine>,
}

impl ShortestPathResult {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total geodesic length (m).
    pub fn total_length(&self) -> f64 {
        self.lines.iter().map(|l| l.length()).sum()
    }
}

/// One leg between two vertex indices. Returns the index sequence from
/// start to goal, or `None` when the goal is unreachable.
pub fn shortest_leg(
    graph: &VisibilityGraph,
    start: usize,
    goal: usize,
    algorithm: PathAlgorithm,
) -> Option<Vec<usize>> {
    match algorithm {
        PathAlgorithm::Dijkstra => dijkstra(graph, start, goal),
        PathAlgorithm::AStar => a_star(graph, start, goal),
    }
}

fn dijkstra(graph: &VisibilityGraph, start: usize, goal: usize) -> Option<Vec<usize>> {
    if start == goal {
        return Some(vec![start]);
    }

    let n = graph.vertices().len();
    let mut distances = vec![f64::INFINITY; n];
    let mut parents = vec![usize::MAX; n];
    let mut queue = BinaryHeap::new();

    distances[start] = 0.0;
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        if entry.cost.0 > distances[entry.node] {
            continue; // stale entry
        }
        if entry.node == goal {
            return Some(reconstruct(&parents, start, goal));
        }

        for &(next, length) in graph.neighbors(entry.node) {
            let candidate = distances[entry.node] + length;
            // Strict improvement only: equal-cost alternatives keep the
            // first-inserted predecessor, which pins tie-breaking to the
            // adjacency insertion order
            if candidate < distances[next] {
                distances[next] = candidate;
                parents[next] = entry.node;
                queue.push(QueueEntry::new(next, candidate));
            }
        }
    }

    None
}

fn a_star(graph: &VisibilityGraph, start: usize, goal: usize) -> Option<Vec<usize>> {
    if start == goal {
        return Some(vec![start]);
    }

    let n = graph.vertices().len();
    let goal_point = graph.vertices()[goal].clone();
    let heuristic = |i: usize| graph.vertices()[i].distance(&goal_point);

    let mut g_score = vec![f64::INFINITY; n];
    let mut parents = vec![usize::MAX; n];
    let mut queue = BinaryHeap::new();

    g_score[start] = 0.0;
    queue.push(AStarEntry::new(start, 0.0, heuristic(start)));

    while let Some(entry) = queue.pop() {
        if entry.cost.0 > g_score[entry.node] {
            continue;
        }
        if entry.node == goal {
            return Some(reconstruct(&parents, start, goal));
        }

        for &(next, length) in graph.neighbors(entry.node) {
            let tentative = g_score[entry.node] + length;
            if tentative < g_score[next] {
                g_score[next] = tentative;
                parents[next] = entry.node;
                queue.push(AStarEntry::new(next, tentative, heuristic(next)));
            }
        }
    }

    None
}

fn reconstruct(parents: &[usize], start: usize, goal: usize) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = goal;
    loop {
        path.push(current);
        if current == start {
            break;
        }
        current = parents[current];
    }
    path.reverse();
    path
}

/// Totally ordered f64 for min-heap entries.
#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: usize,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: usize, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap; ties pop the
        // earliest-inserted vertex index first
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry {
    node: usize,
    cost: FloatOrd,
    estimate: FloatOrd,
}

impl AStarEntry {
    fn new(node: usize, cost: f64, heuristic: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
        }
    }
}

impl Ord for AStarEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for AStarEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
