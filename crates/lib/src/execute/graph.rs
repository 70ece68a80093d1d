//! Task graph for a build target.
//!
//! This module builds a directed acyclic graph of build tasks and groups it
//! into parallel execution waves.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::sources::{SourceSet, SourceUnit};

use super::types::{BuildError, Stage, Target};

/// A node in the task graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Task {
  /// Compile one auxiliary source.
  Compile(SourceUnit),
  /// Run the nested modules build.
  Modules,
  /// Run the translator.
  Generate,
  /// Run the native build in the generated directory.
  Link,
}

impl Task {
  pub fn stage(&self) -> Stage {
    match self {
      Task::Compile(_) => Stage::Compile,
      Task::Modules => Stage::Modules,
      Task::Generate => Stage::Generate,
      Task::Link => Stage::Link,
    }
  }
}

impl fmt::Display for Task {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Task::Compile(unit) => write!(f, "compile {}", unit.object_name()),
      other => write!(f, "{}", other.stage()),
    }
  }
}

/// The static task graph of one build.
///
/// Every compilation feeds the translator, which feeds the link. The modules
/// build has no edges: it is a peer deliverable of the simulator.
pub struct TaskGraph {
  graph: DiGraph<Task, ()>,
}

impl TaskGraph {
  /// Build the graph for `target` over the discovered sources.
  pub fn for_target(target: Target, sources: &SourceSet) -> Result<Self, BuildError> {
    let mut graph = DiGraph::new();

    if target.includes_modules() {
      graph.add_node(Task::Modules);
    }

    if target.includes_sim() {
      let generate = graph.add_node(Task::Generate);
      let link = graph.add_node(Task::Link);
      graph.add_edge(generate, link, ());

      for unit in sources.units() {
        let compile = graph.add_node(Task::Compile(unit.clone()));
        // Edge from dependency to dependent
        graph.add_edge(compile, generate, ());
      }
    }

    let task_graph = Self { graph };
    task_graph.verify_acyclic()?;
    Ok(task_graph)
  }

  /// Verify that the graph is acyclic.
  fn verify_acyclic(&self) -> Result<(), BuildError> {
    toposort(&self.graph, None).map_err(|_| BuildError::CycleDetected)?;
    Ok(())
  }

  /// Get tasks organized into parallel execution waves.
  ///
  /// Each wave contains tasks whose dependencies all sit in earlier waves.
  pub fn waves(&self) -> Result<Vec<Vec<Task>>, BuildError> {
    // Use Kahn's algorithm variant to compute levels
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();
    let mut node_level: HashMap<NodeIndex, usize> = HashMap::new();

    let mut current_level = 0;
    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().filter(|&&idx| in_degree[&idx] == 0).copied().collect();

      if ready.is_empty() {
        return Err(BuildError::CycleDetected);
      }

      for &idx in &ready {
        node_level.insert(idx, current_level);
        remaining.remove(&idx);

        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&neighbor) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      current_level += 1;
    }

    let max_level = node_level.values().copied().max().unwrap_or(0);
    let mut waves: Vec<Vec<Task>> = vec![Vec::new(); max_level + 1];

    // Node indices follow insertion order, so waves are deterministic
    for idx in self.graph.node_indices() {
      if let Some(&level) = node_level.get(&idx) {
        waves[level].push(self.graph[idx].clone());
      }
    }

    waves.retain(|w| !w.is_empty());
    Ok(waves)
  }

  /// Number of tasks in the graph.
  pub fn task_count(&self) -> usize {
    self.graph.node_count()
  }
}
