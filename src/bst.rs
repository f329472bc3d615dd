//! Unbalanced binary search tree over an index arena.
//!
//! Nodes are addressed by `NodeId`; the arena owns every node and a parent
//! handle is kept only so successor queries can walk toward the root.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::catalog::Algorithm;
use crate::config;
use crate::errors::{Result, VizError};
use crate::recorder::StepRecorder;
use crate::step::{Outcome, Run, Step, StepKind, TreeNodeView, TreeSnapshot, WorkingState};

pub type NodeId = usize;

#[derive(Clone, Serialize, Deserialize, Debug)]
struct Node {
    value: i64,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum TraversalOrder {
    Preorder,
    Inorder,
    Postorder,
    LevelOrder,
}

impl TraversalOrder {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            TraversalOrder::Preorder => Algorithm::Preorder,
            TraversalOrder::Inorder => Algorithm::Inorder,
            TraversalOrder::Postorder => Algorithm::Postorder,
            TraversalOrder::LevelOrder => Algorithm::LevelOrder,
        }
    }
}

type Trace<'x, 'a> = Option<&'x mut StepRecorder<'a>>;

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct Bst {
    slots: Vec<Node>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    size: usize,
}

impl Bst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: &[i64]) -> Self {
        let mut tree = Bst::new();
        for &v in values {
            tree.insert(v);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    // Released slots stay in `slots` until reused; only live handles reach here.
    fn node(&self, id: NodeId) -> &Node {
        debug_assert!(!self.free.contains(&id), "released node {} used", id);
        &self.slots[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        debug_assert!(!self.free.contains(&id), "released node {} used", id);
        &mut self.slots[id]
    }

    fn alloc(&mut self, value: i64, parent: Option<NodeId>) -> NodeId {
        let node = Node {
            value,
            left: None,
            right: None,
            parent,
        };
        self.size += 1;
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = node;
                id
            }
            None => {
                self.slots.push(node);
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        let node = &mut self.slots[id];
        node.left = None;
        node.right = None;
        node.parent = None;
        self.free.push(id);
        self.size -= 1;
    }

    fn trace(&self, rec: &mut Trace, make: impl FnOnce(WorkingState) -> Step) -> Result<()> {
        if let Some(r) = rec.as_deref_mut() {
            r.checkpoint()?;
            r.record(make(WorkingState::Tree(self.snapshot())));
        }
        Ok(())
    }

    fn compare_step(&self, rec: &mut Trace, value: i64, id: NodeId) -> Result<()> {
        let current = self.node(id).value;
        self.trace(rec, |state| {
            Step::new(StepKind::Compare, state)
                .keys([value, current])
                .value("value", value)
                .value("node", current)
                .note(format!("{} vs {}", value, current))
        })
    }

    pub fn insert(&mut self, value: i64) -> bool {
        matches!(self.insert_traced(value, &mut None), Ok(true))
    }

    /// Returns `Ok(false)` for a duplicate, which leaves the tree unchanged.
    fn insert_traced(&mut self, value: i64, rec: &mut Trace) -> Result<bool> {
        let Some(mut cur) = self.root else {
            let id = self.alloc(value, None);
            self.root = Some(id);
            self.trace(rec, |state| {
                Step::new(StepKind::Assign, state)
                    .key(value)
                    .note(format!("{} becomes the root", value))
            })?;
            return Ok(true);
        };
        loop {
            self.compare_step(rec, value, cur)?;
            let node = self.node(cur);
            let next = if value < node.value {
                node.left
            } else if value > node.value {
                node.right
            } else {
                self.trace(rec, |state| {
                    Step::new(StepKind::Found, state)
                        .key(value)
                        .note(format!("{} already present, ignored", value))
                })?;
                return Ok(false);
            };
            match next {
                Some(child) => cur = child,
                None => {
                    let id = self.alloc(value, Some(cur));
                    let parent_value = self.node(cur).value;
                    let side = if value < parent_value {
                        self.node_mut(cur).left = Some(id);
                        "left"
                    } else {
                        self.node_mut(cur).right = Some(id);
                        "right"
                    };
                    self.trace(rec, |state| {
                        Step::new(StepKind::Assign, state)
                            .keys([value, parent_value])
                            .value("side", side)
                            .note(format!("insert {} as {} child of {}", value, side, parent_value))
                    })?;
                    return Ok(true);
                }
            }
        }
    }

    fn find_traced(&self, value: i64, rec: &mut Trace) -> Result<Option<NodeId>> {
        let mut cur = self.root;
        while let Some(id) = cur {
            self.compare_step(rec, value, id)?;
            let node = self.node(id);
            if value == node.value {
                self.trace(rec, |state| {
                    Step::new(StepKind::Found, state)
                        .key(value)
                        .note(format!("found {}", value))
                })?;
                return Ok(Some(id));
            }
            cur = if value < node.value { node.left } else { node.right };
        }
        self.trace(rec, |state| {
            Step::new(StepKind::NotFound, state)
                .key(value)
                .note(format!("{} not in tree", value))
        })?;
        Ok(None)
    }

    pub fn contains(&self, value: i64) -> bool {
        matches!(self.find_traced(value, &mut None), Ok(Some(_)))
    }

    pub fn delete(&mut self, value: i64) -> bool {
        matches!(self.delete_traced(value, &mut None), Ok(true))
    }

    fn delete_traced(&mut self, value: i64, rec: &mut Trace) -> Result<bool> {
        match self.find_traced(value, rec)? {
            Some(id) => {
                self.remove_node(id, rec)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_node(&mut self, id: NodeId, rec: &mut Trace) -> Result<()> {
        let (left, right) = {
            let node = self.node(id);
            (node.left, node.right)
        };
        if let (Some(_), Some(right)) = (left, right) {
            let succ = self.leftmost(right);
            let succ_value = self.node(succ).value;
            let old = self.node(id).value;
            self.trace(rec, |state| {
                Step::new(StepKind::Visit, state)
                    .key(succ_value)
                    .note(format!("in-order successor of {} is {}", old, succ_value))
            })?;
            self.node_mut(id).value = succ_value;
            self.trace(rec, |state| {
                Step::new(StepKind::Assign, state)
                    .keys([old, succ_value])
                    .note(format!("replace {} with {}", old, succ_value))
            })?;
            return self.remove_node(succ, rec);
        }

        let child = left.or(right);
        let parent = self.node(id).parent;
        let removed = self.node(id).value;
        match parent {
            None => self.root = child,
            Some(p) => {
                let pn = self.node_mut(p);
                if pn.left == Some(id) {
                    pn.left = child;
                } else {
                    pn.right = child;
                }
            }
        }
        if let Some(c) = child {
            self.node_mut(c).parent = parent;
        }
        self.release(id);
        self.trace(rec, |state| {
            Step::new(StepKind::Assign, state)
                .key(removed)
                .note(format!("unlink {}", removed))
        })
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.node(id).left {
            id = l;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(r) = self.node(id).right {
            id = r;
        }
        id
    }

    pub fn min(&self) -> Option<i64> {
        self.root.map(|r| self.node(self.leftmost(r)).value)
    }

    pub fn max(&self) -> Option<i64> {
        self.root.map(|r| self.node(self.rightmost(r)).value)
    }

    /// Number of nodes on the longest root-to-leaf path; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut level: Vec<NodeId> = self.root.into_iter().collect();
        while !level.is_empty() {
            height += 1;
            level = level
                .iter()
                .flat_map(|&id| {
                    let n = self.node(id);
                    n.left.into_iter().chain(n.right)
                })
                .collect();
        }
        height
    }

    pub fn successor(&self, value: i64) -> Option<i64> {
        self.successor_traced(value, &mut None).ok().flatten()
    }

    fn successor_traced(&self, value: i64, rec: &mut Trace) -> Result<Option<i64>> {
        let Some(id) = self.find_traced(value, rec)? else {
            return Ok(None);
        };
        let found = if let Some(right) = self.node(id).right {
            Some(self.leftmost(right))
        } else {
            let mut cur = id;
            let mut parent = self.node(id).parent;
            while let Some(p) = parent {
                if self.node(p).right != Some(cur) {
                    break;
                }
                let pv = self.node(p).value;
                self.trace(rec, |state| {
                    Step::new(StepKind::Visit, state)
                        .key(pv)
                        .note(format!("climb to {}", pv))
                })?;
                cur = p;
                parent = self.node(p).parent;
            }
            parent
        };
        match found {
            Some(s) => {
                let sv = self.node(s).value;
                self.trace(rec, |state| {
                    Step::new(StepKind::Found, state)
                        .key(sv)
                        .note(format!("successor of {} is {}", value, sv))
                })?;
                Ok(Some(sv))
            }
            None => {
                self.trace(rec, |state| {
                    Step::new(StepKind::NotFound, state)
                        .key(value)
                        .note(format!("{} is the maximum", value))
                })?;
                Ok(None)
            }
        }
    }

    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    pub fn inorder(&self) -> Inorder<'_> {
        Inorder {
            tree: self,
            stack: Vec::new(),
            cur: self.root,
        }
    }

    pub fn postorder(&self) -> Postorder<'_> {
        Postorder {
            tree: self,
            stack: self.root.map(|r| (r, false)).into_iter().collect(),
        }
    }

    pub fn level_order(&self) -> LevelOrder<'_> {
        LevelOrder {
            tree: self,
            queue: self.root.into_iter().collect(),
        }
    }

    pub fn traverse(&self, order: TraversalOrder) -> Box<dyn Iterator<Item = i64> + '_> {
        match order {
            TraversalOrder::Preorder => Box::new(self.preorder()),
            TraversalOrder::Inorder => Box::new(self.inorder()),
            TraversalOrder::Postorder => Box::new(self.postorder()),
            TraversalOrder::LevelOrder => Box::new(self.level_order()),
        }
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let mut nodes = Vec::with_capacity(self.size);
        let root = self.root.map(|r| self.flatten(r, &mut nodes));
        TreeSnapshot { root, nodes }
    }

    /// Preorder layout with an explicit stack; degenerate trees are as deep as they are long.
    fn flatten(&self, root: NodeId, out: &mut Vec<TreeNodeView>) -> usize {
        // (node, slot in `out` of the parent and whether this is its right child)
        let mut stack: Vec<(NodeId, Option<(usize, bool)>)> = vec![(root, None)];
        let start = out.len();
        while let Some((id, parent)) = stack.pop() {
            let node = self.node(id);
            let index = out.len();
            out.push(TreeNodeView {
                value: node.value,
                left: None,
                right: None,
            });
            match parent {
                Some((p, false)) => out[p].left = Some(index),
                Some((p, true)) => out[p].right = Some(index),
                None => {}
            }
            if let Some(r) = node.right {
                stack.push((r, Some((index, true))));
            }
            if let Some(l) = node.left {
                stack.push((l, Some((index, false))));
            }
        }
        start
    }
}

pub struct Preorder<'t> {
    tree: &'t Bst,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack.extend(node.right);
        self.stack.extend(node.left);
        Some(node.value)
    }
}

pub struct Inorder<'t> {
    tree: &'t Bst,
    stack: Vec<NodeId>,
    cur: Option<NodeId>,
}

impl Iterator for Inorder<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        while let Some(id) = self.cur {
            self.stack.push(id);
            self.cur = self.tree.node(id).left;
        }
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.cur = node.right;
        Some(node.value)
    }
}

pub struct Postorder<'t> {
    tree: &'t Bst,
    stack: Vec<(NodeId, bool)>,
}

impl Iterator for Postorder<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        while let Some((id, expanded)) = self.stack.pop() {
            let node = self.tree.node(id);
            if expanded {
                return Some(node.value);
            }
            self.stack.push((id, true));
            if let Some(r) = node.right {
                self.stack.push((r, false));
            }
            if let Some(l) = node.left {
                self.stack.push((l, false));
            }
        }
        None
    }
}

pub struct LevelOrder<'t> {
    tree: &'t Bst,
    queue: VecDeque<NodeId>,
}

impl Iterator for LevelOrder<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let id = self.queue.pop_front()?;
        let node = self.tree.node(id);
        self.queue.extend(node.left);
        self.queue.extend(node.right);
        Some(node.value)
    }
}

fn tree_run(algorithm: Algorithm, initial: &Bst, tree: &Bst, rec: &mut StepRecorder, outcome: Outcome) -> Run {
    log::debug!("{:?}: {} nodes, {} steps", algorithm, tree.len(), rec.len());
    Run {
        algorithm,
        initial: WorkingState::Tree(initial.snapshot()),
        steps: rec.take_steps(),
        final_state: WorkingState::Tree(tree.snapshot()),
        outcome,
    }
}

fn require_values(values: &[i64]) -> Result<()> {
    if values.is_empty() {
        return Err(VizError::invalid("tree input list is empty"));
    }
    config::check_len(values.len(), "tree input list")
}

/// Inserts `inserts` in order, then deletes `deletes` in order.
pub fn build_tree(inserts: &[i64], deletes: &[i64]) -> Result<Run> {
    build_tree_with(inserts, deletes, &mut StepRecorder::new())
}

pub fn build_tree_with(inserts: &[i64], deletes: &[i64], rec: &mut StepRecorder) -> Result<Run> {
    require_values(inserts)?;
    config::check_len(deletes.len(), "delete list")?;
    let initial = Bst::new();
    let mut tree = Bst::new();
    for &v in inserts {
        tree.insert_traced(v, &mut Some(&mut *rec))?;
    }
    for &v in deletes {
        tree.delete_traced(v, &mut Some(&mut *rec))?;
    }
    let inorder = tree.inorder().collect();
    Ok(tree_run(Algorithm::BstBuild, &initial, &tree, rec, Outcome::Tree(inorder)))
}

/// Searches a tree built from `inserts`; a hit reports the value's inorder rank.
pub fn search_tree(inserts: &[i64], target: i64) -> Result<Run> {
    search_tree_with(inserts, target, &mut StepRecorder::new())
}

pub fn search_tree_with(inserts: &[i64], target: i64, rec: &mut StepRecorder) -> Result<Run> {
    require_values(inserts)?;
    let tree = Bst::from_values(inserts);
    let outcome = match tree.find_traced(target, &mut Some(&mut *rec))? {
        Some(_) => Outcome::Found(tree.inorder().take_while(|&v| v < target).count()),
        None => Outcome::NotFound,
    };
    Ok(tree_run(Algorithm::BstSearch, &tree, &tree, rec, outcome))
}

pub fn successor_query(inserts: &[i64], value: i64) -> Result<Run> {
    successor_query_with(inserts, value, &mut StepRecorder::new())
}

pub fn successor_query_with(inserts: &[i64], value: i64, rec: &mut StepRecorder) -> Result<Run> {
    require_values(inserts)?;
    let tree = Bst::from_values(inserts);
    let outcome = match tree.successor_traced(value, &mut Some(&mut *rec))? {
        Some(s) => Outcome::Number(s),
        None => Outcome::NotFound,
    };
    Ok(tree_run(Algorithm::BstSuccessor, &tree, &tree, rec, outcome))
}

pub fn traversal(inserts: &[i64], order: TraversalOrder) -> Result<Run> {
    traversal_with(inserts, order, &mut StepRecorder::new())
}

pub fn traversal_with(inserts: &[i64], order: TraversalOrder, rec: &mut StepRecorder) -> Result<Run> {
    require_values(inserts)?;
    let tree = Bst::from_values(inserts);
    let state = WorkingState::Tree(tree.snapshot());
    let mut visited = Vec::with_capacity(tree.len());
    for value in tree.traverse(order) {
        rec.checkpoint()?;
        visited.push(value);
        rec.record(
            Step::new(StepKind::Visit, state.clone())
                .key(value)
                .value("position", visited.len() - 1)
                .note(format!("visit {}", value)),
        );
    }
    Ok(tree_run(order.algorithm(), &tree, &tree, rec, Outcome::Traversal(visited)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_walks_parents() {
        let tree = Bst::from_values(&[50, 30, 70, 20, 40, 60, 80]);
        assert_eq!(tree.successor(40), Some(50));
        assert_eq!(tree.successor(50), Some(60));
        assert_eq!(tree.successor(20), Some(30));
        assert_eq!(tree.successor(80), None);
        assert_eq!(tree.successor(99), None);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut tree = Bst::from_values(&[2, 1, 3]);
        assert!(tree.delete(1));
        assert!(tree.insert(0));
        assert_eq!(tree.slots.len(), 3);
        assert_eq!(tree.inorder().collect::<Vec<_>>(), vec![0, 2, 3]);
    }

    #[test]
    fn degenerate_snapshot_uses_no_recursion() {
        let values: Vec<i64> = (0..2000).collect();
        let tree = Bst::from_values(&values);
        let snap = std::thread::Builder::new()
            .stack_size(64 * 1024)
            .spawn(move || tree.snapshot())
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(snap.nodes.len(), 2000);
        assert_eq!(snap.nodes[1998].right, Some(1999));
    }

    #[test]
    fn long_insert_lists_rejected() {
        let values: Vec<i64> = (0..=config::MAX_ARRAY_SIZE as i64).collect();
        assert!(matches!(
            traversal(&values, TraversalOrder::Inorder),
            Err(VizError::InvalidConfig(_))
        ));
        assert!(build_tree(&values[..10], &values).is_err());
    }

    #[test]
    fn snapshot_is_preorder() {
        let tree = Bst::from_values(&[2, 1, 3]);
        let snap = tree.snapshot();
        let values: Vec<i64> = snap.nodes.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![2, 1, 3]);
        assert_eq!(snap.nodes[0].left, Some(1));
        assert_eq!(snap.nodes[0].right, Some(2));
    }
}
