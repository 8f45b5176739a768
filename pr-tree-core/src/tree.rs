//! Pull request tree construction
//!
//! A pull request hangs below the pull request whose head branch is its base
//! branch. Branches that are the base of some PR but the head of none become
//! roots (typically `main`). Nodes live in an arena and reference each other
//! by [`NodeId`].

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The parts of a pull request the tree cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrInfo {
    /// PR number
    pub number: u64,
    /// Branch the PR merges from
    pub head_branch: String,
    /// Branch the PR merges into
    pub base_branch: String,
    /// Commit the head branch points at on the remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_sha: Option<String>,
    /// PR title
    #[serde(default)]
    pub title: String,
    /// Whether the PR is a draft
    #[serde(default)]
    pub draft: bool,
}

impl PrInfo {
    /// Create a PR with just the fields needed to place it in a tree
    pub fn new(number: u64, head_branch: impl Into<String>, base_branch: impl Into<String>) -> Self {
        Self {
            number,
            head_branch: head_branch.into(),
            base_branch: base_branch.into(),
            head_sha: None,
            title: String::new(),
            draft: false,
        }
    }
}

/// Index of a node inside a [`PrTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A branch in the tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Branch name
    pub branch: String,
    /// The PR whose head is this branch (`None` for roots)
    pub pr: Option<PrInfo>,
    /// The node for the base branch
    pub parent: Option<NodeId>,
    /// PRs based on this branch, in input order
    pub children: Vec<NodeId>,
}

/// Forest of branches connected by pull requests
#[derive(Debug, Clone, Default)]
pub struct PrTree {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
}

impl PrTree {
    /// Build the tree for a set of pull requests
    ///
    /// When several PRs share a head branch the last one wins. PRs whose
    /// base chain never reaches a root (cycles) are left out; see
    /// [`PrTree::unreachable`].
    pub fn build(prs: &[PrInfo]) -> Self {
        let mut head_to_pr: HashMap<&str, &PrInfo> = HashMap::new();
        // Head branches in first-seen order, so children come out in input order
        let mut heads: Vec<&str> = Vec::new();
        for pr in prs {
            if head_to_pr.insert(pr.head_branch.as_str(), pr).is_none() {
                heads.push(pr.head_branch.as_str());
            }
        }

        let mut tree = Self::default();
        let mut seen_roots = HashSet::new();
        for &head in &heads {
            let base = head_to_pr[head].base_branch.as_str();
            if !head_to_pr.contains_key(base) && seen_roots.insert(base) {
                let id = tree.push(base.to_string(), None, None);
                tree.roots.push(id);
            }
        }

        // Expand one level at a time from the roots
        let mut frontier: Vec<NodeId> = tree.roots.clone();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for parent in frontier {
                let parent_branch = tree.nodes[parent.0].branch.clone();
                for &head in &heads {
                    let pr = head_to_pr[head];
                    if pr.base_branch == parent_branch {
                        let child = tree.push(head.to_string(), Some(pr.clone()), Some(parent));
                        tree.nodes[parent.0].children.push(child);
                        next.push(child);
                    }
                }
            }
            frontier = next;
        }

        debug!(
            prs = prs.len(),
            roots = tree.roots.len(),
            nodes = tree.nodes.len(),
            "Built pull request tree"
        );

        tree
    }

    /// PRs from `prs` that [`PrTree::build`] could not attach to any root
    pub fn unreachable<'a>(&self, prs: &'a [PrInfo]) -> Vec<&'a PrInfo> {
        let placed: HashSet<&str> = self
            .nodes
            .iter()
            .filter(|n| n.pr.is_some())
            .map(|n| n.branch.as_str())
            .collect();

        prs.iter()
            .filter(|pr| !placed.contains(pr.head_branch.as_str()))
            .collect()
    }

    fn push(&mut self, branch: String, pr: Option<PrInfo>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            branch,
            pr,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Root nodes in order of first appearance
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Number of nodes, roots included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).parent.is_none()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.node(id).children.is_empty()
    }

    /// Whether the node is the last child of its parent
    ///
    /// Roots always count as the last sibling.
    pub fn is_last_sibling(&self, id: NodeId) -> bool {
        match self.node(id).parent {
            None => true,
            Some(parent) => self.node(parent).children.last() == Some(&id),
        }
    }

    /// Ancestors of a node, from the oldest down to its parent
    pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.node(id).parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.node(p).parent;
        }
        chain.reverse();
        chain
    }

    /// Pre-order walk of every tree, yielding each node with its depth
    pub fn depth_first(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for &child in self.node(id).children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Level-order walk of every tree, yielding each node with its depth
    pub fn breadth_first(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut queue: VecDeque<(NodeId, usize)> = self.roots.iter().map(|&r| (r, 0)).collect();
        while let Some((id, depth)) = queue.pop_front() {
            out.push((id, depth));
            for &child in &self.node(id).children {
                queue.push_back((child, depth + 1));
            }
        }
        out
    }
}
