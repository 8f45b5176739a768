//! Text and JSON rendering of a [`PrTree`]

use std::collections::HashMap;

use serde::Serialize;

use crate::config::Charset;
use crate::tree::{NodeId, PrInfo, PrTree};

/// Line-drawing glyphs for one charset
#[derive(Debug, Clone, Copy)]
struct Glyphs {
    pipe: &'static str,
    blank: &'static str,
    root: &'static str,
    last: &'static str,
    middle: &'static str,
    branch: &'static str,
    leaf: &'static str,
}

const UNICODE: Glyphs = Glyphs {
    pipe: "│",
    blank: " ",
    root: "─",
    last: "└",
    middle: "├",
    branch: "┬ ",
    leaf: "─ ",
};

const ASCII: Glyphs = Glyphs {
    pipe: "|",
    blank: " ",
    root: "-",
    last: "`",
    middle: "|",
    branch: "+ ",
    leaf: "- ",
};

/// How a PR's head compares to the local branch of the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Local branch points at the same commit
    InSync,
    /// Local branch exists but points elsewhere
    Diverged,
    /// No local branch with that name
    MissingLocally,
}

impl SyncState {
    /// Compare a remote head SHA with an optional local one
    pub fn compare(remote: &str, local: Option<&str>) -> Self {
        match local {
            None => SyncState::MissingLocally,
            Some(sha) if sha == remote => SyncState::InSync,
            Some(_) => SyncState::Diverged,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            SyncState::InSync => "",
            SyncState::Diverged => " *",
            SyncState::MissingLocally => " ?",
        }
    }
}

/// Rendering switches
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub charset: Charset,
    /// Append the PR title after the number
    pub titles: bool,
    /// Sync markers keyed by branch name
    pub sync: HashMap<String, SyncState>,
}

/// Draws a tree one line per branch
#[derive(Debug)]
pub struct Renderer<'a> {
    tree: &'a PrTree,
    options: RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(tree: &'a PrTree, options: RenderOptions) -> Self {
        Self { tree, options }
    }

    /// Render every node in depth-first order
    pub fn lines(&self) -> Vec<String> {
        self.tree
            .depth_first()
            .into_iter()
            .map(|(id, _)| self.line(id))
            .collect()
    }

    /// Render the whole tree as newline-terminated text
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    fn line(&self, id: NodeId) -> String {
        let glyphs = match self.options.charset {
            Charset::Unicode => UNICODE,
            Charset::Ascii => ASCII,
        };
        let tree = self.tree;
        let mut line = String::new();

        for ancestor in tree.ancestry(id) {
            line.push_str(if tree.is_last_sibling(ancestor) {
                glyphs.blank
            } else {
                glyphs.pipe
            });
        }

        line.push_str(if tree.is_root(id) {
            glyphs.root
        } else if tree.is_last_sibling(id) {
            glyphs.last
        } else {
            glyphs.middle
        });

        line.push_str(if tree.has_children(id) {
            glyphs.branch
        } else {
            glyphs.leaf
        });

        let node = tree.node(id);
        line.push_str(&node.branch);

        if let Some(pr) = &node.pr {
            line.push_str(&format!(" [{}]", pr.number));
            if pr.draft {
                line.push_str(" (draft)");
            }
            if self.options.titles && !pr.title.is_empty() {
                line.push(' ');
                line.push_str(&pr.title);
            }
            if let Some(state) = self.options.sync.get(&node.branch) {
                line.push_str(state.marker());
            }
        }

        line
    }
}

/// Serializable form of a node and its subtree
#[derive(Debug, Serialize)]
struct JsonNode<'a> {
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pr: Option<&'a PrInfo>,
    children: Vec<JsonNode<'a>>,
}

fn to_json_node(tree: &PrTree, id: NodeId) -> JsonNode<'_> {
    let node = tree.node(id);
    JsonNode {
        branch: &node.branch,
        pr: node.pr.as_ref(),
        children: node
            .children
            .iter()
            .map(|&child| to_json_node(tree, child))
            .collect(),
    }
}

/// Render the forest as a pretty-printed JSON array of root objects
pub fn render_json(tree: &PrTree) -> crate::Result<String> {
    let roots: Vec<JsonNode<'_>> = tree
        .roots()
        .iter()
        .map(|&r| to_json_node(tree, r))
        .collect();
    Ok(serde_json::to_string_pretty(&roots)?)
}
