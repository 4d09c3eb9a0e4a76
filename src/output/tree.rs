//! Navigation tree reconstruction and rendering

use crate::state::{CrawlStatus, NavigationNode};
use std::collections::HashMap;
use std::fmt::Write;

/// A node and its recorded children
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub node: NavigationNode,
    pub children: Vec<TreeNode>,
}

/// Nodes of one crawl arranged by `parent_id`
///
/// Nodes whose parent is not among the input become roots, so a partial node
/// list still yields a usable tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationTree {
    pub roots: Vec<TreeNode>,
}

impl NavigationTree {
    /// Builds the tree, keeping the input order among siblings
    pub fn from_nodes(nodes: &[NavigationNode]) -> Self {
        let known: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut children_of: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut root_indices = Vec::new();

        for (i, node) in nodes.iter().enumerate() {
            match node
                .parent_id
                .as_deref()
                .and_then(|p| known.get(p))
                .filter(|&&parent| parent != i)
            {
                Some(&parent) => children_of.entry(parent).or_default().push(i),
                None => root_indices.push(i),
            }
        }

        let roots = root_indices
            .into_iter()
            .map(|i| build(i, nodes, &children_of))
            .collect();

        Self { roots }
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of levels below the roots, 0 for a lone root
    pub fn depth(&self) -> usize {
        fn depth_of(node: &TreeNode) -> usize {
            node.children.iter().map(|c| 1 + depth_of(c)).max().unwrap_or(0)
        }
        self.roots.iter().map(depth_of).max().unwrap_or(0)
    }

    /// Renders the tree as an indented markdown list
    ///
    /// ```
    /// use portal_scout::output::NavigationTree;
    ///
    /// let tree = NavigationTree::from_nodes(&[]);
    /// assert_eq!(tree.render(), "");
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            render_node(root, 0, &mut out);
        }
        out
    }
}

// Nodes on a parent cycle are unreachable from any root and left out.
fn build(index: usize, nodes: &[NavigationNode], children_of: &HashMap<usize, Vec<usize>>) -> TreeNode {
    let children = children_of
        .get(&index)
        .map(|kids| kids.iter().map(|&k| build(k, nodes, children_of)).collect())
        .unwrap_or_default();

    TreeNode {
        node: nodes[index].clone(),
        children,
    }
}

fn render_node(tree: &TreeNode, indent: usize, out: &mut String) {
    let node = &tree.node;
    let title = if node.title.is_empty() {
        node.url.as_str()
    } else {
        node.title.as_str()
    };

    let _ = write!(
        out,
        "{}- [{}]({}) ({}",
        "  ".repeat(indent),
        title,
        node.url,
        node.page_type
    );
    match (&node.crawl_status, &node.error) {
        (CrawlStatus::Failed, Some(error)) => {
            let _ = write!(out, ", failed: {}", error);
        }
        (CrawlStatus::Success, _) => {}
        (status, _) => {
            let _ = write!(out, ", {}", status);
        }
    }
    out.push_str(")\n");

    for child in &tree.children {
        render_node(child, indent + 1, out);
    }
}
