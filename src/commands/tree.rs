//! # Tree Command Implementation
//!
//! Displays the platform dependency graph as a tree: platforms without a
//! parent in the selection are roots and the images built from them are
//! nested below. A platform with several parents appears under each of them.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::collections::HashSet;

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use image_builder::context::RunContext;
use image_builder::graph::PlatformGraph;
use image_builder::manifest::PlatformId;
use image_builder::output::OutputConfig;

use super::{FilterArgs, ManifestArgs};

/// Display the image dependency tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Maximum depth to display in the tree.
    ///
    /// Use 0 to show only the root images.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, out: OutputConfig) -> Result<()> {
    let context = RunContext::new();
    let manifest = args.manifest.load(&context)?;
    let selected = args.filter.to_filter().apply(&manifest)?;
    let graph = PlatformGraph::build(&manifest);

    let root = build_forest(
        &graph,
        &selected,
        args.depth.unwrap_or(usize::MAX),
        &out,
        &args.manifest.manifest.display().to_string(),
    );
    print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

fn build_forest(
    graph: &PlatformGraph,
    selected: &[PlatformId],
    max_depth: usize,
    out: &OutputConfig,
    title: &str,
) -> TreeNode {
    let members: HashSet<PlatformId> = selected.iter().copied().collect();
    let children = selected
        .iter()
        .copied()
        .filter(|id| !graph.parents(*id).iter().any(|p| members.contains(p)))
        .map(|id| {
            let mut path = Vec::new();
            build_tree_node(graph, id, &members, max_depth, out, &mut path)
        })
        .collect();

    TreeNode {
        label: title.to_string(),
        children,
    }
}

/// `path` holds the ids from the root down to `id`
fn build_tree_node(
    graph: &PlatformGraph,
    id: PlatformId,
    members: &HashSet<PlatformId>,
    max_depth: usize,
    out: &OutputConfig,
    path: &mut Vec<PlatformId>,
) -> TreeNode {
    let platform = graph.platform(id);
    let label = format!(
        "{} {}",
        out.highlight(platform.display_name()),
        out.dim(&format!("({})", platform.path))
    );

    if path.len() >= max_depth || path.contains(&id) {
        return TreeNode {
            label,
            children: vec![],
        };
    }

    path.push(id);
    let children = graph
        .children(id)
        .iter()
        .copied()
        .filter(|child| members.contains(child))
        .map(|child| build_tree_node(graph, child, members, max_depth, out, path))
        .collect();
    path.pop();

    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
