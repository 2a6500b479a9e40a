//! Structural rewrites that turn tags the target editor mishandles into ones
//! it renders, with explicit inline styles baked in.
//!
//! The steps run in a fixed order; later steps rely on earlier ones (inline
//! code detection, for instance, expects code blocks to be converted already).

mod blockquote;
mod code_block;
mod heading;
mod hr;
mod inline_code;
mod list;
mod table;
mod task_list;

use tracing::trace;

use super::dom::Node;

pub use code_block::{SEPARATOR_STYLE, is_separator};

type Step = fn(&mut Vec<Node>);

const STEPS: [(&str, Step); 8] = [
    ("code_block", code_block::convert),
    ("heading", heading::convert),
    ("table", table::convert),
    ("blockquote", blockquote::convert),
    ("inline_code", inline_code::convert),
    ("hr", hr::convert),
    ("list", list::convert),
    ("task_list", task_list::convert),
];

/// Run every structural transform over `nodes`, in order.
pub fn apply_all(nodes: &mut Vec<Node>) {
    for (name, step) in STEPS {
        step(nodes);
        trace!(target = "application::render::transform", step = name, "transform applied");
    }
}
