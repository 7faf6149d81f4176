//! Optimal paragraph breaking over box-glue-penalty lists.
//!
//! A paragraph arrives as a doubly linked list of typographic items: rigid
//! boxes, flexible glue, penalties and discretionary hyphens. The breaker
//! scans the list once, maintains the set of breakpoints a line could still
//! start from, and picks the chain of breaks with the fewest accumulated
//! demerits. Each chosen line is then packaged horizontally at the target
//! measure with its glue stretched or shrunk into place, and the lines are
//! stacked into a vertical list with a minimum baseline distance.

pub mod line_breaking;
pub mod list;
pub mod nodes;
pub mod packaging;
pub mod scaled;

pub use line_breaking::{
    append_line_end_after, linebreak, Breakpoint, LinebreakSettings, EJECT_PENALTY, INF_PENALTY,
};
pub use list::{NodeList, NodeRef};
pub use nodes::{
    DiscNode, GlueNode, GlueOrder, GlueSubtype, GlyphNode, HlistNode, ImageNode, KernNode, Node,
    PenaltyNode, RuleNode, VlistNode, WhatsitNode,
};
pub use packaging::{hpack, hpack_to, hpack_to_with_end, vpack, OVERFULL_BAD};
pub use scaled::{badness, GlueRatio, ParseUnitError, ScaledPoint, FACTOR, INF_BAD};
