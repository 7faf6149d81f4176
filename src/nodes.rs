use tracing::warn;

use crate::list::NodeRef;
use crate::scaled::{GlueRatio, ScaledPoint};

/// A typographic item.
///
/// Boxes (glyphs, rules, boxed lists, images, kerns) are rigid; glue is
/// flexible inter-item space; penalties and discretionaries mark places
/// where a line may or may not end. `Whatsit` is an opaque extension item
/// without geometry of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Glyph(GlyphNode),
    Rule(RuleNode),
    HList(HlistNode),
    VList(VlistNode),
    Image(ImageNode),
    Kern(KernNode),
    Glue(GlueNode),
    Penalty(PenaltyNode),
    Disc(DiscNode),
    Whatsit(WhatsitNode),
}

impl Node {
    /// Width contribution of this item in a horizontal list.
    pub fn width(&self) -> ScaledPoint {
        match self {
            Node::Glyph(glyph) => glyph.width,
            Node::Rule(rule) => rule.width,
            Node::HList(hlist) => hlist.width,
            Node::VList(vlist) => vlist.width,
            Node::Image(image) => image.width,
            Node::Kern(kern) => kern.kern,
            Node::Glue(glue) => glue.width,
            Node::Penalty(penalty) => penalty.width,
            Node::Disc(_) => ScaledPoint(0),
            Node::Whatsit(_) => {
                warn!("whatsit has no width; treating as zero");
                ScaledPoint(0)
            }
        }
    }

    /// Vertical advance of this item in a vertical list.
    pub fn height(&self) -> ScaledPoint {
        match self {
            Node::Glyph(glyph) => glyph.height + glyph.depth,
            Node::HList(hlist) => hlist.height + hlist.depth,
            Node::VList(vlist) => vlist.height + vlist.depth,
            Node::Rule(rule) => rule.height,
            Node::Image(image) => image.height,
            Node::Glue(glue) => glue.width,
            Node::Kern(_) | Node::Penalty(_) | Node::Disc(_) => ScaledPoint(0),
            Node::Whatsit(_) => {
                warn!("whatsit has no height; treating as zero");
                ScaledPoint(0)
            }
        }
    }

    pub fn depth(&self) -> ScaledPoint {
        match self {
            Node::Glyph(glyph) => glyph.depth,
            Node::Rule(rule) => rule.depth,
            Node::HList(hlist) => hlist.depth,
            Node::VList(vlist) => vlist.depth,
            _ => ScaledPoint(0),
        }
    }

    /// Whether a glue directly after this item is a legal breakpoint.
    pub fn precedes_break(&self) -> bool {
        !matches!(self, Node::Glue(_) | Node::Penalty(_) | Node::Disc(_))
    }
}

/// A shaped character box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphNode {
    pub character: char,
    pub width: ScaledPoint,
    pub height: ScaledPoint,
    pub depth: ScaledPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleNode {
    pub width: ScaledPoint,
    pub height: ScaledPoint,
    pub depth: ScaledPoint,
}

/// A packaged horizontal list.
///
/// `glue_set` is the adjustment ratio the packager applied to the contained
/// glue, kept for diagnostics; `badness` scores how well the material fit
/// the target width.
#[derive(Debug, Clone, PartialEq)]
pub struct HlistNode {
    pub width: ScaledPoint,
    pub height: ScaledPoint,
    pub depth: ScaledPoint,
    pub glue_set: GlueRatio,
    pub badness: i32,
    pub list: Option<NodeRef>,
}

/// A packaged vertical list.
#[derive(Debug, Clone, PartialEq)]
pub struct VlistNode {
    pub width: ScaledPoint,
    pub height: ScaledPoint,
    pub depth: ScaledPoint,
    pub list: Option<NodeRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNode {
    pub width: ScaledPoint,
    pub height: ScaledPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernNode {
    pub kern: ScaledPoint,
}

/// Stretch and shrink strengths of glue. Any amount at a higher order
/// dominates all amounts at lower orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum GlueOrder {
    #[default]
    Normal,
    Fil,
    Fill,
    Filll,
}

impl GlueOrder {
    pub fn index(self) -> usize {
        match self {
            GlueOrder::Normal => 0,
            GlueOrder::Fil => 1,
            GlueOrder::Fill => 2,
            GlueOrder::Filll => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlueSubtype {
    #[default]
    Normal,
    /// Marks the sentinel glue appended to each packaged line.
    LineEnd,
}

/// Flexible space with a natural width, stretchability and shrinkability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlueNode {
    pub width: ScaledPoint,
    pub stretch: ScaledPoint,
    pub shrink: ScaledPoint,
    pub stretch_order: GlueOrder,
    pub shrink_order: GlueOrder,
    pub subtype: GlueSubtype,
}

impl GlueNode {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A preference for or against breaking at this point. Values at or above
/// `INF_PENALTY` forbid the break, values at or below `EJECT_PENALTY` force
/// it. `width` counts toward the line only when the break is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyNode {
    pub penalty: i32,
    pub width: ScaledPoint,
    /// Set when the penalty stands for a hyphenation point.
    pub flagged: bool,
}

impl PenaltyNode {
    pub fn new(penalty: i32) -> Self {
        Self {
            penalty,
            width: ScaledPoint(0),
            flagged: false,
        }
    }
}

/// A discretionary break: `pre` is spliced in before the line end when the
/// break is taken (typically a hyphen). `penalty` is added on top of the
/// hyphen penalty of the paragraph settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscNode {
    pub pre: Vec<Node>,
    pub penalty: i32,
}

impl DiscNode {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An opaque extension item. The breaker passes it through untouched; the
/// measurement helpers treat it as having no extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WhatsitNode;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaled::FACTOR;

    #[test]
    fn box_like_items_precede_breaks() {
        assert!(Node::Glyph(GlyphNode {
            character: 'a',
            width: FACTOR,
            height: FACTOR,
            depth: ScaledPoint(0),
        })
        .precedes_break());
        assert!(Node::Kern(KernNode { kern: FACTOR }).precedes_break());
        assert!(Node::Whatsit(WhatsitNode).precedes_break());
        assert!(!Node::Glue(GlueNode::new()).precedes_break());
        assert!(!Node::Penalty(PenaltyNode::new(0)).precedes_break());
        assert!(!Node::Disc(DiscNode::new()).precedes_break());
    }

    #[test]
    fn opaque_items_have_no_extent() {
        let whatsit = Node::Whatsit(WhatsitNode);
        assert_eq!(whatsit.width(), ScaledPoint(0));
        assert_eq!(whatsit.height(), ScaledPoint(0));
        assert_eq!(whatsit.depth(), ScaledPoint(0));
    }

    #[test]
    fn glue_orders_are_ranked() {
        assert!(GlueOrder::Normal < GlueOrder::Fil);
        assert!(GlueOrder::Fil < GlueOrder::Fill);
        assert!(GlueOrder::Fill < GlueOrder::Filll);
        assert_eq!(GlueOrder::Filll.index(), 3);
    }
}
