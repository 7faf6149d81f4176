use crate::list::{NodeList, NodeRef};
use crate::nodes::{GlueOrder, HlistNode, Node, VlistNode};
use crate::scaled::{badness, ScaledPoint};

/// Badness of a line whose material cannot shrink to the target width.
pub const OVERFULL_BAD: i32 = 1_000_000;

/// Package the list starting at `head` at its natural width.
pub fn hpack(nodes: &NodeList, head: Option<NodeRef>) -> HlistNode {
    let mut width = ScaledPoint(0);
    let mut height = ScaledPoint(0);
    let mut depth = ScaledPoint(0);
    for r in nodes.iter(head) {
        let node = nodes.node(r);
        width += node.width();
        let extent = match node {
            Node::Glyph(glyph) => Some((glyph.height, glyph.depth)),
            Node::Rule(rule) => Some((rule.height, rule.depth)),
            Node::HList(hlist) => Some((hlist.height, hlist.depth)),
            Node::VList(vlist) => Some((vlist.height, vlist.depth)),
            Node::Image(image) => Some((image.height, ScaledPoint(0))),
            _ => None,
        };
        if let Some((h, d)) = extent {
            if h > height {
                height = h;
            }
            if d > depth {
                depth = d;
            }
        }
    }
    HlistNode {
        width,
        height,
        depth,
        glue_set: 0.0,
        badness: 0,
        list: head,
    }
}

/// Package the list starting at `head` to the given width.
pub fn hpack_to(nodes: &mut NodeList, head: NodeRef, width: ScaledPoint) -> HlistNode {
    let last = nodes.tail(head);
    hpack_to_with_end(nodes, head, last, width)
}

/// Package the sub-list `[first..=last]` to the given width, resolving its
/// glue.
///
/// The sub-list is detached from whatever follows `last`. An adjustment
/// ratio is computed across the highest stretch (or shrink) order present;
/// every glue at that order is widened (or narrowed) accordingly and its
/// flexibility zeroed. The returned box reports the target width regardless
/// of how well the material fit; the quality of the fit is in `badness`.
pub fn hpack_to_with_end(
    nodes: &mut NodeList,
    first: NodeRef,
    last: NodeRef,
    width: ScaledPoint,
) -> HlistNode {
    let mut glues = Vec::new();
    let mut glue_width = ScaledPoint(0);
    let mut non_glue_width = ScaledPoint(0);
    let mut max_height = ScaledPoint(0);
    let mut max_depth = ScaledPoint(0);
    let mut total_stretch = [ScaledPoint(0); 4];
    let mut total_shrink = [ScaledPoint(0); 4];

    let mut e = Some(first);
    while let Some(r) = e {
        match nodes.node(r) {
            Node::Glue(glue) => {
                glue_width += glue.width;
                total_stretch[glue.stretch_order.index()] += glue.stretch;
                total_shrink[glue.shrink_order.index()] += glue.shrink;
                glues.push(r);
            }
            Node::Glyph(glyph) => {
                non_glue_width += glyph.width;
                if glyph.height > max_height {
                    max_height = glyph.height;
                }
                if glyph.depth > max_depth {
                    max_depth = glyph.depth;
                }
            }
            Node::Rule(rule) => {
                non_glue_width += rule.width;
                if rule.height > max_height {
                    max_height = rule.height;
                }
                if rule.depth > max_depth {
                    max_depth = rule.depth;
                }
            }
            Node::Image(image) => {
                non_glue_width += image.width;
                if image.height > max_height {
                    max_height = image.height;
                }
            }
            Node::HList(hlist) => {
                non_glue_width += hlist.width;
                if hlist.height > max_height {
                    max_height = hlist.height;
                }
                if hlist.depth > max_depth {
                    max_depth = hlist.depth;
                }
            }
            Node::VList(vlist) => {
                non_glue_width += vlist.width;
                if vlist.height > max_height {
                    max_height = vlist.height;
                }
                if vlist.depth > max_depth {
                    max_depth = vlist.depth;
                }
            }
            node => {
                non_glue_width += node.width();
            }
        }
        if r == last {
            nodes.cut_after(r);
            break;
        }
        e = nodes.next(r);
    }
    let natural_width = glue_width + non_glue_width;

    // The highest order with any flexibility is the only one that
    // participates in the adjustment.
    let mut highest_stretch = GlueOrder::Normal;
    let mut stretchability = total_stretch[0];
    let mut highest_shrink = GlueOrder::Normal;
    let mut shrinkability = total_shrink[0];
    for order in [GlueOrder::Filll, GlueOrder::Fill, GlueOrder::Fil] {
        if total_stretch[order.index()] != ScaledPoint(0) && highest_stretch < order {
            highest_stretch = order;
            stretchability = total_stretch[order.index()];
        }
        if total_shrink[order.index()] != ScaledPoint(0) && highest_shrink < order {
            highest_shrink = order;
            shrinkability = total_shrink[order.index()];
        }
    }

    let (glue_set, line_badness) = if width == natural_width {
        (1.0, 0)
    } else if natural_width < width {
        let r = (width - natural_width).0 as f64 / stretchability.0 as f64;
        let b = if highest_stretch != GlueOrder::Normal {
            0
        } else {
            badness(r)
        };
        (r, b)
    } else {
        let r = (width - natural_width).0 as f64 / shrinkability.0 as f64;
        let b = if highest_shrink != GlueOrder::Normal {
            0
        } else if r < -1.0 {
            OVERFULL_BAD
        } else {
            badness(r)
        };
        (r, b)
    };

    for r in glues {
        if let Node::Glue(glue) = nodes.node_mut(r) {
            if glue_set >= 0.0 && glue.stretch_order == highest_stretch {
                glue.width += ScaledPoint((glue_set * glue.stretch.0 as f64) as i64);
            } else if (-1.0..=0.0).contains(&glue_set) && glue.shrink_order == highest_shrink {
                glue.width += ScaledPoint((glue_set * glue.shrink.0 as f64) as i64);
            }
            glue.stretch = ScaledPoint(0);
            glue.shrink = ScaledPoint(0);
        }
    }

    HlistNode {
        width,
        height: max_height,
        depth: max_depth,
        glue_set,
        badness: line_badness,
        list: Some(first),
    }
}

/// Package the list starting at `head` into a vertical box at its natural
/// size.
pub fn vpack(nodes: &NodeList, head: Option<NodeRef>) -> VlistNode {
    let mut total_height = ScaledPoint(0);
    let mut max_width = ScaledPoint(0);
    let mut last = None;
    for r in nodes.iter(head) {
        let node = nodes.node(r);
        total_height += node.height();
        if node.width() > max_width {
            max_width = node.width();
        }
        last = Some(r);
    }
    let depth = last.map_or(ScaledPoint(0), |r| nodes.node(r).depth());
    VlistNode {
        width: max_width,
        height: total_height - depth,
        depth,
        list: head,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{GlueNode, GlueOrder, GlyphNode, PenaltyNode};
    use crate::scaled::FACTOR;

    fn pt(value: i64) -> ScaledPoint {
        FACTOR * value
    }

    fn glyph(width: i64) -> Node {
        Node::Glyph(GlyphNode {
            character: 'x',
            width: pt(width),
            height: pt(10),
            depth: pt(2),
        })
    }

    fn glue(width: i64, stretch: i64, shrink: i64) -> Node {
        Node::Glue(GlueNode {
            width: pt(width),
            stretch: pt(stretch),
            shrink: pt(shrink),
            ..GlueNode::new()
        })
    }

    fn build(nodes: &mut NodeList, items: Vec<Node>) -> NodeRef {
        let mut head = None;
        let mut cur = None;
        for item in items {
            let r = nodes.push(item);
            head = Some(nodes.insert_after(head, cur, r));
            cur = Some(r);
        }
        head.unwrap()
    }

    fn glue_widths(nodes: &NodeList, head: NodeRef) -> Vec<ScaledPoint> {
        nodes
            .iter(Some(head))
            .filter_map(|r| match nodes.node(r) {
                Node::Glue(g) => Some(g.width),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn natural_packaging_sums_and_maximizes() {
        let mut nodes = NodeList::new();
        let head = build(
            &mut nodes,
            vec![
                glyph(10),
                glue(5, 2, 1),
                glyph(10),
                Node::Penalty(PenaltyNode {
                    penalty: 0,
                    width: pt(3),
                    flagged: false,
                }),
            ],
        );
        let hbox = hpack(&nodes, Some(head));
        assert_eq!(hbox.width, pt(28));
        assert_eq!(hbox.height, pt(10));
        assert_eq!(hbox.depth, pt(2));
        assert_eq!(hbox.badness, 0);
    }

    #[test]
    fn natural_width_is_perfectly_set() {
        let mut nodes = NodeList::new();
        let head = build(&mut nodes, vec![glyph(10), glue(5, 2, 1), glyph(10)]);
        let hbox = hpack_to(&mut nodes, head, pt(25));
        assert_eq!(hbox.width, pt(25));
        assert_eq!(hbox.badness, 0);
        // A line at its natural width records the unit glue set, which
        // stretches participating glue by its stretchability.
        assert_eq!(hbox.glue_set, 1.0);
        assert_eq!(glue_widths(&nodes, head), vec![pt(7)]);
        let glue_node = nodes.iter(Some(head)).nth(1).unwrap();
        assert!(matches!(
            nodes.node(glue_node),
            Node::Glue(g) if g.stretch == ScaledPoint(0) && g.shrink == ScaledPoint(0)
        ));
    }

    #[test]
    fn stretched_line_gets_cubic_badness() {
        let mut nodes = NodeList::new();
        let head = build(&mut nodes, vec![glyph(10), glue(5, 2, 1), glyph(10)]);
        let hbox = hpack_to(&mut nodes, head, pt(30));
        assert_eq!(hbox.width, pt(30));
        assert_eq!(hbox.glue_set, 2.5);
        assert_eq!(hbox.badness, 1563);
        assert_eq!(glue_widths(&nodes, head), vec![pt(10)]);
    }

    #[test]
    fn shrunk_line_at_the_limit() {
        let mut nodes = NodeList::new();
        let head = build(&mut nodes, vec![glyph(10), glue(5, 2, 1), glyph(10)]);
        let hbox = hpack_to(&mut nodes, head, pt(24));
        assert_eq!(hbox.glue_set, -1.0);
        assert_eq!(hbox.badness, 100);
        assert_eq!(glue_widths(&nodes, head), vec![pt(4)]);
    }

    #[test]
    fn overfull_line_is_flagged() {
        let mut nodes = NodeList::new();
        let head = build(&mut nodes, vec![glyph(10), glue(5, 2, 1), glyph(10)]);
        let hbox = hpack_to(&mut nodes, head, pt(20));
        assert_eq!(hbox.width, pt(20));
        assert_eq!(hbox.badness, OVERFULL_BAD);
        // Glue narrower than its shrinkability allows is left at its
        // natural width.
        assert_eq!(glue_widths(&nodes, head), vec![pt(5)]);
    }

    #[test]
    fn infinite_stretch_absorbs_the_slack() {
        let mut nodes = NodeList::new();
        let head = build(
            &mut nodes,
            vec![
                glyph(10),
                Node::Glue(GlueNode {
                    stretch: FACTOR,
                    stretch_order: GlueOrder::Fil,
                    ..GlueNode::new()
                }),
                glue(5, 2, 1),
            ],
        );
        let hbox = hpack_to(&mut nodes, head, pt(25));
        assert_eq!(hbox.badness, 0);
        assert_eq!(hbox.glue_set, 10.0);
        // Only the fil glue participates.
        assert_eq!(glue_widths(&nodes, head), vec![pt(10), pt(5)]);
    }

    #[test]
    fn nested_boxes_contribute_height_and_depth() {
        let mut nodes = NodeList::new();
        let inner = HlistNode {
            width: pt(5),
            height: pt(20),
            depth: pt(4),
            glue_set: 0.0,
            badness: 0,
            list: None,
        };
        let head = build(
            &mut nodes,
            vec![glyph(10), Node::HList(inner), glue(5, 2, 1)],
        );
        let hbox = hpack_to(&mut nodes, head, pt(20));
        assert_eq!(hbox.width, pt(20));
        assert_eq!(hbox.height, pt(20));
        assert_eq!(hbox.depth, pt(4));
    }

    #[test]
    fn sub_list_is_detached() {
        let mut nodes = NodeList::new();
        let head = build(&mut nodes, vec![glyph(10), glue(5, 2, 1), glyph(10), glyph(7)]);
        let third = nodes.iter(Some(head)).nth(2).unwrap();
        let rest = nodes.next(third).unwrap();
        let hbox = hpack_to_with_end(&mut nodes, head, third, pt(25));
        assert_eq!(hbox.width, pt(25));
        assert_eq!(nodes.next(third), None);
        assert_eq!(nodes.prev(rest), None);
    }

    #[test]
    fn vertical_packaging() {
        let mut nodes = NodeList::new();
        let line = hpack(&nodes, None);
        let first = nodes.push(Node::HList(HlistNode {
            width: pt(25),
            height: pt(10),
            depth: pt(2),
            ..line.clone()
        }));
        let skip = nodes.push(glue(3, 0, 0));
        let second = nodes.push(Node::HList(HlistNode {
            width: pt(20),
            height: pt(8),
            depth: pt(1),
            ..line
        }));
        let head = Some(first);
        let head = Some(nodes.insert_after(head, Some(first), skip));
        let head = Some(nodes.insert_after(head, Some(skip), second));
        let vbox = vpack(&nodes, head);
        assert_eq!(vbox.width, pt(25));
        assert_eq!(vbox.depth, pt(1));
        assert_eq!(vbox.height, pt(12 + 3 + 9 - 1));
    }
}
