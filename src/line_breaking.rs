use tracing::trace;

use crate::list::{NodeList, NodeRef};
use crate::nodes::{GlueNode, GlueOrder, GlueSubtype, Node, PenaltyNode};
use crate::packaging::{hpack_to_with_end, vpack};
use crate::scaled::{GlueRatio, ScaledPoint, FACTOR};

/// Penalties at or above this value forbid a break.
pub const INF_PENALTY: i32 = 10_000;
/// Penalties at or below this value force a break.
pub const EJECT_PENALTY: i32 = -INF_PENALTY;

/// Controls the line breaking algorithm.
#[derive(Debug, Clone)]
pub struct LinebreakSettings {
    /// Target line width.
    pub hsize: ScaledPoint,
    /// Minimum baseline-to-baseline distance between consecutive lines.
    pub line_height: ScaledPoint,
    /// Penalty charged when a break is taken at a discretionary.
    pub hyphen_penalty: i32,
    /// Extra demerits when two consecutive lines both end at discretionaries.
    pub double_hyphen_demerits: i64,
    /// Demerits when the fitness classes of adjacent lines differ by more
    /// than one.
    pub fitness_demerits: i64,
    /// Upper bound on the adjustment ratio at which a break is feasible.
    pub tolerance: f64,
}

impl Default for LinebreakSettings {
    fn default() -> Self {
        Self {
            hsize: ScaledPoint(0),
            line_height: ScaledPoint(0),
            hyphen_penalty: 50,
            double_hyphen_demerits: 3000,
            fitness_demerits: 100,
            tolerance: f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BreakId(usize);

/// Running totals of the material scanned so far. Stretch at each infinite
/// order accumulates separately; shrink is always finite.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RunningSums {
    width: ScaledPoint,
    stretch: ScaledPoint,
    shrink: ScaledPoint,
    stretch_fil: ScaledPoint,
    stretch_fill: ScaledPoint,
    stretch_filll: ScaledPoint,
}

impl RunningSums {
    fn add_glue(&mut self, glue: &GlueNode) {
        self.width += glue.width;
        self.shrink += glue.shrink;
        match glue.stretch_order {
            GlueOrder::Normal => self.stretch += glue.stretch,
            GlueOrder::Fil => self.stretch_fil += glue.stretch,
            GlueOrder::Fill => self.stretch_fill += glue.stretch,
            GlueOrder::Filll => self.stretch_filll += glue.stretch,
        }
    }

    fn has_infinite_stretch(&self) -> bool {
        self.stretch_fil > ScaledPoint(0)
            || self.stretch_fill > ScaledPoint(0)
            || self.stretch_filll > ScaledPoint(0)
    }
}

/// A feasible break, together with the state needed to extend the line
/// chain past it.
#[derive(Debug, Clone)]
pub struct Breakpoint {
    /// The item at which the break occurs; the paragraph head for the
    /// synthetic start record.
    pub position: NodeRef,
    /// Items spliced in before the line end when this break is taken (a
    /// discretionary's pre text).
    pub pre: Vec<Node>,
    /// 1-based index of the line ending here; 0 for the start record.
    pub line: usize,
    /// Fitness class of that line: 0 tight, 1 decent, 2 loose, 3 very loose.
    pub fitness: usize,
    /// Natural width of the material before the break, for reporting.
    pub width: ScaledPoint,
    /// Adjustment ratio of the line ending here.
    pub ratio: GlueRatio,
    /// Demerits accumulated from the paragraph start to this break.
    pub demerits: i64,
    sums: RunningSums,
    from: Option<BreakId>,
    next: Option<BreakId>,
}

struct Linebreaker<'a> {
    breaks: Vec<Breakpoint>,
    active_head: Option<BreakId>,
    inactive_head: Option<BreakId>,
    sums: RunningSums,
    settings: &'a LinebreakSettings,
}

fn fitness_class(r: GlueRatio) -> usize {
    if r < -0.5 {
        0
    } else if r <= 0.5 {
        1
    } else if r <= 1.0 {
        2
    } else {
        3
    }
}

impl<'a> Linebreaker<'a> {
    fn new(settings: &'a LinebreakSettings, head: NodeRef) -> Self {
        let seed = Breakpoint {
            position: head,
            pre: Vec::new(),
            line: 0,
            fitness: 1,
            width: ScaledPoint(0),
            ratio: 0.0,
            demerits: 0,
            sums: RunningSums::default(),
            from: None,
            next: None,
        };
        Self {
            breaks: vec![seed],
            active_head: Some(BreakId(0)),
            inactive_head: None,
            sums: RunningSums::default(),
            settings,
        }
    }

    /// The adjustment ratio of the line from the active break `a` to the
    /// candidate break at `n`.
    fn adjustment_ratio(&self, nodes: &NodeList, n: NodeRef, a: &Breakpoint) -> GlueRatio {
        let mut line_width = self.sums.width - a.sums.width;
        match nodes.node(n) {
            Node::Penalty(penalty) => line_width += penalty.width,
            Node::Disc(disc) => line_width += disc.pre.iter().map(Node::width).sum::<ScaledPoint>(),
            _ => {}
        }
        let hsize = self.settings.hsize;
        if line_width < hsize {
            if self.sums.has_infinite_stretch() {
                return 0.0;
            }
            let stretch = self.sums.stretch - a.sums.stretch;
            if stretch > ScaledPoint(0) {
                (hsize - line_width).0 as f64 / stretch.0 as f64
            } else {
                f64::INFINITY
            }
        } else if line_width > hsize {
            let shrink = self.sums.shrink - a.sums.shrink;
            if shrink > ScaledPoint(0) {
                (hsize - line_width).0 as f64 / shrink.0 as f64
            } else {
                f64::INFINITY
            }
        } else {
            0.0
        }
    }

    /// The running totals just past a break at `n`: discardable glue and
    /// penalties after the break belong to no line. The scan stops at the
    /// first box-like item or forced break.
    fn sums_after_break(&self, nodes: &NodeList, n: NodeRef) -> RunningSums {
        let mut sums = self.sums;
        let mut e = Some(n);
        while let Some(r) = e {
            match nodes.node(r) {
                Node::Glue(glue) => sums.add_glue(glue),
                Node::Penalty(penalty) => {
                    if penalty.penalty <= EJECT_PENALTY && r != n {
                        break;
                    }
                }
                _ => break,
            }
            e = nodes.next(r);
        }
        sums
    }

    /// Processes the legal break at `n` against every active breakpoint,
    /// deactivating the ones it puts out of reach and recording the best
    /// feasible predecessor per fitness class.
    fn main_loop(&mut self, nodes: &NodeList, n: NodeRef) {
        let mut active = self.active_head;
        let mut preva: Option<BreakId> = None;
        let forced = matches!(
            nodes.node(n),
            Node::Penalty(p) if p.penalty <= EJECT_PENALTY
        );

        while active.is_some() {
            let mut dmin = i64::MAX;
            let mut best = [i64::MAX; 4];
            let mut best_from: [Option<BreakId>; 4] = [None; 4];
            let mut best_ratio = [0.0; 4];

            while let Some(a) = active {
                let next_active = self.breaks[a.0].next;
                let r = self.adjustment_ratio(nodes, n, &self.breaks[a.0]);
                if r < -1.0 || forced {
                    // The line has grown too wide to ever shrink onto the
                    // measure, or the break is mandatory: this record can no
                    // longer be extended.
                    match preva {
                        None => self.active_head = next_active,
                        Some(p) => self.breaks[p.0].next = next_active,
                    }
                    self.breaks[a.0].next = self.inactive_head;
                    self.inactive_head = Some(a);
                } else {
                    preva = Some(a);
                }
                if r >= -1.0 && r < self.settings.tolerance {
                    let badness = 100.0 * r.abs().powi(3);
                    let beta = (1.0 + badness).powi(2) as i64;
                    let penalty = match nodes.node(n) {
                        Node::Penalty(p) => p.penalty,
                        Node::Disc(d) => self.settings.hyphen_penalty + d.penalty,
                        _ => 0,
                    };
                    let mut demerits = if penalty >= 0 {
                        beta.saturating_add((penalty as i64).pow(2))
                    } else if penalty > EJECT_PENALTY {
                        beta.saturating_sub((penalty as i64).pow(2))
                    } else {
                        beta
                    };
                    // Two hyphenated lines in a row: only an actual
                    // discretionary counts, whatever a penalty's flag says.
                    if matches!(nodes.node(n), Node::Disc(_))
                        && matches!(nodes.node(self.breaks[a.0].position), Node::Disc(_))
                    {
                        demerits = demerits.saturating_add(self.settings.double_hyphen_demerits);
                    }
                    let class = fitness_class(r);
                    if class.abs_diff(self.breaks[a.0].fitness) > 1 {
                        demerits = demerits.saturating_add(self.settings.fitness_demerits);
                    }
                    demerits = demerits.saturating_add(self.breaks[a.0].demerits);
                    if demerits < best[class] {
                        trace!(class, demerits, ratio = r, "feasible break");
                        best[class] = demerits;
                        best_from[class] = Some(a);
                        best_ratio[class] = r;
                        if demerits < dmin {
                            dmin = demerits;
                        }
                    }
                }
                let line = self.breaks[a.0].line + 1;
                active = next_active;
                if let Some(na) = active {
                    if line <= self.breaks[na.0].line {
                        // Records further down close lines with higher
                        // indices; settle this batch of class bests first.
                        break;
                    }
                }
            }

            if dmin < i64::MAX {
                let sums = self.sums_after_break(nodes, n);
                let mut width = self.sums.width;
                let mut pre = Vec::new();
                match nodes.node(n) {
                    Node::Penalty(penalty) => width += penalty.width,
                    Node::Disc(disc) => {
                        width += FACTOR * 5;
                        pre = disc.pre.clone();
                    }
                    _ => {}
                }
                let bound = dmin.saturating_add(self.settings.fitness_demerits);
                for class in 0..4 {
                    if best[class] > bound {
                        continue;
                    }
                    let Some(from) = best_from[class] else {
                        continue;
                    };
                    let line = self.breaks[from.0].line + 1;
                    trace!(line, class, demerits = best[class], "new active breakpoint");
                    let id = BreakId(self.breaks.len());
                    self.breaks.push(Breakpoint {
                        position: n,
                        pre: pre.clone(),
                        line,
                        fitness: class,
                        width,
                        ratio: best_ratio[class],
                        demerits: best[class],
                        sums,
                        from: Some(from),
                        next: active,
                    });
                    match preva {
                        None => self.active_head = Some(id),
                        Some(p) => self.breaks[p.0].next = Some(id),
                    }
                    preva = Some(id);
                }
            }
        }
    }

    /// The record with the fewest demerits on the chain starting at `head`;
    /// earlier records win ties.
    fn fewest_demerits(&self, head: Option<BreakId>) -> Option<BreakId> {
        let mut fewest: Option<BreakId> = None;
        let mut e = head;
        while let Some(id) = e {
            if fewest.map_or(true, |f| self.breaks[id.0].demerits < self.breaks[f.0].demerits) {
                fewest = Some(id);
            }
            e = self.breaks[id.0].next;
        }
        fewest
    }
}

/// Breaks the list starting at `head` into justified lines.
///
/// Returns the vertical list holding the packed lines interleaved with
/// inter-line glue, and the chosen breakpoints in paragraph order (the
/// synthetic start record first). An empty paragraph yields no vertical
/// list and no breakpoints. Glue on the chosen lines is resolved in place;
/// the caller must not rely on item linkage across this call.
pub fn linebreak(
    nodes: &mut NodeList,
    head: Option<NodeRef>,
    settings: &LinebreakSettings,
) -> (Option<NodeRef>, Vec<Breakpoint>) {
    let Some(head) = head else {
        return (None, Vec::new());
    };

    let mut lb = Linebreaker::new(settings, head);

    // Scan the paragraph, trying every legal breakpoint: a glue directly
    // after a box, a non-forbidden penalty, or a discretionary.
    let mut prev_item_box = false;
    let mut end_node = head;
    let mut e = Some(head);
    while let Some(r) = e {
        match nodes.node(r) {
            Node::Glue(glue) => {
                if prev_item_box {
                    lb.main_loop(nodes, r);
                }
                lb.sums.add_glue(glue);
                prev_item_box = false;
            }
            Node::Penalty(penalty) => {
                prev_item_box = false;
                if penalty.penalty < INF_PENALTY {
                    lb.main_loop(nodes, r);
                }
            }
            Node::Disc(_) => {
                prev_item_box = false;
                lb.main_loop(nodes, r);
            }
            node => {
                prev_item_box = true;
                lb.sums.width += node.width();
            }
        }
        end_node = r;
        e = nodes.next(r);
    }

    // The paragraph may end at several competing records; without a
    // looseness target the one with the fewest demerits wins. When nothing
    // stayed active the paragraph is overfull and the best deactivated
    // record is used instead.
    let chosen = lb
        .fewest_demerits(lb.active_head)
        .or_else(|| lb.fewest_demerits(lb.inactive_head));
    let Some(chosen) = chosen else {
        return (None, Vec::new());
    };

    let mut chain = Vec::new();
    let mut q = Some(chosen);
    while let Some(id) = q {
        chain.push(id);
        q = lb.breaks[id.0].from;
    }
    chain.reverse();

    // Package each line: from the paragraph head (line 1) or the successor
    // of the opening break, up to the item before the closing break, with
    // the closing discretionary's pre text and a tagged line-end glue
    // spliced in front of the line end.
    let mut vlist_head: Option<NodeRef> = None;
    let mut vlist_tail: Option<NodeRef> = None;
    let mut prev_line_extent: Option<ScaledPoint> = None;

    for (i, &id) in chain.iter().enumerate() {
        if i > 0 && nodes.next(lb.breaks[id.0].position).is_none() {
            // The closing break of the previous line was the last item;
            // there is no further material.
            break;
        }
        let closing = chain.get(i + 1).map(|&c| lb.breaks[c.0].position);
        let last_item = match closing {
            Some(position) => nodes.prev(position),
            None => Some(end_node),
        };
        let Some(mut last_item) = last_item else {
            continue;
        };

        if let Some(&c) = chain.get(i + 1) {
            for node in lb.breaks[c.0].pre.clone() {
                let pre_ref = nodes.push(node);
                nodes.insert_after(Some(head), Some(last_item), pre_ref);
                last_item = pre_ref;
            }
        }
        let line_end = nodes.push(Node::Glue(GlueNode {
            subtype: GlueSubtype::LineEnd,
            ..GlueNode::new()
        }));
        nodes.insert_after(Some(head), Some(last_item), line_end);
        last_item = line_end;

        let first = if i == 0 {
            head
        } else {
            match nodes.next(lb.breaks[id.0].position) {
                Some(first) => first,
                None => break,
            }
        };

        let line = hpack_to_with_end(nodes, first, last_item, settings.hsize);
        let extent = line.height + line.depth;
        let line_ref = nodes.push(Node::HList(line));

        if let Some(prev_extent) = prev_line_extent {
            let mut skip = GlueNode::new();
            if prev_extent < settings.line_height {
                skip.width = settings.line_height - prev_extent;
            }
            let skip_ref = nodes.push(Node::Glue(skip));
            vlist_head = Some(nodes.insert_after(vlist_head, vlist_tail, skip_ref));
            vlist_tail = Some(skip_ref);
        }
        vlist_head = Some(nodes.insert_after(vlist_head, vlist_tail, line_ref));
        vlist_tail = Some(line_ref);
        prev_line_extent = Some(extent);
    }

    let vbox = vpack(nodes, vlist_head);
    let vbox_ref = nodes.push(Node::VList(vbox));

    let breakpoints = chain.iter().map(|&id| lb.breaks[id.0].clone()).collect();
    (Some(vbox_ref), breakpoints)
}

/// Appends the forced paragraph ending after `n` (normally the list tail):
/// an unbreakable penalty, a glue with first-order infinite stretch to fill
/// the last line, and a forced break.
pub fn append_line_end_after(nodes: &mut NodeList, n: NodeRef) {
    let forbid = nodes.push(Node::Penalty(PenaltyNode::new(INF_PENALTY)));
    nodes.insert_after(Some(n), Some(n), forbid);
    let fill = nodes.push(Node::Glue(GlueNode {
        stretch: FACTOR,
        stretch_order: GlueOrder::Fil,
        ..GlueNode::new()
    }));
    nodes.insert_after(Some(n), Some(forbid), fill);
    let force = nodes.push(Node::Penalty(PenaltyNode::new(EJECT_PENALTY)));
    nodes.insert_after(Some(n), Some(fill), force);
}
