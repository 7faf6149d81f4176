use crate::nodes::Node;
use crate::scaled::ScaledPoint;

/// Stable handle to a node stored in a [`NodeList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(usize);

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    prev: Option<NodeRef>,
    next: Option<NodeRef>,
}

/// An arena of nodes linked into doubly linked lists.
///
/// Nodes are allocated once and addressed through [`NodeRef`] handles;
/// prev/next links are handles as well, so lists can be spliced and split
/// without moving any node. A node is never part of more than one list.
#[derive(Debug, Clone, Default)]
pub struct NodeList {
    slots: Vec<Slot>,
}

impl NodeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node without linking it to anything.
    pub fn push(&mut self, node: Node) -> NodeRef {
        let r = NodeRef(self.slots.len());
        self.slots.push(Slot {
            node,
            prev: None,
            next: None,
        });
        r
    }

    pub fn node(&self, r: NodeRef) -> &Node {
        &self.slots[r.0].node
    }

    pub fn node_mut(&mut self, r: NodeRef) -> &mut Node {
        &mut self.slots[r.0].node
    }

    pub fn next(&self, r: NodeRef) -> Option<NodeRef> {
        self.slots[r.0].next
    }

    pub fn prev(&self, r: NodeRef) -> Option<NodeRef> {
        self.slots[r.0].prev
    }

    /// Insert `insert` directly after `cur`. With no `cur` the inserted node
    /// is a list of its own. Returns the head of the resulting list.
    pub fn insert_after(
        &mut self,
        head: Option<NodeRef>,
        cur: Option<NodeRef>,
        insert: NodeRef,
    ) -> NodeRef {
        let Some(cur) = cur else {
            return insert;
        };
        if let Some(after) = self.slots[cur.0].next {
            self.slots[insert.0].next = Some(after);
            self.slots[after.0].prev = Some(insert);
        }
        self.slots[cur.0].next = Some(insert);
        self.slots[insert.0].prev = Some(cur);
        head.unwrap_or(cur)
    }

    /// Insert `insert` directly before `cur`; with no `cur` (or `cur` at the
    /// head) the inserted node becomes the new head, which is returned.
    pub fn insert_before(
        &mut self,
        head: Option<NodeRef>,
        cur: Option<NodeRef>,
        insert: NodeRef,
    ) -> NodeRef {
        let Some(head) = head else {
            return insert;
        };
        match cur {
            Some(cur) if cur != head => {
                if let Some(before) = self.slots[cur.0].prev {
                    self.slots[before.0].next = Some(insert);
                    self.slots[insert.0].prev = Some(before);
                }
                self.slots[cur.0].prev = Some(insert);
                self.slots[insert.0].next = Some(cur);
                head
            }
            _ => {
                self.slots[insert.0].next = Some(head);
                self.slots[head.0].prev = Some(insert);
                insert
            }
        }
    }

    /// The last node of the list starting at `head`.
    pub fn tail(&self, head: NodeRef) -> NodeRef {
        let mut e = head;
        while let Some(next) = self.slots[e.0].next {
            e = next;
        }
        e
    }

    /// Deep-copy the list starting at `head`; returns the head of the copy.
    pub fn copy_list(&mut self, head: Option<NodeRef>) -> Option<NodeRef> {
        let head = head?;
        let node = self.slots[head.0].node.clone();
        let copied = self.push(node);
        let mut tail = copied;
        let mut e = self.slots[head.0].next;
        while let Some(r) = e {
            let node = self.slots[r.0].node.clone();
            let c = self.push(node);
            self.slots[tail.0].next = Some(c);
            self.slots[c.0].prev = Some(tail);
            tail = c;
            e = self.slots[r.0].next;
        }
        Some(copied)
    }

    /// Total width of the list starting at `head`.
    pub fn dimensions(&self, head: Option<NodeRef>) -> ScaledPoint {
        self.iter(head).map(|r| self.node(r).width()).sum()
    }

    /// Number of nodes in the list starting at `head`.
    pub fn len(&self, head: Option<NodeRef>) -> usize {
        self.iter(head).count()
    }

    /// Split the list after `last`: whatever follows becomes a list of its
    /// own and `last` becomes a list end.
    pub fn cut_after(&mut self, last: NodeRef) {
        if let Some(next) = self.slots[last.0].next.take() {
            self.slots[next.0].prev = None;
        }
    }

    /// Iterate over the node handles of the list starting at `head`.
    pub fn iter(&self, head: Option<NodeRef>) -> impl Iterator<Item = NodeRef> + '_ {
        std::iter::successors(head, move |&r| self.next(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{GlueNode, GlyphNode, Node};
    use crate::scaled::FACTOR;

    fn glyph(character: char, width: i64) -> Node {
        Node::Glyph(GlyphNode {
            character,
            width: FACTOR * width,
            height: FACTOR * 10,
            depth: FACTOR * 2,
        })
    }

    fn build(list: &mut NodeList, items: Vec<Node>) -> Option<NodeRef> {
        let mut head = None;
        let mut cur = None;
        for item in items {
            let r = list.push(item);
            head = Some(list.insert_after(head, cur, r));
            cur = Some(r);
        }
        head
    }

    fn characters(list: &NodeList, head: Option<NodeRef>) -> String {
        list.iter(head)
            .filter_map(|r| match list.node(r) {
                Node::Glyph(g) => Some(g.character),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn insert_after_builds_a_list() {
        let mut list = NodeList::new();
        let head = build(&mut list, vec![glyph('a', 1), glyph('b', 2), glyph('c', 3)]);
        assert_eq!(characters(&list, head), "abc");
        assert_eq!(list.len(head), 3);

        let tail = list.tail(head.unwrap());
        assert_eq!(list.next(tail), None);
        assert!(matches!(list.node(tail), Node::Glyph(g) if g.character == 'c'));
    }

    #[test]
    fn insert_after_in_the_middle() {
        let mut list = NodeList::new();
        let head = build(&mut list, vec![glyph('a', 1), glyph('c', 3)]);
        let b = list.push(glyph('b', 2));
        let head = Some(list.insert_after(head, head, b));
        assert_eq!(characters(&list, head), "abc");
        assert_eq!(list.prev(b), head);
    }

    #[test]
    fn insert_before_head_and_middle() {
        let mut list = NodeList::new();
        let head = build(&mut list, vec![glyph('b', 2), glyph('d', 4)]);
        let a = list.push(glyph('a', 1));
        let head = Some(list.insert_before(head, head, a));
        assert_eq!(characters(&list, head), "abd");

        let d = list.tail(head.unwrap());
        let c = list.push(glyph('c', 3));
        let head = Some(list.insert_before(head, Some(d), c));
        assert_eq!(characters(&list, head), "abcd");
    }

    #[test]
    fn copy_is_deep() {
        let mut list = NodeList::new();
        let head = build(&mut list, vec![glyph('a', 1), Node::Glue(GlueNode::new())]);
        let copy = list.copy_list(head);
        assert_eq!(characters(&list, copy), "a");
        assert_eq!(list.len(copy), 2);

        if let Node::Glyph(g) = list.node_mut(head.unwrap()) {
            g.character = 'z';
        }
        assert_eq!(characters(&list, head), "z");
        assert_eq!(characters(&list, copy), "a");
    }

    #[test]
    fn dimensions_sums_widths() {
        let mut list = NodeList::new();
        let head = build(&mut list, vec![glyph('a', 1), glyph('b', 2), glyph('c', 3)]);
        assert_eq!(list.dimensions(head), FACTOR * 6);
        assert_eq!(list.dimensions(None), ScaledPoint(0));
    }

    #[test]
    fn cut_after_detaches_the_rest() {
        let mut list = NodeList::new();
        let head = build(&mut list, vec![glyph('a', 1), glyph('b', 2), glyph('c', 3)]);
        let b = list.next(head.unwrap()).unwrap();
        let c = list.next(b).unwrap();
        list.cut_after(b);
        assert_eq!(characters(&list, head), "ab");
        assert_eq!(list.prev(c), None);
        assert_eq!(characters(&list, Some(c)), "c");
    }
}
