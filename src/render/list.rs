use super::control_point::ControlPoint;

pub type NodeId = usize;

#[derive(Debug)]
struct Node {
    prev: Option<NodeId>,
    next: Option<NodeId>,
    point: ControlPoint,
}

/// Control points for one row, ordered by `x` ascending.
///
/// Logically a doubly-linked list with `first`/`last` handles; insertions
/// take a caller-held bookmark so the near-monotone access pattern of the row
/// solver stays O(1) amortized. Nodes live in an arena that is never
/// compacted while the row is alive, so `NodeId`s stay valid across edits;
/// removal just unlinks.
#[derive(Debug, Default)]
pub struct PointList {
    nodes: Vec<Node>,
    first: Option<NodeId>,
    last: Option<NodeId>,
}

impl PointList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { nodes: Vec::with_capacity(capacity), first: None, last: None }
    }

    pub const fn first(&self) -> Option<NodeId> {
        self.first
    }

    pub const fn last(&self) -> Option<NodeId> {
        self.last
    }

    pub fn point(&self, id: NodeId) -> &ControlPoint {
        &self.nodes[id].point
    }

    pub fn point_mut(&mut self, id: NodeId) -> &mut ControlPoint {
        &mut self.nodes[id].point
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].prev
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].next
    }

    /// Insert ordered by `x`, starting the search at `from` (or the head).
    pub fn add(&mut self, point: ControlPoint, from: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node { prev: None, next: None, point });

        if self.first.is_none() {
            self.first = Some(id);
            self.last = Some(id);
            return id;
        }

        match self.find(point.x, from) {
            None => {
                // New head.
                self.nodes[id].next = self.first;
                self.first = Some(id);
            }
            Some(prev) => {
                self.nodes[id].prev = Some(prev);
                self.nodes[id].next = self.nodes[prev].next;
                self.nodes[prev].next = Some(id);
            }
        }

        match self.nodes[id].next {
            Some(next) => self.nodes[next].prev = Some(id),
            None => self.last = Some(id),
        }

        id
    }

    pub fn remove_first(&mut self) {
        let Some(id) = self.first else {
            return;
        };

        match self.nodes[id].next {
            Some(next) => self.nodes[next].prev = None,
            None => self.last = None,
        }
        self.first = self.nodes[id].next;
    }

    pub fn remove_last(&mut self) {
        let Some(id) = self.last else {
            return;
        };

        match self.nodes[id].prev {
            Some(prev) => self.nodes[prev].next = None,
            None => self.first = None,
        }
        self.last = self.nodes[id].prev;
    }

    /// The last node with `point.x <= x`, or None if every node is to the
    /// right of `x`. `from` seeds the search.
    pub fn find(&self, x: f32, from: Option<NodeId>) -> Option<NodeId> {
        self.first?;

        let mut node = from.or(self.first);

        while let Some(id) = node {
            if self.nodes[id].point.x > x {
                node = self.nodes[id].prev;
            } else {
                break;
            }
        }

        let mut id = node?;
        while let Some(next) = self.nodes[id].next {
            if self.nodes[next].point.x <= x {
                id = next;
            } else {
                break;
            }
        }

        Some(id)
    }

    /// The largest sublist covered by `x1..x2`, prepended by the first node
    /// to the left of the range: `start` is the last node with `x <= x1`,
    /// `end` the first node with `x >= x2`.
    pub fn find_range(
        &self,
        x1: f32,
        x2: f32,
        from: Option<NodeId>,
    ) -> (Option<NodeId>, Option<NodeId>) {
        if x1 > x2 {
            warn!("find_range called with {x1} .. {x2}");
        }

        if self.first.is_none() {
            return (None, None);
        }

        let mut node = from.or(self.first).unwrap();

        // Step right until our right neighbor passes the start of the range,
        // then left until we're at or before it.
        while let Some(next) = self.nodes[node].next {
            if self.nodes[next].point.x <= x1 {
                node = next;
            } else {
                break;
            }
        }

        let mut start = Some(node);
        while let Some(id) = start {
            if self.nodes[id].point.x > x1 {
                start = self.nodes[id].prev;
            } else {
                break;
            }
        }

        // Finally, step right until we're outside the range.
        let mut end = start;
        while let Some(id) = end {
            if self.nodes[id].point.x < x2 {
                end = self.nodes[id].next;
            } else {
                break;
            }
        }

        (start, end)
    }

    /// Reverse the list in place, reflecting every point around `axis`.
    pub fn reflect(&mut self, axis: f32) {
        let mut node = self.first;

        while let Some(id) = node {
            let next = self.nodes[id].next;

            self.nodes[id].point.reflect(axis);
            self.nodes[id].next = self.nodes[id].prev;
            self.nodes[id].prev = next;

            node = next;
        }

        std::mem::swap(&mut self.first, &mut self.last);
    }

    /// Walk the list left to right.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut node = self.first;
        std::iter::from_fn(move || {
            let id = node?;
            node = self.nodes[id].next;
            Some(id)
        })
    }
}
