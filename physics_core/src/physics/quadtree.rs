//! Quadtree broadphase.
//!
//! The tree is rebuilt from scratch every tick. Each entry lives in exactly one
//! node: the deepest node whose bounds fully contain its AABB. Entries that
//! straddle a split line stay with the parent, and entries outside the root
//! bounds stay at the root, so a query visits every entry at most once and
//! never loses one.

use std::collections::BTreeSet;

use crate::{ecs::EntityId, physics::aabb::Aabb};

pub const DEFAULT_MAX_DEPTH: u32 = 20;
pub const DEFAULT_NODE_CAPACITY: usize = 8;

#[derive(Debug)]
struct Node {
    bounds: Aabb,
    depth: u32,
    entries: Vec<(EntityId, Aabb)>,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    /// Index of the child that fully contains `aabb`, if any.
    fn child_for(&self, aabb: &Aabb) -> Option<usize> {
        let children = self.children.as_ref()?;
        children.iter().position(|c| aabb.is_inside(&c.bounds))
    }

    fn insert(&mut self, entity: EntityId, aabb: Aabb, max_depth: u32, capacity: usize) {
        if let Some(idx) = self.child_for(&aabb) {
            if let Some(children) = self.children.as_mut() {
                children[idx].insert(entity, aabb, max_depth, capacity);
                return;
            }
        }

        self.entries.push((entity, aabb));

        if self.children.is_none() && self.entries.len() > capacity && self.depth < max_depth {
            self.split(max_depth, capacity);
        }
    }

    fn split(&mut self, max_depth: u32, capacity: usize) {
        let [nw, ne, sw, se] = self.bounds.quadrants();
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            Node::new(nw, depth),
            Node::new(ne, depth),
            Node::new(sw, depth),
            Node::new(se, depth),
        ]));

        let entries = std::mem::take(&mut self.entries);
        for (entity, aabb) in entries {
            match (self.child_for(&aabb), self.children.as_mut()) {
                (Some(idx), Some(children)) => {
                    children[idx].insert(entity, aabb, max_depth, capacity)
                }
                _ => self.entries.push((entity, aabb)),
            }
        }
    }

    fn query(&self, area: &Aabb, out: &mut Vec<EntityId>, potential: &mut u64, found: &mut u64) {
        for (entity, aabb) in &self.entries {
            *potential += 1;
            if aabb.intersects(area) {
                *found += 1;
                out.push(*entity);
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects(area) {
                    child.query(area, out, potential, found);
                }
            }
        }
    }

    fn count(&self) -> (usize, usize) {
        let mut nodes = 1;
        let mut entries = self.entries.len();
        if let Some(children) = &self.children {
            for child in children.iter() {
                let (n, e) = child.count();
                nodes += n;
                entries += e;
            }
        }
        (nodes, entries)
    }

    fn max_depth_reached(&self) -> u32 {
        match &self.children {
            Some(children) => children
                .iter()
                .map(Node::max_depth_reached)
                .max()
                .unwrap_or(self.depth),
            None => self.depth,
        }
    }
}

/// Region quadtree over entity AABBs.
#[derive(Debug)]
pub struct Quadtree {
    root: Node,
    max_depth: u32,
    capacity: usize,
    /// Entries examined by queries since the last counter reset.
    pub total_potential: u64,
    /// Examined entries whose AABB actually intersected the query box.
    pub total_found: u64,
}

impl Quadtree {
    /// `capacity` is the entry count a node may hold before it splits; it is
    /// clamped to at least 1.
    pub fn new(bounds: Aabb, max_depth: u32, capacity: usize) -> Self {
        Self {
            root: Node::new(bounds, 0),
            max_depth,
            capacity: capacity.max(1),
            total_potential: 0,
            total_found: 0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.root.bounds
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every entry and child node. Counters are left untouched.
    pub fn clear(&mut self) {
        self.root = Node::new(self.root.bounds, 0);
    }

    /// Replaces the root bounds and clears the tree.
    pub fn reset_bounds(&mut self, bounds: Aabb) {
        self.root = Node::new(bounds, 0);
    }

    pub fn reset_counters(&mut self) {
        self.total_potential = 0;
        self.total_found = 0;
    }

    pub fn insert(&mut self, entity: EntityId, aabb: Aabb) {
        self.root.insert(entity, aabb, self.max_depth, self.capacity);
    }

    /// Entities whose AABB intersects `area`. The root is always visited so
    /// entries outside the root bounds are still reported.
    pub fn query(&mut self, area: &Aabb) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.root
            .query(area, &mut out, &mut self.total_potential, &mut self.total_found);
        out
    }

    /// Canonical `(low, high)` candidate pairs for the given query boxes.
    pub fn candidate_pairs<'a, I>(&mut self, queries: I) -> BTreeSet<(EntityId, EntityId)>
    where
        I: IntoIterator<Item = (EntityId, &'a Aabb)>,
    {
        let mut pairs = BTreeSet::new();
        for (entity, aabb) in queries {
            for other in self.query(aabb) {
                if other != entity {
                    pairs.insert(if entity < other {
                        (entity, other)
                    } else {
                        (other, entity)
                    });
                }
            }
        }
        pairs
    }

    pub fn len(&self) -> usize {
        self.root.count().1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_count(&self) -> usize {
        self.root.count().0
    }

    pub fn depth(&self) -> u32 {
        self.root.max_depth_reached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f32, y: f32) -> Aabb {
        Aabb::new(x, y, x + 1.0, y + 1.0)
    }

    #[test]
    fn splits_once_capacity_exceeded() {
        let mut qt = Quadtree::new(Aabb::new(0.0, 0.0, 100.0, 100.0), 4, 2);
        qt.insert(EntityId(0), unit_box(10.0, 10.0));
        qt.insert(EntityId(1), unit_box(80.0, 10.0));
        assert_eq!(qt.node_count(), 1);
        qt.insert(EntityId(2), unit_box(10.0, 80.0));
        assert_eq!(qt.node_count(), 5);
        assert_eq!(qt.len(), 3);
    }

    #[test]
    fn straddling_entry_stays_at_parent() {
        let mut qt = Quadtree::new(Aabb::new(0.0, 0.0, 100.0, 100.0), 4, 1);
        qt.insert(EntityId(0), Aabb::new(45.0, 45.0, 55.0, 55.0));
        qt.insert(EntityId(1), unit_box(10.0, 10.0));
        qt.insert(EntityId(2), unit_box(80.0, 80.0));
        assert_eq!(qt.len(), 3);
        assert_eq!(qt.root.entries.len(), 1);
        assert_eq!(qt.root.entries[0].0, EntityId(0));

        let hits = qt.query(&Aabb::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn zero_depth_is_a_single_bucket() {
        let mut qt = Quadtree::new(Aabb::new(0.0, 0.0, 100.0, 100.0), 0, 1);
        for i in 0..50 {
            qt.insert(EntityId(i), unit_box(i as f32, i as f32));
        }
        assert_eq!(qt.node_count(), 1);
        assert_eq!(qt.depth(), 0);
        let hits = qt.query(&unit_box(10.0, 10.0));
        assert_eq!(hits, vec![EntityId(9), EntityId(10), EntityId(11)]);
    }

    #[test]
    fn depth_is_bounded() {
        let mut qt = Quadtree::new(Aabb::new(0.0, 0.0, 1024.0, 1024.0), 3, 1);
        for i in 0..20 {
            let f = i as f32 * 0.01;
            qt.insert(EntityId(i), Aabb::new(f, f, f + 0.001, f + 0.001));
        }
        assert!(qt.depth() <= 3);
        assert_eq!(qt.len(), 20);
    }

    #[test]
    fn entries_outside_root_are_kept() {
        let mut qt = Quadtree::new(Aabb::new(0.0, 0.0, 10.0, 10.0), 5, 1);
        qt.insert(EntityId(0), unit_box(-50.0, -50.0));
        qt.insert(EntityId(1), unit_box(-50.5, -50.5));
        qt.insert(EntityId(2), unit_box(2.0, 2.0));
        let hits = qt.query(&unit_box(-50.0, -50.0));
        assert_eq!(hits, vec![EntityId(0), EntityId(1)]);
    }

    #[test]
    fn counters_track_examined_and_found() {
        let mut qt = Quadtree::new(Aabb::new(0.0, 0.0, 100.0, 100.0), 0, 8);
        qt.insert(EntityId(0), unit_box(0.0, 0.0));
        qt.insert(EntityId(1), unit_box(50.0, 50.0));
        qt.query(&unit_box(0.5, 0.5));
        assert_eq!(qt.total_potential, 2);
        assert_eq!(qt.total_found, 1);
        qt.reset_counters();
        assert_eq!(qt.total_potential, 0);
    }

    #[test]
    fn candidate_pairs_are_canonical_and_unique() {
        let mut qt = Quadtree::new(Aabb::new(0.0, 0.0, 100.0, 100.0), 4, 1);
        let boxes = [
            (EntityId(3), unit_box(0.0, 0.0)),
            (EntityId(1), unit_box(0.5, 0.5)),
            (EntityId(2), unit_box(60.0, 60.0)),
        ];
        for (e, b) in &boxes {
            qt.insert(*e, *b);
        }
        let pairs = qt.candidate_pairs(boxes.iter().map(|(e, b)| (*e, b)));
        assert_eq!(pairs.into_iter().collect::<Vec<_>>(), vec![(EntityId(1), EntityId(3))]);
    }
}
