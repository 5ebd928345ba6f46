// model = "claude-opus-4-5"
// created = "2026-10-17"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Order-statistics B-tree over element handles.
//!
//! Keeps every element (live or tombstoned) in canonical order. Each item
//! carries a weight, 1 while visible and 0 once deleted, and every internal
//! node caches the weight and item count of each child subtree.
//!
//! Structure:
//! - Leaf nodes store up to LEAF_SIZE handles with their weights
//! - Internal nodes store up to NODE_SIZE children with cumulative subtree weights
//! - All nodes are stored in Vecs (no raw pointers)
//! - `leaf_of` maps each handle back to the leaf holding it
//!
//! Operations:
//! - find_by_weight: O(log n) - visible index to handle
//! - rank: O(log n) - handle to (index, visible weight before it)
//! - insert: O(log n) amortized - may trigger splits
//! - set_weight: O(log n) - update leaf and ancestors
//!
//! Items are never removed; tombstones only drop their weight to zero.

const LEAF_SIZE: usize = 64;
const NODE_SIZE: usize = 32;

/// Index of an element in the owning arena.
pub type Handle = u32;
/// Index into the leaf array.
type LeafIdx = u32;
/// Index into the node array.
type NodeIdx = u32;
/// Sentinel value for no parent / no leaf.
const NONE: u32 = u32::MAX;

/// Where a handle sits in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rank {
    /// Position among all items, tombstones included.
    pub index: usize,
    /// Total weight of the items strictly before this one.
    pub weight_before: u64,
    /// This item's own weight.
    pub weight: u64,
}

#[derive(Clone, Debug)]
struct Leaf {
    items: Vec<(Handle, u64)>,
    total_weight: u64,
    /// Parent node index (NONE for root leaf).
    parent: NodeIdx,
    index_in_parent: u8,
}

impl Leaf {
    fn new() -> Leaf {
        return Leaf {
            items: Vec::with_capacity(LEAF_SIZE),
            total_weight: 0,
            parent: NONE,
            index_in_parent: 0,
        };
    }

    #[inline(always)]
    fn len(&self) -> usize {
        return self.items.len();
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        return self.items.len() >= LEAF_SIZE;
    }

    /// Find the item covering weight position `pos` within this leaf.
    #[inline]
    fn find_by_weight(&self, pos: u64) -> Option<usize> {
        let mut cumulative = 0u64;
        for (i, (_, weight)) in self.items.iter().enumerate() {
            let next = cumulative + weight;
            if next > pos {
                return Some(i);
            }
            cumulative = next;
        }
        return None;
    }

    #[inline]
    fn position(&self, handle: Handle) -> Option<usize> {
        return self.items.iter().position(|(h, _)| *h == handle);
    }

    /// Split this leaf, returning the right half.
    fn split(&mut self) -> Leaf {
        let mid = self.items.len() / 2;
        let right_items: Vec<_> = self.items.drain(mid..).collect();
        let right_weight: u64 = right_items.iter().map(|(_, w)| *w).sum();
        self.total_weight -= right_weight;
        return Leaf {
            items: right_items,
            total_weight: right_weight,
            parent: NONE,
            index_in_parent: 0,
        };
    }
}

/// An internal node containing child indices and cumulative weights.
#[derive(Clone, Debug)]
struct Node {
    /// Child indices. For height > 1, these are NodeIdx into nodes array.
    /// For height == 1, these are LeafIdx into leaves array.
    children: Vec<u32>,
    child_weights: Vec<u64>,
    child_counts: Vec<usize>,
    total_weight: u64,
    total_count: usize,
    /// Parent node index (NONE for root).
    parent: NodeIdx,
    index_in_parent: u8,
}

impl Node {
    fn new() -> Node {
        return Node {
            children: Vec::with_capacity(NODE_SIZE),
            child_weights: Vec::with_capacity(NODE_SIZE),
            child_counts: Vec::with_capacity(NODE_SIZE),
            total_weight: 0,
            total_count: 0,
            parent: NONE,
            index_in_parent: 0,
        };
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        return self.children.len() >= NODE_SIZE;
    }

    /// Find the child containing the given weight position.
    /// Returns (child_index, offset_in_child, items_before_child).
    #[inline]
    fn find_child_by_weight(&self, pos: u64) -> Option<(usize, u64, usize)> {
        let mut weight_cumulative = 0u64;
        let mut count_cumulative = 0usize;
        for i in 0..self.child_weights.len() {
            let next = weight_cumulative + self.child_weights[i];
            if next > pos {
                return Some((i, pos - weight_cumulative, count_cumulative));
            }
            weight_cumulative = next;
            count_cumulative += self.child_counts[i];
        }
        return None;
    }

    /// Find the child containing the given item index.
    /// Returns (child_index, offset_in_child).
    #[inline]
    fn find_child_by_index(&self, index: usize) -> (usize, usize) {
        let mut cumulative = 0usize;
        for (i, &count) in self.child_counts.iter().enumerate() {
            let next = cumulative + count;
            if next > index {
                return (i, index - cumulative);
            }
            cumulative = next;
        }
        // Past the end: last child, appended after its items
        let last = self.children.len().saturating_sub(1);
        return (last, index - cumulative + self.child_counts[last]);
    }

    /// Split this node, returning the right half.
    fn split(&mut self) -> Node {
        let mid = self.children.len() / 2;
        let right_children: Vec<_> = self.children.drain(mid..).collect();
        let right_weights: Vec<_> = self.child_weights.drain(mid..).collect();
        let right_counts: Vec<_> = self.child_counts.drain(mid..).collect();
        let right_weight: u64 = right_weights.iter().sum();
        let right_count: usize = right_counts.iter().sum();
        self.total_weight -= right_weight;
        self.total_count -= right_count;

        return Node {
            children: right_children,
            child_weights: right_weights,
            child_counts: right_counts,
            total_weight: right_weight,
            total_count: right_count,
            parent: NONE,
            index_in_parent: 0,
        };
    }
}

/// A weighted sequence of handles implemented as a B-tree.
#[derive(Clone, Debug)]
pub struct OrderTree {
    leaves: Vec<Leaf>,
    nodes: Vec<Node>,
    /// Root index. If height == 0, this is a LeafIdx. Otherwise NodeIdx.
    root: u32,
    /// Tree height. 0 means root is a leaf.
    height: usize,
    total_weight: u64,
    len: usize,
    /// Leaf holding each handle, NONE for handles never inserted.
    leaf_of: Vec<LeafIdx>,
}

impl OrderTree {
    pub fn new() -> OrderTree {
        return OrderTree {
            leaves: vec![Leaf::new()],
            nodes: Vec::new(),
            root: 0,
            height: 0,
            total_weight: 0,
            len: 0,
            leaf_of: Vec::new(),
        };
    }

    #[inline(always)]
    pub fn total_weight(&self) -> u64 {
        return self.total_weight;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.len;
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    fn alloc_leaf(&mut self) -> LeafIdx {
        let idx = self.leaves.len() as LeafIdx;
        self.leaves.push(Leaf::new());
        return idx;
    }

    fn alloc_node(&mut self) -> NodeIdx {
        let idx = self.nodes.len() as NodeIdx;
        self.nodes.push(Node::new());
        return idx;
    }

    fn set_leaf_of(&mut self, handle: Handle, leaf_idx: LeafIdx) {
        let slot = handle as usize;
        if self.leaf_of.len() <= slot {
            self.leaf_of.resize(slot + 1, NONE);
        }
        self.leaf_of[slot] = leaf_idx;
    }

    /// Find the leaf containing the given weight position.
    /// Returns (leaf_idx, offset_in_leaf, items_before_leaf).
    #[inline]
    fn find_leaf_by_weight(&self, pos: u64) -> Option<(LeafIdx, u64, usize)> {
        if pos >= self.total_weight {
            return None;
        }

        if self.height == 0 {
            return Some((self.root, pos, 0));
        }

        let mut node_idx = self.root;
        let mut offset = pos;
        let mut items_before = 0usize;
        let mut current_height = self.height;

        while current_height > 1 {
            let node = &self.nodes[node_idx as usize];
            let (child_idx, new_offset, count_before) = node.find_child_by_weight(offset)?;
            items_before += count_before;
            node_idx = node.children[child_idx];
            offset = new_offset;
            current_height -= 1;
        }

        // At height 1, children are leaves
        let node = &self.nodes[node_idx as usize];
        let (child_idx, new_offset, count_before) = node.find_child_by_weight(offset)?;
        items_before += count_before;

        return Some((node.children[child_idx], new_offset, items_before));
    }

    /// Find the leaf containing the given item index.
    /// Returns (leaf_idx, index_in_leaf).
    #[inline]
    fn find_leaf_by_index(&self, index: usize) -> (LeafIdx, usize) {
        if index >= self.len {
            if self.height == 0 {
                return (self.root, self.leaves[self.root as usize].len());
            }
            // Rightmost leaf, for appends
            let mut node_idx = self.root;
            let mut current_height = self.height;
            while current_height > 1 {
                let node = &self.nodes[node_idx as usize];
                node_idx = node.children[node.children.len() - 1];
                current_height -= 1;
            }
            let node = &self.nodes[node_idx as usize];
            let leaf_idx = node.children[node.children.len() - 1];
            return (leaf_idx, self.leaves[leaf_idx as usize].len());
        }

        if self.height == 0 {
            return (self.root, index);
        }

        let mut node_idx = self.root;
        let mut offset = index;
        let mut current_height = self.height;

        while current_height > 1 {
            let node = &self.nodes[node_idx as usize];
            let (child_idx, new_offset) = node.find_child_by_index(offset);
            node_idx = node.children[child_idx];
            offset = new_offset;
            current_height -= 1;
        }

        let node = &self.nodes[node_idx as usize];
        let (child_idx, new_offset) = node.find_child_by_index(offset);
        return (node.children[child_idx], new_offset);
    }

    /// Find the item covering the given weight position.
    /// Returns (item_index, handle) or None if pos >= total_weight.
    #[inline]
    pub fn find_by_weight(&self, pos: u64) -> Option<(usize, Handle)> {
        let (leaf_idx, offset_in_leaf, items_before) = self.find_leaf_by_weight(pos)?;
        let leaf = &self.leaves[leaf_idx as usize];
        let idx_in_leaf = leaf.find_by_weight(offset_in_leaf)?;
        return Some((items_before + idx_in_leaf, leaf.items[idx_in_leaf].0));
    }

    /// Update both weight and count in ancestors after a leaf change.
    #[inline]
    fn update_ancestors(&mut self, leaf_idx: LeafIdx, weight_delta: i64, count_delta: i64) {
        let leaf = &self.leaves[leaf_idx as usize];
        let mut parent = leaf.parent;
        let mut child_index = leaf.index_in_parent as usize;

        while parent != NONE {
            let node = &mut self.nodes[parent as usize];
            node.child_weights[child_index] = (node.child_weights[child_index] as i64 + weight_delta) as u64;
            node.total_weight = (node.total_weight as i64 + weight_delta) as u64;
            node.child_counts[child_index] = (node.child_counts[child_index] as i64 + count_delta) as usize;
            node.total_count = (node.total_count as i64 + count_delta) as usize;
            child_index = node.index_in_parent as usize;
            parent = node.parent;
        }
    }

    /// Update weight in ancestors (count unchanged).
    #[inline]
    fn update_ancestor_weights(&mut self, leaf_idx: LeafIdx, delta: i64) {
        let leaf = &self.leaves[leaf_idx as usize];
        let mut parent = leaf.parent;
        let mut child_index = leaf.index_in_parent as usize;

        while parent != NONE {
            let node = &mut self.nodes[parent as usize];
            node.child_weights[child_index] = (node.child_weights[child_index] as i64 + delta) as u64;
            node.total_weight = (node.total_weight as i64 + delta) as u64;
            child_index = node.index_in_parent as usize;
            parent = node.parent;
        }
    }

    /// Insert a handle at the given item index with the given weight.
    pub fn insert(&mut self, index: usize, handle: Handle, weight: u64) {
        let (leaf_idx, idx_in_leaf) = self.find_leaf_by_index(index);

        let leaf = &mut self.leaves[leaf_idx as usize];
        leaf.items.insert(idx_in_leaf, (handle, weight));
        leaf.total_weight += weight;
        self.set_leaf_of(handle, leaf_idx);

        self.total_weight += weight;
        self.len += 1;

        if self.height > 0 {
            self.update_ancestors(leaf_idx, weight as i64, 1);
        }

        if self.leaves[leaf_idx as usize].is_full() {
            self.split_leaf(leaf_idx);
        }
    }

    /// Split a full leaf.
    fn split_leaf(&mut self, leaf_idx: LeafIdx) {
        let right = self.leaves[leaf_idx as usize].split();
        let right_weight = right.total_weight;
        let right_count = right.items.len();
        let right_idx = self.alloc_leaf();
        for &(handle, _) in &right.items {
            self.leaf_of[handle as usize] = right_idx;
        }
        self.leaves[right_idx as usize] = right;

        if self.height == 0 {
            // Root is a leaf, need to create a new root node
            let new_root = self.alloc_node();
            let left_weight = self.leaves[leaf_idx as usize].total_weight;
            let left_count = self.leaves[leaf_idx as usize].len();

            let root = &mut self.nodes[new_root as usize];
            root.children.push(leaf_idx);
            root.children.push(right_idx);
            root.child_weights.push(left_weight);
            root.child_weights.push(right_weight);
            root.child_counts.push(left_count);
            root.child_counts.push(right_count);
            root.total_weight = left_weight + right_weight;
            root.total_count = left_count + right_count;

            self.leaves[leaf_idx as usize].parent = new_root;
            self.leaves[leaf_idx as usize].index_in_parent = 0;
            self.leaves[right_idx as usize].parent = new_root;
            self.leaves[right_idx as usize].index_in_parent = 1;

            self.root = new_root;
            self.height = 1;
        } else {
            let parent = self.leaves[leaf_idx as usize].parent;
            let idx_in_parent = self.leaves[leaf_idx as usize].index_in_parent as usize;

            let left_weight = self.leaves[leaf_idx as usize].total_weight;
            let left_count = self.leaves[leaf_idx as usize].len();
            let node = &mut self.nodes[parent as usize];
            node.child_weights[idx_in_parent] = left_weight;
            node.child_counts[idx_in_parent] = left_count;
            node.children.insert(idx_in_parent + 1, right_idx);
            node.child_weights.insert(idx_in_parent + 1, right_weight);
            node.child_counts.insert(idx_in_parent + 1, right_count);

            // Siblings after the insertion shifted one slot right
            for i in (idx_in_parent + 2)..self.nodes[parent as usize].children.len() {
                let child_idx = self.nodes[parent as usize].children[i];
                self.leaves[child_idx as usize].index_in_parent = i as u8;
            }

            self.leaves[right_idx as usize].parent = parent;
            self.leaves[right_idx as usize].index_in_parent = (idx_in_parent + 1) as u8;

            if self.nodes[parent as usize].is_full() {
                self.split_node(parent, 1);
            }
        }
    }

    /// Split a full internal node at the given height.
    fn split_node(&mut self, node_idx: NodeIdx, height: usize) {
        let right = self.nodes[node_idx as usize].split();
        let right_weight = right.total_weight;
        let right_count = right.total_count;
        let left_count = self.nodes[node_idx as usize].total_count;

        let right_idx = self.alloc_node();
        self.nodes[right_idx as usize] = right;

        let right_children: Vec<u32> = self.nodes[right_idx as usize].children.clone();
        if height == 1 {
            for (i, &child_idx) in right_children.iter().enumerate() {
                self.leaves[child_idx as usize].parent = right_idx;
                self.leaves[child_idx as usize].index_in_parent = i as u8;
            }
        } else {
            for (i, &child_idx) in right_children.iter().enumerate() {
                self.nodes[child_idx as usize].parent = right_idx;
                self.nodes[child_idx as usize].index_in_parent = i as u8;
            }
        }

        if self.nodes[node_idx as usize].parent == NONE {
            let new_root = self.alloc_node();
            let left_weight = self.nodes[node_idx as usize].total_weight;

            let root = &mut self.nodes[new_root as usize];
            root.children.push(node_idx);
            root.children.push(right_idx);
            root.child_weights.push(left_weight);
            root.child_weights.push(right_weight);
            root.child_counts.push(left_count);
            root.child_counts.push(right_count);
            root.total_weight = left_weight + right_weight;
            root.total_count = left_count + right_count;

            self.nodes[node_idx as usize].parent = new_root;
            self.nodes[node_idx as usize].index_in_parent = 0;
            self.nodes[right_idx as usize].parent = new_root;
            self.nodes[right_idx as usize].index_in_parent = 1;

            self.root = new_root;
            self.height += 1;
        } else {
            let parent = self.nodes[node_idx as usize].parent;
            let idx_in_parent = self.nodes[node_idx as usize].index_in_parent as usize;

            let left_weight = self.nodes[node_idx as usize].total_weight;
            let node = &mut self.nodes[parent as usize];
            node.child_weights[idx_in_parent] = left_weight;
            node.child_counts[idx_in_parent] = left_count;
            node.children.insert(idx_in_parent + 1, right_idx);
            node.child_weights.insert(idx_in_parent + 1, right_weight);
            node.child_counts.insert(idx_in_parent + 1, right_count);

            for i in (idx_in_parent + 2)..self.nodes[parent as usize].children.len() {
                let child_idx = self.nodes[parent as usize].children[i];
                self.nodes[child_idx as usize].index_in_parent = i as u8;
            }

            self.nodes[right_idx as usize].parent = parent;
            self.nodes[right_idx as usize].index_in_parent = (idx_in_parent + 1) as u8;

            if self.nodes[parent as usize].is_full() {
                self.split_node(parent, height + 1);
            }
        }
    }

    /// Handle at the given item index (tombstones included).
    #[inline]
    pub fn get(&self, index: usize) -> Option<Handle> {
        if index >= self.len {
            return None;
        }
        let (leaf_idx, idx_in_leaf) = self.find_leaf_by_index(index);
        return self.leaves[leaf_idx as usize].items.get(idx_in_leaf).map(|(h, _)| *h);
    }

    /// Locate a handle: its item index and the weight in front of it.
    pub fn rank(&self, handle: Handle) -> Option<Rank> {
        let leaf_idx = *self.leaf_of.get(handle as usize)?;
        if leaf_idx == NONE {
            return None;
        }
        let leaf = &self.leaves[leaf_idx as usize];
        let idx_in_leaf = leaf.position(handle)?;

        let mut index = idx_in_leaf;
        let mut weight_before: u64 = leaf.items[..idx_in_leaf].iter().map(|(_, w)| *w).sum();
        let weight = leaf.items[idx_in_leaf].1;

        // Walk up, adding every subtree to our left
        let mut parent = leaf.parent;
        let mut child_index = leaf.index_in_parent as usize;
        while parent != NONE {
            let node = &self.nodes[parent as usize];
            index += node.child_counts[..child_index].iter().sum::<usize>();
            weight_before += node.child_weights[..child_index].iter().sum::<u64>();
            child_index = node.index_in_parent as usize;
            parent = node.parent;
        }

        return Some(Rank { index, weight_before, weight });
    }

    /// Change the weight of a handle. Returns the old weight.
    pub fn set_weight(&mut self, handle: Handle, new_weight: u64) -> Option<u64> {
        let leaf_idx = *self.leaf_of.get(handle as usize)?;
        if leaf_idx == NONE {
            return None;
        }
        let leaf = &mut self.leaves[leaf_idx as usize];
        let idx_in_leaf = leaf.position(handle)?;
        let old_weight = leaf.items[idx_in_leaf].1;
        leaf.items[idx_in_leaf].1 = new_weight;
        leaf.total_weight = leaf.total_weight - old_weight + new_weight;
        self.total_weight = self.total_weight - old_weight + new_weight;

        if self.height > 0 {
            let delta = new_weight as i64 - old_weight as i64;
            self.update_ancestor_weights(leaf_idx, delta);
        }

        return Some(old_weight);
    }

    /// Iterate handles in order.
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        let leaf_order = self.collect_leaves_in_order();
        return OrderTreeIter {
            tree: self,
            leaf_order,
            leaf_pos: 0,
            item_idx: 0,
        };
    }

    fn collect_leaves_in_order(&self) -> Vec<LeafIdx> {
        let mut result = Vec::new();
        if self.height == 0 {
            result.push(self.root);
        } else {
            self.collect_leaves_recursive(self.root, self.height, &mut result);
        }
        return result;
    }

    fn collect_leaves_recursive(&self, node_idx: NodeIdx, height: usize, result: &mut Vec<LeafIdx>) {
        let node = &self.nodes[node_idx as usize];
        if height == 1 {
            result.extend_from_slice(&node.children);
        } else {
            for &child_idx in &node.children {
                self.collect_leaves_recursive(child_idx, height - 1, result);
            }
        }
    }
}

impl Default for OrderTree {
    fn default() -> Self {
        return Self::new();
    }
}

struct OrderTreeIter<'a> {
    tree: &'a OrderTree,
    /// Leaf indices in order.
    leaf_order: Vec<LeafIdx>,
    leaf_pos: usize,
    item_idx: usize,
}

impl<'a> Iterator for OrderTreeIter<'a> {
    type Item = Handle;

    fn next(&mut self) -> Option<Self::Item> {
        while self.leaf_pos < self.leaf_order.len() {
            let leaf = &self.tree.leaves[self.leaf_order[self.leaf_pos] as usize];
            if self.item_idx < leaf.items.len() {
                let handle = leaf.items[self.item_idx].0;
                self.item_idx += 1;
                return Some(handle);
            }
            self.leaf_pos += 1;
            self.item_idx = 0;
        }
        return None;
    }
}
