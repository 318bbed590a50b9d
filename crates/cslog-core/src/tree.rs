//! Conversation threading rebuilt from `parentUuid` links.
//!
//! A session is a forest: every record whose parent is null, or names a uuid
//! that is not in the file, is a root. The tree is built in one linear pass
//! and traversed with an explicit stack, so depth is bounded by memory rather
//! than by the call stack.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::model::MessageRecord;

/// Parent/child index over a session's records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationTree {
    root_messages: Vec<Uuid>,
    parent_to_children: BTreeMap<Uuid, Vec<Uuid>>,
    /// Records whose parent is not present in the file.
    orphans: Vec<Uuid>,
    /// Uuids seen more than once; only the first occurrence is threaded.
    duplicates: Vec<Uuid>,
    #[serde(skip)]
    parents: HashMap<Uuid, Uuid>,
    #[serde(skip)]
    positions: HashMap<Uuid, usize>,
}

impl ConversationTree {
    /// Builds the tree from records in file order.
    pub fn build(records: &[MessageRecord]) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        let mut duplicates = Vec::new();
        for (i, record) in records.iter().enumerate() {
            if positions.contains_key(&record.uuid) {
                duplicates.push(record.uuid);
            } else {
                positions.insert(record.uuid, i);
            }
        }

        let mut root_messages = Vec::new();
        let mut orphans = Vec::new();
        let mut parents = HashMap::new();
        let mut parent_to_children: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();

        for (i, record) in records.iter().enumerate() {
            if positions.get(&record.uuid) != Some(&i) {
                continue;
            }
            match record.parent_uuid {
                Some(parent) if positions.contains_key(&parent) => {
                    parents.insert(record.uuid, parent);
                    parent_to_children.entry(parent).or_default().push(record.uuid);
                }
                Some(_) => {
                    orphans.push(record.uuid);
                    root_messages.push(record.uuid);
                }
                None => root_messages.push(record.uuid),
            }
        }

        Self {
            root_messages,
            parent_to_children,
            orphans,
            duplicates,
            parents,
            positions,
        }
    }

    pub fn root_messages(&self) -> &[Uuid] {
        &self.root_messages
    }

    pub const fn parent_to_children(&self) -> &BTreeMap<Uuid, Vec<Uuid>> {
        &self.parent_to_children
    }

    /// Direct children in file order.
    pub fn children(&self, uuid: &Uuid) -> &[Uuid] {
        self.parent_to_children
            .get(uuid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn parent(&self, uuid: &Uuid) -> Option<&Uuid> {
        self.parents.get(uuid)
    }

    pub fn orphans(&self) -> &[Uuid] {
        &self.orphans
    }

    pub fn duplicates(&self) -> &[Uuid] {
        &self.duplicates
    }

    /// Index of the record in the session's message list.
    pub fn position(&self, uuid: &Uuid) -> Option<usize> {
        self.positions.get(uuid).copied()
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.positions.contains_key(uuid)
    }

    /// Number of distinct threaded records.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Pre-order traversal from every root, yielding `(uuid, depth)`.
    pub fn walk(&self) -> Walk<'_> {
        let stack = self.root_messages.iter().rev().map(|uuid| (*uuid, 0)).collect();
        Walk { tree: self, stack }
    }

    /// Distance from the record's root, or `None` if it is unknown or sits
    /// on a parent cycle.
    pub fn depth_of(&self, uuid: &Uuid) -> Option<usize> {
        if !self.contains(uuid) {
            return None;
        }
        let mut depth = 0;
        let mut current = *uuid;
        while let Some(parent) = self.parents.get(&current) {
            depth += 1;
            if depth > self.parents.len() {
                return None;
            }
            current = *parent;
        }
        Some(depth)
    }

    pub fn max_depth(&self) -> usize {
        self.walk().map(|(_, depth)| depth).max().unwrap_or(0)
    }

    /// Records no root reaches. Only possible when parent links form a cycle.
    pub fn unreachable(&self) -> Vec<Uuid> {
        let reached: HashSet<Uuid> = self.walk().map(|(uuid, _)| uuid).collect();
        let mut missing: Vec<(usize, Uuid)> = self
            .positions
            .iter()
            .filter(|(uuid, _)| !reached.contains(*uuid))
            .map(|(uuid, position)| (*position, *uuid))
            .collect();
        missing.sort_unstable();
        missing.into_iter().map(|(_, uuid)| uuid).collect()
    }
}

/// Iterator returned by [`ConversationTree::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    tree: &'a ConversationTree,
    stack: Vec<(Uuid, usize)>,
}

impl Iterator for Walk<'_> {
    type Item = (Uuid, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (uuid, depth) = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(&uuid).iter().rev().map(|child| (*child, depth + 1)));
        Some((uuid, depth))
    }
}
