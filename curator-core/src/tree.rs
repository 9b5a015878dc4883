//! The content tree: the focal web entity plus the sub-entities it
//! subsumes, resolved through the arena by id.
//!
//! Traversal is depth-first with a visited set, so a cyclic `children`
//! reference in the underlying data truncates the branch instead of
//! recursing forever. Expansion state is per-node and client-local;
//! children of a collapsed node are neither resolved nor fetched, which
//! keeps large hierarchies cheap. A dirty-set lets renderers refresh
//! only changed subtrees, preserving expansion across edits.

use crate::arena::EntityArena;
use std::collections::HashSet;

/// One visible line of the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub id: String,
    pub name: String,
    pub depth: usize,
    /// The focal entity is highlighted; descendants render subdued.
    pub is_focus: bool,
    pub expanded: bool,
    pub has_children: bool,
    /// False for a child id the arena has not loaded yet.
    pub loaded: bool,
}

pub struct ContentTree {
    focus: String,
    expanded: HashSet<String>,
    dirty: HashSet<String>,
}

impl ContentTree {
    /// The focal entity starts expanded so its immediate sub-entities
    /// are visible on first render.
    pub fn new(focus: impl Into<String>) -> Self {
        let focus = focus.into();
        let mut expanded = HashSet::new();
        expanded.insert(focus.clone());
        Self {
            focus,
            expanded,
            dirty: HashSet::new(),
        }
    }

    pub fn focus(&self) -> &str {
        &self.focus
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Toggle a node; returns whether it is now expanded. The node is
    /// marked dirty either way so only its subtree re-renders.
    pub fn toggle(&mut self, id: &str) -> bool {
        let now_expanded = if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        };
        self.mark_dirty(id);
        now_expanded
    }

    pub fn expand(&mut self, id: &str) {
        if self.expanded.insert(id.to_string()) {
            self.mark_dirty(id);
        }
    }

    pub fn collapse(&mut self, id: &str) {
        if self.expanded.remove(id) {
            self.mark_dirty(id);
        }
    }

    pub fn mark_dirty(&mut self, id: &str) {
        self.dirty.insert(id.to_string());
    }

    /// Hand the accumulated dirty subtree roots to the renderer and
    /// clear them.
    pub fn take_dirty(&mut self) -> HashSet<String> {
        std::mem::take(&mut self.dirty)
    }

    /// Children of expanded, loaded nodes that the arena does not hold
    /// yet. These are the lazy fetches the session should issue; a
    /// collapsed node contributes nothing.
    pub fn missing_children(&self, arena: &EntityArena) -> Vec<String> {
        let mut missing = Vec::new();
        let mut seen = HashSet::new();
        for row in self.rows(arena) {
            if !row.loaded && seen.insert(row.id.clone()) {
                missing.push(row.id);
            }
        }
        missing
    }

    /// Produce the visible rows: depth-first from the focal entity,
    /// honoring expansion state, guarding against cycles with a
    /// visited set. Each node appears at most once.
    pub fn rows(&self, arena: &EntityArena) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        // Stack of (id, depth); children pushed in reverse to keep
        // their declared order in the output.
        let mut stack: Vec<(String, usize)> = vec![(self.focus.clone(), 0)];

        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id.clone()) {
                // Already rendered somewhere above: cyclic reference,
                // truncate this branch.
                continue;
            }

            match arena.get(&id) {
                Some(entity) => {
                    let expanded = self.is_expanded(&id);
                    rows.push(TreeRow {
                        id: id.clone(),
                        name: entity.name.clone(),
                        depth,
                        is_focus: id == self.focus,
                        expanded,
                        has_children: entity.has_children(),
                        loaded: true,
                    });
                    if expanded {
                        for child in entity.children.iter().rev() {
                            stack.push((child.clone(), depth + 1));
                        }
                    }
                }
                None => {
                    // Referenced but not loaded: placeholder row, no
                    // descent.
                    rows.push(TreeRow {
                        id: id.clone(),
                        name: id.clone(),
                        depth,
                        is_focus: false,
                        expanded: false,
                        has_children: false,
                        loaded: false,
                    });
                }
            }
        }

        rows
    }
}
