//! Change-block navigation over [`patchy_core::ApplyResult`].
//!
//! Collapses the added and removed line indices of an apply result into
//! contiguous blocks and answers next/prev queries with wrap-around, for
//! the UI's jump-to-change buttons.
//!
//! # Architecture
//!
//! - Depends on: `patchy-core` (the shared data contract)
//! - Used by: the graphical shell's editor panes
//!
//! Added blocks index into the patched text; removed blocks index into
//! the original text (each pane highlights its own side).

use serde::{Deserialize, Serialize};

use patchy_core::{ApplyResult, EngineError, Result};

/// Which side of the change a block describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
}

/// A run of consecutive changed lines, `start..=end`, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBlock {
    pub start: usize,
    pub end: usize,
    pub kind: ChangeKind,
}

/// Derived block list over one apply result.
///
/// Construction collapses the index vectors once; the query methods are
/// pure lookups over the derived list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNavigator {
    blocks: Vec<ChangeBlock>,
}

impl ChangeNavigator {
    /// Collapse `added_lines` and `removed_original_indices` into tagged
    /// blocks, merged by start with added blocks before removed ones on
    /// ties.
    pub fn new(result: &ApplyResult) -> Self {
        let mut blocks = collapse_runs(&result.added_lines, ChangeKind::Added);
        blocks.extend(collapse_runs(
            &result.removed_original_indices,
            ChangeKind::Removed,
        ));
        blocks.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| kind_rank(a.kind).cmp(&kind_rank(b.kind)))
        });
        ChangeNavigator { blocks }
    }

    /// The derived blocks, ordered by start.
    pub fn blocks(&self) -> &[ChangeBlock] {
        &self.blocks
    }

    /// Start of the first block after `current_line`, wrapping to the
    /// first block. With no blocks, `current_line` is returned unchanged.
    pub fn next_change(&self, current_line: isize) -> Result<usize> {
        let current = check_current_line(current_line)?;
        let target = self
            .blocks
            .iter()
            .find(|block| block.start > current)
            .or_else(|| self.blocks.first());
        Ok(target.map_or(current, |block| block.start))
    }

    /// Start of the last block before `current_line`, wrapping to the
    /// last block. With no blocks, `current_line` is returned unchanged.
    pub fn prev_change(&self, current_line: isize) -> Result<usize> {
        let current = check_current_line(current_line)?;
        let target = self
            .blocks
            .iter()
            .rev()
            .find(|block| block.start < current)
            .or_else(|| self.blocks.last());
        Ok(target.map_or(current, |block| block.start))
    }
}

fn check_current_line(current_line: isize) -> Result<usize> {
    if current_line < 0 {
        return Err(EngineError::Validation {
            field: "current_line",
            message: format!("must be non-negative, got {current_line}"),
        });
    }
    Ok(current_line as usize)
}

fn kind_rank(kind: ChangeKind) -> u8 {
    match kind {
        ChangeKind::Added => 0,
        ChangeKind::Removed => 1,
    }
}

/// Collapse sorted indices into inclusive `(start, end)` runs. The input
/// invariant says sorted-unique already; re-sorting here keeps the block
/// list well-formed even for hand-built results.
fn collapse_runs(indices: &[usize], kind: ChangeKind) -> Vec<ChangeBlock> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut blocks: Vec<ChangeBlock> = Vec::new();
    for index in sorted {
        match blocks.last_mut() {
            Some(block) if index == block.end + 1 => block.end = index,
            _ => blocks.push(ChangeBlock {
                start: index,
                end: index,
                kind,
            }),
        }
    }
    blocks
}
