//! Apply parsed diffs to in-memory text with tolerant anchoring.
//!
//! Each hunk is anchored on the full sequence of its consuming lines
//! (context and removals). The anchor search tries the header-derived
//! guess first, then an expanding ring around it, then a global scan, so
//! drifted line numbers still land. Blank context lines match a greedy
//! run of zero or more blank lines, on both the match side and the apply
//! side, which keeps the cursors synchronized.

use patchy_core::constants::DEFAULT_FUZZY_CONTEXT;
use patchy_core::{
    ApplyFailure, ApplyResult, EngineError, FilePatch, Hunk, HunkLine, LineKind, Origin, Result,
};
use tracing::{debug, trace};

/// Which tier of the anchor search produced a hit, for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorStrategy {
    Exact,
    Ring,
    Scan,
}

/// Applier for parsed file patches.
///
/// `fuzzy_context` is the ring-search radius around each hunk's guess
/// index. `strict` controls the failure policy: when set, a hunk that
/// cannot be anchored is an error; when clear, the hunk is skipped and
/// recorded in [`ApplyResult::skipped_hunks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffApplier {
    pub fuzzy_context: usize,
    pub strict: bool,
}

impl Default for DiffApplier {
    fn default() -> Self {
        DiffApplier {
            fuzzy_context: DEFAULT_FUZZY_CONTEXT,
            strict: true,
        }
    }
}

impl DiffApplier {
    pub fn new(fuzzy_context: usize, strict: bool) -> Self {
        DiffApplier {
            fuzzy_context,
            strict,
        }
    }

    /// Apply every hunk of `patch` to `original`, returning the patched
    /// text together with line-level provenance.
    ///
    /// `original` is expected LF-normalized by the caller; output lines
    /// are joined with LF and the trailing newline follows the original
    /// unless a missing-newline marker overrides it.
    pub fn apply(&self, original: &str, patch: &FilePatch) -> Result<ApplyResult> {
        let mut result_lines: Vec<String> = original.lines().map(str::to_string).collect();
        let n_original = result_lines.len();
        let mut origin_map: Vec<Origin> = (0..n_original).map(Origin::Original).collect();
        let mut added_lines: Vec<usize> = Vec::new();
        let mut removed_original_indices: Vec<usize> = Vec::new();
        let mut skipped_hunks: Vec<usize> = Vec::new();
        let mut line_bias: i64 = 0;

        for (hunk_index, hunk) in patch.hunks.iter().enumerate() {
            let guess = clamp_index(hunk.old_start as i64 + line_bias, result_lines.len());
            let anchor = match self.find_anchor_index(&result_lines, hunk, guess) {
                Some((anchor, strategy)) => {
                    trace!(
                        "hunk {} anchored at {} via {:?} (guess {})",
                        hunk_index,
                        anchor,
                        strategy,
                        guess
                    );
                    anchor
                }
                None => {
                    if self.strict {
                        return Err(EngineError::Apply {
                            hunk_index,
                            reason: ApplyFailure::CannotLocate,
                        });
                    }
                    debug!(
                        "skipping hunk {} (no anchor near line {})",
                        hunk_index, guess
                    );
                    skipped_hunks.push(hunk_index);
                    continue;
                }
            };

            // An anchor inside a previously inserted region means two
            // hunks are fighting over the same lines.
            if anchor < origin_map.len() && origin_map[anchor].is_inserted() {
                return Err(EngineError::Apply {
                    hunk_index,
                    reason: ApplyFailure::Overlap,
                });
            }

            self.apply_hunk_at(
                hunk,
                hunk_index,
                anchor,
                &mut result_lines,
                &mut origin_map,
                &mut added_lines,
                &mut removed_original_indices,
            )?;

            // Derived, not incrementally maintained: the net offset between
            // header positions and the working copy after this hunk.
            line_bias = result_lines.len() as i64 - n_original as i64;
        }

        added_lines.sort_unstable();
        added_lines.dedup();
        removed_original_indices.sort_unstable();
        removed_original_indices.dedup();

        let mut text = result_lines.join("\n");
        let wants_trailing_newline = if patch.new_missing_newline {
            false
        } else if patch.old_missing_newline {
            true
        } else {
            original.ends_with('\n')
        };
        if wants_trailing_newline && !result_lines.is_empty() {
            text.push('\n');
        }

        Ok(ApplyResult {
            text,
            added_lines,
            removed_original_indices,
            origin_map,
            skipped_hunks,
        })
    }

    /// Alias of [`DiffApplier::apply`] documenting intent: the engine has
    /// no side effects, so previewing a patch is the same computation.
    pub fn preview(&self, original: &str, patch: &FilePatch) -> Result<ApplyResult> {
        self.apply(original, patch)
    }

    /// Walk one anchored hunk over the working copy, mutating lines and
    /// provenance in lockstep.
    #[allow(clippy::too_many_arguments)]
    fn apply_hunk_at(
        &self,
        hunk: &Hunk,
        hunk_index: usize,
        anchor: usize,
        result_lines: &mut Vec<String>,
        origin_map: &mut Vec<Origin>,
        added_lines: &mut Vec<usize>,
        removed_original_indices: &mut Vec<usize>,
    ) -> Result<()> {
        let mut cursor = anchor;
        for line in &hunk.lines {
            match line.kind {
                LineKind::Context if line.text.is_empty() => {
                    // Mirror the match predicate: a blank context line
                    // swallows any run of blank lines.
                    while cursor < result_lines.len() && result_lines[cursor].is_empty() {
                        cursor += 1;
                    }
                }
                LineKind::Context => {
                    if cursor >= result_lines.len() || result_lines[cursor] != line.text {
                        return Err(EngineError::Apply {
                            hunk_index,
                            reason: ApplyFailure::ContextMismatch,
                        });
                    }
                    cursor += 1;
                }
                LineKind::Remove => {
                    if cursor >= result_lines.len() || result_lines[cursor] != line.text {
                        return Err(EngineError::Apply {
                            hunk_index,
                            reason: ApplyFailure::ContextMismatch,
                        });
                    }
                    match origin_map[cursor] {
                        Origin::Original(original_index) => {
                            removed_original_indices.push(original_index);
                        }
                        // Deleting a line another hunk just inserted.
                        Origin::Inserted => {
                            return Err(EngineError::Apply {
                                hunk_index,
                                reason: ApplyFailure::Overlap,
                            });
                        }
                    }
                    result_lines.remove(cursor);
                    origin_map.remove(cursor);
                }
                LineKind::Add => {
                    result_lines.insert(cursor, line.text.clone());
                    origin_map.insert(cursor, Origin::Inserted);
                    added_lines.push(cursor);
                    cursor += 1;
                }
            }
        }
        Ok(())
    }

    /// Locate the hunk's consuming sequence in the working copy: exact at
    /// the guess, then an expanding ring `guess ± r`, then a global scan.
    fn find_anchor_index(
        &self,
        lines: &[String],
        hunk: &Hunk,
        guess: usize,
    ) -> Option<(usize, AnchorStrategy)> {
        let consuming: Vec<&HunkLine> = hunk.consuming_lines().collect();

        if consuming.is_empty() {
            // Pure insertion: the clamped guess is the anchor.
            return Some((guess.min(lines.len()), AnchorStrategy::Exact));
        }

        // Blank context matches zero-or-more lines, so only removals and
        // non-blank context contribute to the minimum span.
        let min_needed = consuming.iter().filter(|l| !l.is_blank_context()).count();
        let max_start = lines.len().checked_sub(min_needed)?;
        let guess = guess.min(max_start);

        if hunk_matches_at(lines, &consuming, guess) {
            return Some((guess, AnchorStrategy::Exact));
        }

        for radius in 1..=self.fuzzy_context {
            if radius <= guess {
                let left = guess - radius;
                if hunk_matches_at(lines, &consuming, left) {
                    return Some((left, AnchorStrategy::Ring));
                }
            }
            let right = guess + radius;
            if right <= max_start && hunk_matches_at(lines, &consuming, right) {
                return Some((right, AnchorStrategy::Ring));
            }
        }

        (0..=max_start)
            .find(|&pos| hunk_matches_at(lines, &consuming, pos))
            .map(|pos| (pos, AnchorStrategy::Scan))
    }
}

/// Non-mutating match of the consuming sequence at `start`. Blank context
/// lines greedily swallow runs of blank lines; everything else must match
/// exactly.
fn hunk_matches_at(lines: &[String], consuming: &[&HunkLine], start: usize) -> bool {
    let mut cursor = start;
    for line in consuming {
        if line.is_blank_context() {
            while cursor < lines.len() && lines[cursor].is_empty() {
                cursor += 1;
            }
        } else {
            if cursor >= lines.len() || lines[cursor] != line.text {
                return false;
            }
            cursor += 1;
        }
    }
    true
}

fn clamp_index(value: i64, upper: usize) -> usize {
    if value <= 0 {
        0
    } else {
        (value as usize).min(upper)
    }
}
