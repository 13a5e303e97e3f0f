//! Patch summaries and re-rendering for UI panes.

use serde::{Deserialize, Serialize};

use crate::model::{FilePatch, LineKind};

/// Totals for one file section, consumed by the summary bar
/// (`+adds / -dels / #hunks`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSummary {
    pub additions: usize,
    pub deletions: usize,
    pub hunk_count: usize,
}

/// Count additions, deletions, and hunks in a [`FilePatch`].
pub fn summarize_patch(patch: &FilePatch) -> PatchSummary {
    let mut additions = 0;
    let mut deletions = 0;
    for hunk in &patch.hunks {
        for line in &hunk.lines {
            match line.kind {
                LineKind::Add => additions += 1,
                LineKind::Remove => deletions += 1,
                LineKind::Context => {}
            }
        }
    }
    PatchSummary {
        additions,
        deletions,
        hunk_count: patch.hunks.len(),
    }
}

/// Render a single file section back to unified diff text for the
/// file-diff pane. Hunk starts are converted back to the 1-based wire form.
pub fn format_file_diff(patch: &FilePatch) -> String {
    let old = if patch.old_path.is_empty() {
        "/dev/null"
    } else {
        &patch.old_path
    };
    let new = if patch.new_path.is_empty() {
        "/dev/null"
    } else {
        &patch.new_path
    };
    let mut out = vec![format!("--- a/{}", old), format!("+++ b/{}", new)];
    for hunk in &patch.hunks {
        out.push(format!(
            "@@ -{},{} +{},{} @@",
            hunk.old_start + 1,
            hunk.old_len,
            hunk.new_start + 1,
            hunk.new_len
        ));
        for line in &hunk.lines {
            out.push(format!("{}{}", line.kind.prefix(), line.text));
        }
    }
    out.join("\n")
}
