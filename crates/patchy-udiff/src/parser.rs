//! Tolerant parser for unified diff text.
//!
//! Accepts git-style and plain unified diffs, context-style file header
//! pairs (`*** old` / `--- new`), context hunk headers (`*** a,b ****`,
//! translated into the unified line-kind model), VCS noise lines, blank
//! context lines, tab-terminated timestamps on header paths, and
//! `\ No newline at end of file` markers.

use patchy_core::constants::{
    CONTEXT_HUNK_HEADER, CONTEXT_NEW_RANGE, SKIP_PREFIXES, UNIFIED_HUNK_HEADER,
};
use patchy_core::{EngineError, FilePatch, Hunk, HunkLine, LineKind, Result};
use regex::Captures;
use tracing::debug;

/// How far past an old-side header to look for its new-side partner,
/// skipping blank lines and VCS noise on the way.
const HEADER_LOOKAHEAD: usize = 3;

/// Stateless front end over the single-pass walk below.
pub struct DiffParser;

impl DiffParser {
    /// Parse diff text into file patches, failing fast on the first
    /// grammar violation. Patches appear in header order, hunks in source
    /// order.
    pub fn parse(content: &str) -> Result<Vec<FilePatch>> {
        let mut walker = Walker::new(content, true);
        walker.run()?;
        Ok(walker.patches)
    }

    /// Same walk as [`DiffParser::parse`], but accumulates every grammar
    /// violation instead of raising. Returns whether the input is clean
    /// and the violations sorted by line number.
    pub fn validate(content: &str) -> (bool, Vec<(usize, String)>) {
        let mut walker = Walker::new(content, false);
        // Accumulating mode never returns an error.
        let _ = walker.run();
        let mut errors = walker.errors;
        errors.sort_by(|a, b| a.0.cmp(&b.0));
        (errors.is_empty(), errors)
    }
}

/// Which file-header style opened the current pair.
#[derive(Clone, Copy)]
enum HeaderStyle {
    /// `--- old` followed by `+++ new`.
    Unified,
    /// `*** old` followed by `--- new`.
    Contextish,
}

struct Walker<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    fail_fast: bool,
    errors: Vec<(usize, String)>,
    patches: Vec<FilePatch>,
}

impl<'a> Walker<'a> {
    fn new(content: &'a str, fail_fast: bool) -> Self {
        Walker {
            // `lines()` also strips a stray CR before LF.
            lines: content.lines().collect(),
            pos: 0,
            fail_fast,
            errors: Vec::new(),
            patches: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<()> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];

            if is_skip_line(line) {
                self.pos += 1;
                continue;
            }

            // Hunk headers before file headers: `*** 12,20 ****` must not
            // be mistaken for a `*** <path>` header.
            if let Some(caps) = CONTEXT_HUNK_HEADER.captures(line) {
                self.consume_context_hunk(&caps)?;
                continue;
            }
            if let Some(caps) = UNIFIED_HUNK_HEADER.captures(line) {
                self.consume_unified_hunk(&caps)?;
                continue;
            }

            if header_path(line, "*** ").is_some() {
                self.open_file_section(HeaderStyle::Contextish)?;
                continue;
            }
            if header_path(line, "--- ").is_some() {
                self.open_file_section(HeaderStyle::Unified)?;
                continue;
            }

            // Free-form preamble between sections.
            self.pos += 1;
        }

        if self.patches.is_empty() {
            self.fail(0, "no file patches found".to_string())?;
        }
        Ok(())
    }

    /// Record a violation: raise in fail-fast mode, accumulate otherwise.
    fn fail(&mut self, line_no: usize, message: String) -> Result<()> {
        if self.fail_fast {
            return Err(EngineError::Parse { line_no, message });
        }
        self.errors.push((line_no, message));
        Ok(())
    }

    /// Open a `FilePatch` from a header pair. The new-side marker must
    /// appear within a short lookahead that tolerates blank and noise
    /// lines in between.
    fn open_file_section(&mut self, style: HeaderStyle) -> Result<()> {
        let (old_marker, new_marker, expectation) = match style {
            HeaderStyle::Unified => ("--- ", "+++ ", "expected +++ <new> after --- <old>"),
            HeaderStyle::Contextish => ("*** ", "--- ", "expected --- <new> after *** <old>"),
        };
        let old_raw = match header_path(self.lines[self.pos], old_marker) {
            Some(p) => p,
            None => {
                // Caller matched the marker; reaching here means the path
                // failed the digit guard. Treat as preamble.
                self.pos += 1;
                return Ok(());
            }
        };

        let mut found = None;
        let limit = (self.pos + 1 + HEADER_LOOKAHEAD).min(self.lines.len());
        let mut j = self.pos + 1;
        while j < limit {
            let candidate = self.lines[j];
            if candidate.is_empty() || is_skip_line(candidate) {
                j += 1;
                continue;
            }
            found = header_path(candidate, new_marker).map(|p| (j, p));
            break;
        }

        match found {
            Some((j, new_raw)) => {
                let patch = FilePatch::new(clean_path(old_raw), clean_path(new_raw));
                debug!(
                    "opened file section: {} -> {}",
                    patch.old_path, patch.new_path
                );
                self.patches.push(patch);
                self.pos = j + 1;
            }
            None => {
                self.fail(self.pos, expectation.to_string())?;
                self.pos += 1;
            }
        }
        Ok(())
    }

    fn consume_unified_hunk(&mut self, caps: &Captures<'_>) -> Result<()> {
        let header_no = self.pos;
        if self.patches.is_empty() {
            self.fail(header_no, "hunk found before file headers".to_string())?;
            self.pos += 1;
            return Ok(());
        }
        let parsed = (
            group_or(caps, 1, 1),
            group_or(caps, 2, 1),
            group_or(caps, 3, 1),
            group_or(caps, 4, 1),
        );
        let (Some(old_start), Some(old_len), Some(new_start), Some(new_len)) = parsed else {
            self.fail(header_no, "hunk header range out of bounds".to_string())?;
            self.pos += 1;
            return Ok(());
        };
        self.push_hunk(Hunk {
            // Header starts are 1-based on the wire; `0` (pure-insertion
            // headers like `@@ -0,0 +1 @@`) clamps to the first line.
            old_start: old_start.saturating_sub(1),
            old_len,
            new_start: new_start.saturating_sub(1),
            new_len,
            lines: Vec::new(),
        });
        self.pos += 1;
        self.consume_hunk_body(false)
    }

    fn consume_context_hunk(&mut self, caps: &Captures<'_>) -> Result<()> {
        let header_no = self.pos;
        if self.patches.is_empty() {
            self.fail(header_no, "hunk found before file headers".to_string())?;
            self.pos += 1;
            return Ok(());
        }
        let (Some(old_start), Some(old_len)) = (group_or(caps, 1, 1), group_or(caps, 2, 1)) else {
            self.fail(header_no, "hunk header range out of bounds".to_string())?;
            self.pos += 1;
            return Ok(());
        };
        // The new range arrives later as a `--- c,d ----` body line; until
        // then mirror the old range.
        self.push_hunk(Hunk {
            old_start: old_start.saturating_sub(1),
            old_len,
            new_start: old_start.saturating_sub(1),
            new_len: old_len,
            lines: Vec::new(),
        });
        self.pos += 1;
        self.consume_hunk_body(true)
    }

    /// Consume body lines until the next hunk header, the next file
    /// header, a noise line, or end of input.
    fn consume_hunk_body(&mut self, context_style: bool) -> Result<()> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];

            if UNIFIED_HUNK_HEADER.is_match(line)
                || CONTEXT_HUNK_HEADER.is_match(line)
                || is_skip_line(line)
                || header_path(line, "--- ").is_some()
                || header_path(line, "*** ").is_some()
            {
                break;
            }

            if context_style {
                if let Some(caps) = CONTEXT_NEW_RANGE.captures(line) {
                    match (group_or(&caps, 1, 1), group_or(&caps, 2, 1)) {
                        (Some(new_start), Some(new_len)) => {
                            if let Some(hunk) = self.current_hunk() {
                                hunk.new_start = new_start.saturating_sub(1);
                                hunk.new_len = new_len;
                            }
                        }
                        _ => {
                            self.fail(self.pos, "hunk header range out of bounds".to_string())?;
                        }
                    }
                    self.pos += 1;
                    continue;
                }
            }

            if line.is_empty() {
                // Naked blank line inside a hunk: blank context.
                self.push_body_line(HunkLine::new(LineKind::Context, ""));
            } else if line.starts_with('\\') {
                // `\ No newline at end of file` (and variants).
                self.note_missing_newline();
            } else {
                match line.chars().next().and_then(LineKind::from_prefix) {
                    Some(kind) => self.push_body_line(HunkLine::new(kind, &line[1..])),
                    None => {
                        self.fail(self.pos, format!("unexpected hunk content line: {line}"))?;
                    }
                }
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn push_hunk(&mut self, hunk: Hunk) {
        if let Some(patch) = self.patches.last_mut() {
            patch.hunks.push(hunk);
        }
    }

    fn current_hunk(&mut self) -> Option<&mut Hunk> {
        self.patches.last_mut().and_then(|p| p.hunks.last_mut())
    }

    fn push_body_line(&mut self, line: HunkLine) {
        if let Some(hunk) = self.current_hunk() {
            hunk.lines.push(line);
        }
    }

    /// Attribute a missing-newline marker to the side of the preceding
    /// body line: `+` is the new side, `-` the old side, context both.
    fn note_missing_newline(&mut self) {
        let side = self
            .patches
            .last()
            .and_then(|p| p.hunks.last())
            .and_then(|h| h.lines.last())
            .map(|l| l.kind);
        if let Some(patch) = self.patches.last_mut() {
            match side {
                Some(LineKind::Add) => patch.new_missing_newline = true,
                Some(LineKind::Remove) => patch.old_missing_newline = true,
                _ => {
                    patch.old_missing_newline = true;
                    patch.new_missing_newline = true;
                }
            }
        }
    }
}

fn is_skip_line(line: &str) -> bool {
    SKIP_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// A numeric capture group with a default for an absent group. `None`
/// means the digits overflow usize.
fn group_or(caps: &Captures<'_>, idx: usize, default: usize) -> Option<usize> {
    match caps.get(idx) {
        Some(m) => m.as_str().parse().ok(),
        None => Some(default),
    }
}

/// Extract the path candidate after a file-header marker. Candidates that
/// start with a digit are rejected: that is the guard that keeps context
/// hunk range lines (`--- 14,22 ----`) from being taken for file headers.
fn header_path<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(marker)?.trim_start();
    let first = rest.chars().next()?;
    if first.is_ascii_digit() {
        return None;
    }
    Some(rest)
}

/// Normalize a header path: drop the timestamp after the first tab, pass
/// `/dev/null` through untouched, strip a leading `a/` or `b/`, trim.
fn clean_path(raw: &str) -> String {
    let mut path = raw.trim_end();
    if let Some((head, _timestamp)) = path.split_once('\t') {
        path = head.trim_end();
    }
    if path == "/dev/null" {
        return path.to_string();
    }
    let path = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    path.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "\
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,3 @@
 fn main() {
-    println!(\"Hello\");
+    println!(\"Hello, world!\");
 }
";

    #[test]
    fn test_parse_simple_unified() {
        let patches = DiffParser::parse(SIMPLE).unwrap();
        assert_eq!(patches.len(), 1);
        let patch = &patches[0];
        assert_eq!(patch.old_path, "src/main.rs");
        assert_eq!(patch.new_path, "src/main.rs");
        assert_eq!(patch.hunks.len(), 1);

        let hunk = &patch.hunks[0];
        assert_eq!((hunk.old_start, hunk.old_len), (0, 3));
        assert_eq!((hunk.new_start, hunk.new_len), (0, 3));
        assert_eq!(hunk.lines.len(), 4);
        assert_eq!(hunk.lines[1].kind, LineKind::Remove);
        assert_eq!(hunk.lines[1].text, "    println!(\"Hello\");");
        assert_eq!(hunk.lines[2].kind, LineKind::Add);
    }

    #[test]
    fn test_parse_skips_git_noise() {
        let input = "\
diff --git a/x.txt b/x.txt
index 83db48f..bf269f4 100644
--- a/x.txt
+++ b/x.txt
@@ -1 +1 @@
-old
+new
";
        let patches = DiffParser::parse(input).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].old_path, "x.txt");
    }

    #[test]
    fn test_parse_timestamp_suffix_truncated() {
        let input = "\
--- a/notes.txt\t2024-05-01 10:00:00.000000000 +0000
+++ b/notes.txt\t2024-05-02 10:00:00.000000000 +0000
@@ -1 +1 @@
-a
+b
";
        let patches = DiffParser::parse(input).unwrap();
        assert_eq!(patches[0].old_path, "notes.txt");
        assert_eq!(patches[0].new_path, "notes.txt");
    }

    #[test]
    fn test_parse_dev_null_passthrough() {
        let input = "\
--- /dev/null
+++ b/created.txt
@@ -0,0 +1 @@
+hello
";
        let patches = DiffParser::parse(input).unwrap();
        assert_eq!(patches[0].old_path, "/dev/null");
        assert_eq!(patches[0].new_path, "created.txt");
        // Header `-0` clamps to line index 0.
        assert_eq!(patches[0].hunks[0].old_start, 0);
        assert_eq!(patches[0].hunks[0].old_len, 0);
    }

    #[test]
    fn test_parse_multi_file_order_preserved() {
        let input = "\
--- a/a.txt
+++ b/a.txt
@@ -1 +1 @@
-one
+ONE
diff --git a/b.txt b/b.txt
index 000000..111111 100644
--- a/b.txt
+++ b/b.txt
@@ -1 +1 @@
-two
+TWO
";
        let patches = DiffParser::parse(input).unwrap();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].old_path, "a.txt");
        assert_eq!(patches[1].old_path, "b.txt");
        assert_eq!(patches[0].hunks.len(), 1);
        assert_eq!(patches[1].hunks.len(), 1);
    }

    #[test]
    fn test_parse_preamble_tolerated() {
        let input = "\
From: someone <someone@example.com>
Subject: [PATCH] tweak

Some prose explaining the change.

--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-x
+y
";
        let patches = DiffParser::parse(input).unwrap();
        assert_eq!(patches.len(), 1);
    }

    #[test]
    fn test_parse_blank_body_line_becomes_blank_context() {
        let input = "\
--- a/f.txt
+++ b/f.txt
@@ -1,3 +1,3 @@
 foo

-bar
+baz
";
        let patches = DiffParser::parse(input).unwrap();
        let hunk = &patches[0].hunks[0];
        assert!(hunk.lines[1].is_blank_context());
    }

    #[test]
    fn test_parse_missing_newline_marker_new_side() {
        let input = "\
--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-old
+new
\\ No newline at end of file
";
        let patches = DiffParser::parse(input).unwrap();
        assert!(patches[0].new_missing_newline);
        assert!(!patches[0].old_missing_newline);
        // The marker itself emits no body line.
        assert_eq!(patches[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_parse_missing_newline_marker_old_side() {
        let input = "\
--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-old
\\ No newline at end of file
+new
";
        let patches = DiffParser::parse(input).unwrap();
        assert!(patches[0].old_missing_newline);
        assert!(!patches[0].new_missing_newline);
    }

    #[test]
    fn test_parse_contextish_header_pair() {
        let input = "\
*** old.txt
--- new.txt
@@ -1 +1 @@
-a
+b
";
        let patches = DiffParser::parse(input).unwrap();
        assert_eq!(patches[0].old_path, "old.txt");
        assert_eq!(patches[0].new_path, "new.txt");
    }

    #[test]
    fn test_parse_context_hunk_header_translated() {
        let input = "\
*** old.txt
--- new.txt
*** 3,5 ****
 alpha
-beta
+BETA
--- 3,5 ----
 gamma
";
        let patches = DiffParser::parse(input).unwrap();
        let hunk = &patches[0].hunks[0];
        assert_eq!((hunk.old_start, hunk.old_len), (2, 5));
        assert_eq!((hunk.new_start, hunk.new_len), (2, 5));
        // The `--- 3,5 ----` range line emits nothing; body lines keep the
        // unified line-kind model.
        assert_eq!(hunk.lines.len(), 4);
        assert_eq!(hunk.lines[3].text, "gamma");
    }

    #[test]
    fn test_parse_hunk_before_header_is_error() {
        let input = "@@ -1 +1 @@\n-a\n+b\n";
        let err = DiffParser::parse(input).unwrap_err();
        assert!(matches!(err, EngineError::Parse { line_no: 0, .. }));
    }

    #[test]
    fn test_parse_dangling_old_header_is_error() {
        let input = "--- a/f.txt\nnot a header\n";
        let err = DiffParser::parse(input).unwrap_err();
        assert!(matches!(err, EngineError::Parse { line_no: 0, .. }));
        assert!(err.to_string().contains("+++"));
    }

    #[test]
    fn test_parse_garbage_body_line_is_error() {
        let input = "\
--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-a
garbage here
";
        let err = DiffParser::parse(input).unwrap_err();
        assert!(matches!(err, EngineError::Parse { line_no: 4, .. }));
    }

    #[test]
    fn test_parse_empty_input_is_error() {
        let err = DiffParser::parse("").unwrap_err();
        assert!(err.to_string().contains("no file patches found"));
        let err = DiffParser::parse("just some prose\n").unwrap_err();
        assert!(matches!(err, EngineError::Parse { line_no: 0, .. }));
    }

    #[test]
    fn test_parse_crlf_input_tolerated() {
        let input = "--- a/f.txt\r\n+++ b/f.txt\r\n@@ -1 +1 @@\r\n-a\r\n+b\r\n";
        let patches = DiffParser::parse(input).unwrap();
        assert_eq!(patches[0].hunks[0].lines[0].text, "a");
        assert_eq!(patches[0].hunks[0].lines[1].text, "b");
    }

    #[test]
    fn test_parse_short_hunk_header_defaults_to_one() {
        let input = "\
--- a/f.txt
+++ b/f.txt
@@ -5 +7 @@ trailing label
-a
+b
";
        let patches = DiffParser::parse(input).unwrap();
        let hunk = &patches[0].hunks[0];
        assert_eq!((hunk.old_start, hunk.old_len), (4, 1));
        assert_eq!((hunk.new_start, hunk.new_len), (6, 1));
    }

    #[test]
    fn test_parse_explicit_zero_length_kept() {
        let input = "\
--- a/f.txt
+++ b/f.txt
@@ -3,0 +4,2 @@
+one
+two
";
        let patches = DiffParser::parse(input).unwrap();
        let hunk = &patches[0].hunks[0];
        assert_eq!(hunk.old_len, 0);
        assert_eq!(hunk.new_len, 2);
    }

    #[test]
    fn test_validate_accumulates_sorted() {
        let input = "\
@@ -1 +1 @@
-a
--- a/f.txt
+++ b/f.txt
@@ -1 +1 @@
-a
?bad
+b
?bad again
";
        let (ok, errors) = DiffParser::validate(input);
        assert!(!ok);
        assert!(errors.len() >= 3);
        let line_nos: Vec<usize> = errors.iter().map(|(n, _)| *n).collect();
        let mut sorted = line_nos.clone();
        sorted.sort_unstable();
        assert_eq!(line_nos, sorted);
        assert_eq!(line_nos[0], 0);
    }

    #[test]
    fn test_validate_clean_input() {
        let (ok, errors) = DiffParser::validate(SIMPLE);
        assert!(ok);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = DiffParser::parse(SIMPLE).unwrap();
        let b = DiffParser::parse(SIMPLE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_clean_path_variants() {
        assert_eq!(clean_path("a/src/x.rs"), "src/x.rs");
        assert_eq!(clean_path("b/src/x.rs"), "src/x.rs");
        assert_eq!(clean_path("src/x.rs"), "src/x.rs");
        assert_eq!(clean_path("/dev/null"), "/dev/null");
        assert_eq!(clean_path("a/x.rs\t2024-01-01 00:00:00"), "x.rs");
        assert_eq!(clean_path("  a/x.rs  "), "x.rs");
    }

    #[test]
    fn test_header_path_digit_guard() {
        assert_eq!(header_path("--- a/f.txt", "--- "), Some("a/f.txt"));
        assert_eq!(header_path("--- 14,22 ----", "--- "), None);
        assert_eq!(header_path("+++ b/f.txt", "+++ "), Some("b/f.txt"));
        assert_eq!(header_path("--- ", "--- "), None);
    }
}
