//! User-editable region preservation.
//!
//! A region is delimited by a pair of block comments:
//! ```c
//! /* USER INIT BEGIN */
//! hand-written code
//! /* USER INIT END */
//! ```
//! Keywords and names are case-insensitive and names may contain spaces;
//! `/* user Rx Hook begin */` names the region `RX HOOK`. A region is a
//! BEGIN marker whose next region marker is the END of the same name.
//! Anything else (stray ends, unmatched begins, interleaved pairs) is not a
//! region, so region content never contains region markers.
//!
//! Merging keeps the new text's structure and carries over the content of
//! every region the old text also has. When a name repeats, occurrences are
//! aligned from the end: the last occurrence in the new text receives the
//! last one from the old text, and so on backwards.

use std::collections::HashMap;
use std::ops::Range;

/// One region extracted from a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRegion {
    /// Normalized name: upper-case, single spaces.
    pub name: String,
    pub content: String,
}

/// All regions of one text, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRegionSet {
    regions: Vec<UserRegion>,
}

impl UserRegionSet {
    /// Content of the region `name`; the last occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = normalize(name.split_whitespace());
        self.regions
            .iter()
            .rev()
            .find(|r| r.name == name)
            .map(|r| r.content.as_str())
    }

    /// Distinct region names in order of first appearance.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for r in &self.regions {
            if !names.contains(&r.name.as_str()) {
                names.push(&r.name);
            }
        }
        names
    }

    pub fn regions(&self) -> &[UserRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Which regions a merge carried over, introduced or lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Names present in both texts; their old content was kept.
    pub preserved: Vec<String>,
    /// Names only in the new text, rendered as authored.
    pub added: Vec<String>,
    /// Names only in the old text; their content is gone.
    pub dropped: Vec<String>,
}

/// Extract every region of `text`. Never fails; malformed markers yield no region.
pub fn extract(text: &str) -> UserRegionSet {
    UserRegionSet {
        regions: spans(text)
            .into_iter()
            .map(|s| UserRegion {
                content: text[s.content].to_string(),
                name: s.name,
            })
            .collect(),
    }
}

/// Merge freshly rendered `new_text` with the `old_text` on disk.
pub fn merge(new_text: &str, old_text: &str) -> String {
    merge_with_report(new_text, old_text).0
}

/// [`merge`], also reporting preserved, added and dropped region names.
pub fn merge_with_report(new_text: &str, old_text: &str) -> (String, MergeReport) {
    let old_spans = spans(old_text);
    let mut old: HashMap<&str, Vec<&str>> = HashMap::new();
    for s in &old_spans {
        old.entry(s.name.as_str())
            .or_default()
            .push(&old_text[s.content.clone()]);
    }

    let new_spans = spans(new_text);
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for s in &new_spans {
        *totals.entry(s.name.as_str()).or_default() += 1;
    }

    let mut report = MergeReport::default();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut out = String::with_capacity(new_text.len().max(old_text.len()));
    let mut cursor = 0;

    for s in &new_spans {
        let name = s.name.as_str();
        let i = *seen.get(name).unwrap_or(&0);
        seen.insert(name, i + 1);
        let n = totals.get(name).copied().unwrap_or(0);

        let Some(olds) = old.get(name) else {
            push_unique(&mut report.added, name);
            continue;
        };
        push_unique(&mut report.preserved, name);
        // End-aligned: new occurrence i takes old occurrence i + m - n.
        if i + olds.len() >= n {
            let k = i + olds.len() - n;
            out.push_str(&new_text[cursor..s.content.start]);
            out.push_str(olds[k]);
            cursor = s.content.end;
        }
    }
    out.push_str(&new_text[cursor..]);

    for s in &old_spans {
        if !totals.contains_key(s.name.as_str()) {
            push_unique(&mut report.dropped, &s.name);
        }
    }

    (out, report)
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Begin,
    End,
}

#[derive(Debug)]
struct Marker {
    edge: Edge,
    name: String,
    /// Byte range of the whole comment, `/*` through `*/`.
    span: Range<usize>,
}

#[derive(Debug)]
struct Span {
    name: String,
    content: Range<usize>,
}

fn normalize<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the inside of a block comment as `USER <NAME> BEGIN|END`.
fn parse_marker(inner: &str) -> Option<(Edge, String)> {
    let words: Vec<&str> = inner.split_whitespace().collect();
    if words.len() < 3 || !words[0].eq_ignore_ascii_case("USER") {
        return None;
    }
    let last = words[words.len() - 1];
    let edge = if last.eq_ignore_ascii_case("BEGIN") {
        Edge::Begin
    } else if last.eq_ignore_ascii_case("END") {
        Edge::End
    } else {
        return None;
    };
    Some((edge, normalize(words[1..words.len() - 1].iter().copied())))
}

fn markers(text: &str) -> Vec<Marker> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find("/*") {
        let open = pos + offset;
        let inner_start = open + 2;
        let Some(close) = text[inner_start..].find("*/") else {
            break;
        };
        let inner_end = inner_start + close;
        let end = inner_end + 2;
        if let Some((edge, name)) = parse_marker(&text[inner_start..inner_end]) {
            found.push(Marker {
                edge,
                name,
                span: open..end,
            });
        }
        pos = end;
    }
    found
}

fn spans(text: &str) -> Vec<Span> {
    let markers = markers(text);
    let mut spans = Vec::new();
    let mut i = 0;
    while i < markers.len() {
        let begin = &markers[i];
        match markers.get(i + 1) {
            Some(end)
                if begin.edge == Edge::Begin
                    && end.edge == Edge::End
                    && end.name == begin.name =>
            {
                spans.push(Span {
                    name: begin.name.clone(),
                    content: begin.span.end..end.span.start,
                });
                i += 2;
            }
            _ => i += 1,
        }
    }
    spans
}
