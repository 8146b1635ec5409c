use crate::types::Mm;
use std::collections::BTreeMap;

/// Characters that had to be rendered with the square fallback because no
/// glyph asset resolved for them. Keyed by codepoint so the report is
/// ordered and merge-friendly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphCoverageReport {
    missing: BTreeMap<u32, MissingGlyph>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingGlyph {
    pub codepoint: u32,
    pub ch: char,
    pub key: String,
    pub count: usize,
}

impl GlyphCoverageReport {
    pub fn record_missing(&mut self, ch: char, key: impl Into<String>) {
        let codepoint = ch as u32;
        let entry = self.missing.entry(codepoint).or_insert(MissingGlyph {
            codepoint,
            ch,
            key: key.into(),
            count: 0,
        });
        entry.count = entry.count.saturating_add(1);
    }

    pub fn merge(&mut self, other: GlyphCoverageReport) {
        for (codepoint, missing) in other.missing {
            let entry = self.missing.entry(codepoint).or_insert(MissingGlyph {
                codepoint,
                ch: missing.ch,
                key: missing.key.clone(),
                count: 0,
            });
            entry.count = entry.count.saturating_add(missing.count);
        }
    }

    pub fn contains(&self, ch: char) -> bool {
        self.missing.contains_key(&(ch as u32))
    }

    pub fn missing(&self) -> Vec<MissingGlyph> {
        self.missing.values().cloned().collect()
    }

    pub fn characters(&self) -> Vec<char> {
        self.missing.values().map(|m| m.ch).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn len(&self) -> usize {
        self.missing.len()
    }
}

/// Lines whose rendered width exceeds the available content width, mapped to
/// the positive excess. Purely a diagnostic: overflowing lines are still
/// placed in full.
pub type OverflowReport = BTreeMap<usize, Mm>;
