//! Per-document state tracked by the HTML renderer.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// Table column alignments and position.
#[derive(Debug, Default)]
pub(crate) struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell: usize,
}

impl TableState {
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// ` style="..."` for the current cell, or an empty string.
    pub(crate) fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell) {
            Some(Alignment::Left) => r#" style="text-align: left""#,
            Some(Alignment::Center) => r#" style="text-align: center""#,
            Some(Alignment::Right) => r#" style="text-align: right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Alt text collected between image start and end.
#[derive(Debug, Default)]
pub(crate) struct ImageState {
    depth: usize,
    alt: String,
}

impl ImageState {
    pub(crate) fn start(&mut self) {
        if self.depth == 0 {
            self.alt.clear();
        }
        self.depth += 1;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt.push_str(text);
    }

    /// Finish the innermost image. Alt text is returned for the outermost one.
    pub(crate) fn end(&mut self) -> Option<String> {
        self.depth = self.depth.saturating_sub(1);
        (self.depth == 0).then(|| std::mem::take(&mut self.alt))
    }
}

/// Footnote numbering and collected definitions.
#[derive(Debug, Default)]
pub(crate) struct FootnoteState {
    numbers: HashMap<String, usize>,
    definitions: Vec<(String, String)>,
    open: Vec<(String, String)>,
}

impl FootnoteState {
    /// Number for a reference. Returns `true` alongside it on first use.
    pub(crate) fn reference(&mut self, label: &str) -> (usize, bool) {
        let key = label.to_lowercase();
        let next = self.numbers.len() + 1;
        let mut first = false;
        let number = *self.numbers.entry(key).or_insert_with(|| {
            first = true;
            next
        });
        (number, first)
    }

    /// Start capturing a definition. `output` is swapped for an empty buffer.
    pub(crate) fn start_definition(&mut self, label: &str, output: &mut String) {
        self.open
            .push((label.to_lowercase(), std::mem::take(output)));
    }

    /// Stop capturing and restore the outer output buffer.
    pub(crate) fn end_definition(&mut self, output: &mut String) {
        if let Some((label, outer)) = self.open.pop() {
            let body = std::mem::replace(output, outer);
            self.definitions.push((label, body));
        }
    }

    /// Definitions ordered by reference number. Unreferenced ones come last.
    pub(crate) fn take_definitions(&mut self) -> Vec<(String, String)> {
        let mut definitions = std::mem::take(&mut self.definitions);
        definitions.sort_by_key(|(label, _)| self.numbers.get(label).copied().unwrap_or(usize::MAX));
        definitions
    }
}
