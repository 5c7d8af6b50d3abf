//! Document - Rope-backed line buffer that reports granular deltas
//!
//! Every mutation is broken into the small steps the layout code understands:
//! text inserted or removed within a row, a line break inserted or removed,
//! and whole rows inserted or removed. Planning and applying are separate so a
//! session can react to each delta while the document is in the matching
//! intermediate state.

use std::borrow::Cow;

use ropey::Rope;
use serde::{Deserialize, Serialize};

use crate::display_map::{Point, Range};

/// Read-only line access used by layout and fold providers
pub trait TextSource {
    /// Text of `row` without its line break; empty past the end
    fn line(&self, row: usize) -> Cow<'_, str>;

    /// Number of rows; a document always has at least one
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of `row` in characters
    fn line_len(&self, row: usize) -> usize {
        self.line(row).chars().count()
    }
}

/// Kind of change a [`Delta`] describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaAction {
    /// Text inserted at a position; a lone line break spans two rows
    InsertText,
    /// Whole rows inserted before `range.start.row`
    InsertLines,
    /// Text removed from a row, or a line break joining two rows
    RemoveText,
    /// Whole rows removed
    RemoveLines,
}

/// One granular document change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub action: DeltaAction,
    pub range: Range,
    /// Inserted or removed text split into rows; a line break is `["", ""]`
    pub lines: Vec<String>,
}

impl Delta {
    fn new(action: DeltaAction, range: Range, lines: Vec<String>) -> Self {
        Self { action, range, lines }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self.action, DeltaAction::InsertText | DeltaAction::InsertLines)
    }

    pub fn is_lines(&self) -> bool {
        matches!(self.action, DeltaAction::InsertLines | DeltaAction::RemoveLines)
    }
}

/// Line buffer backed by a [`Rope`]
#[derive(Clone, Debug, Default)]
pub struct Document {
    rope: Rope,
}

impl Document {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let text = lines
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(&text)
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Rows `first..=last` as owned strings
    pub fn lines(&self, first: usize, last: usize) -> Vec<String> {
        let last = last.min(self.len().saturating_sub(1));
        (first..=last).map(|row| self.line(row).into_owned()).collect()
    }

    /// Clamp `point` into the document
    pub fn clip_position(&self, point: Point) -> Point {
        let len = self.len();
        if point.row >= len {
            let row = len.saturating_sub(1);
            return Point::new(row, self.line_len(row));
        }
        Point::new(point.row, point.column.min(self.line_len(point.row)))
    }

    /// Deltas that insert `text` at `at`, and the position after the text
    pub fn plan_insert(&self, at: Point, text: &str) -> (Point, Vec<Delta>) {
        let mut position = self.clip_position(at);
        let mut deltas = Vec::new();
        if text.is_empty() {
            return (position, deltas);
        }

        let lines = split_lines(text);
        let (first, rest) = lines.split_first().map_or(("", &[][..]), |(first, rest)| {
            (first.as_str(), rest)
        });

        if !first.is_empty() {
            let end = Point::new(position.row, position.column + first.chars().count());
            deltas.push(Delta::new(
                DeltaAction::InsertText,
                Range::from_points(position, end),
                vec![first.to_string()],
            ));
            position = end;
        }

        if let Some((last, middle)) = rest.split_last() {
            let end = Point::new(position.row + 1, 0);
            deltas.push(Delta::new(
                DeltaAction::InsertText,
                Range::from_points(position, end),
                vec![String::new(), String::new()],
            ));
            position = end;

            if !middle.is_empty() {
                let end = Point::new(position.row + middle.len(), 0);
                deltas.push(Delta::new(
                    DeltaAction::InsertLines,
                    Range::from_points(position, end),
                    middle.to_vec(),
                ));
                position = end;
            }

            if !last.is_empty() {
                let end = Point::new(position.row, last.chars().count());
                deltas.push(Delta::new(
                    DeltaAction::InsertText,
                    Range::from_points(position, end),
                    vec![last.clone()],
                ));
                position = end;
            }
        }

        (position, deltas)
    }

    /// Deltas that remove `range`, and the position where it started
    pub fn plan_remove(&self, range: Range) -> (Point, Vec<Delta>) {
        let range = Range::from_points(
            self.clip_position(range.start),
            self.clip_position(range.end),
        )
        .ordered();
        let mut deltas = Vec::new();
        if range.is_empty() {
            return (range.start, deltas);
        }

        let first_row = range.start.row;
        let last_row = range.end.row;

        if !range.is_multi_line() {
            let line = self.line(first_row);
            deltas.push(Delta::new(
                DeltaAction::RemoveText,
                range,
                vec![char_slice(&line, range.start.column, range.end.column).to_string()],
            ));
            return (range.start, deltas);
        }

        let first_full_row = if range.start.column == 0 {
            first_row
        } else {
            first_row + 1
        };
        let last_full_row = last_row - 1;

        if range.end.column > 0 {
            let line = self.line(last_row);
            deltas.push(Delta::new(
                DeltaAction::RemoveText,
                Range::new(last_row, 0, last_row, range.end.column),
                vec![char_slice(&line, 0, range.end.column).to_string()],
            ));
        }

        if last_full_row + 1 > first_full_row {
            deltas.push(Delta::new(
                DeltaAction::RemoveLines,
                Range::new(first_full_row, 0, last_full_row + 1, 0),
                self.lines(first_full_row, last_full_row),
            ));
        }

        if first_full_row != first_row {
            let line = self.line(first_row);
            let len = line.chars().count();
            if range.start.column < len {
                deltas.push(Delta::new(
                    DeltaAction::RemoveText,
                    Range::new(first_row, range.start.column, first_row, len),
                    vec![char_slice(&line, range.start.column, len).to_string()],
                ));
            }
            deltas.push(Delta::new(
                DeltaAction::RemoveText,
                Range::new(first_row, range.start.column, first_row + 1, 0),
                vec![String::new(), String::new()],
            ));
        }

        (range.start, deltas)
    }

    /// Apply one delta to the rope
    pub fn apply_delta(&mut self, delta: &Delta) {
        match delta.action {
            DeltaAction::InsertText => {
                let index = self.char_index(delta.range.start);
                self.rope.insert(index, &delta.lines.join("\n"));
            }
            DeltaAction::InsertLines => {
                let row = delta.range.start.row.min(self.rope.len_lines());
                let index = self.rope.line_to_char(row);
                let mut text = String::new();
                for line in &delta.lines {
                    text.push_str(line);
                    text.push('\n');
                }
                self.rope.insert(index, &text);
            }
            DeltaAction::RemoveText | DeltaAction::RemoveLines => {
                let start = self.char_index(delta.range.start);
                let end = self.char_index(delta.range.end);
                if start < end {
                    self.rope.remove(start..end);
                }
            }
        }
    }

    /// Insert `text` at `at`, returning the end position and the applied deltas
    pub fn insert(&mut self, at: Point, text: &str) -> (Point, Vec<Delta>) {
        let (end, deltas) = self.plan_insert(at, text);
        for delta in &deltas {
            self.apply_delta(delta);
        }
        (end, deltas)
    }

    /// Remove `range`, returning its start and the applied deltas
    pub fn remove(&mut self, range: Range) -> (Point, Vec<Delta>) {
        let (start, deltas) = self.plan_remove(range);
        for delta in &deltas {
            self.apply_delta(delta);
        }
        (start, deltas)
    }

    /// Replace `range` with `text`
    pub fn replace(&mut self, range: Range, text: &str) -> (Point, Vec<Delta>) {
        let (start, mut deltas) = self.remove(range);
        let (end, inserted) = self.insert(start, text);
        deltas.extend(inserted);
        (end, deltas)
    }

    /// Character index of `point`, which may sit right after a line's break
    fn char_index(&self, point: Point) -> usize {
        if point.row >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let line_start = self.rope.line_to_char(point.row);
        let next_line = if point.row + 1 < self.rope.len_lines() {
            self.rope.line_to_char(point.row + 1)
        } else {
            self.rope.len_chars()
        };
        (line_start + point.column).min(next_line)
    }
}

impl TextSource for Document {
    fn line(&self, row: usize) -> Cow<'_, str> {
        if row >= self.rope.len_lines() {
            return Cow::Borrowed("");
        }
        let slice = self.rope.line(row);
        let len = slice.len_chars();
        let content = len - line_break_len(&slice);
        slice.slice(..content).into()
    }

    fn len(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_len(&self, row: usize) -> usize {
        if row >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(row);
        slice.len_chars() - line_break_len(&slice)
    }
}

fn line_break_len(line: &ropey::RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    match (len.checked_sub(2).map(|i| line.char(i)), len.checked_sub(1).map(|i| line.char(i))) {
        (Some('\r'), Some('\n')) => 2,
        (_, Some('\n' | '\r')) => 1,
        _ => 0,
    }
}

/// Split on `\r\n`, `\r` and `\n`; always returns at least one line
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    lines.push(current);
    lines
}

/// Substring by character columns, clamped to the string
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |column: usize| {
        text.char_indices()
            .nth(column)
            .map_or(text.len(), |(index, _)| index)
    };
    let start_byte = byte_at(start);
    let end_byte = byte_at(end.max(start));
    &text[start_byte..end_byte]
}
