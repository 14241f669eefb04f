// ABOUTME: Cursor-relative fenced code block locator.
// ABOUTME: Scans backward and forward from the cursor line for the enclosing ``` fences.

/// Marker that opens and closes a fenced block.
pub const FENCE_MARKER: &str = "```";

/// Read-only line access to a document supplied by the host editor.
pub trait Document {
    /// Number of lines in the document.
    fn line_count(&self) -> usize;
    /// Text of line `index`, without its line terminator.
    fn line(&self, index: usize) -> Option<&str>;
}

impl<S: AsRef<str>> Document for [S] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> Document for Vec<S> {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

/// An owned document built from raw text, split on line breaks.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    lines: Vec<String>,
}

impl TextDocument {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

impl Document for TextDocument {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }
}

/// A fenced block found around the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Trimmed text strictly between the two fence lines.
    pub content: String,
    /// Line index of the opening fence.
    pub start_line: usize,
    /// Line index of the closing fence.
    pub end_line: usize,
    /// Info string after the opening marker, e.g. `js`.
    pub info: String,
}

/// Whether a line delimits a fenced block.
pub fn is_fence(line: &str) -> bool {
    line.trim().starts_with(FENCE_MARKER)
}

/// Find the fenced block enclosing `cursor_line`.
///
/// The backward scan includes the cursor line, so a cursor sitting on an
/// opening fence anchors the block there. The first fence after the opening
/// one closes the block; nesting is not recognised.
pub fn locate<D: Document + ?Sized>(doc: &D, cursor_line: usize) -> Option<CodeBlock> {
    let count = doc.line_count();
    if cursor_line >= count {
        return None;
    }

    let start_line = (0..=cursor_line)
        .rev()
        .find(|&i| doc.line(i).is_some_and(is_fence))?;

    let end_line = (cursor_line..count)
        .find(|&i| i > start_line && doc.line(i).is_some_and(is_fence))?;

    let body: Vec<&str> = (start_line + 1..end_line)
        .filter_map(|i| doc.line(i))
        .collect();

    let info = doc
        .line(start_line)
        .map(|l| l.trim().trim_start_matches('`').trim().to_string())
        .unwrap_or_default();

    Some(CodeBlock {
        content: body.join("\n").trim().to_string(),
        start_line,
        end_line,
        info,
    })
}
