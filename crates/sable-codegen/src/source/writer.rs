//! Indented line output.

const INDENT_WITH: &str = "    ";

/// Accumulates source text one line at a time.
#[derive(Debug, Default)]
pub struct SourceWriter {
    out: String,
    indent: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `text` as one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str(INDENT_WITH);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `{` on its own line, then indent.
    pub fn open(&mut self) {
        self.line("{");
        self.indent += 1;
    }

    /// Dedent, then `}` followed by `suffix`.
    pub fn close_with(&mut self, suffix: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(format!("}}{suffix}"));
    }

    pub fn close(&mut self) {
        self.close_with("");
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn finish(self) -> String {
        self.out
    }
}
