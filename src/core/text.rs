//! Line-oriented document text
//!
//! Documents are split on '\n' so that line numbers match what an editor shows,
//! including the empty final line after a trailing newline. Every line break
//! keeps its own ending on write, so mixed LF/CRLF documents round-trip.

/// Line ending of one line break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A document split into lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lines {
    pub lines: Vec<String>,
    /// `endings[i]` terminates `lines[i]`; the last line has none
    endings: Vec<LineEnding>,
}

impl Lines {
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut endings = Vec::new();

        let mut pieces = text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            if pieces.peek().is_none() {
                lines.push(piece.to_string());
                break;
            }
            match piece.strip_suffix('\r') {
                Some(line) => {
                    lines.push(line.to_string());
                    endings.push(LineEnding::CrLf);
                }
                None => {
                    lines.push(piece.to_string());
                    endings.push(LineEnding::Lf);
                }
            }
        }

        Self { lines, endings }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(line);
            if let Some(ending) = self.endings.get(i) {
                out.push_str(ending.as_str());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

