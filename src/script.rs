//! Pure transformation: test-file bytes -> ordered sequence of directives.

/// A single `<`, `>`, or `!` line in a test file; the atomic unit the engine processes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Bytes to be written to the PUT's stdin.
    Input(Vec<u8>),
    /// Bytes that must appear next on the PUT's stdout.
    ExpectOut(Vec<u8>),
    /// Bytes that must appear next on the PUT's stderr.
    ExpectErr(Vec<u8>),
}

impl Directive {
    pub fn data(&self) -> &[u8] {
        match self {
            Self::Input(d) | Self::ExpectOut(d) | Self::ExpectErr(d) => d,
        }
    }

    pub fn marker(&self) -> u8 {
        match self {
            Self::Input(_) => b'<',
            Self::ExpectOut(_) => b'>',
            Self::ExpectErr(_) => b'!',
        }
    }
}

/// The ordered sequence of directives extracted from one test file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    directives: Vec<Directive>,
    input_count: usize,
}

impl Script {
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }
}

/// Parse `content` into a [`Script`], recognizing directive lines introduced
/// by `comment` followed by one of `<`, `>`, `!`.
pub fn parse(content: &[u8], comment: &[u8]) -> Script {
    let mut directives = Vec::new();
    let mut input_count = 0;

    for line in split_keep_newline(content) {
        if line.len() < comment.len() + 2 || !line.starts_with(comment) {
            continue;
        }
        let marker = line[comment.len()];
        let tail = line[comment.len() + 1..].to_vec();
        let directive = match marker {
            b'<' => {
                input_count += 1;
                Directive::Input(tail)
            }
            b'>' => Directive::ExpectOut(tail),
            b'!' => Directive::ExpectErr(tail),
            _ => continue,
        };
        directives.push(directive);
    }

    Script {
        directives,
        input_count,
    }
}

/// Split on `\n`, keeping the newline as part of each line (the final line
/// may lack one).
fn split_keep_newline(content: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in content.iter().enumerate() {
        if b == b'\n' {
            lines.push(&content[start..=i]);
            start = i + 1;
        }
    }
    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello_script() {
        let content = b"#>What is your name?\n#<Alice\n#>Hello, Alice\n";
        let script = parse(content, b"#");
        assert_eq!(script.input_count(), 1);
        assert_eq!(
            script.directives(),
            &[
                Directive::ExpectOut(b"What is your name?\n".to_vec()),
                Directive::Input(b"Alice\n".to_vec()),
                Directive::ExpectOut(b"Hello, Alice\n".to_vec()),
            ]
        );
    }

    #[test]
    fn ignores_non_directive_lines() {
        let content = b"plain comment\n# bare hash, not a directive\n#>real\n";
        let script = parse(content, b"#");
        assert_eq!(script.directives(), &[Directive::ExpectOut(b"real\n".to_vec())]);
    }

    #[test]
    fn last_line_without_trailing_newline() {
        let content = b"#>abc";
        let script = parse(content, b"#");
        assert_eq!(script.directives(), &[Directive::ExpectOut(b"abc".to_vec())]);
    }

    #[test]
    fn honors_custom_comment_prefix() {
        let content = b"//>abc\n#>not this\n";
        let script = parse(content, b"//");
        assert_eq!(script.directives(), &[Directive::ExpectOut(b"abc\n".to_vec())]);
    }

    #[test]
    fn too_short_line_is_skipped() {
        let content = b"#>\n#\n#a\n";
        let script = parse(content, b"#");
        assert_eq!(script.directives(), &[Directive::ExpectOut(b"\n".to_vec())]);
    }
}
