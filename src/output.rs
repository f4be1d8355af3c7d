//! Output formatting for query results

use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// A `path:line` result, optionally with the line's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub path: String,
    pub line_number: u32,
    pub content: Option<String>,
}

impl ResultLine {
    /// Split a `path:line` result string; paths may themselves contain `:`
    pub fn parse(result: &str) -> Option<Self> {
        let (path, line) = result.rsplit_once(':')?;
        Some(Self {
            path: path.to_string(),
            line_number: line.parse().ok()?,
            content: None,
        })
    }
}

/// Print results as `path:line[:content]`, highlighting `needle` in the content
pub fn print_results(results: &[ResultLine], needle: &str, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);

    for r in results {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(stdout, "{}", r.path)?;
        stdout.reset()?;
        write!(stdout, ":")?;

        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(stdout, "{}", r.line_number)?;
        stdout.reset()?;

        if let Some(content) = &r.content {
            write!(stdout, ":")?;
            print_highlighted(&mut stdout, content, needle)?;
        }

        writeln!(stdout)?;
    }

    Ok(())
}

/// Print `content` with every occurrence of `needle` highlighted
fn print_highlighted(stdout: &mut StandardStream, content: &str, needle: &str) -> io::Result<()> {
    if needle.is_empty() {
        return write!(stdout, "{}", content);
    }

    let mut last = 0;
    for start in memchr::memmem::find_iter(content.as_bytes(), needle.as_bytes()) {
        if start < last {
            continue;
        }
        let end = start + needle.len();

        // Text before match
        write!(stdout, "{}", &content[last..start])?;

        // The match itself (highlighted)
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(stdout, "{}", &content[start..end])?;
        stdout.reset()?;

        last = end;
    }

    // Text after match
    write!(stdout, "{}", &content[last..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result() {
        let r = ResultLine::parse("src/a.txt:12").unwrap();
        assert_eq!(r.path, "src/a.txt");
        assert_eq!(r.line_number, 12);
        assert!(r.content.is_none());
    }

    #[test]
    fn test_parse_path_with_colon() {
        let r = ResultLine::parse("weird:name.txt:3").unwrap();
        assert_eq!(r.path, "weird:name.txt");
        assert_eq!(r.line_number, 3);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ResultLine::parse("no-line-number").is_none());
        assert!(ResultLine::parse("a.txt:x").is_none());
    }
}
