//! Shell-init file editing for env secrets.
//!
//! Env secrets become `export NAME="value"` lines in the user's
//! shell-init file (`~/.zshenv` by default).  The file is rewritten
//! whole, through a sibling temp file and a rename.

use std::ops::Range;

/// Double-quote `value` for POSIX shells.
///
/// Inside double quotes only `\`, `"`, `$` and `` ` `` are special, so
/// those are backslash-escaped and everything else, newlines included,
/// is kept byte for byte.
pub fn shell_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// The line exported for `name`.
pub fn export_line(name: &str, value: &str) -> String {
    format!("export {name}={}", shell_quote(value))
}

/// Lines taken up by the existing assignment of `name`, if any.
///
/// Matches `export NAME=` and bare `NAME=` after trimming indentation.
/// A quoted value that spans several lines extends the range up to the
/// line holding its closing quote.
pub fn find_assignment(lines: &[String], name: &str) -> Option<Range<usize>> {
    let exported = format!("export {name}=");
    let bare = format!("{name}=");
    let start = lines.iter().position(|line| {
        let t = line.trim();
        t.starts_with(&exported) || t.starts_with(&bare)
    })?;

    let t = lines[start].trim_start();
    let value = t
        .strip_prefix(exported.as_str())
        .or_else(|| t.strip_prefix(bare.as_str()))
        .unwrap_or_default();
    Some(start..start + 1 + continuation_lines(value, &lines[start + 1..]))
}

/// How many of `rest` still belong to an assignment whose value starts
/// with `value`.  An unterminated quote counts as a single line.
fn continuation_lines(value: &str, rest: &[String]) -> usize {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    let segments = std::iter::once(value).chain(rest.iter().map(String::as_str));
    for (n, segment) in segments.enumerate() {
        for c in segment.chars() {
            match (quote, c) {
                _ if escaped => escaped = false,
                (None | Some('"'), '\\') => escaped = true,
                (Some(q), c) if c == q => quote = None,
                (None, '"' | '\'') => quote = Some(c),
                _ => {}
            }
        }
        // a trailing backslash continues the line
        if quote.is_none() && !escaped {
            return n;
        }
        escaped = false;
    }
    0
}

/// Join lines so the content ends with exactly one newline.
pub fn render(lines: &[String]) -> String {
    let mut content = lines.join("\n");
    let trimmed = content.trim_end_matches('\n').len();
    content.truncate(trimmed);
    content.push('\n');
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(String::from).collect()
    }

    #[test]
    fn quote_plain_value() {
        assert_eq!(shell_quote("v2"), "\"v2\"");
        assert_eq!(shell_quote(""), "\"\"");
    }

    #[test]
    fn quote_escapes_shell_specials() {
        assert_eq!(shell_quote(r#"a"b"#), r#""a\"b""#);
        assert_eq!(shell_quote(r"a\b"), r#""a\\b""#);
        assert_eq!(shell_quote("$HOME"), r#""\$HOME""#);
        assert_eq!(shell_quote("`id`"), r#""\`id\`""#);
        assert_eq!(shell_quote("it's ok"), "\"it's ok\"");
        assert_eq!(shell_quote("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn export_line_format() {
        assert_eq!(
            export_line("MY_SECRET_TOKEN", "super_secret_token_value"),
            r#"export MY_SECRET_TOKEN="super_secret_token_value""#
        );
    }

    #[test]
    fn finds_exported_and_bare_assignments() {
        let l = lines("# env\n  export FOO=\"1\"\nBAR=2\nFOOBAR=3\n");
        assert_eq!(find_assignment(&l, "FOO"), Some(1..2));
        assert_eq!(find_assignment(&l, "BAR"), Some(2..3));
        assert_eq!(find_assignment(&l, "FOOBAR"), Some(3..4));
        assert_eq!(find_assignment(&l, "BAZ"), None);
    }

    #[test]
    fn does_not_match_name_prefixes() {
        let l = lines("export FOOBAR=\"x\"\n");
        assert_eq!(find_assignment(&l, "FOO"), None);
    }

    #[test]
    fn multiline_values_span_to_closing_quote() {
        let l = lines("export FOO=\"line1\nline2\"\nexport BAR=\"1\"\n");
        assert_eq!(find_assignment(&l, "FOO"), Some(0..2));
        assert_eq!(find_assignment(&l, "BAR"), Some(2..3));

        let l = lines("FOO='a\nb \"c\nd'\nBAR=2\n");
        assert_eq!(find_assignment(&l, "FOO"), Some(0..3));

        let l = lines(&format!("{}\nBAR=2\n", export_line("FOO", "say \"hi\"\nbye\\")));
        assert_eq!(find_assignment(&l, "FOO"), Some(0..2));

        let l = lines("FOO=a\\\nb\nBAR=2\n");
        assert_eq!(find_assignment(&l, "FOO"), Some(0..2));
    }

    #[test]
    fn unterminated_quote_is_one_line() {
        let l = lines("export FOO=\"open\nBAR=2\n");
        assert_eq!(find_assignment(&l, "FOO"), Some(0..1));
    }

    #[cfg(unix)]
    #[test]
    fn sh_reads_quoted_values_back_exactly() {
        use std::process::Command;

        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("env");
        let values = [
            "say \"hi\"",
            r"C:\dir\",
            "$HOME and ${USER}",
            "`id` $(id)",
            "it's",
            "two\nlines\n",
            "trailing ",
            "back\\\nslash",
        ];
        for value in values {
            std::fs::write(&file, format!("{}\n", export_line("V", value))).unwrap();
            let out = Command::new("sh")
                .arg("-c")
                .arg(". \"$1\"; printf %s \"$V\"")
                .arg("sh")
                .arg(&file)
                .output()
                .unwrap();
            assert!(
                out.status.success(),
                "{value:?}: {}",
                String::from_utf8_lossy(&out.stderr)
            );
            assert_eq!(out.stdout, value.as_bytes(), "{value:?}");
        }
    }

    #[test]
    fn render_ends_with_single_newline() {
        assert_eq!(render(&lines("a\nb")), "a\nb\n");
        assert_eq!(render(&["a".to_string(), String::new(), String::new()]), "a\n");
        assert_eq!(render(&[]), "\n");
    }
}
