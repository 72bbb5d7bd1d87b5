use std::borrow::Cow;

/// Closes every `###` comment in `prefix` on its own line.
///
/// Python reads `### text` as a line comment, CoffeeScript as the start of
/// a block comment running until the next `###`. Each such line gets a
/// closing `###`, runs of three or more `#` inside the comment are broken
/// up, and a bare `###` becomes the line comment `####`.
pub fn terminate_comments(prefix: &str) -> String {
    if !prefix.contains("###") {
        return prefix.to_owned();
    }

    let mut out = String::with_capacity(prefix.len() + 8);
    for line in prefix.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        out.push_str(&terminate_line(content));
        out.push_str(&line[content.len()..]);
    }
    out
}

fn terminate_line(line: &str) -> Cow<'_, str> {
    let comment = line.trim_start();
    let Some(rest) = comment.strip_prefix("###") else { return Cow::Borrowed(line) };
    if rest.starts_with('#') {
        return Cow::Borrowed(line);
    }

    let indent = &line[..line.len() - comment.len()];
    let text = rest.trim_end();
    let trailing = &rest[text.len()..];
    if text.is_empty() {
        return Cow::Owned(format!("{indent}####{trailing}"));
    }

    let inner = text.trim_end_matches('#');
    let closing = text.len() - inner.len();
    if closing == 3 && !has_marker(inner) {
        return Cow::Borrowed(line);
    }

    let mut out = format!("{indent}###{}", break_markers(inner));
    if closing == 0 {
        let spacing = &rest[..rest.len() - rest.trim_start().len()];
        out.push_str(spacing);
    }
    out.push_str("###");
    out.push_str(trailing);
    Cow::Owned(out)
}

fn has_marker(text: &str) -> bool {
    text.contains("###")
}

/// Splits every run of three or more `#` so that no `###` remains.
fn break_markers(text: &str) -> Cow<'_, str> {
    if !has_marker(text) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 4);
    let mut run = 0;
    for c in text.chars() {
        if c == '#' {
            if run == 2 {
                out.push(' ');
                run = 0;
            }
            run += 1;
        } else {
            run = 0;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::terminate_comments;

    #[test]
    fn plain_comments_are_untouched() {
        let prefix = "  # note ## here\n#### banner\n    ";
        assert_eq!(terminate_comments(prefix), prefix);
    }

    #[test]
    fn closed_block_comments_round_trip() {
        let prefix = "### already closed ###\n  ###tight###  \r\n";
        assert_eq!(terminate_comments(prefix), prefix);
    }

    #[test]
    fn open_block_comments_get_closed() {
        assert_eq!(terminate_comments("### open\n"), "### open ###\n");
        assert_eq!(terminate_comments("    ###open\n    "), "    ###open###\n    ");
        assert_eq!(terminate_comments("### short ##\n"), "### short ###\n");
        assert_eq!(terminate_comments("### long #####"), "### long ###");
    }

    #[test]
    fn markers_inside_are_broken_up() {
        assert_eq!(terminate_comments("### a ### b\n"), "### a ## # b ###\n");
        assert_eq!(terminate_comments("### a #### b ###\n"), "### a ## ## b ###\n");
    }

    #[test]
    fn lone_marker_becomes_a_line_comment() {
        assert_eq!(terminate_comments("###\n  ###  \n"), "####\n  ####  \n");
    }
}
