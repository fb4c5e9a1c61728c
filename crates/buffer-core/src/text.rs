pub(crate) fn split_lines_preserve_trailing(text: &str) -> Vec<&str> {
    // `str::split('\n')` keeps trailing empty pieces: N newlines => N+1 lines.
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

pub(crate) fn expand_tabs(line: &str, tab_width: usize) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    line.replace('\t', &" ".repeat(tab_width))
}

/// Byte index of the `char_offset`-th character (`text.len()` for the end of the string).
pub(crate) fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Characters `[start, end)` of `text`.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = byte_index(text, start);
    let to = from + byte_index(&text[from..], end - start);
    &text[from..to]
}
