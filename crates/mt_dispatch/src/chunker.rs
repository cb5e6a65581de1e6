/// Splits `text` into consecutive segments of at most `max_chars` chars.
///
/// Segments are slices of the input, so concatenating them gives back the
/// input exactly. Each cut is placed at the furthest whitespace boundary that
/// fits, which keeps the number of segments minimal; a word longer than
/// `max_chars` is the only thing ever cut in the middle.
pub fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let len = chars.len();
    let byte_at = |i: usize| if i == len { text.len() } else { chars[i].0 };
    let is_space = |i: usize| chars[i].1.is_whitespace();

    let mut segments = Vec::new();
    let mut start = 0;
    while start < len {
        if len - start <= max_chars {
            segments.push(text[byte_at(start)..].to_string());
            break;
        }

        let limit = start + max_chars;
        let cut = (start + 1..=limit)
            .rev()
            .find(|&c| is_space(c - 1) || is_space(c))
            .unwrap_or(limit);

        segments.push(text[byte_at(start)..byte_at(cut)].to_string());
        start = cut;
    }

    segments
}

/// [`chunk`], minus segments that are nothing but whitespace. Those appear
/// when a whitespace run is longer than `max_chars`, and the messenger
/// rejects blank messages.
pub fn message_segments(text: &str, max_chars: usize) -> Vec<String> {
    chunk(text, max_chars)
        .into_iter()
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}
