//! Minimal HTML helpers for table-shaped upstream pages.
//! Tag matching is ASCII case-insensitive; nothing here builds a DOM.

/// Inner HTML of the first `open_pat ... close_pat` section, where
/// `open_pat` is the start of an opening tag (attributes allowed).
pub fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = s.to_ascii_lowercase();
    let open_idx = lc.find(&open_pat.to_ascii_lowercase())?;
    let after_open = open_idx + s[open_idx..].find('>')? + 1;
    let close_rel = lc[after_open..].find(&close_pat.to_ascii_lowercase())?;
    Some(&s[after_open..after_open + close_rel])
}

/// Inner HTML of every `<tag ...>...</tag>` block in order. Nested blocks
/// of the same tag are not supported.
pub fn inner_blocks_ci<'a>(s: &'a str, tag: &str) -> Vec<&'a str> {
    let lc = s.to_ascii_lowercase();
    let open = format!("<{}", tag.to_ascii_lowercase());
    let close = format!("</{}", tag.to_ascii_lowercase());

    let mut blocks = Vec::new();
    let mut from = 0;
    while let Some(rel) = lc[from..].find(&open) {
        let start = from + rel;
        // `<tr` must not match `<track`
        let next = lc[start + open.len()..].chars().next();
        if !matches!(next, Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') | Some('/')) {
            from = start + open.len();
            continue;
        }
        let Some(open_end) = s[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let Some(close_rel) = lc[open_end..].find(&close) else {
            blocks.push(&s[open_end..]);
            break;
        };
        let close_start = open_end + close_rel;
        blocks.push(&s[open_end..close_start]);
        from = lc[close_start..]
            .find('>')
            .map_or(lc.len(), |i| close_start + i + 1);
    }
    blocks
}

/// `s` with every `<tag ...>...</tag>` block removed, markup and content
/// alike. An unclosed block is dropped up to the end.
pub fn without_blocks_ci(s: &str, tag: &str) -> String {
    let lc = s.to_ascii_lowercase();
    let open = format!("<{}", tag.to_ascii_lowercase());
    let close = format!("</{}", tag.to_ascii_lowercase());

    let mut out = String::with_capacity(s.len());
    let mut kept_from = 0;
    let mut from = 0;
    while let Some(rel) = lc[from..].find(&open) {
        let start = from + rel;
        let next = lc[start + open.len()..].chars().next();
        if !matches!(next, Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') | Some('/')) {
            from = start + open.len();
            continue;
        }
        out.push_str(&s[kept_from..start]);
        let end = lc[start..]
            .find(&close)
            .and_then(|close_rel| {
                let close_start = start + close_rel;
                lc[close_start..].find('>').map(|i| close_start + i + 1)
            })
            .unwrap_or(lc.len());
        kept_from = end;
        from = end;
    }
    out.push_str(&s[kept_from..]);
    out
}

/// Visible text of an HTML fragment: tags removed, common entities decoded
/// and whitespace collapsed.
pub fn text_content(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
