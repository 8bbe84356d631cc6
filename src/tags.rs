//! Struct-tag handling.
//!
//! Two layers, matching how serialization tags are conventionally written:
//! [`lookup`]/[`get`] split a raw backtick tag into space-separated
//! `key:"value"` pairs, and [`parse_tag`] splits one value into an override
//! name plus a trailing option set (`name,opt1,opt2,...`). The only option
//! the mapping engine interprets is `omitempty`.

/// Value for `key` in a conventionally formatted raw tag, with the quoted
/// value unescaped. Returns `None` when the key is absent or the tag is
/// malformed from that point on.
pub fn lookup(raw: &str, key: &str) -> Option<String> {
    let mut tag = raw;
    loop {
        tag = tag.trim_start_matches(' ');
        if tag.is_empty() {
            return None;
        }

        // key runs up to ':'; keys contain no spaces, quotes, or colons
        let bytes = tag.as_bytes();
        let mut i = 0;
        while i < bytes.len() && bytes[i] > b' ' && bytes[i] != b':' && bytes[i] != b'"' && bytes[i] != 0x7f {
            i += 1;
        }
        if i == 0 || i + 1 >= bytes.len() || bytes[i] != b':' || bytes[i + 1] != b'"' {
            return None;
        }
        let name = &tag[..i];
        tag = &tag[i + 1..];

        // quoted value, backslash escapes allowed
        let bytes = tag.as_bytes();
        let mut j = 1;
        while j < bytes.len() && bytes[j] != b'"' {
            if bytes[j] == b'\\' {
                j += 1;
            }
            j += 1;
        }
        if j >= bytes.len() {
            return None;
        }
        let quoted = &tag[..=j];
        tag = &tag[j + 1..];

        if name == key {
            return unquote(quoted);
        }
    }
}

/// Like [`lookup`] but collapses "absent" and "empty" to `""`.
pub fn get(raw: &str, key: &str) -> String {
    lookup(raw, key).unwrap_or_default()
}

fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }
    Some(out)
}

/// Split a tag value into its name and trailing options.
/// An empty name means "use the field identifier".
pub fn parse_tag(tag: &str) -> (&str, TagOptions<'_>) {
    match tag.split_once(',') {
        Some((name, opts)) => (name, TagOptions(opts)),
        None => (tag, TagOptions("")),
    }
}

/// Comma-separated option list following the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagOptions<'a>(&'a str);

impl TagOptions<'_> {
    pub fn contains(&self, opt: &str) -> bool {
        if self.0.is_empty() || opt.is_empty() {
            return false;
        }
        self.0.split(',').any(|o| o == opt)
    }
}
