/// Capabilities / limits of a platform implementation.
#[derive(Clone, Copy, Debug)]
pub struct PlatformCapabilities {
    pub supports_proxy_identity: bool,
    pub max_message_len: usize,
    pub max_display_name_len: usize,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            supports_proxy_identity: true,
            max_message_len: 2000,
            max_display_name_len: 80,
        }
    }
}

/// Truncate to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text_and_marks_cuts() {
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hell…");
        assert_eq!(truncate_chars("héllo wörld", 6).chars().count(), 6);
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
