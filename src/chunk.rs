//! Splitting long answers into radio-sized fragments.
//!
//! Meshtastic text messages are bounded both by character count and by UTF-8
//! byte count, so every cut has to satisfy both ceilings without ever landing
//! inside a multi-byte sequence.

/// Per-fragment bounds plus the splitter's chunk-count policy.
#[derive(Debug, Clone, Copy)]
pub struct ChunkLimits {
    pub max_chars: usize,
    pub max_bytes: usize,
    pub max_chunks: usize,
    pub truncate_with_ellipsis: bool,
}

const ELLIPSIS: char = '…';

/// Clamp `text` to at most `max_chars` characters and `max_bytes` UTF-8
/// bytes. The result is always a prefix of `text` cut at a char boundary;
/// worst case is the empty string.
pub fn clamp_utf8(text: &str, max_chars: usize, max_bytes: usize) -> &str {
    let mut out = match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    };
    if out.len() > max_bytes {
        let mut end = max_bytes;
        while end > 0 && !out.is_char_boundary(end) {
            end -= 1;
        }
        out = &out[..end];
    }
    out
}

/// Split `text` into fragments that each satisfy `limits`, preferring space
/// boundaries and capping the fragment count.
///
/// Empty or whitespace-only input yields `[""]`; input already under both
/// bounds is returned as the sole fragment, unchanged beyond trimming. When
/// the chunk cap is reached with text left over, the last fragment is either
/// re-clamped to make room for a trailing `…` or the remainder is silently
/// dropped, depending on `truncate_with_ellipsis`.
pub fn split_transport(text: &str, limits: &ChunkLimits) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return vec![String::new()];
    }

    if text.chars().count() <= limits.max_chars && text.len() <= limits.max_bytes {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let candidate = clamp_utf8(remaining, limits.max_chars, limits.max_bytes);
        if candidate.is_empty() {
            break;
        }

        let part = word_boundary_cut(candidate);
        // A word cut keeps the char count but can leave multi-byte trailing
        // content over the byte bound after the trim fallback.
        let part = clamp_utf8(part, limits.max_chars, limits.max_bytes);
        chunks.push(part.to_string());

        // `part` is a prefix of `remaining`; skip it and the whitespace the
        // cut left behind.
        remaining = remaining[part.len()..].trim_start();

        if chunks.len() >= limits.max_chunks && !remaining.is_empty() {
            if limits.truncate_with_ellipsis {
                truncate_last_with_ellipsis(&mut chunks, limits);
            }
            break;
        }
    }

    if chunks.is_empty() {
        vec![String::new()]
    } else {
        chunks
    }
}

/// Cut `candidate` at its last space, unless that space sits too close to
/// the start: the cut position must be at char index >= max(10, 0.4 × len).
/// Trailing whitespace is trimmed either way; an empty result falls back to
/// the whole candidate.
fn word_boundary_cut(candidate: &str) -> &str {
    let cut = candidate.rfind(' ').filter(|&idx| {
        let char_len = candidate.chars().count();
        let min_pos = usize::max(10, (0.4 * char_len as f64) as usize);
        candidate[..idx].chars().count() >= min_pos
    });

    let part = candidate[..cut.unwrap_or(candidate.len())].trim_end();
    if part.is_empty() { candidate } else { part }
}

/// Replace the final fragment with a shortened version ending in `…`, kept
/// within both bounds.
fn truncate_last_with_ellipsis(chunks: &mut [String], limits: &ChunkLimits) {
    if let Some(last) = chunks.last_mut() {
        let kept = clamp_utf8(
            last.trim_end(),
            limits.max_chars.saturating_sub(1),
            limits.max_bytes.saturating_sub(ELLIPSIS.len_utf8()),
        );
        let mut replaced = String::with_capacity(kept.len() + ELLIPSIS.len_utf8());
        replaced.push_str(kept);
        replaced.push(ELLIPSIS);
        *last = replaced;
    }
}
