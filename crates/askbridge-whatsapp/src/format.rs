//! Pure text transforms: markdown → WhatsApp markup, and chunking to the
//! platform's message length limit.

use std::sync::OnceLock;

use regex::Regex;

/// WhatsApp's hard limit is 4096 characters; 4000 leaves headroom.
pub const MAX_MESSAGE_LEN: usize = 4000;

static LINK_RE: OnceLock<Regex> = OnceLock::new();
static BOLD_RE: OnceLock<Regex> = OnceLock::new();
static ITALIC_RE: OnceLock<Regex> = OnceLock::new();
static STRIKE_RE: OnceLock<Regex> = OnceLock::new();
static CODE_RE: OnceLock<Regex> = OnceLock::new();

fn re(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

/// Shields narrowed-bold asterisks from the italic pass. NUL cannot appear
/// in message text delivered over the webhook.
const BOLD_SENTINEL: char = '\u{0}';

/// Convert basic markdown to WhatsApp formatting.
///
/// Ordered, global, non-greedy substitutions — each step runs on the output
/// of the previous one:
/// 1. `[label](url)` → `label (url)`
/// 2. `**text**` → `*text*` (runs before step 3, and its output asterisks are
///    not re-captured as italics)
/// 3. `*text*` → `_text_`
/// 4. `~~text~~` → `~text~`
/// 5. `` `text` `` → ```` ```text``` ````
///
/// Not idempotent: a second application re-captures the asterisks produced by
/// step 2 and corrupts the emphasis markers. Apply exactly once per answer.
pub fn markdown_to_whatsapp(text: &str) -> String {
    let text = re(&LINK_RE, r"\[(.*?)\]\((.*?)\)").replace_all(text, "$1 ($2)");
    let text = re(&BOLD_RE, r"\*\*(.*?)\*\*").replace_all(&text, "\u{0}$1\u{0}");
    let text = re(&ITALIC_RE, r"\*(.*?)\*").replace_all(&text, "_${1}_");
    let text = text.replace(BOLD_SENTINEL, "*");
    let text = re(&STRIKE_RE, r"~~(.*?)~~").replace_all(&text, "~$1~");
    let text = re(&CODE_RE, r"`(.*?)`").replace_all(&text, "```$1```");
    text.into_owned()
}

/// Split `text` into chunks of at most `max_length` bytes.
///
/// Split-point preference inside each window: last newline, else last
/// period, else a hard cut. Emitted chunks and the remainder are trimmed;
/// the short-input fast path returns the input untouched.
///
/// The bound is best-effort only for a single unbroken run longer than
/// `max_length` — and the hard cut backs off to a character boundary, so a
/// multi-byte character never gets torn.
pub fn split_for_whatsapp(text: &str, max_length: usize) -> Vec<String> {
    if text.len() <= max_length {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.len() > max_length {
        let window_end = floor_char_boundary(remaining, max_length);
        let window = &remaining[..window_end];

        let split_point = match window.rfind('\n') {
            Some(i) => i + 1,
            None => match window.rfind('.') {
                Some(i) => i + 1,
                None => window_end,
            },
        };
        // A limit narrower than the first character floors the window to
        // zero bytes; take the whole character so the loop always advances.
        let split_point = if split_point == 0 {
            ceil_char_boundary(remaining, 1)
        } else {
            split_point
        };

        let chunk = remaining[..split_point].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        remaining = remaining[split_point..].trim();
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}

/// Largest index `<= index` that lies on a UTF-8 character boundary.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest index `>= index` that lies on a UTF-8 character boundary.
fn ceil_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
