// Splitting long text into request-sized chunks.

/// Sentence terminators, Latin and CJK.
const SENTENCE_ENDS: &[char] = &['.', '?', '!', '。', '？', '！', ';', '；'];

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Paragraph boundaries (blank lines, then single line breaks) are preferred,
/// then sentence boundaries; a sentence longer than `max_chars` is cut at the
/// character limit. Chunks are trimmed and never empty. Joining them with
/// `"\n"` loses no content beyond whitespace at the cut points.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces: Vec<String> = Vec::new();
    for paragraph in text.split("\n\n").flat_map(|p| p.split('\n')) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if char_len(paragraph) <= max_chars {
            pieces.push(paragraph.to_string());
        } else {
            for sentence in split_sentences(paragraph) {
                if char_len(&sentence) <= max_chars {
                    pieces.push(sentence);
                } else {
                    pieces.extend(hard_split(&sentence, max_chars));
                }
            }
        }
    }

    pack(pieces, max_chars)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = SENTENCE_ENDS.contains(&c)
            && chars.peek().is_none_or(|next| next.is_whitespace() || !c.is_ascii());
        if at_boundary {
            let s = current.trim();
            if !s.is_empty() {
                sentences.push(s.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

fn hard_split(s: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect::<String>().trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Greedily join consecutive pieces while the result stays within the limit.
fn pack(pieces: Vec<String>, max_chars: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        if current.is_empty() {
            current = piece;
        } else if char_len(&current) + 1 + char_len(&piece) <= max_chars {
            current.push('\n');
            current.push_str(&piece);
        } else {
            chunks.push(std::mem::take(&mut current));
            current = piece;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
