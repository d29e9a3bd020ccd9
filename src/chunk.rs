pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Separator ladder, coarsest first. The empty separator splits into single
/// characters and always succeeds.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character splitter.
///
/// Text is split on the coarsest separator present (paragraph, line, word),
/// the fragments are merged greedily into chunks of at most `chunk_size`
/// characters, and a tail of up to `chunk_overlap` characters is carried
/// into the following chunk. Fragments that are themselves too large recurse
/// to the next finer separator; at the character level this degenerates to
/// an exact sliding window. Splitting is deterministic for a given input and
/// configuration.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(chunk_size > 0, "chunk size must be positive");
        anyhow::ensure!(
            chunk_overlap < chunk_size,
            "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
        );
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, rest) = pick_separator(text, separators);
        let fragments = split_fragments(text, separator);

        let mut chunks = Vec::new();
        let mut mergeable: Vec<String> = Vec::new();
        for fragment in fragments {
            if fragment.chars().count() < self.chunk_size {
                mergeable.push(fragment);
                continue;
            }

            if !mergeable.is_empty() {
                chunks.extend(self.merge_fragments(std::mem::take(&mut mergeable), separator));
            }
            if rest.is_empty() {
                // Nothing finer to split on; an atomic unit may exceed the
                // target size.
                push_trimmed(&mut chunks, fragment);
            } else {
                chunks.extend(self.split_with(&fragment, rest));
            }
        }
        if !mergeable.is_empty() {
            chunks.extend(self.merge_fragments(mergeable, separator));
        }

        chunks
    }

    /// Greedy merge of small fragments into overlapping chunks.
    fn merge_fragments(&self, fragments: Vec<String>, separator: &str) -> Vec<String> {
        let separator_len = separator.chars().count();

        let mut chunks = Vec::new();
        let mut window: Vec<String> = Vec::new();
        let mut total = 0usize;

        for fragment in fragments {
            let fragment_len = fragment.chars().count();

            if total + fragment_len + joined_len(separator_len, &window) > self.chunk_size
                && !window.is_empty()
            {
                push_trimmed(&mut chunks, window.join(separator));

                // Shrink the window from the front until it fits inside the
                // overlap budget and leaves room for the incoming fragment.
                while total > self.chunk_overlap
                    || (total + fragment_len + joined_len(separator_len, &window)
                        > self.chunk_size
                        && total > 0)
                {
                    let removed = window.remove(0);
                    total -= removed.chars().count()
                        + if window.is_empty() { 0 } else { separator_len };
                }
            }

            total += fragment_len + joined_len(separator_len, &window);
            window.push(fragment);
        }

        if !window.is_empty() {
            push_trimmed(&mut chunks, window.join(separator));
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Separator cost of appending one more fragment to a non-empty window.
fn joined_len(separator_len: usize, window: &[String]) -> usize {
    if window.is_empty() { 0 } else { separator_len }
}

/// First separator that occurs in `text` (the empty separator always does),
/// plus the ladder below it.
fn pick_separator<'s>(text: &str, separators: &'s [&'s str]) -> (&'s str, &'s [&'s str]) {
    for (index, separator) in separators.iter().enumerate() {
        if separator.is_empty() || text.contains(separator) {
            return (separator, &separators[index + 1..]);
        }
    }
    ("", &[])
}

fn split_fragments(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator)
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: String) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split("a short page body");
        assert_eq!(chunks, ["a short page body"]);
    }

    #[test]
    fn short_text_is_trimmed() {
        let splitter = TextSplitter::default();
        assert_eq!(splitter.split("  padded  "), ["padded"]);
        assert!(splitter.split("   ").is_empty());
        assert!(splitter.split("").is_empty());
    }

    #[test]
    fn boundary_free_text_gets_exact_sliding_window_overlap() {
        let splitter = TextSplitter::new(100, 10).expect("splitter");
        let text = "x".repeat(250);
        let chunks = splitter.split(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(10).collect();
            let head: String = pair[1].chars().take(10).collect();
            let tail: String = tail.chars().rev().collect();
            assert_eq!(tail, head, "adjacent chunks must share the overlap");
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(30, 0).expect("splitter");
        let text = "first paragraph here\n\nsecond paragraph here\n\nthird one";
        let chunks = splitter.split(&text);

        assert_eq!(
            chunks,
            ["first paragraph here", "second paragraph here", "third one"]
        );
    }

    #[test]
    fn falls_back_to_words_for_long_lines() {
        let splitter = TextSplitter::new(12, 0).expect("splitter");
        let chunks = splitter.split("alpha beta gamma delta epsilon");

        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 12));
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, "alpha beta gamma delta epsilon");
    }

    #[test]
    fn oversized_word_is_hard_cut() {
        let splitter = TextSplitter::new(10, 0).expect("splitter");
        let chunks = splitter.split(&"y".repeat(25));
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 10));
    }

    #[test]
    fn splitting_is_deterministic() {
        let splitter = TextSplitter::new(50, 5).expect("splitter");
        let text = "one two three\nfour five six\n\nseven eight nine ten eleven twelve";
        assert_eq!(splitter.split(text), splitter.split(text));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(0, 0).is_err());
    }
}
