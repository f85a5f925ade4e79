use crate::engine::SearchPattern;

/// One occurrence of the query inside a group's flat text.
///
/// `start`/`end` are byte offsets into the flat text of the group that
/// produced the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub id: String,
    pub group: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Match {
    pub fn new(group: &str, index: usize, text: &str, start: usize, end: usize) -> Self {
        Self {
            id: match_id(group, index),
            group: group.to_string(),
            text: text.to_string(),
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub fn match_id(group: &str, index: usize) -> String {
    format!("{}-{}", group, index)
}

/// Finds every match of `pattern` in `text`, ordered by position.
pub fn find_matches(text: &str, pattern: &SearchPattern, group: &str) -> Vec<Match> {
    let regex = pattern.regex();
    let mut matches = Vec::new();
    let mut cursor = 0;

    while cursor <= text.len() {
        let Some(found) = regex.find_at(text, cursor) else {
            break;
        };

        matches.push(Match::new(
            group,
            matches.len(),
            found.as_str(),
            found.start(),
            found.end(),
        ));

        cursor = if found.is_empty() {
            // Step over one whole character so the cursor stays on a boundary.
            match text[found.end()..].chars().next() {
                Some(c) => found.end() + c.len_utf8(),
                None => break,
            }
        } else {
            found.end()
        };
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SearchOptions;

    fn pattern(query: &str, options: SearchOptions) -> SearchPattern {
        SearchPattern::compile(query, options).unwrap().unwrap()
    }

    #[test]
    fn ids_are_group_prefixed_and_sequential() {
        let matches = find_matches(
            "hello world, hello!",
            &pattern("hello", SearchOptions::default()),
            "doc",
        );
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "doc-0");
        assert_eq!(matches[1].id, "doc-1");
        assert_eq!((matches[0].start, matches[0].end), (0, 5));
        assert_eq!((matches[1].start, matches[1].end), (13, 18));
        assert_eq!(matches[1].group, "doc");
    }

    #[test]
    fn rerun_produces_identical_ids() {
        let p = pattern("ab", SearchOptions::default());
        let first = find_matches("ab ab ab", &p, "g");
        let second = find_matches("ab ab ab", &p, "g");
        assert_eq!(first, second);
    }

    #[test]
    fn matched_text_keeps_source_case() {
        let matches = find_matches("foo FOO Foo", &pattern("Foo", SearchOptions::default()), "g");
        let texts: Vec<_> = matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["foo", "FOO", "Foo"]);
    }

    #[test]
    fn whole_word_uses_surrounding_context() {
        let options = SearchOptions {
            whole_word: true,
            ..SearchOptions::default()
        };
        let matches = find_matches("cats catalog cat", &pattern("cat", options), "g");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, 13);
    }

    #[test]
    fn matches_do_not_overlap() {
        let matches = find_matches("aaaaa", &pattern("aa", SearchOptions::default()), "g");
        let spans: Vec<_> = matches.iter().map(|m| (m.start, m.end)).collect();
        assert_eq!(spans, vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn offsets_are_byte_offsets_on_char_boundaries() {
        let text = "Hello \u{1F600} World \u{1F600}";
        let matches = find_matches(text, &pattern("\u{1F600}", SearchOptions::default()), "g");
        assert_eq!(matches.len(), 2);
        for m in &matches {
            assert_eq!(&text[m.start..m.end], "\u{1F600}");
        }
    }

    #[test]
    fn no_matches_yields_empty() {
        let matches = find_matches("abc", &pattern("zzz", SearchOptions::default()), "g");
        assert!(matches.is_empty());
    }
}
