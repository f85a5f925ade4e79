use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("failed to compile search pattern `{pattern}`: {source}")]
    Compile {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A query compiled into a literal matcher.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
    query: String,
    options: SearchOptions,
}

impl SearchPattern {
    /// Compiles `query` as literal text.
    ///
    /// Returns `Ok(None)` when the query trims to empty; callers treat that as
    /// the zero-match state rather than an error.
    pub fn compile(query: &str, options: SearchOptions) -> Result<Option<Self>, PatternError> {
        if query.trim().is_empty() {
            return Ok(None);
        }

        let escaped = regex::escape(query);
        let pattern = if options.whole_word {
            format!(r"\b{}\b", escaped)
        } else {
            escaped
        };

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|source| PatternError::Compile { pattern, source })?;

        Ok(Some(Self {
            regex,
            query: query.to_string(),
            options,
        }))
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }
}
