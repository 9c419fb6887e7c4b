//! WordPiece Tokenizer
//!
//! BERT-style tokenization for the ONNX sequence classifiers, matching the
//! Hugging Face `BertTokenizer` basic pass:
//!
//! 1. drop control characters, map whitespace to spaces, isolate CJK ideographs
//! 2. lowercase, then strip accents (NFD, drop `Mn` marks) when enabled
//! 3. split on any Unicode punctuation (`P*`) and ASCII symbols
//! 4. greedy longest-match-first WordPiece against `vocab.txt`

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::logic::artifact::{self, ArtifactError};

pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const UNK_TOKEN: &str = "[UNK]";

/// Words longer than this become `[UNK]` outright
const MAX_CHARS_PER_WORD: usize = 100;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{P}").expect("punctuation class is a valid regex"));

static NONSPACING_MARKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Mn}").expect("mark class is a valid regex"));

/// Model inputs for one sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl Encoding {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct WordPieceTokenizer {
    vocab: HashMap<String, i64>,
    lowercase: bool,
    strip_accents: bool,
    cls_id: i64,
    sep_id: i64,
    unk_id: i64,
}

impl WordPieceTokenizer {
    /// Build from vocabulary entries; line number = token id
    pub fn from_tokens<I, S>(tokens: I, lowercase: bool) -> Result<Self, ArtifactError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = HashMap::new();
        for (id, token) in tokens.into_iter().enumerate() {
            vocab.entry(token.into()).or_insert(id as i64);
        }

        let special = |token: &str| {
            vocab
                .get(token)
                .copied()
                .ok_or_else(|| ArtifactError::Invalid(format!("vocabulary lacks {}", token)))
        };
        let cls_id = special(CLS_TOKEN)?;
        let sep_id = special(SEP_TOKEN)?;
        let unk_id = special(UNK_TOKEN)?;

        Ok(Self {
            vocab,
            lowercase,
            strip_accents: lowercase,
            cls_id,
            sep_id,
            unk_id,
        })
    }

    pub fn from_vocab_file(path: &Path, lowercase: bool) -> Result<Self, ArtifactError> {
        let raw = artifact::read_text(path)?;
        Self::from_tokens(raw.lines().map(|l| l.trim_end_matches('\r')), lowercase)
    }

    /// Override accent stripping; by default it follows lowercasing
    pub fn with_strip_accents(mut self, strip_accents: bool) -> Self {
        self.strip_accents = strip_accents;
        self
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Word pieces for `text`, without special tokens
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.basic_tokenize(text)
            .iter()
            .flat_map(|word| self.wordpiece(word))
            .collect()
    }

    /// `[CLS] pieces… [SEP]`, truncated to `max_length` ids
    pub fn encode(&self, text: &str, max_length: usize) -> Encoding {
        let budget = max_length.saturating_sub(2);

        let mut input_ids = Vec::with_capacity(budget.min(256) + 2);
        input_ids.push(self.cls_id);
        input_ids.extend(
            self.tokenize(text)
                .iter()
                .take(budget)
                .map(|piece| self.vocab.get(piece).copied().unwrap_or(self.unk_id)),
        );
        input_ids.push(self.sep_id);

        let len = input_ids.len();
        Encoding {
            input_ids,
            attention_mask: vec![1; len],
            token_type_ids: vec![0; len],
        }
    }

    fn basic_tokenize(&self, text: &str) -> Vec<String> {
        let mut cleaned = String::with_capacity(text.len());
        for ch in text.chars() {
            if ch == '\u{0}' || ch == '\u{fffd}' || (ch.is_control() && !ch.is_whitespace()) {
                continue;
            }
            if ch.is_whitespace() {
                cleaned.push(' ');
            } else if is_cjk(ch) {
                cleaned.push(' ');
                cleaned.push(ch);
                cleaned.push(' ');
            } else {
                cleaned.push(ch);
            }
        }

        let mut words = Vec::new();
        for token in cleaned.split_whitespace() {
            let mut token = if self.lowercase {
                token.to_lowercase()
            } else {
                token.to_string()
            };
            if self.strip_accents {
                token = strip_accents(&token);
            }
            split_on_punctuation(&token, &mut words);
        }

        words
    }

    fn wordpiece(&self, word: &str) -> Vec<String> {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() > MAX_CHARS_PER_WORD {
            return vec![UNK_TOKEN.to_string()];
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let mut end = chars.len();
            let mut found = None;
            while start < end {
                let mut candidate: String = chars[start..end].iter().collect();
                if start > 0 {
                    candidate.insert_str(0, "##");
                }
                if self.vocab.contains_key(&candidate) {
                    found = Some(candidate);
                    break;
                }
                end -= 1;
            }

            match found {
                Some(piece) => pieces.push(piece),
                None => return vec![UNK_TOKEN.to_string()],
            }
            start = end;
        }

        pieces
    }
}

/// Canonical decomposition with nonspacing marks removed
fn strip_accents(token: &str) -> String {
    let decomposed: String = token.nfd().collect();
    NONSPACING_MARKS.replace_all(&decomposed, "").into_owned()
}

fn split_on_punctuation(token: &str, words: &mut Vec<String>) {
    let mut current = String::new();
    for ch in token.chars() {
        if is_punctuation(ch) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            words.push(ch.to_string());
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
}

/// Any Unicode `P*` character, plus ASCII symbols such as `$`, `^` and `` ` ``
fn is_punctuation(ch: char) -> bool {
    if ch.is_ascii() {
        return ch.is_ascii_punctuation();
    }
    let mut buf = [0u8; 4];
    PUNCTUATION.is_match(ch.encode_utf8(&mut buf))
}

fn is_cjk(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
        || ('\u{3400}'..='\u{4dbf}').contains(&ch)
        || ('\u{f900}'..='\u{faff}').contains(&ch)
}
