use std::collections::{BTreeSet, HashMap};

use ndarray::{Array1, ArrayView1};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, RnnErr},
    kernel,
};

/// The symbols a network reads and writes, each mapped to the index of its one-hot vector.
///
/// Symbols are kept sorted so the same text always yields the same indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<char>", into = "Vec<char>")]
pub struct Vocabulary {
    symbols: Vec<char>,
    index: HashMap<char, usize>,
}

impl From<Vec<char>> for Vocabulary {
    fn from(symbols: Vec<char>) -> Self {
        let symbols: Vec<char> = symbols
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = symbols.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Self { symbols, index }
    }
}

impl From<Vocabulary> for Vec<char> {
    fn from(value: Vocabulary) -> Self {
        value.symbols
    }
}

impl Vocabulary {
    /// Builds the vocabulary of every distinct character in `text`.
    ///
    /// # Returns
    /// An `InvalidConfig` error if `text` is empty.
    pub fn from_text(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(RnnErr::InvalidConfig("empty vocabulary".into()));
        }

        Ok(Self::from(text.chars().collect::<Vec<_>>()))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn index_of(&self, c: char) -> Result<usize> {
        self.index.get(&c).copied().ok_or(RnnErr::UnknownSymbol(c))
    }

    pub fn symbol(&self, idx: usize) -> Option<char> {
        self.symbols.get(idx).copied()
    }

    pub fn encode(&self, text: &str) -> Result<Vec<usize>> {
        text.chars().map(|c| self.index_of(c)).collect()
    }

    /// Maps indices back to text, skipping any index outside the vocabulary.
    pub fn decode(&self, indices: &[usize]) -> String {
        indices.iter().filter_map(|&i| self.symbol(i)).collect()
    }

    /// Like `decode`, but stops after the first symbol at or past position `from` that
    /// matches `end`.
    pub fn decode_until(&self, indices: &[usize], from: usize, end: &Regex) -> String {
        let mut text = String::new();
        let mut buf = [0; 4];

        for (i, c) in indices
            .iter()
            .enumerate()
            .filter_map(|(i, &idx)| self.symbol(idx).map(|c| (i, c)))
        {
            text.push(c);
            if i >= from && end.is_match(c.encode_utf8(&mut buf)) {
                break;
            }
        }

        text
    }

    pub fn one_hot(&self, c: char) -> Result<Array1<f32>> {
        let idx = self.index_of(c)?;
        let mut v = Array1::zeros(self.len());
        v[idx] = 1.;
        Ok(v)
    }

    pub fn one_hot_text(&self, text: &str) -> Result<Vec<Array1<f32>>> {
        text.chars().map(|c| self.one_hot(c)).collect()
    }

    /// The most likely symbol of a probability (or one-hot) vector.
    pub fn most_likely(&self, probs: ArrayView1<'_, f32>) -> Option<char> {
        self.symbol(kernel::argmax(probs))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;

    use super::*;

    #[test]
    fn sorted_unique() {
        let vocab = Vocabulary::from_text("hello").unwrap();

        assert_eq!(vocab.symbols(), &['e', 'h', 'l', 'o']);
        assert_eq!(vocab.index_of('l').unwrap(), 2);
        assert_eq!(vocab.symbol(3), Some('o'));
        assert_eq!(vocab.symbol(4), None);
    }

    #[test]
    fn empty_text() {
        assert!(matches!(
            Vocabulary::from_text(""),
            Err(RnnErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn encode_decode() {
        let vocab = Vocabulary::from_text("the cat").unwrap();
        let indices = vocab.encode("act").unwrap();

        assert_eq!(vocab.decode(&indices), "act");
        assert!(matches!(vocab.encode("dog"), Err(RnnErr::UnknownSymbol('d'))));
    }

    #[test]
    fn decode_stops_at_the_end_pattern() {
        let vocab = Vocabulary::from_text("ab. cd").unwrap();
        let indices = vocab.encode("a. b. cd.").unwrap();
        let end = Regex::new(r"\.").unwrap();

        assert_eq!(vocab.decode_until(&indices, 0, &end), "a.");
        assert_eq!(vocab.decode_until(&indices, 2, &end), "a. b.");
        assert_eq!(vocab.decode_until(&indices[..3], 2, &end), "a. ");
    }

    #[test]
    fn one_hot() {
        let vocab = Vocabulary::from_text("abc").unwrap();

        assert_eq!(vocab.one_hot('b').unwrap(), arr1(&[0., 1., 0.]));
        assert_eq!(vocab.most_likely(arr1(&[0.1, 0.2, 0.7]).view()), Some('c'));
        assert_eq!(vocab.one_hot_text("ca").unwrap().len(), 2);
    }

    #[test]
    fn json_is_a_symbol_list() {
        let vocab = Vocabulary::from_text("ba").unwrap();
        let json = serde_json::to_string(&vocab).unwrap();

        assert_eq!(json, r#"["a","b"]"#);
        assert_eq!(serde_json::from_str::<Vocabulary>(&json).unwrap(), vocab);
    }
}
