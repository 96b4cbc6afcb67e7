//! Random test data generation.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{StepError, StepResult};

pub const CHARSET_ASCII: &str =
    " !#$%&'()*+,-.0123456789:;=?@ABCDEFGHIJKLMNOPQRSTUVWXYZ^_`abcdefghijklmnopqrstuvwxyz|~";
pub const CHARSET_UNICODE: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789🤡🤖🧟🏋🥇☟💄🐲🌓🌪🇵🇱⚥❄☠⌘©®💵⓵ęśćżźłóń";
pub const CHARSET_POLISH: &str =
    "ĄąĆćĘęŁłŃńÓóŚśŹźŻżabcdefghijklmnoprstuwvxyzABCDEFGHIJKLMNOPRSTUWVXYZ";
pub const CHARSET_ENGLISH: &str = "abcdefghijklmnoprstuwvxyzABCDEFGHIJKLMNOPRSTUWVXYZ";
pub const CHARSET_RUSSIAN: &str =
    "АаБбВвГгДдЕеЁёЖжЗзИиЙйКкЛлМмНнОоПпРрСсТтУуФфХхЦцЧчШшЩщЪъЫыЬьЭэЮюЯя";

/// Charset constant by name: ASCII, unicode, polish, english or russian
pub fn charset_by_name(name: &str) -> Option<&'static str> {
    match name.trim().to_ascii_lowercase().as_str() {
        "ascii" => Some(CHARSET_ASCII),
        "unicode" => Some(CHARSET_UNICODE),
        "polish" => Some(CHARSET_POLISH),
        "english" => Some(CHARSET_ENGLISH),
        "russian" => Some(CHARSET_RUSSIAN),
        _ => None,
    }
}

/// Random source owned by one scenario state
#[derive(Debug)]
pub struct RandomGenerator {
    rng: Mutex<StdRng>,
}

impl RandomGenerator {
    /// Seeded generators produce the same sequence on every run.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng: Mutex::new(rng) }
    }

    /// Integer in `[from, to]`
    pub fn int_in_range(&self, from: i64, to: i64) -> StepResult<i64> {
        check_range(from, to)?;
        Ok(self.rng.lock().gen_range(from..=to))
    }

    /// Random int from `[from, to]` scaled by a random factor in `[0, 1)`, rounded to two decimals
    pub fn float_in_range(&self, from: i64, to: i64) -> StepResult<f64> {
        let base = self.int_in_range(from, to)? as f64;
        let factor: f64 = self.rng.lock().gen();
        Ok((base * factor * 100.0).round() / 100.0)
    }

    /// String of `[min_len, max_len]` characters drawn from `charset`
    pub fn string_in_range(&self, charset: &str, min_len: usize, max_len: usize) -> StepResult<String> {
        let chars: Vec<char> = charset.chars().collect();
        if chars.is_empty() {
            return Err(StepError::InvalidArgument("charset is empty".to_string()));
        }
        check_range(min_len, max_len)?;

        let mut rng = self.rng.lock();
        let length = rng.gen_range(min_len..=max_len);
        Ok((0..length)
            .map(|_| chars[rng.gen_range(0..chars.len())])
            .collect())
    }

    /// Sentence of `[min_words, max_words]` words, each `[word_min, word_max]` characters long
    pub fn sentence_in_range(
        &self,
        charset: &str,
        word_min: usize,
        word_max: usize,
        min_words: usize,
        max_words: usize,
    ) -> StepResult<String> {
        check_range(min_words, max_words)?;
        if word_min == 0 {
            return Err(StepError::InvalidArgument(
                "word length must be at least 1".to_string(),
            ));
        }

        let word_count = self.rng.lock().gen_range(min_words..=max_words);
        let words = (0..word_count)
            .map(|_| self.string_in_range(charset, word_min, word_max))
            .collect::<StepResult<Vec<_>>>()?;
        Ok(words.join(" "))
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(from: T, to: T) -> StepResult<()> {
    if from > to {
        return Err(StepError::InvalidArgument(format!(
            "range start {} is greater than range end {}",
            from, to
        )));
    }
    Ok(())
}
