use crate::config::ResolverPolicy;

pub const WORD_OVERLAP_WEIGHT: f64 = 0.5;
pub const LENGTH_SIMILARITY_WEIGHT: f64 = 0.4;
pub const PREFIX_WEIGHT: f64 = 0.1;
pub const EXACT_MATCH_BONUS: f64 = 0.3;
pub const AUXILIARY_PENALTY: f64 = 0.3;

pub const AUXILIARY_WORDS: &[&str] = &[
    "service",
    "updater",
    "helper",
    "client",
    "streaming",
    "bootstrapper",
];

const PUNCTUATION: &[char] = &['.', ',', '!', '?', '-', '_'];

pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let words = text
        .split(|c: char| c.is_whitespace() || PUNCTUATION.contains(&c))
        .filter(|word| !word.is_empty());
    for word in words {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        match cyrillic_to_latin(c) {
            Some(latin) => out.push_str(latin),
            None => out.push(c),
        }
    }
    out
}

fn cyrillic_to_latin(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

pub fn phonetic_fold(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(current) = chars.next() {
        match (current, chars.peek().copied()) {
            ('c', Some('k')) => {
                chars.next();
                push_collapsed(&mut folded, 'k');
            }
            ('p', Some('h')) => {
                chars.next();
                push_collapsed(&mut folded, 'f');
            }
            ('c', Some('h')) => push_collapsed(&mut folded, 'c'),
            ('c', _) | ('q', _) => push_collapsed(&mut folded, 'k'),
            ('w', _) => push_collapsed(&mut folded, 'v'),
            ('x', _) => {
                push_collapsed(&mut folded, 'k');
                push_collapsed(&mut folded, 's');
            }
            _ => push_collapsed(&mut folded, current),
        }
    }
    folded
}

// Doubled letters collapse to one.
fn push_collapsed(out: &mut String, c: char) {
    if c.is_alphabetic() && out.ends_with(c) {
        return;
    }
    out.push(c);
}

fn distinct_words(normalized: &str) -> Vec<&str> {
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    words.sort_unstable();
    words.dedup();
    words
}

pub struct QueryForm {
    text: String,
    words: Vec<String>,
}

impl QueryForm {
    pub fn new(query: &str) -> Self {
        let text = normalize(query);
        let words = distinct_words(&text).into_iter().map(str::to_owned).collect();
        Self { text, words }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    // `candidate` must already be normalized; `candidate_words` are its distinct words.
    fn score_against(&self, candidate: &str, candidate_words: &[&str]) -> f64 {
        if self.words.is_empty() || candidate_words.is_empty() {
            return 0.0;
        }

        let common = self
            .words
            .iter()
            .filter(|word| candidate_words.contains(&word.as_str()))
            .count();
        if common == 0 {
            return 0.0;
        }

        let q = self.text.as_str();
        let word_score = common as f64 / self.words.len().max(candidate_words.len()) as f64;
        let q_len = q.chars().count();
        let c_len = candidate.chars().count();
        let longest = q_len.max(c_len).max(1);
        let length_score = 1.0 - q_len.abs_diff(c_len) as f64 / longest as f64;
        let prefix_score = if candidate.starts_with(q) || q.starts_with(candidate) {
            1.0
        } else {
            0.0
        };

        let exact_bonus = if q == candidate { EXACT_MATCH_BONUS } else { 0.0 };
        let penalty = if AUXILIARY_WORDS.iter().any(|word| candidate_words.contains(word)) {
            AUXILIARY_PENALTY
        } else {
            0.0
        };

        let base = WORD_OVERLAP_WEIGHT * word_score
            + LENGTH_SIMILARITY_WEIGHT * length_score
            + PREFIX_WEIGHT * prefix_score;
        (base + exact_bonus - penalty).clamp(0.0, 1.0)
    }
}

pub fn score(query: &str, candidate: &str) -> f64 {
    let candidate = normalize(candidate);
    QueryForm::new(query).score_against(&candidate, &distinct_words(&candidate))
}

pub fn containment_score(query: &str, candidate: &str, policy: &ResolverPolicy) -> f64 {
    contained_score(
        &query.trim().to_lowercase(),
        &candidate.trim().to_lowercase(),
        policy,
    )
}

fn contained_score(q: &str, n: &str, policy: &ResolverPolicy) -> f64 {
    if q.is_empty() || n.is_empty() {
        return 0.0;
    }

    if n.contains(q) {
        return q.chars().count() as f64 / n.chars().count() as f64;
    }

    let any_word = q
        .split_whitespace()
        .filter(|word| word.chars().count() >= policy.min_containment_token_chars)
        .any(|word| n.contains(word));
    if any_word {
        policy.containment_word_score
    } else {
        0.0
    }
}

pub struct PreparedQuery {
    direct: QueryForm,
    transliterated: QueryForm,
    folded: QueryForm,
    containment: String,
}

impl PreparedQuery {
    pub fn new(query: &str, transliterated: &str) -> Self {
        let containment = if transliterated.is_empty() {
            query
        } else {
            transliterated
        };
        Self {
            direct: QueryForm::new(query),
            transliterated: QueryForm::new(transliterated),
            folded: QueryForm::new(&phonetic_fold(transliterated)),
            containment: containment.trim().to_lowercase(),
        }
    }

    pub fn text(&self) -> &str {
        self.direct.text()
    }
}

pub fn match_score(query: &PreparedQuery, name: &str, policy: &ResolverPolicy) -> f64 {
    let candidate = normalize(name);
    let words = distinct_words(&candidate);
    let direct = query
        .direct
        .score_against(&candidate, &words)
        .max(query.transliterated.score_against(&candidate, &words));
    if direct > 0.0 {
        return direct;
    }

    let folded_name = phonetic_fold(&candidate);
    let folded = query
        .folded
        .score_against(&folded_name, &distinct_words(&folded_name));
    if folded > 0.0 {
        return folded;
    }

    contained_score(&query.containment, &name.trim().to_lowercase(), policy)
}
