//! Resume language detection — a small stopword heuristic, English by
//! default. Only drives the FR/EN phrasing of prompts.

const FRENCH_STOPWORDS: &[&str] = &[
    "le", "la", "les", "une", "des", "et", "ou", "dans", "pour", "avec", "sur", "chez", "ans",
    "années", "expérience", "formation", "compétences",
];

const ENGLISH_STOPWORDS: &[&str] = &[
    "the", "and", "of", "in", "for", "with", "at", "years", "experience", "education", "skills",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Fr,
}

impl Lang {
    /// Adjective used inside prompt templates.
    pub fn adjective(self) -> &'static str {
        match self {
            Lang::En => "English",
            Lang::Fr => "French",
        }
    }
}

/// Detects the dominant language of the first 1000 characters.
pub fn detect(text: &str) -> Lang {
    let sample: String = text.chars().take(1000).collect::<String>().to_lowercase();
    let count = |words: &[&str]| {
        sample
            .split(|c: char| !c.is_alphanumeric() && c != 'é' && c != 'è' && c != 'ê')
            .filter(|token| words.contains(token))
            .count()
    };

    let french = count(FRENCH_STOPWORDS);
    let english = count(ENGLISH_STOPWORDS);
    if french > english && french >= 3 {
        Lang::Fr
    } else {
        Lang::En
    }
}
