//! Brand token extraction from the advertising prompt.

use montage_error::ConfigError;
use regex::Regex;

/// Words that start capitalized runs without naming anything.
const STOPWORDS: &[&str] = &[
    "A", "An", "The", "This", "That", "These", "Those", "Our", "Your", "My", "We", "I", "It",
    "Its", "Introducing", "Meet", "New", "Make", "Show", "Create", "Video", "Ad", "Advert",
    "Commercial", "Spot",
];

/// Deterministic brand finder.
///
/// Known brands win, matched case-insensitively as whole words and returned
/// in their configured spelling. Otherwise the first run of capitalized words
/// that does not open a sentence is taken, minus leading stopwords.
///
/// # Examples
///
/// ```
/// use montage_assembly::BrandExtractor;
///
/// let brands = vec!["Nike".to_string(), "Red Bull".to_string()];
/// let extractor = BrandExtractor::new(&brands).unwrap();
///
/// assert_eq!(extractor.extract("a 30s spot: red bull gives you wings").as_deref(), Some("Red Bull"));
/// assert_eq!(extractor.extract("Launch video for the Acme Trail runner").as_deref(), Some("Acme Trail"));
/// assert_eq!(extractor.extract("morning coffee in a quiet kitchen"), None);
/// ```
#[derive(Debug, Clone)]
pub struct BrandExtractor {
    known: Vec<String>,
    known_pattern: Option<Regex>,
    capitalized: Regex,
}

impl BrandExtractor {
    /// Build an extractor for a list of known brands.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the brand list cannot be compiled into a pattern.
    pub fn new(known_brands: &[String]) -> Result<Self, ConfigError> {
        let known: Vec<String> = known_brands
            .iter()
            .map(|brand| brand.trim().to_string())
            .filter(|brand| !brand.is_empty())
            .collect();

        let known_pattern = if known.is_empty() {
            None
        } else {
            let alternatives = known
                .iter()
                .map(|brand| regex::escape(brand))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)(?:^|[^\w])({})(?:$|[^\w])", alternatives);
            Some(Regex::new(&pattern).map_err(|e| {
                ConfigError::new(format!("Invalid known brand list: {}", e))
            })?)
        };

        let capitalized = Regex::new(r"[A-Z][\w&'-]*(?:[ \t]+[A-Z][\w&'-]*)*")
            .map_err(|e| ConfigError::new(format!("Invalid brand pattern: {}", e)))?;

        Ok(Self {
            known,
            known_pattern,
            capitalized,
        })
    }

    /// Brand token named in the prompt, if any.
    pub fn extract(&self, prompt: &str) -> Option<String> {
        self.known_brand(prompt)
            .or_else(|| self.capitalized_run(prompt))
    }

    fn known_brand(&self, prompt: &str) -> Option<String> {
        let found = self.known_pattern.as_ref()?.captures(prompt)?.get(1)?;
        self.known
            .iter()
            .find(|brand| brand.eq_ignore_ascii_case(found.as_str()))
            .cloned()
    }

    fn capitalized_run(&self, prompt: &str) -> Option<String> {
        self.capitalized.find_iter(prompt).find_map(|run| {
            // Skip runs glued to a preceding word ("eBay" style tails)
            if prompt[..run.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric())
            {
                return None;
            }
            let mut words: Vec<&str> = run.as_str().split_whitespace().collect();
            if opens_sentence(&prompt[..run.start()]) && !words.is_empty() {
                words.remove(0);
            }
            let words: Vec<&str> = words
                .into_iter()
                .skip_while(|word| STOPWORDS.contains(word))
                .take(3)
                .collect();
            (!words.is_empty()).then(|| words.join(" "))
        })
    }
}

/// Whether text ending right before a word puts that word at a sentence start.
fn opens_sentence(before: &str) -> bool {
    match before.trim_end().chars().next_back() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?' | ':' | '\n' | '"'),
    }
}
