// src/crawl/generator.rs
// =============================================================================
// Brute-force candidate domains: every base × suffix × TLD combination,
// e.g. "molt" + "book" + "com" -> "moltbook.com".
//
// The generator holds only the token lists, so iter() can be called again
// to restart the sequence from the beginning. It never touches the network.
// =============================================================================

use std::collections::HashSet;

use crate::policy::GeneratorTokens;

#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    bases: Vec<String>,
    suffixes: Vec<String>,
    tlds: Vec<String>,
}

impl CandidateGenerator {
    pub fn new(bases: Vec<String>, suffixes: Vec<String>, tlds: Vec<String>) -> Self {
        Self {
            bases,
            suffixes,
            tlds,
        }
    }

    pub fn from_tokens(tokens: &GeneratorTokens) -> Self {
        Self::new(
            tokens.bases.clone(),
            tokens.suffixes.clone(),
            tokens.tlds.clone(),
        )
    }

    /// Upper bound on the number of candidates (before filtering).
    pub fn combinations(&self) -> usize {
        self.bases.len() * self.suffixes.len() * self.tlds.len()
    }

    // Enumerates candidates in base, suffix, TLD order
    //
    // Parameters:
    //   known: domains to leave out (already registered or visited)
    //
    // Each name is yielded once, even when two token pairs spell it the
    // same way ("molt" + "s" and "molts" + "").
    pub fn iter<'a>(&'a self, known: &'a HashSet<String>) -> impl Iterator<Item = String> + 'a {
        let mut emitted = HashSet::new();
        self.bases
            .iter()
            .flat_map(move |base| {
                self.suffixes.iter().flat_map(move |suffix| {
                    self.tlds
                        .iter()
                        .map(move |tld| format!("{}{}.{}", base, suffix, tld))
                })
            })
            .filter(move |domain| !known.contains(domain) && emitted.insert(domain.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_candidate() {
        let generator = CandidateGenerator::new(tokens(&["molt"]), tokens(&[""]), tokens(&["com"]));
        let known = HashSet::new();
        let all: Vec<_> = generator.iter(&known).collect();
        assert_eq!(all, vec!["molt.com"]);
    }

    #[test]
    fn test_full_product_minus_known() {
        let generator = CandidateGenerator::new(
            tokens(&["molt", "claw"]),
            tokens(&["", "book"]),
            tokens(&["com", "ai"]),
        );
        let known: HashSet<String> = ["moltbook.com".to_string()].into_iter().collect();

        let all: Vec<_> = generator.iter(&known).collect();
        assert_eq!(generator.combinations(), 8);
        assert_eq!(all.len(), 7);
        assert!(!all.contains(&"moltbook.com".to_string()));
        assert!(all.contains(&"clawbook.ai".to_string()));
    }

    #[test]
    fn test_duplicate_spellings_yield_once() {
        let generator = CandidateGenerator::new(
            tokens(&["molt", "molts"]),
            tokens(&["s", ""]),
            tokens(&["io"]),
        );
        let known = HashSet::new();
        let all: Vec<_> = generator.iter(&known).collect();
        assert_eq!(all, vec!["molts.io", "molt.io", "moltss.io"]);
    }

    #[test]
    fn test_restartable() {
        let generator = CandidateGenerator::from_tokens(&GeneratorTokens::default());
        let known = HashSet::new();
        let first: Vec<_> = generator.iter(&known).collect();
        let second: Vec<_> = generator.iter(&known).collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
