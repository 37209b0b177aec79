//! Ordered pattern tables.
//!
//! Text heuristics are written as tables of `(pattern, effect)` rows and
//! evaluated in row order, so precedence between rows is the table order.
//! All patterns are case-insensitive.

use regex::{Captures, Regex, RegexBuilder};

/// One row of a [`RuleSet`].
#[derive(Debug, Clone)]
pub struct Rule<E> {
    pub pattern: Regex,
    pub effect: E,
}

/// An ordered table of rules sharing one effect type.
#[derive(Debug, Clone)]
pub struct RuleSet<E> {
    rules: Vec<Rule<E>>,
}

impl<E> Default for RuleSet<E> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<E> RuleSet<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(pattern, effect)` rows.
    pub fn from_table<I, S>(rows: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (S, E)>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for (pattern, effect) in rows {
            set = set.try_rule(pattern.as_ref(), effect)?;
        }
        Ok(set)
    }

    /// Append a row.
    pub fn push(&mut self, pattern: &str, effect: E) -> Result<(), regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        self.rules.push(Rule { pattern, effect });
        Ok(())
    }

    /// Builder form of [`RuleSet::push`].
    pub fn try_rule(mut self, pattern: &str, effect: E) -> Result<Self, regex::Error> {
        self.push(pattern, effect)?;
        Ok(self)
    }

    /// Effects of every matching row, in table order.
    pub fn matches<'a, 't: 'a>(&'a self, text: &'t str) -> impl Iterator<Item = &'a E> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.pattern.is_match(text))
            .map(|rule| &rule.effect)
    }

    /// Effect of the first matching row.
    pub fn first(&self, text: &str) -> Option<&E> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(text))
            .map(|rule| &rule.effect)
    }

    /// Captures and effect of the first matching row.
    pub fn first_capture<'t>(&self, text: &'t str) -> Option<(Captures<'t>, &E)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(text).map(|caps| (caps, &rule.effect)))
    }

    pub fn any(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
