//! Fuzzy matching for phonetic confusion pairs.
//!
//! A [`FuzzyRule`] pairs two spellings of a romanization initial (e.g. `s` /
//! `sh`) or final (e.g. `an` / `ang`). Applying a rule toggles a segment's
//! prefix (or suffix) between the two spellings, always matching the longer
//! spelling first, so applying the same rule twice gives back the input.
//!
//! [`FuzzyRuleSet::expand`] returns every variant reachable by applying enabled
//! rules, the original segment first.
use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::segment::is_romanization;

/// Which end of a syllable a rule rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulePosition {
    Initial,
    Final,
}

/// A confusion pair. Sides are stored lowercased, shorter side first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuzzyRule {
    pub position: RulePosition,
    short: String,
    long: String,
}

impl FuzzyRule {
    pub fn new(position: RulePosition, a: &str, b: &str) -> Result<Self> {
        let a = a.trim().to_ascii_lowercase();
        let b = b.trim().to_ascii_lowercase();
        let invalid = |reason: &str| Error::InvalidRule {
            rule: format!("{}={}", a, b),
            reason: reason.to_string(),
        };
        if a.is_empty() || b.is_empty() {
            return Err(invalid("both sides must be non-empty"));
        }
        if a == b {
            return Err(invalid("sides are identical"));
        }
        if !is_romanization(&a) || !is_romanization(&b) {
            return Err(invalid("sides must be romanization letters"));
        }
        let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        Ok(Self {
            position,
            short,
            long,
        })
    }

    pub fn initial(a: &str, b: &str) -> Result<Self> {
        Self::new(RulePosition::Initial, a, b)
    }

    pub fn final_(a: &str, b: &str) -> Result<Self> {
        Self::new(RulePosition::Final, a, b)
    }

    pub fn sides(&self) -> (&str, &str) {
        (&self.short, &self.long)
    }

    /// Rewrite `s` with this rule, or `None` if neither side matches.
    ///
    /// ```
    /// use webime_core::fuzzy::FuzzyRule;
    ///
    /// let r = FuzzyRule::initial("s", "sh").unwrap();
    /// assert_eq!(r.apply("si").as_deref(), Some("shi"));
    /// assert_eq!(r.apply("shi").as_deref(), Some("si"));
    /// assert_eq!(r.apply("ni"), None);
    /// ```
    pub fn apply(&self, s: &str) -> Option<String> {
        match self.position {
            RulePosition::Initial => {
                if let Some(rest) = s.strip_prefix(self.long.as_str()) {
                    Some(format!("{}{}", self.short, rest))
                } else {
                    s.strip_prefix(self.short.as_str())
                        .map(|rest| format!("{}{}", self.long, rest))
                }
            }
            RulePosition::Final => {
                if let Some(head) = s.strip_suffix(self.long.as_str()) {
                    Some(format!("{}{}", head, self.short))
                } else {
                    s.strip_suffix(self.short.as_str())
                        .map(|head| format!("{}{}", head, self.long))
                }
            }
        }
    }
}

impl fmt::Display for FuzzyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = match self.position {
            RulePosition::Initial => "initial",
            RulePosition::Final => "final",
        };
        write!(f, "{}:{}={}", pos, self.short, self.long)
    }
}

impl FromStr for FuzzyRule {
    type Err = Error;

    /// Parse `"s=sh"` (initial by default), `"initial:z=zh"` or
    /// `"final:an=ang"`.
    fn from_str(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (position, pair) = match spec.split_once(':') {
            Some(("initial", pair)) => (RulePosition::Initial, pair),
            Some(("final", pair)) => (RulePosition::Final, pair),
            Some((other, _)) => {
                return Err(Error::InvalidRule {
                    rule: spec.to_string(),
                    reason: format!("unknown position '{}'", other),
                })
            }
            None => (RulePosition::Initial, spec),
        };
        let (a, b) = pair.split_once('=').ok_or_else(|| Error::InvalidRule {
            rule: spec.to_string(),
            reason: "expected 'a=b'".to_string(),
        })?;
        FuzzyRule::new(position, a, b)
    }
}

/// A romanized string to search, and whether a rule produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub text: String,
    pub fuzzy: bool,
}

/// A validated set of enabled rules.
#[derive(Debug, Clone, Default)]
pub struct FuzzyRuleSet {
    rules: Vec<FuzzyRule>,
    max_variants: usize,
}

pub const DEFAULT_MAX_VARIANTS: usize = 64;

impl FuzzyRuleSet {
    /// Validate `rules` and build a set. Duplicate pairs (in either
    /// direction) collapse into one rule.
    ///
    /// The set is rejected if expanding any probe built from the rules' own
    /// spellings reaches more than `max_variants` variants.
    pub fn new(rules: Vec<FuzzyRule>, max_variants: usize) -> Result<Self> {
        let mut seen = AHashSet::new();
        let rules: Vec<FuzzyRule> = rules.into_iter().filter(|r| seen.insert(r.clone())).collect();
        let set = Self {
            rules,
            max_variants: max_variants.max(1),
        };
        set.check_bounded()?;
        Ok(set)
    }

    /// Parse and validate textual rules such as `"s=sh"` or `"final:an=ang"`.
    pub fn from_specs<S: AsRef<str>>(specs: &[S], max_variants: usize) -> Result<Self> {
        let rules = specs
            .iter()
            .map(|s| s.as_ref().parse::<FuzzyRule>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(rules, max_variants)
    }

    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            max_variants: DEFAULT_MAX_VARIANTS,
        }
    }

    pub fn rules(&self) -> &[FuzzyRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn check_bounded(&self) -> Result<()> {
        let initials: Vec<&str> = self
            .rules
            .iter()
            .filter(|r| r.position == RulePosition::Initial)
            .flat_map(|r| [r.short.as_str(), r.long.as_str()])
            .chain(std::iter::once(""))
            .collect();
        let finals: Vec<&str> = self
            .rules
            .iter()
            .filter(|r| r.position == RulePosition::Final)
            .flat_map(|r| [r.short.as_str(), r.long.as_str()])
            .chain(std::iter::once(""))
            .collect();

        for i in &initials {
            for f in &finals {
                let probe = format!("{}a{}", i, f);
                let (_, complete) = self.closure(&probe);
                if !complete {
                    return Err(Error::InvalidRule {
                        rule: self
                            .rules
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", "),
                        reason: format!(
                            "expanding '{}' exceeds {} variants",
                            probe, self.max_variants
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Breadth-first closure of `segment` under the rules. The flag is false
    /// when the variant bound cut the expansion short.
    fn closure(&self, segment: &str) -> (Vec<Variant>, bool) {
        let mut out = vec![Variant {
            text: segment.to_string(),
            fuzzy: false,
        }];
        let mut seen: AHashSet<String> = AHashSet::new();
        seen.insert(segment.to_string());

        let mut i = 0;
        while i < out.len() {
            for rule in &self.rules {
                if let Some(next) = rule.apply(&out[i].text) {
                    if next.is_empty() || !seen.insert(next.clone()) {
                        continue;
                    }
                    if out.len() >= self.max_variants {
                        return (out, false);
                    }
                    out.push(Variant {
                        text: next,
                        fuzzy: true,
                    });
                }
            }
            i += 1;
        }
        (out, true)
    }

    /// All variants of `segment` reachable through the rules, the original
    /// (unmarked) first and the rest in discovery order.
    pub fn expand(&self, segment: &str) -> Vec<Variant> {
        let (variants, complete) = self.closure(segment);
        if !complete {
            debug!(segment, limit = self.max_variants, "fuzzy expansion capped");
        }
        variants
    }
}
