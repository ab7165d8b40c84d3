//! Histogram naming conventions.
//!
//! Source histograms encode their origin and pT position in their names,
//! e.g. `data_17_pT350.0` or `Py8_2017_pTref400_600`. The rules here pull
//! those pieces out without touching any histogram content.
//!
//! Rules written as `/.../` in settings are regular expressions; anything
//! else is taken literally.

use ir_core::{Error, Result};
use regex::Regex;

/// `Some(body)` when `pattern` is written as `/body/`.
fn slash_regex(pattern: &str) -> Option<&str> {
    let s = pattern.trim();
    (s.len() >= 2 && s.starts_with('/') && s.ends_with('/')).then(|| &s[1..s.len() - 1])
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("invalid regex /{pattern}/: {e}")))
}

/// Origin tag matcher.
#[derive(Debug, Clone)]
pub enum TagPattern {
    /// Name contains the string.
    Substring(String),
    /// Name matches the regex anywhere.
    Regex(Regex),
}

impl TagPattern {
    /// Parse a settings value: `/regex/` or a literal substring.
    pub fn parse(pattern: &str) -> Result<Self> {
        match slash_regex(pattern) {
            Some(body) => Ok(Self::Regex(compile(body)?)),
            None if pattern.trim().is_empty() => Err(Error::Config("empty origin tag".into())),
            None => Ok(Self::Substring(pattern.trim().to_string())),
        }
    }

    /// Whether `name` carries this tag.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Substring(s) => name.contains(s.as_str()),
            Self::Regex(re) => re.is_match(name),
        }
    }
}

/// How the pT key is read from a histogram name.
#[derive(Debug, Clone, Default)]
pub enum NumberRule {
    /// Leftmost `digits.digits` token.
    #[default]
    Decimal,
    /// Leftmost decimal or integer token.
    Any,
    /// First capture group (or whole match) of a user regex.
    Regex(Regex),
}

impl NumberRule {
    /// Parse a settings value: `decimal`, `any` or `/regex/`.
    pub fn parse(pattern: &str) -> Result<Self> {
        if let Some(body) = slash_regex(pattern) {
            return Ok(Self::Regex(compile(body)?));
        }
        match pattern.trim().to_ascii_lowercase().as_str() {
            "decimal" => Ok(Self::Decimal),
            "any" => Ok(Self::Any),
            other => Err(Error::Config(format!(
                "unknown number rule '{other}' (expected decimal, any or /regex/)"
            ))),
        }
    }

    /// Numeric token in `name`, if any.
    pub fn extract(&self, name: &str) -> Option<f64> {
        match self {
            Self::Decimal => scan_number(name, true),
            Self::Any => scan_number(name, false),
            Self::Regex(re) => {
                let caps = re.captures(name)?;
                let m = caps.get(1).or_else(|| caps.get(0))?;
                m.as_str().parse().ok()
            }
        }
    }
}

/// Leftmost-first scan for `\d+\.\d+` (or `\d+(\.\d+)?` when the fraction
/// is optional).
fn scan_number(name: &str, require_fraction: bool) -> Option<f64> {
    let b = name.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    while i < b.len() {
        if !b[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let int_end = digits_from(i);
        let has_fraction =
            int_end + 1 < b.len() && b[int_end] == b'.' && b[int_end + 1].is_ascii_digit();
        if has_fraction {
            let end = digits_from(int_end + 1);
            return name[i..end].parse().ok();
        }
        if !require_fraction {
            return name[i..int_end].parse().ok();
        }
        // No match can start inside this digit run either.
        i = int_end;
    }
    None
}

/// `<prefix><lo>_<hi>` reference-pT range, e.g. `pTref400_600`.
#[derive(Debug, Clone)]
pub struct RefRangeRule {
    prefix: String,
}

impl Default for RefRangeRule {
    fn default() -> Self {
        Self { prefix: "pTref".to_string() }
    }
}

impl RefRangeRule {
    /// Rule for a custom prefix.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(Error::Config("reference-range prefix must not be empty".into()));
        }
        Ok(Self { prefix })
    }

    /// First `(lo, hi)` pair following the prefix in `name`.
    pub fn parse(&self, name: &str) -> Option<(f64, f64)> {
        name.match_indices(self.prefix.as_str()).find_map(|(at, p)| {
            let rest = &name[at + p.len()..];
            let (lo, rest) = leading_int(rest)?;
            let (hi, _) = leading_int(rest.strip_prefix('_')?)?;
            Some((lo as f64, hi as f64))
        })
    }
}

fn leading_int(s: &str) -> Option<(i64, &str)> {
    let end = s.bytes().position(|c| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((s[..end].parse().ok()?, &s[end..]))
}
