//! Lightweight chemical formula inspection.
//!
//! Only what the engine needs: the set of elements in a formula, whether the
//! compound is a pure element, and a coarse compound class used to pick an
//! empirical melting entropy when transition data is missing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metallic elements (including metalloids commonly behaving as metals in
/// salts and oxides).
const METALS: &[&str] = &[
    "Li", "Be", "Na", "Mg", "Al", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu",
    "Zn", "Ga", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu",
    "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Th", "U", "Pu",
];

/// Anion-forming non-metals that, combined with a metal, make a salt.
const SALT_FORMERS: &[&str] = &["F", "Cl", "Br", "I", "S", "N", "C", "P", "Se", "Te"];

/// Coarse compound class for empirical melting entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundClass {
    Metal,
    Salt,
    Oxide,
    Molecular,
}

impl fmt::Display for CompoundClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Metal => "metal",
            Self::Salt => "salt",
            Self::Oxide => "oxide",
            Self::Molecular => "molecular",
        };
        f.write_str(name)
    }
}

/// Element symbol -> atom count, ignoring charges and phase annotations.
///
/// Parentheses groups are expanded (`Ca(OH)2` -> Ca 1, O 2, H 2). Unparseable
/// characters are skipped; an empty map means nothing was recognised. Counts
/// saturate at `u32::MAX`.
pub fn element_counts(formula: &str) -> BTreeMap<String, u32> {
    let core = strip_annotations(formula);
    let chars: Vec<char> = core.chars().collect();
    let mut pos = 0;
    let mut counts = BTreeMap::new();
    parse_group(&chars, &mut pos, 1, &mut counts);
    counts
}

/// A formula made of one element only (`Fe`, `O2`, `S8`).
pub fn is_pure_element(formula: &str) -> bool {
    element_counts(formula).len() == 1
}

/// Classify a formula by its element pattern.
pub fn classify(formula: &str) -> CompoundClass {
    let counts = element_counts(formula);
    if counts.is_empty() {
        return CompoundClass::Molecular;
    }

    let is_metal = |e: &str| METALS.contains(&e);
    let has_metal = counts.keys().any(|e| is_metal(e));
    if !has_metal {
        return CompoundClass::Molecular;
    }
    if counts.keys().all(|e| is_metal(e)) {
        return CompoundClass::Metal;
    }

    let non_metals: Vec<&str> = counts
        .keys()
        .map(String::as_str)
        .filter(|e| !is_metal(e))
        .collect();
    if non_metals == ["O"] {
        return CompoundClass::Oxide;
    }
    if non_metals.iter().any(|e| SALT_FORMERS.contains(e)) || non_metals.contains(&"O") {
        // Oxyanion salts (sulfates, nitrates, carbonates, hydroxides) land here too.
        return CompoundClass::Salt;
    }
    CompoundClass::Molecular
}

/// Drop `(g)`-style phase tags, charges (`+`, `-`, `2+`) and hydrate dots.
fn strip_annotations(formula: &str) -> String {
    let mut s = formula.trim().to_string();
    for tag in ["(g)", "(l)", "(s)", "(cr)", "(aq)", "(liq)"] {
        if let Some(stripped) = s.strip_suffix(tag) {
            s = stripped.trim_end().to_string();
        }
    }
    let s = s.trim_end_matches(|c: char| c == '+' || c == '-');
    s.split(['·', '*', '.']).next().unwrap_or_default().to_string()
}

fn parse_group(chars: &[char], pos: &mut usize, multiplier: u32, out: &mut BTreeMap<String, u32>) {
    while *pos < chars.len() {
        let c = chars[*pos];
        if c.is_ascii_uppercase() {
            let mut symbol = c.to_string();
            *pos += 1;
            while *pos < chars.len() && chars[*pos].is_ascii_lowercase() {
                symbol.push(chars[*pos]);
                *pos += 1;
            }
            let n = parse_count(chars, pos);
            let count = out.entry(symbol).or_insert(0);
            *count = count.saturating_add(n.saturating_mul(multiplier));
        } else if c == '(' || c == '[' {
            *pos += 1;
            let mut inner = BTreeMap::new();
            parse_group(chars, pos, 1, &mut inner);
            let n = parse_count(chars, pos);
            for (symbol, inner_count) in inner {
                let count = out.entry(symbol).or_insert(0);
                let added = inner_count.saturating_mul(n).saturating_mul(multiplier);
                *count = count.saturating_add(added);
            }
        } else if c == ')' || c == ']' {
            *pos += 1;
            return;
        } else {
            *pos += 1;
        }
    }
}

fn parse_count(chars: &[char], pos: &mut usize) -> u32 {
    let start = *pos;
    while *pos < chars.len() && chars[*pos].is_ascii_digit() {
        *pos += 1;
    }
    if start == *pos {
        1
    } else {
        chars[start..*pos]
            .iter()
            .collect::<String>()
            .parse()
            .unwrap_or(1)
    }
}
