//! Rich rule canonicalization.
//!
//! The grammar of rich rules belongs to the firewall backend. This crate only
//! needs a single call that either returns a canonical string (used as the
//! entry's identity key) or rejects the rule.

use crate::error::{Error, Result};

/// Validates a raw rich rule and returns its canonical form.
pub trait RichRuleCanonicalizer {
    fn canonicalize(&self, raw: &str) -> Result<String>;
}

/// Canonicalizer used when no backend-provided one is available.
///
/// Collapses whitespace outside quoted values, quotes bare attribute values
/// and puts the attributes of `rule`, `port`, `source-port`, `forward-port`,
/// `log` and `nflog` in the order firewalld lists them. It also checks the
/// structural minimum: a leading `rule` keyword and balanced double quotes.
///
/// Elements are kept in the caller's order and keyword case is not folded.
/// A rule written in a different element order than firewalld lists it
/// never matches the persisted entry, so it is added again on every run.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicRichRules;

impl RichRuleCanonicalizer for BasicRichRules {
    fn canonicalize(&self, raw: &str) -> Result<String> {
        let reject = |message: &str| Error::RuleSyntax {
            rule: raw.to_string(),
            message: message.to_string(),
        };

        let tokens = tokenize(raw).ok_or_else(|| reject("unbalanced quotes"))?;
        match tokens.first() {
            None => Err(reject("empty rule")),
            Some(first) if first != "rule" => Err(reject("rule must start with 'rule'")),
            Some(_) if tokens.len() == 1 => Err(reject("rule has no elements")),
            Some(_) => {
                let quoted: Vec<String> = tokens.iter().map(|t| quote_value(t)).collect();
                Ok(order_attributes(quoted).join(" "))
            }
        }
    }
}

/// Attribute order firewalld uses when listing an element.
fn attribute_order(element: &str) -> &'static [&'static str] {
    match element {
        "rule" => &["priority", "family"],
        "port" | "source-port" => &["port", "protocol"],
        "forward-port" => &["port", "protocol", "to-port", "to-addr"],
        "log" => &["prefix", "level"],
        "nflog" => &["group", "prefix", "queue-size"],
        _ => &[],
    }
}

/// Sort each run of `key=value` tokens by the preceding element's order.
fn order_attributes(tokens: Vec<String>) -> Vec<String> {
    let mut ordered = Vec::with_capacity(tokens.len());
    let mut element = String::new();
    let mut run: Vec<String> = Vec::new();

    let flush = |element: &str, run: &mut Vec<String>, out: &mut Vec<String>| {
        let order = attribute_order(element);
        run.sort_by_key(|token| {
            let key = token.split_once('=').map_or(token.as_str(), |(k, _)| k);
            order.iter().position(|k| *k == key).unwrap_or(order.len())
        });
        out.append(run);
    };

    for token in tokens {
        if token.contains('=') {
            run.push(token);
        } else {
            flush(&element, &mut run, &mut ordered);
            element.clone_from(&token);
            ordered.push(token);
        }
    }
    flush(&element, &mut run, &mut ordered);
    ordered
}

/// `key=value` becomes `key="value"`, the form firewalld lists rules in.
fn quote_value(token: &str) -> String {
    match token.split_once('=') {
        Some((key, value)) if !value.starts_with('"') => format!("{key}=\"{value}\""),
        _ => token.to_string(),
    }
}

/// Split on whitespace, keeping double-quoted runs intact.
///
/// Returns `None` when a quote is left open.
fn tokenize(raw: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in raw.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                current.push(ch);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if quoted {
        return None;
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Some(tokens)
}
