//! Connection string tokenizer.
//!
//! Produces an ordered table of canonical key to raw value. It knows the
//! grammar's spellings but nothing about value types.

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{OptionsError, OptionsResult};
use crate::grammar;

/// Parsed `key=value` pairs keyed by canonical option name.
///
/// Duplicate keys keep the position of their first occurrence and the value
/// of their last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueTable {
    entries: IndexMap<&'static str, String>,
}

impl KeyValueTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize a raw connection string.
    ///
    /// ```rust
    /// use sqlfront_options::KeyValueTable;
    ///
    /// let table = KeyValueTable::parse("Server=tcp:db;Pwd='a;b'").unwrap();
    /// assert_eq!(table.get("data source"), Some("tcp:db"));
    /// assert_eq!(table.get("password"), Some("a;b"));
    /// ```
    pub fn parse(raw: &str) -> OptionsResult<Self> {
        let mut table = Self::new();
        let mut cursor = Cursor::new(raw);

        while let Some((key, value)) = cursor.next_pair()? {
            let folded = key.to_lowercase();
            let option =
                grammar::lookup(&folded).ok_or_else(|| OptionsError::UnknownOption(key.clone()))?;
            trace!(key = option.key, "connection string pair");
            table.entries.insert(option.key, value);
        }

        Ok(table)
    }

    /// Insert or replace a value by canonical key.
    pub(crate) fn set(&mut self, key: &'static str, value: impl Into<String>) {
        self.entries.insert(key, value.into());
    }

    /// Raw value for a canonical key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Raw value, treating an empty value the same as an absent one.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Whether the key was written at all, even with an empty value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate canonical keys in the order they first appeared.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Iterate entries in the order they first appeared.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no keys were given.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Append `display=value;` to `out`, quoting the value when needed.
pub(crate) fn write_pair(out: &mut String, display: &str, value: &str) {
    if !out.is_empty() {
        out.push(';');
    }
    out.push_str(&display.replace('=', "=="));
    out.push('=');

    let needs_quotes = value.contains(|c| matches!(c, ';' | '\'' | '"'))
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);

    if !needs_quotes {
        out.push_str(value);
    } else if !value.contains('"') {
        out.push('"');
        out.push_str(value);
        out.push('"');
    } else if !value.contains('\'') {
        out.push('\'');
        out.push_str(value);
        out.push('\'');
    } else {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn malformed(&self) -> OptionsError {
        OptionsError::MalformedConnectionString { position: self.pos }
    }

    /// Next `(key, value)` pair, skipping empty segments.
    fn next_pair(&mut self) -> OptionsResult<Option<(String, String)>> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(None),
                Some(';') => {
                    self.bump();
                }
                Some(_) => break,
            }
        }

        let start = self.pos;
        let key = self.read_key()?;
        if key.is_empty() {
            return Err(OptionsError::MalformedConnectionString { position: start });
        }
        let value = self.read_value()?;
        Ok(Some((key, value)))
    }

    fn read_key(&mut self) -> OptionsResult<String> {
        let mut key = String::new();
        loop {
            match self.bump() {
                None | Some(';') => return Err(self.malformed()),
                Some('=') => {
                    if self.peek() == Some('=') {
                        self.bump();
                        key.push('=');
                    } else {
                        return Ok(key.trim().to_string());
                    }
                }
                Some(c) => key.push(c),
            }
        }
    }

    fn read_value(&mut self) -> OptionsResult<String> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        None => return Err(self.malformed()),
                        Some(c) if c == quote => {
                            if self.peek() == Some(quote) {
                                self.bump();
                                value.push(quote);
                            } else {
                                break;
                            }
                        }
                        Some(c) => value.push(c),
                    }
                }
                self.skip_whitespace();
                match self.bump() {
                    None | Some(';') => Ok(value),
                    Some(_) => Err(self.malformed()),
                }
            }
            _ => {
                let rest = &self.input[self.pos..];
                let end = rest.find(';').unwrap_or(rest.len());
                let value = rest[..end].trim().to_string();
                self.pos += end;
                self.bump();
                Ok(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple() {
        let table = KeyValueTable::parse("Server=localhost;Database=mydb;User Id=sa").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("data source"), Some("localhost"));
        assert_eq!(table.get("initial catalog"), Some("mydb"));
        assert_eq!(table.get("user id"), Some("sa"));
    }

    #[test]
    fn test_parse_trims_and_folds_case() {
        let table = KeyValueTable::parse("  DATA SOURCE =  srv  ; ").unwrap();
        assert_eq!(table.get("data source"), Some("srv"));
    }

    #[test]
    fn test_last_duplicate_wins_first_position_kept() {
        let table = KeyValueTable::parse("Server=a;Database=d;Address=b").unwrap();
        assert_eq!(table.get("data source"), Some("b"));
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["data source", "initial catalog"]);
    }

    #[test]
    fn test_quoted_values() {
        let table =
            KeyValueTable::parse(r#"Password="p;w=d";Application Name='it''s'"#).unwrap();
        assert_eq!(table.get("password"), Some("p;w=d"));
        assert_eq!(table.get("application name"), Some("it's"));

        let table = KeyValueTable::parse(r#"Password="say ""hi"" ""#).unwrap();
        assert_eq!(table.get("password"), Some(r#"say "hi" "#));
    }

    #[test]
    fn test_empty_value_is_present() {
        let table = KeyValueTable::parse("Initial Catalog=;Server=s").unwrap();
        assert!(table.contains("initial catalog"));
        assert_eq!(table.get("initial catalog"), Some(""));
        assert_eq!(table.value("initial catalog"), None);
    }

    #[test]
    fn test_unknown_key() {
        let err = KeyValueTable::parse("Server=s;Colour=blue").unwrap_err();
        assert_eq!(err, OptionsError::UnknownOption("Colour".to_string()));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            KeyValueTable::parse("Server"),
            Err(OptionsError::MalformedConnectionString { .. })
        ));
        assert!(matches!(
            KeyValueTable::parse("Password='open"),
            Err(OptionsError::MalformedConnectionString { .. })
        ));
        assert!(matches!(
            KeyValueTable::parse("Password='a' b"),
            Err(OptionsError::MalformedConnectionString { .. })
        ));
        assert!(matches!(
            KeyValueTable::parse("=x"),
            Err(OptionsError::MalformedConnectionString { position: 0 })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(KeyValueTable::parse("").unwrap().is_empty());
        assert!(KeyValueTable::parse(" ; ;").unwrap().is_empty());
    }

    #[test]
    fn test_write_pair_quoting() {
        let mut out = String::new();
        write_pair(&mut out, "Data Source", "srv");
        write_pair(&mut out, "Password", "a;b");
        write_pair(&mut out, "Application Name", r#"say "it's""#);
        assert_eq!(
            out,
            r#"Data Source=srv;Password="a;b";Application Name="say ""it's""""#
        );

        let table = KeyValueTable::parse(&out).unwrap();
        assert_eq!(table.get("password"), Some("a;b"));
        assert_eq!(table.get("application name"), Some(r#"say "it's""#));
    }

    proptest::proptest! {
        #[test]
        fn test_written_values_parse_back(value in "\\PC{0,40}") {
            let mut out = String::new();
            write_pair(&mut out, "Password", &value);
            write_pair(&mut out, "User ID", "sa");

            let table = KeyValueTable::parse(&out).unwrap();
            proptest::prop_assert_eq!(table.get("password"), Some(value.as_str()));
            proptest::prop_assert_eq!(table.get("user id"), Some("sa"));
        }
    }
}
