use std::fmt;

/// Converts an fmtp key from its wire form to the structured form,
/// e.g. `packetization-mode` to `packetizationMode`.
///
/// Only a dash followed by an ASCII lowercase letter is folded, so values such
/// as the telephone-event range `0-15` pass through unchanged.
pub fn kebab_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-' {
            if let Some(next) = chars.peek().copied() {
                if next.is_ascii_lowercase() {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Converts an fmtp key from the structured form back to its wire form,
/// e.g. `profileLevelId` to `profile-level-id`.
pub fn camel_to_kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Insertion-ordered, string-keyed format parameters of a payload.
///
/// Keys are kept in their structured (camelCase) form.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct FmtpParameters(Vec<(String, String)>);

impl FmtpParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key` to `value`, keeping the position of an existing entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses the parameter part of an `a=fmtp` line (`k=v;k=v`).
    pub fn unmarshal(raw: &str) -> Self {
        let mut parameters = Self::new();
        for param in raw.split(';') {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (key, value) = match param.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (param, ""),
            };
            parameters.insert(kebab_to_camel(key), value);
        }
        parameters
    }

    /// Generates the parameter part of an `a=fmtp` line.
    pub fn marshal(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    camel_to_kebab(k)
                } else {
                    format!("{}={}", camel_to_kebab(k), v)
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FmtpParameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut parameters = Self::new();
        for (k, v) in iter {
            parameters.insert(k, v);
        }
        parameters
    }
}

impl fmt::Display for FmtpParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marshal())
    }
}
