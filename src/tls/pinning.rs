//! Certificate and public-key pins.
//!
//! A pin is the base64 SHA-256 digest of either the leaf certificate's DER
//! encoding or of its SubjectPublicKeyInfo. Pins arrive per request as
//! comma-separated strings and are never stored.
//!
//! Pins are not validated as base64 here. Comparison is an exact string
//! match against a freshly computed digest, so a malformed pin can never
//! match and the request fails closed.

use std::fmt;

const PIN_PREFIX: &str = "sha256/";

/// What a pin's digest was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinKind {
    /// DER-encoded SubjectPublicKeyInfo of the leaf certificate.
    Spki,
    /// DER-encoded leaf certificate.
    Certificate,
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKind::Spki => f.write_str("spki"),
            PinKind::Certificate => f.write_str("certificate"),
        }
    }
}

/// A single expected digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pin {
    kind: PinKind,
    digest: String,
}

impl Pin {
    /// Normalize one pin token: surrounding whitespace is trimmed and an
    /// optional `sha256/` prefix is removed. Returns `None` for an empty token.
    pub fn parse(kind: PinKind, token: &str) -> Option<Self> {
        let trimmed = token.trim();
        let digest = trimmed.strip_prefix(PIN_PREFIX).unwrap_or(trimmed).trim();
        if digest.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            digest: digest.to_string(),
        })
    }

    pub fn kind(&self) -> PinKind {
        self.kind
    }

    /// The base64 digest, without any `sha256/` prefix.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PIN_PREFIX, self.digest)
    }
}

/// The pins supplied for one request.
///
/// Holds SPKI and certificate pins side by side, in insertion order and
/// without duplicates. A match in either subset is sufficient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinSet {
    pins: Vec<Pin>,
}

impl PinSet {
    /// Create an empty pin set (pinning disabled).
    pub fn new() -> Self {
        Self { pins: Vec::new() }
    }

    /// Build a pin set from the two CSV channels. Either may be absent.
    pub fn from_csv(spki_csv: Option<&str>, cert_csv: Option<&str>) -> Self {
        let mut set = Self::new();
        if let Some(csv) = spki_csv {
            set.add_csv(PinKind::Spki, csv);
        }
        if let Some(csv) = cert_csv {
            set.add_csv(PinKind::Certificate, csv);
        }
        set
    }

    /// Add every non-empty token of `csv` as a pin of `kind`.
    pub fn add_csv(&mut self, kind: PinKind, csv: &str) {
        for token in csv.split(',') {
            if let Some(pin) = Pin::parse(kind, token) {
                self.add(pin);
            }
        }
    }

    /// Add a pin, ignoring duplicates.
    pub fn add(&mut self, pin: Pin) {
        if !self.pins.contains(&pin) {
            self.pins.push(pin);
        }
    }

    /// Builder-style variant of [`add_csv`](Self::add_csv).
    pub fn with_csv(mut self, kind: PinKind, csv: &str) -> Self {
        self.add_csv(kind, csv);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    /// Pins of one kind, in insertion order.
    pub fn of_kind(&self, kind: PinKind) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(move |p| p.kind == kind)
    }

    pub fn has_kind(&self, kind: PinKind) -> bool {
        self.pins.iter().any(|p| p.kind == kind)
    }

    /// Check if `digest` equals any pin of `kind`.
    pub fn matches(&self, kind: PinKind, digest: &str) -> bool {
        self.of_kind(kind).any(|p| p.digest == digest)
    }

    /// Re-serialize one subset as a CSV of bare digests, or `None` if the
    /// subset is empty.
    pub fn to_csv(&self, kind: PinKind) -> Option<String> {
        let digests: Vec<&str> = self.of_kind(kind).map(Pin::digest).collect();
        if digests.is_empty() {
            None
        } else {
            Some(digests.join(","))
        }
    }
}
