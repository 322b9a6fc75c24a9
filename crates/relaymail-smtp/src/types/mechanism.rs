//! Authentication mechanisms and their selection.
//!
//! The client implements two SASL mechanisms. When the server offers more
//! than one of them, the one with the lowest code is used.

/// SASL authentication mechanism implemented by the client.
///
/// The discriminant is the preference code: lower wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Mechanism {
    /// LOGIN - username and password in two base64 continuation lines
    Login = 1,
    /// PLAIN - RFC 4616 credentials in the initial response
    Plain = 2,
}

/// Mechanism table in lookup order.
pub const MECHANISMS: &[(&str, Mechanism)] =
    &[("LOGIN", Mechanism::Login), ("PLAIN", Mechanism::Plain)];

impl Mechanism {
    /// Looks up a server-announced mechanism name (case-insensitive).
    ///
    /// Returns `None` for mechanisms this client does not implement.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        MECHANISMS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|&(_, mechanism)| mechanism)
    }

    /// Returns the preference code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the mechanism name as sent in `AUTH`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Plain => "PLAIN",
        }
    }

    const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Login),
            2 => Some(Self::Plain),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitmap of mechanisms both offered by the server and implemented here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MechanismSet(u32);

impl MechanismSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Adds a mechanism.
    pub const fn insert(&mut self, mechanism: Mechanism) {
        self.0 |= 1 << mechanism.code();
    }

    /// Returns true if no mechanism is in the set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the member with the lowest code.
    #[must_use]
    pub const fn preferred(self) -> Option<Mechanism> {
        if self.is_empty() {
            return None;
        }
        Mechanism::from_code(self.0.trailing_zeros())
    }
}

impl FromIterator<Mechanism> for MechanismSet {
    fn from_iter<I: IntoIterator<Item = Mechanism>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for mechanism in iter {
            set.insert(mechanism);
        }
        set
    }
}

/// Result of scanning the EHLO reply for `AUTH`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthSelection {
    /// The server did not announce any mechanism.
    #[default]
    NotOffered,
    /// The server announced mechanisms, none of which is implemented.
    Unsupported {
        /// The announced list, as sent.
        offered: String,
    },
    /// Preferred mechanism among those offered and implemented.
    Selected(Mechanism),
}

impl AuthSelection {
    /// Selects a mechanism from the list following an `AUTH` keyword.
    ///
    /// Unknown names are ignored. An empty list selects nothing.
    #[must_use]
    pub fn from_announcement(list: &str) -> Self {
        let mut tokens = list.split_whitespace().peekable();
        if tokens.peek().is_none() {
            return Self::NotOffered;
        }

        let supported: MechanismSet = tokens.filter_map(Mechanism::parse).collect();
        match supported.preferred() {
            Some(mechanism) => Self::Selected(mechanism),
            None => Self::Unsupported {
                offered: list.trim().to_string(),
            },
        }
    }

    /// Folds another `AUTH` line into this selection.
    ///
    /// A line that selects a mechanism replaces the current choice; a line
    /// naming only unknown mechanisms never overrides an earlier choice.
    pub fn absorb(&mut self, list: &str) {
        match Self::from_announcement(list) {
            Self::NotOffered => {}
            selected @ Self::Selected(_) => *self = selected,
            unsupported @ Self::Unsupported { .. } => {
                if !matches!(self, Self::Selected(_)) {
                    *self = unsupported;
                }
            }
        }
    }

    /// Returns the chosen mechanism, if any.
    #[must_use]
    pub const fn mechanism(&self) -> Option<Mechanism> {
        match self {
            Self::Selected(mechanism) => Some(*mechanism),
            Self::NotOffered | Self::Unsupported { .. } => None,
        }
    }
}
