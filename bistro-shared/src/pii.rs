use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// Wraps contact data (phone numbers, names) so `Debug`/`Display` never print it whole.
/// Serialization passes the real value through; API responses and order submission need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    /// Last two characters only, e.g. `***67`
    fn redacted(&self) -> String {
        let value = self.0.as_ref();
        let count = value.chars().count();
        if count <= 2 {
            return "***".to_string();
        }
        let tail: String = value.chars().skip(count - 2).collect();
        format!("***{}", tail)
    }

    pub fn is_blank(&self) -> bool {
        self.0.as_ref().trim().is_empty()
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Masked(value.to_string())
    }
}
