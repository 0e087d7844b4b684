use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of favourites a single user can hold.
pub const CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("favourites limit of {} reached", CAPACITY)]
pub struct CapacityExceeded;

/// Ordered set of favourite identifiers, bounded by [`CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Favourites(Vec<String>);

impl Favourites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from stored data, keeping the first occurrence of each id
    /// and dropping anything past the cap.
    pub fn from_stored(items: Vec<String>) -> Self {
        let mut out = Vec::with_capacity(items.len().min(CAPACITY));
        for item in items {
            if out.len() == CAPACITY {
                break;
            }
            if !out.contains(&item) {
                out.push(item);
            }
        }
        Self(out)
    }

    /// Set-add. Returns `Ok(false)` when the id is already present.
    pub fn insert(&mut self, fav_id: &str) -> Result<bool, CapacityExceeded> {
        if self.contains(fav_id) {
            return Ok(false);
        }
        if self.is_full() {
            return Err(CapacityExceeded);
        }
        self.0.push(fav_id.to_string());
        Ok(true)
    }

    /// Returns whether anything was removed.
    pub fn remove(&mut self, fav_id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|f| f != fav_id);
        self.0.len() != before
    }

    pub fn contains(&self, fav_id: &str) -> bool {
        self.as_slice().iter().any(|f| f == fav_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= CAPACITY
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Favourites {
    fn from(items: Vec<String>) -> Self {
        Self::from_stored(items)
    }
}

impl From<Favourites> for Vec<String> {
    fn from(f: Favourites) -> Self {
        f.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Favourites {
        Favourites::from_stored((0..CAPACITY).map(|i| format!("movie{i}")).collect())
    }

    #[test]
    fn insert_is_idempotent() {
        let mut favs = Favourites::new();
        assert_eq!(favs.insert("movie42"), Ok(true));
        assert_eq!(favs.insert("movie42"), Ok(false));
        assert_eq!(favs.as_slice(), ["movie42".to_string()]);
    }

    #[test]
    fn insert_past_capacity_fails_without_mutation() {
        let mut favs = full();
        assert!(favs.is_full());
        assert_eq!(favs.insert("one-too-many"), Err(CapacityExceeded));
        assert_eq!(favs.len(), CAPACITY);
        assert!(!favs.contains("one-too-many"));
    }

    #[test]
    fn insert_existing_when_full_is_a_noop() {
        let mut favs = full();
        assert_eq!(favs.insert("movie0"), Ok(false));
        assert_eq!(favs.len(), CAPACITY);
    }

    #[test]
    fn remove_absent_is_a_noop() {
        let mut favs = Favourites::from_stored(vec!["a".into(), "b".into()]);
        assert!(!favs.remove("zzz"));
        assert_eq!(favs.as_slice(), ["a".to_string(), "b".to_string()]);
        assert!(favs.remove("a"));
        assert_eq!(favs.as_slice(), ["b".to_string()]);
    }

    #[test]
    fn from_stored_drops_duplicates_and_overflow() {
        let mut raw: Vec<String> = vec!["x".into(), "x".into(), "y".into()];
        raw.extend((0..CAPACITY).map(|i| i.to_string()));
        let favs = Favourites::from_stored(raw);
        assert_eq!(favs.len(), CAPACITY);
        assert_eq!(&favs.as_slice()[..2], ["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let favs = Favourites::from_stored(vec!["movie42".into()]);
        assert_eq!(serde_json::to_string(&favs).unwrap(), r#"["movie42"]"#);
    }
}
