//! Element identifiers backed by a global string interner.
//!
//! Process elements and sequence flows are referenced by id everywhere in the
//! pipeline (graph adjacency, layer maps, grid cells, routes). [`Id`] keeps
//! those keys `Copy` and cheap to hash while still resolving back to the
//! original string for export and for deterministic ordering.

use std::{
    cmp::Ordering,
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for element identifiers.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock")
}

/// Interned identifier of a process element or sequence flow.
///
/// Equality and hashing work on the interned symbol. Ordering compares the
/// resolved strings, so sorting a list of ids gives the same result no matter
/// in which order the ids were first interned.
///
/// # Examples
///
/// ```
/// use bpmn_layout_core::identifier::Id;
///
/// let start = Id::new("StartEvent_1");
/// let task = Id::new("Activity_1");
///
/// assert_eq!(start, "StartEvent_1");
/// assert!(task < start);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str, interning it on first use.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        f.write_str(str_value)
    }
}

impl std::str::FromStr for Id {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        let interner = interner();
        interner
            .resolve(self.0)
            .expect("Symbol should exist in interner")
            == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        // Both symbols resolve under one guard; the mutex is not reentrant.
        let interner = interner();
        let lhs = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        let rhs = interner
            .resolve(other.0)
            .expect("Symbol should exist in interner");
        lhs.cmp(rhs)
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("Task_1");
        let id2 = Id::new("Task_1");
        let id3 = Id::new("Gateway_1");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "Task_1");
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("Flow_0xyz");
        assert_eq!(format!("{id}"), "Flow_0xyz");
        assert_eq!(id.to_string(), "Flow_0xyz");
    }

    #[test]
    fn test_from_trait() {
        let id1: Id = "StartEvent_1".into();
        let id2 = Id::new("StartEvent_1");

        assert_eq!(id1, id2);
        assert_eq!(id1, "StartEvent_1");
    }

    #[test]
    fn test_from_str() {
        let id: Id = "EndEvent_9".parse().unwrap();
        assert_eq!(id, "EndEvent_9");
    }

    #[test]
    fn test_hash_and_eq() {
        use std::collections::HashMap;

        let id1 = Id::new("key1");
        let id2 = Id::new("key1");
        let id3 = Id::new("key2");

        let mut map = HashMap::new();
        map.insert(id1, "value1");
        map.insert(id3, "value2");

        assert_eq!(map.get(&id2), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_partial_eq_str() {
        let id = Id::new("Task_A");

        assert!(id == "Task_A");
        assert!(id != "Task_B");

        let empty = Id::new("");
        assert!(empty == "");
        assert!(empty != "non-empty");
    }

    #[test]
    fn test_ordering_follows_strings_not_interning_order() {
        // Interned in reverse alphabetical order on purpose.
        let z = Id::new("zz_ordering");
        let m = Id::new("mm_ordering");
        let a = Id::new("aa_ordering");

        let mut ids = vec![z, m, a];
        ids.sort();

        assert_eq!(ids, vec![a, m, z]);
        assert_eq!(a.cmp(&a), Ordering::Equal);
        assert!(m > a);
    }

    #[test]
    fn test_min_by_string() {
        let ids = [Id::new("node_c"), Id::new("node_a"), Id::new("node_b")];
        assert_eq!(ids.iter().min(), Some(&Id::new("node_a")));
    }
}
