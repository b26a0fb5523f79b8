use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::RefKind;

/// Read-only name→id tables for identifier-typed attributes. Loaded once per
/// batch invocation and shared across workers without synchronization.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RefLookup {
    #[serde(default)]
    pub kinds: HashMap<String, i64>,
    #[serde(default)]
    pub statuses: HashMap<String, i64>,
    #[serde(default)]
    pub priorities: HashMap<String, i64>,
    #[serde(default)]
    pub categories: HashMap<String, i64>,
    #[serde(default)]
    pub milestones: HashMap<String, i64>,
    #[serde(default)]
    pub users: HashMap<String, i64>,
}

impl RefLookup {
    pub fn resolve(&self, kind: RefKind, name: &str) -> Option<i64> {
        self.table(kind).get(name.trim()).copied()
    }

    pub fn insert(&mut self, kind: RefKind, name: impl Into<String>, id: i64) {
        self.table_mut(kind).insert(name.into(), id);
    }

    fn table(&self, kind: RefKind) -> &HashMap<String, i64> {
        match kind {
            RefKind::Kind => &self.kinds,
            RefKind::Status => &self.statuses,
            RefKind::Priority => &self.priorities,
            RefKind::Category => &self.categories,
            RefKind::Milestone => &self.milestones,
            RefKind::User => &self.users,
        }
    }

    fn table_mut(&mut self, kind: RefKind) -> &mut HashMap<String, i64> {
        match kind {
            RefKind::Kind => &mut self.kinds,
            RefKind::Status => &mut self.statuses,
            RefKind::Priority => &mut self.priorities,
            RefKind::Category => &mut self.categories,
            RefKind::Milestone => &mut self.milestones,
            RefKind::User => &mut self.users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RefLookup;
    use crate::RefKind;

    #[test]
    fn resolve_trims_and_scopes_by_kind() {
        let mut lookup = RefLookup::default();
        lookup.insert(RefKind::Status, "In Progress", 4);
        assert_eq!(lookup.resolve(RefKind::Status, " In Progress "), Some(4));
        assert_eq!(lookup.resolve(RefKind::Priority, "In Progress"), None);
        assert_eq!(lookup.resolve(RefKind::Status, "Closed"), None);
    }
}
