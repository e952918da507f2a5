use std::collections::BTreeMap;

/// Position of the transaction that last wrote a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub block: u64,
    pub tx: u32,
}

#[derive(Debug, Clone)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: Version,
}

/// Committed key/value state. Only the committer mutates it.
#[derive(Debug, Default)]
pub struct WorldState {
    entries: BTreeMap<String, VersionedValue>,
    height: u64,
}

impl WorldState {
    pub fn get(&self, key: &str) -> Option<&VersionedValue> {
        self.entries.get(key)
    }

    pub fn version(&self, key: &str) -> Option<Version> {
        self.entries.get(key).map(|v| v.version)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VersionedValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of committed blocks.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Cut a new block holding a single transaction and apply its writes.
    pub fn apply_block(&mut self, writes: BTreeMap<String, Vec<u8>>) -> u64 {
        self.height += 1;
        let version = Version { block: self.height, tx: 0 };
        for (key, value) in writes {
            self.entries.insert(key, VersionedValue { value, version });
        }
        self.height
    }

    /// Advance the height without applying anything (invalidated tx).
    pub fn skip_block(&mut self) -> u64 {
        self.height += 1;
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_bumps_version() {
        let mut world = WorldState::default();
        world.apply_block(BTreeMap::from([("k".to_string(), b"1".to_vec())]));
        let first = world.version("k").unwrap();
        world.apply_block(BTreeMap::from([("k".to_string(), b"2".to_vec())]));
        let second = world.version("k").unwrap();
        assert!(second > first);
        assert_eq!(world.get("k").unwrap().value, b"2");
        assert_eq!(world.len(), 1);
        assert_eq!(world.height(), 2);
    }
}
