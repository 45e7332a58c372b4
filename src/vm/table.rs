//! Open-addressing hash table keyed by interned strings.
//!
//! Linear probing over a power-of-two capacity. Deleted entries become
//! tombstones (no key, `Bool(true)` sentinel) so probe chains stay intact;
//! a resize drops them. Keys are canonical interned objects, so key
//! comparison is pointer comparison — except `find_string`, which compares
//! bytes and is how interning finds a canonical object in the first place.

use std::rc::Rc;

use super::value::{Obj, Value};

#[derive(Debug, Clone)]
struct Entry {
    key: Option<Rc<Obj>>,
    value: Value,
}

impl Entry {
    fn empty() -> Self {
        Self {
            key: None,
            value: Value::Null,
        }
    }

    fn is_tombstone(&self) -> bool {
        self.key.is_none() && !matches!(self.value, Value::Null)
    }
}

#[derive(Debug)]
pub struct Table {
    /// Live entries plus tombstones.
    count: usize,
    entries: Vec<Entry>,
}

impl Table {
    pub fn new() -> Self {
        Self {
            count: 0,
            entries: Vec::new(),
        }
    }

    /// Look up a key, cloning out its value.
    pub fn get(&self, key: &Rc<Obj>) -> Option<Value> {
        if self.entries.is_empty() {
            return None;
        }
        let entry = &self.entries[self.find_slot(key)];
        entry.key.as_ref().map(|_| entry.value.clone())
    }

    /// Insert or overwrite. Returns true if the key was not present.
    pub fn insert(&mut self, key: Rc<Obj>, value: Value) -> bool {
        if (self.count + 1) * 4 > self.entries.len() * 3 {
            self.grow();
        }

        let slot = self.find_slot(&key);
        let entry = &mut self.entries[slot];
        let is_new = entry.key.is_none();
        // A reclaimed tombstone is already counted.
        if is_new && !entry.is_tombstone() {
            self.count += 1;
        }
        entry.key = Some(key);
        entry.value = value;
        is_new
    }

    /// Remove a key, leaving a tombstone. Returns true if it was present.
    pub fn remove(&mut self, key: &Rc<Obj>) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let slot = self.find_slot(key);
        let entry = &mut self.entries[slot];
        if entry.key.is_none() {
            return false;
        }
        entry.key = None;
        entry.value = Value::Bool(true);
        true
    }

    /// Find an interned string by bytes and hash without inserting.
    pub fn find_string(&self, chars: &str, hash: u32) -> Option<Rc<Obj>> {
        if self.entries.is_empty() {
            return None;
        }
        let mut index = hash as usize & (self.entries.len() - 1);
        loop {
            let entry = &self.entries[index];
            match &entry.key {
                None => {
                    if !entry.is_tombstone() {
                        return None;
                    }
                }
                Some(key) => {
                    if key.hash() == hash && key.as_str() == chars {
                        return Some(key.clone());
                    }
                }
            }
            index = (index + 1) & (self.entries.len() - 1);
        }
    }

    /// Probe for a key's slot: its entry, or the slot an insert would use
    /// (the first tombstone on the chain, else the trailing empty slot).
    fn find_slot(&self, key: &Rc<Obj>) -> usize {
        let mut index = key.hash() as usize & (self.entries.len() - 1);
        let mut tombstone = None;
        loop {
            let entry = &self.entries[index];
            match &entry.key {
                None => {
                    if !entry.is_tombstone() {
                        return tombstone.unwrap_or(index);
                    }
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Some(k) if Rc::ptr_eq(k, key) => return index,
                Some(_) => {}
            }
            index = (index + 1) & (self.entries.len() - 1);
        }
    }

    /// Double the capacity (from 8), re-inserting only live entries.
    fn grow(&mut self) {
        let capacity = if self.entries.is_empty() {
            8
        } else {
            self.entries.len() * 2
        };
        let old = std::mem::replace(&mut self.entries, vec![Entry::empty(); capacity]);
        self.count = 0;
        for entry in old {
            if let Some(key) = entry.key {
                let slot = self.find_slot(&key);
                self.entries[slot] = Entry {
                    key: Some(key),
                    value: entry.value,
                };
                self.count += 1;
            }
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
