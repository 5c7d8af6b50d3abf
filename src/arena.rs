//! Generational arena
//!
//! Folds and fold lines refer to each other through [`Id`]s into arenas owned
//! by the fold map. An id stays valid until its slot is removed. Once a slot
//! is reused, the old id stops resolving, so a stale id can never alias a new
//! value.

use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

#[derive(Clone, Debug)]
pub struct Arena<T> {
    len: usize,
    entries: Vec<Entry<T>>,
    first_vacant_index: Option<usize>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn contains(&self, id: Id<T>) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: Id<T>) -> Option<&T> {
        match self.entries.get(id.index) {
            Some(Entry::Occupied { generation, value }) if *generation == id.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        match self.entries.get_mut(id.index) {
            Some(Entry::Occupied { generation, value }) if *generation == id.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Iterate over live values in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| match entry {
            Entry::Occupied { generation, value } => Some((Id::new(index, *generation), value)),
            Entry::Vacant { .. } => None,
        })
    }

    pub fn insert(&mut self, value: T) -> Id<T> {
        self.len += 1;
        if let Some(index) = self.first_vacant_index {
            if let Some(Entry::Vacant {
                next_vacant_index,
                generation,
            }) = self.entries.get(index)
            {
                let generation = *generation;
                self.first_vacant_index = *next_vacant_index;
                self.entries[index] = Entry::Occupied { generation, value };
                return Id::new(index, generation);
            }
        }
        let index = self.entries.len();
        self.entries.push(Entry::Occupied {
            generation: 0,
            value,
        });
        Id::new(index, 0)
    }

    pub fn remove(&mut self, id: Id<T>) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        let vacant = Entry::Vacant {
            next_vacant_index: self.first_vacant_index,
            generation: id.generation + 1,
        };
        match std::mem::replace(&mut self.entries[id.index], vacant) {
            Entry::Occupied { value, .. } => {
                self.len -= 1;
                self.first_vacant_index = Some(id.index);
                Some(value)
            }
            Entry::Vacant { .. } => None,
        }
    }

    pub fn clear(&mut self) {
        let mut next = None;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let generation = match entry {
                Entry::Occupied { generation, .. } => *generation + 1,
                Entry::Vacant { generation, .. } => *generation,
            };
            *entry = Entry::Vacant {
                next_vacant_index: next,
                generation,
            };
            next = Some(index);
        }
        self.first_vacant_index = next;
        self.len = 0;
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            len: 0,
            entries: Vec::new(),
            first_vacant_index: None,
        }
    }
}

pub struct Id<T> {
    index: usize,
    generation: usize,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    fn new(index: usize, generation: usize) -> Self {
        Self {
            index,
            generation,
            phantom: PhantomData,
        }
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Id")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.index.hash(hasher);
        self.generation.hash(hasher);
    }
}

#[derive(Clone, Debug)]
enum Entry<T> {
    Occupied {
        generation: usize,
        value: T,
    },
    Vacant {
        next_vacant_index: Option<usize>,
        generation: usize,
    },
}
