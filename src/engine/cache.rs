//! Classification Cache - bounded LRU over classifier verdicts.
//!
//! Process-wide state shared by every in-flight evaluation. Keys are the
//! normalized input text exactly as sent to the classifier, so two
//! differently-cased but otherwise identical inputs hit the same entry.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::ClassificationResult;

/// Internal LRU bookkeeping. `order` runs from least to most recently used.
#[derive(Debug)]
struct LruState {
    capacity: usize,
    entries: HashMap<String, ClassificationResult>,
    order: Vec<String>,
}

impl LruState {
    fn get(&mut self, key: &str) -> Option<ClassificationResult> {
        if let Some(value) = self.entries.get(key) {
            let value = value.clone();
            if let Some(pos) = self.order.iter().position(|k| k == key) {
                let key = self.order.remove(pos);
                self.order.push(key);
            }
            Some(value)
        } else {
            None
        }
    }

    fn put(&mut self, key: String, value: ClassificationResult) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), value);
            if let Some(pos) = self.order.iter().position(|k| k == &key) {
                self.order.remove(pos);
            }
            self.order.push(key);
        } else {
            if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.order.first().cloned() {
                    self.entries.remove(&oldest);
                    self.order.remove(0);
                }
            }
            self.entries.insert(key.clone(), value);
            self.order.push(key);
        }
    }
}

/// Concurrency-safe bounded LRU cache of classification results.
#[derive(Debug)]
pub struct ClassificationCache {
    state: Mutex<LruState>,
}

impl ClassificationCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LruState {
                capacity: capacity.max(1),
                entries: HashMap::with_capacity(capacity),
                order: Vec::with_capacity(capacity),
            }),
        }
    }

    /// Look up a key, refreshing its recency on a hit. A miss does not
    /// disturb the recency of other keys.
    pub fn get(&self, key: &str) -> Option<ClassificationResult> {
        self.state.lock().unwrap().get(key)
    }

    /// Insert or refresh an entry, evicting the least-recently-used entry
    /// when at capacity.
    pub fn put(&self, key: String, value: ClassificationResult) {
        self.state.lock().unwrap().put(key, value);
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
