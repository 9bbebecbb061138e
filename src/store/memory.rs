//! In-memory store with the same column rules as the MySQL table.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PostStore, TableRef};
use crate::error::{EtlError, Result};
use crate::models::{Post, PostRow};

#[derive(Default)]
struct State {
    databases: HashSet<String>,
    tables: HashMap<String, Vec<(u64, PostRow)>>,
    next_id: u64,
    databases_created: usize,
}

pub struct MemoryStore {
    target: TableRef,
    state: Mutex<State>,
    fail_appends: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            target: TableRef::default_target().unwrap(),
            state: Mutex::new(State::default()),
            fail_appends: false,
        }
    }

    /// Every append fails with a schema mismatch.
    pub fn rejecting() -> Self {
        Self {
            fail_appends: true,
            ..Self::new()
        }
    }

    pub fn rows(&self) -> Vec<PostRow> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(&self.target.qualified())
            .map(|rows| rows.iter().map(|(_, r)| r.clone()).collect())
            .unwrap_or_default()
    }

    pub fn ids(&self) -> Vec<u64> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(&self.target.qualified())
            .map(|rows| rows.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    pub fn table_exists(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .tables
            .contains_key(&self.target.qualified())
    }

    pub fn databases_created(&self) -> usize {
        self.state.lock().unwrap().databases_created
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn bootstrap(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let database = self.target.database.as_str().to_string();
        if state.databases.insert(database) {
            state.databases_created += 1;
        }
        state
            .tables
            .entry(self.target.qualified())
            .or_default();
        Ok(())
    }

    async fn append(&self, posts: &[Post]) -> Result<u64> {
        if self.fail_appends {
            return Err(EtlError::SchemaMismatch("Unknown column 'tweet_id'".into()));
        }
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let table = state
            .tables
            .get_mut(&self.target.qualified())
            .ok_or_else(|| EtlError::SchemaMismatch("table doesn't exist".into()))?;

        for post in posts {
            state.next_id += 1;
            table.push((state.next_id, PostRow::from(post)));
        }
        Ok(posts.len() as u64)
    }
}
