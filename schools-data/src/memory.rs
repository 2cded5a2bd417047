//! Volatile in-process store.
//!
//! Used when no database is configured or the configured one cannot be
//! reached. Records live as long as the process and are lost on restart.
//! Inserts are serialized by a mutex but there are no transactions.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use schools_core::{NewSchool, School};

use crate::{Backend, SchoolStore};

#[derive(Debug, Default)]
struct Inner {
    schools: Vec<School>,
    last_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with two sample schools (New York and Los Angeles).
    pub fn with_sample_data() -> Self {
        let now = Utc::now();
        let schools = vec![
            School {
                id: 1,
                name: "Mock High School".to_string(),
                address: "123 Test St".to_string(),
                latitude: 40.7128,
                longitude: -74.0060,
                created_at: now,
            },
            School {
                id: 2,
                name: "Mock Elementary".to_string(),
                address: "456 Demo Ave".to_string(),
                latitude: 34.0522,
                longitude: -118.2437,
                created_at: now,
            },
        ];
        Self {
            inner: Mutex::new(Inner {
                last_id: 2,
                schools,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.schools.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<School>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(inner.schools.clone())
    }

    async fn insert(&self, school: NewSchool) -> Result<School> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        inner.last_id += 1;
        let school = school.into_school(inner.last_id, Utc::now());
        inner.schools.push(school.clone());
        Ok(school)
    }

    fn backend(&self) -> Backend {
        Backend::Memory
    }
}
