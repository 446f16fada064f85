//! Registry of known imagery sources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use streaming::ImagerySource;
use tracing::debug;

const BUILTIN_SURVEYS: &str = include_str!("surveys.json");

/// On-disk / embedded survey list.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyList {
    #[serde(default)]
    pub default: Option<String>,
    pub surveys: Vec<ImagerySource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    UnknownSurvey(String),
    Duplicate(String),
    Parse(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::UnknownSurvey(id) => write!(f, "unknown survey: {id}"),
            CatalogError::Duplicate(id) => write!(f, "survey registered twice: {id}"),
            CatalogError::Parse(msg) => write!(f, "survey list is malformed: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

pub trait SurveyStore {
    fn list(&self) -> Vec<&ImagerySource>;
    fn get(&self, id: &str) -> Option<&ImagerySource>;
    fn upsert(&mut self, source: ImagerySource);
    fn remove(&mut self, id: &str) -> bool;
}

/// In-memory registry with a default survey.
#[derive(Debug, Default, Clone)]
pub struct SurveyRegistry {
    surveys: BTreeMap<String, ImagerySource>,
    default_id: Option<String>,
}

impl SurveyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The surveys bundled with the viewer.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_SURVEYS)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let list: SurveyList =
            serde_json::from_str(raw).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_list(list)
    }

    pub fn from_list(list: SurveyList) -> Result<Self, CatalogError> {
        let mut registry = Self::new();
        for source in list.surveys {
            registry.register(source)?;
        }
        if let Some(id) = list.default {
            registry.set_default(&id)?;
        }
        debug!(count = registry.surveys.len(), "survey registry loaded");
        Ok(registry)
    }

    /// Adds a new survey; fails if the id is taken.
    pub fn register(&mut self, source: ImagerySource) -> Result<(), CatalogError> {
        if self.surveys.contains_key(&source.id) {
            return Err(CatalogError::Duplicate(source.id));
        }
        self.surveys.insert(source.id.clone(), source);
        Ok(())
    }

    pub fn set_default(&mut self, id: &str) -> Result<(), CatalogError> {
        if !self.surveys.contains_key(id) {
            return Err(CatalogError::UnknownSurvey(id.to_owned()));
        }
        self.default_id = Some(id.to_owned());
        Ok(())
    }

    /// The configured default, else the first survey by id.
    pub fn default_survey(&self) -> Option<&ImagerySource> {
        self.default_id
            .as_deref()
            .and_then(|id| self.surveys.get(id))
            .or_else(|| self.surveys.values().next())
    }

    pub fn resolve(&self, id: &str) -> Result<&ImagerySource, CatalogError> {
        self.surveys
            .get(id)
            .ok_or_else(|| CatalogError::UnknownSurvey(id.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.surveys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surveys.is_empty()
    }
}

impl SurveyStore for SurveyRegistry {
    fn list(&self) -> Vec<&ImagerySource> {
        self.surveys.values().collect()
    }

    fn get(&self, id: &str) -> Option<&ImagerySource> {
        self.surveys.get(id)
    }

    fn upsert(&mut self, source: ImagerySource) {
        self.surveys.insert(source.id.clone(), source);
    }

    fn remove(&mut self, id: &str) -> bool {
        if self.default_id.as_deref() == Some(id) {
            self.default_id = None;
        }
        self.surveys.remove(id).is_some()
    }
}
