// src/models/catalog.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Invalid data structure: course data must be a JSON object")]
    NotAnObject,
    #[error("Invalid data structure: course names must not be empty")]
    EmptyCourseName,
    #[error("Invalid data structure for course '{name}': {reason}")]
    InvalidCourse { name: String, reason: String },
}

/// Attributes of one course, as edited by admins and shown to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Course {
    pub duration: String,
    pub fees: String,
    pub semesters: u32,
    pub subjects: BTreeMap<String, Vec<String>>,
}

/// Course name -> attributes. The raw JSON map is kept (in insertion order) so an
/// admin edit round-trips exactly; every entry has been checked against [`Course`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    courses: Map<String, Value>,
}

impl Catalog {
    /// Parse raw editor text. Rejects malformed JSON, non-objects and schema violations.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        let courses = match value {
            Value::Object(map) => map,
            _ => return Err(CatalogError::NotAnObject),
        };

        for (name, attributes) in &courses {
            if name.trim().is_empty() {
                return Err(CatalogError::EmptyCourseName);
            }
            serde_json::from_value::<Course>(attributes.clone()).map_err(|e| CatalogError::InvalidCourse {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(Self { courses })
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn course_names(&self) -> impl Iterator<Item = &str> {
        self.courses.keys().map(String::as_str)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.courses.clone())
    }

    /// The `{"courses": {...}}` document handed to the model.
    pub fn document(&self) -> Value {
        json!({ "courses": self.courses })
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.courses).unwrap_or_else(|_| "{}".to_string())
    }

    /// Courses seeded into an empty database on first start.
    pub fn default_seed() -> Self {
        let value = json!({
            "B.Tech": {
                "duration": "4 years",
                "fees": "60,000 INR per semester",
                "semesters": 8,
                "subjects": {
                    "Sem 1": ["Mathematics 1", "Physics", "Chemistry", "Engineering Mechanics", "Computer Programming"]
                }
            },
            "B.Sc": {
                "duration": "3 years",
                "fees": "40,000 INR per semester",
                "semesters": 6,
                "subjects": {
                    "Sem 1": ["Biology", "Chemistry", "Physics", "Mathematics", "Computer Applications"]
                }
            },
            "BCA": {
                "duration": "3 years",
                "fees": "50,000 INR per semester",
                "semesters": 6,
                "subjects": {
                    "Sem 1": ["C Programming", "Digital Electronics", "Mathematics", "Statistics", "English"]
                }
            }
        });
        match value {
            Value::Object(courses) => Self { courses },
            _ => Self::default(),
        }
    }
}
