//! School profile and grade-scale settings, persisted as JSON in the
//! workspace database. The grade scale here is the single source of truth
//! for letter thresholds; reports read it instead of carrying their own
//! literals.

use serde::{Deserialize, Serialize};

use crate::db::SqliteRecordService;

pub const SETTINGS_KEY: &str = "app.settings";
pub const GRADE_SCALE_KEY: &str = "app.grade_scale";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub school_name: String,
    pub academic_year: String,
    pub default_grading_scale: String,
    pub email_notifications: bool,
    pub auto_backup: bool,
    pub theme_mode: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            school_name: "Lincoln High School".into(),
            academic_year: "2023-2024".into(),
            default_grading_scale: "standard".into(),
            email_notifications: true,
            auto_backup: true,
            theme_mode: "light".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeScale {
    pub a_min: f64,
    pub b_min: f64,
    pub c_min: f64,
    pub d_min: f64,
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            a_min: 90.0,
            b_min: 80.0,
            c_min: 70.0,
            d_min: 60.0,
        }
    }
}

impl GradeScale {
    pub fn letter(&self, score: f64) -> char {
        if score >= self.a_min {
            'A'
        } else if score >= self.b_min {
            'B'
        } else if score >= self.c_min {
            'C'
        } else if score >= self.d_min {
            'D'
        } else {
            'F'
        }
    }
}

pub fn load_settings(db: &SqliteRecordService) -> anyhow::Result<AppSettings> {
    Ok(db
        .settings_get_json(SETTINGS_KEY)?
        .map(serde_json::from_value)
        .transpose()?
        .unwrap_or_default())
}

pub fn save_settings(db: &SqliteRecordService, settings: &AppSettings) -> anyhow::Result<()> {
    db.settings_set_json(SETTINGS_KEY, &serde_json::to_value(settings)?)
}

pub fn load_grade_scale(db: &SqliteRecordService) -> anyhow::Result<GradeScale> {
    Ok(db
        .settings_get_json(GRADE_SCALE_KEY)?
        .map(serde_json::from_value)
        .transpose()?
        .unwrap_or_default())
}

pub fn save_grade_scale(db: &SqliteRecordService, scale: &GradeScale) -> anyhow::Result<()> {
    db.settings_set_json(GRADE_SCALE_KEY, &serde_json::to_value(scale)?)
}
