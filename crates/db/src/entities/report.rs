//! Report entity (a single observed environmental issue).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed set of issue categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ReportType {
    #[sea_orm(string_value = "dumping")]
    Dumping,
    #[sea_orm(string_value = "deforestation")]
    Deforestation,
    #[sea_orm(string_value = "water_pollution")]
    #[serde(rename = "Water Pollution")]
    WaterPollution,
    #[sea_orm(string_value = "air_pollution")]
    #[serde(rename = "Air Pollution")]
    AirPollution,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Impact areas shared by every category.
const BASE_IMPACT_AREAS: [&str; 3] = ["Local Wildlife", "Human Health", "Ecosystem Balance"];

impl ReportType {
    /// Display name, identical to the wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dumping => "Dumping",
            Self::Deforestation => "Deforestation",
            Self::WaterPollution => "Water Pollution",
            Self::AirPollution => "Air Pollution",
            Self::Other => "Other",
        }
    }

    /// Hashtag form of the name, e.g. `#WaterPollution`.
    #[must_use]
    pub fn hashtag(self) -> String {
        format!("#{}", self.name().replace(' ', ""))
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Dumping => "🗑️",
            Self::Deforestation => "🌲",
            Self::WaterPollution => "🧪",
            Self::AirPollution => "🔥",
            Self::Other => "📍",
        }
    }

    /// Areas a consumer should highlight for this category.
    #[must_use]
    pub fn impact_areas(self) -> Vec<&'static str> {
        let extra: &[&str] = match self {
            Self::Deforestation => &["Carbon Capture", "Soil Erosion"],
            Self::WaterPollution => &["Water Quality", "Marine Life"],
            Self::AirPollution => &["Air Quality", "Climate Change"],
            Self::Dumping => &["Soil Quality", "Groundwater"],
            Self::Other => &[],
        };
        BASE_IMPACT_AREAS.iter().chain(extra).copied().collect()
    }

    /// Guess a category from a free-text label. Case-insensitive.
    #[must_use]
    pub fn infer_from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| label.contains(w));

        if has(&["dump", "waste", "trash"]) {
            Self::Dumping
        } else if has(&["tree", "forest", "cutting"]) {
            Self::Deforestation
        } else if has(&["water", "river", "lake"]) {
            Self::WaterPollution
        } else if has(&["smoke", "air", "emission"]) {
            Self::AirPollution
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Evidence image reference
    #[sea_orm(column_type = "Text")]
    pub image_url: String,

    #[sea_orm(column_type = "Text")]
    pub label: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(indexed)]
    pub report_type: ReportType,

    /// Reporter's own assessment, 1-5. Never updated.
    pub severity: i32,

    pub latitude: f64,
    pub longitude: f64,

    pub location_name: String,

    pub notify_authority: bool,

    pub upvotes: i32,

    /// Community assessments received
    pub engagement_count: i32,

    /// First verifier
    #[sea_orm(nullable)]
    pub verified_by: Option<String>,

    /// Set by the authority integration
    #[sea_orm(nullable)]
    pub action_acted: Option<bool>,

    #[sea_orm(nullable)]
    pub action_status: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::report_verification::Entity")]
    Verification,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,

    #[sea_orm(has_many = "super::severity_assessment::Entity")]
    SeverityAssessment,
}

impl Related<super::report_verification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Verification.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::severity_assessment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeverityAssessment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_from_label() {
        assert_eq!(ReportType::infer_from_label("Illegal TRASH pile"), ReportType::Dumping);
        assert_eq!(ReportType::infer_from_label("tree cutting"), ReportType::Deforestation);
        assert_eq!(ReportType::infer_from_label("Oil in the river"), ReportType::WaterPollution);
        assert_eq!(ReportType::infer_from_label("Black smoke"), ReportType::AirPollution);
        assert_eq!(ReportType::infer_from_label("Broken fence"), ReportType::Other);
    }

    #[test]
    fn test_first_matching_category_wins() {
        // "waste water" mentions both; dumping keywords are checked first.
        assert_eq!(ReportType::infer_from_label("waste water"), ReportType::Dumping);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReportType::WaterPollution).unwrap(),
            "\"Water Pollution\""
        );
        let parsed: ReportType = serde_json::from_str("\"Air Pollution\"").unwrap();
        assert_eq!(parsed, ReportType::AirPollution);
        assert_eq!(ReportType::AirPollution.hashtag(), "#AirPollution");
    }

    #[test]
    fn test_impact_areas() {
        assert_eq!(ReportType::Other.impact_areas().len(), 3);
        let areas = ReportType::WaterPollution.impact_areas();
        assert_eq!(areas.len(), 5);
        assert!(areas.contains(&"Marine Life"));
        assert_eq!(ReportType::Deforestation.icon(), "🌲");
    }
}
