use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::field::{FieldDefinition, FieldDefinitionError, FieldType};
use crate::validation::{EMAIL_PATTERN, PHONE_PATTERN};

/// Two-stop colour gradient used by front-ends to theme a profile type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub from: String,
    pub to: String,
}

impl Theme {
    fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Ordered fields plus display metadata for one profile type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSchema {
    pub profile_type: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub theme: Theme,
    /// Render order.
    pub fields: Vec<FieldDefinition>,
}

impl ProfileSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.required)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("profile type '{0}' is registered more than once")]
    DuplicateProfileType(String),
    #[error("profile type '{profile_type}' declares field '{field}' more than once")]
    DuplicateField { profile_type: String, field: String },
    #[error("profile type '{profile_type}': {source}")]
    InvalidField {
        profile_type: String,
        #[source]
        source: FieldDefinitionError,
    },
}

/// Immutable lookup table from profile type to schema.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: Vec<ProfileSchema>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Build a registry, rejecting duplicate types, duplicate field names and
    /// structurally broken field definitions.
    pub fn from_schemas(schemas: Vec<ProfileSchema>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(schemas.len());
        for (i, schema) in schemas.iter().enumerate() {
            if index.insert(schema.profile_type.clone(), i).is_some() {
                return Err(SchemaError::DuplicateProfileType(
                    schema.profile_type.clone(),
                ));
            }
            let mut seen = std::collections::HashSet::new();
            for field in &schema.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        profile_type: schema.profile_type.clone(),
                        field: field.name.clone(),
                    });
                }
                field.check().map_err(|source| SchemaError::InvalidField {
                    profile_type: schema.profile_type.clone(),
                    source,
                })?;
            }
        }
        Ok(Self { schemas, index })
    }

    /// The profile types shipped with Pitchside.
    pub fn builtin() -> Self {
        Self::from_schemas(builtin_schemas()).expect("builtin profile schemas are well-formed")
    }

    pub fn get(&self, profile_type: &str) -> Option<&ProfileSchema> {
        self.index.get(profile_type).map(|&i| &self.schemas[i])
    }

    /// Registered profile types in display order.
    pub fn profile_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.profile_type.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileSchema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Closest registered type for a mistyped one, if any is near enough.
    pub fn suggest(&self, profile_type: &str) -> Option<&str> {
        let needle = profile_type.trim().to_lowercase();
        self.profile_types()
            .map(|t| (t, strsim::levenshtein(&needle, t)))
            .filter(|(_, distance)| *distance <= 2)
            .min_by_key(|(_, distance)| *distance)
            .map(|(t, _)| t)
    }
}

fn email_field() -> FieldDefinition {
    FieldDefinition::new("email", "Email Address", FieldType::Email)
        .required()
        .placeholder("you@example.com")
        .pattern(EMAIL_PATTERN)
}

fn phone_field(required: bool) -> FieldDefinition {
    let field = FieldDefinition::new("phone", "Phone Number", FieldType::Tel)
        .placeholder("+91 98765 43210")
        .pattern(PHONE_PATTERN);
    if required { field.required() } else { field }
}

fn password_fields() -> [FieldDefinition; 2] {
    [
        FieldDefinition::new("password", "Password", FieldType::Password)
            .required()
            .placeholder("At least 6 characters")
            .min_length(6)
            .max_length(128),
        FieldDefinition::new("confirm_password", "Confirm Password", FieldType::Password)
            .required()
            .placeholder("Re-enter your password"),
    ]
}

fn website_field() -> FieldDefinition {
    FieldDefinition::new("website", "Website", FieldType::Url).placeholder("https://")
}

fn city_field(required: bool) -> FieldDefinition {
    let field = FieldDefinition::new("city", "City", FieldType::Text)
        .placeholder("e.g. Mumbai")
        .max_length(80);
    if required { field.required() } else { field }
}

fn builtin_schemas() -> Vec<ProfileSchema> {
    vec![
        player_schema(),
        coach_schema(),
        academy_schema(),
        venue_schema(),
        community_schema(),
    ]
}

fn player_schema() -> ProfileSchema {
    let [password, confirm_password] = password_fields();
    ProfileSchema {
        profile_type: "player".to_string(),
        title: "Player Profile".to_string(),
        description: "Showcase your game, stats and match history.".to_string(),
        icon: "user".to_string(),
        theme: Theme::new("#2563eb", "#7c3aed"),
        fields: vec![
            FieldDefinition::new("full_name", "Full Name", FieldType::Text)
                .required()
                .placeholder("Your full name")
                .min_length(2)
                .max_length(100),
            email_field(),
            password,
            confirm_password,
            phone_field(false),
            FieldDefinition::new("date_of_birth", "Date of Birth", FieldType::Date),
            FieldDefinition::new("playing_role", "Playing Role", FieldType::Select)
                .required()
                .options(&[
                    ("batsman", "Batsman"),
                    ("bowler", "Bowler"),
                    ("all_rounder", "All-rounder"),
                    ("wicket_keeper", "Wicket-keeper"),
                ]),
            FieldDefinition::new("batting_style", "Batting Style", FieldType::Select).options(&[
                ("right_hand", "Right-hand bat"),
                ("left_hand", "Left-hand bat"),
            ]),
            FieldDefinition::new("bowling_style", "Bowling Style", FieldType::Select).options(&[
                ("right_arm_fast", "Right-arm fast"),
                ("right_arm_medium", "Right-arm medium"),
                ("left_arm_fast", "Left-arm fast"),
                ("off_spin", "Off spin"),
                ("leg_spin", "Leg spin"),
                ("left_arm_orthodox", "Left-arm orthodox"),
            ]),
            city_field(false),
            FieldDefinition::new("bio", "Bio", FieldType::Textarea)
                .placeholder("Tell the community about your cricket journey")
                .max_length(500),
        ],
    }
}

fn coach_schema() -> ProfileSchema {
    let [password, confirm_password] = password_fields();
    ProfileSchema {
        profile_type: "coach".to_string(),
        title: "Coach Profile".to_string(),
        description: "Share your coaching expertise and connect with players.".to_string(),
        icon: "clipboard".to_string(),
        theme: Theme::new("#059669", "#0d9488"),
        fields: vec![
            FieldDefinition::new("full_name", "Full Name", FieldType::Text)
                .required()
                .placeholder("Your full name")
                .min_length(2)
                .max_length(100),
            email_field(),
            password,
            confirm_password,
            phone_field(false),
            FieldDefinition::new("specialization", "Specialization", FieldType::Select)
                .required()
                .options(&[
                    ("batting", "Batting"),
                    ("fast_bowling", "Fast bowling"),
                    ("spin_bowling", "Spin bowling"),
                    ("fielding", "Fielding"),
                    ("wicket_keeping", "Wicket-keeping"),
                    ("fitness", "Fitness & conditioning"),
                ]),
            FieldDefinition::new("experience_years", "Years of Experience", FieldType::Number)
                .required()
                .placeholder("e.g. 8")
                .range(0.0, 60.0)
                .step(1.0),
            FieldDefinition::new("coaching_level", "Coaching Level", FieldType::Select).options(&[
                ("level_1", "Level 1"),
                ("level_2", "Level 2"),
                ("level_3", "Level 3"),
                ("elite", "Elite / High performance"),
            ]),
            FieldDefinition::new("certifications", "Certifications", FieldType::Textarea)
                .placeholder("List your coaching certifications")
                .max_length(500),
            city_field(false),
            website_field(),
            FieldDefinition::new("bio", "Bio", FieldType::Textarea)
                .placeholder("Your coaching philosophy")
                .max_length(1000),
        ],
    }
}

fn academy_schema() -> ProfileSchema {
    ProfileSchema {
        profile_type: "academy".to_string(),
        title: "Academy Profile".to_string(),
        description: "List your academy, programmes and facilities.".to_string(),
        icon: "graduation-cap".to_string(),
        theme: Theme::new("#d97706", "#dc2626"),
        fields: vec![
            FieldDefinition::new("academy_name", "Academy Name", FieldType::Text)
                .required()
                .min_length(3)
                .max_length(120),
            email_field(),
            phone_field(true),
            website_field(),
            FieldDefinition::new("address", "Address", FieldType::Textarea)
                .required()
                .max_length(300),
            city_field(true),
            FieldDefinition::new("established_year", "Established Year", FieldType::Number)
                .range(1800.0, 2100.0)
                .step(1.0),
            FieldDefinition::new("capacity", "Student Capacity", FieldType::Number)
                .range(1.0, 5000.0)
                .step(1.0),
            FieldDefinition::new("age_groups", "Age Groups", FieldType::Text)
                .placeholder("e.g. U12, U16, U19"),
            FieldDefinition::new("facilities", "Facilities", FieldType::Textarea)
                .placeholder("Nets, turf wickets, bowling machines...")
                .max_length(1000),
            FieldDefinition::new("description", "Description", FieldType::Textarea)
                .max_length(1000),
        ],
    }
}

fn venue_schema() -> ProfileSchema {
    ProfileSchema {
        profile_type: "venue".to_string(),
        title: "Venue Profile".to_string(),
        description: "Put your ground or indoor nets on the map.".to_string(),
        icon: "map-pin".to_string(),
        theme: Theme::new("#16a34a", "#65a30d"),
        fields: vec![
            FieldDefinition::new("venue_name", "Venue Name", FieldType::Text)
                .required()
                .min_length(3)
                .max_length(120),
            email_field(),
            phone_field(true),
            FieldDefinition::new("venue_type", "Venue Type", FieldType::Select)
                .required()
                .options(&[
                    ("stadium", "Stadium"),
                    ("ground", "Ground"),
                    ("indoor_nets", "Indoor nets"),
                    ("turf", "Turf"),
                ]),
            FieldDefinition::new("address", "Address", FieldType::Textarea)
                .required()
                .max_length(300),
            city_field(true),
            FieldDefinition::new("capacity", "Seating Capacity", FieldType::Number)
                .range(0.0, 200_000.0)
                .step(1.0),
            FieldDefinition::new("pitch_type", "Pitch Type", FieldType::Select).options(&[
                ("turf", "Turf"),
                ("matting", "Matting"),
                ("astro", "Astro turf"),
                ("concrete", "Concrete"),
            ]),
            FieldDefinition::new("hourly_rate", "Hourly Rate", FieldType::Number)
                .placeholder("Booking price per hour")
                .range(0.0, 1_000_000.0)
                .step(0.01),
            FieldDefinition::new("floodlights", "Floodlights available", FieldType::Checkbox),
            website_field(),
            FieldDefinition::new("description", "Description", FieldType::Textarea)
                .max_length(1000),
        ],
    }
}

fn community_schema() -> ProfileSchema {
    ProfileSchema {
        profile_type: "community".to_string(),
        title: "Community Profile".to_string(),
        description: "Bring your club, league or fan group together.".to_string(),
        icon: "users".to_string(),
        theme: Theme::new("#db2777", "#9333ea"),
        fields: vec![
            FieldDefinition::new("community_name", "Community Name", FieldType::Text)
                .required()
                .min_length(3)
                .max_length(120),
            email_field(),
            FieldDefinition::new("category", "Category", FieldType::Select)
                .required()
                .options(&[
                    ("club", "Club"),
                    ("league", "League"),
                    ("fan_group", "Fan group"),
                    ("social", "Social"),
                ]),
            city_field(false),
            FieldDefinition::new("member_count", "Members", FieldType::Number)
                .range(1.0, 1_000_000.0)
                .step(1.0),
            website_field(),
            FieldDefinition::new("is_private", "Private community", FieldType::Checkbox),
            FieldDefinition::new("description", "Description", FieldType::Textarea)
                .required()
                .placeholder("What brings your members together?")
                .min_length(20)
                .max_length(1000),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_all_profile_types() {
        let registry = SchemaRegistry::builtin();
        let types: Vec<&str> = registry.profile_types().collect();
        assert_eq!(types, vec!["player", "coach", "academy", "venue", "community"]);
    }

    #[test]
    fn unknown_type_is_not_found() {
        let registry = SchemaRegistry::builtin();
        assert!(registry.get("umpire").is_none());
        assert!(registry.get("").is_none());
    }

    #[test]
    fn every_builtin_schema_requires_email() {
        let registry = SchemaRegistry::builtin();
        for schema in registry.iter() {
            let email = schema
                .field("email")
                .unwrap_or_else(|| panic!("{} has no email", schema.profile_type));
            assert!(email.required);
            assert_eq!(email.field_type, FieldType::Email);
        }
    }

    #[test]
    fn duplicate_profile_type_is_rejected() {
        let err = SchemaRegistry::from_schemas(vec![venue_schema(), venue_schema()]).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateProfileType("venue".to_string()));
    }

    #[test]
    fn duplicate_field_name_is_rejected() {
        let mut schema = venue_schema();
        schema.fields.push(email_field());
        let err = SchemaRegistry::from_schemas(vec![schema]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { field, .. } if field == "email"));
    }

    #[test]
    fn malformed_field_is_rejected() {
        let mut schema = community_schema();
        schema
            .fields
            .push(FieldDefinition::new("tier", "Tier", FieldType::Select));
        let err = SchemaRegistry::from_schemas(vec![schema]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField { .. }));
    }

    #[test]
    fn suggests_close_profile_type() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(registry.suggest("coahc"), Some("coach"));
        assert_eq!(registry.suggest("Venue"), Some("venue"));
        assert_eq!(registry.suggest("stadium"), None);
    }

    #[test]
    fn schema_serializes_with_ordered_fields() {
        let registry = SchemaRegistry::builtin();
        let value = serde_json::to_value(registry.get("venue").unwrap()).unwrap();
        assert_eq!(value["profile_type"], "venue");
        assert_eq!(value["fields"][0]["name"], "venue_name");
        assert_eq!(value["fields"][3]["type"], "select");
    }
}
