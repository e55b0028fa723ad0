use std::fmt;
use std::str::FromStr;

use ede_api::{FetchStrategy, Resource, UpdateMethod};
use ede_config::Config;
use ede_types::SortDirection;
use serde_json::json;

use crate::confirm::ActionKind;
use crate::display::{CellFormat, Column};
use crate::query::{FilterKind, FilterSpec, ListSchema};
use crate::schema::{AttachmentRule, EntitySchema, FieldDescriptor, FieldKind};

const PARTS_OF_SPEECH: [&str; 8] = [
    "noun",
    "verb",
    "adjective",
    "adverb",
    "pronoun",
    "preposition",
    "conjunction",
    "interjection",
];

const JOB_STATUSES: [&str; 4] = ["pending", "processing", "completed", "failed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Words,
    Letters,
    Phrases,
    Proverbs,
    Lessons,
    Games,
    Numbers,
    AudioJobs,
    Voices,
    Users,
}

impl EntityKind {
    pub fn all() -> [EntityKind; 10] {
        [
            Self::Words,
            Self::Letters,
            Self::Phrases,
            Self::Proverbs,
            Self::Lessons,
            Self::Games,
            Self::Numbers,
            Self::AudioJobs,
            Self::Voices,
            Self::Users,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Letters => "letters",
            Self::Phrases => "phrases",
            Self::Proverbs => "proverbs",
            Self::Lessons => "lessons",
            Self::Games => "games",
            Self::Numbers => "numbers",
            Self::AudioJobs => "audio-jobs",
            Self::Voices => "voices",
            Self::Users => "users",
        }
    }

    /// Declared fields, columns and list view of this entity
    pub fn schema(&self, config: &Config) -> EntitySchema {
        let api = &config.api;
        let audio = AttachmentRule::audio(&config.upload);
        let list = ListSchema::new(&config.list);

        match self {
            Self::Words => EntitySchema::new("words", "word", Resource::new(api.admin_path("words")), {
                list.with_filter(FilterSpec::new("language", FilterKind::Text))
                    .with_filter(
                        FilterSpec::new("part_of_speech", FilterKind::Set).with_options(&PARTS_OF_SPEECH),
                    )
                    .with_filter(FilterSpec::new("difficulty", FilterKind::Range))
                    .with_filter(FilterSpec::new("is_active", FilterKind::Flag))
                    .with_filter(FilterSpec::new("word", FilterKind::Pattern))
                    .with_sort(
                        &["word", "difficulty_level", "created_at"],
                        Some(("created_at", SortDirection::Desc)),
                    )
            })
            .with_field(FieldDescriptor::new("word", "Word", FieldKind::Text).required())
            .with_field(language_field())
            .with_field(FieldDescriptor::new("translation", "Translation", FieldKind::Text).required())
            .with_field(FieldDescriptor::new(
                "part_of_speech",
                "Part of speech",
                FieldKind::Choice(PARTS_OF_SPEECH.iter().map(|p| p.to_string()).collect()),
            ))
            .with_field(difficulty_field())
            .with_field(FieldDescriptor::new("pronunciation", "Pronunciation", FieldKind::Text))
            .with_field(FieldDescriptor::new("example_sentence", "Example", FieldKind::LongText))
            .with_field(FieldDescriptor::new("tags", "Tags", FieldKind::Tags))
            .with_field(active_field())
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("word", "Word"))
            .with_column(Column::new("language", "Lang", CellFormat::Badge))
            .with_column(Column::text("translation", "Translation"))
            .with_column(Column::text("part_of_speech", "POS"))
            .with_column(Column::text("difficulty_level", "Level"))
            .with_column(Column::new("has_audio", "Audio", CellFormat::Flag))
            .with_column(Column::new("is_active", "Active", CellFormat::Flag))
            .with_column(Column::new("created_at", "Created", CellFormat::Date))
            .with_attachment(audio)
            .with_actions(&[
                ActionKind::Delete,
                ActionKind::Deactivate,
                ActionKind::BulkDelete,
                ActionKind::RegenerateAudio,
            ]),

            Self::Letters => EntitySchema::new("letters", "letter", Resource::new(api.admin_path("letters")), {
                list.with_filter(FilterSpec::new("language", FilterKind::Text))
                    .with_filter(
                        FilterSpec::new("letter_type", FilterKind::Text)
                            .with_options(&["vowel", "consonant", "tone"]),
                    )
                    .with_sort(&["order_index", "character"], Some(("order_index", SortDirection::Asc)))
            })
            .with_field(FieldDescriptor::new("character", "Character", FieldKind::Text).required())
            .with_field(language_field())
            .with_field(FieldDescriptor::new("name", "Name", FieldKind::Text))
            .with_field(FieldDescriptor::new("pronunciation", "Pronunciation", FieldKind::Text))
            .with_field(FieldDescriptor::new(
                "letter_type",
                "Type",
                FieldKind::Choice(vec!["vowel".into(), "consonant".into(), "tone".into()]),
            ))
            .with_field(FieldDescriptor::new("order_index", "Order", FieldKind::Integer))
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("character", "Char"))
            .with_column(Column::text("name", "Name"))
            .with_column(Column::new("language", "Lang", CellFormat::Badge))
            .with_column(Column::new("letter_type", "Type", CellFormat::Badge))
            .with_column(Column::text("order_index", "Order"))
            .with_column(Column::new("has_audio", "Audio", CellFormat::Flag))
            .with_attachment(audio)
            .with_actions(&[ActionKind::Delete, ActionKind::BulkDelete, ActionKind::RegenerateAudio]),

            Self::Phrases => EntitySchema::new("phrases", "phrase", Resource::new(api.admin_path("phrases")), {
                list.with_filter(FilterSpec::new("language", FilterKind::Text))
                    .with_filter(FilterSpec::new("category", FilterKind::Text))
                    .with_filter(FilterSpec::new("is_active", FilterKind::Flag))
                    .with_filter(FilterSpec::new("text", FilterKind::Pattern))
                    .with_sort(&["text", "created_at"], Some(("created_at", SortDirection::Desc)))
            })
            .with_field(FieldDescriptor::new("text", "Phrase", FieldKind::Text).required())
            .with_field(FieldDescriptor::new("translation", "Translation", FieldKind::Text).required())
            .with_field(language_field())
            .with_field(FieldDescriptor::new("category", "Category", FieldKind::Text).inherits("category"))
            .with_field(difficulty_field())
            .with_field(active_field())
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("text", "Phrase"))
            .with_column(Column::text("translation", "Translation"))
            .with_column(Column::new("language", "Lang", CellFormat::Badge))
            .with_column(Column::text("category", "Category"))
            .with_column(Column::new("is_active", "Active", CellFormat::Flag))
            .with_attachment(audio)
            .with_actions(&[ActionKind::Delete, ActionKind::BulkDelete, ActionKind::RegenerateAudio]),

            Self::Proverbs => EntitySchema::new("proverbs", "proverb", Resource::new(api.admin_path("proverbs")), {
                list.with_filter(FilterSpec::new("language", FilterKind::Text))
                    .with_filter(FilterSpec::new("text", FilterKind::Pattern))
                    .with_sort(&["text", "created_at"], None)
            })
            .with_field(FieldDescriptor::new("text", "Proverb", FieldKind::Text).required())
            .with_field(FieldDescriptor::new("translation", "Translation", FieldKind::Text).required())
            .with_field(FieldDescriptor::new("meaning", "Meaning", FieldKind::LongText))
            .with_field(language_field())
            .with_field(FieldDescriptor::new("origin", "Origin", FieldKind::Text))
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("text", "Proverb"))
            .with_column(Column::text("translation", "Translation"))
            .with_column(Column::new("language", "Lang", CellFormat::Badge))
            .with_column(Column::new("has_audio", "Audio", CellFormat::Flag))
            .with_attachment(audio)
            .with_actions(&[ActionKind::Delete, ActionKind::BulkDelete, ActionKind::RegenerateAudio]),

            Self::Lessons => EntitySchema::new(
                "lessons",
                "lesson",
                Resource::new(api.admin_path("lessons"))
                    .with_update(UpdateMethod::Patch)
                    .with_fetch(FetchStrategy::Snapshot {
                        path: api.admin_path("lessons/{id}/versions/latest"),
                    }),
                list.with_filter(FilterSpec::new("language", FilterKind::Text))
                    .with_filter(
                        FilterSpec::new("level", FilterKind::Text)
                            .with_options(&["beginner", "intermediate", "advanced"]),
                    )
                    .with_filter(FilterSpec::new("is_published", FilterKind::Flag))
                    .with_sort(&["order_index", "title", "updated_at"], Some(("order_index", SortDirection::Asc))),
            )
            .with_field(FieldDescriptor::new("title", "Title", FieldKind::Text).required())
            .with_field(language_field())
            .with_field(
                FieldDescriptor::new(
                    "level",
                    "Level",
                    FieldKind::Choice(vec!["beginner".into(), "intermediate".into(), "advanced".into()]),
                )
                .with_default(json!("beginner"))
                .inherits("level"),
            )
            .with_field(FieldDescriptor::new("description", "Description", FieldKind::LongText))
            .with_field(FieldDescriptor::new("order_index", "Order", FieldKind::Integer))
            .with_field(
                FieldDescriptor::new("duration_minutes", "Minutes", FieldKind::Integer).with_default(json!(10)),
            )
            .with_field(FieldDescriptor::new("is_published", "Published", FieldKind::Bool))
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("title", "Title"))
            .with_column(Column::new("language", "Lang", CellFormat::Badge))
            .with_column(Column::new("level", "Level", CellFormat::Badge))
            .with_column(Column::text("order_index", "Order"))
            .with_column(Column::new("exercises", "Exercises", CellFormat::Count))
            .with_column(Column::new("is_published", "Published", CellFormat::Flag))
            .with_column(Column::new("updated_at", "Updated", CellFormat::Date)),

            Self::Games => EntitySchema::new("games", "game", Resource::new(api.admin_path("games")), {
                list.with_filter(FilterSpec::new("language", FilterKind::Text))
                    .with_filter(
                        FilterSpec::new("game_type", FilterKind::Text)
                            .with_options(&["matching", "quiz", "fill_blank", "listening"]),
                    )
                    .with_filter(FilterSpec::new("is_active", FilterKind::Flag))
                    .with_sort(&["title", "play_count", "created_at"], None)
            })
            .with_field(FieldDescriptor::new("title", "Title", FieldKind::Text).required())
            .with_field(
                FieldDescriptor::new(
                    "game_type",
                    "Type",
                    FieldKind::Choice(vec![
                        "matching".into(),
                        "quiz".into(),
                        "fill_blank".into(),
                        "listening".into(),
                    ]),
                )
                .required()
                .inherits("game_type"),
            )
            .with_field(language_field())
            .with_field(difficulty_field())
            .with_field(
                FieldDescriptor::new("time_limit_seconds", "Time limit (s)", FieldKind::Integer)
                    .with_default(json!(60)),
            )
            .with_field(active_field())
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("title", "Title"))
            .with_column(Column::new("game_type", "Type", CellFormat::Badge))
            .with_column(Column::new("language", "Lang", CellFormat::Badge))
            .with_column(Column::new("time_limit_seconds", "Limit", CellFormat::Duration))
            .with_column(Column::new("play_count", "Plays", CellFormat::Count))
            .with_column(Column::new(
                "completion_count",
                "Completion",
                CellFormat::Percent {
                    of: Some("play_count".into()),
                },
            ))
            .with_column(Column::new("is_active", "Active", CellFormat::Flag))
            .with_actions(&[ActionKind::Delete, ActionKind::Deactivate, ActionKind::BulkDelete]),

            Self::Numbers => EntitySchema::new("numbers", "number", Resource::new(api.admin_path("numbers")), {
                list.with_filter(FilterSpec::new("language", FilterKind::Text))
                    .with_filter(FilterSpec::new("value", FilterKind::Range))
                    .with_sort(&["value"], Some(("value", SortDirection::Asc)))
            })
            .with_field(FieldDescriptor::new("value", "Value", FieldKind::Integer).required())
            .with_field(language_field())
            .with_field(FieldDescriptor::new("word", "Word", FieldKind::Text).required())
            .with_field(FieldDescriptor::new("pronunciation", "Pronunciation", FieldKind::Text))
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("value", "Value"))
            .with_column(Column::text("word", "Word"))
            .with_column(Column::new("language", "Lang", CellFormat::Badge))
            .with_column(Column::new("has_audio", "Audio", CellFormat::Flag))
            .with_attachment(audio)
            .with_actions(&[ActionKind::Delete, ActionKind::BulkDelete, ActionKind::RegenerateAudio]),

            Self::AudioJobs => EntitySchema::new(
                "audio jobs",
                "audio job",
                Resource::new(api.admin_path("audio/jobs")).with_alias("jobs"),
                list.with_filter(FilterSpec::new("status", FilterKind::Text).with_options(&JOB_STATUSES))
                    .with_filter(FilterSpec::new("provider", FilterKind::Text))
                    .with_sort(&["created_at"], Some(("created_at", SortDirection::Desc))),
            )
            .with_column(Column::text("id", "ID"))
            .with_column(Column::new("status", "Status", CellFormat::Badge))
            .with_column(Column::text("provider", "Provider"))
            .with_column(Column::new(
                "processed",
                "Progress",
                CellFormat::Percent { of: Some("total".into()) },
            ))
            .with_column(Column::new("total", "Items", CellFormat::Count))
            .with_column(Column::new("created_at", "Created", CellFormat::Date))
            .with_column(Column::new("completed_at", "Completed", CellFormat::Date))
            .pollable(),

            Self::Voices => EntitySchema::new(
                "voices",
                "voice",
                Resource::new(api.admin_path("audio/voices"))
                    .with_fetch(FetchStrategy::ListAndFind { page_size: 100 }),
                list.with_filter(FilterSpec::new("language", FilterKind::Text))
                    .with_filter(FilterSpec::new("provider", FilterKind::Text))
                    .with_filter(FilterSpec::new("is_active", FilterKind::Flag))
                    .with_sort(&["name"], Some(("name", SortDirection::Asc))),
            )
            .with_field(FieldDescriptor::new("name", "Name", FieldKind::Text).required())
            .with_field(
                FieldDescriptor::new(
                    "provider",
                    "Provider",
                    FieldKind::Choice(vec!["elevenlabs".into(), "google".into(), "azure".into()]),
                )
                .required()
                .inherits("provider"),
            )
            .with_field(FieldDescriptor::new("voice_id", "Provider voice", FieldKind::Text).required())
            .with_field(language_field())
            .with_field(FieldDescriptor::new(
                "gender",
                "Gender",
                FieldKind::Choice(vec!["male".into(), "female".into(), "neutral".into()]),
            ))
            .with_field(active_field())
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("name", "Name"))
            .with_column(Column::new("provider", "Provider", CellFormat::Badge))
            .with_column(Column::new("language", "Lang", CellFormat::Badge))
            .with_column(Column::text("gender", "Gender"))
            .with_column(Column::new("sample_duration", "Sample", CellFormat::Duration))
            .with_column(Column::new("is_active", "Active", CellFormat::Flag))
            .with_actions(&[ActionKind::Delete, ActionKind::Deactivate]),

            Self::Users => EntitySchema::new(
                "users",
                "user",
                Resource::new(api.admin_path("users")).with_update(UpdateMethod::Patch),
                list.with_filter(
                    FilterSpec::new("role", FilterKind::Text).with_options(&["learner", "content_editor", "admin"]),
                )
                .with_filter(FilterSpec::new("is_active", FilterKind::Flag))
                .with_filter(FilterSpec::new("email", FilterKind::Pattern))
                .with_sort(&["email", "created_at", "last_login_at"], Some(("created_at", SortDirection::Desc))),
            )
            .with_field(FieldDescriptor::new("email", "Email", FieldKind::Text).required())
            .with_field(FieldDescriptor::new("full_name", "Name", FieldKind::Text))
            .with_field(
                FieldDescriptor::new(
                    "role",
                    "Role",
                    FieldKind::Choice(vec!["learner".into(), "content_editor".into(), "admin".into()]),
                )
                .with_default(json!("learner")),
            )
            .with_field(active_field())
            .with_column(Column::text("id", "ID"))
            .with_column(Column::text("email", "Email"))
            .with_column(Column::text("full_name", "Name"))
            .with_column(Column::new("role", "Role", CellFormat::Badge))
            .with_column(Column::new("completed_lessons", "Lessons", CellFormat::Count))
            .with_column(Column::new("is_active", "Active", CellFormat::Flag))
            .with_column(Column::new("last_login_at", "Last login", CellFormat::Date))
            .with_actions(&[ActionKind::Deactivate, ActionKind::Purge]),
        }
    }
}

fn language_field() -> FieldDescriptor {
    FieldDescriptor::new("language", "Language", FieldKind::Text)
        .required()
        .inherits("language")
}

fn difficulty_field() -> FieldDescriptor {
    FieldDescriptor::new("difficulty_level", "Difficulty", FieldKind::Integer).with_default(json!(1))
}

fn active_field() -> FieldDescriptor {
    FieldDescriptor::new("is_active", "Active", FieldKind::Bool).with_default(json!(true))
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity: {0}")]
pub struct UnknownEntity(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('_', "-");
        match name.as_str() {
            "jobs" => return Ok(Self::AudioJobs),
            "word" | "letter" | "phrase" | "proverb" | "lesson" | "game" | "number" | "voice"
            | "user" => return format!("{name}s").parse(),
            _ => {}
        }
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| UnknownEntity(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_schema_is_consistent() {
        let config = Config::default();
        for kind in EntityKind::all() {
            let schema = kind.schema(&config);
            assert_eq!(schema.list.validate(), Ok(()), "{kind}");
            assert!(schema.resource.path.starts_with("/api/v1/admin/"), "{kind}");
            assert!(!schema.columns.is_empty(), "{kind}");

            let names: HashSet<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names.len(), schema.fields.len(), "{kind} has duplicate fields");

            for field in &schema.fields {
                if let Some(filter) = &field.inherit_filter {
                    assert!(schema.list.filter(filter).is_some(), "{kind}.{}", field.name);
                }
            }
        }
    }

    #[test]
    fn test_parse_names() {
        for kind in EntityKind::all() {
            assert_eq!(kind.as_str().parse::<EntityKind>(), Ok(kind));
        }
        assert_eq!("jobs".parse::<EntityKind>(), Ok(EntityKind::AudioJobs));
        assert_eq!("audio_jobs".parse::<EntityKind>(), Ok(EntityKind::AudioJobs));
        assert_eq!("Word".parse::<EntityKind>(), Ok(EntityKind::Words));
        assert!("courses".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_special_cases() {
        let config = Config::default();

        let jobs = EntityKind::AudioJobs.schema(&config);
        assert!(jobs.pollable);
        assert!(jobs.fields.is_empty());
        assert_eq!(jobs.resource.alias.as_deref(), Some("jobs"));

        let voices = EntityKind::Voices.schema(&config);
        assert_eq!(voices.resource.fetch, FetchStrategy::ListAndFind { page_size: 100 });

        let lessons = EntityKind::Lessons.schema(&config);
        assert_eq!(lessons.resource.update, UpdateMethod::Patch);
        assert!(matches!(lessons.resource.fetch, FetchStrategy::Snapshot { .. }));

        let users = EntityKind::Users.schema(&config);
        assert!(users.supports(ActionKind::Purge));
        assert!(!users.supports(ActionKind::BulkDelete));
        assert!(users.attachment.is_none());
    }

    #[test]
    fn test_words_null_difficulty_uses_default() {
        let words = EntityKind::Words.schema(&Config::default());
        let difficulty = words.field("difficulty_level").unwrap();
        assert_eq!(difficulty.initial_value(), json!(1));
    }
}
