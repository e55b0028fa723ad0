//! Query State of a list view and its query-string codec.
//!
//! The codec is pure: the same state always serializes to the same string,
//! defaults are never written, and parsing the output reproduces the state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ede_config::list::ListConfig;
use ede_types::SortDirection;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::preprocess::normalize_search;

const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const PAGE: &str = "page";
pub const PAGE_SIZE: &str = "page_size";
pub const LIMIT: &str = "limit";
pub const SEARCH: &str = "search";
pub const SORT_BY: &str = "sort_by";
pub const SORT_DIR: &str = "sort_dir";

const RESERVED: [&str; 6] = [PAGE, PAGE_SIZE, LIMIT, SEARCH, SORT_BY, SORT_DIR];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidFilterValue { name: String, reason: String },

    #[error("cannot sort by {0}")]
    UnknownSortKey(String),

    #[error("page size {0} is not allowed")]
    PageSize(u32),

    #[error("filter name {0} collides with a query parameter")]
    ReservedName(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatternMode {
    StartsWith,
    #[default]
    Contains,
    EndsWith,
}

impl PatternMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartsWith => "starts_with",
            Self::Contains => "contains",
            Self::EndsWith => "ends_with",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "starts_with" => Some(Self::StartsWith),
            "contains" => Some(Self::Contains),
            "ends_with" => Some(Self::EndsWith),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Single value: status, language, provider
    Text,
    Flag,
    /// Multi-select, e.g. parts of speech
    Set,
    /// Inclusive numeric bounds
    Range,
    /// Text predicate with a match mode
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Flag(bool),
    Set(BTreeSet<String>),
    Range { min: Option<i64>, max: Option<i64> },
    Pattern { mode: PatternMode, text: String },
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Text(_) => FilterKind::Text,
            Self::Flag(_) => FilterKind::Flag,
            Self::Set(_) => FilterKind::Set,
            Self::Range { .. } => FilterKind::Range,
            Self::Pattern { .. } => FilterKind::Pattern,
        }
    }

    /// Empty values are equivalent to an absent filter
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) | Self::Pattern { text, .. } => text.is_empty(),
            Self::Flag(_) => false,
            Self::Set(values) => values.is_empty(),
            Self::Range { min, max } => min.is_none() && max.is_none(),
        }
    }

    fn normalized(self) -> Option<Self> {
        let value = match self {
            Self::Set(values) => Self::Set(values.into_iter().filter(|v| !v.is_empty()).collect()),
            other => other,
        };
        (!value.is_empty()).then_some(value)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Flag(flag) => f.write_str(if *flag { "yes" } else { "no" }),
            Self::Set(values) => {
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                f.write_str(&values.join(","))
            }
            Self::Range { min, max } => {
                if let Some(min) = min {
                    write!(f, "{min}")?;
                }
                f.write_str("..")?;
                if let Some(max) = max {
                    write!(f, "{max}")?;
                }
                Ok(())
            }
            Self::Pattern { mode, text } => write!(f, "{}:{}", mode.as_str(), text),
        }
    }
}

/// Declares one filter of an entity's list view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: String,
    pub kind: FilterKind,
    /// Allowed values for `Text` and `Set` filters, empty means free-form
    pub options: Vec<String>,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    fn min_key(&self) -> String {
        format!("{}_min", self.name)
    }

    fn max_key(&self) -> String {
        format!("{}_max", self.name)
    }

    fn mode_key(&self) -> String {
        format!("{}_match", self.name)
    }

    fn invalid(&self, reason: impl Into<String>) -> QueryError {
        QueryError::InvalidFilterValue {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn check_option(&self, value: &str) -> Result<(), QueryError> {
        if self.options.is_empty() || self.options.iter().any(|o| o == value) {
            Ok(())
        } else {
            Err(self.invalid(format!(
                "{value} is not one of {}",
                self.options.join(", ")
            )))
        }
    }

    /// Check a value against this filter's kind and options
    pub fn check(&self, value: &FilterValue) -> Result<(), QueryError> {
        if value.kind() != self.kind {
            return Err(self.invalid(format!("expected a {:?} value", self.kind)));
        }
        match value {
            FilterValue::Text(text) => self.check_option(text),
            FilterValue::Set(values) => values.iter().try_for_each(|v| self.check_option(v)),
            _ => Ok(()),
        }
    }

    /// Parse operator input. `Ok(None)` clears the filter.
    ///
    /// Sets are comma separated, ranges are `min..max` with either side
    /// optional, patterns take an optional `starts_with:`, `contains:` or
    /// `ends_with:` prefix.
    pub fn parse_input(&self, input: &str) -> Result<Option<FilterValue>, QueryError> {
        let input = input.trim();
        if input.is_empty() || input == "any" {
            return Ok(None);
        }

        let value = match self.kind {
            FilterKind::Text => FilterValue::Text(input.to_string()),
            FilterKind::Flag => match input.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => FilterValue::Flag(true),
                "false" | "no" | "0" | "off" => FilterValue::Flag(false),
                other => return Err(self.invalid(format!("{other} is not a yes/no value"))),
            },
            FilterKind::Set => FilterValue::Set(
                input
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            FilterKind::Range => {
                let (min, max) = match input.split_once("..") {
                    Some((min, max)) => (min.trim(), max.trim()),
                    None => (input, input),
                };
                let bound = |raw: &str| -> Result<Option<i64>, QueryError> {
                    if raw.is_empty() {
                        return Ok(None);
                    }
                    raw.parse()
                        .map(Some)
                        .map_err(|_| self.invalid(format!("{raw} is not a whole number")))
                };
                FilterValue::Range {
                    min: bound(min)?,
                    max: bound(max)?,
                }
            }
            FilterKind::Pattern => {
                let (mode, text) = match input.split_once(':') {
                    Some((mode, text)) => match PatternMode::parse(mode) {
                        Some(mode) => (mode, text),
                        None => (PatternMode::Contains, input),
                    },
                    None => (PatternMode::Contains, input),
                };
                FilterValue::Pattern {
                    mode,
                    text: text.to_string(),
                }
            }
        };

        self.check(&value)?;
        Ok(value.normalized())
    }

    fn encode(&self, value: &FilterValue, out: &mut Vec<(String, String)>) {
        match value {
            FilterValue::Text(text) => out.push((self.name.clone(), text.clone())),
            FilterValue::Flag(flag) => out.push((self.name.clone(), flag.to_string())),
            FilterValue::Set(values) => {
                out.extend(values.iter().map(|v| (self.name.clone(), v.clone())));
            }
            FilterValue::Range { min, max } => {
                if let Some(min) = min {
                    out.push((self.min_key(), min.to_string()));
                }
                if let Some(max) = max {
                    out.push((self.max_key(), max.to_string()));
                }
            }
            FilterValue::Pattern { mode, text } => {
                out.push((self.name.clone(), text.clone()));
                if *mode != PatternMode::default() {
                    out.push((self.mode_key(), mode.as_str().to_string()));
                }
            }
        }
    }

    fn decode(&self, pairs: &[(String, String)]) -> Option<FilterValue> {
        let value = match self.kind {
            FilterKind::Text => FilterValue::Text(first(pairs, &self.name)?.to_string()),
            FilterKind::Flag => match first(pairs, &self.name)? {
                "true" => FilterValue::Flag(true),
                "false" => FilterValue::Flag(false),
                _ => return None,
            },
            FilterKind::Set => FilterValue::Set(
                pairs
                    .iter()
                    .filter(|(k, _)| *k == self.name)
                    .map(|(_, v)| v.clone())
                    .collect(),
            ),
            FilterKind::Range => FilterValue::Range {
                min: first(pairs, &self.min_key()).and_then(|v| v.parse().ok()),
                max: first(pairs, &self.max_key()).and_then(|v| v.parse().ok()),
            },
            FilterKind::Pattern => FilterValue::Pattern {
                text: first(pairs, &self.name)?.to_string(),
                mode: first(pairs, &self.mode_key())
                    .and_then(PatternMode::parse)
                    .unwrap_or_default(),
            },
        };
        value.normalized()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub key: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

/// Filters, sort keys and page sizes a list view accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSchema {
    pub filters: Vec<FilterSpec>,
    /// Empty means any key is accepted
    pub sort_keys: Vec<String>,
    pub default_sort: Option<Sort>,
    pub page_sizes: Vec<u32>,
    pub default_page_size: u32,
}

impl ListSchema {
    pub fn new(config: &ListConfig) -> Self {
        Self {
            filters: Vec::new(),
            sort_keys: Vec::new(),
            default_sort: None,
            page_sizes: config.page_sizes.clone(),
            default_page_size: config.default_page_size,
        }
    }

    pub fn with_filter(mut self, spec: FilterSpec) -> Self {
        self.filters.push(spec);
        self
    }

    pub fn with_sort(mut self, keys: &[&str], default: Option<(&str, SortDirection)>) -> Self {
        self.sort_keys = keys.iter().map(|k| k.to_string()).collect();
        self.default_sort = default.map(|(key, direction)| Sort::new(key, direction));
        self
    }

    pub fn filter(&self, name: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn initial_state(&self) -> QueryState {
        QueryState {
            search: String::new(),
            filters: BTreeMap::new(),
            sort: self.default_sort.clone(),
            page: 1,
            page_size: self.default_page_size,
        }
    }

    /// Filter parameters must not shadow paging, search or sort parameters
    pub fn validate(&self) -> Result<(), QueryError> {
        for spec in &self.filters {
            let keys = match spec.kind {
                FilterKind::Range => vec![spec.min_key(), spec.max_key()],
                FilterKind::Pattern => vec![spec.name.clone(), spec.mode_key()],
                _ => vec![spec.name.clone()],
            };
            if let Some(key) = keys.iter().find(|k| RESERVED.contains(&k.as_str())) {
                return Err(QueryError::ReservedName(key.clone()));
            }
        }
        if !self.page_sizes.contains(&self.default_page_size) {
            return Err(QueryError::PageSize(self.default_page_size));
        }
        Ok(())
    }

    fn check_sort_key(&self, key: &str) -> Result<(), QueryError> {
        if self.sort_keys.is_empty() || self.sort_keys.iter().any(|k| k == key) {
            Ok(())
        } else {
            Err(QueryError::UnknownSortKey(key.to_string()))
        }
    }
}

/// One user-driven edit to the Query State
#[derive(Debug, Clone, PartialEq)]
pub enum QueryChange {
    Search(String),
    Filter {
        name: String,
        value: Option<FilterValue>,
    },
    Sort {
        key: String,
        direction: Option<SortDirection>,
    },
    Page(u32),
    PageSize(u32),
    Reset,
}

impl QueryChange {
    /// Every change except a page move sends the view back to page 1
    pub fn resets_page(&self) -> bool {
        !matches!(self, Self::Page(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub search: String,
    pub filters: BTreeMap<String, FilterValue>,
    pub sort: Option<Sort>,
    pub page: u32,
    pub page_size: u32,
}

impl QueryState {
    /// Apply a change, returning whether the state moved
    pub fn apply(&mut self, schema: &ListSchema, change: QueryChange) -> Result<bool, QueryError> {
        let before = self.clone();
        let resets_page = change.resets_page();

        match change {
            QueryChange::Search(text) => self.search = normalize_search(&text),
            QueryChange::Filter { name, value } => {
                let spec = schema
                    .filter(&name)
                    .ok_or_else(|| QueryError::UnknownFilter(name.clone()))?;
                match value.and_then(FilterValue::normalized) {
                    Some(value) => {
                        spec.check(&value)?;
                        self.filters.insert(name, value);
                    }
                    None => {
                        self.filters.remove(&name);
                    }
                }
            }
            QueryChange::Sort { key, direction } => {
                schema.check_sort_key(&key)?;
                let direction = match (direction, &self.sort) {
                    (Some(direction), _) => direction,
                    (None, Some(current)) if current.key == key => current.direction.toggled(),
                    (None, _) => SortDirection::Asc,
                };
                self.sort = Some(Sort { key, direction });
            }
            QueryChange::Page(page) => self.page = page.max(1),
            QueryChange::PageSize(size) => {
                if !schema.page_sizes.contains(&size) {
                    return Err(QueryError::PageSize(size));
                }
                self.page_size = size;
            }
            QueryChange::Reset => *self = schema.initial_state(),
        }

        if resets_page {
            self.page = 1;
        }

        Ok(*self != before)
    }

    /// Location parameters, defaults omitted
    pub fn to_pairs(&self, schema: &ListSchema) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if !self.search.is_empty() {
            pairs.push((SEARCH.to_string(), self.search.clone()));
        }

        for spec in &schema.filters {
            if let Some(value) = self.filters.get(&spec.name) {
                spec.encode(value, &mut pairs);
            }
        }

        if let Some(sort) = &self.sort {
            let default = schema.default_sort.as_ref();
            if default.map(|d| &d.key) != Some(&sort.key) {
                pairs.push((SORT_BY.to_string(), sort.key.clone()));
            }
            let default_direction = default.map(|d| d.direction).unwrap_or_default();
            if sort.direction != default_direction {
                pairs.push((SORT_DIR.to_string(), sort.direction.as_str().to_string()));
            }
        }

        if self.page != 1 {
            pairs.push((PAGE.to_string(), self.page.to_string()));
        }
        if self.page_size != schema.default_page_size {
            pairs.push((PAGE_SIZE.to_string(), self.page_size.to_string()));
        }

        pairs
    }

    pub fn to_query_string(&self, schema: &ListSchema) -> String {
        self.to_pairs(schema)
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Rebuild a state from location parameters. Unknown or malformed
    /// parameters fall back to defaults.
    pub fn from_pairs(pairs: &[(String, String)], schema: &ListSchema) -> Self {
        let mut state = schema.initial_state();

        if let Some(search) = first(pairs, SEARCH) {
            state.search = search.to_string();
        }

        for spec in &schema.filters {
            if let Some(value) = spec.decode(pairs) {
                state.filters.insert(spec.name.clone(), value);
            }
        }

        let key = first(pairs, SORT_BY)
            .filter(|key| schema.check_sort_key(key).is_ok())
            .map(str::to_string)
            .or_else(|| schema.default_sort.as_ref().map(|d| d.key.clone()));
        if let Some(key) = key {
            let direction = first(pairs, SORT_DIR)
                .and_then(SortDirection::parse)
                .or_else(|| schema.default_sort.as_ref().map(|d| d.direction))
                .unwrap_or_default();
            state.sort = Some(Sort { key, direction });
        }

        state.page = first(pairs, PAGE)
            .and_then(|p| p.parse().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        state.page_size = first(pairs, PAGE_SIZE)
            .and_then(|p| p.parse().ok())
            .filter(|p| schema.page_sizes.contains(p))
            .unwrap_or(schema.default_page_size);

        state
    }

    pub fn from_query_string(query: &str, schema: &ListSchema) -> Self {
        Self::from_pairs(&parse_query(query), schema)
    }

    /// Parameters for the list endpoint
    pub fn request_params(&self, schema: &ListSchema) -> Vec<(String, String)> {
        let mut params = vec![
            (PAGE.to_string(), self.page.to_string()),
            (LIMIT.to_string(), self.page_size.to_string()),
        ];

        if !self.search.is_empty() {
            params.push((SEARCH.to_string(), self.search.clone()));
        }

        for spec in &schema.filters {
            if let Some(value) = self.filters.get(&spec.name) {
                spec.encode(value, &mut params);
            }
        }

        if let Some(sort) = &self.sort {
            params.push((SORT_BY.to_string(), sort.key.clone()));
            params.push((SORT_DIR.to_string(), sort.direction.as_str().to_string()));
        }

        params
    }
}

pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

fn decode(value: &str) -> String {
    let value = value.replace('+', " ");
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words_schema() -> ListSchema {
        ListSchema::new(&ListConfig::default())
            .with_filter(FilterSpec::new("language", FilterKind::Text).with_options(&["yo", "ha", "ig"]))
            .with_filter(
                FilterSpec::new("part_of_speech", FilterKind::Set)
                    .with_options(&["noun", "verb", "adjective"]),
            )
            .with_filter(FilterSpec::new("difficulty", FilterKind::Range))
            .with_filter(FilterSpec::new("is_active", FilterKind::Flag))
            .with_filter(FilterSpec::new("word", FilterKind::Pattern))
            .with_sort(&["word", "created_at"], Some(("created_at", SortDirection::Desc)))
    }

    #[test]
    fn test_initial_state_serializes_to_nothing() {
        let schema = words_schema();
        assert_eq!(schema.initial_state().to_query_string(&schema), "");
    }

    #[test]
    fn test_non_default_fields_are_written() {
        let schema = words_schema();
        let mut state = schema.initial_state();
        state
            .apply(&schema, QueryChange::Filter {
                name: "language".into(),
                value: Some(FilterValue::text("yo")),
            })
            .unwrap();
        state.apply(&schema, QueryChange::Search("ọ̀rẹ́ & co".into())).unwrap();
        state.apply(&schema, QueryChange::Page(3)).unwrap();

        let query = state.to_query_string(&schema);
        assert!(query.contains("language=yo"));
        assert!(query.contains("page=3"));
        assert!(!query.contains("page_size"));
        assert!(!query.contains("sort_"));
        assert_eq!(QueryState::from_query_string(&query, &schema), state);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let schema = words_schema();
        let mut state = schema.initial_state();
        state.apply(&schema, QueryChange::Page(4)).unwrap();
        assert_eq!(state.page, 4);

        let changed = state
            .apply(&schema, QueryChange::Filter {
                name: "is_active".into(),
                value: Some(FilterValue::Flag(true)),
            })
            .unwrap();
        assert!(changed);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_page_size_must_be_allowed() {
        let schema = words_schema();
        let mut state = schema.initial_state();
        assert_eq!(
            state.apply(&schema, QueryChange::PageSize(30)),
            Err(QueryError::PageSize(30))
        );
        state.apply(&schema, QueryChange::Page(2)).unwrap();
        state.apply(&schema, QueryChange::PageSize(50)).unwrap();
        assert_eq!((state.page, state.page_size), (1, 50));
    }

    #[test]
    fn test_sort_toggles_on_same_key() {
        let schema = words_schema();
        let mut state = schema.initial_state();
        state
            .apply(&schema, QueryChange::Sort { key: "word".into(), direction: None })
            .unwrap();
        assert_eq!(state.sort, Some(Sort::new("word", SortDirection::Asc)));
        state
            .apply(&schema, QueryChange::Sort { key: "word".into(), direction: None })
            .unwrap();
        assert_eq!(state.sort, Some(Sort::new("word", SortDirection::Desc)));

        assert_eq!(
            state.apply(&schema, QueryChange::Sort { key: "audio".into(), direction: None }),
            Err(QueryError::UnknownSortKey("audio".into()))
        );
    }

    #[test]
    fn test_unknown_filter_and_option_rejected() {
        let schema = words_schema();
        let mut state = schema.initial_state();
        assert!(matches!(
            state.apply(&schema, QueryChange::Filter {
                name: "colour".into(),
                value: Some(FilterValue::text("red")),
            }),
            Err(QueryError::UnknownFilter(_))
        ));
        assert!(matches!(
            state.apply(&schema, QueryChange::Filter {
                name: "language".into(),
                value: Some(FilterValue::text("fr")),
            }),
            Err(QueryError::InvalidFilterValue { .. })
        ));
    }

    #[test]
    fn test_parse_input_per_kind() {
        let schema = words_schema();
        let range = schema.filter("difficulty").unwrap();
        assert_eq!(
            range.parse_input("2..").unwrap(),
            Some(FilterValue::Range { min: Some(2), max: None })
        );
        assert_eq!(
            range.parse_input("3").unwrap(),
            Some(FilterValue::Range { min: Some(3), max: Some(3) })
        );
        assert!(range.parse_input("a..b").is_err());

        let pattern = schema.filter("word").unwrap();
        assert_eq!(
            pattern.parse_input("starts_with:ba").unwrap(),
            Some(FilterValue::Pattern { mode: PatternMode::StartsWith, text: "ba".into() })
        );
        assert_eq!(
            pattern.parse_input("a:b").unwrap(),
            Some(FilterValue::Pattern { mode: PatternMode::Contains, text: "a:b".into() })
        );

        let set = schema.filter("part_of_speech").unwrap();
        assert_eq!(
            set.parse_input("noun, verb,").unwrap(),
            Some(FilterValue::Set(["noun".to_string(), "verb".to_string()].into()))
        );
        assert!(set.parse_input("noun,pronoun").is_err());

        let flag = schema.filter("is_active").unwrap();
        assert_eq!(flag.parse_input("any").unwrap(), None);
    }

    #[test]
    fn test_request_params_always_page_and_limit() {
        let schema = words_schema();
        let params = schema.initial_state().request_params(&schema);
        assert_eq!(params[0], ("page".to_string(), "1".to_string()));
        assert_eq!(params[1], ("limit".to_string(), "20".to_string()));
        assert!(params.contains(&("sort_dir".to_string(), "desc".to_string())));
    }

    #[test]
    fn test_malformed_location_falls_back_to_defaults() {
        let schema = words_schema();
        let state = QueryState::from_query_string(
            "?page=0&page_size=33&sort_by=nope&is_active=maybe&difficulty_min=x",
            &schema,
        );
        assert_eq!(state, schema.initial_state());
    }

    #[test]
    fn test_schema_rejects_reserved_names() {
        let schema = ListSchema::new(&ListConfig::default())
            .with_filter(FilterSpec::new("page", FilterKind::Text));
        assert_eq!(schema.validate(), Err(QueryError::ReservedName("page".into())));
        assert!(words_schema().validate().is_ok());
    }

    fn arb_state() -> impl Strategy<Value = QueryState> {
        let pattern_mode = prop_oneof![
            Just(PatternMode::StartsWith),
            Just(PatternMode::Contains),
            Just(PatternMode::EndsWith),
        ];
        (
            any::<String>(),
            proptest::option::of(proptest::sample::select(vec!["yo", "ha", "ig"])),
            proptest::collection::btree_set(
                proptest::sample::select(vec!["noun", "verb", "adjective"]),
                0..3,
            ),
            (
                proptest::option::of(-100i64..100),
                proptest::option::of(-100i64..100),
            ),
            proptest::option::of(any::<bool>()),
            proptest::option::of((pattern_mode, ".{1,8}")),
            (
                proptest::sample::select(vec!["word", "created_at"]),
                any::<bool>(),
            ),
            1u32..50,
            proptest::sample::select(vec![20u32, 50, 100]),
        )
            .prop_map(
                |(search, language, pos, (min, max), active, pattern, (key, desc), page, size)| {
                    let mut filters = BTreeMap::new();
                    if let Some(language) = language {
                        filters.insert("language".to_string(), FilterValue::text(language));
                    }
                    if !pos.is_empty() {
                        filters.insert(
                            "part_of_speech".to_string(),
                            FilterValue::Set(pos.into_iter().map(str::to_string).collect()),
                        );
                    }
                    if min.is_some() || max.is_some() {
                        filters.insert("difficulty".to_string(), FilterValue::Range { min, max });
                    }
                    if let Some(active) = active {
                        filters.insert("is_active".to_string(), FilterValue::Flag(active));
                    }
                    if let Some((mode, text)) = pattern {
                        filters.insert("word".to_string(), FilterValue::Pattern { mode, text });
                    }
                    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
                    QueryState {
                        search,
                        filters,
                        sort: Some(Sort::new(key, direction)),
                        page,
                        page_size: size,
                    }
                },
            )
    }

    fn arb_resetting_change() -> impl Strategy<Value = QueryChange> {
        prop_oneof![
            any::<String>().prop_map(QueryChange::Search),
            proptest::option::of(proptest::sample::select(vec!["yo", "ha", "ig"])).prop_map(|v| {
                QueryChange::Filter {
                    name: "language".into(),
                    value: v.map(FilterValue::text),
                }
            }),
            (
                proptest::sample::select(vec!["word", "created_at"]),
                proptest::option::of(prop_oneof![
                    Just(SortDirection::Asc),
                    Just(SortDirection::Desc)
                ]),
            )
                .prop_map(|(key, direction)| QueryChange::Sort {
                    key: key.into(),
                    direction,
                }),
            proptest::sample::select(vec![20u32, 50, 100]).prop_map(QueryChange::PageSize),
        ]
    }

    proptest! {
        #[test]
        fn prop_query_string_round_trips(state in arb_state()) {
            let schema = words_schema();
            let query = state.to_query_string(&schema);
            prop_assert_eq!(QueryState::from_query_string(&query, &schema), state);
        }

        #[test]
        fn prop_serialization_is_deterministic(state in arb_state()) {
            let schema = words_schema();
            prop_assert_eq!(state.to_query_string(&schema), state.clone().to_query_string(&schema));
        }

        #[test]
        fn prop_filter_sort_and_size_changes_reset_page(
            mut state in arb_state(),
            change in arb_resetting_change(),
        ) {
            let schema = words_schema();
            state.apply(&schema, change).unwrap();
            prop_assert_eq!(state.page, 1);
        }
    }
}
