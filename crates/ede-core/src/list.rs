use ede_api::{ApiClient, ApiError, ListPage, Resource};
use ede_types::{Record, RecordId, record_id};

use crate::pagination::PageWindow;
use crate::query::{ListSchema, QueryChange, QueryError, QueryState};

/// A list request issued under a given generation
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub params: Vec<(String, String)>,
}

/// Owns the Query State of one list view and the last page it loaded.
///
/// Responses are matched to the latest issued generation; anything older is
/// dropped regardless of arrival order.
pub struct ListController {
    resource: Resource,
    schema: ListSchema,
    query: QueryState,
    generation: u64,
    in_flight: bool,
    /// Set when a response showed the page lies past the last one
    page_moved: bool,
    items: Vec<Record>,
    total: u64,
    error: Option<String>,
}

impl ListController {
    pub fn new(resource: Resource, schema: ListSchema) -> Self {
        let query = schema.initial_state();
        Self::with_query(resource, schema, query)
    }

    /// Restore a view from its location query string
    pub fn hydrate(resource: Resource, schema: ListSchema, location: &str) -> Self {
        let query = QueryState::from_query_string(location, &schema);
        Self::with_query(resource, schema, query)
    }

    fn with_query(resource: Resource, schema: ListSchema, query: QueryState) -> Self {
        Self {
            resource,
            schema,
            query,
            generation: 0,
            in_flight: false,
            page_moved: false,
            items: Vec::new(),
            total: 0,
            error: None,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn schema(&self) -> &ListSchema {
        &self.schema
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// The last response moved the page back inside the result set; the
    /// loaded items belong to the old page and a new fetch is due
    pub fn needs_refetch(&self) -> bool {
        self.page_moved
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.query.page, self.query.page_size, self.total)
    }

    pub fn loaded_ids(&self) -> Vec<RecordId> {
        self.items.iter().filter_map(record_id).collect()
    }

    pub fn find(&self, id: &str) -> Option<&Record> {
        self.items
            .iter()
            .find(|record| record_id(record).as_deref() == Some(id))
    }

    pub fn location(&self) -> String {
        self.query.to_query_string(&self.schema)
    }

    /// Apply a change to the Query State. Page moves are clamped to the
    /// pages known from the last response.
    pub fn apply(&mut self, change: QueryChange) -> Result<bool, QueryError> {
        let change = match change {
            QueryChange::Page(page) => QueryChange::Page(self.window().clamp(page)),
            other => other,
        };
        self.query.apply(&self.schema, change)
    }

    pub fn next_page(&mut self) -> bool {
        let window = self.window();
        window.has_next()
            && self
                .query
                .apply(&self.schema, QueryChange::Page(window.page + 1))
                == Ok(true)
    }

    pub fn prev_page(&mut self) -> bool {
        let window = self.window();
        window.has_prev()
            && self
                .query
                .apply(&self.schema, QueryChange::Page(window.page - 1))
                == Ok(true)
    }

    /// Start a fetch for the current Query State, superseding any request
    /// still in flight
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.in_flight = true;
        self.page_moved = false;

        tracing::debug!(
            "list {} generation {} ({})",
            self.resource.path,
            self.generation,
            self.location()
        );

        FetchTicket {
            generation: self.generation,
            params: self.query.request_params(&self.schema),
        }
    }

    /// Store a response. Returns false when the response was superseded.
    pub fn complete_fetch(&mut self, generation: u64, result: Result<ListPage, ApiError>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "dropping stale list response {} (latest {})",
                generation,
                self.generation
            );
            return false;
        }

        self.in_flight = false;
        match result {
            Ok(page) => {
                self.items = page.items;
                self.total = page.total;
                self.error = None;

                let last = self.window().total_pages();
                if self.query.page > last {
                    tracing::debug!(
                        "list {} page {} is past the last page {}",
                        self.resource.path,
                        self.query.page,
                        last
                    );
                    self.query.page = last;
                    self.page_moved = true;
                }
            }
            Err(e) => {
                tracing::warn!("list {} failed: {}", self.resource.path, e);
                self.error = Some(e.message());
            }
        }
        true
    }

    /// Forget any in-flight request, e.g. when the view goes away
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.in_flight = false;
    }

    /// Fetch and store in one step, following a page correction once
    pub async fn refresh(&mut self, client: &dyn ApiClient) -> bool {
        for _ in 0..2 {
            let ticket = self.begin_fetch();
            let result = self.resource.list(client, ticket.params).await;
            if !self.complete_fetch(ticket.generation, result) {
                return false;
            }
            if !self.page_moved {
                break;
            }
        }
        true
    }
}
