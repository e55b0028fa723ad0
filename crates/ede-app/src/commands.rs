use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use ede_api::ApiClient;
use ede_config::Config;
use ede_core::{
    EntitySchema, ListController, ListSchema, QueryChange, QueryError, QueryState, Selection,
};
use ede_types::SortDirection;

use crate::cli::{ConsoleArgs, GetArgs, ListArgs};
use crate::controller::ConsoleController;
use crate::render::{render_page, render_record};
use crate::view::ConsoleView;

/// Query changes requested on the command line, page last so the other
/// changes cannot reset it
pub fn list_changes(schema: &ListSchema, args: &ListArgs) -> Result<Vec<QueryChange>, QueryError> {
    let mut changes = Vec::new();

    if let Some(search) = &args.search {
        changes.push(QueryChange::Search(search.clone()));
    }
    for filter in &args.filters {
        let (name, value) = filter.split_once('=').unwrap_or((filter.as_str(), ""));
        let spec = schema
            .filter(name)
            .ok_or_else(|| QueryError::UnknownFilter(name.to_string()))?;
        changes.push(QueryChange::Filter {
            name: name.to_string(),
            value: spec.parse_input(value)?,
        });
    }
    if let Some(sort) = &args.sort {
        let (key, direction) = match sort.split_once(':') {
            Some((key, dir)) => (key, SortDirection::parse(dir)),
            None => (sort.as_str(), None),
        };
        changes.push(QueryChange::Sort {
            key: key.to_string(),
            direction: Some(direction.unwrap_or_default()),
        });
    }
    if let Some(size) = args.page_size {
        changes.push(QueryChange::PageSize(size));
    }
    if let Some(page) = args.page {
        changes.push(QueryChange::Page(page));
    }

    Ok(changes)
}

pub async fn run_list(client: &dyn ApiClient, config: &Config, args: ListArgs) -> anyhow::Result<()> {
    let schema = args.entity.schema(config);

    let mut query = QueryState::from_query_string(&args.location, &schema.list);
    for change in list_changes(&schema.list, &args)? {
        query.apply(&schema.list, change)?;
    }
    let location = query.to_query_string(&schema.list);

    let mut list = ListController::hydrate(schema.resource.clone(), schema.list.clone(), &location);
    list.refresh(client).await;
    if let Some(error) = list.error() {
        bail!("could not load {}: {error}", schema.name);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(list.items())?);
    } else {
        println!("{}", render_page(&schema, &list, &Selection::new()));
    }
    Ok(())
}

pub async fn run_get(client: &dyn ApiClient, config: &Config, args: GetArgs) -> anyhow::Result<()> {
    let schema: EntitySchema = args.entity.schema(config);
    let record = schema
        .resource
        .get(client, &args.id)
        .await
        .with_context(|| format!("fetch {} {}", schema.label, args.id))?;

    println!("{}", render_record(&record));
    Ok(())
}

pub async fn run_console(client: Arc<dyn ApiClient>, config: &Config, args: ConsoleArgs) -> anyhow::Result<()> {
    let schema = args.entity.schema(config);
    tracing::info!("Console on {} ({})", schema.name, schema.resource.path);

    let controller = ConsoleController::new();
    let view = ConsoleView::new(
        config,
        schema,
        &args.location,
        format!("/admin/{}", args.entity),
        client,
        controller.events_tx(),
        controller.output_tx(),
    );
    let mut tasks = controller.spawn_tasks(view, Duration::from_millis(config.tick_ms), args.poll);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
        Some(result) = tasks.join_next() => log_exit(result),
    }

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        log_exit(result);
    }
    Ok(())
}

fn log_exit(result: Result<anyhow::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("console task exited: {e}"),
        Err(e) => tracing::error!("console task panicked: {e}"),
    }
}
