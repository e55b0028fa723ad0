use std::path::PathBuf;

use ede_types::{SortDirection, UiCommand};

pub const HELP: &str = "\
commands:
  search <text>            filter by free text (empty clears)
  filter <name> <value>    set a filter; `filter <name>` clears it
  sort <key> [asc|desc]    sort, toggling direction when omitted
  page <n> | next | prev   move between pages
  size <n>                 change the page size
  refresh | show           reload or reprint the current page
  select <id> | select all | clear
  new | edit <id>          open a form
  set <field> <value>      edit a form field
  attach <path>            stage an audio file
  save | discard
  delete <id> | deactivate <id> | purge <id>
  bulk-delete | regenerate-audio
  yes | no                 confirm or cancel a pending action
  poll on|off | dismiss | help | quit";

/// Parse one console line. Empty lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<UiCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "search" | "/" => UiCommand::Search(rest.to_string()),
        "filter" => match rest.split_once(char::is_whitespace) {
            Some((name, value)) => UiCommand::Filter {
                name: name.to_string(),
                value: value.trim().to_string(),
            },
            None if !rest.is_empty() => UiCommand::ClearFilter(rest.to_string()),
            None => return Err("usage: filter <name> [value]".into()),
        },
        "sort" => {
            let mut parts = rest.split_whitespace();
            let key = parts.next().ok_or("usage: sort <key> [asc|desc]")?;
            let direction = match parts.next() {
                Some(dir) => Some(
                    SortDirection::parse(dir).ok_or_else(|| format!("unknown direction {dir}"))?,
                ),
                None => None,
            };
            UiCommand::Sort {
                key: key.to_string(),
                direction,
            }
        }
        "page" => UiCommand::Page(number(rest)?),
        "next" | "n" => UiCommand::NextPage,
        "prev" | "p" => UiCommand::PrevPage,
        "size" => UiCommand::PageSize(number(rest)?),
        "refresh" | "r" => UiCommand::Refresh,
        "select" if rest == "all" => UiCommand::SelectAll,
        "select" => UiCommand::Select(id(rest)?),
        "clear" => UiCommand::ClearSelection,
        "new" => UiCommand::New,
        "edit" => UiCommand::Edit(id(rest)?),
        "set" => match rest.split_once(char::is_whitespace) {
            Some((name, value)) => UiCommand::SetField {
                name: name.to_string(),
                value: value.trim().to_string(),
            },
            None if !rest.is_empty() => UiCommand::SetField {
                name: rest.to_string(),
                value: String::new(),
            },
            None => return Err("usage: set <field> <value>".into()),
        },
        "attach" if !rest.is_empty() => UiCommand::Attach(PathBuf::from(rest)),
        "attach" => return Err("usage: attach <path>".into()),
        "save" => UiCommand::Save,
        "discard" => UiCommand::Discard,
        "delete" => UiCommand::Delete(id(rest)?),
        "deactivate" => UiCommand::Deactivate(id(rest)?),
        "purge" => UiCommand::Purge(id(rest)?),
        "bulk-delete" => UiCommand::BulkDelete,
        "regenerate-audio" | "regen" => UiCommand::RegenerateAudio,
        "yes" | "y" | "confirm" => UiCommand::Confirm,
        "no" | "cancel" => UiCommand::Cancel,
        "poll" => match rest {
            "on" => UiCommand::Poll(true),
            "off" => UiCommand::Poll(false),
            _ => return Err("usage: poll on|off".into()),
        },
        "dismiss" => UiCommand::Dismiss,
        "show" | "ls" => UiCommand::Show,
        "help" | "?" => UiCommand::Help,
        "quit" | "q" | "exit" => UiCommand::Quit,
        other => return Err(format!("unknown command {other}, try `help`")),
    };

    Ok(Some(command))
}

fn number(rest: &str) -> Result<u32, String> {
    rest.parse()
        .map_err(|_| format!("expected a number, got `{rest}`"))
}

fn id(rest: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err("expected a record id".into())
    } else {
        Ok(rest.to_string())
    }
}
