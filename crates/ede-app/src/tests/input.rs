use std::path::{Path, PathBuf};

use ede_types::{SortDirection, UiCommand};

use crate::input::parse_command;
use crate::view::mime_for;

#[test]
fn test_blank_lines_are_ignored() {
    assert_eq!(parse_command("   "), Ok(None));
}

#[test]
fn test_filter_with_and_without_value() {
    assert_eq!(
        parse_command("filter language yo"),
        Ok(Some(UiCommand::Filter {
            name: "language".into(),
            value: "yo".into()
        }))
    );
    assert_eq!(
        parse_command("filter language"),
        Ok(Some(UiCommand::ClearFilter("language".into())))
    );
    assert!(parse_command("filter").is_err());
}

#[test]
fn test_sort_direction_is_optional() {
    assert_eq!(
        parse_command("sort word desc"),
        Ok(Some(UiCommand::Sort {
            key: "word".into(),
            direction: Some(SortDirection::Desc)
        }))
    );
    assert_eq!(
        parse_command("sort word"),
        Ok(Some(UiCommand::Sort {
            key: "word".into(),
            direction: None
        }))
    );
    assert!(parse_command("sort word sideways").is_err());
}

#[test]
fn test_aliases_and_arguments() {
    assert_eq!(parse_command("Y"), Ok(Some(UiCommand::Confirm)));
    assert_eq!(parse_command("select all"), Ok(Some(UiCommand::SelectAll)));
    assert_eq!(parse_command("select 7"), Ok(Some(UiCommand::Select("7".into()))));
    assert_eq!(parse_command("page 3"), Ok(Some(UiCommand::Page(3))));
    assert_eq!(
        parse_command("set example_sentence Mo fẹ́ jẹun"),
        Ok(Some(UiCommand::SetField {
            name: "example_sentence".into(),
            value: "Mo fẹ́ jẹun".into()
        }))
    );
    assert_eq!(
        parse_command("attach ./ile.mp3"),
        Ok(Some(UiCommand::Attach(PathBuf::from("./ile.mp3"))))
    );
    assert!(parse_command("page three").is_err());
    assert!(parse_command("delete").is_err());
    assert!(parse_command("poll maybe").is_err());
    assert!(parse_command("frobnicate").is_err());
}

#[test]
fn test_mime_from_extension() {
    assert_eq!(mime_for(Path::new("a/ile.MP3")), "audio/mpeg");
    assert_eq!(mime_for(Path::new("ile.ogg")), "audio/ogg");
    assert_eq!(mime_for(Path::new("notes.txt")), "application/octet-stream");
    assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
}
