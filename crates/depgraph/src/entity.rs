//! Entity ID addressing.
//!
//! Every entity in a snapshot is keyed by a string built from its file path and
//! declared names, joined with `::`:
//!
//! | Entity | ID |
//! |--------|----|
//! | file | `src/user.ts` |
//! | class / interface | `src/user.ts::User` |
//! | method | `src/user.ts::User::save` |
//! | function | `src/user.ts::createUser` |
//!
//! File paths are always POSIX-style and relative to the project root. The
//! normalisation happens here, once, when an ID is formatted.

use std::path::{Component, Path};

use crate::error::{Error, Result};

/// Separator between ID segments.
pub const SEPARATOR: &str = "::";

/// Convert a relative path to the POSIX form used inside entity IDs.
#[must_use]
pub fn to_posix(path: &str) -> String {
    path.replace('\\', "/")
}

/// Express `path` relative to `root` in POSIX form.
///
/// Returns `None` when `path` does not live under `root`.
#[must_use]
pub fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// ID of a file entity.
#[must_use]
pub fn format_file_id(file_path: &str) -> String {
    to_posix(file_path)
}

/// ID of a class entity.
#[must_use]
pub fn format_class_id(file_path: &str, class_name: &str) -> String {
    format!("{}{SEPARATOR}{class_name}", to_posix(file_path))
}

/// ID of an interface entity.
#[must_use]
pub fn format_interface_id(file_path: &str, interface_name: &str) -> String {
    format!("{}{SEPARATOR}{interface_name}", to_posix(file_path))
}

/// ID of a method entity.
#[must_use]
pub fn format_method_id(file_path: &str, class_name: &str, method_name: &str) -> String {
    format!(
        "{}{SEPARATOR}{class_name}{SEPARATOR}{method_name}",
        to_posix(file_path)
    )
}

/// ID of a free function entity.
#[must_use]
pub fn format_function_id(file_path: &str, function_name: &str) -> String {
    format!("{}{SEPARATOR}{function_name}", to_posix(file_path))
}

/// The segments of a parsed entity ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef<'a> {
    /// File path segment
    pub file: &'a str,
    /// Class, interface or function name
    pub symbol: Option<&'a str>,
    /// Method name (only with a class `symbol`)
    pub member: Option<&'a str>,
}

impl EntityRef<'_> {
    /// Whether the ID addresses a whole file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.symbol.is_none()
    }
}

/// Split an entity ID into its segments.
///
/// # Errors
///
/// Returns [`Error::MalformedEntityId`] when the ID does not split into 1, 2
/// or 3 segments. The empty string is also rejected, reported with
/// `segments: 0`, even though it splits into a single empty segment: no file
/// has an empty path.
pub fn parse_entity_id(id: &str) -> Result<EntityRef<'_>> {
    let segments: Vec<&str> = id.split(SEPARATOR).collect();
    match segments[..] {
        [file] if !file.is_empty() => Ok(EntityRef {
            file,
            symbol: None,
            member: None,
        }),
        [file, symbol] => Ok(EntityRef {
            file,
            symbol: Some(symbol),
            member: None,
        }),
        [file, symbol, member] => Ok(EntityRef {
            file,
            symbol: Some(symbol),
            member: Some(member),
        }),
        _ => Err(Error::MalformedEntityId {
            id: id.to_string(),
            segments: if id.is_empty() { 0 } else { segments.len() },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn formats_every_entity_kind() {
        assert_eq!(format_file_id("src/user.ts"), "src/user.ts");
        assert_eq!(format_class_id("src/user.ts", "User"), "src/user.ts::User");
        assert_eq!(format_interface_id("src/user.ts", "IUser"), "src/user.ts::IUser");
        assert_eq!(
            format_method_id("src/user.ts", "User", "save"),
            "src/user.ts::User::save"
        );
        assert_eq!(format_function_id("src/user.ts", "create"), "src/user.ts::create");
    }

    #[test]
    fn formatting_normalizes_windows_separators() {
        assert_eq!(format_file_id(r"src\models\user.ts"), "src/models/user.ts");
        assert_eq!(
            format_method_id(r"src\user.ts", "User", "save"),
            "src/user.ts::User::save"
        );
    }

    #[rstest]
    #[case::file("src/a.ts", "src/a.ts", None, None)]
    #[case::class("src/a.ts::A", "src/a.ts", Some("A"), None)]
    #[case::method("src/a.ts::A::run", "src/a.ts", Some("A"), Some("run"))]
    fn parses_valid_ids(
        #[case] id: &str,
        #[case] file: &str,
        #[case] symbol: Option<&str>,
        #[case] member: Option<&str>,
    ) {
        let parsed = parse_entity_id(id).expect("valid id");
        assert_eq!(parsed.file, file);
        assert_eq!(parsed.symbol, symbol);
        assert_eq!(parsed.member, member);
    }

    #[rstest]
    #[case::four_segments("src/a.ts::A::b::c", 4)]
    #[case::empty("", 0)]
    fn rejects_malformed_ids(#[case] id: &str, #[case] expected_segments: usize) {
        let err = parse_entity_id(id).expect_err("should be malformed");
        match err {
            Error::MalformedEntityId { segments, .. } => assert_eq!(segments, expected_segments),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn format_then_parse_recovers_segments() {
        let id = format_method_id("lib/x.ts", "Svc", "go");
        let parsed = parse_entity_id(&id).expect("valid");
        assert!(!parsed.is_file());
        assert_eq!((parsed.file, parsed.symbol, parsed.member), ("lib/x.ts", Some("Svc"), Some("go")));
    }

    #[test]
    fn relative_posix_strips_root() {
        let root = Path::new("/work/project");
        let file = root.join("src").join("a.ts");
        assert_eq!(relative_posix(root, &file).as_deref(), Some("src/a.ts"));
        assert_eq!(relative_posix(root, Path::new("/elsewhere/a.ts")), None);
    }
}
