//! Qualified (`workspace:local`) and local resource names.
//!
//! Every name that reaches the catalog, whether it came from a layer listing, a layer group
//! member or the command line, goes through [`qualify`] or [`unqualify`] so that comparisons
//! are always made on the same form.

/// Separator between the workspace prefix and the local name
pub const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name must not be empty")]
    Empty,

    #[error("'{name}' has more than one ':' separator")]
    TooManySeparators { name: String },

    #[error("'{name}' is missing its workspace or local part")]
    MissingPart { name: String },

    #[error("'{name}' does not belong to workspace '{expected}'")]
    WorkspaceMismatch { name: String, expected: String },
}

/// Split a name into its optional workspace prefix and its local part
pub fn split(name: &str) -> Result<(Option<&str>, &str), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    let mut parts = name.split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), None, _) => Ok((None, local)),
        (Some(prefix), Some(local), None) => {
            if prefix.is_empty() || local.is_empty() {
                Err(NameError::MissingPart {
                    name: name.to_string(),
                })
            } else {
                Ok((Some(prefix), local))
            }
        }
        _ => Err(NameError::TooManySeparators {
            name: name.to_string(),
        }),
    }
}

/// Qualify `name` against `workspace`.
///
/// A name that already carries a prefix must carry `workspace`'s; a bare name gets it prepended.
pub fn qualify(workspace: &str, name: &str) -> Result<String, NameError> {
    match split(name)? {
        (Some(prefix), _) if prefix != workspace => Err(NameError::WorkspaceMismatch {
            name: name.to_string(),
            expected: workspace.to_string(),
        }),
        (Some(_), _) => Ok(name.to_string()),
        (None, local) => Ok(format!("{workspace}{SEPARATOR}{local}")),
    }
}

/// Strip the workspace prefix from `name`, if there is one
pub fn unqualify(name: &str) -> Result<&str, NameError> {
    split(name).map(|(_, local)| local)
}
