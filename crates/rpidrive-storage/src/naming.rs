//! File name rules for volume trees.

use rpidrive_core::error::AppError;
use rpidrive_core::result::AppResult;

/// Trim `name` and reject names that cannot be a single path component.
pub fn sanitize_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(AppError::validation(format!("Invalid file name: {name:?}")));
    }
    if trimmed.contains(['/', '\\', '\0']) {
        return Err(AppError::validation(format!(
            "Invalid file name: {name:?} contains a path separator"
        )));
    }
    Ok(trimmed.to_string())
}

/// Split `name` into stem and extension (with the dot).
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// Return `desired` when free, otherwise `stem (n)ext` for the first free `n`.
pub fn unique_name(desired: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(desired) {
        return desired.to_string();
    }
    let (stem, ext) = split_extension(desired);
    let mut n = 1u32;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Split a client supplied relative path into sanitized components.
pub fn split_relative_path(path: &str) -> AppResult<Vec<String>> {
    let parts: Vec<String> = path
        .split(['/', '\\'])
        .filter(|p| !p.trim().is_empty())
        .map(sanitize_name)
        .collect::<AppResult<_>>()?;
    if parts.is_empty() {
        return Err(AppError::validation(format!("Invalid path: {path:?}")));
    }
    Ok(parts)
}
