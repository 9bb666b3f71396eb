//! Slug normalisation and validation
//!
//! A slug is the canonical identifier of a note, alias or file. Slugs may
//! contain `/` to express folder-like grouping. Note slugs never contain `.`;
//! file slugs may carry an extension.

use crate::error::{SlugError, SlugResult};
use crate::title::infer_note_title;
use regex::Regex;
use std::sync::LazyLock;

/// Canonical identifier of a note, alias or file
pub type Slug = String;

/// Maximum slug length in characters
pub const MAX_SLUG_LENGTH: usize = 200;

const NEW_NOTE_STEM: &str = "new";

static APOSTROPHES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"['’]+").expect("apostrophes regex"));

static INVALID_NOTE_CHARS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{M}\p{Nd}\-_]+").expect("note chars regex"));

static INVALID_FILE_CHARS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{M}\p{Nd}\-_.]+").expect("file chars regex"));

static DASH_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("dash run regex"));

static DOT_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.+").expect("dot run regex"));

static DASHED_DOT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\.-?").expect("dashed dot regex"));

static VALID_SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[\p{L}\p{M}\p{Nd}_][\p{L}\p{M}\p{Nd}\-._]*(/[\p{L}\p{M}\p{Nd}_][\p{L}\p{M}\p{Nd}\-._]*)*$",
    )
    .expect("valid slug regex")
});

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Normalise arbitrary text into a note slug
///
/// Trims, strips apostrophes, replaces every character that is not a
/// letter, mark, digit, `-` or `_` with `-`, collapses dash runs,
/// lowercases, caps the length and trims leading/trailing dashes.
pub fn sluggify(text: &str) -> Slug {
    let slug = APOSTROPHES_REGEX.replace_all(text.trim(), "");
    let slug = INVALID_NOTE_CHARS_REGEX.replace_all(&slug, "-");
    let slug = DASH_RUN_REGEX.replace_all(&slug, "-").to_lowercase();
    truncate_chars(&slug, MAX_SLUG_LENGTH)
        .trim_matches('-')
        .to_string()
}

/// Normalise a filename into a file slug segment
///
/// Like [`sluggify`], but keeps `.` so extensions survive. Dashes touching a
/// dot are dropped and a leading `.` is stripped, so dotfiles become
/// extensionless.
pub fn sluggify_filename(filename: &str) -> Slug {
    let slug = APOSTROPHES_REGEX.replace_all(filename.trim(), "");
    let slug = INVALID_FILE_CHARS_REGEX.replace_all(&slug, "-");
    let slug = DASH_RUN_REGEX.replace_all(&slug, "-");
    let slug = DASHED_DOT_REGEX.replace_all(&slug, ".");
    let slug = DOT_RUN_REGEX.replace_all(&slug, ".").to_lowercase();
    let slug = slug.trim_start_matches(['.', '-']);
    truncate_chars(slug, MAX_SLUG_LENGTH)
        .trim_end_matches(['.', '-'])
        .to_string()
}

/// Check whether `slug` is a valid note, alias or file slug
pub fn is_valid_slug(slug: &str) -> bool {
    ensure_valid_slug(slug).is_ok()
}

/// Check whether `slug` is a valid note or alias slug (no extension)
pub fn is_valid_note_slug(slug: &str) -> bool {
    ensure_valid_note_slug(slug).is_ok()
}

/// Validate a slug, explaining why it is rejected
pub fn ensure_valid_slug(slug: &str) -> SlugResult<&str> {
    if slug.is_empty() {
        return Err(SlugError::Empty);
    }
    if slug.chars().count() > MAX_SLUG_LENGTH {
        return Err(SlugError::TooLong {
            slug: slug.to_string(),
            max: MAX_SLUG_LENGTH,
        });
    }
    if slug.contains("..") || slug.ends_with('.') || !VALID_SLUG_REGEX.is_match(slug) {
        return Err(SlugError::Invalid(slug.to_string()));
    }
    Ok(slug)
}

/// Validate a note slug, which additionally must not contain `.`
pub fn ensure_valid_note_slug(slug: &str) -> SlugResult<&str> {
    ensure_valid_slug(slug)?;
    if slug.contains('.') {
        return Err(SlugError::ContainsDot(slug.to_string()));
    }
    Ok(slug)
}

/// Append `-{n}` to `stem`, trimming the stem so the result stays within
/// the length limit
fn with_numeric_suffix(stem: &str, n: usize) -> Slug {
    let suffix = format!("-{n}");
    let room = MAX_SLUG_LENGTH.saturating_sub(suffix.chars().count());
    let stem = truncate_chars(stem, room).trim_end_matches('-');
    format!("{stem}{suffix}")
}

fn first_free_numbered<F>(stem: &str, start: usize, is_taken: F) -> Slug
where
    F: Fn(&str) -> bool,
{
    (start..)
        .map(|n| with_numeric_suffix(stem, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| with_numeric_suffix(stem, start))
}

/// Derive an unused slug for a new note from its content
///
/// The stem comes from the inferred title. A note without a usable title
/// gets `new-1`, `new-2`, and so on, never a bare `new`. Otherwise the stem
/// itself is tried first, then `stem-2`, `stem-3`, ...
///
/// `is_taken` must report every slug in use by notes, aliases and files.
pub fn create_slug<F>(content: &str, is_taken: F) -> Slug
where
    F: Fn(&str) -> bool,
{
    let stem = sluggify(&infer_note_title(content));
    if stem.is_empty() {
        return first_free_numbered(NEW_NOTE_STEM, 1, is_taken);
    }
    if !is_taken(&stem) {
        return stem;
    }
    first_free_numbered(&stem, 2, is_taken)
}

/// Derive an unused slug for an uploaded file
///
/// The slug is `namespace/` followed by the sluggified filename. On a
/// collision a counter is inserted before the extension:
/// `files/test.txt`, `files/test-2.txt`, ...
pub fn get_slug_for_new_file<F>(namespace: &str, filename: &str, is_taken: F) -> Slug
where
    F: Fn(&str) -> bool,
{
    let base = match sluggify_filename(filename) {
        base if base.is_empty() => "file".to_string(),
        base => base,
    };
    let prefix = match namespace.trim_matches('/') {
        "" => String::new(),
        ns => format!("{ns}/"),
    };

    let candidate = format!("{prefix}{base}");
    if !is_taken(&candidate) {
        return candidate;
    }

    let (stem, extension) = match base.rfind('.') {
        Some(idx) => base.split_at(idx),
        None => (base.as_str(), ""),
    };
    (2..)
        .map(|n| format!("{prefix}{}{extension}", with_numeric_suffix(stem, n)))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sluggify() {
        assert_eq!(sluggify("  Hello World  "), "hello-world");
        assert_eq!(sluggify("Don't panic!"), "dont-panic");
        assert_eq!(sluggify("a -- b"), "a-b");
        assert_eq!(sluggify("Ünïcödé Straße"), "ünïcödé-straße");
        assert_eq!(sluggify("snake_case_name"), "snake_case_name");
        assert_eq!(sluggify("folder/note"), "folder-note");
        assert_eq!(sluggify("!!!"), "");
        assert_eq!(sluggify("version 1.2"), "version-1-2");
    }

    #[test]
    fn test_sluggify_caps_length() {
        let long = "a".repeat(300);
        assert_eq!(sluggify(&long).chars().count(), MAX_SLUG_LENGTH);
    }

    #[test]
    fn test_sluggify_filename() {
        assert_eq!(sluggify_filename("test.test.test+.txt"), "test.test.test.txt");
        assert_eq!(sluggify_filename("My Photo (1).JPG"), "my-photo-1.jpg");
        assert_eq!(sluggify_filename(".bashrc"), "bashrc");
        assert_eq!(sluggify_filename("archive..tar.gz"), "archive.tar.gz");
        assert_eq!(sluggify_filename("trailing."), "trailing");
        assert_eq!(sluggify_filename("a-.-.-b"), "a.b");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("note"));
        assert!(is_valid_slug("folder/note-1"));
        assert!(is_valid_slug("files/report.pdf"));
        assert!(is_valid_slug("_private"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug(".hidden"));
        assert!(!is_valid_slug("-dash"));
        assert!(!is_valid_slug("a..b"));
        assert!(!is_valid_slug("ends."));
        assert!(!is_valid_slug("a//b"));
        assert!(!is_valid_slug("/leading"));
        assert!(!is_valid_slug("trailing/"));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug(&"a".repeat(201)));
        assert!(is_valid_slug(&"a".repeat(200)));
    }

    #[test]
    fn test_is_valid_note_slug() {
        assert!(is_valid_note_slug("folder/note"));
        assert!(!is_valid_note_slug("files/report.pdf"));
        assert_eq!(
            ensure_valid_note_slug("a.b"),
            Err(SlugError::ContainsDot("a.b".to_string()))
        );
    }

    #[test]
    fn test_create_slug_from_title() {
        let taken: HashSet<&str> = HashSet::new();
        assert_eq!(
            create_slug("# My First Note\nbody", |s| taken.contains(s)),
            "my-first-note"
        );
        assert_eq!(
            create_slug("\n\n[[Linked Title]]", |s| taken.contains(s)),
            "linked-title"
        );
    }

    #[test]
    fn test_create_slug_numbers_collisions() {
        let taken: HashSet<&str> = ["idea", "idea-2"].into_iter().collect();
        assert_eq!(create_slug("Idea", |s| taken.contains(s)), "idea-3");
    }

    #[test]
    fn test_create_slug_for_untitled_note_is_never_bare_new() {
        let taken: HashSet<&str> = HashSet::new();
        assert_eq!(create_slug("", |s| taken.contains(s)), "new-1");
        let taken: HashSet<&str> = ["new-1"].into_iter().collect();
        assert_eq!(create_slug("   \n!!!", |s| taken.contains(s)), "new-2");
    }

    #[test]
    fn test_create_slug_stays_within_length_limit() {
        let title = "x".repeat(250);
        let first = create_slug(&title, |_| false);
        assert_eq!(first.chars().count(), MAX_SLUG_LENGTH);
        let second = create_slug(&title, |s| s == first);
        assert!(second.ends_with("-2"));
        assert!(is_valid_note_slug(&second));
    }

    #[test]
    fn test_slug_for_new_file() {
        let taken: HashSet<&str> = HashSet::new();
        assert_eq!(
            get_slug_for_new_file("files", "test.test.test+.txt", |s| taken.contains(s)),
            "files/test.test.test.txt"
        );
        let taken: HashSet<&str> = ["files/test.txt"].into_iter().collect();
        assert_eq!(
            get_slug_for_new_file("files", "test.txt", |s| taken.contains(s)),
            "files/test-2.txt"
        );
        assert_eq!(get_slug_for_new_file("", "README", |_| false), "readme");
    }
}
