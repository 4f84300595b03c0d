pub mod model;

// normalized form of a title used as the uniqueness key; uniqueness is
// case-insensitive on the trimmed title
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}
