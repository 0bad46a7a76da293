//! Path helpers for user-supplied locations.

use std::path::PathBuf;

/// Expand a leading `~/` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path.trim_start_matches("~/"));
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_untouched() {
        assert_eq!(expand_tilde("/tmp/out.csv"), PathBuf::from("/tmp/out.csv"));
        assert_eq!(expand_tilde("rel/out.csv"), PathBuf::from("rel/out.csv"));
    }
}
