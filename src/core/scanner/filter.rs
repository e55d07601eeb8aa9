//! Extension filtering for RAW candidates.

use std::collections::BTreeSet;
use std::path::Path;

/// RAW formats accepted when no other extension set is configured
pub const RAW_EXTENSIONS: [&str; 6] = [".cr2", ".nef", ".arw", ".dng", ".orf", ".raf"];

/// Decides which files are candidates for fingerprinting.
///
/// Extensions are stored lowercase with a leading dot and compared against
/// the end of the lowercased file name. An empty set accepts every name.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
    include_hidden: bool,
}

impl ExtensionFilter {
    /// Filter for the default RAW set
    pub fn raw() -> Self {
        Self::with_extensions(RAW_EXTENSIONS)
    }

    /// Filter that accepts every file name
    pub fn accept_all() -> Self {
        Self::with_extensions(Vec::<String>::new())
    }

    /// Filter for a custom extension set. `"nef"` and `".NEF"` are equivalent.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| ext.len() > 1)
            .collect();

        Self {
            extensions,
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether this filter accepts everything
    pub fn accepts_all(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Check a bare file name against the extension set
    pub fn matches_name(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let lower = name.to_lowercase();
        self.extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }

    /// Check if a path should be treated as a candidate
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy();

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        self.matches_name(&name)
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::raw()
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_filter_accepts_every_default_format() {
        let filter = ExtensionFilter::raw();
        for name in ["a.cr2", "b.nef", "c.arw", "d.dng", "e.orf", "f.raf"] {
            assert!(filter.matches_name(name), "{name} should match");
        }
    }

    #[test]
    fn raw_filter_is_case_insensitive() {
        let filter = ExtensionFilter::raw();
        assert!(filter.should_include(Path::new("/card/DCIM/100CANON/IMG_1951.CR2")));
        assert!(filter.should_include(Path::new("/card/DSC_0001.Nef")));
    }

    #[test]
    fn raw_filter_rejects_other_formats() {
        let filter = ExtensionFilter::raw();
        assert!(!filter.matches_name("IMG_1951.jpg"));
        assert!(!filter.matches_name("clip.mp4"));
        assert!(!filter.matches_name("cr2"));
        assert!(!filter.should_include(Path::new("/card/no_extension")));
    }

    #[test]
    fn empty_set_accepts_everything() {
        let filter = ExtensionFilter::accept_all();
        assert!(filter.accepts_all());
        assert!(filter.matches_name("anything.txt"));
        assert!(filter.matches_name("README"));
    }

    #[test]
    fn custom_extensions_are_normalized() {
        let filter = ExtensionFilter::with_extensions(["JPG", ".Jpeg"]);
        assert!(filter.matches_name("IMG_1951.jpg"));
        assert!(filter.matches_name("IMG_1952.JPEG"));
        assert!(!filter.matches_name("IMG_1951.CR2"));
    }

    #[test]
    fn hidden_files_excluded_unless_enabled() {
        let path = Path::new("/card/._IMG_0001.CR2");
        assert!(!ExtensionFilter::raw().should_include(path));
        assert!(ExtensionFilter::raw().with_hidden(true).should_include(path));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_name_is_matched_by_extension() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/card/IMG_\xff.CR2"));

        assert!(ExtensionFilter::raw().should_include(path));
        assert!(!ExtensionFilter::with_extensions(["nef"]).should_include(path));
    }
}
