// Submission path resolver: turns whatever path the user typed into the
// path below the exercise directory that the service expects.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Suffixes of test files per language. Submitting one of these is
/// almost always a mistake.
pub const TEST_SUFFIXES: &[(&str, &str)] = &[
    ("ruby", "_test.rb"),
    ("js", ".spec.js"),
    ("elixir", "_test.exs"),
    ("clojure", "_test.clj"),
    ("python", "_test.py"),
    ("go", "_test.go"),
    ("haskell", "_test.hs"),
    ("cpp", "_test.cpp"),
];

/// Resolves user paths against one exercise root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    test_suffixes: Vec<String>,
}

impl PathResolver {
    pub fn new(exercise_root: &Path) -> Self {
        // Symlinks in the root must resolve the same way as in user paths.
        let root = exercise_root
            .canonicalize()
            .unwrap_or_else(|_| exercise_root.to_path_buf());
        PathResolver {
            root,
            test_suffixes: TEST_SUFFIXES.iter().map(|(_, s)| s.to_string()).collect(),
        }
    }

    pub fn with_test_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `user_path` to `(absolute path, path relative to the root)`.
    pub fn resolve(&self, user_path: &Path) -> Result<(PathBuf, String)> {
        let absolute = user_path.canonicalize().map_err(|source| Error::NotFound {
            path: user_path.to_path_buf(),
            source,
        })?;

        let relative = match absolute.strip_prefix(self.root()) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative,
            _ => {
                return Err(Error::OutsideProject {
                    path: absolute.clone(),
                    root: self.root().to_path_buf(),
                })
            }
        };
        let relative = relative
            .to_str()
            .ok_or_else(|| Error::NonUtf8Path(absolute.clone()))?
            .to_string();

        if self.is_test_file(&relative) {
            return Err(Error::IsTestFile(relative));
        }
        log::debug!("resolved {} to {}", user_path.display(), relative);
        Ok((absolute, relative))
    }

    /// A name is a test file when it ends with one of the suffixes and has
    /// something in front of it.
    pub fn is_test_file(&self, relative: &str) -> bool {
        self.test_suffixes
            .iter()
            .any(|suffix| relative.len() > suffix.len() && relative.ends_with(suffix.as_str()))
    }
}

/// Relative path of `user_path` below `exercise_root`, using the default
/// test suffixes.
pub fn resolve(user_path: &Path, exercise_root: &Path) -> Result<String> {
    PathResolver::new(exercise_root)
        .resolve(user_path)
        .map(|(_, relative)| relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new(Path::new("/nonexistent/exercism"))
    }

    #[test]
    fn flags_test_files_for_every_language() {
        let r = resolver();
        for name in [
            "ruby/bob/bob_test.rb",
            "javascript/bob/bob.spec.js",
            "elixir/bob/bob_test.exs",
            "clojure/bob/bob_test.clj",
            "python/bob/bob_test.py",
            "go/leap/leap_test.go",
            "haskell/bob/bob_test.hs",
            "cpp/bob/bob_test.cpp",
        ] {
            assert!(r.is_test_file(name), "{} should be a test file", name);
        }
    }

    #[test]
    fn solutions_are_not_test_files() {
        let r = resolver();
        assert!(!r.is_test_file("python/bob/bob.py"));
        assert!(!r.is_test_file("go/leap/leap.go"));
        assert!(!r.is_test_file("python/bob/my_test.py_backup"));
    }

    #[test]
    fn bare_suffix_is_not_a_test_file() {
        assert!(!resolver().is_test_file("_test.py"));
        assert!(resolver().is_test_file("python/_test.py"));
    }

    #[test]
    fn custom_suffixes_replace_defaults() {
        let r = resolver().with_test_suffixes(["_spec.rs"]);
        assert!(r.is_test_file("rust/bob/bob_spec.rs"));
        assert!(!r.is_test_file("python/bob/bob_test.py"));
    }
}
