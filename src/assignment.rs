// Local save engine: materialises remote assignments under the exercise
// directory without ever touching a file that already exists.

use std::fmt;
use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// One exercise as the service describes it.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Assignment {
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub files: Files,
    #[serde(rename = "fresh", default)]
    pub is_fresh: bool,
}

/// Relative path → content pairs, in the order the service sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Files(pub Vec<(String, String)>);

impl Files {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, text)| (name.as_str(), text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Files {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct FilesVisitor;

        impl<'de> Visitor<'de> for FilesVisitor {
            type Value = Files;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of relative paths to file contents")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Files, A::Error> {
                let mut files = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    files.push(entry);
                }
                Ok(Files(files))
            }

            fn visit_unit<E>(self) -> std::result::Result<Files, E> {
                Ok(Files::default())
            }
        }

        deserializer.deserialize_any(FilesVisitor)
    }
}

/// How a save changed the local tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// The track/slug directory did not exist before saving.
    New,
    /// The directory existed and at least one missing file was written.
    Updated,
    /// Every file was already on disk; nothing was written.
    Unchanged,
}

impl Assignment {
    /// `{root}/{track}/{slug}`. Track and slug must each be a single plain
    /// path segment.
    pub fn dir(&self, exercise_root: &Path) -> Result<PathBuf> {
        Ok(exercise_root
            .join(safe_segment(&self.track)?)
            .join(safe_segment(&self.slug)?))
    }

    /// Write every file that does not exist yet. Existing files are left
    /// alone whatever their content. The first failure aborts the rest of
    /// this assignment; files written before it stay.
    pub fn save(&self, exercise_root: &Path) -> Result<SaveResult> {
        let root = self.dir(exercise_root)?;
        let existed = root
            .try_exists()
            .map_err(|source| Error::Directory {
                path: root.clone(),
                source,
            })?;

        let mut written = 0usize;
        for (name, text) in self.files.iter() {
            let relative = safe_relative(name)?;
            let file = root.join(relative);
            if let Some(parent) = file.parent() {
                create_dirs(parent)?;
            }
            if write_new(&file, text.as_bytes())? {
                log::debug!("wrote {}", file.display());
                written += 1;
            } else {
                log::trace!("kept existing {}", file.display());
            }
        }

        let result = if !existed {
            SaveResult::New
        } else if written > 0 {
            SaveResult::Updated
        } else {
            SaveResult::Unchanged
        };
        log::info!(
            "{}/{}: {:?} ({} of {} files written)",
            self.track,
            self.slug,
            result,
            written,
            self.files.len()
        );
        Ok(result)
    }

    /// One line for the fetch/restore listing, e.g. `* ruby - bob`.
    pub fn summary_line(&self, result: SaveResult) -> String {
        let mut line = format!("{} {} - {}", self.marker(result), self.track, self.slug);
        if result == SaveResult::Updated {
            line.push_str(" (updated)");
        }
        line
    }

    /// `*` for assignments that are fresh on the server or new locally.
    pub fn marker(&self, result: SaveResult) -> char {
        if self.is_fresh || result == SaveResult::New {
            '*'
        } else {
            ' '
        }
    }
}

/// Save each assignment in turn. A failure is recorded against its
/// assignment and does not stop the ones after it.
pub fn save_all<'a>(
    exercise_root: &Path,
    assignments: &'a [Assignment],
) -> Vec<(&'a Assignment, Result<SaveResult>)> {
    assignments
        .iter()
        .map(|assignment| (assignment, assignment.save(exercise_root)))
        .collect()
}

/// Counts of save outcomes over one fetch or restore.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, result: &Result<SaveResult>) {
        match result {
            Ok(SaveResult::New) => self.new += 1,
            Ok(SaveResult::Updated) => self.updated += 1,
            Ok(SaveResult::Unchanged) => self.unchanged += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "new: {}, updated: {}, unchanged: {}",
            self.new, self.updated, self.unchanged
        )?;
        if self.failed > 0 {
            write!(f, ", failed: {}", self.failed)?;
        }
        Ok(())
    }
}

/// Reject names that would land outside the assignment directory.
fn safe_relative(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let escapes = name.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::UnsafePath(name.to_string()));
    }
    Ok(path)
}

/// Accept exactly one normal component, e.g. `python` but not `..`,
/// `/tmp` or `a/b`.
fn safe_segment(value: &str) -> Result<&Path> {
    let path = Path::new(value);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => Err(Error::UnsafePath(value.to_string())),
    }
}

fn create_dirs(dir: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir).map_err(|source| Error::Directory {
        path: dir.to_path_buf(),
        source,
    })
}

/// Create `file` with `content`. Returns `false` without writing when the
/// file is already there.
fn write_new(file: &Path, content: &[u8]) -> Result<bool> {
    let to_write_err = |source| Error::Write {
        path: file.to_path_buf(),
        source,
    };
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut handle = match options.open(file) {
        Ok(handle) => handle,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(to_write_err(e)),
    };
    handle.write_all(content).map_err(to_write_err)?;
    handle.sync_all().map_err(to_write_err)?;
    Ok(true)
}
