use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::domain::VideoId;
use crate::errors::ResourceError;

// @module: Workspace layout and file helpers

// @const: Caption file name language marker, e.g. "video.en.srt" or "video.ko.auto.vtt"
static CAPTION_LANGUAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.([a-z]{2})(?:\.auto)?\.(?:srt|vtt)$").expect("caption language regex is valid")
});

/// File name of the downloaded media inside a video directory
pub const VIDEO_FILE_NAME: &str = "video.mp4";

// @struct: Directory layout of a pipeline workspace
//
//   downloads/<id>/video.mp4        downloaded media and caption tracks
//   input_subs/<id>.srt             extracted subtitle
//   translated_subs/<id>.<lang>.srt translated subtitle
//   final_videos/<id>_translated.mp4
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    /// Directory holding one video and its caption tracks
    pub fn video_dir(&self, video_id: &VideoId) -> PathBuf {
        self.downloads_dir().join(video_id.as_str())
    }

    pub fn video_file(&self, video_id: &VideoId) -> PathBuf {
        self.video_dir(video_id).join(VIDEO_FILE_NAME)
    }

    pub fn input_subs_dir(&self) -> PathBuf {
        self.root.join("input_subs")
    }

    pub fn input_subtitle(&self, video_id: &VideoId) -> PathBuf {
        self.input_subs_dir().join(format!("{}.srt", video_id))
    }

    pub fn translated_subs_dir(&self) -> PathBuf {
        self.root.join("translated_subs")
    }

    pub fn translated_subtitle(&self, video_id: &VideoId, target_language: &str) -> PathBuf {
        self.translated_subs_dir().join(format!("{}.{}.srt", video_id, target_language))
    }

    pub fn final_videos_dir(&self) -> PathBuf {
        self.root.join("final_videos")
    }

    pub fn final_video(&self, video_id: &VideoId) -> PathBuf {
        self.final_videos_dir().join(format!("{}_translated.mp4", video_id))
    }

    // @creates: All stage directories
    pub fn ensure_all(&self) -> Result<(), ResourceError> {
        for dir in [
            self.downloads_dir(),
            self.input_subs_dir(),
            self.translated_subs_dir(),
            self.final_videos_dir(),
        ] {
            FileManager::ensure_dir(&dir)?;
        }
        Ok(())
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<(), ResourceError> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| ResourceError::io(path, e))?;
        }
        Ok(())
    }

    /// Ensure the parent directory of a file exists
    pub fn ensure_parent<P: AsRef<Path>>(path: P) -> Result<(), ResourceError> {
        match path.as_ref().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::ensure_dir(parent),
            _ => Ok(()),
        }
    }

    /// Write a file through a temporary file in the same directory
    ///
    /// Readers either see the previous content or the complete new content,
    /// never a partial write.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<(), ResourceError> {
        let path = path.as_ref();
        Self::ensure_parent(path)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| ResourceError::io(&dir, e))?;
        temp.write_all(content.as_bytes()).map_err(|e| ResourceError::io(temp.path(), e))?;
        temp.as_file().sync_all().map_err(|e| ResourceError::io(temp.path(), e))?;
        temp.persist(path).map_err(|e| ResourceError::io(path, e.error))?;
        Ok(())
    }

    /// Copy a file, creating the target directory if needed
    pub fn copy_file<P1: AsRef<Path>, P2: AsRef<Path>>(from: P1, to: P2) -> Result<(), ResourceError> {
        let from = from.as_ref();
        let to = to.as_ref();

        if !from.exists() {
            return Err(ResourceError::NotFound { what: "source file", path: from.to_path_buf() });
        }

        Self::ensure_parent(to)?;
        fs::copy(from, to).map_err(|e| ResourceError::io(to, e))?;
        Ok(())
    }

    /// Caption files (`.srt`, `.vtt`) directly inside `dir`, sorted by name
    pub fn find_caption_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, ResourceError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut result = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                ResourceError::io(path, e.into())
            })?;
            let path = entry.path();

            if path.is_file() && is_caption_file(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    // @generates: Output path for a translated subtitle next to its input
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default().to_string_lossy().to_string();
        output_dir.as_ref().join(format!("{}.{}.srt", stem, target_language))
    }
}

/// True for `.srt` and `.vtt` files
pub fn is_caption_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "srt" || ext == "vtt"
        })
        .unwrap_or(false)
}

/// Two-letter language code encoded in a caption file name
pub fn extract_lang_code(file_name: &str) -> Option<String> {
    CAPTION_LANGUAGE_REGEX
        .captures(&file_name.to_lowercase())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// True for auto-generated caption tracks ("video.en.auto.vtt")
pub fn is_auto_caption(file_name: &str) -> bool {
    file_name.to_lowercase().contains(".auto.")
}
