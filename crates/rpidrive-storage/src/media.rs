//! Extension based media classification.

use serde::{Deserialize, Serialize};

use crate::naming::split_extension;

/// Coarse media family of a file, used for icons and thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Picture,
    Music,
    Movie,
    Code,
    Compressed,
    Executable,
    Library,
    Book,
    Generic,
}

const PICTURE: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "ico", "svg", "heic", "avif",
];
const MUSIC: &[&str] = &["mp3", "flac", "wav", "ogg", "oga", "m4a", "aac", "opus", "wma"];
const MOVIE: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "wmv", "flv", "m4v", "mpg", "mpeg"];
const CODE: &[&str] = &[
    "rs", "py", "js", "ts", "jsx", "tsx", "c", "h", "cpp", "hpp", "cc", "java", "kt", "go", "rb",
    "php", "cs", "swift", "sh", "bash", "html", "css", "scss", "json", "yaml", "yml", "toml",
    "xml", "sql", "md", "lua",
];
const COMPRESSED: &[&str] = &["zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz", "zst"];
const EXECUTABLE: &[&str] = &["exe", "msi", "bin", "run", "appimage", "apk", "deb", "rpm"];
const LIBRARY: &[&str] = &["dll", "so", "dylib", "a", "lib", "jar"];
const BOOK: &[&str] = &["pdf", "epub", "mobi", "azw", "azw3", "djvu", "cbz", "cbr"];

impl MediaKind {
    /// Classify a file by the extension of `name`.
    pub fn classify(name: &str) -> Self {
        let (_, ext) = split_extension(name);
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() {
            return Self::Generic;
        }
        let table: [(&[&str], MediaKind); 8] = [
            (PICTURE, Self::Picture),
            (MUSIC, Self::Music),
            (MOVIE, Self::Movie),
            (CODE, Self::Code),
            (COMPRESSED, Self::Compressed),
            (EXECUTABLE, Self::Executable),
            (LIBRARY, Self::Library),
            (BOOK, Self::Book),
        ];
        table
            .iter()
            .find(|(exts, _)| exts.contains(&ext.as_str()))
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Generic)
    }

    /// Whether thumbnails can be produced for this kind.
    pub fn is_picture(&self) -> bool {
        matches!(self, Self::Picture)
    }

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Picture => "picture",
            Self::Music => "music",
            Self::Movie => "movie",
            Self::Code => "code",
            Self::Compressed => "compressed",
            Self::Executable => "executable",
            Self::Library => "library",
            Self::Book => "book",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorthand for [`MediaKind::classify`].
pub fn classify(name: &str) -> MediaKind {
    MediaKind::classify(name)
}

/// MIME type for `name`, `application/octet-stream` when unknown.
pub fn media_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
