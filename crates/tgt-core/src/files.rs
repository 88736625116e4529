use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Longest filename we ever synthesize (caption-derived names can be long).
pub const MAX_FILENAME_LEN: usize = 200;

/// Recursively collect files whose extension is in `formats`. A `*` entry
/// accepts any extension. A plain file path is returned as-is when it
/// matches.
pub fn search_files(path: &Path, formats: &[String]) -> Vec<PathBuf> {
    let any = formats.iter().any(|f| f == "*");
    let matches = |p: &Path| -> bool {
        if any {
            return true;
        }
        let Some(ext) = p.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        formats.iter().any(|f| f.eq_ignore_ascii_case(ext))
    };

    if path.is_file() {
        if matches(path) {
            return vec![path.to_path_buf()];
        }
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| matches(p))
        .collect();
    files.sort();
    files
}

/// Replace path separators and characters the target filesystem may reject,
/// then cap the length. Falls back to `file` when nothing survives.
pub fn sanitize_filename(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len());
    for ch in candidate.chars() {
        let replaced = matches!(
            ch,
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'
        ) || ch.is_control();
        out.push(if replaced { '_' } else { ch });
    }

    let trimmed = out.trim().trim_matches('.');
    let capped: String = trimmed.chars().take(MAX_FILENAME_LEN).collect();
    if capped.is_empty() {
        "file".to_string()
    } else {
        capped
    }
}

/// Guess a file extension (with leading dot) from the original filename
/// first, the mime type second, `.unknown` last.
pub fn guess_extension(file_name: Option<&str>, mime_type: Option<&str>) -> String {
    if let Some(name) = file_name {
        if let Some((_, ext)) = name.rsplit_once('.') {
            if !ext.is_empty() {
                return format!(".{ext}");
            }
        }
    }

    if let Some(mime) = mime_type {
        if let Some(exts) = mime_guess::get_mime_extensions_str(mime) {
            if let Some(ext) = exts.first() {
                return format!(".{ext}");
            }
        }
    }

    ".unknown".to_string()
}

/// Human-readable byte count for log lines.
pub fn format_size(size_in_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = size_in_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.2} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tmp_dir(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("{prefix}-{}-{ts}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn search_files_filters_by_extension_recursively() {
        let root = tmp_dir("tgt-search");
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::write(root.join("a.mp4"), b"x").unwrap();
        fs::write(root.join("b.txt"), b"x").unwrap();
        fs::write(root.join("nested/c.MP4"), b"x").unwrap();

        let found = search_files(&root, &["mp4".to_string()]);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p
            .extension()
            .unwrap()
            .to_string_lossy()
            .eq_ignore_ascii_case("mp4")));

        let all = search_files(&root, &["*".to_string()]);
        assert_eq!(all.len(), 3);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn search_files_accepts_single_matching_file() {
        let root = tmp_dir("tgt-search-one");
        let file = root.join("song.mp3");
        fs::write(&file, b"x").unwrap();

        assert_eq!(search_files(&file, &["mp3".to_string()]), vec![file.clone()]);
        assert!(search_files(&file, &["ogg".to_string()]).is_empty());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn sanitize_replaces_separators_and_caps_length() {
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("  spaced name.mp4 "), "spaced name.mp4");
        assert_eq!(sanitize_filename(""), "file");

        let long = "x".repeat(MAX_FILENAME_LEN + 50);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_FILENAME_LEN);
    }

    #[test]
    fn extension_prefers_filename_then_mime_then_unknown() {
        assert_eq!(guess_extension(Some("movie.mkv"), Some("video/mp4")), ".mkv");
        assert_eq!(guess_extension(Some("noext"), Some("image/png")), ".png");
        assert_eq!(guess_extension(None, Some("image/png")), ".png");
        assert_eq!(guess_extension(None, Some("application/x-nonsense")), ".unknown");
        assert_eq!(guess_extension(None, None), ".unknown");
    }

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(512), "512.00 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
