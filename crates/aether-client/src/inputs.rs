//! Loading input files from disk.

use std::path::Path;

use anyhow::{Context, Result};
use aether_stream::InputUnit;

/// MIME type from a file extension. Unknown extensions are sent as opaque
/// bytes.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Read one input file.
pub fn load_input(path: &Path) -> Result<InputUnit> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read input {}", path.display()))?;
    let filename = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(InputUnit::new(filename, mime_for(path), bytes))
}

/// Read every input, in order.
pub fn load_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<InputUnit>> {
    paths.iter().map(|p| load_input(p.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("a/frame.JPG")), "image/jpeg");
        assert_eq!(mime_for(Path::new("frame.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("frame.png")), "image/png");
        assert_eq!(mime_for(Path::new("scan.bin")), "application/octet-stream");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn loads_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("b_second.png");
        let b = dir.path().join("a_first.jpg");
        std::fs::write(&a, [1, 2]).unwrap();
        std::fs::write(&b, [3]).unwrap();

        let units = load_inputs(&[&a, &b]).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].filename, "b_second.png");
        assert_eq!(units[0].mime, "image/png");
        assert_eq!(units[0].bytes, vec![1, 2]);
        assert_eq!(units[1].filename, "a_first.jpg");
    }

    #[test]
    fn missing_file_names_path() {
        let err = load_input(Path::new("/nonexistent/frame.jpg")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/frame.jpg"));
    }
}
