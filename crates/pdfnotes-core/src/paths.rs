use std::path::{Path, PathBuf};

/// Output path used when none is given: `lecture.pdf` becomes
/// `lecture{suffix}.pdf` next to the input.
pub fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}.pdf", stem, suffix))
}
