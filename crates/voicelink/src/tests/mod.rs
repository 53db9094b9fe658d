
use std::{path::PathBuf, process};

#[allow(clippy::unwrap_used)]
pub(crate) fn unique_temp_path(label: &str, extension: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "voicelink-app-test-{label}-{}-{nanos}.{extension}",
        process::id()
    ))
}

/// A stand-in helper that idles until terminated.
#[allow(clippy::unwrap_used)]
pub(crate) fn write_fake_helper(label: &str) -> PathBuf {
    let path = unique_temp_path(label, "sh");
    std::fs::write(&path, "#!/bin/sh\nsleep 30\n").unwrap();
    path
}
