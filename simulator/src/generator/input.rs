use anyhow::{ensure, Context};
use std::fs;
use std::path::Path;
use trajcore::DetectionRun;

/// Loads a recorded detector run: `{"centroids": [[x, y], ...], "radii": [...]}`.
pub fn load_detection_run<P: AsRef<Path>>(path: P) -> anyhow::Result<DetectionRun> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading detections {}", path_ref.display()))?;
    let run: DetectionRun = serde_json::from_str(&contents)
        .with_context(|| format!("parsing detections {}", path_ref.display()))?;
    ensure!(
        !run.is_empty(),
        "no projectile detected in {}",
        path_ref.display()
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_recorded_run() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"{"centroids": [[10.0, 200.0], [20.0, 180.0]], "radii": [6.0, 6.5]}"#)
            .unwrap();
        let path = temp.into_temp_path();
        let run = load_detection_run(&path).unwrap();
        assert_eq!(run.len(), 2);
        assert_eq!(run.radii(), &[6.0, 6.5]);
    }

    #[test]
    fn empty_run_is_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(br#"{"centroids": [], "radii": []}"#).unwrap();
        let path = temp.into_temp_path();
        let err = load_detection_run(&path).unwrap_err();
        assert!(err.to_string().contains("no projectile detected"));
    }
}
