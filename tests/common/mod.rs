use quiztrack::page::{DomSnapshot, ElementSpec};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Two-slide quiz at `/lead2` with the first slide active
#[allow(dead_code)]
pub fn two_slide_page() -> DomSnapshot {
    let slide = |n: usize, title: &str, active: bool| {
        let classes: &[&str] = if active { &["slide", "active"] } else { &["slide"] };
        ElementSpec::new("section")
            .with_id(&format!("slide-{}", n))
            .with_classes(classes)
            .with_rect(((n - 1) * 800) as f64, 1200.0, 800.0)
            .with_child(ElementSpec::new("h2").with_text(title))
            .with_child(
                ElementSpec::new("button")
                    .with_id(&format!("next-{}", n))
                    .with_classes(&["btn-next"]),
            )
    };

    DomSnapshot::new(
        "https://quiz.example.com/lead2",
        "Mozilla/5.0 test",
        800.0,
        vec![slide(1, "How old are you?", true), slide(2, "What is your goal?", false)],
    )
    .expect("valid page")
}
