use ethereal_core::catalog::{CatalogLoader, ManifestSource};
use ethereal_core::error::CatalogLoadError;

const MANIFEST: &str = r#"{
    "animations": { "aurora": "10_fs", "dunes": null, "tide": "pix-song-4" },
    "credits": {
        "freesound.org/people/someone/sounds": [
            { "credit": "someone", "tracks": ["10_fs"] }
        ]
    }
}"#;

#[tokio::test]
async fn loads_manifest_from_file_in_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.json"), MANIFEST).unwrap();

    let source = ManifestSource::resolve("data.json", dir.path());
    let catalog = CatalogLoader::new(source, false).load().await.unwrap();

    assert_eq!(catalog.animations(), &["aurora", "dunes", "tide"]);
    assert_eq!(catalog.music_for("tide"), Some("pix-song-4"));
    assert_eq!(catalog.credits().len(), 1);
}

#[tokio::test]
async fn shuffled_load_keeps_every_animation() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.json"), MANIFEST).unwrap();

    let loader = CatalogLoader::new(ManifestSource::resolve("data.json", dir.path()), true);
    let catalog = loader.load().await.unwrap();
    let mut names = catalog.animations().to_vec();
    names.sort();
    assert_eq!(names, vec!["aurora", "dunes", "tide"]);
}

#[tokio::test]
async fn missing_manifest_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CatalogLoader::new(ManifestSource::resolve("nope.json", dir.path()), false);
    let err = loader.load().await.unwrap_err();
    assert!(matches!(err, CatalogLoadError::Read { .. }));
    assert!(err.to_string().contains("nope.json"));
}

#[tokio::test]
async fn empty_manifest_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.json"), r#"{"animations": {}}"#).unwrap();
    let loader = CatalogLoader::new(ManifestSource::resolve("data.json", dir.path()), false);
    assert!(matches!(loader.load().await, Err(CatalogLoadError::Empty)));
}
