//! Roster Encoder — build the known-identity roster from a directory of
//! reference images.
//!
//! One file yields at most one identity: the filename stem (uppercased)
//! names it, the first detected face supplies its reference embedding.
//! Unreadable files and zero-face images are skipped with a warning.

use crate::engine::FaceEngine;
use crate::matching::{Identity, Roster};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("cannot read roster directory {path}: {source}")]
    DirUnreadable {
        path: String,
        source: std::io::Error,
    },
}

impl Roster {
    /// Encode every image in `dir` into the roster.
    ///
    /// Entries are deliberately processed in file-name order, not raw
    /// `read_dir` order: listing order is platform-dependent, and the
    /// roster only needs a deterministic order for distance tie-breaks.
    /// Only an unreadable directory is fatal; every per-file failure
    /// logs and skips.
    pub fn from_image_dir(dir: &Path, engine: &mut dyn FaceEngine) -> Result<Roster, RosterError> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|source| RosterError::DirUnreadable {
                path: dir.display().to_string(),
                source,
            })?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        entries.sort();

        let mut identities = Vec::new();

        for path in &entries {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!(path = %path.display(), "skipping roster file with unusable name");
                continue;
            };
            let name = stem.to_uppercase();

            let img = match image::open(path) {
                Ok(img) => img.to_rgb8(),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "could not read roster image");
                    continue;
                }
            };

            let (width, height) = img.dimensions();
            match engine.embed_only(img.as_raw(), width, height) {
                Ok(Some(embedding)) => {
                    tracing::info!(name = %name, "roster identity encoded");
                    identities.push(Identity { name, embedding });
                }
                Ok(None) => {
                    tracing::warn!(path = %path.display(), "no face found in roster image");
                }
                Err(err) => {
                    tracing::error!(path = %path.display(), error = %err, "roster image encoding failed");
                }
            }
        }

        tracing::info!(
            identities = identities.len(),
            files = entries.len(),
            dir = %dir.display(),
            "roster encoding complete"
        );

        Ok(Roster::new(identities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use crate::types::{DetectedFace, Embedding};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    /// Engine fake keyed on the image's top-left red channel:
    /// r == 0 means "no face", anything else embeds as [r/255, 0, 0].
    struct PixelKeyedEngine;

    impl FaceEngine for PixelKeyedEngine {
        fn detect_and_embed(
            &mut self,
            _rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<DetectedFace>, EngineError> {
            unimplemented!("roster encoding uses embed_only")
        }

        fn embed_only(
            &mut self,
            rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Option<Embedding>, EngineError> {
            let r = rgb[0];
            if r == 0 {
                Ok(None)
            } else {
                Ok(Some(Embedding::new(vec![r as f32 / 255.0, 0.0, 0.0])))
            }
        }
    }

    fn write_png(dir: &Path, name: &str, red: u8) {
        let img = RgbImage::from_pixel(4, 4, Rgb([red, 10, 10]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_identities_match_images_with_faces() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "alice.png", 200);
        write_png(dir.path(), "bob.png", 100);
        write_png(dir.path(), "empty_room.png", 0); // no face

        let roster = Roster::from_image_dir(dir.path(), &mut PixelKeyedEngine).unwrap();
        assert_eq!(roster.len(), 2);

        let names: Vec<&str> = roster.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, vec!["ALICE", "BOB"]);
    }

    #[test]
    fn test_name_is_uppercased_stem() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "Jane Doe.png", 50);

        let roster = Roster::from_image_dir(dir.path(), &mut PixelKeyedEngine).unwrap();
        assert_eq!(roster.iter().next().unwrap().name, "JANE DOE");
    }

    #[test]
    fn test_unparseable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "alice.png", 200);
        std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

        let roster = Roster::from_image_dir(dir.path(), &mut PixelKeyedEngine).unwrap();
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_empty_directory_yields_empty_roster() {
        let dir = TempDir::new().unwrap();
        let roster = Roster::from_image_dir(dir.path(), &mut PixelKeyedEngine).unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(Roster::from_image_dir(&missing, &mut PixelKeyedEngine).is_err());
    }

    #[test]
    fn test_order_is_by_file_name() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "zed.png", 30);
        write_png(dir.path(), "amy.png", 40);

        let roster = Roster::from_image_dir(dir.path(), &mut PixelKeyedEngine).unwrap();
        let names: Vec<&str> = roster.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, vec!["AMY", "ZED"]);
    }
}
