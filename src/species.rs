use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::BotError;
use crate::vision::sprite::SpriteKind;

/// One row of the national dex table.
#[derive(Debug, Clone, Deserialize)]
pub struct DexEntry {
    pub name: String,
    pub number: u16,
}

/// Lookup table from species name to national dex number, loaded from a
/// JSON asset.
#[derive(Debug, Clone)]
pub struct Dex {
    entries: Vec<DexEntry>,
}

impl Dex {
    pub fn load(path: &Path) -> Result<Self, BotError> {
        let raw = fs::read_to_string(path).map_err(|e| BotError::DexRead(path.to_path_buf(), e))?;
        let entries: Vec<DexEntry> =
            serde_json::from_str(&raw).map_err(|e| BotError::DexParse(path.to_path_buf(), e))?;
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<DexEntry>) -> Self {
        Self { entries }
    }

    pub fn number_of(&self, name: &str) -> Result<u16, BotError> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.number)
            .ok_or_else(|| BotError::UnknownSpecies(name.to_string()))
    }

    /// Resolve a species into its dex number and reference sprite paths
    /// for the given game.
    pub fn resolve(&self, name: &str, game: &str, sprites_dir: &Path) -> Result<Species, BotError> {
        let number = self.number_of(name)?;
        Ok(Species::new(name, number, game, sprites_dir))
    }
}

/// A species with its two reference sprites resolved. Immutable once built.
#[derive(Debug, Clone)]
pub struct Species {
    pub name: String,
    pub number: u16,
    normal_sprite: PathBuf,
    shiny_sprite: PathBuf,
}

impl Species {
    pub fn new(name: &str, number: u16, game: &str, sprites_dir: &Path) -> Self {
        let name = name.to_uppercase();
        let normal_sprite = sprite_path(sprites_dir, game, &name, number, SpriteKind::Normal);
        let shiny_sprite = sprite_path(sprites_dir, game, &name, number, SpriteKind::Shiny);
        debug!(%name, number, "resolved species");
        Self {
            name,
            number,
            normal_sprite,
            shiny_sprite,
        }
    }

    pub fn sprite_path(&self, kind: SpriteKind) -> &Path {
        match kind {
            SpriteKind::Normal => &self.normal_sprite,
            SpriteKind::Shiny => &self.shiny_sprite,
        }
    }
}

fn sprite_path(dir: &Path, game: &str, name: &str, number: u16, kind: SpriteKind) -> PathBuf {
    dir.join(game.to_lowercase())
        .join(kind.to_string())
        .join(format!("{number:03}_{}.png", sprite_slug(name)))
}

/// Sprite files are named with a lowercased slug: spaces become dashes,
/// periods and apostrophes are dropped.
fn sprite_slug(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .replace(['.', '\''], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dex() -> Dex {
        Dex::from_entries(vec![
            DexEntry {
                name: "Suicune".to_string(),
                number: 245,
            },
            DexEntry {
                name: "Ho-Oh".to_string(),
                number: 250,
            },
            DexEntry {
                name: "Mr. Mime".to_string(),
                number: 122,
            },
        ])
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(dex().number_of("SUICUNE").unwrap(), 245);
        assert_eq!(dex().number_of("suicune").unwrap(), 245);
    }

    #[test]
    fn unknown_species_is_an_error() {
        assert!(matches!(
            dex().number_of("MISSINGNO"),
            Err(BotError::UnknownSpecies(_))
        ));
    }

    #[test]
    fn sprite_paths_follow_the_asset_scheme() {
        let species = dex()
            .resolve("Mr. Mime", "Crystal", Path::new("assets/sprites"))
            .unwrap();
        assert_eq!(
            species.sprite_path(SpriteKind::Shiny),
            Path::new("assets/sprites/crystal/shiny/122_mr-mime.png")
        );
        assert_eq!(
            species.sprite_path(SpriteKind::Normal),
            Path::new("assets/sprites/crystal/normal/122_mr-mime.png")
        );
    }
}
