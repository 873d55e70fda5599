use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::de::{self, Deserializer};
use serde::Deserialize;

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Settings consumed by the image player itself.
    pub image_player: ImagePlayerOptions,
    /// Settings shared with the surrounding looper.
    pub looper: LooperOptions,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.image_player.duration > 0,
            "image-player.duration must be greater than zero"
        );
        ensure!(
            !self.image_player.extensions.is_empty(),
            "image-player.extensions must list at least one extension"
        );
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ImagePlayerOptions {
    /// Accepted file extensions, lowercase without the dot.
    #[serde(deserialize_with = "deserialize_extensions")]
    pub extensions: Vec<String>,
    /// Seconds each loop of an image stays on screen.
    pub duration: u64,
    /// Decoded image cache budget in megabytes.
    pub cache_size_limit: u64,
    /// Fit images to the screen.
    pub scale: bool,
    /// Center images along the axis they do not fill.
    pub center: bool,
}

impl ImagePlayerOptions {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }

    pub fn cache_size_limit_bytes(&self) -> u64 {
        self.cache_size_limit.saturating_mul(BYTES_PER_MEGABYTE)
    }
}

impl Default for ImagePlayerOptions {
    fn default() -> Self {
        Self {
            extensions: parse_extensions("jpg, jpeg, png, gif, webp"),
            duration: 5,
            cache_size_limit: 50,
            scale: true,
            center: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LooperOptions {
    /// Screen fill colour behind and between images.
    #[serde(deserialize_with = "deserialize_rgb")]
    pub bgcolor: [u8; 3],
    /// Optional image drawn centered over `bgcolor`.
    pub bgimage: Option<PathBuf>,
    /// Seconds of background-only screen between images.
    pub wait_time: u64,
    /// Directory scanned for images.
    pub path: PathBuf,
    /// Optional deterministic seed for shuffling the playlist.
    pub shuffle_seed: Option<u64>,
}

impl LooperOptions {
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time)
    }
}

impl Default for LooperOptions {
    fn default() -> Self {
        Self {
            bgcolor: [0, 0, 0],
            bgimage: None,
            wait_time: 0,
            path: PathBuf::from("."),
            shuffle_seed: None,
        }
    }
}

/// Split a comma-separated extension list, dropping dots, blanks and case.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    normalize_extensions(raw.split(','))
}

fn normalize_extensions<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|e| e.as_ref().replace('.', "").trim().to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Parse `"r, g, b"` into a colour.
pub fn parse_rgb(raw: &str) -> Result<[u8; 3]> {
    let parts = raw
        .split(',')
        .map(|c| {
            c.trim()
                .parse::<u8>()
                .with_context(|| format!("invalid colour component '{}'", c.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    match parts.as_slice() {
        [r, g, b] => Ok([*r, *g, *b]),
        _ => anyhow::bail!("expected three colour components, got {}", parts.len()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrCsv<T> {
    List(T),
    Csv(String),
}

fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ListOrCsv::<Vec<String>>::deserialize(deserializer)? {
        ListOrCsv::List(items) => normalize_extensions(items),
        ListOrCsv::Csv(raw) => parse_extensions(&raw),
    })
}

fn deserialize_rgb<'de, D>(deserializer: D) -> Result<[u8; 3], D::Error>
where
    D: Deserializer<'de>,
{
    match ListOrCsv::<[u8; 3]>::deserialize(deserializer)? {
        ListOrCsv::List(rgb) => Ok(rgb),
        ListOrCsv::Csv(raw) => parse_rgb(&raw).map_err(|e| de::Error::custom(format!("{e:#}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_strip_dots_and_spaces() {
        assert_eq!(parse_extensions(".JPG, png,,.gif "), ["jpg", "png", "gif"]);
    }

    #[test]
    fn rgb_parses_csv() {
        assert_eq!(parse_rgb("10, 20,30").unwrap(), [10, 20, 30]);
        assert!(parse_rgb("1,2").is_err());
        assert!(parse_rgb("1,2,300").is_err());
    }

    #[test]
    fn megabytes_convert_to_bytes() {
        let opts = ImagePlayerOptions {
            cache_size_limit: 3,
            ..ImagePlayerOptions::default()
        };
        assert_eq!(opts.cache_size_limit_bytes(), 3 * 1024 * 1024);
    }
}
