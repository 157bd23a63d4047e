// Player pool loading and sampling.
//
// Reads a CSV with at least Name, Position, OVR and url columns. Only players
// whose OVR falls inside the configured band are kept. The pool is never
// mutated after loading; already-drafted players are excluded per query.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::PoolConfig;
use crate::draft::pick::{PlayerRecord, Position};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

/// One CSV row. Extra columns are ignored by the deserializer.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawPlayerRow {
    Name: String,
    Position: String,
    OVR: f64,
    #[serde(default)]
    url: String,
}

// ---------------------------------------------------------------------------
// PlayerPool
// ---------------------------------------------------------------------------

/// The draftable players, in source-file order.
#[derive(Debug, Clone, Default)]
pub struct PlayerPool {
    players: Vec<PlayerRecord>,
}

impl PlayerPool {
    /// Build a pool directly from records (band filtering is the caller's job).
    pub fn from_players(players: Vec<PlayerRecord>) -> Self {
        PlayerPool { players }
    }

    /// Load the pool from the CSV named in `config`.
    pub fn load(config: &PoolConfig) -> Result<Self, PoolError> {
        Self::load_path(Path::new(&config.csv_path), config.min_ovr, config.max_ovr)
    }

    pub fn load_path(path: &Path, min_ovr: u32, max_ovr: u32) -> Result<Self, PoolError> {
        let path_str = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        let pool = Self::from_reader(file, min_ovr, max_ovr).map_err(|e| PoolError::Csv {
            path: path_str.clone(),
            source: e,
        })?;
        info!(
            "loaded {} draftable players (OVR {}-{}) from {}",
            pool.len(),
            min_ovr,
            max_ovr,
            path_str
        );
        Ok(pool)
    }

    /// Parse CSV from any reader, keeping rows rated `min_ovr..=max_ovr`.
    /// Malformed rows, unknown positions and repeated names are skipped.
    pub fn from_reader<R: Read>(rdr: R, min_ovr: u32, max_ovr: u32) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
        let mut players = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for result in reader.deserialize::<RawPlayerRow>() {
            let raw = match result {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("skipping malformed player row: {}", e);
                    continue;
                }
            };
            let name = raw.Name.trim().to_string();
            if name.is_empty() {
                warn!("skipping player row with empty Name");
                continue;
            }
            if !raw.OVR.is_finite() || raw.OVR < 0.0 {
                warn!("skipping player '{}': invalid OVR {}", name, raw.OVR);
                continue;
            }
            let Some(position) = Position::from_code(&raw.Position) else {
                warn!("skipping player '{}': unknown Position '{}'", name, raw.Position);
                continue;
            };
            let ovr = raw.OVR.round() as u32;
            if ovr < min_ovr || ovr > max_ovr {
                continue;
            }
            if !seen.insert(name.clone()) {
                warn!("duplicate player '{}', keeping the first row", name);
                continue;
            }
            players.push(PlayerRecord {
                name,
                position,
                ovr,
                url: raw.url.trim().to_string(),
            });
        }

        Ok(PlayerPool { players })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    /// Players matching the optional position filter that are not excluded.
    fn eligible<'a>(
        &'a self,
        position: Option<Position>,
        excluded: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a PlayerRecord> + 'a {
        self.players
            .iter()
            .filter(move |p| position.map_or(true, |pos| p.position == pos))
            .filter(move |p| !excluded.contains(&p.name))
    }

    /// Up to `count` distinct players drawn uniformly at random from the
    /// eligible ones. Fewer (possibly none) means the pool is running dry.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        position: Option<Position>,
        count: usize,
        excluded: &HashSet<String>,
        rng: &mut R,
    ) -> Vec<PlayerRecord> {
        let mut chosen: Vec<PlayerRecord> = self
            .eligible(position, excluded)
            .choose_multiple(rng, count)
            .into_iter()
            .cloned()
            .collect();
        // choose_multiple does not randomize order
        chosen.shuffle(rng);
        chosen
    }

    /// How many players are still available for the filter.
    pub fn available(&self, position: Option<Position>, excluded: &HashSet<String>) -> usize {
        self.eligible(position, excluded).count()
    }

    /// The first `limit` players, in file order, not in `excluded`.
    ///
    /// The result borrows only the pool, so `excluded` may be dropped first.
    pub fn unpicked<'a>(
        &'a self,
        excluded: &HashSet<String>,
        limit: usize,
    ) -> Vec<&'a PlayerRecord> {
        self.players
            .iter()
            .filter(|p| !excluded.contains(&p.name))
            .take(limit)
            .collect()
    }
}
