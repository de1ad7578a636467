//! Persistent user profile: the working ticker list plus named portfolios.

use crate::error::{CommandError, ProfileError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_PORTFOLIO: &str = "default";
const STARTER_TICKERS: [&str; 4] = ["GOOG", "AAPL", "AMZN", "MSFT"];

/// A named, saved list of tickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub tickers: Vec<String>,
}

/// Saved configuration for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The list that drives fetches
    #[serde(default)]
    tickers: Vec<String>,
    /// Saved portfolios by name
    #[serde(default)]
    portfolios: BTreeMap<String, Portfolio>,
    #[serde(skip)]
    path: PathBuf,
}

impl Profile {
    pub fn new(path: impl Into<PathBuf>, tickers: Vec<String>) -> Self {
        Self {
            tickers,
            portfolios: BTreeMap::new(),
            path: path.into(),
        }
    }

    /// Default profile location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tickerdash").join("profile.json"))
    }

    /// Load the profile at `path`, creating it with starter tickers if absent.
    pub fn load_or_create(path: &Path) -> Result<Self, ProfileError> {
        if !path.exists() {
            let profile = Self::starter(path);
            profile.save()?;
            info!(path = %path.display(), "created starter profile");
            return Ok(profile);
        }

        let content = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut profile: Profile =
            serde_json::from_str(&content).map_err(|source| ProfileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        profile.path = path.to_path_buf();

        debug!(
            path = %path.display(),
            tickers = profile.tickers.len(),
            portfolios = profile.portfolios.len(),
            "loaded profile"
        );
        Ok(profile)
    }

    fn starter(path: &Path) -> Self {
        let tickers: Vec<String> = STARTER_TICKERS.iter().map(|t| t.to_string()).collect();
        let mut profile = Self::new(path, tickers.clone());
        profile
            .portfolios
            .insert(DEFAULT_PORTFOLIO.to_string(), Portfolio { tickers });
        profile
    }

    /// Write the whole profile back to its file.
    pub fn save(&self) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ProfileError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&self.path, content).map_err(|source| ProfileError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "saved profile");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Replace the working list, e.g. with a freshly sorted order.
    pub fn set_tickers(&mut self, tickers: Vec<String>) {
        self.tickers = tickers;
    }

    /// Append tickers that are not already present.
    pub fn add_tickers<S: AsRef<str>>(&mut self, tickers: &[S]) {
        for ticker in tickers {
            let ticker = ticker.as_ref().to_uppercase();
            if self.ticker_index(&ticker).is_none() {
                self.tickers.push(ticker);
            }
        }
    }

    /// Remove the first occurrence of `ticker`. Returns whether anything was removed.
    pub fn remove_ticker(&mut self, ticker: &str) -> bool {
        match self.ticker_index(ticker) {
            Some(index) => {
                self.tickers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn ticker_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    /// Snapshot the working list under `name`, overwriting any previous entry.
    pub fn save_portfolio(&mut self, name: &str) {
        self.portfolios.insert(
            name.to_string(),
            Portfolio {
                tickers: self.tickers.clone(),
            },
        );
    }

    /// Replace the working list with a copy of the named portfolio.
    pub fn load_portfolio(&mut self, name: &str) -> Result<(), CommandError> {
        let portfolio = self
            .portfolios
            .get(name)
            .ok_or_else(|| CommandError::PortfolioNotFound(name.to_string()))?;
        self.tickers = portfolio.tickers.clone();
        Ok(())
    }

    pub fn clear_tickers(&mut self) {
        self.tickers.clear();
    }

    pub fn portfolio_names(&self) -> Vec<&str> {
        self.portfolios.keys().map(String::as_str).collect()
    }
}
