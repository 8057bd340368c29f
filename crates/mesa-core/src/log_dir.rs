//! Access to a whole MESA LOGS directory
//!
//! Links the history file to profile files through profiles.index, and
//! optionally memoizes profiles so repeated access does not re-read them.

use crate::config::{LogDirConfig, ReadOptions};
use crate::index::ProfileIndex;
use crate::table::MesaData;
use crate::types::{MesaError, Result, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// History, profile index and (memoized) profiles of one run
#[derive(Debug)]
pub struct LogDir {
    config: LogDirConfig,
    history: MesaData,
    index: ProfileIndex,
    profiles: HashMap<i64, Arc<MesaData>>,
}

fn require_file(path: PathBuf, log_path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        let reason = format!("not found in {}", log_path.display());
        Err(MesaError::BadPath { path, reason })
    }
}

impl LogDir {
    /// Open a directory with default file names
    pub fn open<P: AsRef<Path>>(log_path: P) -> Result<Self> {
        Self::open_with(LogDirConfig::new(log_path))
    }

    /// Open a directory described by `config`.
    ///
    /// The directory, history file and index file must all exist; nothing is
    /// parsed until they do.
    pub fn open_with(config: LogDirConfig) -> Result<Self> {
        if !config.log_path.is_dir() {
            return Err(MesaError::BadPath {
                path: config.log_path.clone(),
                reason: "not a valid directory".into(),
            });
        }
        let history_path = require_file(config.history_path(), &config.log_path)?;
        let index_path = require_file(config.index_path(), &config.log_path)?;

        let (history, index) = Self::read_parts(&config, &history_path, &index_path)?;
        Ok(Self {
            config,
            history,
            index,
            profiles: HashMap::new(),
        })
    }

    #[instrument(skip_all, fields(log_path = %config.log_path.display()))]
    fn read_parts(
        config: &LogDirConfig,
        history_path: &Path,
        index_path: &Path,
    ) -> Result<(MesaData, ProfileIndex)> {
        let options = ReadOptions::default().with_layout(config.log_layout);
        let history = MesaData::open_with(history_path, &options)?;
        let index = ProfileIndex::open_with(index_path, config.index_layout.clone())?;
        info!(
            models = history.num_rows(),
            profiles = index.len(),
            "Log directory loaded"
        );
        Ok((history, index))
    }

    /// Re-read history and index, dropping every memoized profile
    pub fn read_logs(&mut self) -> Result<()> {
        let (history, index) = Self::read_parts(
            &self.config,
            &self.config.history_path(),
            &self.config.index_path(),
        )?;
        self.history = history;
        self.index = index;
        self.profiles.clear();
        Ok(())
    }

    pub fn config(&self) -> &LogDirConfig {
        &self.config
    }

    pub fn log_path(&self) -> &Path {
        &self.config.log_path
    }

    pub fn history(&self) -> &MesaData {
        &self.history
    }

    pub fn index(&self) -> &ProfileIndex {
        &self.index
    }

    /// Model numbers that have profiles, ascending
    pub fn model_numbers(&self) -> Vec<i64> {
        self.index.model_numbers()
    }

    /// Profile numbers in order of their model numbers
    pub fn profile_numbers(&self) -> Vec<i64> {
        self.index.profile_numbers()
    }

    pub fn memoize_profiles(&self) -> bool {
        self.config.memoize_profiles
    }

    /// Start or stop memoizing. Already memoized profiles are kept.
    pub fn set_memoize_profiles(&mut self, memoize: bool) {
        self.config.memoize_profiles = memoize;
    }

    pub fn cached_profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn clear_profile_cache(&mut self) {
        self.profiles.clear();
    }

    pub fn have_profile_with_model_number(&self, m_num: i64) -> bool {
        self.index.have_profile_with_model_number(m_num)
    }

    pub fn have_profile_with_profile_number(&self, p_num: i64) -> bool {
        self.index.have_profile_with_profile_number(p_num)
    }

    pub fn profile_with_model_number(&self, m_num: i64) -> Result<i64> {
        self.index.profile_with_model_number(m_num)
    }

    pub fn model_with_profile_number(&self, p_num: i64) -> Result<i64> {
        self.index.model_with_profile_number(p_num)
    }

    /// Path of the profile file with number `profile_number`
    pub fn profile_path(&self, profile_number: i64) -> PathBuf {
        self.config.profile_path(profile_number)
    }

    /// Profile number that `profile_data` would read for these arguments
    pub fn profile_number_for(
        &self,
        model_number: Option<i64>,
        profile_number: Option<i64>,
    ) -> Result<i64> {
        match (model_number, profile_number) {
            (Some(m_num), _) => self.index.profile_with_model_number(m_num),
            (None, Some(p_num)) => Ok(p_num),
            (None, None) => {
                self.index
                    .last()
                    .map(|e| e.profile_number)
                    .ok_or_else(|| MesaError::EmptyIndex {
                        path: self.index.file_name().to_path_buf(),
                    })
            }
        }
    }

    /// Profile data by model number or profile number.
    ///
    /// A model number takes precedence over a profile number. With neither,
    /// the profile with the largest model number is returned.
    pub fn profile_data(
        &mut self,
        model_number: Option<i64>,
        profile_number: Option<i64>,
    ) -> Result<Arc<MesaData>> {
        let p_num = self.profile_number_for(model_number, profile_number)?;

        if self.config.memoize_profiles {
            if let Some(profile) = self.profiles.get(&p_num) {
                debug!(profile = p_num, "Memoized profile hit");
                return Ok(Arc::clone(profile));
            }
        }

        let path = self.profile_path(p_num);
        debug!(profile = p_num, path = %path.display(), "Reading profile");
        let options = ReadOptions::default().with_layout(self.config.log_layout);
        let profile = Arc::new(MesaData::open_with(path, &options)?);
        if self.config.memoize_profiles {
            self.profiles.insert(p_num, Arc::clone(&profile));
        }
        Ok(profile)
    }

    /// Model numbers (with profiles) whose history values satisfy `predicate`.
    ///
    /// `predicate` receives the values of `keys`, in order, at each model
    /// number. Every key is checked against the history before the first
    /// call.
    pub fn select_models<F>(&self, mut predicate: F, keys: &[&str]) -> Result<Vec<i64>>
    where
        F: FnMut(&[Value]) -> bool,
    {
        if let Some(missing) = keys.iter().find(|key| !self.history.has(key)) {
            return Err(MesaError::KeyNotFound {
                key: missing.to_string(),
            });
        }

        let mut selected = Vec::new();
        let mut inputs = Vec::with_capacity(keys.len());
        for m_num in self.model_numbers() {
            inputs.clear();
            for key in keys {
                inputs.push(self.history.data_at_model_number(key, m_num)?);
            }
            if predicate(&inputs) {
                selected.push(m_num);
            }
        }
        Ok(selected)
    }
}
