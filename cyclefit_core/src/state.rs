//! User state persistence with file locking.
//!
//! Holds everything about a user other than the period log: onboarding
//! cycle settings, the manual phase override, today's bleeding check-in,
//! the nutrition profile and the last computed cycle stats.

use crate::engine::CycleSettings;
use crate::{
    BleedingCheckIn, CyclePhase, CycleStats, Error, PhaseOverride, Profile, Result,
};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// User's persistent state across invocations
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct UserState {
    /// Cycle length given at onboarding
    #[serde(default)]
    pub fallback_cycle_length: Option<u32>,
    #[serde(default)]
    pub period_length: Option<u32>,
    #[serde(default)]
    pub phase_override: Option<PhaseOverride>,
    #[serde(default)]
    pub bleeding_checkin: Option<BleedingCheckIn>,
    #[serde(default)]
    pub profile: Option<Profile>,
    /// Stats from the last time the period history changed
    #[serde(default)]
    pub cached_stats: Option<CycleStats>,
}

impl UserState {
    /// Per-user values layered over the configured defaults
    pub fn cycle_settings(&self, defaults: CycleSettings) -> CycleSettings {
        CycleSettings {
            fallback_cycle_length: self
                .fallback_cycle_length
                .unwrap_or(defaults.fallback_cycle_length),
            period_length: self.period_length.unwrap_or(defaults.period_length),
            luteal_length: defaults.luteal_length,
        }
    }

    /// Whether the user reported bleeding on `date`
    pub fn menstruating_on(&self, date: NaiveDate) -> bool {
        self.bleeding_checkin
            .map(|checkin| checkin.bleeding_on(date))
            .unwrap_or(false)
    }

    /// Pin a phase, superseding the computed phase
    pub fn pin_phase(&mut self, phase: CyclePhase, today: NaiveDate) {
        tracing::info!("Pinning phase {} on {}", phase, today);
        self.phase_override = Some(PhaseOverride {
            phase,
            pinned_on: today,
        });
    }

    /// Record a newly logged period start
    ///
    /// Clears the manual override if the start is on or after the day it was
    /// pinned; back-filling an older start leaves it in place.
    pub fn note_period_logged(&mut self, date: NaiveDate) {
        if let Some(pinned) = self.phase_override {
            if date >= pinned.pinned_on {
                tracing::info!(
                    "Period start {} clears phase override pinned on {}",
                    date,
                    pinned.pinned_on
                );
                self.phase_override = None;
            }
        }
    }

    /// Record today's bleeding status
    pub fn check_in(&mut self, date: NaiveDate, bleeding: bool) {
        self.bleeding_checkin = Some(BleedingCheckIn { date, bleeding });
    }

    /// Load user state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<UserState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded user state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save user state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved user state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Goal, LifestyleLevel};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn defaults() -> CycleSettings {
        CycleSettings {
            fallback_cycle_length: 28,
            period_length: 5,
            luteal_length: 14,
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let mut state = UserState {
            fallback_cycle_length: Some(30),
            profile: Some(Profile {
                weight_kg: Some(61.0),
                lifestyle_level: LifestyleLevel::Mixed,
                goal: Goal::Recomp,
                ..Profile::default()
            }),
            ..UserState::default()
        };
        state.pin_phase(CyclePhase::Luteal, date("2024-03-01"));
        state.check_in(date("2024-03-02"), true);

        state.save(&state_path).unwrap();
        let loaded = UserState::load(&state_path).unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("nonexistent.json");

        let state = UserState::load(&state_path).unwrap();
        assert_eq!(state, UserState::default());
    }

    #[test]
    fn test_corrupted_state_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("corrupted.json");

        std::fs::write(&state_path, "{ invalid json }").unwrap();

        let state = UserState::load(&state_path).unwrap();
        assert_eq!(state, UserState::default());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        UserState::update(&state_path, |state| {
            state.period_length = Some(6);
            Ok(())
        })
        .unwrap();

        let loaded = UserState::load(&state_path).unwrap();
        assert_eq!(loaded.period_length, Some(6));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        UserState::default().save(&state_path).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
    }

    #[test]
    fn test_newer_period_clears_override() {
        let mut state = UserState::default();
        state.pin_phase(CyclePhase::Follicular, date("2024-03-10"));

        state.note_period_logged(date("2024-03-12"));
        assert!(state.phase_override.is_none());
    }

    #[test]
    fn test_backfilled_period_keeps_override() {
        let mut state = UserState::default();
        state.pin_phase(CyclePhase::Follicular, date("2024-03-10"));

        state.note_period_logged(date("2024-02-10"));
        assert_eq!(
            state.phase_override.map(|o| o.phase),
            Some(CyclePhase::Follicular)
        );
    }

    #[test]
    fn test_cycle_settings_layering() {
        let mut state = UserState::default();
        assert_eq!(state.cycle_settings(defaults()), defaults());

        state.fallback_cycle_length = Some(32);
        state.period_length = Some(4);
        let settings = state.cycle_settings(defaults());
        assert_eq!(settings.fallback_cycle_length, 32);
        assert_eq!(settings.period_length, 4);
        assert_eq!(settings.luteal_length, 14);
    }

    #[test]
    fn test_menstruating_on_uses_checkin_date() {
        let mut state = UserState::default();
        assert!(!state.menstruating_on(date("2024-03-02")));

        state.check_in(date("2024-03-02"), true);
        assert!(state.menstruating_on(date("2024-03-02")));
        assert!(!state.menstruating_on(date("2024-03-03")));

        state.check_in(date("2024-03-03"), false);
        assert!(!state.menstruating_on(date("2024-03-03")));
    }
}
