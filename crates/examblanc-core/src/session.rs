//! Session state and orchestration.
//!
//! A [`SessionState`] owns everything mutable for one interactive session:
//! the cumulative answer map, the slot-to-seed mapping for the exam
//! dashboard, the currently running exam, and the autosave bookkeeping.
//! Seeds are session-scoped on purpose; restarting the application returns
//! every slot to its default seed.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::catalog::Catalog;
use crate::error::StoreError;
use crate::exam::{self, exam_key_prefix, ExamAssembly};
use crate::model::{AnswerMap, Choice};
use crate::progress::{ProgressSnapshot, ProgressStore};

const REGEN_SEED_MIN: u64 = 10_000;
const REGEN_SEED_MAX: u64 = 99_999;

/// When answers are flushed to the progress store without an explicit save.
#[derive(Debug, Clone, Copy)]
pub struct AutosavePolicy {
    /// Flush once this many answers accumulated since the last save.
    pub answer_threshold: usize,
    /// Flush when the last save is older than this.
    pub max_interval: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            answer_threshold: 5,
            max_interval: Duration::from_secs(300),
        }
    }
}

#[derive(Debug)]
pub struct SessionState {
    answers: AnswerMap,
    session_count: u32,
    exam_seeds: BTreeMap<u32, u64>,
    current_exam: Option<ExamAssembly>,
    last_saved_count: usize,
    last_save: Instant,
    autosave: AutosavePolicy,
}

impl SessionState {
    /// Starts a session from a loaded snapshot. The session counter moves
    /// past the persisted one so consecutive runs are distinguishable.
    pub fn from_snapshot(snapshot: ProgressSnapshot, autosave: AutosavePolicy) -> Self {
        let last_saved_count = snapshot.user_answers.len();
        Self {
            answers: snapshot.user_answers,
            session_count: snapshot.statistics.total_sessions + 1,
            exam_seeds: BTreeMap::new(),
            current_exam: None,
            last_saved_count,
            last_save: Instant::now(),
            autosave,
        }
    }

    /// Loads whatever the store has and starts a session on it.
    pub fn resume(store: &ProgressStore, autosave: AutosavePolicy) -> Self {
        Self::from_snapshot(store.load(), autosave)
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn record_answer(&mut self, key: impl Into<String>, choice: Choice) {
        self.answers.insert(key.into(), choice);
    }

    pub fn answer_for(&self, key: &str) -> Option<Choice> {
        self.answers.get(key).copied()
    }

    pub fn current_exam(&self) -> Option<&ExamAssembly> {
        self.current_exam.as_ref()
    }

    /// The seed a dashboard slot maps to. Unregenerated slots use the slot
    /// number itself.
    pub fn seed_for_slot(&self, slot: u32) -> u64 {
        self.exam_seeds.get(&slot).copied().unwrap_or(u64::from(slot))
    }

    /// Assembles and installs the exam for a slot. `None` when the exam
    /// corpus cannot serve one.
    pub fn start_exam(&mut self, slot: u32, catalog: &Catalog) -> Option<&ExamAssembly> {
        let assembly = exam::assemble(self.seed_for_slot(slot), catalog)?;
        self.current_exam = Some(assembly);
        self.current_exam.as_ref()
    }

    /// Replaces a slot's exam with a freshly seeded one and clears the
    /// answers recorded under the old seed. Without an override the new
    /// seed is drawn at random.
    pub fn regenerate_exam(
        &mut self,
        slot: u32,
        catalog: &Catalog,
        seed_override: Option<u64>,
    ) -> Option<&ExamAssembly> {
        let new_seed = seed_override
            .unwrap_or_else(|| rand::thread_rng().gen_range(REGEN_SEED_MIN..=REGEN_SEED_MAX));
        let assembly = exam::assemble(new_seed, catalog)?;

        let old_seed = self.seed_for_slot(slot);
        let removed = self.remove_prefix(&exam_key_prefix(old_seed));
        if removed > 0 {
            tracing::info!("cleared {removed} answers recorded under exam {old_seed}");
        }

        self.exam_seeds.insert(slot, new_seed);
        self.current_exam = Some(assembly);
        self.current_exam.as_ref()
    }

    /// Drops the running exam without touching any recorded answers.
    pub fn abandon_exam(&mut self) {
        self.current_exam = None;
    }

    /// Clears a practice module's answers. Returns how many were removed.
    pub fn reset_module(&mut self, module_id: u32) -> usize {
        self.remove_prefix(&format!("{module_id}_"))
    }

    /// Clears one exam slot's answers, resolving the slot through the seed
    /// mapping so regenerated slots clear the right keys.
    pub fn reset_exam(&mut self, slot: u32) -> usize {
        let seed = self.seed_for_slot(slot);
        if self.current_exam.as_ref().map(|a| a.exam_id) == Some(seed) {
            self.current_exam = None;
        }
        self.remove_prefix(&exam_key_prefix(seed))
    }

    /// Archives the persisted progress, clears everything in memory, and
    /// saves the empty state. Returns the archive path when one was made.
    pub fn reset_all(&mut self, store: &ProgressStore) -> Result<Option<PathBuf>, StoreError> {
        let archive = store.archive_primary()?;
        self.answers.clear();
        self.current_exam = None;
        self.save_now(store)?;
        Ok(archive)
    }

    /// Unconditional flush to the store.
    pub fn save_now(&mut self, store: &ProgressStore) -> Result<(), StoreError> {
        store.save(&self.snapshot())?;
        self.last_saved_count = self.answers.len();
        self.last_save = Instant::now();
        Ok(())
    }

    /// Flushes only when the batching policy asks for it: enough new
    /// answers since the last save, or a save older than the interval.
    /// `Ok(true)` when a write happened.
    pub fn autosave(&mut self, store: &ProgressStore) -> Result<bool, StoreError> {
        let new_answers = self.answers.len().saturating_sub(self.last_saved_count);
        if new_answers >= self.autosave.answer_threshold
            || self.last_save.elapsed() > self.autosave.max_interval
        {
            self.save_now(store)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::capture(&self.answers, self.session_count)
    }

    fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.answers.len();
        self.answers.retain(|key, _| !key.starts_with(prefix));
        before - self.answers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogMetadata;
    use crate::exam::{REGULATORY_THEME, TECHNICAL_THEME};
    use crate::model::{Module, OptionSet, Question, EXAM_MODULE_TYPE};

    fn exam_catalog() -> Catalog {
        let bank = |id: u32, theme: &str, count: usize| Module {
            id,
            title: format!("Examen - {theme}"),
            full_title: theme.to_string(),
            description: String::new(),
            theme: Some(theme.to_string()),
            questions: (1..=count as u32)
                .map(|i| Question {
                    id: i,
                    theme_id: None,
                    theme: Some(theme.to_string()),
                    question: format!("Question {i}"),
                    options: OptionSet::new("Un", "Deux", "Trois"),
                    correct_answer: Choice::A,
                    explanation: String::new(),
                    original_id: Some(i),
                })
                .collect(),
            total_questions: count,
            kind: Some(EXAM_MODULE_TYPE.to_string()),
        };
        Catalog {
            metadata: CatalogMetadata {
                total_questions: 30,
                total_modules: 2,
                created_date: None,
                source_file: None,
                kind: Some(EXAM_MODULE_TYPE.to_string()),
                deduplication: true,
                themes: BTreeMap::new(),
            },
            modules: vec![bank(1, REGULATORY_THEME, 15), bank(2, TECHNICAL_THEME, 15)],
        }
    }

    fn policy(threshold: usize, interval: Duration) -> AutosavePolicy {
        AutosavePolicy {
            answer_threshold: threshold,
            max_interval: interval,
        }
    }

    fn store() -> (tempfile::TempDir, ProgressStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("checkpoint"));
        (dir, store)
    }

    #[test]
    fn resuming_advances_the_session_counter() {
        let (_dir, store) = store();
        let mut session = SessionState::resume(&store, AutosavePolicy::default());
        assert_eq!(session.session_count(), 1);

        session.record_answer("1_1", Choice::B);
        session.save_now(&store).unwrap();

        let next = SessionState::resume(&store, AutosavePolicy::default());
        assert_eq!(next.session_count(), 2);
        assert_eq!(next.answer_for("1_1"), Some(Choice::B));
    }

    #[test]
    fn autosave_triggers_on_answer_threshold() {
        let (_dir, store) = store();
        let mut session =
            SessionState::resume(&store, policy(2, Duration::from_secs(3600)));

        session.record_answer("1_1", Choice::A);
        assert!(!session.autosave(&store).unwrap());

        session.record_answer("1_2", Choice::B);
        assert!(session.autosave(&store).unwrap());
        assert!(store.primary_path().exists());

        // Counter resets after a flush.
        assert!(!session.autosave(&store).unwrap());
    }

    #[test]
    fn autosave_triggers_on_elapsed_interval() {
        let (_dir, store) = store();
        let mut session = SessionState::resume(&store, policy(999, Duration::ZERO));

        session.record_answer("1_1", Choice::A);
        std::thread::sleep(Duration::from_millis(5));
        assert!(session.autosave(&store).unwrap());
    }

    #[test]
    fn rewriting_an_answer_does_not_count_as_new() {
        let (_dir, store) = store();
        let mut session =
            SessionState::resume(&store, policy(2, Duration::from_secs(3600)));

        session.record_answer("1_1", Choice::A);
        session.record_answer("1_1", Choice::B);
        session.record_answer("1_1", Choice::C);
        assert!(!session.autosave(&store).unwrap());
        assert_eq!(session.answer_for("1_1"), Some(Choice::C));
    }

    #[test]
    fn slots_default_to_their_own_number() {
        let (_dir, store) = store();
        let session = SessionState::resume(&store, AutosavePolicy::default());
        assert_eq!(session.seed_for_slot(1), 1);
        assert_eq!(session.seed_for_slot(10), 10);
    }

    #[test]
    fn starting_the_same_slot_twice_reproduces_the_exam() {
        let catalog = exam_catalog();
        let (_dir, store) = store();
        let mut session = SessionState::resume(&store, AutosavePolicy::default());

        let first: Vec<String> = session
            .start_exam(3, &catalog)
            .unwrap()
            .questions()
            .map(|q| q.id.clone())
            .collect();
        session.abandon_exam();
        let second: Vec<String> = session
            .start_exam(3, &catalog)
            .unwrap()
            .questions()
            .map(|q| q.id.clone())
            .collect();

        assert_eq!(first, second);
        assert!(first[0].starts_with("exam3_"));
    }

    #[test]
    fn regeneration_swaps_seed_and_clears_old_answers() {
        let catalog = exam_catalog();
        let (_dir, store) = store();
        let mut session = SessionState::resume(&store, AutosavePolicy::default());

        session.start_exam(2, &catalog).unwrap();
        session.record_answer("exam2_env_1", Choice::A);
        session.record_answer("exam2_tech_3", Choice::B);
        session.record_answer("1_4", Choice::C);

        let regenerated = session.regenerate_exam(2, &catalog, Some(77_777)).unwrap();
        assert_eq!(regenerated.exam_id, 77_777);
        assert_eq!(session.seed_for_slot(2), 77_777);
        assert!(session.answer_for("exam2_env_1").is_none());
        assert!(session.answer_for("exam2_tech_3").is_none());
        assert_eq!(session.answer_for("1_4"), Some(Choice::C));
    }

    #[test]
    fn reset_exam_resolves_the_slot_seed() {
        let catalog = exam_catalog();
        let (_dir, store) = store();
        let mut session = SessionState::resume(&store, AutosavePolicy::default());

        session.regenerate_exam(5, &catalog, Some(12_345)).unwrap();
        session.record_answer("exam12345_env_1", Choice::A);
        session.record_answer("exam5_env_1", Choice::B);

        let removed = session.reset_exam(5);
        assert_eq!(removed, 1);
        assert!(session.answer_for("exam12345_env_1").is_none());
        // Keys under the slot's default seed belong to a different exam now.
        assert_eq!(session.answer_for("exam5_env_1"), Some(Choice::B));
        assert!(session.current_exam().is_none());
    }

    #[test]
    fn reset_module_spares_similar_prefixes() {
        let (_dir, store) = store();
        let mut session = SessionState::resume(&store, AutosavePolicy::default());

        session.record_answer("1_1", Choice::A);
        session.record_answer("1_2", Choice::B);
        session.record_answer("12_1", Choice::C);

        assert_eq!(session.reset_module(1), 2);
        assert_eq!(session.answer_for("12_1"), Some(Choice::C));
    }

    #[test]
    fn reset_all_archives_and_persists_empty_state() {
        let (_dir, store) = store();
        let mut session = SessionState::resume(&store, AutosavePolicy::default());

        session.record_answer("1_1", Choice::A);
        session.save_now(&store).unwrap();

        let archive = session.reset_all(&store).unwrap().unwrap();
        assert!(archive.exists());
        assert!(session.answers().is_empty());

        let reloaded = store.load();
        assert!(reloaded.user_answers.is_empty());
    }

    #[test]
    fn first_reset_on_a_fresh_store_archives_nothing() {
        let (_dir, store) = store();
        let mut session = SessionState::resume(&store, AutosavePolicy::default());
        assert!(session.reset_all(&store).unwrap().is_none());
    }
}
