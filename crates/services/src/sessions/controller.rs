use std::fmt;
use std::sync::Arc;

use exam_core::filter::{FilterCriteria, filter_positions};
use exam_core::model::{
    AnswerRecord, ChoiceKey, FavoriteSet, Question, QuestionBank, QuestionId, QuestionKind,
    next_selection,
};
use exam_core::paging::Paginator;
use exam_core::reveal::{RevealMode, RevealTracker};
use exam_core::scoring::{self, PageScore};
use storage::progress::{PersistedProgress, ProgressStore};
use storage::repository::KeyValueStore;

use crate::config::SessionConfig;
use super::confirm::{ConfirmGate, ConfirmPrompt};
use super::outcome::{AnswerOutcome, JumpTarget, ResetOutcome, RevealOutcome, SubmitOutcome};
use super::view::{FavoritesSummary, OptionView, PageView, QuestionView, SheetEntry};

//
// ─── SESSION CONTROLLER ────────────────────────────────────────────────────────
//

/// Owns all mutable quiz state for one user session.
///
/// Every mutation goes through here and is written to the progress store
/// right away. Nothing fails after `open`: unknown ids are no-ops, pages are
/// clamped and store write failures are logged.
pub struct SessionController {
    bank: Arc<QuestionBank>,
    config: SessionConfig,
    store: ProgressStore,
    confirm: Arc<dyn ConfirmGate>,
    answers: AnswerRecord,
    favorites: FavoriteSet,
    reveal: RevealTracker,
    filter: FilterCriteria,
    /// Bank positions of the questions matching `filter`, in bank order.
    filtered: Vec<usize>,
    current_page: usize,
}

impl SessionController {
    /// Restore persisted progress and start a session over `bank`.
    pub async fn open(
        bank: Arc<QuestionBank>,
        config: SessionConfig,
        kv: Arc<dyn KeyValueStore>,
        confirm: Arc<dyn ConfirmGate>,
    ) -> Self {
        let store = ProgressStore::new(kv, config.keys.clone());
        let PersistedProgress {
            favorites,
            answers,
            current_page,
        } = store.load().await;
        let reveal = RevealTracker::resume(config.reveal_mode, &answers);
        let filtered = (0..bank.len()).collect();

        let mut controller = Self {
            bank,
            config,
            store,
            confirm,
            answers,
            favorites,
            reveal,
            filter: FilterCriteria::default(),
            filtered,
            current_page,
        };
        let clamped = controller.clamp_page(current_page);
        if clamped != current_page {
            controller.current_page = clamped;
            controller.persist_page().await;
        }

        tracing::debug!(
            questions = controller.bank.len(),
            answered = controller.answers.answered_count(),
            favorites = controller.favorites.len(),
            page = controller.current_page,
            mode = %controller.config.reveal_mode,
            "session opened"
        );
        controller
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Replace the selection for `id`. Never reveals.
    pub async fn answer(&mut self, id: &QuestionId, keys: Vec<ChoiceKey>) -> AnswerOutcome {
        let bank = Arc::clone(&self.bank);
        let Some(question) = bank.get(id) else {
            return AnswerOutcome::UnknownQuestion;
        };
        if !question.accepts_all(&keys)
            || (question.kind() == QuestionKind::Single && keys.len() > 1)
        {
            return AnswerOutcome::InvalidChoice;
        }
        self.record(question, keys).await
    }

    /// Apply one option click: replace for single-select, toggle for
    /// multi-select.
    pub async fn toggle_choice(&mut self, id: &QuestionId, key: ChoiceKey) -> AnswerOutcome {
        let bank = Arc::clone(&self.bank);
        let Some(question) = bank.get(id) else {
            return AnswerOutcome::UnknownQuestion;
        };
        if !question.has_choice(&key) {
            return AnswerOutcome::InvalidChoice;
        }
        let next = next_selection(question.kind(), self.answers.get(id), key);
        self.record(question, next).await
    }

    async fn record(&mut self, question: &Question, keys: Vec<ChoiceKey>) -> AnswerOutcome {
        if self.is_locked(question.id()) {
            return AnswerOutcome::Locked;
        }
        self.answers.set(question.id().clone(), keys);
        self.persist_answers().await;
        AnswerOutcome::Recorded
    }

    /// Per-question mode freezes a question's selection once it is revealed.
    fn is_locked(&self, id: &QuestionId) -> bool {
        self.reveal.mode() == RevealMode::PerQuestion && self.reveal.is_revealed(id, None)
    }

    //
    // ─── FAVORITES ─────────────────────────────────────────────────────────────
    //

    /// Add or remove `id` from favorites.
    ///
    /// Returns whether `id` is a favorite afterwards, or `None` for an id that
    /// is not in the bank.
    pub async fn toggle_favorite(&mut self, id: &QuestionId) -> Option<bool> {
        if !self.bank.contains(id) {
            return None;
        }
        let is_favorite = self.favorites.toggle(id);
        self.persist_favorites().await;

        if self.filter.favorites_only() {
            self.after_filter_change();
            let clamped = self.clamp_page(self.current_page);
            if clamped != self.current_page {
                self.current_page = clamped;
                self.persist_page().await;
            }
        }
        Some(is_favorite)
    }

    //
    // ─── REVEAL / SUBMIT / RESET ───────────────────────────────────────────────
    //

    /// Reveal one question (per-question mode only).
    pub fn reveal(&mut self, id: &QuestionId) -> RevealOutcome {
        if self.reveal.mode() != RevealMode::PerQuestion {
            return RevealOutcome::WrongMode;
        }
        if !self.bank.contains(id) {
            return RevealOutcome::UnknownQuestion;
        }
        if self.reveal.reveal_question(id) {
            tracing::debug!(%id, "question revealed");
            RevealOutcome::Revealed
        } else {
            RevealOutcome::AlreadyRevealed
        }
    }

    /// Submit a page of the filtered view (per-page mode only).
    ///
    /// `page` is clamped. A pending page needs user confirmation; an already
    /// submitted page just reports its current score.
    pub fn submit_page(&mut self, page: usize) -> SubmitOutcome {
        if self.reveal.mode() != RevealMode::PerPage {
            return SubmitOutcome::WrongMode;
        }
        let page = self.clamp_page(page);
        if !self.reveal.is_page_revealed(page) {
            if !self.confirm.confirm(ConfirmPrompt::SubmitPage { page }) {
                return SubmitOutcome::Declined;
            }
            self.reveal.reveal_page(page);
        }
        let score = self.score_page(page);
        tracing::debug!(page, correct = score.correct, total = score.total, "page submitted");
        SubmitOutcome::Submitted { page, score }
    }

    /// Clear every answer and all reveal state. Favorites are kept.
    pub async fn reset_progress(&mut self) -> ResetOutcome {
        if !self.confirm.confirm(ConfirmPrompt::ResetProgress) {
            return ResetOutcome::Declined;
        }
        self.answers.clear();
        self.reveal.reset();
        if let Err(err) = self.store.clear_answers().await {
            tracing::warn!(error = %err, "failed to clear persisted answers");
        }
        tracing::debug!("progress reset");
        ResetOutcome::Reset
    }

    //
    // ─── FILTERING ─────────────────────────────────────────────────────────────
    //

    /// Returns true if the query changed (which resets the page to 1).
    pub async fn set_query(&mut self, query: impl Into<String>) -> bool {
        if !self.filter.set_query(query) {
            return false;
        }
        self.after_filter_change();
        self.set_page(1).await;
        true
    }

    /// Returns true if the flag changed (which resets the page to 1).
    pub async fn set_favorites_only(&mut self, favorites_only: bool) -> bool {
        if !self.filter.set_favorites_only(favorites_only) {
            return false;
        }
        self.after_filter_change();
        self.set_page(1).await;
        true
    }

    fn after_filter_change(&mut self) {
        self.refresh_filtered();
        if self.reveal.invalidate_pages() {
            tracing::debug!("page results cleared after filter change");
        }
    }

    fn refresh_filtered(&mut self) {
        self.filtered = filter_positions(&self.bank, &self.filter, &self.favorites);
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move to `page`, clamped to the filtered view. Returns the page landed on.
    pub async fn go_to_page(&mut self, page: usize) -> usize {
        let page = self.clamp_page(page);
        self.set_page(page).await;
        page
    }

    pub async fn next_page(&mut self) -> usize {
        self.go_to_page(self.current_page.saturating_add(1)).await
    }

    pub async fn previous_page(&mut self) -> usize {
        self.go_to_page(self.current_page.saturating_sub(1)).await
    }

    /// Clear any filter and move to the page holding `id` in the full bank.
    ///
    /// Returns `None` (and changes nothing) if `id` is not in the bank.
    pub async fn jump_to_question(&mut self, id: &QuestionId) -> Option<JumpTarget> {
        let index = self.bank.index_of(id)?;
        if self.filter.clear() {
            self.after_filter_change();
        }
        let page = self.paginator().page_of(index);
        let page_changed = page != self.current_page;
        self.set_page(page).await;
        Some(JumpTarget {
            page,
            page_changed,
            anchor: id.anchor(),
        })
    }

    async fn set_page(&mut self, page: usize) {
        if page == self.current_page {
            return;
        }
        self.current_page = page;
        self.persist_page().await;
    }

    fn clamp_page(&self, page: usize) -> usize {
        self.paginator().clamp(page, self.filtered.len())
    }

    //
    // ─── READ ACCESSORS ────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn paginator(&self) -> Paginator {
        self.config.paginator
    }

    #[must_use]
    pub fn reveal_mode(&self) -> RevealMode {
        self.reveal.mode()
    }

    #[must_use]
    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    #[must_use]
    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.paginator().page_count(self.filtered.len())
    }

    /// Questions matching the current filter, in bank order.
    #[must_use]
    pub fn filtered_bank(&self) -> Vec<&Question> {
        self.filtered
            .iter()
            .map(|&index| &self.bank.questions()[index])
            .collect()
    }

    /// Questions on the current page of the filtered view.
    #[must_use]
    pub fn page_slice(&self) -> Vec<&Question> {
        self.page_questions(self.current_page)
    }

    fn page_questions(&self, page: usize) -> Vec<&Question> {
        self.paginator()
            .slice(&self.filtered, page)
            .iter()
            .map(|&index| &self.bank.questions()[index])
            .collect()
    }

    #[must_use]
    pub fn answer_for(&self, id: &QuestionId) -> &[ChoiceKey] {
        self.answers.get(id)
    }

    #[must_use]
    pub fn is_favorite(&self, id: &QuestionId) -> bool {
        self.favorites.contains(id)
    }

    /// Whether correctness is currently visible for `id`.
    ///
    /// In per-page mode this depends on the page `id` sits on in the current
    /// filtered view; a question outside the view is never revealed.
    #[must_use]
    pub fn is_revealed(&self, id: &QuestionId) -> bool {
        match self.reveal.mode() {
            RevealMode::PerQuestion => self.reveal.is_revealed(id, None),
            RevealMode::PerPage => self.reveal.is_revealed(id, self.filtered_page_of(id)),
        }
    }

    fn filtered_page_of(&self, id: &QuestionId) -> Option<usize> {
        let index = self.bank.index_of(id)?;
        let position = self.filtered.binary_search(&index).ok()?;
        Some(self.paginator().page_of(position))
    }

    /// Score of a submitted page; `None` while it is pending or in
    /// per-question mode. Recomputed from the current answers on every call.
    #[must_use]
    pub fn page_score(&self, page: usize) -> Option<PageScore> {
        self.reveal
            .is_page_revealed(page)
            .then(|| self.score_page(page))
    }

    fn score_page(&self, page: usize) -> PageScore {
        PageScore::tally(self.page_questions(page), &self.answers)
    }

    /// Answered share of the full bank in percent, clamped to 100.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        if self.bank.is_empty() {
            return 0.0;
        }
        let answered = self.answers.answered_count() as f64;
        (answered / self.bank.len() as f64 * 100.0).min(100.0)
    }

    #[must_use]
    pub fn favorites_summary(&self) -> FavoritesSummary {
        let shown = self
            .filtered
            .iter()
            .filter(|&&index| self.favorites.contains(self.bank.questions()[index].id()))
            .count();
        FavoritesSummary {
            shown,
            total: self.favorites.len(),
        }
    }

    /// Snapshot of the current page for rendering.
    #[must_use]
    pub fn page_view(&self) -> PageView<'_> {
        let offset = self.paginator().offset(self.current_page);
        let questions = self
            .page_slice()
            .into_iter()
            .enumerate()
            .map(|(position, question)| self.question_view(offset + position + 1, question))
            .collect();

        PageView {
            page: self.current_page,
            page_count: self.page_count(),
            questions,
            score: self.page_score(self.current_page),
        }
    }

    fn question_view<'a>(&'a self, number: usize, question: &'a Question) -> QuestionView<'a> {
        let selection = self.answers.get(question.id());
        let revealed = self.is_revealed(question.id());
        let options = question
            .keyed_options()
            .map(|(key, text)| OptionView {
                key,
                text,
                status: scoring::option_status(question, selection, key, revealed),
            })
            .collect();

        QuestionView {
            number,
            question,
            selection,
            is_favorite: self.favorites.contains(question.id()),
            revealed,
            correct: revealed.then(|| scoring::is_correct(question, selection)),
            options,
        }
    }

    /// Per-question status grid of the current page.
    #[must_use]
    pub fn answer_sheet(&self) -> Vec<SheetEntry<'_>> {
        let offset = self.paginator().offset(self.current_page);
        self.page_slice()
            .into_iter()
            .enumerate()
            .map(|(position, question)| SheetEntry {
                number: offset + position + 1,
                id: question.id(),
                status: scoring::sheet_status(
                    question,
                    self.answers.get(question.id()),
                    self.is_revealed(question.id()),
                ),
            })
            .collect()
    }

    //
    // ─── PERSISTENCE ───────────────────────────────────────────────────────────
    //

    async fn persist_answers(&self) {
        if let Err(err) = self.store.save_answers(&self.answers).await {
            tracing::warn!(error = %err, "failed to persist answers");
        }
    }

    async fn persist_favorites(&self) {
        if let Err(err) = self.store.save_favorites(&self.favorites).await {
            tracing::warn!(error = %err, "failed to persist favorites");
        }
    }

    async fn persist_page(&self) {
        if let Err(err) = self.store.save_current_page(self.current_page).await {
            tracing::warn!(error = %err, "failed to persist current page");
        }
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("bank_len", &self.bank.len())
            .field("mode", &self.reveal.mode())
            .field("filter", &self.filter)
            .field("filtered_len", &self.filtered.len())
            .field("current_page", &self.current_page)
            .field("answered", &self.answers.answered_count())
            .field("favorites", &self.favorites.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
