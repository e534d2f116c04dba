//! Aggregation of sheet answers across a batch of documents.
use crate::diagnostics::RegistrationReport;
use crate::fields::SheetAnswers;
use serde::Serialize;

/// Per-question/option selection counts over all registered sheets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerTally {
    pub questions: usize,
    pub options: usize,
    pub sheets: usize,
    /// `counts[question][option]`
    pub counts: Vec<Vec<usize>>,
    /// Sheets with no option selected, per question.
    pub unanswered: Vec<usize>,
    /// Sheets with more than one option selected, per question.
    pub multiple: Vec<usize>,
}

impl AnswerTally {
    pub fn new(questions: usize, options: usize) -> Self {
        Self {
            questions,
            options,
            sheets: 0,
            counts: vec![vec![0; options]; questions],
            unanswered: vec![0; questions],
            multiple: vec![0; questions],
        }
    }

    /// Adds one sheet. Cells beyond the tally's grid are ignored.
    pub fn add(&mut self, answers: &SheetAnswers) {
        self.sheets += 1;
        for q in 0..self.questions {
            let selected = answers.selected(q);
            for &o in selected.iter().filter(|&&o| o < self.options) {
                self.counts[q][o] += 1;
            }
            match selected.len() {
                0 => self.unanswered[q] += 1,
                1 => {}
                _ => self.multiple[q] += 1,
            }
        }
    }

    /// Share of sheets selecting `option` for `question`.
    pub fn ratio(&self, question: usize, option: usize) -> f64 {
        if self.sheets == 0 {
            return 0.0;
        }
        self.counts
            .get(question)
            .and_then(|row| row.get(option))
            .map_or(0.0, |&c| c as f64 / self.sheets as f64)
    }
}

impl<'a> FromIterator<&'a SheetAnswers> for AnswerTally {
    fn from_iter<I: IntoIterator<Item = &'a SheetAnswers>>(iter: I) -> Self {
        let mut iter = iter.into_iter().peekable();
        let (q, o) = iter
            .peek()
            .map_or((0, 0), |a| (a.questions(), a.options()));
        let mut tally = AnswerTally::new(q, o);
        for answers in iter {
            tally.add(answers);
        }
        tally
    }
}

/// Outcome of one document in a batch run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutcome {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationReport>,
    /// Selected options per question, zero-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<Vec<Vec<usize>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentOutcome {
    pub fn is_registered(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-document outcomes plus the tally over all registered sheets.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub registered: usize,
    pub skipped: usize,
    pub documents: Vec<DocumentOutcome>,
    pub tally: AnswerTally,
}

impl BatchReport {
    pub fn new(questions: usize, options: usize) -> Self {
        Self {
            registered: 0,
            skipped: 0,
            documents: Vec::new(),
            tally: AnswerTally::new(questions, options),
        }
    }

    pub fn push_registered(
        &mut self,
        path: impl Into<String>,
        registration: RegistrationReport,
        answers: &SheetAnswers,
    ) {
        self.tally.add(answers);
        self.registered += 1;
        self.documents.push(DocumentOutcome {
            path: path.into(),
            registration: Some(registration),
            selected: Some((0..answers.questions()).map(|q| answers.selected(q)).collect()),
            error: None,
        });
    }

    /// Records a document that could not be registered; it does not count
    /// towards the tally.
    pub fn push_skipped(&mut self, path: impl Into<String>, error: impl ToString) {
        self.skipped += 1;
        self.documents.push(DocumentOutcome {
            path: path.into(),
            registration: None,
            selected: None,
            error: Some(error.to_string()),
        });
    }
}
