//! Source-text parsers for the two corpus grammars.
//!
//! Practice corpora are segmented into `Thème N : title` blocks whose
//! entries carry a numbered prompt marker. Exam corpora have no block
//! headers; each entry names its theme inline. Both grammars share the same
//! entry skeleton: a `Question N` marker, a prompt, three labeled options,
//! and an expected-answer marker. Entries that never complete the skeleton
//! are dropped from the output without an error.

use std::path::Path;

use crate::error::IngestError;
use crate::model::Choice;

/// A question entry as scanned from source text, before validation and
/// catalogue typing. Option texts and the answer token are kept raw so the
/// validator can report on them.
#[derive(Debug, Clone)]
pub struct RawQuestion {
    /// The number on the `Question N` marker line.
    pub source_id: u32,
    /// Inline theme label (exam grammar only).
    pub theme: Option<String>,
    pub prompt: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    /// The token after `Réponse attendue :`, not yet checked against the
    /// label set.
    pub answer: String,
}

/// A practice-corpus theme block with its scanned entries.
#[derive(Debug, Clone)]
pub struct ParsedTheme {
    pub id: u32,
    pub title: String,
    pub questions: Vec<RawQuestion>,
}

/// An exam-corpus theme group, in encounter order.
#[derive(Debug, Clone)]
pub struct ExamTheme {
    pub name: String,
    pub questions: Vec<RawQuestion>,
}

/// Reads a source text file as UTF-8, falling back to Windows-1252 when the
/// bytes are not valid UTF-8. Only an unreadable file is fatal.
pub fn read_source_text(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            tracing::warn!(
                "{} is not valid UTF-8, decoding as Windows-1252",
                path.display()
            );
            let bytes = err.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

// ---------------------------------------------------------------------------
// Line-level markers
// ---------------------------------------------------------------------------

fn split_leading_digits(s: &str) -> Option<(&str, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        None
    } else {
        Some(s.split_at(end))
    }
}

/// `Thème N : title` — practice block header.
fn parse_theme_header(line: &str) -> Option<(u32, &str)> {
    let rest = line.strip_prefix("Thème")?.trim_start();
    let (digits, rest) = split_leading_digits(rest)?;
    let id = digits.parse().ok()?;
    let title = rest.trim_start().strip_prefix(':')?.trim();
    if title.is_empty() {
        return None;
    }
    Some((id, title))
}

/// `Thème : name` — inline theme label of the exam grammar.
fn parse_theme_label(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("Thème")?.trim_start();
    let name = rest.strip_prefix(':')?.trim();
    if name.is_empty() {
        return None;
    }
    Some(name)
}

/// `Question N` — entry marker. The line must carry nothing but the number.
fn parse_question_marker(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("Question")?.trim_start();
    let (digits, tail) = split_leading_digits(rest)?;
    if !tail.trim().is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// `Énoncé de la question N : …` (practice) or `Énoncé de la question : …`
/// (exam). Returns the same-line start of the prompt text.
fn parse_prompt_marker(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("Énoncé de la question")?.trim_start();
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    Some(rest.trim_start().strip_prefix(':')?.trim_start())
}

/// `A - text` / `B - text` / `C - text`.
fn parse_option_marker(line: &str) -> Option<(Choice, &str)> {
    let mut chars = line.chars();
    let choice = match chars.next()? {
        'A' => Choice::A,
        'B' => Choice::B,
        'C' => Choice::C,
        _ => return None,
    };
    let rest = chars.as_str().trim_start();
    Some((choice, rest.strip_prefix('-')?.trim_start()))
}

/// `Réponse attendue : X` — closes an entry. The token must be a single
/// word; anything else is treated as ordinary text.
fn parse_answer_marker(line: &str) -> Option<&str> {
    let token = line.strip_prefix("Réponse attendue")?.trim_start().strip_prefix(':')?.trim();
    if token.is_empty() || token.split_whitespace().count() != 1 {
        return None;
    }
    Some(token)
}

// ---------------------------------------------------------------------------
// Entry assembly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    BeforePrompt,
    Prompt,
    OptionA,
    OptionB,
    OptionC,
}

/// One entry under construction while scanning lines. A buffer is `Some`
/// once its marker line was seen; continuation lines accumulate into the
/// buffer of the current section.
struct PendingEntry {
    source_id: u32,
    theme: Option<String>,
    prompt: Option<String>,
    option_a: Option<String>,
    option_b: Option<String>,
    option_c: Option<String>,
    section: Section,
}

impl PendingEntry {
    fn new(source_id: u32) -> Self {
        Self {
            source_id,
            theme: None,
            prompt: None,
            option_a: None,
            option_b: None,
            option_c: None,
            section: Section::BeforePrompt,
        }
    }

    fn begin_prompt(&mut self, first_line: &str) {
        self.prompt = Some(first_line.to_string());
        self.section = Section::Prompt;
    }

    /// Option markers are only honored in grammar order: A after the
    /// prompt, B after A, C after B. Out-of-order markers read as text.
    fn begin_option(&mut self, choice: Choice, first_line: &str) -> bool {
        let expected = match choice {
            Choice::A => Section::Prompt,
            Choice::B => Section::OptionA,
            Choice::C => Section::OptionB,
        };
        if self.section != expected {
            return false;
        }
        let buffer = Some(first_line.to_string());
        match choice {
            Choice::A => {
                self.option_a = buffer;
                self.section = Section::OptionA;
            }
            Choice::B => {
                self.option_b = buffer;
                self.section = Section::OptionB;
            }
            Choice::C => {
                self.option_c = buffer;
                self.section = Section::OptionC;
            }
        }
        true
    }

    fn push_line(&mut self, line: &str) {
        let buffer = match self.section {
            Section::BeforePrompt => return,
            Section::Prompt => self.prompt.as_mut(),
            Section::OptionA => self.option_a.as_mut(),
            Section::OptionB => self.option_b.as_mut(),
            Section::OptionC => self.option_c.as_mut(),
        };
        if let Some(buffer) = buffer {
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(line);
        }
    }

    fn finish(self, answer: &str) -> Option<RawQuestion> {
        Some(RawQuestion {
            source_id: self.source_id,
            theme: self.theme,
            prompt: self.prompt?.trim().to_string(),
            option_a: self.option_a?.trim().to_string(),
            option_b: self.option_b?.trim().to_string(),
            option_c: self.option_c?.trim().to_string(),
            answer: answer.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Corpus scanners
// ---------------------------------------------------------------------------

/// Scans a practice corpus into its theme blocks. Entries outside any theme
/// block and entries that never reach their answer marker are dropped.
pub fn parse_practice_corpus(text: &str) -> Vec<ParsedTheme> {
    let mut themes: Vec<ParsedTheme> = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    for line in text.lines() {
        let line = line.trim_end();
        let trimmed = line.trim_start();

        if let Some((id, title)) = parse_theme_header(trimmed) {
            drop_pending(&mut pending);
            themes.push(ParsedTheme {
                id,
                title: title.to_string(),
                questions: Vec::new(),
            });
            continue;
        }

        if let Some(source_id) = parse_question_marker(trimmed) {
            drop_pending(&mut pending);
            pending = Some(PendingEntry::new(source_id));
            continue;
        }

        let Some(entry) = pending.as_mut() else {
            continue;
        };

        if let Some(first) = parse_prompt_marker(trimmed) {
            entry.begin_prompt(first);
            continue;
        }

        if let Some((choice, first)) = parse_option_marker(trimmed) {
            if entry.begin_option(choice, first) {
                continue;
            }
        }

        if entry.section == Section::OptionC {
            if let Some(answer) = parse_answer_marker(trimmed) {
                let finished = pending.take().and_then(|e| e.finish(answer));
                match (finished, themes.last_mut()) {
                    (Some(question), Some(theme)) => theme.questions.push(question),
                    (Some(question), None) => {
                        tracing::debug!(
                            "dropping question {} found before any theme header",
                            question.source_id
                        );
                    }
                    (None, _) => {}
                }
                continue;
            }
        }

        entry.push_line(line);
    }

    drop_pending(&mut pending);
    themes
}

/// Scans an exam corpus, grouping entries by their inline theme label in
/// encounter order. Entries without a theme label are dropped.
pub fn parse_exam_corpus(text: &str) -> Vec<ExamTheme> {
    let mut themes: Vec<ExamTheme> = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    for line in text.lines() {
        let line = line.trim_end();
        let trimmed = line.trim_start();

        if let Some(source_id) = parse_question_marker(trimmed) {
            drop_pending(&mut pending);
            pending = Some(PendingEntry::new(source_id));
            continue;
        }

        let Some(entry) = pending.as_mut() else {
            continue;
        };

        if entry.section == Section::BeforePrompt && entry.theme.is_none() {
            if let Some(name) = parse_theme_label(trimmed) {
                entry.theme = Some(name.to_string());
                continue;
            }
        }

        if let Some(first) = parse_prompt_marker(trimmed) {
            entry.begin_prompt(first);
            continue;
        }

        if let Some((choice, first)) = parse_option_marker(trimmed) {
            if entry.begin_option(choice, first) {
                continue;
            }
        }

        if entry.section == Section::OptionC {
            if let Some(answer) = parse_answer_marker(trimmed) {
                if let Some(question) = pending.take().and_then(|e| e.finish(answer)) {
                    match &question.theme {
                        Some(name) => {
                            let name = name.clone();
                            match themes.iter_mut().find(|t| t.name == name) {
                                Some(theme) => theme.questions.push(question),
                                None => themes.push(ExamTheme {
                                    name,
                                    questions: vec![question],
                                }),
                            }
                        }
                        None => {
                            tracing::debug!(
                                "dropping question {} without a theme label",
                                question.source_id
                            );
                        }
                    }
                }
                continue;
            }
        }

        entry.push_line(line);
    }

    drop_pending(&mut pending);
    themes
}

fn drop_pending(pending: &mut Option<PendingEntry>) {
    if let Some(entry) = pending.take() {
        tracing::debug!(
            "dropping incomplete question entry {} (stopped at {:?})",
            entry.source_id,
            entry.section
        );
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A finding from corpus validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Theme the record belongs to, where known.
    pub theme: Option<String>,
    /// Question number within its theme, where applicable.
    pub question_id: Option<u32>,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.theme, self.question_id) {
            (Some(theme), Some(id)) => write!(f, "[{theme} / question {id}] {}", self.message),
            (Some(theme), None) => write!(f, "[{theme}] {}", self.message),
            (None, Some(id)) => write!(f, "[question {id}] {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

fn check_question(theme: &str, question: &RawQuestion, issues: &mut Vec<ValidationIssue>) {
    let issue = |message: String| ValidationIssue {
        theme: Some(theme.to_string()),
        question_id: Some(question.source_id),
        message,
    };

    if question.prompt.trim().is_empty() {
        issues.push(issue("empty prompt".into()));
    }
    if [&question.option_a, &question.option_b, &question.option_c]
        .iter()
        .any(|text| text.trim().is_empty())
    {
        issues.push(issue("incomplete options".into()));
    }
    if question.answer.parse::<Choice>().is_err() {
        issues.push(issue(format!(
            "invalid expected answer '{}'",
            question.answer
        )));
    }
}

/// Validates a parsed practice corpus, collecting every finding instead of
/// stopping at the first.
pub fn validate_practice_themes(themes: &[ParsedTheme]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for theme in themes {
        let label = format!("Thème {}", theme.id);
        if theme.questions.is_empty() {
            issues.push(ValidationIssue {
                theme: Some(label.clone()),
                question_id: None,
                message: format!("no questions found ({})", theme.title),
            });
            continue;
        }
        for question in &theme.questions {
            check_question(&label, question, &mut issues);
        }
    }

    issues
}

/// Validates a parsed exam corpus. Besides the per-question checks this
/// flags theme names the assembler will not recognize.
pub fn validate_exam_themes(themes: &[ExamTheme], expected_themes: &[&str]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for theme in themes {
        if !expected_themes.contains(&theme.name.as_str()) {
            issues.push(ValidationIssue {
                theme: Some(theme.name.clone()),
                question_id: None,
                message: format!(
                    "unexpected theme '{}' (expected: {})",
                    theme.name,
                    expected_themes.join(", ")
                ),
            });
        }
        if theme.questions.is_empty() {
            issues.push(ValidationIssue {
                theme: Some(theme.name.clone()),
                question_id: None,
                message: "no questions found".into(),
            });
            continue;
        }
        for question in &theme.questions {
            check_question(&theme.name, question, &mut issues);
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRACTICE_FIXTURE: &str = "\
Thème 1 : Cadre institutionnel et réglementaire français
Question 1
Énoncé de la question 1 : Quelle autorité délivre l'agrément
des prestataires de services d'investissement ?
A - L'ACPR
B - L'AMF
C - La Banque de France
Réponse attendue : A

Question 2
Énoncé de la question 2 : Que signifie le sigle AMF ?
A - Autorité des marchés financiers
B - Agence monétaire française
C - Association des marchés à terme
Réponse attendue : A

Thème 2 : Déontologie
Question 3
Énoncé de la question 3 : Un conseiller peut-il garantir une performance future ?
A - Oui, sur les fonds garantis
B - Non, jamais
C - Oui, avec accord écrit
Réponse attendue : B
";

    const EXAM_FIXTURE: &str = "\
Question 1
Thème : Environnement réglementaire
Énoncé de la question : Quel est le rôle de l'AMF ?
A - Superviser les marchés financiers
B - Fixer les taux directeurs
C - Collecter l'impôt
Réponse attendue : A

Question 2
Thème : Connaissances techniques
Énoncé de la question : Qu'est-ce qu'une obligation ?
A - Un titre de créance
B - Un titre de propriété
C - Un contrat d'assurance
Réponse attendue : A

Question 3
Thème : Environnement réglementaire
Énoncé de la question : Le démarchage bancaire est-il encadré ?
A - Non
B - Oui, par le code monétaire et financier
C - Seulement à l'étranger
Réponse attendue : B
";

    #[test]
    fn practice_parse_splits_themes_and_questions() {
        let themes = parse_practice_corpus(PRACTICE_FIXTURE);
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].id, 1);
        assert_eq!(
            themes[0].title,
            "Cadre institutionnel et réglementaire français"
        );
        assert_eq!(themes[0].questions.len(), 2);
        assert_eq!(themes[1].questions.len(), 1);

        let first = &themes[0].questions[0];
        assert_eq!(first.source_id, 1);
        assert_eq!(
            first.prompt,
            "Quelle autorité délivre l'agrément\ndes prestataires de services d'investissement ?"
        );
        assert_eq!(first.option_b, "L'AMF");
        assert_eq!(first.answer, "A");
        assert!(first.theme.is_none());
    }

    #[test]
    fn practice_parse_drops_incomplete_entries() {
        let text = "\
Thème 1 : Test
Question 1
Énoncé de la question 1 : Une question sans réponse attendue
A - Un
B - Deux
C - Trois

Question 2
Énoncé de la question 2 : Une question complète
A - Un
B - Deux
C - Trois
Réponse attendue : C
";
        let themes = parse_practice_corpus(text);
        assert_eq!(themes[0].questions.len(), 1);
        assert_eq!(themes[0].questions[0].source_id, 2);
    }

    #[test]
    fn practice_parse_drops_questions_before_first_theme() {
        let text = "\
Question 9
Énoncé de la question 9 : Orpheline
A - Un
B - Deux
C - Trois
Réponse attendue : A

Thème 1 : Seul thème
Question 1
Énoncé de la question 1 : Rattachée
A - Un
B - Deux
C - Trois
Réponse attendue : B
";
        let themes = parse_practice_corpus(text);
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].questions.len(), 1);
        assert_eq!(themes[0].questions[0].prompt, "Rattachée");
    }

    #[test]
    fn exam_parse_groups_by_inline_theme() {
        let themes = parse_exam_corpus(EXAM_FIXTURE);
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].name, "Environnement réglementaire");
        assert_eq!(themes[0].questions.len(), 2);
        assert_eq!(themes[1].name, "Connaissances techniques");
        assert_eq!(themes[1].questions.len(), 1);

        let second_env = &themes[0].questions[1];
        assert_eq!(second_env.source_id, 3);
        assert_eq!(second_env.answer, "B");
        assert_eq!(
            second_env.theme.as_deref(),
            Some("Environnement réglementaire")
        );
    }

    #[test]
    fn exam_parse_drops_entries_without_theme() {
        let text = "\
Question 1
Énoncé de la question : Pas de thème ici
A - Un
B - Deux
C - Trois
Réponse attendue : A
";
        assert!(parse_exam_corpus(text).is_empty());
    }

    #[test]
    fn option_text_may_span_lines() {
        let text = "\
Thème 1 : Multiligne
Question 1
Énoncé de la question 1 : Question
A - Une option qui continue
sur une seconde ligne
B - Deux
C - Trois
Réponse attendue : A
";
        let themes = parse_practice_corpus(text);
        assert_eq!(
            themes[0].questions[0].option_a,
            "Une option qui continue\nsur une seconde ligne"
        );
    }

    #[test]
    fn answer_marker_accepts_any_single_token() {
        let text = "\
Thème 1 : Test
Question 1
Énoncé de la question 1 : Question
A - Un
B - Deux
C - Trois
Réponse attendue : D
";
        // A non-ABC single letter still completes the entry; validation
        // reports it instead of the parser dropping it.
        let themes = parse_practice_corpus(text);
        assert_eq!(themes[0].questions.len(), 1);
        assert_eq!(themes[0].questions[0].answer, "D");
    }

    #[test]
    fn validate_reports_every_finding() {
        let themes = vec![ParsedTheme {
            id: 1,
            title: "Test".into(),
            questions: vec![
                RawQuestion {
                    source_id: 1,
                    theme: None,
                    prompt: "  ".into(),
                    option_a: "a".into(),
                    option_b: String::new(),
                    option_c: "c".into(),
                    answer: "D".into(),
                },
                RawQuestion {
                    source_id: 2,
                    theme: None,
                    prompt: "ok".into(),
                    option_a: "a".into(),
                    option_b: "b".into(),
                    option_c: "c".into(),
                    answer: "B".into(),
                },
            ],
        }];
        let issues = validate_practice_themes(&themes);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.question_id == Some(1)));
        assert!(issues.iter().any(|i| i.message.contains("empty prompt")));
        assert!(issues.iter().any(|i| i.message.contains("incomplete options")));
        assert!(issues.iter().any(|i| i.message.contains("invalid expected answer")));
    }

    #[test]
    fn validate_flags_empty_theme() {
        let themes = vec![ParsedTheme {
            id: 4,
            title: "Vide".into(),
            questions: vec![],
        }];
        let issues = validate_practice_themes(&themes);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("no questions found"));
    }

    #[test]
    fn validate_exam_flags_unexpected_theme() {
        let themes = parse_exam_corpus(EXAM_FIXTURE);
        let issues = validate_exam_themes(&themes, &["Environnement réglementaire"]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Connaissances techniques"));
    }

    #[test]
    fn read_source_falls_back_to_windows_1252() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.txt");
        // "Thème" with a Latin-1 encoded 'è' (0xE8) is not valid UTF-8.
        std::fs::write(&path, b"Th\xe8me 1 : Test\n").unwrap();

        let text = read_source_text(&path).unwrap();
        assert!(text.contains("Thème 1 : Test"));
    }

    #[test]
    fn read_source_missing_file_is_fatal() {
        let err = read_source_text(Path::new("no_such_corpus.txt")).unwrap_err();
        assert!(matches!(err, IngestError::SourceUnreadable { .. }));
    }
}
