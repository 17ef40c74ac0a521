//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `evol generate`, `evol demo` | `render_questions_table()`, `render_breakdown_table()` |
//! | `evol types` | `render_types_table()` |

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, ContentArrangement, Table, Width};
use evol_core::{EvolutionType, EvolutionTypeInfo, GenerateResponse};

use super::format::{single_line, truncate_str};

/// Width taken by the ID and TYPE columns plus padding.
const FIXED_COLUMNS_WIDTH: usize = 34;

/// One evolved question as shown in the summary table.
#[derive(Debug, Clone)]
pub struct QuestionRow {
    pub id: String,
    pub kind: String,
    pub question: String,
    pub placeholder_answer: bool,
}

impl QuestionRow {
    /// One row per evolved question of a response, in order.
    pub fn from_response(response: &GenerateResponse) -> Vec<Self> {
        response
            .evolved_questions
            .iter()
            .map(|q| QuestionRow {
                id: q.id.to_string(),
                kind: q.evolution_type.to_string(),
                question: single_line(&q.question),
                placeholder_answer: response
                    .question_answers
                    .iter()
                    .any(|a| a.question_id == q.id && a.placeholder),
            })
            .collect()
    }
}

/// Render evolved questions.
///
/// Questions are cut to fit `width` columns; a `*` marks questions whose
/// answer is a placeholder.
///
/// # Example Output
///
/// ```text
/// ID               TYPE            QUESTION
/// simple_0         simple          How do subsidized loans differ when ...
/// multi_context_0  multi_context * Comparing the documents, which ...
/// ```
pub fn render_questions_table(rows: &[QuestionRow], width: usize) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let question_width = width.saturating_sub(FIXED_COLUMNS_WIDTH).max(30);

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![Cell::new("ID"), Cell::new("TYPE"), Cell::new("QUESTION")]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(14)),
        ColumnConstraint::LowerBoundary(Width::Fixed(15)),
        ColumnConstraint::UpperBoundary(Width::Fixed(question_width as u16)),
    ]);

    for row in rows {
        let kind = if row.placeholder_answer {
            format!("{} *", row.kind)
        } else {
            row.kind.clone()
        };
        table.add_row(vec![
            Cell::new(&row.id),
            Cell::new(kind),
            Cell::new(truncate_str(&row.question, question_width)),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render per-type counts of questions, generated answers and context sets.
///
/// Placeholder answers are not counted.
///
/// # Example Output
///
/// ```text
/// TYPE           QUESTIONS  ANSWERS  CONTEXTS
/// simple                 3        3         3
/// ```
pub fn render_breakdown_table(response: &GenerateResponse) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        Cell::new("TYPE"),
        Cell::new("QUESTIONS").set_alignment(CellAlignment::Right),
        Cell::new("ANSWERS").set_alignment(CellAlignment::Right),
        Cell::new("CONTEXTS").set_alignment(CellAlignment::Right),
    ]);

    for kind in EvolutionType::ALL {
        let ids: Vec<_> = response
            .evolved_questions
            .iter()
            .filter(|q| q.evolution_type == kind)
            .map(|q| &q.id)
            .collect();
        let answers = response
            .question_answers
            .iter()
            .filter(|a| ids.contains(&&a.question_id) && !a.placeholder)
            .count();
        let contexts = response
            .question_contexts
            .iter()
            .filter(|c| ids.contains(&&c.question_id))
            .count();

        table.add_row(vec![
            Cell::new(kind.as_str()),
            Cell::new(ids.len()).set_alignment(CellAlignment::Right),
            Cell::new(answers).set_alignment(CellAlignment::Right),
            Cell::new(contexts).set_alignment(CellAlignment::Right),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render evolution type descriptions for `evol types`.
pub fn render_types_table(types: &[EvolutionTypeInfo], width: usize) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(width.max(60) as u16);
    table.set_header(vec![Cell::new("TYPE"), Cell::new("DESCRIPTION"), Cell::new("EXAMPLES")]);

    for info in types {
        table.add_row(vec![
            Cell::new(info.name.as_str()),
            Cell::new(info.description),
            Cell::new(info.examples.join("\n")),
        ]);
    }

    table.trim_fmt().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, kind: &str, question: &str, placeholder: bool) -> QuestionRow {
        QuestionRow {
            id: id.to_string(),
            kind: kind.to_string(),
            question: question.to_string(),
            placeholder_answer: placeholder,
        }
    }

    #[test]
    fn test_questions_table_empty() {
        assert_eq!(render_questions_table(&[], 100), "");
    }

    #[test]
    fn test_questions_table_marks_placeholders() {
        let rows = vec![
            row("simple_0", "simple", "What is a subsidized loan?", false),
            row("reasoning_0", "reasoning", "What would happen if rates rose?", true),
        ];
        let output = render_questions_table(&rows, 120);
        assert!(output.contains("QUESTION"));
        assert!(output.contains("simple_0"));
        assert!(output.contains("What is a subsidized loan?"));
        assert!(output.contains("reasoning *"));
        assert!(!output.contains("simple *"));
    }

    #[test]
    fn test_questions_table_truncates_long_questions() {
        let long = "word ".repeat(60);
        let output = render_questions_table(&[row("simple_0", "simple", long.trim(), false)], 80);
        assert!(output.contains("..."));
    }

    #[test]
    fn test_types_table_lists_all_types() {
        let infos: Vec<_> = EvolutionType::ALL.iter().map(|t| t.info()).collect();
        let output = render_types_table(&infos, 120);
        assert!(output.contains("simple"));
        assert!(output.contains("multi_context"));
        assert!(output.contains("reasoning"));
    }
}
