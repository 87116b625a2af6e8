use crate::error::{Error, Result};
use crate::models::analysis_record::AnalysisRecord;
use crate::models::config::EngineConfig;
use crate::models::rubric::{CategoryKind, Question, QuestionField, Rubric, RubricCategory};
use std::collections::HashMap;

/// Effective rubric of `scope_id`: the fixed baseline overlaid with the question
/// snapshots stored on the scope's analysis records.
///
/// When several records carry a snapshot for the same category, the most recently
/// saved one wins; equal timestamps fall back to input order (later wins).
pub fn load_effective_rubric(scope_id: &str, records: &[AnalysisRecord], config: &EngineConfig) -> Rubric {
    let mut snapshots: HashMap<&str, &AnalysisRecord> = HashMap::new();
    let mut custom_order: Vec<&str> = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        if record.folder_id != scope_id {
            skipped += 1;
            continue;
        }

        let category = record.category.as_str();
        if !config.is_fixed(category) && !custom_order.contains(&category) {
            custom_order.push(category);
        }

        if record.extra_questions.is_empty() {
            continue;
        }

        match snapshots.get(category).copied() {
            Some(current) if current.updated_at > record.updated_at => {}
            Some(current) => {
                if current.extra_questions != record.extra_questions {
                    log::debug!(
                        "Rubric snapshots disagree for {category} in {scope_id}; keeping the one saved at {}",
                        record.updated_at
                    );
                }
                snapshots.insert(category, record);
            }
            None => {
                snapshots.insert(category, record);
            }
        }
    }

    if skipped > 0 {
        log::debug!("Ignored {skipped} analysis records outside rubric scope {scope_id}");
    }

    let mut categories: Vec<RubricCategory> = config
        .fixed_categories
        .iter()
        .map(|(name, defaults)| RubricCategory {
            name: name.clone(),
            kind: CategoryKind::Fixed,
            questions: snapshots
                .get(name.as_str())
                .map(|r| r.extra_questions.clone())
                .unwrap_or_else(|| defaults.clone()),
        })
        .collect();

    categories.extend(custom_order.into_iter().map(|name| RubricCategory {
        name: name.to_string(),
        kind: CategoryKind::Custom,
        questions: snapshots
            .get(name)
            .map(|r| r.extra_questions.clone())
            .unwrap_or_default(),
    }));

    Rubric {
        scope_id: scope_id.to_string(),
        categories,
    }
}

/// Validates `name` against the fixed and existing custom names and returns the
/// new category with its blank extra questions.
pub fn add_custom_category(name: &str, existing_names: &[String], config: &EngineConfig) -> Result<RubricCategory> {
    if name.trim().is_empty() {
        return Err(Error::EmptyCategoryName);
    }
    if config.is_fixed(name) || existing_names.iter().any(|existing| existing == name) {
        return Err(Error::DuplicateCategory(name.to_string()));
    }

    Ok(RubricCategory {
        name: name.to_string(),
        kind: CategoryKind::Custom,
        questions: blank_extra_questions(config.custom_question_count),
    })
}

pub fn blank_extra_questions(count: usize) -> Vec<Question> {
    let batch = uuid::Uuid::new_v4().simple().to_string();
    (1..=count)
        .map(|n| Question {
            id: format!("plus_{batch}_{n}"),
            label: String::new(),
            guide: String::new(),
            is_extra: true,
        })
        .collect()
}

/// Copy of `questions` with one field of `question_id` replaced. Unknown ids leave
/// the snapshot unchanged.
pub fn edit_question_text(questions: &[Question], question_id: &str, field: QuestionField, value: &str) -> Vec<Question> {
    questions
        .iter()
        .map(|q| {
            if q.id != question_id {
                return q.clone();
            }
            let mut edited = q.clone();
            match field {
                QuestionField::Label => edited.label = value.to_string(),
                QuestionField::Guide => edited.guide = value.to_string(),
            }
            edited
        })
        .collect()
}

impl Rubric {
    /// Appends a custom category. On error the rubric is left untouched.
    pub fn add_custom_category(&mut self, name: &str, config: &EngineConfig) -> Result<&RubricCategory> {
        let category = add_custom_category(name, &self.names(), config)?;
        self.categories.push(category);
        Ok(&self.categories[self.categories.len() - 1])
    }

    pub fn with_question_text(&self, category: &str, question_id: &str, field: QuestionField, value: &str) -> Rubric {
        let mut next = self.clone();
        if let Some(target) = next.categories.iter_mut().find(|c| c.name == category) {
            target.questions = edit_question_text(&target.questions, question_id, field, value);
        }
        next
    }
}
