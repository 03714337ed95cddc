use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of questions every user must pick.
pub const SECURITY_QUESTION_SLOTS: usize = 3;

/// Catalog entry offered in each slot's dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityQuestion {
    pub id: String,
    pub text: String,
}

impl SecurityQuestion {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityQuestionSlot {
    pub question_id: Option<String>,
    pub answer: String,
}

/// Three question/answer pairs with no question chosen twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityQuestionSelection {
    slots: [SecurityQuestionSlot; SECURITY_QUESTION_SLOTS],
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("security question slot {slot} does not exist")]
    SlotOutOfRange { slot: usize },
    #[error("question '{question_id}' is already selected in slot {slot}")]
    AlreadySelected { question_id: String, slot: usize },
}

impl SecurityQuestionSelection {
    pub fn slots(&self) -> &[SecurityQuestionSlot] {
        &self.slots
    }

    /// Choose `question_id` for `slot`; `None` clears the slot's question.
    pub fn select(
        &mut self,
        slot: usize,
        question_id: Option<String>,
    ) -> Result<(), SelectionError> {
        check_slot(slot)?;
        if let Some(id) = &question_id {
            if let Some(taken) = self.slot_holding(id).filter(|taken| *taken != slot) {
                return Err(SelectionError::AlreadySelected {
                    question_id: id.clone(),
                    slot: taken,
                });
            }
        }
        self.slots[slot].question_id = question_id;
        Ok(())
    }

    pub fn answer(&mut self, slot: usize, text: impl Into<String>) -> Result<(), SelectionError> {
        check_slot(slot)?;
        self.slots[slot].answer = text.into();
        Ok(())
    }

    /// Whether `question_id` is chosen in a slot other than `slot`.
    pub fn is_disabled(&self, slot: usize, question_id: &str) -> bool {
        self.slot_holding(question_id)
            .map(|taken| taken != slot)
            .unwrap_or(false)
    }

    /// `{question text: answer}` for every slot with a chosen question.
    pub fn labeled(&self, catalog: &[SecurityQuestion]) -> BTreeMap<String, String> {
        self.slots
            .iter()
            .filter_map(|slot| {
                let id = slot.question_id.as_deref()?;
                let label = match catalog.iter().find(|question| question.id == id) {
                    Some(question) => question.text.clone(),
                    None => {
                        debug!(question_id = id, "security question missing from catalog");
                        id.to_string()
                    }
                };
                Some((label, slot.answer.clone()))
            })
            .collect()
    }

    fn slot_holding(&self, question_id: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.question_id.as_deref() == Some(question_id))
    }
}

fn check_slot(slot: usize) -> Result<(), SelectionError> {
    if slot < SECURITY_QUESTION_SLOTS {
        Ok(())
    } else {
        Err(SelectionError::SlotOutOfRange { slot })
    }
}
