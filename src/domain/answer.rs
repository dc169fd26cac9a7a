use serde::{Deserialize, Serialize};

/// The kind of response a question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "answer_shape", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnswerShape {
    Choice,
    Boolean,
    Integer,
}

impl AnswerShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerShape::Choice => "choice",
            AnswerShape::Boolean => "boolean",
            AnswerShape::Integer => "integer",
        }
    }
}

impl TryFrom<&str> for AnswerShape {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "choice" => Ok(AnswerShape::Choice),
            "boolean" | "bool" => Ok(AnswerShape::Boolean),
            "integer" | "int" => Ok(AnswerShape::Integer),
            _ => Err(()),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AnswerShapeError {
    #[error("no value provided for answer_type \"{}\"", .0.as_str())]
    MissingPayload(AnswerShape),
    #[error("value does not match answer_type \"{}\"", .0.as_str())]
    PayloadMismatch(AnswerShape),
}

/// A submitted answer payload. The wire format keeps the sibling fields
/// (`answer_choice` / `answer_int` / `answer_bool` selected by `answer_type`),
/// but in memory exactly one variant holds the value, so a tag that
/// disagrees with its payload cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Choice(String),
    Integer(i64),
    Boolean(bool),
}

/// Partial payload update, merged onto an existing value by `merge_patch`.
#[derive(Debug, Default, Clone)]
pub struct AnswerPatch {
    pub answer_type: Option<AnswerShape>,
    pub answer_choice: Option<String>,
    pub answer_int: Option<i64>,
    pub answer_bool: Option<bool>,
}

impl AnswerValue {
    pub fn shape(&self) -> AnswerShape {
        match self {
            AnswerValue::Choice(_) => AnswerShape::Choice,
            AnswerValue::Integer(_) => AnswerShape::Integer,
            AnswerValue::Boolean(_) => AnswerShape::Boolean,
        }
    }

    /// Build a value from the sibling-field representation. The field matching
    /// the declared shape must be present; any other populated field is a
    /// mismatch.
    pub fn from_parts(
        shape: AnswerShape,
        choice: Option<String>,
        int: Option<i64>,
        boolean: Option<bool>,
    ) -> Result<Self, AnswerShapeError> {
        let stray = match shape {
            AnswerShape::Choice => int.is_some() || boolean.is_some(),
            AnswerShape::Integer => choice.is_some() || boolean.is_some(),
            AnswerShape::Boolean => choice.is_some() || int.is_some(),
        };
        if stray {
            return Err(AnswerShapeError::PayloadMismatch(shape));
        }

        match shape {
            AnswerShape::Choice => choice
                .filter(|c| !c.trim().is_empty())
                .map(AnswerValue::Choice),
            AnswerShape::Integer => int.map(AnswerValue::Integer),
            AnswerShape::Boolean => boolean.map(AnswerValue::Boolean),
        }
        .ok_or(AnswerShapeError::MissingPayload(shape))
    }

    /// Flatten back into the sibling-field representation for storage and
    /// serialization.
    pub fn into_parts(self) -> (Option<String>, Option<i64>, Option<bool>) {
        match self {
            AnswerValue::Choice(c) => (Some(c), None, None),
            AnswerValue::Integer(i) => (None, Some(i), None),
            AnswerValue::Boolean(b) => (None, None, Some(b)),
        }
    }

    /// Apply a partial update. The target shape is the patched `answer_type`
    /// if given, else the current one. A payload field for any other shape is
    /// rejected; switching shape requires the matching payload in the same
    /// patch.
    pub fn merge_patch(&self, patch: &AnswerPatch) -> Result<AnswerValue, AnswerShapeError> {
        let target = patch.answer_type.unwrap_or_else(|| self.shape());

        let stray = match target {
            AnswerShape::Choice => patch.answer_int.is_some() || patch.answer_bool.is_some(),
            AnswerShape::Integer => patch.answer_choice.is_some() || patch.answer_bool.is_some(),
            AnswerShape::Boolean => patch.answer_choice.is_some() || patch.answer_int.is_some(),
        };
        if stray {
            return Err(AnswerShapeError::PayloadMismatch(target));
        }

        let patched = match target {
            AnswerShape::Choice => patch
                .answer_choice
                .clone()
                .filter(|c| !c.trim().is_empty())
                .map(AnswerValue::Choice),
            AnswerShape::Integer => patch.answer_int.map(AnswerValue::Integer),
            AnswerShape::Boolean => patch.answer_bool.map(AnswerValue::Boolean),
        };

        match patched {
            Some(value) => Ok(value),
            None if target == self.shape() => Ok(self.clone()),
            None => Err(AnswerShapeError::MissingPayload(target)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_accepts_matching_payload() {
        let value =
            AnswerValue::from_parts(AnswerShape::Boolean, None, None, Some(true)).unwrap();
        assert_eq!(value, AnswerValue::Boolean(true));
        assert_eq!(value.shape(), AnswerShape::Boolean);
    }

    #[test]
    fn from_parts_rejects_missing_payload() {
        let err = AnswerValue::from_parts(AnswerShape::Integer, None, None, None).unwrap_err();
        assert_eq!(err, AnswerShapeError::MissingPayload(AnswerShape::Integer));
    }

    #[test]
    fn from_parts_rejects_stray_sibling_field() {
        let err = AnswerValue::from_parts(
            AnswerShape::Boolean,
            Some("a bit".to_string()),
            None,
            Some(false),
        )
        .unwrap_err();
        assert_eq!(err, AnswerShapeError::PayloadMismatch(AnswerShape::Boolean));
    }

    #[test]
    fn from_parts_treats_blank_choice_as_missing() {
        let err = AnswerValue::from_parts(AnswerShape::Choice, Some("  ".to_string()), None, None)
            .unwrap_err();
        assert_eq!(err, AnswerShapeError::MissingPayload(AnswerShape::Choice));
    }

    #[test]
    fn merge_patch_updates_value_within_shape() {
        let current = AnswerValue::Integer(3);
        let merged = current
            .merge_patch(&AnswerPatch {
                answer_int: Some(7),
                ..AnswerPatch::default()
            })
            .unwrap();
        assert_eq!(merged, AnswerValue::Integer(7));
    }

    #[test]
    fn merge_patch_keeps_current_value_for_empty_patch() {
        let current = AnswerValue::Choice("normal".to_string());
        let merged = current.merge_patch(&AnswerPatch::default()).unwrap();
        assert_eq!(merged, current);
    }

    #[test]
    fn merge_patch_switches_shape_with_payload() {
        let current = AnswerValue::Boolean(false);
        let merged = current
            .merge_patch(&AnswerPatch {
                answer_type: Some(AnswerShape::Integer),
                answer_int: Some(2),
                ..AnswerPatch::default()
            })
            .unwrap();
        assert_eq!(merged, AnswerValue::Integer(2));
    }

    #[test]
    fn merge_patch_rejects_shape_switch_without_payload() {
        let current = AnswerValue::Boolean(true);
        let err = current
            .merge_patch(&AnswerPatch {
                answer_type: Some(AnswerShape::Choice),
                ..AnswerPatch::default()
            })
            .unwrap_err();
        assert_eq!(err, AnswerShapeError::MissingPayload(AnswerShape::Choice));
    }

    #[test]
    fn merge_patch_rejects_payload_for_other_shape() {
        let current = AnswerValue::Boolean(true);
        let err = current
            .merge_patch(&AnswerPatch {
                answer_int: Some(4),
                ..AnswerPatch::default()
            })
            .unwrap_err();
        assert_eq!(err, AnswerShapeError::PayloadMismatch(AnswerShape::Boolean));
    }
}
