//! Location and visibility rule evaluation.

use contentsync_model::{Condition, ContentItem, FieldGroup, FieldSchema, LocationRule};
use serde_json::Value;

/// Template name used when an item has none set.
const DEFAULT_TEMPLATE: &str = "default";

/// Whether every location rule of `group` holds for `item`. Inactive
/// groups never apply.
pub(crate) fn group_applies(group: &FieldGroup, item: &ContentItem) -> bool {
    group.active && group.location.iter().all(|rule| rule_matches(rule, item))
}

fn rule_matches(rule: &LocationRule, item: &ContentItem) -> bool {
    match rule {
        LocationRule::ContentType { value } => item.content_type == *value,
        LocationRule::Template { value } => {
            item.template.as_deref().unwrap_or(DEFAULT_TEMPLATE) == value
        }
        LocationRule::FieldEquals { field, value } => {
            values_match(item.fields.get(field).unwrap_or(&Value::Null), value)
        }
    }
}

/// Whether all of a field's visibility conditions hold.
pub(crate) fn field_visible(field: &FieldSchema, item: &ContentItem) -> bool {
    field.visible_when.iter().all(|c| condition_holds(c, item))
}

fn condition_holds(condition: &Condition, item: &ContentItem) -> bool {
    values_match(
        item.fields.get(&condition.field).unwrap_or(&Value::Null),
        &condition.equals,
    )
}

/// Loose equality for stored values: `true`, `1` and `"1"` are the same.
pub(crate) fn values_match(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (scalar_text(actual), scalar_text(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentsync_types::ContentId;
    use serde_json::json;

    fn item() -> ContentItem {
        let mut item = ContentItem::new(ContentId::new(1).unwrap(), "page", "Home");
        item.fields.insert("show_video".into(), json!(true));
        item
    }

    #[test]
    fn loose_scalar_equality() {
        assert!(values_match(&json!(true), &json!("1")));
        assert!(values_match(&json!(2), &json!("2")));
        assert!(!values_match(&json!(false), &json!(true)));
        assert!(!values_match(&json!([1]), &json!(1)));
    }

    #[test]
    fn template_defaults_when_unset() {
        let group = FieldGroup::new("g", vec![]).with_rule(LocationRule::Template {
            value: "default".into(),
        });
        assert!(group_applies(&group, &item()));
    }

    #[test]
    fn field_equals_reads_current_values() {
        let group = FieldGroup::new("g", vec![]).with_rule(LocationRule::FieldEquals {
            field: "show_video".into(),
            value: json!(1),
        });
        assert!(group_applies(&group, &item()));

        let mut hidden = item();
        hidden.fields.insert("show_video".into(), json!(false));
        assert!(!group_applies(&group, &hidden));
    }

    #[test]
    fn inactive_groups_never_apply() {
        let mut group = FieldGroup::new("g", vec![]);
        group.active = false;
        assert!(!group_applies(&group, &item()));
    }
}
