//! Schema-driven planning.
//!
//! Resources in this provider have no custom plan logic: the planned state is
//! the proposed configuration with provider-owned values carried over from
//! the prior state, and replacement is decided by `force_new` attributes.

use serde_json::{Map, Value};

use crate::schema::{Block, BlockNestingMode, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Compute the plan for a resource.
///
/// * `prior == None` plans a create.
/// * `proposed == Null` plans a destroy.
/// * Otherwise an update is planned: computed-only attributes keep their
///   prior value, as do optional+computed attributes left unset.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    match (prior, proposed) {
        (None, proposed) => plan_create(schema, proposed),
        (Some(prior), Value::Null) => plan_destroy(schema, prior),
        (Some(prior), proposed) => plan_update(schema, prior, proposed),
    }
}

fn plan_create(schema: &Schema, proposed: &Value) -> PlanResult {
    let mut planned = proposed.clone();
    if let Value::Object(obj) = &mut planned {
        clear_computed(&schema.block, obj);
    }

    let changes = top_level_names(schema)
        .filter_map(|name| {
            field(&planned, name).map(|v| AttributeChange::added(name, v.clone()))
        })
        .collect();

    PlanResult {
        planned_state: planned,
        changes,
        requires_replace: false,
    }
}

fn plan_destroy(schema: &Schema, prior: &Value) -> PlanResult {
    let changes = top_level_names(schema)
        .filter_map(|name| field(prior, name).map(|v| AttributeChange::removed(name, v.clone())))
        .collect();

    PlanResult {
        planned_state: Value::Null,
        changes,
        requires_replace: false,
    }
}

fn plan_update(schema: &Schema, prior: &Value, proposed: &Value) -> PlanResult {
    let mut planned = proposed.clone();
    if let (Value::Object(planned_obj), Value::Object(prior_obj)) = (&mut planned, prior) {
        carry_computed(&schema.block, planned_obj, prior_obj);
    }

    let mut changes = Vec::new();
    let mut requires_replace = false;
    for name in top_level_names(schema) {
        let change = match (field(prior, name), field(&planned, name)) {
            (None, None) => continue,
            (Some(before), Some(after)) if before == after => continue,
            (Some(before), Some(after)) => {
                AttributeChange::modified(name, before.clone(), after.clone())
            },
            (None, Some(after)) => AttributeChange::added(name, after.clone()),
            (Some(before), None) => AttributeChange::removed(name, before.clone()),
        };
        if schema
            .block
            .attributes
            .get(name)
            .is_some_and(|attr| attr.force_new)
        {
            requires_replace = true;
        }
        changes.push(change);
    }

    PlanResult {
        planned_state: planned,
        changes,
        requires_replace,
    }
}

/// Null out computed-only attributes; their values come from the API.
fn clear_computed(block: &Block, obj: &mut Map<String, Value>) {
    for (name, attr) in &block.attributes {
        if attr.flags.is_computed_only() {
            obj.insert(name.clone(), Value::Null);
        }
    }
}

fn carry_computed(
    block: &Block,
    planned: &mut Map<String, Value>,
    prior: &Map<String, Value>,
) {
    for (name, attr) in &block.attributes {
        let unset = planned.get(name).map_or(true, Value::is_null);
        let carry = attr.flags.is_computed_only() || (attr.flags.computed && unset);
        if carry {
            if let Some(prior_value) = prior.get(name) {
                planned.insert(name.clone(), prior_value.clone());
            }
        }
        // Omitted attributes are unset, as in state.
        planned.entry(name.clone()).or_insert(Value::Null);
    }

    for (name, nested) in &block.blocks {
        match (nested.nesting_mode, planned.get_mut(name), prior.get(name)) {
            (
                BlockNestingMode::Single,
                Some(Value::Object(planned_inner)),
                Some(Value::Object(prior_inner)),
            ) => carry_computed(&nested.block, planned_inner, prior_inner),
            // List items are matched by position.
            (
                BlockNestingMode::List,
                Some(Value::Array(planned_items)),
                Some(Value::Array(prior_items)),
            ) => {
                for (planned_item, prior_item) in planned_items.iter_mut().zip(prior_items) {
                    if let (Value::Object(planned_inner), Value::Object(prior_inner)) =
                        (planned_item, prior_item)
                    {
                        carry_computed(&nested.block, planned_inner, prior_inner);
                    }
                }
            },
            _ => {},
        }
    }
}

fn top_level_names(schema: &Schema) -> impl Iterator<Item = &str> {
    schema
        .block
        .attributes
        .keys()
        .chain(schema.block.blocks.keys())
        .map(String::as_str)
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(name).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, NestedBlock};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "organization",
                Attribute::required_string().with_force_new(),
            )
            .with_attribute("name", Attribute::required_string())
            .with_attribute("status", Attribute::optional_computed_string())
            .with_block(
                "config",
                NestedBlock::required_single(
                    Block::new()
                        .with_attribute("schedule_crontab", Attribute::optional_string())
                        .with_attribute("checkin_margin", Attribute::optional_computed_int64()),
                ),
            )
    }

    #[test]
    fn test_plan_create() {
        let result = plan(
            &schema(),
            None,
            &json!({
                "id": "should-be-cleared",
                "organization": "acme",
                "name": "nightly",
                "status": null,
                "config": {"schedule_crontab": "0 0 * * *"}
            }),
        );

        assert_eq!(result.planned_state["id"], Value::Null);
        assert!(!result.requires_replace);
        let paths: Vec<_> = result.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "organization", "config"]);
    }

    #[test]
    fn test_plan_destroy() {
        let result = plan(
            &schema(),
            Some(&json!({"id": "1", "organization": "acme", "name": "nightly"})),
            &Value::Null,
        );

        assert_eq!(result.planned_state, Value::Null);
        assert_eq!(result.changes.len(), 3);
        assert!(result.changes.iter().all(|c| c.after.is_none()));
    }

    #[test]
    fn test_plan_update_carries_computed_values() {
        let prior = json!({
            "id": "1",
            "organization": "acme",
            "name": "nightly",
            "status": "active",
            "config": {"schedule_crontab": "0 0 * * *", "checkin_margin": 5}
        });
        let proposed = json!({
            "id": null,
            "organization": "acme",
            "name": "nightly",
            "status": null,
            "config": {"schedule_crontab": "0 0 * * *", "checkin_margin": null}
        });

        let result = plan(&schema(), Some(&prior), &proposed);
        assert!(result.changes.is_empty(), "{:?}", result.changes);
        assert_eq!(result.planned_state, prior);
    }

    #[test]
    fn test_plan_update_carries_computed_values_in_list_blocks() {
        let schema = Schema::v0().with_block(
            "widget",
            NestedBlock::list(
                Block::new()
                    .with_attribute("title", Attribute::required_string())
                    .with_attribute("interval", Attribute::optional_computed_string()),
            ),
        );
        let prior = json!({"widget": [
            {"title": "a", "interval": "5m"},
            {"title": "b", "interval": "1h"}
        ]});
        let proposed = json!({"widget": [
            {"title": "a", "interval": null},
            {"title": "b", "interval": null},
            {"title": "c", "interval": null}
        ]});

        let result = plan(&schema, Some(&prior), &proposed);
        let widgets = &result.planned_state["widget"];
        assert_eq!(widgets[0]["interval"], "5m");
        assert_eq!(widgets[1]["interval"], "1h");
        assert_eq!(widgets[2]["interval"], Value::Null);
        assert_eq!(result.changes.len(), 1);

        let proposed = json!({"widget": [{"title": "a"}, {"title": "b"}]});
        let result = plan(&schema, Some(&prior), &proposed);
        assert!(result.changes.is_empty(), "{:?}", result.changes);
    }

    #[test]
    fn test_plan_update_in_place() {
        let prior = json!({"id": "1", "organization": "acme", "name": "nightly"});
        let proposed = json!({"organization": "acme", "name": "hourly"});

        let result = plan(&schema(), Some(&prior), &proposed);
        assert!(!result.requires_replace);
        assert_eq!(
            result.changes,
            vec![AttributeChange::modified("name", json!("nightly"), json!("hourly"))]
        );
        assert_eq!(result.planned_state["id"], "1");
    }

    #[test]
    fn test_plan_update_force_new_requires_replace() {
        let prior = json!({"id": "1", "organization": "acme", "name": "nightly"});
        let proposed = json!({"organization": "globex", "name": "nightly"});

        let result = plan(&schema(), Some(&prior), &proposed);
        assert!(result.requires_replace);
        assert_eq!(result.changes[0].path, "organization");
    }
}
